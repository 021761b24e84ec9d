use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

pub use self::unix::isatty;

pub mod unix;

/// Psh Utility Extensions for `ExitStatus`
pub trait PshExitStatusExt {
    /// Create an ExitStatus to indicate *successful* program execution.
    fn from_success() -> Self;

    /// Create an ExitStatus to indicate *unsuccessful* program execution.
    fn from_failure() -> Self;

    /// Create an ExitStatus from a status code
    fn from_status(code: i32) -> Self;

    /// Exit code of the status, folding death-by-signal into `128 + signal`.
    fn code_or_signal(&self) -> i32;
}

impl PshExitStatusExt for ExitStatus {
    /// # Examples
    /// ```rust
    /// use psh_rs::PshExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_success().success());
    /// ```
    fn from_success() -> Self {
        ExitStatus::from_status(0)
    }

    /// # Examples
    /// ```rust
    /// use psh_rs::PshExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(!ExitStatus::from_failure().success());
    /// ```
    fn from_failure() -> Self {
        ExitStatus::from_status(1)
    }

    /// # Examples
    /// ```rust
    /// use psh_rs::PshExitStatusExt;
    /// use std::process::ExitStatus;
    /// assert!(ExitStatus::from_status(0).success());
    /// assert!(!ExitStatus::from_status(1).success());
    /// ```
    fn from_status(code: i32) -> Self {
        ExitStatus::from_raw(code << 8)
    }

    fn code_or_signal(&self) -> i32 {
        self.code()
            .or_else(|| self.signal().map(|signal| 128 + signal))
            .unwrap_or(1)
    }
}

/// Folds an exit code into 0..=255 the way bash does: positive n becomes
/// n % 256 and negative n becomes (256 + n) % 256.
pub fn code_like_u8(code: i32) -> i32 {
    code.rem_euclid(256)
}
