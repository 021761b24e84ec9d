use std::fmt;

use nix::unistd::Pid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Finished,
    Killed,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Finished => write!(f, "Done"),
            JobStatus::Killed => write!(f, "Killed"),
        }
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Running
    }
}

/// A background process and the line that started it.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    id: JobId,
    pid: Pid,
    input: String,
    status: JobStatus,
}

impl Job {
    pub fn new(id: JobId, pid: Pid, input: &str) -> Self {
        Self {
            id,
            pid,
            input: input.to_string(),
            status: JobStatus::Running,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    /// The process exited on its own.
    pub fn mark_finished(self) -> Self {
        self.transition(JobStatus::Finished)
    }

    /// The process was terminated on request.
    pub fn mark_killed(self) -> Self {
        self.transition(JobStatus::Killed)
    }

    /// Jobs leave Running at most once.
    fn transition(self, status: JobStatus) -> Self {
        if self.is_running() {
            Self { status, ..self }
        } else {
            self
        }
    }

    /// The line printed once the job has left the table, e.g. `[2]+ Done\tsleep 1`.
    pub fn notification(&self) -> String {
        format!("[{}]+ {}\t{}", self.id, self.status, self.input)
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}", self.id, self.pid, self.input)
    }
}
