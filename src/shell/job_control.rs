use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::core::job::{Job, JobId};
use crate::errors::{Error, ErrorKind, Result, ResultExt};

/// Set from the SIGCHLD handler, cleared by `SignalReaper::take_pending`.
static CHILD_STATE_CHANGED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigchld(_signal: libc::c_int) {
    CHILD_STATE_CHANGED.store(true, Ordering::SeqCst);
}

/// Ignores the interactive signals in the interpreter and installs the
/// SIGCHLD reaper.
pub fn initialize_job_control() -> Result<SignalReaper> {
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::SigIgn)?;
        signal::signal(Signal::SIGQUIT, SigHandler::SigIgn)?;
    }
    SignalReaper::install()
}

/// Turns child-termination signals into a flag the main loop can poll.
///
/// The handler itself never touches the job table: it only records that some
/// child changed state. `Shell::check_jobs` drains the flag between prompts.
#[derive(Debug)]
pub struct SignalReaper {
    installed: bool,
}

impl SignalReaper {
    pub fn install() -> Result<SignalReaper> {
        let action = SigAction::new(
            SigHandler::Handler(handle_sigchld),
            SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
            SigSet::empty(),
        );
        unsafe { signal::sigaction(Signal::SIGCHLD, &action) }
            .chain_err(|| "failed to install SIGCHLD handler")?;
        debug!("installed SIGCHLD handler");
        Ok(SignalReaper { installed: true })
    }

    /// A reaper without a handler; every check polls the job table.
    pub fn disabled() -> SignalReaper {
        SignalReaper { installed: false }
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Returns `true` if a child changed state since the last call.
    pub fn take_pending(&self) -> bool {
        CHILD_STATE_CHANGED.swap(false, Ordering::SeqCst)
    }
}

/// Background jobs, in launch order.
pub struct JobTable {
    jobs: Vec<Job>,
    job_count: u32,
    capacity: usize,
}

impl JobTable {
    pub fn with_capacity(capacity: usize) -> JobTable {
        JobTable {
            jobs: Vec::new(),
            job_count: 0,
            capacity,
        }
    }

    /// Fails with `JobTableFull` if another job cannot be registered.
    pub fn ensure_capacity(&self) -> Result<()> {
        if self.jobs.len() >= self.capacity {
            bail!(ErrorKind::JobTableFull(self.capacity));
        }
        Ok(())
    }

    pub fn register(&mut self, pid: Pid, input: &str) -> Result<JobId> {
        self.ensure_capacity()?;
        let job_id = self.get_next_job_id();
        self.jobs.push(Job::new(job_id, pid, input));
        info!("registered job [{}] (pid {}): {}", job_id, pid, input);
        Ok(job_id)
    }

    pub fn list(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, job_id: JobId) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id() == job_id)
    }

    pub fn remove(&mut self, job_id: JobId) -> Option<Job> {
        let job_index = self.find_job(job_id)?;
        Some(self.jobs.remove(job_index))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Kills the job's process with SIGKILL and reaps it.
    ///
    /// A job whose process already exited is removed as finished and reported
    /// as `NoSuchJob`, like any other stale id.
    pub fn terminate(&mut self, job_id: JobId) -> Result<Job> {
        let job_index = self
            .find_job(job_id)
            .ok_or_else(|| Error::no_such_job(job_id.to_string()))?;
        let pid = self.jobs[job_index].pid();

        if has_exited(pid)? {
            let job = self.jobs.remove(job_index).mark_finished();
            info!("job [{}] exited before it could be killed", job.id());
            return Err(Error::no_such_job(job_id.to_string()));
        }

        signal::kill(pid, Signal::SIGKILL)
            .chain_err(|| ErrorKind::KillFailed(job_id.to_string()))?;
        let temp_result = wait::waitpid(pid, None);
        log_if_err!(temp_result, "failed to reap killed job [{}]", job_id);

        let job = self.jobs.remove(job_index).mark_killed();
        info!("killed job [{}] (pid {})", job_id, pid);
        Ok(job)
    }

    /// Removes and returns every job whose process has exited, without
    /// blocking.
    pub fn reap(&mut self) -> Vec<Job> {
        let mut finished = Vec::new();
        let mut running = Vec::with_capacity(self.jobs.len());
        for job in self.jobs.drain(..) {
            match has_exited(job.pid()) {
                Ok(true) => {
                    info!("job [{}] finished: {}", job.id(), job.input());
                    finished.push(job.mark_finished());
                }
                Ok(false) => running.push(job),
                Err(e) => {
                    warn!("failed to poll job [{}]: {}", job.id(), e);
                    running.push(job);
                }
            }
        }
        self.jobs = running;
        finished
    }

    fn get_next_job_id(&mut self) -> JobId {
        self.job_count += 1;
        JobId(self.job_count)
    }

    fn find_job(&self, job_id: JobId) -> Option<usize> {
        self.jobs.iter().position(|job| job.id() == job_id)
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}/{} jobs\tjob_count: {}",
            self.jobs.len(),
            self.capacity,
            self.job_count
        )?;
        for job in &self.jobs {
            writeln!(f, "{}", job)?;
        }

        Ok(())
    }
}

/// Polls `pid` with `WNOHANG`, collecting it if it has terminated.
///
/// A pid that is no longer our child has been collected elsewhere and counts as
/// exited.
fn has_exited(pid: Pid) -> Result<bool> {
    match wait::waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::Exited(pid, code)) => {
            debug!("{} exited with {}.", pid, code);
            Ok(true)
        }
        Ok(WaitStatus::Signaled(pid, signal, ..)) => {
            debug!("{} terminated by signal {:?}.", pid, signal);
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(Errno::ECHILD) => Ok(true),
        Err(e) => Err(e.into()),
    }
}
