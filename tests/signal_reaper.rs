//! Runs in its own test binary: the SIGCHLD flag is process-wide, so no other
//! test may spawn children while this one checks it.

use std::thread;
use std::time::{Duration, Instant};

use psh_rs::{Shell, ShellConfig};

fn wait_for_sigchld(shell: &Shell) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !shell.reaper().take_pending() {
        assert!(Instant::now() < deadline, "no SIGCHLD within 10s");
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn installed_reaper_collects_jobs_after_sigchld() {
    let mut shell = Shell::new(ShellConfig::interactive(10)).unwrap();
    assert!(shell.reaper().is_installed());

    assert!(shell.execute_command_string("true &").success());
    assert_eq!(shell.jobs().len(), 1);

    // the job has exited, but the flag has already been drained
    wait_for_sigchld(&shell);
    shell.check_jobs();
    assert_eq!(shell.jobs().len(), 1);

    // a foreground child raises the flag again, and the next check reaps
    assert!(shell.execute_command_string("true").success());
    check_jobs_until_empty(&mut shell);

    assert!(shell.execute_command_string("sleep 30 &").success());
    shell.check_jobs();
    assert_eq!(shell.jobs().len(), 1);

    // pending signal, but the job is still running
    assert!(shell.execute_command_string("true").success());
    shell.check_jobs();
    assert_eq!(shell.jobs().len(), 1);
    assert!(shell.jobs()[0].is_running());

    assert!(shell.execute_command_string("kill %2").success());
    assert!(shell.jobs().is_empty());
}

fn check_jobs_until_empty(shell: &mut Shell) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        shell.check_jobs();
        if shell.jobs().is_empty() {
            return;
        }
        assert!(Instant::now() < deadline, "job not reaped within 10s");
        thread::sleep(Duration::from_millis(10));
    }
}
