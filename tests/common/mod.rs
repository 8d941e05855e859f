#![allow(dead_code, unused_imports)]

use std::path::Path;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

pub use minicron_test_utils::builders::TaskSpecBuilder;
pub use minicron_test_utils::fake_launcher::FakeLauncher;
pub use minicron_test_utils::fake_process::{FakeBehaviour, FakeProbe, FakeProcess};
pub use minicron_test_utils::termination::{
    ManualTermination, TerminationTrigger, manual_termination,
};
pub use minicron_test_utils::{init_tracing, with_timeout};

/// Poll `cond` every 20ms (async) until it holds or `timeout` passes.
pub async fn eventually<F>(timeout: Duration, mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Blocking variant of [`eventually`] for tests that drive the binary.
pub fn eventually_blocking<F>(timeout: Duration, mut cond: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// True while `pid` names a process (including an unreaped zombie).
pub fn process_exists(pid: u32) -> bool {
    !matches!(kill(Pid::from_raw(pid as i32), None), Err(Errno::ESRCH))
}

pub fn file_exists(path: &Path) -> bool {
    path.exists()
}
