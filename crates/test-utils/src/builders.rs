#![allow(dead_code)]

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use minicron::task::TaskSpec;

/// Builder for `TaskSpec` to simplify test setup.
pub struct TaskSpecBuilder {
    command: Vec<OsString>,
    period: Duration,
    kill_after: Duration,
    grace: Duration,
    child_pidfile: Option<PathBuf>,
    daemon_pidfile: Option<PathBuf>,
}

impl TaskSpecBuilder {
    /// Start from an executable path; arguments are added with [`arg`].
    ///
    /// [`arg`]: TaskSpecBuilder::arg
    pub fn new(executable: &str) -> Self {
        Self {
            command: vec![executable.into()],
            period: Duration::from_secs(5),
            kill_after: Duration::ZERO,
            grace: Duration::from_secs(3),
            child_pidfile: None,
            daemon_pidfile: None,
        }
    }

    /// `/bin/sh -c <script>`.
    pub fn shell(script: &str) -> Self {
        Self::new("/bin/sh").arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.command.push(arg.into());
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn kill_after(mut self, limit: Duration) -> Self {
        self.kill_after = limit;
        self
    }

    pub fn grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn child_pidfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.child_pidfile = Some(path.into());
        self
    }

    pub fn daemon_pidfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.daemon_pidfile = Some(path.into());
        self
    }

    pub fn build(self) -> TaskSpec {
        TaskSpec::new(self.command, self.period, self.kill_after, self.grace)
            .expect("Failed to build valid task spec from builder")
            .with_child_pidfile(self.child_pidfile)
            .with_daemon_pidfile(self.daemon_pidfile)
    }
}
