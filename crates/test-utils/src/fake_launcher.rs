use std::sync::{Arc, Mutex};
use std::time::Duration;

use minicron::errors::{MinicronError, Result};
use minicron::process::{Launcher, Role};
use minicron::task::TaskSpec;

use crate::fake_process::{FakeBehaviour, FakeProbe, FakeProcess};

#[derive(Debug, Default)]
struct LaunchLog {
    probes: Vec<FakeProbe>,
    failures: usize,
    overlapping: usize,
}

/// A launcher that hands out [`FakeProcess`]es and records every launch.
///
/// It also counts launches that happened while a previously launched
/// process was still unreaped.
#[derive(Debug, Clone)]
pub struct FakeLauncher {
    role: Role,
    behaviour: FakeBehaviour,
    exits_after: Option<Duration>,
    fail_first: usize,
    log: Arc<Mutex<LaunchLog>>,
}

impl FakeLauncher {
    pub fn new(role: Role, behaviour: FakeBehaviour) -> Self {
        Self {
            role,
            behaviour,
            exits_after: None,
            fail_first: 0,
            log: Arc::new(Mutex::new(LaunchLog::default())),
        }
    }

    /// Launched processes exit by themselves after `after`.
    pub fn exiting_after(mut self, after: Duration) -> Self {
        self.exits_after = Some(after);
        self
    }

    /// The first `n` launches fail.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    /// Probes of every successfully launched process, in launch order.
    pub fn launched(&self) -> Vec<FakeProbe> {
        self.log.lock().unwrap().probes.clone()
    }

    pub fn failures(&self) -> usize {
        self.log.lock().unwrap().failures
    }

    /// Launches that happened while an earlier process was still alive.
    pub fn overlapping(&self) -> usize {
        self.log.lock().unwrap().overlapping
    }
}

impl Launcher for FakeLauncher {
    type Process = FakeProcess;

    fn launch(&mut self, _spec: &TaskSpec) -> Result<FakeProcess> {
        let mut log = self.log.lock().unwrap();

        if log.failures < self.fail_first {
            log.failures += 1;
            return Err(MinicronError::Launch {
                role: self.role,
                source: std::io::Error::other("scripted launch failure"),
            });
        }

        if log.probes.iter().any(|p| !p.is_reaped()) {
            log.overlapping += 1;
        }

        let (process, probe) = match self.exits_after {
            Some(after) => FakeProcess::exits_after(self.role, self.behaviour, after),
            None => FakeProcess::new(self.role, self.behaviour),
        };
        log.probes.push(probe);
        Ok(process)
    }
}
