use std::future::Future;
use std::os::unix::process::ExitStatusExt;
use std::pin::Pin;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use minicron::errors::Result;
use minicron::process::{ProcessControl, Role, TermSignal};
use tokio::time::{Instant, sleep_until};

static NEXT_PID: AtomicU32 = AtomicU32::new(40_000);

/// How a [`FakeProcess`] reacts to the escalation signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeBehaviour {
    /// Dies as soon as SIGTERM arrives.
    ExitOnTerm,
    /// Dies this long after SIGTERM arrives.
    ExitAfterTerm(Duration),
    /// Ignores SIGTERM; only SIGKILL ends it.
    IgnoreTerm,
}

#[derive(Debug, Default)]
struct FakeState {
    signals: Vec<TermSignal>,
    probes: usize,
    exit_at: Option<(Instant, ExitStatus)>,
    reaped: Option<ExitStatus>,
}

/// A scripted `ProcessControl` driven by `tokio::time`.
///
/// Works with paused time (`#[tokio::test(start_paused = true)]`), so grace
/// periods can be asserted exactly.
#[derive(Debug)]
pub struct FakeProcess {
    role: Role,
    pid: u32,
    behaviour: FakeBehaviour,
    state: Arc<Mutex<FakeState>>,
}

/// Observer for a [`FakeProcess`] that stays usable after the process was
/// moved into the code under test.
#[derive(Debug, Clone)]
pub struct FakeProbe {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProcess {
    pub fn new(role: Role, behaviour: FakeBehaviour) -> (Self, FakeProbe) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let process = Self {
            role,
            pid: NEXT_PID.fetch_add(1, Ordering::Relaxed),
            behaviour,
            state: Arc::clone(&state),
        };
        (process, FakeProbe { state })
    }

    /// A process that already exited with status 0 but was not reaped yet.
    pub fn exited(role: Role) -> (Self, FakeProbe) {
        Self::exits_after(role, FakeBehaviour::ExitOnTerm, Duration::ZERO)
    }

    /// A process that exits by itself with status 0 after `after`.
    pub fn exits_after(
        role: Role,
        behaviour: FakeBehaviour,
        after: Duration,
    ) -> (Self, FakeProbe) {
        let (process, probe) = Self::new(role, behaviour);
        process.state.lock().unwrap().exit_at =
            Some((Instant::now() + after, ExitStatus::from_raw(0)));
        (process, probe)
    }

    fn schedule_exit(state: &mut FakeState, at: Instant, status: ExitStatus) {
        match state.exit_at {
            Some((existing, _)) if existing <= at => {}
            _ => state.exit_at = Some((at, status)),
        }
    }
}

impl FakeProbe {
    /// Every signal the code under test asked to send, in order.
    pub fn signals(&self) -> Vec<TermSignal> {
        self.state.lock().unwrap().signals.clone()
    }

    /// Number of non-blocking probes performed.
    pub fn probes(&self) -> usize {
        self.state.lock().unwrap().probes
    }

    pub fn reaped(&self) -> Option<ExitStatus> {
        self.state.lock().unwrap().reaped
    }

    pub fn is_reaped(&self) -> bool {
        self.reaped().is_some()
    }
}

impl ProcessControl for FakeProcess {
    fn role(&self) -> Role {
        self.role
    }

    fn pid(&self) -> Option<u32> {
        match self.state.lock().unwrap().reaped {
            Some(_) => None,
            None => Some(self.pid),
        }
    }

    fn try_reap(&mut self) -> Result<Option<ExitStatus>> {
        let mut state = self.state.lock().unwrap();
        state.probes += 1;

        if state.reaped.is_none() {
            if let Some((at, status)) = state.exit_at {
                if at <= Instant::now() {
                    state.reaped = Some(status);
                }
            }
        }
        Ok(state.reaped)
    }

    fn signal(&mut self, signal: TermSignal) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.signals.push(signal);

        if state.reaped.is_some() {
            return Ok(());
        }

        let now = Instant::now();
        match signal {
            TermSignal::Graceful => match self.behaviour {
                FakeBehaviour::ExitOnTerm => {
                    Self::schedule_exit(&mut state, now, ExitStatus::from_raw(15));
                }
                FakeBehaviour::ExitAfterTerm(delay) => {
                    Self::schedule_exit(&mut state, now + delay, ExitStatus::from_raw(15));
                }
                FakeBehaviour::IgnoreTerm => {}
            },
            TermSignal::Forceful => {
                Self::schedule_exit(&mut state, now, ExitStatus::from_raw(9));
            }
        }
        Ok(())
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ExitStatus>> + Send + '_>> {
        Box::pin(async move {
            loop {
                if let Some(status) = self.try_reap()? {
                    return Ok(status);
                }

                let exit_at = self.state.lock().unwrap().exit_at.map(|(at, _)| at);
                match exit_at {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            }
        })
    }
}
