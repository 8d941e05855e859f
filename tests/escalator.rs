// tests/escalator.rs
mod common;
use crate::common::{FakeBehaviour, FakeProcess, init_tracing};

use std::error::Error;
use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use minicron::process::{Escalation, Role, TermSignal, escalate};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(start_paused = true)]
async fn already_exited_process_is_not_signalled() -> TestResult {
    init_tracing();

    let (mut process, probe) = FakeProcess::exited(Role::Child);
    let start = Instant::now();

    let outcome = escalate(&mut process, Duration::from_secs(3)).await?;

    assert_eq!(outcome, Escalation::AlreadyExited);
    assert!(probe.signals().is_empty(), "no signal may be sent to an exited process");
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(probe.is_reaped());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn zero_grace_blocks_until_the_process_exits() -> TestResult {
    init_tracing();

    let (mut process, probe) =
        FakeProcess::new(Role::Supervisor, FakeBehaviour::ExitAfterTerm(Duration::from_secs(2)));
    let start = Instant::now();

    let outcome = escalate(&mut process, Duration::ZERO).await?;

    assert_eq!(outcome, Escalation::Terminated);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
    assert_eq!(probe.signals(), vec![TermSignal::Graceful]);
    assert!(probe.is_reaped());
    Ok(())
}

/// A process that dies right away must not cost a full grace period.
#[tokio::test(start_paused = true)]
async fn prompt_exit_skips_the_grace_sleep() -> TestResult {
    init_tracing();

    let (mut process, probe) = FakeProcess::new(Role::Child, FakeBehaviour::ExitOnTerm);
    let start = Instant::now();

    let outcome = escalate(&mut process, Duration::from_secs(3)).await?;

    assert_eq!(outcome, Escalation::Terminated);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(probe.signals(), vec![TermSignal::Graceful]);
    assert_eq!(probe.probes(), 2, "initial probe + re-probe before sleeping");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn exit_within_grace_is_not_killed() -> TestResult {
    init_tracing();

    let (mut process, probe) =
        FakeProcess::new(Role::Child, FakeBehaviour::ExitAfterTerm(Duration::from_secs(1)));
    let start = Instant::now();

    let outcome = escalate(&mut process, Duration::from_secs(3)).await?;

    assert_eq!(outcome, Escalation::Terminated);
    // The sleep itself is not interruptible.
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert_eq!(probe.signals(), vec![TermSignal::Graceful]);
    assert_eq!(probe.probes(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stubborn_process_is_killed_after_grace() -> TestResult {
    init_tracing();

    let (mut process, probe) = FakeProcess::new(Role::Child, FakeBehaviour::IgnoreTerm);
    let start = Instant::now();

    let outcome = escalate(&mut process, Duration::from_secs(3)).await?;

    assert_eq!(outcome, Escalation::Killed);
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert_eq!(
        probe.signals(),
        vec![TermSignal::Graceful, TermSignal::Forceful]
    );
    // SIGKILL is not waited for.
    assert!(!probe.is_reaped());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn escalating_twice_never_blocks_or_signals_again() -> TestResult {
    init_tracing();

    let (mut process, probe) = FakeProcess::new(Role::Child, FakeBehaviour::ExitOnTerm);

    assert_eq!(
        escalate(&mut process, Duration::ZERO).await?,
        Escalation::Terminated
    );
    let signals_after_first = probe.signals();

    let start = Instant::now();
    for grace in [Duration::ZERO, Duration::from_secs(5)] {
        assert_eq!(
            escalate(&mut process, grace).await?,
            Escalation::AlreadyExited
        );
    }

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(probe.signals(), signals_after_first);
    Ok(())
}

fn behaviour_strategy() -> impl Strategy<Value = FakeBehaviour> {
    prop_oneof![
        Just(FakeBehaviour::ExitOnTerm),
        Just(FakeBehaviour::IgnoreTerm),
        (1u64..20).prop_map(|s| FakeBehaviour::ExitAfterTerm(Duration::from_secs(s))),
    ]
}

proptest! {
    /// For any positive grace period the escalator returns within that
    /// period, and sends SIGKILL only to processes still alive after it.
    #[test]
    fn escalation_returns_within_grace(
        grace_secs in 1u64..30,
        behaviour in behaviour_strategy(),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();

        rt.block_on(async move {
            let grace = Duration::from_secs(grace_secs);
            let (mut process, probe) = FakeProcess::new(Role::Child, behaviour);
            let start = Instant::now();

            let outcome = escalate(&mut process, grace).await.unwrap();
            let elapsed = start.elapsed();

            prop_assert!(elapsed <= grace);

            let survives_grace = match behaviour {
                FakeBehaviour::ExitOnTerm => false,
                FakeBehaviour::IgnoreTerm => true,
                FakeBehaviour::ExitAfterTerm(delay) => delay > grace,
            };
            if survives_grace {
                prop_assert_eq!(outcome, Escalation::Killed);
                prop_assert_eq!(probe.signals(), vec![TermSignal::Graceful, TermSignal::Forceful]);
            } else {
                prop_assert_eq!(outcome, Escalation::Terminated);
                prop_assert_eq!(probe.signals(), vec![TermSignal::Graceful]);
            }
            Ok(())
        })?;
    }
}
