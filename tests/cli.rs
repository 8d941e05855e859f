// tests/cli.rs
mod common;
use crate::common::TaskSpecBuilder;

use std::error::Error;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use minicron::cli::{ArgErrorKind, Invocation, LogLevel, parse_from};
use minicron::logging::effective_level;
use minicron::process::SupervisorLauncher;
use minicron::task::TaskSpec;

type TestResult = Result<(), Box<dyn Error>>;

fn schedule(args: &[&str]) -> Result<minicron::cli::CliArgs, Box<dyn Error>> {
    match parse_from(args.iter().copied())? {
        Invocation::Schedule(args) => Ok(args),
        other => Err(format!("expected scheduler role, got {other:?}").into()),
    }
}

fn error_kind(args: &[&str]) -> ArgErrorKind {
    match parse_from(args.iter().copied()) {
        Ok(parsed) => panic!("{args:?} should not parse, got {parsed:?}"),
        Err(err) => err.kind(),
    }
}

#[test]
fn parses_all_flags_including_attached_values() -> TestResult {
    let args = schedule(&[
        "minicron",
        "-p/tmp/c.pid",
        "-P/tmp/d.pid",
        "-k5",
        "-d",
        "10",
        "/bin/echo",
        "-n",
        "hi",
    ])?;

    assert_eq!(args.child_pidfile.as_deref(), Some(Path::new("/tmp/c.pid")));
    assert_eq!(args.daemon_pidfile.as_deref(), Some(Path::new("/tmp/d.pid")));
    assert_eq!(args.kill_after, 5);
    assert!(args.detach);
    assert_eq!(args.period, 10);
    assert_eq!(
        args.command,
        vec![
            OsString::from("/bin/echo"),
            OsString::from("-n"),
            OsString::from("hi")
        ]
    );
    Ok(())
}

#[test]
fn defaults_when_only_period_and_command_are_given() -> TestResult {
    let args = schedule(&["minicron", "30", "/usr/bin/backup"])?;

    assert_eq!(args.child_pidfile, None);
    assert_eq!(args.daemon_pidfile, None);
    assert_eq!(args.kill_after, 0);
    assert!(!args.detach);
    assert_eq!(args.grace, 3);
    assert_eq!(args.log_level, None);

    let spec = TaskSpec::from_cli(&args)?;
    assert_eq!(spec.period(), Duration::from_secs(30));
    assert_eq!(spec.kill_after(), None, "zero means no limit");
    assert_eq!(spec.child_grace(), Duration::from_secs(3));
    assert_eq!(spec.executable(), Path::new("/usr/bin/backup"));
    assert_eq!(spec.argv(), &[OsString::from("/usr/bin/backup")]);
    Ok(())
}

#[test]
fn grace_and_log_level_are_configurable() -> TestResult {
    let args = schedule(&[
        "minicron",
        "--grace",
        "0",
        "--log-level",
        "debug",
        "-k",
        "2",
        "5",
        "true",
    ])?;

    assert_eq!(args.log_level, Some(LogLevel::Debug));
    let spec = TaskSpec::from_cli(&args)?;
    assert_eq!(spec.child_grace(), Duration::ZERO);
    assert_eq!(spec.kill_after(), Some(Duration::from_secs(2)));
    assert_eq!(effective_level(args.log_level), tracing::Level::DEBUG);
    Ok(())
}

#[test]
fn missing_arguments_exit_with_11() {
    for args in [&["minicron"][..], &["minicron", "10"], &["minicron", "-d", "10"]] {
        let kind = error_kind(args);
        assert_eq!(kind, ArgErrorKind::TooFewArguments, "{args:?}");
        assert_eq!(kind.exit_code(), 11);
    }
}

#[test]
fn unknown_flags_exit_with_12() {
    let kind = error_kind(&["minicron", "-x", "1", "true"]);
    assert_eq!(kind, ArgErrorKind::UnknownFlag);
    assert_eq!(kind.exit_code(), 12);
}

#[test]
fn invalid_values_exit_with_13() {
    for args in [
        &["minicron", "soon", "true"][..],
        &["minicron", "-k", "never", "10", "true"],
        &["minicron", "--log-level", "loud", "10", "true"],
    ] {
        let kind = error_kind(args);
        assert_eq!(kind, ArgErrorKind::InvalidValue, "{args:?}");
        assert_eq!(kind.exit_code(), 13);
    }
}

#[test]
fn help_and_version_are_not_errors() {
    for flag in ["--help", "--version"] {
        let kind = error_kind(&["minicron", flag]);
        assert_eq!(kind, ArgErrorKind::HelpOrVersion);
        assert_eq!(kind.exit_code(), 0);
    }
}

#[test]
fn empty_command_is_rejected() {
    let result = TaskSpec::new(
        vec![OsString::new()],
        Duration::from_secs(1),
        Duration::ZERO,
        Duration::from_secs(3),
    );
    assert!(result.is_err());

    let result = TaskSpec::new(
        Vec::new(),
        Duration::from_secs(1),
        Duration::ZERO,
        Duration::from_secs(3),
    );
    assert!(result.is_err());
}

#[test]
fn supervise_role_is_selected_by_first_argument() -> TestResult {
    let parsed = parse_from([
        "minicron",
        "__supervise",
        "--grace",
        "2",
        "--kill-after",
        "4",
        "--child-pidfile",
        "/run/job.pid",
        "--",
        "/bin/sh",
        "-c",
        "exit 0",
    ])?;

    let args = match parsed {
        Invocation::Supervise(args) => args,
        other => return Err(format!("expected supervisor role, got {other:?}").into()),
    };
    assert_eq!(args.grace, 2);
    assert_eq!(args.kill_after, 4);
    assert_eq!(args.child_pidfile.as_deref(), Some(Path::new("/run/job.pid")));
    assert_eq!(
        args.command,
        vec![
            OsString::from("/bin/sh"),
            OsString::from("-c"),
            OsString::from("exit 0")
        ]
    );
    Ok(())
}

#[test]
fn supervisor_arguments_recreate_the_task() -> TestResult {
    let spec = TaskSpecBuilder::new("/usr/bin/env")
        .arg("--ignore-environment")
        .arg("two words")
        .period(Duration::ZERO)
        .kill_after(Duration::from_secs(9))
        .grace(Duration::from_secs(1))
        .child_pidfile("/tmp/child.pid")
        .build();

    let launcher = SupervisorLauncher::new("/usr/local/bin/minicron")
        .with_log_level(Some(LogLevel::Warn));
    let mut argv: Vec<OsString> = vec!["minicron".into()];
    argv.extend(launcher.supervise_args(&spec));

    let Invocation::Supervise(args) = parse_from(argv)? else {
        return Err("supervise_args did not select the supervisor role".into());
    };
    assert_eq!(args.log_level, Some(LogLevel::Warn));
    assert_eq!(TaskSpec::from_supervise_args(&args)?, spec);
    Ok(())
}

#[test]
fn supervisor_arguments_omit_unset_options() {
    let spec = TaskSpecBuilder::new("/bin/true").build();
    let args = SupervisorLauncher::new("minicron").supervise_args(&spec);

    let args: Vec<&str> = args.iter().filter_map(|a| a.to_str()).collect();
    assert_eq!(args, vec!["__supervise", "--grace", "3", "--", "/bin/true"]);
}
