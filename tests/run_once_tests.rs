//! End-to-end runs against the durable ledger

use command_once::executor::builtin::builtin_registry;
use command_once::{
    Arguments, BufferSink, DurabilityMode, ExecList, ExecutionLedger, ExecutionOutcome, FileLedger,
    InvocationRegistry, LedgerConfig, OnceConfig, OnceError, OperationExecutor, RunController,
    run_configured,
};
use std::cell::Cell;
use std::rc::Rc;
use tempfile::TempDir;

fn counting_registry(counter: Rc<Cell<usize>>) -> InvocationRegistry {
    InvocationRegistry::new().with("count", move |_: &Arguments| -> Result<(), String> {
        counter.set(counter.get() + 1);
        Ok(())
    })
}

fn run(
    dir: &TempDir,
    registry: InvocationRegistry,
    execs: &ExecList,
    force: bool,
) -> (command_once::RunSummary, BufferSink) {
    let ledger = FileLedger::open(dir.path(), DurabilityMode::Sync).unwrap();
    let mut controller = RunController::new(ledger, OperationExecutor::new(registry), BufferSink::new());
    let summary = controller.run(execs, force).unwrap();
    let (_, _, sink) = controller.into_parts();
    (summary, sink)
}

#[test]
fn test_idempotent_across_process_restarts() {
    let dir = TempDir::new().unwrap();
    let counter = Rc::new(Cell::new(0));
    let execs = ExecList::new().with("count {step:1}", "1").with("count {step:2}", "1");

    let (first, _) = run(&dir, counting_registry(Rc::clone(&counter)), &execs, false);
    assert_eq!(first.executed(), 2);

    let (second, _) = run(&dir, counting_registry(Rc::clone(&counter)), &execs, false);
    assert_eq!(second.skipped(), 2);
    assert_eq!(counter.get(), 2);
}

#[test]
fn test_version_bump_triggers_rerun() {
    let dir = TempDir::new().unwrap();
    let counter = Rc::new(Cell::new(0));

    run(&dir, counting_registry(Rc::clone(&counter)), &ExecList::new().with("count", "1"), false);
    let (summary, _) = run(&dir, counting_registry(Rc::clone(&counter)), &ExecList::new().with("count", "2"), false);

    assert!(summary.outcome_of("count").unwrap().is_success());
    assert_eq!(counter.get(), 2);
    let ledger = FileLedger::open(dir.path(), DurabilityMode::Sync).unwrap();
    assert_eq!(ledger.version_of("count"), Some("2"));
}

#[test]
fn test_force_reset_reruns_everything() {
    let dir = TempDir::new().unwrap();
    let counter = Rc::new(Cell::new(0));
    let execs = ExecList::new().with("count {a:1}", "1").with("count {b:1}", "1");

    run(&dir, counting_registry(Rc::clone(&counter)), &execs, false);
    let (summary, _) = run(&dir, counting_registry(Rc::clone(&counter)), &execs, true);

    assert_eq!(summary.executed(), 2);
    assert_eq!(counter.get(), 4);
}

#[test]
fn test_interrupted_run_resumes_at_first_unrecorded_entry() {
    let dir = TempDir::new().unwrap();
    {
        // A previous run got through the first entry before dying.
        let mut ledger = FileLedger::open(dir.path(), DurabilityMode::Sync).unwrap();
        ledger.record_success("count {step:1}", "1").unwrap();
    }

    let counter = Rc::new(Cell::new(0));
    let execs = ExecList::new().with("count {step:1}", "1").with("count {step:2}", "1");
    let (summary, _) = run(&dir, counting_registry(Rc::clone(&counter)), &execs, false);

    assert!(matches!(summary.outcome_of("count {step:1}"), Some(ExecutionOutcome::Skipped)));
    assert!(summary.outcome_of("count {step:2}").unwrap().is_success());
    assert_eq!(counter.get(), 1);
}

#[test]
fn test_run_configured_with_empty_execs_does_not_open_ledger() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("ledger");
    let config = OnceConfig::new(ExecList::new()).ledger(LedgerConfig::new(&data_dir));

    let mut sink = BufferSink::new();
    let summary = run_configured(&config, InvocationRegistry::new(), true, &mut sink).unwrap();

    assert!(summary.is_empty());
    assert!(!data_dir.exists());
    assert_eq!(sink.infos(), vec!["The execs array is empty now, we have nothing to do."]);
}

#[test]
fn test_run_configured_with_builtins() {
    let dir = TempDir::new().unwrap();
    let config = OnceConfig::from_json_str(&format!(
        r#"{{"execs": {{"noop": 1, "fail {{message:nope}}": 1}}, "ledger": {{"data_dir": {}}}}}"#,
        serde_json::to_string(&dir.path()).unwrap()
    ))
    .unwrap();

    let mut sink = BufferSink::new();
    let summary = run_configured(&config, builtin_registry(), false, &mut sink).unwrap();

    assert_eq!(summary.executed(), 1);
    assert_eq!(summary.failed(), 1);
    assert_eq!(sink.errors(), vec!["Command 'fail' failed: nope"]);

    let mut ledger = FileLedger::open(dir.path(), DurabilityMode::Sync).unwrap();
    let recorded = ledger.load_all().unwrap();
    assert_eq!(recorded.get("noop").map(String::as_str), Some("1"));
    assert!(!recorded.contains_key("fail {message:nope}"));
}

#[test]
fn test_unreadable_ledger_is_storage_unavailable() {
    let dir = TempDir::new().unwrap();
    // A regular file where the ledger directory should be.
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, b"not a directory").unwrap();
    let config = OnceConfig::new(ExecList::new().with("noop", "1")).ledger(LedgerConfig::new(&blocked));

    let err = run_configured(&config, builtin_registry(), false, BufferSink::new()).unwrap_err();
    assert!(matches!(err, OnceError::StorageUnavailable(_)));
}

#[cfg(unix)]
mod shell {
    use super::*;

    #[test]
    fn test_echo_succeeds_with_captured_output() {
        let dir = TempDir::new().unwrap();
        let execs = ExecList::new().with("!echo hello", "1");

        let (summary, sink) = run(&dir, InvocationRegistry::new(), &execs, false);

        assert!(summary.outcome_of("!echo hello").unwrap().is_success());
        assert!(sink.infos().contains(&"hello\n"));
    }

    #[test]
    fn test_failed_shell_command_is_retried_next_run() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("ready");
        let identifier = format!("!test -f {} || (echo not ready >&2; exit 1)", marker.display());
        let execs = ExecList::new().with(identifier.as_str(), "1");

        let (first, sink) = run(&dir, InvocationRegistry::new(), &execs, false);
        assert!(first.outcome_of(&identifier).unwrap().is_failure());
        assert_eq!(sink.errors(), vec!["not ready\n"]);

        std::fs::write(&marker, b"").unwrap();
        let (second, _) = run(&dir, InvocationRegistry::new(), &execs, false);
        assert!(second.outcome_of(&identifier).unwrap().is_success());

        let (third, _) = run(&dir, InvocationRegistry::new(), &execs, false);
        assert_eq!(third.skipped(), 1);
    }
}
