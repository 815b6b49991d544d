//! End-to-end tests: registration, file-backed reloads, callbacks, and flags

use clap::Command;
use optreg::{
    FileSource, FlagBridge, LoadOutcome, Loader, OptionType, OptionsError, Phase, Registry, Slot,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn count_callbacks(registry: &mut Registry) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    registry.register_callback(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    calls
}

#[test]
fn test_workers_scenario() {
    optreg::logging::init(false);

    let mut registry = Registry::new();
    let workers = Slot::new(0i64);
    registry.register_int(&workers, "workers", 4, "worker count").unwrap();
    let calls = count_callbacks(&mut registry);

    assert_eq!(registry.load_bytes(br#"{"workers": "7"}"#).unwrap(), LoadOutcome::Initial);
    assert_eq!(workers.get(), 7);

    assert_eq!(registry.load_bytes(b"{}").unwrap(), LoadOutcome::Updated);
    assert_eq!(workers.get(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(registry.load_bytes(b"{}").unwrap(), LoadOutcome::Unchanged);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_file_reload_lifecycle() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("configmap.yaml");
    fs::write(&path, "workers: 2\nrepos: kubernetes, test-infra\ntoken: s3cr3t\n").expect("write");

    let mut registry = Registry::new();
    let workers = Slot::new(0i64);
    let repos = Slot::new(Vec::new());
    let token = Slot::new(String::new());
    registry.register_int(&workers, "workers", 4, "worker count").unwrap();
    registry.register_string_list(&repos, "repos", Vec::new(), "repos to watch").unwrap();
    registry.register_secret(&token, "token", String::new(), "GitHub token").unwrap();

    let snapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    registry.register_callback(move |registry| {
        sink.lock().unwrap().push(registry.current_values());
    });

    let loader = Loader::new(FileSource::new(&path));
    assert_eq!(loader.load(&mut registry).unwrap(), LoadOutcome::Initial);
    assert_eq!(workers.get(), 2);
    assert_eq!(repos.get(), vec!["kubernetes".to_string(), "test-infra".to_string()]);
    assert_eq!(token.get(), "s3cr3t");
    assert_eq!(loader.load(&mut registry).unwrap(), LoadOutcome::Unchanged);

    fs::write(&path, "workers: 3\n").expect("rewrite");
    assert_eq!(loader.load(&mut registry).unwrap(), LoadOutcome::Updated);
    assert_eq!(workers.get(), 3);
    assert!(repos.get().is_empty());
    assert_eq!(token.get(), "");

    // A vanished file after a warm start keeps the last good values.
    fs::remove_file(&path).expect("remove");
    assert_eq!(loader.load(&mut registry).unwrap(), LoadOutcome::Retained);
    assert_eq!(workers.get(), 3);

    let snapshots = snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0].contains("workers: 3"));
    assert!(!snapshots[0].contains("s3cr3t"));
}

#[test]
fn test_missing_file_on_cold_start_is_fatal() {
    let tmp = TempDir::new().expect("tmp");
    let loader = Loader::new(FileSource::new(tmp.path().join("absent.yaml")));
    let mut registry = Registry::new();

    let err = loader.load(&mut registry).unwrap_err();
    assert!(matches!(err, OptionsError::DocumentUnreadable { .. }));
    assert!(err.to_string().contains("absent.yaml"));
    assert_eq!(registry.phase(), Phase::Empty);
}

#[test]
fn test_toml_document_from_file() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("options.toml");
    fs::write(&path, "period = \"2h45m\"\ndry-run = true\nlimit = 10\n").expect("write");

    let mut registry = Registry::new();
    let period = Slot::new(Duration::ZERO);
    let dry_run = Slot::new(false);
    registry.register_duration(&period, "period", Duration::from_secs(60), "resync").unwrap();
    registry.register_bool(&dry_run, "dry-run", false, "dry run").unwrap();

    Loader::new(FileSource::new(&path)).load(&mut registry).unwrap();
    assert_eq!(period.get(), Duration::from_secs(2 * 3_600 + 45 * 60));
    assert!(dry_run.get());

    // `limit` is held until someone registers it.
    assert_eq!(registry.option_type("limit"), Some(OptionType::Unknown));
    let limit = Slot::new(0u64);
    registry.register_uint64(&limit, "limit", 1, "limit").unwrap();
    assert_eq!(limit.get(), 10);
}

#[test]
fn test_unknown_key_promotion() {
    let mut registry = Registry::new();
    registry.load_bytes(br#"{"foo": "bar"}"#).unwrap();
    assert_eq!(registry.unknown_keys(), vec!["foo".to_string()]);

    let foo = Slot::new(String::new());
    let bound = registry.register_string(&foo, "foo", "baz".into(), "foo").unwrap();
    assert!(bound.same_as(&foo));
    assert_eq!(foo.get(), "bar");
    assert!(registry.unknown_keys().is_empty());
}

#[test]
fn test_flags_then_reload() {
    let mut registry = Registry::new();
    let workers = Slot::new(0i64);
    let org = Slot::new(String::new());
    registry.register_int(&workers, "workers", 4, "worker count").unwrap();
    registry.register_string(&org, "org", "kubernetes".into(), "GitHub org").unwrap();
    registry.populate_from_str("workers: 6").unwrap();

    let mut bridge = FlagBridge::project(&registry);
    let command = bridge.augment(Command::new("munger"));
    let matches = command.try_get_matches_from(["munger", "--org", "istio"]).unwrap();

    assert_eq!(bridge.specified_keys(&matches), vec!["org".to_string()]);
    assert_eq!(bridge.apply(&mut registry, &matches).unwrap(), vec!["org".to_string()]);
    assert_eq!(org.get(), "istio");
    assert_eq!(workers.get(), 6);
    assert_eq!(registry.phase(), Phase::FlagsApplied);

    // A changed document re-merges from scratch.
    assert_eq!(registry.populate_from_str("workers: 8").unwrap(), LoadOutcome::Updated);
    assert_eq!(org.get(), "kubernetes");
    assert_eq!(registry.phase(), Phase::Loaded);
}

#[test]
fn test_entries_serialize_without_secrets() {
    let mut registry = Registry::new();
    registry.register_secret(&Slot::default(), "token", String::new(), "GitHub token").unwrap();
    registry.populate_from_str("token: hunter2\nextra: 1").unwrap();

    let json = serde_json::to_string(&registry.entries()).unwrap();
    assert!(!json.contains("hunter2"));
    assert!(json.contains("\"option_type\":\"secret\""));
    assert!(json.contains("\"option_type\":\"unknown\""));
}
