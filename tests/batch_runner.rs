use std::fs;
use std::sync::{Arc, Mutex};

use record_remap::config::load_config_dir;
use record_remap::execution::{
    BatchEvent, BatchObserver, BatchOptions, BatchOutcome, BatchRunner, TracingObserver,
};
use record_remap::ingestion::{ingest_from_path, IngestionOptions};
use record_remap::types::Table;
use record_remap::RemapError;

fn events() -> Table {
    ingest_from_path("tests/fixtures/events.json", &IngestionOptions::default()).unwrap()
}

#[derive(Default)]
struct CountingObserver {
    finished: Mutex<Vec<(String, usize)>>,
}

impl BatchObserver for CountingObserver {
    fn on_event(&self, event: &BatchEvent) {
        if let BatchEvent::ConfigFinished { name, output_rows } = event {
            self.finished.lock().unwrap().push((name.clone(), *output_rows));
        }
    }
}

#[test]
fn config_dir_runs_in_sorted_file_order() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let configs = load_config_dir("tests/fixtures/configs").unwrap();
    let names: Vec<_> = configs.iter().map(|(n, _)| n.to_string()).collect();
    assert_eq!(
        names,
        vec![
            "auth.logons",
            "auth.failures",
            "auth.incomplete",
            "network.flows",
            "network.bad"
        ]
    );

    let runner = BatchRunner::new(BatchOptions::default())
        .unwrap()
        .with_observer(Arc::new(TracingObserver));
    let out = runner.run(&events(), &configs);

    let rows: Vec<Option<usize>> = out
        .iter()
        .map(|o| o.outcome.table().map(Table::row_count))
        .collect();
    assert_eq!(rows, vec![Some(3), Some(1), None, Some(5), None]);
    assert!(matches!(out[2].outcome, BatchOutcome::Skipped));
    assert!(matches!(
        out[4].outcome,
        BatchOutcome::Failed(RemapError::InvalidConditionFormat { .. })
    ));
}

#[test]
fn metrics_reset_between_runs() {
    let configs = load_config_dir("tests/fixtures/configs").unwrap();
    let observer = Arc::new(CountingObserver::default());
    let runner = BatchRunner::new(BatchOptions {
        num_threads: Some(3),
    })
    .unwrap()
    .with_observer(observer.clone());
    let metrics = runner.metrics();

    runner.run(&events(), &configs);
    runner.run(&Table::empty(), &configs);

    let snap = metrics.snapshot();
    assert_eq!(snap.run_id, 2);
    assert_eq!(snap.configs_run, 5);
    assert_eq!(snap.rows_produced, 0);
    assert_eq!(snap.configs_skipped, 1);

    let mut finished = observer.finished.lock().unwrap().clone();
    finished.sort();
    assert_eq!(finished.len(), 6);
    assert!(finished.contains(&("auth.logons".to_string(), 3)));
    assert!(finished.contains(&("auth.logons".to_string(), 0)));
}

#[test]
fn config_dir_prefixes_names_with_file_stem() {
    let dir = std::env::temp_dir().join(format!("record_remap_batch_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("a.json"),
        r#"{"one": {"conditions": "*", "mapping": {}}}"#,
    )
    .unwrap();
    fs::write(
        dir.join("b.yml"),
        "one:\n  conditions: '*'\n  mapping: {event: Kind}\n",
    )
    .unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let configs = load_config_dir(&dir).unwrap();
    let _ = fs::remove_dir_all(&dir);

    assert_eq!(configs.len(), 2);
    let runner = BatchRunner::new(BatchOptions::default()).unwrap();
    let out = runner.run(&events(), &configs);
    assert_eq!(out[0].name, "a.one");
    assert_eq!(out[1].name, "b.one");
    assert!(out[1].outcome.table().unwrap().schema.contains("Kind"));
}
