use std::collections::BTreeMap;
use std::sync::Arc;

use roi_profiler::{
    ActiveLine, AxisCalibration, JobSnapshot, JobStatus, LineProfilesJob, ProfileError, Signal2d,
    StatePersistence,
};

fn nm_signal() -> Arc<Signal2d> {
    let axes = [
        AxisCalibration {
            scale: 1.0,
            offset: 0.0,
            unit: "nm".to_owned(),
        },
        AxisCalibration {
            scale: 1.0,
            offset: 0.0,
            unit: "nm".to_owned(),
        },
    ];
    let mut metadata = BTreeMap::new();
    metadata.insert("instrument".to_owned(), serde_json::json!("TEM"));
    metadata.insert("acceleration_kv".to_owned(), serde_json::json!(300));
    let data: Vec<f64> = (0..3600)
        .map(|i| (i % 60) as f64 + 100.0 * (i / 60) as f64)
        .collect();
    Arc::new(
        Signal2d::new(data, 60, 60)
            .unwrap()
            .with_axes(axes)
            .with_metadata(metadata),
    )
}

#[test]
fn finished_job_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = StatePersistence::new(dir.path());

    let mut job = LineProfilesJob::new("roundtrip").with_store(store.clone());
    job.set_signal(nm_signal()).unwrap();
    job.input_mut().x = vec![Some([0.0, 50.0]), Some([50.0, 50.0])];
    job.input_mut().y = vec![Some([10.0, 10.0]), Some([0.0, 50.0])];
    job.run_static().unwrap();

    let restored = LineProfilesJob::load("roundtrip", store).unwrap();

    assert_eq!(restored.status(), JobStatus::Finished);
    assert_eq!(restored.active_line(), &ActiveLine::None);
    assert_eq!(restored.input(), job.input());
    assert_eq!(restored.output(), job.output());
    assert_eq!(restored.line_indices(), vec![0, 1]);

    let signal = restored.signal().expect("signal must be restored");
    assert_eq!(signal.metadata()["instrument"], serde_json::json!("TEM"));
    assert_eq!(signal.axis(0).unit, "nm");
}

#[test]
fn restored_running_job_continues_line_numbering() {
    let dir = tempfile::tempdir().unwrap();
    let store = StatePersistence::new(dir.path());

    let mut job = LineProfilesJob::new("resume").with_store(store.clone());
    job.set_signal(nm_signal()).unwrap();
    job.add_line(None, None, Some([0.0, 10.0]), Some([5.0, 5.0]))
        .unwrap();
    job.run_if_interactive().unwrap();

    let mut restored = LineProfilesJob::load("resume", store).unwrap();
    assert_eq!(restored.status(), JobStatus::Running);
    // Restored lines all start inactive.
    assert_eq!(restored.active_line(), &ActiveLine::None);
    assert!(!restored.profile(0).unwrap().is_active());

    let next = restored
        .add_line(None, None, Some([0.0, 20.0]), Some([10.0, 10.0]))
        .unwrap();
    assert_eq!(next, 1);
}

#[test]
fn snapshot_version_is_the_crate_version() {
    let mut job = LineProfilesJob::new("version");
    job.set_signal(nm_signal()).unwrap();
    assert_eq!(job.snapshot().version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn contradicting_widths_in_a_snapshot_are_rejected() {
    let mut job = LineProfilesJob::new("widths");
    job.set_signal(nm_signal()).unwrap();
    job.input_mut().x = vec![Some([0.0, 10.0])];
    job.input_mut().y = vec![Some([5.0, 5.0])];
    job.run_static().unwrap();

    let mut snapshot = job.snapshot();
    snapshot.input.lines[0].width = Some(3.0);
    snapshot.input.width[0] = Some(5.0);

    let err = LineProfilesJob::from_snapshot(snapshot, None).unwrap_err();
    assert!(matches!(err, ProfileError::Validation(_)));
}

#[test]
fn loading_a_missing_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = StatePersistence::new(dir.path());
    assert!(LineProfilesJob::load("nope", store).is_err());
}

#[test]
fn snapshots_are_stored_per_job_name() {
    let dir = tempfile::tempdir().unwrap();
    let store = StatePersistence::new(dir.path());

    let snapshot = JobSnapshot {
        name: "standalone".to_owned(),
        signal: None,
        input: Default::default(),
        output: Vec::new(),
        active_line: ActiveLine::None,
        status: JobStatus::Initialized,
        version: JobSnapshot::current_version(),
    };
    let path = store.save_snapshot(&snapshot).unwrap();
    assert_eq!(path, dir.path().join("standalone.json"));
    assert!(store.has_snapshot("standalone"));
    assert!(!store.has_snapshot("other"));

    let loaded = store.load_snapshot("standalone").unwrap();
    assert_eq!(loaded.name, "standalone");
    assert_eq!(loaded.status, JobStatus::Initialized);

    store.delete_snapshot("standalone").unwrap();
    assert!(!store.has_snapshot("standalone"));
}
