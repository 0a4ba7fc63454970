//! Integration tests for the tbexport command line.
//!
//! Each test writes event files into a temporary log directory and runs the
//! binary against it.

mod common;

use std::fs;

use common::{loss_and_acc, run_tbexport, stderr, stdout, two_images, write_run};
use tbexport::event_file::{audio_event, scalar_event};
use tempfile::TempDir;

fn arg(path: &std::path::Path) -> &str {
    path.to_str().expect("temp paths are utf-8")
}

#[test]
fn test_scalars_to_csv() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_run(logs.path(), "train", &loss_and_acc());

    let output = run_tbexport(&[arg(logs.path()), arg(out.path()), "-s", "scalars"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let csv = fs::read_to_string(out.path().join("train/scalars.csv")).unwrap();
    assert_eq!(csv, "wall_time,step,loss,acc\n1.0,0,0.5,0.25\n2.0,1,0.375,0.75\n");
    assert!(!out.path().join("train/images").exists());

    let stdout = stdout(&output);
    assert!(stdout.contains("   scalars: 2 summaries"));
    assert!(stdout.contains("   graph: 0"));
    assert!(stdout.contains("Exporting scalars to csv-file..."));
    assert!(stdout.contains("CSV-path:"));
}

#[test]
fn test_default_exports_everything_supported() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut events = loss_and_acc();
    events.extend(two_images("samples/input"));
    write_run(logs.path(), "train", &events);

    let output = run_tbexport(&[arg(logs.path()), arg(out.path())]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let image_dir = out.path().join("train/images/samples/input");
    assert_eq!(fs::read(image_dir.join("0.png")).unwrap(), b"\x89PNG step0");
    assert_eq!(fs::read(image_dir.join("5.png")).unwrap(), b"\x89PNG step5");
    assert!(out.path().join("train/scalars.csv").is_file());

    let stdout = stdout(&output);
    assert!(stdout.contains("Audio is not yet supported!"));
    assert!(stdout.contains("   Histograms are not yet supported!"));
    assert!(stdout.contains("   Compressed histograms are not yet supported!"));
}

#[test]
fn test_audio_only_writes_nothing() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_run(
        logs.path(),
        "speech",
        &[audio_event(1.0, 0, "clip", 16000.0, b"RIFF....WAVE")],
    );

    let output = run_tbexport(&[arg(logs.path()), arg(out.path()), "-s", "audio"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Audio is not yet supported!"));

    let written = fs::read_dir(out.path().join("speech")).unwrap().count();
    assert_eq!(written, 0);
}

#[test]
fn test_single_event_file() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let path = write_run(logs.path(), "eval", &loss_and_acc());

    let output = run_tbexport(&[arg(&path), arg(out.path()), "-s", "scalars"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out.path().join("eval/scalars.csv").is_file());
}

#[test]
fn test_missing_log_path_fails() {
    let out = TempDir::new().unwrap();
    let missing = out.path().join("does-not-exist");

    let output = run_tbexport(&[arg(&missing), arg(out.path())]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("log path not found"));
}

#[test]
fn test_empty_log_directory() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let output = run_tbexport(&[arg(logs.path()), arg(out.path())]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn test_invalid_summary_kind_rejected() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let output = run_tbexport(&[arg(logs.path()), arg(out.path()), "-s", "graphs"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_mismatched_scalar_lengths_fail() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_run(
        logs.path(),
        "train",
        &[
            scalar_event(1.0, 0, "loss", 0.5),
            scalar_event(2.0, 1, "loss", 0.25),
            scalar_event(1.0, 0, "acc", 0.5),
        ],
    );

    let output = run_tbexport(&[arg(logs.path()), arg(out.path()), "-s", "scalars"]);
    assert!(!output.status.success());
    assert!(!out.path().join("train/scalars.csv").exists());

    let stderr = stderr(&output);
    assert!(stderr.contains("scalar tag 'acc' has 1 points"), "stderr: {stderr}");
    assert!(
        stderr.contains("train/events.out.tfevents.1.test"),
        "stderr: {stderr}"
    );
}

#[test]
fn test_empty_summary_list_only_prints_catalog() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let mut events = loss_and_acc();
    events.extend(two_images("samples"));
    write_run(logs.path(), "train", &events);

    let output = run_tbexport(&[arg(logs.path()), arg(out.path()), "-s"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let stdout = stdout(&output);
    assert!(stdout.contains("   scalars: 2 summaries"));
    assert!(stdout.contains("   images: 1 summaries"));
    assert!(!stdout.contains("Exporting"));
    assert_eq!(fs::read_dir(out.path().join("train")).unwrap().count(), 0);
}

#[test]
fn test_keep_going_with_report() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let bad = logs.path().join("a_broken/events.out.tfevents.1.test");
    fs::create_dir_all(bad.parent().unwrap()).unwrap();
    fs::write(&bad, b"this is not an event file at all").unwrap();
    write_run(logs.path(), "b_train", &loss_and_acc());
    let report_path = out.path().join("report.json");

    let output = run_tbexport(&[
        arg(logs.path()),
        arg(out.path()),
        "-s",
        "scalars",
        "--keep-going",
        "--report",
        arg(&report_path),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("1 of 2 runs failed"));
    assert!(out.path().join("b_train/scalars.csv").is_file());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    let runs = report["runs"].as_array().unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0]["label"], "a_broken");
    assert_eq!(runs[0]["status"], "failed");
    assert_eq!(runs[1]["status"], "ok");
    assert_eq!(runs[1]["scalar_rows"], 2);
}
