//! Common test utilities for tbexport integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tbexport::event_file::{image_event, scalar_event};
use tbexport::proto::Event;
use tbexport::EventFileWriter;

/// Run tbexport with the given arguments, returning the full Output.
pub fn run_tbexport(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tbexport"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run tbexport")
}

/// Write `events` to `<root>/<run>/events.out.tfevents.1.test` and return the
/// file's path.
pub fn write_run(root: &Path, run: &str, events: &[Event]) -> PathBuf {
    let dir = root.join(run);
    fs::create_dir_all(&dir).expect("Failed to create run dir");
    let path = dir.join("events.out.tfevents.1.test");
    let mut writer = EventFileWriter::create_at(&path).expect("Failed to create event file");
    for event in events {
        writer.write_event(event).expect("Failed to write event");
    }
    writer.flush().expect("Failed to flush event file");
    path
}

/// Two scalar tags over two steps, values chosen to be exact in f32.
pub fn loss_and_acc() -> Vec<Event> {
    vec![
        scalar_event(1.0, 0, "loss", 0.5),
        scalar_event(1.0, 0, "acc", 0.25),
        scalar_event(2.0, 1, "loss", 0.375),
        scalar_event(2.0, 1, "acc", 0.75),
    ]
}

pub fn two_images(tag: &str) -> Vec<Event> {
    vec![
        image_event(1.0, 0, tag, 2, 2, b"\x89PNG step0"),
        image_event(2.0, 5, tag, 2, 2, b"\x89PNG step5"),
    ]
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
