use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn tuning_file(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp tuning file");
    tmp.write_all(contents.as_bytes()).expect("write tuning file");
    tmp
}

#[test]
fn summary_reports_defaults_and_probe() {
    let mut cmd = Command::cargo_bin("blackhole-viewer").expect("binary exists");
    cmd.arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("Black hole viewer configuration"))
        .stdout(contains(" bloom: strength 0.11 radius 0.28 threshold 1.1"))
        .stdout(contains(" - center: captured"));
}

#[test]
fn tuning_file_overrides_defaults() {
    let tuning = tuning_file(
        r#"<viewer>
  <blackhole>
    <disk-intensity>2.5</disk-intensity>
  </blackhole>
  <display>
    <exposure>1.2</exposure>
  </display>
</viewer>"#,
    );
    let mut cmd = Command::cargo_bin("blackhole-viewer").expect("binary exists");
    cmd.arg("--tuning").arg(tuning.path()).arg("--summary-only");
    cmd.assert()
        .success()
        .stdout(contains("intensity 2.5"))
        .stdout(contains(" display: exposure 1.2"));
}

#[test]
fn invalid_tuning_is_rejected() {
    let tuning = tuning_file(
        r#"<viewer>
  <blackhole>
    <disk-inner-radius>9</disk-inner-radius>
  </blackhole>
</viewer>"#,
    );
    let mut cmd = Command::cargo_bin("blackhole-viewer").expect("binary exists");
    cmd.arg("--tuning").arg(tuning.path()).arg("--summary-only");
    cmd.assert()
        .failure()
        .stderr(contains("failed to load tuning file"))
        .stderr(contains(
            "disk-inner-radius (9) must be less than disk-outer-radius (8.9)",
        ));
}

#[test]
fn unknown_argument_fails() {
    let mut cmd = Command::cargo_bin("blackhole-viewer").expect("binary exists");
    cmd.arg("--fullscreen");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"));
}
