use std::{path::Path, process::Command};

fn manifest_dir() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn headless_session_prints_a_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_swarmfall"))
        .args(["--frames", "300", "--seed", "7", "--log-level", "warn"])
        .arg("--content")
        .arg(manifest_dir().join("content"))
        .output()
        .expect("failed to launch swarmfall binary");

    assert!(
        output.status.success(),
        "swarmfall exited with {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("frames:      300"), "unexpected summary: {stdout}");
    assert!(stdout.contains("survived:"));
}

#[test]
fn sample_config_is_accepted() {
    let output = Command::new(env!("CARGO_BIN_EXE_swarmfall"))
        .current_dir(manifest_dir())
        .args(["--config", "swarmfall.toml", "--frames", "60"])
        .output()
        .expect("failed to launch swarmfall binary");

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn missing_content_directory_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_swarmfall"))
        .args(["--content", "/nonexistent/swarmfall-content", "--frames", "1"])
        .output()
        .expect("failed to launch swarmfall binary");

    assert!(!output.status.success());
}
