use std::process::{Command, Output};

const MISSING: &str = "/nonexistent/avdemux/missing.mp4";

fn avdemux(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_avdemux"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run avdemux")
}

fn single_json_line(stdout: &[u8]) -> serde_json::Value {
    let stdout_s = String::from_utf8_lossy(stdout);
    let lines: Vec<&str> = stdout_s.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(
        lines.len(),
        1,
        "stdout must contain exactly one non-empty line:\n{stdout_s}"
    );
    serde_json::from_str(lines[0])
        .unwrap_or_else(|e| panic!("stdout is not JSON: {e}\n{stdout_s}"))
}

#[test]
fn help_lists_subcommands() {
    let output = avdemux(&["help"]);
    assert!(
        output.status.success(),
        "avdemux help failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("streams"), "missing streams in help output");
    assert!(stdout.contains("scan"), "missing scan in help output");
}

#[test]
fn missing_file_exits_with_open_failure() {
    let output = avdemux(&["streams", MISSING]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Could not open file"), "{stderr}");
    assert!(stderr.contains(MISSING), "{stderr}");
}

#[test]
fn missing_file_json_error_contract() {
    let output = avdemux(&["scan", MISSING, "--json"]);
    assert_eq!(output.status.code(), Some(2));

    let value = single_json_line(&output.stdout);
    assert_eq!(value["schema_version"], 1);
    assert_eq!(value["command"], "scan");
    assert_eq!(value["ok"], false);
    assert_eq!(value["error_code"], 310);
    let error = value["error"].as_str().unwrap_or_default();
    assert!(error.contains(MISSING), "{error}");
}

#[test]
fn terminal_sink_prints_one_error_line() {
    let output = avdemux(&["--sink", "terminal", "--no-color", "streams", MISSING]);
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let errors: Vec<&str> = stdout.lines().filter(|l| l.starts_with("[ERROR] ")).collect();
    assert_eq!(errors.len(), 1, "{stdout}");
    assert!(errors[0].contains("Could not open file"), "{stdout}");
    assert!(!stdout.contains('\x1b'), "colors must be off: {stdout:?}");
}

#[test]
fn terminal_sink_honours_no_color_without_flag() {
    // `avdemux()` exports NO_COLOR=1; no --no-color here.
    let output = avdemux(&["--sink", "terminal", "streams", MISSING]);
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[ERROR] Could not open file"), "{stdout}");
    assert!(!stdout.contains('\x1b'), "NO_COLOR must disable colors: {stdout:?}");
}

#[cfg(feature = "ffmpeg-runtime")]
#[test]
fn strict_scan_of_master_asset() {
    let asset = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../tests/assets/master_4k.mp4");
    if !asset.is_file() {
        eprintln!("skipping: {} not found", asset.display());
        return;
    }
    let asset = asset.to_string_lossy().into_owned();

    let output = avdemux(&["scan", &asset, "--strict", "--json"]);
    assert!(
        output.status.success(),
        "strict scan failed: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    let value = single_json_line(&output.stdout);
    assert_eq!(value["ok"], true);
    assert_eq!(value["ended"], "end_of_stream");
    assert!(value["total_packets"].as_u64().unwrap_or(0) > 0);
    assert_eq!(value["violations"].as_array().map(Vec::len), Some(0));

    let output = avdemux(&["streams", &asset, "--json"]);
    assert!(output.status.success());
    let value = single_json_line(&output.stdout);
    assert!(value["video_stream_index"].is_u64());
    assert!(value["audio_stream_index"].is_u64());
}
