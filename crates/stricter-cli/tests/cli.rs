use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("index.js"), "import './used.js';\n").unwrap();
    fs::write(src.join("used.js"), "export const used = 1;\n").unwrap();
    fs::write(src.join("orphan.js"), "export const orphan = 1;\n").unwrap();
    fs::write(
        tmp.path().join("stricter.toml"),
        r#"
root = "src"

[[rules."stricter/unused-files"]]
config = { entry = ['index\.js$'] }
"#,
    )
    .unwrap();
    tmp
}

fn stricter(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_stricter"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn violations_fail_the_run() {
    let tmp = project();
    let output = stricter(tmp.path(), &[]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.contains("error: stricter/unused-files"));
    assert!(stdout.contains("orphan.js Unused file"));
    assert!(stdout.trim_end().ends_with("1 errors"));
}

#[test]
fn json_format_prints_the_outcome() {
    let tmp = project();
    let output = stricter(tmp.path(), &["--format", "json"]);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(json["error_count"], 1);
    assert_eq!(json["lines"].as_array().unwrap().len(), 2);
}

#[test]
fn unselected_rules_do_not_run() {
    let tmp = project();
    let output = stricter(
        tmp.path(),
        &["--rule-name", "stricter/circular-dependencies"],
    );

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "No errors");
}

#[test]
fn missing_config_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let output = stricter(tmp.path(), &[]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No configuration found"));
}

#[test]
fn list_rules_includes_builtins() {
    let tmp = TempDir::new().unwrap();
    let output = stricter(tmp.path(), &["list-rules"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("stricter/unused-files"));
    assert!(stdout.contains("stricter/circular-dependencies"));
}
