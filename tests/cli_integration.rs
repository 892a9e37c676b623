//! Command-line interface: check, diff and JSON output.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const MESSY: &str = "using System.Linq;\nusing System;\n\nclass Counter\n{\n    private int count;\n}\n";
const CANONICAL: &str = "using System;\n\npublic class Clean\n{\n    public int Size { get; set; }\n}\n";

fn setup_workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

fn run(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cst-canonizer"))
        .args(args)
        .arg(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    let output = Command::new(env!("CARGO_BIN_EXE_cst-canonizer"))
        .arg("--help")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("check"));
    assert!(stdout.contains("diff"));
}

#[test]
fn test_check_fails_when_a_file_would_change() {
    let dir = setup_workspace(&[("Counter.cs", MESSY), ("Clean.cs", CANONICAL)]);
    let output = run(&["check"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Counter.cs: would change"));
    assert!(stdout.contains("Clean.cs: unchanged"));
    assert!(stdout.contains("1 would change, 1 unchanged"));

    // check never writes
    assert_eq!(fs::read_to_string(dir.path().join("Counter.cs")).unwrap(), MESSY);
}

#[test]
fn test_check_passes_on_canonical_sources() {
    let dir = setup_workspace(&[("src/Clean.cs", CANONICAL)]);
    let output = run(&["check"], dir.path());
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("src/Clean.cs: unchanged"));
}

#[test]
fn test_diff_shows_rewrites() {
    let dir = setup_workspace(&[("Counter.cs", MESSY)]);
    let output = run(&["diff"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(original)"));
    assert!(stdout.contains("-using System.Linq;"));
    assert!(stdout.contains("+    private int _count;"));
}

#[test]
fn test_json_report() {
    let dir = setup_workspace(&[("Counter.cs", MESSY)]);
    let output = run(&["check", "--json"], dir.path());

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let units = report["units"].as_array().unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0]["name"], "Counter.cs");
    assert_eq!(units[0]["changed"], true);
    assert!(units[0]["text"].as_str().unwrap().contains("_count"));
}

#[test]
fn test_config_changes_the_rewrite() {
    let dir = setup_workspace(&[
        ("Counter.cs", MESSY),
        ("canonizer.toml", "[naming]\nfield_prefix = \"m_\"\n"),
    ]);
    let config = dir.path().join("canonizer.toml");
    let output = run(&["diff", "--config", config.to_str().unwrap()], dir.path());

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("+    private int m_count;"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = setup_workspace(&[
        ("Counter.cs", MESSY),
        ("canonizer.toml", "[layout]\nmax_width = 0\n"),
    ]);
    let config = dir.path().join("canonizer.toml");
    let output = run(&["check", "--config", config.to_str().unwrap()], dir.path());

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_width"));
}

#[test]
fn test_unparsable_files_are_skipped() {
    let dir = setup_workspace(&[("Broken.cs", "class {{{"), ("Clean.cs", CANONICAL)]);
    let output = run(&["check"], dir.path());

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Broken.cs"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 not parsed"));
}

#[test]
fn test_generated_files_are_left_out() {
    let dir = setup_workspace(&[("obj/Counter.cs", MESSY), ("Clean.cs", CANONICAL)]);
    let output = run(&["check"], dir.path());

    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Counter.cs"));
}
