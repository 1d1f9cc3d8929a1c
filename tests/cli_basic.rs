//! Integration tests for basic CLI behavior.
//!
//! Tests that the binary exists, accepts standard flags, each subcommand
//! responds to `--help`, and the offline subcommands (`parse`, `render`)
//! work end to end.

#![allow(deprecated)] // cargo_bin deprecation — replacement not yet stable

use std::io::Cursor;

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: get a Command for the `markbox` binary.
fn markbox() -> Command {
    Command::cargo_bin("markbox").expect("binary 'markbox' should be built")
}

const MARKED: &str = "<|ref|>text<|/ref|><|det|>[[10,20,110,60]]<|/det|>Hello\
                      <|ref|>text<|/ref|><|det|>[[5,5,50,50]]<|/det|>World";

/// Write a small PNG fixture into `dir` and return its path.
fn png_fixture(dir: &std::path::Path, name: &str) -> std::path::PathBuf {
    let mut png = Vec::new();
    image::RgbaImage::from_pixel(120, 80, image::Rgba([200, 200, 200, 255]))
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, png).unwrap();
    path
}

// ─── Top-level flags ─────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    markbox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: markbox"))
        .stdout(predicate::str::contains("parse"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("annotate"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("health"));
}

#[test]
fn version_flag_shows_semver() {
    markbox()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^markbox \d+\.\d+\.\d+\n$").unwrap());
}

#[test]
fn no_args_shows_error_and_usage() {
    markbox()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage: markbox"));
}

#[test]
fn invalid_subcommand_fails() {
    markbox()
        .arg("this-is-not-a-real-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ─── Subcommand help ─────────────────────────────────────────────────────────

#[test]
fn parse_help() {
    markbox()
        .args(["parse", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Parse raw marker text"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn extract_help() {
    markbox()
        .args(["extract", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recognition service"))
        .stdout(predicate::str::contains("<IMAGE>"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--base64"));
}

#[test]
fn annotate_help() {
    markbox()
        .args(["annotate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Full workflow"))
        .stdout(predicate::str::contains("--output"));
}

#[test]
fn render_help() {
    markbox()
        .args(["render", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no network"))
        .stdout(predicate::str::contains("<MARKERS>"));
}

// ─── parse (offline) ─────────────────────────────────────────────────────────

#[test]
fn parse_reads_stdin_and_lists_regions() {
    markbox()
        .arg("parse")
        .write_stdin(MARKED)
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello"))
        .stdout(predicate::str::contains("[10,20,110,60]"))
        .stdout(predicate::str::contains("World"));
}

#[test]
fn parse_json_output_is_valid() {
    let output = markbox()
        .args(["parse", "--json"])
        .write_stdin(MARKED)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let regions: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(regions.as_array().unwrap().len(), 2);
    assert_eq!(regions[0]["text"], "Hello");
    assert_eq!(regions[1]["bbox"]["x2"], 50);
}

#[test]
fn parse_without_markers_reports_no_regions() {
    markbox()
        .arg("parse")
        .write_stdin("plain prose, nothing grounded")
        .assert()
        .success()
        .stdout(predicate::str::contains("no regions"));
}

#[test]
fn parse_missing_file_fails() {
    markbox()
        .args(["parse", "/definitely/not/here.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read"));
}

// ─── render (offline) ────────────────────────────────────────────────────────

#[test]
fn render_writes_jpeg_overlay() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = png_fixture(dir.path(), "scan.png");
    let markers_path = dir.path().join("markers.txt");
    std::fs::write(&markers_path, MARKED).unwrap();
    let out_path = dir.path().join("out.jpg");

    markbox()
        .arg("render")
        .arg(&image_path)
        .arg(&markers_path)
        .arg("-o")
        .arg(&out_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 regions"));

    let bytes = std::fs::read(&out_path).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8], "JPEG magic");
}

#[test]
fn render_default_output_uses_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = png_fixture(dir.path(), "page.png");
    let markers_path = dir.path().join("markers.txt");
    std::fs::write(&markers_path, MARKED).unwrap();

    markbox()
        .current_dir(dir.path())
        .arg("render")
        .arg(&image_path)
        .arg(&markers_path)
        .assert()
        .success();

    assert!(dir.path().join("ocr_overlay_page.png").exists());
}

#[test]
fn render_without_regions_fails() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = png_fixture(dir.path(), "scan.png");
    let markers_path = dir.path().join("markers.txt");
    std::fs::write(&markers_path, "no markers at all").unwrap();

    markbox()
        .arg("render")
        .arg(&image_path)
        .arg(&markers_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no regions"));
}

// ─── network failure surfaces cleanly ────────────────────────────────────────

#[test]
fn extract_against_unreachable_service_fails() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = png_fixture(dir.path(), "scan.png");

    markbox()
        .arg("extract")
        .arg(&image_path)
        .args(["--url", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unreachable"));
}
