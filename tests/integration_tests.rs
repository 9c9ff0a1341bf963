mod common;

use assert_cmd::Command;
use common::{create_temp_directory, write_corrupt_file, write_test_jpeg, write_test_png};
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("compress-img").unwrap()
}

#[test]
fn test_cli_help() {
    cli().arg("--help").assert().success();
}

#[test]
fn test_missing_files_argument() {
    cli().assert().failure();
}

#[test]
fn test_invalid_quality_exits_before_touching_files() {
    let temp_dir = create_temp_directory();
    let input = write_test_png(temp_dir.path(), "photo.png");
    let before = std::fs::read(&input).unwrap();

    for quality in ["0", "101", "-5", "abc"] {
        cli()
            .arg(&input)
            .args(["--quality", quality])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Quality must be between 1 and 100"));
    }

    assert_eq!(std::fs::read(&input).unwrap(), before);
    assert!(!temp_dir.path().join("photo-compressed.png").exists());
}

#[test]
fn test_default_suffix_with_format_override() {
    let temp_dir = create_temp_directory();
    let input = write_test_png(temp_dir.path(), "photo.png");

    cli()
        .arg(&input)
        .args(["-f", "webp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ photo.png"))
        .stdout(predicate::str::contains("photo-compressed.webp"))
        .stdout(predicate::str::contains("Successfully compressed 1/1 image(s)"));

    let output = temp_dir.path().join("photo-compressed.webp");
    assert_eq!(
        image::guess_format(&std::fs::read(&output).unwrap()).unwrap(),
        image::ImageFormat::WebP
    );
    assert!(input.exists());
}

#[test]
fn test_jpeg_output_uses_jpg_extension() {
    let temp_dir = create_temp_directory();
    let input = write_test_png(temp_dir.path(), "photo.png");

    cli().arg(&input).args(["-f", "jpeg", "-o", "_small"]).assert().success();

    assert!(temp_dir.path().join("photo_small.jpg").exists());
}

#[test]
fn test_source_format_is_kept_by_default() {
    let temp_dir = create_temp_directory();
    let input = write_test_jpeg(temp_dir.path(), "shot.jpg");

    cli().arg(&input).args(["-q", "50"]).assert().success();

    let output = temp_dir.path().join("shot-compressed.jpg");
    assert_eq!(
        image::guess_format(&std::fs::read(output).unwrap()).unwrap(),
        image::ImageFormat::Jpeg
    );
}

#[test]
fn test_replace_overwrites_input() {
    let temp_dir = create_temp_directory();
    let input = write_test_png(temp_dir.path(), "photo.png");
    let before = std::fs::read(&input).unwrap();

    cli()
        .arg(&input)
        .args(["--replace", "-f", "jpeg"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Output: {}", input.display())));

    let after = std::fs::read(&input).unwrap();
    assert_ne!(after, before);
    assert_eq!(image::guess_format(&after).unwrap(), image::ImageFormat::Jpeg);
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_failed_file_does_not_stop_batch() {
    let temp_dir = create_temp_directory();
    let good = write_test_png(temp_dir.path(), "good.png");
    let broken = write_corrupt_file(temp_dir.path(), "broken.png");

    cli()
        .arg(&broken)
        .arg(&good)
        .assert()
        .success()
        .stderr(predicate::str::contains("✗ broken.png"))
        .stdout(predicate::str::contains("✓ good.png"))
        .stdout(predicate::str::contains("Successfully compressed 1/2 image(s)"));

    assert!(temp_dir.path().join("good-compressed.png").exists());
    assert!(!temp_dir.path().join("broken-compressed.png").exists());
}

#[test]
fn test_nonexistent_file_is_reported() {
    let temp_dir = create_temp_directory();
    let missing = temp_dir.path().join("missing.jpg");

    cli()
        .arg(&missing)
        .assert()
        .success()
        .stderr(predicate::str::contains("✗ missing.jpg"))
        .stdout(predicate::str::contains("Successfully compressed").not());
}

#[test]
fn test_glob_pattern_is_expanded() {
    let temp_dir = create_temp_directory();
    write_test_png(temp_dir.path(), "a.png");
    write_test_png(temp_dir.path(), "b.png");

    let pattern = format!("{}/*.png", temp_dir.path().display());
    cli()
        .arg(pattern)
        .args(["-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully compressed 2/2 image(s)"));

    assert!(temp_dir.path().join("a-compressed.png").exists());
    assert!(temp_dir.path().join("b-compressed.png").exists());
}

#[test]
fn test_quiet_mode_prints_only_errors() {
    let temp_dir = create_temp_directory();
    let good = write_test_png(temp_dir.path(), "good.png");
    let broken = write_corrupt_file(temp_dir.path(), "broken.png");

    cli()
        .arg(&good)
        .arg(&broken)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("✗ broken.png"));
}

#[test]
fn test_each_file_is_reported_before_the_summary() {
    let temp_dir = create_temp_directory();
    let first = write_test_png(temp_dir.path(), "first.png");
    let broken = write_corrupt_file(temp_dir.path(), "broken.png");
    let last = write_test_jpeg(temp_dir.path(), "last.jpg");

    let output = cli().arg(&first).arg(&broken).arg(&last).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let first_at = stdout.find("✓ first.png").unwrap();
    let last_at = stdout.find("✓ last.jpg").unwrap();
    let summary_at = stdout.find("Successfully compressed 2/3 image(s)").unwrap();
    assert!(first_at < last_at);
    assert!(last_at < summary_at);
    assert!(stdout.contains("Total: "));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("✗ broken.png: "));
}
