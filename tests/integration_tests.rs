mod common;

use assert_cmd::Command;
use common::{create_temp_directory, create_test_image_files, write_image};
use image::ImageFormat;
use predicates::prelude::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Runs the binary inside `dir` with a settings file private to the test.
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pic-compressor").unwrap();
    cmd.current_dir(dir)
        .env("PIC_COMPRESSOR_SETTINGS", dir.join("settings.json"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let temp_dir = create_temp_directory();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compress"))
        .stdout(predicate::str::contains("estimate"));
}

#[test]
fn test_compress_missing_args() {
    let temp_dir = create_temp_directory();
    cli(temp_dir.path()).arg("compress").assert().failure();
}

#[test]
fn test_compress_nonexistent_input() {
    let temp_dir = create_temp_directory();
    cli(temp_dir.path())
        .args(["compress", "nonexistent.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No image files found"));
}

#[test]
fn test_compress_single_image_to_jpeg() {
    let temp_dir = create_temp_directory();
    let input = write_image(temp_dir.path(), "photo.PNG", 120, 60, ImageFormat::Png);
    let out_dir = temp_dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    cli(temp_dir.path())
        .arg("compress")
        .arg(&input)
        .args(["-f", "jpeg", "-q", "70", "-m", "60", "-o"])
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Compressed 1 of 1"));

    let output = out_dir.join("photo-compressed.jpg");
    let bytes = fs::read(&output).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (60, 30));
}

#[test]
fn test_compress_custom_format_keeps_requested_extension() {
    let temp_dir = create_temp_directory();
    write_image(temp_dir.path(), "photo.jpg", 40, 20, ImageFormat::Jpeg);

    cli(temp_dir.path())
        .args(["compress", "photo.jpg", "-f", "heic"])
        .assert()
        .success();

    let bytes = fs::read(temp_dir.path().join("photo-compressed.heic")).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    assert!(!temp_dir.path().join("photo-compressed.jpg").exists());
}

#[test]
fn test_compress_directory_builds_archive_and_skips_broken() {
    let temp_dir = create_temp_directory();
    let images = temp_dir.path().join("images");
    fs::create_dir(&images).unwrap();
    create_test_image_files(&images);
    let out_dir = temp_dir.path().join("out");
    fs::create_dir(&out_dir).unwrap();

    cli(temp_dir.path())
        .arg("compress")
        .arg(&images)
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped broken.png"))
        .stdout(predicate::str::contains("Compressed 2 of 3"));

    let zip_bytes = fs::read(out_dir.join("compressed-images.zip")).unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(zip_bytes)).unwrap();
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, vec!["photo-compressed.png", "shot-compressed.png"]);
}

#[test]
fn test_compress_verbose_lists_each_output() {
    let temp_dir = create_temp_directory();
    write_image(temp_dir.path(), "a.png", 16, 16, ImageFormat::Png);
    write_image(temp_dir.path(), "b.png", 16, 16, ImageFormat::Png);

    cli(temp_dir.path())
        .args(["-v", "compress", "a.png", "b.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.png -> a-compressed.png"))
        .stdout(predicate::str::contains("b.png -> b-compressed.png"));

    cli(temp_dir.path())
        .args(["compress", "a.png", "b.png"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.png -> a-compressed.png").not());
}

#[test]
fn test_compress_duplicate_inputs_are_skipped() {
    let temp_dir = create_temp_directory();
    let input = write_image(temp_dir.path(), "once.png", 16, 16, ImageFormat::Png);

    cli(temp_dir.path())
        .arg("compress")
        .arg(&input)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 duplicate file(s)"));

    assert!(temp_dir.path().join("once-compressed.png").exists());
}

#[test]
fn test_compress_all_corrupt_fails() {
    let temp_dir = create_temp_directory();
    fs::write(temp_dir.path().join("a.png"), b"garbage").unwrap();
    fs::write(temp_dir.path().join("b.jpg"), b"more garbage").unwrap();

    cli(temp_dir.path())
        .args(["compress", "a.png", "b.jpg"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("None of the 2 images"));

    assert!(!temp_dir.path().join("compressed-images.zip").exists());
}

#[test]
fn test_estimate_json() {
    let temp_dir = create_temp_directory();
    let input = write_image(temp_dir.path(), "big.png", 256, 256, ImageFormat::Png);
    let total = fs::metadata(&input).unwrap().len();

    let output = cli(temp_dir.path())
        .args(["estimate", "big.png", "--json", "-f", "webp", "-q", "50"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let estimated = value["estimatedSize"].as_u64().unwrap();
    let saving = value["savingSize"].as_u64().unwrap();
    assert!(estimated <= total);
    assert_eq!(estimated + saving, total);
    assert!(value["savingRate"].as_u64().unwrap() <= 80);
}

#[test]
fn test_settings_preset_show_and_reset() {
    let temp_dir = create_temp_directory();

    cli(temp_dir.path())
        .args(["settings", "preset", "smallest"])
        .assert()
        .success();
    cli(temp_dir.path())
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"outputFormat\": \"jpeg\""))
        .stdout(predicate::str::contains("\"colorDepth\": \"8\""));

    cli(temp_dir.path())
        .args(["settings", "reset"])
        .assert()
        .success();
    cli(temp_dir.path())
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"outputFormat\": \"png\""));
}

#[test]
fn test_saved_settings_drive_compress() {
    let temp_dir = create_temp_directory();
    write_image(temp_dir.path(), "pic.png", 32, 32, ImageFormat::Png);

    cli(temp_dir.path())
        .args(["settings", "save", "-f", "webp", "-q", "60"])
        .assert()
        .success();
    cli(temp_dir.path())
        .args(["compress", "pic.png"])
        .assert()
        .success();

    let bytes = fs::read(temp_dir.path().join("pic-compressed.webp")).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
}

#[test]
fn test_info_prints_plan() {
    let temp_dir = create_temp_directory();
    write_image(temp_dir.path(), "wide.png", 400, 100, ImageFormat::Png);

    cli(temp_dir.path())
        .args(["info", "wide.png", "-m", "200", "-f", "original"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dimensions: 400x100"))
        .stdout(predicate::str::contains("Resize to 200x50"))
        .stdout(predicate::str::contains("PNG, compression level 9"));
}

#[test]
fn test_info_nonexistent_file() {
    let temp_dir = create_temp_directory();
    cli(temp_dir.path())
        .args(["info", "nonexistent.jpg"])
        .assert()
        .failure();
}
