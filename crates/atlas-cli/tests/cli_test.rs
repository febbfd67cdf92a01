//! Runs the `atlas` binary against a local table and art root.

use atlas_io::ImageData;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const TABLE: &str = r#"
local AtlasInfo = {
    ["Interface/Test/Sheet"] = {
        ["Test-Left"] = { 16, 16, 0, 0, 0.5, 0, 1, false, false },
        ["Test-Corner"] = { 8, 8, 0, 0.5, 1, 0.5, 1, false, false },
    },
}
return AtlasInfo
"#;

/// Temp layout: `atlas.lua`, `art/Interface/Test/Sheet.blp`, `out/`.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("atlas.lua"), TABLE).unwrap();

        let sheet_dir = dir.path().join("art/Interface/Test");
        fs::create_dir_all(&sheet_dir).unwrap();
        let data = (0..16 * 16)
            .flat_map(|i| {
                if i % 16 < 8 {
                    [200u8, 10, 10, 255]
                } else {
                    [10u8, 10, 200, 255]
                }
            })
            .collect();
        atlas_io::write(sheet_dir.join("Sheet.blp"), &ImageData::from_u8(16, 16, 4, data))
            .unwrap();

        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_atlas"))
            .current_dir(self.dir.path())
            .args(args)
            .arg("--info")
            .arg(self.path("atlas.lua"))
            .arg("--path")
            .arg(self.path("art"))
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn dimensions(path: &Path) -> (u32, u32) {
    let image = atlas_io::read(path).unwrap();
    (image.width, image.height)
}

// ============================================================================
// extract
// ============================================================================

#[test]
fn test_extract_default_output() {
    let fx = Fixture::new();
    let output = fx.run(&["extract", "Test-Left"]);

    assert!(output.status.success(), "{:?}", output);
    assert!(stdout(&output).contains("Found atlas Test-Left in file Interface/Test/Sheet"));
    assert_eq!(dimensions(&fx.path("Test-Left.png")), (8, 16));
}

#[test]
fn test_extract_explicit_output_with_resize() {
    let fx = Fixture::new();
    let output = fx.run(&["extract", "Test-Corner", "corner.png", "--resize"]);

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(dimensions(&fx.path("corner.png")), (8, 8));
}

#[test]
fn test_extract_same_dir() {
    let fx = Fixture::new();
    let output = fx.run(&["extract", "Test-Left", "--same-dir"]);

    assert!(output.status.success(), "{:?}", output);
    assert!(fx.path("art/Interface/Test/Test-Left.png").exists());
}

#[test]
fn test_extract_not_found_exits_2() {
    let fx = Fixture::new();
    let output = fx.run(&["extract", "Nope"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("Atlas name Nope not found in the Lua table"));
}

#[test]
fn test_extract_invalid_record_exits_1() {
    let fx = Fixture::new();
    let table = TABLE.replace(
        "[\"Test-Corner\"] = { 8, 8, 0, 0.5, 1, 0.5, 1, false, false },",
        "[\"Test-Corner\"] = { 8, 8, 0.5, 1, 0.5, 1, false, false, \"1x\" },",
    );
    fs::write(fx.path("atlas.lua"), table).unwrap();

    let output = fx.run(&["extract", "Test-Corner"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid record Interface/Test/Sheet/Test-Corner"), "{stderr}");

    // The rest of the table still works
    let output = fx.run(&["extract", "Test-Left"]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(dimensions(&fx.path("Test-Left.png")), (8, 16));
}

// ============================================================================
// deconstruct
// ============================================================================

#[test]
fn test_deconstruct_by_part_name() {
    let fx = Fixture::new();
    let output = fx.run(&["deconstruct", "Test-Corner", "--output-dir", "parts"]);

    assert!(output.status.success(), "{:?}", output);
    let text = stdout(&output);
    assert!(text.contains("Number of assets to extract: 2"));
    assert!(text.contains("Processed: 2 written, 0 skipped, 0 failed"));
    assert_eq!(dimensions(&fx.path("parts/Sheet/Test-Left.png")), (8, 16));
    assert_eq!(dimensions(&fx.path("parts/Sheet/Test-Corner.png")), (8, 8));

    let again = fx.run(&["deconstruct", "Test-Corner", "--output-dir", "parts"]);
    assert!(stdout(&again).contains("Processed: 0 written, 2 skipped, 0 failed"));
}

#[test]
fn test_deconstruct_by_file() {
    let fx = Fixture::new();
    let sheet = fx.path("art/Interface/Test/Sheet.blp");
    let output = fx.run(&["deconstruct", sheet.to_str().unwrap()]);

    assert!(output.status.success(), "{:?}", output);
    assert!(stdout(&output).contains("Looking for file: Interface/Test/Sheet"));
    assert!(fx.path("output/Sheet/Test-Corner.png").exists());
}

#[test]
fn test_deconstruct_missing_sheet_fails() {
    let fx = Fixture::new();
    fs::remove_file(fx.path("art/Interface/Test/Sheet.blp")).unwrap();
    let output = fx.run(&["deconstruct", "Test-Left"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("2 failed"));
}

// ============================================================================
// slice
// ============================================================================

#[test]
fn test_slice_command() {
    let fx = Fixture::new();
    let sheet = fx.path("art/Interface/Test/Sheet.blp");
    let out = fx.path("half.png");
    let output = Command::new(env!("CARGO_BIN_EXE_atlas"))
        .args(["slice", sheet.to_str().unwrap(), out.to_str().unwrap()])
        .args(["0.5", "1", "0", "0.5"])
        .output()
        .unwrap();

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(dimensions(&out), (8, 8));
    let pixels = atlas_io::read(&out).unwrap().to_u8();
    assert_eq!(&pixels[0..4], &[10, 10, 200, 255]);
}
