//! Integration tests for the command-line interface

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn text_replacer(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_text-replacer"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A directory with a text dictionary and a document to translate.
fn setup_text_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("dictionary.txt"),
        "Hello=Bonjour\nworld=monde\nHello world=Salut tout le monde\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("story.txt"),
        "Hello world!\nHello, world.\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    let output = text_replacer(&["--help"], dir.path());

    assert!(output.status.success());
    let out = stdout(&output);
    for cmd in ["replace", "patch", "check", "presets"] {
        assert!(out.contains(cmd), "missing {cmd} in help:\n{out}");
    }
}

#[test]
fn test_replace_with_discovered_dictionary() {
    let dir = setup_text_workspace();
    let output = text_replacer(&["replace", "--input", "story.txt"], dir.path());

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("story_translated.txt"));

    let translated = fs::read_to_string(dir.path().join("story_translated.txt")).unwrap();
    assert_eq!(translated, "Salut tout le monde!\nBonjour, monde.\n");
}

#[test]
fn test_replace_with_wrap_preset() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dictionary.txt"), "x=y\n").unwrap();
    fs::write(dir.path().join("in.txt"), "aaaa bbbb cccc\n").unwrap();

    let output = text_replacer(
        &["replace", "-i", "in.txt", "--wrap", "20", "--preset", "rtk1011"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let translated = fs::read_to_string(dir.path().join("in_translated.txt")).unwrap();
    assert_eq!(
        translated,
        "aaaa[0x0D][0x0A]bbbb[0x0D][0x0A]cccc[0x0D][0x0A]\n"
    );
}

#[test]
fn test_replace_marker_implies_default_wrap() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dictionary.txt"), "x=y\n").unwrap();
    let line = vec!["abcd"; 20].join(" ");
    fs::write(dir.path().join("in.txt"), format!("{line}\nshort\n")).unwrap();

    let output = text_replacer(&["replace", "-i", "in.txt", "--marker", "|"], dir.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    // 80 columns minus one marker char
    let translated = fs::read_to_string(dir.path().join("in_translated.txt")).unwrap();
    assert_eq!(
        translated,
        format!(
            "{}|{}|\nshort\n",
            vec!["abcd"; 16].join(" "),
            vec!["abcd"; 4].join(" ")
        )
    );
}

#[test]
fn test_replace_preset_without_wrap_limit() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("dictionary.txt"), "x=y\n").unwrap();
    let line = vec!["abcd"; 20].join(" ");
    fs::write(dir.path().join("in.txt"), format!("{line}\n")).unwrap();

    let output = text_replacer(&["replace", "-i", "in.txt", "--preset", "rtk1011"], dir.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let translated = fs::read_to_string(dir.path().join("in_translated.txt")).unwrap();
    assert_ne!(translated, format!("{line}\n"));
    assert!(translated.ends_with("[0x0D][0x0A]\n"));
    assert!(translated
        .split("[0x0D][0x0A]")
        .all(|segment| segment.trim_end().chars().count() <= 80 - 12));
}

#[test]
fn test_replace_marker_and_preset_conflict() {
    let dir = setup_text_workspace();
    let output = text_replacer(
        &[
            "replace", "-i", "story.txt", "--wrap", "10", "--marker", "|", "--preset", "other",
        ],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(!dir.path().join("story_translated.txt").exists());
}

#[test]
fn test_replace_duplicate_dictionary_fails_without_output() {
    let dir = setup_text_workspace();
    fs::write(dir.path().join("dictionary.txt"), "a=1\nb=2\na=3\n").unwrap();

    let output = text_replacer(&["replace", "-i", "story.txt"], dir.path());

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Duplicate keys"));
    assert!(dir.path().join("Duplicate.csv").exists());
    assert!(!dir.path().join("story_translated.txt").exists());
    // text dictionaries are left alone
    assert_eq!(
        fs::read_to_string(dir.path().join("dictionary.txt")).unwrap(),
        "a=1\nb=2\na=3\n"
    );
}

#[test]
fn test_replace_with_config_file() {
    let dir = setup_text_workspace();
    fs::write(
        dir.path().join("run.toml"),
        r#"
[wrap]
enabled = true
limit = 8
"#,
    )
    .unwrap();
    fs::write(dir.path().join("story.txt"), "world world world\n").unwrap();

    let output = text_replacer(
        &["replace", "-i", "story.txt", "--config", "run.toml"],
        dir.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let translated = fs::read_to_string(dir.path().join("story_translated.txt")).unwrap();
    assert_eq!(translated, "monde\nmonde\nmonde\n");
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = setup_text_workspace();
    fs::write(
        dir.path().join("run.toml"),
        "[wrap]\nenabled = true\npreset = \"missing\"\n",
    )
    .unwrap();

    let output = text_replacer(
        &["replace", "-i", "story.txt", "-c", "run.toml"],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown marker preset 'missing'"));
}

#[test]
fn test_patch_applies_valid_rows() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rom.bin"), [0u8; 16]).unwrap();
    fs::write(
        dir.path().join("patch_data.csv"),
        "Offset,Value,Bytes\n0x0,0xDE 0xAD,2\n4,OK,4\n0x5,XX,2\n",
    )
    .unwrap();

    let output = text_replacer(&["patch", "--input", "rom.bin"], dir.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Summary:"));

    let patched = fs::read(dir.path().join("rom_patched.bin")).unwrap();
    assert_eq!(&patched[..8], &[0xDE, 0xAD, 0, 0, b'O', b'K', 0, 0]);
    assert_eq!(patched.len(), 16);

    // the overlapping row was moved out of the table
    let table = fs::read_to_string(dir.path().join("patch_data.csv")).unwrap();
    assert!(!table.contains("XX"));
    let report = fs::read_to_string(dir.path().join("Overlap.csv")).unwrap();
    assert!(report.contains("XX"));
    assert!(report.contains("overlap-caused"));
}

#[test]
fn test_patch_without_table_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rom.bin"), [0u8; 4]).unwrap();

    let output = text_replacer(&["patch", "-i", "rom.bin"], dir.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no data source"));
}

#[test]
fn test_check_dictionary_ok() {
    let dir = setup_text_workspace();
    let output = text_replacer(&["check", "--dict", "dictionary.txt"], dir.path());

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("3 dictionary entries"));
}

#[test]
fn test_check_patches_reports_conflicts() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("rows.csv"),
        "Offset,Value,Bytes\n16,AB,2\n16,CD,2\n32,EF,2\n",
    )
    .unwrap();
    let reports = dir.path().join("reports");
    fs::create_dir(&reports).unwrap();

    let output = text_replacer(
        &["check", "--patches", "rows.csv", "--report-dir", "reports"],
        dir.path(),
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Patch data errors"));
    assert!(reports.join("Overlap.csv").exists());
    assert!(!dir.path().join("Overlap.csv").exists());
}

#[test]
fn test_presets_listed() {
    let dir = TempDir::new().unwrap();
    let output = text_replacer(&["presets"], dir.path());

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("rtk1011 [0x0D] [0x0A]"));
    assert!(out.contains("rtk14"));
    assert!(out.contains("other"));
}
