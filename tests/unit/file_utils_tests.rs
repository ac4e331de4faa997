/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use xliffsheet::file_utils::{DirectorySink, FileManager, FileSource, PresetLocations, Selection};

use crate::common;

#[test]
fn test_find_files_withMixedExtensions_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("nested");
    FileManager::ensure_dir(&nested)?;
    common::create_test_file(temp_dir.path(), "b.xlf", "")?;
    common::create_test_file(temp_dir.path(), "a.XLIFF", "")?;
    common::create_test_file(&nested, "c.xlf", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;

    let found = FileManager::find_files(temp_dir.path(), &["xlf", "xliff"])?;

    let names: Vec<String> = found
        .iter()
        .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(names, vec!["a.XLIFF", "b.xlf", "nested/c.xlf"]);
    Ok(())
}

#[test]
fn test_collect_inputs_withFileOrMissingPath_shouldHandleBoth() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "fr.xlf", "")?;

    assert_eq!(FileManager::collect_inputs(&file, &["xlsx"])?, vec![file.clone()]);
    assert!(FileManager::collect_inputs(temp_dir.path().join("missing"), &["xlf"]).is_err());
    Ok(())
}

#[test]
fn test_write_bytes_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("deep").join("fr.xlf");

    FileManager::write_bytes(&path, b"content")?;

    assert!(FileManager::file_exists(&path));
    assert_eq!(FileManager::read_to_string(&path)?, "content");
    Ok(())
}

#[test]
fn test_preset_locations_shouldAnswerFromPresets() {
    let locations = PresetLocations::new(Some("en_US.xlf".into()), "out".into(), false);

    assert_eq!(locations.choose_input("reference"), Selection::Chosen("en_US.xlf".into()));
    assert_eq!(locations.choose_directory("tree").path(), Some(std::path::Path::new("out")));
}
