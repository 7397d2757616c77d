/*!
 * Tests for file utility functions and the dataset file
 */

use anyhow::Result;
use codex_translator::dataset::DatasetFile;
use codex_translator::errors::AppError;
use codex_translator::file_utils::FileManager;

use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withMissingParent_shouldCreateDirs() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b").join("out.txt");

    FileManager::write_to_file(&nested, "first")?;
    FileManager::write_to_file(&nested, "second")?;

    assert_eq!(FileManager::read_to_string(&nested)?, "second");
    Ok(())
}

#[test]
fn test_ensure_dir_withEmptyPath_shouldSucceed() -> Result<()> {
    // A bare file name such as "output.txt" has an empty parent
    FileManager::ensure_dir("")?;
    Ok(())
}

#[test]
fn test_read_to_string_withMissingFile_shouldNamePath() {
    let error = FileManager::read_to_string("missing/codex.json").unwrap_err();
    assert!(format!("{:#}", error).contains("missing/codex.json"));
}

#[test]
fn test_dataset_load_withMissingFile_shouldReturnFileError() {
    let dataset = DatasetFile::new("missing/codex.json");
    assert!(matches!(dataset.load(), Err(AppError::File(_))));
}

#[test]
fn test_dataset_load_withInvalidJson_shouldReturnJsonError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "codex.json", "[{\"character_name\": 1}]")?;

    let dataset = DatasetFile::new(&path);
    assert!(matches!(dataset.load(), Err(AppError::Json(_))));
    Ok(())
}

#[test]
fn test_dataset_save_shouldWritePrettyJsonWithExtras() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("codex.json");
    let mut record = common::record("Alana", "阿拉娜", "旅行者");
    record.extra.insert("popularity".to_string(), serde_json::Value::from(7));

    let dataset = DatasetFile::new(&path);
    dataset.save(&[record.clone()])?;

    let content = std::fs::read_to_string(&path)?;
    assert!(content.starts_with("[\n  {\n"));
    // Non-ASCII text is stored as-is, not escaped
    assert!(content.contains("阿拉娜"));
    assert!(content.contains("\"popularity\": 7"));
    assert_eq!(dataset.load()?, vec![record]);
    Ok(())
}
