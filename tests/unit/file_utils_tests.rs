/*!
 * Tests for file utility functions
 */

use std::fs;
use std::path::Path;
use anyhow::Result;
use caption_converter::codec::CaptionFormat;
use caption_converter::file_utils::FileManager;
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path joins directory, stem and extension
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let output_path = FileManager::generate_output_path(Path::new("/tmp/output"), "talk-converted", CaptionFormat::Srt);
    assert_eq!(output_path, Path::new("/tmp/output/talk-converted.srt"));
}

/// Test that no requested name gives the converted suffix
#[test]
fn test_destination_stem_withoutRequestedName_shouldAppendSuffix() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = temp_dir.path().join("talk.vtt");

    assert_eq!(FileManager::destination_stem(&source, None, temp_dir.path()), "talk-converted");
    assert_eq!(FileManager::destination_stem(&source, Some(""), temp_dir.path()), "talk-converted");

    Ok(())
}

/// Test that a requested name is used without its extension
#[test]
fn test_destination_stem_withRequestedName_shouldStripExtension() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let source = temp_dir.path().join("talk.vtt");

    assert_eq!(FileManager::destination_stem(&source, Some("renamed.srt"), temp_dir.path()), "renamed");

    Ok(())
}

/// Test that the source name is only reused when writing to another directory
#[test]
fn test_destination_stem_withSourceName_shouldAvoidOverwritingSource() -> Result<()> {
    let source_dir = common::create_temp_dir()?;
    let other_dir = common::create_temp_dir()?;
    let source = source_dir.path().join("talk.vtt");

    assert_eq!(FileManager::destination_stem(&source, Some("talk"), source_dir.path()), "talk-converted");
    assert_eq!(FileManager::destination_stem(&source, Some("talk.vtt"), other_dir.path()), "talk");

    Ok(())
}

/// Test that caption files are found recursively, sorted, and other files ignored
#[test]
fn test_find_caption_files_withMixedFiles_shouldReturnCaptionFilesOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("season1");
    fs::create_dir(&nested)?;

    common::create_test_file(temp_dir.path(), "b.srt", "")?;
    common::create_test_file(temp_dir.path(), "a.vtt", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    common::create_test_file(&nested, "c.ttml", "")?;

    let files = FileManager::find_caption_files(temp_dir.path())?;
    let names: Vec<String> = files
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.vtt", "b.srt", "c.ttml"]);
    assert!(files.iter().all(|path| FileManager::is_caption_file(path)));

    Ok(())
}

/// Test that write_to_file creates missing parent directories
#[test]
fn test_write_to_file_withMissingParent_shouldCreateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("out").join("talk.vtt");

    FileManager::write_to_file(&path, b"WEBVTT\n\n")?;

    assert_eq!(FileManager::read_bytes(&path)?, b"WEBVTT\n\n");
    Ok(())
}
