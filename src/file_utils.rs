use anyhow::{Result, Context};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::codec::CaptionFormat;

// @module: File and directory utilities

/// Suffix appended to the source stem when no usable destination name is given
pub const CONVERTED_SUFFIX: &str = "-converted";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    // @checks: Existing file with a caption extension we can read
    pub fn is_caption_file<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        Self::file_exists(path) && CaptionFormat::from_path(path).is_some()
    }

    // @generates: Destination stem for converted captions
    // @params: source file, requested name, destination directory
    pub fn destination_stem<P1: AsRef<Path>, P2: AsRef<Path>>(
        source_file: P1,
        requested_name: Option<&str>,
        dest_dir: P2,
    ) -> String {
        let source_file = source_file.as_ref();
        let source_stem = source_file.file_stem().unwrap_or_default().to_string_lossy().to_string();
        let converted = format!("{}{}", source_stem, CONVERTED_SUFFIX);

        let requested = requested_name
            .map(|name| Path::new(name).file_stem().unwrap_or_default().to_string_lossy().to_string())
            .filter(|stem| !stem.is_empty());

        let Some(requested) = requested else {
            return converted;
        };

        // Never overwrite the source itself
        let source_dir = source_file.parent().unwrap_or(Path::new(""));
        if requested == source_stem && Self::same_directory(source_dir, dest_dir.as_ref()) {
            converted
        } else {
            requested
        }
    }

    // @generates: Output path for one destination format
    pub fn generate_output_path<P: AsRef<Path>>(dest_dir: P, stem: &str, format: CaptionFormat) -> PathBuf {
        let mut output_filename = stem.to_string();
        output_filename.push('.');
        output_filename.push_str(format.extension());
        dest_dir.as_ref().join(output_filename)
    }

    fn same_directory(a: &Path, b: &Path) -> bool {
        let normalize = |p: &Path| {
            let p = if p.as_os_str().is_empty() { Path::new(".") } else { p };
            fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf())
        };
        normalize(a) == normalize(b)
    }

    /// Find readable caption files under a directory, in a stable order
    pub fn find_caption_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && CaptionFormat::from_path(path).is_some() {
                result.push(path.to_path_buf());
            }
        }

        Ok(result)
    }

    /// Read a file to bytes
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write bytes to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
