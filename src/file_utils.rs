use anyhow::{Result, Context};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Outcome of asking the user (or a preset) for a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen(PathBuf),
    Cancelled,
}

impl Selection {
    // @returns: Chosen path, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Selection::Chosen(path) => Some(path),
            Selection::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Selection::Cancelled)
    }
}

/// Picks an existing input file
pub trait FileSource {
    fn choose_input(&self, purpose: &str) -> Selection;
}

/// Picks where to save one output file, given its suggested name
pub trait FileSink {
    fn choose_save_path(&self, suggested_name: &str) -> Selection;
}

/// Picks a directory to write a set of outputs into
pub trait DirectorySink {
    fn choose_directory(&self, purpose: &str) -> Selection;
}

// @struct: Locations fixed up front on the command line
#[derive(Debug, Clone, Default)]
pub struct PresetLocations {
    // @field: Answer to every input request
    pub input: Option<PathBuf>,
    // @field: Directory outputs are saved into
    pub output_dir: PathBuf,
    // @field: Replace files that already exist
    pub force_overwrite: bool,
}

impl PresetLocations {
    pub fn new(input: Option<PathBuf>, output_dir: PathBuf, force_overwrite: bool) -> Self {
        Self {
            input,
            output_dir,
            force_overwrite,
        }
    }
}

impl FileSource for PresetLocations {
    fn choose_input(&self, purpose: &str) -> Selection {
        match &self.input {
            Some(path) => {
                debug!("Using {:?} as {}", path, purpose);
                Selection::Chosen(path.clone())
            }
            None => Selection::Cancelled,
        }
    }
}

impl FileSink for PresetLocations {
    fn choose_save_path(&self, suggested_name: &str) -> Selection {
        let path = self.output_dir.join(suggested_name);
        if path.exists() && !self.force_overwrite {
            warn!("Skipping {:?}, file already exists (use -f to force overwrite)", path);
            return Selection::Cancelled;
        }
        Selection::Chosen(path)
    }
}

impl DirectorySink for PresetLocations {
    fn choose_directory(&self, purpose: &str) -> Selection {
        debug!("Writing {} into {:?}", purpose, self.output_dir);
        Selection::Chosen(self.output_dir.clone())
    }
}

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
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find files with any of the given extensions, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    let ext = ext.to_string_lossy();
                    if extensions
                        .iter()
                        .any(|wanted| ext.eq_ignore_ascii_case(wanted.trim_start_matches('.')))
                    {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// The file itself, or every matching file below a directory
    pub fn collect_inputs<P: AsRef<Path>>(input: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let input = input.as_ref();
        if Self::file_exists(input) {
            Ok(vec![input.to_path_buf()])
        } else if Self::dir_exists(input) {
            Self::find_files(input, extensions)
        } else {
            Err(anyhow::anyhow!("Input path does not exist: {:?}", input))
        }
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Read a file to bytes
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write bytes to a file, creating the parent directory
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }
}
