//! Checkpoint handling for pause/resume.
//!
//! The engine keeps resume state in a control file next to the output,
//! `<output>.aria2`. The engine owns the file's contents and deletes it when
//! a download finishes; this module only locates and removes it.

use std::io;
use std::path::{Path, PathBuf};

/// Suffix the engine appends to the output path for its control file.
pub const CONTROL_SUFFIX: &str = ".aria2";

/// Checkpoint artifacts of one task, addressed by its output path.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    output: PathBuf,
}

impl Checkpoint {
    pub fn for_output(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Path of the engine control file (`<output>.aria2`).
    pub fn control_path(&self) -> PathBuf {
        let mut os = self.output.clone().into_os_string();
        os.push(CONTROL_SUFFIX);
        PathBuf::from(os)
    }

    /// True when a control file from an earlier run is present.
    pub fn exists(&self) -> bool {
        self.control_path().exists()
    }

    /// Removes the control file, keeping the partial output.
    pub fn remove_control(&self) -> io::Result<()> {
        remove_if_exists(&self.control_path())
    }

    /// Removes both the control file and the (partial or complete) output.
    pub fn remove_all(&self) -> io::Result<()> {
        remove_if_exists(&self.control_path())?;
        remove_if_exists(&self.output)
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
