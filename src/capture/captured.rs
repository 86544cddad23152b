use std::{
    io,
    path::{Path, PathBuf},
};

use serde::Serialize;

/// A compressed photo sitting in the capture directory, waiting to be
/// uploaded. Whoever holds it is responsible for calling [`discard`](Self::discard)
/// once the photo is no longer needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub byte_len: u64,
}

impl CapturedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Deletes the file. Already gone is fine.
    pub fn discard(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
