//! Per-session owner identity.
//!
//! An owner id tags every stroke the local participant authors and selects
//! the local undo stack. It lives for the session; when a file path is given
//! it is kept there so restarting the same session reuses it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::stroke::OwnerId;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("failed to read owner id from {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write owner id to {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Fresh random owner id.
pub fn generate_owner_id() -> OwnerId {
    Uuid::new_v4().to_string()
}

/// Load the owner id stored at `path`, creating and storing one if the file
/// is missing or empty.
pub fn ensure_owner_id(path: &Path) -> Result<OwnerId, IdentityError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let id = contents.trim();
            if !id.is_empty() {
                return Ok(id.to_string());
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(IdentityError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let id = generate_owner_id();
    store_owner_id(path, &id)?;
    log::info!("Generated owner id {id}");
    Ok(id)
}

/// Overwrite the stored owner id.
pub fn store_owner_id(path: &Path, id: &str) -> Result<(), IdentityError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| IdentityError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, id).map_err(|source| IdentityError::Write {
        path: path.to_path_buf(),
        source,
    })
}
