//! Overwrite-merge of local content into the output tree.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

/// Recursively mirror `source` into `dest`.
///
/// Missing destination directories are created and every file is copied.
/// An existing destination file is overwritten and reported as a warning
/// with its relative path; collisions are expected when merging several
/// trees into one output. The cancellation token is polled at every step
/// of the walk.
pub fn copy_directory(
    source: &Path,
    dest: &Path,
    recursive: bool,
    cancel: &CancelToken,
) -> Result<()> {
    if !source.is_dir() {
        return Err(Error::FolderNotFound {
            path: source.to_path_buf(),
        });
    }

    let mut walker = WalkDir::new(source).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    for entry in walker {
        cancel.check()?;

        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .expect("walked entries live under the walk root");

        if relative.as_os_str().is_empty() {
            fs::create_dir_all(dest)?;
            continue;
        }

        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            if target.exists() {
                log::warn!("Overwriting file '{}'", relative.display());
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Copy a single file into `dest_dir`, overwriting any existing file of
/// the same name. Returns the destination path.
pub fn copy_file_into(file: &Path, dest_dir: &Path) -> Result<PathBuf> {
    if !file.is_file() {
        return Err(Error::FileNotFound {
            path: file.to_path_buf(),
        });
    }

    let file_name = file.file_name().ok_or_else(|| Error::FileNotFound {
        path: file.to_path_buf(),
    })?;
    let target = dest_dir.join(file_name);

    if target.exists() {
        log::warn!("Overwriting file '{}'", Path::new(file_name).display());
    }
    fs::copy(file, &target)?;

    Ok(target)
}
