//! Zip archive extraction.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};

/// Expands staged zip archives into a destination directory.
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Extract every entry of `archive_path` into `dest_dir`.
    ///
    /// Intermediate directories are created as needed; existing files at
    /// the same relative path are silently overwritten, which is how later
    /// sources win path collisions against earlier ones. Entry names that
    /// would escape the destination are rejected.
    pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<()> {
        let file = File::open(archive_path)?;
        let reader = BufReader::new(file);
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|e| Self::error(archive_path, format!("failed to open zip: {e}")))?;

        std::fs::create_dir_all(dest_dir)?;

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| Self::error(archive_path, format!("failed to read zip entry: {e}")))?;

            let Some(relative_path) = entry.enclosed_name() else {
                return Err(Self::error(
                    archive_path,
                    format!("path traversal detected in entry '{}'", entry.name()),
                ));
            };
            let outpath = dest_dir.join(relative_path);

            if entry.is_dir() {
                std::fs::create_dir_all(&outpath)?;
                continue;
            }

            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode))?;
                }
            }
        }

        Ok(())
    }

    fn error(archive: &Path, reason: String) -> Error {
        Error::Extract {
            archive: archive.to_path_buf(),
            reason,
        }
    }
}
