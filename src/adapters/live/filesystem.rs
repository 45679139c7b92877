//! Live filesystem adapter using `std::fs`.

use std::io;
use std::path::Path;

use uuid::Uuid;

use crate::ports::filesystem::FileSystem;

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

impl FileSystem for LiveFileSystem {
    fn read_to_string(
        &self,
        path: &Path,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn replace(
        &self,
        path: &Path,
        contents: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let name = path
            .file_name()
            .ok_or_else(|| format!("not a file path: {}", path.display()))?
            .to_string_lossy();
        // Same directory as the target so the rename never crosses filesystems.
        let staging = path.with_file_name(format!(".{name}.{}", Uuid::new_v4()));
        if let Err(e) = swap_in(&staging, path, contents) {
            let _ = std::fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Writes `contents` to `staging`, gives it the permissions of `path` and
/// renames it over `path`.
fn swap_in(staging: &Path, path: &Path, contents: &str) -> io::Result<()> {
    std::fs::write(staging, contents)?;
    match std::fs::metadata(path) {
        Ok(meta) => std::fs::set_permissions(staging, meta.permissions())?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::fs::rename(staging, path)
}
