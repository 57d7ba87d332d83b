//! Write-to-temp-then-rename, the only write pattern either durable store
//! uses. `rename` within the same directory is atomic on the platforms
//! this service targets, so readers never observe a half-written file.

use std::io::Write;
use std::path::Path;

use crate::error::StorageError;

pub fn write_atomic(path: &Path, contents: &str) -> Result<(), StorageError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = std::fs::File::create(&tmp_path)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
