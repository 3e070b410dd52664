use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes `text` next to `path` first, then swaps it into place so a crash
/// mid-write never leaves a truncated save behind.
pub(crate) fn write_save_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path_for(path);
    fs::write(&staging, text.as_bytes())?;
    swap_into_place(&staging, path)
}

pub(crate) fn remove_save(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}

fn swap_into_place(staging: &Path, target: &Path) -> io::Result<()> {
    // rename-over-existing is not portable, so drop the old file first.
    if let Err(error) = remove_save(target) {
        let _ = fs::remove_file(staging);
        return Err(error);
    }

    if let Err(error) = fs::rename(staging, target) {
        let _ = fs::remove_file(staging);
        return Err(error);
    }
    Ok(())
}

fn staging_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("save.json");
    let staging_name = format!("{file_name}.partial");
    match path.parent() {
        Some(parent) => parent.join(staging_name),
        None => PathBuf::from(staging_name),
    }
}
