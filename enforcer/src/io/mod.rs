//! I/O seams and adapters for the enforcement engine.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod community_api;
pub mod config;
pub mod directory;
pub mod ledger;
pub mod messages;
pub mod messenger;

/// Write `contents` to `path` via a sibling `<name>.tmp` file and a rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = temp_path(path);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parents_and_leaves_no_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/dir/state.json");

        write_atomic(&path, "{}\n").expect("write");
        write_atomic(&path, "[]\n").expect("overwrite");

        assert_eq!(fs::read_to_string(&path).expect("read"), "[]\n");
        assert!(!temp.path().join("nested/dir/state.json.tmp").exists());
    }
}
