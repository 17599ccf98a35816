//! Local cache of prebuilt assembler binaries.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::config::BINARY_PREFIX;

/// Scan the installation directory for cached release binaries.
///
/// A cache entry is a regular, executable file named `<prefix><tag>`; the map
/// key is the tag. A missing installation directory is an empty cache, not an
/// error, so the runner works on hosts without the image layout.
pub fn available_releases(install_dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut releases = BTreeMap::new();
    let entries = match fs::read_dir(install_dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(releases),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("scan install dir {}", install_dir.display()))
        }
    };
    for entry in entries {
        let entry = entry.with_context(|| format!("scan install dir {}", install_dir.display()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Some(tag) = name.strip_prefix(BINARY_PREFIX) else {
            continue;
        };
        if tag.is_empty() {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() || (metadata.permissions().mode() & 0o111) == 0 {
            continue;
        }
        releases.insert(tag.to_string(), entry.path());
    }
    Ok(releases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn add_binary(dir: &Path, name: &str, mode: u32) {
        let path = dir.join(name);
        File::create(&path).unwrap();
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_mode(mode);
        fs::set_permissions(&path, permissions).unwrap();
    }

    #[test]
    fn finds_executable_binaries_with_prefix() {
        let dir = TempDir::new().unwrap();
        add_binary(dir.path(), "shasta-Linux-0.6.0", 0o755);
        add_binary(dir.path(), "shasta-Linux-0.11.1", 0o755);

        let releases = available_releases(dir.path()).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(
            releases.get("0.6.0"),
            Some(&dir.path().join("shasta-Linux-0.6.0"))
        );
    }

    #[test]
    fn skips_non_executable_and_unrelated_files() {
        let dir = TempDir::new().unwrap();
        add_binary(dir.path(), "shasta-Linux-0.6.0", 0o644);
        add_binary(dir.path(), "README", 0o755);
        add_binary(dir.path(), "shasta-Linux-", 0o755);

        let releases = available_releases(dir.path()).unwrap();
        assert!(releases.is_empty());
    }

    #[test]
    fn missing_install_dir_is_an_empty_cache() {
        let dir = TempDir::new().unwrap();
        let releases = available_releases(&dir.path().join("absent")).unwrap();
        assert!(releases.is_empty());
    }
}
