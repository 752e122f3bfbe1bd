//! Persistent enable/disable flags, keyed by plugin generic name.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

type Groups = BTreeMap<String, BTreeMap<String, bool>>;

/// Enable flags stored as `group -> generic name -> bool` in a JSON file.
#[derive(Debug)]
pub struct EnabledStore {
    path: Option<PathBuf>,
    group: String,
    groups: Groups,
}

impl EnabledStore {
    /// Open the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>, group: impl Into<String>) -> Self {
        let path = path.into();
        let groups = match Self::read(&path) {
            Ok(groups) => groups,
            Err(e) => {
                tracing::warn!("Ignoring unreadable plugin state {:?}: {}", path, e);
                Groups::new()
            }
        };

        Self {
            path: Some(path),
            group: group.into(),
            groups,
        }
    }

    /// A store that is never written to disk.
    pub fn in_memory(group: impl Into<String>) -> Self {
        Self {
            path: None,
            group: group.into(),
            groups: Groups::new(),
        }
    }

    fn read(path: &Path) -> Result<Groups> {
        if !path.exists() {
            return Ok(Groups::new());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Whether a plugin should load. Plugins default to enabled.
    pub fn is_enabled(&self, generic_name: &str) -> bool {
        self.groups
            .get(&self.group)
            .and_then(|flags| flags.get(generic_name))
            .copied()
            .unwrap_or(true)
    }

    /// Record a flag and persist it.
    pub fn set_enabled(&mut self, generic_name: &str, enabled: bool) -> Result<()> {
        self.groups
            .entry(self.group.clone())
            .or_default()
            .insert(generic_name.to_string(), enabled);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.groups)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_to_enabled() {
        let store = EnabledStore::in_memory("KIPI/EnabledPlugin");
        assert!(store.is_enabled("anything"));
        assert_eq!(store.group(), "KIPI/EnabledPlugin");
    }

    #[test]
    fn test_flags_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("plugins.json");

        let mut store = EnabledStore::open(&path, "KIPI/EnabledPlugin");
        store.set_enabled("flickrexport", false).unwrap();

        let reopened = EnabledStore::open(&path, "KIPI/EnabledPlugin");
        assert!(!reopened.is_enabled("flickrexport"));
        assert!(reopened.is_enabled("sendimages"));

        let other_group = EnabledStore::open(&path, "Other/EnabledPlugin");
        assert!(other_group.is_enabled("flickrexport"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plugins.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = EnabledStore::open(&path, "KIPI/EnabledPlugin");
        assert!(store.is_enabled("flickrexport"));
    }
}
