//! Mode storage and persistence.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashmap::DashMap;
use thiserror::Error;

use crate::modes::mode::OperatingMode;

/// Errors reading or writing the persisted mode map.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("malformed mode file {}: {source}", .path.display())]
    Decode { path: PathBuf, source: serde_json::Error },

    #[error("failed to encode modes: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Per-backend mode overrides, persisted as a JSON `{ id: MODE_NAME }` map.
///
/// In-memory state is authoritative; persistence failures are reported to the
/// caller but never roll back the in-memory change.
#[derive(Debug)]
pub struct ModeRegistry {
    path: Option<PathBuf>,
    modes: DashMap<String, OperatingMode>,
    /// Serializes full rewrites of the file.
    save_lock: Mutex<()>,
}

impl ModeRegistry {
    /// Registry backed by the given file. Nothing is read until `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            modes: DashMap::new(),
            save_lock: Mutex::new(()),
        }
    }

    /// Registry with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            modes: DashMap::new(),
            save_lock: Mutex::new(()),
        }
    }

    /// Create and load, logging (not failing) on persistence errors.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let registry = Self::new(path);
        match registry.load() {
            Ok(count) => tracing::info!(count, "Loaded backend modes"),
            Err(e) => tracing::error!(error = %e, "Failed to load backend modes, starting with defaults"),
        }
        registry
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the persisted map into memory.
    ///
    /// Unknown names fall back to `STANDARD` with a warning. Non-persistent
    /// (soft) modes are reset to `STANDARD` regardless of what was stored.
    /// A missing file is an empty map.
    pub fn load(&self) -> Result<usize, PersistenceError> {
        let Some(path) = &self.path else {
            return Ok(0);
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(PersistenceError::Read { path: path.clone(), source }),
        };
        if content.trim().is_empty() {
            return Ok(0);
        }

        let raw: BTreeMap<String, String> = serde_json::from_str(&content)
            .map_err(|source| PersistenceError::Decode { path: path.clone(), source })?;

        let count = raw.len();
        for (id, name) in raw {
            let mode = match name.parse::<OperatingMode>() {
                Ok(mode) if !mode.is_persistent() => {
                    tracing::info!(backend = %id, stored = %mode, "Session mode reset to STANDARD");
                    OperatingMode::Standard
                }
                Ok(mode) => mode,
                Err(_) => {
                    tracing::warn!(backend = %id, stored = %name, "Unknown mode, defaulting to STANDARD");
                    OperatingMode::Standard
                }
            };
            self.modes.insert(id, mode);
        }
        Ok(count)
    }

    /// Current mode; `STANDARD` when no override exists.
    pub fn get(&self, id: &str) -> OperatingMode {
        self.modes.get(id).map(|mode| *mode).unwrap_or_default()
    }

    /// Set a mode and persist before returning.
    pub fn set(&self, id: &str, mode: OperatingMode) -> Result<(), PersistenceError> {
        self.modes.insert(id.to_string(), mode);
        tracing::info!(backend = %id, mode = %mode, "Backend mode changed");
        self.save()
    }

    /// Rewrite the whole file from memory. Only persistent modes are written.
    pub fn save(&self) -> Result<(), PersistenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _guard = self.save_lock.lock().unwrap_or_else(|e| e.into_inner());

        let snapshot: BTreeMap<String, &'static str> = self
            .modes
            .iter()
            .filter(|entry| entry.value().is_persistent())
            .map(|entry| (entry.key().clone(), entry.value().as_str()))
            .collect();
        let json = serde_json::to_string_pretty(&snapshot)?;

        let write_err = |source| PersistenceError::Write { path: path.clone(), source };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;

        tracing::debug!(path = %path.display(), count = snapshot.len(), "Saved backend modes");
        Ok(())
    }

    pub fn allows_auto_start(&self, id: &str) -> bool {
        self.get(id).allows_auto_start()
    }

    pub fn allows_idle_shutdown(&self, id: &str) -> bool {
        self.get(id).allows_idle_shutdown()
    }

    /// Drop overrides for ids `is_known` rejects. Returns the dropped ids.
    ///
    /// Memory only; the next `save` rewrites the file without them.
    pub fn retain_known(&self, is_known: impl Fn(&str) -> bool) -> Vec<String> {
        let mut dropped = Vec::new();
        self.modes.retain(|id, _| {
            let keep = is_known(id);
            if !keep {
                dropped.push(id.clone());
            }
            keep
        });
        dropped.sort();
        for id in &dropped {
            tracing::warn!(backend = %id, "Dropping mode for unmanaged backend");
        }
        dropped
    }

    /// All explicit overrides, sorted by id.
    pub fn snapshot(&self) -> Vec<(String, OperatingMode)> {
        let mut entries: Vec<_> = self
            .modes
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_modes(dir: &tempfile::TempDir, json: &str) -> PathBuf {
        let path = dir.path().join("modes.json");
        fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_get_defaults_to_standard() {
        let registry = ModeRegistry::in_memory();
        assert_eq!(registry.get("anything"), OperatingMode::Standard);
        assert!(registry.allows_auto_start("anything"));
        assert!(registry.allows_idle_shutdown("anything"));
    }

    #[test]
    fn test_load_resets_soft_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_modes(
            &dir,
            r#"{
                "a": "SOFT_FORCE_ON",
                "b": "SOFT_FORCE_OFF",
                "c": "HARD_FORCE_ON",
                "d": "HARD_FORCE_OFF",
                "e": "STANDARD"
            }"#,
        );

        let registry = ModeRegistry::new(&path);
        assert_eq!(registry.load().unwrap(), 5);
        assert_eq!(registry.get("a"), OperatingMode::Standard);
        assert_eq!(registry.get("b"), OperatingMode::Standard);
        assert_eq!(registry.get("c"), OperatingMode::HardForceOn);
        assert_eq!(registry.get("d"), OperatingMode::HardForceOff);
        assert_eq!(registry.get("e"), OperatingMode::Standard);
    }

    #[test]
    fn test_unknown_mode_name_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_modes(&dir, r#"{"survival": "TURBO"}"#);
        let registry = ModeRegistry::new(&path);
        registry.load().unwrap();
        assert_eq!(registry.get("survival"), OperatingMode::Standard);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ModeRegistry::new(dir.path().join("absent.json"));
        assert_eq!(registry.load().unwrap(), 0);
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_modes(&dir, "{ not json");
        let registry = ModeRegistry::new(&path);
        assert!(matches!(registry.load(), Err(PersistenceError::Decode { .. })));
        assert_eq!(registry.get("survival"), OperatingMode::Standard);
    }

    #[test]
    fn test_set_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("modes.json");

        let registry = ModeRegistry::new(&path);
        registry.set("creative", OperatingMode::HardForceOff).unwrap();
        registry.set("survival", OperatingMode::SoftForceOn).unwrap();
        assert_eq!(registry.get("survival"), OperatingMode::SoftForceOn);

        let reloaded = ModeRegistry::new(&path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get("creative"), OperatingMode::HardForceOff);
        assert_eq!(reloaded.get("survival"), OperatingMode::Standard);
    }

    #[test]
    fn test_save_is_full_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_modes(&dir, r#"{"stale": "HARD_FORCE_ON"}"#);

        let registry = ModeRegistry::new(&path);
        registry.set("creative", OperatingMode::HardForceOn).unwrap();

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
        assert_eq!(on_disk["creative"], "HARD_FORCE_ON");
    }

    #[test]
    fn test_retain_known_drops_foreign_ids() {
        let registry = ModeRegistry::in_memory();
        registry.set("survival", OperatingMode::HardForceOn).unwrap();
        registry.set("retired", OperatingMode::HardForceOff).unwrap();
        registry.set("old-event", OperatingMode::HardForceOn).unwrap();

        let dropped = registry.retain_known(|id| id == "survival");
        assert_eq!(dropped, vec!["old-event".to_string(), "retired".to_string()]);
        assert_eq!(registry.snapshot(), vec![("survival".to_string(), OperatingMode::HardForceOn)]);
        assert_eq!(registry.get("retired"), OperatingMode::Standard);
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("modes.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let registry = ModeRegistry::new(&path);
        assert!(registry.set("survival", OperatingMode::HardForceOn).is_err());
        assert_eq!(registry.get("survival"), OperatingMode::HardForceOn);
    }
}
