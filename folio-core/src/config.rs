//! # Configuration
//!
//! A flat string key/value store hung off the app (`app.set` / `app.get`).
//! Keys are dotted (`http.port`, `media.folder.banner`). Hooks receive an
//! immutable [`ConfigSnapshot`] taken at the start of each call.
//!
//! Environment overrides use a prefix and double underscores as separators:
//!
//! ```rust
//! use folio_core::FolioConfig;
//!
//! let mut cfg = FolioConfig::new();
//! cfg.apply_env_overrides(
//!     "FOLIO__",
//!     vec![("FOLIO__UPLOAD__MAX_FILE_MB".to_string(), "25".to_string())],
//! );
//! assert_eq!(cfg.get("upload.max_file_mb"), Some("25"));
//! ```

use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct FolioConfig {
    values: HashMap<String, String>,
}

impl FolioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// `PREFIX__A__B=v` becomes `a.b = v`. Variables without the prefix are ignored.
    pub fn apply_env_overrides<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                if !normalized.is_empty() {
                    self.values.insert(normalized, value);
                }
            }
        }
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            map: self.values.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    map: HashMap<String, String>,
}

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_ignore_foreign_variables() {
        let mut cfg = FolioConfig::new();
        cfg.set("http.port", "5000");
        cfg.apply_env_overrides(
            "FOLIO__",
            vec![
                ("PATH".to_string(), "/usr/bin".to_string()),
                ("FOLIO__HTTP__PORT".to_string(), "8080".to_string()),
                ("FOLIO__".to_string(), "ignored".to_string()),
            ],
        );

        assert_eq!(cfg.get("http.port"), Some("8080"));
        assert!(!cfg.has("path"));
        assert!(!cfg.has(""));
    }

    #[test]
    fn snapshot_parses_typed_values() {
        let mut cfg = FolioConfig::new();
        cfg.set("upload.max_file_mb", " 12 ");
        cfg.set("media.public", "true");

        let snap = cfg.snapshot();
        assert_eq!(snap.get_u64("upload.max_file_mb"), Some(12));
        assert_eq!(snap.get_bool("media.public"), Some(true));
        assert_eq!(snap.get_usize("missing"), None);
    }
}
