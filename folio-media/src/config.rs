use std::path::PathBuf;

/// Limits applied before a staged file reaches a backend.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Largest accepted file.
    pub max_file_bytes: u64,

    /// Accepted content-type prefixes. Empty accepts anything.
    pub allowed_types: Vec<String>,

    /// Directory staged files must live in. Anything else is refused
    /// untouched.
    pub staging_dir: Option<PathBuf>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024, // 10MB
            allowed_types: vec!["image/".to_string()],
            staging_dir: None,
        }
    }
}

impl MediaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn with_max_file_mb(self, mb: u64) -> Self {
        self.with_max_file_bytes(mb * 1024 * 1024)
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    pub fn allow_type<S: Into<String>>(mut self, prefix: S) -> Self {
        self.allowed_types.push(prefix.into());
        self
    }

    pub fn allow_any_type(mut self) -> Self {
        self.allowed_types.clear();
        self
    }

    pub fn accepts(&self, content_type: &str) -> bool {
        self.allowed_types.is_empty()
            || self
                .allowed_types
                .iter()
                .any(|prefix| content_type.starts_with(prefix.as_str()))
    }
}
