use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root directory under which each saved record gets an attachment
    /// subdirectory named by its id.
    pub save_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var            | Default |
    /// |--------------------|---------|
    /// | `PROJHIS_SAVE_DIR` | `save`  |
    pub fn from_env() -> Self {
        let save_dir = std::env::var("PROJHIS_SAVE_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "save".into());

        Self {
            save_dir: PathBuf::from(save_dir),
        }
    }
}
