use std::path::PathBuf;

/// Environment variable naming the local page-cache directory.
pub const SOURCE_DIR_ENV: &str = "HIKE_SOURCE_DIR";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one `<hike>.html` file per fetched page.
    pub source_dir: PathBuf,
}

impl Config {
    /// Read configuration once at startup; components get it handed in at
    /// construction rather than reading the environment in deep call paths.
    pub fn from_env() -> Config {
        let dir = std::env::var(SOURCE_DIR_ENV).unwrap_or_else(|_| "./".to_string());
        Config {
            source_dir: PathBuf::from(dir),
        }
    }
}
