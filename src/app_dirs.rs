use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where statistics and the log file live
    pub fn data_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("lernen"),
            )
        } else {
            ProjectDirs::from("", "", "lernen").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "lernen").map(|pd| pd.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_namespaced() {
        if let Some(dir) = AppDirs::data_dir() {
            assert!(dir.ends_with("lernen"));
        }
        if let Some(path) = AppDirs::config_path() {
            assert!(path.ends_with("config.json"));
        }
    }
}
