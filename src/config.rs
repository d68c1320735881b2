//! Environment-driven runtime settings.

use std::env;
use std::path::PathBuf;

const PLACEHOLDER_MARKER: &str = "YOUR_";

/// Settings the hosting process supplies via the environment. Defaults keep
/// the crate runnable with nothing set: placeholder store credentials put the
/// core in offline mode instead of failing startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_project_id: String,
    pub store_api_key: String,
    /// Where customer name/phone are remembered between runs.
    pub prefs_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            store_project_id: env::var("STORE_PROJECT_ID")
                .unwrap_or_else(|_| "YOUR_PROJECT_ID".to_string()),
            store_api_key: env::var("STORE_API_KEY")
                .unwrap_or_else(|_| "YOUR_API_KEY".to_string()),
            prefs_path: env::var("PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/prefs.json")),
        }
    }

    /// False when credentials are blank or still carry the placeholder.
    pub fn is_store_configured(&self) -> bool {
        let configured = |value: &str| !value.trim().is_empty() && !value.contains(PLACEHOLDER_MARKER);
        configured(&self.store_project_id) && configured(&self.store_api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_credentials_are_not_configured() {
        let config = AppConfig {
            store_project_id: "YOUR_PROJECT_ID".to_string(),
            store_api_key: "YOUR_API_KEY".to_string(),
            prefs_path: PathBuf::from("./data/prefs.json"),
        };
        assert!(!config.is_store_configured());
    }

    #[test]
    fn blank_credentials_are_not_configured() {
        let config = AppConfig {
            store_project_id: String::new(),
            store_api_key: "abc".to_string(),
            prefs_path: PathBuf::from("./data/prefs.json"),
        };
        assert!(!config.is_store_configured());
    }

    #[test]
    fn real_credentials_are_configured() {
        let config = AppConfig {
            store_project_id: "barber-app-fbf5c".to_string(),
            store_api_key: "AIzaSyC1LZ".to_string(),
            prefs_path: PathBuf::from("./data/prefs.json"),
        };
        assert!(config.is_store_configured());
    }
}
