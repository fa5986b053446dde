//! Sandbox configuration loaded from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ShellboxError};

/// Upper bound for `recent_days` (about a century).
pub const MAX_RECENT_DAYS: i64 = 36_500;

/// Session-wide settings for the sandbox.
///
/// Every field has a default, so an empty file (or no file at all) yields a
/// working sandbox.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Home directory that `~` and a bare `cd` resolve to.
    pub home_dir: String,
    /// Owner recorded on nodes created during the session.
    pub user: String,
    /// Group recorded on nodes created during the session.
    pub group: String,
    pub hostname: String,
    /// Column budget for the multi-column listing layout.
    pub terminal_width: usize,
    /// TTL for cached directory listings, in milliseconds.
    pub listing_ttl_ms: u64,
    /// TTL for cached file contents, in milliseconds.
    pub content_ttl_ms: u64,
    /// Entries younger than this render `HH:MM` instead of the year in `ls -l`.
    pub recent_days: i64,
    pub prompt: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            home_dir: "/home/favork".to_string(),
            user: "favork".to_string(),
            group: "favork".to_string(),
            hostname: "shellbox".to_string(),
            terminal_width: 80,
            listing_ttl_ms: 30_000,
            content_ttl_ms: 60_000,
            recent_days: 180,
            prompt: "{user}@{host}:{cwd}$ ".to_string(),
        }
    }
}

impl SandboxConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from the host filesystem.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded sandbox config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.home_dir.starts_with('/') {
            return Err(ShellboxError::Config(format!(
                "home_dir must be absolute: {}",
                self.home_dir
            )));
        }
        if self.terminal_width == 0 {
            return Err(ShellboxError::Config(
                "terminal_width must be positive".to_string(),
            ));
        }
        if !(0..=MAX_RECENT_DAYS).contains(&self.recent_days) {
            return Err(ShellboxError::Config(format!(
                "recent_days must be between 0 and {MAX_RECENT_DAYS}: {}",
                self.recent_days
            )));
        }
        Ok(())
    }

    /// Render the prompt template for the given working directory.
    ///
    /// The home directory prefix is shown as `~`.
    pub fn render_prompt(&self, cwd: &str) -> String {
        let shown = match cwd.strip_prefix(self.home_dir.as_str()) {
            Some("") => "~".to_string(),
            Some(rest) if rest.starts_with('/') => format!("~{rest}"),
            _ => cwd.to_string(),
        };
        self.prompt
            .replace("{user}", &self.user)
            .replace("{host}", &self.hostname)
            .replace("{cwd}", &shown)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = SandboxConfig::from_toml_str("").unwrap();
        assert_eq!(config, SandboxConfig::default());
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = SandboxConfig::from_toml_str(
            "user = \"alice\"\nhome_dir = \"/home/alice\"\nterminal_width = 40\n",
        )
        .unwrap();
        assert_eq!(config.user, "alice");
        assert_eq!(config.home_dir, "/home/alice");
        assert_eq!(config.terminal_width, 40);
        assert_eq!(config.listing_ttl_ms, 30_000);
    }

    #[test]
    fn relative_home_rejected() {
        let err = SandboxConfig::from_toml_str("home_dir = \"home/x\"").unwrap_err();
        assert!(matches!(err, ShellboxError::Config(_)));
    }

    #[test]
    fn out_of_range_recent_days_rejected() {
        let err = SandboxConfig::from_toml_str("recent_days = 200000000000").unwrap_err();
        assert!(matches!(err, ShellboxError::Config(_)));
        assert!(SandboxConfig::from_toml_str("recent_days = -1").is_err());
        let edge = SandboxConfig::from_toml_str("recent_days = 36500").unwrap();
        assert_eq!(edge.recent_days, MAX_RECENT_DAYS);
    }

    #[test]
    fn zero_width_rejected() {
        assert!(SandboxConfig::from_toml_str("terminal_width = 0").is_err());
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = SandboxConfig::from_toml_str("user = ").unwrap_err();
        assert!(matches!(err, ShellboxError::TomlParse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hostname = \"lab\"").unwrap();
        let config = SandboxConfig::load(file.path()).unwrap();
        assert_eq!(config.hostname, "lab");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SandboxConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ShellboxError::Io(_)));
    }

    #[test]
    fn prompt_abbreviates_home() {
        let config = SandboxConfig::default();
        assert_eq!(config.render_prompt("/home/favork"), "favork@shellbox:~$ ");
        assert_eq!(
            config.render_prompt("/home/favork/Documents"),
            "favork@shellbox:~/Documents$ "
        );
        assert_eq!(config.render_prompt("/etc"), "favork@shellbox:/etc$ ");
        assert_eq!(
            config.render_prompt("/home/favorkish"),
            "favork@shellbox:/home/favorkish$ "
        );
    }
}
