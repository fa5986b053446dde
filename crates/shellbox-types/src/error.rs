//! Error types for SHELLBOX.

use std::fmt;
use std::io;

/// Stable kinds of filesystem precondition violations.
///
/// Expected negative outcomes (a missing file on read, a failed `cd`) are
/// never reported through this type; only operations whose precondition is
/// violated raise one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorKind {
    DirectoryNotFound,
    NotADirectory,
    AlreadyExists,
    FileNotFound,
    IsADirectory,
    DirectoryNotEmpty,
    InvalidMove,
    RootDirectory,
}

impl FsErrorKind {
    /// The POSIX-style reason text used in rendered command errors.
    pub fn reason(self) -> &'static str {
        match self {
            Self::DirectoryNotFound | Self::FileNotFound => "No such file or directory",
            Self::NotADirectory => "Not a directory",
            Self::AlreadyExists => "File exists",
            Self::IsADirectory => "Is a directory",
            Self::DirectoryNotEmpty => "Directory not empty",
            Self::InvalidMove => "Invalid argument",
            Self::RootDirectory => "Operation not permitted",
        }
    }
}

impl fmt::Display for FsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Errors produced by the SHELLBOX crates.
#[derive(Debug, thiserror::Error)]
pub enum ShellboxError {
    #[error("{path}: {kind}")]
    Fs { kind: FsErrorKind, path: String },

    #[error("{0}")]
    Command(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShellboxError {
    /// Shorthand for a filesystem error.
    pub fn fs(kind: FsErrorKind, path: impl Into<String>) -> Self {
        Self::Fs {
            kind,
            path: path.into(),
        }
    }

    /// The filesystem error kind, if this is a filesystem error.
    pub fn fs_kind(&self) -> Option<FsErrorKind> {
        match self {
            Self::Fs { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Render as terminal output for `command`: `<command>: <path>: <reason>`.
    pub fn render(&self, command: &str) -> String {
        match self {
            Self::Command(msg) => msg.clone(),
            other => format!("{command}: {other}"),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellboxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_display() {
        let e = ShellboxError::fs(FsErrorKind::DirectoryNotFound, "/nope/file.txt");
        assert_eq!(format!("{e}"), "/nope/file.txt: No such file or directory");
    }

    #[test]
    fn fs_error_renders_posix_style() {
        let e = ShellboxError::fs(FsErrorKind::AlreadyExists, "Documents");
        assert_eq!(e.render("mkdir"), "mkdir: Documents: File exists");
    }

    #[test]
    fn command_error_renders_verbatim() {
        let e = ShellboxError::Command("cat: missing operand".into());
        assert_eq!(e.render("cat"), "cat: missing operand");
    }

    #[test]
    fn fs_kind_accessor() {
        let e = ShellboxError::fs(FsErrorKind::NotADirectory, "/etc/hostname");
        assert_eq!(e.fs_kind(), Some(FsErrorKind::NotADirectory));
        assert_eq!(ShellboxError::Config("x".into()).fs_kind(), None);
    }

    #[test]
    fn config_error_display() {
        let e = ShellboxError::Config("missing key".into());
        assert_eq!(format!("{e}"), "config error: missing key");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: ShellboxError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: ShellboxError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: ShellboxError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }

    #[test]
    fn every_kind_has_a_reason() {
        for kind in [
            FsErrorKind::DirectoryNotFound,
            FsErrorKind::NotADirectory,
            FsErrorKind::AlreadyExists,
            FsErrorKind::FileNotFound,
            FsErrorKind::IsADirectory,
            FsErrorKind::DirectoryNotEmpty,
            FsErrorKind::InvalidMove,
            FsErrorKind::RootDirectory,
        ] {
            assert!(!kind.reason().is_empty());
        }
    }
}
