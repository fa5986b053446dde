//! Command interpreter and terminal subsystem.
//!
//! Commands implement the `Command` trait and are registered by name. The
//! interpreter tokenizes input lines, wires pipes and redirects, resolves the
//! command name, and dispatches `execute()` against the filesystem engine.

mod alias;
mod commands;
mod file_commands;
mod interpreter;
pub mod listing;
pub mod options;
mod system_commands;
mod text_commands;

/// Delegating command that runs another command with fixed leading arguments.
pub use alias::Alias;
/// Register all built-in commands (navigation, files, text, system) and aliases.
pub use commands::register_builtins;
/// Register file commands (cat, touch, mkdir, rm, rmdir, cp, mv, stat).
pub use file_commands::register_file_commands;
/// Command grouping used by help and category lookup.
pub use interpreter::Category;
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command (text or signals).
pub use interpreter::CommandOutput;
/// Registry of available commands with dispatch.
pub use interpreter::CommandRegistry;
/// Per-invocation state passed to every command.
pub use interpreter::ExecutionContext;
pub use interpreter::{DESCRIPTION_DELIMITER, split_description, tokenize};
/// Register system commands (whoami, hostname, date, uname, df, du, clear).
pub use system_commands::register_system_commands;
/// Register text commands (echo, head, tail, wc, grep).
pub use text_commands::register_text_commands;
