//! The `Command` contract, the registry that owns commands, and line dispatch.
//!
//! Supports quoted arguments, pipes, and output redirection. Commands only
//! ever touch the filesystem handed to them; registering one has no effect
//! beyond inserting it into the table.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use shellbox_types::config::SandboxConfig;
use shellbox_types::error::{Result, ShellboxError};
use shellbox_vfs::{FileSystem, WriteMode};

use crate::alias::Alias;
use crate::options::{OptionSpec, render_options};

/// What a command hands back to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Nothing to print.
    None,
    /// Ask the front end to wipe the screen.
    Clear,
}

impl CommandOutput {
    /// The text a pipe or redirect would carry.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::None | Self::Clear => None,
        }
    }
}

/// Command grouping used by `help` and [`CommandRegistry::by_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Navigation,
    Files,
    Text,
    System,
    General,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Self::Navigation,
        Self::Files,
        Self::Text,
        Self::System,
        Self::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Files => "files",
            Self::Text => "text",
            Self::System => "system",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ShellboxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ShellboxError::Command(format!("unknown category: {s}")))
    }
}

/// Separator between the English and Chinese halves of a description.
pub const DESCRIPTION_DELIMITER: &str = " | ";

/// Split a bilingual description into its English and Chinese halves.
pub fn split_description(description: &str) -> (&str, Option<&str>) {
    match description.split_once(DESCRIPTION_DELIMITER) {
        Some((en, zh)) => (en, Some(zh)),
        None => (description, None),
    }
}

/// Per-invocation state handed to every command.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Working directory at the time the command started.
    pub cwd: String,
    pub user: String,
    pub hostname: String,
    pub terminal_width: usize,
    /// Age below which `ls -l` shows a time instead of a year.
    pub recent_days: i64,
    /// Output of the previous stage in a pipeline.
    pub stdin: Option<String>,
}

impl ExecutionContext {
    pub fn from_config(config: &SandboxConfig) -> Self {
        Self {
            cwd: config.home_dir.clone(),
            user: config.user.clone(),
            hostname: config.hostname.clone(),
            terminal_width: config.terminal_width,
            recent_days: config.recent_days,
            stdin: None,
        }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::from_config(&SandboxConfig::default())
    }
}

/// One shell command: static metadata plus an `execute` handler.
pub trait Command {
    /// Name typed at the prompt.
    fn name(&self) -> &str;

    /// Bilingual one-line description, halves joined by
    /// [`DESCRIPTION_DELIMITER`].
    fn description(&self) -> &str;

    /// Usage string (e.g. "ls \[options\] \[path...\]").
    fn usage(&self) -> &str;

    fn category(&self) -> Category {
        Category::General
    }

    /// Declared option schema.
    fn options(&self) -> &[OptionSpec] {
        &[]
    }

    fn examples(&self) -> &[&str] {
        &[]
    }

    /// Whether the command reads piped input.
    fn supports_pipe(&self) -> bool {
        false
    }

    /// Whether the command's output may be redirected to a file.
    fn supports_redirect(&self) -> bool {
        true
    }

    /// Whether the command refuses to run with no arguments and no input.
    fn requires_args(&self) -> bool {
        false
    }

    /// Execute the command with the given arguments.
    fn execute(
        &self,
        args: &[&str],
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput>;
}

/// Shell built-ins handled by the registry itself.
const INTERCEPTED: [(&str, &str); 3] = [
    ("help", "Show commands or details for one | 显示命令列表或单个命令的帮助"),
    ("apropos", "Search commands by keyword | 按关键字搜索命令"),
    ("which", "Show how a command name resolves | 显示命令名称的解析结果"),
];

/// Name-keyed command table with dispatch.
pub struct CommandRegistry {
    commands: BTreeMap<String, Rc<dyn Command>>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Register a command. A name that is already taken is rejected.
    pub fn register(&mut self, cmd: Box<dyn Command>) -> Result<()> {
        let name = cmd.name().to_ascii_lowercase();
        if self.commands.contains_key(&name) || INTERCEPTED.iter().any(|(n, _)| *n == name) {
            return Err(ShellboxError::Command(format!(
                "command already registered: {name}"
            )));
        }
        self.commands.insert(name, Rc::from(cmd));
        Ok(())
    }

    /// Register a command, replacing any existing one of the same name.
    pub fn replace(&mut self, cmd: Box<dyn Command>) -> Option<Rc<dyn Command>> {
        let name = cmd.name().to_ascii_lowercase();
        log::debug!("replacing command {name}");
        self.commands.insert(name, Rc::from(cmd))
    }

    /// Register `name` as `base` invoked with `prefix` in front of the
    /// user's arguments.
    pub fn register_alias(&mut self, name: &str, base: &str, prefix: &[&str]) -> Result<()> {
        let base_cmd = self
            .get(base)
            .ok_or_else(|| ShellboxError::Command(format!("alias {name}: unknown command {base}")))?;
        self.register(Box::new(Alias::wrap(base_cmd, name, prefix)))
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Command>> {
        self.commands
            .get(name.to_ascii_lowercase().as_str())
            .map(Rc::clone)
    }

    /// All registered command names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.commands.keys().map(String::as_str).collect()
    }

    /// Commands whose name or description contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Vec<Rc<dyn Command>> {
        let needle = query.to_lowercase();
        self.commands
            .values()
            .filter(|c| {
                c.name().to_lowercase().contains(&needle)
                    || c.description().to_lowercase().contains(&needle)
            })
            .map(Rc::clone)
            .collect()
    }

    pub fn by_category(&self, category: Category) -> Vec<Rc<dyn Command>> {
        self.commands
            .values()
            .filter(|c| c.category() == category)
            .map(Rc::clone)
            .collect()
    }

    /// `(name, description)` pairs in name order.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        self.commands
            .values()
            .map(|c| (c.name(), c.description()))
            .collect()
    }

    /// Command names starting with `partial`, ignoring case.
    pub fn completions(&self, partial: &str) -> Vec<String> {
        let lower = partial.to_ascii_lowercase();
        self.commands
            .keys()
            .map(String::as_str)
            .chain(INTERCEPTED.iter().map(|(n, _)| *n))
            .filter(|name| name.starts_with(&lower))
            .map(str::to_string)
            .collect()
    }

    /// Run one input line against `fs`.
    ///
    /// Supports quoting, pipes (`|`), and output redirection (`>`, `>>`).
    /// Command names are case-insensitive. Filesystem errors come back as
    /// `<command>: <path>: <reason>`.
    pub fn execute(
        &self,
        line: &str,
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(CommandOutput::None);
        }
        let result = self.execute_pipeline(trimmed, ctx, fs);
        ctx.cwd = fs.cwd().to_string();
        ctx.stdin = None;
        if let Err(ref e) = result {
            log::debug!("`{trimmed}` failed: {e}");
        }
        result
    }

    /// Run `a | b | c`, feeding each stage's text to the next as stdin.
    fn execute_pipeline(
        &self,
        pipeline_str: &str,
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let pipe_segments = split_pipes(pipeline_str)?;
        if pipe_segments.iter().any(String::is_empty) {
            return Err(ShellboxError::Command(
                "syntax error near unexpected token `|'".to_string(),
            ));
        }

        // A stage redirected to a file passes empty text downstream.
        let mut stdin: Option<String> = None;
        let last_idx = pipe_segments.len() - 1;
        let mut last = CommandOutput::None;
        for (i, segment) in pipe_segments.iter().enumerate() {
            ctx.stdin = stdin.take();
            let result = self.execute_with_redirect(segment, i > 0, ctx, fs)?;
            if i == last_idx {
                last = result;
            } else {
                stdin = Some(result.into_text().unwrap_or_default());
            }
        }
        Ok(last)
    }

    /// Run one pipeline, writing its text to a file when `>`/`>>` is present.
    fn execute_with_redirect(
        &self,
        cmd_str: &str,
        piped: bool,
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let (cmd_part, redirect) = parse_redirect(cmd_str);
        let Some(redir) = redirect else {
            return self.execute_single_cmd(cmd_part, piped, ctx, fs);
        };

        let target = tokenize(redir.path)?;
        let [path] = target.as_slice() else {
            return Err(ShellboxError::Command(
                "syntax error: redirect needs exactly one file".to_string(),
            ));
        };
        let name = tokenize(cmd_part)?.into_iter().next().unwrap_or_default();
        if let Some(cmd) = self.get(&name)
            && !cmd.supports_redirect()
        {
            return Err(ShellboxError::Command(format!(
                "{}: output cannot be redirected",
                cmd.name()
            )));
        }

        let result = self.execute_single_cmd(cmd_part, piped, ctx, fs)?;
        let mut text = result.into_text().unwrap_or_default();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        let mode = if redir.append && fs.exists(path) {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        };
        fs.write_file(path, &text, mode)
            .map_err(|e| ShellboxError::Command(e.render("shellbox")))?;
        Ok(CommandOutput::None)
    }

    /// Execute a single command (after piping and redirection).
    fn execute_single_cmd(
        &self,
        cmd_str: &str,
        piped: bool,
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let tokens = tokenize(cmd_str.trim())?;
        let Some((name, rest)) = tokens.split_first() else {
            return Ok(CommandOutput::None);
        };
        let name_lower = name.to_ascii_lowercase();
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();

        // help/apropos/which read the registry itself.
        match name_lower.as_str() {
            "help" => return self.execute_help(&args),
            "apropos" => return self.execute_apropos(&args),
            "which" => return self.execute_which(&args),
            _ => {},
        }

        let Some(cmd) = self.commands.get(name_lower.as_str()) else {
            return Err(ShellboxError::Command(format!("{name}: command not found")));
        };
        if piped && !cmd.supports_pipe() {
            return Err(ShellboxError::Command(format!(
                "{}: does not read from a pipe",
                cmd.name()
            )));
        }
        if cmd.requires_args() && args.is_empty() && ctx.stdin.is_none() {
            return Err(ShellboxError::Command(format!(
                "{}: missing operand\nTry 'help {}' for more information.",
                cmd.name(),
                cmd.name()
            )));
        }

        ctx.cwd = fs.cwd().to_string();
        log::trace!("exec {name_lower} {args:?}");
        cmd.execute(&args, ctx, fs).map_err(|e| match e {
            ShellboxError::Fs { .. } => ShellboxError::Command(e.render(cmd.name())),
            other => other,
        })
    }

    /// `help [command|category]`, answered from registry metadata.
    fn execute_help(&self, args: &[&str]) -> Result<CommandOutput> {
        let Some(&topic) = args.first() else {
            return Ok(CommandOutput::Text(self.help_overview()));
        };
        if let Some(cmd) = self.get(topic) {
            return Ok(CommandOutput::Text(describe(cmd.as_ref())));
        }
        if let Ok(category) = topic.parse::<Category>() {
            let mut out = format!("[{category}]\n");
            for cmd in self.by_category(category) {
                let (en, _) = split_description(cmd.description());
                out.push_str(&format!("  {:12} {en}\n", cmd.name()));
            }
            return Ok(CommandOutput::Text(out.trim_end().to_string()));
        }
        Err(ShellboxError::Command(format!(
            "help: no help topics match '{topic}'"
        )))
    }

    fn help_overview(&self) -> String {
        let total = self.commands.len() + INTERCEPTED.len();
        let mut out = format!("Commands ({total}):\n");
        for category in Category::ALL {
            let mut rows: Vec<(String, String)> = self
                .by_category(category)
                .iter()
                .map(|c| {
                    let (en, _) = split_description(c.description());
                    (c.name().to_string(), en.to_string())
                })
                .collect();
            if category == Category::General {
                for (name, desc) in INTERCEPTED {
                    let (en, _) = split_description(desc);
                    rows.push((name.to_string(), en.to_string()));
                }
                rows.sort();
            }
            if rows.is_empty() {
                continue;
            }
            out.push_str(&format!("\n  [{category}]\n"));
            for (name, desc) in &rows {
                out.push_str(&format!("    {name:12} {desc}\n"));
            }
        }
        out.push_str("\nType 'help <command>' for details.");
        out
    }

    /// Built-in `apropos`: search names and descriptions.
    fn execute_apropos(&self, args: &[&str]) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellboxError::Command("apropos what?".to_string()));
        }
        let query = args.join(" ");
        let hits = self.search(&query);
        if hits.is_empty() {
            return Ok(CommandOutput::Text(format!("{query}: nothing appropriate.")));
        }
        let lines: Vec<String> = hits
            .iter()
            .map(|c| format!("{:12} - {}", c.name(), c.description()))
            .collect();
        Ok(CommandOutput::Text(lines.join("\n")))
    }

    /// `which NAME...`: report how each name would be run.
    fn execute_which(&self, args: &[&str]) -> Result<CommandOutput> {
        if args.is_empty() {
            return Err(ShellboxError::Command("usage: which <command>".to_string()));
        }
        let name = args[0].to_ascii_lowercase();
        if INTERCEPTED.iter().any(|(n, _)| *n == name) {
            return Ok(CommandOutput::Text(format!("{name}: shell built-in")));
        }
        match self.get(&name) {
            Some(cmd) => Ok(CommandOutput::Text(format!(
                "{}: {} ({})",
                cmd.name(),
                cmd.usage(),
                cmd.category()
            ))),
            None => Err(ShellboxError::Command(format!("which: no {name}"))),
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Full help block for one command.
fn describe(cmd: &dyn Command) -> String {
    let (en, zh) = split_description(cmd.description());
    let mut out = format!("{} ({})\n  {en}\n", cmd.name(), cmd.category());
    if let Some(zh) = zh {
        out.push_str(&format!("  {zh}\n"));
    }
    out.push_str(&format!("  Usage: {}", cmd.usage()));
    if !cmd.options().is_empty() {
        out.push_str("\n\nOptions:\n");
        out.push_str(&render_options(cmd.options()));
    }
    if !cmd.examples().is_empty() {
        out.push_str("\n\nExamples:");
        for example in cmd.examples() {
            out.push_str(&format!("\n  {example}"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Word splitting
// ---------------------------------------------------------------------------

/// Split a line into words, honouring quotes and backslashes.
///
/// Inside `'...'` nothing is special. Inside `"..."` only `\"` and `\\`
/// are escapes. Elsewhere a backslash makes the next character literal.
/// An unterminated quote is a syntax error.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;
    // Distinguishes `''` (an empty token) from no token at all.
    let mut quoted = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            } else if ch == '\\'
                && let Some(&next) = chars.peek()
                && matches!(next, '"' | '\\')
            {
                current.push(next);
                chars.next();
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    quoted = true;
                },
                '"' => {
                    in_double = true;
                    quoted = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                },
                c if c.is_whitespace() => {
                    if !current.is_empty() || quoted {
                        tokens.push(std::mem::take(&mut current));
                        quoted = false;
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err(ShellboxError::Command("unterminated single quote".to_string()));
    }
    if in_double {
        return Err(ShellboxError::Command("unterminated double quote".to_string()));
    }

    if !current.is_empty() || quoted {
        tokens.push(current);
    }

    Ok(tokens)
}

/// Split on `|`, respecting quotes.
fn split_pipes(input: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            current.push(ch);
            if ch == '\'' {
                in_single = false;
            }
            continue;
        }
        if in_double {
            current.push(ch);
            if ch == '"' {
                in_double = false;
            } else if ch == '\\'
                && let Some(next) = chars.next()
            {
                current.push(next);
            }
            continue;
        }

        match ch {
            '\'' => {
                in_single = true;
                current.push(ch);
            },
            '"' => {
                in_double = true;
                current.push(ch);
            },
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            },
            '|' => {
                segments.push(current.trim().to_string());
                current.clear();
            },
            _ => current.push(ch),
        }
    }

    if in_single || in_double {
        return Err(ShellboxError::Command("unterminated quote".to_string()));
    }
    segments.push(current.trim().to_string());
    Ok(segments)
}

struct Redirect<'a> {
    path: &'a str,
    append: bool,
}

/// Split a trailing `>`/`>>` target off a command string.
fn parse_redirect(input: &str) -> (&str, Option<Redirect<'_>>) {
    let bytes = input.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut i = 0;
    let mut last_redirect: Option<(usize, bool)> = None;

    while i < bytes.len() {
        let b = bytes[i];
        if in_single {
            if b == b'\'' {
                in_single = false;
            }
        } else if in_double {
            if b == b'"' {
                in_double = false;
            } else if b == b'\\' {
                i += 1;
            }
        } else {
            match b {
                b'\'' => in_single = true,
                b'"' => in_double = true,
                b'\\' => i += 1,
                b'>' => {
                    if bytes.get(i + 1) == Some(&b'>') {
                        last_redirect = Some((i, true));
                        i += 1;
                    } else {
                        last_redirect = Some((i, false));
                    }
                },
                _ => {},
            }
        }
        i += 1;
    }

    match last_redirect {
        Some((pos, append)) => {
            let skip = if append { 2 } else { 1 };
            (
                &input[..pos],
                Some(Redirect {
                    path: &input[pos + skip..],
                    append,
                }),
            )
        },
        None => (input, None),
    }
}
