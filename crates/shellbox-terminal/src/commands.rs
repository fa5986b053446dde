//! Navigation commands (cd, pwd, ls, tree) and built-in registration.

use shellbox_types::error::{FsErrorKind, Result, ShellboxError};
use shellbox_vfs::{DirEntry, FileSystem, Node};

use crate::interpreter::{Category, Command, CommandOutput, CommandRegistry, ExecutionContext};
use crate::listing::{LS_OPTIONS, ListingFlags, ListingFormatter, locale_cmp};
use crate::options::{OptionSpec, parse};

/// Register every built-in command module plus the `ls` aliases.
pub fn register_builtins(reg: &mut CommandRegistry) -> Result<()> {
    reg.register(Box::new(CdCmd))?;
    reg.register(Box::new(PwdCmd))?;
    reg.register(Box::new(LsCmd))?;
    reg.register(Box::new(TreeCmd))?;
    crate::file_commands::register_file_commands(reg)?;
    crate::text_commands::register_text_commands(reg)?;
    crate::system_commands::register_system_commands(reg)?;

    reg.register_alias("ll", "ls", &["-l"])?;
    reg.register_alias("la", "ls", &["-A"])?;
    reg.register_alias("l", "ls", &["-1"])?;
    log::debug!("registered {} commands", reg.list().len());
    Ok(())
}

/// Error for a path that could not be used where an existing node was
/// expected.
pub(crate) fn missing(fs: &FileSystem, input: &str) -> ShellboxError {
    let kind = if fs.exists(input) {
        FsErrorKind::NotADirectory
    } else {
        FsErrorKind::FileNotFound
    };
    ShellboxError::fs(kind, input)
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change working directory | 切换工作目录"
    }
    fn usage(&self) -> &str {
        "cd [dir]"
    }
    fn category(&self) -> Category {
        Category::Navigation
    }
    fn examples(&self) -> &[&str] {
        &["cd Documents", "cd ..", "cd ~", "cd /etc"]
    }
    fn supports_redirect(&self) -> bool {
        false
    }
    fn execute(
        &self,
        args: &[&str],
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        if args.len() > 1 {
            return Err(ShellboxError::Command("cd: too many arguments".to_string()));
        }
        let target = args.first().copied().unwrap_or("~");
        if !fs.change_directory(target) {
            return Err(missing(fs, target));
        }
        ctx.cwd = fs.cwd().to_string();
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// pwd
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory | 显示当前目录"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> Category {
        Category::Navigation
    }
    fn execute(
        &self,
        _args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(fs.cwd().to_string()))
    }
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents | 列出目录内容"
    }
    fn usage(&self) -> &str {
        "ls [-aAlh1rFtS] [path...]"
    }
    fn category(&self) -> Category {
        Category::Navigation
    }
    fn options(&self) -> &[OptionSpec] {
        LS_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["ls", "ls -la", "ls -lhS /var/log", "ls -tr Documents"]
    }
    fn execute(
        &self,
        args: &[&str],
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("ls", LS_OPTIONS, args)?;
        let flags = ListingFlags::from_args(&parsed);
        let targets: Vec<&str> = match parsed.operands() {
            [] => vec!["."],
            ops => ops.iter().map(String::as_str).collect(),
        };
        if let Some(bad) = targets.iter().find(|t| !fs.exists(t)) {
            return Err(ShellboxError::fs(FsErrorKind::FileNotFound, *bad));
        }

        let (files, dirs): (Vec<&str>, Vec<&str>) =
            targets.iter().partition(|t| !fs.is_directory(t));
        let base = ListingFormatter::new(ctx.terminal_width, fs.now())
            .with_recent_days(ctx.recent_days);

        let mut blocks = Vec::new();
        if !files.is_empty() {
            let entries: Vec<DirEntry> = files
                .iter()
                .filter_map(|shown| {
                    fs.stat(shown).map(|e| DirEntry {
                        name: (*shown).to_string(),
                        ..e
                    })
                })
                .collect();
            let file_flags = ListingFlags {
                all: false,
                almost_all: true,
                ..flags
            };
            blocks.push(base.format(&entries, &file_flags));
        }
        let headed = targets.len() > 1;
        for dir in dirs {
            let mut formatter = base.clone();
            if let (Some(dot), Some(dotdot)) = (fs.stat(dir), fs.stat(&format!("{dir}/.."))) {
                formatter = formatter.with_dot_entries(dot, dotdot);
            }
            let body = formatter.format(&fs.directory_contents(Some(dir)), &flags);
            if headed {
                blocks.push(format!("{dir}:\n{body}").trim_end().to_string());
            } else {
                blocks.push(body);
            }
        }
        let out = blocks.join("\n\n");
        if out.is_empty() {
            Ok(CommandOutput::None)
        } else {
            Ok(CommandOutput::Text(out))
        }
    }
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

const TREE_OPTIONS: &[OptionSpec] = &[
    OptionSpec::short('a', "include hidden entries"),
    OptionSpec::short('d', "list directories only"),
    OptionSpec::number('L', "level", "LEVEL", "descend at most LEVEL directories"),
];

struct TreeCmd;
impl Command for TreeCmd {
    fn name(&self) -> &str {
        "tree"
    }
    fn description(&self) -> &str {
        "Show directory tree | 以树状显示目录"
    }
    fn usage(&self) -> &str {
        "tree [-a] [-d] [-L level] [dir]"
    }
    fn category(&self) -> Category {
        Category::Navigation
    }
    fn options(&self) -> &[OptionSpec] {
        TREE_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["tree", "tree -L 1 /", "tree -a ~"]
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("tree", TREE_OPTIONS, args)?;
        let shown = parsed.operands().first().map_or(".", String::as_str);
        let Some(node) = fs.node(shown).filter(|n| n.is_dir()) else {
            return Err(missing(fs, shown));
        };
        let opts = TreeOpts {
            hidden: parsed.has('a'),
            dirs_only: parsed.has('d'),
            max_depth: parsed
                .number('L')
                .map(|l| usize::try_from(l).unwrap_or(0)),
        };
        let mut lines = vec![shown.to_string()];
        let mut counts = (0u32, 0u32);
        tree_recursive(node, "", 1, &opts, &mut lines, &mut counts);
        let (dirs, files) = counts;
        if opts.dirs_only {
            lines.push(format!("\n{dirs} directories"));
        } else {
            lines.push(format!("\n{dirs} directories, {files} files"));
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

struct TreeOpts {
    hidden: bool,
    dirs_only: bool,
    max_depth: Option<usize>,
}

fn tree_recursive(
    dir: &Node,
    prefix: &str,
    depth: usize,
    opts: &TreeOpts,
    lines: &mut Vec<String>,
    counts: &mut (u32, u32),
) {
    if opts.max_depth.is_some_and(|max| depth > max) {
        return;
    }
    let Some(children) = dir.children() else {
        return;
    };
    let mut entries: Vec<(&String, &Node)> = children
        .iter()
        .filter(|(name, node)| {
            (opts.hidden || !name.starts_with('.')) && (!opts.dirs_only || node.is_dir())
        })
        .collect();
    entries.sort_by(|a, b| locale_cmp(a.0, b.0));
    let count = entries.len();
    for (i, (name, node)) in entries.into_iter().enumerate() {
        let is_last = i + 1 == count;
        let connector = if is_last { "└── " } else { "├── " };
        lines.push(format!("{prefix}{connector}{name}"));
        if node.is_dir() {
            counts.0 += 1;
            let child_prefix = if is_last {
                format!("{prefix}    ")
            } else {
                format!("{prefix}│   ")
            };
            tree_recursive(node, &child_prefix, depth + 1, opts, lines, counts);
        } else {
            counts.1 += 1;
        }
    }
}
