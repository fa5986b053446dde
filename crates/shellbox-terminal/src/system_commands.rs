//! System commands: whoami, hostname, date, uname, df, du, clear.

use shellbox_types::error::{FsErrorKind, Result, ShellboxError};
use shellbox_vfs::{FileSystem, Node, path};

use crate::interpreter::{Category, Command, CommandOutput, CommandRegistry, ExecutionContext};
use crate::listing::human_size;
use crate::options::{OptionSpec, parse};

/// Register system commands.
pub fn register_system_commands(reg: &mut CommandRegistry) -> Result<()> {
    reg.register(Box::new(WhoamiCmd))?;
    reg.register(Box::new(HostnameCmd))?;
    reg.register(Box::new(DateCmd))?;
    reg.register(Box::new(UnameCmd))?;
    reg.register(Box::new(DfCmd))?;
    reg.register(Box::new(DuCmd))?;
    reg.register(Box::new(ClearCmd))?;
    Ok(())
}

/// Capacity reported by `df` for the in-memory filesystem.
const CAPACITY_BYTES: u64 = 1024 * 1024 * 1024;

const KERNEL_RELEASE: &str = "6.1.0-shellbox";

// ---------------------------------------------------------------------------
// whoami / hostname
// ---------------------------------------------------------------------------

struct WhoamiCmd;
impl Command for WhoamiCmd {
    fn name(&self) -> &str {
        "whoami"
    }
    fn description(&self) -> &str {
        "Print current user name | 显示当前用户名"
    }
    fn usage(&self) -> &str {
        "whoami"
    }
    fn category(&self) -> Category {
        Category::System
    }
    fn execute(
        &self,
        _args: &[&str],
        ctx: &mut ExecutionContext,
        _fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(ctx.user.clone()))
    }
}

struct HostnameCmd;
impl Command for HostnameCmd {
    fn name(&self) -> &str {
        "hostname"
    }
    fn description(&self) -> &str {
        "Print system host name | 显示主机名"
    }
    fn usage(&self) -> &str {
        "hostname"
    }
    fn category(&self) -> Category {
        Category::System
    }
    fn execute(
        &self,
        _args: &[&str],
        ctx: &mut ExecutionContext,
        _fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(ctx.hostname.clone()))
    }
}

// ---------------------------------------------------------------------------
// date
// ---------------------------------------------------------------------------

struct DateCmd;
impl Command for DateCmd {
    fn name(&self) -> &str {
        "date"
    }
    fn description(&self) -> &str {
        "Print the current date and time | 显示当前日期和时间"
    }
    fn usage(&self) -> &str {
        "date [+FORMAT]"
    }
    fn category(&self) -> Category {
        Category::System
    }
    fn examples(&self) -> &[&str] {
        &["date", "date +%Y-%m-%d", "date '+%H:%M'"]
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let format = match args {
            [] => "%a %b %e %H:%M:%S UTC %Y",
            [custom] => custom.strip_prefix('+').ok_or_else(|| {
                ShellboxError::Command(format!("date: invalid date '{custom}'"))
            })?,
            [_, extra, ..] => {
                return Err(ShellboxError::Command(format!(
                    "date: extra operand '{extra}'"
                )));
            },
        };
        let items: Vec<_> = chrono::format::StrftimeItems::new(format).collect();
        if items.contains(&chrono::format::Item::Error) {
            return Err(ShellboxError::Command(format!(
                "date: invalid format '{format}'"
            )));
        }
        Ok(CommandOutput::Text(
            fs.now().format_with_items(items.into_iter()).to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// uname
// ---------------------------------------------------------------------------

const UNAME_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag('a', "all", "print all information"),
    OptionSpec::flag('s', "kernel-name", "print the kernel name"),
    OptionSpec::flag('n', "nodename", "print the network node hostname"),
    OptionSpec::flag('r', "kernel-release", "print the kernel release"),
    OptionSpec::flag('m', "machine", "print the machine hardware name"),
];

struct UnameCmd;
impl Command for UnameCmd {
    fn name(&self) -> &str {
        "uname"
    }
    fn description(&self) -> &str {
        "Print system information | 显示系统信息"
    }
    fn usage(&self) -> &str {
        "uname [-asnrm]"
    }
    fn category(&self) -> Category {
        Category::System
    }
    fn options(&self) -> &[OptionSpec] {
        UNAME_OPTIONS
    }
    fn execute(
        &self,
        args: &[&str],
        ctx: &mut ExecutionContext,
        _fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("uname", UNAME_OPTIONS, args)?;
        if let Some(extra) = parsed.operands().first() {
            return Err(ShellboxError::Command(format!(
                "uname: extra operand '{extra}'"
            )));
        }
        let all = parsed.has('a');
        let fields = [
            ('s', "Linux"),
            ('n', ctx.hostname.as_str()),
            ('r', KERNEL_RELEASE),
            ('m', "x86_64"),
        ];
        let mut out: Vec<&str> = fields
            .iter()
            .filter(|(flag, _)| all || parsed.has(*flag))
            .map(|(_, value)| *value)
            .collect();
        if out.is_empty() {
            out.push("Linux");
        }
        if all {
            out.push("GNU/Linux");
        }
        Ok(CommandOutput::Text(out.join(" ")))
    }
}

// ---------------------------------------------------------------------------
// df
// ---------------------------------------------------------------------------

const DF_OPTIONS: &[OptionSpec] = &[OptionSpec::flag(
    'h',
    "human-readable",
    "print sizes in powers of 1024 (e.g. 1.5K)",
)];

struct DfCmd;
impl Command for DfCmd {
    fn name(&self) -> &str {
        "df"
    }
    fn description(&self) -> &str {
        "Show filesystem usage | 显示文件系统使用情况"
    }
    fn usage(&self) -> &str {
        "df [-h]"
    }
    fn category(&self) -> Category {
        Category::System
    }
    fn options(&self) -> &[OptionSpec] {
        DF_OPTIONS
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("df", DF_OPTIONS, args)?;
        let stats = fs.statistics();
        let used = stats.total_size;
        let avail = CAPACITY_BYTES.saturating_sub(used);
        let percent = (used * 100).div_ceil(CAPACITY_BYTES);
        let (header, size, used, avail) = if parsed.has('h') {
            (
                "Size",
                human_size(CAPACITY_BYTES),
                human_size(used),
                human_size(avail),
            )
        } else {
            (
                "1K-blocks",
                CAPACITY_BYTES.div_ceil(1024).to_string(),
                used.div_ceil(1024).to_string(),
                (avail / 1024).to_string(),
            )
        };
        let lines = [
            format!("Filesystem   {header:>9} {:>9} {:>9} Use% Mounted on", "Used", "Avail"),
            format!("shellbox     {size:>9} {used:>9} {avail:>9} {:>3}% /", percent),
            format!(
                "\n{} files, {} directories",
                stats.total_files, stats.total_dirs
            ),
        ];
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// du
// ---------------------------------------------------------------------------

const DU_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag('s', "summarize", "display only a total for each argument"),
    OptionSpec::flag('h', "human-readable", "print sizes like 1.5K"),
];

struct DuCmd;
impl Command for DuCmd {
    fn name(&self) -> &str {
        "du"
    }
    fn description(&self) -> &str {
        "Estimate disk usage | 估算磁盘使用量"
    }
    fn usage(&self) -> &str {
        "du [-sh] [path...]"
    }
    fn category(&self) -> Category {
        Category::System
    }
    fn options(&self) -> &[OptionSpec] {
        DU_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["du", "du -sh Documents", "du -h /"]
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("du", DU_OPTIONS, args)?;
        let human = parsed.has('h');
        let render = |bytes: u64| {
            if human {
                human_size(bytes)
            } else {
                bytes.div_ceil(1024).to_string()
            }
        };
        let targets: Vec<&str> = match parsed.operands() {
            [] => vec!["."],
            ops => ops.iter().map(String::as_str).collect(),
        };

        let mut lines = Vec::new();
        for target in targets {
            let node = fs
                .node(target)
                .ok_or_else(|| ShellboxError::fs(FsErrorKind::FileNotFound, target))?;
            if parsed.has('s') || !node.is_dir() {
                let total = fs.disk_usage(target).unwrap_or(0);
                lines.push(format!("{}\t{target}", render(total)));
            } else {
                let mut rows = Vec::new();
                du_recursive(node, target, &mut rows);
                lines.extend(rows.into_iter().map(|(bytes, p)| format!("{}\t{p}", render(bytes))));
            }
        }
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

/// Post-order walk collecting (bytes, path) for every directory.
fn du_recursive(dir: &Node, shown: &str, rows: &mut Vec<(u64, String)>) -> u64 {
    let mut total = 0;
    if let Some(children) = dir.children() {
        for (name, child) in children {
            if child.is_dir() {
                total += du_recursive(child, &path::join(shown, name), rows);
            } else {
                total += child.meta().size;
            }
        }
    }
    rows.push((total, shown.to_string()));
    total
}

// ---------------------------------------------------------------------------
// clear
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the terminal screen | 清屏"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn category(&self) -> Category {
        Category::System
    }
    fn supports_redirect(&self) -> bool {
        false
    }
    fn execute(
        &self,
        _args: &[&str],
        _ctx: &mut ExecutionContext,
        _fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}
