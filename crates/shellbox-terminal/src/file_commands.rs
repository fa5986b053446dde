//! File commands: cat, touch, mkdir, rm, rmdir, cp, mv, stat.

use shellbox_types::error::{FsErrorKind, Result, ShellboxError};
use shellbox_vfs::FileSystem;

use crate::interpreter::{Category, Command, CommandOutput, CommandRegistry, ExecutionContext};
use crate::options::{OptionSpec, parse};

/// Register file commands.
pub fn register_file_commands(reg: &mut CommandRegistry) -> Result<()> {
    reg.register(Box::new(CatCmd))?;
    reg.register(Box::new(TouchCmd))?;
    reg.register(Box::new(MkdirCmd))?;
    reg.register(Box::new(RmCmd))?;
    reg.register(Box::new(RmdirCmd))?;
    reg.register(Box::new(CpCmd))?;
    reg.register(Box::new(MvCmd))?;
    reg.register(Box::new(StatCmd))?;
    Ok(())
}

/// Content of a file operand, distinguishing directories from missing paths.
pub(crate) fn read_file(fs: &FileSystem, input: &str) -> Result<String> {
    fs.file_content(input).ok_or_else(|| {
        let kind = if fs.is_directory(input) {
            FsErrorKind::IsADirectory
        } else {
            FsErrorKind::FileNotFound
        };
        ShellboxError::fs(kind, input)
    })
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

const CAT_OPTIONS: &[OptionSpec] = &[OptionSpec::flag('n', "number", "number all output lines")];

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Print file contents | 显示文件内容"
    }
    fn usage(&self) -> &str {
        "cat [-n] <file...>"
    }
    fn category(&self) -> Category {
        Category::Files
    }
    fn options(&self) -> &[OptionSpec] {
        CAT_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["cat Documents/notes.txt", "cat -n .bashrc", "echo hi | cat"]
    }
    fn supports_pipe(&self) -> bool {
        true
    }
    fn requires_args(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[&str],
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("cat", CAT_OPTIONS, args)?;
        let mut text = String::new();
        if parsed.operands().is_empty() {
            text = ctx.stdin.take().unwrap_or_default();
        }
        for file in parsed.operands() {
            if file == "-" {
                text.push_str(&ctx.stdin.take().unwrap_or_default());
            } else {
                text.push_str(&read_file(fs, file)?);
            }
        }
        if parsed.has('n') {
            text = text
                .lines()
                .enumerate()
                .map(|(i, line)| format!("{:>6}\t{line}", i + 1))
                .collect::<Vec<_>>()
                .join("\n");
        }
        Ok(CommandOutput::Text(text.trim_end_matches('\n').to_string()))
    }
}

// ---------------------------------------------------------------------------
// touch
// ---------------------------------------------------------------------------

struct TouchCmd;
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create empty file or update timestamp | 创建空文件或更新时间戳"
    }
    fn usage(&self) -> &str {
        "touch <file...>"
    }
    fn category(&self) -> Category {
        Category::Files
    }
    fn requires_args(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        for file in parse("touch", &[], args)?.operands() {
            fs.touch(file)?;
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

const MKDIR_OPTIONS: &[OptionSpec] = &[OptionSpec::flag(
    'p',
    "parents",
    "make parent directories as needed, no error if existing",
)];

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create directories | 创建目录"
    }
    fn usage(&self) -> &str {
        "mkdir [-p] <dir...>"
    }
    fn category(&self) -> Category {
        Category::Files
    }
    fn options(&self) -> &[OptionSpec] {
        MKDIR_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["mkdir Projects", "mkdir -p src/bin"]
    }
    fn requires_args(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("mkdir", MKDIR_OPTIONS, args)?;
        if parsed.operands().is_empty() {
            return Err(ShellboxError::Command("mkdir: missing operand".to_string()));
        }
        for dir in parsed.operands() {
            if parsed.has('p') {
                fs.create_directory_all(dir)?;
            } else {
                fs.try_create_directory(dir)?;
            }
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// rm
// ---------------------------------------------------------------------------

const RM_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag('r', "recursive", "remove directories and their contents"),
    OptionSpec::flag('f', "force", "ignore nonexistent files"),
];

struct RmCmd;
impl Command for RmCmd {
    fn name(&self) -> &str {
        "rm"
    }
    fn description(&self) -> &str {
        "Remove files or directories | 删除文件或目录"
    }
    fn usage(&self) -> &str {
        "rm [-rf] <path...>"
    }
    fn category(&self) -> Category {
        Category::Files
    }
    fn options(&self) -> &[OptionSpec] {
        RM_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["rm notes.txt", "rm -r old_project", "rm -f maybe.txt"]
    }
    fn requires_args(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("rm", RM_OPTIONS, args)?;
        let force = parsed.has('f');
        if parsed.operands().is_empty() && !force {
            return Err(ShellboxError::Command("rm: missing operand".to_string()));
        }
        for path in parsed.operands() {
            if !fs.exists(path) {
                if force {
                    continue;
                }
                return Err(ShellboxError::fs(FsErrorKind::FileNotFound, path.as_str()));
            }
            if fs.is_directory(path) {
                if !parsed.has('r') {
                    return Err(ShellboxError::fs(FsErrorKind::IsADirectory, path.as_str()));
                }
                fs.remove_directory(path, true)?;
            } else {
                fs.delete_file(path);
            }
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// rmdir
// ---------------------------------------------------------------------------

struct RmdirCmd;
impl Command for RmdirCmd {
    fn name(&self) -> &str {
        "rmdir"
    }
    fn description(&self) -> &str {
        "Remove empty directories | 删除空目录"
    }
    fn usage(&self) -> &str {
        "rmdir <dir...>"
    }
    fn category(&self) -> Category {
        Category::Files
    }
    fn requires_args(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        for dir in parse("rmdir", &[], args)?.operands() {
            fs.remove_directory(dir, false)?;
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// cp / mv
// ---------------------------------------------------------------------------

const CP_OPTIONS: &[OptionSpec] = &[OptionSpec::flag(
    'r',
    "recursive",
    "copy directories recursively",
)];

const MV_OPTIONS: &[OptionSpec] = &[OptionSpec::flag(
    'f',
    "force",
    "do not prompt before overwriting (mv never prompts)",
)];

/// Split `src... dst` operands, requiring `dst` to be a directory when
/// there is more than one source.
fn sources_and_dest<'a>(
    command: &str,
    operands: &'a [String],
    fs: &FileSystem,
) -> Result<(&'a [String], &'a str)> {
    let Some((dest, sources)) = operands.split_last() else {
        return Err(ShellboxError::Command(format!("{command}: missing file operand")));
    };
    if sources.is_empty() {
        return Err(ShellboxError::Command(format!(
            "{command}: missing destination file operand after '{dest}'"
        )));
    }
    if sources.len() > 1 && !fs.is_directory(dest) {
        return Err(ShellboxError::fs(FsErrorKind::NotADirectory, dest.as_str()));
    }
    Ok((sources, dest.as_str()))
}

struct CpCmd;
impl Command for CpCmd {
    fn name(&self) -> &str {
        "cp"
    }
    fn description(&self) -> &str {
        "Copy files and directories | 复制文件和目录"
    }
    fn usage(&self) -> &str {
        "cp [-r] <src...> <dst>"
    }
    fn category(&self) -> Category {
        Category::Files
    }
    fn options(&self) -> &[OptionSpec] {
        CP_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["cp notes.txt backup.txt", "cp -r Documents /tmp"]
    }
    fn requires_args(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("cp", CP_OPTIONS, args)?;
        let (sources, dest) = sources_and_dest("cp", parsed.operands(), fs)?;
        for src in sources {
            fs.copy_entry(src, dest, parsed.has('r'))?;
        }
        Ok(CommandOutput::None)
    }
}

struct MvCmd;
impl Command for MvCmd {
    fn name(&self) -> &str {
        "mv"
    }
    fn description(&self) -> &str {
        "Move or rename files | 移动或重命名文件"
    }
    fn usage(&self) -> &str {
        "mv [-f] <src...> <dst>"
    }
    fn category(&self) -> Category {
        Category::Files
    }
    fn options(&self) -> &[OptionSpec] {
        MV_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["mv draft.txt final.txt", "mv notes.txt Documents"]
    }
    fn requires_args(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("mv", MV_OPTIONS, args)?;
        let (sources, dest) = sources_and_dest("mv", parsed.operands(), fs)?;
        for src in sources {
            fs.move_entry(src, dest)?;
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// stat
// ---------------------------------------------------------------------------

struct StatCmd;
impl Command for StatCmd {
    fn name(&self) -> &str {
        "stat"
    }
    fn description(&self) -> &str {
        "Show file metadata | 显示文件元数据"
    }
    fn usage(&self) -> &str {
        "stat <path...>"
    }
    fn category(&self) -> Category {
        Category::Files
    }
    fn requires_args(&self) -> bool {
        true
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        let parsed = parse("stat", &[], args)?;
        let mut blocks = Vec::new();
        for path in parsed.operands() {
            let st = fs
                .stat(path)
                .ok_or_else(|| ShellboxError::fs(FsErrorKind::FileNotFound, path.as_str()))?;
            let kind = if st.is_dir() {
                "directory"
            } else if st.size == 0 {
                "regular empty file"
            } else {
                "regular file"
            };
            blocks.push(format!(
                "  File: {path}\n  Size: {:<10} Type: {kind}\nAccess: {}  Owner: {}  Group: {}\nModify: {}",
                st.size,
                st.permissions,
                st.owner,
                st.group,
                st.modified.format("%Y-%m-%d %H:%M:%S UTC"),
            ));
        }
        Ok(CommandOutput::Text(blocks.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellbox_vfs::{FsOptions, populate_demo_tree};

    fn setup() -> (CommandRegistry, ExecutionContext, FileSystem) {
        let mut reg = CommandRegistry::new();
        register_file_commands(&mut reg).unwrap();
        let mut fs = FileSystem::in_memory(FsOptions::default());
        populate_demo_tree(&mut fs).unwrap();
        (reg, ExecutionContext::default(), fs)
    }

    fn exec(
        reg: &CommandRegistry,
        ctx: &mut ExecutionContext,
        fs: &mut FileSystem,
        line: &str,
    ) -> Result<CommandOutput> {
        reg.execute(line, ctx, fs)
    }

    fn text(out: CommandOutput) -> String {
        match out {
            CommandOutput::Text(s) => s,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn cat_reads_file() {
        let (reg, mut ctx, mut fs) = setup();
        let out = text(exec(&reg, &mut ctx, &mut fs, "cat /etc/hostname").unwrap());
        assert_eq!(out, "shellbox");
    }

    #[test]
    fn cat_numbers_lines() {
        let (reg, mut ctx, mut fs) = setup();
        let out = text(exec(&reg, &mut ctx, &mut fs, "cat -n .profile").unwrap());
        assert!(out.starts_with("     1\t# ~/.profile"));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn cat_errors_name_the_path() {
        let (reg, mut ctx, mut fs) = setup();
        let err = exec(&reg, &mut ctx, &mut fs, "cat missing.txt").unwrap_err();
        assert_eq!(err.to_string(), "cat: missing.txt: No such file or directory");
        let err = exec(&reg, &mut ctx, &mut fs, "cat Documents").unwrap_err();
        assert_eq!(err.to_string(), "cat: Documents: Is a directory");
    }

    #[test]
    fn cat_without_operand_needs_input() {
        let (reg, mut ctx, mut fs) = setup();
        assert!(exec(&reg, &mut ctx, &mut fs, "cat").is_err());
    }

    #[test]
    fn touch_creates_empty_file() {
        let (reg, mut ctx, mut fs) = setup();
        exec(&reg, &mut ctx, &mut fs, "touch a.txt b.txt").unwrap();
        assert_eq!(fs.file_content("a.txt").as_deref(), Some(""));
        assert!(fs.is_file("b.txt"));
    }

    #[test]
    fn mkdir_collision_reports_exists() {
        let (reg, mut ctx, mut fs) = setup();
        let err = exec(&reg, &mut ctx, &mut fs, "mkdir Documents").unwrap_err();
        assert_eq!(err.to_string(), "mkdir: Documents: File exists");
    }

    #[test]
    fn mkdir_parents() {
        let (reg, mut ctx, mut fs) = setup();
        assert!(exec(&reg, &mut ctx, &mut fs, "mkdir a/b").is_err());
        exec(&reg, &mut ctx, &mut fs, "mkdir -p a/b").unwrap();
        assert!(fs.is_directory("a/b"));
        exec(&reg, &mut ctx, &mut fs, "mkdir -p a/b").unwrap();
    }

    #[test]
    fn rm_file_and_directory() {
        let (reg, mut ctx, mut fs) = setup();
        exec(&reg, &mut ctx, &mut fs, "rm .profile").unwrap();
        assert!(!fs.exists(".profile"));
        let err = exec(&reg, &mut ctx, &mut fs, "rm Documents").unwrap_err();
        assert_eq!(err.to_string(), "rm: Documents: Is a directory");
        exec(&reg, &mut ctx, &mut fs, "rm -r Documents").unwrap();
        assert!(!fs.exists("Documents"));
    }

    #[test]
    fn rm_force_ignores_missing() {
        let (reg, mut ctx, mut fs) = setup();
        assert!(exec(&reg, &mut ctx, &mut fs, "rm ghost").is_err());
        exec(&reg, &mut ctx, &mut fs, "rm -f ghost").unwrap();
    }

    #[test]
    fn rmdir_only_empty() {
        let (reg, mut ctx, mut fs) = setup();
        let err = exec(&reg, &mut ctx, &mut fs, "rmdir Documents").unwrap_err();
        assert_eq!(err.to_string(), "rmdir: Documents: Directory not empty");
        exec(&reg, &mut ctx, &mut fs, "rmdir Pictures").unwrap();
        assert!(!fs.exists("Pictures"));
    }

    #[test]
    fn cp_and_mv() {
        let (reg, mut ctx, mut fs) = setup();
        exec(&reg, &mut ctx, &mut fs, "cp .bashrc bashrc.bak").unwrap();
        assert_eq!(fs.file_content("bashrc.bak"), fs.file_content(".bashrc"));
        exec(&reg, &mut ctx, &mut fs, "mv bashrc.bak Downloads").unwrap();
        assert!(fs.is_file("Downloads/bashrc.bak"));
        assert!(!fs.exists("bashrc.bak"));
    }

    #[test]
    fn cp_multiple_sources_need_directory() {
        let (reg, mut ctx, mut fs) = setup();
        let err = exec(&reg, &mut ctx, &mut fs, "cp .bashrc .profile x.txt").unwrap_err();
        assert_eq!(err.to_string(), "cp: x.txt: Not a directory");
        exec(&reg, &mut ctx, &mut fs, "cp .bashrc .profile /tmp").unwrap();
        assert!(fs.is_file("/tmp/.profile"));
    }

    #[test]
    fn cp_directory_requires_recursive() {
        let (reg, mut ctx, mut fs) = setup();
        let err = exec(&reg, &mut ctx, &mut fs, "cp Documents Docs").unwrap_err();
        assert_eq!(err.to_string(), "cp: Documents: Is a directory");
        exec(&reg, &mut ctx, &mut fs, "cp -r Documents Docs").unwrap();
        assert!(fs.is_file("Docs/notes.txt"));
    }

    #[test]
    fn mv_missing_destination_operand() {
        let (reg, mut ctx, mut fs) = setup();
        let err = exec(&reg, &mut ctx, &mut fs, "mv .bashrc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "mv: missing destination file operand after '.bashrc'"
        );
    }

    #[test]
    fn mv_accepts_force_and_rejects_unknown_flags() {
        let (reg, mut ctx, mut fs) = setup();
        exec(&reg, &mut ctx, &mut fs, "mv -f .profile profile.bak").unwrap();
        assert!(!fs.exists(".profile"));
        assert!(fs.is_file("profile.bak"));
        let err = exec(&reg, &mut ctx, &mut fs, "mv -x profile.bak .profile").unwrap_err();
        assert_eq!(err.to_string(), "mv: invalid option -- 'x'");
        assert!(fs.is_file("profile.bak"));
    }

    #[test]
    fn unknown_flags_rejected_before_touching_files() {
        let (reg, mut ctx, mut fs) = setup();
        for (line, msg) in [
            ("touch -q new.txt", "touch: invalid option -- 'q'"),
            ("rmdir -q Pictures", "rmdir: invalid option -- 'q'"),
            ("stat -q .bashrc", "stat: invalid option -- 'q'"),
        ] {
            let err = exec(&reg, &mut ctx, &mut fs, line).unwrap_err();
            assert_eq!(err.to_string(), msg);
        }
        assert!(!fs.exists("new.txt"));
        assert!(fs.is_directory("Pictures"));
        exec(&reg, &mut ctx, &mut fs, "touch -- -dash").unwrap();
        assert!(fs.is_file("-dash"));
    }

    #[test]
    fn stat_shows_metadata() {
        let (reg, mut ctx, mut fs) = setup();
        let out = text(exec(&reg, &mut ctx, &mut fs, "stat /etc/hostname").unwrap());
        assert!(out.contains("File: /etc/hostname"));
        assert!(out.contains("Size: 9"));
        assert!(out.contains("Owner: root"));
        let dir = text(exec(&reg, &mut ctx, &mut fs, "stat Documents").unwrap());
        assert!(dir.contains("Type: directory"));
        assert!(exec(&reg, &mut ctx, &mut fs, "stat nope").is_err());
    }
}
