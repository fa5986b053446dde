//! Text processing commands: echo, head, tail, wc, grep.

use shellbox_types::error::{Result, ShellboxError};
use shellbox_vfs::FileSystem;

use crate::file_commands::read_file;
use crate::interpreter::{Category, Command, CommandOutput, CommandRegistry, ExecutionContext};
use crate::options::{OptionSpec, ParsedArgs, parse};

/// Register text processing commands.
pub fn register_text_commands(reg: &mut CommandRegistry) -> Result<()> {
    reg.register(Box::new(EchoCmd))?;
    reg.register(Box::new(HeadCmd))?;
    reg.register(Box::new(TailCmd))?;
    reg.register(Box::new(WcCmd))?;
    reg.register(Box::new(GrepCmd))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print text | 输出文本"
    }
    fn usage(&self) -> &str {
        "echo [text...]"
    }
    fn category(&self) -> Category {
        Category::Text
    }
    fn examples(&self) -> &[&str] {
        &["echo hello", "echo \"a b\" > note.txt", "echo more >> note.txt"]
    }
    fn execute(
        &self,
        args: &[&str],
        _ctx: &mut ExecutionContext,
        _fs: &mut FileSystem,
    ) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(args.join(" ")))
    }
}

// ---------------------------------------------------------------------------
// head / tail
// ---------------------------------------------------------------------------

const LINES_OPTIONS: &[OptionSpec] = &[OptionSpec::number(
    'n',
    "lines",
    "NUM",
    "number of lines (default 10)",
)];

/// Line count from `-n`, defaulting to 10.
fn line_count(command: &str, parsed: &ParsedArgs) -> Result<usize> {
    match parsed.number('n') {
        None => Ok(10),
        Some(n) => usize::try_from(n).map_err(|_| {
            ShellboxError::Command(format!("{command}: invalid number of lines: '{n}'"))
        }),
    }
}

struct HeadCmd;
impl Command for HeadCmd {
    fn name(&self) -> &str {
        "head"
    }
    fn description(&self) -> &str {
        "Show the first lines of a file | 显示文件开头几行"
    }
    fn usage(&self) -> &str {
        "head [-n NUM] [file]"
    }
    fn category(&self) -> Category {
        Category::Text
    }
    fn options(&self) -> &[OptionSpec] {
        LINES_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["head /etc/passwd", "head -n 3 Documents/notes.txt"]
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
        let parsed = parse("head", LINES_OPTIONS, args)?;
        let n = line_count("head", &parsed)?;
        let text = read_input("head", &parsed, ctx, fs)?;
        let result: Vec<&str> = text.lines().take(n).collect();
        Ok(CommandOutput::Text(result.join("\n")))
    }
}

struct TailCmd;
impl Command for TailCmd {
    fn name(&self) -> &str {
        "tail"
    }
    fn description(&self) -> &str {
        "Show the last lines of a file | 显示文件末尾几行"
    }
    fn usage(&self) -> &str {
        "tail [-n NUM] [file]"
    }
    fn category(&self) -> Category {
        Category::Text
    }
    fn options(&self) -> &[OptionSpec] {
        LINES_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["tail /var/log/syslog", "tail -n 1 /etc/passwd"]
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
        let parsed = parse("tail", LINES_OPTIONS, args)?;
        let n = line_count("tail", &parsed)?;
        let text = read_input("tail", &parsed, ctx, fs)?;
        let lines: Vec<&str> = text.lines().collect();
        let start = lines.len().saturating_sub(n);
        Ok(CommandOutput::Text(lines[start..].join("\n")))
    }
}

// ---------------------------------------------------------------------------
// wc
// ---------------------------------------------------------------------------

const WC_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag('l', "lines", "print the newline counts"),
    OptionSpec::flag('w', "words", "print the word counts"),
    OptionSpec::flag('c', "bytes", "print the byte counts"),
];

struct WcCmd;
impl Command for WcCmd {
    fn name(&self) -> &str {
        "wc"
    }
    fn description(&self) -> &str {
        "Count lines, words, and bytes | 统计行数、单词数和字节数"
    }
    fn usage(&self) -> &str {
        "wc [-lwc] [file]"
    }
    fn category(&self) -> Category {
        Category::Text
    }
    fn options(&self) -> &[OptionSpec] {
        WC_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["wc Documents/notes.txt", "cat /etc/passwd | wc -l"]
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
        let parsed = parse("wc", WC_OPTIONS, args)?;
        let text = read_input("wc", &parsed, ctx, fs)?;
        let counts = [
            ('l', text.lines().count()),
            ('w', text.split_whitespace().count()),
            ('c', text.len()),
        ];
        let any = counts.iter().any(|(flag, _)| parsed.has(*flag));
        let mut fields: Vec<String> = counts
            .iter()
            .filter(|(flag, _)| !any || parsed.has(*flag))
            .map(|(_, n)| format!("{n:>7}"))
            .collect();
        if let Some(file) = parsed.operands().first() {
            fields.push(file.clone());
        }
        Ok(CommandOutput::Text(fields.join(" ")))
    }
}

// ---------------------------------------------------------------------------
// grep
// ---------------------------------------------------------------------------

const GREP_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag('i', "ignore-case", "ignore case distinctions"),
    OptionSpec::flag('n', "line-number", "prefix each line with its line number"),
    OptionSpec::flag('v', "invert-match", "select non-matching lines"),
];

struct GrepCmd;
impl Command for GrepCmd {
    fn name(&self) -> &str {
        "grep"
    }
    fn description(&self) -> &str {
        "Search text for a pattern | 在文本中搜索模式"
    }
    fn usage(&self) -> &str {
        "grep [-inv] <pattern> [file...]"
    }
    fn category(&self) -> Category {
        Category::Text
    }
    fn options(&self) -> &[OptionSpec] {
        GREP_OPTIONS
    }
    fn examples(&self) -> &[&str] {
        &["grep ls Documents/notes.txt", "cat /etc/passwd | grep -n bash"]
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
        let parsed = parse("grep", GREP_OPTIONS, args)?;
        let Some((pattern, files)) = parsed.operands().split_first() else {
            return Err(ShellboxError::Command(
                "usage: grep [-inv] <pattern> [file...]".to_string(),
            ));
        };
        let ignore_case = parsed.has('i');
        let needle = if ignore_case {
            pattern.to_lowercase()
        } else {
            pattern.clone()
        };

        let sources: Vec<(Option<&str>, String)> = if files.is_empty() {
            vec![(None, ctx.stdin.take().unwrap_or_default())]
        } else {
            files
                .iter()
                .map(|f| read_file(fs, f).map(|text| (Some(f.as_str()), text)))
                .collect::<Result<_>>()?
        };
        let prefix_names = sources.len() > 1;

        let mut matches = Vec::new();
        for (name, text) in &sources {
            for (i, line) in text.lines().enumerate() {
                let found = if ignore_case {
                    line.to_lowercase().contains(&needle)
                } else {
                    line.contains(&needle)
                };
                if found == parsed.has('v') {
                    continue;
                }
                let mut out = String::new();
                if let Some(name) = name
                    && prefix_names
                {
                    out.push_str(&format!("{name}:"));
                }
                if parsed.has('n') {
                    out.push_str(&format!("{}:", i + 1));
                }
                out.push_str(line);
                matches.push(out);
            }
        }
        Ok(CommandOutput::Text(matches.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read the single file operand, or piped input when there is none.
fn read_input(
    command: &str,
    parsed: &ParsedArgs,
    ctx: &mut ExecutionContext,
    fs: &FileSystem,
) -> Result<String> {
    match parsed.operands() {
        [] => ctx.stdin.take().ok_or_else(|| {
            ShellboxError::Command(format!("{command}: missing file operand"))
        }),
        [file] => read_file(fs, file),
        [_, extra, ..] => Err(ShellboxError::Command(format!(
            "{command}: extra operand '{extra}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_commands::register_file_commands;
    use shellbox_vfs::{FsOptions, WriteMode, populate_demo_tree};

    fn setup() -> (CommandRegistry, ExecutionContext, FileSystem) {
        let mut reg = CommandRegistry::new();
        register_text_commands(&mut reg).unwrap();
        register_file_commands(&mut reg).unwrap();
        let mut fs = FileSystem::in_memory(FsOptions::default());
        populate_demo_tree(&mut fs).unwrap();
        fs.write_file("nums.txt", "one\ntwo\nthree\nfour\nfive\n", WriteMode::Overwrite)
            .unwrap();
        (reg, ExecutionContext::default(), fs)
    }

    fn run(reg: &CommandRegistry, ctx: &mut ExecutionContext, fs: &mut FileSystem, line: &str) -> String {
        match reg.execute(line, ctx, fs).unwrap() {
            CommandOutput::Text(s) => s,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn echo_joins_args() {
        let (reg, mut ctx, mut fs) = setup();
        assert_eq!(run(&reg, &mut ctx, &mut fs, "echo  a   'b  c'"), "a b  c");
    }

    #[test]
    fn echo_redirect_then_cat() {
        let (reg, mut ctx, mut fs) = setup();
        reg.execute("echo first > log.txt", &mut ctx, &mut fs).unwrap();
        reg.execute("echo second >> log.txt", &mut ctx, &mut fs).unwrap();
        assert_eq!(run(&reg, &mut ctx, &mut fs, "cat log.txt"), "first\nsecond");
    }

    #[test]
    fn head_and_tail() {
        let (reg, mut ctx, mut fs) = setup();
        assert_eq!(run(&reg, &mut ctx, &mut fs, "head -n 2 nums.txt"), "one\ntwo");
        assert_eq!(run(&reg, &mut ctx, &mut fs, "tail -n2 nums.txt"), "four\nfive");
        assert_eq!(run(&reg, &mut ctx, &mut fs, "head nums.txt").lines().count(), 5);
        assert_eq!(run(&reg, &mut ctx, &mut fs, "tail -n 0 nums.txt"), "");
    }

    #[test]
    fn head_rejects_negative_count() {
        let (reg, mut ctx, mut fs) = setup();
        let err = reg.execute("head -n -1 nums.txt", &mut ctx, &mut fs).unwrap_err();
        assert_eq!(err.to_string(), "head: invalid number of lines: '-1'");
    }

    #[test]
    fn head_reads_pipe() {
        let (reg, mut ctx, mut fs) = setup();
        assert_eq!(run(&reg, &mut ctx, &mut fs, "cat nums.txt | head -n 1"), "one");
    }

    #[test]
    fn wc_counts() {
        let (reg, mut ctx, mut fs) = setup();
        assert_eq!(
            run(&reg, &mut ctx, &mut fs, "wc nums.txt"),
            "      5       5      24 nums.txt"
        );
        assert_eq!(run(&reg, &mut ctx, &mut fs, "cat nums.txt | wc -l"), "      5");
        assert_eq!(
            run(&reg, &mut ctx, &mut fs, "wc -lc nums.txt"),
            "      5      24 nums.txt"
        );
    }

    #[test]
    fn grep_flags() {
        let (reg, mut ctx, mut fs) = setup();
        assert_eq!(run(&reg, &mut ctx, &mut fs, "grep o nums.txt"), "one\ntwo\nfour");
        assert_eq!(run(&reg, &mut ctx, &mut fs, "grep -n t nums.txt"), "2:two\n3:three");
        assert_eq!(run(&reg, &mut ctx, &mut fs, "grep -v e nums.txt"), "two\nfour");
        assert_eq!(run(&reg, &mut ctx, &mut fs, "grep -i ONE nums.txt"), "one");
    }

    #[test]
    fn grep_multiple_files_prefixes_names() {
        let (reg, mut ctx, mut fs) = setup();
        let out = run(&reg, &mut ctx, &mut fs, "grep five nums.txt /etc/passwd");
        assert_eq!(out, "nums.txt:five");
    }

    #[test]
    fn grep_pipeline() {
        let (reg, mut ctx, mut fs) = setup();
        let out = run(&reg, &mut ctx, &mut fs, "cat /etc/passwd | grep favork | wc -l");
        assert_eq!(out.trim(), "1");
    }

    #[test]
    fn grep_missing_pattern_or_file() {
        let (reg, mut ctx, mut fs) = setup();
        assert!(reg.execute("grep -i", &mut ctx, &mut fs).is_err());
        let err = reg.execute("grep x nope.txt", &mut ctx, &mut fs).unwrap_err();
        assert_eq!(err.to_string(), "grep: nope.txt: No such file or directory");
    }

    #[test]
    fn echo_does_not_read_pipes() {
        let (reg, mut ctx, mut fs) = setup();
        let err = reg.execute("cat nums.txt | echo", &mut ctx, &mut fs).unwrap_err();
        assert_eq!(err.to_string(), "echo: does not read from a pipe");
    }
}
