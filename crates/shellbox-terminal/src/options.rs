//! Declarative option schemas and the generic parser that interprets them.
//!
//! Commands declare their options as a slice of [`OptionSpec`]; parsing,
//! validation, and usage rendering are shared.

use std::collections::{HashMap, HashSet};

use shellbox_types::error::{Result, ShellboxError};

/// The type of value an option takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// A switch with no value.
    Boolean,
    /// A single-word value.
    StringInput { placeholder: &'static str },
    /// An integer value.
    NumberInput { placeholder: &'static str },
    /// One of a fixed set of values.
    Enum { choices: &'static [&'static str] },
    /// Arbitrary text, possibly with spaces when quoted.
    FreeText { placeholder: &'static str },
}

impl OptionKind {
    pub fn takes_value(self) -> bool {
        !matches!(self, Self::Boolean)
    }

    fn placeholder(self) -> String {
        match self {
            Self::Boolean => String::new(),
            Self::StringInput { placeholder }
            | Self::NumberInput { placeholder }
            | Self::FreeText { placeholder } => placeholder.to_string(),
            Self::Enum { choices } => choices.join("|"),
        }
    }
}

/// One option in a command's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    pub short: char,
    pub long: Option<&'static str>,
    pub kind: OptionKind,
    pub description: &'static str,
}

impl OptionSpec {
    pub const fn flag(short: char, long: &'static str, description: &'static str) -> Self {
        Self {
            short,
            long: Some(long),
            kind: OptionKind::Boolean,
            description,
        }
    }

    /// A switch with no long form.
    pub const fn short(short: char, description: &'static str) -> Self {
        Self {
            short,
            long: None,
            kind: OptionKind::Boolean,
            description,
        }
    }

    pub const fn number(
        short: char,
        long: &'static str,
        placeholder: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            short,
            long: Some(long),
            kind: OptionKind::NumberInput { placeholder },
            description,
        }
    }

    pub const fn string(
        short: char,
        long: &'static str,
        placeholder: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            short,
            long: Some(long),
            kind: OptionKind::StringInput { placeholder },
            description,
        }
    }

    pub const fn text(
        short: char,
        long: &'static str,
        placeholder: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            short,
            long: Some(long),
            kind: OptionKind::FreeText { placeholder },
            description,
        }
    }

    pub const fn choice(
        short: char,
        long: &'static str,
        choices: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self {
            short,
            long: Some(long),
            kind: OptionKind::Enum { choices },
            description,
        }
    }

    fn display_name(&self) -> String {
        match self.long {
            Some(long) => format!("--{long}"),
            None => format!("-{}", self.short),
        }
    }
}

/// Result of parsing arguments against a schema.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    flags: HashSet<char>,
    values: HashMap<char, String>,
    operands: Vec<String>,
}

impl ParsedArgs {
    /// Whether the option with short name `short` was given.
    pub fn has(&self, short: char) -> bool {
        self.flags.contains(&short)
    }

    pub fn value(&self, short: char) -> Option<&str> {
        self.values.get(&short).map(String::as_str)
    }

    /// A number option's value. Already validated by [`parse`].
    pub fn number(&self, short: char) -> Option<i64> {
        self.value(short).and_then(|v| v.parse().ok())
    }

    pub fn operands(&self) -> &[String] {
        &self.operands
    }
}

/// Parse `args` against `specs`.
///
/// Supports clustered short flags (`-la`), attached or detached values
/// (`-n5`, `-n 5`), `--long` and `--long=value`, and `--` to end options.
/// A lone `-` is an operand.
pub fn parse(command: &str, specs: &[OptionSpec], args: &[&str]) -> Result<ParsedArgs> {
    let mut parsed = ParsedArgs::default();
    let mut iter = args.iter().copied();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            parsed.operands.extend(iter.by_ref().map(str::to_string));
            break;
        }
        if let Some(long) = arg.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let spec = specs
                .iter()
                .find(|s| s.long == Some(name))
                .ok_or_else(|| {
                    ShellboxError::Command(format!("{command}: unrecognized option '--{name}'"))
                })?;
            if spec.kind.takes_value() {
                let value = match inline {
                    Some(v) => v.to_string(),
                    None => iter.next().map(str::to_string).ok_or_else(|| missing(command, spec))?,
                };
                store(command, spec, value, &mut parsed)?;
            } else if inline.is_some() {
                return Err(ShellboxError::Command(format!(
                    "{command}: option '--{name}' doesn't allow an argument"
                )));
            } else {
                parsed.flags.insert(spec.short);
            }
            continue;
        }
        let Some(cluster) = arg.strip_prefix('-').filter(|c| !c.is_empty()) else {
            parsed.operands.push(arg.to_string());
            continue;
        };
        for (i, ch) in cluster.char_indices() {
            let spec = specs.iter().find(|s| s.short == ch).ok_or_else(|| {
                ShellboxError::Command(format!("{command}: invalid option -- '{ch}'"))
            })?;
            if !spec.kind.takes_value() {
                parsed.flags.insert(ch);
                continue;
            }
            let rest = &cluster[i + ch.len_utf8()..];
            let value = if rest.is_empty() {
                iter.next().map(str::to_string).ok_or_else(|| missing(command, spec))?
            } else {
                rest.to_string()
            };
            store(command, spec, value, &mut parsed)?;
            break;
        }
    }
    Ok(parsed)
}

fn missing(command: &str, spec: &OptionSpec) -> ShellboxError {
    ShellboxError::Command(format!(
        "{command}: option requires an argument -- '{}'",
        spec.short
    ))
}

fn store(command: &str, spec: &OptionSpec, value: String, parsed: &mut ParsedArgs) -> Result<()> {
    match spec.kind {
        OptionKind::NumberInput { .. } if value.parse::<i64>().is_err() => {
            return Err(ShellboxError::Command(format!(
                "{command}: invalid number: '{value}'"
            )));
        },
        OptionKind::Enum { choices } if !choices.contains(&value.as_str()) => {
            return Err(ShellboxError::Command(format!(
                "{command}: invalid argument '{value}' for '{}'\nValid arguments are: {}",
                spec.display_name(),
                choices.join(", ")
            )));
        },
        _ => {},
    }
    parsed.flags.insert(spec.short);
    parsed.values.insert(spec.short, value);
    Ok(())
}

/// Render the option table shown by `help <command>`.
pub fn render_options(specs: &[OptionSpec]) -> String {
    let rows: Vec<(String, &str)> = specs
        .iter()
        .map(|s| {
            let mut left = format!("-{}", s.short);
            if let Some(long) = s.long {
                left.push_str(&format!(", --{long}"));
            }
            if s.kind.takes_value() {
                left.push_str(&format!(" <{}>", s.kind.placeholder()));
            }
            (left, s.description)
        })
        .collect();
    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|(left, desc)| format!("  {left:width$}  {desc}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &[OptionSpec] = &[
        OptionSpec::flag('l', "long", "long format"),
        OptionSpec::flag('a', "all", "show hidden"),
        OptionSpec::number('n', "lines", "NUM", "line count"),
        OptionSpec::choice('s', "sort", &["name", "size", "time"], "sort key"),
        OptionSpec::text('m', "message", "TEXT", "message"),
    ];

    #[test]
    fn clustered_flags() {
        let p = parse("ls", SPECS, &["-la", "dir"]).unwrap();
        assert!(p.has('l') && p.has('a'));
        assert_eq!(p.operands(), ["dir"]);
    }

    #[test]
    fn detached_and_attached_numbers() {
        assert_eq!(parse("head", SPECS, &["-n", "5"]).unwrap().number('n'), Some(5));
        assert_eq!(parse("head", SPECS, &["-n5"]).unwrap().number('n'), Some(5));
        assert_eq!(parse("head", SPECS, &["-ln3"]).unwrap().number('n'), Some(3));
    }

    #[test]
    fn long_options() {
        let p = parse("x", SPECS, &["--all", "--lines=7", "--sort", "size"]).unwrap();
        assert!(p.has('a'));
        assert_eq!(p.number('n'), Some(7));
        assert_eq!(p.value('s'), Some("size"));
    }

    #[test]
    fn free_text_keeps_spaces() {
        let p = parse("x", SPECS, &["-m", "hello world"]).unwrap();
        assert_eq!(p.value('m'), Some("hello world"));
    }

    #[test]
    fn double_dash_ends_options() {
        let p = parse("rm", SPECS, &["--", "-l", "x"]).unwrap();
        assert!(!p.has('l'));
        assert_eq!(p.operands(), ["-l", "x"]);
    }

    #[test]
    fn lone_dash_is_operand() {
        let p = parse("cat", SPECS, &["-"]).unwrap();
        assert_eq!(p.operands(), ["-"]);
    }

    #[test]
    fn options_after_operands() {
        let p = parse("ls", SPECS, &["dir", "-l"]).unwrap();
        assert!(p.has('l'));
        assert_eq!(p.operands(), ["dir"]);
    }

    #[test]
    fn unknown_short_flag() {
        let err = parse("ls", SPECS, &["-z"]).unwrap_err();
        assert_eq!(err.to_string(), "ls: invalid option -- 'z'");
    }

    #[test]
    fn unknown_long_flag() {
        let err = parse("ls", SPECS, &["--zzz"]).unwrap_err();
        assert_eq!(err.to_string(), "ls: unrecognized option '--zzz'");
    }

    #[test]
    fn missing_value() {
        let err = parse("head", SPECS, &["-n"]).unwrap_err();
        assert_eq!(err.to_string(), "head: option requires an argument -- 'n'");
    }

    #[test]
    fn bad_number() {
        let err = parse("head", SPECS, &["-n", "ten"]).unwrap_err();
        assert_eq!(err.to_string(), "head: invalid number: 'ten'");
    }

    #[test]
    fn bad_choice() {
        let err = parse("x", SPECS, &["--sort=color"]).unwrap_err();
        assert!(err.to_string().starts_with("x: invalid argument 'color' for '--sort'"));
    }

    #[test]
    fn boolean_rejects_inline_value() {
        assert!(parse("x", SPECS, &["--all=yes"]).is_err());
    }

    #[test]
    fn render_lists_every_option() {
        let text = render_options(SPECS);
        assert!(text.contains("-l, --long"));
        assert!(text.contains("-n, --lines <NUM>"));
        assert!(text.contains("<name|size|time>"));
        assert_eq!(text.lines().count(), SPECS.len());
    }
}
