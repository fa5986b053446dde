//! `ls`-style rendering of directory entries.
//!
//! Filtering, sorting, and layout are driven by [`ListingFlags`]; every flag
//! composes with every other. The formatter is handed `now` explicitly so
//! the recent/old date split does not depend on the wall clock.

use std::cmp::Ordering;

use chrono::{DateTime, TimeDelta, Utc};
use shellbox_vfs::node::{DIR_PERMISSIONS, DIR_SIZE};
use shellbox_vfs::{DirEntry, NodeKind};

use crate::options::{OptionSpec, ParsedArgs};

/// Option schema shared by `ls` and its aliases.
pub const LS_OPTIONS: &[OptionSpec] = &[
    OptionSpec::flag('a', "all", "do not ignore entries starting with ."),
    OptionSpec::flag('A', "almost-all", "like -a, but omit . and .."),
    OptionSpec::short('l', "use a long listing format"),
    OptionSpec::flag('h', "human-readable", "with -l, print sizes like 1.5K"),
    OptionSpec::short('1', "list one file per line"),
    OptionSpec::flag('r', "reverse", "reverse order while sorting"),
    OptionSpec::flag('F', "classify", "append / to directory names"),
    OptionSpec::short('t', "sort by modification time, newest first"),
    OptionSpec::short('S', "sort by file size, largest first"),
];

/// Age below which long listings show a time instead of a year.
pub const DEFAULT_RECENT_DAYS: i64 = 180;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Time,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingFlags {
    pub all: bool,
    pub almost_all: bool,
    pub long_format: bool,
    pub human_readable: bool,
    pub one_column: bool,
    pub reverse: bool,
    pub classify: bool,
    pub sort: SortKey,
}

impl ListingFlags {
    /// Read flags parsed against [`LS_OPTIONS`]. `-t` wins over `-S`.
    pub fn from_args(args: &ParsedArgs) -> Self {
        let sort = if args.has('t') {
            SortKey::Time
        } else if args.has('S') {
            SortKey::Size
        } else {
            SortKey::Name
        };
        Self {
            all: args.has('a'),
            almost_all: args.has('A'),
            long_format: args.has('l'),
            human_readable: args.has('h'),
            one_column: args.has('1'),
            reverse: args.has('r'),
            classify: args.has('F'),
            sort,
        }
    }

    fn shows_hidden(&self) -> bool {
        self.all || self.almost_all
    }
}

/// Renders a listing for one directory.
#[derive(Debug, Clone)]
pub struct ListingFormatter {
    width: usize,
    now: DateTime<Utc>,
    recent: TimeDelta,
    dot_entries: Option<(DirEntry, DirEntry)>,
}

impl ListingFormatter {
    pub fn new(width: usize, now: DateTime<Utc>) -> Self {
        Self {
            width,
            now,
            recent: TimeDelta::days(DEFAULT_RECENT_DAYS),
            dot_entries: None,
        }
    }

    /// Out-of-range day counts saturate to an unbounded window.
    pub fn with_recent_days(mut self, days: i64) -> Self {
        self.recent = TimeDelta::try_days(days).unwrap_or(TimeDelta::MAX);
        self
    }

    /// Metadata to show for `.` and `..` under `-a`. Without it both are
    /// synthesized as root-owned directories modified `now`.
    pub fn with_dot_entries(mut self, dot: DirEntry, dotdot: DirEntry) -> Self {
        self.dot_entries = Some((
            DirEntry {
                name: ".".to_string(),
                ..dot
            },
            DirEntry {
                name: "..".to_string(),
                ..dotdot
            },
        ));
        self
    }

    pub fn format(&self, entries: &[DirEntry], flags: &ListingFlags) -> String {
        let shown = self.arrange(entries, flags);
        if flags.long_format {
            self.long(&shown, flags)
        } else if flags.one_column {
            shown
                .iter()
                .map(|e| display_name(e, flags))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            self.columns(&shown, flags)
        }
    }

    /// Filter, sort, add `.`/`..`, then reverse.
    fn arrange(&self, entries: &[DirEntry], flags: &ListingFlags) -> Vec<DirEntry> {
        let mut shown: Vec<DirEntry> = entries
            .iter()
            .filter(|e| flags.shows_hidden() || !e.is_hidden())
            .cloned()
            .collect();
        shown.sort_by(|a, b| compare(a, b, flags.sort));
        if flags.all {
            let (dot, dotdot) = self
                .dot_entries
                .clone()
                .unwrap_or_else(|| (self.synthetic("."), self.synthetic("..")));
            shown.insert(0, dotdot);
            shown.insert(0, dot);
        }
        if flags.reverse {
            shown.reverse();
        }
        shown
    }

    fn synthetic(&self, name: &str) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            kind: NodeKind::Directory,
            size: DIR_SIZE,
            permissions: DIR_PERMISSIONS.to_string(),
            modified: self.now,
            owner: "root".to_string(),
            group: "root".to_string(),
        }
    }

    fn long(&self, shown: &[DirEntry], flags: &ListingFlags) -> String {
        let total: u64 = shown.iter().map(|e| e.size).sum();
        let owner_w = shown.iter().map(|e| e.owner.chars().count()).max().unwrap_or(0);
        let group_w = shown.iter().map(|e| e.group.chars().count()).max().unwrap_or(0);
        let mut lines = vec![format!("total {}", total.div_ceil(1024))];
        for e in shown {
            let size = if flags.human_readable {
                human_size(e.size)
            } else {
                e.size.to_string()
            };
            lines.push(format!(
                "{} {} {:owner_w$} {:group_w$} {size:>8} {} {}",
                e.permissions,
                if e.is_dir() { 2 } else { 1 },
                e.owner,
                e.group,
                self.date(e.modified),
                display_name(e, flags),
            ));
        }
        lines.join("\n")
    }

    fn date(&self, modified: DateTime<Utc>) -> String {
        let age = self.now.signed_duration_since(modified);
        if age >= TimeDelta::zero() && age < self.recent {
            modified.format("%b %e %H:%M").to_string()
        } else {
            modified.format("%b %e  %Y").to_string()
        }
    }

    fn columns(&self, shown: &[DirEntry], flags: &ListingFlags) -> String {
        let names: Vec<String> = shown.iter().map(|e| display_name(e, flags)).collect();
        let Some(widest) = names.iter().map(|n| n.chars().count()).max() else {
            return String::new();
        };
        let col_width = widest + 2;
        let cols = (self.width / col_width).max(1);
        names
            .chunks(cols)
            .map(|row| {
                row.iter()
                    .map(|n| format!("{n:col_width$}"))
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn display_name(entry: &DirEntry, flags: &ListingFlags) -> String {
    if flags.classify && entry.is_dir() {
        format!("{}/", entry.name)
    } else {
        entry.name.clone()
    }
}

fn compare(a: &DirEntry, b: &DirEntry, key: SortKey) -> Ordering {
    let by_name = || locale_cmp(&a.name, &b.name);
    match key {
        SortKey::Name => by_name(),
        SortKey::Size => b.size.cmp(&a.size).then_with(by_name),
        SortKey::Time => b.modified.cmp(&a.modified).then_with(by_name),
    }
}

/// Case-insensitive ordering with lowercase before uppercase on ties and
/// byte order as the final tiebreak.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    folded(a).cmp(&folded(b)).then_with(|| b.cmp(a))
}

/// Sizes below 1 KiB print as-is; larger ones get one decimal and a
/// K, M, or G suffix.
pub fn human_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;

    if size >= GB {
        format!("{:.1}G", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.1}M", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.1}K", size as f64 / KB as f64)
    } else {
        size.to_string()
    }
}
