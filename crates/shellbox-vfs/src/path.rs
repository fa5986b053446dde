//! Path resolution.
//!
//! Every engine operation first maps its input to a canonical path: absolute,
//! with `.`/`..` folded and repeated or trailing slashes dropped. `..` at the
//! root stays at the root, as in a shell.

/// Resolve `input` against `cwd`, expanding `~` to `home`.
pub fn resolve(input: &str, cwd: &str, home: &str) -> String {
    let raw = if input.is_empty() || input == "~" {
        return canonicalize(home);
    } else if let Some(rest) = input.strip_prefix("~/") {
        format!("{home}/{rest}")
    } else if input.starts_with('/') {
        input.to_string()
    } else {
        format!("{cwd}/{input}")
    };
    canonicalize(&raw)
}

/// Fold `.`/`..` and empty segments of an absolute path.
fn canonicalize(raw: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in raw.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                stack.pop();
            },
            other => stack.push(other),
        }
    }
    if stack.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", stack.join("/"))
    }
}

/// Non-empty segments of a canonical path. The root has none.
pub fn segments(canonical: &str) -> impl Iterator<Item = &str> {
    canonical.split('/').filter(|s| !s.is_empty())
}

/// Split a canonical path into its parent directory and final name.
///
/// Returns `None` for the root, which has neither.
pub fn split_parent(canonical: &str) -> Option<(&str, &str)> {
    if canonical == "/" {
        return None;
    }
    match canonical.rfind('/') {
        Some(0) => Some(("/", &canonical[1..])),
        Some(i) => Some((&canonical[..i], &canonical[i + 1..])),
        None => None,
    }
}

/// Append `name` to a canonical directory path.
pub fn join(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Whether `path` equals `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}
