//! The filesystem engine: the operations surface command handlers use.
//!
//! Lookups that fail are ordinary return values (`None`, `false`, an empty
//! listing). Only violated preconditions return an error, and every check
//! runs before the first write to the tree or the cache, so a failed call
//! leaves both exactly as they were.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use chrono::{DateTime, TimeDelta, Utc};
use shellbox_types::config::SandboxConfig;
use shellbox_types::error::{FsErrorKind, Result, ShellboxError};

use crate::cache::{Cache, CacheStats, CacheValue, TtlCache, dir_key, file_key};
use crate::clock::{Clock, SystemClock};
use crate::node::{DirEntry, Node};
use crate::path;

/// How `write_file` treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the content, creating the file if needed.
    Overwrite,
    /// Concatenate onto an existing file.
    Append,
}

/// Engine settings.
#[derive(Debug, Clone)]
pub struct FsOptions {
    pub home: String,
    pub user: String,
    pub group: String,
    pub listing_ttl: TimeDelta,
    pub content_ttl: TimeDelta,
}

impl Default for FsOptions {
    fn default() -> Self {
        Self::from(&SandboxConfig::default())
    }
}

impl From<&SandboxConfig> for FsOptions {
    fn from(config: &SandboxConfig) -> Self {
        Self {
            home: config.home_dir.clone(),
            user: config.user.clone(),
            group: config.group.clone(),
            listing_ttl: ttl_from_ms(config.listing_ttl_ms),
            content_ttl: ttl_from_ms(config.content_ttl_ms),
        }
    }
}

fn ttl_from_ms(ms: u64) -> TimeDelta {
    TimeDelta::try_milliseconds(i64::try_from(ms).unwrap_or(i64::MAX)).unwrap_or(TimeDelta::MAX)
}

/// Totals from a full traversal of the tree.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FsStatistics {
    pub total_files: u64,
    pub total_dirs: u64,
    pub total_size: u64,
}

/// The in-memory filesystem for one session.
pub struct FileSystem {
    root: Node,
    cwd: String,
    opts: FsOptions,
    clock: Rc<dyn Clock>,
    cache: RefCell<Box<dyn Cache>>,
}

impl FileSystem {
    /// Create a filesystem holding only `/`, with the working directory at
    /// the root.
    pub fn new(opts: FsOptions, clock: Rc<dyn Clock>, cache: Box<dyn Cache>) -> Self {
        let root = Node::new_dir("root", "root", clock.now());
        Self {
            root,
            cwd: "/".to_string(),
            opts,
            clock,
            cache: RefCell::new(cache),
        }
    }

    /// Create a filesystem with the system clock and a TTL cache.
    pub fn in_memory(opts: FsOptions) -> Self {
        let clock: Rc<dyn Clock> = Rc::new(SystemClock);
        let cache = Box::new(TtlCache::new(Rc::clone(&clock)));
        Self::new(opts, clock, cache)
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn home(&self) -> &str {
        &self.opts.home
    }

    pub fn options(&self) -> &FsOptions {
        &self.opts
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Canonical absolute form of `input` relative to the working directory.
    pub fn resolve(&self, input: &str) -> String {
        path::resolve(input, &self.cwd, &self.opts.home)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    // -- navigation --

    /// Change the working directory. Fails without side effects unless the
    /// target is an existing directory.
    pub fn change_directory(&mut self, input: &str) -> bool {
        let target = self.resolve(input);
        match self.root.lookup(&target) {
            Some(node) if node.is_dir() => {
                log::debug!("cd {} -> {target}", self.cwd);
                self.cwd = target;
                true
            },
            _ => false,
        }
    }

    // -- reads --

    /// List a directory (the working directory when `input` is `None`).
    ///
    /// An unresolvable path, or one naming a file, yields an empty list.
    pub fn directory_contents(&self, input: Option<&str>) -> Vec<DirEntry> {
        let dir = match input {
            Some(p) => self.resolve(p),
            None => self.cwd.clone(),
        };
        let key = dir_key(&dir);
        let cached = self.cache.borrow_mut().get(&key);
        if let Some(CacheValue::Listing(entries)) = cached {
            return entries;
        }
        let Some(children) = self.root.lookup(&dir).and_then(Node::children) else {
            return Vec::new();
        };
        let entries: Vec<DirEntry> = children
            .iter()
            .map(|(name, child)| child.entry(name))
            .collect();
        self.cache.borrow_mut().set(
            &key,
            CacheValue::Listing(entries.clone()),
            self.opts.listing_ttl,
        );
        entries
    }

    /// Content of the file at `input`, or `None` if it is not a file.
    pub fn file_content(&self, input: &str) -> Option<String> {
        let target = self.resolve(input);
        let (parent, name) = path::split_parent(&target)?;
        let key = file_key(parent, name);
        let cached = self.cache.borrow_mut().get(&key);
        if let Some(CacheValue::Content(content)) = cached {
            return Some(content);
        }
        let content = self.root.lookup(&target)?.content()?.to_string();
        self.cache.borrow_mut().set(
            &key,
            CacheValue::Content(content.clone()),
            self.opts.content_ttl,
        );
        Some(content)
    }

    /// Metadata for the node at `input`. The root is named `/`.
    pub fn stat(&self, input: &str) -> Option<DirEntry> {
        let target = self.resolve(input);
        let node = self.root.lookup(&target)?;
        let name = path::split_parent(&target).map_or("/", |(_, name)| name);
        Some(node.entry(name))
    }

    pub fn exists(&self, input: &str) -> bool {
        self.root.lookup(&self.resolve(input)).is_some()
    }

    pub fn is_directory(&self, input: &str) -> bool {
        self.root
            .lookup(&self.resolve(input))
            .is_some_and(Node::is_dir)
    }

    pub fn is_file(&self, input: &str) -> bool {
        self.root
            .lookup(&self.resolve(input))
            .is_some_and(|n| !n.is_dir())
    }

    /// Count files and directories and sum file sizes over the whole tree.
    pub fn statistics(&self) -> FsStatistics {
        let mut stats = FsStatistics::default();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                Node::File { meta, .. } => {
                    stats.total_files += 1;
                    stats.total_size += meta.size;
                },
                Node::Directory { children, .. } => {
                    stats.total_dirs += 1;
                    stack.extend(children.values());
                },
            }
        }
        stats
    }

    /// Sum of file sizes beneath `input`, or `None` if it does not resolve.
    pub fn disk_usage(&self, input: &str) -> Option<u64> {
        let node = self.root.lookup(&self.resolve(input))?;
        let mut total = 0;
        let mut stack = vec![node];
        while let Some(node) = stack.pop() {
            match node {
                Node::File { meta, .. } => total += meta.size,
                Node::Directory { children, .. } => stack.extend(children.values()),
            }
        }
        Some(total)
    }

    /// The tree beneath `input`, for renderers such as `tree`.
    pub fn node(&self, input: &str) -> Option<&Node> {
        self.root.lookup(&self.resolve(input))
    }

    // -- writes --

    /// Write `content` to the file at `input`.
    ///
    /// The parent directory must exist. Overwrite creates a missing file;
    /// append requires the file to exist already.
    pub fn write_file(&mut self, input: &str, content: &str, mode: WriteMode) -> Result<()> {
        let target = self.resolve(input);
        let Some((parent, name)) = path::split_parent(&target) else {
            return Err(ShellboxError::fs(FsErrorKind::IsADirectory, input));
        };
        let now = self.clock.now();
        let children = dir_children_mut(&mut self.root, parent, input)?;
        match children.get_mut(name) {
            Some(Node::Directory { .. }) => {
                return Err(ShellboxError::fs(FsErrorKind::IsADirectory, input));
            },
            Some(Node::File {
                content: existing,
                meta,
            }) => {
                match mode {
                    WriteMode::Overwrite => *existing = content.to_string(),
                    WriteMode::Append => existing.push_str(content),
                }
                meta.size = existing.len() as u64;
                meta.modified = now;
            },
            None => match mode {
                WriteMode::Overwrite => {
                    children.insert(
                        name.to_string(),
                        Node::new_file(content, &self.opts.user, &self.opts.group, now),
                    );
                },
                WriteMode::Append => {
                    return Err(ShellboxError::fs(FsErrorKind::FileNotFound, input));
                },
            },
        }
        log::debug!("write {target} ({mode:?}, {} bytes)", content.len());
        self.invalidate_file(parent, name);
        Ok(())
    }

    /// Create an empty file, or refresh the timestamp of an existing node.
    pub fn touch(&mut self, input: &str) -> Result<()> {
        let target = self.resolve(input);
        let now = self.clock.now();
        match self.root.lookup_mut(&target) {
            Some(node) => {
                node.meta_mut().modified = now;
                if let Some((parent, name)) = path::split_parent(&target) {
                    self.invalidate_file(parent, name);
                }
                Ok(())
            },
            None => self.write_file(input, "", WriteMode::Overwrite),
        }
    }

    /// Remove the entry at `input` from its parent. Returns whether anything
    /// was removed.
    pub fn delete_file(&mut self, input: &str) -> bool {
        let target = self.resolve(input);
        let Some((parent, name)) = path::split_parent(&target) else {
            return false;
        };
        let removed = self
            .root
            .lookup_mut(parent)
            .and_then(Node::children_mut)
            .and_then(|children| children.remove(name));
        match removed {
            Some(node) => {
                log::debug!("delete {target}");
                if node.is_dir() {
                    self.clear_cache();
                } else {
                    self.invalidate_file(parent, name);
                }
                true
            },
            None => false,
        }
    }

    /// Create a directory, reporting the reason on failure.
    pub fn try_create_directory(&mut self, input: &str) -> Result<()> {
        let target = self.resolve(input);
        let Some((parent, name)) = path::split_parent(&target) else {
            return Err(ShellboxError::fs(FsErrorKind::AlreadyExists, input));
        };
        let now = self.clock.now();
        let children = dir_children_mut(&mut self.root, parent, input)?;
        if children.contains_key(name) {
            return Err(ShellboxError::fs(FsErrorKind::AlreadyExists, input));
        }
        children.insert(
            name.to_string(),
            Node::new_dir(&self.opts.user, &self.opts.group, now),
        );
        log::debug!("mkdir {target}");
        self.cache.borrow_mut().invalidate(&dir_key(parent));
        Ok(())
    }

    /// Create a directory. Returns `false`, without mutating anything, when
    /// the parent is missing or not a directory, or the name is taken.
    pub fn create_directory(&mut self, input: &str) -> bool {
        match self.try_create_directory(input) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("mkdir {input} rejected: {e}");
                false
            },
        }
    }

    /// Create a directory and any missing ancestors (`mkdir -p`). Existing
    /// directories along the way are fine; an existing file is not.
    pub fn create_directory_all(&mut self, input: &str) -> Result<()> {
        let target = self.resolve(input);
        let mut prefixes = Vec::new();
        let mut current = String::from("/");
        for segment in path::segments(&target) {
            current = path::join(&current, segment);
            prefixes.push(current.clone());
        }
        let first_missing = prefixes
            .iter()
            .position(|p| self.root.lookup(p).is_none())
            .unwrap_or(prefixes.len());
        if let Some(blocker) = prefixes[..first_missing]
            .iter()
            .find(|p| self.root.lookup(p).is_some_and(|n| !n.is_dir()))
        {
            return Err(ShellboxError::fs(FsErrorKind::NotADirectory, blocker.clone()));
        }
        for prefix in &prefixes[first_missing..] {
            self.try_create_directory(prefix)?;
        }
        Ok(())
    }

    /// Remove a directory. Without `recursive`, it must be empty.
    pub fn remove_directory(&mut self, input: &str, recursive: bool) -> Result<()> {
        let target = self.resolve(input);
        let Some((parent, name)) = path::split_parent(&target) else {
            return Err(ShellboxError::fs(FsErrorKind::RootDirectory, input));
        };
        match self.root.lookup(&target) {
            None => return Err(ShellboxError::fs(FsErrorKind::FileNotFound, input)),
            Some(Node::File { .. }) => {
                return Err(ShellboxError::fs(FsErrorKind::NotADirectory, input));
            },
            Some(Node::Directory { children, .. }) => {
                if !recursive && !children.is_empty() {
                    return Err(ShellboxError::fs(FsErrorKind::DirectoryNotEmpty, input));
                }
            },
        }
        dir_children_mut(&mut self.root, parent, input)?.remove(name);
        log::debug!("rmdir {target} (recursive: {recursive})");
        self.clear_cache();
        Ok(())
    }

    /// Move or rename `src` to `dst`. When `dst` is an existing directory the
    /// node keeps its name inside it.
    pub fn move_entry(&mut self, src: &str, dst: &str) -> Result<()> {
        let (source, dest) = self.transfer_paths(src, dst)?;
        if source == dest {
            return Ok(());
        }
        let (src_parent, src_name) = path::split_parent(&source)
            .ok_or_else(|| ShellboxError::fs(FsErrorKind::RootDirectory, src))?;
        let (dst_parent, dst_name) = path::split_parent(&dest)
            .ok_or_else(|| ShellboxError::fs(FsErrorKind::InvalidMove, dst))?;

        let Some(node) = dir_children_mut(&mut self.root, src_parent, src)?.remove(src_name)
        else {
            return Err(ShellboxError::fs(FsErrorKind::FileNotFound, src));
        };
        let is_dir = node.is_dir();
        match dir_children_mut(&mut self.root, dst_parent, dst) {
            Ok(children) => {
                children.insert(dst_name.to_string(), node);
            },
            Err(e) => {
                // Put the source back so a failed move mutates nothing.
                if let Ok(children) = dir_children_mut(&mut self.root, src_parent, src) {
                    children.insert(src_name.to_string(), node);
                }
                return Err(e);
            },
        }
        log::debug!("mv {source} -> {dest}");
        if is_dir {
            self.clear_cache();
        } else {
            self.invalidate_file(src_parent, src_name);
            self.invalidate_file(dst_parent, dst_name);
        }
        Ok(())
    }

    /// Copy `src` to `dst`. Directories need `recursive`.
    pub fn copy_entry(&mut self, src: &str, dst: &str, recursive: bool) -> Result<()> {
        let (source, dest) = self.transfer_paths(src, dst)?;
        if source == dest {
            return Err(ShellboxError::fs(FsErrorKind::InvalidMove, dst));
        }
        let (dst_parent, dst_name) = path::split_parent(&dest)
            .ok_or_else(|| ShellboxError::fs(FsErrorKind::InvalidMove, dst))?;
        let mut copy = self
            .root
            .lookup(&source)
            .cloned()
            .ok_or_else(|| ShellboxError::fs(FsErrorKind::FileNotFound, src))?;
        if copy.is_dir() && !recursive {
            return Err(ShellboxError::fs(FsErrorKind::IsADirectory, src));
        }
        let now = self.clock.now();
        let meta = copy.meta_mut();
        meta.modified = now;
        meta.owner.clone_from(&self.opts.user);
        meta.group.clone_from(&self.opts.group);
        dir_children_mut(&mut self.root, dst_parent, dst)?.insert(dst_name.to_string(), copy);
        log::debug!("cp {source} -> {dest}");
        self.invalidate_file(dst_parent, dst_name);
        Ok(())
    }

    /// Validate a move/copy and compute the final destination path.
    fn transfer_paths(&self, src: &str, dst: &str) -> Result<(String, String)> {
        let source = self.resolve(src);
        if source == "/" {
            return Err(ShellboxError::fs(FsErrorKind::RootDirectory, src));
        }
        let Some(node) = self.root.lookup(&source) else {
            return Err(ShellboxError::fs(FsErrorKind::FileNotFound, src));
        };
        let mut dest = self.resolve(dst);
        if self.root.lookup(&dest).is_some_and(Node::is_dir) {
            if let Some((_, name)) = path::split_parent(&source) {
                dest = path::join(&dest, name);
            }
        }
        if dest == source {
            return Ok((source, dest));
        }
        if node.is_dir() && path::is_within(&dest, &source) {
            return Err(ShellboxError::fs(FsErrorKind::InvalidMove, dst));
        }
        let Some((dst_parent, _)) = path::split_parent(&dest) else {
            return Err(ShellboxError::fs(FsErrorKind::InvalidMove, dst));
        };
        match self.root.lookup(dst_parent) {
            None => return Err(ShellboxError::fs(FsErrorKind::DirectoryNotFound, dst)),
            Some(n) if !n.is_dir() => {
                return Err(ShellboxError::fs(FsErrorKind::NotADirectory, dst));
            },
            Some(_) => {},
        }
        match self.root.lookup(&dest) {
            Some(existing) if existing.is_dir() => {
                Err(ShellboxError::fs(FsErrorKind::AlreadyExists, dst))
            },
            Some(_) if node.is_dir() => Err(ShellboxError::fs(FsErrorKind::NotADirectory, dst)),
            _ => Ok((source, dest)),
        }
    }

    /// Change the owner (and optionally group) recorded on a node.
    pub fn chown(&mut self, input: &str, owner: &str, group: Option<&str>) -> Result<()> {
        let target = self.resolve(input);
        let node = self
            .root
            .lookup_mut(&target)
            .ok_or_else(|| ShellboxError::fs(FsErrorKind::FileNotFound, input))?;
        let meta = node.meta_mut();
        meta.owner = owner.to_string();
        if let Some(group) = group {
            meta.group = group.to_string();
        }
        if let Some((parent, name)) = path::split_parent(&target) {
            self.invalidate_file(parent, name);
        }
        Ok(())
    }

    // -- persistence --

    /// Serialize the whole tree to JSON.
    pub fn snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    /// Replace the tree with one produced by [`FileSystem::snapshot`].
    ///
    /// If the working directory no longer exists it moves to home, or to the
    /// root when home is gone too.
    pub fn restore(&mut self, json: &str) -> Result<()> {
        let root: Node = serde_json::from_str(json)?;
        if !root.is_dir() {
            return Err(ShellboxError::fs(FsErrorKind::NotADirectory, "/"));
        }
        self.root = root;
        self.clear_cache();
        if !self.root.lookup(&self.cwd).is_some_and(Node::is_dir) {
            let home = self.opts.home.clone();
            if !self.change_directory(&home) {
                self.cwd = "/".to_string();
            }
        }
        log::info!("restored filesystem snapshot ({} bytes)", json.len());
        Ok(())
    }

    fn invalidate_file(&self, parent: &str, name: &str) {
        let mut cache = self.cache.borrow_mut();
        cache.invalidate(&file_key(parent, name));
        cache.invalidate(&dir_key(parent));
    }
}

/// The children map of the directory at canonical `dir`. `shown` is the
/// user-facing path reported on failure.
fn dir_children_mut<'a>(
    root: &'a mut Node,
    dir: &str,
    shown: &str,
) -> Result<&'a mut BTreeMap<String, Node>> {
    match root.lookup_mut(dir) {
        Some(node) => node
            .children_mut()
            .ok_or_else(|| ShellboxError::fs(FsErrorKind::NotADirectory, shown)),
        None => Err(ShellboxError::fs(FsErrorKind::DirectoryNotFound, shown)),
    }
}
