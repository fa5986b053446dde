//! Node model: the tagged file/directory variant that forms the tree.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::path;

/// Default permission string for new files.
pub const FILE_PERMISSIONS: &str = "-rw-r--r--";
/// Default permission string for new directories.
pub const DIR_PERMISSIONS: &str = "drwxr-xr-x";
/// Informational size reported for every directory.
pub const DIR_SIZE: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// Metadata carried by every node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub size: u64,
    pub permissions: String,
    pub modified: DateTime<Utc>,
    pub owner: String,
    pub group: String,
}

/// A file or directory. Nodes do not know their own name; the parent's
/// children map holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    File {
        content: String,
        meta: NodeMeta,
    },
    Directory {
        children: BTreeMap<String, Node>,
        meta: NodeMeta,
    },
}

/// One record of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
    pub size: u64,
    pub permissions: String,
    pub modified: DateTime<Utc>,
    pub owner: String,
    pub group: String,
}

impl DirEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

impl Node {
    /// Create a file whose size is derived from `content`.
    pub fn new_file(content: impl Into<String>, owner: &str, group: &str, now: DateTime<Utc>) -> Self {
        let content = content.into();
        Self::File {
            meta: NodeMeta {
                size: content.len() as u64,
                permissions: FILE_PERMISSIONS.to_string(),
                modified: now,
                owner: owner.to_string(),
                group: group.to_string(),
            },
            content,
        }
    }

    /// Create an empty directory.
    pub fn new_dir(owner: &str, group: &str, now: DateTime<Utc>) -> Self {
        Self::Directory {
            children: BTreeMap::new(),
            meta: NodeMeta {
                size: DIR_SIZE,
                permissions: DIR_PERMISSIONS.to_string(),
                modified: now,
                owner: owner.to_string(),
                group: group.to_string(),
            },
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::File { .. } => NodeKind::File,
            Self::Directory { .. } => NodeKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }

    pub fn meta(&self) -> &NodeMeta {
        match self {
            Self::File { meta, .. } | Self::Directory { meta, .. } => meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut NodeMeta {
        match self {
            Self::File { meta, .. } | Self::Directory { meta, .. } => meta,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::File { content, .. } => Some(content),
            Self::Directory { .. } => None,
        }
    }

    pub fn children(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Self::Directory { children, .. } => Some(children),
            Self::File { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut BTreeMap<String, Node>> {
        match self {
            Self::Directory { children, .. } => Some(children),
            Self::File { .. } => None,
        }
    }

    /// Build the listing record for this node under `name`.
    pub fn entry(&self, name: &str) -> DirEntry {
        let meta = self.meta();
        DirEntry {
            name: name.to_string(),
            kind: self.kind(),
            size: meta.size,
            permissions: meta.permissions.clone(),
            modified: meta.modified,
            owner: meta.owner.clone(),
            group: meta.group.clone(),
        }
    }

    /// Walk from this node through each segment of a canonical path.
    ///
    /// A missing segment, or a file encountered before the last segment,
    /// yields `None`.
    pub fn lookup(&self, canonical: &str) -> Option<&Node> {
        let mut node = self;
        for segment in path::segments(canonical) {
            node = node.children()?.get(segment)?;
        }
        Some(node)
    }

    /// Mutable counterpart of [`Node::lookup`].
    pub fn lookup_mut(&mut self, canonical: &str) -> Option<&mut Node> {
        let mut node = self;
        for segment in path::segments(canonical) {
            node = node.children_mut()?.get_mut(segment)?;
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> Node {
        let now = Utc::now();
        let mut root = Node::new_dir("root", "root", now);
        let mut home = Node::new_dir("root", "root", now);
        home.children_mut()
            .unwrap()
            .insert("notes.txt".into(), Node::new_file("hello", "u", "u", now));
        root.children_mut().unwrap().insert("home".into(), home);
        root
    }

    #[test]
    fn file_size_tracks_content() {
        let f = Node::new_file("abcdef", "u", "g", Utc::now());
        assert_eq!(f.meta().size, 6);
        assert_eq!(f.meta().permissions, FILE_PERMISSIONS);
        assert_eq!(f.kind(), NodeKind::File);
    }

    #[test]
    fn dir_size_is_informational() {
        let d = Node::new_dir("u", "g", Utc::now());
        assert_eq!(d.meta().size, DIR_SIZE);
        assert!(d.children().unwrap().is_empty());
        assert!(d.content().is_none());
    }

    #[test]
    fn lookup_root_and_nested() {
        let root = sample_tree();
        assert!(root.lookup("/").unwrap().is_dir());
        assert_eq!(root.lookup("/home/notes.txt").unwrap().content(), Some("hello"));
    }

    #[test]
    fn lookup_miss_is_none() {
        let root = sample_tree();
        assert!(root.lookup("/home/absent").is_none());
        assert!(root.lookup("/nope/notes.txt").is_none());
    }

    #[test]
    fn lookup_through_file_is_none() {
        let root = sample_tree();
        assert!(root.lookup("/home/notes.txt/deeper").is_none());
    }

    #[test]
    fn entry_copies_metadata() {
        let root = sample_tree();
        let e = root.lookup("/home/notes.txt").unwrap().entry("notes.txt");
        assert_eq!(e.name, "notes.txt");
        assert_eq!(e.size, 5);
        assert_eq!(e.owner, "u");
        assert!(!e.is_dir());
        assert!(!e.is_hidden());
    }

    #[test]
    fn json_roundtrip_preserves_shape() {
        let root = sample_tree();
        let json = serde_json::to_string(&root).unwrap();
        assert!(json.contains("\"type\":\"directory\""));
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, root);
    }
}
