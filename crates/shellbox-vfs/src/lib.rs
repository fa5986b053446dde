//! Virtual filesystem engine for SHELLBOX.
//!
//! The tree is an owned hierarchy: every directory owns its children in a
//! name-keyed map, so there are no back-pointers and no cycles. Paths are
//! resolved to canonical absolute strings before any lookup, and read-heavy
//! operations go through an injected [`Cache`] that every mutation
//! invalidates before returning.

pub mod cache;
pub mod clock;
mod engine;
pub mod node;
pub mod path;
mod seed;

pub use cache::{Cache, CacheStats, CacheValue, NoCache, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{FileSystem, FsOptions, FsStatistics, WriteMode};
pub use node::{DirEntry, Node, NodeKind, NodeMeta};
pub use seed::populate_demo_tree;
