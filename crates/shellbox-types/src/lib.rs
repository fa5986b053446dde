//! Foundation types for SHELLBOX.
//!
//! This crate contains the types shared by every SHELLBOX crate: the error
//! type with its stable filesystem error kinds, and the sandbox configuration.

pub mod config;
pub mod error;
