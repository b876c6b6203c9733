//! Protected media core for FormVault.
//!
//! This crate contains the logic that keeps private tenant media private while
//! still rendering it, with ZERO web framework dependencies.
//!
//! # Modules
//!
//! - `storage` - Storage capability descriptor, container read tokens, URL resolution
//! - `enrichment` - Rewriting image URLs in rendered DOM and declarative trees
//! - `render` - Render model events and the view handler binder
//! - `files` - Upload routing/orchestration and batch deletion

pub mod enrichment;
pub mod files;
pub mod render;
pub mod storage;
