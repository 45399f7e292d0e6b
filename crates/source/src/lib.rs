//! Content-source and cache capabilities consumed by the aggregation
//! pipeline.
//!
//! The [`ContentSource`] trait is the seam to the remote channel platform;
//! [`EmbedSource`] implements it over the public t.me embed pages.
//! [`PostCache`] keeps resolved report rows across runs so repeated exports
//! do not re-fetch unchanged posts.

pub mod cache;
pub mod embed;
pub mod error;
pub mod message;

pub use {
    cache::{FsPostCache, MemoryPostCache, PostCache},
    embed::EmbedSource,
    error::{Error, Result},
    message::{ContentSource, Forward, LinkPreview, PhotoRef, PostSet, SourceMessage},
};
