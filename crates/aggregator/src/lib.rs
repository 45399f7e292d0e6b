//! Post aggregation: link records in, report rows out.
//!
//! Fans out one task per record, resolves each against the content source
//! through the post cache, and joins all outcomes before returning. A
//! record's failure never aborts the batch.

mod resolve;

pub use resolve::{Aggregation, resolve};
