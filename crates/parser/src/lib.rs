//! Link list parser for postdesk.
//!
//! Turns a free-text block pasted by an operator into normalized
//! [`LinkRecord`]s: one record per line referencing a channel post, with
//! annotation notes, the photo-fetch marker, and photo positions extracted.
//! Duplicate references to the same `channel/post` pair are quarantined into
//! a separate, sorted list instead of being silently kept.

pub mod record;
pub mod settings;

mod parse;

pub use {
    parse::{ParseOutcome, parse},
    record::LinkRecord,
    settings::{NoteTranslation, ParserSettings},
};
