//! Report row model and the tab-delimited serializer.

pub mod render;
pub mod row;

pub use {render::render, row::ReportRow};
