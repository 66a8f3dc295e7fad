//! Read-only projections of a user's goals for charts and exports.
//!
//! Rendering (chart drawing, PDF bytes) belongs to front ends; this module
//! only produces the data and a plain-text summary.

pub mod charts;
pub mod summary;
