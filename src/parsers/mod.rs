//! Pure text and document helpers used by the extractors.
//!
//! Nothing in here knows about page types or the shared context: each
//! function takes a string (or a DOM snapshot) and returns a typed value,
//! or nothing when the input does not parse.

pub mod dates;
pub mod geo;
pub mod html;
pub mod price;
pub mod text;

pub use html::Snapshot;

#[cfg(test)]
mod tests;
