//! Small text utilities shared across the tgbridge crates.

pub mod text;

pub use text::shorten_text;
