//! Markdown link destination handling
//!
//! This module provides:
//! - The CommonMark destination grammar subset used for image targets
//! - A scanner that pulls raw image references out of markdown text

pub mod destination;
mod references;

pub use destination::parse_destination;
pub use references::{extract_image_references, ImageReference};
