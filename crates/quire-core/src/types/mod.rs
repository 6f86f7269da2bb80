//! Core type definitions for Quire
//!
//! Shared types used across the sandbox, image and recents modules.

mod document_types;
mod image_types;

pub use document_types::*;
pub use image_types::*;
