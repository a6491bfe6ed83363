//! Domain layer types and invariants.

pub mod entities;
pub mod error;
pub mod media;
pub mod pages;
pub mod settings;
pub mod slug;
pub mod types;
