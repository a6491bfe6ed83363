//! Quill: a small content management server.
//!
//! Pages with one level of subpages, a media library with resized images,
//! an RSS feed of published pages and an admin surface on its own listener.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
