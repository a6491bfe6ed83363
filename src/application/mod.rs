//! Application services layer.

pub mod admin;
pub mod error;
pub mod feed;
pub mod media;
pub mod pages;
pub mod render;
pub mod repos;
pub mod site;
