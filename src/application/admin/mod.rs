//! Application services for the administrative surface.

pub mod pages;
pub mod site;
