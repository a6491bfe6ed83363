//! Object cache in front of the repositories.
//!
//! Reads go cache-aside: services ask the cache first and fill it from
//! storage on a miss. Writes never touch keys directly; they report a
//! [`Mutation`] and [`ObjectCache::apply`] drops what it affects.
//!
//! ```toml
//! [cache]
//! enabled = true
//! page_limit = 256
//! media_limit = 64
//! subpage_limit = 128
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::{CacheKey, Mutation};
pub use store::{Lookup, ObjectCache};
