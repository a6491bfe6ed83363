//! Page slug helpers.
//!
//! Requested slugs are reduced to `[A-Za-z0-9-]`. When nothing survives the
//! title is slugified instead (`slug` crate, with Chinese transliterated by
//! `pinyin` so "基线对齐" becomes `ji-xian-dui-qi`). Uniqueness is checked by a
//! caller-supplied predicate so the logic stays independent of storage.

use std::future::Future;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

/// Slug used when neither the request nor the title yields one.
pub const FALLBACK_SLUG: &str = "page";

const MAX_SUFFIX_ATTEMPTS: usize = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors from [`generate_unique_slug_async`].
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Strip every character outside `[A-Za-z0-9-]`.
pub fn sanitize_slug(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
        .collect()
}

/// Derive a slug from human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(transliterate_to_ascii(input));
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Pick the base slug for a new page: the sanitized request, else the
/// slugified title, else [`FALLBACK_SLUG`].
pub fn base_slug(requested: &str, title: &str) -> String {
    let sanitized = sanitize_slug(requested);
    if !sanitized.is_empty() {
        return sanitized;
    }
    derive_slug(title).unwrap_or_else(|_| FALLBACK_SLUG.to_string())
}

/// Return `base` when it is free, otherwise the first free `base-N` for
/// `N = 1, 2, ...`.
///
/// `is_free` must resolve to `true` when no page uses the candidate yet.
pub async fn generate_unique_slug_async<F, Fut, E>(
    base: &str,
    mut is_free: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    if base.is_empty() {
        return Err(SlugError::EmptyInput.into());
    }

    if is_free(base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base.to_string());
    }

    for attempt in 1..=MAX_SUFFIX_ATTEMPTS {
        let candidate = format!("{base}-{attempt}");
        if is_free(&candidate).await.map_err(SlugAsyncError::Predicate)? {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted {
        base: base.to_string(),
    }
    .into())
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => push_syllable(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            // slugify decides what to do with the rest
            None => output.push(ch),
        }
    }

    output
}

fn push_syllable(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}
