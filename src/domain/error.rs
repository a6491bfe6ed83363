use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("a page cannot own itself")]
    SelfOwnership,
    #[error("page `{slug}` is a subpage and cannot own other pages")]
    NestedOwner { slug: String },
    #[error("page `{slug}` owns subpages and cannot become a subpage")]
    OwnsSubpages { slug: String },
    #[error("media invariant violated: {message}")]
    MediaInvariant { message: String },
}

impl DomainError {
    pub fn nested_owner(slug: impl Into<String>) -> Self {
        Self::NestedOwner { slug: slug.into() }
    }

    pub fn owns_subpages(slug: impl Into<String>) -> Self {
        Self::OwnsSubpages { slug: slug.into() }
    }

    pub fn media_invariant(message: impl Into<String>) -> Self {
        Self::MediaInvariant {
            message: message.into(),
        }
    }
}
