//! Page ownership rules and listing predicates.
//!
//! Pages form a tree of depth one: a root page may own subpages, a subpage
//! never owns anything.

use uuid::Uuid;

use crate::domain::{entities::PageRecord, error::DomainError};

/// Check that `owner` may own the page identified by `page_id`.
///
/// `page_id` is `None` for pages that have not been stored yet.
pub fn validate_owner(page_id: Option<Uuid>, owner: &PageRecord) -> Result<(), DomainError> {
    if page_id == Some(owner.id) {
        return Err(DomainError::SelfOwnership);
    }
    if !owner.is_root() {
        return Err(DomainError::nested_owner(&owner.slug));
    }
    Ok(())
}

/// Whether a page belongs in the public navigation links.
///
/// Only published root pages are listed, and the current front page is left
/// out because it is already reachable at `/`.
pub fn is_public_link(page: &PageRecord, front: Option<&str>) -> bool {
    page.is_published() && page.is_root() && front != Some(page.slug.as_str())
}

/// A root page together with the pages it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTree {
    pub root: PageRecord,
    pub children: Vec<PageRecord>,
}

/// Group a flat page list into roots (title order) with their subpages
/// (newest first). Pages whose owner is absent from `pages` are promoted to
/// roots so nothing disappears from the admin listing.
pub fn group_tree(mut pages: Vec<PageRecord>) -> Vec<PageTree> {
    pages.sort_by(|a, b| a.title.cmp(&b.title).then(a.slug.cmp(&b.slug)));

    let known: std::collections::HashSet<Uuid> = pages.iter().map(|page| page.id).collect();
    let (children, roots): (Vec<_>, Vec<_>) = pages
        .into_iter()
        .partition(|page| page.owner_id.is_some_and(|owner| known.contains(&owner)));

    let mut trees: Vec<PageTree> = roots
        .into_iter()
        .map(|root| PageTree {
            root,
            children: Vec::new(),
        })
        .collect();

    for child in children {
        if let Some(tree) = trees
            .iter_mut()
            .find(|tree| Some(tree.root.id) == child.owner_id)
        {
            tree.children.push(child);
        }
    }

    for tree in &mut trees {
        tree.children
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }

    trees
}
