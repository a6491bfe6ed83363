mod pages;
mod site;
mod uploads;

pub use pages::*;
pub use site::*;
pub use uploads::*;

use crate::domain::entities::PageLink;

/// Site identity and public links shown around every admin screen.
#[derive(Clone)]
pub struct AdminChrome {
    pub site_title: String,
    pub description: String,
    pub links: Vec<PageLink>,
}

#[derive(Clone)]
pub struct AdminLayout<T> {
    pub chrome: AdminChrome,
    pub asset_version: String,
    pub content: T,
}

impl<T> AdminLayout<T> {
    pub fn new(chrome: AdminChrome, content: T) -> Self {
        Self {
            chrome,
            asset_version: asset_version(),
            content,
        }
    }
}

fn asset_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Notice shown at the top of the dashboard after a redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminBanner {
    pub kind: &'static str,
    pub text: String,
}
