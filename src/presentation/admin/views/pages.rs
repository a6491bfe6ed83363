use askama::Template;

use super::{AdminBanner, AdminLayout};

#[derive(Clone)]
pub struct AdminPageRowView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub draft: bool,
    pub is_front: bool,
    pub view_href: String,
    pub edit_href: String,
    pub toggle_href: String,
    pub toggle_label: &'static str,
    pub remove_href: String,
    pub children: Vec<AdminPageRowView>,
}

#[derive(Clone)]
pub struct AdminDashboardView {
    pub banners: Vec<AdminBanner>,
    pub pages: Vec<AdminPageRowView>,
    pub new_page_href: String,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub view: AdminLayout<AdminDashboardView>,
}

#[derive(Clone)]
pub struct AdminOwnerOption {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

#[derive(Clone)]
pub struct AdminPageEditorView {
    pub heading: String,
    pub form_action: String,
    /// Empty for pages that have not been saved yet.
    pub key: String,
    pub title: String,
    pub slug: String,
    pub slug_locked: bool,
    pub content: String,
    pub draft: bool,
    pub front: bool,
    pub owners: Vec<AdminOwnerOption>,
    /// Media picker entries as JSON, safe to embed in a script element.
    pub files_json: String,
}

#[derive(Template)]
#[template(path = "admin/edit.html")]
pub struct AdminPageEditTemplate {
    pub view: AdminLayout<AdminPageEditorView>,
}
