use askama::Template;

use super::AdminLayout;

#[derive(Clone)]
pub struct AdminSiteView {
    pub title: String,
    pub description: String,
    pub template_text: String,
    pub use_own_template: bool,
}

#[derive(Template)]
#[template(path = "admin/site.html")]
pub struct AdminSiteTemplate {
    pub view: AdminLayout<AdminSiteView>,
}
