use askama::Template;

/// Fragment returned to the editor after an upload attempt.
#[derive(Template)]
#[template(path = "admin/upload_response.html")]
pub struct AdminUploadResponseTemplate {
    pub status: String,
    pub kind: String,
    pub key: String,
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub description: String,
    pub image_href: String,
    pub thumb_href: String,
    pub download_href: String,
}
