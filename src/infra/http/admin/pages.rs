//! Page listing and editing handlers.

use axum::{
    extract::{Form, Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::{
        admin::pages::{AdminPageError, Dashboard, EditForm, SavePageCommand},
        error::HttpError,
    },
    domain::{entities::{MediaSummary, PageRecord}, pages::PageTree},
    presentation::{
        admin::views::{
            AdminBanner, AdminDashboardTemplate, AdminDashboardView, AdminLayout,
            AdminOwnerOption, AdminPageEditTemplate, AdminPageEditorView, AdminPageRowView,
        },
        views::render_template_response,
    },
};

use super::{AdminState, admin_chrome, render_not_found};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct DashboardQuery {
    removed: Option<String>,
    updated: Option<String>,
    saved: Option<String>,
    published: Option<String>,
    unpublished: Option<String>,
}

impl DashboardQuery {
    fn banners(&self) -> Vec<AdminBanner> {
        let flags = [
            ("removed", &self.removed, "Page removed."),
            ("updated", &self.updated, "Site settings updated."),
            ("saved", &self.saved, "Page saved."),
            ("published", &self.published, "Page published."),
            ("unpublished", &self.unpublished, "Page moved back to drafts."),
        ];
        flags
            .into_iter()
            .filter(|(_, value, _)| value.as_deref().is_some_and(|value| !value.is_empty()))
            .map(|(kind, _, text)| AdminBanner {
                kind,
                text: text.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct KeyQuery {
    key: Option<String>,
}

/// Editor form. Checkboxes are absent when unchecked.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageForm {
    key: String,
    title: String,
    url: String,
    content: String,
    draft: Option<String>,
    front: Option<String>,
    owner: String,
}

impl PageForm {
    fn into_command(self) -> SavePageCommand {
        SavePageCommand {
            key: parse_key(&self.key),
            title: self.title,
            slug: self.url,
            content: self.content,
            draft: is_checked(self.draft.as_deref()),
            front: is_checked(self.front.as_deref()),
            owner: parse_key(&self.owner),
        }
    }
}

fn parse_key(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

fn is_checked(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.is_empty())
}

pub(super) async fn admin_dashboard(
    State(state): State<AdminState>,
    Query(query): Query<DashboardQuery>,
) -> Response {
    let chrome = match admin_chrome(&state).await {
        Ok(chrome) => chrome,
        Err(err) => return err.into_response(),
    };
    let dashboard = match state.pages.dashboard().await {
        Ok(dashboard) => dashboard,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let content = build_dashboard_view(dashboard, query.banners());
    let view = AdminLayout::new(chrome, content);
    render_template_response(AdminDashboardTemplate { view }, StatusCode::OK)
}

pub(super) async fn admin_page_new(State(state): State<AdminState>) -> Response {
    render_editor(&state, None).await
}

pub(super) async fn admin_page_edit(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
) -> Response {
    render_editor(&state, Some(&slug)).await
}

async fn render_editor(state: &AdminState, slug: Option<&str>) -> Response {
    let chrome = match admin_chrome(state).await {
        Ok(chrome) => chrome,
        Err(err) => return err.into_response(),
    };
    let form = match state.pages.edit_form(slug).await {
        Ok(form) => form,
        Err(err) => return HttpError::from(err).into_response(),
    };
    let files = match state.http.media.files().await {
        Ok(files) => files,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let content = build_editor_view(form, slug, &files);
    let view = AdminLayout::new(chrome, content);
    render_template_response(AdminPageEditTemplate { view }, StatusCode::OK)
}

pub(super) async fn admin_page_save(
    State(state): State<AdminState>,
    Form(form): Form<PageForm>,
) -> Response {
    match state.pages.save(form.into_command()).await {
        Ok(page) => Redirect::to(&format!("/admin?saved={}", page.id)).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

pub(super) async fn admin_page_publish(
    State(state): State<AdminState>,
    Query(query): Query<KeyQuery>,
    uri: Uri,
) -> Response {
    let key = query.key.unwrap_or_default();
    let result = state.pages.publish(&key).await;
    redirect_or_not_found(&state, &uri, result, "published").await
}

pub(super) async fn admin_page_unpublish(
    State(state): State<AdminState>,
    Query(query): Query<KeyQuery>,
    uri: Uri,
) -> Response {
    let key = query.key.unwrap_or_default();
    let result = state.pages.unpublish(&key).await;
    redirect_or_not_found(&state, &uri, result, "unpublished").await
}

pub(super) async fn admin_page_remove(
    State(state): State<AdminState>,
    Path(slug): Path<String>,
    uri: Uri,
) -> Response {
    match state.pages.remove(&slug).await {
        Ok(_) => Redirect::to("/admin?removed=true").into_response(),
        Err(AdminPageError::NotFound) => {
            render_not_found(&state.http, uri.path(), "unknown page").await
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn redirect_or_not_found(
    state: &AdminState,
    uri: &Uri,
    result: Result<PageRecord, AdminPageError>,
    banner: &str,
) -> Response {
    match result {
        Ok(page) => Redirect::to(&format!("/admin?{banner}={}", page.id)).into_response(),
        Err(AdminPageError::NotFound) => {
            render_not_found(&state.http, uri.path(), "unknown page key").await
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

fn build_dashboard_view(dashboard: Dashboard, banners: Vec<AdminBanner>) -> AdminDashboardView {
    let front = dashboard.front.as_deref();
    let pages = dashboard
        .pages
        .into_iter()
        .map(|PageTree { root, children }| {
            let mut row = page_row(&root, front);
            row.children = children.iter().map(|child| page_row(child, front)).collect();
            row
        })
        .collect();

    AdminDashboardView {
        banners,
        pages,
        new_page_href: "/admin/add".to_string(),
    }
}

fn page_row(page: &PageRecord, front: Option<&str>) -> AdminPageRowView {
    let (toggle_href, toggle_label) = if page.draft {
        (format!("/admin/publish?key={}", page.id), "Publish")
    } else {
        (format!("/admin/unpublish?key={}", page.id), "Unpublish")
    };

    AdminPageRowView {
        id: page.id.to_string(),
        title: page.title.clone(),
        slug: page.slug.clone(),
        draft: page.draft,
        is_front: front == Some(page.slug.as_str()),
        view_href: format!("/page/{}", page.slug),
        edit_href: format!("/admin/edit/{}", page.slug),
        toggle_href,
        toggle_label,
        remove_href: format!("/admin/remove/{}", page.slug),
        children: Vec::new(),
    }
}

fn build_editor_view(
    form: EditForm,
    requested_slug: Option<&str>,
    files: &[MediaSummary],
) -> AdminPageEditorView {
    let owners = form
        .owners
        .iter()
        .map(|owner| AdminOwnerOption {
            id: owner.id.to_string(),
            title: owner.title.clone(),
            selected: form.owner == Some(owner.id),
        })
        .collect();

    let (heading, form_action) = match form.page.as_ref() {
        Some(page) => (
            format!("Edit {}", page.title),
            format!("/admin/edit/{}", page.slug),
        ),
        None => ("New page".to_string(), "/admin/add".to_string()),
    };

    AdminPageEditorView {
        heading,
        form_action,
        key: form
            .page
            .as_ref()
            .map(|page| page.id.to_string())
            .unwrap_or_default(),
        title: form.page.as_ref().map(|page| page.title.clone()).unwrap_or_default(),
        slug: form
            .page
            .as_ref()
            .map(|page| page.slug.clone())
            .or_else(|| requested_slug.map(str::to_string))
            .unwrap_or_default(),
        slug_locked: form.page.is_some(),
        content: form.page.as_ref().map(|page| page.content.clone()).unwrap_or_default(),
        draft: form.draft,
        front: form.front,
        owners,
        files_json: files_json(files),
    }
}

/// Media picker entries, escaped for embedding inside `<script>`.
fn files_json(files: &[MediaSummary]) -> String {
    let entries: Vec<_> = files
        .iter()
        .map(|file| {
            json!({
                "key": file.id.to_string(),
                "name": file.name,
                "type": file.kind.as_str(),
                "width": file.width,
                "height": file.height,
                "description": file.description,
                "status": "OK",
            })
        })
        .collect();
    serde_json::Value::Array(entries)
        .to_string()
        .replace("</", "<\\/")
}
