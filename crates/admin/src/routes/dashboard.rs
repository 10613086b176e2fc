//! Dashboard route handlers.
//!
//! Every handler runs behind [`RequireAdmin`]: store round trips go through
//! the request's session guard, and a sign-out observed mid-request ends the
//! view with a redirect to the login page.
//!
//! The list is read when the dashboard is viewed, when the tab changes and
//! after a successful save. Searching and editing work on the rows already
//! held in the session.

use aitoonic_core::types::seo::{SEO_DESCRIPTION_MAX, SEO_TITLE_MAX, truncate_chars};
use aitoonic_core::{Category, Draft, Entity, EntityKind, PricingType};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::dashboard::{
    Dashboard, ListPanel, Notice, Notices, SessionGuard, push_flash, take_flash,
};
use crate::error::{AppError, clear_sentry_user};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::middleware::auth::LOGIN_REQUIRED;
use crate::middleware::clear_current_admin;
use crate::state::AppState;

/// Characters of description shown in a list row.
const PREVIEW_CHARS: usize = 100;

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone)]
pub struct TabView {
    pub href: String,
    pub caption: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct RowView {
    pub href: String,
    pub name: String,
    pub preview: String,
    pub selected: bool,
}

impl RowView {
    fn new(entity: &Entity, selected_id: Option<&str>) -> Self {
        let description = entity.description();
        let preview = if description.chars().count() > PREVIEW_CHARS {
            format!("{}...", truncate_chars(description, PREVIEW_CHARS))
        } else {
            description.to_string()
        };

        Self {
            href: format!("/items/{}", entity.id()),
            name: entity.name().to_string(),
            preview,
            selected: selected_id == Some(entity.id()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct FeatureView {
    pub index: usize,
    pub value: String,
}

/// Editor form contents. `kind` picks the field set rendered.
#[derive(Debug, Clone, Default)]
pub struct EditorView {
    pub kind: &'static str,
    pub heading: String,
    pub name: String,
    pub description: String,
    pub seo_title: String,
    pub seo_title_len: usize,
    pub seo_description: String,
    pub seo_description_len: usize,
    pub url: String,
    pub category_options: Vec<OptionView>,
    pub how_to_use: String,
    pub image_url: String,
    pub image_alt: String,
    pub pricing_options: Vec<OptionView>,
    pub is_featured: bool,
    pub is_verified: bool,
    pub features: Vec<FeatureView>,
}

impl EditorView {
    fn new(draft: &Draft, categories: &[Category]) -> Self {
        let kind = draft.kind();
        let common = draft.common();
        let verb = if draft.is_new() { "New" } else { "Edit" };

        let mut view = Self {
            kind: kind.label(),
            heading: format!("{verb} {}", kind.title()),
            name: common.name.clone(),
            description: common.description.clone(),
            seo_title: common.seo_title().to_string(),
            seo_title_len: common.seo_title().chars().count(),
            seo_description: common.seo_description().to_string(),
            seo_description_len: common.seo_description().chars().count(),
            ..Self::default()
        };

        match draft {
            Draft::Category(_) => {}
            Draft::Tool(tool) => {
                view.url.clone_from(&tool.url);
                view.how_to_use.clone_from(&tool.how_to_use);
                view.image_url.clone_from(&tool.image_url);
                view.image_alt.clone_from(&tool.image_alt);
                let selected = tool.category_id.as_ref().map(|id| id.as_str());
                view.category_options = categories
                    .iter()
                    .map(|c| OptionView {
                        value: c.id.to_string(),
                        label: c.name.clone(),
                        selected: selected == Some(c.id.as_str()),
                    })
                    .collect();
            }
            Draft::Agent(agent) => {
                view.image_url.clone_from(&agent.image_url);
                view.image_alt.clone_from(&agent.image_alt);
                view.is_featured = agent.is_featured;
                view.is_verified = agent.is_verified;
                view.pricing_options = PricingType::ALL
                    .iter()
                    .map(|p| OptionView {
                        value: p.as_str().to_string(),
                        label: p.caption().to_string(),
                        selected: *p == agent.pricing_type,
                    })
                    .collect();
                view.features = agent
                    .agent_features
                    .iter()
                    .enumerate()
                    .map(|(index, value)| FeatureView {
                        index,
                        value: value.clone(),
                    })
                    .collect();
            }
        }

        view
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub email: String,
    pub tabs: Vec<TabView>,
    pub caption: &'static str,
    pub label: &'static str,
    pub search: String,
    pub rows: Vec<RowView>,
    pub total: usize,
    pub editor: Option<EditorView>,
    pub notices: Vec<Notice>,
    pub seo_title_max: usize,
    pub seo_description_max: usize,
}

impl DashboardTemplate {
    fn new(email: &str, dashboard: &Dashboard, notices: Notices) -> Self {
        let active = dashboard.list.active();
        let selected_id = dashboard.editor.draft().and_then(Draft::id);

        Self {
            email: email.to_string(),
            tabs: EntityKind::ALL
                .iter()
                .map(|kind| TabView {
                    href: format!("/?tab={}", kind.tab()),
                    caption: kind.caption(),
                    active: *kind == active,
                })
                .collect(),
            caption: active.caption(),
            label: active.title(),
            search: dashboard.list.search().to_string(),
            rows: dashboard
                .list
                .filtered()
                .into_iter()
                .map(|entity| RowView::new(entity, selected_id))
                .collect(),
            total: dashboard.list.items().len(),
            editor: dashboard
                .editor
                .draft()
                .map(|draft| EditorView::new(draft, dashboard.list.categories())),
            notices: notices.into_vec(),
            seo_title_max: SEO_TITLE_MAX,
            seo_description_max: SEO_DESCRIPTION_MAX,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub tab: Option<String>,
    pub q: Option<String>,
}

/// Entity list with the editor alongside.
#[instrument(skip(state, admin))]
pub async fn index(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    let RequireAdmin {
        admin,
        mut guard,
        session,
    } = admin;
    let mut dashboard = Dashboard::load(&session).await?;
    let mut notices = take_flash(&session).await?;

    // A search on its own filters the rows already loaded.
    let mut reload = query.q.is_none();
    if let Some(tab) = query.tab {
        let kind = tab.parse::<EntityKind>().map_err(AppError::BadRequest)?;
        reload |= dashboard.switch_tab(kind);
    }
    if let Some(q) = query.q {
        dashboard.list.set_search(q);
    }

    if reload && !refresh(&state, &mut guard, &session, &mut dashboard, &mut notices).await? {
        return signed_out(&session).await;
    }

    dashboard.store(&session).await?;
    Ok(DashboardTemplate::new(&admin.email, &dashboard, notices).into_response())
}

/// Open a blank draft of the active kind.
#[instrument(skip_all)]
pub async fn new_item(admin: RequireAdmin) -> Result<Response, AppError> {
    let session = admin.session;
    let mut dashboard = Dashboard::load(&session).await?;
    dashboard.open_new();
    dashboard.store(&session).await?;
    Ok(Redirect::to("/").into_response())
}

/// Open a listed entry in the editor.
#[instrument(skip(admin))]
pub async fn select_item(admin: RequireAdmin, Path(id): Path<String>) -> Result<Response, AppError> {
    let session = admin.session;
    let mut dashboard = Dashboard::load(&session).await?;

    if dashboard.select(&id) {
        dashboard.store(&session).await?;
    } else {
        push_flash(&session, Notices::error("Item not found")).await?;
    }
    Ok(Redirect::to("/").into_response())
}

/// Apply an editor form post.
#[instrument(skip(state, admin, form), fields(action = tracing::field::Empty))]
pub async fn editor(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let RequireAdmin {
        admin,
        mut guard,
        session,
    } = admin;
    let action = form
        .iter()
        .find(|(key, _)| key == "action")
        .map(|(_, value)| value.clone())
        .unwrap_or_default();
    tracing::Span::current().record("action", action.as_str());

    let mut dashboard = Dashboard::load(&session).await?;
    let mut notices = take_flash(&session).await?;
    dashboard.editor.apply_form(&form);

    let saved = match action.as_str() {
        "save" => {
            let token = guard.token().clone();
            let Ok(saved) = guard
                .watch(dashboard.editor.save(state.store(), &token, &mut notices))
                .await
            else {
                return signed_out(&session).await;
            };
            saved
        }
        "add_feature" => {
            dashboard.editor.add_feature();
            false
        }
        "update" => false,
        other => {
            let index = other
                .strip_prefix("remove_feature:")
                .and_then(|i| i.parse::<usize>().ok())
                .ok_or_else(|| AppError::BadRequest(format!("unknown editor action '{other}'")))?;
            dashboard.editor.remove_feature(index);
            false
        }
    };

    // Only a write changes what the store holds.
    if saved && !refresh(&state, &mut guard, &session, &mut dashboard, &mut notices).await? {
        return signed_out(&session).await;
    }

    dashboard.store(&session).await?;
    Ok(DashboardTemplate::new(&admin.email, &dashboard, notices).into_response())
}

/// Discard the draft.
#[instrument(skip_all)]
pub async fn close_editor(admin: RequireAdmin) -> Result<Response, AppError> {
    let session = admin.session;
    let mut dashboard = Dashboard::load(&session).await?;
    dashboard.editor.close();
    dashboard.store(&session).await?;
    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Helpers
// =============================================================================

/// Re-read the active tab under the guard.
///
/// The dashboard is saved to the session store before the read and loaded
/// back after it, so a tab switch made by an overlapping request from the
/// same session makes this read stale instead of being overwritten by it.
/// Returns `Ok(false)` if the admin signed out meanwhile.
async fn refresh(
    state: &AppState,
    guard: &mut SessionGuard,
    session: &Session,
    dashboard: &mut Dashboard,
    notices: &mut Notices,
) -> Result<bool, AppError> {
    dashboard.store(session).await?;
    session.save().await?;

    let ticket = dashboard.list.begin_fetch();
    let token = guard.token().clone();
    let Ok(fetched) = guard
        .watch(ListPanel::fetch(state.store(), &token, ticket))
        .await
    else {
        return Ok(false);
    };

    session.load().await?;
    *dashboard = Dashboard::load(session).await?;
    dashboard.list.apply(fetched, notices);
    Ok(true)
}

/// End a view whose admin signed out elsewhere.
async fn signed_out(session: &Session) -> Result<Response, AppError> {
    clear_current_admin(session).await?;
    Dashboard::clear(session).await?;
    clear_sentry_user();
    push_flash(session, Notices::error(LOGIN_REQUIRED)).await?;
    Ok(Redirect::to("/login").into_response())
}
