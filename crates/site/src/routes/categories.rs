//! Category route handlers.

use std::sync::Arc;

use aitoonic_core::{Category, CategoryWithCount, Tool, slugify};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::catalog::{self, ALL_SLUG, CategoryPage};
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Image shown for tools without one.
const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1676277791608-ac54783d753b?auto=format&fit=crop&q=80&w=400";

/// Category card display data for templates.
#[derive(Clone)]
pub struct CategoryCardView {
    pub name: String,
    pub description: String,
    /// URL-encoded slug for `/category/{slug}` links
    pub href: String,
    pub tool_count: u64,
}

/// Tool card display data for templates.
#[derive(Clone)]
pub struct ToolCardView {
    pub name: String,
    pub description: String,
    pub url: String,
    pub image_url: String,
    pub image_alt: String,
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&CategoryWithCount> for CategoryCardView {
    fn from(counted: &CategoryWithCount) -> Self {
        let category = &counted.category;
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            href: format!("/category/{}", urlencoding::encode(&slugify(&category.name))),
            tool_count: counted.tool_count,
        }
    }
}

impl From<&Tool> for ToolCardView {
    fn from(tool: &Tool) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            url: tool.url.clone(),
            image_url: tool
                .image_url
                .clone()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            image_alt: tool
                .image_alt
                .clone()
                .filter(|alt| !alt.trim().is_empty())
                .unwrap_or_else(|| tool.name.clone()),
        }
    }
}

/// Category browser template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub categories: Vec<CategoryCardView>,
}

/// Category detail template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub title: String,
    pub meta_description: String,
    pub name: String,
    pub description: String,
    /// Whether to show the category name in the breadcrumbs
    pub show_crumb: bool,
    pub tools: Vec<ToolCardView>,
}

impl CategoryShowTemplate {
    fn new(category: &Category, tools: &[Tool]) -> Self {
        Self {
            title: category
                .seo_title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("{} AI Tools | Aitoonic", category.name)),
            meta_description: category
                .seo_description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| category.description.clone()),
            name: category.name.clone(),
            description: category.description.clone(),
            show_crumb: category.id.as_str() != ALL_SLUG,
            tools: tools.iter().map(ToolCardView::from).collect(),
        }
    }
}

/// Display the category browser.
///
/// A failed category read renders the empty state.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Response {
    let categories = match cached_browse(&state).await {
        Ok(categories) => categories.iter().map(CategoryCardView::from).collect(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch categories");
            Vec::new()
        }
    };

    CategoriesIndexTemplate { categories }.into_response()
}

/// Browse result, reused from the cache while it is fresh.
///
/// Errors are never cached.
async fn cached_browse(
    state: &AppState,
) -> std::result::Result<Arc<[CategoryWithCount]>, aitoonic_core::StoreError> {
    let Some(cache) = state.browser_cache() else {
        return Ok(catalog::browse_categories(state.store()).await?.into());
    };

    if let Some(hit) = cache.get(&()).await {
        return Ok(hit);
    }
    let fresh: Arc<[CategoryWithCount]> =
        catalog::browse_categories(state.store()).await?.into();
    cache.insert((), Arc::clone(&fresh)).await;
    Ok(fresh)
}

/// Display one category and its tools.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(name): Path<String>) -> Result<Response> {
    match catalog::category_detail(state.store(), &name).await? {
        CategoryPage::Found { category, tools } => {
            Ok(CategoryShowTemplate::new(&category, &tools).into_response())
        }
        CategoryPage::NotFound => Err(AppError::NotFound("Category".to_string())),
    }
}
