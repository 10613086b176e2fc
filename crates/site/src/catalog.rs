//! Read paths of the public catalog.
//!
//! Both views go straight to the store on every call; the only reuse is the
//! optional category browser cache held in [`AppState`](crate::state::AppState).

use aitoonic_core::store::{
    Filter, Select, StoreResult, count_tools, list_categories, rank_by_tool_count,
};
use aitoonic_core::{
    Category, CategoryId, CategoryWithCount, DataStore, Table, Tool, slug_to_name,
};
use futures::future::join_all;
use tracing::{instrument, warn};

/// Reserved slug listing every tool.
pub const ALL_SLUG: &str = "all";

/// Outcome of resolving a category slug.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryPage {
    Found { category: Category, tools: Vec<Tool> },
    NotFound,
}

/// Categories that have at least one tool, most tools first.
///
/// Counts are fetched concurrently, one per category. A failed count is
/// logged and treated as zero, which hides that category.
///
/// # Errors
///
/// Returns the store error if the category list itself cannot be read.
#[instrument(skip(store))]
pub async fn browse_categories(store: &dyn DataStore) -> StoreResult<Vec<CategoryWithCount>> {
    let categories = list_categories(store, None).await?;
    let counts = join_all(categories.iter().map(|c| count_tools(store, c, None))).await;

    let counted = categories
        .into_iter()
        .zip(counts)
        .map(|(category, count)| {
            let tool_count = count.unwrap_or_else(|e| {
                warn!(category = %category.name, error = %e, "Failed to count tools");
                0
            });
            CategoryWithCount {
                category,
                tool_count,
            }
        })
        .collect();

    Ok(rank_by_tool_count(counted))
}

/// The category named by `slug` and its tools, newest first.
///
/// [`ALL_SLUG`] lists every tool under a synthetic "All Tools" category.
/// Any other slug is turned back into a name and matched exactly, ignoring
/// case. No match is not found; more than one match is ambiguous and is also
/// treated as not found.
///
/// # Errors
///
/// Returns the store error if a read fails or a row cannot be decoded.
#[instrument(skip(store))]
pub async fn category_detail(store: &dyn DataStore, slug: &str) -> StoreResult<CategoryPage> {
    if slug == ALL_SLUG {
        let tools = list_tools(store, None).await?;
        return Ok(CategoryPage::Found {
            category: all_tools_category(),
            tools,
        });
    }

    let name = slug_to_name(slug);
    let query = Select::all().filter(Filter::ilike("name", &name));
    let rows = store
        .select(Table::Categories, &query, None)
        .await?
        .into_iter()
        .map(serde_json::from_value::<Category>)
        .collect::<Result<Vec<_>, _>>()?;
    let mut matches = same_name(rows, &name);

    if matches.len() > 1 {
        warn!(slug, matches = matches.len(), "Slug matches several categories");
        return Ok(CategoryPage::NotFound);
    }
    let Some(category) = matches.pop() else {
        return Ok(CategoryPage::NotFound);
    };

    let tools = list_tools(store, Some(&category.id)).await?;
    Ok(CategoryPage::Found { category, tools })
}

/// Rows whose name equals `name` ignoring case.
fn same_name(categories: Vec<Category>, name: &str) -> Vec<Category> {
    let wanted = name.to_lowercase();
    categories
        .into_iter()
        .filter(|c| c.name.to_lowercase() == wanted)
        .collect()
}

/// Tools newest first, optionally limited to one category.
async fn list_tools(
    store: &dyn DataStore,
    category_id: Option<&CategoryId>,
) -> StoreResult<Vec<Tool>> {
    let mut query = Select::all().order_by("created_at", false);
    if let Some(id) = category_id {
        query = query.filter(Filter::eq("category_id", id.as_str()));
    }

    let rows = store.select(Table::Tools, &query, None).await?;
    Ok(rows
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<_>, _>>()?)
}

fn all_tools_category() -> Category {
    Category {
        id: CategoryId::new(ALL_SLUG),
        name: "All Tools".to_string(),
        description: "Browse all available AI tools in our directory".to_string(),
        seo_title: None,
        seo_description: None,
        created_at: None,
    }
}
