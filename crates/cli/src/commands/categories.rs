//! Print the category browser as the public site shows it.

use aitoonic_core::CategoryWithCount;
use aitoonic_site::catalog::browse_categories;
use tracing::info;

/// List visible categories with their tool counts.
///
/// # Errors
///
/// Returns an error if configuration is missing or the category read fails.
pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let client = super::connect()?;

    let categories = browse_categories(&client).await?;
    if categories.is_empty() {
        info!("No categories with tools");
        return Ok(());
    }

    info!("Categories ({})", categories.len());
    for category in &categories {
        info!("  {}", summary_line(category));
    }
    Ok(())
}

fn summary_line(category: &CategoryWithCount) -> String {
    let noun = if category.tool_count == 1 { "tool" } else { "tools" };
    format!(
        "{:<32} {:>4} {noun}",
        category.category.name, category.tool_count
    )
}
