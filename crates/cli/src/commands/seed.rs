//! Seed the catalog from a YAML file.
//!
//! Every entry is built into the same [`Draft`] the admin editor uses, so
//! required fields, trimming and SEO truncation behave identically. The
//! whole file is validated before the first insert; a file with any bad
//! entry writes nothing.
//!
//! ```yaml
//! categories:
//!   - name: Image Generation
//!     description: Create images from text
//! tools:
//!   - name: Painter
//!     description: Paints pictures
//!     url: https://painter.example
//!     category: Image Generation
//! agents:
//!   - name: Scout
//!     description: Finds things
//!     features: [Search, Memory]
//!     pricing_type: freemium
//! ```

use std::collections::HashMap;
use std::path::Path;

use aitoonic_core::draft::{AgentDraft, CategoryDraft, CommonFields, ToolDraft};
use aitoonic_core::store::{AccessToken, Credentials, DataStore, list_categories};
use aitoonic_core::{Category, CategoryId, Draft, PricingType, StoreError, ValidationError};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

/// Category id used while validating tools whose category is created by the
/// same file.
const PENDING_CATEGORY: &str = "pending";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{} invalid entries", .0.len())]
    Invalid(Vec<String>),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("could not encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store returned no id for '{0}'")]
    MissingId(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub tools: Vec<ToolSeed>,
    #[serde(default)]
    pub agents: Vec<AgentSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    /// Category name, matched without regard to case.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_alt: String,
    #[serde(default)]
    pub how_to_use: String,
    #[serde(default)]
    pub features: Vec<serde_json::Value>,
    #[serde(default, alias = "useCases")]
    pub use_cases: Vec<serde_json::Value>,
    #[serde(default)]
    pub pricing: Vec<serde_json::Value>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub pricing_type: PricingType,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub image_alt: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub tools: usize,
    pub agents: usize,
}

fn common(
    name: &str,
    description: &str,
    seo_title: Option<&String>,
    seo_description: Option<&String>,
) -> CommonFields {
    let mut fields = CommonFields::default();
    fields.name = name.to_string();
    fields.description = description.to_string();
    fields.set_seo_title(seo_title.map_or("", String::as_str));
    fields.set_seo_description(seo_description.map_or("", String::as_str));
    fields
}

impl CategorySeed {
    fn draft(&self) -> Draft {
        Draft::Category(CategoryDraft {
            id: None,
            common: common(
                &self.name,
                &self.description,
                self.seo_title.as_ref(),
                self.seo_description.as_ref(),
            ),
        })
    }
}

impl ToolSeed {
    fn draft(&self, category_id: Option<CategoryId>) -> Draft {
        Draft::Tool(ToolDraft {
            id: None,
            common: common(
                &self.name,
                &self.description,
                self.seo_title.as_ref(),
                self.seo_description.as_ref(),
            ),
            url: self.url.clone(),
            category_id,
            image_url: self.image_url.clone(),
            image_alt: self.image_alt.clone(),
            how_to_use: self.how_to_use.clone(),
            features: self.features.clone(),
            use_cases: self.use_cases.clone(),
            pricing: self.pricing.clone(),
        })
    }
}

impl AgentSeed {
    fn draft(&self) -> Draft {
        Draft::Agent(AgentDraft {
            id: None,
            common: common(
                &self.name,
                &self.description,
                self.seo_title.as_ref(),
                self.seo_description.as_ref(),
            ),
            agent_features: self.features.clone(),
            pricing_type: self.pricing_type,
            is_featured: self.is_featured,
            is_verified: self.is_verified,
            image_url: self.image_url.clone(),
            image_alt: self.image_alt.clone(),
        })
    }
}

fn category_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check every entry, collecting one message per bad entry.
///
/// Tools must name a category that already exists or is created by the file.
///
/// # Errors
///
/// Returns [`SeedError::Invalid`] listing every problem found.
pub fn validate(file: &SeedFile, existing: &[Category]) -> Result<(), SeedError> {
    let mut problems = Vec::new();

    for (i, category) in file.categories.iter().enumerate() {
        if let Err(e) = category.draft().validate() {
            problems.push(format!("categories[{i}] '{}': {e}", category.name));
        }
    }

    let known: Vec<String> = existing
        .iter()
        .map(|c| category_key(&c.name))
        .chain(file.categories.iter().map(|c| category_key(&c.name)))
        .collect();
    for (i, tool) in file.tools.iter().enumerate() {
        let category = category_key(&tool.category);
        let placeholder = (!category.is_empty()).then(|| CategoryId::new(PENDING_CATEGORY));
        if let Err(e) = tool.draft(placeholder).validate() {
            problems.push(format!("tools[{i}] '{}': {e}", tool.name));
        } else if !known.contains(&category) {
            problems.push(format!(
                "tools[{i}] '{}': unknown category '{}'",
                tool.name, tool.category
            ));
        }
    }

    for (i, agent) in file.agents.iter().enumerate() {
        if let Err(e) = agent.draft().validate() {
            problems.push(format!("agents[{i}] '{}': {e}", agent.name));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(SeedError::Invalid(problems))
    }
}

async fn insert(
    store: &dyn DataStore,
    token: &AccessToken,
    draft: &Draft,
) -> Result<serde_json::Value, SeedError> {
    let record = draft.payload()?.to_value()?;
    Ok(store
        .insert(draft.kind().table(), &record, Some(token))
        .await?)
}

/// Validate `file` and insert its entries: categories, then tools, then agents.
///
/// # Errors
///
/// Returns [`SeedError::Invalid`] without writing anything if any entry is
/// bad, or the first store error once writing has started.
pub async fn seed(
    store: &dyn DataStore,
    token: &AccessToken,
    file: &SeedFile,
) -> Result<SeedSummary, SeedError> {
    let existing = list_categories(store, Some(token)).await?;
    validate(file, &existing)?;

    let mut category_ids: HashMap<String, CategoryId> = existing
        .into_iter()
        .map(|c| (category_key(&c.name), c.id))
        .collect();
    let mut summary = SeedSummary::default();

    for category in &file.categories {
        let row = insert(store, token, &category.draft()).await?;
        let id = row
            .get("id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SeedError::MissingId(category.name.clone()))?;
        category_ids.insert(category_key(&category.name), CategoryId::new(id));
        summary.categories += 1;
    }

    for tool in &file.tools {
        let category_id = category_ids.get(&category_key(&tool.category)).cloned();
        insert(store, token, &tool.draft(category_id)).await?;
        summary.tools += 1;
    }

    for agent in &file.agents {
        insert(store, token, &agent.draft()).await?;
        summary.agents += 1;
    }

    Ok(summary)
}

/// Seed from a YAML file, signing in with `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
///
/// # Errors
///
/// Returns an error if environment variables are missing, the file cannot be
/// read or is invalid, or a store call fails.
pub async fn from_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let email = std::env::var("ADMIN_EMAIL").map_err(|_| "ADMIN_EMAIL not set")?;
    let password = std::env::var("ADMIN_PASSWORD")
        .map(SecretString::from)
        .map_err(|_| "ADMIN_PASSWORD not set")?;

    info!(path = %path.display(), "Loading seed file");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(SeedError::from)?;
    let file: SeedFile = serde_yaml::from_str(&content).map_err(SeedError::from)?;
    info!(
        categories = file.categories.len(),
        tools = file.tools.len(),
        agents = file.agents.len(),
        "Parsed seed file"
    );

    let client = super::connect()?;
    let session = client
        .authenticate(&Credentials::new(email, password.expose_secret()))
        .await?;
    info!(user_id = %session.user_id, "Signed in");

    let result = seed(&client, &session.access_token, &file).await;
    if let Err(e) = client.sign_out(&session.access_token).await {
        error!(error = %e, "Sign-out failed");
    }

    match result {
        Ok(summary) => {
            info!("Seeding complete!");
            info!("  Categories inserted: {}", summary.categories);
            info!("  Tools inserted: {}", summary.tools);
            info!("  Agents inserted: {}", summary.agents);
            Ok(())
        }
        Err(SeedError::Invalid(problems)) => {
            error!("Seed file validation failed:");
            for problem in &problems {
                error!("  - {problem}");
            }
            Err(SeedError::Invalid(problems).into())
        }
        Err(e) => Err(e.into()),
    }
}
