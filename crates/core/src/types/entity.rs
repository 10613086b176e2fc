//! Catalog records as stored in the hosted data service.
//!
//! Rows are decoded leniently: the store may omit optional columns or send
//! `null` for them, and neither should make a whole listing fail to load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{AgentId, CategoryId, ToolId};

/// Remote tables consumed by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Categories,
    Tools,
    Agents,
}

impl Table {
    /// Table name as addressed by the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Tools => "tools",
            Self::Agents => "agents",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of catalog entry being browsed or edited (the admin "tab").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    #[default]
    Category,
    Tool,
    Agent,
}

impl EntityKind {
    /// All kinds in tab order.
    pub const ALL: [Self; 3] = [Self::Category, Self::Tool, Self::Agent];

    /// Backing table for this kind.
    #[must_use]
    pub const fn table(self) -> Table {
        match self {
            Self::Category => Table::Categories,
            Self::Tool => Table::Tools,
            Self::Agent => Table::Agents,
        }
    }

    /// Singular, lowercase label used in notifications.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Tool => "tool",
            Self::Agent => "agent",
        }
    }

    /// Singular, title-cased name ("Tool").
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::Tool => "Tool",
            Self::Agent => "Agent",
        }
    }

    /// Plural tab slug used in admin URLs (same as the table name).
    #[must_use]
    pub const fn tab(self) -> &'static str {
        self.table().as_str()
    }

    /// Title-cased tab caption.
    #[must_use]
    pub const fn caption(self) -> &'static str {
        match self {
            Self::Category => "Categories",
            Self::Tool => "Tools",
            Self::Agent => "Agents",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    /// Accepts both the tab slug (`tools`) and the singular label (`tool`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "categories" | "category" => Ok(Self::Category),
            "tools" | "tool" => Ok(Self::Tool),
            "agents" | "agent" => Ok(Self::Agent),
            _ => Err(format!("invalid entity kind: {s}")),
        }
    }
}

/// Agent pricing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    #[default]
    Free,
    Freemium,
    Paid,
}

impl PricingType {
    pub const ALL: [Self; 3] = [Self::Free, Self::Freemium, Self::Paid];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Freemium => "freemium",
            Self::Paid => "paid",
        }
    }

    #[must_use]
    pub const fn caption(self) -> &'static str {
        match self {
            Self::Free => "Free",
            Self::Freemium => "Freemium",
            Self::Paid => "Paid",
        }
    }
}

impl std::fmt::Display for PricingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PricingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "freemium" => Ok(Self::Freemium),
            "paid" => Ok(Self::Paid),
            _ => Err(format!("invalid pricing type: {s}")),
        }
    }
}

/// Treat an explicit `null` the same as a missing field.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn default_status() -> String {
    "active".to_string()
}

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A category with its tool count, derived at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithCount {
    pub category: Category,
    pub tool_count: u64,
}

/// A catalog tool.
///
/// `features`, `use_cases` and `pricing` are opaque blobs: the catalog passes
/// them through unchanged and never inspects their shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub url: String,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_alt: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub features: Vec<serde_json::Value>,
    #[serde(rename = "useCases", default, deserialize_with = "null_default")]
    pub use_cases: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_default")]
    pub pricing: Vec<serde_json::Value>,
    #[serde(default)]
    pub how_to_use: Option<String>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A catalog agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_default")]
    pub agent_features: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub capabilities: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub pricing_type: PricingType,
    #[serde(default, deserialize_with = "null_default")]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "null_default")]
    pub is_verified: bool,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_alt: Option<String>,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Any catalog record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Category(Category),
    Tool(Tool),
    Agent(Agent),
}

impl Entity {
    /// Decode a raw store row of the given kind.
    ///
    /// # Errors
    ///
    /// Returns the decoding error if the row lacks an `id` or a field has the
    /// wrong type.
    pub fn from_row(kind: EntityKind, row: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            EntityKind::Category => Self::Category(serde_json::from_value(row)?),
            EntityKind::Tool => Self::Tool(serde_json::from_value(row)?),
            EntityKind::Agent => Self::Agent(serde_json::from_value(row)?),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Category(_) => EntityKind::Category,
            Self::Tool(_) => EntityKind::Tool,
            Self::Agent(_) => EntityKind::Agent,
        }
    }

    /// The store-assigned identifier, whatever the kind.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Category(c) => c.id.as_str(),
            Self::Tool(t) => t.id.as_str(),
            Self::Agent(a) => a.id.as_str(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Category(c) => &c.name,
            Self::Tool(t) => &t.name,
            Self::Agent(a) => &a.name,
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Category(c) => &c.description,
            Self::Tool(t) => &t.description,
            Self::Agent(a) => &a.description,
        }
    }

    /// Case-insensitive substring match against name or description.
    ///
    /// `needle` must already be lowercased; an empty needle matches everything.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name().to_lowercase().contains(needle)
            || self.description().to_lowercase().contains(needle)
    }
}
