//! Editable drafts of catalog entries.
//!
//! A [`Draft`] is the in-memory copy of an entry that the admin editor
//! mutates before submission. It is a tagged union so each kind carries its
//! own field set and required-field rules; the kind is always explicit and
//! never inferred from which optional fields happen to be present.
//!
//! A draft without an id has never been saved. Saving it inserts a new row;
//! saving a draft that carries an id updates that row.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::seo;
use crate::types::{
    Agent, AgentId, Category, CategoryId, Entity, EntityKind, PricingType, Tool, ToolId,
    trimmed_or_none,
};

/// Status written for every saved agent.
pub const AGENT_STATUS_ACTIVE: &str = "active";

/// The first rule a draft breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,
    #[error("Description is required")]
    DescriptionRequired,
    #[error("Tool URL is required")]
    UrlRequired,
    #[error("Category is required")]
    CategoryRequired,
}

/// Fields every kind shares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonFields {
    pub name: String,
    pub description: String,
    seo_title: String,
    seo_description: String,
}

impl CommonFields {
    fn from_record(
        name: &str,
        description: &str,
        seo_title: Option<&String>,
        seo_description: Option<&String>,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            seo_title: seo_title.cloned().unwrap_or_default(),
            seo_description: seo_description.cloned().unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn seo_title(&self) -> &str {
        &self.seo_title
    }

    #[must_use]
    pub fn seo_description(&self) -> &str {
        &self.seo_description
    }

    /// Set the SEO title as typed, truncated to 60 characters.
    pub fn set_seo_title(&mut self, input: &str) {
        self.seo_title = seo::seo_title(input);
    }

    /// Set the SEO description as typed, truncated to 160 characters.
    pub fn set_seo_description(&mut self, input: &str) {
        self.seo_description = seo::seo_description(input);
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::NameRequired);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::DescriptionRequired);
        }
        Ok(())
    }

    fn payload(&self) -> CommonPayload {
        CommonPayload {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            seo_title: trimmed_or_none(&self.seo_title),
            seo_description: trimmed_or_none(&self.seo_description),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub id: Option<CategoryId>,
    pub common: CommonFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDraft {
    pub id: Option<ToolId>,
    pub common: CommonFields,
    pub url: String,
    pub category_id: Option<CategoryId>,
    pub image_url: String,
    pub image_alt: String,
    pub how_to_use: String,
    pub features: Vec<serde_json::Value>,
    pub use_cases: Vec<serde_json::Value>,
    pub pricing: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDraft {
    pub id: Option<AgentId>,
    pub common: CommonFields,
    pub agent_features: Vec<String>,
    pub pricing_type: PricingType,
    pub is_featured: bool,
    pub is_verified: bool,
    pub image_url: String,
    pub image_alt: String,
}

impl AgentDraft {
    /// Append a blank feature entry.
    pub fn add_feature(&mut self) {
        self.agent_features.push(String::new());
    }

    /// Remove the feature at `index`, shifting later entries up.
    ///
    /// Returns `false` (and changes nothing) if `index` is out of range.
    pub fn remove_feature(&mut self, index: usize) -> bool {
        if index < self.agent_features.len() {
            self.agent_features.remove(index);
            true
        } else {
            false
        }
    }

    /// Replace the feature at `index`.
    ///
    /// Returns `false` (and changes nothing) if `index` is out of range.
    pub fn update_feature(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.agent_features.get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Features with blank entries stripped, as persisted.
    #[must_use]
    pub fn saved_features(&self) -> Vec<String> {
        self.agent_features
            .iter()
            .filter(|feature| !feature.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// An editable catalog entry of one explicit kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Draft {
    Category(CategoryDraft),
    Tool(ToolDraft),
    Agent(AgentDraft),
}

impl Draft {
    /// A blank, unsaved draft of `kind`.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Category => Self::Category(CategoryDraft::default()),
            EntityKind::Tool => Self::Tool(ToolDraft::default()),
            EntityKind::Agent => Self::Agent(AgentDraft::default()),
        }
    }

    /// Clone every field of a stored entry into a draft.
    #[must_use]
    pub fn from_entity(entity: &Entity) -> Self {
        match entity {
            Entity::Category(category) => Self::Category(category.into()),
            Entity::Tool(tool) => Self::Tool(tool.into()),
            Entity::Agent(agent) => Self::Agent(agent.into()),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Category(_) => EntityKind::Category,
            Self::Tool(_) => EntityKind::Tool,
            Self::Agent(_) => EntityKind::Agent,
        }
    }

    /// The id of the stored row this draft edits, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Category(d) => d.id.as_ref().map(CategoryId::as_str),
            Self::Tool(d) => d.id.as_ref().map(ToolId::as_str),
            Self::Agent(d) => d.id.as_ref().map(AgentId::as_str),
        }
    }

    /// Whether the draft has never been saved.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    #[must_use]
    pub const fn common(&self) -> &CommonFields {
        match self {
            Self::Category(d) => &d.common,
            Self::Tool(d) => &d.common,
            Self::Agent(d) => &d.common,
        }
    }

    pub const fn common_mut(&mut self) -> &mut CommonFields {
        match self {
            Self::Category(d) => &mut d.common,
            Self::Tool(d) => &mut d.common,
            Self::Agent(d) => &mut d.common,
        }
    }

    /// Check required fields, stopping at the first violation.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: name, then description, then (tools
    /// only) url and category.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.common().validate()?;

        if let Self::Tool(tool) = self {
            if tool.url.trim().is_empty() {
                return Err(ValidationError::UrlRequired);
            }
            if tool
                .category_id
                .as_ref()
                .is_none_or(|id| id.as_str().is_empty())
            {
                return Err(ValidationError::CategoryRequired);
            }
        }

        Ok(())
    }

    /// Validate and build the record sent to the store.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure; no payload is built for an
    /// invalid draft.
    pub fn payload(&self) -> Result<Payload, ValidationError> {
        self.validate()?;
        let common = self.common().payload();

        Ok(match self {
            Self::Category(_) => Payload::Category(common),
            Self::Tool(tool) => Payload::Tool(ToolPayload {
                common,
                url: tool.url.trim().to_string(),
                category_id: tool
                    .category_id
                    .clone()
                    .ok_or(ValidationError::CategoryRequired)?,
                features: tool.features.clone(),
                use_cases: tool.use_cases.clone(),
                pricing: tool.pricing.clone(),
                how_to_use: trimmed_or_none(&tool.how_to_use),
                image_url: trimmed_or_none(&tool.image_url),
                image_alt: trimmed_or_none(&tool.image_alt),
            }),
            Self::Agent(agent) => {
                let features = agent.saved_features();
                Payload::Agent(AgentPayload {
                    common,
                    agent_features: features.clone(),
                    is_featured: agent.is_featured,
                    is_verified: agent.is_verified,
                    pricing_type: agent.pricing_type,
                    image_url: trimmed_or_none(&agent.image_url),
                    image_alt: trimmed_or_none(&agent.image_alt),
                    status: AGENT_STATUS_ACTIVE,
                    capabilities: features,
                })
            }
        })
    }
}

impl From<&Category> for CategoryDraft {
    fn from(category: &Category) -> Self {
        Self {
            id: Some(category.id.clone()),
            common: CommonFields::from_record(
                &category.name,
                &category.description,
                category.seo_title.as_ref(),
                category.seo_description.as_ref(),
            ),
        }
    }
}

impl From<&Tool> for ToolDraft {
    fn from(tool: &Tool) -> Self {
        Self {
            id: Some(tool.id.clone()),
            common: CommonFields::from_record(
                &tool.name,
                &tool.description,
                tool.seo_title.as_ref(),
                tool.seo_description.as_ref(),
            ),
            url: tool.url.clone(),
            category_id: tool.category_id.clone(),
            image_url: tool.image_url.clone().unwrap_or_default(),
            image_alt: tool.image_alt.clone().unwrap_or_default(),
            how_to_use: tool.how_to_use.clone().unwrap_or_default(),
            features: tool.features.clone(),
            use_cases: tool.use_cases.clone(),
            pricing: tool.pricing.clone(),
        }
    }
}

impl From<&Agent> for AgentDraft {
    fn from(agent: &Agent) -> Self {
        Self {
            id: Some(agent.id.clone()),
            common: CommonFields::from_record(
                &agent.name,
                &agent.description,
                agent.seo_title.as_ref(),
                agent.seo_description.as_ref(),
            ),
            agent_features: agent.agent_features.clone(),
            pricing_type: agent.pricing_type,
            is_featured: agent.is_featured,
            is_verified: agent.is_verified,
            image_url: agent.image_url.clone().unwrap_or_default(),
            image_alt: agent.image_alt.clone().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Payloads
// =============================================================================

/// Whole-record payload written on insert or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Category(CommonPayload),
    Tool(ToolPayload),
    Agent(AgentPayload),
}

impl Payload {
    /// Render the payload as the JSON object sent to the store.
    ///
    /// # Errors
    ///
    /// Only fails if an opaque pass-through value cannot be re-serialized.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommonPayload {
    pub name: String,
    pub description: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolPayload {
    #[serde(flatten)]
    pub common: CommonPayload,
    pub url: String,
    pub category_id: CategoryId,
    pub features: Vec<serde_json::Value>,
    #[serde(rename = "useCases")]
    pub use_cases: Vec<serde_json::Value>,
    pub pricing: Vec<serde_json::Value>,
    pub how_to_use: Option<String>,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentPayload {
    #[serde(flatten)]
    pub common: CommonPayload,
    pub agent_features: Vec<String>,
    pub is_featured: bool,
    pub is_verified: bool,
    pub pricing_type: PricingType,
    pub image_url: Option<String>,
    pub image_alt: Option<String>,
    pub status: &'static str,
    pub capabilities: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn named(kind: EntityKind, name: &str, description: &str) -> Draft {
        let mut draft = Draft::new(kind);
        draft.common_mut().name = name.to_string();
        draft.common_mut().description = description.to_string();
        draft
    }

    #[test]
    fn test_new_draft_is_unsaved_and_blank() {
        for kind in EntityKind::ALL {
            let draft = Draft::new(kind);
            assert!(draft.is_new());
            assert_eq!(draft.kind(), kind);
            assert!(draft.common().name.is_empty());
        }
    }

    #[test]
    fn test_validation_requires_name_then_description() {
        for kind in EntityKind::ALL {
            assert_eq!(
                named(kind, "  ", "").validate(),
                Err(ValidationError::NameRequired)
            );
            assert_eq!(
                named(kind, "Name", " \n").validate(),
                Err(ValidationError::DescriptionRequired)
            );
        }
    }

    #[test]
    fn test_tool_validation_requires_url_then_category() {
        let mut draft = named(EntityKind::Tool, "Painter", "Paints");
        assert_eq!(draft.validate(), Err(ValidationError::UrlRequired));

        if let Draft::Tool(tool) = &mut draft {
            tool.url = "painter.example".to_string();
        }
        assert_eq!(draft.validate(), Err(ValidationError::CategoryRequired));

        if let Draft::Tool(tool) = &mut draft {
            tool.category_id = Some(CategoryId::new(""));
        }
        assert_eq!(draft.validate(), Err(ValidationError::CategoryRequired));

        if let Draft::Tool(tool) = &mut draft {
            tool.category_id = Some(CategoryId::new("c1"));
        }
        assert_eq!(draft.validate(), Ok(()));
    }

    #[test]
    fn test_non_tool_kinds_skip_tool_rules() {
        assert!(named(EntityKind::Category, "A", "B").validate().is_ok());
        assert!(named(EntityKind::Agent, "A", "B").validate().is_ok());
    }

    #[test]
    fn test_seo_fields_truncate_as_typed() {
        let mut draft = Draft::new(EntityKind::Category);
        draft.common_mut().set_seo_title(&"t".repeat(75));
        draft.common_mut().set_seo_description(&"d".repeat(300));

        assert_eq!(draft.common().seo_title().chars().count(), 60);
        assert_eq!(draft.common().seo_description().chars().count(), 160);
    }

    #[test]
    fn test_category_payload_trims_and_nulls_blank_seo() {
        let mut draft = named(EntityKind::Category, "  Video ", " Clips  ");
        draft.common_mut().set_seo_title("   ");

        let value = draft.payload().unwrap().to_value().unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "Video",
                "description": "Clips",
                "seo_title": null,
                "seo_description": null,
            })
        );
    }

    #[test]
    fn test_tool_payload_passes_blobs_through() {
        let mut draft = named(EntityKind::Tool, "Painter", "Paints");
        if let Draft::Tool(tool) = &mut draft {
            tool.url = " https://painter.example ".to_string();
            tool.category_id = Some(CategoryId::new("c1"));
            tool.use_cases = vec![serde_json::json!({"title": "Posters"})];
            tool.image_alt = "  ".to_string();
        }

        let value = draft.payload().unwrap().to_value().unwrap();
        assert_eq!(value["url"], "https://painter.example");
        assert_eq!(value["category_id"], "c1");
        assert_eq!(value["useCases"], serde_json::json!([{"title": "Posters"}]));
        assert_eq!(value["features"], serde_json::json!([]));
        assert_eq!(value["image_alt"], serde_json::Value::Null);
        assert_eq!(value["how_to_use"], serde_json::Value::Null);
    }

    #[test]
    fn test_agent_payload_strips_blank_features_and_forces_status() {
        let mut draft = named(EntityKind::Agent, "Bot", "Chats");
        if let Draft::Agent(agent) = &mut draft {
            agent.agent_features = vec![
                "Memory".to_string(),
                "   ".to_string(),
                String::new(),
                "Search".to_string(),
            ];
        }

        let value = draft.payload().unwrap().to_value().unwrap();
        assert_eq!(value["agent_features"], serde_json::json!(["Memory", "Search"]));
        assert_eq!(value["capabilities"], serde_json::json!(["Memory", "Search"]));
        assert_eq!(value["status"], "active");
        assert_eq!(value["pricing_type"], "free");
        assert_eq!(value["is_featured"], false);
        assert_eq!(value["is_verified"], false);
    }

    #[test]
    fn test_invalid_draft_builds_no_payload() {
        assert_eq!(
            named(EntityKind::Agent, "", "x").payload(),
            Err(ValidationError::NameRequired)
        );
    }

    #[test]
    fn test_feature_list_operations() {
        let mut agent = AgentDraft::default();
        agent.add_feature();
        assert_eq!(agent.agent_features, vec![String::new()]);

        assert!(agent.update_feature(0, "a"));
        agent.add_feature();
        agent.add_feature();
        assert!(agent.update_feature(1, "b"));
        assert!(agent.update_feature(2, "c"));
        assert!(!agent.update_feature(3, "d"));

        assert!(agent.remove_feature(0));
        assert_eq!(agent.agent_features, vec!["b".to_string(), "c".to_string()]);
        assert!(!agent.remove_feature(5));
        assert_eq!(agent.agent_features.len(), 2);
    }

    #[test]
    fn test_draft_from_entity_clones_fields() {
        let agent = Agent {
            id: AgentId::new("a1"),
            name: "Bot".to_string(),
            description: "Chats".to_string(),
            agent_features: vec!["Memory".to_string()],
            capabilities: vec!["Memory".to_string()],
            pricing_type: PricingType::Paid,
            is_featured: true,
            is_verified: false,
            status: "active".to_string(),
            image_url: None,
            image_alt: None,
            seo_title: Some("Bot | Aitoonic".to_string()),
            seo_description: None,
            created_at: None,
        };

        let draft = Draft::from_entity(&Entity::Agent(agent));
        assert_eq!(draft.id(), Some("a1"));
        assert_eq!(draft.common().seo_title(), "Bot | Aitoonic");
        let Draft::Agent(agent) = draft else {
            panic!("expected an agent draft");
        };
        assert_eq!(agent.pricing_type, PricingType::Paid);
        assert!(agent.is_featured);
        assert_eq!(agent.agent_features, vec!["Memory".to_string()]);
    }
}
