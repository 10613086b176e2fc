//! Entity editor panel.
//!
//! Holds at most one [`Draft`]. Form posts are applied field by field, agent
//! features are edited in place, and saving writes the whole record back.

use aitoonic_core::store::{AccessToken, DataStore};
use aitoonic_core::{CategoryId, Draft, Entity, EntityKind, PricingType};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::notify::Notices;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorPanel {
    draft: Option<Draft>,
}

impl EditorPanel {
    #[must_use]
    pub const fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    /// Start a blank draft of `kind`.
    pub fn open_new(&mut self, kind: EntityKind) {
        self.draft = Some(Draft::new(kind));
    }

    /// Start editing a copy of `entity`.
    pub fn select(&mut self, entity: &Entity) {
        self.draft = Some(Draft::from_entity(entity));
    }

    /// Discard the draft without saving.
    pub fn close(&mut self) {
        self.draft = None;
    }

    /// Copy submitted form fields into the draft.
    ///
    /// Unknown fields are ignored. Checkboxes count as ticked when present.
    pub fn apply_form(&mut self, fields: &[(String, String)]) {
        let Some(draft) = self.draft.as_mut() else {
            return;
        };

        if let Draft::Agent(agent) = draft {
            agent.is_featured = has_field(fields, "is_featured");
            agent.is_verified = has_field(fields, "is_verified");
        }

        for (key, value) in fields {
            match (key.as_str(), &mut *draft) {
                ("name", d) => d.common_mut().name.clone_from(value),
                ("description", d) => d.common_mut().description.clone_from(value),
                ("seo_title", d) => d.common_mut().set_seo_title(value),
                ("seo_description", d) => d.common_mut().set_seo_description(value),
                ("url", Draft::Tool(tool)) => tool.url.clone_from(value),
                ("category_id", Draft::Tool(tool)) => {
                    tool.category_id = (!value.is_empty()).then(|| CategoryId::new(value.as_str()));
                }
                ("how_to_use", Draft::Tool(tool)) => tool.how_to_use.clone_from(value),
                ("image_url", Draft::Tool(tool)) => tool.image_url.clone_from(value),
                ("image_alt", Draft::Tool(tool)) => tool.image_alt.clone_from(value),
                ("image_url", Draft::Agent(agent)) => agent.image_url.clone_from(value),
                ("image_alt", Draft::Agent(agent)) => agent.image_alt.clone_from(value),
                ("pricing_type", Draft::Agent(agent)) => {
                    if let Ok(pricing) = value.parse::<PricingType>() {
                        agent.pricing_type = pricing;
                    }
                }
                (other, Draft::Agent(agent)) => {
                    if let Some(index) = feature_index(other) {
                        agent.update_feature(index, value.as_str());
                    }
                }
                _ => {}
            }
        }
    }

    /// Append a blank agent feature. No-op for other kinds.
    pub fn add_feature(&mut self) -> bool {
        match self.draft.as_mut() {
            Some(Draft::Agent(agent)) => {
                agent.add_feature();
                true
            }
            _ => false,
        }
    }

    /// Remove an agent feature. Out-of-range indexes change nothing.
    pub fn remove_feature(&mut self, index: usize) -> bool {
        match self.draft.as_mut() {
            Some(Draft::Agent(agent)) => agent.remove_feature(index),
            _ => false,
        }
    }

    /// Validate and write the draft.
    ///
    /// Updates the stored row when the draft has an id and inserts otherwise.
    /// On success the draft is cleared. Any failure is reported as a notice
    /// and leaves the draft as it was. Returns whether the save succeeded.
    pub async fn save(
        &mut self,
        store: &dyn DataStore,
        token: &AccessToken,
        notices: &mut Notices,
    ) -> bool {
        let Some(draft) = self.draft.as_ref() else {
            return false;
        };
        let kind = draft.kind();

        let record = match draft.payload() {
            Ok(payload) => match payload.to_value() {
                Ok(record) => record,
                Err(e) => {
                    error!(error = %e, "Could not encode payload");
                    notices.push_error(format!("Error saving item: {e}"));
                    return false;
                }
            },
            Err(invalid) => {
                notices.push_error(invalid.to_string());
                return false;
            }
        };

        let result = match draft.id() {
            Some(id) => store.update(kind.table(), id, &record, Some(token)).await,
            None => store.insert(kind.table(), &record, Some(token)).await,
        };

        match result {
            Ok(row) => {
                info!(
                    kind = %kind,
                    id = row.get("id").and_then(serde_json::Value::as_str).unwrap_or_default(),
                    "Saved catalog entry"
                );
                notices.push_success(format!("{} saved successfully!", kind.title()));
                self.draft = None;
                true
            }
            Err(e) => {
                error!(error = %e, kind = %kind, "Save failed");
                notices.push_error(format!("Error saving item: {e}"));
                false
            }
        }
    }
}

fn has_field(fields: &[(String, String)], name: &str) -> bool {
    fields.iter().any(|(key, _)| key == name)
}

/// `feature_3` -> `Some(3)`.
fn feature_index(key: &str) -> Option<usize> {
    key.strip_prefix("feature_")?.parse().ok()
}
