//! Label schemas for stand-off annotation filtering.
//!
//! A [`LabelSchema`] names which span labels count as entities and which
//! count as attributes. Spans carrying any other label are ignored by pair
//! enumeration, though every span still contributes its text to the
//! event-membership table used for relation resolution.
//!
//! The default schema targets substance-use annotation:
//!
//! ```text
//! ┌────────────┬──────────────────────────────────────────────────────┐
//! │ Entities   │ Alcohol, Drug, Tobacco                               │
//! │ Attributes │ Amount, ExposureHistory, Frequency, History, Method, │
//! │            │ QuitHistory, Status, Type                            │
//! └────────────┴──────────────────────────────────────────────────────┘
//! ```
//!
//! Custom schemas retarget the pipeline at other annotation projects:
//!
//! ```rust
//! use relprep::LabelSchema;
//!
//! let schema = LabelSchema::new(["Medication"], ["Dosage", "Route"]);
//! assert!(schema.is_entity("Medication"));
//! assert!(schema.is_attribute("Route"));
//! assert!(!schema.is_attribute("Medication"));
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Label Schema
// =============================================================================

/// Which span labels are entities and which are attributes.
///
/// Label matching is exact and case-sensitive, mirroring how BRAT writes
/// labels into `.ann` files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSchema {
    /// Labels treated as entity mentions (pair left-hand side).
    pub entity_labels: Vec<String>,
    /// Labels treated as attribute mentions (pair right-hand side).
    pub attribute_labels: Vec<String>,
}

impl Default for LabelSchema {
    fn default() -> Self {
        LabelSchema::substance_use()
    }
}

impl LabelSchema {
    /// Create a schema from explicit label lists.
    pub fn new<E, A>(entity_labels: E, attribute_labels: A) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        LabelSchema {
            entity_labels: entity_labels.into_iter().map(Into::into).collect(),
            attribute_labels: attribute_labels.into_iter().map(Into::into).collect(),
        }
    }

    /// The substance-use schema: Alcohol/Drug/Tobacco entities with their
    /// standard attribute set.
    #[must_use]
    pub fn substance_use() -> Self {
        LabelSchema::new(
            ["Alcohol", "Drug", "Tobacco"],
            [
                "Amount",
                "ExposureHistory",
                "Frequency",
                "History",
                "Method",
                "QuitHistory",
                "Status",
                "Type",
            ],
        )
    }

    /// Check whether `label` is an entity label.
    #[must_use]
    pub fn is_entity(&self, label: &str) -> bool {
        self.entity_labels.iter().any(|l| l == label)
    }

    /// Check whether `label` is an attribute label.
    #[must_use]
    pub fn is_attribute(&self, label: &str) -> bool {
        self.attribute_labels.iter().any(|l| l == label)
    }

    /// Reject schemas that cannot produce a well-defined extraction.
    ///
    /// A label listed on both sides would make pair enumeration ambiguous,
    /// and an empty side would silently produce zero pairs, so both are
    /// configuration errors rather than empty outputs.
    pub fn validate(&self) -> Result<()> {
        if self.entity_labels.is_empty() {
            return Err(Error::invalid_config("schema has no entity labels"));
        }
        if self.attribute_labels.is_empty() {
            return Err(Error::invalid_config("schema has no attribute labels"));
        }
        if let Some(dup) = self
            .entity_labels
            .iter()
            .find(|&l| self.attribute_labels.contains(l))
        {
            return Err(Error::invalid_config(format!(
                "label '{dup}' is listed as both entity and attribute"
            )));
        }
        Ok(())
    }
}
