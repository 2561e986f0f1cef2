use serde::Serialize;
use tracing::error;

use crate::device::Feature;
use crate::device::FeatureCategory;

/// Classification of a non-primary entity in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityCategory {
    /// Changes how the device behaves, e.g. an LED toggle
    Config,
    /// Read-only information about the device, e.g. signal strength
    Diagnostic,
}

/// Mapping from device library category to entity category.
///
/// Primary features are main controls and carry no category.
const FEATURE_CATEGORY_TO_ENTITY_CATEGORY: &[(FeatureCategory, EntityCategory)] = &[
    (FeatureCategory::Config, EntityCategory::Config),
    (FeatureCategory::Info, EntityCategory::Diagnostic),
    (FeatureCategory::Debug, EntityCategory::Diagnostic),
];

/// Entity category for a feature, `None` for main controls.
///
/// Categories without a mapping fall back to diagnostic.
pub fn category_for_feature(feature: Option<&Feature>) -> Option<EntityCategory> {
    let feature = feature?;
    if feature.category == FeatureCategory::Primary {
        return None;
    }

    let mapped = FEATURE_CATEGORY_TO_ENTITY_CATEGORY
        .iter()
        .find(|(category, _)| *category == feature.category)
        .map(|(_, entity_category)| *entity_category);

    Some(mapped.unwrap_or_else(|| {
        error!(
            "Unhandled category {} for feature {}, fallback to diagnostic",
            feature.category, feature.id
        );
        EntityCategory::Diagnostic
    }))
}
