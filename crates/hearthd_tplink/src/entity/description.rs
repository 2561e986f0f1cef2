use serde::Serialize;

use crate::device::Feature;
use crate::device::FeatureCategory;

/// Static metadata of an entity, derived from the feature backing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDescription {
    pub key: String,
    pub translation_key: String,
    pub name: String,

    /// Whether the registry enables the entity when first seen
    pub entity_registry_enabled_default: bool,

    /// Allowed values, for select entities
    pub options: Option<Vec<String>>,

    pub native_unit_of_measurement: Option<String>,
}

/// Options a platform or the configuration may set on a description.
///
/// Unset fields take the per-feature defaults:
/// - `entity_registry_enabled_default`: `debug_enabled_default` (itself
///   `false` when unset) for debug features, `true` otherwise
/// - `options`: none
/// - `native_unit_of_measurement`: the feature's unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionExtras {
    /// Applies to every feature category
    pub entity_registry_enabled_default: Option<bool>,
    /// Applies to debug features only
    pub debug_enabled_default: Option<bool>,
    pub options: Option<Vec<String>>,
    pub native_unit_of_measurement: Option<String>,
}

impl DescriptionExtras {
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }
}

/// Build the description for a feature.
pub fn description_for_feature(feature: &Feature, extras: DescriptionExtras) -> EntityDescription {
    let entity_registry_enabled_default = extras.entity_registry_enabled_default.unwrap_or(
        feature.category != FeatureCategory::Debug || extras.debug_enabled_default.unwrap_or(false),
    );

    EntityDescription {
        key: feature.id.clone(),
        translation_key: feature.id.clone(),
        name: feature.name.clone(),
        entity_registry_enabled_default,
        options: extras.options,
        native_unit_of_measurement: extras
            .native_unit_of_measurement
            .or_else(|| feature.unit.clone()),
    }
}
