use serde::Serialize;
use serde_json::json;

use super::Platform;
use super::PlatformEntity;
use super::string_value;
use crate::device::Device;
use crate::device::Feature;
use crate::device::FeatureType;
use crate::entity::ActionError;
use crate::entity::AttrError;
use crate::entity::CoordinatedEntity;
use crate::entity::DescriptionExtras;
use crate::entity::Entity;
use crate::entity::EntityDescription;
use crate::entity::FeatureEntity;
use crate::entity::IdentityError;
use crate::entity::SetupContext;
use crate::entity::description::description_for_feature;
use crate::entity::enumerate::entities_for_device_and_its_children;

/// Choice between a fixed set of options, e.g. a light effect.
#[derive(Debug, Clone)]
pub struct Select {
    description: EntityDescription,
    state: SelectState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectState {
    pub current_option: Option<String>,
    pub options: Vec<String>,
}

impl Select {
    pub fn current_option(&self) -> Option<&str> {
        self.state.current_option.as_deref()
    }

    pub fn options(&self) -> &[String] {
        &self.state.options
    }
}

impl Entity for Select {
    fn platform(&self) -> Platform {
        Platform::Select
    }

    fn description(&self) -> Option<&EntityDescription> {
        Some(&self.description)
    }

    fn update_attrs(&mut self, _device: &Device, feature: Option<&Feature>) -> Result<(), AttrError> {
        if let Some(feature) = feature {
            self.state.current_option = Some(string_value(feature)?);
            if let Some(choices) = &feature.choices {
                self.state.options = choices.clone();
            }
        }
        Ok(())
    }

    fn state_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.state).unwrap_or_default()
    }
}

impl FeatureEntity for Select {
    const FEATURE_TYPE: FeatureType = FeatureType::Choice;

    fn from_feature(feature: &Feature, extras: DescriptionExtras) -> Self {
        let options = feature.choices.clone().unwrap_or_default();
        Self {
            description: description_for_feature(feature, extras.with_options(options.clone())),
            state: SelectState {
                current_option: None,
                options,
            },
        }
    }
}

impl PlatformEntity for Select {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError> {
        entities_for_device_and_its_children(ctx, &ctx.coordinator.device())
    }
}

impl CoordinatedEntity<Select> {
    /// Select `option`, which must be one of the advertised options.
    pub async fn select_option(&self, option: &str) -> Result<(), ActionError> {
        if !self.inner().options().iter().any(|o| o == option) {
            return Err(ActionError::InvalidInput {
                func: "select_option",
                reason: format!("{} is not a valid option for {}", option, self.entity_id()),
            });
        }
        self.write_own_feature("select_option", json!(option)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityCategory;
    use crate::testing;

    fn light_effect() -> (CoordinatedEntity<Select>, testing::MockDeviceClient) {
        let (coordinator, client) = testing::coordinator(testing::bulb());
        let mut select = Select::entities(&SetupContext::new(coordinator))
            .unwrap()
            .remove(0);
        select.handle_coordinator_update();
        (select, client)
    }

    #[test]
    fn test_options_from_choices() {
        let (select, _) = light_effect();
        assert_eq!(select.unique_id(), "bulb-1_light_effect");
        assert_eq!(select.identity().entity_category, Some(EntityCategory::Config));
        assert_eq!(select.inner().current_option(), Some("Off"));
        assert_eq!(select.inner().options(), ["Off", "Party", "Relax"]);
        assert_eq!(
            select.inner().description().and_then(|d| d.options.clone()),
            Some(vec!["Off".to_string(), "Party".to_string(), "Relax".to_string()])
        );
    }

    #[tokio::test]
    async fn test_select_option() {
        let (mut select, client) = light_effect();

        select.select_option("Party").await.unwrap();
        assert_eq!(client.updates(), 1);

        select.handle_coordinator_update();
        assert_eq!(select.inner().current_option(), Some("Party"));
    }

    #[tokio::test]
    async fn test_unknown_option_rejected_before_io() {
        let (select, client) = light_effect();

        let err = select.select_option("Disco").await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidInput { func: "select_option", .. }));
        assert!(client.writes().is_empty());
        assert_eq!(client.updates(), 0);
    }
}
