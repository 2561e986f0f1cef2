//! Concrete entity platforms and the setup that instantiates them.

use std::any::Any;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::device::Feature;
use crate::entity::AttrError;
use crate::entity::CoordinatedEntity;
use crate::entity::Entity;
use crate::entity::EntityIdentity;
use crate::entity::IdentityError;
use crate::entity::SetupContext;

pub mod binary_sensor;
pub mod button;
pub mod climate;
pub mod light;
pub mod number;
pub mod select;
pub mod sensor;
pub mod switch;

pub use binary_sensor::BinarySensor;
pub use button::Button;
pub use climate::Climate;
pub use climate::HvacAction;
pub use climate::HvacMode;
pub use light::Light;
pub use number::Number;
pub use select::Select;
pub use sensor::Sensor;
pub use switch::Switch;

/// Entity domain an entity is registered under.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    BinarySensor,
    Button,
    Climate,
    Light,
    Number,
    Select,
    Sensor,
    Switch,
}

impl Platform {
    /// Read-only measurement platforms, which stay on their own device.
    pub fn is_sensor_domain(self) -> bool {
        self == Platform::Sensor
    }
}

/// Entity of any platform, as returned by [`setup_entities`].
pub trait EntityHandle: Send + Sync {
    fn platform(&self) -> Platform;
    fn identity(&self) -> &EntityIdentity;
    fn unique_id(&self) -> &str;
    fn entity_id(&self) -> &str;

    /// Replace the entity id, used by setup to resolve collisions
    fn set_entity_id(&mut self, entity_id: String);

    fn name(&self) -> Option<&str>;
    fn enabled_by_default(&self) -> bool;
    fn available(&self) -> bool;
    fn handle_coordinator_update(&mut self);
    fn state_json(&self) -> serde_json::Value;

    /// For downcasting to `CoordinatedEntity<E>`
    fn as_any(&self) -> &dyn Any;
}

impl<E: Entity + 'static> EntityHandle for CoordinatedEntity<E> {
    fn platform(&self) -> Platform {
        self.inner().platform()
    }

    fn identity(&self) -> &EntityIdentity {
        CoordinatedEntity::identity(self)
    }

    fn unique_id(&self) -> &str {
        CoordinatedEntity::unique_id(self)
    }

    fn entity_id(&self) -> &str {
        CoordinatedEntity::entity_id(self)
    }

    fn set_entity_id(&mut self, entity_id: String) {
        CoordinatedEntity::set_entity_id(self, entity_id)
    }

    fn name(&self) -> Option<&str> {
        CoordinatedEntity::name(self)
    }

    fn enabled_by_default(&self) -> bool {
        CoordinatedEntity::enabled_by_default(self)
    }

    fn available(&self) -> bool {
        CoordinatedEntity::available(self)
    }

    fn handle_coordinator_update(&mut self) {
        CoordinatedEntity::handle_coordinator_update(self)
    }

    fn state_json(&self) -> serde_json::Value {
        self.inner().state_json()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A platform that creates its entities from a coordinator's device.
pub trait PlatformEntity: Entity + Sized + 'static {
    fn entities(ctx: &SetupContext) -> Result<Vec<CoordinatedEntity<Self>>, IdentityError>;
}

type SetupFn = fn(&SetupContext) -> Result<Vec<Box<dyn EntityHandle>>, IdentityError>;

struct PlatformEntry {
    platform: Platform,
    setup: SetupFn,
}

fn setup_platform<E: PlatformEntity>(
    ctx: &SetupContext,
) -> Result<Vec<Box<dyn EntityHandle>>, IdentityError> {
    Ok(E::entities(ctx)?
        .into_iter()
        .map(|entity| Box::new(entity) as Box<dyn EntityHandle>)
        .collect())
}

/// Every platform, in setup order.
const PLATFORMS: &[PlatformEntry] = &[
    PlatformEntry {
        platform: Platform::BinarySensor,
        setup: setup_platform::<BinarySensor>,
    },
    PlatformEntry {
        platform: Platform::Button,
        setup: setup_platform::<Button>,
    },
    PlatformEntry {
        platform: Platform::Climate,
        setup: setup_platform::<Climate>,
    },
    PlatformEntry {
        platform: Platform::Light,
        setup: setup_platform::<Light>,
    },
    PlatformEntry {
        platform: Platform::Number,
        setup: setup_platform::<Number>,
    },
    PlatformEntry {
        platform: Platform::Select,
        setup: setup_platform::<Select>,
    },
    PlatformEntry {
        platform: Platform::Sensor,
        setup: setup_platform::<Sensor>,
    },
    PlatformEntry {
        platform: Platform::Switch,
        setup: setup_platform::<Switch>,
    },
];

/// Create the entities of every platform for the coordinator's device.
///
/// Entities whose unique id was already produced by the same platform are
/// dropped. Entity ids are made unique with a numeric suffix. Each entity
/// is updated once from the current snapshot before it is returned.
pub fn setup_entities(ctx: &SetupContext) -> Result<Vec<Box<dyn EntityHandle>>, IdentityError> {
    let mut entities: Vec<Box<dyn EntityHandle>> = Vec::new();
    let mut unique_ids = HashSet::new();
    let mut entity_ids = HashSet::new();

    for entry in PLATFORMS {
        let created = (entry.setup)(ctx)?;
        debug!("Created {} {} entities", created.len(), entry.platform);

        for mut entity in created {
            if !unique_ids.insert((entry.platform, entity.unique_id().to_string())) {
                error!(
                    "Platform {} does not generate unique IDs. ID {} already exists - ignoring {}",
                    entry.platform,
                    entity.unique_id(),
                    entity.entity_id()
                );
                continue;
            }

            let entity_id = available_entity_id(entity.entity_id(), &entity_ids);
            entity_ids.insert(entity_id.clone());
            entity.set_entity_id(entity_id);

            entity.handle_coordinator_update();
            entities.push(entity);
        }
    }

    info!(
        "Set up {} entities for {}",
        entities.len(),
        ctx.coordinator.device().alias
    );
    Ok(entities)
}

fn available_entity_id(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn unexpected(feature: &Feature, expected: &'static str) -> AttrError {
    AttrError::UnexpectedValue {
        feature: feature.id.clone(),
        expected,
        found: feature.value.clone(),
    }
}

pub(crate) fn bool_value(feature: &Feature) -> Result<bool, AttrError> {
    feature.value.as_bool().ok_or_else(|| unexpected(feature, "boolean"))
}

pub(crate) fn number_value(feature: &Feature) -> Result<f64, AttrError> {
    feature.value.as_f64().ok_or_else(|| unexpected(feature, "number"))
}

pub(crate) fn string_value(feature: &Feature) -> Result<String, AttrError> {
    feature
        .value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| unexpected(feature, "string"))
}
