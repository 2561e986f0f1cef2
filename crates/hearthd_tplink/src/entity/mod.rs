//! Mapping of device features onto registry entities.
//!
//! - [`category`]: feature category to entity category
//! - [`identity`]: unique ids and registry device placement
//! - [`enumerate`]: which features become entities
//! - [`description`]: per-feature entity metadata
//! - [`coordinated`]: entities bound to a coordinator, with availability
//! - [`action`]: error translation and refresh around writes

pub mod action;
pub mod category;
pub mod coordinated;
pub mod description;
pub mod enumerate;
pub mod identity;

pub use action::ActionError;
pub use action::TranslatedError;
pub use category::EntityCategory;
pub use coordinated::AttrError;
pub use coordinated::CoordinatedEntity;
pub use coordinated::Entity;
pub use description::DescriptionExtras;
pub use description::EntityDescription;
pub use enumerate::FeatureEntity;
pub use enumerate::SetupContext;
pub use identity::DeviceInfo;
pub use identity::EntityIdentity;
pub use identity::IdentityError;
pub use identity::RegistryLink;
