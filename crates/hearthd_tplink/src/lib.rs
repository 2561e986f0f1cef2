//! TP-Link entity identity and classification.
//!
//! Maps the features of TP-Link devices onto registry entities: which
//! features become entities, how they are identified and categorized, how
//! availability follows coordinator updates, and how write failures are
//! reported.

pub mod config;
pub mod coordinator;
pub mod device;
pub mod entity;
pub mod plan;
pub mod platforms;

#[cfg(test)]
mod testing;

pub use coordinator::Coordinator;
pub use coordinator::DeviceCoordinator;
pub use entity::SetupContext;
pub use platforms::EntityHandle;
pub use platforms::Platform;
pub use platforms::setup_entities;
