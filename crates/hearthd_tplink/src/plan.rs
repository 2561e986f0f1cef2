//! Human-readable listing of the entities set up for a device.

use std::fmt::Write;

use crate::entity::RegistryLink;
use crate::platforms::EntityHandle;

/// One line per entity, in setup order.
pub fn render_plan(entities: &[Box<dyn EntityHandle>]) -> String {
    let mut out = String::new();
    for entity in entities {
        let identity = entity.identity();
        let link = match &identity.device_info.link {
            RegistryLink::Connections(connections) => connections
                .iter()
                .map(|(kind, value)| format!("{}={}", kind, value))
                .collect::<Vec<_>>()
                .join(","),
            RegistryLink::ViaDevice(parent) => format!("via={}", parent),
        };
        let category = identity
            .entity_category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());

        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "{} unique_id={} device={:?} {} category={} enabled={}",
            entity.entity_id(),
            identity.unique_id,
            identity.device_info.name,
            link,
            category,
            entity.enabled_by_default(),
        );
    }
    out
}
