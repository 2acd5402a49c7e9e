//! Interprets `@controls` into links and form descriptors.

use shared::{
    domain::FieldKind,
    protocol::{Collection, Control, Controls, Representation},
};
use tracing::{debug, warn};

/// Relation names the renderer looks up. Defaults follow the sensorhub API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationNames {
    pub self_rel: String,
    pub collection: String,
    pub add_item: String,
    pub edit: String,
    pub delete: String,
}

impl Default for RelationNames {
    fn default() -> Self {
        Self {
            self_rel: "self".into(),
            collection: "collection".into(),
            add_item: "senhub:add-sensor".into(),
            edit: "edit".into(),
            delete: "senhub:delete".into(),
        }
    }
}

pub trait Hypermedia {
    fn controls(&self) -> &Controls;
}

impl Hypermedia for Representation {
    fn controls(&self) -> &Controls {
        &self.controls
    }
}

impl Hypermedia for Collection {
    fn controls(&self) -> &Controls {
        &self.controls
    }
}

/// Looks up `relation`. `None` means the server does not offer that capability.
pub fn resolve<'a, H: Hypermedia + ?Sized>(resource: &'a H, relation: &str) -> Option<&'a Control> {
    let control = resource.controls().get(relation);
    if control.is_none() {
        debug!(relation, "capability absent");
    }
    control
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub description: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// Form fields in declared property order. Required names without a property are dropped.
pub fn describe_form(control: &Control) -> Vec<FieldDescriptor> {
    let Some(schema) = control.schema.as_ref() else {
        return Vec::new();
    };

    for stray in schema.stray_required() {
        warn!(
            href = %control.href,
            field = stray,
            "schema requires a field it does not declare; ignoring"
        );
    }

    schema
        .properties
        .iter()
        .map(|prop| FieldDescriptor {
            name: prop.name.clone(),
            description: prop
                .description
                .clone()
                .unwrap_or_else(|| prop.name.clone()),
            kind: prop.kind.clone(),
            required: schema.is_required(&prop.name),
        })
        .collect()
}

#[cfg(test)]
#[path = "tests/controls_tests.rs"]
mod tests;
