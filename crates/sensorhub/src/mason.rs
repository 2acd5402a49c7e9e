//! Mason bodies for sensor resources.

use serde_json::{json, Map, Value};
use shared::{
    domain::{FieldKind, Method},
    protocol::{Control, Representation, Schema, SchemaProperty, NAMESPACES_KEY},
};

use crate::store::Sensor;

pub const NAMESPACE: &str = "senhub";
pub const LINK_RELATIONS_URL: &str = "/sensorhub/link-relations/";
pub const SENSOR_PROFILE: &str = "/profiles/sensor/";
pub const ERROR_PROFILE: &str = "/profiles/error/";
pub const COLLECTION_HREF: &str = "/api/sensors/";

pub fn sensor_href(name: &str) -> String {
    format!("{COLLECTION_HREF}{name}/")
}

/// Human-readable description behind a `profile` link.
pub fn profile_text(profile: &str) -> Option<&'static str> {
    match profile {
        "sensor" => Some(
            "Sensor: name (unique, string), model (string), location (read-only, may be null).",
        ),
        "error" => Some("Error: @error.@message summary with optional @error.@messages details."),
        _ => None,
    }
}

pub fn sensor_schema() -> Schema {
    Schema {
        properties: vec![
            SchemaProperty::new("name", "Sensor's unique name", FieldKind::String),
            SchemaProperty::new("model", "Name of the sensor's model", FieldKind::String),
        ],
        required: vec!["name".into(), "model".into()],
    }
}

pub fn add_sensor_control() -> Control {
    Control::link(COLLECTION_HREF)
        .with_method(Method::Post)
        .with_title("Add a new sensor")
        .with_schema(sensor_schema())
}

pub fn edit_sensor_control(name: &str) -> Control {
    Control::link(sensor_href(name))
        .with_method(Method::Put)
        .with_title("Edit this sensor")
        .with_schema(sensor_schema())
}

pub fn delete_sensor_control(name: &str) -> Control {
    Control::link(sensor_href(name))
        .with_method(Method::Delete)
        .with_title("Delete this sensor")
}

fn sensor_fields(sensor: &Sensor) -> Representation {
    Representation::default()
        .with_field("name", sensor.name.as_str())
        .with_field("model", sensor.model.as_str())
        .with_field(
            "location",
            sensor
                .location
                .as_deref()
                .map(Value::from)
                .unwrap_or(Value::Null),
        )
}

fn with_namespace(body: Value) -> Value {
    let Value::Object(mut object) = body else {
        return body;
    };
    let mut namespaces = Map::new();
    namespaces.insert(NAMESPACE.to_string(), json!({ "name": LINK_RELATIONS_URL }));
    object.insert(NAMESPACES_KEY.to_string(), Value::Object(namespaces));
    Value::Object(object)
}

pub fn collection_body(sensors: &[Sensor]) -> Value {
    let items = sensors
        .iter()
        .map(|sensor| {
            sensor_fields(sensor)
                .with_control("self", Control::link(sensor_href(&sensor.name)))
                .with_control("profile", Control::link(SENSOR_PROFILE))
        })
        .collect();
    let body = Representation::default()
        .with_control("self", Control::link(COLLECTION_HREF))
        .with_control("senhub:add-sensor", add_sensor_control())
        .with_items(items)
        .into_value();
    with_namespace(body)
}

pub fn item_body(sensor: &Sensor) -> Value {
    let body = sensor_fields(sensor)
        .with_control("self", Control::link(sensor_href(&sensor.name)))
        .with_control("profile", Control::link(SENSOR_PROFILE))
        .with_control("collection", Control::link(COLLECTION_HREF))
        .with_control("edit", edit_sensor_control(&sensor.name))
        .with_control("senhub:delete", delete_sensor_control(&sensor.name))
        .into_value();
    with_namespace(body)
}
