//! Typed Mason representations, decoded and validated at the fetch boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    domain::{FieldKind, Method},
    error::DecodeError,
};

pub const CONTROLS_KEY: &str = "@controls";
pub const NAMESPACES_KEY: &str = "@namespaces";
pub const ERROR_KEY: &str = "@error";
pub const ITEMS_KEY: &str = "items";

pub type Controls = BTreeMap<String, Control>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub href: String,
    #[serde(default)]
    pub method: Method,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Control {
    pub fn link(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            method: Method::Get,
            title: None,
            encoding: None,
            schema: None,
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.encoding = Some("json".to_string());
        self.schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaProperty {
    pub name: String,
    pub description: Option<String>,
    pub kind: FieldKind,
    pub format: Option<String>,
}

impl SchemaProperty {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            kind,
            format: None,
        }
    }
}

/// Input schema of a form control. `properties` keeps the declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", into = "RawSchema")]
pub struct Schema {
    pub properties: Vec<SchemaProperty>,
    pub required: Vec<String>,
}

impl Schema {
    pub fn property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.iter().find(|prop| prop.name == name)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|req| req == name)
    }

    /// Required names with no matching property.
    pub fn stray_required(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .filter(|name| self.property(name).is_none())
            .map(String::as_str)
    }
}

#[derive(Serialize, Deserialize)]
struct RawSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    required: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct RawProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

impl TryFrom<RawSchema> for Schema {
    type Error = String;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let mut properties = Vec::with_capacity(raw.properties.len());
        for (name, value) in raw.properties {
            let prop: RawProperty = serde_json::from_value(value)
                .map_err(|e| format!("schema property '{name}' is invalid: {e}"))?;
            properties.push(SchemaProperty {
                name,
                description: prop.description,
                kind: FieldKind::parse(prop.kind.as_deref()),
                format: prop.format,
            });
        }
        Ok(Self {
            properties,
            required: raw.required,
        })
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        let mut properties = Map::new();
        for prop in schema.properties {
            let raw = RawProperty {
                description: prop.description,
                kind: Some(prop.kind.as_str().to_string()),
                format: prop.format,
            };
            // RawProperty only holds strings, so this cannot fail.
            let value = serde_json::to_value(raw).unwrap_or(Value::Null);
            properties.insert(prop.name, value);
        }
        Self {
            kind: Some("object".to_string()),
            properties,
            required: schema.required,
        }
    }
}

/// One resource: business fields plus the controls it advertises.
///
/// A collection carries its members in `items`; for single resources it is `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct Representation {
    pub fields: Map<String, Value>,
    pub controls: Controls,
    pub items: Option<Vec<Representation>>,
}

impl Representation {
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        let Value::Object(mut object) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let controls = match object.shift_remove(CONTROLS_KEY) {
            None => Controls::new(),
            Some(Value::Object(raw)) => {
                let mut controls = Controls::new();
                for (relation, raw_control) in raw {
                    let control: Control = serde_json::from_value(raw_control).map_err(|e| {
                        DecodeError::InvalidControl {
                            relation: relation.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                    controls.insert(relation, control);
                }
                controls
            }
            Some(_) => return Err(DecodeError::InvalidControls),
        };

        let items = match object.shift_remove(ITEMS_KEY) {
            None => None,
            Some(Value::Array(raw)) => {
                let mut items = Vec::with_capacity(raw.len());
                for (index, raw_item) in raw.into_iter().enumerate() {
                    let item = Self::from_value(raw_item).map_err(|source| {
                        DecodeError::InvalidItem {
                            index,
                            source: Box::new(source),
                        }
                    })?;
                    items.push(item);
                }
                Some(items)
            }
            Some(_) => return Err(DecodeError::InvalidItems),
        };

        object.shift_remove(NAMESPACES_KEY);
        object.shift_remove(ERROR_KEY);

        Ok(Self {
            fields: object,
            controls,
            items,
        })
    }

    pub fn from_slice(body: &[u8]) -> Result<Self, DecodeError> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| DecodeError::Json(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_control(mut self, relation: impl Into<String>, control: Control) -> Self {
        self.controls.insert(relation.into(), control);
        self
    }

    pub fn with_items(mut self, items: Vec<Representation>) -> Self {
        self.items = Some(items);
        self
    }

    pub fn control(&self, relation: &str) -> Option<&Control> {
        self.controls.get(relation)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Display text of a business field; `null` reads as empty.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(value_text)
    }

    pub fn into_value(self) -> Value {
        let mut object = self.fields;
        if let Some(items) = self.items {
            object.insert(
                ITEMS_KEY.to_string(),
                Value::Array(items.into_iter().map(Self::into_value).collect()),
            );
        }
        if !self.controls.is_empty() {
            let controls = self
                .controls
                .into_iter()
                .map(|(relation, control)| {
                    let value = serde_json::to_value(control).unwrap_or(Value::Null);
                    (relation, value)
                })
                .collect();
            object.insert(CONTROLS_KEY.to_string(), Value::Object(controls));
        }
        Value::Object(object)
    }
}

impl TryFrom<Value> for Representation {
    type Error = DecodeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// A representation known to carry an ordered member list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub items: Vec<Representation>,
    pub controls: Controls,
}

impl Collection {
    pub fn control(&self, relation: &str) -> Option<&Control> {
        self.controls.get(relation)
    }
}

impl TryFrom<Representation> for Collection {
    type Error = DecodeError;

    fn try_from(value: Representation) -> Result<Self, Self::Error> {
        let items = value.items.ok_or(DecodeError::MissingItems)?;
        Ok(Self {
            items,
            controls: value.controls,
        })
    }
}

pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
