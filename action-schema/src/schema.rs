//! JSON-Schema-like parameter descriptions as published by remote catalogs.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult};

/// One node of a parameter schema tree.
///
/// Accepted keys: `type` and `title` (required), `description` or `desc`,
/// `default`, and for objects `properties` plus `required`. Property order is
/// preserved as declared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    title: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "ordered_properties",
        serialize_with = "serialize_properties"
    )]
    properties: Vec<(String, ParameterSchema)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    required: Option<Vec<String>>,
}

impl ParameterSchema {
    /// Parses a schema node from raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Malformed`] when `type` or `title` is missing or a
    /// key has the wrong JSON shape.
    pub fn from_value(value: Value) -> SchemaResult<Self> {
        serde_json::from_value(value).map_err(|err| SchemaError::Malformed {
            reason: err.to_string(),
        })
    }

    /// Human label of the node.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw `type` value (`string`, `number`, `boolean`, `array`, `object`).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Description, preferring `description` over the legacy `desc` key.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.desc.as_deref())
            .filter(|text| !text.trim().is_empty())
    }

    /// Explicit default value, if the schema declares one.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Child properties in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[(String, ParameterSchema)] {
        &self.properties
    }

    /// Names listed under `required`; `None` when the key is absent.
    #[must_use]
    pub fn required(&self) -> Option<&[String]> {
        self.required.as_deref()
    }

    /// Returns `true` when `name` is listed under `required`.
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == name))
    }
}

fn ordered_properties<'de, D>(deserializer: D) -> Result<Vec<(String, ParameterSchema)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PropertiesVisitor;

    impl<'de> Visitor<'de> for PropertiesVisitor {
        type Value = Vec<(String, ParameterSchema)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of property schemas")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut properties = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, ParameterSchema>()? {
                properties.push(entry);
            }
            Ok(properties)
        }
    }

    deserializer.deserialize_map(PropertiesVisitor)
}

#[allow(clippy::ptr_arg)]
fn serialize_properties<S>(
    properties: &Vec<(String, ParameterSchema)>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(properties.iter().map(|(name, schema)| (name, schema)))
}
