//! Input shapes for building an [`crate::key::IdentificationKey`].
//!
//! These mirror the JSON the content backend delivers. Field names are
//! camelCase and the older names (`uuid`, `space`, `type`, `encodedSpace`,
//! `children`, `matrixFilters`) are accepted as aliases. Maps whose order
//! matters (filters, restrictions) are read into ordered vectors.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::construct::FilterKind;
use crate::error::Result;
use crate::key::Mode;

fn default_weight() -> f64 {
    1.0
}

/// Reads a JSON object into `(key, value)` pairs in document order.
fn ordered<'de, D, T>(deserializer: D) -> std::result::Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedVisitor<T>(PhantomData<T>);
    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
        type Value = Vec<(String, T)>;
        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map keyed by identifier")
        }
        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry::<String, T>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }
    deserializer.deserialize_map(OrderedVisitor(PhantomData))
}

// ------------- Key -------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDefinition {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "identificationMode")]
    pub mode: Option<Mode>,
    #[serde(alias = "children")]
    pub items: Vec<ItemDefinition>,
    #[serde(alias = "matrixFilters", deserialize_with = "ordered")]
    pub filters: Vec<(String, FilterDefinition)>,
}
impl KeyDefinition {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

// ------------- Filter -------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    #[serde(alias = "type", alias = "filterType")]
    pub kind: FilterKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, alias = "allowMultiple")]
    pub allow_multiple_values: bool,
    /// Keyed by the restricting filter; each entry is one OR-group.
    #[serde(default, deserialize_with = "ordered")]
    pub restrictions: Vec<(String, Restriction)>,
    #[serde(default, alias = "space")]
    pub values: Vec<SpaceDefinition>,
}

/// One restriction group: the filter stays hidden until one of these is selected.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Restriction {
    One(SpaceReference),
    Any(Vec<SpaceReference>),
}
impl Restriction {
    pub fn references(&self) -> &[SpaceReference] {
        match self {
            Restriction::One(reference) => std::slice::from_ref(reference),
            Restriction::Any(references) => references,
        }
    }
}

// ------------- Space -------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDefinition {
    #[serde(default, alias = "id")]
    pub value_id: Option<String>,
    #[serde(default, alias = "encodedSpace")]
    pub encoded_payload: Value,
    /// Image urls and whatever else the UI needs; never interpreted here.
    #[serde(flatten)]
    pub media: Map<String, Value>,
}

/// A pointer to a filter value, as used by items and restrictions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceReference {
    #[serde(default, alias = "id")]
    pub value_id: Option<String>,
    #[serde(alias = "encodedSpace")]
    pub encoded_payload: Value,
}

// ------------- Item -------------
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDefinition {
    #[serde(alias = "uuid")]
    pub id: Uuid,
    #[serde(default, alias = "name")]
    pub display_name: String,
    #[serde(default, alias = "space", deserialize_with = "ordered")]
    pub per_filter_value_refs: Vec<(String, Vec<SpaceReference>)>,
    #[serde(default)]
    pub max_points: f64,
    /// Image, taxon, decision rule, fact sheets and the like.
    #[serde(flatten)]
    pub display: Map<String, Value>,
}
