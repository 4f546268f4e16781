// the building blocks an identification key is assembled from

use core::hash::BuildHasherDefault;
use seahash::SeaHasher;
use std::collections::HashMap;

// used to print out readable forms of a construct
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::definition::SpaceReference;
use crate::error::{KeyError, Result};
use crate::payload::{Interval, Payload};

pub type OtherHasher = BuildHasherDefault<SeaHasher>;

// value id given to the synthetic slot of a range filter while no interval is active
pub const RANGE_SLOT: &str = "range";

fn json_type(value: &Value) -> String {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
    .to_string()
}

// ------------- FilterKind -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    #[serde(rename = "DescriptiveTextAndImagesFilter")]
    DescriptiveTextAndImages,
    #[serde(rename = "TextOnlyFilter")]
    TextOnly,
    #[serde(rename = "ColorFilter")]
    Color,
    #[serde(rename = "RangeFilter")]
    Range,
    #[serde(rename = "NumberFilter")]
    Number,
    #[serde(rename = "TaxonFilter")]
    Taxon,
}
impl FilterKind {
    pub fn strategy(&self) -> MatchStrategy {
        match self {
            FilterKind::Color => MatchStrategy::ColorElementwise,
            FilterKind::Range => MatchStrategy::RangeOverlap,
            _ => MatchStrategy::Default,
        }
    }
    /// Turns an encoded payload into the typed form this kind of filter carries.
    pub fn decode(&self, filter: &str, encoded: &Value) -> Result<Payload> {
        let mismatch = |expected: &'static str| KeyError::TypeMismatch {
            filter: filter.to_string(),
            expected,
            found: json_type(encoded),
        };
        match self {
            FilterKind::DescriptiveTextAndImages | FilterKind::TextOnly => encoded
                .as_str()
                .map(|s| Payload::Text(s.to_string()))
                .ok_or_else(|| mismatch("text")),
            FilterKind::Number => encoded
                .as_f64()
                .map(Payload::Number)
                .ok_or_else(|| mismatch("number")),
            FilterKind::Color => {
                let channels = encoded
                    .as_array()
                    .filter(|a| a.len() == 3 || a.len() == 4)
                    .ok_or_else(|| mismatch("rgba tuple"))?;
                channels
                    .iter()
                    .map(|c| c.as_f64().ok_or_else(|| mismatch("rgba tuple")))
                    .collect::<Result<Vec<f64>>>()
                    .map(Payload::Color)
            }
            FilterKind::Range => match Interval::from_value(encoded) {
                Some(interval) => interval.map(Payload::Interval),
                None => Err(mismatch("interval")),
            },
            FilterKind::Taxon => Ok(Payload::Opaque(encoded.clone())),
        }
    }
}
impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FilterKind::DescriptiveTextAndImages => "DescriptiveTextAndImagesFilter",
            FilterKind::TextOnly => "TextOnlyFilter",
            FilterKind::Color => "ColorFilter",
            FilterKind::Range => "RangeFilter",
            FilterKind::Number => "NumberFilter",
            FilterKind::Taxon => "TaxonFilter",
        };
        write!(f, "{}", name)
    }
}

/// How a filter decides whether a declared value matches one of its spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Same value id and structurally equal payload.
    Default,
    /// Same value id and channel-by-channel equal color tuple.
    ColorElementwise,
    /// Intervals overlap; value ids are not consulted.
    RangeOverlap,
}

// ------------- SpaceId -------------
/// Composite `<filter-id>:<value-id>` identifier of a filter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceId(String);
impl SpaceId {
    pub fn new(filter: &str, value: &str) -> Self {
        Self(format!("{}:{}", filter, value))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ------------- ValueRef -------------
/// A value as declared by an item or a restriction, decoded for its filter.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRef {
    value_id: Option<String>,
    payload: Payload,
}
impl ValueRef {
    pub fn new(value_id: Option<String>, payload: Payload) -> Self {
        Self { value_id, payload }
    }
    pub fn value_id(&self) -> Option<&str> {
        self.value_id.as_deref()
    }
    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

// ------------- Space -------------
/// One concrete value of a filter. The filter is referenced by index only.
#[derive(Debug, Clone)]
pub struct Space {
    id: SpaceId,
    value_id: String,
    payload: Option<Payload>,
    filter: usize,
    index: usize,
    media: Map<String, Value>,
}
impl Space {
    pub fn new(
        filter_id: &str,
        value_id: String,
        payload: Payload,
        filter: usize,
        index: usize,
        media: Map<String, Value>,
    ) -> Self {
        Self {
            id: SpaceId::new(filter_id, &value_id),
            value_id,
            payload: Some(payload),
            filter,
            index,
            media,
        }
    }
    /// The single slot a range filter selects its intervals through.
    pub fn range_slot(filter_id: &str, filter: usize, index: usize) -> Self {
        Self {
            id: SpaceId::new(filter_id, RANGE_SLOT),
            value_id: RANGE_SLOT.to_string(),
            payload: None,
            filter,
            index,
            media: Map::new(),
        }
    }
    pub fn id(&self) -> &SpaceId {
        &self.id
    }
    pub fn value_id(&self) -> &str {
        &self.value_id
    }
    /// `None` only for a range slot without an active interval.
    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }
    pub fn filter(&self) -> usize {
        self.filter
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn media(&self) -> &Map<String, Value> {
        &self.media
    }
    pub(crate) fn activate(&mut self, filter_id: &str, interval: Interval) {
        self.value_id = interval.to_string();
        self.id = SpaceId::new(filter_id, &self.value_id);
        self.payload = Some(Payload::Interval(interval));
    }
    pub(crate) fn deactivate(&mut self, filter_id: &str) {
        self.value_id = RANGE_SLOT.to_string();
        self.id = SpaceId::new(filter_id, RANGE_SLOT);
        self.payload = None;
    }
}
impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{} [{}]", self.id, payload),
            None => write!(f, "{}", self.id),
        }
    }
}

// ------------- Filter -------------
#[derive(Debug, Clone)]
pub struct Filter {
    id: String,
    name: String,
    description: Option<String>,
    kind: FilterKind,
    weight: f64,
    allow_multiple: bool,
    index: usize,
    spaces: Vec<usize>,
    current: Option<Interval>,
}
impl Filter {
    pub fn new(
        id: String,
        name: String,
        description: Option<String>,
        kind: FilterKind,
        weight: f64,
        allow_multiple: bool,
        index: usize,
    ) -> Result<Self> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(KeyError::InvalidWeight { filter: id, weight });
        }
        Ok(Self {
            id,
            name,
            description,
            kind,
            weight,
            allow_multiple,
            index,
            spaces: Vec::new(),
            current: None,
        })
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    pub fn kind(&self) -> FilterKind {
        self.kind
    }
    pub fn strategy(&self) -> MatchStrategy {
        self.kind.strategy()
    }
    pub fn weight(&self) -> f64 {
        self.weight
    }
    pub fn allow_multiple(&self) -> bool {
        self.allow_multiple
    }
    pub fn index(&self) -> usize {
        self.index
    }
    /// Indices of the owned spaces in the key's flat value list, in declaration order.
    pub fn spaces(&self) -> &[usize] {
        &self.spaces
    }
    /// The interval a range filter currently has selected.
    pub fn current(&self) -> Option<Interval> {
        self.current
    }
    pub fn is_range(&self) -> bool {
        self.kind == FilterKind::Range
    }
    pub(crate) fn own(&mut self, space: usize) {
        self.spaces.push(space);
    }
    pub(crate) fn set_current(&mut self, interval: Option<Interval>) {
        self.current = interval;
    }
    /// Does the declared value match this space of the filter?
    pub fn matches(&self, space: &Space, reference: &ValueRef) -> bool {
        if space.filter() != self.index {
            return false;
        }
        let same_id = reference.value_id() == Some(space.value_id());
        match (self.strategy(), space.payload(), reference.payload()) {
            (MatchStrategy::Default, Some(payload), declared) => same_id && payload == declared,
            (MatchStrategy::ColorElementwise, Some(Payload::Color(a)), Payload::Color(b)) => {
                same_id && a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
            }
            (MatchStrategy::RangeOverlap, Some(Payload::Interval(a)), Payload::Interval(b)) => {
                a.overlaps(b)
            }
            _ => false,
        }
    }
    /// Decodes a reference to one of this filter's values. References that
    /// omit the value id are matched to the space carrying the same payload.
    pub fn resolve(&self, spaces: &[Space], reference: &SpaceReference) -> Result<ValueRef> {
        let payload = self.kind.decode(&self.id, &reference.encoded_payload)?;
        if self.is_range() {
            return Ok(ValueRef::new(reference.value_id.clone(), payload));
        }
        let value_id = match &reference.value_id {
            Some(value_id) => {
                if !self.spaces.iter().any(|&i| spaces[i].value_id() == value_id) {
                    return Err(KeyError::UnknownValue {
                        filter: self.id.clone(),
                        value: value_id.clone(),
                    });
                }
                value_id.clone()
            }
            None => self
                .spaces
                .iter()
                .map(|&i| &spaces[i])
                .find(|s| s.payload() == Some(&payload))
                .map(|s| s.value_id().to_string())
                .ok_or_else(|| KeyError::UnknownValue {
                    filter: self.id.clone(),
                    value: payload.to_string(),
                })?,
        };
        Ok(ValueRef::new(Some(value_id), payload))
    }
}
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({}, weight {})", self.name, self.kind, self.weight)
    }
}

// ------------- Item -------------
/// One candidate result. Never mutated once the key is built.
#[derive(Debug, Clone)]
pub struct Item {
    id: Uuid,
    name: String,
    index: usize,
    max_points: f64,
    space: HashMap<String, Vec<ValueRef>, OtherHasher>,
    display: Map<String, Value>,
}
impl Item {
    pub fn new(
        id: Uuid,
        name: String,
        index: usize,
        max_points: f64,
        space: HashMap<String, Vec<ValueRef>, OtherHasher>,
        display: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            name,
            index,
            max_points,
            space,
            display,
        }
    }
    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn max_points(&self) -> f64 {
        self.max_points
    }
    /// The values this item declares for a filter, empty if it declares none.
    pub fn references(&self, filter_id: &str) -> &[ValueRef] {
        self.space.get(filter_id).map(Vec::as_slice).unwrap_or(&[])
    }
    /// Image, taxon, decision rule and the rest, as delivered.
    pub fn display(&self) -> &Map<String, Value> {
        &self.display
    }
}
impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
