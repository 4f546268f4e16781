//! Matrixkey – an interactive, constraint-based identification engine.
//!
//! A key is built from *items* (candidate results, e.g. species) and
//! *filters* (attribute dimensions, e.g. "leg color"), each filter owning an
//! ordered list of *spaces* (values, e.g. "red"). Items declare which spaces
//! they exhibit. As the user selects spaces the key recomputes:
//! * which items are still consistent with every selection,
//! * which spaces can still be selected,
//! * which filters are visible, given their restrictions,
//! * how many points each item scores, for ranking.
//!
//! ## Modules
//! * [`construct`] – [`construct::Filter`], [`construct::Space`] and
//!   [`construct::Item`], plus the per-kind matching rules.
//! * [`payload`] – decoded payloads: text, numbers, color tuples, intervals.
//! * [`incidence`] – the value × item incidence rows as roaring bitmaps.
//! * [`key`] – the [`key::IdentificationKey`] orchestrator.
//! * [`events`] – the per-key notification bus.
//! * [`definition`] – the serde shapes the source data arrives in.
//! * [`settings`] – layered configuration and tracing setup.
//!
//! ## Propagation
//! An item survives when it matches *all* selected spaces. A space stays
//! possible while it is selected or some surviving item still exhibits it.
//! A filter is visible when each of its restriction groups has at least one
//! selected member. Scores sum the filter weights of the matched selections.
//!
//! ## Range filters
//! Range filters do not enumerate values. Each owns a single slot whose
//! incidence row is recomputed from the active interval on selection, using
//! interval overlap instead of identifier equality.
//!
//! ## Quick Start
//! ```
//! use matrixkey::key::{IdentificationKey, Mode};
//! use matrixkey::definition::KeyDefinition;
//! use serde_json::json;
//!
//! let definition = KeyDefinition::from_value(json!({
//!     "items": [
//!         { "id": "79caeb21-50fd-473e-9a5c-08db85a7cd60", "displayName": "Crab",
//!           "perFilterValueRefs": { "legs": [{ "valueId": "claws", "encodedPayload": "with claws" }] },
//!           "maxPoints": 1 },
//!         { "id": "58d2f95e-6bd5-4e3d-92d4-d741eb80bfe8", "displayName": "Shrimp",
//!           "perFilterValueRefs": { "legs": [{ "valueId": "plain", "encodedPayload": "without claws" }] },
//!           "maxPoints": 1 }
//!     ],
//!     "filters": {
//!         "legs": { "kind": "TextOnlyFilter", "name": "Legs", "values": [
//!             { "valueId": "claws", "encodedPayload": "with claws" },
//!             { "valueId": "plain", "encodedPayload": "without claws" }
//!         ] }
//!     }
//! })).unwrap();
//! let mut key = IdentificationKey::new(definition, Mode::Strict).unwrap();
//! let claws = key.value_index("legs:claws").unwrap();
//! key.select_value(claws, None).unwrap();
//! assert_eq!(key.results().len(), 1);
//! assert_eq!(key.results()[0].name(), "Crab");
//! ```

pub mod construct;
pub mod definition;
pub mod error;
pub mod events;
pub mod incidence;
pub mod key;
pub mod payload;
pub mod settings;

pub use error::{KeyError, Result};
pub use events::{EventKind, KeyEvent};
pub use key::{IdentificationKey, Mode};
