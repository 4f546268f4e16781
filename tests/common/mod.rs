#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use matrixkey::definition::KeyDefinition;
use matrixkey::events::{EventKind, KeyEvent};
use matrixkey::key::{IdentificationKey, Mode};
use serde_json::{json, Value};

pub const CRAB: &str = "79caeb21-50fd-473e-9a5c-08db85a7cd60";
pub const CRAYFISH: &str = "58d2f95e-6bd5-4e3d-92d4-d741eb80bfe8";
pub const SHRIMP: &str = "0b7c5a2e-3f51-4c1f-9a0e-6d2f8e4b1c11";
pub const KRILL: &str = "c4a1e9d0-7b2f-4e58-8f3a-2d6b9c0e5f22";

pub fn build(definition: Value, mode: Mode) -> IdentificationKey {
    IdentificationKey::new(KeyDefinition::from_value(definition).unwrap(), mode).unwrap()
}

pub fn bits(flags: &[bool]) -> Vec<u8> {
    flags.iter().map(|f| *f as u8).collect()
}

pub fn names(items: &[&matrixkey::construct::Item]) -> Vec<String> {
    items.iter().map(|i| i.name().to_string()).collect()
}

/// Records every event of the given kinds, in order.
pub fn record(key: &mut IdentificationKey, kinds: &[EventKind]) -> Rc<RefCell<Vec<KeyEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in kinds {
        let sink = Rc::clone(&log);
        key.on(*kind, move |event, _| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });
    }
    log
}

pub const ALL_EVENTS: [EventKind; 9] = [
    EventKind::ValueInitialized,
    EventKind::BeforeValueSelected,
    EventKind::ValueSelected,
    EventKind::ValueDeselected,
    EventKind::ValuePossibilityChanged,
    EventKind::FilterVisibilityChanged,
    EventKind::PointsUpdated,
    EventKind::ItemComplete,
    EventKind::ResultsUpdated,
];

/// Three items, one multi-select text filter with three values and one
/// range filter, giving the incidence matrix
/// `[[1,0,1],[0,1,0],[0,0,1],[1,1,1]]`.
pub fn scenario() -> Value {
    json!({
        "name": "scenario",
        "items": [
            { "id": CRAB, "displayName": "crab", "maxPoints": 2,
              "perFilterValueRefs": {
                  "body": [{ "valueId": "a", "encodedPayload": "A" }],
                  "length": [{ "encodedPayload": [0, 3] }]
              } },
            { "id": CRAYFISH, "displayName": "crayfish", "maxPoints": 2,
              "perFilterValueRefs": {
                  "body": [{ "valueId": "b", "encodedPayload": "B" }],
                  "length": [{ "encodedPayload": [2, 4] }]
              } },
            { "id": SHRIMP, "displayName": "shrimp", "maxPoints": 3,
              "perFilterValueRefs": {
                  "body": [
                      { "valueId": "a", "encodedPayload": "A" },
                      { "valueId": "c", "encodedPayload": "C" }
                  ],
                  "length": [{ "encodedPayload": [6, 9] }]
              } }
        ],
        "filters": {
            "body": {
                "kind": "TextOnlyFilter", "name": "Body", "allowMultipleValues": true,
                "values": [
                    { "valueId": "a", "encodedPayload": "A" },
                    { "valueId": "b", "encodedPayload": "B" },
                    { "valueId": "c", "encodedPayload": "C" }
                ]
            },
            "length": { "kind": "RangeFilter", "name": "Length" }
        }
    })
}

/// Four crustaceans over five filters with weights, colors, a range and
/// restrictions. Value indices:
/// 0 legs:claws, 1 legs:plain, 2 color:red, 3 color:blue, 4 size slot,
/// 5 tail:fan, 6 tail:pointed, 7 antennae:one, 8 antennae:two.
pub fn crustaceans() -> Value {
    let claws = json!({ "valueId": "claws", "encodedPayload": "<p>with claws</p>" });
    let plain = json!({ "valueId": "plain", "encodedPayload": "<p>without claws</p>" });
    let red = json!({ "valueId": "red", "encodedPayload": [255, 0, 0, 1] });
    let blue = json!({ "valueId": "blue", "encodedPayload": [0, 0, 255, 1] });
    let fan = json!({ "valueId": "fan", "encodedPayload": "fan" });
    let pointed = json!({ "valueId": "pointed", "encodedPayload": "pointed" });
    let one = json!({ "valueId": "one", "encodedPayload": 1 });
    let two = json!({ "valueId": "two", "encodedPayload": 2 });
    json!({
        "name": "Garnelen & Kleinkrebse",
        "items": [
            { "id": CRAB, "displayName": "crab", "maxPoints": 10,
              "perFilterValueRefs": {
                  "legs": [claws], "color": [red], "size": [{ "encodedPayload": [2, 10] }],
                  "tail": [fan], "antennae": [two]
              } },
            { "id": CRAYFISH, "displayName": "crayfish", "maxPoints": 10,
              "perFilterValueRefs": {
                  "legs": [claws], "color": [red, blue], "size": [{ "encodedPayload": [5, 15] }],
                  "tail": [pointed], "antennae": [two]
              } },
            { "id": SHRIMP, "displayName": "shrimp", "maxPoints": 10,
              "perFilterValueRefs": {
                  "legs": [plain], "color": [blue], "size": [{ "encodedPayload": [1, 3] }],
                  "tail": [fan], "antennae": [one]
              } },
            { "id": KRILL, "displayName": "krill", "maxPoints": 9,
              "perFilterValueRefs": {
                  "legs": [plain], "color": [red], "antennae": [one]
              } }
        ],
        "filters": {
            "legs": {
                "kind": "DescriptiveTextAndImagesFilter", "name": "Legs", "weight": 5,
                "values": [claws, plain]
            },
            "color": {
                "kind": "ColorFilter", "name": "Color", "weight": 2, "allowMultipleValues": true,
                "values": [red, blue]
            },
            "size": { "kind": "RangeFilter", "name": "Size", "weight": 1 },
            "tail": {
                "kind": "TextOnlyFilter", "name": "Tail",
                "restrictions": { "legs": claws },
                "values": [fan, pointed]
            },
            "antennae": {
                "kind": "NumberFilter", "name": "Antennae",
                "restrictions": { "legs": [claws, plain], "color": red },
                "values": [one, two]
            }
        }
    })
}
