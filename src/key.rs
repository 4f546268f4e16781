//! The identification key: owns filters, values, items and the selection,
//! and recomputes everything derived from the selection after each change.

use std::collections::HashMap;

use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::construct::{Filter, Item, OtherHasher, Space, ValueRef};
use crate::definition::{FilterDefinition, ItemDefinition, KeyDefinition};
use crate::error::{KeyError, Result};
use crate::events::{EventBus, EventKind, KeyEvent, ListenerId, ListenerResult};
use crate::incidence::Incidence;
use crate::payload::{Auxiliary, Interval};
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Only items consistent with every selection are results.
    #[default]
    #[serde(alias = "exclusionCriterion")]
    Strict,
    /// Every item is a result, ranked by how much of the selection it matches.
    #[serde(alias = "ranking")]
    Fluid,
}

// Rows standing in for the stored ones while a change is being evaluated.
type Overlay = Vec<(usize, RoaringBitmap)>;

// Everything that is a pure function of the selection and the incidence rows.
#[derive(Debug, Clone, PartialEq)]
struct Derived {
    possible_items: Vec<bool>,
    possible_values: Vec<bool>,
    visible_filters: Vec<bool>,
    scores: Vec<f64>,
    anti_scores: Vec<f64>,
}

#[derive(Debug)]
pub struct IdentificationKey {
    name: Option<String>,
    mode: Mode,
    filters: Vec<Filter>,
    spaces: Vec<Space>,
    items: Vec<Item>,
    incidence: Incidence,
    // per range slot, the items declaring any interval for its filter
    range_baselines: HashMap<usize, RoaringBitmap, OtherHasher>,
    // per filter, groups of value indices; one of each group must be selected
    restrictions: Vec<Vec<Vec<usize>>>,
    selected: Vec<bool>,
    derived: Derived,
    filter_lookup: HashMap<String, usize, OtherHasher>,
    space_lookup: HashMap<String, usize, OtherHasher>,
    item_lookup: HashMap<Uuid, usize, OtherHasher>,
    bus: EventBus,
}

impl IdentificationKey {
    pub fn new(definition: KeyDefinition, mode: Mode) -> Result<Self> {
        let settings = Settings {
            mode,
            ..Settings::default()
        };
        let definition = KeyDefinition {
            mode: Some(mode),
            ..definition
        };
        Self::with_settings(definition, &settings, EventBus::new())
    }

    /// Builds a key with listeners already attached, so that they observe
    /// the `valueInitialized` notifications. The mode named by the definition
    /// wins over the configured one.
    pub fn with_settings(definition: KeyDefinition, settings: &Settings, bus: EventBus) -> Result<Self> {
        let KeyDefinition {
            name,
            mode,
            items: item_definitions,
            filters: filter_definitions,
        } = definition;
        let mode = mode.unwrap_or(settings.mode);

        let mut filters = Vec::with_capacity(filter_definitions.len());
        let mut spaces = Vec::new();
        let mut filter_lookup = HashMap::<String, usize, OtherHasher>::default();
        let mut space_lookup = HashMap::<String, usize, OtherHasher>::default();
        for (k, (filter_id, definition)) in filter_definitions.iter().enumerate() {
            if filter_lookup.insert(filter_id.clone(), k).is_some() {
                return Err(KeyError::Invariant(format!("filter {} is defined twice", filter_id)));
            }
            let filter = build_filter(filter_id, definition, k, &mut spaces, &mut space_lookup)?;
            filters.push(filter);
        }

        let mut items = Vec::with_capacity(item_definitions.len());
        let mut item_lookup = HashMap::<Uuid, usize, OtherHasher>::default();
        for (j, definition) in item_definitions.into_iter().enumerate() {
            if item_lookup.insert(definition.id, j).is_some() {
                return Err(KeyError::Invariant(format!("item {} is defined twice", definition.id)));
            }
            items.push(build_item(definition, j, &filters, &spaces, &filter_lookup, settings)?);
        }

        let mut incidence = Incidence::new(spaces.len(), items.len())?;
        let mut range_baselines = HashMap::<usize, RoaringBitmap, OtherHasher>::default();
        for filter in &filters {
            for &i in filter.spaces() {
                let space = &spaces[i];
                for (j, item) in items.iter().enumerate() {
                    let declared = item.references(filter.id());
                    let hit = if filter.is_range() {
                        !declared.is_empty()
                    } else {
                        declared.iter().any(|r| filter.matches(space, r))
                    };
                    if hit {
                        incidence.set(i, j as u32);
                    }
                }
                if filter.is_range() {
                    range_baselines.insert(i, incidence.row(i).clone());
                }
            }
        }

        let mut restrictions = Vec::with_capacity(filters.len());
        for (filter_id, definition) in &filter_definitions {
            restrictions.push(resolve_restrictions(filter_id, definition, &filters, &spaces, &filter_lookup)?);
        }

        let mut key = Self {
            name,
            mode,
            derived: Derived {
                possible_items: vec![true; items.len()],
                possible_values: vec![true; spaces.len()],
                visible_filters: vec![true; filters.len()],
                scores: vec![0.0; items.len()],
                anti_scores: vec![0.0; items.len()],
            },
            selected: vec![false; spaces.len()],
            filters,
            spaces,
            items,
            incidence,
            range_baselines,
            restrictions,
            filter_lookup,
            space_lookup,
            item_lookup,
            bus,
        };
        key.derived = key.derive(&key.selected, &Overlay::new());
        info!(
            name = key.name.as_deref().unwrap_or(""),
            mode = ?key.mode,
            filters = key.filters.len(),
            values = key.spaces.len(),
            items = key.items.len(),
            "identification key built"
        );

        let initialized: Vec<KeyEvent> = (0..key.spaces.len())
            .map(|index| KeyEvent::ValueInitialized { index })
            .collect();
        key.emit(&initialized)?;
        Ok(key)
    }

    pub fn from_json(json: &str, mode: Mode) -> Result<Self> {
        Self::new(KeyDefinition::from_json(json)?, mode)
    }

    // ------------- Listeners -------------
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&KeyEvent, &IdentificationKey) -> ListenerResult + 'static,
    {
        self.bus.on(kind, listener)
    }
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.bus.off(id)
    }

    fn emit(&mut self, events: &[KeyEvent]) -> Result<()> {
        // the bus is lent out so listeners can read the key while it runs
        let mut bus = std::mem::take(&mut self.bus);
        let outcome = bus.dispatch(events, self);
        self.bus = bus;
        outcome
    }

    // ------------- Selection -------------
    /// Selects a value. Returns whether the selection changed; selecting a
    /// value that is already selected or currently impossible changes nothing.
    ///
    /// A range filter's slot must be given its interval as the payload, and
    /// only range slots accept one.
    pub fn select_value(&mut self, index: usize, payload: Option<Auxiliary>) -> Result<bool> {
        self.check_index(index)?;
        let filter = &self.filters[self.spaces[index].filter()];
        let interval = match (filter.is_range(), payload.as_ref().and_then(Auxiliary::as_interval)) {
            (true, Some(interval)) => Some(*interval),
            (true, None) => {
                return Err(KeyError::TypeMismatch {
                    filter: filter.id().to_string(),
                    expected: "interval",
                    found: "no interval".to_string(),
                });
            }
            (false, Some(interval)) => {
                return Err(KeyError::TypeMismatch {
                    filter: filter.id().to_string(),
                    expected: "discrete value",
                    found: format!("interval {}", interval),
                });
            }
            (false, None) => None,
        };

        self.emit(&[KeyEvent::BeforeValueSelected {
            index,
            payload: payload.clone(),
        }])?;
        if self.selected[index] {
            return Ok(false);
        }

        let mut overlay = Overlay::new();
        if let Some(interval) = interval {
            overlay.push((index, self.overlap_row(index, interval)));
        }
        let siblings = self.selected_siblings(index);

        let mut next = self.selected.clone();
        for &s in &siblings {
            next[s] = false;
        }
        let surviving = self.surviving(&next, &overlay);
        if row_of(&self.incidence, &overlay, index).is_disjoint(&surviving) {
            debug!(index, "value impossible, selection ignored");
            return Ok(false);
        }
        next[index] = true;
        let derived = self.derive(&next, &overlay);

        // commit
        for (slot, row) in overlay {
            self.incidence.replace_row(slot, row);
        }
        if let Some(interval) = interval {
            self.activate_range(index, interval);
        }
        self.selected = next;
        let previous = std::mem::replace(&mut self.derived, derived);

        let mut events: Vec<KeyEvent> = siblings
            .into_iter()
            .map(|index| KeyEvent::ValueDeselected { index, payload: None })
            .collect();
        events.push(KeyEvent::ValueSelected { index, payload });
        events.extend(self.changes(&previous));
        self.emit(&events)?;
        Ok(true)
    }

    /// Deselects a value. Returns false if it was not selected.
    pub fn deselect_value(&mut self, index: usize, payload: Option<Auxiliary>) -> Result<bool> {
        self.check_index(index)?;
        if !self.selected[index] {
            return Ok(false);
        }
        let mut next = self.selected.clone();
        next[index] = false;
        let overlay: Overlay = self
            .range_baselines
            .get(&index)
            .map(|baseline| vec![(index, baseline.clone())])
            .unwrap_or_default();
        let derived = self.derive(&next, &overlay);

        // commit
        for (slot, row) in overlay {
            self.incidence.replace_row(slot, row);
            self.deactivate_range(slot);
        }
        self.selected = next;
        let previous = std::mem::replace(&mut self.derived, derived);

        let mut events = vec![KeyEvent::ValueDeselected { index, payload }];
        events.extend(self.changes(&previous));
        self.emit(&events)?;
        Ok(true)
    }

    /// Sets the interval of a range filter, replacing the active one.
    /// Setting the interval that is already active does nothing.
    pub fn select_range(&mut self, filter_id: &str, min: f64, max: f64) -> Result<bool> {
        let interval = Interval::new(min, max)?;
        let slot = self.range_slot(filter_id)?;
        let filter = &self.filters[self.spaces[slot].filter()];
        if filter.current() == Some(interval) {
            return Ok(false);
        }
        let previous = filter.current();
        let deselected = if self.selected[slot] {
            self.deselect_value(slot, previous.map(Auxiliary::Interval))?
        } else {
            false
        };
        let selected = self.select_value(slot, Some(Auxiliary::Interval(interval)))?;
        Ok(deselected || selected)
    }

    /// Drops the active interval of a range filter, if any.
    pub fn clear_range(&mut self, filter_id: &str) -> Result<bool> {
        let slot = self.range_slot(filter_id)?;
        let previous = self.filters[self.spaces[slot].filter()].current();
        self.deselect_value(slot, previous.map(Auxiliary::Interval))
    }

    /// Clears every selection in one pass.
    pub fn reset(&mut self) -> Result<bool> {
        let cleared: Vec<usize> = (0..self.selected.len()).filter(|&i| self.selected[i]).collect();
        if cleared.is_empty() {
            return Ok(false);
        }
        let payloads: Vec<Option<Auxiliary>> = cleared
            .iter()
            .map(|&i| self.filters[self.spaces[i].filter()].current().map(Auxiliary::Interval))
            .collect();
        let next = vec![false; self.selected.len()];
        let overlay: Overlay = cleared
            .iter()
            .filter_map(|i| self.range_baselines.get(i).map(|b| (*i, b.clone())))
            .collect();
        let derived = self.derive(&next, &overlay);

        // commit
        for (slot, row) in overlay {
            self.incidence.replace_row(slot, row);
            self.deactivate_range(slot);
        }
        self.selected = next;
        let previous = std::mem::replace(&mut self.derived, derived);

        let mut events: Vec<KeyEvent> = cleared
            .into_iter()
            .zip(payloads)
            .map(|(index, payload)| KeyEvent::ValueDeselected { index, payload })
            .collect();
        events.extend(self.changes(&previous));
        self.emit(&events)?;
        Ok(true)
    }

    // selected values of the same single-select filter, which a selection replaces
    fn selected_siblings(&self, index: usize) -> Vec<usize> {
        let filter = &self.filters[self.spaces[index].filter()];
        if filter.allow_multiple() {
            return Vec::new();
        }
        filter
            .spaces()
            .iter()
            .copied()
            .filter(|&s| s != index && self.selected[s])
            .collect()
    }

    // ------------- Propagation -------------
    fn surviving(&self, selected: &[bool], overlay: &Overlay) -> RoaringBitmap {
        self.incidence.matching_all(
            selected
                .iter()
                .enumerate()
                .filter(|(_, s)| **s)
                .map(|(i, _)| row_of(&self.incidence, overlay, i)),
        )
    }

    fn derive(&self, selected: &[bool], overlay: &Overlay) -> Derived {
        let surviving = self.surviving(selected, overlay);
        let possible_items = (0..self.items.len() as u32)
            .map(|j| surviving.contains(j))
            .collect();
        let possible_values = selected
            .iter()
            .enumerate()
            .map(|(i, s)| *s || !row_of(&self.incidence, overlay, i).is_disjoint(&surviving))
            .collect();
        let visible_filters = self
            .restrictions
            .iter()
            .map(|groups| groups.iter().all(|group| group.iter().any(|&v| selected[v])))
            .collect();

        let mut scores = vec![0.0; self.items.len()];
        let mut total = 0.0;
        for (i, _) in selected.iter().enumerate().filter(|(_, s)| **s) {
            let weight = self.filters[self.spaces[i].filter()].weight();
            total += weight;
            for j in row_of(&self.incidence, overlay, i) {
                scores[j as usize] += weight;
            }
        }
        let anti_scores = scores.iter().map(|score| total - score).collect();

        debug!(
            selected = selected.iter().filter(|s| **s).count(),
            possible = surviving.len(),
            "possibilities computed"
        );
        Derived {
            possible_items,
            possible_values,
            visible_filters,
            scores,
            anti_scores,
        }
    }

    // notifications for whatever flipped between two derived states
    fn changes(&self, previous: &Derived) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        for (index, (was, is)) in previous
            .possible_values
            .iter()
            .zip(&self.derived.possible_values)
            .enumerate()
        {
            if was != is {
                events.push(KeyEvent::ValuePossibilityChanged { index, possible: *is });
            }
        }
        for (filter, (was, is)) in previous
            .visible_filters
            .iter()
            .zip(&self.derived.visible_filters)
            .enumerate()
        {
            if was != is {
                events.push(KeyEvent::FilterVisibilityChanged { filter, visible: *is });
            }
        }
        for (item, (was, is)) in previous.scores.iter().zip(&self.derived.scores).enumerate() {
            if was != is {
                let confidence = self.ratio(item);
                events.push(KeyEvent::PointsUpdated {
                    item,
                    points: *is,
                    max_points: self.items[item].max_points(),
                    confidence,
                });
                if confidence >= 1.0 {
                    events.push(KeyEvent::ItemComplete { item });
                }
            }
        }
        events.push(KeyEvent::ResultsUpdated {
            count: self.result_count(),
        });
        events
    }

    // ------------- Range slots -------------
    fn range_slot(&self, filter_id: &str) -> Result<usize> {
        let filter = &self.filters[self.filter_index(filter_id)?];
        match (filter.is_range(), filter.spaces().first()) {
            (true, Some(slot)) => Ok(*slot),
            (true, None) => Err(KeyError::Invariant(format!("range filter {} has no slot", filter_id))),
            (false, _) => Err(KeyError::TypeMismatch {
                filter: filter_id.to_string(),
                expected: "range filter",
                found: filter.kind().to_string(),
            }),
        }
    }

    fn overlap_row(&self, slot: usize, interval: Interval) -> RoaringBitmap {
        let filter = &self.filters[self.spaces[slot].filter()];
        let mut candidate = self.spaces[slot].clone();
        candidate.activate(filter.id(), interval);
        self.items
            .iter()
            .filter(|item| item.references(filter.id()).iter().any(|r| filter.matches(&candidate, r)))
            .map(|item| item.index() as u32)
            .collect()
    }

    fn activate_range(&mut self, slot: usize, interval: Interval) {
        let k = self.spaces[slot].filter();
        let filter = &mut self.filters[k];
        filter.set_current(Some(interval));
        self.spaces[slot].activate(filter.id(), interval);
    }

    fn deactivate_range(&mut self, slot: usize) {
        let k = self.spaces[slot].filter();
        let filter = &mut self.filters[k];
        filter.set_current(None);
        self.spaces[slot].deactivate(filter.id());
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.spaces.len() {
            return Err(KeyError::IndexOutOfRange {
                index,
                len: self.spaces.len(),
            });
        }
        Ok(())
    }

    // ------------- Results -------------
    /// Strict: the possible items in input order. Fluid: every item, by
    /// descending confidence, ties kept in input order.
    pub fn results(&self) -> Vec<&Item> {
        match self.mode {
            Mode::Strict => self
                .items
                .iter()
                .filter(|item| self.derived.possible_items[item.index()])
                .collect(),
            Mode::Fluid => self.ranked(self.items.iter().collect()),
        }
    }

    /// The excluded items, by descending confidence.
    pub fn impossible_results(&self) -> Vec<&Item> {
        self.ranked(
            self.items
                .iter()
                .filter(|item| !self.derived.possible_items[item.index()])
                .collect(),
        )
    }

    fn result_count(&self) -> usize {
        match self.mode {
            Mode::Strict => self.derived.possible_items.iter().filter(|p| **p).count(),
            Mode::Fluid => self.items.len(),
        }
    }

    fn ranked<'a>(&self, mut items: Vec<&'a Item>) -> Vec<&'a Item> {
        // sort_by is stable
        items.sort_by(|a, b| self.ratio(b.index()).total_cmp(&self.ratio(a.index())));
        items
    }

    /// Matched points over achievable points, 0 when nothing is achievable.
    /// `None` for an unknown item index.
    pub fn confidence(&self, item: usize) -> Option<f64> {
        self.items.get(item).map(|_| self.ratio(item))
    }

    fn ratio(&self, item: usize) -> f64 {
        let max_points = self.items[item].max_points();
        if max_points > 0.0 {
            self.derived.scores[item] / max_points
        } else {
            0.0
        }
    }

    // ------------- Accessors -------------
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn mode(&self) -> Mode {
        self.mode
    }
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }
    pub fn filter(&self, index: usize) -> Option<&Filter> {
        self.filters.get(index)
    }
    pub fn filter_index(&self, filter_id: &str) -> Result<usize> {
        self.filter_lookup
            .get(filter_id)
            .copied()
            .ok_or_else(|| KeyError::UnknownFilter(filter_id.to_string()))
    }
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }
    pub fn space(&self, index: usize) -> Option<&Space> {
        self.spaces.get(index)
    }
    /// Looks a value up by its composite `<filter-id>:<value-id>` identifier.
    /// A range slot answers to its current identifier only.
    pub fn value_index(&self, space_id: &str) -> Option<usize> {
        self.space_lookup
            .get(space_id)
            .copied()
            .filter(|&i| self.spaces[i].id().as_str() == space_id)
            .or_else(|| self.spaces.iter().position(|s| s.id().as_str() == space_id))
    }
    pub fn items(&self) -> &[Item] {
        &self.items
    }
    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }
    pub fn item_index(&self, id: &Uuid) -> Option<usize> {
        self.item_lookup.get(id).copied()
    }
    pub fn incidence(&self) -> &Incidence {
        &self.incidence
    }
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }
    pub fn selection(&self) -> &[bool] {
        &self.selected
    }
    pub fn selected_values(&self) -> Vec<usize> {
        (0..self.selected.len()).filter(|&i| self.selected[i]).collect()
    }
    pub fn possible_items(&self) -> &[bool] {
        &self.derived.possible_items
    }
    /// Values that are selected or still carried by a surviving item.
    ///
    /// The other values of a single-select filter that has a selection are
    /// judged against the current selection, so they can read `false` and
    /// still be accepted by [`Self::select_value`] as a replacement. See
    /// [`Self::selectable_values`] for what a selection call would accept.
    pub fn possible_values(&self) -> &[bool] {
        &self.derived.possible_values
    }
    /// Like [`Self::possible_values`], but single-select siblings are judged
    /// with their filter's selection removed, as a replacing selection is.
    pub fn selectable_values(&self) -> Vec<bool> {
        (0..self.spaces.len()).map(|i| self.selectable(i)).collect()
    }
    fn selectable(&self, index: usize) -> bool {
        if self.derived.possible_values[index] {
            return true;
        }
        let siblings = self.selected_siblings(index);
        if siblings.is_empty() {
            return false;
        }
        let mut next = self.selected.clone();
        for s in siblings {
            next[s] = false;
        }
        !self
            .incidence
            .row(index)
            .is_disjoint(&self.surviving(&next, &Overlay::new()))
    }
    pub fn visible_filters(&self) -> &[bool] {
        &self.derived.visible_filters
    }
    pub fn scores(&self) -> &[f64] {
        &self.derived.scores
    }
    pub fn anti_scores(&self) -> &[f64] {
        &self.derived.anti_scores
    }
    pub fn score_map(&self) -> HashMap<Uuid, f64> {
        self.items
            .iter()
            .map(|item| (item.id(), self.derived.scores[item.index()]))
            .collect()
    }
}

fn row_of<'a>(incidence: &'a Incidence, overlay: &'a Overlay, value: usize) -> &'a RoaringBitmap {
    overlay
        .iter()
        .find(|(slot, _)| *slot == value)
        .map(|(_, row)| row)
        .unwrap_or_else(|| incidence.row(value))
}

// ------------- Construction helpers -------------
fn build_filter(
    filter_id: &str,
    definition: &FilterDefinition,
    k: usize,
    spaces: &mut Vec<Space>,
    space_lookup: &mut HashMap<String, usize, OtherHasher>,
) -> Result<Filter> {
    let mut filter = Filter::new(
        filter_id.to_string(),
        definition.name.clone(),
        definition.description.clone(),
        definition.kind,
        definition.weight,
        definition.allow_multiple_values,
        k,
    )?;
    if filter.is_range() {
        if !definition.values.is_empty() {
            warn!(filter = filter_id, "range filter values ignored, intervals are selected directly");
        }
        let index = spaces.len();
        let slot = Space::range_slot(filter_id, k, index);
        space_lookup.insert(slot.id().to_string(), index);
        spaces.push(slot);
        filter.own(index);
        return Ok(filter);
    }
    for value in &definition.values {
        let value_id = value.value_id.clone().ok_or_else(|| KeyError::MissingIdentifier {
            filter: filter_id.to_string(),
        })?;
        let payload = definition.kind.decode(filter_id, &value.encoded_payload)?;
        let index = spaces.len();
        let space = Space::new(filter_id, value_id, payload, k, index, value.media.clone());
        if space_lookup.insert(space.id().to_string(), index).is_some() {
            return Err(KeyError::DuplicateValue {
                filter: filter_id.to_string(),
                value: space.value_id().to_string(),
            });
        }
        spaces.push(space);
        filter.own(index);
    }
    Ok(filter)
}

fn build_item(
    definition: ItemDefinition,
    j: usize,
    filters: &[Filter],
    spaces: &[Space],
    filter_lookup: &HashMap<String, usize, OtherHasher>,
    settings: &Settings,
) -> Result<Item> {
    let mut space = HashMap::<String, Vec<ValueRef>, OtherHasher>::default();
    for (filter_id, references) in &definition.per_filter_value_refs {
        let Some(&k) = filter_lookup.get(filter_id) else {
            if settings.strict_payloads {
                return Err(KeyError::UnknownFilter(filter_id.clone()));
            }
            warn!(item = %definition.id, filter = %filter_id, "reference to unknown filter skipped");
            continue;
        };
        let mut resolved = Vec::with_capacity(references.len());
        for reference in references {
            match filters[k].resolve(spaces, reference) {
                Ok(value) => resolved.push(value),
                Err(KeyError::UnknownValue { filter, value }) if !settings.strict_payloads => {
                    warn!(item = %definition.id, %filter, %value, "reference to unknown value skipped");
                }
                Err(e) => return Err(e),
            }
        }
        space.entry(filter_id.clone()).or_default().extend(resolved);
    }
    Ok(Item::new(
        definition.id,
        definition.display_name,
        j,
        definition.max_points,
        space,
        definition.display,
    ))
}

fn resolve_restrictions(
    filter_id: &str,
    definition: &FilterDefinition,
    filters: &[Filter],
    spaces: &[Space],
    filter_lookup: &HashMap<String, usize, OtherHasher>,
) -> Result<Vec<Vec<usize>>> {
    let mut groups = Vec::with_capacity(definition.restrictions.len());
    for (restricting_id, restriction) in &definition.restrictions {
        let restricting = &filters[*filter_lookup
            .get(restricting_id)
            .ok_or_else(|| KeyError::UnknownFilter(restricting_id.clone()))?];
        let mut group = Vec::new();
        for reference in restriction.references() {
            let value = restricting.resolve(spaces, reference)?;
            let index = if restricting.is_range() {
                restricting.spaces().first().copied()
            } else {
                restricting
                    .spaces()
                    .iter()
                    .copied()
                    .find(|&i| restricting.matches(&spaces[i], &value))
            };
            group.push(index.ok_or_else(|| KeyError::UnknownValue {
                filter: restricting_id.clone(),
                value: value.payload().to_string(),
            })?);
        }
        group.sort_unstable();
        group.dedup();
        if group.is_empty() {
            warn!(filter = filter_id, restricting = %restricting_id, "empty restriction group ignored");
            continue;
        }
        groups.push(group);
    }
    Ok(groups)
}
