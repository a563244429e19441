//! Structured snapshot (`ui_data`) returned by the backend, and the facts derived from it.
//!
//! The schema belongs to the backend. Fields are read through accessors that return
//! `Option`/empty defaults, so a missing or oddly typed field means "not known yet".

use serde_json::{Map, Value};

use crate::step::{CurrentStep, Step};

/// Open key/value snapshot. Key order follows the server payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiData(Map<String, Value>);

/// Network zones recorded for a center: either free text or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Zones {
    Text(String),
    List(Vec<String>),
    Missing,
}

impl Zones {
    fn from_value(v: Option<&Value>) -> Self {
        match v {
            Some(Value::String(s)) => Zones::Text(s.clone()),
            Some(Value::Array(items)) => Zones::List(
                items
                    .iter()
                    .filter_map(|z| z.as_str().map(String::from))
                    .collect(),
            ),
            _ => Zones::Missing,
        }
    }

    /// Display form: list entries joined with ", ", text verbatim.
    pub fn display(&self) -> String {
        match self {
            Zones::Text(s) => s.clone(),
            Zones::List(items) => items.join(", "),
            Zones::Missing => String::new(),
        }
    }
}

/// One entry of `center_networks`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CenterNetwork {
    pub center: String,
    pub zones: Zones,
}

/// Which center is being elaborated during the networks step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CenterCursor {
    pub index: u64,
    pub total: u64,
}

impl CenterCursor {
    /// `round(100 * (index + 1) / total)`. Not clamped; an out-of-range index saturates
    /// instead of overflowing.
    pub fn percent(&self) -> u32 {
        (self.index.saturating_add(1) as f64 * 100.0 / self.total as f64).round() as u32
    }

    /// One-based position, e.g. (2, 4).
    pub fn position(&self) -> (u64, u64) {
        (self.index.saturating_add(1), self.total)
    }
}

/// Facts derived from a snapshot and the current step; computed, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotFacts {
    pub corporation_known: bool,
    pub centers_known: bool,
    pub networks_complete: bool,
    pub cursor: Option<CenterCursor>,
    pub scope_detail_complete: bool,
}

impl UiData {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Snapshot from an optional payload value; anything but an object is treated as empty.
    pub fn from_value(value: Option<Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Self(map),
            Some(other) => {
                log::debug!("ignoring non-object ui_data: {}", other);
                Self::default()
            }
            None => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Corporation name when present and non-empty.
    pub fn corporation(&self) -> Option<&str> {
        self.0
            .get("corporation")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Center names in server order (non-string entries skipped).
    pub fn centers(&self) -> Vec<&str> {
        self.0
            .get("centers")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Recorded network info per center, in the record's key order.
    pub fn center_networks(&self) -> Vec<CenterNetwork> {
        self.0
            .get("center_networks")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(center, info)| CenterNetwork {
                        center: center.clone(),
                        zones: Zones::from_value(info.get("zones")),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Keyed by center name: entries for names outside `centers` never count toward completion.
    fn has_network_info(&self, center: &str) -> bool {
        self.0
            .get("center_networks")
            .and_then(Value::as_object)
            .map(|obj| obj.contains_key(center))
            .unwrap_or(false)
    }

    /// Name of the center currently being processed, when non-empty.
    pub fn current_center(&self) -> Option<&str> {
        self.0
            .get("current_center")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// `(current_index, total_centers)` when the index is a non-negative integer and the total positive.
    pub fn cursor(&self) -> Option<CenterCursor> {
        let index = self.0.get("current_index").and_then(Value::as_u64)?;
        let total = self
            .0
            .get("total_centers")
            .and_then(Value::as_u64)
            .filter(|t| *t > 0)?;
        Some(CenterCursor { index, total })
    }

    pub fn facts(&self, step: &CurrentStep) -> SnapshotFacts {
        let centers = self.centers();
        let centers_known = !centers.is_empty();
        SnapshotFacts {
            corporation_known: self.corporation().is_some(),
            centers_known,
            networks_complete: centers_known && centers.iter().all(|c| self.has_network_info(c)),
            cursor: self.cursor(),
            scope_detail_complete: step.is_past(Step::ScopeDetail),
        }
    }
}

impl From<Map<String, Value>> for UiData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap(v: Value) -> UiData {
        UiData::from_value(Some(v))
    }

    #[test]
    fn missing_fields_are_absent_facts() {
        let facts = UiData::default().facts(&CurrentStep::default());
        assert!(!facts.corporation_known);
        assert!(!facts.centers_known);
        assert!(!facts.networks_complete);
        assert_eq!(facts.cursor, None);
        assert!(!facts.scope_detail_complete);
    }

    #[test]
    fn wrongly_typed_fields_are_ignored() {
        let s = snap(json!({
            "corporation": 7,
            "centers": "AWS",
            "center_networks": [],
            "current_index": -1,
            "total_centers": "4"
        }));
        assert_eq!(s.corporation(), None);
        assert!(s.centers().is_empty());
        assert!(s.center_networks().is_empty());
        assert_eq!(s.cursor(), None);
        assert!(UiData::from_value(Some(json!("nope"))).is_empty());
    }

    #[test]
    fn empty_corporation_is_unknown() {
        assert_eq!(snap(json!({ "corporation": "" })).corporation(), None);
        assert_eq!(snap(json!({ "corporation": null })).corporation(), None);
        assert_eq!(snap(json!({ "corporation": "은행" })).corporation(), Some("은행"));
    }

    #[test]
    fn networks_complete_when_every_center_has_zones() {
        let step = CurrentStep::known(Step::Networks);
        let partial = snap(json!({
            "centers": ["AWS", "의왕"],
            "center_networks": { "AWS": { "zones": ["내부망"] } }
        }));
        assert!(!partial.facts(&step).networks_complete);

        let full = snap(json!({
            "centers": ["AWS", "의왕"],
            "center_networks": {
                "AWS": { "zones": ["내부망"] },
                "의왕": { "zones": "내부망, DMZ망" }
            }
        }));
        assert!(full.facts(&step).networks_complete);

        let no_centers = snap(json!({ "centers": [], "center_networks": {} }));
        assert!(!no_centers.facts(&step).networks_complete);
    }

    #[test]
    fn zones_display_joins_lists() {
        let s = snap(json!({
            "center_networks": {
                "의왕": { "zones": ["내부망", "DMZ망", "대외망"] },
                "AWS": { "zones": "VPC" },
                "안성": {}
            }
        }));
        let nets = s.center_networks();
        assert_eq!(nets.len(), 3);
        assert_eq!(nets[0].center, "의왕");
        assert_eq!(nets[0].zones.display(), "내부망, DMZ망, 대외망");
        assert_eq!(nets[1].zones, Zones::Text("VPC".to_string()));
        assert_eq!(nets[2].zones, Zones::Missing);
    }

    #[test]
    fn cursor_percent() {
        let s = snap(json!({ "current_index": 2, "total_centers": 4 }));
        let c = s.cursor().unwrap();
        assert_eq!(c.percent(), 75);
        assert_eq!(c.position(), (3, 4));
        assert_eq!(CenterCursor { index: 3, total: 4 }.percent(), 100);
        assert_eq!(CenterCursor { index: 0, total: 3 }.percent(), 33);
        assert_eq!(CenterCursor { index: 1, total: 3 }.percent(), 67);
    }

    #[test]
    fn zero_total_has_no_cursor() {
        let s = snap(json!({ "current_index": 0, "total_centers": 0 }));
        assert_eq!(s.cursor(), None);
    }

    #[test]
    fn huge_index_does_not_overflow() {
        let s = snap(json!({ "current_index": u64::MAX, "total_centers": 4 }));
        let c = s.cursor().unwrap();
        assert_eq!(c.position(), (u64::MAX, 4));
        assert!(c.percent() > 100);
    }

    #[test]
    fn unrelated_network_keys_do_not_complete_networks() {
        let s = snap(json!({
            "centers": ["AWS", "의왕"],
            "center_networks": {
                "AWS": { "zones": ["VPC"] },
                "안성": { "zones": ["내부망"] }
            }
        }));
        assert!(!s.facts(&CurrentStep::known(Step::Networks)).networks_complete);
    }

    #[test]
    fn scope_detail_complete_only_past_scope_detail() {
        let s = UiData::default();
        assert!(!s.facts(&CurrentStep::known(Step::ScopeDetail)).scope_detail_complete);
        assert!(s.facts(&CurrentStep::known(Step::Edges)).scope_detail_complete);
        assert!(s.facts(&CurrentStep::known(Step::Done)).scope_detail_complete);
        assert!(!s.facts(&CurrentStep::from_server("error")).scope_detail_complete);
    }
}
