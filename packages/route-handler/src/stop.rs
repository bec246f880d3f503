//! Stop records and their two-pass extraction.
//!
//! A stop remembers which of its optional fields were written in the
//! source, independent of the value each field resolves to. Downstream
//! consumers use this to decide whether to apply their own defaults.

use std::collections::BTreeSet;

use bitflags::bitflags;
use serde::Serialize;

use crate::error::{AttributeError, ElementError};
use crate::types::{Attr, SumoTime, Tag};
use crate::xml::{parse_bool, AttributeView};

bitflags! {
    /// Optional stop fields that were explicitly present in the source.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StopFields: u32 {
        const ARRIVAL = 1 << 0;
        const DURATION = 1 << 1;
        const UNTIL = 1 << 2;
        const STARTED = 1 << 3;
        const ENDED = 1 << 4;
        const EXTENSION = 1 << 5;
        const END_POS = 1 << 6;
        const START_POS = 1 << 7;
        const POS_LAT = 1 << 8;
        /// Set by `triggered` and by the legacy `containerTriggered`.
        const TRIGGERED = 1 << 9;
        /// Only ever derived from a non-empty `expectedContainers`.
        const CONTAINER_TRIGGERED = 1 << 10;
        const PARKING = 1 << 11;
        const EXPECTED = 1 << 12;
        const PERMITTED = 1 << 13;
        const EXPECTED_CONTAINERS = 1 << 14;
        const TRIP_ID = 1 << 15;
        const SPLIT = 1 << 16;
        const JOIN = 1 << 17;
        const LINE = 1 << 18;
        const SPEED = 1 << 19;
    }
}

impl Serialize for StopFields {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter_names().map(|(name, _)| name))
    }
}

/// Presence bit for each source attribute, in scan order.
const PRESENCE_BITS: [(Attr, StopFields); 20] = [
    (Attr::Arrival, StopFields::ARRIVAL),
    (Attr::Duration, StopFields::DURATION),
    (Attr::Until, StopFields::UNTIL),
    (Attr::Started, StopFields::STARTED),
    (Attr::Ended, StopFields::ENDED),
    (Attr::Extension, StopFields::EXTENSION),
    (Attr::EndPos, StopFields::END_POS),
    (Attr::StartPos, StopFields::START_POS),
    (Attr::PosLat, StopFields::POS_LAT),
    (Attr::Triggered, StopFields::TRIGGERED),
    (Attr::ContainerTriggered, StopFields::TRIGGERED),
    (Attr::Parking, StopFields::PARKING),
    (Attr::Expected, StopFields::EXPECTED),
    (Attr::Permitted, StopFields::PERMITTED),
    (Attr::ExpectedContainers, StopFields::EXPECTED_CONTAINERS),
    (Attr::TripId, StopFields::TRIP_ID),
    (Attr::Split, StopFields::SPLIT),
    (Attr::Join, StopFields::JOIN),
    (Attr::Line, StopFields::LINE),
    (Attr::Speed, StopFields::SPEED),
];

/// Where a stop is inserted into its vehicle's stop list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopIndex {
    /// Append after all existing stops.
    End,
    /// Insert at the position that fits the route.
    Fit,
    /// Insert at a fixed position.
    Explicit(u32),
}

/// A fully resolved stop definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub lane: String,
    /// Also filled from the `trainStop` alias.
    pub bus_stop: String,
    pub charging_station: String,
    pub overhead_wire_segment: String,
    pub container_stop: String,
    pub parking_area: String,
    pub start_pos: Option<f64>,
    pub end_pos: Option<f64>,
    pub friendly_pos: bool,
    pub pos_lat: Option<f64>,
    pub arrival: Option<SumoTime>,
    pub duration: Option<SumoTime>,
    pub until: Option<SumoTime>,
    pub extension: Option<SumoTime>,
    pub started: Option<SumoTime>,
    pub ended: Option<SumoTime>,
    pub speed: f64,
    pub triggered: bool,
    pub container_triggered: bool,
    pub join_triggered: bool,
    pub parking: bool,
    pub awaited_persons: BTreeSet<String>,
    pub awaited_containers: BTreeSet<String>,
    pub permitted: BTreeSet<String>,
    pub trip_id: String,
    pub split: String,
    pub join: String,
    pub line: String,
    pub act_type: String,
    pub index: StopIndex,
    fields_set: StopFields,
}

impl Stop {
    /// Fields that were explicitly present in the source.
    #[must_use]
    pub fn fields_set(&self) -> StopFields {
        self.fields_set
    }

    /// Check a single presence bit.
    #[must_use]
    pub fn is_set(&self, field: StopFields) -> bool {
        self.fields_set.contains(field)
    }
}

/// Result of parsing a stop: the record plus non-fatal warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStop {
    pub stop: Stop,
    pub warnings: Vec<String>,
}

/// Scan which optional stop fields are present in the source.
#[must_use]
pub fn scan_presence(attrs: &AttributeView<'_>) -> StopFields {
    PRESENCE_BITS
        .iter()
        .filter(|(attr, _)| attrs.has(*attr))
        .fold(StopFields::empty(), |fields, (_, bit)| fields | *bit)
}

/// Diagnostic suffix naming where a stop is located.
///
/// The first non-empty stopping place wins; lane is the fallback.
fn location_suffix(stop: &Stop) -> String {
    [
        &stop.bus_stop,
        &stop.charging_station,
        &stop.overhead_wire_segment,
        &stop.container_stop,
        &stop.parking_area,
    ]
    .into_iter()
    .find(|place| !place.is_empty())
    .map(|place| format!(" at '{place}'"))
    .unwrap_or_else(|| format!(" on lane '{}'", stop.lane))
}

/// Optional time where negative values mean "unset".
fn optional_time(attrs: &AttributeView<'_>, attr: Attr) -> Result<Option<SumoTime>, AttributeError> {
    Ok(attrs
        .maybe::<SumoTime>(attr)?
        .filter(|time| !time.is_negative()))
}

/// Apply trigger tokens to the stop.
///
/// With no tokens and no duration/until/speed given, the stop waits for a
/// person.
fn apply_triggers(
    attrs: &AttributeView<'_>,
    triggers: &[String],
    expect_trigger: bool,
    stop: &mut Stop,
) -> Result<(), AttributeError> {
    if triggers.is_empty() && expect_trigger {
        stop.triggered = true;
    }
    for token in triggers {
        match token.as_str() {
            "person" => stop.triggered = true,
            "container" => stop.container_triggered = true,
            "join" => stop.join_triggered = true,
            other => match parse_bool(other) {
                Some(value) => stop.triggered = value,
                None => return Err(attrs.malformed::<Vec<String>>(Attr::Triggered, other)),
            },
        }
    }
    Ok(())
}

fn id_set(attrs: &AttributeView<'_>, attr: Attr) -> Result<BTreeSet<String>, AttributeError> {
    Ok(attrs
        .optional::<Vec<String>>(attr, Vec::new())?
        .into_iter()
        .collect())
}

/// Parse a stop definition.
///
/// # Errors
/// Attribute errors for malformed values; validation errors for a negative
/// speed, an unresolvable end condition and an invalid index.
pub fn parse_stop(attrs: &AttributeView<'_>) -> Result<ParsedStop, ElementError> {
    let tag = Tag::Stop;
    let mut warnings = Vec::new();

    let mut stop = Stop {
        lane: attrs.optional(Attr::Lane, String::new())?,
        bus_stop: attrs.optional(Attr::BusStop, String::new())?,
        charging_station: attrs.optional(Attr::ChargingStation, String::new())?,
        overhead_wire_segment: attrs.optional(Attr::OverheadWireSegment, String::new())?,
        container_stop: attrs.optional(Attr::ContainerStop, String::new())?,
        parking_area: attrs.optional(Attr::ParkingArea, String::new())?,
        start_pos: attrs.maybe(Attr::StartPos)?,
        end_pos: attrs.maybe(Attr::EndPos)?,
        friendly_pos: attrs.optional(Attr::FriendlyPos, false)?,
        pos_lat: None,
        arrival: None,
        duration: None,
        until: None,
        extension: None,
        started: None,
        ended: None,
        speed: 0.0,
        triggered: false,
        container_triggered: false,
        join_triggered: false,
        parking: false,
        awaited_persons: BTreeSet::new(),
        awaited_containers: BTreeSet::new(),
        permitted: BTreeSet::new(),
        trip_id: String::new(),
        split: String::new(),
        join: String::new(),
        line: String::new(),
        act_type: attrs.optional(Attr::ActType, String::new())?,
        index: StopIndex::End,
        fields_set: scan_presence(attrs),
    };
    stop.bus_stop = attrs.optional(Attr::TrainStop, stop.bus_stop)?;
    let suffix = location_suffix(&stop);

    stop.speed = attrs.optional(Attr::Speed, 0.0)?;
    if stop.speed < 0.0 {
        return Err(ElementError::validation(
            tag,
            None,
            format!("stop speed cannot be negative{suffix}"),
        ));
    }

    let expect_trigger =
        !attrs.has(Attr::Duration) && !attrs.has(Attr::Until) && !attrs.has(Attr::Speed);
    let mut triggers: Vec<String> = attrs.optional(Attr::Triggered, Vec::new())?;
    if attrs.optional(Attr::ContainerTriggered, false)? {
        triggers.push(Tag::Container.as_str().to_string());
    }
    apply_triggers(attrs, &triggers, expect_trigger, &mut stop)?;

    stop.arrival = optional_time(attrs, Attr::Arrival)?;
    stop.duration = optional_time(attrs, Attr::Duration)?;
    stop.until = optional_time(attrs, Attr::Until)?;
    if !expect_trigger && stop.duration.is_none() && stop.until.is_none() && stop.speed == 0.0 {
        return Err(ElementError::validation(
            tag,
            None,
            format!("invalid duration or end time{suffix}"),
        ));
    }
    stop.extension = optional_time(attrs, Attr::Extension)?;

    let parking_default =
        stop.triggered || stop.container_triggered || !stop.parking_area.is_empty();
    stop.parking = attrs.optional(Attr::Parking, parking_default)?;
    if !stop.parking_area.is_empty() && !stop.parking {
        warnings.push(format!(
            "stop at parkingArea overrides attribute 'parking'{suffix}"
        ));
        stop.parking = true;
    }

    stop.awaited_persons = id_set(attrs, Attr::Expected)?;
    if !stop.awaited_persons.is_empty() && !stop.is_set(StopFields::TRIGGERED) {
        stop.triggered = true;
        stop.fields_set |= StopFields::TRIGGERED;
        if !stop.is_set(StopFields::PARKING) {
            stop.parking = true;
        }
    }
    stop.permitted = id_set(attrs, Attr::Permitted)?;
    stop.awaited_containers = id_set(attrs, Attr::ExpectedContainers)?;
    if !stop.awaited_containers.is_empty() && !stop.is_set(StopFields::CONTAINER_TRIGGERED) {
        stop.container_triggered = true;
        stop.fields_set |= StopFields::CONTAINER_TRIGGERED;
        if !stop.is_set(StopFields::PARKING) {
            stop.parking = true;
        }
    }

    stop.trip_id = attrs.optional(Attr::TripId, String::new())?;
    stop.split = attrs.optional(Attr::Split, String::new())?;
    stop.join = attrs.optional(Attr::Join, String::new())?;
    stop.line = attrs.optional(Attr::Line, String::new())?;

    stop.index = match attrs.text(Attr::Index).map(str::trim) {
        None | Some("end") => StopIndex::End,
        Some("fit") => StopIndex::Fit,
        Some(text) => text.parse::<u32>().map(StopIndex::Explicit).map_err(|_| {
            ElementError::validation(tag, None, format!("invalid index '{text}'{suffix}"))
        })?,
    };

    stop.started = optional_time(attrs, Attr::Started)?;
    stop.ended = optional_time(attrs, Attr::Ended)?;
    stop.pos_lat = attrs.maybe(Attr::PosLat)?;

    Ok(ParsedStop { stop, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::RawAttributes;

    fn parse(pairs: &[(&str, &str)]) -> Result<ParsedStop, ElementError> {
        let raw: RawAttributes = pairs.iter().copied().collect();
        parse_stop(&AttributeView::new(Tag::Stop, &raw))
    }

    fn validation_message(result: Result<ParsedStop, ElementError>) -> String {
        match result {
            Err(ElementError::Validation { message, .. }) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_until_only() {
        let parsed = parse(&[("busStop", "bs"), ("until", "50")]).unwrap();
        let stop = parsed.stop;
        assert!(stop.is_set(StopFields::UNTIL));
        assert!(!stop.is_set(StopFields::TRIGGERED));
        assert!(!stop.triggered);
        assert_eq!(stop.until, Some(SumoTime::from_secs(50)));
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_until_with_awaited_persons_derives_trigger() {
        let stop = parse(&[("until", "50"), ("expected", "p1 p2 p1")]).unwrap().stop;
        assert!(stop.is_set(StopFields::TRIGGERED));
        assert!(stop.is_set(StopFields::EXPECTED));
        assert!(stop.triggered);
        assert!(stop.parking);
        assert_eq!(stop.awaited_persons.len(), 2);
    }

    #[test]
    fn test_explicit_trigger_false_is_kept_with_awaited_persons() {
        let stop = parse(&[("duration", "10"), ("triggered", "false"), ("expected", "p1")])
            .unwrap()
            .stop;
        assert!(stop.is_set(StopFields::TRIGGERED));
        assert!(!stop.triggered);
    }

    #[test]
    fn test_parking_area_overrides_parking() {
        let parsed = parse(&[("parkingArea", "pa"), ("parking", "false"), ("duration", "5")]).unwrap();
        assert!(parsed.stop.parking);
        assert!(parsed.stop.is_set(StopFields::PARKING));
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("at 'pa'"));
    }

    #[test]
    fn test_index_policies() {
        assert_eq!(parse(&[("index", "fit"), ("duration", "1")]).unwrap().stop.index, StopIndex::Fit);
        assert_eq!(parse(&[("index", "end"), ("duration", "1")]).unwrap().stop.index, StopIndex::End);
        assert_eq!(
            parse(&[("index", "7"), ("duration", "1")]).unwrap().stop.index,
            StopIndex::Explicit(7)
        );
        assert_eq!(parse(&[("duration", "1")]).unwrap().stop.index, StopIndex::End);
        assert!(validation_message(parse(&[("index", "-1"), ("duration", "1")])).contains("invalid index"));
        assert!(validation_message(parse(&[("index", "abc"), ("duration", "1")])).contains("invalid index"));
    }

    #[test]
    fn test_negative_speed() {
        let message = validation_message(parse(&[("speed", "-2"), ("lane", "e_0")]));
        assert_eq!(message, "stop speed cannot be negative on lane 'e_0'");
    }

    #[test]
    fn test_duration_with_unset_until() {
        let stop = parse(&[("duration", "30"), ("until", "-1")]).unwrap().stop;
        assert_eq!(stop.duration, Some(SumoTime::from_secs(30)));
        assert_eq!(stop.until, None);
        assert!(stop.is_set(StopFields::DURATION | StopFields::UNTIL));
    }

    #[test]
    fn test_unresolved_end_condition() {
        let message = validation_message(parse(&[("until", "-1"), ("busStop", "bs")]));
        assert_eq!(message, "invalid duration or end time at 'bs'");
    }

    #[test]
    fn test_expected_trigger_without_times() {
        let stop = parse(&[("busStop", "bs")]).unwrap().stop;
        assert!(stop.triggered);
        assert!(stop.parking);
        assert!(!stop.is_set(StopFields::TRIGGERED));
    }

    #[test]
    fn test_train_stop_alias_and_legacy_container_trigger() {
        let stop = parse(&[("trainStop", "ts"), ("containerTriggered", "true")])
            .unwrap()
            .stop;
        assert_eq!(stop.bus_stop, "ts");
        assert!(stop.container_triggered);
        assert!(stop.is_set(StopFields::TRIGGERED));
        assert!(!stop.is_set(StopFields::CONTAINER_TRIGGERED));
    }

    #[test]
    fn test_trigger_tokens() {
        let stop = parse(&[("triggered", "person join"), ("duration", "3")]).unwrap().stop;
        assert!(stop.triggered);
        assert!(stop.join_triggered);
        assert!(parse(&[("triggered", "sometimes")]).unwrap_err().is_attribute_error());
    }

    #[test]
    fn test_awaited_containers_derive_container_bit() {
        let stop = parse(&[("duration", "3"), ("expectedContainers", "c1")]).unwrap().stop;
        assert!(stop.container_triggered);
        assert!(stop.is_set(StopFields::CONTAINER_TRIGGERED));
        assert!(stop.parking);
    }

    #[test]
    fn test_location_suffix_priority() {
        let message = validation_message(parse(&[
            ("speed", "-1"),
            ("chargingStation", "cs"),
            ("parkingArea", "pa"),
        ]));
        assert!(message.ends_with(" at 'cs'"));
    }
}
