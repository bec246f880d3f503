//! Vehicle parameter records for vehicles, trips, flows, persons and containers.
//!
//! Placement attributes (`departLane`, `departPos`, ...) accept either a
//! concrete value or one of a fixed set of keywords; each is modeled as an
//! enum with a `Given` variant.

use std::fmt;

use serde::Serialize;

use crate::config::HandlerConfig;
use crate::error::ElementError;
use crate::types::{Attr, Color, SumoTime, Tag};
use crate::xml::{AttributeView, FromAttribute};

/// Define a placement enum with a `Given(T)` variant plus keyword variants.
macro_rules! placement {
    ($(#[$meta:meta])* $name:ident($given:ty) { $($variant:ident => $keyword:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            Given($given),
            $($variant,)+
        }

        impl FromAttribute for $name {
            const EXPECTED: &'static str = concat!("value for ", stringify!($name));

            fn from_attribute(text: &str) -> Option<Self> {
                match text.trim() {
                    $($keyword => Some(Self::$variant),)+
                    other => <$given as FromAttribute>::from_attribute(other).map(Self::Given),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    Self::Given(value) => write!(f, "{value}"),
                    $(Self::$variant => f.write_str($keyword),)+
                }
            }
        }
    };
}

placement! {
    /// When the vehicle enters the simulation.
    Depart(SumoTime) {
        Triggered => "triggered",
        ContainerTriggered => "containerTriggered",
        Now => "now",
        Split => "split",
        Begin => "begin",
    }
}

placement! {
    /// Lane the vehicle is inserted on.
    DepartLane(u32) {
        Random => "random",
        Free => "free",
        Allowed => "allowed",
        Best => "best",
        First => "first",
    }
}

placement! {
    /// Position on the departure lane.
    DepartPos(f64) {
        Random => "random",
        Free => "free",
        RandomFree => "random_free",
        Base => "base",
        Last => "last",
        Stop => "stop",
    }
}

placement! {
    /// Speed at insertion.
    DepartSpeed(f64) {
        Random => "random",
        Max => "max",
        Desired => "desired",
        SpeedLimit => "speedLimit",
        Last => "last",
        Avg => "avg",
    }
}

placement! {
    /// Lane the vehicle leaves the network from.
    ArrivalLane(u32) {
        Current => "current",
        Random => "random",
        First => "first",
    }
}

placement! {
    /// Position on the arrival lane.
    ArrivalPos(f64) {
        Random => "random",
        Center => "center",
        Max => "max",
    }
}

placement! {
    /// Speed when leaving the network.
    ArrivalSpeed(f64) {
        Current => "current",
    }
}

/// Insertion rate of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowRate {
    /// Fixed headway between insertions.
    Period(SumoTime),
    /// Insertions per hour.
    PerHour(f64),
    /// Insertion probability per second.
    Probability(f64),
}

/// Repetition interval of a flow-like element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowDefinition {
    pub begin: SumoTime,
    pub end: Option<SumoTime>,
    pub number: Option<u32>,
    pub rate: Option<FlowRate>,
}

/// Parsed definition of a vehicle-like element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleParameter {
    pub tag: Tag,
    pub id: String,
    pub vtype: Option<String>,
    pub route: Option<String>,
    pub depart: Option<Depart>,
    pub depart_lane: Option<DepartLane>,
    pub depart_pos: Option<DepartPos>,
    pub depart_speed: Option<DepartSpeed>,
    pub arrival_lane: Option<ArrivalLane>,
    pub arrival_pos: Option<ArrivalPos>,
    pub arrival_speed: Option<ArrivalSpeed>,
    pub color: Option<Color>,
    pub line: Option<String>,
    pub from_taz: Option<String>,
    pub to_taz: Option<String>,
    pub person_number: u32,
    pub container_number: u32,
    pub flow: Option<FlowDefinition>,
}

impl VehicleParameter {
    /// True if the element references a stand-alone route by id.
    #[must_use]
    pub fn has_route_reference(&self) -> bool {
        self.route.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// Parse the attributes shared by all vehicle-like elements.
///
/// Flow-like tags additionally get a [`FlowDefinition`], with unset
/// `begin`/`end` taken from `config`.
///
/// # Errors
/// Attribute errors for missing/malformed values, validation errors for
/// negative departure times or speeds and inconsistent flow rates.
pub fn parse_vehicle_parameter(
    attrs: &AttributeView<'_>,
    config: &HandlerConfig,
) -> Result<VehicleParameter, ElementError> {
    let tag = attrs.tag();
    let id: String = attrs.required(Attr::Id)?;

    let depart = if tag.is_flow() {
        None
    } else {
        attrs.maybe::<Depart>(Attr::Depart)?
    };
    if let Some(Depart::Given(time)) = depart {
        if time.is_negative() {
            return Err(ElementError::validation(
                tag,
                Some(id),
                "departure time must be non-negative",
            ));
        }
    }

    let depart_speed = attrs.maybe::<DepartSpeed>(Attr::DepartSpeed)?;
    let arrival_speed = attrs.maybe::<ArrivalSpeed>(Attr::ArrivalSpeed)?;
    if matches!(depart_speed, Some(DepartSpeed::Given(v)) if v < 0.0)
        || matches!(arrival_speed, Some(ArrivalSpeed::Given(v)) if v < 0.0)
    {
        return Err(ElementError::validation(
            tag,
            Some(id),
            "speeds must be non-negative",
        ));
    }

    let flow = if tag.is_flow() {
        Some(parse_flow_definition(attrs, &id, config)?)
    } else {
        None
    };

    Ok(VehicleParameter {
        tag,
        vtype: attrs.maybe(Attr::Type)?,
        route: attrs.maybe(Attr::Route)?,
        depart,
        depart_lane: attrs.maybe(Attr::DepartLane)?,
        depart_pos: attrs.maybe(Attr::DepartPos)?,
        depart_speed,
        arrival_lane: attrs.maybe(Attr::ArrivalLane)?,
        arrival_pos: attrs.maybe(Attr::ArrivalPos)?,
        arrival_speed,
        color: attrs.maybe(Attr::Color)?,
        line: attrs.maybe(Attr::Line)?,
        from_taz: attrs.maybe(Attr::FromTaz)?,
        to_taz: attrs.maybe(Attr::ToTaz)?,
        person_number: attrs.optional(Attr::PersonNumber, 0)?,
        container_number: attrs.optional(Attr::ContainerNumber, 0)?,
        flow,
        id,
    })
}

/// Per-hour attribute names accepted for a flow-like tag.
fn per_hour_attrs(tag: Tag) -> [Attr; 2] {
    match tag {
        Tag::PersonFlow => [Attr::PersonsPerHour, Attr::PerHour],
        Tag::ContainerFlow => [Attr::ContainersPerHour, Attr::PerHour],
        _ => [Attr::VehsPerHour, Attr::PerHour],
    }
}

fn parse_flow_definition(
    attrs: &AttributeView<'_>,
    id: &str,
    config: &HandlerConfig,
) -> Result<FlowDefinition, ElementError> {
    let tag = attrs.tag();
    let invalid = |message: &str| ElementError::validation(tag, Some(id.to_string()), message);

    let begin = attrs.optional(Attr::Begin, config.begin)?;
    let end = match attrs.maybe::<SumoTime>(Attr::End)? {
        Some(end) => Some(end),
        None => config.end,
    };
    let number: Option<u32> = attrs.maybe(Attr::Number)?;

    let mut rates = Vec::new();
    if let Some(period) = attrs.maybe::<SumoTime>(Attr::Period)? {
        if period <= SumoTime::ZERO {
            return Err(invalid("period must be positive"));
        }
        rates.push(FlowRate::Period(period));
    }
    for attr in per_hour_attrs(tag) {
        if let Some(per_hour) = attrs.maybe::<f64>(attr)? {
            if per_hour <= 0.0 {
                return Err(invalid("insertions per hour must be positive"));
            }
            rates.push(FlowRate::PerHour(per_hour));
        }
    }
    if let Some(probability) = attrs.maybe::<f64>(Attr::Probability)? {
        if probability <= 0.0 || probability > 1.0 {
            return Err(invalid("probability must lie in (0, 1]"));
        }
        rates.push(FlowRate::Probability(probability));
    }

    if rates.len() > 1 {
        return Err(invalid(
            "at most one of 'period', per-hour rate and 'probability' may be given",
        ));
    }
    let rate = rates.pop();
    if rate.is_none() && number.is_none() {
        return Err(invalid(
            "one of 'period', per-hour rate, 'probability' or 'number' is required",
        ));
    }
    if end.is_some_and(|end| end < begin) {
        return Err(invalid("begin lies after end"));
    }

    Ok(FlowDefinition {
        begin,
        end,
        number,
        rate,
    })
}
