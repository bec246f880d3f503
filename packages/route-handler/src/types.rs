//! Core data types for the route handler.
//!
//! These types name the elements and attributes of route documents and
//! carry the typed values extracted from them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Element tags understood by the handler.
///
/// Any element without a rule maps to `Nothing` and is treated as a
/// transparent container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Tag {
    Route,
    Trip,
    Vehicle,
    Flow,
    Stop,
    Person,
    PersonFlow,
    PersonTrip,
    Ride,
    Walk,
    Container,
    ContainerFlow,
    Transport,
    Tranship,
    Param,
    /// Synthetic root and unknown elements.
    Nothing,
}

impl Tag {
    /// All tags, in declaration order.
    pub const ALL: [Tag; 16] = [
        Tag::Route,
        Tag::Trip,
        Tag::Vehicle,
        Tag::Flow,
        Tag::Stop,
        Tag::Person,
        Tag::PersonFlow,
        Tag::PersonTrip,
        Tag::Ride,
        Tag::Walk,
        Tag::Container,
        Tag::ContainerFlow,
        Tag::Transport,
        Tag::Tranship,
        Tag::Param,
        Tag::Nothing,
    ];

    /// Map a source element name to its tag.
    ///
    /// # Examples
    /// ```
    /// use route_handler::types::Tag;
    ///
    /// assert_eq!(Tag::from_name("personFlow"), Tag::PersonFlow);
    /// assert_eq!(Tag::from_name("vType"), Tag::Nothing);
    /// ```
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "route" => Self::Route,
            "trip" => Self::Trip,
            "vehicle" => Self::Vehicle,
            "flow" => Self::Flow,
            "stop" => Self::Stop,
            "person" => Self::Person,
            "personFlow" => Self::PersonFlow,
            "personTrip" => Self::PersonTrip,
            "ride" => Self::Ride,
            "walk" => Self::Walk,
            "container" => Self::Container,
            "containerFlow" => Self::ContainerFlow,
            "transport" => Self::Transport,
            "tranship" => Self::Tranship,
            "param" => Self::Param,
            _ => Self::Nothing,
        }
    }

    /// Source element name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Trip => "trip",
            Self::Vehicle => "vehicle",
            Self::Flow => "flow",
            Self::Stop => "stop",
            Self::Person => "person",
            Self::PersonFlow => "personFlow",
            Self::PersonTrip => "personTrip",
            Self::Ride => "ride",
            Self::Walk => "walk",
            Self::Container => "container",
            Self::ContainerFlow => "containerFlow",
            Self::Transport => "transport",
            Self::Tranship => "tranship",
            Self::Param => "param",
            Self::Nothing => "nothing",
        }
    }

    /// Tags that have a builder callback.
    #[must_use]
    pub fn is_dispatchable(&self) -> bool {
        !matches!(self, Self::Param | Self::Nothing)
    }

    /// Tags whose node carries a vehicle parameter record.
    #[must_use]
    pub fn has_vehicle_parameter(&self) -> bool {
        matches!(
            self,
            Self::Trip
                | Self::Vehicle
                | Self::Flow
                | Self::Person
                | Self::PersonFlow
                | Self::Container
                | Self::ContainerFlow
        )
    }

    /// Tags that repeat a definition over an interval.
    #[must_use]
    pub fn is_flow(&self) -> bool {
        matches!(self, Self::Flow | Self::PersonFlow | Self::ContainerFlow)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute keys understood by the element rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attr {
    Id,
    Edges,
    Color,
    Repeat,
    CycleTime,
    From,
    To,
    Via,
    BusStop,
    TrainStop,
    ChargingStation,
    OverheadWireSegment,
    ContainerStop,
    ParkingArea,
    VTypes,
    Modes,
    Lines,
    Route,
    Duration,
    Speed,
    DepartPos,
    ArrivalPos,
    DepartPosLat,
    Key,
    Value,
    Type,
    Depart,
    DepartLane,
    DepartSpeed,
    ArrivalLane,
    ArrivalSpeed,
    Line,
    FromTaz,
    ToTaz,
    PersonNumber,
    ContainerNumber,
    Begin,
    End,
    Number,
    Period,
    VehsPerHour,
    PersonsPerHour,
    ContainersPerHour,
    PerHour,
    Probability,
    Lane,
    StartPos,
    EndPos,
    FriendlyPos,
    PosLat,
    ActType,
    Arrival,
    Until,
    Started,
    Ended,
    Extension,
    Triggered,
    ContainerTriggered,
    Parking,
    Expected,
    ExpectedContainers,
    Permitted,
    TripId,
    Split,
    Join,
    Index,
}

impl Attr {
    /// Source attribute name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Edges => "edges",
            Self::Color => "color",
            Self::Repeat => "repeat",
            Self::CycleTime => "cycleTime",
            Self::From => "from",
            Self::To => "to",
            Self::Via => "via",
            Self::BusStop => "busStop",
            Self::TrainStop => "trainStop",
            Self::ChargingStation => "chargingStation",
            Self::OverheadWireSegment => "overheadWireSegment",
            Self::ContainerStop => "containerStop",
            Self::ParkingArea => "parkingArea",
            Self::VTypes => "vTypes",
            Self::Modes => "modes",
            Self::Lines => "lines",
            Self::Route => "route",
            Self::Duration => "duration",
            Self::Speed => "speed",
            Self::DepartPos => "departPos",
            Self::ArrivalPos => "arrivalPos",
            Self::DepartPosLat => "departPosLat",
            Self::Key => "key",
            Self::Value => "value",
            Self::Type => "type",
            Self::Depart => "depart",
            Self::DepartLane => "departLane",
            Self::DepartSpeed => "departSpeed",
            Self::ArrivalLane => "arrivalLane",
            Self::ArrivalSpeed => "arrivalSpeed",
            Self::Line => "line",
            Self::FromTaz => "fromTaz",
            Self::ToTaz => "toTaz",
            Self::PersonNumber => "personNumber",
            Self::ContainerNumber => "containerNumber",
            Self::Begin => "begin",
            Self::End => "end",
            Self::Number => "number",
            Self::Period => "period",
            Self::VehsPerHour => "vehsPerHour",
            Self::PersonsPerHour => "personsPerHour",
            Self::ContainersPerHour => "containersPerHour",
            Self::PerHour => "perHour",
            Self::Probability => "probability",
            Self::Lane => "lane",
            Self::StartPos => "startPos",
            Self::EndPos => "endPos",
            Self::FriendlyPos => "friendlyPos",
            Self::PosLat => "posLat",
            Self::ActType => "actType",
            Self::Arrival => "arrival",
            Self::Until => "until",
            Self::Started => "started",
            Self::Ended => "ended",
            Self::Extension => "extension",
            Self::Triggered => "triggered",
            Self::ContainerTriggered => "containerTriggered",
            Self::Parking => "parking",
            Self::Expected => "expected",
            Self::ExpectedContainers => "expectedContainers",
            Self::Permitted => "permitted",
            Self::TripId => "tripId",
            Self::Split => "split",
            Self::Join => "join",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Attr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Simulation time with millisecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SumoTime(i64);

impl SumoTime {
    /// Time zero.
    pub const ZERO: SumoTime = SumoTime(0);

    /// Create a time from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Create a time from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1000)
    }

    /// Milliseconds since simulation start.
    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Seconds as a float.
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// True for negative times, which stop definitions treat as unset.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse decimal seconds or `H:M:S` / `D:H:M:S`.
    ///
    /// # Examples
    /// ```
    /// use route_handler::types::SumoTime;
    ///
    /// assert_eq!(SumoTime::parse("30"), Some(SumoTime::from_secs(30)));
    /// assert_eq!(SumoTime::parse("1:00:00"), Some(SumoTime::from_secs(3600)));
    /// assert_eq!(SumoTime::parse("soon"), None);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.contains(':') {
            return parse_seconds(text).map(Self);
        }
        let parts: Vec<&str> = text.split(':').collect();
        let factors: &[i64] = match parts.len() {
            3 => &[3600, 60, 1],
            4 => &[86_400, 3600, 60, 1],
            _ => return None,
        };
        let mut total: i64 = 0;
        for (part, factor) in parts.iter().zip(factors) {
            let millis = parse_seconds(part)?;
            total = total.checked_add(millis.checked_mul(*factor)?)?;
        }
        Some(Self(total))
    }
}

/// Parse decimal seconds into rounded milliseconds.
fn parse_seconds(text: &str) -> Option<i64> {
    let secs: f64 = text.parse().ok()?;
    let millis = (secs * 1000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    Some(millis as i64)
}

impl fmt::Display for SumoTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_secs_f64())
    }
}

impl Serialize for SumoTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_secs_f64())
    }
}

impl<'de> Deserialize<'de> for SumoTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TimeVisitor;

        impl serde::de::Visitor<'_> for TimeVisitor {
            type Value = SumoTime;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("seconds or a H:M:S time")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<SumoTime, E> {
                v.checked_mul(1000)
                    .map(SumoTime)
                    .ok_or_else(|| E::custom(format!("time out of range: {v}")))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<SumoTime, E> {
                i64::try_from(v)
                    .map_err(|_| E::custom(format!("time out of range: {v}")))
                    .and_then(|v| self.visit_i64(v))
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<SumoTime, E> {
                self.visit_str(&v.to_string())
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<SumoTime, E> {
                SumoTime::parse(v).ok_or_else(|| E::custom(format!("invalid time: '{v}'")))
            }
        }

        deserializer.deserialize_any(TimeVisitor)
    }
}

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const ORANGE: Color = Color::rgb(255, 128, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const GREY: Color = Color::rgb(128, 128, 128);
    pub const INVISIBLE: Color = Color {
        red: 0,
        green: 0,
        blue: 0,
        alpha: 0,
    };

    /// Opaque color from components.
    #[must_use]
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 255,
        }
    }

    /// Parse a named color or `r,g,b[,a]` components.
    ///
    /// Components are bytes, unless any of them contains a `.`, in which case
    /// all are fractions in `[0, 1]`.
    ///
    /// # Examples
    /// ```
    /// use route_handler::types::Color;
    ///
    /// assert_eq!(Color::parse("yellow"), Some(Color::YELLOW));
    /// assert_eq!(Color::parse("1,0.5,0"), Some(Color::rgb(255, 128, 0)));
    /// assert_eq!(Color::parse("300,0,0"), None);
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.to_lowercase().as_str() {
            "red" => return Some(Self::RED),
            "green" => return Some(Self::GREEN),
            "blue" => return Some(Self::BLUE),
            "yellow" => return Some(Self::YELLOW),
            "cyan" => return Some(Self::CYAN),
            "magenta" => return Some(Self::MAGENTA),
            "orange" => return Some(Self::ORANGE),
            "white" => return Some(Self::WHITE),
            "black" => return Some(Self::BLACK),
            "grey" | "gray" => return Some(Self::GREY),
            "invisible" => return Some(Self::INVISIBLE),
            _ => {}
        }

        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let fractional = parts.iter().any(|p| p.contains('.'));
        let mut components = [255u8; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = if fractional {
                let value: f64 = part.parse().ok()?;
                if !(0.0..=1.0).contains(&value) {
                    return None;
                }
                (value * 255.0).round() as u8
            } else {
                part.parse().ok()?
            };
        }
        Some(Self {
            red: components[0],
            green: components[1],
            blue: components[2],
            alpha: components[3],
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::YELLOW
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.red, self.green, self.blue)?;
        if self.alpha != 255 {
            write!(f, ",{}", self.alpha)?;
        }
        Ok(())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A typed attribute value stored in a node's attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    String(String),
    Int(i32),
    Double(f64),
    Bool(bool),
    StringList(Vec<String>),
    Color(Color),
    Time(SumoTime),
}

impl fmt::Display for AttributeValue {
    /// Render the value back in source syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::StringList(items) => f.write_str(&items.join(" ")),
            Self::Color(c) => write!(f, "{c}"),
            Self::Time(t) => write!(f, "{t}"),
        }
    }
}

/// Typed attribute bag of one node.
///
/// Rules fill every attribute they declare, so getters fall back to the
/// type's neutral value only for attributes a rule never stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attributes {
    values: BTreeMap<Attr, AttributeValue>,
}

impl Attributes {
    /// Create an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous one for the key.
    pub fn insert(&mut self, attr: Attr, value: AttributeValue) {
        self.values.insert(attr, value);
    }

    pub fn insert_string(&mut self, attr: Attr, value: impl Into<String>) {
        self.insert(attr, AttributeValue::String(value.into()));
    }

    pub fn insert_string_list(&mut self, attr: Attr, value: Vec<String>) {
        self.insert(attr, AttributeValue::StringList(value));
    }

    pub fn insert_double(&mut self, attr: Attr, value: f64) {
        self.insert(attr, AttributeValue::Double(value));
    }

    /// Raw access to a stored value.
    #[must_use]
    pub fn get(&self, attr: Attr) -> Option<&AttributeValue> {
        self.values.get(&attr)
    }

    /// True if a value of type string is stored and non-empty.
    #[must_use]
    pub fn has_string(&self, attr: Attr) -> bool {
        !self.string(attr).is_empty()
    }

    #[must_use]
    pub fn string(&self, attr: Attr) -> &str {
        match self.get(attr) {
            Some(AttributeValue::String(s)) => s,
            _ => "",
        }
    }

    #[must_use]
    pub fn string_list(&self, attr: Attr) -> &[String] {
        match self.get(attr) {
            Some(AttributeValue::StringList(items)) => items,
            _ => &[],
        }
    }

    #[must_use]
    pub fn int(&self, attr: Attr) -> i32 {
        match self.get(attr) {
            Some(AttributeValue::Int(i)) => *i,
            _ => 0,
        }
    }

    #[must_use]
    pub fn double(&self, attr: Attr) -> f64 {
        match self.get(attr) {
            Some(AttributeValue::Double(d)) => *d,
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn bool(&self, attr: Attr) -> bool {
        matches!(self.get(attr), Some(AttributeValue::Bool(true)))
    }

    #[must_use]
    pub fn color(&self, attr: Attr) -> Color {
        match self.get(attr) {
            Some(AttributeValue::Color(c)) => *c,
            _ => Color::default(),
        }
    }

    #[must_use]
    pub fn time(&self, attr: Attr) -> SumoTime {
        match self.get(attr) {
            Some(AttributeValue::Time(t)) => *t,
            _ => SumoTime::ZERO,
        }
    }

    /// Iterate over stored values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Attr, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Generic key/value parameters attached to an element.
pub type Parameters = BTreeMap<String, String>;
