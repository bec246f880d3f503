//! Builder that records every callback as a serializable value.

use serde::Serialize;

use super::builder::{NodeRef, RouteBuilder};
use crate::stop::Stop;
use crate::types::{Color, Parameters, SumoTime, Tag};
use crate::vehicle::VehicleParameter;

/// One recorded builder callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum BuildCall {
    Route {
        id: String,
        edges: Vec<String>,
        color: Color,
        repeat: i32,
        cycle_time: SumoTime,
        parameters: Parameters,
    },
    VehicleOverRoute {
        vehicle: VehicleParameter,
        parameters: Parameters,
    },
    VehicleEmbeddedRoute {
        vehicle: VehicleParameter,
        edges: Vec<String>,
        parameters: Parameters,
    },
    Trip {
        vehicle: VehicleParameter,
        from: String,
        to: String,
        via: Vec<String>,
        parameters: Parameters,
    },
    Flow {
        flow: VehicleParameter,
        from: String,
        to: String,
        via: Vec<String>,
        parameters: Parameters,
    },
    FlowOverRoute {
        flow: VehicleParameter,
        parameters: Parameters,
    },
    FlowEmbeddedRoute {
        flow: VehicleParameter,
        edges: Vec<String>,
        parameters: Parameters,
    },
    Stop {
        owner: Option<String>,
        parent: Option<Tag>,
        stop: Stop,
    },
    Person {
        person: VehicleParameter,
        parameters: Parameters,
    },
    PersonFlow {
        person_flow: VehicleParameter,
        parameters: Parameters,
    },
    PersonTrip {
        owner: Option<String>,
        from: String,
        to: String,
        bus_stop: String,
        arrival_pos: f64,
        v_types: Vec<String>,
        modes: Vec<String>,
    },
    Ride {
        owner: Option<String>,
        from: String,
        to: String,
        bus_stop: String,
        arrival_pos: f64,
        lines: Vec<String>,
    },
    Walk {
        owner: Option<String>,
        from: String,
        to: String,
        bus_stop: String,
        edges: Vec<String>,
        route: String,
        arrival_pos: f64,
    },
    Container {
        container: VehicleParameter,
        parameters: Parameters,
    },
    ContainerFlow {
        container_flow: VehicleParameter,
        parameters: Parameters,
    },
    Transport {
        owner: Option<String>,
        from: String,
        to: String,
        container_stop: String,
        lines: Vec<String>,
        arrival_pos: f64,
    },
    Tranship {
        owner: Option<String>,
        from: String,
        to: String,
        container_stop: String,
        edges: Vec<String>,
        speed: f64,
        depart_pos: f64,
        arrival_pos: f64,
    },
}

impl BuildCall {
    /// Name of the callback, as used in serialized output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Route { .. } => "route",
            Self::VehicleOverRoute { .. } => "vehicleOverRoute",
            Self::VehicleEmbeddedRoute { .. } => "vehicleEmbeddedRoute",
            Self::Trip { .. } => "trip",
            Self::Flow { .. } => "flow",
            Self::FlowOverRoute { .. } => "flowOverRoute",
            Self::FlowEmbeddedRoute { .. } => "flowEmbeddedRoute",
            Self::Stop { .. } => "stop",
            Self::Person { .. } => "person",
            Self::PersonFlow { .. } => "personFlow",
            Self::PersonTrip { .. } => "personTrip",
            Self::Ride { .. } => "ride",
            Self::Walk { .. } => "walk",
            Self::Container { .. } => "container",
            Self::ContainerFlow { .. } => "containerFlow",
            Self::Transport { .. } => "transport",
            Self::Tranship { .. } => "tranship",
        }
    }

    /// Id of the defined object, if the call defines one.
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        match self {
            Self::Route { id, .. } => Some(id.as_str()).filter(|id| !id.is_empty()),
            Self::VehicleOverRoute { vehicle, .. }
            | Self::VehicleEmbeddedRoute { vehicle, .. }
            | Self::Trip { vehicle, .. } => Some(vehicle.id.as_str()),
            Self::Flow { flow, .. }
            | Self::FlowOverRoute { flow, .. }
            | Self::FlowEmbeddedRoute { flow, .. } => Some(flow.id.as_str()),
            Self::Person { person, .. } => Some(person.id.as_str()),
            Self::PersonFlow { person_flow, .. } => Some(person_flow.id.as_str()),
            Self::Container { container, .. } => Some(container.id.as_str()),
            Self::ContainerFlow { container_flow, .. } => Some(container_flow.id.as_str()),
            Self::Stop { .. }
            | Self::PersonTrip { .. }
            | Self::Ride { .. }
            | Self::Walk { .. }
            | Self::Transport { .. }
            | Self::Tranship { .. } => None,
        }
    }
}

/// A [`RouteBuilder`] that keeps every callback in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordingBuilder {
    pub calls: Vec<BuildCall>,
}

impl RecordingBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteBuilder for RecordingBuilder {
    fn build_route(
        &mut self,
        _node: NodeRef<'_>,
        id: &str,
        edges: &[String],
        color: Color,
        repeat: i32,
        cycle_time: SumoTime,
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::Route {
            id: id.to_string(),
            edges: edges.to_vec(),
            color,
            repeat,
            cycle_time,
            parameters: parameters.clone(),
        });
    }

    fn build_vehicle_over_route(
        &mut self,
        _node: NodeRef<'_>,
        vehicle: &VehicleParameter,
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::VehicleOverRoute {
            vehicle: vehicle.clone(),
            parameters: parameters.clone(),
        });
    }

    fn build_vehicle_embedded_route(
        &mut self,
        _node: NodeRef<'_>,
        vehicle: &VehicleParameter,
        edges: &[String],
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::VehicleEmbeddedRoute {
            vehicle: vehicle.clone(),
            edges: edges.to_vec(),
            parameters: parameters.clone(),
        });
    }

    fn build_trip(
        &mut self,
        _node: NodeRef<'_>,
        vehicle: &VehicleParameter,
        from: &str,
        to: &str,
        via: &[String],
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::Trip {
            vehicle: vehicle.clone(),
            from: from.to_string(),
            to: to.to_string(),
            via: via.to_vec(),
            parameters: parameters.clone(),
        });
    }

    fn build_flow(
        &mut self,
        _node: NodeRef<'_>,
        flow: &VehicleParameter,
        from: &str,
        to: &str,
        via: &[String],
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::Flow {
            flow: flow.clone(),
            from: from.to_string(),
            to: to.to_string(),
            via: via.to_vec(),
            parameters: parameters.clone(),
        });
    }

    fn build_flow_over_route(
        &mut self,
        _node: NodeRef<'_>,
        flow: &VehicleParameter,
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::FlowOverRoute {
            flow: flow.clone(),
            parameters: parameters.clone(),
        });
    }

    fn build_flow_embedded_route(
        &mut self,
        _node: NodeRef<'_>,
        flow: &VehicleParameter,
        edges: &[String],
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::FlowEmbeddedRoute {
            flow: flow.clone(),
            edges: edges.to_vec(),
            parameters: parameters.clone(),
        });
    }

    fn build_stop(&mut self, node: NodeRef<'_>, stop: &Stop) {
        self.calls.push(BuildCall::Stop {
            owner: node.owner_id().map(String::from),
            parent: node.parent,
            stop: stop.clone(),
        });
    }

    fn build_person(&mut self, _node: NodeRef<'_>, person: &VehicleParameter, parameters: &Parameters) {
        self.calls.push(BuildCall::Person {
            person: person.clone(),
            parameters: parameters.clone(),
        });
    }

    fn build_person_flow(
        &mut self,
        _node: NodeRef<'_>,
        person_flow: &VehicleParameter,
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::PersonFlow {
            person_flow: person_flow.clone(),
            parameters: parameters.clone(),
        });
    }

    fn build_person_trip(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        bus_stop: &str,
        arrival_pos: f64,
        v_types: &[String],
        modes: &[String],
    ) {
        self.calls.push(BuildCall::PersonTrip {
            owner: node.owner_id().map(String::from),
            from: from.to_string(),
            to: to.to_string(),
            bus_stop: bus_stop.to_string(),
            arrival_pos,
            v_types: v_types.to_vec(),
            modes: modes.to_vec(),
        });
    }

    fn build_ride(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        bus_stop: &str,
        arrival_pos: f64,
        lines: &[String],
    ) {
        self.calls.push(BuildCall::Ride {
            owner: node.owner_id().map(String::from),
            from: from.to_string(),
            to: to.to_string(),
            bus_stop: bus_stop.to_string(),
            arrival_pos,
            lines: lines.to_vec(),
        });
    }

    fn build_walk(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        bus_stop: &str,
        edges: &[String],
        route: &str,
        arrival_pos: f64,
    ) {
        self.calls.push(BuildCall::Walk {
            owner: node.owner_id().map(String::from),
            from: from.to_string(),
            to: to.to_string(),
            bus_stop: bus_stop.to_string(),
            edges: edges.to_vec(),
            route: route.to_string(),
            arrival_pos,
        });
    }

    fn build_container(
        &mut self,
        _node: NodeRef<'_>,
        container: &VehicleParameter,
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::Container {
            container: container.clone(),
            parameters: parameters.clone(),
        });
    }

    fn build_container_flow(
        &mut self,
        _node: NodeRef<'_>,
        container_flow: &VehicleParameter,
        parameters: &Parameters,
    ) {
        self.calls.push(BuildCall::ContainerFlow {
            container_flow: container_flow.clone(),
            parameters: parameters.clone(),
        });
    }

    fn build_transport(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        container_stop: &str,
        lines: &[String],
        arrival_pos: f64,
    ) {
        self.calls.push(BuildCall::Transport {
            owner: node.owner_id().map(String::from),
            from: from.to_string(),
            to: to.to_string(),
            container_stop: container_stop.to_string(),
            lines: lines.to_vec(),
            arrival_pos,
        });
    }

    fn build_tranship(
        &mut self,
        node: NodeRef<'_>,
        from: &str,
        to: &str,
        container_stop: &str,
        edges: &[String],
        speed: f64,
        depart_pos: f64,
        arrival_pos: f64,
    ) {
        self.calls.push(BuildCall::Tranship {
            owner: node.owner_id().map(String::from),
            from: from.to_string(),
            to: to.to_string(),
            container_stop: container_stop.to_string(),
            edges: edges.to_vec(),
            speed,
            depart_pos,
            arrival_pos,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_call_serializes_with_tag() {
        let call = BuildCall::Route {
            id: "r1".into(),
            edges: vec!["a".into(), "b".into()],
            color: Color::YELLOW,
            repeat: 0,
            cycle_time: SumoTime::ZERO,
            parameters: Parameters::new(),
        };
        let yaml = serde_yaml_ng::to_string(&call).unwrap();
        assert!(yaml.contains("call: route"));
        assert!(yaml.contains("255,255,0"));
        assert!(yaml.contains("cycleTime: 0.0"));
        assert_eq!(call.name(), "route");
        assert_eq!(call.object_id(), Some("r1"));
    }

    #[test]
    fn test_plan_calls_have_no_object_id() {
        let call = BuildCall::Ride {
            owner: Some("p1".into()),
            from: String::new(),
            to: "b".into(),
            bus_stop: String::new(),
            arrival_pos: 0.0,
            lines: Vec::new(),
        };
        assert_eq!(call.object_id(), None);
        assert_eq!(call.name(), "ride");
    }
}
