//! Point-in-time representation of the PipeWire graph.
//!
//! A [`Snapshot`] is built once from a graph dump and never mutated
//! afterwards. There is no identity tracking between snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Deserialize;

use crate::media_class::MediaClass;
use crate::object_id::ObjectId;
use crate::property_store::PropertyStore;

/// Node state as reported in `info.state`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Error,
    Creating,
    Suspended,
    Idle,
    Running,
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeState::Error => "error",
            NodeState::Creating => "creating",
            NodeState::Suspended => "suspended",
            NodeState::Idle => "idle",
            NodeState::Running => "running",
            NodeState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Node {
    pub object_id: ObjectId,
    pub props: PropertyStore,
    pub state: NodeState,
    /// Current sample rate in Hz.
    pub rate: Option<u32>,
    /// Master volume, linear. 1.0 is unity.
    pub volume: Option<f32>,
    pub channel_volumes: Option<Vec<f32>>,
    pub mute: Option<bool>,
}

impl Node {
    pub fn media_class(&self) -> Option<MediaClass> {
        self.props
            .media_class()
            .map(|media_class| MediaClass::from(media_class.as_str()))
    }

    /// Whether the node is a device that can be a target.
    pub fn is_sink(&self) -> bool {
        self.media_class()
            .is_some_and(|media_class| media_class.is_sink())
    }

    /// A node only counts as a source while it is actually streaming.
    pub fn is_active(&self) -> bool {
        self.state == NodeState::Running
    }

    /// The name used for matching against the configured device.
    pub fn name(&self) -> Option<&str> {
        self.props.node_name().map(String::as_str)
    }

    /// A user-friendly name for messages.
    pub fn display_name(&self) -> &str {
        self.props
            .node_description()
            .or(self.props.application_name())
            .or(self.props.node_name())
            .map(String::as_str)
            .unwrap_or("Unknown Source")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub output_id: ObjectId,
    pub input_id: ObjectId,
}

#[derive(Default, Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub nodes: BTreeMap<ObjectId, Node>,
    pub links: Vec<Link>,
}

impl Snapshot {
    /// Returns the objects that input to the given object.
    ///
    /// Each channel gets its own link, so a stereo stream shows up once
    /// rather than twice.
    pub fn inputs(&self, object_id: ObjectId) -> Vec<ObjectId> {
        self.links
            .iter()
            .filter(|l| l.input_id == object_id)
            .map(|l| l.output_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Returns the sink nodes whose name contains `substring`.
    pub fn find_sinks(&self, substring: &str) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|node| node.is_sink())
            .filter(|node| node.name().is_some_and(|n| n.contains(substring)))
            .collect()
    }

    /// Returns the nodes linked into `target`, ordered by ID.
    pub fn sources(&self, target: ObjectId) -> Vec<&Node> {
        self.inputs(target)
            .into_iter()
            .filter(|&id| id != target)
            .filter_map(|id| self.nodes.get(&id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, media_class: &str, name: &str) -> Node {
        let mut props = PropertyStore::default();
        props.set_media_class(String::from(media_class));
        props.set_node_name(String::from(name));
        Node {
            object_id: ObjectId::from_raw_id(id),
            props,
            ..Default::default()
        }
    }

    fn link(output: u32, input: u32) -> Link {
        Link {
            output_id: ObjectId::from_raw_id(output),
            input_id: ObjectId::from_raw_id(input),
        }
    }

    fn snapshot(nodes: Vec<Node>, links: Vec<Link>) -> Snapshot {
        Snapshot {
            nodes: nodes.into_iter().map(|n| (n.object_id, n)).collect(),
            links,
        }
    }

    #[test]
    fn inputs_deduplicates_channels() {
        let snapshot = snapshot(
            vec![],
            vec![link(70, 50), link(70, 50), link(71, 50), link(50, 30)],
        );

        assert_eq!(
            snapshot.inputs(ObjectId::from_raw_id(50)),
            vec![ObjectId::from_raw_id(70), ObjectId::from_raw_id(71)]
        );
    }

    #[test]
    fn find_sinks_ignores_streams() {
        let snapshot = snapshot(
            vec![
                node(50, "Audio/Sink", "alsa_output.usb-Topping_E30"),
                node(70, "Stream/Output/Audio", "alsa_output.usb-Topping_E30"),
                node(80, "Audio/Source", "alsa_input.usb-Topping_E30"),
            ],
            vec![],
        );

        let found = snapshot.find_sinks("Topping");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].object_id, ObjectId::from_raw_id(50));
    }

    #[test]
    fn find_sinks_is_case_sensitive() {
        let snapshot = snapshot(
            vec![node(50, "Audio/Sink", "alsa_output.usb-Topping_E30")],
            vec![],
        );

        assert!(snapshot.find_sinks("topping").is_empty());
    }

    #[test]
    fn sources_skip_missing_nodes() {
        let snapshot = snapshot(
            vec![
                node(50, "Audio/Sink", "sink"),
                node(70, "Stream/Output/Audio", "player"),
            ],
            vec![link(70, 50), link(99, 50)],
        );

        let sources = snapshot.sources(ObjectId::from_raw_id(50));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].object_id, ObjectId::from_raw_id(70));
    }

    #[test]
    fn display_name_prefers_description() {
        let mut n = node(70, "Stream/Output/Audio", "firefox");
        assert_eq!(n.display_name(), "firefox");

        n.props.set_application_name(String::from("Firefox"));
        assert_eq!(n.display_name(), "Firefox");

        n.props.set_node_description(String::from("Firefox Audio"));
        assert_eq!(n.display_name(), "Firefox Audio");

        assert_eq!(Node::default().display_name(), "Unknown Source");
    }
}
