//! Deserialization of `pw-dump` output into a [`Snapshot`].
//!
//! The dump is a JSON array of every object in the graph. Only nodes and
//! links are kept. Objects which don't look like what we expect are
//! skipped rather than failing the whole snapshot, since one odd client
//! shouldn't take down the panel.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use serde_with::{serde_as, DefaultOnError, VecSkipError};
use tracing::debug;

use crate::object_id::ObjectId;
use crate::property_store::PropertyStore;
use crate::snapshot::{Link, Node, NodeState, Snapshot};

#[derive(Deserialize)]
struct RawObject {
    id: ObjectId,
    #[serde(rename = "type")]
    object_type: String,
    #[serde(default)]
    info: Option<RawInfo>,
}

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct RawInfo {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    props: Map<String, Value>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    state: NodeState,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    params: RawParams,
    output_node_id: Option<ObjectId>,
    input_node_id: Option<ObjectId>,
}

#[serde_as]
#[derive(Deserialize, Default)]
struct RawParams {
    #[serde_as(as = "VecSkipError<_>")]
    #[serde(rename = "Format", default)]
    format: Vec<RawFormat>,
    #[serde_as(as = "VecSkipError<_>")]
    #[serde(rename = "EnumFormat", default)]
    enum_format: Vec<RawFormat>,
    #[serde_as(as = "VecSkipError<_>")]
    #[serde(rename = "Props", default)]
    props: Vec<RawProps>,
}

#[serde_as]
#[derive(Deserialize, Default)]
struct RawFormat {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    rate: Option<RawRate>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    audio: Option<RawAudio>,
}

#[serde_as]
#[derive(Deserialize, Default)]
struct RawAudio {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    rate: Option<RawRate>,
}

/// A rate is either fixed or a choice, of which the default is taken.
#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(untagged)]
enum RawRate {
    Fixed(u32),
    Choice { default: u32 },
}

#[serde_as]
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawProps {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    volume: Option<f32>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    mute: Option<bool>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    channel_volumes: Option<Vec<f32>>,
}

impl RawRate {
    fn value(self) -> u32 {
        match self {
            RawRate::Fixed(rate) => rate,
            RawRate::Choice { default } => default,
        }
    }
}

impl RawFormat {
    fn rate(&self) -> Option<u32> {
        // Some nodes nest the format under an "audio" key.
        match &self.audio {
            Some(audio) => audio.rate.map(RawRate::value),
            None => self.rate.map(RawRate::value),
        }
    }
}

impl RawParams {
    /// The negotiated rate, falling back to the first enumerated format
    /// when nothing has been negotiated yet (suspended devices).
    fn rate(&self) -> Option<u32> {
        match self.format.first() {
            Some(format) => format.rate(),
            None => self
                .enum_format
                .first()
                .and_then(|format| format.rate)
                .map(RawRate::value),
        }
    }
}

fn node(object_id: ObjectId, info: RawInfo) -> Node {
    let params = &info.params;
    Node {
        object_id,
        props: PropertyStore::from(&info.props),
        state: info.state,
        rate: params.rate(),
        volume: params.props.iter().find_map(|p| p.volume),
        channel_volumes: params
            .props
            .iter()
            .find_map(|p| p.channel_volumes.clone()),
        mute: params.props.iter().find_map(|p| p.mute),
    }
}

/// Build a [`Snapshot`] from the raw bytes `pw-dump` wrote.
pub fn parse(json: &[u8]) -> Result<Snapshot> {
    let objects: Vec<Value> =
        serde_json::from_slice(json).context("Failed to parse graph dump")?;

    let mut snapshot = Snapshot::default();

    for value in objects {
        let object: RawObject = match serde_json::from_value(value) {
            Ok(object) => object,
            Err(err) => {
                debug!("Skipping malformed object: {err}");
                continue;
            }
        };
        let info = object.info.unwrap_or_default();

        if object.object_type.contains("Node") {
            snapshot.nodes.insert(object.id, node(object.id, info));
        } else if object.object_type.contains("Link") {
            match (info.output_node_id, info.input_node_id) {
                (Some(output_id), Some(input_id)) => {
                    snapshot.links.push(Link {
                        output_id,
                        input_id,
                    });
                }
                _ => debug!("Skipping link {} without endpoints", object.id),
            }
        }
    }

    debug!(
        nodes = snapshot.nodes.len(),
        links = snapshot.links.len(),
        "Parsed graph dump"
    );

    Ok(snapshot)
}
