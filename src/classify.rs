//! Decide whether the target device is playing bit-perfect.
//!
//! Classification is a pure function of one [`Snapshot`]. The checks run in
//! a fixed order and the first one that fails decides the result:
//!
//! 1. the snapshot could be obtained at all,
//! 2. exactly one sink matches the target,
//! 3. exactly one running source feeds it,
//! 4. source and device rates are known and equal,
//! 5. neither side is attenuated or muted.

use std::borrow::Cow;

use anyhow::Result;
use itertools::Itertools;

use crate::snapshot::{Node, Snapshot};
use crate::truncate;

/// How far a linear volume may stray from 1.0 and still count as 100%.
/// Half a percentage point.
pub const VOLUME_TOLERANCE: f32 = 0.005;

/// Provider errors are cut to this many columns for the tooltip.
pub const ERROR_DETAIL_WIDTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum Status {
    /// The graph snapshot could not be obtained.
    ProviderError,
    DeviceNotFound,
    /// More than one sink matches the target.
    AmbiguousDevice,
    /// The target exists but nothing is playing to it.
    Idle,
    MultipleSources,
    SampleRateMismatch,
    VolumeNotUnity,
    BitPerfect(u32),
}

impl Status {
    /// Short text for the panel itself.
    pub fn token(&self) -> Cow<'static, str> {
        match self {
            Status::ProviderError => Cow::Borrowed("Err"),
            Status::DeviceNotFound => Cow::Borrowed("N/A"),
            Status::AmbiguousDevice => Cow::Borrowed("Dev Err"),
            Status::Idle => Cow::Borrowed("Idle"),
            Status::MultipleSources => Cow::Borrowed("Src Err"),
            Status::SampleRateMismatch => Cow::Borrowed("Freq Err"),
            Status::VolumeNotUnity => Cow::Borrowed("Vol Err"),
            Status::BitPerfect(rate) => Cow::Owned(rate.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(
            self,
            Status::DeviceNotFound | Status::Idle | Status::BitPerfect(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: Status,
    /// Human-readable explanation for the tooltip.
    pub detail: String,
    /// Display name of the matched target, if exactly one matched.
    pub device: Option<String>,
}

impl Classification {
    fn new(status: Status, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            device: None,
        }
    }

    fn on(mut self, device: &Node) -> Self {
        self.device = Some(device.display_name().to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    target: String,
    volume_tolerance: f32,
}

impl Classifier {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            volume_tolerance: VOLUME_TOLERANCE,
        }
    }

    pub fn with_volume_tolerance(mut self, volume_tolerance: f32) -> Self {
        self.volume_tolerance = volume_tolerance;
        self
    }

    /// Classify the result of a snapshot fetch. A failed fetch
    /// short-circuits everything else.
    pub fn classify_outcome(
        &self,
        outcome: &Result<Snapshot>,
    ) -> Classification {
        match outcome {
            Ok(snapshot) => self.classify(snapshot),
            Err(err) => {
                let detail = format!("{err:#}");
                Classification::new(
                    Status::ProviderError,
                    truncate::with_ellipses(&detail, ERROR_DETAIL_WIDTH),
                )
            }
        }
    }

    pub fn classify(&self, snapshot: &Snapshot) -> Classification {
        let device = match snapshot.find_sinks(&self.target).as_slice() {
            [] => {
                return Classification::new(
                    Status::DeviceNotFound,
                    self.target.as_str(),
                )
            }
            [device] => *device,
            devices => {
                return Classification::new(
                    Status::AmbiguousDevice,
                    devices.iter().filter_map(|node| node.name()).join(", "),
                )
            }
        };

        let (sources, stopped): (Vec<_>, Vec<_>) = snapshot
            .sources(device.object_id)
            .into_iter()
            .partition(|node| node.is_active());
        let source = match sources.as_slice() {
            [] => {
                return Classification::new(Status::Idle, idle_detail(&stopped))
                    .on(device)
            }
            [source] => *source,
            sources => {
                return Classification::new(
                    Status::MultipleSources,
                    sources.iter().map(|node| node.display_name()).join(", "),
                )
                .on(device)
            }
        };

        let rate = match (source.rate, device.rate) {
            (Some(source_rate), Some(device_rate))
                if source_rate == device_rate =>
            {
                device_rate
            }
            (source_rate, device_rate) => {
                return Classification::new(
                    Status::SampleRateMismatch,
                    format!(
                        "{} -> {}",
                        format_rate(source_rate),
                        format_rate(device_rate)
                    ),
                )
                .on(device)
            }
        };

        let problems = [("source", source), ("device", device)]
            .into_iter()
            .filter_map(|(side, node)| self.volume_problem(side, node))
            .collect::<Vec<_>>();
        if !problems.is_empty() {
            return Classification::new(
                Status::VolumeNotUnity,
                problems.join("; "),
            )
            .on(device);
        }

        Classification::new(Status::BitPerfect(rate), rate.to_string())
            .on(device)
    }

    /// Describe why a node's volume isn't unity, if it isn't. Nodes that
    /// report no volume at all are taken to be at unity.
    fn volume_problem(&self, side: &str, node: &Node) -> Option<String> {
        let name = node.display_name();

        if node.mute == Some(true) {
            return Some(format!("{side} '{name}' is muted"));
        }

        let off = |volume: &f32| (volume - 1.0).abs() > self.volume_tolerance;

        if let Some(volume) = node.volume.filter(off) {
            return Some(format!(
                "{side} '{name}' volume {}",
                format_percent(volume)
            ));
        }

        if let Some(volumes) = node
            .channel_volumes
            .as_ref()
            .filter(|volumes| volumes.iter().any(off))
        {
            return Some(format!(
                "{side} '{name}' channel volumes {}",
                volumes.iter().copied().map(format_percent).join(", ")
            ));
        }

        None
    }
}

/// Classify with the default volume tolerance.
pub fn classify(snapshot: &Snapshot, target: &str) -> Classification {
    Classifier::new(target).classify(snapshot)
}

/// Linked sources that aren't running are listed with their state.
fn idle_detail(stopped: &[&Node]) -> String {
    if stopped.is_empty() {
        return String::from("no active stream");
    }
    format!(
        "no active stream ({})",
        stopped
            .iter()
            .map(|node| format!("{}: {}", node.display_name(), node.state))
            .join(", ")
    )
}

fn format_rate(rate: Option<u32>) -> String {
    rate.map_or_else(|| String::from("?"), |rate| rate.to_string())
}

fn format_percent(volume: f32) -> String {
    format!("{:.1}%", volume * 100.0)
}
