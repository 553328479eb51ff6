//! Interpretation of the `media.class` node property.

#[derive(Debug, Clone, PartialEq)]
pub struct MediaClass(String);

impl From<&str> for MediaClass {
    fn from(s: &str) -> Self {
        MediaClass(s.to_string())
    }
}

impl MediaClass {
    /// A device node that consumes audio, i.e. something that can be the
    /// target. Application streams are never targets, even though they
    /// are linked the same way.
    pub fn is_sink(&self) -> bool {
        matches!(self.0.as_str(), "Audio/Sink" | "Audio/Duplex")
    }
}
