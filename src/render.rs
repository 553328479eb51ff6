//! Output for the panel.

use serde::Deserialize;

use crate::classify::Classification;

#[derive(Deserialize, Default, Debug, Clone, Copy, PartialEq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// XFCE Generic Monitor markup.
    #[default]
    Genmon,
    /// Status on the first line, tooltip below.
    Plain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Renderer {
    pub format: Format,
    pub ok_color: String,
    pub error_color: String,
}

impl Renderer {
    pub fn render(&self, classification: &Classification) -> String {
        let token = classification.status.token();
        let tooltip = tooltip(classification);

        match self.format {
            Format::Genmon => {
                let color = if classification.status.is_error() {
                    &self.error_color
                } else {
                    &self.ok_color
                };
                format!(
                    "<txt><span color='{}'>{}</span></txt><tool>{}</tool>",
                    escape(color),
                    escape(&token),
                    escape(&tooltip)
                )
            }
            Format::Plain => format!("{token}\n{tooltip}"),
        }
    }
}

fn tooltip(classification: &Classification) -> String {
    match &classification.device {
        Some(device) => format!("{device}: {}", classification.detail),
        None => classification.detail.clone(),
    }
}

/// Escape text for Pango markup.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&apos;"),
            '"' => escaped.push_str("&quot;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::classify::Status;

    fn renderer(format: Format) -> Renderer {
        Renderer {
            format,
            ok_color: String::from("White"),
            error_color: String::from("Red"),
        }
    }

    fn classification(
        status: Status,
        detail: &str,
        device: Option<&str>,
    ) -> Classification {
        Classification {
            status,
            detail: String::from(detail),
            device: device.map(String::from),
        }
    }

    #[test]
    fn genmon_bit_perfect() {
        let output = renderer(Format::Genmon).render(&classification(
            Status::BitPerfect(96000),
            "96000",
            Some("E30 Analog Stereo"),
        ));
        assert_eq!(
            output,
            "<txt><span color='White'>96000</span></txt>\
             <tool>E30 Analog Stereo: 96000</tool>"
        );
    }

    #[test]
    fn genmon_error_is_escaped() {
        let output = renderer(Format::Genmon).render(&classification(
            Status::SampleRateMismatch,
            "44100 -> 48000",
            Some("Tom's DAC"),
        ));
        assert_eq!(
            output,
            "<txt><span color='Red'>Freq Err</span></txt>\
             <tool>Tom&apos;s DAC: 44100 -&gt; 48000</tool>"
        );
    }

    #[test]
    fn genmon_not_found_is_not_an_error() {
        let output = renderer(Format::Genmon).render(&classification(
            Status::DeviceNotFound,
            "Topping",
            None,
        ));
        assert_eq!(
            output,
            "<txt><span color='White'>N/A</span></txt><tool>Topping</tool>"
        );
    }

    #[test]
    fn plain() {
        let output = renderer(Format::Plain).render(&classification(
            Status::ProviderError,
            "Failed to run 'pw-dump': timed out after 2000 ms",
            None,
        ));
        assert_eq!(
            output,
            "Err\nFailed to run 'pw-dump': timed out after 2000 ms"
        );
    }

    #[test]
    fn escape_all() {
        assert_eq!(
            escape(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&apos;"
        );
    }
}
