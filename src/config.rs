//! Probe configuration.

use std::convert::TryFrom;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::classify::VOLUME_TOLERANCE;
use crate::opt::Opt;
use crate::render::{Format, Renderer};

#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    pub remote: Option<String>,
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub volume_tolerance: f32,
    pub renderer: Renderer,
}

/// Represents a configuration deserialized from a file. Command-line
/// options are applied on top of it before it gets baked into a Config.
#[derive(Deserialize, Debug)]
#[cfg_attr(test, derive(PartialEq))]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    remote: Option<String>,
    #[serde(default = "default_command")]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
    #[serde(default = "default_volume_tolerance")]
    volume_tolerance: f32,
    #[serde(default)]
    format: Format,
    #[serde(default = "default_ok_color")]
    ok_color: String,
    #[serde(default = "default_error_color")]
    error_color: String,
}

fn default_command() -> String {
    String::from("pw-dump")
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_volume_tolerance() -> f32 {
    VOLUME_TOLERANCE
}

fn default_ok_color() -> String {
    String::from("White")
}

fn default_error_color() -> String {
    String::from("Red")
}

impl ConfigFile {
    /// Override configuration with command-line arguments.
    pub fn apply_opt(&mut self, opt: &Opt) {
        if let Some(remote) = &opt.remote {
            self.remote = Some(remote.clone());
        }

        if let Some(command) = &opt.command {
            self.command = command.clone();
        }

        if let Some(timeout_ms) = opt.timeout {
            self.timeout_ms = timeout_ms;
        }

        if let Some(volume_tolerance) = opt.volume_tolerance {
            self.volume_tolerance = volume_tolerance;
        }

        if let Some(format) = opt.format {
            self.format = format;
        }
    }
}

impl TryFrom<ConfigFile> for Config {
    type Error = anyhow::Error;

    fn try_from(config_file: ConfigFile) -> Result<Self, Self::Error> {
        if config_file.command.is_empty() {
            anyhow::bail!("command is empty");
        }

        if config_file.timeout_ms == 0 {
            anyhow::bail!("timeout_ms must be greater than 0");
        }

        let volume_tolerance = config_file.volume_tolerance;
        if !(0.0..1.0).contains(&volume_tolerance) {
            anyhow::bail!(
                "volume_tolerance {volume_tolerance} is not between 0 and 1"
            );
        }

        Ok(Self {
            remote: config_file.remote,
            command: config_file.command,
            args: config_file.args,
            timeout: Duration::from_millis(config_file.timeout_ms),
            volume_tolerance,
            renderer: Renderer {
                format: config_file.format,
                ok_color: config_file.ok_color,
                error_color: config_file.error_color,
            },
        })
    }
}

impl Config {
    /// Returns the configuration file path.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            return Some(
                Path::new(&xdg_config).join("pwgenmon/pwgenmon.toml"),
            );
        }

        if let Ok(home) = env::var("HOME") {
            return Some(
                Path::new(&home).join(".config/pwgenmon/pwgenmon.toml"),
            );
        }

        None
    }

    /// Parse configuration from the file at the supplied path. A missing
    /// file just means defaults.
    pub fn try_new(
        path: Option<&Path>,
        opt: &Opt,
    ) -> Result<Self, anyhow::Error> {
        let mut config_file: ConfigFile = match path {
            Some(path) if path.exists() => {
                let context = || {
                    format!(
                        "Failed to read configuration from file '{}'",
                        path.display()
                    )
                };

                let toml_str =
                    fs::read_to_string(path).with_context(context)?;

                toml::from_str(&toml_str).with_context(context)?
            }
            _ => toml::from_str("")?,
        };
        // Override with command-line options
        config_file.apply_opt(opt);
        let config_file = config_file;

        Self::try_from(config_file)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    use clap::Parser;

    fn opt(args: &[&str]) -> Opt {
        let mut argv = vec!["pwgenmon"];
        argv.extend_from_slice(args);
        argv.push("Topping");
        Opt::try_parse_from(argv).unwrap()
    }

    fn config(toml_str: &str, opt: &Opt) -> anyhow::Result<Config> {
        let mut config_file: ConfigFile = toml::from_str(toml_str)?;
        config_file.apply_opt(opt);
        Config::try_from(config_file)
    }

    #[test]
    fn defaults() {
        let config = config("", &opt(&[])).unwrap();

        assert_eq!(config.remote, None);
        assert_eq!(config.command, "pw-dump");
        assert!(config.args.is_empty());
        assert_eq!(config.timeout, Duration::from_millis(2000));
        assert_eq!(config.volume_tolerance, VOLUME_TOLERANCE);
        assert_eq!(config.renderer.format, Format::Genmon);
        assert_eq!(config.renderer.ok_color, "White");
        assert_eq!(config.renderer.error_color, "Red");
    }

    #[test]
    fn options_override_file() {
        let toml_str = r#"
        command = "/opt/pipewire/bin/pw-dump"
        timeout_ms = 5000
        format = "plain"
        "#;
        let opt = opt(&["-t", "750", "-r", "pipewire-1", "-f", "genmon"]);
        let config = config(toml_str, &opt).unwrap();

        assert_eq!(config.command, "/opt/pipewire/bin/pw-dump");
        assert_eq!(config.timeout, Duration::from_millis(750));
        assert_eq!(config.remote.as_deref(), Some("pipewire-1"));
        assert_eq!(config.renderer.format, Format::Genmon);
    }

    #[test]
    fn unknown_field_config_file() {
        let config = r#"
        unknown = "unknown"
        "#;
        assert!(toml::from_str::<ConfigFile>(config).is_err());
    }

    #[test]
    fn unknown_format() {
        assert!(toml::from_str::<ConfigFile>(r#"format = "html""#).is_err());
    }

    #[test]
    fn zero_timeout() {
        assert!(config("timeout_ms = 0", &opt(&[])).is_err());
    }

    #[test]
    fn empty_command() {
        assert!(config("", &opt(&["--command", ""])).is_err());
    }

    #[test]
    fn negative_tolerance() {
        assert!(config("volume_tolerance = -0.1", &opt(&[])).is_err());
    }

    #[test]
    fn missing_file_is_defaults() {
        let path = Path::new("/nonexistent/pwgenmon.toml");
        let config = Config::try_new(Some(path), &opt(&[])).unwrap();
        assert_eq!(config, Config::try_new(None, &opt(&[])).unwrap());
    }

    #[test]
    fn example_config_file_loads() {
        let path =
            Path::new(env!("CARGO_MANIFEST_DIR")).join("pwgenmon.toml");
        let config =
            Config::try_new(Some(path.as_path()), &opt(&[])).unwrap();
        assert_eq!(config, Config::try_new(None, &opt(&[])).unwrap());
    }

    #[test]
    fn example_config_file_matches_default_config_file() {
        let toml_str = include_str!("../pwgenmon.toml");
        let example: strict::ConfigFile = toml::from_str(toml_str).unwrap();
        let default: ConfigFile = toml::from_str("").unwrap();

        assert_eq!(default, example.into());
    }
}
