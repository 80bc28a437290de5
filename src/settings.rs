//! Layered setup settings.
//!
//! Built-in defaults, then an optional YAML file, then command-line flags.
//!
//! ```yaml
//! server: https://pipark.example/api
//! setup_image: /home/pi/pipark/images/setup.jpeg
//! site_file: /home/pi/pipark/site.json
//! capture_command: [raspistill, -o, "{output}", -t, "1000"]
//! preview_args: [-p, "0,0,640,480"]
//! pick_radius: 12
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::controller::SetupOptions;
use crate::editor::DEFAULT_PICK_RADIUS;
use crate::error::SetupError;

pub const DEFAULT_SETUP_IMAGE: &str = "./images/setup.jpeg";
pub const DEFAULT_SITE_FILE: &str = "./pipark_site.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupSettings {
    /// Base URL of the registration server.
    pub server: Option<String>,
    /// Request timeout for registration, in seconds.
    pub timeout_secs: u64,
    /// Where the setup image is stored (and captured to).
    pub setup_image: PathBuf,
    /// Where the registered site is written for the monitoring program.
    pub site_file: PathBuf,
    /// Camera program and arguments; `{output}` is replaced by the target path.
    pub capture_command: Option<Vec<String>>,
    /// Appended to the capture command when a preview is wanted.
    pub preview_args: Vec<String>,
    pub preview: bool,
    pub name: Option<String>,
    pub pick_radius: f64,
    pub verbose: bool,
}

impl Default for SetupSettings {
    fn default() -> Self {
        Self {
            server: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            setup_image: PathBuf::from(DEFAULT_SETUP_IMAGE),
            site_file: PathBuf::from(DEFAULT_SITE_FILE),
            capture_command: None,
            preview_args: Vec::new(),
            preview: false,
            name: None,
            pick_radius: DEFAULT_PICK_RADIUS,
            verbose: false,
        }
    }
}

/// Values given on the command line; `None` keeps the file or default value.
#[derive(Clone, Debug, Default)]
pub struct SettingsOverrides {
    pub server: Option<String>,
    pub setup_image: Option<PathBuf>,
    pub site_file: Option<PathBuf>,
    pub name: Option<String>,
    pub pick_radius: Option<f64>,
    pub verbose: bool,
}

impl SetupSettings {
    /// Reads a YAML settings file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        let data = fs::read_to_string(path)?;
        Self::from_yaml_str(&data).map_err(|source| SetupError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Loads `path` if given, applies `overrides` and checks the result.
    pub fn resolve(path: Option<&Path>, overrides: SettingsOverrides) -> Result<Self, SetupError> {
        let mut settings = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        settings.apply(overrides);
        settings.check()?;
        Ok(settings)
    }

    pub fn apply(&mut self, overrides: SettingsOverrides) {
        if let Some(server) = overrides.server {
            self.server = Some(server);
        }
        if let Some(setup_image) = overrides.setup_image {
            self.setup_image = setup_image;
        }
        if let Some(site_file) = overrides.site_file {
            self.site_file = site_file;
        }
        if let Some(name) = overrides.name {
            self.name = Some(name);
        }
        if let Some(pick_radius) = overrides.pick_radius {
            self.pick_radius = pick_radius;
        }
        self.verbose |= overrides.verbose;
    }

    pub fn check(&self) -> Result<(), SetupError> {
        if !(self.pick_radius.is_finite() && self.pick_radius > 0.0) {
            return Err(SetupError::InvalidSetting {
                message: format!("pick radius must be a positive number, got {}", self.pick_radius),
            });
        }
        if self.timeout_secs == 0 {
            return Err(SetupError::InvalidSetting {
                message: "timeout_secs must be at least 1".into(),
            });
        }
        if self
            .capture_command
            .as_ref()
            .is_some_and(|command| command.is_empty())
        {
            return Err(SetupError::InvalidSetting {
                message: "capture_command must name a program".into(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn setup_options(&self) -> SetupOptions {
        SetupOptions {
            verbose: self.verbose,
            preview: self.preview,
            pick_radius: self.pick_radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SetupSettings::default();
        assert_eq!(settings.setup_image, PathBuf::from("./images/setup.jpeg"));
        assert_eq!(settings.pick_radius, 10.0);
        assert_eq!(settings.timeout(), Duration::from_secs(10));
        assert!(settings.server.is_none());
        assert!(settings.check().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = SetupSettings::from_yaml_str(
            "server: https://pipark.example/api\ncapture_command: [raspistill, -o, '{output}']\n",
        )
        .expect("parse");
        assert_eq!(settings.server.as_deref(), Some("https://pipark.example/api"));
        assert_eq!(
            settings.capture_command,
            Some(vec!["raspistill".into(), "-o".into(), "{output}".into()])
        );
        assert_eq!(settings.site_file, PathBuf::from(DEFAULT_SITE_FILE));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            SetupSettings::from_yaml_str("\n").expect("parse"),
            SetupSettings::default()
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(SetupSettings::from_yaml_str("sever: http://typo\n").is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pipark.yaml");
        fs::write(&path, "server: http://from-file\npick_radius: 4\n").expect("write");

        let settings = SetupSettings::resolve(
            Some(&path),
            SettingsOverrides {
                server: Some("http://from-cli".into()),
                verbose: true,
                ..SettingsOverrides::default()
            },
        )
        .expect("resolve");
        assert_eq!(settings.server.as_deref(), Some("http://from-cli"));
        assert_eq!(settings.pick_radius, 4.0);
        assert!(settings.setup_options().verbose);
    }

    #[test]
    fn test_bad_yaml_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pipark.yaml");
        fs::write(&path, "pick_radius: [1, 2]\n").expect("write");
        let err = SetupSettings::load(&path).unwrap_err();
        assert!(matches!(err, SetupError::SettingsParse { .. }));
    }

    #[test]
    fn test_non_positive_pick_radius_rejected() {
        let err = SetupSettings::resolve(
            None,
            SettingsOverrides {
                pick_radius: Some(0.0),
                ..SettingsOverrides::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, SetupError::InvalidSetting { .. }));
    }
}
