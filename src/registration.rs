//! Registering a finished site with the PiPark server.
//!
//! The controller only sees the [`RegistrationClient`] trait. The payload
//! format is owned here so every client submits the same document:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "name": "North car park",
//!   "image": { "width": 640, "height": 480 },
//!   "spaces": [ { "id": 1, "rect": { "xmin": 10.0, "ymin": 10.0, "xmax": 110.0, "ymax": 60.0 } } ],
//!   "control_points": [ { "id": 1, "position": { "x": 0.0, "y": 0.0 }, "world": { "x": 0.0, "y": 0.0 } } ],
//!   "calibration": { "kind": "absolute", "image_to_world": [[0.05, 0.0, 0.0], [0.0, 0.05, 0.0]] }
//! }
//! ```

use serde::Serialize;
use thiserror::Error;

use crate::calibration::Calibration;
use crate::site::{ControlPoint, ParkingSpace, SiteConfiguration, SiteId};

/// Version of the registration document layout.
pub const PAYLOAD_FORMAT_VERSION: u32 = 1;

/// Why a registration attempt failed. All variants are recoverable: the
/// operator can fix the configuration or retry.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The server could not be reached or the connection failed.
    #[error("network error: {0}")]
    Network(String),

    /// The configuration was refused as invalid.
    #[error("configuration rejected: {0}")]
    Validation(String),

    /// The server refused the request for another reason, or replied with
    /// something other than a site id.
    #[error("server rejected registration: {0}")]
    ServerRejected(String),
}

/// Submits a finished site configuration and returns the assigned site id.
pub trait RegistrationClient {
    fn submit(&mut self, site: &SiteConfiguration) -> Result<SiteId, RegistrationError>;
}

/// Image summary sent to the server; the still itself stays on the device.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ImageSummary {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationPayload {
    Absolute { image_to_world: [[f64; 3]; 2] },
    Relative,
}

/// The document submitted for registration.
#[derive(Clone, Debug, Serialize)]
pub struct RegistrationPayload<'a> {
    pub format_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    pub image: ImageSummary,
    pub spaces: Vec<&'a ParkingSpace>,
    pub control_points: Vec<&'a ControlPoint>,
    pub calibration: CalibrationPayload,
}

impl<'a> RegistrationPayload<'a> {
    /// Builds the payload for a site.
    ///
    /// # Errors
    /// `Validation` if the site has no reference image.
    pub fn from_site(site: &'a SiteConfiguration) -> Result<Self, RegistrationError> {
        let image = site
            .image()
            .ok_or_else(|| RegistrationError::Validation("site has no reference image".into()))?;

        let calibration = match Calibration::from_site(site) {
            Calibration::Absolute(transform) => CalibrationPayload::Absolute {
                image_to_world: transform.rows,
            },
            Calibration::Relative => CalibrationPayload::Relative,
        };

        Ok(Self {
            format_version: PAYLOAD_FORMAT_VERSION,
            name: site.name.as_deref(),
            image: ImageSummary {
                width: image.width,
                height: image.height,
            },
            spaces: site.spaces().values().collect(),
            control_points: site.control_points().values().collect(),
            calibration,
        })
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Stand-in used when no registration server is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredRegistrar;

impl RegistrationClient for UnconfiguredRegistrar {
    fn submit(&mut self, _site: &SiteConfiguration) -> Result<SiteId, RegistrationError> {
        Err(RegistrationError::Network(
            "no registration server configured (set --server or `server` in the settings file)"
                .into(),
        ))
    }
}

#[cfg(feature = "remote")]
pub use http::HttpRegistrationClient;

#[cfg(feature = "remote")]
mod http {
    use std::time::Duration;

    use serde::Deserialize;
    use tracing::debug;

    use super::{RegistrationClient, RegistrationError, RegistrationPayload};
    use crate::error::SetupError;
    use crate::site::{SiteConfiguration, SiteId};

    #[derive(Deserialize)]
    struct RegisterResponse {
        site_id: String,
    }

    /// Registers sites by POSTing the payload to `<server>/sites`.
    pub struct HttpRegistrationClient {
        endpoint: url::Url,
        agent: ureq::Agent,
    }

    impl HttpRegistrationClient {
        pub fn new(server: &str, timeout: Duration) -> Result<Self, SetupError> {
            let invalid = |message: String| SetupError::InvalidSetting {
                message: format!("registration server '{}': {}", server, message),
            };

            let mut base = url::Url::parse(server).map_err(|source| invalid(source.to_string()))?;
            if !base.path().ends_with('/') {
                let path = format!("{}/", base.path());
                base.set_path(&path);
            }
            let endpoint = base
                .join("sites")
                .map_err(|source| invalid(source.to_string()))?;

            let config = ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .build();
            let agent: ureq::Agent = config.into();

            Ok(Self { endpoint, agent })
        }

        pub fn endpoint(&self) -> &url::Url {
            &self.endpoint
        }
    }

    impl RegistrationClient for HttpRegistrationClient {
        fn submit(&mut self, site: &SiteConfiguration) -> Result<SiteId, RegistrationError> {
            let payload = RegistrationPayload::from_site(site)?;
            debug!(endpoint = %self.endpoint, "submitting registration");

            let mut response = self
                .agent
                .post(self.endpoint.as_str())
                .send_json(&payload)
                .map_err(map_request_error)?;

            let body: RegisterResponse = response.body_mut().read_json().map_err(|source| {
                RegistrationError::ServerRejected(format!("unreadable response: {}", source))
            })?;

            let site_id = body.site_id.trim();
            if site_id.is_empty() {
                return Err(RegistrationError::ServerRejected(
                    "server returned an empty site id".into(),
                ));
            }
            Ok(SiteId::new(site_id))
        }
    }

    pub(super) fn map_request_error(error: ureq::Error) -> RegistrationError {
        match error {
            ureq::Error::StatusCode(status @ (400 | 422)) => RegistrationError::Validation(
                format!("server refused the configuration (HTTP {})", status),
            ),
            ureq::Error::StatusCode(status) => {
                RegistrationError::ServerRejected(format!("HTTP {}", status))
            }
            other => RegistrationError::Network(other.to_string()),
        }
    }
}
