//! Handing a registered site over to the monitoring program.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::SetupError;
use crate::site::{io_json, SiteConfiguration, SiteId};

/// Result of a successful hand-off.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handoff {
    pub site_id: SiteId,
    /// Where the finalized site file was written.
    pub site_file: PathBuf,
}

/// Passes a finalized site configuration to whatever monitors the car park.
pub trait MonitorLauncher {
    /// Stores a freshly registered site so it outlives the session.
    ///
    /// Called once, right after registration succeeds.
    fn persist(&mut self, site: &SiteConfiguration) -> Result<PathBuf, SetupError>;

    fn launch(&mut self, site: &SiteConfiguration) -> Result<Handoff, SetupError>;
}

/// Persists the finalized site as JSON for the monitoring program to pick up.
#[derive(Clone, Debug)]
pub struct SiteFileHandoff {
    path: PathBuf,
}

impl SiteFileHandoff {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, site: &SiteConfiguration) -> Result<SiteId, SetupError> {
        let site_id = site
            .site_id()
            .cloned()
            .ok_or_else(|| SetupError::state("only a registered site can be handed off"))?;
        io_json::write_site_json(&self.path, site)?;
        Ok(site_id)
    }
}

impl MonitorLauncher for SiteFileHandoff {
    fn persist(&mut self, site: &SiteConfiguration) -> Result<PathBuf, SetupError> {
        let site_id = self.write(site)?;
        info!(site = %site_id, path = %self.path.display(), "registered site saved");
        Ok(self.path.clone())
    }

    fn launch(&mut self, site: &SiteConfiguration) -> Result<Handoff, SetupError> {
        // Rewritten in case the file was removed since registration.
        let site_id = self.write(site)?;
        info!(site = %site_id, path = %self.path.display(), "site handed off to monitoring");

        Ok(Handoff {
            site_id,
            site_file: self.path.clone(),
        })
    }
}
