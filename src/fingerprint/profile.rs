//! Recorded browser signals. A profile is what a browser reported at one point in
//! time, so the same hashing can run headless (CLI, tests) and give the digest the
//! browser would have produced.

use super::components::{ComponentError, GpuInfo, ScreenGeometry, SignalSource};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid profile json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Snapshot of browser signals. Missing probes behave like probes the browser blocked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalProfile {
    pub user_agent: String,
    pub screen: Option<ScreenGeometry>,
    pub time_zone: String,
    pub utc_offset_minutes: i32,
    pub language: String,
    pub languages: Vec<String>,
    pub platform: String,
    pub hardware_concurrency: Option<u32>,
    pub device_memory: Option<f64>,
    pub canvas: Option<String>,
    pub gpu: Option<GpuInfo>,
    pub audio: Option<String>,
}

impl SignalProfile {
    /// Loads a profile from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid profile.
    pub fn from_path(path: &Path) -> Result<Self, ProfileError> {
        let raw = fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// # Errors
    ///
    /// Returns an error if the document is not a valid profile.
    pub fn from_json(raw: &str) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl SignalSource for SignalProfile {
    fn user_agent(&self) -> Result<String, ComponentError> {
        Ok(self.user_agent.clone())
    }

    fn screen(&self) -> Result<ScreenGeometry, ComponentError> {
        self.screen.ok_or(ComponentError::Unsupported)
    }

    fn time_zone(&self) -> Result<String, ComponentError> {
        Ok(self.time_zone.clone())
    }

    fn utc_offset_minutes(&self) -> Result<i32, ComponentError> {
        Ok(self.utc_offset_minutes)
    }

    fn language(&self) -> Result<String, ComponentError> {
        Ok(self.language.clone())
    }

    fn languages(&self) -> Result<Vec<String>, ComponentError> {
        Ok(self.languages.clone())
    }

    fn platform(&self) -> Result<String, ComponentError> {
        Ok(self.platform.clone())
    }

    fn hardware_concurrency(&self) -> Result<Option<u32>, ComponentError> {
        Ok(self.hardware_concurrency)
    }

    fn device_memory(&self) -> Result<Option<f64>, ComponentError> {
        Ok(self.device_memory)
    }

    fn canvas(&self) -> Result<String, ComponentError> {
        self.canvas.clone().ok_or(ComponentError::Unsupported)
    }

    fn gpu(&self) -> Result<Option<GpuInfo>, ComponentError> {
        Ok(self.gpu.clone())
    }

    fn audio(&self) -> Result<String, ComponentError> {
        self.audio.clone().ok_or(ComponentError::Unsupported)
    }
}
