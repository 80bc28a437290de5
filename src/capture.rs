//! Reference image acquisition.
//!
//! An [`ImageSource`] produces one still on request. The controller asks the
//! operator for confirmation before calling it, so sources never prompt.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::SetupError;
use crate::site::ReferenceImage;

/// Something that can take a still photo of the car park.
pub trait ImageSource {
    /// Blocks until a still is available.
    ///
    /// `preview` asks the source to show a live preview while capturing, if
    /// it can.
    fn capture(&mut self, preview: bool) -> Result<ReferenceImage, SetupError>;
}

/// Reads a still from disk and checks it is a non-empty image.
pub fn read_still(path: &Path) -> Result<ReferenceImage, SetupError> {
    let data = fs::read(path).map_err(|source| {
        SetupError::camera(format!("cannot read still {}: {}", path.display(), source))
    })?;
    still_from_bytes(path, data)
}

fn still_from_bytes(path: &Path, data: Vec<u8>) -> Result<ReferenceImage, SetupError> {
    if data.is_empty() {
        return Err(SetupError::camera(format!(
            "still {} is empty",
            path.display()
        )));
    }
    let size = imagesize::blob_size(&data).map_err(|source| {
        SetupError::camera(format!(
            "still {} is not a readable image: {}",
            path.display(),
            source
        ))
    })?;
    let (width, height) = (
        u32::try_from(size.width).unwrap_or(0),
        u32::try_from(size.height).unwrap_or(0),
    );
    if width == 0 || height == 0 {
        return Err(SetupError::camera(format!(
            "still {} has no pixels ({}x{})",
            path.display(),
            size.width,
            size.height
        )));
    }

    Ok(ReferenceImage::new(
        path.to_string_lossy(),
        width,
        height,
        data,
    ))
}

/// Uses a still that already exists on disk.
///
/// This is the fallback when no camera command is configured: the operator
/// drops a photo at the setup image path and "captures" it.
#[derive(Clone, Debug)]
pub struct StillFileSource {
    path: PathBuf,
}

impl StillFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ImageSource for StillFileSource {
    fn capture(&mut self, _preview: bool) -> Result<ReferenceImage, SetupError> {
        debug!(path = %self.path.display(), "reading still from disk");
        read_still(&self.path)
    }
}

/// Captures stills by running an external camera program.
///
/// Arguments may contain `{output}`, which is replaced by a staging path.
/// Once the program exits successfully the still is moved to `output`, so a
/// failed capture never clobbers the previous setup image.
#[derive(Clone, Debug)]
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
    preview_args: Vec<String>,
    output: PathBuf,
}

impl CommandCamera {
    /// `command` is the program followed by its arguments.
    pub fn new(command: &[String], output: impl Into<PathBuf>) -> Result<Self, SetupError> {
        let (program, args) = command.split_first().ok_or_else(|| SetupError::InvalidSetting {
            message: "capture command is empty".into(),
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            preview_args: Vec::new(),
            output: output.into(),
        })
    }

    /// Extra arguments appended when a preview is requested.
    pub fn with_preview_args(mut self, preview_args: Vec<String>) -> Self {
        self.preview_args = preview_args;
        self
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .output
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "setup".into());
        name.push(".capture");
        self.output.with_file_name(name)
    }
}

impl ImageSource for CommandCamera {
    fn capture(&mut self, preview: bool) -> Result<ReferenceImage, SetupError> {
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                SetupError::camera(format!("cannot create {}: {}", parent.display(), source))
            })?;
        }

        let staging = self.staging_path();
        let staging_str = staging.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace("{output}", &staging_str))
            .collect();
        if preview {
            args.extend(self.preview_args.iter().cloned());
        }

        info!(program = %self.program, ?args, "starting camera");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| {
                SetupError::camera(format!(
                    "failed to set up and start camera '{}': {}",
                    self.program, source
                ))
            })?;

        if !output.status.success() {
            let _ = fs::remove_file(&staging);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SetupError::camera(format!(
                "camera '{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let data = fs::read(&staging).map_err(|source| {
            SetupError::camera(format!(
                "camera '{}' produced no still at {}: {}",
                self.program,
                staging.display(),
                source
            ))
        })?;
        // Check before replacing the previous setup image.
        let image = still_from_bytes(&self.output, data)?;
        fs::rename(&staging, &self.output).map_err(|source| {
            SetupError::camera(format!(
                "cannot move still into place at {}: {}",
                self.output.display(),
                source
            ))
        })?;
        Ok(image)
    }
}
