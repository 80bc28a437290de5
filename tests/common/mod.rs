#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use pipark_setup::capture::ImageSource;
use pipark_setup::controller::{SetupController, SetupOptions};
use pipark_setup::handoff::{Handoff, MonitorLauncher};
use pipark_setup::registration::{RegistrationClient, RegistrationError};
use pipark_setup::site::{ReferenceImage, SiteConfiguration, SiteId};
use pipark_setup::SetupError;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Camera that plays back a queue of results; an empty queue succeeds with
/// a 640x480 still.
#[derive(Default)]
pub struct FakeCamera {
    pub results: VecDeque<Result<(u32, u32), String>>,
}

impl FakeCamera {
    pub fn failing_once() -> Self {
        Self {
            results: VecDeque::from([Err("camera unplugged".to_string())]),
        }
    }
}

impl ImageSource for FakeCamera {
    fn capture(&mut self, _preview: bool) -> Result<ReferenceImage, SetupError> {
        match self.results.pop_front().unwrap_or(Ok((640, 480))) {
            Ok((width, height)) => Ok(ReferenceImage::new(
                "setup.jpeg",
                width,
                height,
                bmp_bytes(width, height),
            )),
            Err(reason) => Err(SetupError::Camera { reason }),
        }
    }
}

/// Fails with a network error `failures` times, then accepts.
pub struct FlakyRegistrar {
    pub failures: usize,
    pub calls: Rc<Cell<usize>>,
    pub site_id: String,
}

impl FlakyRegistrar {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: Rc::new(Cell::new(0)),
            site_id: "site-42".to_string(),
        }
    }
}

impl RegistrationClient for FlakyRegistrar {
    fn submit(&mut self, site: &SiteConfiguration) -> Result<SiteId, RegistrationError> {
        assert!(site.is_frozen(), "site must be frozen while submitting");
        let call = self.calls.get();
        self.calls.set(call + 1);
        if call < self.failures {
            Err(RegistrationError::Network("connection refused".into()))
        } else {
            Ok(SiteId::new(self.site_id.clone()))
        }
    }
}

#[derive(Default)]
pub struct RecordingLauncher {
    pub persisted: Rc<Cell<usize>>,
    pub launched: Rc<Cell<usize>>,
}

impl MonitorLauncher for RecordingLauncher {
    fn persist(&mut self, _site: &SiteConfiguration) -> Result<PathBuf, SetupError> {
        self.persisted.set(self.persisted.get() + 1);
        Ok("pipark_site.json".into())
    }

    fn launch(&mut self, site: &SiteConfiguration) -> Result<Handoff, SetupError> {
        self.launched.set(self.launched.get() + 1);
        let site_id = site
            .site_id()
            .cloned()
            .ok_or_else(|| SetupError::State {
                message: "not registered".into(),
            })?;
        Ok(Handoff {
            site_id,
            site_file: "pipark_site.json".into(),
        })
    }
}

pub fn controller_with(camera: FakeCamera, registrar: FlakyRegistrar) -> SetupController {
    SetupController::new(
        SetupOptions::default(),
        Box::new(camera),
        Box::new(registrar),
        Box::new(RecordingLauncher::default()),
    )
}

pub fn controller() -> SetupController {
    controller_with(FakeCamera::default(), FlakyRegistrar::new(0))
}
