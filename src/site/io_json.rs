//! JSON persistence for site configurations.
//!
//! The site file is what the monitoring program reads after setup, and what
//! `pipark-setup validate` checks. The reference image itself is not
//! embedded; the file records its path and dimensions.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::model::SiteConfiguration;
use crate::error::SetupError;

/// Reads a site configuration from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_site_json(path: &Path) -> Result<SiteConfiguration, SetupError> {
    let file = File::open(path).map_err(SetupError::Io)?;
    let reader = BufReader::new(file);

    let mut site: SiteConfiguration =
        serde_json::from_reader(reader).map_err(|source| SetupError::SiteJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    site.restore_after_load();
    Ok(site)
}

/// Writes a site configuration to a JSON file.
///
/// Parent directories are created as needed.
pub fn write_site_json(path: &Path, site: &SiteConfiguration) -> Result<(), SetupError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path).map_err(SetupError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, site).map_err(|source| {
        SetupError::SiteJsonWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads a site configuration from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<SiteConfiguration, serde_json::Error> {
    let mut site: SiteConfiguration = serde_json::from_str(json)?;
    site.restore_after_load();
    Ok(site)
}

/// Reads a site configuration from JSON bytes.
pub fn from_json_slice(bytes: &[u8]) -> Result<SiteConfiguration, serde_json::Error> {
    let mut site: SiteConfiguration = serde_json::from_slice(bytes)?;
    site.restore_after_load();
    Ok(site)
}

/// Writes a site configuration to a JSON string.
pub fn to_json_string(site: &SiteConfiguration) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(site)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Coord, Rect, ReferenceImage, SpaceId};

    fn sample_site() -> SiteConfiguration {
        let mut site = SiteConfiguration::with_image(ReferenceImage::new(
            "./images/setup.jpeg",
            640,
            480,
            vec![0xff, 0xd8],
        ))
        .named("North car park");
        site.add_space(Rect::from_xyxy(10.0, 10.0, 110.0, 60.0))
            .expect("add space");
        let cp = site
            .add_control_point(Coord::new(20.0, 30.0))
            .expect("add control point");
        site.set_world_coordinate(cp, Some(Coord::new(1.5, 2.5)))
            .expect("set world");
        site
    }

    #[test]
    fn test_json_roundtrip_keeps_entries() {
        let original = sample_site();
        let json = to_json_string(&original).expect("serialization failed");
        let restored = from_json_str(&json).expect("deserialization failed");

        assert_eq!(restored.name.as_deref(), Some("North car park"));
        assert_eq!(restored.spaces(), original.spaces());
        assert_eq!(restored.control_points(), original.control_points());
        // image bytes are not persisted
        assert!(restored.image().expect("image").data.is_empty());
        assert_eq!(restored.image().expect("image").width, 640);
    }

    #[test]
    fn test_json_format() {
        let json = to_json_string(&sample_site()).expect("serialization failed");
        assert!(json.contains("\"spaces\""));
        assert!(json.contains("\"control_points\""));
        assert!(json.contains("\"xmin\": 10.0"));
        assert!(!json.contains("\"data\""));
        assert!(!json.contains("\"site_id\""));
    }

    #[test]
    fn test_load_restores_counters_from_existing_ids() {
        let json = r#"{
            "image": {"file_name": "setup.jpeg", "width": 640, "height": 480},
            "spaces": {
                "7": {"id": 7, "rect": {"xmin": 0, "ymin": 0, "xmax": 10, "ymax": 10}}
            }
        }"#;
        let mut site = from_json_str(json).expect("parse");
        assert!(!site.is_frozen());
        let id = site
            .add_space(Rect::from_xyxy(20.0, 20.0, 30.0, 30.0))
            .expect("add");
        assert_eq!(id, SpaceId(8));
    }

    #[test]
    fn test_load_registered_site_is_frozen() {
        let json = r#"{
            "site_id": "site-9",
            "image": {"file_name": "setup.jpeg", "width": 640, "height": 480}
        }"#;
        let site = from_json_str(json).expect("parse");
        assert!(site.is_frozen());
        assert_eq!(site.site_id().map(|s| s.as_str()), Some("site-9"));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("site.json");
        write_site_json(&path, &sample_site()).expect("write");
        let restored = read_site_json(&path).expect("read");
        assert_eq!(restored.spaces().len(), 1);
    }
}
