//! Site validation.
//!
//! Checks whether a site configuration is ready for registration:
//! - A usable reference image
//! - Parking spaces that are well-formed, unique and inside the image
//! - Enough non-collinear control points for calibration

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use crate::calibration::{spans_plane, COLLINEAR_TOLERANCE_PX, MIN_CONTROL_POINTS};
use crate::site::{Coord, Pixel, ReferenceImage, SiteConfiguration};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates a site configuration and returns a report of all issues found.
pub fn validate_site(site: &SiteConfiguration, _opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    let image = validate_image(site.image(), &mut report);
    validate_spaces(site, image, &mut report);
    validate_control_points(site, image, &mut report);

    report
}

/// Returns the image only if later bounds checks can use it.
fn validate_image<'a>(
    image: Option<&'a ReferenceImage>,
    report: &mut ValidationReport,
) -> Option<&'a ReferenceImage> {
    match image {
        None => {
            report.add(ValidationIssue::error(
                IssueCode::MissingImage,
                "No setup image has been taken",
                IssueContext::Image,
            ));
            None
        }
        Some(image) if image.is_empty() => {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image,
            ));
            None
        }
        Some(image) => Some(image),
    }
}

fn validate_spaces(
    site: &SiteConfiguration,
    image: Option<&ReferenceImage>,
    report: &mut ValidationReport,
) {
    if site.spaces().is_empty() {
        report.add(ValidationIssue::error(
            IssueCode::NoParkingSpaces,
            "At least one parking space is required",
            IssueContext::Site,
        ));
        return;
    }

    let spaces: Vec<_> = site.spaces().iter().collect();
    for (idx, (key, space)) in spaces.iter().enumerate() {
        let id = key.as_u64();
        let rect = &space.rect;

        if space.id != **key {
            report.add(ValidationIssue::error(
                IssueCode::IdMismatch,
                format!("Stored under id {} but records id {}", key, space.id),
                IssueContext::Space { id },
            ));
        }

        if !rect.is_finite() {
            report.add(ValidationIssue::error(
                IssueCode::NonFiniteCoordinates,
                format!("Non-finite coordinates {:?}", rect),
                IssueContext::Space { id },
            ));
            continue; // Skip further checks if coordinates are invalid
        }

        if rect.is_degenerate() {
            report.add(ValidationIssue::error(
                IssueCode::DegenerateSpace,
                format!("Zero width or height: {}", rect),
                IssueContext::Space { id },
            ));
        }

        if let Some(image) = image {
            if !rect.is_within(f64::from(image.width), f64::from(image.height)) {
                report.add(ValidationIssue::error(
                    IssueCode::SpaceOutOfBounds,
                    format!(
                        "Rectangle {} extends outside image bounds (0, 0, {}, {})",
                        rect, image.width, image.height
                    ),
                    IssueContext::Space { id },
                ));
            }
        }

        // Compare only against earlier spaces so each pair is reported once.
        for (_, earlier) in &spaces[..idx] {
            if earlier.rect == *rect {
                report.add(ValidationIssue::error(
                    IssueCode::DuplicateSpace,
                    format!("Identical to space {}", earlier.id),
                    IssueContext::Space { id },
                ));
            } else if earlier.rect.intersects(rect) {
                report.add(ValidationIssue::warning(
                    IssueCode::OverlappingSpaces,
                    format!("Overlaps space {}", earlier.id),
                    IssueContext::Space { id },
                ));
            }
        }
    }
}

fn validate_control_points(
    site: &SiteConfiguration,
    image: Option<&ReferenceImage>,
    report: &mut ValidationReport,
) {
    let count = site.control_points().len();
    if count < MIN_CONTROL_POINTS {
        report.add(ValidationIssue::error(
            IssueCode::InsufficientControlPoints,
            format!(
                "minimum {} control points required, found {}",
                MIN_CONTROL_POINTS, count
            ),
            IssueContext::Site,
        ));
    }

    let mut positions: Vec<Coord<Pixel>> = Vec::with_capacity(count);
    for (key, point) in site.control_points() {
        let id = key.as_u64();

        if point.id != *key {
            report.add(ValidationIssue::error(
                IssueCode::IdMismatch,
                format!("Stored under id {} but records id {}", key, point.id),
                IssueContext::ControlPoint { id },
            ));
        }

        if !point.position.is_finite() || !point.world.map_or(true, |w| w.is_finite()) {
            report.add(ValidationIssue::error(
                IssueCode::NonFiniteCoordinates,
                format!("Non-finite coordinates at {:?}", point.position),
                IssueContext::ControlPoint { id },
            ));
            continue;
        }
        positions.push(point.position);

        if let Some(image) = image {
            if !image.contains(&point.position) {
                report.add(ValidationIssue::error(
                    IssueCode::ControlPointOutOfBounds,
                    format!(
                        "Position {} lies outside image bounds (0, 0, {}, {})",
                        point.position, image.width, image.height
                    ),
                    IssueContext::ControlPoint { id },
                ));
            }
        }

        if point.world.is_none() {
            report.add(ValidationIssue::warning(
                IssueCode::MissingWorldCoordinate,
                "No world coordinate; usable for relative calibration only",
                IssueContext::ControlPoint { id },
            ));
        }
    }

    if count >= MIN_CONTROL_POINTS && !spans_plane(&positions, COLLINEAR_TOLERANCE_PX) {
        report.add(ValidationIssue::error(
            IssueCode::CollinearControlPoints,
            "Control points all lie on one line; at least 3 must be non-collinear",
            IssueContext::Site,
        ));
    }
}
