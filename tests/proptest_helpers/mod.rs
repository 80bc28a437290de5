#![allow(dead_code)]

use pipark_setup::site::{Coord, Pixel, Rect, ReferenceImage, SiteConfiguration};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const IMAGE_W: u32 = 640;
pub const IMAGE_H: u32 = 480;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn site_with_image() -> SiteConfiguration {
    SiteConfiguration::with_image(ReferenceImage::new(
        "setup.jpeg",
        IMAGE_W,
        IMAGE_H,
        vec![0xff, 0xd8],
    ))
}

/// Whole-pixel points inside the image, edges included.
pub fn arb_pixel() -> BoxedStrategy<Coord<Pixel>> {
    (0u32..=IMAGE_W, 0u32..=IMAGE_H)
        .prop_map(|(x, y)| Coord::new(f64::from(x), f64::from(y)))
        .boxed()
}

/// Any rectangle inside the image, degenerate ones included.
pub fn arb_rect() -> BoxedStrategy<Rect<Pixel>> {
    (arb_pixel(), arb_pixel())
        .prop_map(|(a, b)| Rect::from_corners(a, b))
        .boxed()
}

/// Rectangles with a zero-width or zero-height side.
pub fn arb_degenerate_rect() -> BoxedStrategy<Rect<Pixel>> {
    prop_oneof![
        (0u32..=IMAGE_W, 0u32..=IMAGE_H, 0u32..=IMAGE_H).prop_map(|(x, y1, y2)| {
            Rect::from_xyxy(f64::from(x), f64::from(y1), f64::from(x), f64::from(y2))
        }),
        (0u32..=IMAGE_W, 0u32..=IMAGE_W, 0u32..=IMAGE_H).prop_map(|(x1, x2, y)| {
            Rect::from_xyxy(f64::from(x1), f64::from(y), f64::from(x2), f64::from(y))
        }),
    ]
    .boxed()
}

/// Edit operations against a site's parking spaces.
#[derive(Clone, Debug)]
pub enum SpaceOp {
    Add(Rect<Pixel>),
    /// Removes the n-th existing space (modulo the count).
    Remove(usize),
}

pub fn arb_space_ops() -> BoxedStrategy<Vec<SpaceOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => arb_rect().prop_map(SpaceOp::Add),
            1 => any::<usize>().prop_map(SpaceOp::Remove),
        ],
        0..40,
    )
    .boxed()
}

/// A site holding some spaces and control points.
pub fn arb_populated_site() -> BoxedStrategy<SiteConfiguration> {
    (
        prop::collection::vec(arb_rect(), 0..8),
        prop::collection::vec(arb_pixel(), 0..8),
    )
        .prop_map(|(rects, points)| {
            let mut site = site_with_image();
            for rect in rects {
                let _ = site.add_space(rect);
            }
            for point in points {
                let _ = site.add_control_point(point);
            }
            site
        })
        .boxed()
}
