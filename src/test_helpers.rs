//! Shared test utilities for the panotour test suite.
//!
//! Provides synthetic images, encoded fixtures and small project builders so
//! tests never depend on files checked into the repository.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = two_scene_project();
//! let scene = find_scene(&project, "Hall");
//! assert_eq!(hotspot_types(scene), vec!["info", "scene"]);
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

use crate::project::{Hotspot, HotspotKind, Position, Project, Scene};

// =========================================================================
// Synthetic images
// =========================================================================

/// Deterministic high-entropy RGB image. Compresses poorly, so encoded size
/// tracks quality and dimensions.
pub fn noise_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x9E37_79B9 ^ width.wrapping_mul(31) ^ height;
    let image = RgbImage::from_fn(width, height, |_, _| {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(image)
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    noise_image(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, 90);
    noise_image(width, height)
        .write_with_encoder(encoder)
        .unwrap();
    bytes
}

pub fn jpeg_data_uri(width: u32, height: u32) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        STANDARD.encode(jpeg_bytes(width, height))
    )
}

// =========================================================================
// Project builders
// =========================================================================

pub fn scene(id: &str, name: &str, image_url: &str) -> Scene {
    Scene {
        id: id.to_string(),
        name: name.to_string(),
        image_url: image_url.to_string(),
        is_external_url: !image_url.starts_with("data:"),
        ..Scene::default()
    }
}

pub fn hotspot(id: &str, kind: HotspotKind) -> Hotspot {
    Hotspot {
        id: id.to_string(),
        position: Position {
            yaw: 0.5,
            pitch: -0.1,
        },
        title: format!("Hotspot {id}"),
        kind,
    }
}

/// Embedded "Hall" with an info hotspot and a jump to external "Garden".
pub fn two_scene_project() -> Project {
    let mut hall = scene("scene_1", "Hall", &jpeg_data_uri(64, 32));
    hall.hotspots.push(hotspot(
        "hotspot_1",
        HotspotKind::Info {
            content: "<b>Welcome</b>".to_string(),
        },
    ));
    hall.hotspots.push(hotspot(
        "hotspot_2",
        HotspotKind::Scene {
            target: Some("scene_2".to_string()),
        },
    ));
    let garden = scene("scene_2", "Garden", "https://example.com/garden.jpg");

    Project {
        scenes: vec![hall, garden],
        current_scene_index: 0,
        ..Project::new()
    }
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a scene by name. Panics if not found.
pub fn find_scene<'a>(project: &'a Project, name: &str) -> &'a Scene {
    project
        .scenes
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| {
            let names: Vec<&str> = project.scenes.iter().map(|s| s.name.as_str()).collect();
            panic!("scene '{name}' not found. Available: {names:?}")
        })
}

/// Hotspot type tags in scene order.
pub fn hotspot_types(scene: &Scene) -> Vec<&str> {
    scene.hotspots.iter().map(Hotspot::type_tag).collect()
}
