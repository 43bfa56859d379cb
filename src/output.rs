//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity (scene, hotspot) is shown by its semantic identity first:
//! positional index and name, with ids and sources as secondary context on
//! indented lines.
//!
//! # Output Format
//!
//! ## Project
//!
//! ```text
//! Tour (2 scenes)
//! * 001 Hall [scene_1718000000000]
//!     Image: embedded image/jpeg, 2.4 MiB
//!     View: yaw 0.00, pitch 0.00, fov 1.57
//!     info "Welcome to the hall" [hotspot_1718000000001]
//!     scene → Garden [hotspot_1718000000002]
//!   002 Garden [scene_1718000000003]
//!     Image: https://example.com/garden.jpg
//! ```
//!
//! The `*` marks the selected scene.
//!
//! ## Export
//!
//! ```text
//! 001 Hall: 4096x2048, quality 0.8, 1008.2 KiB
//! 002 Garden: external URL
//!
//! Files
//!     css/icons.css
//!     ...
//! Exported 2 scenes → tour.zip
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::generate::{Bundle, ImageOutcome};
use crate::imaging::approx_decoded_len;
use crate::imaging::data_uri::DataUri;
use crate::project::{Hotspot, HotspotKind, Project, Scene};
use crate::publish::PublishOutcome;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte size.
fn format_size(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    }
}

// ============================================================================
// Project tree
// ============================================================================

fn image_line(scene: &Scene) -> String {
    match DataUri::parse(&scene.image_url) {
        Some(uri) => format!(
            "Image: embedded {}, {}",
            uri.mime,
            format_size(approx_decoded_len(uri.payload.len()))
        ),
        None => format!("Image: {}", scene.image_url),
    }
}

fn hotspot_line(project: &Project, hotspot: &Hotspot) -> String {
    let kind = hotspot.type_tag();
    let detail = match &hotspot.kind {
        HotspotKind::Info { content } => {
            format!("\"{}\"", truncate_desc(strip_html_tags(content).trim(), 40))
        }
        HotspotKind::Link { url, target } => format!("→ {url} ({})", target.as_str()),
        HotspotKind::Scene { target } => match project.resolve_scene_target(hotspot) {
            Some(i) => format!("→ {}", project.scenes[i].name),
            None => match target {
                Some(id) => format!("→ (missing {id})"),
                None => "→ (no target)".to_string(),
            },
        },
        HotspotKind::Photo { .. } | HotspotKind::Video { .. } | HotspotKind::Audio { .. } => {
            format!("\"{}\"", hotspot.title)
        }
        HotspotKind::Unrecognized(_) => "(unrecognized, not shown)".to_string(),
    };
    format!("{kind} {detail} [{}]", hotspot.id)
}

/// Format the project as an indented scene/hotspot tree.
pub fn format_project_tree(project: &Project) -> Vec<String> {
    let mut lines = Vec::new();
    let count = project.scenes.len();
    lines.push(format!(
        "Tour ({count} scene{})",
        if count == 1 { "" } else { "s" }
    ));

    let current = project.current_scene().map(|s| s.id.as_str());
    for (i, scene) in project.scenes.iter().enumerate() {
        let marker = if Some(scene.id.as_str()) == current { "*" } else { " " };
        lines.push(format!(
            "{marker} {} {} [{}]",
            format_index(i + 1),
            scene.name,
            scene.id
        ));
        lines.push(format!("{}{}", indent(1), image_line(scene)));
        let view = &scene.initial_view_parameters;
        lines.push(format!(
            "{}View: yaw {:.2}, pitch {:.2}, fov {:.2}",
            indent(1),
            view.yaw,
            view.pitch,
            view.fov
        ));
        for hotspot in &scene.hotspots {
            lines.push(format!("{}{}", indent(1), hotspot_line(project, hotspot)));
        }
    }
    lines
}

/// Print the project tree to stdout.
pub fn print_project_tree(project: &Project) {
    for line in format_project_tree(project) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

fn outcome_detail(outcome: &ImageOutcome) -> String {
    match outcome {
        ImageOutcome::External => "external URL".to_string(),
        ImageOutcome::Native => "embedded, unchanged".to_string(),
        ImageOutcome::Transcoded {
            width,
            height,
            quality,
            approx_bytes,
            fits,
        } => {
            let over = if *fits { "" } else { " (over budget)" };
            format!(
                "{width}x{height}, quality {:.1}, {}{over}",
                *quality as f32 / 100.0,
                format_size(*approx_bytes)
            )
        }
        ImageOutcome::Failed(reason) => format!("kept original ({reason})"),
    }
}

/// Format the export summary: per-scene image handling, the file list and
/// the destination.
pub fn format_export_output(bundle: &Bundle, files: &[String], destination: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, scene) in bundle.scenes.iter().enumerate() {
        lines.push(format!(
            "{} {}: {}",
            format_index(i + 1),
            scene.name,
            outcome_detail(&scene.image)
        ));
    }
    lines.push(String::new());
    lines.push("Files".to_string());
    for file in files {
        lines.push(format!("{}{}", indent(1), file));
    }
    let count = bundle.scenes.len();
    lines.push(format!(
        "Exported {count} scene{} → {destination}",
        if count == 1 { "" } else { "s" }
    ));
    lines
}

/// Print the export summary to stdout.
pub fn print_export_output(bundle: &Bundle, files: &[String], destination: &str) {
    for line in format_export_output(bundle, files, destination) {
        println!("{}", line);
    }
}

// ============================================================================
// Publish
// ============================================================================

pub fn format_publish_outcome(outcome: &PublishOutcome) -> Vec<String> {
    match outcome {
        PublishOutcome::Published { url } => vec![format!("Published → {url}")],
        PublishOutcome::Pending => vec![
            "Published, but the site URL is not available yet.".to_string(),
            "Check the hosting service again in a few minutes.".to_string(),
        ],
    }
}

pub fn print_publish_outcome(outcome: &PublishOutcome) {
    for line in format_publish_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Notice for an edit whose snapshot was refused for size. The project
/// file is still written; only the snapshot falls behind.
pub fn format_snapshot_skipped(size: usize, limit: usize) -> Vec<String> {
    vec![
        format!("Snapshot not saved: project is {size} characters, limit {limit}."),
        "`restore` would bring back the previous snapshot, not this edit.".to_string(),
    ]
}

/// Print the snapshot notice to stderr.
pub fn print_snapshot_skipped(size: usize, limit: usize) {
    for line in format_snapshot_skipped(size, limit) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
