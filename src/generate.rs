//! Static site generation.
//!
//! Turns a [`Project`] into the files of a standalone viewer site. The
//! result is an in-memory [`Bundle`]: writing it to disk or into an archive
//! is the job of [`package`](crate::package).
//!
//! ## Generated Files
//!
//! ```text
//! index.html       # Viewer shell, title, scene menu, hotspot popup templates
//! css/style.css    # Static styles
//! js/viewer.js     # Viewer script, scene bar / autorotate flags baked in
//! js/data.js       # const scenes = [...]; const currentSceneIndex = N;
//! ```
//!
//! The viewer library (`js/marzipano.min.js`) and icon font
//! (`css/icons.css`) are not generated; the package writer adds them.
//!
//! ## Images
//!
//! Embedded (`data:`) panoramas are re-encoded through
//! [`transcode`](crate::imaging::transcode) to fit the byte budget of the
//! chosen [`ImageQuality`]. Scenes are transcoded in parallel; the output
//! keeps scene order. External URLs are never touched. An embedded image
//! that cannot be decoded is passed through unchanged with a warning.
//!
//! ## Hotspot Popups
//!
//! Popup content (info tooltips, photo, video and audio dialogs) is
//! rendered here with maud into one `<template id="hotspot-S-H">` per
//! hotspot, where `S` and `H` are the scene and hotspot indices. The viewer
//! script only clones templates; it never builds markup from strings.
//!
//! Output is deterministic: the same project and options produce the same
//! bytes.

use crate::imaging::{ImageBackend, ImageQuality, data_uri, transcode_data_uri};
use crate::project::{Hotspot, HotspotKind, Project, Scene};
use crate::video;
use log::{debug, info, warn};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Nothing to export: the project has no scenes")]
    NoScenes,
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub const INDEX_HTML: &str = "index.html";
pub const STYLE_CSS: &str = "css/style.css";
pub const VIEWER_JS: &str = "js/viewer.js";
pub const DATA_JS: &str = "js/data.js";

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS_TEMPLATE: &str = include_str!("../static/viewer.js");

/// What to do with scenes whose panorama is an external URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlImages {
    /// Reference the URL from the exported site.
    #[default]
    Keep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub title: String,
    pub show_title: bool,
    pub show_scene_bar: bool,
    pub image_quality: ImageQuality,
    pub url_images: UrlImages,
    /// Accepted for compatibility; exported tours never autorotate.
    pub autorotate: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: "Virtual tour".to_string(),
            show_title: true,
            show_scene_bar: true,
            image_quality: ImageQuality::default(),
            url_images: UrlImages::default(),
            autorotate: false,
        }
    }
}

/// What happened to one scene's panorama during export.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    External,
    /// Embedded and kept as-is (`native` quality).
    Native,
    Transcoded {
        width: u32,
        height: u32,
        quality: u32,
        approx_bytes: usize,
        fits: bool,
    },
    /// Could not be decoded; the original data was kept.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneReport {
    pub name: String,
    pub image: ImageOutcome,
}

/// Generated site files keyed by relative path, plus a per-scene report.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub files: BTreeMap<String, String>,
    pub scenes: Vec<SceneReport>,
}

impl Bundle {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Relative paths in sorted order.
    pub fn paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }
}

/// Generate the viewer site for `project`.
///
/// Fails before doing any work when the project has no scenes.
pub fn generate(
    project: &Project,
    options: &ExportOptions,
    backend: &impl ImageBackend,
) -> Result<Bundle, GenerateError> {
    if project.scenes.is_empty() {
        return Err(GenerateError::NoScenes);
    }
    if options.autorotate {
        info!("Autorotate is not supported in exported tours; disabled");
    }
    for (scene, hotspot) in project.dangling_scene_targets() {
        warn!("Hotspot {hotspot} in scene {scene} points at a missing scene; it will do nothing");
    }

    let max_bytes = options.image_quality.max_bytes();
    let (scenes, reports): (Vec<Scene>, Vec<SceneReport>) = project
        .scenes
        .par_iter()
        .map(|scene| prepare_scene(scene, max_bytes, backend))
        .collect::<Vec<_>>()
        .into_iter()
        .unzip();

    let mut files = BTreeMap::new();
    files.insert(
        INDEX_HTML.to_string(),
        render_index(&project.scenes, options).into_string(),
    );
    files.insert(STYLE_CSS.to_string(), CSS_STATIC.to_string());
    files.insert(
        VIEWER_JS.to_string(),
        render_viewer_js(options.show_scene_bar),
    );
    files.insert(
        DATA_JS.to_string(),
        render_data_js(&scenes, start_index(project))?,
    );

    Ok(Bundle {
        files,
        scenes: reports,
    })
}

/// The scene the exported tour opens on: the selected one, or the first
/// when the selection is out of range.
fn start_index(project: &Project) -> i64 {
    let len = project.scenes.len() as i64;
    if (0..len).contains(&project.current_scene_index) {
        project.current_scene_index
    } else {
        0
    }
}

fn prepare_scene(
    scene: &Scene,
    max_bytes: Option<usize>,
    backend: &impl ImageBackend,
) -> (Scene, SceneReport) {
    let mut out = scene.clone();
    let outcome = if scene.is_external_url || !data_uri::is_data_uri(&scene.image_url) {
        ImageOutcome::External
    } else if let Some(max_bytes) = max_bytes {
        match transcode_data_uri(backend, &scene.image_url, max_bytes) {
            Ok(result) => {
                debug!(
                    "{}: {}x{} in {} attempt(s)",
                    scene.name, result.width, result.height, result.attempts
                );
                if !result.fits() {
                    warn!(
                        "{}: still {} bytes after {} attempts (budget {})",
                        scene.name, result.approx_bytes, result.attempts, max_bytes
                    );
                }
                let outcome = ImageOutcome::Transcoded {
                    width: result.width,
                    height: result.height,
                    quality: result.quality.value(),
                    approx_bytes: result.approx_bytes,
                    fits: result.fits(),
                };
                out.image_url = result.data_uri;
                outcome
            }
            Err(e) => {
                warn!("{}: keeping original image, cannot transcode: {e}", scene.name);
                ImageOutcome::Failed(e.to_string())
            }
        }
    } else {
        ImageOutcome::Native
    };

    let report = SceneReport {
        name: scene.name.clone(),
        image: outcome,
    };
    (out, report)
}

// ============================================================================
// Scripts
// ============================================================================

fn js_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Viewer script with its flags substituted as literals.
pub fn render_viewer_js(show_scene_bar: bool) -> String {
    JS_TEMPLATE
        .replace("__SHOW_SCENE_BAR__", js_bool(show_scene_bar))
        .replace("__AUTOROTATE__", js_bool(false))
}

/// `js/data.js`: the scene list and start index as script globals.
pub fn render_data_js(scenes: &[Scene], current_scene_index: i64) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string_pretty(scenes)?;
    Ok(format!(
        "const scenes = {json};\nconst currentSceneIndex = {current_scene_index};\n"
    ))
}

// ============================================================================
// HTML
// ============================================================================

fn template_id(scene_index: usize, hotspot_index: usize) -> String {
    format!("hotspot-{scene_index}-{hotspot_index}")
}

fn render_index(scenes: &[Scene], options: &ExportOptions) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (options.title) }
                link rel="stylesheet" href="css/style.css";
                link rel="stylesheet" href="css/icons.css";
            }
            body {
                div.container {
                    @if options.show_title {
                        h1.site-title { (options.title) }
                    }
                    div id="pano-container" {}
                    button.menu-toggle id="menu-toggle" type="button" {
                        i.fas.fa-bars {}
                    }
                    div.scene-menu id="scene-menu" {
                        div.scene-menu-header {
                            h2 { "Scenes" }
                            button.close-menu id="close-menu" type="button" {
                                i.fas.fa-times {}
                            }
                        }
                        div.scene-list id="scene-list" {}
                    }
                }
                @for (si, scene) in scenes.iter().enumerate() {
                    @for (hi, hotspot) in scene.hotspots.iter().enumerate() {
                        @if let Some(popup) = render_popup(hotspot) {
                            template id=(template_id(si, hi)) { (popup) }
                        }
                    }
                }
                script src="js/marzipano.min.js" {}
                script src="js/data.js" {}
                script src="js/viewer.js" {}
            }
        }
    }
}

/// Popup content for a hotspot, or `None` for types that act on click
/// without showing anything.
fn render_popup(hotspot: &Hotspot) -> Option<Markup> {
    match &hotspot.kind {
        // rich text entered by the author
        HotspotKind::Info { content } => Some(PreEscaped(content.clone())),
        HotspotKind::Link { .. } | HotspotKind::Scene { .. } | HotspotKind::Unrecognized(_) => {
            None
        }
        HotspotKind::Photo {
            photo_url,
            photo_description,
        } => Some(modal(
            &hotspot.title,
            html! { img src=(photo_url) alt=(hotspot.title); },
            photo_description,
        )),
        HotspotKind::Video {
            video_url,
            video_type,
            video_description,
            podeduc_iframe,
        } => Some(modal(
            &hotspot.title,
            video::embed(*video_type, video_url, podeduc_iframe.as_deref()),
            video_description,
        )),
        HotspotKind::Audio {
            autoplay,
            looped,
            audio_description,
            ..
        } => {
            let player = match hotspot.audio_source() {
                Some(src) => html! {
                    audio controls src=(src) autoplay[*autoplay] loop[*looped] {}
                },
                None => html! { p { "No audio source" } },
            };
            Some(modal(&hotspot.title, player, audio_description))
        }
    }
}

fn modal(title: &str, body: Markup, description: &str) -> Markup {
    html! {
        div.modal-content {
            div.modal-header {
                h2 { (title) }
                button.modal-close type="button" { "×" }
            }
            div.modal-body {
                (body)
                @if !description.is_empty() {
                    p.modal-description { (description) }
                }
            }
        }
    }
}
