//! The tour project: scenes, hotspots and camera defaults.
//!
//! A [`Project`] is the single piece of mutable state in the system. It is
//! plain data that serializes directly to the persisted project document
//! (camelCase JSON, see [`storage`](crate::storage)), plus a set of named
//! mutation operations. Callers never poke fields to change structure; they
//! go through `create_scene`, `delete_hotspot`, `set_initial_view` and
//! friends so that every user action crosses exactly one mutation boundary.
//!
//! ## Identifiers
//!
//! Scene and hotspot ids are time-based tokens (`scene_1718000000000`),
//! strictly increasing within a process and checked against the ids already
//! present in the project, so an id is never handed out twice. Ids are the
//! join key for `scene` hotspots: deleting a scene does **not** rewrite
//! hotspots that pointed at it. Such a dangling target resolves to `None`
//! and navigating it does nothing.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::f64::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Format tag written into every persisted project document.
pub const FORMAT_VERSION: &str = "1.0";

/// `currentSceneIndex` value meaning "no scene selected".
pub const NO_SCENE: i64 = -1;

#[derive(Error, Debug, PartialEq)]
pub enum ProjectError {
    #[error("No scene with id '{0}'")]
    UnknownScene(String),
    #[error("No hotspot '{hotspot}' in scene '{scene}'")]
    UnknownHotspot { scene: String, hotspot: String },
    #[error("Scene index {index} out of range ({len} scenes)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Camera pose shown when a scene is first displayed (radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewParameters {
    pub yaw: f64,
    pub pitch: f64,
    pub fov: f64,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov: FRAC_PI_2,
        }
    }
}

/// Placement of a hotspot on the sphere (radians).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub yaw: f64,
    pub pitch: f64,
}

/// Browsing context a link hotspot opens in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkTarget {
    #[default]
    #[serde(rename = "_blank")]
    Blank,
    #[serde(rename = "_self")]
    SelfFrame,
}

impl LinkTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkTarget::Blank => "_blank",
            LinkTarget::SelfFrame => "_self",
        }
    }
}

/// Where a video hotspot's media comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    #[default]
    Youtube,
    Vimeo,
    Podeduc,
    Direct,
}

impl FromStr for VideoType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(VideoType::Youtube),
            "vimeo" => Ok(VideoType::Vimeo),
            "podeduc" => Ok(VideoType::Podeduc),
            "direct" => Ok(VideoType::Direct),
            other => Err(format!(
                "unknown video type '{other}' (expected youtube, vimeo, podeduc or direct)"
            )),
        }
    }
}

/// Discriminant of [`HotspotKind`], used when creating a hotspot by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotspotType {
    Info,
    Link,
    Scene,
    Photo,
    Video,
    Audio,
}

impl HotspotType {
    pub fn as_str(self) -> &'static str {
        match self {
            HotspotType::Info => "info",
            HotspotType::Link => "link",
            HotspotType::Scene => "scene",
            HotspotType::Photo => "photo",
            HotspotType::Video => "video",
            HotspotType::Audio => "audio",
        }
    }
}

impl fmt::Display for HotspotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HotspotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(HotspotType::Info),
            "link" => Ok(HotspotType::Link),
            "scene" => Ok(HotspotType::Scene),
            "photo" => Ok(HotspotType::Photo),
            "video" => Ok(HotspotType::Video),
            "audio" => Ok(HotspotType::Audio),
            other => Err(format!(
                "unknown hotspot type '{other}' (expected info, link, scene, photo, video or audio)"
            )),
        }
    }
}

/// An interactive marker inside a scene.
///
/// The shared fields live here; everything type-specific lives in
/// [`HotspotKind`], which is flattened into the same JSON object and tagged
/// by its `"type"` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub kind: HotspotKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotspotKind {
    /// Hover tooltip. `content` is raw HTML.
    Info {
        #[serde(default)]
        content: String,
    },
    Link {
        #[serde(default)]
        url: String,
        #[serde(default)]
        target: LinkTarget,
    },
    /// Jump to another scene by id. The target may be absent or dangling.
    Scene {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Photo {
        #[serde(default)]
        photo_url: String,
        #[serde(default)]
        photo_description: String,
    },
    #[serde(rename_all = "camelCase")]
    Video {
        #[serde(default)]
        video_url: String,
        #[serde(default)]
        video_type: VideoType,
        #[serde(default)]
        video_description: String,
        /// Raw embed markup; wins over `video_url` for podeduc videos.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        podeduc_iframe: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Audio {
        #[serde(default)]
        audio_url: String,
        /// Embedded audio file; wins over `audio_url` when both are set.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audio_data_url: Option<String>,
        #[serde(default)]
        autoplay: bool,
        #[serde(default, rename = "loop")]
        looped: bool,
        #[serde(default)]
        audio_description: String,
    },
    /// A record with a missing or unknown `type`, or with fields of the
    /// wrong shape. Kept verbatim so it survives a save, never rendered.
    #[serde(untagged)]
    Unrecognized(Map<String, Value>),
}

impl HotspotKind {
    /// `None` for [`HotspotKind::Unrecognized`] records.
    pub fn hotspot_type(&self) -> Option<HotspotType> {
        match self {
            HotspotKind::Info { .. } => Some(HotspotType::Info),
            HotspotKind::Link { .. } => Some(HotspotType::Link),
            HotspotKind::Scene { .. } => Some(HotspotType::Scene),
            HotspotKind::Photo { .. } => Some(HotspotType::Photo),
            HotspotKind::Video { .. } => Some(HotspotType::Video),
            HotspotKind::Audio { .. } => Some(HotspotType::Audio),
            HotspotKind::Unrecognized(_) => None,
        }
    }

    /// The `type` tag as written in the document, or `"?"` when an
    /// unrecognized record has none.
    pub fn type_tag(&self) -> &str {
        match self {
            HotspotKind::Unrecognized(fields) => fields
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("?"),
            known => known.hotspot_type().map_or("?", HotspotType::as_str),
        }
    }
}

impl Hotspot {
    pub fn hotspot_type(&self) -> Option<HotspotType> {
        self.kind.hotspot_type()
    }

    pub fn type_tag(&self) -> &str {
        self.kind.type_tag()
    }

    /// The playable source of an audio hotspot: the embedded data URI if
    /// present, otherwise the URL. `None` for other types or when both are
    /// empty.
    pub fn audio_source(&self) -> Option<&str> {
        match &self.kind {
            HotspotKind::Audio {
                audio_url,
                audio_data_url,
                ..
            } => audio_data_url
                .as_deref()
                .filter(|s| !s.is_empty())
                .or_else(|| Some(audio_url.as_str()).filter(|s| !s.is_empty())),
            _ => None,
        }
    }
}

/// One panorama with its camera default and hotspots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub name: String,
    /// Either a `data:` URI or an absolute external URL.
    pub image_url: String,
    pub is_external_url: bool,
    pub initial_view_parameters: ViewParameters,
    pub hotspots: Vec<Hotspot>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            image_url: String::new(),
            is_external_url: false,
            initial_view_parameters: ViewParameters::default(),
            hotspots: Vec::new(),
        }
    }
}

impl Scene {
    pub fn find_hotspot(&self, hotspot_id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == hotspot_id)
    }
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

fn no_selection() -> i64 {
    NO_SCENE
}

/// Accept any JSON value for `currentSceneIndex`. Anything that is not an
/// integral number (null, strings, fractions) reads as "no selection" and
/// is clamped by [`Project::repair`].
fn lenient_index<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        })
        .unwrap_or(NO_SCENE))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default = "default_version")]
    pub version: String,
    pub scenes: Vec<Scene>,
    #[serde(default = "no_selection", deserialize_with = "lenient_index")]
    pub current_scene_index: i64,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

static LAST_TOKEN: AtomicU64 = AtomicU64::new(0);

/// Millisecond timestamp, bumped past the previous token when two ids are
/// requested within the same millisecond.
fn next_token() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut last = LAST_TOKEN.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TOKEN.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

impl Project {
    /// An empty project with no scene selected.
    pub fn new() -> Self {
        Self {
            version: default_version(),
            scenes: Vec::new(),
            current_scene_index: NO_SCENE,
        }
    }

    /// Clamp `current_scene_index` back into range.
    ///
    /// Out-of-range values become `0` when there are scenes and `-1`
    /// otherwise. Idempotent.
    pub fn repair(&mut self) {
        if self.scenes.is_empty() {
            self.current_scene_index = NO_SCENE;
        } else if self.current_scene_index < 0
            || self.current_scene_index >= self.scenes.len() as i64
        {
            self.current_scene_index = 0;
        }
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        usize::try_from(self.current_scene_index)
            .ok()
            .and_then(|i| self.scenes.get(i))
    }

    pub fn scene_index(&self, scene_id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == scene_id)
    }

    pub fn find_scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == scene_id)
    }

    /// Index of the scene a `scene` hotspot jumps to, or `None` when the
    /// target is unset or no longer exists.
    pub fn resolve_scene_target(&self, hotspot: &Hotspot) -> Option<usize> {
        match &hotspot.kind {
            HotspotKind::Scene {
                target: Some(target),
            } => self.scene_index(target),
            _ => None,
        }
    }

    /// All `scene` hotspots whose target does not resolve, as
    /// `(scene id, hotspot id)` pairs.
    pub fn dangling_scene_targets(&self) -> Vec<(&str, &str)> {
        self.scenes
            .iter()
            .flat_map(|scene| {
                scene
                    .hotspots
                    .iter()
                    .filter(|h| {
                        matches!(h.kind, HotspotKind::Scene { target: Some(_) })
                            && self.resolve_scene_target(h).is_none()
                    })
                    .map(move |h| (scene.id.as_str(), h.id.as_str()))
            })
            .collect()
    }

    fn id_in_use(&self, id: &str) -> bool {
        self.scenes
            .iter()
            .any(|s| s.id == id || s.hotspots.iter().any(|h| h.id == id))
    }

    /// A new `<prefix>_<token>` id not used anywhere in this project.
    pub fn fresh_id(&self, prefix: &str) -> String {
        loop {
            let id = format!("{prefix}_{}", next_token());
            if !self.id_in_use(&id) {
                return id;
            }
        }
    }

    // ------------------------------------------------------------------
    // Scene operations
    // ------------------------------------------------------------------

    /// Append a new scene and select it. Returns the new scene's id.
    pub fn create_scene(
        &mut self,
        name: impl Into<String>,
        image_url: impl Into<String>,
        is_external_url: bool,
    ) -> String {
        let id = self.fresh_id("scene");
        self.scenes.push(Scene {
            id: id.clone(),
            name: name.into(),
            image_url: image_url.into(),
            is_external_url,
            initial_view_parameters: ViewParameters::default(),
            hotspots: Vec::new(),
        });
        self.current_scene_index = self.scenes.len() as i64 - 1;
        id
    }

    /// Remove a scene. Hotspots elsewhere that targeted it are left as-is.
    ///
    /// The selection stays on the same index when possible, moves to the
    /// new last scene when it fell off the end, and becomes `-1` when the
    /// project is empty.
    pub fn delete_scene(&mut self, scene_id: &str) -> Result<Scene, ProjectError> {
        let index = self
            .scene_index(scene_id)
            .ok_or_else(|| ProjectError::UnknownScene(scene_id.to_string()))?;
        let removed = self.scenes.remove(index);
        if self.scenes.is_empty() {
            self.current_scene_index = NO_SCENE;
        } else if self.current_scene_index >= self.scenes.len() as i64 {
            self.current_scene_index = self.scenes.len() as i64 - 1;
        }
        Ok(removed)
    }

    pub fn rename_scene(&mut self, scene_id: &str, name: impl Into<String>) -> Result<(), ProjectError> {
        self.scene_mut(scene_id)?.name = name.into();
        Ok(())
    }

    /// Capture the camera pose a scene opens with.
    pub fn set_initial_view(
        &mut self,
        scene_id: &str,
        view: ViewParameters,
    ) -> Result<(), ProjectError> {
        self.scene_mut(scene_id)?.initial_view_parameters = view;
        Ok(())
    }

    pub fn select_scene(&mut self, index: usize) -> Result<(), ProjectError> {
        if index >= self.scenes.len() {
            return Err(ProjectError::IndexOutOfRange {
                index,
                len: self.scenes.len(),
            });
        }
        self.current_scene_index = index as i64;
        Ok(())
    }

    fn scene_mut(&mut self, scene_id: &str) -> Result<&mut Scene, ProjectError> {
        self.scenes
            .iter_mut()
            .find(|s| s.id == scene_id)
            .ok_or_else(|| ProjectError::UnknownScene(scene_id.to_string()))
    }

    // ------------------------------------------------------------------
    // Hotspot operations
    // ------------------------------------------------------------------

    /// Build a hotspot of the given type with the editor's starting values.
    ///
    /// A new `scene` hotspot targets the first *other* scene, if any. The
    /// hotspot is not inserted; pass it to [`add_hotspot`](Self::add_hotspot).
    pub fn new_hotspot(
        &self,
        scene_id: &str,
        hotspot_type: HotspotType,
        position: Position,
    ) -> Hotspot {
        let kind = match hotspot_type {
            HotspotType::Info => HotspotKind::Info {
                content: String::new(),
            },
            HotspotType::Link => HotspotKind::Link {
                url: "https://".to_string(),
                target: LinkTarget::Blank,
            },
            HotspotType::Scene => HotspotKind::Scene {
                target: self
                    .scenes
                    .iter()
                    .find(|s| s.id != scene_id)
                    .map(|s| s.id.clone()),
            },
            HotspotType::Photo => HotspotKind::Photo {
                photo_url: String::new(),
                photo_description: String::new(),
            },
            HotspotType::Video => HotspotKind::Video {
                video_url: String::new(),
                video_type: VideoType::Youtube,
                video_description: String::new(),
                podeduc_iframe: None,
            },
            HotspotType::Audio => HotspotKind::Audio {
                audio_url: String::new(),
                audio_data_url: None,
                autoplay: false,
                looped: false,
                audio_description: String::new(),
            },
        };
        Hotspot {
            id: self.fresh_id("hotspot"),
            position,
            title: format!("New {hotspot_type} hotspot"),
            kind,
        }
    }

    pub fn add_hotspot(&mut self, scene_id: &str, hotspot: Hotspot) -> Result<(), ProjectError> {
        self.scene_mut(scene_id)?.hotspots.push(hotspot);
        Ok(())
    }

    /// Replace a hotspot in place, keeping its position in the list.
    pub fn update_hotspot(&mut self, scene_id: &str, hotspot: Hotspot) -> Result<(), ProjectError> {
        let scene = self.scene_mut(scene_id)?;
        let slot = scene
            .hotspots
            .iter_mut()
            .find(|h| h.id == hotspot.id)
            .ok_or_else(|| ProjectError::UnknownHotspot {
                scene: scene_id.to_string(),
                hotspot: hotspot.id.clone(),
            })?;
        *slot = hotspot;
        Ok(())
    }

    pub fn delete_hotspot(
        &mut self,
        scene_id: &str,
        hotspot_id: &str,
    ) -> Result<Hotspot, ProjectError> {
        let scene = self.scene_mut(scene_id)?;
        let index = scene
            .hotspots
            .iter()
            .position(|h| h.id == hotspot_id)
            .ok_or_else(|| ProjectError::UnknownHotspot {
                scene: scene_id.to_string(),
                hotspot: hotspot_id.to_string(),
            })?;
        Ok(scene.hotspots.remove(index))
    }
}
