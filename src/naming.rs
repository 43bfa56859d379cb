//! Display names for newly created scenes.
//!
//! A scene imported from disk is named after its file: the directory part
//! and the final extension are dropped, everything else is kept verbatim.
//! - `pano/chapel-north.jpg` → "chapel-north"
//! - `IMG_0042.v2.jpeg` → "IMG_0042.v2"
//! - `.hidden` → ".hidden" (a leading dot is not an extension)
//!
//! URL-sourced scenes use the name the user typed, or a generated label
//! when none was given.

use std::path::Path;

/// Label given to URL scenes created without a name.
pub const URL_SCENE_LABEL: &str = "URL scene";

/// Scene name derived from an image path.
pub fn scene_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Scene name for a URL scene: the trimmed user input, or [`URL_SCENE_LABEL`].
pub fn url_scene_name(name: Option<&str>) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(URL_SCENE_LABEL)
        .to_string()
}
