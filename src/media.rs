//! Loading images and audio from disk into a project.
//!
//! Everything a project references is either embedded as a base64 `data:`
//! URI or an absolute `http(s)` URL. This module is where files become data
//! URIs: images are decoded once up front so a corrupt file is reported at
//! import time rather than at export, and audio is embedded by extension.

use crate::imaging::{ImageBackend, data_uri, sniff_mime_type};
use crate::naming;
use crate::project::Project;
use reqwest::Url;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not a supported image (JPEG, PNG or WebP)")]
    UnsupportedImage { path: PathBuf },
    #[error("Cannot decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("{path} is not a supported audio file (mp3, wav, ogg, aac, m4a)")]
    UnsupportedAudio { path: PathBuf },
    #[error("Not an absolute http(s) URL: {0}")]
    InvalidUrl(String),
}

/// Audio extensions accepted by [`load_audio`] and their MIME types.
const AUDIO_TYPES: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("ogg", "audio/ogg"),
    ("aac", "audio/aac"),
    ("m4a", "audio/mp4"),
];

/// Everything needed to create a scene, before it joins a project.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSource {
    pub name: String,
    pub image_url: String,
    pub is_external_url: bool,
}

impl SceneSource {
    /// Append as a new scene and select it. Returns the scene id.
    pub fn add_to(self, project: &mut Project) -> String {
        project.create_scene(self.name, self.image_url, self.is_external_url)
    }
}

fn read(path: &Path) -> Result<Vec<u8>, MediaError> {
    fs::read(path).map_err(|source| MediaError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a panorama from disk and embed it.
///
/// The file is decoded to prove it is a usable image; the embedded bytes
/// are the original file, untouched. Transcoding happens at export.
pub fn import_image(path: &Path, backend: &impl ImageBackend) -> Result<SceneSource, MediaError> {
    let bytes = read(path)?;
    let mime = sniff_mime_type(&bytes).ok_or_else(|| MediaError::UnsupportedImage {
        path: path.to_path_buf(),
    })?;
    backend.decode(&bytes).map_err(|e| MediaError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(SceneSource {
        name: naming::scene_name_from_path(path),
        image_url: data_uri::encode(mime, &bytes),
        is_external_url: false,
    })
}

/// A scene whose panorama stays on a remote server.
///
/// Only the URL syntax is checked; nothing is fetched.
pub fn url_scene(url: &str, name: Option<&str>) -> Result<SceneSource, MediaError> {
    let url = url.trim();
    let parsed = Url::parse(url).map_err(|_| MediaError::InvalidUrl(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(MediaError::InvalidUrl(url.to_string()));
    }

    Ok(SceneSource {
        name: naming::url_scene_name(name),
        image_url: url.to_string(),
        is_external_url: true,
    })
}

/// MIME type for an audio file, by extension (case-insensitive).
pub fn audio_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    AUDIO_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Embed an audio file as a data URI for an audio hotspot.
pub fn load_audio(path: &Path) -> Result<String, MediaError> {
    let mime = audio_mime_type(path).ok_or_else(|| MediaError::UnsupportedAudio {
        path: path.to_path_buf(),
    })?;
    let bytes = read(path)?;
    Ok(data_uri::encode(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::{jpeg_bytes, png_bytes};
    use tempfile::TempDir;

    #[test]
    fn import_image_embeds_with_sniffed_type() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("chapel-north.png");
        fs::write(&path, png_bytes(8, 4)).unwrap();

        let source = import_image(&path, &RustBackend::new()).unwrap();

        assert_eq!(source.name, "chapel-north");
        assert!(source.image_url.starts_with("data:image/png;base64,"));
        assert!(!source.is_external_url);
        assert_eq!(data_uri::decode(&source.image_url).unwrap(), png_bytes(8, 4));
    }

    #[test]
    fn import_image_ignores_misleading_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pano.png");
        fs::write(&path, jpeg_bytes(8, 4)).unwrap();

        let source = import_image(&path, &RustBackend::new()).unwrap();
        assert!(source.image_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn import_image_rejects_non_image() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.jpg");
        fs::write(&path, "just text").unwrap();

        let err = import_image(&path, &RustBackend::new()).unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedImage { .. }));
        assert!(err.to_string().contains("notes.jpg"));
    }

    #[test]
    fn import_image_reports_truncated_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.png");
        let mut bytes = png_bytes(16, 16);
        bytes.truncate(40);
        fs::write(&path, bytes).unwrap();

        let err = import_image(&path, &RustBackend::new()).unwrap_err();
        assert!(matches!(err, MediaError::Decode { .. }));
    }

    #[test]
    fn import_image_missing_file() {
        let err = import_image(Path::new("/nonexistent/pano.jpg"), &RustBackend::new()).unwrap_err();
        assert!(matches!(err, MediaError::Io { .. }));
    }

    #[test]
    fn url_scene_defaults_name() {
        let source = url_scene("https://example.com/pano.jpg", None).unwrap();
        assert_eq!(source.name, "URL scene");
        assert!(source.is_external_url);
        assert_eq!(source.image_url, "https://example.com/pano.jpg");

        let named = url_scene(" http://example.com/a.jpg ", Some("Roof")).unwrap();
        assert_eq!(named.name, "Roof");
        assert_eq!(named.image_url, "http://example.com/a.jpg");
    }

    #[test]
    fn url_scene_rejects_other_schemes() {
        assert!(matches!(
            url_scene("ftp://example.com/pano.jpg", None),
            Err(MediaError::InvalidUrl(_))
        ));
        assert!(matches!(
            url_scene("pano.jpg", None),
            Err(MediaError::InvalidUrl(_))
        ));
    }

    #[test]
    fn source_added_to_project_is_selected() {
        let mut project = Project::new();
        let id = url_scene("https://example.com/a.jpg", Some("A"))
            .unwrap()
            .add_to(&mut project);
        assert_eq!(project.current_scene().map(|s| s.id.as_str()), Some(id.as_str()));
    }

    #[test]
    fn load_audio_by_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("birds.MP3");
        fs::write(&path, [0xFF, 0xFB, 0x90]).unwrap();

        assert_eq!(load_audio(&path).unwrap(), "data:audio/mpeg;base64,//uQ");
    }

    #[test]
    fn load_audio_rejects_unknown_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clip.flac");
        fs::write(&path, [0u8; 4]).unwrap();

        assert!(matches!(
            load_audio(&path),
            Err(MediaError::UnsupportedAudio { .. })
        ));
    }
}
