//! Packaging a generated site.
//!
//! Combines a [`Bundle`] with the two static viewer assets that ship
//! unchanged with every tour, and writes the result either as a zip archive
//! (for download or upload) or as a plain directory.
//!
//! ## Layout
//!
//! ```text
//! index.html
//! css/style.css
//! css/icons.css          # static asset
//! js/viewer.js
//! js/marzipano.min.js    # static asset
//! js/data.js
//! ```
//!
//! Entries are written in sorted path order with a fixed timestamp, so the
//! same inputs give a byte-identical archive.

use crate::generate::Bundle;
use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Static asset not found: {}", path.display())]
    MissingAsset { path: PathBuf },
    #[error("File outside the site layout: {0}")]
    UnexpectedPath(String),
}

pub const MARZIPANO_JS: &str = "js/marzipano.min.js";
pub const ICONS_CSS: &str = "css/icons.css";

/// Third-party files copied byte for byte into every export.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticAssets {
    pub marzipano_js: Vec<u8>,
    pub icons_css: Vec<u8>,
}

impl StaticAssets {
    pub fn new(marzipano_js: impl Into<Vec<u8>>, icons_css: impl Into<Vec<u8>>) -> Self {
        Self {
            marzipano_js: marzipano_js.into(),
            icons_css: icons_css.into(),
        }
    }

    /// Load `marzipano.min.js` and `icons.css` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, PackageError> {
        let read = |name: &str| {
            let path = dir.join(name);
            if !path.is_file() {
                return Err(PackageError::MissingAsset { path });
            }
            Ok(fs::read(&path)?)
        };
        Ok(Self {
            marzipano_js: read("marzipano.min.js")?,
            icons_css: read("icons.css")?,
        })
    }
}

/// Whether `path` fits the flat site layout: `index.html`, `css/*.css` or
/// `js/*.js`.
fn in_layout(path: &str) -> bool {
    if path == "index.html" {
        return true;
    }
    match path.split_once('/') {
        Some(("css", name)) => !name.contains('/') && name.ends_with(".css"),
        Some(("js", name)) => !name.contains('/') && name.ends_with(".js"),
        _ => false,
    }
}

/// Every file of the site, keyed by relative path.
fn site_files<'a>(
    bundle: &'a Bundle,
    assets: &'a StaticAssets,
) -> Result<BTreeMap<&'a str, &'a [u8]>, PackageError> {
    let mut files: BTreeMap<&str, &[u8]> = bundle
        .files
        .iter()
        .map(|(path, content)| (path.as_str(), content.as_bytes()))
        .collect();
    files.insert(MARZIPANO_JS, &assets.marzipano_js);
    files.insert(ICONS_CSS, &assets.icons_css);

    if let Some(path) = files.keys().find(|p| !in_layout(p)) {
        return Err(PackageError::UnexpectedPath(path.to_string()));
    }
    Ok(files)
}

/// Relative paths the packed site will contain, sorted.
pub fn manifest(bundle: &Bundle, assets: &StaticAssets) -> Result<Vec<String>, PackageError> {
    Ok(site_files(bundle, assets)?
        .keys()
        .map(|p| p.to_string())
        .collect())
}

/// Zip the site into memory.
pub fn pack(bundle: &Bundle, assets: &StaticAssets) -> Result<Vec<u8>, PackageError> {
    let files = site_files(bundle, assets)?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, content) in files {
        zip.start_file(path, options)?;
        zip.write_all(content)?;
    }
    Ok(zip.finish()?.into_inner())
}

/// Write the site unpacked under `dir`. Returns the written paths.
pub fn write_site(
    bundle: &Bundle,
    assets: &StaticAssets,
    dir: &Path,
) -> Result<Vec<PathBuf>, PackageError> {
    let files = site_files(bundle, assets)?;
    let mut written = Vec::with_capacity(files.len());
    for (path, content) in files {
        let target = dir.join(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, content)?;
        written.push(target);
    }
    Ok(written)
}
