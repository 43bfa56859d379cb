//! Publishing a tour to a remote hosting service.
//!
//! The site is exported with fixed options (title shown, scene bar shown,
//! optimized images), zipped, and sent as a multipart form:
//!
//! | Field | Content |
//! |---|---|
//! | `file` | the archive, as `site.zip` |
//! | `name` | site name chosen by the user |
//! | `token` | the user's access token for the service |
//!
//! The service answers with JSON. A success carries the public address in
//! `pages_url`; it may be missing when the site is still being deployed,
//! which is reported as [`PublishOutcome::Pending`] rather than an error.
//! A failure carries a human-readable `detail`.

use crate::generate::{self, ExportOptions, GenerateError};
use crate::imaging::{ImageBackend, ImageQuality};
use crate::package::{self, PackageError, StaticAssets};
use crate::project::Project;
use log::info;
use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

pub const ARCHIVE_NAME: &str = "site.zip";

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Missing {0}")]
    MissingField(&'static str),
    #[error("No publish endpoint configured")]
    NoEndpoint,
    #[error(transparent)]
    Generate(#[from] GenerateError),
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Publish rejected: {0}")]
    Rejected(String),
    #[error("Unexpected response from publish service: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { url: String },
    /// Accepted, but the public URL is not known yet.
    Pending,
}

#[derive(Debug, Deserialize)]
struct SuccessBody {
    #[serde(default)]
    pages_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Map the service's answer to an outcome.
pub fn interpret_response(status: u16, body: &str) -> Result<PublishOutcome, PublishError> {
    if !(200..300).contains(&status) {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(PublishError::Rejected(detail));
    }

    let parsed: SuccessBody =
        serde_json::from_str(body).map_err(|e| PublishError::InvalidResponse(e.to_string()))?;
    Ok(match parsed.pages_url.filter(|u| !u.is_empty()) {
        Some(url) => PublishOutcome::Published { url },
        None => PublishOutcome::Pending,
    })
}

/// Export options used for every published site.
pub fn publish_options(name: &str) -> ExportOptions {
    ExportOptions {
        title: name.to_string(),
        show_title: true,
        show_scene_bar: true,
        image_quality: ImageQuality::Optimized,
        ..ExportOptions::default()
    }
}

/// Build the archive that gets uploaded.
pub fn site_archive(
    project: &Project,
    name: &str,
    backend: &impl ImageBackend,
    assets: &StaticAssets,
) -> Result<Vec<u8>, PublishError> {
    let bundle = generate::generate(project, &publish_options(name), backend)?;
    Ok(package::pack(&bundle, assets)?)
}

pub struct Publisher {
    endpoint: String,
    client: Client,
}

impl Publisher {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, PublishError> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(PublishError::NoEndpoint);
        }
        Ok(Self {
            endpoint,
            client: Client::new(),
        })
    }

    /// Export, pack and upload `project` under `name`.
    pub fn publish(
        &self,
        project: &Project,
        name: &str,
        token: &str,
        backend: &impl ImageBackend,
        assets: &StaticAssets,
    ) -> Result<PublishOutcome, PublishError> {
        if name.trim().is_empty() {
            return Err(PublishError::MissingField("site name"));
        }
        if token.trim().is_empty() {
            return Err(PublishError::MissingField("access token"));
        }

        let archive = site_archive(project, name, backend, assets)?;
        info!("Uploading {} bytes to {}", archive.len(), self.endpoint);
        self.upload(archive, name, token)
    }

    fn upload(&self, archive: Vec<u8>, name: &str, token: &str) -> Result<PublishOutcome, PublishError> {
        let file = Part::bytes(archive)
            .file_name(ARCHIVE_NAME)
            .mime_str("application/zip")?;
        let form = Form::new()
            .part("file", file)
            .text("name", name.to_string())
            .text("token", token.to_string());

        let response = self.client.post(&self.endpoint).multipart(form).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        interpret_response(status, &body)
    }
}
