//! # panotour
//!
//! Build 360° panoramic virtual tours and export them as self-contained
//! static sites. A tour is a list of panoramic scenes with interactive
//! hotspots (info tooltips, links, scene jumps, photos, videos, audio).
//! Rendering the panorama is left to the Marzipano viewer that ships with
//! every exported site; this crate owns the project data and the export
//! pipeline.
//!
//! # Architecture: Edit → Snapshot → Export
//!
//! ```text
//! 1. Edit      named operation  →  Project            (in-memory, &mut owned)
//! 2. Snapshot  Project          →  snapshot.json      (debounced, last write wins)
//! 3. Export    Project          →  site.zip / dir     (transcode → bundle → package)
//! ```
//!
//! The [`Project`](project::Project) is the only mutable state. Every user
//! action is one named operation on it, so the session knows exactly when to
//! schedule an auto-save and export always reads a consistent document.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`project`] | Scenes, hotspots, view parameters and the named mutation operations |
//! | [`imaging`] | Byte-budget image transcoder: quality then dimension reduction |
//! | [`generate`] | Renders `index.html`, `viewer.js`, `data.js` and the stylesheet using Maud |
//! | [`package`] | Adds the static viewer assets and writes the site as a zip or a directory |
//! | [`storage`] | Project document (de)serialization, snapshots and file import/export |
//! | [`session`] | Owns the project being edited and debounces auto-saves |
//! | [`media`] | Loads panoramas and audio from disk, validates URL scenes |
//! | [`naming`] | Default scene names from file names |
//! | [`video`] | YouTube/Vimeo/Podeduc id extraction and embed markup |
//! | [`publish`] | Uploads a packed site to a hosting service |
//! | [`config`] | `panotour.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting: project tree and export summaries |
//!
//! # Design Decisions
//!
//! ## Embedded Images
//!
//! Imported panoramas are stored in the project as `data:` URIs. A project
//! file is then a single self-contained document that can be moved, mailed
//! or versioned without a sidecar directory. The cost is size, which is why
//! snapshots have a hard limit and export transcodes to a byte budget.
//!
//! ## One Transcoder
//!
//! Export and publish go through the same [`imaging::transcode`] loop:
//! lower JPEG quality in steps down to a floor, then shrink dimensions,
//! until the encoded image fits. The loop is bounded, so a pathological
//! image yields the smallest attempt instead of spinning.
//!
//! ## Deterministic Bundles
//!
//! The exported layout is fixed (six files) and the zip is written in
//! sorted path order with zeroed timestamps. The same project exported
//! twice gives byte-identical archives.
//!
//! ## Maud Over Template Engines
//!
//! `index.html` is generated with [Maud](https://maud.lambda.xyz/). User
//! text (titles, descriptions) is escaped by default; the only raw HTML is
//! info hotspot content and Podeduc embed markup, which are user-authored
//! HTML by definition.

pub mod config;
pub mod generate;
pub mod imaging;
pub mod media;
pub mod naming;
pub mod output;
pub mod package;
pub mod project;
pub mod publish;
pub mod session;
pub mod storage;
pub mod video;

#[cfg(test)]
pub(crate) mod test_helpers;
