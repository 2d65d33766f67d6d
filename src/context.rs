//! Per-language render context.
//!
//! One [`RenderContext`] is constructed per language pass and discarded when
//! that language's pages are written. It carries the only mutable state
//! rendering needs:
//!
//! - a monotonically increasing uid counter for carousel DOM ids,
//! - the cross-reference link table (entry/category key → output path + name),
//! - idempotency caches for copied images and knapping rasters,
//! - the diagnostics sink.
//!
//! ## Diagnostics as values
//!
//! Renderer-level code never returns errors — bad input degrades to literal or
//! placeholder output. What it does instead is record a [`Diagnostic`] here
//! (mirrored to `tracing` for the operator), so tests can assert on warning
//! counts directly and the CLI can print a final tally. A run that completes
//! with a non-zero count is a successful-but-incomplete build, not a failure.

use crate::config::SiteConfig;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Severity of a recorded diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One degrade-and-continue event recorded during rendering.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Resolved target of an internal cross-reference.
#[derive(Debug, Clone)]
pub struct LinkTarget {
    /// Output path relative to the language root, without `.html`
    /// (e.g. `stone_age/knapping` or `stone_age/index`).
    pub path: String,
    /// Display name, used as link text when the markup gives none.
    pub name: String,
}

/// Mutable state threaded through every render call of one language pass.
#[derive(Debug)]
pub struct RenderContext {
    pub config: SiteConfig,
    /// Cross-reference lookup: entry/category keys → resolved targets.
    pub links: BTreeMap<String, LinkTarget>,
    /// Mod asset root (`<assets>/<namespace>/...` holds textures).
    pub assets_dir: PathBuf,
    /// Mod data root (`<data>/<namespace>/recipes/...` holds recipe JSON).
    pub data_dir: PathBuf,
    /// Shared output image directory (`<out>/_images`), common to all passes.
    pub images_dir: PathBuf,

    /// Page currently being rendered, relative to the language root, without
    /// `.html`. Drives relative-href computation.
    current_page: String,
    next_uid: u32,
    /// Logical image id → filename under `_images/`. One copy per id per pass.
    copied_images: HashMap<String, String>,
    /// Knapping content hash → filename under `_images/`. One encode per
    /// distinct grid content per pass.
    knapping_rasters: HashMap<String, String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderContext {
    pub fn new(
        config: SiteConfig,
        assets_dir: PathBuf,
        data_dir: PathBuf,
        images_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            links: BTreeMap::new(),
            assets_dir,
            data_dir,
            images_dir,
            current_page: "index".to_string(),
            next_uid: 0,
            copied_images: HashMap::new(),
            knapping_rasters: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Register a link target under a key. First registration wins so that
    /// traversal order keeps resolution deterministic.
    pub fn register_link(&mut self, key: &str, target: LinkTarget) {
        self.links.entry(key.to_string()).or_insert(target);
    }

    pub fn resolve_link(&self, key: &str) -> Option<&LinkTarget> {
        self.links.get(key)
    }

    /// Set the page whose fragments are being rendered (language-root
    /// relative, no extension). Resets nothing else; uid and caches span the
    /// whole pass.
    pub fn set_current_page(&mut self, page: &str) {
        self.current_page = page.to_string();
    }

    /// Next unique DOM id for this pass.
    pub fn next_id(&mut self) -> String {
        let uid = self.next_uid;
        self.next_uid += 1;
        format!("gb-{uid}")
    }

    /// Relative href from the current page to another page in this language.
    pub fn href_to(&self, target: &str) -> String {
        format!("{}{}.html", self.climb_prefix(0), target)
    }

    /// Relative href from the current page to a file under the shared
    /// `_images/` directory at the output root (one level above the language
    /// directory).
    pub fn href_to_image(&self, filename: &str) -> String {
        format!("{}_images/{}", self.climb_prefix(1), filename)
    }

    /// `../` repeated to climb out of the current page's directory, plus
    /// `extra` additional levels.
    fn climb_prefix(&self, extra: usize) -> String {
        let depth = self.current_page.matches('/').count() + extra;
        "../".repeat(depth)
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            message,
        });
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Look up a previously copied image by logical id.
    pub fn cached_image(&self, logical_id: &str) -> Option<&str> {
        self.copied_images.get(logical_id).map(String::as_str)
    }

    pub fn record_image(&mut self, logical_id: &str, filename: String) {
        self.copied_images.insert(logical_id.to_string(), filename);
    }

    /// Look up a previously rendered knapping raster by content hash.
    pub fn cached_raster(&self, content_key: &str) -> Option<&str> {
        self.knapping_rasters.get(content_key).map(String::as_str)
    }

    pub fn record_raster(&mut self, content_key: &str, filename: String) {
        self.knapping_rasters
            .insert(content_key.to_string(), filename);
    }
}
