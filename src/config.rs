//! Site configuration module.
//!
//! Handles loading and validating `guidebook.toml` from the book root. Every
//! option has a stock default, so the file is entirely optional — a bare book
//! tree builds with sensible settings.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Field Guide"          # Site title used in page chrome
//! version = "dev"                # Shown in the navigation bar
//! languages = ["en_us"]          # One generation pass per language
//!
//! [palette]
//! # Style names usable in markup as $(name)text$(). Values are CSS colors.
//! thing = "#449044"
//! item = "#8844aa"
//! gold = "#ffaa00"
//!
//! [keybinds]
//! # Labels substituted for $(k:name) markup directives.
//! "key.use" = "Right Click"
//! "key.sneak" = "Shift"
//!
//! [knapping]
//! active = "#d8c8b4"             # Struck cells in knapping pattern rasters
//! inactive = "#54463c"           # Untouched cells
//! block_size = 32                # Pixels per grid cell
//! ```
//!
//! ## Palette and Keybinds
//!
//! The markup grammar itself is fixed; the *names* it can resolve are not.
//! Style spans and keybind directives look up their name in these tables at
//! render time, and an unknown name degrades to plain text with a warning
//! rather than failing the page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Name of the config file within the book root.
const CONFIG_FILENAME: &str = "guidebook.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parse error in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid color {value:?} for {field} (expected #rrggbb)")]
    InvalidColor { field: String, value: String },
}

/// Top-level site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site title used in the page chrome and `<title>` elements.
    pub title: String,
    /// Version string shown in the navigation bar.
    pub version: String,
    /// Languages to generate, one full pass each. Also drives the language
    /// switcher in the chrome.
    pub languages: Vec<String>,
    /// Style names resolvable by `$(name)` markup spans, mapped to CSS colors.
    pub palette: BTreeMap<String, String>,
    /// Keybind names resolvable by `$(k:name)` markup directives.
    pub keybinds: BTreeMap<String, String>,
    pub knapping: KnappingConfig,
}

/// Colors and cell size for knapping pattern rasters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnappingConfig {
    /// Fill color for struck cells.
    pub active: String,
    /// Fill color for untouched cells.
    pub inactive: String,
    /// Edge length of one grid cell, in pixels.
    pub block_size: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Field Guide".to_string(),
            version: "dev".to_string(),
            languages: vec!["en_us".to_string()],
            palette: default_palette(),
            keybinds: default_keybinds(),
            knapping: KnappingConfig::default(),
        }
    }
}

impl Default for KnappingConfig {
    fn default() -> Self {
        Self {
            active: "#d8c8b4".to_string(),
            inactive: "#54463c".to_string(),
            block_size: 32,
        }
    }
}

fn default_palette() -> BTreeMap<String, String> {
    [
        ("thing", "#449044"),
        ("item", "#8844aa"),
        ("black", "#000000"),
        ("gray", "#aaaaaa"),
        ("dark_gray", "#555555"),
        ("red", "#ff5555"),
        ("dark_red", "#aa0000"),
        ("gold", "#ffaa00"),
        ("yellow", "#ffff55"),
        ("green", "#55ff55"),
        ("dark_green", "#00aa00"),
        ("aqua", "#55ffff"),
        ("dark_aqua", "#00aaaa"),
        ("blue", "#5555ff"),
        ("dark_blue", "#0000aa"),
        ("light_purple", "#ff55ff"),
        ("dark_purple", "#aa00aa"),
        ("white", "#ffffff"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_keybinds() -> BTreeMap<String, String> {
    [
        ("key.inventory", "E"),
        ("key.attack", "Left Click"),
        ("key.use", "Right Click"),
        ("key.drop", "Q"),
        ("key.sneak", "Shift"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Load configuration from `<book_root>/guidebook.toml`.
///
/// Returns stock defaults if the file doesn't exist. A present-but-malformed
/// file is an error — silently ignoring a typo'd config surprises users more
/// than failing fast does.
pub fn load_config(book_root: &Path) -> Result<SiteConfig, ConfigError> {
    let path = book_root.join(CONFIG_FILENAME);
    if !path.exists() {
        return Ok(SiteConfig::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let config: SiteConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    validate(&config)?;
    Ok(config)
}

/// Check that the knapping colors parse, since they feed the rasterizer.
///
/// Palette colors are *not* validated here: they are emitted verbatim into
/// CSS, where any CSS color syntax is legal.
fn validate(config: &SiteConfig) -> Result<(), ConfigError> {
    for (field, value) in [
        ("knapping.active", &config.knapping.active),
        ("knapping.inactive", &config.knapping.inactive),
    ] {
        if parse_hex_color(value).is_none() {
            return Err(ConfigError::InvalidColor {
                field: field.to_string(),
                value: value.clone(),
            });
        }
    }
    Ok(())
}

/// A documented `guidebook.toml` with every option at its stock value, for
/// the `gen-config` command.
pub fn stock_config_toml() -> String {
    let defaults = SiteConfig::default();
    let palette: String = defaults
        .palette
        .iter()
        .map(|(name, color)| format!("{name} = \"{color}\"\n"))
        .collect();
    let keybinds: String = defaults
        .keybinds
        .iter()
        .map(|(name, label)| format!("\"{name}\" = \"{label}\"\n"))
        .collect();
    format!(
        r#"# guidebook.toml - site configuration, all options optional.
# Place this file at the book root, next to the language directories.

# Site title used in page chrome and <title> elements.
title = "{title}"

# Version string shown in the footer.
version = "{version}"

# Languages to generate, one full pass each. Each needs a matching
# <book>/<lang>/ directory with categories/ and entries/ inside.
languages = ["en_us"]

# Style names usable in markup as $(name)text$(). Values are CSS colors.
[palette]
{palette}
# Labels substituted for $(k:name) markup directives.
[keybinds]
{keybinds}
# Knapping pattern rasters.
[knapping]
active = "{active}"       # struck cells
inactive = "{inactive}"     # untouched cells
block_size = {block_size}            # pixels per grid cell
"#,
        title = defaults.title,
        version = defaults.version,
        active = defaults.knapping.active,
        inactive = defaults.knapping.inactive,
        block_size = defaults.knapping.block_size,
    )
}

/// Parse a `#rrggbb` hex color into RGB bytes.
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}
