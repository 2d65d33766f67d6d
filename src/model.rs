//! Document model: categories, entries, and typed page variants.
//!
//! The guide book on disk is a tree of JSON files:
//!
//! ```text
//! book/
//! ├── guidebook.toml
//! ├── en_us/
//! │   ├── categories/
//! │   │   └── stone_age.json        # { name, description, sortnum }
//! │   └── entries/
//! │       └── stone_age/
//! │           └── knapping.json     # { name, category, sortnum?, pages: [...] }
//! └── ja_jp/
//!     └── ...
//! ```
//!
//! Pages arrive as loosely-typed JSON objects tagged by a namespaced `type`
//! field. This module converts them into [`PageKind`] variants with the fields
//! each kind actually requires, so a missing field is a typed parse error
//! reported at the file level instead of a silent lookup failure deep inside
//! rendering. Unknown page types are preserved as [`PageKind::Unknown`] — the
//! dispatcher warns and skips them rather than rejecting the whole entry.
//!
//! ## Sort ordering
//!
//! Categories and entries are displayed by `sortnum` ascending, ties broken by
//! id (case-insensitive). An entry without `sortnum` defaults to -1, which
//! sorts it ahead of explicitly numbered siblings — matching in-game behavior.

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON parse error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Entry {entry} references unknown category {category}")]
    UnknownCategory { entry: String, category: String },
}

/// Top-level grouping of entries.
#[derive(Debug)]
pub struct Category {
    /// Path relative to `categories/`, without extension. Unique per run.
    pub id: String,
    pub name: String,
    /// Raw markup text; rendered to HTML at assembly time, once the link
    /// table is complete.
    pub description: String,
    pub sort: i64,
    pub entries: Vec<Entry>,
}

/// A single documentation article composed of ordered pages.
#[derive(Debug)]
pub struct Entry {
    /// Path relative to `entries/`, without extension. Unique per run.
    pub id: String,
    /// Declared category with its namespace prefix stripped.
    pub category_id: String,
    pub name: String,
    pub sort: i64,
    pub pages: Vec<Page>,
}

/// One content unit within an entry.
#[derive(Debug)]
pub struct Page {
    /// Stable in-page identifier for deep links; wraps the page's whole
    /// rendered output in an id'd container.
    pub anchor: Option<String>,
    pub kind: PageKind,
}

/// The ~12 structured page kinds a book can contain.
#[derive(Debug)]
pub enum PageKind {
    Text(TextPage),
    Image(ImagePage),
    Crafting(CraftingPage),
    Spotlight(SpotlightPage),
    Entity(EntityPage),
    Empty,
    Multiblock(MultiblockPage),
    Device(DevicePage),
    Knapping(KnappingPage),
    /// Unrecognized `type` tag, kept verbatim for the skip-and-warn path.
    Unknown(String),
}

#[derive(Debug, Deserialize)]
pub struct TextPage {
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ImagePage {
    pub title: Option<String>,
    /// Logical image ids (`namespace:relative/path`).
    pub images: Vec<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CraftingPage {
    pub title: Option<String>,
    pub recipe: Option<String>,
    pub recipe2: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpotlightPage {
    pub title: Option<String>,
    pub item: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntityPage {
    pub name: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MultiblockPage {
    pub name: Option<String>,
    pub multiblock: Option<MultiblockSpec>,
    pub multiblock_id: Option<String>,
    pub text: Option<String>,
}

/// Inline multiblock declaration: a layered pattern plus symbol mapping.
#[derive(Debug, Deserialize)]
pub struct MultiblockSpec {
    pub pattern: Vec<Vec<String>>,
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
}

impl MultiblockSpec {
    /// True for the single-column patterns (`[["X"],["0"]]` with an optional
    /// `["Y"]` layer) that describe exactly one interesting block.
    pub fn single_block(&self) -> Option<&str> {
        let layer = |i: usize, s: &str| {
            self.pattern
                .get(i)
                .is_some_and(|row| row.len() == 1 && row[0] == s)
        };
        let is_single = match self.pattern.len() {
            2 => layer(0, "X") && layer(1, "0"),
            3 => layer(0, "X") && layer(1, "Y") && layer(2, "0"),
            _ => false,
        };
        if is_single {
            self.mapping.get("X").map(String::as_str)
        } else {
            None
        }
    }
}

/// Kind of device a device recipe page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Welding,
    Anvil,
    Heat,
    Quern,
}

#[derive(Debug)]
pub struct DevicePage {
    pub device: Device,
    pub recipe: String,
    pub text: Option<String>,
}

/// Material a knapping recipe page works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnappingKind {
    Clay,
    FireClay,
    Leather,
    Rock,
}

#[derive(Debug)]
pub struct KnappingPage {
    pub kind: KnappingKind,
    pub recipe: String,
    pub text: Option<String>,
}

/// Shared shape of device and knapping recipe pages.
#[derive(Debug, Deserialize)]
struct RecipePageFields {
    recipe: String,
    text: Option<String>,
}

/// Raw page envelope: the tag plus everything else, split so each kind can be
/// re-deserialized into its own typed struct.
#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(rename = "type")]
    kind: String,
    anchor: Option<String>,
    #[serde(flatten)]
    rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    name: String,
    description: String,
    sortnum: i64,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    category: String,
    #[serde(default = "default_entry_sort")]
    sortnum: i64,
    pages: Vec<serde_json::Value>,
}

fn default_entry_sort() -> i64 {
    -1
}

/// Strip a `namespace:` prefix from an identifier, if present.
pub fn strip_namespace(id: &str) -> &str {
    match id.split_once(':') {
        Some((_, rest)) => rest,
        None => id,
    }
}

impl Category {
    /// Parse a category file's JSON content. `id` is the path relative to
    /// `categories/` without extension.
    pub fn parse(id: &str, path: &str, content: &str) -> Result<Self, ModelError> {
        let raw: RawCategory = serde_json::from_str(content).map_err(|source| ModelError::Json {
            path: path.to_string(),
            source,
        })?;
        Ok(Self {
            id: id.to_string(),
            name: raw.name,
            description: raw.description,
            sort: raw.sortnum,
            entries: Vec::new(),
        })
    }
}

impl Entry {
    /// Parse an entry file's JSON content. `id` is the path relative to
    /// `entries/` without extension.
    pub fn parse(id: &str, path: &str, content: &str) -> Result<Self, ModelError> {
        let raw: RawEntry = serde_json::from_str(content).map_err(|source| ModelError::Json {
            path: path.to_string(),
            source,
        })?;

        let mut pages = Vec::with_capacity(raw.pages.len());
        for value in raw.pages {
            pages.push(parse_page(path, value)?);
        }

        Ok(Self {
            id: id.to_string(),
            category_id: strip_namespace(&raw.category).to_string(),
            name: raw.name,
            sort: raw.sortnum,
            pages,
        })
    }
}

/// Parse one page object into its typed variant.
///
/// The tag's namespace is ignored for dispatch — `patchouli:text` and
/// `mymod:text` are the same page kind. Missing required fields surface as a
/// [`ModelError::Json`] carrying the entry file's path.
fn parse_page(path: &str, value: serde_json::Value) -> Result<Page, ModelError> {
    let raw: RawPage = serde_json::from_value(value).map_err(|source| ModelError::Json {
        path: path.to_string(),
        source,
    })?;

    let fields = serde_json::Value::Object(raw.rest);
    let typed = |source| ModelError::Json {
        path: path.to_string(),
        source,
    };

    let kind = match strip_namespace(&raw.kind) {
        "text" => PageKind::Text(serde_json::from_value(fields).map_err(typed)?),
        "image" => PageKind::Image(serde_json::from_value(fields).map_err(typed)?),
        "crafting" => PageKind::Crafting(serde_json::from_value(fields).map_err(typed)?),
        "spotlight" => PageKind::Spotlight(serde_json::from_value(fields).map_err(typed)?),
        "entity" => PageKind::Entity(serde_json::from_value(fields).map_err(typed)?),
        "empty" => PageKind::Empty,
        "multiblock" | "multimultiblock" => {
            PageKind::Multiblock(serde_json::from_value(fields).map_err(typed)?)
        }
        tag @ ("welding_recipe" | "anvil_recipe" | "heat_recipe" | "quern_recipe") => {
            let device = match tag {
                "welding_recipe" => Device::Welding,
                "anvil_recipe" => Device::Anvil,
                "heat_recipe" => Device::Heat,
                _ => Device::Quern,
            };
            let common: RecipePageFields = serde_json::from_value(fields).map_err(typed)?;
            PageKind::Device(DevicePage {
                device,
                recipe: common.recipe,
                text: common.text,
            })
        }
        tag @ ("clay_knapping_recipe"
        | "fire_clay_knapping_recipe"
        | "leather_knapping_recipe"
        | "rock_knapping_recipe") => {
            let kind = match tag {
                "clay_knapping_recipe" => KnappingKind::Clay,
                "fire_clay_knapping_recipe" => KnappingKind::FireClay,
                "leather_knapping_recipe" => KnappingKind::Leather,
                _ => KnappingKind::Rock,
            };
            let common: RecipePageFields = serde_json::from_value(fields).map_err(typed)?;
            PageKind::Knapping(KnappingPage {
                kind,
                recipe: common.recipe,
                text: common.text,
            })
        }
        _ => PageKind::Unknown(raw.kind.clone()),
    };

    Ok(Page {
        anchor: raw.anchor,
        kind,
    })
}

/// The loaded document tree for one language pass.
#[derive(Debug, Default)]
pub struct Book {
    pub categories: Vec<Category>,
}

impl Book {
    /// Add a parsed category. Ids are unique by construction (one file, one
    /// id), so no duplicate handling here.
    pub fn add_category(&mut self, category: Category) {
        self.categories.push(category);
    }

    /// Attach an entry to its declared category.
    ///
    /// Fails at entry granularity if the category was never loaded — the
    /// caller logs the error and continues the batch.
    pub fn add_entry(&mut self, entry: Entry) -> Result<(), ModelError> {
        match self
            .categories
            .iter_mut()
            .find(|c| c.id == entry.category_id)
        {
            Some(category) => {
                category.entries.push(entry);
                Ok(())
            }
            None => Err(ModelError::UnknownCategory {
                entry: entry.id,
                category: entry.category_id,
            }),
        }
    }

    /// Apply display ordering: `sort` ascending, ties broken by id
    /// (case-insensitive), recursively for entries within each category.
    pub fn sort(&mut self) {
        self.categories
            .sort_by(|a, b| sort_key(a.sort, &a.id).cmp(&sort_key(b.sort, &b.id)));
        for category in &mut self.categories {
            category
                .entries
                .sort_by(|a, b| sort_key(a.sort, &a.id).cmp(&sort_key(b.sort, &b.id)));
        }
    }

    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }
}

fn sort_key(sort: i64, id: &str) -> (i64, String) {
    (sort, id.to_lowercase())
}
