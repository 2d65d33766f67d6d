//! # Guidebook
//!
//! A static site generator for game mod field guides. The guide book a mod
//! ships in game — a tree of JSON category/entry files whose text bodies use
//! a small inline markup language — becomes a navigable multi-language HTML
//! site that players can read in a browser.
//!
//! # Architecture: One Pass Per Language
//!
//! Each configured language renders independently, in two phases:
//!
//! ```text
//! 1. Load     book/<lang>/  →  Book            (JSON files → document model)
//! 2. Render   Book          →  out/<lang>/     (link table → HTML pages)
//! ```
//!
//! Loading the whole model before rendering anything means cross-references
//! resolve regardless of declaration order: an early entry can link to a late
//! one because the link table is complete before the first page renders.
//! Generated images (copied textures, knapping rasters) land in a single
//! `out/_images/` directory shared by every language, deduplicated per run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`site`] | Walks the book tree, builds the model, writes the HTML site |
//! | [`model`] | Document model: categories, entries, typed page variants |
//! | [`markup`] | The inline markup formatter — text bodies to safe HTML fragments |
//! | [`render`] | Page dispatcher — one fixed fragment sequence per page kind |
//! | [`recipe`] | Recipe JSON loading and table rendering |
//! | [`knapping`] | 5×5 pattern rasterizer, content-addressed PNG output |
//! | [`images`] | Logical image ids → flattened copies under `_images/` |
//! | [`context`] | Per-language render state: link table, caches, diagnostics |
//! | [`config`] | `guidebook.toml` loading: palette, keybinds, languages |
//!
//! # Design Decisions
//!
//! ## Degrade, Don't Die
//!
//! A guide book is written by modders, not validated by a schema, and a
//! thousand-entry book with one broken link should still build. Renderer-level
//! code is therefore total: malformed markup renders as literal text, a
//! missing recipe file renders as nothing, an unknown page type renders as
//! nothing — each with a diagnostic recorded on the [`context::RenderContext`]
//! and mirrored to `tracing`. Only file-level failures (unreadable or
//! unparsable JSON) skip anything, and then only that one file. The run ends
//! with a warning/error tally instead of a stack trace.
//!
//! ## Maud Over Template Engines
//!
//! Page chrome is generated with [Maud](https://maud.lambda.xyz/), a
//! compile-time HTML macro system: malformed HTML is a build error and all
//! interpolation is auto-escaped. Page *bodies* are accumulated as string
//! fragments instead — the markup formatter produces HTML incrementally from
//! a recursive-descent parse, which maps naturally onto a buffer of escaped
//! pieces rather than onto a single typed template.
//!
//! ## Content-Addressed Images
//!
//! Knapping rasters are named by a hash of their pixel content, and copied
//! textures by their flattened logical id. Both are cached per run, so a
//! pattern used by fifty recipes is encoded once and a texture shown on ten
//! pages is copied once. There is no persistent cache: every run regenerates
//! the site from scratch.

pub mod config;
pub mod context;
pub mod images;
pub mod knapping;
pub mod markup;
pub mod model;
pub mod recipe;
pub mod render;
pub mod site;

#[cfg(test)]
pub(crate) mod test_helpers;
