//! Image resolution and copying.
//!
//! Pages reference images by logical id — `namespace:relative/path`, resolved
//! against the mod asset tree (`<assets>/<namespace>/<relative/path>`). Each
//! referenced image is copied once into the shared `_images/` directory at the
//! output root under a flattened, collision-free name, and callers get back a
//! path relative to the page currently being rendered.
//!
//! Resolution is idempotent per pass: the context caches logical id →
//! flattened filename, so a second request returns the same output path
//! without touching the filesystem again.
//!
//! A missing source file is an error-level diagnostic, not a failure — the
//! page gets a placeholder path and generation continues.

use crate::context::RenderContext;
use sha2::{Digest, Sha256};

/// Filename returned for images whose source could not be found or copied.
const PLACEHOLDER: &str = "missing.png";

/// Resolve a logical image id to a page-relative output path, copying the
/// source into `_images/` on first sight.
pub fn resolve_image(ctx: &mut RenderContext, logical_id: &str) -> String {
    if let Some(filename) = ctx.cached_image(logical_id) {
        let filename = filename.to_string();
        return ctx.href_to_image(&filename);
    }

    let (namespace, rel_path) = match logical_id.split_once(':') {
        Some(parts) => parts,
        None => ("", logical_id),
    };

    let source = if namespace.is_empty() {
        ctx.assets_dir.join(rel_path)
    } else {
        ctx.assets_dir.join(namespace).join(rel_path)
    };

    if !source.is_file() {
        ctx.error(format!(
            "Missing image {logical_id} (expected at {})",
            source.display()
        ));
        ctx.record_image(logical_id, PLACEHOLDER.to_string());
        return ctx.href_to_image(PLACEHOLDER);
    }

    let filename = flatten_name(namespace, rel_path);
    let dest = ctx.images_dir.join(&filename);
    if let Err(err) = std::fs::copy(&source, &dest) {
        ctx.error(format!("Failed to copy image {logical_id}: {err}"));
        ctx.record_image(logical_id, PLACEHOLDER.to_string());
        return ctx.href_to_image(PLACEHOLDER);
    }

    tracing::debug!("Copied image {logical_id} -> _images/{filename}");
    ctx.record_image(logical_id, filename.clone());
    ctx.href_to_image(&filename)
}

/// Flatten `namespace:a/b/c.png` into `namespace_a_b_c.<tag>.png`.
///
/// The namespace prefix keeps two mods' identically named textures apart,
/// and the tag is a short hash of the full logical id: slash-to-underscore
/// flattening alone is not injective (`a/b_c.png` and `a_b/c.png` would
/// land on the same name in the shared output directory).
fn flatten_name(namespace: &str, rel_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(rel_path.as_bytes());
    let digest = hasher.finalize();
    let tag: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();

    let (stem, ext) = match rel_path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => (stem, Some(ext)),
        _ => (rel_path, None),
    };
    let flat = stem.replace('/', "_");
    let mut name = if namespace.is_empty() {
        flat
    } else {
        format!("{namespace}_{flat}")
    };
    name.push('.');
    name.push_str(&tag);
    if let Some(ext) = ext {
        name.push('.');
        name.push_str(ext);
    }
    name
}
