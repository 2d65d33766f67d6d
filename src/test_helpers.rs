//! Shared helpers for unit tests.

use crate::config::SiteConfig;
use crate::context::{LinkTarget, RenderContext};
use std::path::PathBuf;

/// A context over dummy paths, for tests that never touch the filesystem.
pub(crate) fn test_context() -> RenderContext {
    RenderContext::new(
        SiteConfig::default(),
        PathBuf::from("assets"),
        PathBuf::from("data"),
        PathBuf::from("out/_images"),
    )
}

/// A context whose image/data directories live under a temp dir, laid out as
/// `<root>/assets`, `<root>/data`, `<root>/out/_images` (all created).
pub(crate) fn disk_context(root: &std::path::Path) -> RenderContext {
    let assets = root.join("assets");
    let data = root.join("data");
    let images = root.join("out").join("_images");
    std::fs::create_dir_all(&assets).unwrap();
    std::fs::create_dir_all(&data).unwrap();
    std::fs::create_dir_all(&images).unwrap();
    RenderContext::new(SiteConfig::default(), assets, data, images)
}

/// Register a link target with matching path and name.
pub(crate) fn register(ctx: &mut RenderContext, key: &str, path: &str, name: &str) {
    ctx.register_link(
        key,
        LinkTarget {
            path: path.to_string(),
            name: name.to_string(),
        },
    );
}
