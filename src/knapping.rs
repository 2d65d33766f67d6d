//! Knapping pattern rasterization.
//!
//! A knapping recipe's pattern is a fixed 5×5 grid of struck/untouched cells.
//! There is no in-game renderer to screenshot, so the site draws its own:
//! each cell becomes a solid square of `block_size` pixels in one of two
//! configured colors, giving a `5*block_size` PNG per side.
//!
//! Output is **content-addressed**: the filename embeds a SHA-256 over the
//! grid bits, both colors, and the block size. Identical patterns across any
//! number of recipes produce one file and one encode per pass; changing the
//! palette in `guidebook.toml` changes the key and regenerates.

use crate::config::parse_hex_color;
use crate::context::RenderContext;
use image::{Rgb, RgbImage};
use sha2::{Digest, Sha256};

/// Knapping grids are always 5×5; shorter patterns pad with untouched cells.
pub const GRID_SIZE: usize = 5;

/// A parsed knapping pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnappingGrid {
    cells: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl KnappingGrid {
    /// Build a grid from pattern rows. Any non-space character marks a struck
    /// cell; rows and columns beyond the pattern are untouched.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let mut cells = [[false; GRID_SIZE]; GRID_SIZE];
        for (y, row) in rows.iter().take(GRID_SIZE).enumerate() {
            for (x, c) in row.as_ref().chars().take(GRID_SIZE).enumerate() {
                cells[y][x] = c != ' ';
            }
        }
        Self { cells }
    }

    pub fn is_active(&self, x: usize, y: usize) -> bool {
        self.cells[y][x]
    }

    pub fn active_count(&self) -> usize {
        self.cells
            .iter()
            .map(|row| row.iter().filter(|&&c| c).count())
            .sum()
    }
}

/// Draw the grid as an RGB image.
pub fn rasterize(
    grid: &KnappingGrid,
    active: [u8; 3],
    inactive: [u8; 3],
    block_size: u32,
) -> RgbImage {
    let side = GRID_SIZE as u32 * block_size;
    RgbImage::from_fn(side, side, |x, y| {
        let cell_x = (x / block_size) as usize;
        let cell_y = (y / block_size) as usize;
        if grid.is_active(cell_x, cell_y) {
            Rgb(active)
        } else {
            Rgb(inactive)
        }
    })
}

/// Content address for a rendered pattern: grid bits + colors + cell size.
pub fn content_key(
    grid: &KnappingGrid,
    active: [u8; 3],
    inactive: [u8; 3],
    block_size: u32,
) -> String {
    let mut hasher = Sha256::new();
    for y in 0..GRID_SIZE {
        for x in 0..GRID_SIZE {
            hasher.update([u8::from(grid.is_active(x, y))]);
        }
    }
    hasher.update(active);
    hasher.update(inactive);
    hasher.update(block_size.to_le_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Render a pattern into `_images/`, or return the cached filename if this
/// pass already rendered identical content. Returns the filename under
/// `_images/`, or `None` when the PNG could not be written (reported via the
/// context, never fatal).
pub fn render_knapping(ctx: &mut RenderContext, grid: &KnappingGrid) -> Option<String> {
    let active = parse_hex_color(&ctx.config.knapping.active).unwrap_or([0xd8, 0xc8, 0xb4]);
    let inactive = parse_hex_color(&ctx.config.knapping.inactive).unwrap_or([0x54, 0x46, 0x3c]);
    let block_size = ctx.config.knapping.block_size.max(1);

    let key = content_key(grid, active, inactive, block_size);
    if let Some(filename) = ctx.cached_raster(&key) {
        return Some(filename.to_string());
    }

    let filename = format!("knapping_{}.png", &key[..16]);
    let path = ctx.images_dir.join(&filename);
    let img = rasterize(grid, active, inactive, block_size);
    if let Err(err) = img.save(&path) {
        ctx.error(format!(
            "Failed to write knapping raster {}: {err}",
            path.display()
        ));
        return None;
    }

    tracing::debug!("Rendered knapping pattern -> _images/{filename}");
    ctx.record_raster(&key, filename.clone());
    Some(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::disk_context;
    use tempfile::TempDir;

    const ACTIVE: [u8; 3] = [200, 180, 160];
    const INACTIVE: [u8; 3] = [80, 70, 60];

    #[test]
    fn from_rows_marks_nonspace_as_struck() {
        let grid = KnappingGrid::from_rows(&["X X", " # "]);
        assert!(grid.is_active(0, 0));
        assert!(!grid.is_active(1, 0));
        assert!(grid.is_active(2, 0));
        assert!(grid.is_active(1, 1));
        // Padding beyond the pattern is untouched
        assert!(!grid.is_active(4, 4));
        assert_eq!(grid.active_count(), 3);
    }

    #[test]
    fn all_false_grid_has_zero_active_pixels() {
        let grid = KnappingGrid::from_rows::<&str>(&[]);
        let img = rasterize(&grid, ACTIVE, INACTIVE, 4);

        assert_eq!(img.width(), 20);
        assert_eq!(img.height(), 20);
        assert!(img.pixels().all(|p| p.0 == INACTIVE));
    }

    #[test]
    fn full_grid_is_entirely_active() {
        let grid = KnappingGrid::from_rows(&["XXXXX"; 5]);
        let img = rasterize(&grid, ACTIVE, INACTIVE, 2);
        assert!(img.pixels().all(|p| p.0 == ACTIVE));
    }

    #[test]
    fn raster_blocks_align_to_cells() {
        let grid = KnappingGrid::from_rows(&["X"]);
        let img = rasterize(&grid, ACTIVE, INACTIVE, 8);

        assert_eq!(img.get_pixel(0, 0).0, ACTIVE);
        assert_eq!(img.get_pixel(7, 7).0, ACTIVE);
        assert_eq!(img.get_pixel(8, 0).0, INACTIVE);
        assert_eq!(img.get_pixel(0, 8).0, INACTIVE);
    }

    #[test]
    fn content_key_is_stable_and_color_sensitive() {
        let a = KnappingGrid::from_rows(&["X X", "XXX"]);
        let b = KnappingGrid::from_rows(&["X X", "XXX"]);
        assert_eq!(
            content_key(&a, ACTIVE, INACTIVE, 32),
            content_key(&b, ACTIVE, INACTIVE, 32)
        );
        assert_ne!(
            content_key(&a, ACTIVE, INACTIVE, 32),
            content_key(&a, INACTIVE, ACTIVE, 32)
        );
        assert_ne!(
            content_key(&a, ACTIVE, INACTIVE, 32),
            content_key(&a, ACTIVE, INACTIVE, 16)
        );
    }

    #[test]
    fn identical_grids_render_once() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = disk_context(tmp.path());

        let grid = KnappingGrid::from_rows(&[" XXX ", "XXXXX", "XXXXX", "XXXXX", " XXX "]);
        let first = render_knapping(&mut ctx, &grid).unwrap();
        let second = render_knapping(&mut ctx, &grid).unwrap();
        assert_eq!(first, second);

        let files: Vec<_> = std::fs::read_dir(&ctx.images_dir)
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn distinct_grids_render_distinct_files() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = disk_context(tmp.path());

        let a = render_knapping(&mut ctx, &KnappingGrid::from_rows(&["X"])).unwrap();
        let b = render_knapping(&mut ctx, &KnappingGrid::from_rows(&[" X"])).unwrap();
        assert_ne!(a, b);
    }
}
