//! Palette construction and nearest-color matching.
//!
//! Palettized BMP output needs a fixed color table plus a way to map every
//! source pixel onto an entry of it. This module builds both together: the
//! 8-bit path seeds a 6x7x6 color cube and tops the table up from the
//! image's own colors, while the 4-bit path keeps the 16 most frequent
//! cells of a 4x4x4 grid. The lookup structures travel with the table in an
//! [`IndexedPalette`], so the file encoder and the on-screen preview share
//! identical matching behavior.

use std::collections::HashMap;

use crate::OPAQUE_ALPHA_THRESHOLD;

/// Number of entries in an 8-bit palette.
pub const PALETTE_LEN_8BIT: usize = 256;

/// Number of entries in a 4-bit palette.
pub const PALETTE_LEN_4BIT: usize = 16;

/// A single palette color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Squared Euclidean distance to another RGB value.
    fn distance_squared(self, r: u8, g: u8, b: u8) -> u32 {
        let dr = self.r as i32 - r as i32;
        let dg = self.g as i32 - g as i32;
        let db = self.b as i32 - b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

/// Uniform subdivision of the RGB cube, used both for frequency counting
/// and as the spatial key space for palette lookup.
///
/// The 8-bit grid gives green an extra level (6x7x6) to match its higher
/// perceptual weight; the 4-bit grid is a plain 4x4x4 cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BucketGrid {
    r_levels: u32,
    g_levels: u32,
    b_levels: u32,
}

impl BucketGrid {
    const EIGHT_BIT: BucketGrid = BucketGrid {
        r_levels: 6,
        g_levels: 7,
        b_levels: 6,
    };

    const FOUR_BIT: BucketGrid = BucketGrid {
        r_levels: 4,
        g_levels: 4,
        b_levels: 4,
    };

    /// Grid coordinates of an RGB value.
    fn bucket(&self, r: u8, g: u8, b: u8) -> (u32, u32, u32) {
        (
            r as u32 * self.r_levels / 256,
            g as u32 * self.g_levels / 256,
            b as u32 * self.b_levels / 256,
        )
    }

    /// Packed map key for a grid cell.
    fn key(rq: u32, gq: u32, bq: u32) -> u32 {
        (rq << 16) | (gq << 8) | bq
    }

    /// Grid coordinates back out of a packed key.
    fn split(key: u32) -> (u32, u32, u32) {
        (key >> 16, (key >> 8) & 0xff, key & 0xff)
    }

    /// Representative color of a grid cell: each level maps onto an even
    /// ramp over 0..=255.
    fn color(&self, rq: u32, gq: u32, bq: u32) -> Rgb {
        Rgb {
            r: level_to_channel(rq, self.r_levels),
            g: level_to_channel(gq, self.g_levels),
            b: level_to_channel(bq, self.b_levels),
        }
    }
}

/// round(level * 255 / (levels - 1)), in integer arithmetic.
fn level_to_channel(level: u32, levels: u32) -> u8 {
    let divisor = levels - 1;
    ((level * 255 + divisor / 2) / divisor) as u8
}

/// A BMP color table plus the lookup structures needed to map arbitrary
/// RGB values onto it.
///
/// Entry order is significant: it is the on-disk palette order, and every
/// pixel index in the encoded file refers into it.
#[derive(Debug, Clone)]
pub struct IndexedPalette {
    entries: Vec<Rgb>,
    by_bucket: HashMap<u32, usize>,
    grid: BucketGrid,
    /// Whether a bucket miss probes neighboring grid cells before falling
    /// back to a full scan. Only worthwhile for the 256-entry table; the
    /// 16-entry table scans directly.
    search_neighbors: bool,
}

impl IndexedPalette {
    /// Build the 256-color table for 8-bit output.
    ///
    /// Seeds the full 6x7x6 color cube first (252 anchors, red outermost,
    /// blue innermost), then scans the opaque pixels and appends the most
    /// frequent buckets not already anchored, most frequent first with
    /// first-encountered winning ties, until the table holds 256 entries.
    /// Any remaining slots are filled with black.
    pub fn build_8bit(pixels: &[u8]) -> Self {
        let grid = BucketGrid::EIGHT_BIT;
        let mut entries = Vec::with_capacity(PALETTE_LEN_8BIT);
        let mut by_bucket = HashMap::new();

        for rq in 0..grid.r_levels {
            for gq in 0..grid.g_levels {
                for bq in 0..grid.b_levels {
                    by_bucket.insert(BucketGrid::key(rq, gq, bq), entries.len());
                    entries.push(grid.color(rq, gq, bq));
                }
            }
        }

        if entries.len() < PALETTE_LEN_8BIT {
            let free_slots = PALETTE_LEN_8BIT - entries.len();
            for key in top_buckets(pixels, grid, &by_bucket, free_slots) {
                let (rq, gq, bq) = BucketGrid::split(key);
                by_bucket.insert(key, entries.len());
                entries.push(grid.color(rq, gq, bq));
            }
        }

        while entries.len() < PALETTE_LEN_8BIT {
            entries.push(Rgb::BLACK);
        }

        Self {
            entries,
            by_bucket,
            grid,
            search_neighbors: true,
        }
    }

    /// Build the 16-color table for 4-bit output.
    ///
    /// Takes the 16 most frequent cells of the 4x4x4 grid over the opaque
    /// pixels (first-encountered wins ties). A deficit is filled from a
    /// fixed index-derived enumeration of the grid, so the table always
    /// holds exactly 16 entries even for images with few distinct colors.
    pub fn build_4bit(pixels: &[u8]) -> Self {
        let grid = BucketGrid::FOUR_BIT;
        let mut entries = Vec::with_capacity(PALETTE_LEN_4BIT);
        let mut by_bucket = HashMap::new();

        for key in top_buckets(pixels, grid, &HashMap::new(), PALETTE_LEN_4BIT) {
            let (rq, gq, bq) = BucketGrid::split(key);
            by_bucket.insert(key, entries.len());
            entries.push(grid.color(rq, gq, bq));
        }

        // Synthesized ramp over the same grid; not registered in the
        // bucket map, matching slots that no source pixel selected.
        while entries.len() < PALETTE_LEN_4BIT {
            let i = entries.len() as u32;
            entries.push(grid.color(i % 4, (i / 4) % 4, (i / 16) % 4));
        }

        Self {
            entries,
            by_bucket,
            grid,
            search_neighbors: false,
        }
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no entries (never the case for built tables).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The ordered color table, as it will appear on disk.
    pub fn entries(&self) -> &[Rgb] {
        &self.entries
    }

    /// Palette index of the entry nearest to the given RGB value.
    ///
    /// An exact bucket hit resolves in O(1). On a miss the 256-entry table
    /// probes the neighboring grid cells (Chebyshev distance 1, clamped to
    /// the grid bounds) and picks the candidate minimizing squared RGB
    /// distance; if none of those cells is populated either, the whole
    /// table is scanned, first minimum winning. The 16-entry table skips
    /// the neighbor probe and scans directly.
    pub fn nearest_index(&self, r: u8, g: u8, b: u8) -> u8 {
        let (rq, gq, bq) = self.grid.bucket(r, g, b);
        if let Some(&idx) = self.by_bucket.get(&BucketGrid::key(rq, gq, bq)) {
            return idx as u8;
        }

        if self.search_neighbors {
            let mut best_dist = u32::MAX;
            let mut best_idx = None;
            for dr in -1i32..=1 {
                for dg in -1i32..=1 {
                    for db in -1i32..=1 {
                        let nr = (rq as i32 + dr).clamp(0, self.grid.r_levels as i32 - 1) as u32;
                        let ng = (gq as i32 + dg).clamp(0, self.grid.g_levels as i32 - 1) as u32;
                        let nb = (bq as i32 + db).clamp(0, self.grid.b_levels as i32 - 1) as u32;
                        if let Some(&idx) = self.by_bucket.get(&BucketGrid::key(nr, ng, nb)) {
                            let dist = self.entries[idx].distance_squared(r, g, b);
                            if dist < best_dist {
                                best_dist = dist;
                                best_idx = Some(idx);
                            }
                        }
                    }
                }
            }
            if let Some(idx) = best_idx {
                return idx as u8;
            }
        }

        let mut best_dist = u32::MAX;
        let mut best_idx = 0usize;
        for (idx, entry) in self.entries.iter().enumerate() {
            let dist = entry.distance_squared(r, g, b);
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx;
            }
        }
        best_idx as u8
    }
}

/// Count bucket frequencies over the opaque pixels and return up to `limit`
/// bucket keys, most frequent first.
///
/// Buckets already present in `anchored` are not counted. The sort is
/// stable over first-encountered order, which is what makes palette
/// construction deterministic for identical input.
fn top_buckets(
    pixels: &[u8],
    grid: BucketGrid,
    anchored: &HashMap<u32, usize>,
    limit: usize,
) -> Vec<u32> {
    let mut counts: HashMap<u32, u32> = HashMap::new();
    let mut order: Vec<u32> = Vec::new();

    for px in pixels.chunks_exact(4) {
        if px[3] < OPAQUE_ALPHA_THRESHOLD {
            continue;
        }
        let (rq, gq, bq) = grid.bucket(px[0], px[1], px[2]);
        let key = BucketGrid::key(rq, gq, bq);
        if anchored.contains_key(&key) {
            continue;
        }
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(limit);
    order
}

/// Map every pixel of an RGBA buffer to its palette index.
///
/// Transparent-ish pixels (alpha below the opacity threshold) always take
/// index 0.
pub fn pixel_indices(pixels: &[u8], palette: &IndexedPalette) -> Vec<u8> {
    pixels
        .chunks_exact(4)
        .map(|px| {
            if px[3] < OPAQUE_ALPHA_THRESHOLD {
                0
            } else {
                palette.nearest_index(px[0], px[1], px[2])
            }
        })
        .collect()
}


// ============================================================================
// Property-Based Tests
// ============================================================================
