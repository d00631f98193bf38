//! Deterministic procedural base terrain.
//!
//! The generator is intentionally plain: a seeded [`StdRng`] walks the
//! grid row-major and draws each tile from a fixed weight table, with a
//! smoothing pass that pulls isolated unwalkable tiles back to grass so
//! zones never generate with unreachable pockets. The same `(bounds,
//! seed)` pair always yields the same grid, which is what lets the chunk
//! store persist only diffs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mistvale_types::Bounds;

use crate::terrain::TileKind;

/// Generate the tile array for `bounds` from `seed`, row-major.
pub fn generate_tiles(bounds: Bounds, seed: u64) -> Vec<TileKind> {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = (bounds.width as usize).saturating_mul(bounds.height as usize);

    let mut tiles = Vec::with_capacity(len);
    for _ in 0..len {
        tiles.push(draw_tile(&mut rng));
    }

    smooth(&mut tiles, bounds);
    tiles
}

/// Draw one tile from the weight table: mostly grass, some dirt and
/// stone, occasional sand, rare water and rock.
fn draw_tile(rng: &mut StdRng) -> TileKind {
    match rng.random_range(0..100_u32) {
        0..=64 => TileKind::Grass,
        65..=79 => TileKind::Dirt,
        80..=89 => TileKind::Stone,
        90..=94 => TileKind::Sand,
        95..=97 => TileKind::Water,
        _ => TileKind::Rock,
    }
}

/// Pull unwalkable tiles with no unwalkable orthogonal neighbor back to
/// grass. Keeps blockers as clusters rather than scattered single tiles.
fn smooth(tiles: &mut [TileKind], bounds: Bounds) {
    let width = bounds.width as usize;
    let height = bounds.height as usize;

    let snapshot: Vec<TileKind> = tiles.to_vec();
    let at = |x: usize, y: usize| -> Option<TileKind> {
        y.checked_mul(width)
            .and_then(|row| row.checked_add(x))
            .and_then(|idx| snapshot.get(idx).copied())
    };

    for y in 0..height {
        for x in 0..width {
            let Some(kind) = at(x, y) else { continue };
            if kind.walkable() {
                continue;
            }
            let has_unwalkable_neighbor = [
                x.checked_sub(1).and_then(|nx| at(nx, y)),
                at(x.saturating_add(1), y),
                y.checked_sub(1).and_then(|ny| at(x, ny)),
                at(x, y.saturating_add(1)),
            ]
            .into_iter()
            .flatten()
            .any(|n| !n.walkable());

            if !has_unwalkable_neighbor
                && let Some(idx) = y.checked_mul(width).and_then(|row| row.checked_add(x))
                && let Some(slot) = tiles.get_mut(idx)
            {
                *slot = TileKind::Grass;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_tiles() {
        let bounds = Bounds::new(48, 32);
        assert_eq!(generate_tiles(bounds, 99), generate_tiles(bounds, 99));
    }

    #[test]
    fn different_seed_differs_somewhere() {
        let bounds = Bounds::new(48, 32);
        assert_ne!(generate_tiles(bounds, 1), generate_tiles(bounds, 2));
    }

    #[test]
    fn most_tiles_are_walkable() {
        let bounds = Bounds::new(64, 64);
        let tiles = generate_tiles(bounds, 5);
        let walkable = tiles.iter().filter(|t| t.walkable()).count();
        // The weight table puts ~95% of tiles in walkable kinds before
        // smoothing; smoothing only increases the share.
        assert!(walkable * 10 >= tiles.len() * 9);
    }

    #[test]
    fn no_isolated_blockers_survive_smoothing() {
        let bounds = Bounds::new(32, 32);
        let tiles = generate_tiles(bounds, 11);
        let width = 32_usize;
        let at = |x: i32, y: i32| -> Option<TileKind> {
            if !(0..32).contains(&x) || !(0..32).contains(&y) {
                return None;
            }
            tiles.get((y as usize) * width + (x as usize)).copied()
        };
        for y in 0..32 {
            for x in 0..32 {
                let Some(kind) = at(x, y) else { continue };
                if kind.walkable() {
                    continue;
                }
                let lonely = [at(x - 1, y), at(x + 1, y), at(x, y - 1), at(x, y + 1)]
                    .into_iter()
                    .flatten()
                    .all(TileKind::walkable);
                assert!(!lonely, "isolated blocker at ({x}, {y})");
            }
        }
    }
}
