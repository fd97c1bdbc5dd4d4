//! Grid world: one orc slot per cell plus static terrain layers.
//!
//! Humidity, fertility and biome class are generated once per environment
//! from smoothed noise and never mutated afterwards.

use crate::orc::{Biome, OrcId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;

/// 4-connected neighbor offsets, in the fixed order all queries use
const NEIGHBOR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Contract violations raised by [`Environment::place`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("position ({0}, {1}) is out of bounds")]
    OutOfBounds(usize, usize),
    #[error("cell ({0}, {1}) is already occupied")]
    Occupied(usize, usize),
}

/// The grid world. Cells store orc ids only; the population map owns state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Environment {
    width: usize,
    height: usize,
    grid: Vec<Vec<Option<OrcId>>>,
    humidity: Vec<Vec<f32>>,
    fertility: Vec<Vec<f32>>,
    biome: Vec<Vec<Biome>>,
}

impl Environment {
    /// Generate a fresh environment from the shared simulation stream.
    ///
    /// Layer draw order is part of the determinism contract: humidity,
    /// then fertility, then the biome noise layer.
    pub fn generate<R: Rng>(width: usize, height: usize, rng: &mut R) -> Self {
        let humidity = generate_layer(rng, width, height, 0.55, 0.22, -0.2, 4);
        let fertility = generate_layer(rng, width, height, 0.5, 0.24, 0.16, 4);
        let biome = generate_biomes(rng, width, height);

        Self {
            width,
            height,
            grid: vec![vec![None; width]; height],
            humidity,
            fertility,
            biome,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Id of the orc occupying a cell, if any
    #[inline]
    pub fn orc_at(&self, x: usize, y: usize) -> Option<OrcId> {
        if self.in_bounds(x, y) {
            self.grid[y][x]
        } else {
            None
        }
    }

    /// Put an orc into an empty cell. Fails loudly: callers are expected to
    /// have validated emptiness, so a rejection means a broken invariant
    /// upstream.
    pub fn place(&mut self, id: OrcId, x: usize, y: usize) -> Result<(), PlacementError> {
        if !self.in_bounds(x, y) {
            return Err(PlacementError::OutOfBounds(x, y));
        }
        if self.grid[y][x].is_some() {
            return Err(PlacementError::Occupied(x, y));
        }
        self.grid[y][x] = Some(id);
        Ok(())
    }

    /// Move an orc between cells. A stale destination (occupied or out of
    /// bounds) is a failed move attempt, not a bug: nothing happens and
    /// `false` is returned.
    pub fn relocate(&mut self, id: OrcId, from: (usize, usize), to: (usize, usize)) -> bool {
        if !self.in_bounds(to.0, to.1) || self.grid[to.1][to.0].is_some() {
            return false;
        }
        if self.in_bounds(from.0, from.1) {
            self.grid[from.1][from.0] = None;
        }
        self.grid[to.1][to.0] = Some(id);
        true
    }

    /// Clear a cell, but only if it still holds this exact orc
    pub fn clear(&mut self, id: OrcId, x: usize, y: usize) {
        if self.in_bounds(x, y) && self.grid[y][x] == Some(id) {
            self.grid[y][x] = None;
        }
    }

    /// In-bounds 4-connected neighbors, in fixed order
    pub fn neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(4);
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx >= 0 && ny >= 0 && (nx as usize) < self.width && (ny as usize) < self.height {
                out.push((nx as usize, ny as usize));
            }
        }
        out
    }

    /// Neighbors with no occupant
    pub fn empty_neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        self.neighbors(x, y)
            .into_iter()
            .filter(|&(nx, ny)| self.grid[ny][nx].is_none())
            .collect()
    }

    /// Neighbors holding an orc
    pub fn occupied_neighbors(&self, x: usize, y: usize) -> Vec<(usize, usize)> {
        self.neighbors(x, y)
            .into_iter()
            .filter(|&(nx, ny)| self.grid[ny][nx].is_some())
            .collect()
    }

    #[inline]
    pub fn humidity_at(&self, x: usize, y: usize) -> f32 {
        self.humidity[y][x]
    }

    #[inline]
    pub fn fertility_at(&self, x: usize, y: usize) -> f32 {
        self.fertility[y][x]
    }

    #[inline]
    pub fn biome_at(&self, x: usize, y: usize) -> Biome {
        self.biome[y][x]
    }
}

/// Noisy base layer plus a vertical gradient, smoothed into organic patches
/// and clamped to [0, 1].
fn generate_layer<R: Rng>(
    rng: &mut R,
    width: usize,
    height: usize,
    bias: f32,
    variation: f32,
    vertical_pull: f32,
    smooth_passes: usize,
) -> Vec<Vec<f32>> {
    let denom = (height - 1).max(1) as f32;
    let mut layer: Vec<Vec<f32>> = Vec::with_capacity(height);
    for y in 0..height {
        let gradient = y as f32 / denom;
        let base = bias + vertical_pull * (gradient - 0.5);
        let mut row = Vec::with_capacity(width);
        for _x in 0..width {
            row.push(base + rng.gen_range(-variation..variation));
        }
        layer.push(row);
    }
    for _ in 0..smooth_passes {
        layer = smooth(&layer, width, height);
    }
    for row in &mut layer {
        for value in row {
            *value = value.clamp(0.0, 1.0);
        }
    }
    layer
}

/// One smoothing pass: each cell keeps half its weight, the other half is
/// split evenly across whichever of its 8 neighbors are in bounds.
fn smooth(layer: &[Vec<f32>], width: usize, height: usize) -> Vec<Vec<f32>> {
    let mut smoothed = Vec::with_capacity(height);
    for y in 0..height {
        let mut row = Vec::with_capacity(width);
        for x in 0..width {
            let mut count = 0usize;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height {
                        count += 1;
                    }
                }
            }
            if count == 0 {
                row.push(layer[y][x]);
                continue;
            }
            let weight_per_neighbor = 0.5 / count as f32;
            let mut acc = layer[y][x] * 0.5;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height {
                        acc += layer[ny as usize][nx as usize] * weight_per_neighbor;
                    }
                }
            }
            row.push(acc);
        }
        smoothed.push(row);
    }
    smoothed
}

/// Partition an independent noise layer into three roughly equal-area biome
/// classes using the tertile cutoffs of the sorted values.
fn generate_biomes<R: Rng>(rng: &mut R, width: usize, height: usize) -> Vec<Vec<Biome>> {
    let noise = generate_layer(rng, width, height, 0.5, 0.35, 0.0, 3);

    let mut sorted: Vec<f32> = noise.iter().flatten().copied().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let third = sorted.len() / 3;
    let t1 = sorted[third];
    let t2 = sorted[2 * third];

    noise
        .iter()
        .map(|row| {
            row.iter()
                .map(|&value| {
                    if value < t1 {
                        Biome::ALL[0]
                    } else if value < t2 {
                        Biome::ALL[1]
                    } else {
                        Biome::ALL[2]
                    }
                })
                .collect()
        })
        .collect()
}
