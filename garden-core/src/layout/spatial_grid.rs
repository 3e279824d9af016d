// Spatial hash grid for neighbour lookup.
//
// Pairwise repulsion only acts inside a minimum distance, so a node only has
// to be compared against points in its own cell and the eight around it when
// the cell size is at least that distance.

use std::collections::HashMap;

use super::PointF;

/// A spatial hash of point indices.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    /// Size of each cell in the grid.
    cell_size: f64,
    /// Map from cell coordinates to the indices of points in that cell,
    /// in insertion order.
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    /// Create a grid. Cell size should be the largest interaction distance.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 1.0 { cell_size } else { 1.0 };
        Self { cell_size, cells: HashMap::new() }
    }

    /// Build a grid over `points`, indexed by their position in the slice.
    pub fn from_points(points: &[PointF], cell_size: f64) -> Self {
        let mut grid = Self::new(cell_size);
        for (i, p) in points.iter().enumerate() {
            grid.insert(i, p);
        }
        grid
    }

    fn cell_of(&self, p: &PointF) -> (i64, i64) {
        // Float to int casts saturate, so a stray non-finite coordinate lands
        // in some cell instead of panicking.
        ((p.x / self.cell_size).floor() as i64, (p.y / self.cell_size).floor() as i64)
    }

    pub fn insert(&mut self, index: usize, p: &PointF) {
        let cell = self.cell_of(p);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Indices of every point in the 3x3 block of cells around `p`.
    /// May include points farther than `cell_size`; caller does the exact check.
    /// Order is deterministic: cells row by row, then insertion order.
    pub fn query(&self, p: &PointF) -> Vec<usize> {
        let (cx, cy) = self.cell_of(p);
        let mut result = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(indices) = self.cells.get(&(cx.saturating_add(dx), cy.saturating_add(dy))) {
                    result.extend_from_slice(indices);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_query() {
        let points = vec![
            PointF { x: 10.0, y: 10.0 },
            PointF { x: 95.0, y: 20.0 },
            PointF { x: 400.0, y: 400.0 },
        ];
        let grid = SpatialGrid::from_points(&points, 90.0);

        let nearby = grid.query(&points[0]);
        assert!(nearby.contains(&0));
        assert!(nearby.contains(&1));
        assert!(!nearby.contains(&2));
    }

    #[test]
    fn test_query_finds_every_point_within_cell_size() {
        // Brute force against the grid for a scatter of points.
        let points: Vec<PointF> = (0..60)
            .map(|i| {
                let t = i as f64;
                PointF { x: (t * 37.0) % 500.0, y: (t * 53.0) % 300.0 }
            })
            .collect();
        let grid = SpatialGrid::from_points(&points, 60.0);

        for (i, p) in points.iter().enumerate() {
            let found = grid.query(p);
            for (j, q) in points.iter().enumerate() {
                if p.distance(q) < 60.0 {
                    assert!(found.contains(&j), "point {} missing neighbour {}", i, j);
                }
            }
        }
    }

    #[test]
    fn test_non_finite_point_does_not_panic() {
        let mut grid = SpatialGrid::new(50.0);
        grid.insert(0, &PointF { x: f64::NAN, y: f64::INFINITY });
        let _ = grid.query(&PointF { x: f64::NAN, y: 0.0 });
    }
}
