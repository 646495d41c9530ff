//! Line-of-sight confidence between two cells.
//!
//! Effective sight starts from the observer's base sight for the Chebyshev
//! distance and is reduced by the worst sight obstruction on the cells
//! strictly between observer and target. The target's own obstruction does
//! not count.

use rescue_types::Cell;
use rescue_world::Grid;

use crate::config::{Attenuation, SightProfile};

/// Confidence (0..=100) that an observer at `observer` sees `target`.
pub fn effective_sight(observer: Cell, target: Cell, profile: &SightProfile, grid: &Grid) -> f64 {
    let steps = observer.chebyshev(target);
    if steps == 0 {
        return 100.0;
    }
    let base = f64::from(profile.base_at(steps));
    let obstruction = f64::from(
        line_between(observer, target)
            .map(|cell| grid.sight_obstruction(cell))
            .max()
            .unwrap_or(0),
    );
    let sight = match profile.attenuation {
        Attenuation::Scale => base * (1.0 - obstruction / 100.0),
        Attenuation::Subtract => base - obstruction,
    };
    sight.clamp(0.0, 100.0)
}

/// Whether `target` is within sight range of `observer` and seen with
/// confidence strictly above `threshold`.
pub fn can_see(
    observer: Cell,
    target: Cell,
    profile: &SightProfile,
    threshold: f64,
    grid: &Grid,
) -> bool {
    observer.chebyshev(target) <= profile.sight_distance
        && effective_sight(observer, target, profile, grid) > threshold
}

/// Cells strictly between `from` and `to`, one per Chebyshev step, each
/// coordinate interpolated and rounded half away from zero.
pub fn line_between(from: Cell, to: Cell) -> impl Iterator<Item = Cell> {
    let steps = i64::from(from.chebyshev(to));
    let dx = i64::from(to.x).saturating_sub(i64::from(from.x));
    let dy = i64::from(to.y).saturating_sub(i64::from(from.y));
    (1..steps).map(move |i| {
        let ox = round_div(i.saturating_mul(dx), steps);
        let oy = round_div(i.saturating_mul(dy), steps);
        from.offset(
            i32::try_from(ox).unwrap_or_default(),
            i32::try_from(oy).unwrap_or_default(),
        )
    })
}

/// `numerator / denominator` rounded half away from zero (`denominator > 0`).
fn round_div(numerator: i64, denominator: i64) -> i64 {
    let twice = numerator.saturating_mul(2);
    let biased = if numerator >= 0 {
        twice.saturating_add(denominator)
    } else {
        twice.saturating_sub(denominator)
    };
    biased
        .checked_div(denominator.saturating_mul(2))
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rescue_types::HazardLevel;

    use super::*;

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_div(1, 2), 1);
        assert_eq!(round_div(-1, 2), -1);
        assert_eq!(round_div(1, 3), 0);
        assert_eq!(round_div(2, 3), 1);
        assert_eq!(round_div(-4, 3), -1);
    }

    #[test]
    fn line_skips_endpoints() {
        let cells: Vec<Cell> = line_between(Cell::new(0, 0), Cell::new(3, 0)).collect();
        assert_eq!(cells, vec![Cell::new(1, 0), Cell::new(2, 0)]);
        assert_eq!(line_between(Cell::new(0, 0), Cell::new(1, 1)).count(), 0);
    }

    #[test]
    fn line_interpolates_shallow_diagonals() {
        let cells: Vec<Cell> = line_between(Cell::new(0, 0), Cell::new(4, 2)).collect();
        assert_eq!(cells, vec![Cell::new(1, 1), Cell::new(2, 1), Cell::new(3, 2)]);
    }

    #[test]
    fn clear_line_uses_base_sight() {
        let grid = Grid::new(10, 10).unwrap();
        let profile = SightProfile::rescuer();
        let sight = effective_sight(Cell::new(1, 1), Cell::new(4, 2), &profile, &grid);
        assert!((sight - 60.0).abs() < 1e-9);
        let own = effective_sight(Cell::new(1, 1), Cell::new(1, 1), &profile, &grid);
        assert!((own - 100.0).abs() < 1e-9);
    }

    #[test]
    fn obstruction_scales_or_subtracts() {
        let mut grid = Grid::new(10, 10).unwrap();
        // Low hazard at (2, 1): obstruction 20 on the line (1,1) -> (3,1).
        grid.set_hazard(Cell::new(2, 1), HazardLevel::Low).unwrap();
        let rescuer = SightProfile::rescuer();
        let victim = SightProfile::victim();
        let scaled = effective_sight(Cell::new(1, 1), Cell::new(3, 1), &rescuer, &grid);
        let subtracted = effective_sight(Cell::new(1, 1), Cell::new(3, 1), &victim, &grid);
        assert!((scaled - 64.0).abs() < 1e-9);
        assert!((subtracted - 50.0).abs() < 1e-9);
    }

    #[test]
    fn target_obstruction_is_ignored() {
        let mut grid = Grid::new(10, 10).unwrap();
        grid.set_hazard(Cell::new(3, 1), HazardLevel::Low).unwrap();
        let sight = effective_sight(Cell::new(1, 1), Cell::new(3, 1), &SightProfile::rescuer(), &grid);
        assert!((sight - 80.0).abs() < 1e-9);
    }

    #[test]
    fn can_see_respects_range_and_threshold() {
        let mut grid = Grid::new(12, 12).unwrap();
        let profile = SightProfile::rescuer();
        assert!(can_see(Cell::new(1, 1), Cell::new(6, 1), &profile, 35.0, &grid));
        assert!(!can_see(Cell::new(1, 1), Cell::new(7, 1), &profile, 35.0, &grid));
        grid.set_hazard(Cell::new(3, 1), HazardLevel::Medium).unwrap();
        // 40 x (1 - 0.5) = 20
        assert!(!can_see(Cell::new(1, 1), Cell::new(6, 1), &profile, 35.0, &grid));
    }

    #[test]
    fn heavy_smoke_hides_targets() {
        let mut grid = Grid::new(10, 10).unwrap();
        grid.set_hazard(Cell::new(3, 3), HazardLevel::High).unwrap();
        let sight = effective_sight(Cell::new(1, 3), Cell::new(5, 3), &SightProfile::victim(), &grid);
        assert!(sight.abs() < 1e-9);
    }
}
