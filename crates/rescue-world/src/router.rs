//! Route planning over a 4-connected grid.
//!
//! [`route`] is an A* search with unit edge costs and a Manhattan
//! heuristic. The heuristic is consistent on a 4-connected grid, so the
//! first time the goal leaves the open set its route is shortest. Ties on
//! the estimate go to the cell nearest the straight start-goal line, then
//! to insertion order, so routes are reproducible for a given terrain.
//!
//! [`ShortestPathTree`] is a breadth-first flood from one origin. It answers
//! "which target is closest by route" and "what is a shortest route to each
//! of many goals" without one A* run per goal.
//!
//! Both work against any [`Terrain`]: the true grid or a belief map.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

use rescue_types::Cell;
use serde::{Deserialize, Serialize};

use crate::lattice::Lattice;

/// An obstacle layer the router can plan against.
pub trait Terrain {
    /// Shape of the layer.
    fn lattice(&self) -> Lattice;

    /// Whether `cell` holds an obstacle. Only called for on-grid cells.
    fn is_obstacle(&self, cell: Cell) -> bool;
}

/// Whether planning may expand obstacle cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Passability {
    /// Obstacle cells are never expanded.
    #[default]
    AvoidObstacles,
    /// Obstacle cells are expanded like open ground (agent/drone planning).
    /// Movement along such a route still stops at the first obstacle.
    ThroughObstacles,
}

impl Passability {
    /// Map the `passable_despite_obstacle` flag to a mode.
    pub const fn from_flag(passable_despite_obstacle: bool) -> Self {
        if passable_despite_obstacle {
            Self::ThroughObstacles
        } else {
            Self::AvoidObstacles
        }
    }

    /// Whether a route in this mode may enter `cell`.
    pub fn admits<T: Terrain + ?Sized>(self, terrain: &T, cell: Cell) -> bool {
        terrain.lattice().contains(cell)
            && (matches!(self, Self::ThroughObstacles) || !terrain.is_obstacle(cell))
    }
}

// ---------------------------------------------------------------------------
// A*
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    estimate: u32,
    drift: u64,
    sequence: u64,
    cost: u32,
    cell: Cell,
}

/// Plan a shortest 4-connected route from `start` to `goal`.
///
/// The route excludes `start` and includes `goal`. It is empty when
/// `start == goal`, when either end is off the grid, or when the goal is
/// unreachable under `passability`.
pub fn route<T: Terrain + ?Sized>(
    terrain: &T,
    start: Cell,
    goal: Cell,
    passability: Passability,
) -> Vec<Cell> {
    let lattice = terrain.lattice();
    if start == goal || !passability.admits(terrain, goal) {
        return Vec::new();
    }
    let (Some(start_index), Some(goal_index)) = (lattice.index(start), lattice.index(goal)) else {
        return Vec::new();
    };

    let mut best_cost = vec![u32::MAX; lattice.len()];
    let mut came_from: Vec<Option<usize>> = vec![None; lattice.len()];
    let mut open = BinaryHeap::new();
    let mut sequence: u64 = 0;

    if let Some(slot) = best_cost.get_mut(start_index) {
        *slot = 0;
    }
    open.push(Reverse(OpenEntry {
        estimate: start.manhattan(goal),
        drift: 0,
        sequence,
        cost: 0,
        cell: start,
    }));

    while let Some(Reverse(entry)) = open.pop() {
        if entry.cell == goal {
            return reconstruct(lattice, &came_from, start_index, goal_index);
        }
        let Some(index) = lattice.index(entry.cell) else {
            continue;
        };
        // Stale entry: a cheaper path to this cell was queued later.
        if best_cost.get(index).is_some_and(|&known| entry.cost > known) {
            continue;
        }

        let next_cost = entry.cost.saturating_add(1);
        for neighbor in entry.cell.cardinal_neighbors() {
            if !passability.admits(terrain, neighbor) {
                continue;
            }
            let Some(neighbor_index) = lattice.index(neighbor) else {
                continue;
            };
            let Some(known) = best_cost.get_mut(neighbor_index) else {
                continue;
            };
            if next_cost >= *known {
                continue;
            }
            *known = next_cost;
            if let Some(parent) = came_from.get_mut(neighbor_index) {
                *parent = Some(index);
            }
            sequence = sequence.saturating_add(1);
            open.push(Reverse(OpenEntry {
                estimate: next_cost.saturating_add(neighbor.manhattan(goal)),
                drift: drift(start, goal, neighbor),
                sequence,
                cost: next_cost,
                cell: neighbor,
            }));
        }
    }

    Vec::new()
}

/// How far `cell` strays from the straight line between `start` and
/// `goal` (cross product magnitude).
fn drift(start: Cell, goal: Cell, cell: Cell) -> u64 {
    let (gx, gy) = (i64::from(goal.x), i64::from(goal.y));
    let (dx1, dy1) = (i64::from(cell.x).saturating_sub(gx), i64::from(cell.y).saturating_sub(gy));
    let (dx2, dy2) = (i64::from(start.x).saturating_sub(gx), i64::from(start.y).saturating_sub(gy));
    dx1.saturating_mul(dy2)
        .saturating_sub(dx2.saturating_mul(dy1))
        .unsigned_abs()
}

/// Walk parent links back from `goal_index`, excluding the start cell.
fn reconstruct(
    lattice: Lattice,
    came_from: &[Option<usize>],
    start_index: usize,
    goal_index: usize,
) -> Vec<Cell> {
    let mut path = VecDeque::new();
    let mut current = goal_index;
    while current != start_index {
        let Some(cell) = lattice.cell(current) else {
            return Vec::new();
        };
        path.push_front(cell);
        let Some(Some(parent)) = came_from.get(current) else {
            return Vec::new();
        };
        if path.len() > came_from.len() {
            return Vec::new();
        }
        current = *parent;
    }
    path.into()
}

// ---------------------------------------------------------------------------
// Breadth-first shortest-path tree
// ---------------------------------------------------------------------------

/// Shortest routes from one origin to every reachable cell.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    lattice: Lattice,
    origin: Cell,
    parent: Vec<Option<usize>>,
    distance: Vec<Option<u32>>,
    /// Reached cells in visiting order (non-decreasing distance).
    order: Vec<Cell>,
}

impl ShortestPathTree {
    /// Flood outward from `origin`, expanding neighbors in cardinal order.
    pub fn grow<T: Terrain + ?Sized>(terrain: &T, origin: Cell, passability: Passability) -> Self {
        let lattice = terrain.lattice();
        let mut tree = Self {
            lattice,
            origin,
            parent: vec![None; lattice.len()],
            distance: vec![None; lattice.len()],
            order: Vec::new(),
        };
        let Some(origin_index) = lattice.index(origin) else {
            return tree;
        };
        if let Some(slot) = tree.distance.get_mut(origin_index) {
            *slot = Some(0);
        }
        tree.order.push(origin);

        let mut frontier = VecDeque::from([(origin, origin_index, 0_u32)]);
        while let Some((cell, index, distance)) = frontier.pop_front() {
            let next = distance.saturating_add(1);
            for neighbor in cell.cardinal_neighbors() {
                if !passability.admits(terrain, neighbor) {
                    continue;
                }
                let Some(neighbor_index) = lattice.index(neighbor) else {
                    continue;
                };
                let Some(slot) = tree.distance.get_mut(neighbor_index) else {
                    continue;
                };
                if slot.is_some() {
                    continue;
                }
                *slot = Some(next);
                if let Some(parent) = tree.parent.get_mut(neighbor_index) {
                    *parent = Some(index);
                }
                tree.order.push(neighbor);
                frontier.push_back((neighbor, neighbor_index, next));
            }
        }
        tree
    }

    /// The cell the tree was grown from.
    pub const fn origin(&self) -> Cell {
        self.origin
    }

    /// Route length from the origin to `cell`, `None` if unreachable.
    pub fn distance_to(&self, cell: Cell) -> Option<u32> {
        let index = self.lattice.index(cell)?;
        self.distance.get(index).copied().flatten()
    }

    /// A shortest route to `goal` (origin excluded, goal included).
    ///
    /// `Some(vec![])` when `goal` is the origin, `None` if unreachable.
    pub fn route_to(&self, goal: Cell) -> Option<Vec<Cell>> {
        let steps = usize::try_from(self.distance_to(goal)?).ok()?;
        let mut path = VecDeque::with_capacity(steps);
        let mut current = self.lattice.index(goal)?;
        while path.len() < steps {
            path.push_front(self.lattice.cell(current)?);
            current = self.parent.get(current).copied().flatten()?;
        }
        Some(path.into())
    }

    /// Reached cells, nearest first.
    pub fn reached(&self) -> impl Iterator<Item = Cell> + '_ {
        self.order.iter().copied()
    }
}

/// Route to the nearest cell satisfying `is_target`, by route length.
///
/// Equal-length candidates resolve to whichever the flood reaches first.
/// Returns `Some(vec![])` when `start` itself qualifies.
pub fn nearest_route<T, F>(
    terrain: &T,
    start: Cell,
    passability: Passability,
    is_target: F,
) -> Option<Vec<Cell>>
where
    T: Terrain + ?Sized,
    F: Fn(Cell) -> bool,
{
    let tree = ShortestPathTree::grow(terrain, start, passability);
    let target = tree.reached().find(|cell| is_target(*cell))?;
    tree.route_to(target)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use std::collections::BTreeSet;

    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    /// Minimal terrain for exercising the router in isolation.
    struct Walls {
        lattice: Lattice,
        walls: BTreeSet<Cell>,
    }

    impl Walls {
        fn open(width: u32, height: u32) -> Self {
            Self {
                lattice: Lattice::new(width, height).unwrap(),
                walls: BTreeSet::new(),
            }
        }

        fn with(mut self, cells: &[(i32, i32)]) -> Self {
            self.walls.extend(cells.iter().map(|&(x, y)| Cell::new(x, y)));
            self
        }
    }

    impl Terrain for Walls {
        fn lattice(&self) -> Lattice {
            self.lattice
        }

        fn is_obstacle(&self, cell: Cell) -> bool {
            self.walls.contains(&cell)
        }
    }

    fn assert_connected(start: Cell, path: &[Cell]) {
        let mut previous = start;
        for &cell in path {
            assert_eq!(previous.manhattan(cell), 1, "{previous} -> {cell} is not a step");
            previous = cell;
        }
    }

    #[test]
    fn straight_route_excludes_start_includes_goal() {
        let terrain = Walls::open(5, 1);
        let path = route(&terrain, Cell::new(0, 0), Cell::new(3, 0), Passability::AvoidObstacles);
        assert_eq!(path, vec![Cell::new(1, 0), Cell::new(2, 0), Cell::new(3, 0)]);
    }

    #[test]
    fn same_start_and_goal_is_empty() {
        let terrain = Walls::open(3, 3);
        let c = Cell::new(1, 1);
        assert!(route(&terrain, c, c, Passability::AvoidObstacles).is_empty());
    }

    #[test]
    fn detours_around_a_wall() {
        // Vertical wall at x = 2 with a gap at y = 4.
        let terrain = Walls::open(5, 5).with(&[(2, 0), (2, 1), (2, 2), (2, 3)]);
        let start = Cell::new(0, 0);
        let goal = Cell::new(4, 0);
        let path = route(&terrain, start, goal, Passability::AvoidObstacles);
        assert_eq!(path.len(), 12);
        assert!(path.iter().all(|c| !terrain.is_obstacle(*c)));
        assert_connected(start, &path);
    }

    #[test]
    fn walled_in_goal_is_unreachable() {
        let terrain = Walls::open(5, 5).with(&[(3, 4), (4, 3), (3, 3)]);
        let path = route(&terrain, Cell::new(0, 0), Cell::new(4, 4), Passability::AvoidObstacles);
        assert!(path.is_empty());
    }

    #[test]
    fn through_mode_expands_obstacles() {
        let terrain = Walls::open(5, 5).with(&[(3, 4), (4, 3), (3, 3)]);
        let path = route(&terrain, Cell::new(0, 0), Cell::new(4, 4), Passability::ThroughObstacles);
        assert_eq!(path.len(), 8);
        assert_eq!(path.last(), Some(&Cell::new(4, 4)));
    }

    #[test]
    fn obstacle_goal_is_rejected_when_avoiding() {
        let terrain = Walls::open(3, 3).with(&[(2, 2)]);
        assert!(
            route(&terrain, Cell::new(0, 0), Cell::new(2, 2), Passability::AvoidObstacles)
                .is_empty()
        );
    }

    #[test]
    fn off_grid_ends_are_rejected() {
        let terrain = Walls::open(3, 3);
        let inside = Cell::new(1, 1);
        let outside = Cell::new(5, 5);
        assert!(route(&terrain, inside, outside, Passability::ThroughObstacles).is_empty());
        assert!(route(&terrain, outside, inside, Passability::ThroughObstacles).is_empty());
    }

    #[test]
    fn routes_are_reproducible() {
        let terrain = Walls::open(8, 8).with(&[(3, 3), (4, 4)]);
        let a = route(&terrain, Cell::new(0, 0), Cell::new(7, 7), Passability::AvoidObstacles);
        let b = route(&terrain, Cell::new(0, 0), Cell::new(7, 7), Passability::AvoidObstacles);
        assert_eq!(a, b);
    }

    #[test]
    fn equal_length_routes_hug_the_straight_line() {
        let terrain = Walls::open(5, 5);
        let path = route(&terrain, Cell::new(0, 0), Cell::new(2, 2), Passability::AvoidObstacles);
        assert_eq!(
            path,
            vec![Cell::new(1, 0), Cell::new(1, 1), Cell::new(2, 1), Cell::new(2, 2)]
        );
    }

    #[test]
    fn astar_matches_flood_distance_on_random_grids() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..40 {
            let mut terrain = Walls::open(12, 9);
            for _ in 0..30 {
                let cell = Cell::new(rng.random_range(0..12), rng.random_range(0..9));
                terrain.walls.insert(cell);
            }
            let start = Cell::new(0, 0);
            terrain.walls.remove(&start);
            let tree = ShortestPathTree::grow(&terrain, start, Passability::AvoidObstacles);
            for goal in terrain.lattice.cells() {
                let path = route(&terrain, start, goal, Passability::AvoidObstacles);
                match tree.distance_to(goal) {
                    Some(0) => assert!(path.is_empty()),
                    Some(d) if !terrain.is_obstacle(goal) => {
                        assert_eq!(path.len(), d as usize);
                        assert!(path.iter().all(|c| !terrain.is_obstacle(*c)));
                        assert_connected(start, &path);
                    }
                    _ => assert!(path.is_empty()),
                }
            }
        }
    }

    #[test]
    fn tree_routes_match_distances() {
        let terrain = Walls::open(6, 6).with(&[(1, 0), (1, 1), (1, 2)]);
        let origin = Cell::new(0, 0);
        let tree = ShortestPathTree::grow(&terrain, origin, Passability::AvoidObstacles);
        assert_eq!(tree.origin(), origin);
        for cell in tree.reached() {
            let path = tree.route_to(cell).unwrap();
            assert_eq!(Some(path.len() as u32), tree.distance_to(cell));
            assert_connected(origin, &path);
        }
        assert_eq!(tree.route_to(origin), Some(Vec::new()));
        assert_eq!(tree.distance_to(Cell::new(1, 1)), None);
    }

    #[test]
    fn reached_cells_are_nearest_first() {
        let terrain = Walls::open(7, 7);
        let tree = ShortestPathTree::grow(&terrain, Cell::new(3, 3), Passability::AvoidObstacles);
        let distances: Vec<u32> = tree.reached().map(|c| tree.distance_to(c).unwrap()).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(distances.len(), 49);
    }

    #[test]
    fn nearest_route_finds_closest_target() {
        let terrain = Walls::open(10, 1);
        let path = nearest_route(&terrain, Cell::new(2, 0), Passability::AvoidObstacles, |c| {
            c.x == 0 || c.x == 9
        })
        .unwrap();
        assert_eq!(path, vec![Cell::new(1, 0), Cell::new(0, 0)]);
    }

    #[test]
    fn nearest_route_on_target_is_empty() {
        let terrain = Walls::open(3, 3);
        let path =
            nearest_route(&terrain, Cell::new(0, 0), Passability::AvoidObstacles, |c| c.x == 0);
        assert_eq!(path, Some(Vec::new()));
    }

    #[test]
    fn nearest_route_none_when_unreachable() {
        let terrain = Walls::open(3, 1).with(&[(1, 0)]);
        let path =
            nearest_route(&terrain, Cell::new(0, 0), Passability::AvoidObstacles, |c| c.x == 2);
        assert!(path.is_none());
    }
}
