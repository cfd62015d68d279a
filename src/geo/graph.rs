//! Graph algorithms, primarially for use by AI.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;

use crate::geo::Dir;
use crate::geo::Point;
use crate::map::TileOracle;

/// Tuning knobs for a single path search.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct PathOptions {
  /// Whether diagonal steps are allowed. Monsters walk orthogonally.
  pub diagonal: bool,
  /// The maximum number of nodes expanded before the search gives up.
  pub max_nodes: usize,
}

impl Default for PathOptions {
  fn default() -> Self {
    Self {
      diagonal: false,
      max_nodes: 4096,
    }
  }
}

/// A grid pathfinding service.
///
/// Implementations return the ordered list of steps from `start` to `goal`,
/// excluding `start` and including `goal`. An empty list means "no path".
/// `goal` is always considered enterable, since it is usually occupied by
/// whatever is being chased.
pub trait Pathfinder {
  /// Finds a path across `map`.
  fn find_path(
    &self,
    map: &dyn TileOracle,
    start: Point,
    goal: Point,
    opts: PathOptions,
  ) -> Vec<Point>;
}

/// The default [`Pathfinder`], backed by [`a_star()`] with Manhattan costs.
#[derive(Copy, Clone, Default, Debug)]
pub struct AStar;

impl Pathfinder for AStar {
  fn find_path(
    &self,
    map: &dyn TileOracle,
    start: Point,
    goal: Point,
    opts: PathOptions,
  ) -> Vec<Point> {
    let can_walk = |p| map.is_passable(p);
    let found = if opts.diagonal {
      a_star(
        start,
        goal,
        &Dir::all(),
        opts.max_nodes,
        can_walk,
        move |n| (n - goal).chebyshev() as f64,
      )
    } else {
      a_star(
        start,
        goal,
        &Dir::orthogonal(),
        opts.max_nodes,
        can_walk,
        move |n| (n - goal).manhattan() as f64,
      )
    };

    let mut path = found.unwrap_or_default();
    // `a_star()` hands the path back goal-first and including `start`.
    path.pop();
    path.reverse();
    path
  }
}

/// Implements the A* pathfinding algorithm with unit step costs.
///
/// This function will attempt to find a path from `start` to `goal`; if no path
/// could be found within `max_nodes` expansions, `None` is returned.
///
/// The provided functions serve the following purposes:
/// - `can_walk` returns true if a particular point is accessible for the
///   purposes of this search. `goal` is never tested.
/// - `heuristc` is the A* heuristic function, which roughly describes the cost
///   to reach the goal from a particular node. It must not overestimate for
///   the returned path to be shortest.
///
/// The path returned is in *reverse order*; that is, the goal will be the first
/// element of the path and `start` the last.
pub fn a_star(
  start: Point,
  goal: Point,
  dirs: &[Dir],
  max_nodes: usize,
  mut can_walk: impl FnMut(Point) -> bool,
  mut heuristic: impl FnMut(Point) -> f64,
) -> Option<Vec<Point>> {
  #[derive(Copy, Clone)]
  struct Node(f64, u64, Point);
  impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
      self.cmp(other) == Ordering::Equal
    }
  }
  impl Eq for Node {}
  impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
      Some(self.cmp(other))
    }
  }
  impl Ord for Node {
    // Min-heap on score; among equal scores the earliest pushed node wins,
    // which keeps searches deterministic.
    fn cmp(&self, other: &Self) -> Ordering {
      other
        .0
        .partial_cmp(&self.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| other.1.cmp(&self.1))
    }
  }

  let mut open_nodes = BinaryHeap::<Node>::new();
  let mut came_from = HashMap::new();
  let mut g_scores = HashMap::new();
  let mut pushed = 0u64;
  let mut expanded = 0usize;

  g_scores.insert(start, 0.0);
  open_nodes.push(Node(heuristic(start), pushed, start));

  while let Some(Node(_, _, mut current)) = open_nodes.pop() {
    if current == goal {
      // We're done, let's build a path back from the goal.
      let mut path = vec![current];
      while let Some(&next) = came_from.get(&current) {
        current = next;
        path.push(current);
      }
      return Some(path);
    }

    expanded += 1;
    if expanded > max_nodes {
      return None;
    }

    let current_g = g_scores.get(&current).cloned().unwrap_or(f64::INFINITY);
    for &d in dirs {
      let neighbor = current + d.to_point::<i64>();
      if neighbor != goal && !can_walk(neighbor) {
        continue;
      }

      let tentative_g = current_g + 1.0;
      if tentative_g < g_scores.get(&neighbor).cloned().unwrap_or(f64::INFINITY)
      {
        came_from.insert(neighbor, current);
        g_scores.insert(neighbor, tentative_g);
        pushed += 1;
        open_nodes.push(Node(tentative_g + heuristic(neighbor), pushed, neighbor));
      }
    }
  }

  None
}
