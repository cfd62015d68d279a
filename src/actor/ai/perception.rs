//! The perception toolkit shared by every brain.

use crate::actor::Monster;
use crate::geo::Point;
use crate::world::WorldCoordinator;

/// Returns whether `to` is within Manhattan distance `radius` of `from`.
pub fn within_radius(from: Point, to: Point, radius: i64) -> bool {
  (to - from).manhattan() <= radius
}

/// Returns whether `from` has an unobstructed view of `to`.
///
/// This defers to [`WorldCoordinator::has_los()`], which is permissive (always
/// `true`) for worlds that cannot answer the question.
pub fn has_line_of_sight<W>(world: &W, from: Point, to: Point) -> bool
where
  W: WorldCoordinator + ?Sized,
{
  world.has_los(from, to)
}

/// Returns whether `a` and `b` are neighbours in any of the eight directions.
pub fn is_adjacent(a: Point, b: Point) -> bool {
  (b - a).chebyshev() == 1
}

/// Returns whether `a` and `b` share an edge.
pub fn is_orthogonally_adjacent(a: Point, b: Point) -> bool {
  (b - a).manhattan() == 1
}

/// Returns whether `a` and `b` share only a corner.
pub fn is_diagonally_adjacent(a: Point, b: Point) -> bool {
  let d = b - a;
  d.x().abs() == 1 && d.y().abs() == 1
}

/// Returns whether `monster` can currently perceive something at `target`:
/// it must be within the perception radius and in line of sight.
pub fn can_perceive<W>(monster: &Monster, target: Point, world: &W) -> bool
where
  W: WorldCoordinator + ?Sized,
{
  let pos = monster.body.pos;
  within_radius(pos, target, monster.ai.perception_radius)
    && has_line_of_sight(world, pos, target)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn adjacency() {
    let o = Point::new(5, 5);
    assert!(is_adjacent(o, Point::new(6, 6)));
    assert!(is_adjacent(o, Point::new(5, 4)));
    assert!(!is_adjacent(o, o));
    assert!(!is_adjacent(o, Point::new(7, 5)));

    assert!(is_orthogonally_adjacent(o, Point::new(4, 5)));
    assert!(!is_orthogonally_adjacent(o, Point::new(4, 4)));
    assert!(is_diagonally_adjacent(o, Point::new(4, 4)));
    assert!(!is_diagonally_adjacent(o, Point::new(4, 5)));
  }

  #[test]
  fn radius_is_manhattan() {
    let o = Point::new(0, 0);
    assert!(within_radius(o, Point::new(3, 3), 6));
    assert!(!within_radius(o, Point::new(4, 3), 6));
  }
}
