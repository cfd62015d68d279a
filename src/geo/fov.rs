//! Field-of-view algorithms.

use crate::geo::Point;

/// Octant transforms, as `[xx, xy, yx, yy]` multipliers.
///
/// The plane (with respect to the origin) is broken up into eight octants.
/// The recursive scan operates on octant coordinates `(dx, dy)` with
/// `dy = -row` and `-row <= dx <= 0`; these multipliers map such a coordinate
/// back onto the map:
///
/// ```text
/// \ 2|1 /
///  \ | /
/// 3 \|/ 0
/// ---o---   +-> x
/// 4 /|\ 7   |
///  / | \    v y
/// / 5|6 \
/// ```
const OCTANTS: [[i64; 4]; 8] = [
  [1, 0, 0, -1],
  [0, 1, -1, 0],
  [0, -1, -1, 0],
  [-1, 0, 0, -1],
  [-1, 0, 0, 1],
  [0, -1, 1, 0],
  [0, 1, 1, 0],
  [1, 0, 0, 1],
];

/// Computes the field-of-view from a given point by recursive shadowcasting.
///
/// The FoV is computed relative to an observer at `origin`, and only points
/// within Euclidean distance `radius` (inclusive) are lit. The origin itself
/// is always lit.
///
/// `is_opaque` returns `true` if a point represents an obstruction
/// (i.e. an opaque tile). Opaque tiles that are reached are lit too, so walls
/// bounding a room are visible. `ignite` will be called on all points in the
/// FoV; it may be called more than once for the same point.
///
/// See http://www.roguebasin.com/index.php/FOV_using_recursive_shadowcasting
pub fn shadowcast(
  origin: Point<i64>,
  radius: i64,
  is_opaque: &mut dyn FnMut(Point<i64>) -> bool,
  ignite: &mut dyn FnMut(Point<i64>),
) {
  /// State for the algorithm that is not tracked by recursion frames.
  struct State<Opaque, Ignite> {
    origin: Point<i64>,
    radius: i64,
    is_opaque: Opaque,
    ignite: Ignite,
    octant: [i64; 4],
  }

  impl<O, I> State<O, I>
  where
    O: FnMut(Point<i64>) -> bool,
    I: FnMut(Point<i64>),
  {
    /// Transform octant coordinates into map coordinates.
    fn oct2map(&self, dx: i64, dy: i64) -> Point<i64> {
      let [xx, xy, yx, yy] = self.octant;
      Point::new(
        self.origin.x() + dx * xx + dy * xy,
        self.origin.y() + dx * yx + dy * yy,
      )
    }

    /// Scans rows `row..=radius` of the sector bounded by the `start` and
    /// `end` slopes, recursing whenever an obstruction splits the sector.
    fn recurse(&mut self, row: i64, mut start: f64, end: f64) {
      if start < end {
        return;
      }

      let radius_sq = self.radius.saturating_mul(self.radius);
      let mut next_start = start;
      for j in row..=self.radius {
        let dy = -j;
        let mut blocked = false;

        for dx in -j..=0 {
          // Slopes through the left and right extremities of this tile.
          let l_slope = (dx as f64 - 0.5) / (dy as f64 + 0.5);
          let r_slope = (dx as f64 + 0.5) / (dy as f64 - 0.5);
          if start < r_slope {
            continue;
          } else if end > l_slope {
            break;
          }

          let p = self.oct2map(dx, dy);
          let dist_sq = dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy));
          if dist_sq <= radius_sq {
            (self.ignite)(p);
          }

          let opaque = (self.is_opaque)(p);
          if blocked {
            if opaque {
              next_start = r_slope;
            } else {
              blocked = false;
              start = next_start;
            }
          } else if opaque && j < self.radius {
            // Going from clear to opaque: the part of the sector above the
            // obstruction is scanned by a child, and this scan continues
            // below it.
            blocked = true;
            self.recurse(j + 1, start, l_slope);
            next_start = r_slope;
          }
        }

        if blocked {
          break;
        }
      }
    }
  }

  ignite(origin);
  if radius <= 0 {
    return;
  }

  #[rustfmt::skip]
  let mut state = State { origin, radius, is_opaque, ignite, octant: OCTANTS[0] };
  for octant in OCTANTS.iter() {
    state.octant = *octant;
    state.recurse(1, 1.0, 0.0);
  }
}

/// Returns whether a straight Bresenham line from `from` to `to` is
/// unobstructed.
///
/// The endpoints themselves are never tested, so an opaque target (e.g. a
/// wall) is still "in sight" when nothing stands in front of it.
pub fn line_of_sight(
  from: Point<i64>,
  to: Point<i64>,
  mut is_opaque: impl FnMut(Point<i64>) -> bool,
) -> bool {
  let delta = to - from;
  let (dx, dy) = (delta.x().abs(), -delta.y().abs());
  let step = delta.signum();

  let mut p = from;
  let mut err = dx + dy;
  while p != to {
    let e2 = 2 * err;
    if e2 >= dy {
      err += dy;
      p = Point::new(p.x() + step.x(), p.y());
    }
    if e2 <= dx {
      err += dx;
      p = Point::new(p.x(), p.y() + step.y());
    }
    if p != to && is_opaque(p) {
      return false;
    }
  }
  true
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;

  fn fov(
    origin: Point,
    radius: i64,
    walls: &HashSet<Point>,
  ) -> HashSet<Point> {
    let mut lit = HashSet::new();
    shadowcast(origin, radius, &mut |p| walls.contains(&p), &mut |p| {
      lit.insert(p);
    });
    lit
  }

  #[test]
  fn open_field_is_a_disc() {
    let lit = fov(Point::new(0, 0), 3, &HashSet::new());
    assert!(lit.contains(&Point::new(0, 0)));
    assert!(lit.contains(&Point::new(3, 0)));
    assert!(lit.contains(&Point::new(0, -3)));
    assert!(lit.contains(&Point::new(2, 2)));
    assert!(!lit.contains(&Point::new(3, 3)));
    assert!(!lit.contains(&Point::new(4, 0)));
    for p in &lit {
      assert!(p.x() * p.x() + p.y() * p.y() <= 9);
    }
  }

  #[test]
  fn zero_radius_sees_only_origin() {
    let lit = fov(Point::new(5, 5), 0, &HashSet::new());
    assert_eq!(lit.len(), 1);
    assert!(lit.contains(&Point::new(5, 5)));
  }

  #[test]
  fn walls_cast_shadows() {
    // A vertical wall segment two tiles east of the origin.
    let walls: HashSet<Point> =
      (-1..=1).map(|y| Point::new(2, y)).collect();
    let lit = fov(Point::new(0, 0), 6, &walls);

    assert!(lit.contains(&Point::new(2, 0)), "walls themselves are lit");
    assert!(!lit.contains(&Point::new(3, 0)));
    assert!(!lit.contains(&Point::new(5, 0)));
    assert!(lit.contains(&Point::new(-5, 0)));
    assert!(lit.contains(&Point::new(0, 5)));
  }

  #[test]
  fn bresenham_sight_lines() {
    let walls: HashSet<Point> = [Point::new(2, 0)].iter().copied().collect();
    let opaque = |p: Point| walls.contains(&p);

    assert!(!line_of_sight(Point::new(0, 0), Point::new(4, 0), opaque));
    assert!(line_of_sight(Point::new(0, 0), Point::new(2, 0), opaque));
    assert!(line_of_sight(Point::new(0, 0), Point::new(0, 4), opaque));
    assert!(line_of_sight(Point::new(0, 0), Point::new(0, 0), opaque));
    assert!(line_of_sight(Point::new(0, 1), Point::new(4, 1), opaque));
  }
}
