//! Geometry and math library.

use std::fmt;
use std::mem;
use std::ops::Range;
use std::str::FromStr;

use num::Signed;
use num::Zero;

mod impls;

pub mod fov;
pub mod graph;

/// A compass direction on the grid.
///
/// We use the following convention for coordinates: x increases to the right
/// direction, and y in the downwards direction, so `N` is `(0, -1)`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[allow(missing_docs)]
pub enum Dir {
  N,
  Ne,
  E,
  Se,
  S,
  Sw,
  W,
  Nw,
}

impl Dir {
  /// Returns all eight directions, clockwise from north.
  #[inline]
  pub fn all() -> [Dir; 8] {
    use Dir::*;
    [N, Ne, E, Se, S, Sw, W, Nw]
  }

  /// Returns the four orthogonal directions, clockwise from north.
  #[inline]
  pub fn orthogonal() -> [Dir; 4] {
    [Dir::N, Dir::E, Dir::S, Dir::W]
  }

  /// Returns whether this direction lies along an axis.
  #[inline]
  pub fn is_orthogonal(self) -> bool {
    matches!(self, Dir::N | Dir::E | Dir::S | Dir::W)
  }

  /// Returns the unit offset for this direction.
  pub fn to_point<T: Signed>(self) -> Point<T> {
    let (x, y): (i8, i8) = match self {
      Dir::N => (0, -1),
      Dir::Ne => (1, -1),
      Dir::E => (1, 0),
      Dir::Se => (1, 1),
      Dir::S => (0, 1),
      Dir::Sw => (-1, 1),
      Dir::W => (-1, 0),
      Dir::Nw => (-1, -1),
    };
    let unit = |v: i8| match v {
      1 => T::one(),
      -1 => -T::one(),
      _ => T::zero(),
    };
    Point::new(unit(x), unit(y))
  }
}

/// Error returned when a direction name is not recognized.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("unknown direction `{0}`")]
pub struct UnknownDir(pub String);

impl FromStr for Dir {
  type Err = UnknownDir;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let dir = match s.to_ascii_lowercase().as_str() {
      "n" | "north" | "up" => Dir::N,
      "ne" | "northeast" => Dir::Ne,
      "e" | "east" | "right" => Dir::E,
      "se" | "southeast" => Dir::Se,
      "s" | "south" | "down" => Dir::S,
      "sw" | "southwest" => Dir::Sw,
      "w" | "west" | "left" => Dir::W,
      "nw" | "northwest" => Dir::Nw,
      _ => return Err(UnknownDir(s.to_string())),
    };
    Ok(dir)
  }
}

/// A two-dimensional point.
///
/// `Point<T>` values may be added and subtracted componentwise.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Point<T = i64>([T; 2]);

impl<T> Point<T> {
  /// Creates a new `Point` with the given coordinates.
  #[inline]
  pub fn new(x: T, y: T) -> Self {
    Self([x, y])
  }

  /// Creates a new `Point` representing the origin.
  #[inline]
  pub fn zero() -> Self
  where
    T: Zero,
  {
    Zero::zero()
  }

  /// Returns this `Point`'s coordinates as an array.
  #[inline]
  pub fn coords(self) -> [T; 2] {
    self.0
  }

  /// Returns the `x` coordinate.
  #[inline]
  pub fn x(self) -> T
  where
    T: Copy,
  {
    self.0[0]
  }

  /// Returns the `y` coordinate.
  #[inline]
  pub fn y(self) -> T
  where
    T: Copy,
  {
    self.0[1]
  }

  /// Computes the Manhattan norm of `self`.
  pub fn manhattan(self) -> T
  where
    T: Signed + Copy,
  {
    self.x().abs() + self.y().abs()
  }

  /// Computes the Chebyshev (king-move) norm of `self`.
  pub fn chebyshev(self) -> T
  where
    T: Signed + Copy + PartialOrd,
  {
    let (x, y) = (self.x().abs(), self.y().abs());
    if x > y {
      x
    } else {
      y
    }
  }

  /// Returns a point whose coordinates are the signs of `self`'s.
  pub fn signum(self) -> Self
  where
    T: Signed + Copy,
  {
    Self::new(self.x().signum(), self.y().signum())
  }

  /// Componentwise orders the coordinates of `self` and `other`.
  ///
  /// Returns a pair of points whose coordinates are the minima and maxima in
  /// each coordinate, respectively.
  #[inline]
  pub fn sort_coords(mut self, mut other: Self) -> (Self, Self)
  where
    T: PartialOrd,
  {
    for i in 0..self.len() {
      if self[i] > other[i] {
        mem::swap(&mut self[i], &mut other[i])
      }
    }
    (self, other)
  }
}

/// Points print as `x,y`, which is also the tile-key format used by saves.
impl<T: fmt::Display> fmt::Display for Point<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{},{}", self.0[0], self.0[1])
  }
}

/// Error returned when parsing an `x,y` tile key fails.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("malformed tile key `{0}`")]
pub struct BadTileKey(pub String);

impl FromStr for Point<i64> {
  type Err = BadTileKey;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let bad = || BadTileKey(s.to_string());
    let (x, y) = s.split_once(',').ok_or_else(bad)?;
    let x = x.trim().parse().map_err(|_| bad())?;
    let y = y.trim().parse().map_err(|_| bad())?;
    Ok(Point::new(x, y))
  }
}

/// A rectangle, represented as a pair of [`Point`] values.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct Rect<T = i64>(Point<T>, Point<T>);

// Invariant: rect.0.x <= rect.1.x and rect.0.y <= rect.1.y.
impl<T: Signed> Rect<T> {
  /// Creates a new `Rect` with the given [`Point`] values as opposing corners.
  #[inline]
  pub fn new(p1: Point<T>, p2: Point<T>) -> Self
  where
    T: PartialOrd,
  {
    let (min, max) = Point::sort_coords(p1, p2);
    Self(min, max)
  }

  /// Creates a new `Rect` of the given dimensions with one corner at the
  /// origin.
  #[inline]
  pub fn with_dims(width: T, height: T) -> Self {
    Self(Point::zero(), Point::new(width.abs(), height.abs()))
  }

  /// Returns the upper-left and lower-right corners of this `Rect`.
  #[inline]
  pub fn corners(self) -> (Point<T>, Point<T>) {
    (self.0, self.1)
  }

  /// Returns the width of this `Rect`.
  #[inline]
  pub fn width(self) -> T
  where
    T: Copy,
  {
    self.1.x() - self.0.x()
  }

  /// Returns the height of this `Rect`.
  #[inline]
  pub fn height(self) -> T
  where
    T: Copy,
  {
    self.1.y() - self.0.y()
  }

  /// Returns whether this `Rect` contains a given point.
  ///
  /// Note that the points in a rectangle form an "exclusive" range; points
  /// colinear with the lower-right corner are *not* part of the rectangle.
  #[inline]
  pub fn contains(self, p: Point<T>) -> bool
  where
    T: Copy + PartialOrd,
  {
    for i in 0..p.len() {
      if !(self.0[i]..self.1[i]).contains(&p[i]) {
        return false;
      }
    }
    true
  }

  /// Returns whether this `Rect`'s boundary contains a given point.
  #[inline]
  pub fn boundary_contains(self, p: Point<T>) -> bool
  where
    T: Copy + PartialOrd,
  {
    let on_edge = p.x() == self.0.x()
      || p.x() == self.1.x() - T::one()
      || p.y() == self.0.y()
      || p.y() == self.1.y() - T::one();

    on_edge && self.contains(p)
  }

  /// Returns an iterator over all points in this rectangle.
  ///
  /// Points are traversed in row-major order.
  pub fn points(self) -> impl Iterator<Item = Point<T>>
  where
    T: Copy,
    Range<T>: Iterator<Item = T>,
  {
    let [x1, y1] = self.0.coords();
    let [x2, y2] = self.1.coords();

    (y1..y2).flat_map(move |y| (x1..x2).map(move |x| Point::new(x, y)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn norms() {
    let p = Point::new(3i64, -5);
    assert_eq!(p.manhattan(), 8);
    assert_eq!(p.chebyshev(), 5);
    assert_eq!(p.signum(), Point::new(1, -1));
  }

  #[test]
  fn tile_keys() {
    let p = Point::new(3i64, 4);
    assert_eq!(p.to_string(), "3,4");
    assert_eq!("3,4".parse::<Point>(), Ok(p));
    assert_eq!(" -2 , 7".parse::<Point>(), Ok(Point::new(-2, 7)));
    assert!("3;4".parse::<Point>().is_err());
    assert!("a,4".parse::<Point>().is_err());
  }

  #[test]
  fn direction_names() {
    assert_eq!("north".parse::<Dir>(), Ok(Dir::N));
    assert_eq!("SW".parse::<Dir>(), Ok(Dir::Sw));
    assert!("upwards".parse::<Dir>().is_err());
    assert_eq!(Dir::Nw.to_point::<i64>(), Point::new(-1, -1));
    assert!(Dir::orthogonal().iter().all(|d| d.is_orthogonal()));
  }

  #[test]
  fn rect_boundary() {
    let r = Rect::with_dims(4i64, 3);
    assert_eq!(r.points().count(), 12);
    assert!(r.boundary_contains(Point::new(0, 1)));
    assert!(r.boundary_contains(Point::new(3, 2)));
    assert!(!r.boundary_contains(Point::new(1, 1)));
    assert!(!r.contains(Point::new(4, 0)));
  }
}
