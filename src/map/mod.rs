//! Dungeon maps.
//!
//! The simulation core does not care what tiles *are*; it only asks a
//! [`TileOracle`] whether a tile can be walked on or seen through. [`GridMap`]
//! is a plain rectangular implementation used by the demo and the tests.

use crate::geo::Point;
use crate::geo::Rect;

/// A passability and transparency oracle for a single dungeon level.
pub trait TileOracle {
  /// The rectangle of coordinates this map covers; everything outside it is
  /// solid rock.
  fn bounds(&self) -> Rect;

  /// Returns whether an actor may stand on `p`, ignoring other actors.
  fn is_passable(&self, p: Point) -> bool;

  /// Returns whether light passes through `p`.
  fn is_transparent(&self, p: Point) -> bool;

  /// Returns whether `p` blocks light.
  fn is_opaque(&self, p: Point) -> bool {
    !self.is_transparent(p)
  }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[allow(missing_docs)]
pub enum Tile {
  Void,
  Wall,
  Ground,
}

/// A dense, rectangular [`TileOracle`] with its upper-left corner at the
/// origin.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct GridMap {
  width: i64,
  height: i64,
  tiles: Box<[Tile]>,
}

impl GridMap {
  /// Creates a new `GridMap` filled with [`Tile::Void`].
  pub fn new(width: i64, height: i64) -> Self {
    let (width, height) = (width.max(0), height.max(0));
    GridMap {
      width,
      height,
      tiles: vec![Tile::Void; (width * height) as usize].into_boxed_slice(),
    }
  }

  /// Creates a new `GridMap` that is all floor, edge to edge.
  pub fn open(width: i64, height: i64) -> Self {
    let mut map = Self::new(width, height);
    map.tiles.iter_mut().for_each(|t| *t = Tile::Ground);
    map
  }

  /// Parses a map from ASCII art: `#` is wall, a space is void, and anything
  /// else is ground. Rows may be ragged; missing cells are void.
  pub fn from_ascii(rows: &[&str]) -> Self {
    let height = rows.len() as i64;
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    let mut map = Self::new(width as i64, height);
    for (y, row) in rows.iter().enumerate() {
      for (x, c) in row.chars().enumerate() {
        let tile = match c {
          '#' => Tile::Wall,
          ' ' => Tile::Void,
          _ => Tile::Ground,
        };
        map.set(Point::new(x as i64, y as i64), tile);
      }
    }
    map
  }

  fn index(&self, p: Point) -> Option<usize> {
    if !self.bounds().contains(p) {
      return None;
    }
    Some((p.x() + p.y() * self.width) as usize)
  }

  /// Returns the tile at `p`; out-of-bounds tiles are [`Tile::Void`].
  pub fn tile(&self, p: Point) -> Tile {
    self.index(p).map(|i| self.tiles[i]).unwrap_or(Tile::Void)
  }

  /// Overwrites the tile at `p`. Out-of-bounds writes are ignored.
  pub fn set(&mut self, p: Point, tile: Tile) {
    if let Some(i) = self.index(p) {
      self.tiles[i] = tile;
    }
  }

  /// Shorthand for `set(p, Tile::Wall)`.
  pub fn set_wall(&mut self, p: Point) {
    self.set(p, Tile::Wall)
  }

  /// Carves out a room: ground inside, walls on the boundary. Existing
  /// ground is never walled back up, so overlapping rooms join.
  pub fn add_room(&mut self, room: Rect) {
    for p in room.points() {
      let tile = if room.boundary_contains(p) {
        Tile::Wall
      } else {
        Tile::Ground
      };

      if tile > self.tile(p) {
        self.set(p, tile);
      }
    }
  }
}

impl TileOracle for GridMap {
  fn bounds(&self) -> Rect {
    Rect::with_dims(self.width, self.height)
  }

  fn is_passable(&self, p: Point) -> bool {
    self.tile(p) == Tile::Ground
  }

  fn is_transparent(&self, p: Point) -> bool {
    self.tile(p) == Tile::Ground
  }
}
