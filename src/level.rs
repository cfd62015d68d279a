//! Dungeon levels and their fog-of-war memory.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::geo::Point;
use crate::geo::Rect;
use crate::visibility::VisibilityDelta;

bitflags::bitflags! {
  /// Per-level policy switches, derived from the [`LevelKind`].
  pub struct LevelFlags: u8 {
    /// Every tile is marked as seen on entry. Only the momentary visible set
    /// is still limited by field of view.
    const REVEAL_ALL = 0b0000_0001;
  }
}

/// The layout family a level was generated with.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelKind {
  /// Simple, fully mapped layouts.
  Basic,
  /// Rooms and corridors.
  Dungeon,
  /// Open, irregular caves.
  Cavern,
}

impl LevelKind {
  /// The policy flags for levels of this kind.
  pub fn flags(self) -> LevelFlags {
    match self {
      LevelKind::Basic => LevelFlags::REVEAL_ALL,
      LevelKind::Dungeon | LevelKind::Cavern => LevelFlags::empty(),
    }
  }
}

impl Default for LevelKind {
  fn default() -> Self {
    LevelKind::Dungeon
  }
}

/// What a [`LightSource`] is, for presentation.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightKind {
  Torch,
  Brazier,
  Crystal,
}

/// A fixed light. Anything it lights is visible to any actor with a clear
/// sightline to it, however far away.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct LightSource {
  pub x: i64,
  pub y: i64,
  pub radius: i64,
  pub kind: LightKind,
}

impl LightSource {
  pub fn new(pos: Point, radius: i64, kind: LightKind) -> Self {
    Self {
      x: pos.x(),
      y: pos.y(),
      radius,
      kind,
    }
  }

  pub fn pos(&self) -> Point {
    Point::new(self.x, self.y)
  }
}

/// A single dungeon level: its lights and what the player knows of it.
///
/// `visible` is always a subset of `seen`: tiles are folded into `seen`
/// before they become visible.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Level {
  depth: u32,
  kind: LevelKind,
  flags: LevelFlags,
  lights: Vec<LightSource>,
  seen: HashSet<Point>,
  visible: HashSet<Point>,
}

impl Level {
  /// Creates a new, unexplored `Level`.
  pub fn new(depth: u32, kind: LevelKind) -> Self {
    Self {
      depth,
      kind,
      flags: kind.flags(),
      lights: Vec::new(),
      seen: HashSet::new(),
      visible: HashSet::new(),
    }
  }

  /// Rebuilds a level from saved memory. Nothing is visible until the next
  /// recomputation.
  pub fn restore(
    depth: u32,
    kind: LevelKind,
    seen: impl IntoIterator<Item = Point>,
    lights: Vec<LightSource>,
  ) -> Self {
    Self {
      seen: seen.into_iter().collect(),
      lights,
      ..Self::new(depth, kind)
    }
  }

  /// Adds lights to this level.
  pub fn with_lights(mut self, lights: impl IntoIterator<Item = LightSource>) -> Self {
    self.lights.extend(lights);
    self
  }

  pub fn depth(&self) -> u32 {
    self.depth
  }

  pub fn kind(&self) -> LevelKind {
    self.kind
  }

  pub fn flags(&self) -> LevelFlags {
    self.flags
  }

  pub fn lights(&self) -> &[LightSource] {
    &self.lights
  }

  /// Returns whether `p` has ever been seen.
  pub fn is_seen(&self, p: Point) -> bool {
    self.seen.contains(&p)
  }

  /// Returns whether `p` is visible right now.
  pub fn is_visible(&self, p: Point) -> bool {
    self.visible.contains(&p)
  }

  pub fn seen_tiles(&self) -> &HashSet<Point> {
    &self.seen
  }

  pub fn visible_tiles(&self) -> &HashSet<Point> {
    &self.visible
  }

  /// Marks every tile in `bounds` as seen.
  pub fn reveal_all(&mut self, bounds: Rect) {
    self.seen.extend(bounds.points());
  }

  /// Replaces the visible set, remembering every newly visible tile first.
  ///
  /// Returns which tiles came into and went out of view.
  pub fn set_visible(&mut self, visible: HashSet<Point>) -> VisibilityDelta {
    self.seen.extend(visible.iter().copied());

    let lit = visible.difference(&self.visible).copied().collect();
    let dark = self.visible.difference(&visible).copied().collect();
    self.visible = visible;
    VisibilityDelta::new(lit, dark)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn set(points: &[(i64, i64)]) -> HashSet<Point> {
    points.iter().map(|&p| p.into()).collect()
  }

  #[test]
  fn seen_only_grows() {
    let mut level = Level::new(1, LevelKind::Dungeon);
    let delta = level.set_visible(set(&[(1, 1), (1, 2)]));
    assert_eq!(delta.lit, vec![Point::new(1, 1), Point::new(1, 2)]);
    assert!(delta.dark.is_empty());

    let delta = level.set_visible(set(&[(1, 2), (1, 3)]));
    assert_eq!(delta.lit, vec![Point::new(1, 3)]);
    assert_eq!(delta.dark, vec![Point::new(1, 1)]);

    assert!(level.is_seen(Point::new(1, 1)));
    assert!(!level.is_visible(Point::new(1, 1)));
    assert!(level.visible_tiles().is_subset(level.seen_tiles()));
  }

  #[test]
  fn basic_levels_reveal_everything() {
    assert!(LevelKind::Basic.flags().contains(LevelFlags::REVEAL_ALL));
    assert!(LevelKind::Cavern.flags().is_empty());

    let mut level = Level::new(2, LevelKind::Basic);
    level.reveal_all(Rect::with_dims(3, 2));
    assert_eq!(level.seen_tiles().len(), 6);
    assert!(level.visible_tiles().is_empty());
  }

  #[test]
  fn light_json_shape() {
    let light = LightSource::new(Point::new(4, 2), 5, LightKind::Brazier);
    assert_eq!(
      serde_json::to_value(light).unwrap(),
      serde_json::json!({ "x": 4, "y": 2, "radius": 5, "kind": "brazier" })
    );
  }
}
