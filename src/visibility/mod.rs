//! Field of view and fog of war.
//!
//! What the player's side can see is the union of two things:
//!
//! 1. Each viewer's own sight, out to its vision radius.
//! 2. Tiles lit by a level's [`LightSource`]s, but only where the viewer has
//!    an unobstructed line to them.
//!
//! The second half is computed by intersecting the union of every light's
//! field of view with a *mask*: the viewer's field of view with a radius big
//! enough to cover the whole map. A lit room at the far end of a corridor is
//! therefore visible, but one around a corner is not, no matter how brightly
//! lit it is.

use std::collections::HashSet;

use crate::actor::Body;
use crate::geo::fov;
use crate::geo::Point;
use crate::level::Level;
use crate::level::LightSource;
use crate::map::TileOracle;

mod cache;

pub use cache::FovCache;

/// Something that sees: an origin and how far it sees unaided.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Viewer {
  pub pos: Point,
  pub radius: i64,
}

impl From<&Body> for Viewer {
  fn from(body: &Body) -> Self {
    Self {
      pos: body.pos,
      radius: body.vision_radius,
    }
  }
}

/// Tiles that entered and left view in a single update, both sorted.
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct VisibilityDelta {
  pub lit: Vec<Point>,
  pub dark: Vec<Point>,
}

impl VisibilityDelta {
  pub fn new(mut lit: Vec<Point>, mut dark: Vec<Point>) -> Self {
    lit.sort();
    dark.sort();
    Self { lit, dark }
  }

  pub fn is_empty(&self) -> bool {
    self.lit.is_empty() && self.dark.is_empty()
  }
}

/// The result of [`VisibilityEngine::update_level_visibility()`].
#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct VisibilityUpdate {
  /// Everything visible now.
  pub visible: HashSet<Point>,
  /// What changed since the previous update.
  pub delta: VisibilityDelta,
}

/// Computes and caches fields of view for a level.
#[derive(Clone, Default, Debug)]
pub struct VisibilityEngine {
  cache: FovCache,
}

impl VisibilityEngine {
  /// Creates a new `VisibilityEngine` with an empty cache.
  pub fn new() -> Self {
    Self::default()
  }

  /// Throws away every cached field of view. Called whenever anything moves.
  pub fn invalidate(&mut self) {
    self.cache.clear();
  }

  pub fn cache(&self) -> &FovCache {
    &self.cache
  }

  /// Returns every tile `viewer` can see unaided.
  pub fn compute_for_actor(
    &mut self,
    map: &dyn TileOracle,
    viewer: Viewer,
  ) -> HashSet<Point> {
    self.cached_fov(map, viewer.pos, viewer.radius).clone()
  }

  fn cached_fov(
    &mut self,
    map: &dyn TileOracle,
    origin: Point,
    radius: i64,
  ) -> &HashSet<Point> {
    self
      .cache
      .get_or_compute(origin, radius, || shadowcast(map, origin, radius))
  }

  /// Returns every tile visible to at least one of `viewers`, counting tiles
  /// that `lights` illuminate within each viewer's line of sight.
  pub fn compute_union(
    &mut self,
    map: &dyn TileOracle,
    viewers: &[Viewer],
    lights: &[LightSource],
  ) -> HashSet<Point> {
    let mut visible = HashSet::new();
    for &v in viewers {
      visible.extend(self.cached_fov(map, v.pos, v.radius).iter().copied());
    }
    if lights.is_empty() || viewers.is_empty() {
      return visible;
    }

    let bounds = map.bounds();
    let mask_radius = bounds.width() + bounds.height();
    let mut mask = HashSet::new();
    for &v in viewers {
      mask.extend(self.cached_fov(map, v.pos, mask_radius).iter().copied());
    }

    let mut lit = HashSet::new();
    for light in lights {
      lit.extend(
        self
          .cached_fov(map, light.pos(), light.radius)
          .iter()
          .copied(),
      );
    }

    visible.extend(lit.intersection(&mask).copied());
    visible
  }

  /// Recomputes what `viewers` can see on `level`, folding it into the
  /// level's memory.
  pub fn update_level_visibility(
    &mut self,
    map: &dyn TileOracle,
    level: &mut Level,
    viewers: &[Viewer],
  ) -> VisibilityUpdate {
    let visible = self.compute_union(map, viewers, level.lights());
    let delta = level.set_visible(visible.clone());
    tracing::trace!(
      visible = visible.len(),
      lit = delta.lit.len(),
      dark = delta.dark.len(),
      "level visibility updated"
    );
    VisibilityUpdate { visible, delta }
  }

  /// Returns whether `viewer` can see `target` unaided.
  pub fn can_actor_see_target(
    &mut self,
    map: &dyn TileOracle,
    viewer: Viewer,
    target: Point,
  ) -> bool {
    self.cached_fov(map, viewer.pos, viewer.radius).contains(&target)
  }
}

/// An uncached shadowcast over `map`.
///
/// Anything outside the map's bounds is opaque. Radii beyond what it takes to
/// cross the whole map are clamped.
pub fn shadowcast(map: &dyn TileOracle, origin: Point, radius: i64) -> HashSet<Point> {
  let bounds = map.bounds();
  let radius = radius.min(bounds.width() + bounds.height());
  let mut seen = HashSet::new();
  fov::shadowcast(
    origin,
    radius,
    &mut |p| !bounds.contains(p) || map.is_opaque(p),
    &mut |p| {
      if bounds.contains(p) {
        seen.insert(p);
      }
    },
  );
  seen
}
