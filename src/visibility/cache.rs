//! Memoized field-of-view results.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::geo::Point;

/// A cache of shadowcast results, keyed by origin and radius.
///
/// There is no fine-grained invalidation: any movement throws the whole cache
/// away.
#[derive(Clone, Default, Debug)]
pub struct FovCache {
  entries: HashMap<(Point, i64), HashSet<Point>>,
  hits: u64,
  misses: u64,
}

impl FovCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the cached field of view for `(origin, radius)`, computing it
  /// with `compute` on a miss.
  pub fn get_or_compute(
    &mut self,
    origin: Point,
    radius: i64,
    compute: impl FnOnce() -> HashSet<Point>,
  ) -> &HashSet<Point> {
    let (hits, misses) = (&mut self.hits, &mut self.misses);
    self
      .entries
      .entry((origin, radius))
      .and_modify(|_| *hits += 1)
      .or_insert_with(|| {
        *misses += 1;
        compute()
      })
  }

  pub fn contains(&self, origin: Point, radius: i64) -> bool {
    self.entries.contains_key(&(origin, radius))
  }

  pub fn clear(&mut self) {
    if !self.entries.is_empty() {
      tracing::trace!(entries = self.entries.len(), "fov cache cleared");
    }
    self.entries.clear();
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Returns `(hits, misses)` since creation.
  pub fn stats(&self) -> (u64, u64) {
    (self.hits, self.misses)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn computes_once_per_key() {
    let mut cache = FovCache::new();
    let mut calls = 0;
    for _ in 0..3 {
      cache.get_or_compute(Point::new(1, 1), 4, || {
        calls += 1;
        HashSet::new()
      });
    }
    cache.get_or_compute(Point::new(1, 1), 5, HashSet::new);
    assert_eq!(calls, 1);
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats(), (2, 2));

    cache.clear();
    assert!(!cache.contains(Point::new(1, 1), 4));
  }
}
