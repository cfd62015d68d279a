//! Save-file shapes for monsters and levels.
//!
//! These are plain serde structs with camelCase keys. What the host does with
//! the JSON (files, slots, compression) is its own business. The visible set
//! is never saved; it is recomputed after loading.

use serde::Deserialize;
use serde::Serialize;

use crate::actor::ai::Brain;
use crate::actor::monster::AiState;
use crate::actor::monster::MonsterTemplate;
use crate::actor::ActorId;
use crate::actor::Monster;
use crate::error::SaveError;
use crate::geo::Point;
use crate::level::Level;
use crate::level::LevelKind;
use crate::level::LightSource;

/// A point as it appears in a save file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct SavedPoint {
  pub x: i64,
  pub y: i64,
}

impl From<Point> for SavedPoint {
  fn from(p: Point) -> Self {
    Self { x: p.x(), y: p.y() }
  }
}

impl From<SavedPoint> for Point {
  fn from(p: SavedPoint) -> Self {
    Point::new(p.x, p.y)
  }
}

/// A saved monster.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterSnapshot {
  /// The template the monster was made from. Older saves omit it; those
  /// monsters are rebuilt from the first template with a matching brain.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  pub x: i64,
  pub y: i64,
  pub brain_type: String,
  pub perception_radius: i64,
  pub is_chasing: bool,
  pub last_known_target_pos: Option<SavedPoint>,
  pub path_cache: Vec<SavedPoint>,
  pub search_turns: u32,
  pub max_search_turns: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hp: Option<i32>,
}

impl MonsterSnapshot {
  /// Records `monster`'s position and AI state.
  ///
  /// A brainless monster is saved with the base brain.
  pub fn capture(monster: &Monster) -> Self {
    let ai = &monster.ai;
    Self {
      kind: Some(monster.kind.to_string()),
      x: monster.body.pos.x(),
      y: monster.body.pos.y(),
      brain_type: monster.brain.unwrap_or(Brain::Base).name().to_string(),
      perception_radius: ai.perception_radius,
      is_chasing: ai.is_chasing,
      last_known_target_pos: ai.last_known_target.map(SavedPoint::from),
      path_cache: ai.path_cache.iter().copied().map(SavedPoint::from).collect(),
      search_turns: ai.search_turns,
      max_search_turns: ai.max_search_turns,
      hp: Some(monster.body.vitals.hp),
    }
  }

  /// Rebuilds the monster under the id `id`.
  pub fn restore(&self, id: ActorId) -> Result<Monster, SaveError> {
    let brain: Brain = self
      .brain_type
      .parse()
      .map_err(SaveError::UnknownBrain)?;

    let template = match &self.kind {
      Some(kind) => MonsterTemplate::find(kind)
        .ok_or_else(|| SaveError::UnknownTemplate(kind.clone()))?,
      None => MonsterTemplate::for_brain(brain)
        .ok_or_else(|| SaveError::UnknownBrain(self.brain_type.clone()))?,
    };

    let mut monster =
      Monster::from_template(template, id, Point::new(self.x, self.y));
    monster.brain = Some(brain);
    monster.ai = AiState {
      is_chasing: self.is_chasing,
      last_known_target: self.last_known_target_pos.map(Point::from),
      path_cache: self.path_cache.iter().copied().map(Point::from).collect(),
      search_turns: self.search_turns,
      max_search_turns: self.max_search_turns,
      perception_radius: self.perception_radius,
    };
    if let Some(hp) = self.hp {
      monster.body.vitals.hp = hp;
    }
    Ok(monster)
  }
}

fn default_depth() -> u32 {
  1
}

/// A saved level: what has been seen, and where the lights are.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSnapshot {
  #[serde(default = "default_depth")]
  pub depth: u32,
  #[serde(default)]
  pub kind: LevelKind,
  /// Tile keys, `"x,y"`, sorted.
  pub seen_tiles: Vec<String>,
  pub light_sources: Vec<LightSource>,
}

impl LevelSnapshot {
  /// Records `level`'s memory.
  pub fn capture(level: &Level) -> Self {
    let mut seen: Vec<Point> = level.seen_tiles().iter().copied().collect();
    seen.sort();
    Self {
      depth: level.depth(),
      kind: level.kind(),
      seen_tiles: seen.iter().map(|p| p.to_string()).collect(),
      light_sources: level.lights().to_vec(),
    }
  }

  /// Rebuilds the level. Nothing is visible until the next update.
  pub fn restore(&self) -> Result<Level, SaveError> {
    let seen = self
      .seen_tiles
      .iter()
      .map(|key| key.parse::<Point>())
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Level::restore(
      self.depth,
      self.kind,
      seen,
      self.light_sources.clone(),
    ))
  }
}

/// A level together with the monsters on it.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSave {
  pub level: LevelSnapshot,
  #[serde(default)]
  pub monsters: Vec<MonsterSnapshot>,
}

impl LevelSave {
  pub fn to_json(&self) -> Result<String, SaveError> {
    Ok(serde_json::to_string(self)?)
  }

  pub fn from_json(text: &str) -> Result<Self, SaveError> {
    Ok(serde_json::from_str(text)?)
  }
}
