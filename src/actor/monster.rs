//! Monsters and the templates they are spawned from.

use crate::actor::ai::Brain;
use crate::actor::colors;
use crate::actor::ActorId;
use crate::actor::Body;
use crate::actor::Faction;
use crate::actor::Rgb;
use crate::actor::Schedulable;
use crate::actor::Sprite;
use crate::actor::TurnResult;
use crate::actor::Vitals;
use crate::error::TurnError;
use crate::geo::Point;
use crate::world::SimulationContext;

/// The mutable half of a monster's AI. Brains themselves are stateless; all
/// memory lives here so it can be saved.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct AiState {
  /// Whether the monster is currently pursuing the player.
  pub is_chasing: bool,
  /// Where the player was last seen.
  pub last_known_target: Option<Point>,
  /// Steps towards the current goal, next step first.
  pub path_cache: Vec<Point>,
  /// Turns of searching left before the monster gives up.
  pub search_turns: u32,
  /// What `search_turns` is reset to on sighting (before any per-brain
  /// scaling).
  pub max_search_turns: u32,
  /// Manhattan distance within which the player can be noticed.
  pub perception_radius: i64,
}

impl AiState {
  /// Records a sighting of the target at `at`, refreshing memory to `window`
  /// turns.
  pub fn remember(&mut self, at: Point, window: u32) {
    self.is_chasing = true;
    self.last_known_target = Some(at);
    self.search_turns = window;
  }

  /// Drops all chase state.
  pub fn forget(&mut self) {
    self.is_chasing = false;
    self.last_known_target = None;
    self.search_turns = 0;
    self.path_cache.clear();
  }

  /// Returns whether there is a remembered position still worth searching.
  pub fn has_memory(&self) -> bool {
    self.last_known_target.is_some() && self.search_turns > 0
  }
}

/// A static description of a kind of monster.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct MonsterTemplate {
  pub name: &'static str,
  pub glyph: char,
  pub color: Rgb,
  pub speed: f64,
  pub brain: Brain,
  pub perception_radius: i64,
  pub max_search_turns: u32,
  pub max_hp: i32,
  pub power: i32,
}

/// Every monster the factory knows how to make.
pub const TEMPLATES: &[MonsterTemplate] = &[
  MonsterTemplate {
    name: "rat",
    glyph: 'r',
    color: colors::SADDLEBROWN,
    speed: 1.0,
    brain: Brain::Base,
    perception_radius: 4,
    max_search_turns: 0,
    max_hp: 4,
    power: 1,
  },
  MonsterTemplate {
    name: "hound",
    glyph: 'h',
    color: colors::ORANGE,
    speed: 2.0,
    brain: Brain::Chaser,
    perception_radius: 8,
    max_search_turns: 10,
    max_hp: 10,
    power: 3,
  },
  MonsterTemplate {
    name: "kobold",
    glyph: 'k',
    color: colors::OLIVEDRAB,
    speed: 1.0,
    brain: Brain::Chaser,
    perception_radius: 6,
    max_search_turns: 8,
    max_hp: 8,
    power: 2,
  },
  MonsterTemplate {
    name: "ghoul",
    glyph: 'z',
    color: colors::DARKSEAGREEN,
    speed: 0.5,
    brain: Brain::Zombie,
    perception_radius: 5,
    max_search_turns: 6,
    max_hp: 14,
    power: 4,
  },
];

impl MonsterTemplate {
  /// Looks up a template by name.
  pub fn find(name: &str) -> Option<&'static MonsterTemplate> {
    TEMPLATES.iter().find(|t| t.name == name)
  }

  /// The first template that uses `brain`, for restoring saves that predate
  /// template names.
  pub fn for_brain(brain: Brain) -> Option<&'static MonsterTemplate> {
    TEMPLATES.iter().find(|t| t.brain == brain)
  }
}

/// An autonomous actor.
#[derive(Clone, PartialEq, Debug)]
pub struct Monster {
  pub body: Body,
  /// The template this monster was made from.
  pub kind: &'static str,
  pub brain: Option<Brain>,
  pub ai: AiState,
}

impl Monster {
  /// Creates a monster from `template`.
  pub fn from_template(
    template: &'static MonsterTemplate,
    id: ActorId,
    pos: Point,
  ) -> Self {
    Monster {
      body: Body {
        id,
        name: template.name.to_string(),
        pos,
        sprite: Sprite {
          glyph: template.glyph,
          color: template.color,
        },
        speed: template.speed,
        faction: Faction::Monster,
        vision_radius: template.perception_radius,
        vitals: Vitals::new(template.max_hp, template.power),
      },
      kind: template.name,
      brain: Some(template.brain),
      ai: AiState {
        perception_radius: template.perception_radius,
        max_search_turns: template.max_search_turns,
        ..AiState::default()
      },
    }
  }

  /// Creates a monster from the template called `name`.
  ///
  /// Unknown names are logged and produce nothing.
  pub fn spawn(name: &str, id: ActorId, pos: Point) -> Option<Self> {
    match MonsterTemplate::find(name) {
      Some(t) => Some(Self::from_template(t, id, pos)),
      None => {
        tracing::warn!(template = name, "unknown monster template");
        None
      }
    }
  }
}

impl Schedulable for Monster {
  fn id(&self) -> ActorId {
    self.body.id
  }

  fn speed(&self) -> f64 {
    self.body.speed
  }

  fn act(
    &mut self,
    ctx: &mut SimulationContext,
  ) -> Result<TurnResult, TurnError> {
    match self.brain {
      Some(brain) => {
        let timer = ctx.timer();
        let _t = timer.start("actor::ai::think");
        Ok(brain.act(self, ctx))
      }
      None => {
        tracing::warn!(monster = %self.body.id, kind = self.kind, "monster has no brain");
        Ok(TurnResult::NotConsumed)
      }
    }
  }
}
