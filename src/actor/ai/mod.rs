//! Monster AI.
//!
//! A [`Brain`] is a stateless policy: given a [`Monster`] and a
//! [`WorldCoordinator`], it decides what the monster does this turn and does
//! it. All memory (chase state, cached paths) lives on the monster's
//! [`AiState`](crate::actor::monster::AiState).
//!
//! Both real brains share the same loop:
//!
//! ```text
//!  ATTACK  <- adjacent to the player
//!  CHASE   <- player within perception radius and in line of sight
//!  SEARCH  <- lost sight, but still remembers where the player was
//!  WANDER  <- nothing to go on
//! ```
//!
//! and differ in how they move and how long they remember.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom as _;
use serde::Deserialize;
use serde::Serialize;

use crate::actor::ActorId;
use crate::actor::Monster;
use crate::actor::TurnResult;
use crate::geo::Dir;
use crate::geo::Point;
use crate::world::WorldCoordinator;

pub mod chaser;
pub mod perception;
pub mod zombie;

/// The closed set of monster behaviours.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brain {
  /// Swings at the player when adjacent and otherwise mills about.
  Base,
  /// Paths straight at the player and searches doggedly when it loses sight.
  Chaser,
  /// Shambles greedily towards the player and forgets quickly.
  Zombie,
}

impl Brain {
  /// Runs one turn of this brain for `monster`.
  pub fn act<W>(self, monster: &mut Monster, world: &mut W) -> TurnResult
  where
    W: WorldCoordinator + ?Sized,
  {
    match self {
      Brain::Base => base_act(monster, world),
      Brain::Chaser => chaser::act(monster, world),
      Brain::Zombie => zombie::act(monster, world),
    }
  }

  /// The name used for this brain in save files.
  pub fn name(self) -> &'static str {
    match self {
      Brain::Base => "base",
      Brain::Chaser => "chaser",
      Brain::Zombie => "zombie",
    }
  }
}

impl fmt::Display for Brain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Brain {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "base" => Ok(Brain::Base),
      "chaser" => Ok(Brain::Chaser),
      "zombie" => Ok(Brain::Zombie),
      _ => Err(s.to_string()),
    }
  }
}

/// Who the monster is after, and where they are.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Target {
  pub id: ActorId,
  pub pos: Point,
}

/// Finds the player, logging if there is none.
pub(crate) fn find_target<W>(monster: &Monster, world: &W) -> Option<Target>
where
  W: WorldCoordinator + ?Sized,
{
  let target = world.player().map(|b| Target {
    id: b.id,
    pos: b.pos,
  });
  if target.is_none() {
    tracing::warn!(monster = %monster.body.id, "no player to hunt");
  }
  target
}

/// Swings at `target`. Any chase in progress is over.
pub(crate) fn attack<W>(
  monster: &mut Monster,
  target: Target,
  world: &mut W,
) -> TurnResult
where
  W: WorldCoordinator + ?Sized,
{
  monster.ai.is_chasing = false;
  monster.ai.path_cache.clear();

  match world.melee(&monster.body, target.id) {
    Some(outcome) => tracing::debug!(
      monster = %monster.body.id,
      target = %target.id,
      damage = outcome.damage,
      killed = outcome.target_died,
      "monster attacks"
    ),
    None => tracing::debug!(monster = %monster.body.id, "attack found no one"),
  }
  TurnResult::Consumed
}

/// Steps onto a random free orthogonal neighbour, or waits if boxed in.
///
/// Either way the turn is spent.
pub(crate) fn wander<W>(monster: &mut Monster, world: &mut W) -> TurnResult
where
  W: WorldCoordinator + ?Sized,
{
  let pos = monster.body.pos;
  let options: Vec<Point> = Dir::orthogonal()
    .iter()
    .map(|d| pos + d.to_point::<i64>())
    .filter(|&p| world.can_move_to(p))
    .collect();

  if let Some(&dest) = options.choose(world.rng()) {
    world.relocate(&mut monster.body, dest);
  }
  TurnResult::Consumed
}

/// The fallback brain: attack if adjacent, otherwise wander.
fn base_act<W>(monster: &mut Monster, world: &mut W) -> TurnResult
where
  W: WorldCoordinator + ?Sized,
{
  let target = match find_target(monster, world) {
    Some(t) => t,
    None => return TurnResult::NotConsumed,
  };

  if perception::is_adjacent(monster.body.pos, target.pos) {
    return attack(monster, target, world);
  }
  wander(monster, world)
}

#[cfg(test)]
pub(crate) mod testing {
  //! Fixtures shared by the brain tests.

  use crate::actor::Actor;
  use crate::actor::ActorId;
  use crate::actor::Monster;
  use crate::actor::TurnResult;
  use crate::config::SimConfig;
  use crate::geo::Point;
  use crate::level::Level;
  use crate::level::LevelKind;
  use crate::map::GridMap;
  use crate::world::SimulationContext;

  /// A walled room of the given interior size, with the player at `player`.
  pub fn room(width: i64, height: i64, player: Point) -> SimulationContext {
    room_with(SimConfig::default(), width, height, player)
  }

  /// Like [`room()`], with a custom config.
  pub fn room_with(
    config: SimConfig,
    width: i64,
    height: i64,
    player: Point,
  ) -> SimulationContext {
    let mut map = GridMap::new(width + 2, height + 2);
    map.add_room(crate::geo::Rect::with_dims(width + 2, height + 2));
    let mut ctx =
      SimulationContext::new(map, Level::new(1, LevelKind::Dungeon), config);
    ctx.spawn_player(player);
    ctx
  }

  /// Creates a monster that is *not* in the roster, so that tests can drive
  /// its brain directly.
  pub fn monster(ctx: &mut SimulationContext, kind: &str, at: Point) -> Monster {
    let id = ctx.roster_mut().allocate_id();
    Monster::spawn(kind, id, at).unwrap()
  }

  /// Runs one brain turn, the way the scheduler would.
  pub fn think(ctx: &mut SimulationContext, m: &mut Monster) -> TurnResult {
    let brain = m.brain.unwrap();
    brain.act(m, ctx)
  }

  /// Teleports the player.
  pub fn move_player(ctx: &mut SimulationContext, to: Point) {
    let id = player_id(ctx);
    if let Some(Actor::Player(p)) = ctx.roster_mut().get_mut(id) {
      p.body.pos = to;
    }
  }

  /// The player's id.
  pub fn player_id(ctx: &SimulationContext) -> ActorId {
    ctx.roster().player().unwrap().id
  }
}

#[cfg(test)]
mod tests {
  use super::testing::*;
  use super::*;

  #[test]
  fn brain_names_round_trip() {
    for b in [Brain::Base, Brain::Chaser, Brain::Zombie] {
      assert_eq!(b.name().parse::<Brain>(), Ok(b));
      assert_eq!(serde_json::to_string(&b).unwrap(), format!("\"{}\"", b));
    }
    assert!("vampire".parse::<Brain>().is_err());
  }

  #[test]
  fn wander_only_picks_free_tiles() {
    // A one-tile-wide corridor, with the player blocking the east exit.
    let mut ctx = room(3, 1, Point::new(3, 1));
    let mut rat = monster(&mut ctx, "rat", Point::new(2, 1));
    for _ in 0..20 {
      let from = rat.body.pos;
      assert_eq!(wander(&mut rat, &mut ctx), TurnResult::Consumed);
      let to = rat.body.pos;
      assert!(to == from || (to - from).manhattan() == 1);
      assert_ne!(to, Point::new(3, 1));
      assert!(ctx.map().is_passable(to));
    }
  }

  #[test]
  fn boxed_in_wander_waits() {
    let mut ctx = room(1, 1, Point::new(1, 1));
    let mut rat = monster(&mut ctx, "rat", Point::new(1, 1));
    // The rat has the only floor tile to itself and nowhere to go.
    move_player(&mut ctx, Point::new(5, 5));
    assert_eq!(wander(&mut rat, &mut ctx), TurnResult::Consumed);
    assert_eq!(rat.body.pos, Point::new(1, 1));
  }

  #[test]
  fn base_brain_attacks_when_adjacent() {
    let mut ctx = room(5, 5, Point::new(3, 3));
    let mut rat = monster(&mut ctx, "rat", Point::new(4, 4));
    let hp = ctx.player().unwrap().vitals.hp;
    assert_eq!(think(&mut ctx, &mut rat), TurnResult::Consumed);
    assert!(ctx.player().unwrap().vitals.hp < hp);
    assert_eq!(rat.body.pos, Point::new(4, 4));
  }
}
