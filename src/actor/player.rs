//! Player-specific components and commands.

use std::collections::VecDeque;
use std::fmt;

use crate::actor::colors;
use crate::actor::ActorId;
use crate::actor::Body;
use crate::actor::Commandable;
use crate::actor::Faction;
use crate::actor::Schedulable;
use crate::actor::Sprite;
use crate::actor::TurnResult;
use crate::actor::Vitals;
use crate::error::TurnError;
use crate::geo::Dir;
use crate::geo::Point;
use crate::world::SimulationContext;
use crate::world::WorldCoordinator;

/// A player action, queued by the host and run on the player's turn.
///
/// `perform` returns whether the command consumed the turn. A command that
/// returns `Ok(false)` (e.g. walking into a wall) leaves the player's turn
/// open for the next command.
pub trait Command: fmt::Debug {
  /// A short name, for logs.
  fn name(&self) -> &'static str;

  /// Carries the command out on behalf of `actor`.
  fn perform(
    &mut self,
    actor: &mut Body,
    world: &mut dyn WorldCoordinator,
  ) -> Result<bool, TurnError>;
}

/// The player: an actor with a bounded FIFO of commands.
pub struct Player {
  pub body: Body,
  queue: VecDeque<Box<dyn Command>>,
  capacity: usize,
  in_flight: Option<&'static str>,
}

impl Player {
  /// Creates a new `Player` with an empty command queue holding at most
  /// `capacity` commands.
  pub fn new(
    id: ActorId,
    pos: Point,
    speed: f64,
    vision_radius: i64,
    capacity: usize,
  ) -> Self {
    Player {
      body: Body {
        id,
        name: "you".to_string(),
        pos,
        sprite: Sprite {
          glyph: '@',
          color: colors::WHITE,
        },
        speed,
        faction: Faction::Player,
        vision_radius,
        vitals: Vitals::new(30, 5),
      },
      queue: VecDeque::new(),
      capacity: capacity.max(1),
      in_flight: None,
    }
  }

  /// Returns the name of the command currently executing, if any.
  pub fn in_flight(&self) -> Option<&'static str> {
    self.in_flight
  }
}

impl fmt::Debug for Player {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Player")
      .field("body", &self.body)
      .field("queue", &self.queue)
      .finish()
  }
}

impl Commandable for Player {
  fn queue_command(&mut self, cmd: Box<dyn Command>) -> bool {
    if self.queue.len() >= self.capacity {
      tracing::warn!(
        command = cmd.name(),
        capacity = self.capacity,
        "player command queue full; dropping command"
      );
      return false;
    }
    self.queue.push_back(cmd);
    true
  }

  fn pending_commands(&self) -> usize {
    self.queue.len()
  }
}

impl Schedulable for Player {
  fn id(&self) -> ActorId {
    self.body.id
  }

  fn speed(&self) -> f64 {
    self.body.speed
  }

  fn is_player(&self) -> bool {
    true
  }

  fn act(
    &mut self,
    ctx: &mut SimulationContext,
  ) -> Result<TurnResult, TurnError> {
    let mut cmd = match self.queue.pop_front() {
      Some(cmd) => cmd,
      None => {
        // Nothing to do until the host gives us something: yield.
        ctx.request_suspend();
        return Ok(TurnResult::NotConsumed);
      }
    };

    self.in_flight = Some(cmd.name());
    let result = cmd.perform(&mut self.body, ctx);
    self.in_flight = None;

    let consumed = result?;
    tracing::trace!(command = cmd.name(), consumed, "player command ran");
    Ok(consumed.into())
  }
}

/// Called when a [`MoveCommand`] bumps into a hostile actor. Returns whether
/// the turn was consumed.
pub type AttackHandler = fn(&mut Body, ActorId, &mut dyn WorldCoordinator) -> bool;

/// The default [`AttackHandler`]: a plain melee swing.
pub fn melee_attack(
  actor: &mut Body,
  target: ActorId,
  world: &mut dyn WorldCoordinator,
) -> bool {
  world.melee(actor, target).is_some()
}

/// Step one tile in a direction, attacking whatever hostile stands there.
#[derive(Copy, Clone)]
pub struct MoveCommand {
  dir: Dir,
  on_bump: AttackHandler,
}

impl MoveCommand {
  /// Creates a move that attacks with [`melee_attack()`].
  pub fn new(dir: Dir) -> Self {
    Self::with_attack(dir, melee_attack)
  }

  /// Creates a move with a custom bump-attack handler.
  pub fn with_attack(dir: Dir, on_bump: AttackHandler) -> Self {
    Self { dir, on_bump }
  }

  /// Creates a move from a direction name such as `"north"` or `"sw"`.
  ///
  /// Unknown names are logged and produce no command.
  pub fn named(name: &str) -> Option<Self> {
    match name.parse::<Dir>() {
      Ok(dir) => Some(Self::new(dir)),
      Err(e) => {
        tracing::warn!(%e, "ignoring move in unknown direction");
        None
      }
    }
  }

  pub fn dir(&self) -> Dir {
    self.dir
  }
}

impl fmt::Debug for MoveCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("MoveCommand").field(&self.dir).finish()
  }
}

impl Command for MoveCommand {
  fn name(&self) -> &'static str {
    "move"
  }

  fn perform(
    &mut self,
    actor: &mut Body,
    world: &mut dyn WorldCoordinator,
  ) -> Result<bool, TurnError> {
    let dest = actor.pos + self.dir.to_point::<i64>();

    if let Some(other) = world.occupant(dest) {
      let hostile = world
        .body(other)
        .map(|b| actor.faction.is_hostile_to(b.faction))
        .unwrap_or(false);
      if !hostile {
        tracing::debug!(actor = %actor.id, blocker = %other, "bumped into an ally");
        return Ok(false);
      }
      return Ok((self.on_bump)(actor, other, world));
    }

    if world.relocate(actor, dest) {
      Ok(true)
    } else {
      tracing::debug!(actor = %actor.id, %dest, "cannot move there");
      Ok(false)
    }
  }
}

/// Stand still for a turn.
#[derive(Copy, Clone, Debug, Default)]
pub struct WaitCommand;

impl Command for WaitCommand {
  fn name(&self) -> &'static str {
    "wait"
  }

  fn perform(
    &mut self,
    _actor: &mut Body,
    _world: &mut dyn WorldCoordinator,
  ) -> Result<bool, TurnError> {
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::SimConfig;
  use crate::level::Level;
  use crate::level::LevelKind;
  use crate::map::GridMap;

  fn context() -> SimulationContext {
    SimulationContext::new(
      GridMap::from_ascii(&["#####", "#...#", "#...#", "#####"]),
      Level::new(1, LevelKind::Dungeon),
      SimConfig::default(),
    )
  }

  /// Takes the player out of the roster, runs one turn, and puts it back.
  fn turn(ctx: &mut SimulationContext, id: ActorId) -> TurnResult {
    let mut actor = ctx.roster_mut().remove(id).unwrap();
    let result = actor.act(ctx).unwrap();
    ctx.roster_mut().insert(actor);
    result
  }

  #[test]
  fn empty_queue_suspends() {
    let mut ctx = context();
    let id = ctx.spawn_player(Point::new(1, 1));
    assert_eq!(turn(&mut ctx, id), TurnResult::NotConsumed);
    assert!(ctx.take_suspend_request());
  }

  #[test]
  fn runs_one_command_per_turn() {
    let mut ctx = context();
    let id = ctx.spawn_player(Point::new(1, 1));
    let player = ctx.roster_mut().player_mut().unwrap();
    assert!(player.queue_command(Box::new(MoveCommand::new(Dir::E))));
    assert!(player.queue_command(Box::new(WaitCommand)));

    assert_eq!(turn(&mut ctx, id), TurnResult::Consumed);
    assert_eq!(ctx.player().unwrap().pos, Point::new(2, 1));
    assert_eq!(ctx.roster_mut().player_mut().unwrap().pending_commands(), 1);
    assert!(!ctx.take_suspend_request());
  }

  #[test]
  fn walking_into_walls_is_free() {
    let mut ctx = context();
    let id = ctx.spawn_player(Point::new(1, 1));
    let player = ctx.roster_mut().player_mut().unwrap();
    player.queue_command(Box::new(MoveCommand::new(Dir::N)));

    assert_eq!(turn(&mut ctx, id), TurnResult::NotConsumed);
    assert_eq!(ctx.player().unwrap().pos, Point::new(1, 1));
  }

  #[test]
  fn bumping_a_monster_attacks_it() {
    fn count_swing(_: &mut Body, target: ActorId, w: &mut dyn WorldCoordinator) -> bool {
      w.kill(target);
      true
    }

    let mut ctx = context();
    let id = ctx.spawn_player(Point::new(1, 1));
    let rat = ctx.spawn_monster("rat", Point::new(2, 1)).unwrap();
    let player = ctx.roster_mut().player_mut().unwrap();
    player.queue_command(Box::new(MoveCommand::with_attack(Dir::E, count_swing)));

    assert_eq!(turn(&mut ctx, id), TurnResult::Consumed);
    assert!(!ctx.roster().contains(rat));
    assert_eq!(ctx.player().unwrap().pos, Point::new(1, 1));
  }

  #[test]
  fn bounded_queue_and_bad_names() {
    let mut player = Player::new(ActorId(0), Point::zero(), 1.0, 8, 2);
    assert!(player.queue_command(Box::new(WaitCommand)));
    assert!(player.queue_command(Box::new(WaitCommand)));
    assert!(!player.queue_command(Box::new(WaitCommand)));
    assert_eq!(player.pending_commands(), 2);

    assert!(MoveCommand::named("sideways").is_none());
    assert_eq!(MoveCommand::named("ne").map(|m| m.dir()), Some(Dir::Ne));
  }
}
