//! Actors: the things the scheduler hands turns to.
//!
//! There are exactly two kinds of actor. A [`Player`] acts by draining a queue
//! of [`Command`]s fed by the host; a [`Monster`] acts by running its
//! [`Brain`](ai::Brain). Both implement [`Schedulable`]; only the player is
//! [`Commandable`].

use std::collections::BTreeMap;
use std::fmt;

use crate::error::TurnError;
use crate::geo::Point;
use crate::world::SimulationContext;

pub mod ai;
pub mod monster;
pub mod player;

pub use monster::Monster;
pub use player::Command;
pub use player::Player;

/// An RGB value used by a [`Sprite`].
pub type Rgb = palette::Srgb<u8>;

pub use palette::named as colors;

/// A roster-unique actor handle.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Which side an actor fights for.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Faction {
  /// The player and anything that shares its sight.
  Player,
  /// Everything that wants the player dead.
  Monster,
}

impl Faction {
  /// Returns whether members of `self` attack members of `other`.
  pub fn is_hostile_to(self, other: Faction) -> bool {
    self != other
  }
}

/// How an actor is drawn. The core never looks at this.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Sprite {
  pub glyph: char,
  pub color: Rgb,
}

/// Hit points and melee strength, as consumed by a
/// [`CombatResolver`](crate::combat::CombatResolver).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Vitals {
  pub hp: i32,
  pub max_hp: i32,
  pub power: i32,
}

impl Vitals {
  /// Creates full-health vitals.
  pub fn new(max_hp: i32, power: i32) -> Self {
    Self {
      hp: max_hp,
      max_hp,
      power,
    }
  }

  /// Returns whether these vitals belong to a corpse.
  pub fn is_dead(&self) -> bool {
    self.hp <= 0
  }
}

/// State shared by every kind of actor.
#[derive(Clone, PartialEq, Debug)]
pub struct Body {
  pub id: ActorId,
  pub name: String,
  pub pos: Point,
  pub sprite: Sprite,
  /// Relative speed; 1.0 is baseline, 2.0 acts twice as often.
  pub speed: f64,
  pub faction: Faction,
  /// How far this actor can see without the help of a light source.
  pub vision_radius: i64,
  pub vitals: Vitals,
}

/// Whether an action advanced simulated time.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TurnResult {
  /// Time advanced; the actor's turn is over.
  Consumed,
  /// Nothing happened; the actor will be offered the turn again.
  NotConsumed,
}

impl TurnResult {
  /// Returns whether this is [`TurnResult::Consumed`].
  pub fn is_consumed(self) -> bool {
    self == TurnResult::Consumed
  }
}

impl From<bool> for TurnResult {
  fn from(consumed: bool) -> Self {
    if consumed {
      TurnResult::Consumed
    } else {
      TurnResult::NotConsumed
    }
  }
}

/// Something the [`Scheduler`](crate::schedule::Scheduler) can hand a turn to.
pub trait Schedulable {
  /// This actor's roster id.
  fn id(&self) -> ActorId;

  /// This actor's relative speed; must be positive.
  fn speed(&self) -> f64;

  /// Whether this is the player, whose empty command queue suspends the
  /// simulation.
  fn is_player(&self) -> bool {
    false
  }

  /// Takes one turn.
  ///
  /// The actor has been taken out of `ctx`'s roster for the duration of the
  /// call, and is put back afterwards unless it was killed.
  fn act(
    &mut self,
    ctx: &mut SimulationContext,
  ) -> Result<TurnResult, TurnError>;
}

/// Something that can be driven by queued [`Command`]s.
pub trait Commandable {
  /// Appends a command to the queue. Returns `false` if the queue is full and
  /// the command was dropped.
  fn queue_command(&mut self, cmd: Box<dyn Command>) -> bool;

  /// The number of commands waiting to run.
  fn pending_commands(&self) -> usize;
}

/// Any actor in the roster.
#[derive(Debug)]
pub enum Actor {
  Player(Player),
  Monster(Monster),
}

impl Actor {
  /// Returns this actor's [`Body`].
  pub fn body(&self) -> &Body {
    match self {
      Actor::Player(p) => &p.body,
      Actor::Monster(m) => &m.body,
    }
  }

  /// Returns this actor's [`Body`], mutably.
  pub fn body_mut(&mut self) -> &mut Body {
    match self {
      Actor::Player(p) => &mut p.body,
      Actor::Monster(m) => &mut m.body,
    }
  }

  pub fn as_player_mut(&mut self) -> Option<&mut Player> {
    match self {
      Actor::Player(p) => Some(p),
      _ => None,
    }
  }

  pub fn as_monster(&self) -> Option<&Monster> {
    match self {
      Actor::Monster(m) => Some(m),
      _ => None,
    }
  }

  pub fn as_monster_mut(&mut self) -> Option<&mut Monster> {
    match self {
      Actor::Monster(m) => Some(m),
      _ => None,
    }
  }
}

impl Schedulable for Actor {
  fn id(&self) -> ActorId {
    self.body().id
  }

  fn speed(&self) -> f64 {
    self.body().speed
  }

  fn is_player(&self) -> bool {
    matches!(self, Actor::Player(_))
  }

  fn act(
    &mut self,
    ctx: &mut SimulationContext,
  ) -> Result<TurnResult, TurnError> {
    match self {
      Actor::Player(p) => p.act(ctx),
      Actor::Monster(m) => m.act(ctx),
    }
  }
}

/// The set of actors alive on the current level.
///
/// Iteration order is id order, so anything that walks the roster is
/// deterministic.
#[derive(Debug, Default)]
pub struct Roster {
  actors: BTreeMap<ActorId, Actor>,
  next_id: u32,
}

impl Roster {
  /// Creates an empty `Roster`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Reserves a fresh id.
  pub fn allocate_id(&mut self) -> ActorId {
    let id = ActorId(self.next_id);
    self.next_id += 1;
    id
  }

  /// Adds `actor` to the roster, replacing any actor with the same id.
  pub fn insert(&mut self, actor: Actor) {
    let id = actor.id();
    self.next_id = self.next_id.max(id.0 + 1);
    self.actors.insert(id, actor);
  }

  /// Removes and returns the actor with the given id.
  pub fn remove(&mut self, id: ActorId) -> Option<Actor> {
    self.actors.remove(&id)
  }

  pub fn get(&self, id: ActorId) -> Option<&Actor> {
    self.actors.get(&id)
  }

  pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
    self.actors.get_mut(&id)
  }

  pub fn contains(&self, id: ActorId) -> bool {
    self.actors.contains_key(&id)
  }

  pub fn len(&self) -> usize {
    self.actors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.actors.is_empty()
  }

  /// Returns a snapshot of every id in the roster.
  ///
  /// Callers that may remove actors while walking the roster iterate over
  /// this copy rather than the roster itself.
  pub fn ids(&self) -> Vec<ActorId> {
    self.actors.keys().copied().collect()
  }

  /// Iterates over every actor, in id order.
  pub fn iter(&self) -> impl Iterator<Item = &Actor> + '_ {
    self.actors.values()
  }

  /// Iterates over every actor's body, in id order.
  pub fn bodies(&self) -> impl Iterator<Item = &Body> + '_ {
    self.actors.values().map(Actor::body)
  }

  /// Returns the id of the actor standing on `p`, if any.
  pub fn occupant(&self, p: Point) -> Option<ActorId> {
    self.bodies().find(|b| b.pos == p).map(|b| b.id)
  }

  /// Returns the player's body, if the player is in the roster.
  pub fn player(&self) -> Option<&Body> {
    self.iter().find(|a| a.is_player()).map(Actor::body)
  }

  /// Returns the player, if it is in the roster.
  pub fn player_mut(&mut self) -> Option<&mut Player> {
    self.actors.values_mut().find_map(Actor::as_player_mut)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roster_ids_are_unique_and_ordered() {
    let mut roster = Roster::new();
    let a = roster.allocate_id();
    let b = roster.allocate_id();
    roster.insert(Actor::Monster(Monster::spawn("rat", b, Point::new(2, 2)).unwrap()));
    roster.insert(Actor::Player(Player::new(a, Point::new(1, 1), 1.0, 8, 4)));

    assert_ne!(a, b);
    assert_eq!(roster.ids(), vec![a, b]);
    assert_eq!(roster.occupant(Point::new(2, 2)), Some(b));
    assert_eq!(roster.occupant(Point::new(3, 3)), None);
    assert_eq!(roster.player().map(|b| b.id), Some(a));
    assert!(roster.allocate_id() > b);
  }

  #[test]
  fn factions() {
    assert!(Faction::Player.is_hostile_to(Faction::Monster));
    assert!(!Faction::Monster.is_hostile_to(Faction::Monster));
    assert_eq!(TurnResult::from(true), TurnResult::Consumed);
    assert!(!TurnResult::NotConsumed.is_consumed());
  }
}
