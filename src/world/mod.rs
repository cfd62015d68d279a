//! The world the actors live in.
//!
//! [`WorldCoordinator`] is the narrow interface brains and commands use to
//! look at and change the world. [`SimulationContext`] is the one real
//! implementation: it owns the map, the level, the roster, the visibility
//! engine and the RNG, and is passed by reference into the scheduler.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::RngCore;
use rand::SeedableRng as _;

use crate::actor::Actor;
use crate::actor::ActorId;
use crate::actor::Body;
use crate::actor::Faction;
use crate::actor::Monster;
use crate::actor::Player;
use crate::actor::Roster;
use crate::combat::BasicMelee;
use crate::combat::CombatResolver;
use crate::combat::MeleeOutcome;
use crate::config::SimConfig;
use crate::error::SaveError;
use crate::geo::fov;
use crate::geo::graph::AStar;
use crate::geo::graph::PathOptions;
use crate::geo::graph::Pathfinder;
use crate::geo::Point;
use crate::level::Level;
use crate::level::LevelFlags;
use crate::map::TileOracle;
use crate::save::LevelSave;
use crate::save::LevelSnapshot;
use crate::save::MonsterSnapshot;
use crate::timing::SystemTimer;
use crate::visibility::Viewer;
use crate::visibility::VisibilityEngine;
use crate::visibility::VisibilityUpdate;

/// Answers line-of-sight questions over a map.
pub trait LosProvider {
  /// Returns whether `from` has an unobstructed view of `to` on `map`.
  fn has_los(&self, map: &dyn TileOracle, from: Point, to: Point) -> bool;
}

/// A [`LosProvider`] that walks a Bresenham line between the two points.
#[derive(Copy, Clone, Default, Debug)]
pub struct BresenhamLos;

impl LosProvider for BresenhamLos {
  fn has_los(&self, map: &dyn TileOracle, from: Point, to: Point) -> bool {
    fov::line_of_sight(from, to, |p| map.is_opaque(p))
  }
}

/// The interface through which actors query and change shared state.
pub trait WorldCoordinator {
  fn config(&self) -> &SimConfig;

  /// The current level's tiles.
  fn map(&self) -> &dyn TileOracle;

  /// Returns whether an actor could step onto `p` right now: the tile is
  /// passable and nobody is standing on it.
  fn can_move_to(&self, p: Point) -> bool {
    self.map().is_passable(p) && self.occupant(p).is_none()
  }

  /// Returns whether `from` can see `to`.
  ///
  /// Worlds that cannot answer this say yes.
  fn has_los(&self, _from: Point, _to: Point) -> bool {
    true
  }

  /// The player's body, if the player is alive and not mid-turn.
  fn player(&self) -> Option<&Body>;

  fn body(&self, id: ActorId) -> Option<&Body>;

  /// The id of whoever stands on `p`.
  fn occupant(&self, p: Point) -> Option<ActorId>;

  /// Asks the pathfinding service for a route. An empty path means there is
  /// none.
  fn find_path(&self, from: Point, to: Point) -> Vec<Point>;

  /// Moves `actor` to `to`, if [`can_move_to()`] allows it. Returns whether
  /// the actor moved.
  ///
  /// [`can_move_to()`]: WorldCoordinator::can_move_to
  fn relocate(&mut self, actor: &mut Body, to: Point) -> bool;

  /// Has `attacker` hit the actor `target`. A fatal blow removes the target.
  /// Returns `None` if there is no such target.
  fn melee(&mut self, attacker: &Body, target: ActorId) -> Option<MeleeOutcome>;

  /// Removes an actor from the world.
  fn kill(&mut self, id: ActorId);

  fn rng(&mut self) -> &mut dyn RngCore;

  /// Hints that the screen is stale.
  fn request_redraw(&mut self);

  /// Hints that world state changed and should be saved.
  fn mark_dirty(&mut self);
}

/// Everything a running simulation needs, in one place.
pub struct SimulationContext {
  config: SimConfig,
  map: Box<dyn TileOracle>,
  level: Level,
  roster: Roster,
  visibility: Option<VisibilityEngine>,
  los: Option<Box<dyn LosProvider>>,
  pathfinder: Box<dyn Pathfinder>,
  combat: Box<dyn CombatResolver>,
  rng: StdRng,
  timer: Arc<SystemTimer>,

  suspend_requested: bool,
  killed: Vec<ActorId>,
  redraw: bool,
  dirty: bool,
}

impl SimulationContext {
  /// Creates a new `SimulationContext` on `map`, with no actors.
  ///
  /// The context starts with a visibility engine, Bresenham line of sight,
  /// [`AStar`] paths and [`BasicMelee`] combat; use the `with_*` methods to
  /// swap any of them out.
  pub fn new(
    map: impl TileOracle + 'static,
    level: Level,
    config: SimConfig,
  ) -> Self {
    let mut ctx = Self {
      rng: StdRng::seed_from_u64(config.seed),
      config,
      map: Box::new(map),
      level,
      roster: Roster::new(),
      visibility: Some(VisibilityEngine::new()),
      los: Some(Box::new(BresenhamLos)),
      pathfinder: Box::new(AStar),
      combat: Box::new(BasicMelee),
      timer: Arc::new(SystemTimer::new()),
      suspend_requested: false,
      killed: Vec::new(),
      redraw: false,
      dirty: false,
    };
    ctx.apply_level_flags();
    ctx
  }

  /// Replaces the line-of-sight provider. `None` makes every line clear.
  pub fn with_los(mut self, los: Option<Box<dyn LosProvider>>) -> Self {
    self.los = los;
    self
  }

  /// Replaces (or removes) the visibility engine.
  pub fn with_visibility(mut self, engine: Option<VisibilityEngine>) -> Self {
    self.visibility = engine;
    self
  }

  pub fn with_pathfinder(mut self, pathfinder: impl Pathfinder + 'static) -> Self {
    self.pathfinder = Box::new(pathfinder);
    self
  }

  pub fn with_combat(mut self, combat: impl CombatResolver + 'static) -> Self {
    self.combat = Box::new(combat);
    self
  }

  /// Shares a profiling timer with the host.
  pub fn with_timer(mut self, timer: Arc<SystemTimer>) -> Self {
    self.timer = timer;
    self
  }

  pub fn level(&self) -> &Level {
    &self.level
  }

  pub fn level_mut(&mut self) -> &mut Level {
    &mut self.level
  }

  pub fn roster(&self) -> &Roster {
    &self.roster
  }

  pub fn roster_mut(&mut self) -> &mut Roster {
    &mut self.roster
  }

  pub fn timer(&self) -> Arc<SystemTimer> {
    Arc::clone(&self.timer)
  }

  /// Creates the player at `pos` and returns their id.
  ///
  /// There is only ever one player; asking for another returns the existing
  /// one's id.
  pub fn spawn_player(&mut self, pos: Point) -> ActorId {
    if let Some(existing) = self.roster.player() {
      tracing::warn!(player = %existing.id, "a player already exists");
      return existing.id;
    }

    let id = self.roster.allocate_id();
    self.roster.insert(Actor::Player(Player::new(
      id,
      pos,
      self.config.player_speed,
      self.config.player_vision_radius,
      self.config.command_queue_capacity,
    )));
    self.invalidate_visibility();
    id
  }

  /// Creates a monster from the template called `name` at `pos`.
  ///
  /// Returns `None` if there is no such template or `pos` is not free.
  pub fn spawn_monster(&mut self, name: &str, pos: Point) -> Option<ActorId> {
    if !self.can_move_to(pos) {
      tracing::warn!(template = name, %pos, "cannot spawn on a blocked tile");
      return None;
    }

    let id = self.roster.allocate_id();
    let monster = Monster::spawn(name, id, pos)?;
    tracing::debug!(monster = %id, template = name, %pos, "monster spawned");
    self.roster.insert(Actor::Monster(monster));
    Some(id)
  }

  /// Asks the scheduler to stop after the current dispatch.
  pub fn request_suspend(&mut self) {
    self.suspend_requested = true;
  }

  /// Clears and returns the pending suspension request.
  pub fn take_suspend_request(&mut self) -> bool {
    std::mem::take(&mut self.suspend_requested)
  }

  /// Drains the ids of actors killed since the last call.
  pub fn take_killed(&mut self) -> Vec<ActorId> {
    std::mem::take(&mut self.killed)
  }

  /// Clears and returns the pending redraw hint.
  pub fn take_redraw_request(&mut self) -> bool {
    std::mem::take(&mut self.redraw)
  }

  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  pub fn clear_dirty(&mut self) {
    self.dirty = false;
  }

  /// Throws away cached fields of view.
  pub fn invalidate_visibility(&mut self) {
    if let Some(engine) = &mut self.visibility {
      engine.invalidate();
    }
  }

  /// The viewers whose sight makes up the level's visible set: every
  /// player-faction actor in the roster.
  pub fn viewers(&self) -> Vec<Viewer> {
    self
      .roster
      .bodies()
      .filter(|b| b.faction == Faction::Player)
      .map(Viewer::from)
      .collect()
  }

  /// Recomputes the level's visible set from the player's point of view.
  ///
  /// Without a visibility engine, nothing is visible.
  pub fn update_visibility(&mut self) -> VisibilityUpdate {
    let viewers = self.viewers();
    let engine = match &mut self.visibility {
      Some(engine) => engine,
      None => {
        tracing::error!(depth = self.level.depth(), "level has no visibility engine");
        return VisibilityUpdate::default();
      }
    };

    let _t = self.timer.start("visibility::compute_union");
    let update =
      engine.update_level_visibility(self.map.as_ref(), &mut self.level, &viewers);
    if !update.delta.is_empty() {
      self.redraw = true;
    }
    update
  }

  /// Returns whether the actor `viewer` can see `target` unaided.
  pub fn can_actor_see_target(&mut self, viewer: ActorId, target: Point) -> bool {
    let viewer = match self.roster.get(viewer) {
      Some(actor) => Viewer::from(actor.body()),
      None => {
        tracing::warn!(actor = %viewer, "visibility query for unknown actor");
        return false;
      }
    };

    match &mut self.visibility {
      Some(engine) => engine.can_actor_see_target(self.map.as_ref(), viewer, target),
      None => {
        tracing::error!(depth = self.level.depth(), "level has no visibility engine");
        false
      }
    }
  }

  /// Tears down the current level and installs a new one, bringing the player
  /// along to `player_pos`.
  ///
  /// Every monster on the old level is dropped. The caller must keep the
  /// scheduler paused around this; see
  /// [`Scheduler::with_paused()`](crate::schedule::Scheduler::with_paused).
  pub fn enter_level(
    &mut self,
    map: impl TileOracle + 'static,
    level: Level,
    player_pos: Point,
  ) -> VisibilityUpdate {
    tracing::info!(depth = level.depth(), kind = ?level.kind(), "entering level");
    self.install_level(map, level, player_pos);
    self.apply_level_flags();
    self.update_visibility()
  }

  /// Captures the current level and its monsters for saving.
  pub fn save_level(&self) -> LevelSave {
    LevelSave {
      level: LevelSnapshot::capture(&self.level),
      monsters: self
        .roster
        .iter()
        .filter_map(Actor::as_monster)
        .map(MonsterSnapshot::capture)
        .collect(),
    }
  }

  /// Replaces the current level with a saved one.
  ///
  /// Nothing is visible until the next
  /// [`update_visibility()`](Self::update_visibility). On error, the current
  /// level is left untouched. Monsters saved onto a wall, the player's tile or
  /// another monster are dropped.
  pub fn load_level(
    &mut self,
    map: impl TileOracle + 'static,
    save: &LevelSave,
    player_pos: Point,
  ) -> Result<(), SaveError> {
    let level = save.level.restore()?;
    let monsters = save
      .monsters
      .iter()
      .map(|m| m.restore(self.roster.allocate_id()))
      .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(depth = level.depth(), monsters = monsters.len(), "loading level");
    self.install_level(map, level, player_pos);
    for m in monsters {
      if !self.can_move_to(m.body.pos) {
        tracing::warn!(
          monster = %m.body.id,
          pos = %m.body.pos,
          "saved monster is on a blocked tile; skipping it"
        );
        continue;
      }
      self.roster.insert(Actor::Monster(m));
    }
    Ok(())
  }

  fn install_level(
    &mut self,
    map: impl TileOracle + 'static,
    level: Level,
    player_pos: Point,
  ) {
    for id in self.roster.ids() {
      let stays = self
        .roster
        .get(id)
        .map_or(false, |a| a.body().faction == Faction::Player);
      if !stays {
        self.roster.remove(id);
      }
    }
    if let Some(player) = self.roster.player_mut() {
      player.body.pos = player_pos;
    }

    self.map = Box::new(map);
    self.level = level;
    self.invalidate_visibility();
    self.dirty = true;
    self.redraw = true;
  }

  fn apply_level_flags(&mut self) {
    if self.level.flags().contains(LevelFlags::REVEAL_ALL) {
      let bounds = self.map.bounds();
      self.level.reveal_all(bounds);
    }
  }
}

impl WorldCoordinator for SimulationContext {
  fn config(&self) -> &SimConfig {
    &self.config
  }

  fn map(&self) -> &dyn TileOracle {
    self.map.as_ref()
  }

  fn has_los(&self, from: Point, to: Point) -> bool {
    match &self.los {
      Some(los) => los.has_los(self.map.as_ref(), from, to),
      None => true,
    }
  }

  fn player(&self) -> Option<&Body> {
    self.roster.player()
  }

  fn body(&self, id: ActorId) -> Option<&Body> {
    self.roster.get(id).map(Actor::body)
  }

  fn occupant(&self, p: Point) -> Option<ActorId> {
    self.roster.occupant(p)
  }

  fn find_path(&self, from: Point, to: Point) -> Vec<Point> {
    let opts = PathOptions {
      max_nodes: self.config.path_node_limit,
      ..PathOptions::default()
    };
    self.pathfinder.find_path(self.map.as_ref(), from, to, opts)
  }

  fn relocate(&mut self, actor: &mut Body, to: Point) -> bool {
    if !self.can_move_to(to) {
      return false;
    }
    actor.pos = to;
    self.invalidate_visibility();
    self.mark_dirty();
    true
  }

  fn melee(&mut self, attacker: &Body, target: ActorId) -> Option<MeleeOutcome> {
    let victim = match self.roster.get_mut(target) {
      Some(actor) => actor.body_mut(),
      None => {
        tracing::warn!(attacker = %attacker.id, target = %target, "no one to hit");
        return None;
      }
    };

    let outcome = self.combat.resolve_melee(attacker, victim, &mut self.rng);
    tracing::debug!(
      attacker = %attacker.id,
      target = %target,
      damage = outcome.damage,
      hp = victim.vitals.hp,
      "melee"
    );
    if outcome.target_died {
      self.kill(target);
    }
    self.request_redraw();
    self.mark_dirty();
    Some(outcome)
  }

  fn kill(&mut self, id: ActorId) {
    match self.roster.remove(id) {
      Some(actor) => tracing::info!(actor = %id, name = %actor.body().name, "actor dies"),
      // Probably the actor whose turn it is; the scheduler won't put it back.
      None => tracing::debug!(actor = %id, "killed an actor outside the roster"),
    }
    self.killed.push(id);
    self.invalidate_visibility();
    self.mark_dirty();
  }

  fn rng(&mut self) -> &mut dyn RngCore {
    &mut self.rng
  }

  fn request_redraw(&mut self) {
    self.redraw = true;
  }

  fn mark_dirty(&mut self) {
    self.dirty = true;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::level::LevelKind;
  use crate::map::GridMap;

  fn context(kind: LevelKind) -> SimulationContext {
    SimulationContext::new(
      GridMap::from_ascii(&["#######", "#..#..#", "#.....#", "#######"]),
      Level::new(1, kind),
      SimConfig::default(),
    )
  }

  #[test]
  fn occupied_tiles_are_blocked() {
    let mut ctx = context(LevelKind::Dungeon);
    let player = ctx.spawn_player(Point::new(1, 1));
    assert!(!ctx.can_move_to(Point::new(1, 1)));
    assert!(!ctx.can_move_to(Point::new(3, 1)));
    assert!(ctx.can_move_to(Point::new(2, 1)));

    assert_eq!(ctx.spawn_monster("rat", Point::new(1, 1)), None);
    assert_eq!(ctx.spawn_monster("dragon", Point::new(2, 2)), None);
    let rat = ctx.spawn_monster("rat", Point::new(2, 2)).unwrap();
    assert_eq!(ctx.occupant(Point::new(2, 2)), Some(rat));
    assert_eq!(ctx.spawn_player(Point::new(5, 1)), player);
  }

  #[test]
  fn los_provider_is_optional() {
    let ctx = context(LevelKind::Dungeon);
    assert!(!ctx.has_los(Point::new(2, 1), Point::new(4, 1)));
    assert!(ctx.has_los(Point::new(1, 2), Point::new(5, 2)));

    let ctx = ctx.with_los(None);
    assert!(ctx.has_los(Point::new(2, 1), Point::new(4, 1)));
  }

  #[test]
  fn killing_the_target_of_a_melee() {
    struct Slay;
    impl CombatResolver for Slay {
      fn resolve_melee(&self, _: &Body, t: &mut Body, _: &mut dyn RngCore) -> MeleeOutcome {
        t.vitals.hp = 0;
        MeleeOutcome { damage: t.vitals.max_hp, target_died: true }
      }
    }

    let mut ctx = context(LevelKind::Dungeon).with_combat(Slay);
    let player = ctx.spawn_player(Point::new(1, 1));
    let rat = ctx.spawn_monster("rat", Point::new(2, 1)).unwrap();
    let attacker = ctx.body(player).unwrap().clone();

    let outcome = ctx.melee(&attacker, rat).unwrap();
    assert!(outcome.target_died);
    assert!(!ctx.roster().contains(rat));
    assert_eq!(ctx.take_killed(), vec![rat]);
    assert!(ctx.take_killed().is_empty());
    assert!(ctx.melee(&attacker, rat).is_none());
  }

  #[test]
  fn relocation_invalidates_sight() {
    let mut ctx = context(LevelKind::Dungeon);
    let player = ctx.spawn_player(Point::new(1, 1));
    ctx.update_visibility();
    assert!(ctx.level().is_visible(Point::new(1, 2)));

    let mut body = ctx.roster_mut().remove(player).unwrap();
    assert!(ctx.relocate(body.body_mut(), Point::new(5, 2)));
    assert!(!ctx.relocate(body.body_mut(), Point::new(6, 2)));
    ctx.roster_mut().insert(body);
    assert!(ctx.is_dirty());

    let update = ctx.update_visibility();
    assert!(update.delta.lit.contains(&Point::new(5, 1)));
    assert!(ctx.level().is_seen(Point::new(1, 1)));
  }

  #[test]
  fn missing_visibility_engine_sees_nothing() {
    let mut ctx = context(LevelKind::Dungeon).with_visibility(None);
    let player = ctx.spawn_player(Point::new(1, 1));
    assert!(ctx.update_visibility().visible.is_empty());
    assert!(!ctx.can_actor_see_target(player, Point::new(1, 1)));
    assert!(ctx.level().seen_tiles().is_empty());
  }

  #[test]
  fn entering_a_basic_level_maps_it() {
    let mut ctx = context(LevelKind::Dungeon);
    let player = ctx.spawn_player(Point::new(1, 1));
    ctx.spawn_monster("rat", Point::new(2, 2)).unwrap();

    let map = GridMap::from_ascii(&["#########", "#...#...#", "#########"]);
    let update = ctx.enter_level(map, Level::new(2, LevelKind::Basic), Point::new(1, 1));

    assert_eq!(ctx.roster().len(), 1);
    assert_eq!(ctx.body(player).unwrap().pos, Point::new(1, 1));
    assert_eq!(ctx.level().seen_tiles().len(), 27);
    // Mapped, but still foggy beyond the wall.
    assert!(ctx.level().is_seen(Point::new(6, 1)));
    assert!(!update.visible.contains(&Point::new(6, 1)));
  }

  #[test]
  fn huge_vision_radius_does_not_overflow() {
    let config =
      SimConfig::from_json_str(r#"{ "player_vision_radius": 3100000000 }"#).unwrap();
    let mut ctx = SimulationContext::new(
      GridMap::from_ascii(&["#######", "#..#..#", "#.....#", "#######"]),
      Level::new(1, LevelKind::Dungeon),
      config,
    );
    ctx.spawn_player(Point::new(1, 1));
    let update = ctx.update_visibility();
    assert!(update.visible.contains(&Point::new(2, 2)));
    assert!(update.visible.contains(&Point::new(3, 1)));
    assert!(!update.visible.contains(&Point::new(5, 1)));
  }

  #[test]
  fn loading_skips_monsters_on_blocked_tiles() {
    let mut ctx = context(LevelKind::Dungeon);
    ctx.spawn_player(Point::new(1, 1));
    ctx.spawn_monster("rat", Point::new(2, 2)).unwrap();
    let mut save = ctx.save_level();
    let rat = save.monsters[0].clone();

    let mut on_player = rat.clone();
    on_player.x = 4;
    on_player.y = 1;
    let mut in_wall = rat.clone();
    in_wall.x = 3;
    in_wall.y = 1;
    save.monsters = vec![rat.clone(), rat, on_player, in_wall];

    let map = GridMap::from_ascii(&["#######", "#..#..#", "#.....#", "#######"]);
    ctx.load_level(map, &save, Point::new(4, 1)).unwrap();

    assert_eq!(ctx.roster().len(), 2);
    assert!(ctx.occupant(Point::new(2, 2)).is_some());
    assert_eq!(ctx.occupant(Point::new(4, 1)), ctx.player().map(|b| b.id));
  }
}
