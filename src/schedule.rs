//! The turn scheduler.
//!
//! Every registered actor has a virtual clock. The scheduler always hands the
//! turn to the actor whose clock is furthest behind; if the actor reports
//! that its turn was [`Consumed`](TurnResult::Consumed), its clock advances by
//! `1 / speed` and the global turn counter ticks. Anything else leaves the
//! clocks alone, so the same actor is offered the turn again.
//!
//! The loop only ever stops on its own for one reason: the player has nothing
//! to do. The player's turn then asks the context to suspend, [`run()`]
//! returns, and the host resumes it by queueing a command with
//! [`queue_player_command()`].
//!
//! [`run()`]: Scheduler::run
//! [`queue_player_command()`]: Scheduler::queue_player_command

use crate::actor::ActorId;
use crate::actor::Command;
use crate::actor::Commandable as _;
use crate::actor::Roster;
use crate::actor::Schedulable;
use crate::actor::TurnResult;
use crate::error::TurnError;
use crate::world::SimulationContext;
use crate::world::WorldCoordinator as _;

/// Whether the dispatch loop is live.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum SchedulerState {
  Running,
  Suspended,
}

/// A record of a single dispatch.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Dispatch {
  pub actor: ActorId,
  pub result: TurnResult,
}

#[derive(Copy, Clone, Debug)]
struct Entry {
  id: ActorId,
  speed: f64,
  time: f64,
  /// Tie-breaker among equal clocks: whoever waited longest goes first.
  seq: u64,
}

/// A speed-weighted, cooperative turn scheduler.
#[derive(Debug)]
pub struct Scheduler {
  entries: Vec<Entry>,
  now: f64,
  turn: u64,
  next_seq: u64,
  state: SchedulerState,
  halted: bool,
}

impl Default for Scheduler {
  fn default() -> Self {
    Self::new()
  }
}

impl Scheduler {
  /// Creates a new, suspended `Scheduler` with no actors.
  pub fn new() -> Self {
    Self {
      entries: Vec::new(),
      now: 0.0,
      turn: 0,
      next_seq: 0,
      state: SchedulerState::Suspended,
      halted: false,
    }
  }

  /// Creates a scheduler for everyone currently in `roster`, in id order.
  pub fn for_roster(roster: &Roster) -> Self {
    let mut scheduler = Self::new();
    scheduler.sync_with(roster);
    scheduler
  }

  /// The number of consumed turns so far.
  pub fn current_turn(&self) -> u64 {
    self.turn
  }

  pub fn state(&self) -> SchedulerState {
    self.state
  }

  pub fn is_running(&self) -> bool {
    self.state == SchedulerState::Running
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn contains(&self, id: ActorId) -> bool {
    self.entries.iter().any(|e| e.id == id)
  }

  fn bump_seq(&mut self) -> u64 {
    let seq = self.next_seq;
    self.next_seq += 1;
    seq
  }

  /// Registers `actor`. It first acts at the current virtual time.
  ///
  /// Actors with a non-positive speed are refused.
  pub fn add_actor(&mut self, actor: &dyn Schedulable) {
    self.add(actor.id(), actor.speed());
  }

  fn add(&mut self, id: ActorId, speed: f64) {
    if !(speed > 0.0 && speed.is_finite()) {
      tracing::warn!(actor = %id, speed, "refusing to schedule an actor with bad speed");
      return;
    }
    if self.contains(id) {
      tracing::debug!(actor = %id, "actor is already scheduled");
      return;
    }
    let seq = self.bump_seq();
    self.entries.push(Entry {
      id,
      speed,
      time: self.now,
      seq,
    });
  }

  /// Unregisters an actor. Unknown ids are logged and ignored.
  pub fn remove_actor(&mut self, id: ActorId) {
    let before = self.entries.len();
    self.entries.retain(|e| e.id != id);
    if self.entries.len() == before {
      tracing::warn!(actor = %id, "removing an actor that is not scheduled");
    }
  }

  /// Makes the schedule match `roster`: actors that left are dropped and
  /// newcomers are added.
  pub fn sync_with(&mut self, roster: &Roster) {
    self.entries.retain(|e| roster.contains(e.id));
    for actor in roster.iter() {
      if !self.contains(actor.id()) {
        self.add_actor(actor);
      }
    }
  }

  /// Starts (or restarts after [`stop()`](Scheduler::stop)) the loop, and
  /// runs it until it suspends.
  pub fn start(&mut self, ctx: &mut SimulationContext) -> Vec<Dispatch> {
    self.halted = false;
    self.state = SchedulerState::Running;
    self.run(ctx)
  }

  /// Suspends the loop until the next [`start()`](Scheduler::start).
  /// Queueing player commands will not wake it.
  pub fn stop(&mut self) {
    self.halted = true;
    self.state = SchedulerState::Suspended;
  }

  /// Queues a command for the player and, unless the scheduler has been
  /// stopped, resumes the loop.
  ///
  /// Returns the dispatches that ran as a result.
  pub fn queue_player_command(
    &mut self,
    ctx: &mut SimulationContext,
    cmd: Box<dyn Command>,
  ) -> Vec<Dispatch> {
    let player = match ctx.roster_mut().player_mut() {
      Some(player) => player,
      None => {
        tracing::warn!(command = cmd.name(), "no player to take the command");
        return Vec::new();
      }
    };
    if !player.queue_command(cmd) || self.halted {
      return Vec::new();
    }

    self.state = SchedulerState::Running;
    self.run(ctx)
  }

  /// Dispatches turns until the loop suspends, or until the configured
  /// dispatch budget runs out.
  pub fn run(&mut self, ctx: &mut SimulationContext) -> Vec<Dispatch> {
    let budget = ctx.config().dispatch_budget;
    let mut log = Vec::new();

    while self.is_running() {
      if log.len() >= budget {
        tracing::warn!(budget, turn = self.turn, "dispatch budget exhausted; yielding");
        break;
      }
      match self.dispatch(ctx) {
        Some(d) => log.push(d),
        None => {
          tracing::debug!("nothing left to schedule");
          self.state = SchedulerState::Suspended;
        }
      }
    }
    log
  }

  /// Hands one turn to the actor furthest behind, regardless of state.
  ///
  /// Returns `None` if no actor is scheduled.
  pub fn dispatch(&mut self, ctx: &mut SimulationContext) -> Option<Dispatch> {
    let idx = self.next_index()?;
    let Entry { id, time, .. } = self.entries[idx];
    self.now = time;

    let player = ctx.roster().player().map(|b| b.id);
    let taken = ctx.roster_mut().remove(id).ok_or(TurnError::MissingActor(id));
    let mut actor = match taken {
      Ok(actor) => actor,
      Err(e) => {
        tracing::warn!(error = %e, "dropping it from the schedule");
        self.entries.remove(idx);
        return Some(Dispatch {
          actor: id,
          result: TurnResult::NotConsumed,
        });
      }
    };
    let is_player = actor.is_player();

    let timer = ctx.timer();
    let t = timer.start("schedule::dispatch");
    let result = match actor.act(ctx) {
      Ok(result) => result,
      Err(e) => {
        tracing::error!(actor = %id, error = %e, "turn failed");
        TurnResult::NotConsumed
      }
    };
    t.finish();

    let killed = ctx.take_killed();
    if !killed.contains(&id) {
      ctx.roster_mut().insert(actor);
    }
    self.entries.retain(|e| !killed.contains(&e.id));
    if player.map_or(false, |p| killed.contains(&p)) {
      tracing::info!(turn = self.turn, "the player has died");
      self.stop();
    }

    if result.is_consumed() {
      let seq = self.bump_seq();
      if let Some(e) = self.entries.iter_mut().find(|e| e.id == id) {
        e.time += 1.0 / e.speed;
        e.seq = seq;
      }
      self.turn += 1;
      if is_player {
        ctx.update_visibility();
      }
    }

    if ctx.take_suspend_request() {
      tracing::trace!(turn = self.turn, "waiting for the player");
      self.state = SchedulerState::Suspended;
    }

    tracing::trace!(actor = %id, ?result, turn = self.turn, "dispatched");
    Some(Dispatch { actor: id, result })
  }

  fn next_index(&self) -> Option<usize> {
    self
      .entries
      .iter()
      .enumerate()
      .min_by(|(_, a), (_, b)| a.time.total_cmp(&b.time).then(a.seq.cmp(&b.seq)))
      .map(|(i, _)| i)
  }

  /// Pauses the loop around `f`, which may rebuild the world (typically with
  /// [`SimulationContext::enter_level()`]).
  ///
  /// Afterwards the schedule is synced with the new roster, and the loop
  /// resumes only if it was running before. Returns `f`'s result along with
  /// the dispatches that ran on resuming.
  pub fn with_paused<R>(
    &mut self,
    ctx: &mut SimulationContext,
    f: impl FnOnce(&mut SimulationContext) -> R,
  ) -> (R, Vec<Dispatch>) {
    let was_running = self.is_running();
    self.state = SchedulerState::Suspended;

    let out = f(ctx);
    self.sync_with(ctx.roster());

    if !was_running || self.halted {
      return (out, Vec::new());
    }
    self.state = SchedulerState::Running;
    let log = self.run(ctx);
    (out, log)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::actor::player::WaitCommand;
  use crate::actor::Actor;
  use crate::actor::Monster;
  use crate::config::SimConfig;
  use crate::geo::Point;
  use crate::level::Level;
  use crate::level::LevelKind;
  use crate::map::GridMap;
  use crate::world::WorldCoordinator;

  fn context() -> SimulationContext {
    context_with(SimConfig::default())
  }

  fn context_with(config: SimConfig) -> SimulationContext {
    let mut map = GridMap::new(12, 12);
    map.add_room(crate::geo::Rect::with_dims(12, 12));
    SimulationContext::new(map, Level::new(1, LevelKind::Dungeon), config)
  }

  #[test]
  fn empty_player_queue_suspends() {
    let mut ctx = context();
    let player = ctx.spawn_player(Point::new(1, 1));
    let mut sched = Scheduler::for_roster(ctx.roster());

    let log = sched.start(&mut ctx);
    assert_eq!(
      log,
      vec![Dispatch {
        actor: player,
        result: TurnResult::NotConsumed
      }]
    );
    assert_eq!(sched.state(), SchedulerState::Suspended);
    assert_eq!(sched.current_turn(), 0);

    let log = sched.queue_player_command(&mut ctx, Box::new(WaitCommand));
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].result, TurnResult::Consumed);
    assert_eq!(sched.current_turn(), 1);
    assert_eq!(sched.state(), SchedulerState::Suspended);
  }

  #[test]
  fn faster_actors_act_more_often() {
    let (hound, kobold) = (ActorId(1), ActorId(2));
    // Drive the clocks by hand, as if every turn were consumed.
    let mut sched = Scheduler::new();
    sched.add(hound, 2.0);
    sched.add(kobold, 1.0);

    let mut counts = (0, 0);
    for _ in 0..300 {
      let idx = sched.next_index().unwrap();
      let e = &mut sched.entries[idx];
      e.time += 1.0 / e.speed;
      if e.id == hound {
        counts.0 += 1;
      } else {
        counts.1 += 1;
      }
    }
    assert_eq!(counts, (200, 100));
  }

  #[test]
  fn turn_counter_only_counts_consumed_turns() {
    let mut ctx = context();
    ctx.spawn_player(Point::new(1, 1));
    ctx.spawn_monster("rat", Point::new(8, 8)).unwrap();
    let mut sched = Scheduler::for_roster(ctx.roster());

    sched.start(&mut ctx);
    let mut turn = sched.current_turn();
    for _ in 0..5 {
      let log = sched.queue_player_command(&mut ctx, Box::new(WaitCommand));
      // The player waits, the rat moves, and the player runs dry again.
      assert_eq!(log.len(), 3);
      let consumed = log.iter().filter(|d| d.result.is_consumed()).count() as u64;
      assert_eq!(consumed, 2);
      assert_eq!(sched.current_turn(), turn + consumed);
      turn = sched.current_turn();
    }
    assert_eq!(turn, 10);
  }

  #[test]
  fn errors_are_not_consumed() {
    // A command that always fails.
    #[derive(Debug)]
    struct Fumble;
    impl Command for Fumble {
      fn name(&self) -> &'static str {
        "fumble"
      }
      fn perform(
        &mut self,
        _: &mut crate::actor::Body,
        _: &mut dyn WorldCoordinator,
      ) -> Result<bool, TurnError> {
        Err(TurnError::Command {
          command: "fumble",
          reason: "butterfingers".into(),
        })
      }
    }

    let mut ctx = context();
    let player = ctx.spawn_player(Point::new(1, 1));
    let mut sched = Scheduler::for_roster(ctx.roster());
    sched.start(&mut ctx);

    let log = sched.queue_player_command(&mut ctx, Box::new(Fumble));
    assert_eq!(log[0].result, TurnResult::NotConsumed);
    assert_eq!(sched.current_turn(), 0);
    // The player survived the error and is back in the roster.
    assert!(ctx.roster().contains(player));
  }

  #[test]
  fn brainless_monsters_do_not_stall_the_loop() {
    let mut ctx = context_with(SimConfig {
      dispatch_budget: 50,
      ..SimConfig::default()
    });
    ctx.spawn_player(Point::new(1, 1));
    let id = ctx.roster_mut().allocate_id();
    let mut ghoul = Monster::spawn("ghoul", id, Point::new(5, 5)).unwrap();
    ghoul.brain = None;
    ctx.roster_mut().insert(Actor::Monster(ghoul));

    let mut sched = Scheduler::for_roster(ctx.roster());
    sched.start(&mut ctx);
    let log = sched.queue_player_command(&mut ctx, Box::new(WaitCommand));
    // One player turn, then the brainless ghoul is offered the turn until the
    // budget runs out.
    assert_eq!(log.len(), 50);
    assert_eq!(sched.current_turn(), 1);
    assert!(sched.is_running());
  }

  #[test]
  fn removing_unknown_actors_is_harmless() {
    let mut sched = Scheduler::new();
    sched.remove_actor(ActorId(42));
    assert!(sched.is_empty());

    let m = Monster::spawn("rat", ActorId(1), Point::zero()).unwrap();
    sched.add_actor(&m);
    sched.add_actor(&m);
    assert_eq!(sched.len(), 1);

    let mut bad = m.clone();
    bad.body.id = ActorId(2);
    bad.body.speed = 0.0;
    sched.add_actor(&bad);
    assert!(!sched.contains(ActorId(2)));
  }

  #[test]
  fn stop_is_sticky_until_start() {
    let mut ctx = context();
    ctx.spawn_player(Point::new(1, 1));
    let mut sched = Scheduler::for_roster(ctx.roster());
    sched.start(&mut ctx);
    sched.stop();

    assert!(sched.queue_player_command(&mut ctx, Box::new(WaitCommand)).is_empty());
    assert_eq!(sched.current_turn(), 0);

    let log = sched.start(&mut ctx);
    assert_eq!(log[0].result, TurnResult::Consumed);
    assert_eq!(sched.current_turn(), 1);
  }

  #[test]
  fn level_change_while_paused() {
    let mut ctx = context();
    ctx.spawn_player(Point::new(1, 1));
    let rat = ctx.spawn_monster("rat", Point::new(5, 5)).unwrap();
    let mut sched = Scheduler::for_roster(ctx.roster());
    sched.start(&mut ctx);

    let (ghoul, log) = sched.with_paused(&mut ctx, |ctx| {
      let map = GridMap::open(6, 6);
      ctx.enter_level(map, Level::new(2, LevelKind::Cavern), Point::new(0, 0));
      ctx.spawn_monster("ghoul", Point::new(4, 4))
    });

    assert!(!sched.contains(rat));
    assert!(sched.contains(ghoul.unwrap()));
    assert_eq!(sched.len(), 2);
    assert_eq!(sched.state(), SchedulerState::Suspended);
    assert!(log.is_empty());
  }

  #[test]
  fn level_change_resumes_a_running_loop() {
    let mut ctx = context_with(SimConfig {
      dispatch_budget: 1,
      ..SimConfig::default()
    });
    let player = ctx.spawn_player(Point::new(1, 1));
    for _ in 0..3 {
      ctx.roster_mut().player_mut().unwrap().queue_command(Box::new(WaitCommand));
    }
    let mut sched = Scheduler::for_roster(ctx.roster());
    assert_eq!(sched.start(&mut ctx).len(), 1);
    assert!(sched.is_running());

    let ((), log) = sched.with_paused(&mut ctx, |ctx| {
      let map = GridMap::open(6, 6);
      ctx.enter_level(map, Level::new(2, LevelKind::Cavern), Point::new(2, 2));
    });
    assert_eq!(
      log,
      vec![Dispatch {
        actor: player,
        result: TurnResult::Consumed
      }]
    );
    assert_eq!(sched.current_turn(), 2);
  }

  #[test]
  fn actors_missing_from_the_roster_are_dropped() {
    let mut ctx = context();
    let rat = ctx.spawn_monster("rat", Point::new(5, 5)).unwrap();
    ctx.spawn_player(Point::new(1, 1));
    let mut sched = Scheduler::for_roster(ctx.roster());
    ctx.roster_mut().remove(rat);

    let d = sched.dispatch(&mut ctx).unwrap();
    assert_eq!(d, Dispatch { actor: rat, result: TurnResult::NotConsumed });
    assert!(!sched.contains(rat));
    assert_eq!(sched.len(), 1);
    assert_eq!(sched.current_turn(), 0);
  }
}
