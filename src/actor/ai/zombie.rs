//! The zombie: shambles straight at the player without planning a route,
//! forgets quickly, and mostly stands around groaning when idle.

use rand::Rng as _;

use crate::actor::ai::attack;
use crate::actor::ai::find_target;
use crate::actor::ai::perception;
use crate::actor::ai::wander;
use crate::actor::Monster;
use crate::actor::TurnResult;
use crate::geo::Point;
use crate::world::WorldCoordinator;

/// How many turns a zombie keeps looking for the player after losing sight
/// of them: half as long as `max_search_turns`, but at least one turn.
pub fn memory_window(max_search_turns: u32) -> u32 {
  (max_search_turns / 2).max(1)
}

pub(crate) fn act<W>(monster: &mut Monster, world: &mut W) -> TurnResult
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

  if perception::can_perceive(monster, target.pos, world) {
    let window = memory_window(monster.ai.max_search_turns);
    monster.ai.remember(target.pos, window);
    return lurch(monster, target.pos, world);
  }

  if monster.ai.has_memory() {
    return investigate(monster, world);
  }

  monster.ai.forget();
  idle(monster, world)
}

/// The step that most reduces the larger of the two offsets to `goal`,
/// followed by the fallback along the other axis.
///
/// Ties go to the horizontal axis. A fallback with no offset along its axis
/// is not offered.
fn greedy_steps(from: Point, goal: Point) -> (Option<Point>, Option<Point>) {
  let delta = (goal - from).signum();
  let offset = goal - from;
  let horizontal = Point::new(delta.x(), 0);
  let vertical = Point::new(0, delta.y());

  let (primary, secondary) = if offset.x().abs() >= offset.y().abs() {
    (horizontal, vertical)
  } else {
    (vertical, horizontal)
  };
  let step = |d: Point| {
    if d == Point::zero() {
      None
    } else {
      Some(from + d)
    }
  };
  (step(primary), step(secondary))
}

/// One greedy step towards `goal`. If both the preferred step and its
/// single perpendicular retry are blocked, the zombie wanders instead.
fn lurch<W>(monster: &mut Monster, goal: Point, world: &mut W) -> TurnResult
where
  W: WorldCoordinator + ?Sized,
{
  let (primary, secondary) = greedy_steps(monster.body.pos, goal);
  for step in primary.into_iter().chain(secondary) {
    if world.relocate(&mut monster.body, step) {
      return TurnResult::Consumed;
    }
  }

  tracing::trace!(monster = %monster.body.id, %goal, "zombie is blocked");
  wander(monster, world)
}

fn investigate<W>(monster: &mut Monster, world: &mut W) -> TurnResult
where
  W: WorldCoordinator + ?Sized,
{
  let goal = match monster.ai.last_known_target {
    Some(goal) => goal,
    None => return idle(monster, world),
  };
  monster.ai.is_chasing = false;
  monster.ai.search_turns = monster.ai.search_turns.saturating_sub(1);

  if monster.body.pos != goal {
    lurch(monster, goal, world);
  }

  if monster.body.pos == goal || monster.ai.search_turns == 0 {
    tracing::debug!(monster = %monster.body.id, "zombie forgets");
    monster.ai.forget();
  }
  TurnResult::Consumed
}

fn idle<W>(monster: &mut Monster, world: &mut W) -> TurnResult
where
  W: WorldCoordinator + ?Sized,
{
  let chance = world.config().zombie_wander_chance.min(1.0);
  if chance > 0.0 && world.rng().gen_bool(chance) {
    return wander(monster, world);
  }
  tracing::trace!(monster = %monster.body.id, "zombie groans");
  TurnResult::Consumed
}
