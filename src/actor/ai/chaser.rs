//! The chaser: paths straight at the player and keeps searching after it
//! loses sight of them.

use crate::actor::ai::attack;
use crate::actor::ai::find_target;
use crate::actor::ai::perception;
use crate::actor::ai::wander;
use crate::actor::Monster;
use crate::actor::TurnResult;
use crate::geo::Point;
use crate::world::WorldCoordinator;

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
    if !monster.ai.is_chasing {
      tracing::debug!(monster = %monster.body.id, "chaser spots the player");
    }
    let window = monster.ai.max_search_turns;
    monster.ai.remember(target.pos, window);
    return chase(monster, target.pos, world);
  }

  if monster.ai.has_memory() {
    return investigate(monster, world);
  }

  monster.ai.forget();
  wander(monster, world)
}

/// Makes sure the cached path leads to `goal`, repathing if it doesn't.
///
/// Returns `false` if there is no path at all.
pub(crate) fn ensure_path<W>(monster: &mut Monster, goal: Point, world: &W) -> bool
where
  W: WorldCoordinator + ?Sized,
{
  if monster.ai.path_cache.last() != Some(&goal) {
    monster.ai.path_cache = world.find_path(monster.body.pos, goal);
    tracing::trace!(
      monster = %monster.body.id,
      %goal,
      steps = monster.ai.path_cache.len(),
      "chaser repaths"
    );
  }
  !monster.ai.path_cache.is_empty()
}

/// Takes the first step of the cached path, if it is still open. Returns
/// whether the monster moved; a blocked path is thrown away.
fn follow_path<W>(monster: &mut Monster, world: &mut W) -> bool
where
  W: WorldCoordinator + ?Sized,
{
  let step = match monster.ai.path_cache.first() {
    Some(&step) => step,
    None => return false,
  };

  if world.relocate(&mut monster.body, step) {
    monster.ai.path_cache.remove(0);
    true
  } else {
    monster.ai.path_cache.clear();
    false
  }
}

fn chase<W>(monster: &mut Monster, goal: Point, world: &mut W) -> TurnResult
where
  W: WorldCoordinator + ?Sized,
{
  if !ensure_path(monster, goal, world) {
    tracing::debug!(monster = %monster.body.id, "no path to the player; wandering");
    return wander(monster, world);
  }

  if !follow_path(monster, world) {
    // Someone is in the way. Hold position; the path gets rebuilt next turn.
    tracing::trace!(monster = %monster.body.id, "chase step blocked");
  }
  TurnResult::Consumed
}

fn investigate<W>(monster: &mut Monster, world: &mut W) -> TurnResult
where
  W: WorldCoordinator + ?Sized,
{
  let goal = match monster.ai.last_known_target {
    Some(goal) => goal,
    None => return wander(monster, world),
  };
  monster.ai.is_chasing = false;
  monster.ai.search_turns = monster.ai.search_turns.saturating_sub(1);

  let arrived = monster.body.pos == goal
    || (ensure_path(monster, goal, world)
      && follow_path(monster, world)
      && monster.body.pos == goal);
  let stuck = monster.body.pos != goal && monster.ai.path_cache.is_empty();

  if arrived || stuck || monster.ai.search_turns == 0 {
    // Either we got there and found nothing, or we can't get there: give up.
    tracing::debug!(monster = %monster.body.id, arrived, "chaser abandons its search");
    monster.ai.forget();
  }
  TurnResult::Consumed
}
