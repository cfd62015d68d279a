//! Melee resolution.
//!
//! The simulation core does not own a damage formula. It calls a
//! [`CombatResolver`] whenever something swings at something else, and removes
//! the target if the resolver says it died.

use rand::Rng as _;
use rand::RngCore;

use crate::actor::Body;

/// The result of a single melee exchange.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct MeleeOutcome {
  /// Hit points taken off the target.
  pub damage: i32,
  /// Whether the blow was fatal.
  pub target_died: bool,
}

/// A damage formula.
pub trait CombatResolver {
  /// Resolves `attacker` hitting `target`, updating the target's vitals.
  fn resolve_melee(
    &self,
    attacker: &Body,
    target: &mut Body,
    rng: &mut dyn RngCore,
  ) -> MeleeOutcome;
}

/// The stock [`CombatResolver`]: each hit deals between 1 and the
/// attacker's power, inclusive.
#[derive(Copy, Clone, Default, Debug)]
pub struct BasicMelee;

impl CombatResolver for BasicMelee {
  fn resolve_melee(
    &self,
    attacker: &Body,
    target: &mut Body,
    rng: &mut dyn RngCore,
  ) -> MeleeOutcome {
    let power = attacker.vitals.power.max(1);
    let damage = rng.gen_range(1..=power);
    target.vitals.hp -= damage;

    MeleeOutcome {
      damage,
      target_died: target.vitals.is_dead(),
    }
  }
}
