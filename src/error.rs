//! Error types.
//!
//! Very little in the simulation core is allowed to fail loudly: a stalled
//! simulation is worse than a slightly wrong one. The errors here are the ones
//! that cross a boundary, i.e. a failed turn reported to the scheduler, or a
//! bad config or save file handed to us by the host.

use std::io;

use crate::actor::ActorId;
use crate::geo::BadTileKey;

/// A failure while an actor was taking its turn.
///
/// The scheduler logs these and treats the dispatch as not having consumed
/// any time.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum TurnError {
  /// The actor asked for is not in the roster.
  #[error("actor {0} is not in the roster")]
  MissingActor(ActorId),

  /// A player command could not be carried out.
  #[error("command `{command}` failed: {reason}")]
  Command {
    /// The name of the command.
    command: &'static str,
    /// What went wrong.
    reason: String,
  },
}

/// A failure loading a [`SimConfig`](crate::config::SimConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("could not read config: {0}")]
  Io(#[from] io::Error),

  #[error("could not parse config: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid config value for `{field}`: {reason}")]
  Invalid {
    field: &'static str,
    reason: String,
  },
}

/// A failure decoding a saved monster or level.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
  #[error("unknown brain type `{0}`")]
  UnknownBrain(String),

  #[error("unknown monster template `{0}`")]
  UnknownTemplate(String),

  #[error(transparent)]
  BadTileKey(#[from] BadTileKey),

  #[error("malformed save data: {0}")]
  Json(#[from] serde_json::Error),
}
