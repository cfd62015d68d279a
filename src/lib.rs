//! The simulation core of a turn-based dungeon crawler.
//!
//! This crate decides whose turn it is ([`schedule`]), what monsters do with
//! their turns ([`actor::ai`]), and what the player can see
//! ([`visibility`]). Map generation, rendering and input are left to the
//! host, which talks to the core through a [`SimulationContext`] and a
//! [`Scheduler`].
//!
//! ```no_run
//! use crawl_sim::actor::player::MoveCommand;
//! use crawl_sim::geo::Dir;
//! use crawl_sim::geo::Point;
//! use crawl_sim::level::Level;
//! use crawl_sim::level::LevelKind;
//! use crawl_sim::map::GridMap;
//! use crawl_sim::SimConfig;
//! use crawl_sim::SimulationContext;
//! use crawl_sim::Scheduler;
//!
//! let map = GridMap::from_ascii(&["#######", "#.....#", "#######"]);
//! let mut ctx = SimulationContext::new(
//!   map,
//!   Level::new(1, LevelKind::Dungeon),
//!   SimConfig::default(),
//! );
//! ctx.spawn_player(Point::new(1, 1));
//! ctx.spawn_monster("rat", Point::new(5, 1));
//!
//! let mut scheduler = Scheduler::for_roster(ctx.roster());
//! scheduler.start(&mut ctx);
//! scheduler.queue_player_command(&mut ctx, Box::new(MoveCommand::new(Dir::E)));
//! ```

#![deny(unused)]
#![deny(warnings)]

pub mod actor;
pub mod combat;
pub mod config;
pub mod error;
pub mod geo;
pub mod level;
pub mod map;
pub mod save;
pub mod schedule;
pub mod timing;
pub mod visibility;
pub mod world;

pub use config::SimConfig;
pub use schedule::Scheduler;
pub use world::SimulationContext;
pub use world::WorldCoordinator;
