//! A headless demo: builds a small dungeon, walks the player through it with
//! a scripted list of moves, and prints what they saw.
//!
//! Usage: `crawl-sim [config.json]`. Logging is controlled with `RUST_LOG`.

#![deny(unused)]
#![deny(warnings)]

use std::process;

use crawl_sim::actor::player::MoveCommand;
use crawl_sim::actor::player::WaitCommand;
use crawl_sim::actor::Command;
use crawl_sim::geo::Point;
use crawl_sim::geo::Rect;
use crawl_sim::level::Level;
use crawl_sim::level::LevelKind;
use crawl_sim::level::LightKind;
use crawl_sim::level::LightSource;
use crawl_sim::map::GridMap;
use crawl_sim::schedule::SchedulerState;
use crawl_sim::Scheduler;
use crawl_sim::SimConfig;
use crawl_sim::SimulationContext;

const SCRIPT: &[&str] = &[
  "e", "e", "e", "e", "e", "e", "wait", "s", "s", "s", "e", "e", "e", "e",
  "e", "e", "n", "n", "wait", "wait", "e", "e", "e", "e", "sideways", "e",
];

fn dungeon() -> GridMap {
  let mut map = GridMap::new(40, 16);
  map.add_room(Rect::new(Point::new(0, 0), Point::new(10, 8)));
  map.add_room(Rect::new(Point::new(12, 4), Point::new(24, 14)));
  map.add_room(Rect::new(Point::new(26, 1), Point::new(39, 9)));
  // Corridors joining the rooms.
  map.add_room(Rect::new(Point::new(8, 5), Point::new(14, 8)));
  map.add_room(Rect::new(Point::new(22, 6), Point::new(28, 9)));
  map
}

fn render(ctx: &SimulationContext) -> String {
  let map = crawl_sim::WorldCoordinator::map(ctx);
  let level = ctx.level();
  let bounds = map.bounds();
  let (min, max) = bounds.corners();

  let mut out = String::new();
  for y in min.y()..max.y() {
    for x in min.x()..max.x() {
      let p = Point::new(x, y);
      let glyph = match ctx.roster().occupant(p) {
        Some(id) if level.is_visible(p) => ctx
          .roster()
          .get(id)
          .map_or('?', |a| a.body().sprite.glyph),
        _ if !level.is_seen(p) => ' ',
        _ if map.is_passable(p) => {
          if level.is_visible(p) {
            '.'
          } else {
            ','
          }
        }
        _ => '#',
      };
      out.push(glyph);
    }
    out.push('\n');
  }
  out
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  let config = match std::env::args().nth(1) {
    Some(path) => match SimConfig::load(&path) {
      Ok(config) => config,
      Err(e) => {
        tracing::error!(%path, error = %e, "bad config");
        process::exit(1);
      }
    },
    None => SimConfig::default(),
  };

  let level = Level::new(1, LevelKind::Dungeon).with_lights([
    LightSource::new(Point::new(18, 9), 4, LightKind::Brazier),
    LightSource::new(Point::new(32, 5), 3, LightKind::Torch),
  ]);
  let mut ctx = SimulationContext::new(dungeon(), level, config);
  ctx.spawn_player(Point::new(2, 3));
  ctx.spawn_monster("rat", Point::new(6, 2));
  ctx.spawn_monster("kobold", Point::new(20, 11));
  ctx.spawn_monster("ghoul", Point::new(34, 6));
  ctx.spawn_monster("hound", Point::new(30, 3));
  ctx.update_visibility();

  let mut scheduler = Scheduler::for_roster(ctx.roster());
  scheduler.start(&mut ctx);

  for &step in SCRIPT {
    let cmd: Box<dyn Command> = match step {
      "wait" => Box::new(WaitCommand),
      dir => match MoveCommand::named(dir) {
        Some(m) => Box::new(m),
        None => continue,
      },
    };
    scheduler.queue_player_command(&mut ctx, cmd);
    if scheduler.state() == SchedulerState::Suspended && ctx.roster().player().is_none() {
      break;
    }
  }

  let player = ctx.roster().player().cloned();
  println!("{}", render(&ctx));
  println!("turns: {}", scheduler.current_turn());
  match player {
    Some(p) => println!("hp: {}/{}", p.vitals.hp, p.vitals.max_hp),
    None => println!("you died"),
  }
  println!(
    "seen: {} tiles, visible: {} tiles",
    ctx.level().seen_tiles().len(),
    ctx.level().visible_tiles().len()
  );

  for (system, average, calls) in ctx.timer().report() {
    tracing::info!(
      system,
      calls,
      average_us = average.as_secs_f64() * 1e6,
      "timing"
    );
  }
}
