/*
Skygrid, new-island placement for skyblock-style voxel servers.
Copyright (c) 2021  Galaxtone, Exopteron

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

// Console front end. Drives the finder by hand against an in-memory world,
// one command per line on stdin.
const VERSION: &'static str = env!("CARGO_PKG_VERSION");
use once_cell::sync::Lazy;
use skygrid::grid::Spiral;
use skygrid::settings::{self, Settings};
use skygrid::*;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Builder;

type CommandResult = Result<bool, Box<dyn std::error::Error>>;

static CONFIGURATION: Lazy<Settings> = Lazy::new(|| {
  match Settings::load(Path::new("config.toml")) {
    Ok(s) => {
      settings::init_logger(s.log_filter());
      s
    }
    Err(e) => {
      settings::init_logger(log::LevelFilter::Info);
      log::error!("{}", e);
      std::process::exit(1);
    }
  }
});

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let threads = CONFIGURATION.worker_threads.unwrap_or_else(num_cpus::get);
  log::info!("Starting Skygrid v{}.", VERSION);
  let runtime = match Builder::new_multi_thread().worker_threads(threads).thread_name("skygrid-thread-pool").enable_all().build() {
    Ok(rt) => {
      log::info!("Setting up multithreaded runtime with {} threads.", threads);
      rt
    },
    Err(e) => {
      log::error!("An error occured setting up the tokio runtime. Details: {:?}", e);
      std::process::exit(1);
    }
  };
  runtime.block_on(async {
    let islands = Islands::setup();
    let world = MemoryWorld::new();
    let strategy = DefaultStrategy::new(
      islands.clone(),
      Arc::new(CONFIGURATION.clone()),
      Arc::new(world.clone()),
      CONFIGURATION.placement.clone(),
    );
    log::info!("Ready. Worlds: {:?}", CONFIGURATION.worlds.keys().collect::<Vec<_>>());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
      let args = line.split_whitespace().collect::<Vec<&str>>();
      if args.is_empty() {
        continue;
      }
      match execute_command(&strategy, &islands, &world, &args).await {
        Ok(true) => break,
        Ok(false) => {}
        Err(e) => log::error!("{}", e),
      }
    }
    log::info!("Stopping.");
    Ok::<(), Box<dyn std::error::Error>>(())
  })
}

fn world_options(name: &str) -> Result<(WorldId, WorldOptions), Box<dyn std::error::Error>> {
  let world = WorldId::new(name);
  match CONFIGURATION.world_options(&world) {
    Some(o) => Ok((world, o)),
    None => Err(Box::new(PlacementError::UnknownWorld(world))),
  }
}

fn arg<'a>(args: &[&'a str], idx: usize) -> Result<&'a str, Box<dyn std::error::Error>> {
  args.get(idx).copied().ok_or_else(|| format!("Missing argument {}.", idx).into())
}

async fn execute_command(
  strategy: &DefaultStrategy,
  islands: &Islands,
  world: &MemoryWorld,
  args: &[&str],
) -> CommandResult {
  match args[0] {
    "next" => {
      let (world_id, options) = world_options(arg(args, 1)?)?;
      let location = strategy.next_location(&world_id).await?;
      islands.create_island(location.clone(), options.island_distance, false).await?;
      log::info!("New island at {}", location);
    }
    "preview" => {
      let (world_id, options) = world_options(arg(args, 1)?)?;
      let count = arg(args, 2)?.parse::<usize>()?;
      let from = match islands.get_last(&world_id).await? {
        Some(last) => skygrid::grid::advance(&last, options.island_distance),
        None => Some(options.start_location(&world_id)),
      };
      let from = from.ok_or("Island grid is full.")?;
      for cell in Spiral::new(from, options.island_distance).take(count) {
        log::info!("  {}", cell);
      }
    }
    "islands" => {
      let (world_id, _) = world_options(arg(args, 1)?)?;
      let list = islands.islands(&world_id).await?;
      log::info!("{} islands in {}", list.len(), world_id);
      for island in list {
        log::info!("  {}{}", island.center, if island.reserved { " (reserved)" } else { "" });
      }
    }
    "block" => {
      let (world_id, _) = world_options(arg(args, 1)?)?;
      let x = arg(args, 2)?.parse::<i32>()?;
      let y = arg(args, 3)?.parse::<i32>()?;
      let z = arg(args, 4)?.parse::<i32>()?;
      let id = arg(args, 5)?.parse::<BlockId>()?;
      world.set_block(&Location::new(world_id, x, y, z), id);
    }
    "delete" | "purge" => {
      let (world_id, options) = world_options(arg(args, 1)?)?;
      let x = arg(args, 2)?.parse::<i32>()?;
      let z = arg(args, 3)?.parse::<i32>()?;
      let location = Location::new(world_id, x, options.island_height, z);
      if args[0] == "delete" {
        match islands.delete_island(&location).await? {
          Some(island) => log::info!("Deleting island at {}", island.center),
          None => log::info!("No island at {}", location),
        }
      } else if islands.finish_deletion(&location).await? {
        log::info!("Purged island around {}", location);
      } else {
        log::info!("Nothing pending deletion at {}", location);
      }
    }
    "stop" => return Ok(true),
    other => log::info!("Unknown command {}.", other),
  }
  Ok(false)
}
