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
use super::grid;
use super::location::{BlockFace, ChunkPos, Location, WorldId};
use super::registry::{Islands, RegistryError};
use super::settings::{PlacementOptions, WorldConfig, WorldOptions};
use super::world::{Chunk, ProbeError, WorldProbe};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    IslandFound,
    Obstructed,
    Free,
}

#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("could not find a free spot for islands in {world}: blocks around {obstructed} centre locations, {islands_found} known islands")]
    WorldAppearsOccupied {
        world: WorldId,
        obstructed: u32,
        islands_found: u32,
    },
    #[error("world {0} has no island settings")]
    UnknownWorld(WorldId),
    #[error("island grid of {world} ran past the edge of the world after {islands_found} known islands")]
    GridExhausted { world: WorldId, islands_found: u32 },
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Decides where the next island of a world goes.
pub trait NewIslandLocationStrategy: Send + Sync {
    fn next_location<'a>(
        &'a self,
        world: &'a WorldId,
    ) -> BoxFuture<'a, Result<Location, PlacementError>>;
}

struct SearchState {
    island_found: u32,
    obstructed: u32,
    location: Location,
}

/// Walks the island grid outward from the last handed out cell until it finds
/// one with no island and no terrain around its centre.
pub struct DefaultStrategy {
    islands: Islands,
    config: Arc<dyn WorldConfig>,
    probe: Arc<dyn WorldProbe>,
    placement: PlacementOptions,
    world_locks: Mutex<HashMap<WorldId, Arc<Mutex<()>>>>,
}
impl DefaultStrategy {
    pub fn new(
        islands: Islands,
        config: Arc<dyn WorldConfig>,
        probe: Arc<dyn WorldProbe>,
        placement: PlacementOptions,
    ) -> Self {
        DefaultStrategy {
            islands,
            config,
            probe,
            placement,
            world_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn world_lock(&self, world: &WorldId) -> Arc<Mutex<()>> {
        let mut locks = self.world_locks.lock().await;
        locks.entry(world.clone()).or_default().clone()
    }

    /// Finds a free cell and records it as the world's last island location.
    ///
    /// Searches for the same world run one at a time. Each success moves the
    /// world's cursor, so the next search starts one cell further along even
    /// if no island was ever built on the returned cell.
    pub async fn find_next_location(&self, world: &WorldId) -> Result<Location, PlacementError> {
        let options = self
            .config
            .world_options(world)
            .ok_or_else(|| PlacementError::UnknownWorld(world.clone()))?;
        let lock = self.world_lock(world).await;
        let _guard = lock.lock().await;

        let start = match self.islands.get_last(world).await? {
            Some(last) => grid::advance(&last, options.island_distance),
            None => Some(options.start_location(world)),
        };
        let start = start.ok_or_else(|| PlacementError::GridExhausted {
            world: world.clone(),
            islands_found: 0,
        })?;
        let mut state = SearchState {
            island_found: 0,
            obstructed: 0,
            location: start,
        };
        loop {
            let outcome = self.probe(&state.location, &options).await?;
            log::debug!("Cell {} is {:?}", state.location, outcome);
            match outcome {
                Outcome::Free => {
                    self.islands.set_last(state.location.clone()).await?;
                    log::info!(
                        "Found spot for new island at {} after {} known islands and {} obstructed cells",
                        state.location,
                        state.island_found,
                        state.obstructed
                    );
                    return Ok(state.location);
                }
                Outcome::IslandFound => {
                    state.island_found += 1;
                }
                Outcome::Obstructed => {
                    state.obstructed += 1;
                    if state.obstructed >= self.placement.max_obstructions {
                        log::error!("Could not find a free spot for islands in {}! Is this world empty?", world);
                        log::error!(
                            "Blocks around center locations: {} max {}",
                            state.obstructed,
                            self.placement.max_obstructions
                        );
                        log::error!("Known islands: {} max unlimited.", state.island_found);
                        return Err(PlacementError::WorldAppearsOccupied {
                            world: world.clone(),
                            obstructed: state.obstructed,
                            islands_found: state.island_found,
                        });
                    }
                }
            }
            state.location = match grid::advance(&state.location, options.island_distance) {
                Some(next) => next,
                None => {
                    log::error!("Island grid of {} reached the edge of the world!", world);
                    return Err(PlacementError::GridExhausted {
                        world: world.clone(),
                        islands_found: state.island_found,
                    });
                }
            };
        }
    }

    /// Classifies one grid cell.
    pub async fn probe(
        &self,
        location: &Location,
        options: &WorldOptions,
    ) -> Result<Outcome, PlacementError> {
        if self.islands.island_at(location).await?.is_some() {
            return Ok(Outcome::IslandFound);
        }
        let mut generated = false;
        for (idx, point) in grid::footprint(location, options.island_distance)
            .iter()
            .enumerate()
        {
            // centre already checked above
            let claimed = idx > 0 && self.islands.island_at(point).await?.is_some();
            if claimed || self.islands.in_deletion(point).await? {
                return Ok(Outcome::IslandFound);
            }
            if self.probe.is_chunk_generated(point) {
                generated = true;
            }
        }
        // Ungenerated terrain holds nothing.
        if !generated || options.use_own_generator {
            return Ok(Outcome::Free);
        }
        if !self.has_blocks_around(location).await? {
            return Ok(Outcome::Free);
        }
        if self.placement.reserve_obstructed {
            log::warn!("Blocks found around {}, reserving the cell", location);
            self.islands
                .create_island(location.clone(), options.island_distance, true)
                .await?;
        }
        Ok(Outcome::Obstructed)
    }

    async fn has_blocks_around(&self, location: &Location) -> Result<bool, ProbeError> {
        let mut chunks: HashMap<ChunkPos, Chunk> = HashMap::new();
        for face in BlockFace::ALL.iter() {
            let side = location.relative(*face);
            if !self.probe.is_chunk_generated(&side) {
                continue;
            }
            let pos = ChunkPos::of(&side);
            if !chunks.contains_key(&pos) {
                let chunk = self.probe.chunk_at(&side).await?;
                chunks.insert(pos, chunk);
            }
            let block = chunks[&pos].block_at(side.x, side.y, side.z);
            if !block.is_empty() && !block.is_water() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
impl NewIslandLocationStrategy for DefaultStrategy {
    fn next_location<'a>(
        &'a self,
        world: &'a WorldId,
    ) -> BoxFuture<'a, Result<Location, PlacementError>> {
        self.find_next_location(world).boxed()
    }
}
