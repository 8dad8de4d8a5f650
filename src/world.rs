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
use super::location::{ChunkPos, Location, WorldId, CHUNK_SIZE};
use futures::future::{BoxFuture, FutureExt};
use num_integer::Integer;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub type BlockId = u8;
// Being used as a PSUEDO-Enum
#[allow(non_snake_case)]
pub mod BlockIds {
    use super::BlockId;
    pub const AIR: BlockId = 0;
    pub const STONE: BlockId = 1;
    pub const GRASS: BlockId = 2;
    pub const DIRT: BlockId = 3;
    pub const COBBLESTONE: BlockId = 4;
    pub const PLANKS: BlockId = 5;
    pub const WATER: BlockId = 8;
    pub const STILL_WATER: BlockId = 9;
    pub const SAND: BlockId = 12;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockState {
    pub id: BlockId,
}
impl BlockState {
    pub fn is_empty(&self) -> bool {
        self.id == BlockIds::AIR
    }
    pub fn is_water(&self) -> bool {
        self.id == BlockIds::WATER || self.id == BlockIds::STILL_WATER
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("chunk {0} is not available")]
    ChunkUnavailable(ChunkPos),
    #[error("chunk load failed: {0}")]
    LoadFailed(String),
}

/// A generated column of terrain. Blocks that were never set read as air.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub pos: ChunkPos,
    blocks: HashMap<(i32, i32, i32), BlockId>,
}
impl Chunk {
    pub fn new(pos: ChunkPos) -> Self {
        Chunk {
            pos,
            blocks: HashMap::new(),
        }
    }
    fn local(x: i32, y: i32, z: i32) -> (i32, i32, i32) {
        (
            Integer::mod_floor(&x, &CHUNK_SIZE),
            y,
            Integer::mod_floor(&z, &CHUNK_SIZE),
        )
    }
    /// Coordinates are world coordinates; only the in-chunk part is used.
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> BlockState {
        let id = self
            .blocks
            .get(&Self::local(x, y, z))
            .copied()
            .unwrap_or(BlockIds::AIR);
        BlockState { id }
    }
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        let key = Self::local(x, y, z);
        if id == BlockIds::AIR {
            self.blocks.remove(&key);
        } else {
            self.blocks.insert(key, id);
        }
    }
}

/// Read access to world terrain.
pub trait WorldProbe: Send + Sync {
    fn is_chunk_generated(&self, location: &Location) -> bool;
    /// Loads the chunk containing `location`. Resolves once the load completes.
    fn chunk_at(&self, location: &Location) -> BoxFuture<'static, Result<Chunk, ProbeError>>;
}

type ChunkMap = HashMap<WorldId, HashMap<ChunkPos, Chunk>>;

/// Terrain kept in memory, shared between clones.
#[derive(Clone, Default)]
pub struct MemoryWorld {
    chunks: Arc<RwLock<ChunkMap>>,
}
impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn generate(&self, world: &WorldId, chunk: Chunk) {
        if let Ok(mut chunks) = self.chunks.write() {
            chunks
                .entry(world.clone())
                .or_insert_with(HashMap::new)
                .insert(chunk.pos, chunk);
        } else {
            log::error!("Chunk storage poisoned, dropping chunk {}", chunk.pos);
        }
    }
    /// Sets a block, generating its chunk first if needed.
    pub fn set_block(&self, location: &Location, id: BlockId) {
        if let Ok(mut chunks) = self.chunks.write() {
            let pos = ChunkPos::of(location);
            chunks
                .entry(location.world.clone())
                .or_insert_with(HashMap::new)
                .entry(pos)
                .or_insert_with(|| Chunk::new(pos))
                .set_block(location.x, location.y, location.z, id);
        } else {
            log::error!("Chunk storage poisoned, dropping block at {}", location);
        }
    }
}
impl WorldProbe for MemoryWorld {
    fn is_chunk_generated(&self, location: &Location) -> bool {
        let pos = ChunkPos::of(location);
        self.chunks
            .read()
            .map(|chunks| {
                chunks
                    .get(&location.world)
                    .map_or(false, |w| w.contains_key(&pos))
            })
            .unwrap_or(false)
    }
    fn chunk_at(&self, location: &Location) -> BoxFuture<'static, Result<Chunk, ProbeError>> {
        let chunks = self.chunks.clone();
        let world = location.world.clone();
        let pos = ChunkPos::of(location);
        async move {
            let loaded = tokio::task::spawn_blocking(move || {
                let chunks = chunks
                    .read()
                    .map_err(|_| ProbeError::LoadFailed("chunk storage poisoned".to_string()))?;
                chunks
                    .get(&world)
                    .and_then(|w| w.get(&pos))
                    .cloned()
                    .ok_or(ProbeError::ChunkUnavailable(pos))
            })
            .await;
            match loaded {
                Ok(res) => res,
                Err(e) => Err(ProbeError::LoadFailed(e.to_string())),
            }
        }
        .boxed()
    }
}
