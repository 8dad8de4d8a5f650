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

// HINT: The finder never touches terrain or island state directly.
// Islands live in their own managing task, terrain sits behind WorldProbe.
pub mod finder;
pub mod grid;
pub mod location;
pub mod registry;
pub mod settings;
pub mod world;

pub use finder::{DefaultStrategy, NewIslandLocationStrategy, Outcome, PlacementError};
pub use location::{BlockFace, ChunkPos, Location, WorldId};
pub use registry::{Island, Islands, RegistryError};
pub use settings::{ConfigError, PlacementOptions, Settings, WorldConfig, WorldOptions};
pub use world::{BlockId, BlockIds, BlockState, Chunk, MemoryWorld, ProbeError, WorldProbe};
