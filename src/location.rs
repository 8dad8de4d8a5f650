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
use num_integer::Integer;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldId(String);
impl WorldId {
    pub fn new(name: &str) -> Self {
        WorldId(name.to_string())
    }
    pub fn name(&self) -> &str {
        &self.0
    }
}
impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A block position inside a named world.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub world: WorldId,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockFace {
    North,
    South,
    East,
    West,
    Up,
    Down,
}
impl BlockFace {
    pub const ALL: [BlockFace; 6] = [
        BlockFace::North,
        BlockFace::South,
        BlockFace::East,
        BlockFace::West,
        BlockFace::Up,
        BlockFace::Down,
    ];
    fn offsets(&self) -> (i32, i32, i32) {
        match self {
            BlockFace::North => (0, 0, -1),
            BlockFace::South => (0, 0, 1),
            BlockFace::East => (1, 0, 0),
            BlockFace::West => (-1, 0, 0),
            BlockFace::Up => (0, 1, 0),
            BlockFace::Down => (0, -1, 0),
        }
    }
}
impl Location {
    pub fn new(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Location { world, x, y, z }
    }
    pub fn with_xz(&self, dx: i32, dz: i32) -> Location {
        let mut a = self.clone();
        a.x += dx;
        a.z += dz;
        a
    }
    pub fn relative(&self, face: BlockFace) -> Location {
        let (dx, dy, dz) = face.offsets();
        let mut a = self.with_xz(dx, dz);
        a.y += dy;
        a
    }
}
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

pub const CHUNK_SIZE: i32 = 16;
/// Column of 16x16 blocks, full height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}
impl ChunkPos {
    pub fn of(location: &Location) -> Self {
        ChunkPos {
            x: Integer::div_floor(&location.x, &CHUNK_SIZE),
            z: Integer::div_floor(&location.z, &CHUNK_SIZE),
        }
    }
}
impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(x: i32, y: i32, z: i32) -> Location {
        Location::new(WorldId::new("skyblock"), x, y, z)
    }

    #[test]
    fn chunk_of_negative_coordinates_rounds_down() {
        assert_eq!(ChunkPos::of(&loc(-1, 64, -16)), ChunkPos { x: -1, z: -1 });
        assert_eq!(ChunkPos::of(&loc(-17, 64, 15)), ChunkPos { x: -2, z: 0 });
        assert_eq!(ChunkPos::of(&loc(16, 0, 0)), ChunkPos { x: 1, z: 0 });
    }

    #[test]
    fn relative_covers_all_six_neighbours() {
        let origin = loc(0, 64, 0);
        let mut seen: Vec<Location> = BlockFace::ALL.iter().map(|f| origin.relative(*f)).collect();
        seen.sort_by_key(|l| (l.x, l.y, l.z));
        seen.dedup();
        assert_eq!(seen.len(), 6);
        assert!(seen.contains(&loc(0, 65, 0)));
        assert!(seen.contains(&loc(0, 63, 0)));
        assert!(seen.contains(&loc(-1, 64, 0)));
    }

    #[test]
    fn locations_in_different_worlds_differ() {
        let a = loc(5, 64, 5);
        let b = Location::new(WorldId::new("nether"), 5, 64, 5);
        assert_ne!(a, b);
    }
}
