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
use super::location::Location;

use std::convert::TryFrom;

/// Moves `location` one cell along the island grid.
///
/// The grid is walked as an outward square spiral around x = z = 0, one cell
/// being `2 * distance` blocks wide. The next cell depends only on the sign and
/// relative size of the current x and z, so any starting point joins the spiral.
///
/// Returns `None` once the next cell's area would leave the `i32` coordinate range.
pub fn advance(location: &Location, distance: i32) -> Option<Location> {
    let x = location.x as i64;
    let z = location.z as i64;
    let d = distance as i64 * 2;
    let (dx, dz) = if x < z {
        if -x < z {
            (d, 0)
        } else {
            (0, d)
        }
    } else if x > z {
        if -x >= z {
            (-d, 0)
        } else {
            (0, -d)
        }
    } else if x <= 0 {
        (0, d)
    } else {
        (0, -d)
    };
    let mut next = location.clone();
    next.x = cell_axis(x + dx, distance)?;
    next.z = cell_axis(z + dz, distance)?;
    Some(next)
}

/// A centre coordinate whose whole `[c - distance, c + distance - 1]` span fits in an `i32`.
fn cell_axis(centre: i64, distance: i32) -> Option<i32> {
    let distance = distance as i64;
    i32::try_from(centre - distance).ok()?;
    i32::try_from(centre + distance - 1).ok()?;
    i32::try_from(centre).ok()
}

/// True when the cell around `location` lies entirely inside the coordinate range.
pub fn cell_fits(location: &Location, distance: i32) -> bool {
    cell_axis(location.x as i64, distance).is_some()
        && cell_axis(location.z as i64, distance).is_some()
}

/// The centre of a cell followed by the four corners of its exclusive area.
///
/// The "+" corners sit one block short so neighbouring cells never share a
/// block. Corners are reported at y = 0 and clamped to the coordinate range.
pub fn footprint(location: &Location, distance: i32) -> [Location; 5] {
    let low = |v: i32| v.saturating_sub(distance);
    let high = |v: i32| v.saturating_add(distance - 1);
    let corner = |x: i32, z: i32| Location::new(location.world.clone(), x, 0, z);
    [
        location.clone(),
        corner(low(location.x), low(location.z)),
        corner(low(location.x), high(location.z)),
        corner(high(location.x), low(location.z)),
        corner(high(location.x), high(location.z)),
    ]
}

/// Walk of grid cells, starting with `start` itself. Ends only at the edge of
/// the coordinate range.
pub struct Spiral {
    next: Option<Location>,
    distance: i32,
}
impl Spiral {
    pub fn new(start: Location, distance: i32) -> Self {
        Spiral {
            next: Some(start),
            distance,
        }
    }
}
impl Iterator for Spiral {
    type Item = Location;
    fn next(&mut self) -> Option<Location> {
        let current = self.next.take()?;
        self.next = advance(&current, self.distance);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::WorldId;
    use std::collections::HashSet;

    fn origin() -> Location {
        Location::new(WorldId::new("skyblock"), 0, 120, 0)
    }

    #[test]
    fn first_ring_follows_tie_break_table() {
        let cells: Vec<(i32, i32)> = Spiral::new(origin(), 1)
            .take(10)
            .map(|l| (l.x, l.z))
            .collect();
        assert_eq!(
            cells,
            vec![
                (0, 0),
                (0, 2),
                (2, 2),
                (2, 0),
                (2, -2),
                (0, -2),
                (-2, -2),
                (-2, 0),
                (-2, 2),
                (-2, 4),
            ]
        );
    }

    #[test]
    fn rings_fill_without_revisiting() {
        for distance in [1, 7, 64, 400].iter() {
            let step = distance * 2;
            for rings in 1..6 {
                let side = 2 * rings + 1;
                let cells: HashSet<(i32, i32)> = Spiral::new(origin(), *distance)
                    .take((side * side) as usize)
                    .map(|l| (l.x, l.z))
                    .collect();
                assert_eq!(cells.len(), (side * side) as usize);
                let bound = rings * step;
                assert!(cells.iter().all(|(x, z)| x.abs() <= bound && z.abs() <= bound));
            }
        }
    }

    #[test]
    fn off_grid_start_joins_spiral() {
        let start = origin().with_xz(5, 5);
        let cells: Vec<(i32, i32)> = Spiral::new(start, 50)
            .skip(1)
            .take(3)
            .map(|l| (l.x, l.z))
            .collect();
        assert_eq!(cells, vec![(5, -95), (-95, -95), (-95, 5)]);
    }

    #[test]
    fn advance_keeps_world_and_height() {
        let next = advance(&origin(), 100).unwrap();
        assert_eq!(next.world, WorldId::new("skyblock"));
        assert_eq!(next.y, 120);
        assert_eq!((next.x, next.z), (0, 200));
    }

    #[test]
    fn footprint_is_exclusive() {
        let d = 10;
        let a = footprint(&origin(), d);
        let b = footprint(&advance(&origin(), d).unwrap(), d);
        let corners: Vec<(i32, i32)> = a[1..].iter().map(|l| (l.x, l.z)).collect();
        assert_eq!(corners, vec![(-10, -10), (-10, 9), (9, -10), (9, 9)]);
        assert!(a[1..].iter().all(|l| l.y == 0));
        assert_eq!(a[0].y, 120);
        // neighbour at z = 20 starts at z = 10, right after our last block
        let corners: Vec<(i32, i32)> = b[1..].iter().map(|l| (l.x, l.z)).collect();
        assert_eq!(corners, vec![(-10, 10), (-10, 29), (9, 10), (9, 29)]);
    }

    #[test]
    fn walk_stops_at_coordinate_edge() {
        let distance = i32::MAX / 4;
        let cells: Vec<Location> = Spiral::new(origin(), distance).take(100).collect();
        assert_eq!(cells.len(), 9);
        assert!(cells.iter().all(|c| cell_fits(c, distance)));
        let edge = origin().with_xz(i32::MAX - 5, 0);
        assert!(!cell_fits(&edge, 10));
        assert!(advance(&edge, 10).is_none());
    }

    #[test]
    fn footprint_clamps_at_coordinate_edge() {
        let edge = origin().with_xz(i32::MAX - 5, i32::MIN + 5);
        let a = footprint(&edge, 10);
        assert_eq!((a[3].x, a[3].z), (i32::MAX, i32::MIN));
    }
}
