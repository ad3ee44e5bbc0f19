//! Hex-grid locations.
//!
//! The map uses columns of hexes where every odd column sits half a tile
//! lower than its even neighbours. Moving north-east from an even column
//! therefore also moves one row up, while moving north-east from an odd
//! column stays in the same row.

use std::any::Any;
use std::fmt;

use crate::callable::{Callable, FormulaInput};
use crate::value::Value;

/// A tile coordinate, exposed to formulas as an object with `x`, `y` and
/// `valid` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Location {
    pub x: i64,
    pub y: i64,
}

/// The six neighbours of a hex, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::NorthWest,
    ];
}

fn is_even(n: i64) -> bool {
    n.rem_euclid(2) == 0
}

impl Location {
    pub fn new(x: i64, y: i64) -> Self {
        Location { x, y }
    }

    /// On-map coordinates are non-negative.
    pub fn valid(&self) -> bool {
        self.x >= 0 && self.y >= 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Callable for Location {
    fn get(&self, key: &str) -> Value {
        match key {
            "x" => Value::Integer(self.x),
            "y" => Value::Integer(self.y),
            "valid" => Value::from(self.valid()),
            _ => Value::default(),
        }
    }

    fn inputs(&self) -> Vec<FormulaInput> {
        ["x", "y", "valid"]
            .into_iter()
            .map(FormulaInput::read_only)
            .collect()
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

/// Number of steps between two tiles.
///
/// # Examples
///
/// ```
/// use formula_lang::hex::{Location, distance_between};
///
/// assert_eq!(distance_between(Location::new(0, 0), Location::new(1, 0)), 1);
/// assert_eq!(distance_between(Location::new(0, 0), Location::new(1, 1)), 2);
/// ```
pub fn distance_between(a: Location, b: Location) -> i64 {
    checked_distance_between(a, b).unwrap_or(i64::MAX)
}

/// Like [`distance_between`], but `None` when the distance does not fit in
/// an `i64`.
pub fn checked_distance_between(a: Location, b: Location) -> Option<i64> {
    let hdistance = (i128::from(a.x) - i128::from(b.x)).abs();
    let vdistance = (i128::from(a.y) - i128::from(b.y)).abs();

    // Columns of different parity are offset by half a tile; crossing from
    // the lower half-row to the higher one costs an extra step.
    let vpenalty = if (is_even(a.x) && !is_even(b.x) && a.y < b.y)
        || (is_even(b.x) && !is_even(a.x) && b.y < a.y)
    {
        1
    } else {
        0
    };

    i64::try_from(hdistance.max(vdistance + vpenalty + hdistance / 2)).ok()
}

/// The neighbouring tile in `dir`. Coordinates saturate at the `i64`
/// bounds; see [`checked_tile_in_direction`].
pub fn tile_in_direction(loc: Location, dir: Direction) -> Location {
    let (dx, dy) = step(loc, dir);
    Location::new(loc.x.saturating_add(dx), loc.y.saturating_add(dy))
}

/// The neighbouring tile in `dir`, or `None` off the edge of `i64`.
pub fn checked_tile_in_direction(loc: Location, dir: Direction) -> Option<Location> {
    let (dx, dy) = step(loc, dir);
    Some(Location::new(loc.x.checked_add(dx)?, loc.y.checked_add(dy)?))
}

fn step(loc: Location, dir: Direction) -> (i64, i64) {
    let even = i64::from(is_even(loc.x));
    let odd = 1 - even;
    match dir {
        Direction::North => (0, -1),
        Direction::NorthEast => (1, -even),
        Direction::SouthEast => (1, odd),
        Direction::South => (0, 1),
        Direction::SouthWest => (-1, odd),
        Direction::NorthWest => (-1, -even),
    }
}

/// The six neighbours of `loc`, in [`Direction::ALL`] order.
pub fn adjacent_tiles(loc: Location) -> [Location; 6] {
    Direction::ALL.map(|dir| tile_in_direction(loc, dir))
}

pub fn tiles_adjacent(a: Location, b: Location) -> bool {
    distance_between(a, b) == 1
}

/// Every tile exactly `radius` steps from `center`, walking the ring
/// clockwise from its north-west corner.
pub fn tile_ring(center: Location, radius: u32) -> Vec<Location> {
    if radius == 0 {
        return vec![center];
    }

    let mut current = center;
    for _ in 0..radius {
        current = tile_in_direction(current, Direction::SouthWest);
    }

    let mut ring = Vec::with_capacity(6 * radius as usize);
    for dir in Direction::ALL {
        for _ in 0..radius {
            ring.push(current);
            current = tile_in_direction(current, dir);
        }
    }
    ring
}

/// Every tile within `radius` steps of `center`, innermost ring first.
pub fn tiles_in_radius(center: Location, radius: u32) -> Vec<Location> {
    (0..=radius)
        .flat_map(|r| tile_ring(center, r))
        .collect()
}
