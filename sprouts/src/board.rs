use serde::{Deserialize, Serialize};

use crate::{geom::Coord, Error};

/// An index into the point arena of a [`Game`](crate::Game).
///
/// Points are never removed once a move commits, so an index stays valid for
/// the life of the game it came from. (Don't mix indices from different
/// games, including a game and its clone after either has moved.)
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct PointIdx(pub usize);

impl std::fmt::Debug for PointIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p_{}", self.0)
    }
}

/// An index into the polyline arena of a [`Game`](crate::Game).
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct LineIdx(pub usize);

impl std::fmt::Debug for LineIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "l_{}", self.0)
    }
}

/// One occupied connection slot: the polyline leaving a point, and the point
/// at its other end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Connection {
    pub line: LineIdx,
    pub dest: PointIdx,
}

/// A point on the board, with room for three connections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub at: Coord,
    /// Occupied slots are always packed at the front.
    connections: [Option<Connection>; Point::SLOTS],
}

impl Point {
    pub const SLOTS: usize = 3;

    pub fn new(at: Coord) -> Self {
        Point {
            at,
            connections: [None; Point::SLOTS],
        }
    }

    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.connections.iter().flatten().copied()
    }

    pub fn slots(&self) -> &[Option<Connection>; Point::SLOTS] {
        &self.connections
    }

    pub fn degree(&self) -> usize {
        self.connections().count()
    }

    pub fn free_slots(&self) -> usize {
        Point::SLOTS - self.degree()
    }

    /// A dead point has no slot left, so nothing can ever connect to it.
    pub fn is_dead(&self) -> bool {
        self.free_slots() == 0
    }

    /// A loop from a point back to itself takes two slots at once.
    pub fn can_loop(&self) -> bool {
        self.free_slots() >= 2
    }

    pub fn add_connection(&mut self, conn: Connection) -> Result<(), Error> {
        match self.connections.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(conn);
                Ok(())
            }
            None => Err(Error::PointFull { at: self.at }),
        }
    }

    /// Removes `conn` from its slot, moving any later connections up to fill
    /// the gap.
    ///
    /// If `conn` occupies more than one slot (which happens for closed
    /// polylines), only the last one is removed. Returns false if `conn`
    /// wasn't found.
    pub fn remove_connection(&mut self, conn: Connection) -> bool {
        let Some(i) = self.connections.iter().rposition(|slot| *slot == Some(conn)) else {
            return false;
        };
        self.connections[i] = None;
        self.connections[i..].rotate_left(1);
        true
    }
}

/// The two players, in the order they move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    First,
    Second,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }
}
