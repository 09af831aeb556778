use serde::{Deserialize, Serialize};

use crate::Error;

/// A position on the board.
///
/// Coordinates follow the screen convention: `x` grows to the right and `y`
/// grows downwards, so [`Direction::Up`] decreases `y`.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Shifts by `(dx, dy)`, stopping at the edge of the `i32` range.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Coord {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Moves `dist` steps in the given direction.
    pub fn step(self, dir: Direction, dist: i32) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx.saturating_mul(dist), dy.saturating_mul(dist))
    }
}

impl From<(i32, i32)> for Coord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Debug for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the four cardinal openings of a point.
///
/// The declaration order is clockwise as seen on screen, and the rotation
/// used when tracing areas relies on it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// The direction a straight segment from `from` to `to` travels in.
    ///
    /// Returns `None` unless the two coordinates differ in exactly one axis.
    pub fn between(from: Coord, to: Coord) -> Option<Direction> {
        match (from.x == to.x, from.y == to.y) {
            (true, false) if to.y < from.y => Some(Direction::Up),
            (true, false) => Some(Direction::Down),
            (false, true) if to.x < from.x => Some(Direction::Left),
            (false, true) => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn clockwise(self) -> Direction {
        Direction::ALL[(self.rank() + 1) % 4]
    }

    pub fn opposite(self) -> Direction {
        Direction::ALL[(self.rank() + 2) % 4]
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Position in the clockwise order, starting from [`Direction::Up`].
    pub fn rank(self) -> usize {
        self as usize
    }
}

/// Returns true if `m` lies on the segment from `p` to `q` and is not one of
/// its endpoints.
fn strictly_inside(p: Coord, q: Coord, m: Coord) -> bool {
    let between = |v: i32, a: i32, b: i32| a.min(b) < v && v < a.max(b);
    (m.y == p.y && p.y == q.y && between(m.x, p.x, q.x))
        || (m.x == p.x && p.x == q.x && between(m.y, p.y, q.y))
}

/// A chain of axis-aligned segments.
///
/// There are always at least two coordinates, and every consecutive pair
/// differs in exactly one axis. Stored polylines are never modified.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coord>", into = "Vec<Coord>")]
pub struct Polyline {
    coords: Vec<Coord>,
}

impl Polyline {
    pub fn new(coords: Vec<Coord>) -> Result<Self, Error> {
        if coords.len() < 2
            || coords
                .windows(2)
                .any(|pair| Direction::between(pair[0], pair[1]).is_none())
        {
            return Err(Error::InvalidLine);
        }
        Ok(Polyline { coords })
    }

    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    pub fn first(&self) -> Coord {
        self.coords[0]
    }

    pub fn last(&self) -> Coord {
        self.coords[self.coords.len() - 1]
    }

    pub fn is_closed(&self) -> bool {
        self.first() == self.last()
    }

    /// All the segments, in order, as `(start, end)` pairs.
    pub fn segments(&self) -> impl Iterator<Item = (Coord, Coord)> + '_ {
        self.coords.windows(2).map(|pair| (pair[0], pair[1]))
    }

    pub fn reversed(&self) -> Polyline {
        let mut coords = self.coords.clone();
        coords.reverse();
        Polyline { coords }
    }

    /// The direction this polyline leaves its first coordinate in or, if
    /// `from_last` is set, the direction it leaves its last coordinate in
    /// when walked backwards.
    pub fn leaving_direction(&self, from_last: bool) -> Direction {
        let n = self.coords.len();
        let (from, to) = if from_last {
            (self.coords[n - 1], self.coords[n - 2])
        } else {
            (self.coords[0], self.coords[1])
        };
        // unwrap: consecutive coordinates were checked on construction.
        Direction::between(from, to).unwrap()
    }

    /// Splits this polyline in two at `middle`, which must lie strictly
    /// inside exactly one segment.
    ///
    /// The first half runs from our first coordinate to `middle`; the second
    /// half runs from `middle` to our last coordinate.
    pub fn split_at(&self, middle: Coord) -> Result<(Polyline, Polyline), Error> {
        let mut count = 0;
        let mut first = vec![self.first()];
        let mut second = Vec::new();

        for (p, q) in self.segments() {
            if strictly_inside(p, q, middle) {
                count += 1;
                first.push(middle);
                second.push(middle);
                second.push(q);
            } else if count == 0 {
                first.push(q);
            } else {
                second.push(q);
            }
        }

        // A middle on a corner is rejected here too: it is never strictly
        // inside either of the segments that meet there.
        if count != 1 {
            return Err(Error::InvalidMiddle { count, middle });
        }
        Ok((Polyline { coords: first }, Polyline { coords: second }))
    }

    /// A reasonable place to split this polyline: the middle of its longest
    /// segment (the first one, if there are several).
    ///
    /// Returns `None` if the longest segment is too short to have a lattice
    /// point strictly inside it.
    pub fn find_middle(&self) -> Option<Coord> {
        let len = |(p, q): (Coord, Coord)| {
            (i64::from(p.x) - i64::from(q.x)).abs() + (i64::from(p.y) - i64::from(q.y)).abs()
        };
        let mut longest = self.segments().next()?;
        for seg in self.segments().skip(1) {
            if len(seg) > len(longest) {
                longest = seg;
            }
        }

        let (p, q) = longest;
        let mid = |a: i32, b: i32| {
            // unwrap: the mean of two i32s is an i32
            i32::try_from((i64::from(a) + i64::from(b)) / 2).unwrap()
        };
        let middle = Coord::new(mid(p.x, q.x), mid(p.y, q.y));
        strictly_inside(p, q, middle).then_some(middle)
    }
}

impl TryFrom<Vec<Coord>> for Polyline {
    type Error = Error;

    fn try_from(coords: Vec<Coord>) -> Result<Self, Error> {
        Polyline::new(coords)
    }
}

impl From<Polyline> for Vec<Coord> {
    fn from(line: Polyline) -> Self {
        line.coords
    }
}

impl std::fmt::Debug for Polyline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::fmt::Display for Polyline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, c) in self.coords.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
