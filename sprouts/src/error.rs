use derive_more::{Display, Error};

use crate::geom::Coord;

/// Everything that can go wrong when querying or changing a [`Game`](crate::Game).
///
/// None of these leave the board half-changed: a failed move leaves every
/// point, polyline and connection as it was before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Error)]
pub enum Error {
    /// Areas were read after the board changed and before they were recomputed.
    #[display("areas are out of date")]
    AreasOutdated,
    /// The ends of a move don't each land on exactly one point.
    #[display("line endpoints must each match exactly one point")]
    InvalidNode,
    /// The polyline is empty, or isn't made of axis-aligned segments.
    #[display("invalid polyline")]
    InvalidLine,
    /// The middle of a move isn't strictly inside exactly one segment.
    #[display("found {count} positions for middle {middle}")]
    InvalidMiddle { count: usize, middle: Coord },
    /// The points can't be joined without crossing a line.
    #[display("points are not connectable")]
    NotConnectable,
    /// All of a point's connection slots are in use.
    #[display("point at {at} has no free connection slot")]
    PointFull { at: Coord },
    /// [`GameOptions::probe_offset`](crate::GameOptions::probe_offset) must be
    /// at least one.
    #[display("probe offset {offset} must be positive")]
    InvalidProbeOffset { offset: i32 },
}
