//! A rule engine for Sprouts, played with axis-aligned polylines.
//!
//! A [`Game`] holds points joined by polylines that only run horizontally
//! and vertically. Each point has room for three connections. A move draws a
//! polyline between two points (or from a point back to itself) and puts a
//! new point somewhere in its middle. After every move, the engine traces the
//! areas enclosed by the polylines and works out which areas lie on each side
//! of every point; two points can be joined exactly when they border a
//! common area, or both touch the outside.
//!
//! The engine doesn't check that a new polyline avoids the existing ones.
//! That's left to whatever produced the polyline.

mod areas;
mod areasets;
mod board;
mod error;
mod game;
mod geom;
mod transaction;

pub use areas::{Area, AreaIdx, HalfEdge};
pub use areasets::{Areaset, AreasetIdx, Areasets, Sides};
pub use board::{Connection, LineIdx, Player, Point, PointIdx};
pub use error::Error;
pub use game::{Freshness, Game, GameOptions, Move, Openings};
pub use geom::{Coord, Direction, Polyline};
