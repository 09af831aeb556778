//! Classifying points by the areas around them.
//!
//! Each live point gets two areasets, one for each side of the polylines
//! through it. Two points can be joined exactly when they have a side in
//! common, because then some area (or the unbounded outside) touches both.

use std::collections::HashMap;

use crate::{
    areas::{self, outgoing, Area, AreaIdx},
    board::Point,
    geom::{Coord, Polyline},
};

/// An index into the areasets of the most recent recompute.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct AreasetIdx(pub usize);

impl AreasetIdx {
    /// The empty areaset, for points that aren't inside any area.
    ///
    /// It is registered first by every recompute, so it always has this index.
    pub const DEFAULT: AreasetIdx = AreasetIdx(0);
}

impl std::fmt::Debug for AreasetIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "as_{}", self.0)
    }
}

/// A set of areas, kept sorted and without duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Areaset {
    areas: Vec<AreaIdx>,
}

impl Areaset {
    pub fn areas(&self) -> &[AreaIdx] {
        &self.areas
    }

    pub fn contains(&self, area: AreaIdx) -> bool {
        self.areas.binary_search(&area).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

/// The table of distinct areasets.
///
/// Registering the same set of areas twice gives back the same index, so
/// areasets can be compared by index alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Areasets {
    sets: Vec<Areaset>,
    lookup: HashMap<Vec<AreaIdx>, AreasetIdx>,
}

impl Default for Areasets {
    fn default() -> Self {
        Self::new()
    }
}

impl Areasets {
    pub fn new() -> Self {
        let mut ret = Areasets {
            sets: Vec::new(),
            lookup: HashMap::new(),
        };
        let default = ret.register(Vec::new());
        debug_assert_eq!(default, AreasetIdx::DEFAULT);
        ret
    }

    /// Returns the index of the areaset holding exactly `areas`, adding it to
    /// the table if it's new. The order of `areas` doesn't matter.
    pub fn register(&mut self, mut areas: Vec<AreaIdx>) -> AreasetIdx {
        areas.sort();
        areas.dedup();
        if let Some(idx) = self.lookup.get(&areas) {
            return *idx;
        }

        let idx = AreasetIdx(self.sets.len());
        self.sets.push(Areaset {
            areas: areas.clone(),
        });
        self.lookup.insert(areas, idx);
        idx
    }

    pub fn get(&self, idx: AreasetIdx) -> &Areaset {
        &self.sets[idx.0]
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn as_slice(&self) -> &[Areaset] {
        &self.sets
    }

    pub fn iter(&self) -> impl Iterator<Item = (AreasetIdx, &Areaset)> + '_ {
        self.sets.iter().enumerate().map(|(i, s)| (AreasetIdx(i), s))
    }
}

/// The areasets on the two sides of a live point.
///
/// For a point with fewer than two connections there is only one side, and
/// both entries are the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Sides(pub [AreasetIdx; 2]);

impl Sides {
    /// Do these two points border a common areaset?
    pub fn shares(&self, other: &Sides) -> bool {
        self.0.iter().any(|s| other.0.contains(s))
    }
}

/// The two coordinates we test to find out what's on either side of `point`,
/// or `None` if the point is dead.
///
/// With no orientation yet, both probes sit on the point itself. Through a
/// straight point, they step `k` off each side of the line. At a corner, one
/// steps diagonally into the angle and the other diagonally out of it.
/// Near the edge of the `i32` range the steps are clamped.
pub(crate) fn probes(point: &Point, lines: &[Polyline], k: i32) -> Option<[Coord; 2]> {
    let out = outgoing(point, lines);
    match out.as_slice() {
        [] | [_] => Some([point.at, point.at]),
        [(h1, _), (h2, _)] => {
            let d1 = h1.leaving(lines);
            let d2 = h2.leaving(lines);
            if d1 == d2 || d1 == d2.opposite() {
                if d1.is_vertical() {
                    Some([point.at.offset(-k, 0), point.at.offset(k, 0)])
                } else {
                    Some([point.at.offset(0, -k), point.at.offset(0, k)])
                }
            } else {
                let (dx1, dy1) = d1.delta();
                let (dx2, dy2) = d2.delta();
                let (dx, dy) = ((dx1 + dx2).saturating_mul(k), (dy1 + dy2).saturating_mul(k));
                Some([
                    point.at.offset(dx, dy),
                    point.at.offset(dx.saturating_neg(), dy.saturating_neg()),
                ])
            }
        }
        _ => None,
    }
}

/// Everything derived from the board by a recompute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Regions {
    pub areas: Vec<Area>,
    pub areasets: Areasets,
    /// Indexed by point; `None` for dead points.
    pub sides: Vec<Option<Sides>>,
}

impl Regions {
    /// The regions of a board with no points on it.
    pub fn empty() -> Self {
        Regions {
            areas: Vec::new(),
            areasets: Areasets::new(),
            sides: Vec::new(),
        }
    }

    pub fn compute(points: &[Point], lines: &[Polyline], probe_offset: i32) -> Self {
        let areas = areas::discover(points, lines);
        let mut areasets = Areasets::new();

        let mut classify = |at: Coord| {
            let holding = areas
                .iter()
                .enumerate()
                .filter(|(_, a)| a.contains(lines, at))
                .map(|(i, _)| AreaIdx(i))
                .collect();
            areasets.register(holding)
        };

        let sides = points
            .iter()
            .map(|p| {
                let [a, b] = probes(p, lines, probe_offset)?;
                let side_a = classify(a);
                let side_b = if a == b { side_a } else { classify(b) };
                Some(Sides([side_a, side_b]))
            })
            .collect();

        Regions {
            areas,
            areasets,
            sides,
        }
    }
}
