//! Finding the bounded areas of the board.
//!
//! Every polyline that is connected at both ends gives two half-edges, one in
//! each direction. Around each point, the half-edges leaving it are ordered
//! clockwise by the direction they leave in. Following a half-edge to the
//! point it arrives at and then taking the half-edge just counterclockwise of
//! the one pointing back along it (that is, turning as far right as possible)
//! walks a closed cycle, and every half-edge lies on exactly one such cycle.
//!
//! Walking this way keeps the enclosed face on the right, so (in screen
//! coordinates, where `y` grows downwards) the cycles around bounded faces
//! have a positive shoelace sum. The cycle around the outside of each
//! connected piece has a negative sum, and walks that only go up and back
//! along trees have a sum of zero; neither kind is an area.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::{
    board::{LineIdx, Point, PointIdx},
    geom::{Coord, Direction, Polyline},
};

/// An index into the areas of the most recent recompute.
///
/// Area indices are only meaningful until the board next changes.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct AreaIdx(pub usize);

impl std::fmt::Debug for AreaIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a_{}", self.0)
    }
}

/// A polyline, walked in one of its two directions.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HalfEdge {
    pub line: LineIdx,
    /// If true, we walk from the polyline's last coordinate to its first.
    pub reversed: bool,
}

impl HalfEdge {
    pub fn twin(self) -> Self {
        Self {
            line: self.line,
            reversed: !self.reversed,
        }
    }

    /// The direction we set off in.
    pub fn leaving(self, lines: &[Polyline]) -> Direction {
        lines[self.line.0].leaving_direction(self.reversed)
    }

    /// The coordinates of the polyline, in the order we walk them.
    pub fn coords(self, lines: &[Polyline]) -> impl Iterator<Item = Coord> + '_ {
        let coords = lines[self.line.0].coords();
        let n = coords.len();
        (0..n).map(move |i| {
            if self.reversed {
                coords[n - 1 - i]
            } else {
                coords[i]
            }
        })
    }
}

impl std::fmt::Debug for HalfEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.reversed {
            write!(f, "l_{}<-", self.line.0)
        } else {
            write!(f, "l_{}->", self.line.0)
        }
    }
}

/// The half-edges leaving a point, one for each occupied slot, in slot order.
///
/// Each comes with the point at its far end.
pub(crate) fn outgoing(point: &Point, lines: &[Polyline]) -> Vec<(HalfEdge, PointIdx)> {
    let mut ret: Vec<(HalfEdge, PointIdx)> = Vec::with_capacity(Point::SLOTS);
    for conn in point.connections() {
        let line = &lines[conn.line.0];
        let reversed = if line.is_closed() {
            // Both ends of a closed polyline are on this point. The first
            // slot holding it sets off forwards and the second backwards.
            ret.iter().any(|(h, _)| h.line == conn.line)
        } else {
            line.first() != point.at
        };
        ret.push((
            HalfEdge {
                line: conn.line,
                reversed,
            },
            conn.dest,
        ));
    }
    ret
}

/// A bounded face of the board, given by the closed walk around its boundary.
///
/// The boundary may visit a polyline twice (once in each direction) when a
/// tree of polylines hangs into the face.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Area {
    edges: Vec<HalfEdge>,
}

impl Area {
    pub fn edges(&self) -> &[HalfEdge] {
        &self.edges
    }

    /// The coordinates visited by walking the boundary once, finishing back at
    /// the start.
    pub fn boundary(&self, lines: &[Polyline]) -> Vec<Coord> {
        let mut ret = Vec::new();
        for (i, h) in self.edges.iter().enumerate() {
            // Each half-edge starts where the previous one ended.
            ret.extend(h.coords(lines).skip(usize::from(i > 0)));
        }
        ret
    }

    /// Twice the signed area enclosed by the walk.
    ///
    /// This is positive for bounded faces, and zero or negative for every
    /// other cycle. Each term fits in an `i64`, but their sum might not.
    pub fn signed_area2(&self, lines: &[Polyline]) -> i128 {
        let mut sum = 0;
        for h in &self.edges {
            let coords: Vec<_> = h.coords(lines).collect();
            for pair in coords.windows(2) {
                let (p, q) = (pair[0], pair[1]);
                sum += i128::from(p.x) * i128::from(q.y) - i128::from(q.x) * i128::from(p.y);
            }
        }
        sum
    }

    /// Is `at` inside this area?
    ///
    /// We cast a ray from `at` towards negative `x` and count the vertical
    /// boundary segments it crosses. Since segments are axis-aligned, that's
    /// the only kind of segment we can cross. `at` must not be on the
    /// boundary itself.
    pub fn contains(&self, lines: &[Polyline], at: Coord) -> bool {
        let mut crossings = 0;
        for h in &self.edges {
            for (p, q) in lines[h.line.0].segments() {
                if p.x == q.x && p.x < at.x {
                    let min_y = p.y.min(q.y);
                    let max_y = p.y.max(q.y);
                    // Half-open, so that a vertex shared by two segments is
                    // only crossed once.
                    if min_y < at.y && at.y <= max_y {
                        crossings += 1;
                    }
                }
            }
        }
        crossings % 2 == 1
    }
}

/// Traces every cycle on the board and returns the bounded ones.
///
/// The walk starts from each point in index order and from each of its
/// half-edges in slot order, so recomputing an unchanged board gives exactly
/// the same areas in the same order.
pub(crate) fn discover(points: &[Point], lines: &[Polyline]) -> Vec<Area> {
    // For each half-edge, the point it leaves from.
    let mut origin = HashMap::new();
    // For each point, the half-edges leaving it in clockwise order.
    let mut rotation = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        let mut around: Vec<HalfEdge> = outgoing(p, lines).into_iter().map(|(h, _)| h).collect();
        for h in &around {
            origin.insert(*h, PointIdx(i));
        }
        // Stable, so half-edges leaving in the same direction stay in slot order.
        around.sort_by_key(|h| h.leaving(lines).rank());
        rotation.push(around);
    }

    let next = |h: HalfEdge| -> Option<HalfEdge> {
        let back = h.twin();
        let around: &Vec<HalfEdge> = &rotation[origin.get(&back)?.0];
        let pos = around.iter().position(|e| *e == back)?;
        Some(around[(pos + around.len() - 1) % around.len()])
    };

    let mut visited = HashSet::new();
    let mut areas = Vec::new();
    for p in points {
        for (start, _) in outgoing(p, lines) {
            if visited.contains(&start) {
                continue;
            }

            let mut edges = Vec::new();
            let mut cur = start;
            let closed = loop {
                visited.insert(cur);
                edges.push(cur);
                match next(cur) {
                    Some(n) if n == start => break true,
                    Some(n) if !visited.contains(&n) => cur = n,
                    // The connections don't agree with the polylines they
                    // name, so there's no cycle to find here.
                    _ => break false,
                }
            };

            let area = Area { edges };
            let area2 = area.signed_area2(lines);
            trace!(edges = ?area.edges, %area2, closed, "traced cycle");
            if closed && area2 > 0 {
                areas.push(area);
            }
        }
    }
    areas
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::board::Connection;

    /// Builds a board with a point at each of `coords`, and joins pairs of
    /// them (given by index) with the given polylines.
    pub fn board(
        coords: &[(i32, i32)],
        joins: &[(usize, usize, &[(i32, i32)])],
    ) -> (Vec<Point>, Vec<Polyline>) {
        let mut points: Vec<_> = coords.iter().map(|&c| Point::new(c.into())).collect();
        let mut lines = Vec::new();
        for (a, b, line) in joins {
            let idx = LineIdx(lines.len());
            lines.push(Polyline::new(line.iter().map(|&c| c.into()).collect()).unwrap());
            points[*a]
                .add_connection(Connection {
                    line: idx,
                    dest: PointIdx(*b),
                })
                .unwrap();
            points[*b]
                .add_connection(Connection {
                    line: idx,
                    dest: PointIdx(*a),
                })
                .unwrap();
        }
        (points, lines)
    }

    pub fn square() -> (Vec<Point>, Vec<Polyline>) {
        board(
            &[(0, 0), (0, 10), (10, 10), (10, 0)],
            &[
                (0, 1, &[(0, 0), (0, 10)]),
                (1, 2, &[(0, 10), (10, 10)]),
                (2, 3, &[(10, 10), (10, 0)]),
                (3, 0, &[(10, 0), (0, 0)]),
            ],
        )
    }

    #[test]
    fn square_has_one_area() {
        let (points, lines) = square();
        let areas = discover(&points, &lines);
        assert_eq!(areas.len(), 1);

        let area = &areas[0];
        assert_eq!(area.edges().len(), 4);
        assert_eq!(area.signed_area2(&lines), 200);
        assert!(area.contains(&lines, Coord::new(5, 5)));
        assert!(!area.contains(&lines, Coord::new(15, 5)));
        assert!(!area.contains(&lines, Coord::new(-5, 5)));
        assert!(!area.contains(&lines, Coord::new(5, 15)));

        let boundary = area.boundary(&lines);
        assert_eq!(boundary.len(), 5);
        assert_eq!(boundary.first(), boundary.last());
    }

    #[test]
    fn tracing_is_repeatable() {
        let (points, lines) = square();
        assert_eq!(discover(&points, &lines), discover(&points, &lines));
    }

    #[test]
    fn trees_have_no_areas() {
        let (points, lines) = board(
            &[(0, 0), (10, 0), (10, 10)],
            &[
                (0, 1, &[(0, 0), (10, 0)]),
                (1, 2, &[(10, 0), (10, 10)]),
            ],
        );
        assert!(discover(&points, &lines).is_empty());
    }

    #[test]
    fn loop_through_two_points() {
        // The two halves of a loop from (0, 0), split at (5, -10).
        let (points, lines) = board(
            &[(0, 0), (5, -10)],
            &[
                (0, 1, &[(0, 0), (0, -10), (5, -10)]),
                (1, 0, &[(5, -10), (10, -10), (10, 0), (0, 0)]),
            ],
        );
        let areas = discover(&points, &lines);
        assert_eq!(areas.len(), 1);
        assert!(areas[0].contains(&lines, Coord::new(1, -1)));
        assert!(!areas[0].contains(&lines, Coord::new(-1, 1)));
    }

    #[test]
    fn closed_polyline_on_one_point() {
        let (points, lines) = board(
            &[(0, 0)],
            &[(0, 0, &[(0, 0), (0, -10), (10, -10), (10, 0), (0, 0)])],
        );
        let areas = discover(&points, &lines);
        assert_eq!(areas.len(), 1);
        assert!(areas[0].contains(&lines, Coord::new(5, -5)));
    }

    #[test]
    fn two_squares_sharing_an_edge() {
        let (points, lines) = board(
            &[(0, 0), (10, 0), (20, 0), (0, 10), (10, 10), (20, 10)],
            &[
                (0, 1, &[(0, 0), (10, 0)]),
                (1, 2, &[(10, 0), (20, 0)]),
                (2, 5, &[(20, 0), (20, 10)]),
                (5, 4, &[(20, 10), (10, 10)]),
                (4, 3, &[(10, 10), (0, 10)]),
                (3, 0, &[(0, 10), (0, 0)]),
                (1, 4, &[(10, 0), (10, 10)]),
            ],
        );
        let areas = discover(&points, &lines);
        assert_eq!(areas.len(), 2);

        let holding = |at: Coord| areas.iter().filter(|a| a.contains(&lines, at)).count();
        assert_eq!(holding(Coord::new(5, 5)), 1);
        assert_eq!(holding(Coord::new(15, 5)), 1);
        assert_eq!(holding(Coord::new(25, 5)), 0);
        assert_ne!(
            areas[0].contains(&lines, Coord::new(5, 5)),
            areas[1].contains(&lines, Coord::new(5, 5))
        );
    }

    #[test]
    fn dangling_edges_cancel_out() {
        // A square with a stub poking in from its left side.
        let (points, lines) = board(
            &[(0, 0), (0, 10), (10, 10), (10, 0), (0, 5), (5, 5)],
            &[
                (0, 4, &[(0, 0), (0, 5)]),
                (4, 1, &[(0, 5), (0, 10)]),
                (1, 2, &[(0, 10), (10, 10)]),
                (2, 3, &[(10, 10), (10, 0)]),
                (3, 0, &[(10, 0), (0, 0)]),
                (4, 5, &[(0, 5), (5, 5)]),
            ],
        );
        let areas = discover(&points, &lines);
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].edges().len(), 7);
        assert!(areas[0].contains(&lines, Coord::new(8, 2)));
        assert!(areas[0].contains(&lines, Coord::new(3, 7)));
    }

    #[test]
    fn ray_through_a_vertex() {
        // An L-shape, walked clockwise on screen.
        let lines = vec![Polyline::new(
            [(0, 0), (20, 0), (20, 10), (10, 10), (10, 20), (0, 20), (0, 0)]
                .into_iter()
                .map(Coord::from)
                .collect(),
        )
        .unwrap()];
        let area = Area {
            edges: vec![HalfEdge {
                line: LineIdx(0),
                reversed: false,
            }],
        };
        assert!(area.signed_area2(&lines) > 0);
        assert!(area.contains(&lines, Coord::new(15, 5)));
        assert!(area.contains(&lines, Coord::new(5, 15)));
        assert!(!area.contains(&lines, Coord::new(15, 15)));
        assert!(!area.contains(&lines, Coord::new(30, 10)));
        assert!(!area.contains(&lines, Coord::new(30, 20)));
    }
}
