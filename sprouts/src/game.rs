use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    areas::{outgoing, Area},
    areasets::{Areaset, Regions, Sides},
    board::{Connection, LineIdx, Player, Point, PointIdx},
    geom::{Coord, Direction, Polyline},
    transaction::MoveTransaction,
    Error,
};

/// Tunable parameters of a [`Game`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    /// How far to step off a point when working out what lies on each side
    /// of it. This needs to be positive, and small enough that the step
    /// doesn't cross another line.
    pub probe_offset: i32,
}

impl Default for GameOptions {
    fn default() -> Self {
        GameOptions { probe_offset: 1 }
    }
}

/// Whether the areas of a [`Game`] describe its current board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Freshness {
    Fresh,
    Stale,
}

/// A polyline to draw between two points, and where to put the new point on
/// it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub line: Vec<Coord>,
    pub middle: Coord,
}

impl Move {
    pub fn new(
        line: impl IntoIterator<Item = impl Into<Coord>>,
        middle: impl Into<Coord>,
    ) -> Self {
        Move {
            line: line.into_iter().map(Into::into).collect(),
            middle: middle.into(),
        }
    }

    /// A move along `line`, with the new point in the middle of its longest
    /// segment.
    pub fn through(line: &Polyline) -> Option<Move> {
        Some(Move {
            middle: line.find_middle()?,
            line: line.coords().to_vec(),
        })
    }
}

/// The directions in which a point can still be left by a new polyline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Openings([bool; 4]);

impl Openings {
    pub fn is_open(&self, dir: Direction) -> bool {
        self.0[dir.rank()]
    }

    pub fn open(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.is_open(*d))
    }
}

impl std::fmt::Display for Openings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (dir, c) in Direction::ALL.into_iter().zip(['U', 'R', 'D', 'L']) {
            write!(f, "{}", if self.is_open(dir) { c } else { '-' })?;
        }
        Ok(())
    }
}

/// A board of points joined by polylines, and the moves played on it.
///
/// Points and polylines are only ever added, and indices into them stay
/// valid. The areas and areasets are derived from them, and need to be
/// recomputed (with [`Game::update_areas`]) after the board is changed by
/// anything other than a successful move.
#[derive(Debug)]
pub struct Game {
    pub(crate) points: Vec<Point>,
    pub(crate) lines: Vec<Polyline>,
    moves: usize,
    options: GameOptions,
    /// `None` whenever the board has changed since the last recompute.
    pub(crate) regions: Option<Regions>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Game {
    /// Copies the board, but not its areas: the copy starts out stale.
    fn clone(&self) -> Self {
        Game {
            points: self.points.clone(),
            lines: self.lines.clone(),
            moves: self.moves,
            options: self.options,
            regions: None,
        }
    }
}

impl Game {
    pub fn new() -> Self {
        Game {
            points: Vec::new(),
            lines: Vec::new(),
            moves: 0,
            options: GameOptions::default(),
            regions: Some(Regions::empty()),
        }
    }

    /// An empty game with the given options.
    ///
    /// Fails with [`Error::InvalidProbeOffset`] unless the probe offset is
    /// positive.
    pub fn with_options(options: GameOptions) -> Result<Self, Error> {
        if options.probe_offset <= 0 {
            return Err(Error::InvalidProbeOffset {
                offset: options.probe_offset,
            });
        }
        Ok(Game {
            options,
            ..Game::new()
        })
    }

    pub fn options(&self) -> &GameOptions {
        &self.options
    }

    /// Adds an unconnected point.
    pub fn insert_point(&mut self, at: Coord) -> PointIdx {
        self.regions = None;
        self.points.push(Point::new(at));
        PointIdx(self.points.len() - 1)
    }

    /// Stores a polyline without connecting it to anything.
    pub fn insert_line(&mut self, line: Polyline) -> LineIdx {
        self.regions = None;
        self.lines.push(line);
        LineIdx(self.lines.len() - 1)
    }

    /// Stores a polyline and connects it to the points at both of its ends.
    ///
    /// This is for setting up a board, so it doesn't check that the polyline
    /// avoids the others or count as a move.
    pub fn join(&mut self, line: Polyline) -> Result<LineIdx, Error> {
        self.regions = None;
        let a = self.unique_point_at(line.first())?;
        let b = self.unique_point_at(line.last())?;

        let mut tx = MoveTransaction::begin(self);
        let l = tx.insert_line(line);
        tx.link(a, Connection { line: l, dest: b })?;
        tx.link(b, Connection { line: l, dest: a })?;
        tx.commit();
        Ok(l)
    }

    fn unique_point_at(&self, at: Coord) -> Result<PointIdx, Error> {
        let mut found = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.at == at)
            .map(|(i, _)| PointIdx(i));
        match (found.next(), found.next()) {
            (Some(idx), None) => Ok(idx),
            _ => Err(Error::InvalidNode),
        }
    }

    /// Draws `line` between the points at its two ends and puts a new point
    /// on it at `middle`.
    ///
    /// If `validate` is set, we first check that the two ends are
    /// [connectable](Game::connectable). We never check that `line` avoids
    /// the existing polylines; that's up to the caller. We do check that
    /// `middle` isn't already a point, and fail with
    /// [`Error::InvalidMiddle`] (with a `count` of zero) if it is.
    ///
    /// On success, returns the new point and leaves the areas up to date. On
    /// failure the board is unchanged, but the areas are stale.
    #[instrument(skip(self, line), fields(moves = self.moves, len = line.len()))]
    pub fn do_move(
        &mut self,
        line: &[Coord],
        middle: Coord,
        validate: bool,
    ) -> Result<PointIdx, Error> {
        self.regions = None;
        match self.try_move(line, middle, validate) {
            Ok(p) => {
                self.moves += 1;
                debug!(moves = self.moves, point = ?p, "move committed");
                self.update_areas();
                Ok(p)
            }
            Err(e) => {
                self.regions = None;
                warn!(error = %e, "move rejected");
                Err(e)
            }
        }
    }

    fn try_move(
        &mut self,
        line: &[Coord],
        middle: Coord,
        validate: bool,
    ) -> Result<PointIdx, Error> {
        let line = Polyline::new(line.to_vec())?;
        let a = self.unique_point_at(line.first())?;
        let b = self.unique_point_at(line.last())?;

        if validate {
            self.update_areas();
            if !self.connectable(a, b)? {
                return Err(Error::NotConnectable);
            }
        }

        let (first, second) = line.split_at(middle)?;
        if self.find_point_at(middle).is_some() {
            return Err(Error::InvalidMiddle { count: 0, middle });
        }
        let mut tx = MoveTransaction::begin(self);
        let first = tx.insert_line(first);
        let second = tx.insert_line(second);
        let c = tx.insert_point(middle);
        tx.link(c, Connection { line: first, dest: a })?;
        tx.link(c, Connection { line: second, dest: b })?;
        tx.link(a, Connection { line: first, dest: c })?;
        tx.link(b, Connection { line: second, dest: c })?;
        tx.commit();
        Ok(c)
    }

    /// Plays a move, checking first that its ends are connectable.
    pub fn play(&mut self, mv: &Move) -> Result<PointIdx, Error> {
        self.do_move(&mv.line, mv.middle, true)
    }

    /// Recomputes the areas and areasets from scratch.
    #[instrument(skip(self), fields(points = self.points.len(), lines = self.lines.len()))]
    pub fn update_areas(&mut self) {
        let regions = Regions::compute(&self.points, &self.lines, self.options.probe_offset);
        debug!(
            areas = regions.areas.len(),
            areasets = regions.areasets.len(),
            "recomputed areas"
        );
        self.regions = Some(regions);
    }

    pub fn freshness(&self) -> Freshness {
        if self.regions.is_some() {
            Freshness::Fresh
        } else {
            Freshness::Stale
        }
    }

    fn regions(&self) -> Result<&Regions, Error> {
        self.regions.as_ref().ok_or(Error::AreasOutdated)
    }

    /// Can a polyline be drawn from `p` to `q` without crossing any other?
    ///
    /// A point is connectable to itself if it has room for a loop.
    ///
    /// # Panics
    ///
    /// Panics if `p` or `q` isn't a point of this game.
    pub fn connectable(&self, p: PointIdx, q: PointIdx) -> Result<bool, Error> {
        let regions = self.regions()?;
        if p == q {
            return Ok(self.points[p.0].can_loop());
        }
        match (regions.sides[p.0], regions.sides[q.0]) {
            (Some(sp), Some(sq)) => Ok(sp.shares(&sq)),
            _ => Ok(false),
        }
    }

    /// Are there no moves left?
    pub fn game_ended(&self) -> Result<bool, Error> {
        Ok(self.connectable_pairs()?.is_empty())
    }

    /// The points that still have a free connection slot.
    pub fn live_points(&self) -> impl Iterator<Item = PointIdx> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_dead())
            .map(|(i, _)| PointIdx(i))
    }

    /// Every unordered pair of live points that can be joined, including
    /// points paired with themselves.
    pub fn connectable_pairs(&self) -> Result<Vec<(PointIdx, PointIdx)>, Error> {
        let live: Vec<_> = self.live_points().collect();
        let mut ret = Vec::new();
        for (i, &p) in live.iter().enumerate() {
            for &q in &live[i..] {
                if self.connectable(p, q)? {
                    ret.push((p, q));
                }
            }
        }
        Ok(ret)
    }

    /// How many pairs of distinct points can't be joined.
    pub fn not_connectable_count(&self) -> Result<usize, Error> {
        let mut count = 0;
        for p in 0..self.points.len() {
            for q in (p + 1)..self.points.len() {
                if !self.connectable(PointIdx(p), PointIdx(q))? {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// The first point at `at`, if there is one.
    pub fn find_point_at(&self, at: Coord) -> Option<PointIdx> {
        self.points.iter().position(|p| p.at == at).map(PointIdx)
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// # Panics
    ///
    /// Panics if `idx` isn't a point of this game.
    pub fn point(&self, idx: PointIdx) -> &Point {
        &self.points[idx.0]
    }

    /// # Panics
    ///
    /// Panics if `idx` isn't a polyline of this game.
    pub fn line(&self, idx: LineIdx) -> &Polyline {
        &self.lines[idx.0]
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn lines(&self) -> &[Polyline] {
        &self.lines
    }

    pub fn areas(&self) -> Result<&[Area], Error> {
        Ok(&self.regions()?.areas)
    }

    pub fn areasets(&self) -> Result<&[Areaset], Error> {
        Ok(self.regions()?.areasets.as_slice())
    }

    /// The areasets on either side of `p`, or `None` if `p` is dead.
    ///
    /// # Panics
    ///
    /// Panics if `p` isn't a point of this game.
    pub fn sides(&self, p: PointIdx) -> Result<Option<Sides>, Error> {
        Ok(self.regions()?.sides[p.0])
    }

    /// Which directions `p` can still be left in.
    ///
    /// A dead point has no openings; otherwise a direction is open unless a
    /// polyline already leaves `p` that way.
    ///
    /// # Panics
    ///
    /// Panics if `p` isn't a point of this game.
    pub fn openings(&self, p: PointIdx) -> Openings {
        let point = &self.points[p.0];
        let mut open = [!point.is_dead(); 4];
        for (h, _) in outgoing(point, &self.lines) {
            open[h.leaving(&self.lines).rank()] = false;
        }
        Openings(open)
    }

    pub fn to_move(&self) -> Player {
        if self.moves % 2 == 0 {
            Player::First
        } else {
            Player::Second
        }
    }

    /// The winner, if the game is over. The player left without a move loses.
    pub fn winner(&self) -> Result<Option<Player>, Error> {
        Ok(self.game_ended()?.then(|| self.to_move().opponent()))
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.regions {
            Some(regions) => {
                for (i, area) in regions.areas.iter().enumerate() {
                    write!(f, "area a_{i}:")?;
                    for h in area.edges() {
                        write!(f, " {h:?}")?;
                    }
                    writeln!(f)?;
                }
                for (idx, set) in regions.areasets.iter() {
                    let areas: Vec<_> = set.areas().iter().map(|a| format!("{a:?}")).collect();
                    writeln!(f, "areaset {idx:?}: {{{}}}", areas.join(", "))?;
                }
            }
            None => writeln!(f, "areas: stale")?,
        }

        for (i, p) in self.points.iter().enumerate() {
            write!(f, "point p_{i} @ {} open {}", p.at, self.openings(PointIdx(i)))?;
            if let Some(regions) = &self.regions {
                match regions.sides[i] {
                    Some(Sides(sides)) => write!(f, " sides {sides:?}")?,
                    None => write!(f, " dead")?,
                }
            }
            writeln!(f)?;
            for conn in p.connections() {
                writeln!(f, "  {:?} -> {:?}", conn.line, conn.dest)?;
            }
        }

        for (i, line) in self.lines.iter().enumerate() {
            writeln!(f, "line l_{i}: {line}")?;
        }
        Ok(())
    }
}
