use tracing::debug;

use crate::{
    board::{Connection, LineIdx, Point, PointIdx},
    geom::{Coord, Polyline},
    Error, Game,
};

/// A batch of additions to a game that either all stay or all go.
///
/// Everything added through the transaction is undone when it is dropped,
/// unless [`commit`](MoveTransaction::commit) was called first. Since
/// additions only ever append to the game's arenas, undoing them means
/// removing the recorded connections (newest first) and then truncating the
/// arenas back to where they were.
pub(crate) struct MoveTransaction<'g> {
    game: &'g mut Game,
    point_count: usize,
    line_count: usize,
    links: Vec<(PointIdx, Connection)>,
    committed: bool,
}

impl<'g> MoveTransaction<'g> {
    /// Starts a transaction. The game's areas are out of date from here on.
    pub fn begin(game: &'g mut Game) -> Self {
        game.regions = None;
        MoveTransaction {
            point_count: game.points.len(),
            line_count: game.lines.len(),
            game,
            links: Vec::new(),
            committed: false,
        }
    }

    pub fn insert_line(&mut self, line: Polyline) -> LineIdx {
        self.game.lines.push(line);
        LineIdx(self.game.lines.len() - 1)
    }

    pub fn insert_point(&mut self, at: Coord) -> PointIdx {
        self.game.points.push(Point::new(at));
        PointIdx(self.game.points.len() - 1)
    }

    /// Adds `conn` to the first free slot of `owner`.
    pub fn link(&mut self, owner: PointIdx, conn: Connection) -> Result<(), Error> {
        self.game.points[owner.0].add_connection(conn)?;
        self.links.push((owner, conn));
        Ok(())
    }

    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for MoveTransaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        debug!(
            links = self.links.len(),
            points = self.game.points.len() - self.point_count,
            lines = self.game.lines.len() - self.line_count,
            "rolling back"
        );
        for (owner, conn) in self.links.drain(..).rev() {
            let removed = self.game.points[owner.0].remove_connection(conn);
            debug_assert!(removed);
        }
        self.game.points.truncate(self.point_count);
        self.game.lines.truncate(self.line_count);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;
    use tracing::{field::Field, Event, Level, Subscriber};
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer,
    };

    use super::*;

    /// Collects the level and message of every event.
    #[derive(Clone, Default)]
    struct Events(Arc<Mutex<Vec<(Level, String)>>>);

    struct Message<'a>(&'a mut String);

    impl tracing::field::Visit for Message<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                *self.0 = format!("{value:?}");
            }
        }
    }

    impl<S: Subscriber> Layer<S> for Events {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut message = String::new();
            event.record(&mut Message(&mut message));
            self.0
                .lock()
                .unwrap()
                .push((*event.metadata().level(), message));
        }
    }

    fn flat(y: i32) -> Polyline {
        Polyline::new(vec![Coord::new(0, y), Coord::new(10, y)]).unwrap()
    }

    fn two_points() -> Game {
        let mut game = Game::new();
        game.insert_point(Coord::new(0, 0));
        game.insert_point(Coord::new(10, 0));
        game
    }

    #[test]
    fn dropping_undoes_everything() {
        let mut game = two_points();
        let before = game.clone();
        {
            let mut tx = MoveTransaction::begin(&mut game);
            let l = tx.insert_line(flat(0));
            let p = tx.insert_point(Coord::new(5, 5));
            let back = Connection {
                line: l,
                dest: PointIdx(0),
            };
            tx.link(PointIdx(0), Connection { line: l, dest: p }).unwrap();
            tx.link(p, back).unwrap();
        }
        assert_eq!(game.points(), before.points());
        assert_eq!(game.lines(), before.lines());
    }

    #[test]
    fn committing_keeps_everything() {
        let mut game = two_points();
        let mut tx = MoveTransaction::begin(&mut game);
        let l = tx.insert_line(flat(0));
        let conn = Connection {
            line: l,
            dest: PointIdx(1),
        };
        tx.link(PointIdx(0), conn).unwrap();
        tx.commit();

        assert_eq!(game.line_count(), 1);
        assert_eq!(game.point(PointIdx(0)).degree(), 1);
    }

    #[test]
    fn rollback_after_a_full_point() {
        let mut game = two_points();
        for _ in 0..3 {
            game.join(flat(0)).unwrap();
        }
        let before = game.clone();
        {
            let mut tx = MoveTransaction::begin(&mut game);
            let p = tx.insert_point(Coord::new(0, 20));
            let l = tx.insert_line(flat(20));
            let conn = Connection {
                line: l,
                dest: PointIdx(1),
            };
            tx.link(p, conn).unwrap();
            assert_matches!(
                tx.link(PointIdx(1), Connection { line: l, dest: p }),
                Err(Error::PointFull { .. })
            );
        }
        assert_eq!(game.points(), before.points());
        assert_eq!(game.lines(), before.lines());
    }

    #[test]
    fn rollback_is_logged_at_debug() {
        let events = Events::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        tracing::subscriber::with_default(subscriber, || {
            let mut game = two_points();
            let mut tx = MoveTransaction::begin(&mut game);
            tx.insert_line(flat(0));
            tx.commit();

            let mut tx = MoveTransaction::begin(&mut game);
            tx.insert_line(flat(5));
        });

        let events = events.0.lock().unwrap();
        assert_eq!(*events, vec![(Level::DEBUG, "rolling back".to_owned())]);
    }
}
