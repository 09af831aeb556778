use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;
use sprouts::{Coord, Game, GameOptions, Move};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Replays a script of moves and draws the final board.
#[derive(Parser)]
struct Args {
    /// A JSON file with the starting points and the moves to play.
    input: PathBuf,
    output: PathBuf,

    #[arg(long)]
    probe_offset: Option<i32>,
}

#[derive(Deserialize)]
struct Script {
    points: Vec<Coord>,
    #[serde(default)]
    moves: Vec<Move>,
}

const AREA_COLORS: [&str; 6] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4",
];

fn pt(c: Coord) -> (f64, f64) {
    (c.x as f64, c.y as f64)
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let input = std::fs::read_to_string(&args.input)?;
    let script: Script = serde_json::from_str(&input)?;

    let mut options = GameOptions::default();
    if let Some(k) = args.probe_offset {
        options.probe_offset = k;
    }
    let mut game = Game::with_options(options)?;
    for p in script.points {
        game.insert_point(p);
    }
    game.update_areas();
    for (i, mv) in script.moves.iter().enumerate() {
        let p = game
            .play(mv)
            .map_err(|e| anyhow::anyhow!("move {i} failed: {e}"))?;
        info!(move_number = i, point = ?p, "played");
    }

    let coords: Vec<Coord> = game
        .lines()
        .iter()
        .flat_map(|l| l.coords().iter().copied())
        .chain(game.points().iter().map(|p| p.at))
        .collect();
    let Some(min_x) = coords.iter().map(|c| c.x).min() else {
        anyhow::bail!("nothing to draw");
    };
    // unwrap: non-empty, checked above
    let max_x = coords.iter().map(|c| c.x).max().unwrap();
    let min_y = coords.iter().map(|c| c.y).min().unwrap();
    let max_y = coords.iter().map(|c| c.y).max().unwrap();
    let pad = 10.0;
    let (min_x, max_x, min_y, max_y) = (min_x as f64, max_x as f64, min_y as f64, max_y as f64);
    let stroke_width = (max_y - min_y).max(max_x - min_x).max(1.0) / 256.0;
    let dot_radius = stroke_width * 4.0;
    let mut document = svg::Document::new().set(
        "viewBox",
        (
            min_x - pad,
            min_y - pad,
            max_x - min_x + 2.0 * pad,
            max_y - min_y + 2.0 * pad,
        ),
    );

    for (i, area) in game.areas()?.iter().enumerate() {
        let boundary = area.boundary(game.lines());
        let mut data = svg::node::element::path::Data::new();
        for (j, c) in boundary.iter().enumerate() {
            data = if j == 0 {
                data.move_to(pt(*c))
            } else {
                data.line_to(pt(*c))
            };
        }
        let path = svg::node::element::Path::new()
            .set("fill", AREA_COLORS[i % AREA_COLORS.len()])
            .set("fill-opacity", "0.2")
            .set("stroke", "none")
            .set("d", data.close());
        document = document.add(path);
    }

    for line in game.lines() {
        let mut data = svg::node::element::path::Data::new().move_to(pt(line.first()));
        for c in &line.coords()[1..] {
            data = data.line_to(pt(*c));
        }
        let path = svg::node::element::Path::new()
            .set("stroke", "black")
            .set("stroke-width", stroke_width)
            .set("fill", "none")
            .set("d", data);
        document = document.add(path);
    }

    for p in game.points() {
        let color = match p.degree() {
            0 | 1 => "green",
            2 => "orange",
            _ => "red",
        };
        let c = svg::node::element::Circle::new()
            .set("cx", p.at.x as f64)
            .set("cy", p.at.y as f64)
            .set("r", dot_radius)
            .set("fill", color);
        document = document.add(c);
    }

    svg::save(&args.output, &document)?;

    info!(
        moves = game.moves(),
        points = game.point_count(),
        areas = game.areas()?.len(),
        ended = game.game_ended()?,
        "done"
    );
    if let Some(winner) = game.winner()? {
        info!(?winner, "game over");
    }

    Ok(())
}
