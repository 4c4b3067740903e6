//! Level text format.
//!
//! One line per tile row, top row first, every line the same width:
//!
//! | char | tile |
//! |------|------|
//! | `.`  | empty |
//! | `#`  | solid block |
//! | `-`  | one-way platform |
//! | `G`  | gem |
//! | `X`  | exit |
//! | `1`  | player start |
//! | `A`  | patrolling enemy |
//!
//! Cell coordinates are `(column, row)` with row 0 at the bottom of the level.

use crate::collision::{TileCollision, TileGrid};

pub type Cell = (i32, i32);

#[derive(Debug, Clone)]
pub struct LevelLayout {
    pub grid: TileGrid,
    pub start: Cell,
    pub exit: Cell,
    pub gems: Vec<Cell>,
    pub enemies: Vec<Cell>,
}

pub fn parse_layout(text: &str) -> Result<LevelLayout, String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err("Level layout is empty".to_string());
    }

    let height = lines.len() as i32;
    let width = lines[0].chars().count();
    let mut rows = Vec::with_capacity(lines.len());
    let mut start = None;
    let mut exit = None;
    let mut gems = Vec::new();
    let mut enemies = Vec::new();

    for (line_index, line) in lines.iter().enumerate() {
        let count = line.chars().count();
        if count != width {
            return Err(format!(
                "Level line {} is {count} tiles wide, expected {width}",
                line_index + 1
            ));
        }
        let row = height - 1 - line_index as i32;
        let mut tiles = Vec::with_capacity(width);
        for (column, ch) in line.chars().enumerate() {
            let cell = (column as i32, row);
            let collision = match ch {
                '.' => TileCollision::Passable,
                '#' => TileCollision::Impassable,
                '-' => TileCollision::Platform,
                'G' => {
                    gems.push(cell);
                    TileCollision::Passable
                }
                'A' => {
                    enemies.push(cell);
                    TileCollision::Passable
                }
                'X' => {
                    if exit.replace(cell).is_some() {
                        return Err(format!(
                            "Level has more than one exit (second at line {}, column {})",
                            line_index + 1,
                            column + 1
                        ));
                    }
                    TileCollision::Passable
                }
                '1' => {
                    if start.replace(cell).is_some() {
                        return Err(format!(
                            "Level has more than one start (second at line {}, column {})",
                            line_index + 1,
                            column + 1
                        ));
                    }
                    TileCollision::Passable
                }
                other => {
                    return Err(format!(
                        "Unsupported tile '{other}' at line {}, column {}",
                        line_index + 1,
                        column + 1
                    ))
                }
            };
            tiles.push(collision);
        }
        rows.push(tiles);
    }

    let start = start.ok_or_else(|| "Level must have a starting point".to_string())?;
    let exit = exit.ok_or_else(|| "Level must have an exit".to_string())?;
    let grid = TileGrid::from_rows_top_down(&rows)?;

    Ok(LevelLayout {
        grid,
        start,
        exit,
        gems,
        enemies,
    })
}
