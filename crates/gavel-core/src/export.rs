// Results export: one CSV row per player with the sale outcome.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::model::{find_category, find_team, Category, Player, Team};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no players to export")]
    Empty,

    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct ResultRow<'a> {
    #[serde(rename = "S.No")]
    serial: usize,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Category")]
    category: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
    #[serde(rename = "Team")]
    team: &'a str,
    #[serde(rename = "Base Price")]
    base_price: u64,
    #[serde(rename = "Sold Price")]
    sold_price: Option<u64>,
}

/// Write the results table to `writer`. Returns the number of rows written.
pub fn write_results<W: Write>(
    writer: W,
    players: &[Player],
    teams: &[Team],
    categories: &[Category],
) -> Result<usize, ExportError> {
    if players.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut wtr = csv::Writer::from_writer(writer);
    for (idx, player) in players.iter().enumerate() {
        let category = find_category(categories, &player.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("Unknown");
        let team = player
            .sold_to_team_id
            .as_deref()
            .and_then(|id| find_team(teams, id))
            .map(|t| t.name.as_str())
            .unwrap_or("");
        wtr.serialize(ResultRow {
            serial: idx + 1,
            name: &player.name,
            category,
            status: player.status.label(),
            team,
            base_price: player.base_price,
            sold_price: player.sold_price,
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;

    Ok(players.len())
}

/// Create (or truncate) `path` and write the results table into it.
pub fn export_results(
    path: &Path,
    players: &[Player],
    teams: &[Team],
    categories: &[Category],
) -> Result<usize, ExportError> {
    if players.is_empty() {
        return Err(ExportError::Empty);
    }
    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_results(file, players, teams, categories)
}
