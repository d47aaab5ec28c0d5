//! CSV ingestion for per-team game statistics
//!
//! Each input file holds one row per game, written from the point of view of
//! one side (all winners, or all losers).

use crate::{CloseGamesError, Result};
use std::collections::HashSet;
use std::path::Path;

/// Numeric statistics for one side of every game in a file
#[derive(Debug, Clone)]
pub struct TeamStatsTable {
    /// Source file, for error messages
    pub file: String,
    /// Feature column names, in the order the values are stored
    pub columns: Vec<String>,
    /// Per-row join keys, present when a key column was requested
    pub keys: Option<Vec<String>>,
    /// One vector of feature values per row
    pub rows: Vec<Vec<f64>>,
}

impl TeamStatsTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    Ok(reader)
}

/// Read just the header row of a CSV file
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = open_reader(path)?;
    Ok(reader.headers()?.iter().map(str::to_string).collect())
}

/// Pick the feature columns for a winners/losers pair.
///
/// An explicit list is returned as-is. Otherwise every column present in both
/// headers is used, in winners-file order, excluding the join key.
pub fn resolve_feature_columns(
    winner_headers: &[String],
    loser_headers: &[String],
    configured: &[String],
    join_key: Option<&str>,
) -> Result<Vec<String>> {
    if !configured.is_empty() {
        return Ok(configured.to_vec());
    }

    let loser_set: HashSet<&str> = loser_headers.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let columns: Vec<String> = winner_headers
        .iter()
        .filter(|h| Some(h.as_str()) != join_key)
        .filter(|h| loser_set.contains(h.as_str()))
        .filter(|h| seen.insert(h.as_str()))
        .cloned()
        .collect();

    if columns.is_empty() {
        return Err(CloseGamesError::Config(
            "Winners and losers files share no feature columns".to_string(),
        ));
    }

    Ok(columns)
}

/// Load the named feature columns (and optional key column) from a CSV file.
///
/// Every feature cell must parse as a finite number; there is no handling of
/// missing values.
pub fn load_team_stats(
    path: &Path,
    columns: &[String],
    join_key: Option<&str>,
) -> Result<TeamStatsTable> {
    let file = display_path(path);
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();

    let find = |column: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| CloseGamesError::MissingColumn {
                file: file.clone(),
                column: column.to_string(),
            })
    };

    let positions: Vec<usize> = columns.iter().map(|c| find(c)).collect::<Result<_>>()?;
    let key_position = join_key.map(find).transpose()?;

    let mut rows = Vec::new();
    let mut keys = key_position.map(|_| Vec::new());

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let line = row_idx + 2;

        let mut values = Vec::with_capacity(positions.len());
        for (column, &pos) in columns.iter().zip(positions.iter()) {
            let cell = record.get(pos).ok_or_else(|| {
                CloseGamesError::Parse(format!(
                    "{} line {}: missing value for column '{}'",
                    file, line, column
                ))
            })?;
            let value: f64 = cell.parse().map_err(|_| {
                CloseGamesError::Parse(format!(
                    "{} line {}: column '{}' has non-numeric value '{}'",
                    file, line, column, cell
                ))
            })?;
            if !value.is_finite() {
                return Err(CloseGamesError::Parse(format!(
                    "{} line {}: column '{}' has non-finite value '{}'",
                    file, line, column, cell
                )));
            }
            values.push(value);
        }

        if let (Some(pos), Some(keys)) = (key_position, keys.as_mut()) {
            let key = record.get(pos).ok_or_else(|| {
                CloseGamesError::Parse(format!("{} line {}: missing join key", file, line))
            })?;
            keys.push(key.to_string());
        }

        rows.push(values);
    }

    log::debug!("Read {} rows x {} columns from {}", rows.len(), columns.len(), file);

    Ok(TeamStatsTable {
        file,
        columns: columns.to_vec(),
        keys,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_selected_columns_in_requested_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "w.csv",
            "game_id, team, pts, reb\n1, A, 101, 40\n2, B, 99.5, 38\n",
        );

        let table = load_team_stats(&path, &cols(&["reb", "pts"]), Some("game_id")).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], vec![40.0, 101.0]);
        assert_eq!(table.rows[1], vec![38.0, 99.5]);
        assert_eq!(table.keys, Some(vec!["1".to_string(), "2".to_string()]));
    }

    #[test]
    fn test_missing_column_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "w.csv", "pts\n1\n");

        let err = load_team_stats(&path, &cols(&["pts", "ast"]), None).unwrap_err();
        match err {
            CloseGamesError::MissingColumn { column, .. } => assert_eq!(column, "ast"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_non_numeric_and_empty_cells_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_csv(dir.path(), "bad.csv", "pts\nabc\n");
        assert!(matches!(
            load_team_stats(&bad, &cols(&["pts"]), None),
            Err(CloseGamesError::Parse(_))
        ));

        let empty = write_csv(dir.path(), "empty.csv", "pts,reb\n1,\n");
        assert!(matches!(
            load_team_stats(&empty, &cols(&["reb"]), None),
            Err(CloseGamesError::Parse(_))
        ));

        let nan = write_csv(dir.path(), "nan.csv", "pts\nNaN\n");
        assert!(load_team_stats(&nan, &cols(&["pts"]), None).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_team_stats(&dir.path().join("nope.csv"), &cols(&["pts"]), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_shared_columns() {
        let winners = cols(&["game_id", "pts", "reb", "winner_only"]);
        let losers = cols(&["reb", "pts", "game_id", "loser_only"]);

        let resolved = resolve_feature_columns(&winners, &losers, &[], Some("game_id")).unwrap();
        assert_eq!(resolved, cols(&["pts", "reb"]));

        let explicit = resolve_feature_columns(&winners, &losers, &cols(&["reb"]), None).unwrap();
        assert_eq!(explicit, cols(&["reb"]));

        assert!(resolve_feature_columns(&cols(&["a"]), &cols(&["b"]), &[], None).is_err());
    }
}
