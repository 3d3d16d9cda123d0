use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::APP_DIR_NAME;
use crate::issue::Issue;

const BOARD_FILE_NAME: &str = "board.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFile {
    #[serde(default)]
    pub issues: Vec<Issue>,
}

pub fn board_path() -> PathBuf {
    data_dir().join(APP_DIR_NAME).join(BOARD_FILE_NAME)
}

pub fn delete_board() -> Result<bool> {
    delete_board_at(&board_path())
}

pub fn load_board(path: &Path) -> Result<BoardFile> {
    if !path.exists() {
        return Ok(BoardFile::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read board at {}", path.display()))?;
    let board = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse board at {}", path.display()))?;
    Ok(board)
}

/// Writes through a sibling temp file so a crash never leaves a truncated
/// board behind.
pub fn save_board(path: &Path, board: &BoardFile) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create board dir at {}", parent.display()))?;
    }
    let contents =
        serde_json::to_string_pretty(board).with_context(|| "Failed to serialize board")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write board at {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace board at {}", path.display()))?;
    Ok(())
}

fn data_dir() -> PathBuf {
    if cfg!(windows) {
        return windows_data_dir();
    }

    unix_data_dir()
}

pub(crate) fn state_dir() -> PathBuf {
    if !cfg!(windows)
        && let Ok(dir) = env::var("XDG_STATE_HOME")
    {
        return PathBuf::from(dir);
    }
    if !cfg!(windows)
        && let Ok(home) = env::var("HOME")
    {
        return Path::new(&home).join(".local").join("state");
    }
    data_dir()
}

fn unix_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = env::var("HOME") {
        return Path::new(&home).join(".local").join("share");
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn windows_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("LOCALAPPDATA") {
        return PathBuf::from(dir);
    }

    if let Ok(dir) = env::var("APPDATA") {
        return PathBuf::from(dir);
    }

    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn delete_board_at(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }

    fs::remove_file(path)
        .with_context(|| format!("Failed to delete board at {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{TimeZone, Utc};

    use super::{BoardFile, delete_board_at, load_board, save_board};
    use crate::issue::{AnchorPosition, Issue, IssueId};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pinboard-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_board_loads_empty() {
        let dir = scratch_dir("missing");
        let board = load_board(&dir.join("board.json")).expect("load board");
        assert!(board.issues.is_empty());
    }

    #[test]
    fn save_then_load_preserves_comments_and_state() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("nested").join("board.json");
        let mut issue = Issue::new_at(AnchorPosition { top: 4, left: 10 });
        issue.id = IssueId(3);
        issue.resolved = true;
        issue.push_comment(
            "alice",
            "label is shifted",
            Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        );
        let board = BoardFile {
            issues: vec![issue],
        };

        save_board(&path, &board).expect("save board");
        assert!(!path.with_extension("json.tmp").exists());
        let loaded = load_board(&path).expect("load board");
        assert_eq!(loaded, board);

        assert!(delete_board_at(&path).expect("delete"));
        assert!(!delete_board_at(&path).expect("delete again"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_board_reports_path() {
        let dir = scratch_dir("corrupt");
        std::fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("board.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = load_board(&path).expect_err("parse fails");
        assert!(format!("{:#}", err).contains("Failed to parse board"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
