use chrono::{DateTime, Local};
use clap::ValueEnum;
use rusqlite::{params, Connection};
use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::corpus::Difficulty;
use crate::stats::SessionResult;

/// Number of results kept; the oldest is evicted first
pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history export failed: {0}")]
    Csv(#[from] csv::Error),

    /// A stored row could not be turned back into a result.
    #[error("corrupt history row: {0}")]
    Corrupt(String),
}

/// Storage collaborator for finished sessions
pub trait ResultsRecorder {
    /// Append, evicting the oldest entries beyond `HISTORY_LIMIT`
    fn record(&mut self, result: &SessionResult) -> Result<(), HistoryError>;
    /// Stored results, oldest first
    fn history(&self) -> Result<Vec<SessionResult>, HistoryError>;
}

/// Bounded FIFO of results
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    entries: VecDeque<SessionResult>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: SessionResult) {
        self.entries.push_back(result);
        while self.entries.len() > HISTORY_LIMIT {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SessionResult> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<SessionResult> {
        self.entries.iter().cloned().collect()
    }
}

impl FromIterator<SessionResult> for HistoryLog {
    fn from_iter<I: IntoIterator<Item = SessionResult>>(iter: I) -> Self {
        let mut log = HistoryLog::new();
        for result in iter {
            log.push(result);
        }
        log
    }
}

impl<'a> IntoIterator for &'a HistoryLog {
    type Item = &'a SessionResult;
    type IntoIter = std::collections::vec_deque::Iter<'a, SessionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// In-process recorder; used when the database is unavailable and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    log: HistoryLog,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultsRecorder for MemoryRecorder {
    fn record(&mut self, result: &SessionResult) -> Result<(), HistoryError> {
        self.log.push(result.clone());
        Ok(())
    }

    fn history(&self) -> Result<Vec<SessionResult>, HistoryError> {
        Ok(self.log.to_vec())
    }
}

/// SQLite-backed recorder
#[derive(Debug)]
pub struct SqliteRecorder {
    conn: Connection,
}

impl SqliteRecorder {
    /// Open the database at the default state location
    pub fn open_default() -> Result<Self, HistoryError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("keypace_history.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                elapsed_secs REAL NOT NULL,
                total_chars INTEGER NOT NULL,
                difficulty TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl ResultsRecorder for SqliteRecorder {
    fn record(&mut self, result: &SessionResult) -> Result<(), HistoryError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO results
            (wpm, accuracy, elapsed_secs, total_chars, difficulty, duration_secs, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                result.wpm,
                result.accuracy,
                result.elapsed_secs,
                result.total_chars as i64,
                result.difficulty.to_string(),
                result.duration_secs,
                result.recorded_at.to_rfc3339(),
            ],
        )?;

        let evicted = tx.execute(
            "DELETE FROM results WHERE id NOT IN (SELECT id FROM results ORDER BY id DESC LIMIT ?1)",
            params![HISTORY_LIMIT as i64],
        )?;

        tx.commit()?;
        tracing::debug!(evicted, "result recorded");
        Ok(())
    }

    fn history(&self) -> Result<Vec<SessionResult>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT wpm, accuracy, elapsed_secs, total_chars, difficulty, duration_secs, recorded_at
            FROM results
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, u32>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (wpm, accuracy, elapsed_secs, total_chars, difficulty, duration_secs, recorded_at) =
                row?;

            let difficulty = Difficulty::from_str(&difficulty, true)
                .map_err(|_| HistoryError::Corrupt(format!("unknown difficulty '{difficulty}'")))?;
            let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|e| HistoryError::Corrupt(format!("bad timestamp '{recorded_at}': {e}")))?
                .with_timezone(&Local);

            results.push(SessionResult {
                wpm,
                accuracy,
                elapsed_secs,
                total_chars: usize::try_from(total_chars).unwrap_or_default(),
                difficulty,
                duration_secs,
                recorded_at,
            });
        }

        Ok(results)
    }
}

/// Write results as CSV with a header row
pub fn export_csv<W: Write>(results: &[SessionResult], writer: W) -> Result<(), HistoryError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for result in results {
        csv_writer.serialize(result)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv_file<P: AsRef<Path>>(
    results: &[SessionResult],
    path: P,
) -> Result<(), HistoryError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    export_csv(results, File::create(path)?)
}

/// Aggregates over a history list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub sessions: usize,
    pub best_wpm: u32,
    pub avg_wpm: f64,
    pub avg_accuracy: f64,
}

impl HistorySummary {
    pub fn from_results<'a>(
        results: impl IntoIterator<Item = &'a SessionResult>,
    ) -> Option<Self> {
        let (sessions, best_wpm, wpm_total, accuracy_total) = results.into_iter().fold(
            (0usize, 0u32, 0.0f64, 0.0f64),
            |(n, best, wpm, acc), r| {
                (
                    n + 1,
                    best.max(r.wpm),
                    wpm + r.wpm as f64,
                    acc + r.accuracy as f64,
                )
            },
        );
        if sessions == 0 {
            return None;
        }

        Some(Self {
            sessions,
            best_wpm,
            avg_wpm: wpm_total / sessions as f64,
            avg_accuracy: accuracy_total / sessions as f64,
        })
    }
}
