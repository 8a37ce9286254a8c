use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use thiserror::Error;
use tracing::{debug, info};

pub const HISTORY_FILE: &str = "study_time.txt";
pub const COMPLETION_MARKER: &str = "Ciclo concluído!";
const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("could not append to {}: {source}", .path.display())]
    Append {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One line of the study log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry {
    timestamp: NaiveDateTime,
}

impl LogEntry {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        // The file only stores whole seconds.
        Self {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn message(&self) -> &'static str {
        COMPLETION_MARKER
    }

    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim_end().strip_prefix("Data: ")?;
        let (stamp, message) = rest.split_once(" - ")?;
        if message != COMPLETION_MARKER {
            return None;
        }
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FMT).ok()?;
        Some(Self { timestamp })
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data: {} - {}", self.timestamp.format(TIMESTAMP_FMT), self.message())
    }
}

/// Append-only text log of completed phases.
///
/// The file is opened and closed on every call; no handle outlives a write.
#[derive(Debug, Clone)]
pub struct StudyLog {
    path: PathBuf,
}

impl Default for StudyLog {
    fn default() -> Self {
        Self::new(HISTORY_FILE)
    }
}

impl StudyLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_completion(&self, at: NaiveDateTime) -> Result<LogEntry, HistoryError> {
        let entry = LogEntry::new(at);
        let append_err = |source| HistoryError::Append { path: self.path.clone(), source };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(append_err)?;
        writeln!(file, "{entry}").map_err(append_err)?;

        info!(path = %self.path.display(), %entry, "cycle recorded");
        Ok(entry)
    }

    /// `Ok(None)` means there is no log yet, which is normal on a first run.
    pub fn read_history(&self) -> Result<Option<Vec<String>>, HistoryError> {
        let read_err = |source| HistoryError::Read { path: self.path.clone(), source };

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no history file yet");
                return Ok(None);
            }
            Err(e) => return Err(read_err(e)),
        };

        let lines = BufReader::new(file)
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .map_err(read_err)?;
        Ok(Some(lines))
    }
}

/// Counts recognizable entries logged on `date`.
pub fn completions_on(lines: &[String], date: NaiveDate) -> usize {
    lines
        .iter()
        .filter_map(|line| LogEntry::parse(line))
        .filter(|entry| entry.timestamp().date() == date)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FMT).unwrap()
    }

    fn temp_log() -> (StudyLog, TempDir) {
        let dir = TempDir::new().unwrap();
        let log = StudyLog::new(dir.path().join(HISTORY_FILE));
        (log, dir)
    }

    #[test]
    fn entry_line_format() {
        let entry = LogEntry::new(at("2024-03-09 08:05:01"));
        assert_eq!(entry.to_string(), "Data: 2024-03-09 08:05:01 - Ciclo concluído!");
    }

    #[test]
    fn entry_drops_sub_second_precision() {
        let precise = at("2024-03-09 08:05:01") + chrono::Duration::milliseconds(750);
        assert_eq!(LogEntry::new(precise).timestamp(), at("2024-03-09 08:05:01"));
    }

    #[test]
    fn parse_rejects_foreign_lines() {
        assert!(LogEntry::parse("").is_none());
        assert!(LogEntry::parse("Data: yesterday - Ciclo concluído!").is_none());
        assert!(LogEntry::parse("Data: 2024-03-09 08:05:01 - something else").is_none());
        assert_eq!(
            LogEntry::parse("Data: 2024-03-09 08:05:01 - Ciclo concluído!\r"),
            Some(LogEntry::new(at("2024-03-09 08:05:01")))
        );
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let (log, _dir) = temp_log();
        assert!(log.read_history().unwrap().is_none());
    }

    #[test]
    fn records_append_in_order() {
        let (log, _dir) = temp_log();

        log.record_completion(at("2024-03-09 08:25:00")).unwrap();
        log.record_completion(at("2024-03-09 08:30:00")).unwrap();

        let lines = log.read_history().unwrap().unwrap();
        assert_eq!(
            lines,
            vec![
                "Data: 2024-03-09 08:25:00 - Ciclo concluído!",
                "Data: 2024-03-09 08:30:00 - Ciclo concluído!",
            ]
        );
        let raw = fs::read_to_string(log.path()).unwrap();
        assert!(raw.ends_with("Ciclo concluído!\n"));
    }

    #[test]
    fn existing_content_is_preserved() {
        let (log, _dir) = temp_log();
        fs::write(log.path(), "hand written note\n").unwrap();

        log.record_completion(at("2024-03-09 08:25:00")).unwrap();

        let lines = log.read_history().unwrap().unwrap();
        assert_eq!(lines[0], "hand written note");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn append_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let log = StudyLog::new(dir.path());

        let err = log.record_completion(at("2024-03-09 08:25:00")).unwrap_err();
        assert!(matches!(err, HistoryError::Append { .. }));
    }

    #[test]
    fn unreadable_history_is_an_error() {
        let dir = TempDir::new().unwrap();
        let log = StudyLog::new(dir.path());

        assert!(matches!(log.read_history(), Err(HistoryError::Read { .. })));
    }

    #[test]
    fn counts_only_the_requested_day() {
        let lines: Vec<String> = [
            "Data: 2024-03-08 23:59:59 - Ciclo concluído!",
            "Data: 2024-03-09 00:00:00 - Ciclo concluído!",
            "garbage",
            "Data: 2024-03-09 17:45:12 - Ciclo concluído!",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(completions_on(&lines, day), 2);
    }
}
