//! CSV export of climbing sessions.
//!
//! The file is written to a temp file next to the target and renamed into
//! place, so an interrupted export never leaves a half-written CSV behind.

use crate::types::Session;
use crate::{Error, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: i64,
    date: String,
    title: &'a str,
    duration_min: u32,
    difficulty: &'a str,
    session_type: Option<&'a str>,
    location: Option<&'a str>,
    exercise_count: Option<u32>,
    notes: Option<&'a str>,
}

impl<'a> From<&'a Session> for CsvRow<'a> {
    fn from(session: &'a Session) -> Self {
        CsvRow {
            id: session.id,
            date: session.session_date.format("%Y-%m-%d").to_string(),
            title: session.display_title(),
            duration_min: session.duration,
            difficulty: &session.difficulty,
            session_type: session.session_type.as_deref(),
            location: session.location.as_deref(),
            exercise_count: session.exercise_count,
            notes: session.notes.as_deref(),
        }
    }
}

/// Write `sessions` to `path`, replacing any existing file.
///
/// Returns the number of rows written.
pub fn export_sessions_csv(sessions: &[Session], path: &Path) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::env::current_dir()?,
    };
    std::fs::create_dir_all(&parent)?;

    let temp = NamedTempFile::new_in(&parent)?;
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(temp.as_file());

        for session in sessions {
            writer.serialize(CsvRow::from(session))?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} sessions to {:?}", sessions.len(), path);
    Ok(sessions.len())
}
