//! Data transfer objects exchanged with the training backend.
//!
//! These are passive types: the client enforces nothing beyond what the
//! forms check before submitting.
//! - Users and auth payloads
//! - Climbing sessions, grades and session types
//! - Exercises, programs, goals
//! - The opaque stats read model

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Users and Auth
// ============================================================================

/// A registered user, as returned by `/users/me` and `/auth/register`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

/// JSON body of `POST /auth/register`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Credential payload returned by `POST /auth/login`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".into()
}

// ============================================================================
// Climbing Sessions
// ============================================================================

/// Climbing difficulty grade, from 5a up to 8a
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Grade {
    #[serde(rename = "5a")]
    G5a,
    #[serde(rename = "5b")]
    G5b,
    #[serde(rename = "5c")]
    G5c,
    #[default]
    #[serde(rename = "6a")]
    G6a,
    #[serde(rename = "6b")]
    G6b,
    #[serde(rename = "6c")]
    G6c,
    #[serde(rename = "7a")]
    G7a,
    #[serde(rename = "7b")]
    G7b,
    #[serde(rename = "7c")]
    G7c,
    #[serde(rename = "8a")]
    G8a,
}

impl Grade {
    /// Every grade on the ladder, easiest first
    pub const ALL: [Grade; 10] = [
        Grade::G5a,
        Grade::G5b,
        Grade::G5c,
        Grade::G6a,
        Grade::G6b,
        Grade::G6c,
        Grade::G7a,
        Grade::G7b,
        Grade::G7c,
        Grade::G8a,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::G5a => "5a",
            Grade::G5b => "5b",
            Grade::G5c => "5c",
            Grade::G6a => "6a",
            Grade::G6b => "6b",
            Grade::G6c => "6c",
            Grade::G7a => "7a",
            Grade::G7b => "7b",
            Grade::G7c => "7c",
            Grade::G8a => "8a",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grade {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let wanted = s.trim().to_lowercase();
        Grade::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == wanted)
            .ok_or_else(|| {
                crate::Error::Validation(format!(
                    "unknown grade '{}' (expected 5a..8a)",
                    s
                ))
            })
    }
}

/// Where the session took place
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Indoor gym
    #[default]
    Salle,
    /// Outdoor crag
    Falaise,
    /// Bouldering
    Bloc,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Salle => "salle",
            SessionType::Falaise => "falaise",
            SessionType::Bloc => "bloc",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "salle" | "gym" => Ok(SessionType::Salle),
            "falaise" | "crag" => Ok(SessionType::Falaise),
            "bloc" | "boulder" => Ok(SessionType::Bloc),
            other => Err(crate::Error::Validation(format!(
                "unknown session type '{}' (expected salle, falaise or bloc)",
                other
            ))),
        }
    }
}

/// A logged climbing session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub session_date: NaiveDate,
    pub duration: u32,
    /// Kept as returned; the backend may know grades the client does not
    pub difficulty: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Free text on the backend, `None` when unset
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exercise_count: Option<u32>,
}

impl Session {
    /// Title shown in lists, falling back to a generic label
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => "Session",
        }
    }

    pub fn session_type_label(&self) -> &str {
        self.session_type.as_deref().unwrap_or("-")
    }
}

/// Body of `POST /sessions`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub session_date: NaiveDate,
    pub duration: u32,
    pub difficulty: Grade,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub session_type: SessionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SessionInput {
    pub fn new(session_date: NaiveDate, duration: u32, difficulty: Grade, session_type: SessionType) -> Self {
        Self {
            title: None,
            session_date,
            duration,
            difficulty,
            location: None,
            session_type,
            notes: None,
        }
    }
}

/// Body of `PUT /sessions/{id}`; only fields that are set get sent
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Grade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_type: Option<SessionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SessionUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Query parameters accepted by `GET /sessions`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionQuery {
    pub limit: Option<u32>,
    pub skip: Option<u32>,
}

impl SessionQuery {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            skip: None,
        }
    }

    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip".to_string(), skip.to_string()));
        }
        pairs
    }
}

// ============================================================================
// Exercises, Programs, Goals
// ============================================================================

/// Exercise category
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Sae,
    Outdoor,
    Running,
    RoutineMorning,
    RoutineEvening,
    Other,
}

impl ExerciseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Sae => "sae",
            ExerciseType::Outdoor => "outdoor",
            ExerciseType::Running => "running",
            ExerciseType::RoutineMorning => "routine_morning",
            ExerciseType::RoutineEvening => "routine_evening",
            ExerciseType::Other => "other",
        }
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sae" => Ok(ExerciseType::Sae),
            "outdoor" => Ok(ExerciseType::Outdoor),
            "running" => Ok(ExerciseType::Running),
            "routine_morning" => Ok(ExerciseType::RoutineMorning),
            "routine_evening" => Ok(ExerciseType::RoutineEvening),
            "other" => Ok(ExerciseType::Other),
            other => Err(crate::Error::Validation(format!(
                "unknown exercise type '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    #[serde(default)]
    pub duration_min: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
    /// 1 (easy) to 5 (very intense)
    #[serde(default)]
    pub intensity: Option<u8>,
    #[serde(default)]
    pub focus: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseInput {
    pub name: String,
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgramInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub required_count: u32,
    #[serde(default)]
    pub order: Option<i32>,
    /// Computed server-side, shape owned by the backend
    #[serde(default)]
    pub progress: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GoalInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct GoalUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

// ============================================================================
// Stats
// ============================================================================

/// Aggregates for a date range, computed entirely by the backend
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct StatsSummary {
    #[serde(default)]
    pub total_sessions: Option<u64>,
    /// Minutes
    #[serde(default)]
    pub total_duration: Option<f64>,
    #[serde(default)]
    pub avg_difficulty: Option<serde_json::Value>,
    /// Percentage
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StatsSummary {
    /// Total time in whole hours, rounded
    pub fn total_hours(&self) -> i64 {
        (self.total_duration.unwrap_or(0.0) / 60.0).round() as i64
    }

    /// Average grade for display, `-` when the backend has none
    pub fn avg_difficulty_label(&self) -> String {
        match &self.avg_difficulty {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => "-".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_ladder_is_ordered() {
        assert!(Grade::G5a < Grade::G6a);
        assert!(Grade::G7c < Grade::G8a);
        assert_eq!(Grade::ALL.first(), Some(&Grade::G5a));
        assert_eq!(Grade::ALL.last(), Some(&Grade::G8a));
    }

    #[test]
    fn test_grade_parse_and_serialize() {
        assert_eq!("6A".parse::<Grade>().unwrap(), Grade::G6a);
        assert!("9c".parse::<Grade>().is_err());
        assert_eq!(serde_json::to_string(&Grade::G7b).unwrap(), "\"7b\"");
    }

    #[test]
    fn test_session_input_omits_empty_optionals() {
        let input = SessionInput::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            90,
            Grade::G6a,
            SessionType::Salle,
        );
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "session_date": "2024-05-01",
                "duration": 90,
                "difficulty": "6a",
                "session_type": "salle",
            })
        );
    }

    #[test]
    fn test_session_deserializes_unknown_grade() {
        let json = r#"{
            "id": 3,
            "session_date": "2024-05-01",
            "duration": 60,
            "difficulty": "8b+",
            "session_type": "falaise"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.difficulty, "8b+");
        assert_eq!(session.display_title(), "Session");
        assert_eq!(session.exercise_count, None);
    }

    #[test]
    fn test_session_keeps_free_form_or_missing_type() {
        let json = r#"[
            {"id": 1, "session_date": "2024-05-01", "duration": 60, "difficulty": "6a", "session_type": "force"},
            {"id": 2, "session_date": "2024-05-02", "duration": 45, "difficulty": "6b", "session_type": null},
            {"id": 3, "session_date": "2024-05-03", "duration": 30, "difficulty": "5c"}
        ]"#;
        let sessions: Vec<Session> = serde_json::from_str(json).unwrap();
        assert_eq!(sessions[0].session_type.as_deref(), Some("force"));
        assert_eq!(sessions[1].session_type, None);
        assert_eq!(sessions[2].session_type_label(), "-");
    }

    #[test]
    fn test_session_update_only_sends_set_fields() {
        let update = SessionUpdate {
            duration: Some(45),
            ..Default::default()
        };
        assert!(!update.is_empty());
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({ "duration": 45 })
        );
        assert!(SessionUpdate::default().is_empty());
    }

    #[test]
    fn test_stats_keeps_unknown_fields() {
        let json = r#"{"total_sessions": 4, "total_duration": 330, "progress": 12.5, "by_type": {"bloc": 2}}"#;
        let stats: StatsSummary = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_sessions, Some(4));
        assert_eq!(stats.total_hours(), 6);
        assert_eq!(stats.avg_difficulty_label(), "-");
        assert!(stats.extra.contains_key("by_type"));
    }

    #[test]
    fn test_exercise_type_field_name() {
        let json = r#"{"id": 1, "name": "Hangboard", "type": "routine_morning"}"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.exercise_type, ExerciseType::RoutineMorning);
        assert_eq!("routine-evening".parse::<ExerciseType>().unwrap(), ExerciseType::RoutineEvening);
        assert_eq!(ExerciseType::RoutineMorning.to_string(), "routine_morning");
    }
}
