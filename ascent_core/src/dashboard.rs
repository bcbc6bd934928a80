//! Dashboard data: stats for a period plus the latest sessions.
//!
//! Both calls are issued together and complete in any order; the dashboard is
//! only built once both have succeeded.

use crate::client::ApiClient;
use crate::types::{Session, SessionQuery, StatsSummary};
use crate::{Error, Result};
use chrono::{Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Number of recent sessions shown by default
pub const DEFAULT_RECENT_LIMIT: u32 = 5;

/// Look-back window for the stats cards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Period {
    #[default]
    Week,
    Month,
    Quarter,
}

impl Period {
    pub fn days(&self) -> i64 {
        match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
        }
    }

    pub fn from_days(days: u32) -> Result<Self> {
        match days {
            7 => Ok(Period::Week),
            30 => Ok(Period::Month),
            90 => Ok(Period::Quarter),
            other => Err(Error::Validation(format!(
                "unsupported period of {} days (expected 7, 30 or 90)",
                other
            ))),
        }
    }

    /// Inclusive `(start, end)` window ending on `today`
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        (today - Duration::days(self.days()), today)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "last {} days", self.days())
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let days = s
            .trim()
            .trim_end_matches('d')
            .parse::<u32>()
            .map_err(|_| Error::Validation(format!("invalid period '{}'", s)))?;
        Self::from_days(days)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub period: Period,
    pub stats: StatsSummary,
    pub recent_sessions: Vec<Session>,
}

/// Fetch stats and recent sessions concurrently.
///
/// Fails with the first error; a partial dashboard is never returned.
pub async fn load_dashboard(
    client: &ApiClient,
    period: Period,
    today: NaiveDate,
    recent_limit: u32,
) -> Result<Dashboard> {
    let (start, end) = period.range(today);
    let query = SessionQuery::limit(recent_limit);

    let (stats, recent_sessions) =
        tokio::try_join!(client.get_stats(start, end), client.get_sessions(&query))?;

    tracing::debug!(
        "Dashboard loaded: {} recent sessions for {}",
        recent_sessions.len(),
        period
    );

    Ok(Dashboard {
        period,
        stats,
        recent_sessions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientConfig, Method};
    use crate::testing::MockTransport;
    use crate::token_store::{MemoryTokenStore, TokenStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const SESSIONS_JSON: &str = r#"[
        {"id": 1, "session_date": "2024-05-01", "duration": 90, "difficulty": "6a", "session_type": "salle"},
        {"id": 2, "session_date": "2024-04-28", "duration": 120, "difficulty": "6c", "session_type": "falaise"}
    ]"#;

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::with_transport(
            ClientConfig::default(),
            mock.clone(),
            Arc::new(MemoryTokenStore::with_token("t")),
        )
    }

    fn may_1st() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn test_period_parsing_and_range() {
        assert_eq!("30".parse::<Period>().unwrap(), Period::Month);
        assert_eq!("90d".parse::<Period>().unwrap(), Period::Quarter);
        assert!("14".parse::<Period>().is_err());

        let (start, end) = Period::Week.range(may_1st());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 4, 24).unwrap());
        assert_eq!(end, may_1st());
    }

    #[tokio::test]
    async fn test_requests_are_in_flight_together() {
        // Each response is held until both requests have arrived, so a
        // sequential implementation would never finish.
        let mock = Arc::new(
            MockTransport::new()
                .respond(Method::GET, "/stats", 200, r#"{"total_sessions": 2, "total_duration": 210}"#)
                .respond(Method::GET, "/sessions", 200, SESSIONS_JSON)
                .rendezvous(2),
        );
        let client = client(&mock);

        let dashboard = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            load_dashboard(&client, Period::Week, may_1st(), DEFAULT_RECENT_LIMIT),
        )
        .await
        .expect("dashboard requests were not issued concurrently")
        .unwrap();

        assert_eq!(dashboard.stats.total_sessions, Some(2));
        assert_eq!(dashboard.stats.total_hours(), 4);
        assert_eq!(dashboard.recent_sessions.len(), 2);

        let sent = mock.requests();
        let stats_req = sent.iter().find(|r| r.path == "/stats").unwrap();
        assert_eq!(
            stats_req.query,
            vec![
                ("start_date".to_string(), "2024-04-24".to_string()),
                ("end_date".to_string(), "2024-05-01".to_string()),
            ]
        );
        let sessions_req = sent.iter().find(|r| r.path == "/sessions").unwrap();
        assert_eq!(sessions_req.query, vec![("limit".to_string(), "5".to_string())]);
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_dashboard() {
        let mock = Arc::new(
            MockTransport::new()
                .respond(Method::GET, "/stats", 500, r#"{"detail": "stats offline"}"#)
                .respond(Method::GET, "/sessions", 200, SESSIONS_JSON),
        );
        let client = client(&mock);

        let err = load_dashboard(&client, Period::Month, may_1st(), 5)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_concurrent_401s_fire_hook_once() {
        let mock = Arc::new(
            MockTransport::new()
                .respond(Method::GET, "/stats", 401, r#"{"detail": "Not authenticated"}"#)
                .respond(Method::GET, "/sessions", 401, r#"{"detail": "Not authenticated"}"#)
                .rendezvous(2),
        );
        let tokens = Arc::new(MemoryTokenStore::with_token("expired"));
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let client = ApiClient::with_transport(ClientConfig::default(), mock.clone(), tokens.clone())
            .on_unauthorized(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let err = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            load_dashboard(&client, Period::Week, may_1st(), DEFAULT_RECENT_LIMIT),
        )
        .await
        .expect("dashboard requests were not issued concurrently")
        .unwrap_err();

        assert!(matches!(err, crate::Error::Unauthorized));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(tokens.get().unwrap(), None);
        assert_eq!(mock.requests().len(), 2);
    }
}
