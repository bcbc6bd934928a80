//! Client-side filtering of the session list by recency.

use crate::types::Session;
use crate::{Error, Result};
use chrono::{Duration, NaiveDate};
use std::str::FromStr;

/// Which sessions the list view shows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionFilter {
    #[default]
    All,
    /// Last 7 days, today included
    Week,
    /// Last 30 days, today included
    Month,
}

impl SessionFilter {
    fn window_days(&self) -> Option<i64> {
        match self {
            SessionFilter::All => None,
            SessionFilter::Week => Some(7),
            SessionFilter::Month => Some(30),
        }
    }

    /// Earliest date kept, `None` for no lower bound
    pub fn since(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.window_days()
            .map(|days| today - Duration::days(days - 1))
    }

    pub fn matches(&self, session: &Session, today: NaiveDate) -> bool {
        match self.since(today) {
            Some(since) => session.session_date >= since && session.session_date <= today,
            None => true,
        }
    }

    /// Keep matching sessions, preserving order
    pub fn apply(&self, sessions: Vec<Session>, today: NaiveDate) -> Vec<Session> {
        sessions
            .into_iter()
            .filter(|s| self.matches(s, today))
            .collect()
    }
}

impl FromStr for SessionFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(SessionFilter::All),
            "week" => Ok(SessionFilter::Week),
            "month" => Ok(SessionFilter::Month),
            other => Err(Error::Validation(format!(
                "unknown filter '{}' (expected all, week or month)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_on(id: i64, date: NaiveDate) -> Session {
        Session {
            id,
            title: None,
            session_date: date,
            duration: 60,
            difficulty: "6a".into(),
            location: None,
            session_type: Some("bloc".into()),
            notes: None,
            exercise_count: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_week_window_is_inclusive() {
        let today = day(10);
        assert_eq!(SessionFilter::Week.since(today), Some(day(4)));

        let sessions = vec![session_on(1, day(10)), session_on(2, day(4)), session_on(3, day(3))];
        let kept = SessionFilter::Week.apply(sessions, today);
        let ids: Vec<_> = kept.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_all_keeps_everything() {
        let sessions = vec![session_on(1, day(1)), session_on(2, day(20))];
        assert_eq!(SessionFilter::All.apply(sessions, day(10)).len(), 2);
    }

    #[test]
    fn test_month_excludes_future_dates() {
        let today = day(10);
        assert!(SessionFilter::Month.matches(&session_on(1, day(1)), today));
        assert!(!SessionFilter::Month.matches(&session_on(2, day(11)), today));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!("Week".parse::<SessionFilter>().unwrap(), SessionFilter::Week);
        assert!("year".parse::<SessionFilter>().is_err());
    }
}
