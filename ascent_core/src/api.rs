//! Domain API calls, one per backend operation.
//!
//! Each call makes exactly one request and returns the parsed body. Errors
//! propagate untouched; nothing here retries or validates.

use crate::client::{ApiClient, ApiRequest, Method};
use crate::types::*;
use crate::Result;
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

impl ApiClient {
    // ------------------------------------------------------------------
    // Auth (anonymous)
    // ------------------------------------------------------------------

    /// `POST /auth/login`, form-encoded. The backend keys accounts by email
    /// but the OAuth2 form field is called `username`.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let request = ApiRequest::new(Method::POST, "/auth/login").form(vec![
            ("username".to_string(), email.to_string()),
            ("password".to_string(), password.to_string()),
        ]);
        let response = self.send_anonymous(request).await?;
        response.error_for_status()?.json()
    }

    /// `POST /auth/register`, JSON body
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let request = ApiRequest::new(Method::POST, "/auth/register").json(request)?;
        let response = self.send_anonymous(request).await?;
        response.error_for_status()?.json()
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get_json("/users/me", Vec::new()).await
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub async fn get_sessions(&self, query: &SessionQuery) -> Result<Vec<Session>> {
        self.get_json("/sessions", query.to_pairs()).await
    }

    pub async fn get_session(&self, id: i64) -> Result<Session> {
        self.get_json(&format!("/sessions/{}", id), Vec::new()).await
    }

    pub async fn create_session(&self, input: &SessionInput) -> Result<Session> {
        self.send_json(Method::POST, "/sessions", input).await
    }

    pub async fn update_session(&self, id: i64, update: &SessionUpdate) -> Result<Session> {
        self.send_json(Method::PUT, &format!("/sessions/{}", id), update)
            .await
    }

    /// The response body, if any, is ignored
    pub async fn delete_session(&self, id: i64) -> Result<()> {
        let request = ApiRequest::new(Method::DELETE, format!("/sessions/{}", id));
        self.send(request).await?.error_for_status()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Exercises
    // ------------------------------------------------------------------

    pub async fn get_exercises(&self) -> Result<Vec<Exercise>> {
        self.get_json("/exercises", Vec::new()).await
    }

    pub async fn create_exercise(&self, input: &ExerciseInput) -> Result<Exercise> {
        self.send_json(Method::POST, "/exercises", input).await
    }

    // ------------------------------------------------------------------
    // Stats
    // ------------------------------------------------------------------

    /// `GET /stats?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
    pub async fn get_stats(&self, start: NaiveDate, end: NaiveDate) -> Result<StatsSummary> {
        let query = vec![
            ("start_date".to_string(), start.format(DATE_FORMAT).to_string()),
            ("end_date".to_string(), end.format(DATE_FORMAT).to_string()),
        ];
        self.get_json("/stats", query).await
    }

    // ------------------------------------------------------------------
    // Programs
    // ------------------------------------------------------------------

    pub async fn get_programs(&self) -> Result<Vec<Program>> {
        self.get_json("/programs", Vec::new()).await
    }

    pub async fn create_program(&self, input: &ProgramInput) -> Result<Program> {
        self.send_json(Method::POST, "/programs", input).await
    }

    // ------------------------------------------------------------------
    // Goals
    // ------------------------------------------------------------------

    pub async fn get_goals(&self) -> Result<Vec<Goal>> {
        self.get_json("/goals", Vec::new()).await
    }

    pub async fn create_goal(&self, input: &GoalInput) -> Result<Goal> {
        self.send_json(Method::POST, "/goals", input).await
    }

    pub async fn update_goal(&self, id: i64, update: &GoalUpdate) -> Result<Goal> {
        self.send_json(Method::PUT, &format!("/goals/{}", id), update)
            .await
    }
}
