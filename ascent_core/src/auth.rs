//! Login, registration and logout flows.
//!
//! Owns the token lifecycle: a token appears on successful login (or
//! registration, which logs in straight after) and disappears on logout or on
//! any 401 seen by the [`ApiClient`].

use crate::client::ApiClient;
use crate::token_store::TokenStore;
use crate::types::{RegisterRequest, User};
use crate::{Error, Result};

/// Shortest password the register form accepts
pub const MIN_PASSWORD_LEN: usize = 6;

/// Fields of the registration form
#[derive(Clone, Debug, Default)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Checks run before anything is sent: passwords match, then length.
    pub fn validate(&self) -> Result<()> {
        if self.password != self.confirm_password {
            return Err(Error::Validation("passwords do not match".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            email: self.email.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        }
    }
}

/// Current-user state on top of an [`ApiClient`]
#[derive(Clone, Debug)]
pub struct AuthSession {
    client: ApiClient,
}

impl AuthSession {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.tokens().is_present()
    }

    /// Exchange credentials for a token and store it
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let token = self.client.login(email.trim(), password).await?;
        self.client.tokens().set(&token.access_token)?;
        tracing::info!("Logged in as {}", email.trim());
        Ok(())
    }

    /// Validate, create the account, then log in with the same credentials
    pub async fn register(&self, form: &RegisterForm) -> Result<User> {
        form.validate()?;
        let user = self.client.register(&form.to_request()).await?;
        tracing::info!("Registered user {} (id {})", user.username, user.id);
        self.login(&form.email, &form.password).await?;
        Ok(user)
    }

    /// Forget the token. Local only; the backend keeps no session state.
    pub fn logout(&self) -> Result<()> {
        self.client.tokens().clear()?;
        tracing::info!("Logged out");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User> {
        self.client.current_user().await
    }
}
