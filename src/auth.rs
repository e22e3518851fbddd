//! Session handling for the catalog API
//!
//! A stored session is either restored as-is or the user goes through an
//! interactive login: credentials are prompted for and submitted, the
//! backend may answer with a challenge (e.g. a CAPTCHA page) that must be
//! solved, and the result is an authenticated session.

use crate::catalog::{AudibleClient, CatalogClient};
use crate::error::AuthError;
use crate::marketplace::Marketplace;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

/// Stored credentials for one marketplace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub marketplace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Save the session as JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write session {:?}", path))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    /// The session, or an error telling the user to log in
    pub fn require(self) -> Result<Session, AuthError> {
        match self {
            SessionState::Authenticated(session) => Ok(session),
            SessionState::Unauthenticated => Err(AuthError::NotLoggedIn),
        }
    }
}

/// Try to restore a stored session for `marketplace`.
///
/// Missing, unreadable, expired or other-marketplace sessions all yield
/// `Unauthenticated`; the reason is logged.
pub fn restore_session(path: &Path, marketplace: Marketplace, now: DateTime<Utc>) -> SessionState {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            info!("no stored session at {}: {}", path.display(), e);
            return SessionState::Unauthenticated;
        }
    };

    let session: Session = match serde_json::from_str(&content) {
        Ok(session) => session,
        Err(e) => {
            warn!("ignoring unreadable session {}: {}", path.display(), e);
            return SessionState::Unauthenticated;
        }
    };

    if session.marketplace != marketplace.code {
        info!(
            "stored session is for marketplace '{}', not '{}'",
            session.marketplace, marketplace.code
        );
        return SessionState::Unauthenticated;
    }

    if session.is_expired(now) {
        warn!("{}", AuthError::Expired(session.expires_at.unwrap_or(now)));
        return SessionState::Unauthenticated;
    }

    SessionState::Authenticated(session)
}

/// Confirm a restored session with one cheap library call.
///
/// A token the server rejects yields `Unauthenticated` so the caller can
/// log in again; any other failure is returned as-is.
pub async fn verify_session<C: CatalogClient + ?Sized>(
    session: Session,
    catalog: &C,
) -> Result<SessionState> {
    match catalog.library(1).await {
        Ok(_) => Ok(SessionState::Authenticated(session)),
        Err(e) if matches!(e.downcast_ref::<AuthError>(), Some(AuthError::Rejected { .. })) => {
            warn!("stored session was rejected: {}", e);
            Ok(SessionState::Unauthenticated)
        }
        Err(e) => Err(e),
    }
}

/// Remove a stored session. Returns whether one existed.
pub fn clear_session(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove session {:?}", path))?;
        Ok(true)
    } else {
        Ok(false)
    }
}

// ============================================================================
// Interactive login
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
}

/// Backend answer to submitted credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Authenticated(Session),
    /// Extra verification step; `TokenLogin` never asks for one
    #[cfg_attr(not(test), allow(dead_code))]
    Challenge { url: String },
}

/// States of the interactive login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    Prompt,
    Submit(Credentials),
    Challenge { url: String, credentials: Credentials },
    Authenticated(Session),
}

#[async_trait]
pub trait LoginBackend: Send + Sync {
    async fn submit(&self, credentials: &Credentials) -> Result<SubmitOutcome>;

    async fn answer_challenge(&self, credentials: &Credentials, answer: &str) -> Result<Session>;
}

/// Source of user input for the login flow
pub trait LoginPrompter {
    fn credentials(&mut self) -> Result<Credentials>;

    fn challenge(&mut self, url: &str) -> Result<String>;
}

/// Drive the login state machine until it reaches `Authenticated`
pub async fn run_login_flow<B, P>(backend: &B, prompter: &mut P) -> Result<Session>
where
    B: LoginBackend + ?Sized,
    P: LoginPrompter + ?Sized,
{
    let mut step = LoginStep::Prompt;
    loop {
        step = match step {
            LoginStep::Prompt => LoginStep::Submit(prompter.credentials()?),
            LoginStep::Submit(credentials) => match backend.submit(&credentials).await? {
                SubmitOutcome::Authenticated(session) => LoginStep::Authenticated(session),
                SubmitOutcome::Challenge { url } => LoginStep::Challenge { url, credentials },
            },
            LoginStep::Challenge { url, credentials } => {
                let answer = prompter.challenge(&url)?;
                let answer = answer.trim();
                if answer.is_empty() {
                    return Err(AuthError::ChallengeUnanswered.into());
                }
                LoginStep::Authenticated(backend.answer_challenge(&credentials, answer).await?)
            }
            LoginStep::Authenticated(session) => return Ok(session),
        };
    }
}

/// Login backend that accepts an existing API access token and checks it
/// against the library endpoint
pub struct TokenLogin {
    marketplace: Marketplace,
    user_agent: String,
}

impl TokenLogin {
    pub fn new(marketplace: Marketplace, user_agent: impl Into<String>) -> Self {
        Self {
            marketplace,
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl LoginBackend for TokenLogin {
    async fn submit(&self, credentials: &Credentials) -> Result<SubmitOutcome> {
        let client =
            AudibleClient::with_token(&credentials.access_token, self.marketplace, &self.user_agent)?;
        client.verify().await?;
        Ok(SubmitOutcome::Authenticated(Session {
            access_token: credentials.access_token.clone(),
            marketplace: self.marketplace.code.to_string(),
            expires_at: None,
        }))
    }

    async fn answer_challenge(&self, _credentials: &Credentials, _answer: &str) -> Result<Session> {
        // Token submission never issues a challenge
        Err(AuthError::ChallengeUnanswered.into())
    }
}

/// Prompts on a line-oriented terminal
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            anyhow::bail!("Input closed before login finished");
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> LoginPrompter for TerminalPrompter<R, W> {
    fn credentials(&mut self) -> Result<Credentials> {
        loop {
            let token = self.ask("Access token: ")?;
            if !token.is_empty() {
                return Ok(Credentials {
                    access_token: token,
                });
            }
        }
    }

    fn challenge(&mut self, url: &str) -> Result<String> {
        writeln!(self.output, "Verification required. Open this page in a browser:")?;
        writeln!(self.output, "  {}", url)?;
        self.ask("Answer: ")
    }
}
