//! Outbound identity: user-agent rotation and session headers

use crate::config::SessionConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Rotates user agents and carries the session headers for every request
#[derive(Debug)]
pub struct Identity {
    user_agents: Vec<String>,
    cursor: AtomicUsize,
    headers: HeaderMap,
}

impl Identity {
    /// Builds the identity from the session configuration
    ///
    /// Headers whose name or value cannot be sent on the wire are skipped
    /// with a warning.
    pub fn new(session: &SessionConfig) -> Self {
        let mut headers = HeaderMap::new();

        for (name, value) in &session.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Skipping unusable header {}", name),
            }
        }

        if let Some(cookie) = &session.cookie {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(_) => tracing::warn!("Skipping cookie with invalid characters"),
            }
        }

        Self {
            user_agents: session.user_agents.clone(),
            cursor: AtomicUsize::new(0),
            headers,
        }
    }

    /// Returns the user agent for the next attempt, cycling through the list
    pub fn next_user_agent(&self) -> Option<&str> {
        if self.user_agents.is_empty() {
            return None;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        Some(&self.user_agents[i])
    }

    /// Headers attached to every request (cookie and configured extras)
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}
