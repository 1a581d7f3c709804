//! Session persistence.
//!
//! One serialized session record: written on login, cleared on logout,
//! read once at startup to restore the signed-in user.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in the state directory
const SESSION_FILE: &str = "session.json";

/// Token lifetime in minutes. Platform JWTs are issued for an hour;
/// treat the session as expired slightly early to avoid mid-request 401s.
const TOKEN_EXPIRY_MINUTES: i64 = 55;

/// Buffer time before expiry to trigger refresh (5 minutes)
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        let expiry = self.created_at + Duration::minutes(TOKEN_EXPIRY_MINUTES);
        Utc::now() > expiry
    }

    /// Check if the session will expire soon and should be refreshed
    pub fn needs_refresh(&self) -> bool {
        let refresh_at = self.created_at
            + Duration::minutes(TOKEN_EXPIRY_MINUTES - TOKEN_REFRESH_BUFFER_MINUTES);
        Utc::now() > refresh_at
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        let expiry = self.created_at + Duration::minutes(TOKEN_EXPIRY_MINUTES);
        (expiry - Utc::now()).num_minutes().max(0)
    }
}

pub struct Session {
    state_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(state_dir: PathBuf) -> Self {
        Self {
            state_dir,
            data: None,
        }
    }

    /// Load session from disk. Expired sessions are ignored.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents =
                std::fs::read_to_string(&path).context("Failed to read session file")?;
            let data: SessionData =
                serde_json::from_str(&contents).context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data (logout)
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Update session with new data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// Get the bearer token if a session exists
    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    fn session_path(&self) -> PathBuf {
        self.state_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_data(age_minutes: i64) -> SessionData {
        SessionData {
            token: "jwt".to_string(),
            user_id: "u1".to_string(),
            email: "admin@example.com".to_string(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_fresh_session_is_valid() {
        let data = session_data(0);
        assert!(!data.is_expired());
        assert!(!data.needs_refresh());
        assert!(data.minutes_until_expiry() > 50);
    }

    #[test]
    fn test_old_session_is_expired() {
        let data = session_data(56);
        assert!(data.is_expired());
        assert_eq!(data.minutes_until_expiry(), 0);
    }

    #[test]
    fn test_aging_session_needs_refresh_before_expiry() {
        let data = session_data(52);
        assert!(!data.is_expired());
        assert!(data.needs_refresh());
    }

    #[test]
    fn test_session_accessors() {
        let mut session = Session::new(PathBuf::from("/tmp/unused"));
        assert!(!session.is_valid());
        assert_eq!(session.token(), None);

        session.update(session_data(0));
        assert!(session.is_valid());
        assert_eq!(session.token(), Some("jwt"));
    }
}
