//! REST client for the hosted row store.
//!
//! The store exposes one generic surface the whole portal is built on:
//! `select` a collection with equality filters and an order, `insert`
//! returning the created row, `update` a row by id, `delete` a row by id.
//! Typed wrappers per collection convert wire rows into domain records at
//! this boundary so nothing else depends on backend column names.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::SessionData;
use crate::models::{
    ApplicationStatus, ApplicationStatusPatch, AttendanceRecord, AttendanceRow,
    CampusApplication, CampusApplicationRow, JobApplication, JobApplicationRow, JobPosting,
    JobPostingRow, NewAttendance, NewUser, PostingStatus, ProjectBudget, BudgetRow, Role,
    UserPatch, UserRecord, UserRow,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path prefix for row operations.
const REST_PREFIX: &str = "rest/v1";

/// Path prefix for authentication.
const AUTH_PREFIX: &str = "auth/v1";

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) reads.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Store client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct StoreClient {
    client: Client,
    base_url: String,
    api_key: String,
    token: Option<String>,
}

impl StoreClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    fn rest_url(&self, collection: &str) -> String {
        format!("{}/{}/{}", self.base_url, REST_PREFIX, collection)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert("apikey", header::HeaderValue::from_str(&self.api_key)?);
        // Unauthenticated requests fall back to the anon key as bearer
        let bearer = self.token.as_deref().unwrap_or(&self.api_key);
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", bearer))?,
        );
        Ok(headers)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Authenticate against the platform and return session data.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<SessionData> {
        let url = format!(
            "{}/{}/token?grant_type=password",
            self.base_url, AUTH_PREFIX
        );

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .context("Failed to send authentication request")?;

        let response = Self::check_response(response).await?;

        let auth: AuthResponse = response
            .json()
            .await
            .context("Failed to parse auth response")?;

        debug!(expires_in = ?auth.expires_in, "Authenticated");

        Ok(SessionData {
            token: auth.access_token,
            user_id: auth.user.id,
            email: auth.user.email.unwrap_or_else(|| email.to_string()),
            created_at: Utc::now(),
        })
    }

    // =========================================================================
    // Response plumbing
    // =========================================================================

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit
    /// (should retry), or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    // =========================================================================
    // Generic row operations
    // =========================================================================

    /// Fetch rows from a collection. `query` carries equality filters and
    /// modifiers in the store's native form (`("role", "eq.admin")`,
    /// `("order", "created_at.desc")`). Rate-limited reads are retried with
    /// exponential backoff.
    pub async fn select<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = self.rest_url(collection);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(&url)
                .headers(self.auth_headers()?)
                .query(query)
                .send()
                .await
                .with_context(|| format!("Failed to query {}", collection))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    return response
                        .json()
                        .await
                        .with_context(|| format!("Failed to parse {} response", collection));
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(
                        collection,
                        retry = retries,
                        backoff_ms,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    /// Insert a single row and return the stored representation
    /// (with the store-assigned id). Writes are never retried.
    pub async fn insert_returning<B: Serialize, T: DeserializeOwned>(
        &self,
        collection: &str,
        row: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(self.rest_url(collection))
            .headers(self.auth_headers()?)
            .header("Prefer", "return=representation")
            .json(&[row])
            .send()
            .await
            .with_context(|| format!("Failed to insert into {}", collection))?;

        let response = Self::check_response(response).await?;

        let mut rows: Vec<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} insert response", collection))?;

        rows.pop().ok_or_else(|| {
            ApiError::InvalidResponse(format!("{}: insert returned no rows", collection)).into()
        })
    }

    /// Insert a batch of rows without asking for the representation back.
    pub async fn insert_many<B: Serialize>(&self, collection: &str, rows: &[B]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(self.rest_url(collection))
            .headers(self.auth_headers()?)
            .json(rows)
            .send()
            .await
            .with_context(|| format!("Failed to insert into {}", collection))?;

        Self::check_response(response).await?;
        Ok(())
    }

    /// Apply a partial update to one row by id.
    pub async fn update<B: Serialize>(&self, collection: &str, id: &str, patch: &B) -> Result<()> {
        let response = self
            .client
            .patch(self.rest_url(collection))
            .headers(self.auth_headers()?)
            .query(&[("id", format!("eq.{}", id))])
            .json(patch)
            .send()
            .await
            .with_context(|| format!("Failed to update {}", collection))?;

        Self::check_response(response).await?;
        Ok(())
    }

    /// Delete one row by id.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.rest_url(collection))
            .headers(self.auth_headers()?)
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .with_context(|| format!("Failed to delete from {}", collection))?;

        Self::check_response(response).await?;
        Ok(())
    }

    // =========================================================================
    // Typed fetches
    // =========================================================================

    /// Fetch every user with the given role, newest first.
    pub async fn fetch_users(&self, role: Role) -> Result<Vec<UserRecord>> {
        let rows: Vec<UserRow> = self
            .select(
                "users",
                &[
                    ("select", "*".to_string()),
                    ("role", format!("eq.{}", role.as_str())),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(UserRow::to_record).collect())
    }

    /// Fetch the three staff rosters concurrently: (admins, employees, hr).
    pub async fn fetch_rosters(
        &self,
    ) -> Result<(Vec<UserRecord>, Vec<UserRecord>, Vec<UserRecord>)> {
        futures::try_join!(
            self.fetch_users(Role::Admin),
            self.fetch_users(Role::Employee),
            self.fetch_users(Role::Hr),
        )
    }

    pub async fn fetch_postings(&self) -> Result<Vec<JobPosting>> {
        let rows: Vec<JobPostingRow> = self
            .select(
                "job_postings",
                &[
                    ("select", "*".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(JobPostingRow::to_record).collect())
    }

    pub async fn fetch_applications(&self) -> Result<Vec<JobApplication>> {
        let rows: Vec<JobApplicationRow> = self
            .select(
                "job_applications",
                &[
                    ("select", "*".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(JobApplicationRow::to_record).collect())
    }

    pub async fn fetch_campus_applications(&self) -> Result<Vec<CampusApplication>> {
        let rows: Vec<CampusApplicationRow> = self
            .select(
                "campus_applications",
                &[
                    ("select", "*".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(CampusApplicationRow::to_record).collect())
    }

    /// Fetch attendance with the owning user embedded for display/search.
    pub async fn fetch_attendance(&self) -> Result<Vec<AttendanceRecord>> {
        let rows: Vec<AttendanceRow> = self
            .select(
                "attendance",
                &[
                    ("select", "*,users(name,employee_id)".to_string()),
                    ("order", "date.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(AttendanceRow::to_record).collect())
    }

    /// Fetch attendance rows for a single date (auto-absent planning).
    pub async fn fetch_attendance_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>> {
        let rows: Vec<AttendanceRow> = self
            .select(
                "attendance",
                &[
                    ("select", "*".to_string()),
                    ("date", format!("eq.{}", date)),
                ],
            )
            .await?;
        Ok(rows.iter().map(AttendanceRow::to_record).collect())
    }

    pub async fn fetch_budgets(&self) -> Result<Vec<ProjectBudget>> {
        let rows: Vec<BudgetRow> = self
            .select(
                "project_budgets",
                &[
                    ("select", "*".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(BudgetRow::to_record).collect())
    }

    // =========================================================================
    // Typed mutations
    // =========================================================================

    pub async fn create_user(&self, user: &NewUser) -> Result<UserRecord> {
        let row: UserRow = self.insert_returning("users", user).await?;
        Ok(row.to_record())
    }

    pub async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<()> {
        self.update("users", id, patch).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<()> {
        self.delete("users", id).await
    }

    pub async fn set_posting_status(&self, id: &str, status: PostingStatus) -> Result<()> {
        self.update(
            "job_postings",
            id,
            &serde_json::json!({ "status": status.as_str() }),
        )
        .await
    }

    pub async fn delete_posting(&self, id: &str) -> Result<()> {
        self.delete("job_postings", id).await
    }

    pub async fn set_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<()> {
        self.update("job_applications", id, &ApplicationStatusPatch::new(status))
            .await
    }

    pub async fn set_campus_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<()> {
        self.update(
            "campus_applications",
            id,
            &ApplicationStatusPatch::new(status),
        )
        .await
    }

    pub async fn insert_attendance(&self, rows: &[NewAttendance]) -> Result<()> {
        self.insert_many("attendance", rows).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_url_trims_trailing_slash() {
        let client = StoreClient::new("https://store.example.com/", "anon-key")
            .expect("client should build");
        assert_eq!(
            client.rest_url("users"),
            "https://store.example.com/rest/v1/users"
        );
    }

    #[test]
    fn test_parse_auth_response() {
        let json = r#"{
            "access_token": "jwt-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {
                "id": "6f1c6c0a-9f3e-4d5b-8e7a-2b3c4d5e6f70",
                "aud": "authenticated",
                "email": "admin@example.com"
            }
        }"#;

        let auth: AuthResponse = serde_json::from_str(json).expect("auth response should parse");
        assert_eq!(auth.access_token, "jwt-token");
        assert_eq!(auth.expires_in, Some(3600));
        assert_eq!(auth.user.email.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn test_parse_users_listing() {
        let json = r#"[
            {"id": "u1", "name": "A", "email": "a@x.com", "role": "admin",
             "employee_id": "ADM001", "isactive": true, "created_at": "2025-01-01T00:00:00Z"},
            {"id": "u2", "name": "B", "email": "b@x.com", "role": "admin",
             "employee_id": null, "isactive": false}
        ]"#;

        let rows: Vec<UserRow> = serde_json::from_str(json).expect("listing should parse");
        assert_eq!(rows.len(), 2);
        let records: Vec<UserRecord> = rows.iter().map(UserRow::to_record).collect();
        assert!(records[0].is_active);
        assert_eq!(records[1].employee_code, None);
    }
}
