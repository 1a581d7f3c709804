//! On-disk snapshot store.
//!
//! Every collection snapshot is mirrored to a JSON file so the screens can
//! render immediately on startup, behind the login overlay if need be.
//! Files older than an hour count as stale and trigger a refresh.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::{
    AttendanceRecord, CampusApplication, JobApplication, JobPosting, ProjectBudget, Role,
    UserRecord,
};

/// Consider cache stale after 1 hour.
/// Balances freshness with reducing unnecessary store calls for
/// slowly-changing data.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Covers clock skew too
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            let remaining_mins = minutes % 60;
            if remaining_mins >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            let remaining_hours = (minutes % 1440) / 60;
            if remaining_hours >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }

    // ===== Staff rosters (one file per role) =====

    fn roster_name(role: Role) -> String {
        format!("users_{}", role.as_str())
    }

    pub fn load_roster(&self, role: Role) -> Result<Option<CachedData<Vec<UserRecord>>>> {
        self.load(&Self::roster_name(role))
    }

    pub fn save_roster(&self, role: Role, users: &[UserRecord]) -> Result<()> {
        self.save(&Self::roster_name(role), &users)
    }

    // ===== Job postings =====

    pub fn load_postings(&self) -> Result<Option<CachedData<Vec<JobPosting>>>> {
        self.load("job_postings")
    }

    pub fn save_postings(&self, postings: &[JobPosting]) -> Result<()> {
        self.save("job_postings", &postings)
    }

    // ===== Applications =====

    pub fn load_applications(&self) -> Result<Option<CachedData<Vec<JobApplication>>>> {
        self.load("job_applications")
    }

    pub fn save_applications(&self, applications: &[JobApplication]) -> Result<()> {
        self.save("job_applications", &applications)
    }

    pub fn load_campus_applications(
        &self,
    ) -> Result<Option<CachedData<Vec<CampusApplication>>>> {
        self.load("campus_applications")
    }

    pub fn save_campus_applications(&self, applications: &[CampusApplication]) -> Result<()> {
        self.save("campus_applications", &applications)
    }

    // ===== Attendance =====

    pub fn load_attendance(&self) -> Result<Option<CachedData<Vec<AttendanceRecord>>>> {
        self.load("attendance")
    }

    pub fn save_attendance(&self, records: &[AttendanceRecord]) -> Result<()> {
        self.save("attendance", &records)
    }

    // ===== Budgets =====

    pub fn load_budgets(&self) -> Result<Option<CachedData<Vec<ProjectBudget>>>> {
        self.load("project_budgets")
    }

    pub fn save_budgets(&self, budgets: &[ProjectBudget]) -> Result<()> {
        self.save("project_budgets", &budgets)
    }

    // ===== Cache Age Information =====

    /// Helper to load cache and log errors without failing
    fn load_age<T>(
        &self,
        name: &str,
        loader: impl FnOnce() -> Result<Option<CachedData<T>>>,
    ) -> Option<String> {
        match loader() {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn get_cache_ages(&self) -> CacheAges {
        CacheAges {
            admins: self.load_age("admins", || self.load_roster(Role::Admin)),
            employees: self.load_age("employees", || self.load_roster(Role::Employee)),
            hr: self.load_age("hr", || self.load_roster(Role::Hr)),
            postings: self.load_age("postings", || self.load_postings()),
            applications: self.load_age("applications", || self.load_applications()),
            campus: self.load_age("campus", || self.load_campus_applications()),
            attendance: self.load_age("attendance", || self.load_attendance()),
            budgets: self.load_age("budgets", || self.load_budgets()),
        }
    }

    /// Helper to check staleness and log errors without failing
    fn is_cache_stale<T>(
        &self,
        name: &str,
        loader: impl FnOnce() -> Result<Option<CachedData<T>>>,
    ) -> bool {
        match loader() {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true, // No cache = stale
            Err(e) => {
                debug!(cache = name, error = %e, "Failed to load cache for staleness check");
                true // Error reading = treat as stale
            }
        }
    }

    /// Check if any of the core cached data is stale
    pub fn any_stale(&self) -> bool {
        let stale_checks = [
            self.is_cache_stale("admins", || self.load_roster(Role::Admin)),
            self.is_cache_stale("employees", || self.load_roster(Role::Employee)),
            self.is_cache_stale("hr", || self.load_roster(Role::Hr)),
            self.is_cache_stale("applications", || self.load_applications()),
            self.is_cache_stale("attendance", || self.load_attendance()),
        ];
        stale_checks.iter().any(|&stale| stale)
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub admins: Option<String>,
    pub employees: Option<String>,
    pub hr: Option<String>,
    pub postings: Option<String>,
    pub applications: Option<String>,
    pub campus: Option<String>,
    pub attendance: Option<String>,
    pub budgets: Option<String>,
}

impl CacheAges {
    /// Returns the most recent update time across the main collections
    pub fn last_updated(&self) -> String {
        let ages = [&self.admins, &self.employees, &self.hr, &self.applications];

        for age in ages.iter().copied().flatten() {
            return age.clone();
        }

        "never".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_age_display_rounding() {
        let mut cached = CachedData::new(vec![1]);
        cached.cached_at = Utc::now() - Duration::minutes(5);
        assert_eq!(cached.age_display(), "5m ago");

        cached.cached_at = Utc::now() - Duration::minutes(95);
        assert_eq!(cached.age_display(), "2h ago");

        cached.cached_at = Utc::now() - Duration::minutes(70);
        assert_eq!(cached.age_display(), "1h ago");
    }

    #[test]
    fn test_cached_data_is_stale() {
        let fresh = CachedData::new(vec![1]);
        assert!(!fresh.is_stale());

        let mut old = CachedData::new(vec![1]);
        old.cached_at = Utc::now() - Duration::minutes(61);
        assert!(old.is_stale());
    }

    #[test]
    fn test_cache_ages_last_updated_with_values() {
        let ages = CacheAges {
            employees: Some("5m ago".to_string()),
            ..Default::default()
        };
        assert_eq!(ages.last_updated(), "5m ago");
    }

    #[test]
    fn test_cache_ages_last_updated_empty() {
        let ages = CacheAges::default();
        assert_eq!(ages.last_updated(), "never");
    }
}
