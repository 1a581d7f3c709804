//! Job postings and candidate applications (direct and campus).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::listing::Searchable;

// ============================================================================
// Postings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    Open,
    Closed,
}

impl PostingStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "open" | "active" => Some(PostingStatus::Open),
            "closed" | "inactive" => Some(PostingStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostingStatus::Open => "open",
            PostingStatus::Closed => "closed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostingStatus::Open => "Open",
            PostingStatus::Closed => "Closed",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            PostingStatus::Open => PostingStatus::Closed,
            PostingStatus::Closed => PostingStatus::Open,
        }
    }
}

/// Raw `job_postings` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPostingRow {
    pub id: String,
    pub title: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl JobPostingRow {
    pub fn to_record(&self) -> JobPosting {
        JobPosting {
            id: self.id.clone(),
            title: self.title.clone().unwrap_or_default(),
            department: self.department.clone(),
            location: self.location.clone(),
            employment_type: self.employment_type.clone(),
            description: self.description.clone(),
            status: self
                .status
                .as_deref()
                .and_then(PostingStatus::parse)
                .unwrap_or(PostingStatus::Open),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub description: Option<String>,
    pub status: PostingStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Searchable for JobPosting {
    fn search_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.title.as_str()];
        if let Some(dept) = self.department.as_deref() {
            keys.push(dept);
        }
        if let Some(loc) = self.location.as_deref() {
            keys.push(loc);
        }
        keys
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(self.status.as_str().to_string()),
            "department" => self.department.as_ref().map(|d| d.to_lowercase()),
            _ => None,
        }
    }
}

// ============================================================================
// Application status pipeline
// ============================================================================

/// Candidate pipeline: applied -> shortlisted -> interview -> selected,
/// with rejected as a terminal side exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Interview,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "applied" | "pending" | "new" => Some(ApplicationStatus::Applied),
            "shortlisted" => Some(ApplicationStatus::Shortlisted),
            "interview" | "interview_scheduled" => Some(ApplicationStatus::Interview),
            "selected" | "hired" => Some(ApplicationStatus::Selected),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Selected => "selected",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Selected => "Selected",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Move one step forward in the pipeline. Terminal states stay put.
    pub fn advanced(&self) -> Self {
        match self {
            ApplicationStatus::Applied => ApplicationStatus::Shortlisted,
            ApplicationStatus::Shortlisted => ApplicationStatus::Interview,
            ApplicationStatus::Interview => ApplicationStatus::Selected,
            ApplicationStatus::Selected => ApplicationStatus::Selected,
            ApplicationStatus::Rejected => ApplicationStatus::Rejected,
        }
    }

    /// True for states the pipeline never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Selected | ApplicationStatus::Rejected
        )
    }
}

/// Status patch shared by both application collections.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusPatch {
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationStatusPatch {
    pub fn new(status: ApplicationStatus) -> Self {
        Self {
            status: status.as_str().to_string(),
            updated_at: Utc::now(),
        }
    }
}

// ============================================================================
// Direct applications
// ============================================================================

/// Raw `job_applications` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplicationRow {
    pub id: String,
    pub job_id: Option<String>,
    pub job_title: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl JobApplicationRow {
    pub fn to_record(&self) -> JobApplication {
        JobApplication {
            id: self.id.clone(),
            job_id: self.job_id.clone(),
            job_title: self.job_title.clone(),
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            phone: self.phone.clone(),
            resume_url: self.resume_url.clone(),
            status: self
                .status
                .as_deref()
                .and_then(ApplicationStatus::parse)
                .unwrap_or(ApplicationStatus::Applied),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: String,
    pub job_id: Option<String>,
    pub job_title: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_url: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Searchable for JobApplication {
    fn search_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.name.as_str(), self.email.as_str()];
        if let Some(title) = self.job_title.as_deref() {
            keys.push(title);
        }
        keys
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(self.status.as_str().to_string()),
            "job" => self.job_title.as_ref().map(|t| t.to_lowercase()),
            _ => None,
        }
    }
}

// ============================================================================
// Campus applications
// ============================================================================

/// Raw `campus_applications` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampusApplicationRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub college: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
    pub resume_url: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl CampusApplicationRow {
    pub fn to_record(&self) -> CampusApplication {
        CampusApplication {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            college: self.college.clone(),
            degree: self.degree.clone(),
            graduation_year: self.graduation_year,
            resume_url: self.resume_url.clone(),
            status: self
                .status
                .as_deref()
                .and_then(ApplicationStatus::parse)
                .unwrap_or(ApplicationStatus::Applied),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampusApplication {
    pub id: String,
    pub name: String,
    pub email: String,
    pub college: Option<String>,
    pub degree: Option<String>,
    pub graduation_year: Option<i32>,
    pub resume_url: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl Searchable for CampusApplication {
    fn search_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.name.as_str(), self.email.as_str()];
        if let Some(college) = self.college.as_deref() {
            keys.push(college);
        }
        keys
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(self.status.as_str().to_string()),
            "college" => self.college.as_ref().map(|c| c.to_lowercase()),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_status_parse_and_toggle() {
        assert_eq!(PostingStatus::parse("Open"), Some(PostingStatus::Open));
        assert_eq!(PostingStatus::parse("closed"), Some(PostingStatus::Closed));
        assert_eq!(PostingStatus::parse("archived"), None);
        assert_eq!(PostingStatus::Open.toggled(), PostingStatus::Closed);
        assert_eq!(PostingStatus::Closed.toggled(), PostingStatus::Open);
    }

    #[test]
    fn test_application_status_pipeline() {
        let mut status = ApplicationStatus::Applied;
        status = status.advanced();
        assert_eq!(status, ApplicationStatus::Shortlisted);
        status = status.advanced();
        assert_eq!(status, ApplicationStatus::Interview);
        status = status.advanced();
        assert_eq!(status, ApplicationStatus::Selected);
        // Terminal states stay put
        assert_eq!(status.advanced(), ApplicationStatus::Selected);
        assert_eq!(
            ApplicationStatus::Rejected.advanced(),
            ApplicationStatus::Rejected
        );
        assert!(ApplicationStatus::Selected.is_terminal());
        assert!(!ApplicationStatus::Interview.is_terminal());
    }

    #[test]
    fn test_application_status_parse_aliases() {
        assert_eq!(
            ApplicationStatus::parse("pending"),
            Some(ApplicationStatus::Applied)
        );
        assert_eq!(
            ApplicationStatus::parse("interview_scheduled"),
            Some(ApplicationStatus::Interview)
        );
        assert_eq!(
            ApplicationStatus::parse("hired"),
            Some(ApplicationStatus::Selected)
        );
        assert_eq!(ApplicationStatus::parse("withdrawn"), None);
    }

    #[test]
    fn test_job_application_row_to_record() {
        let json = r#"{
            "id": "app-1",
            "job_id": "post-9",
            "job_title": "Backend Engineer",
            "name": "Arun Mehta",
            "email": "arun@example.com",
            "phone": "5559876543",
            "resume_url": "https://files.example.com/resumes/arun.pdf",
            "status": "shortlisted",
            "created_at": "2025-02-14T12:00:00Z"
        }"#;

        let row: JobApplicationRow = serde_json::from_str(json).expect("row should parse");
        let record = row.to_record();
        assert_eq!(record.status, ApplicationStatus::Shortlisted);
        assert_eq!(record.job_title.as_deref(), Some("Backend Engineer"));
        assert_eq!(record.filter_value("status").as_deref(), Some("shortlisted"));
    }

    #[test]
    fn test_posting_row_defaults_status_to_open() {
        let json = r#"{"id": "post-1", "title": "QA Analyst", "status": null}"#;
        let row: JobPostingRow = serde_json::from_str(json).expect("row should parse");
        assert_eq!(row.to_record().status, PostingStatus::Open);
    }

    #[test]
    fn test_campus_application_search_keys() {
        let json = r#"{
            "id": "c-1",
            "name": "Meera Nair",
            "email": "meera@campus.edu",
            "college": "NIT Calicut",
            "degree": "B.Tech CSE",
            "graduation_year": 2026,
            "status": "applied"
        }"#;
        let row: CampusApplicationRow = serde_json::from_str(json).expect("row should parse");
        let record = row.to_record();
        assert!(record.search_keys().contains(&"NIT Calicut"));
        assert_eq!(record.graduation_year, Some(2026));
    }
}
