//! Attendance rows and the auto-absent sweep.
//!
//! Attendance is keyed by user and calendar date. The store query embeds
//! the owning user's name and employee code so the listing can search
//! without a second fetch.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::listing::Searchable;
use crate::models::user::{Role, UserRecord};

// ============================================================================
// Wire row
// ============================================================================

/// Embedded `users(name, employee_id)` resource on an attendance row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceUserRef {
    pub name: Option<String>,
    pub employee_id: Option<String>,
}

/// Raw `attendance` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub total_hours: Option<f64>,
    pub is_present: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub users: Option<AttendanceUserRef>,
}

impl AttendanceRow {
    pub fn to_record(&self) -> AttendanceRecord {
        AttendanceRecord {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            employee_name: self.users.as_ref().and_then(|u| u.name.clone()),
            employee_code: self.users.as_ref().and_then(|u| u.employee_id.clone()),
            date: self.date,
            check_in: self.check_in,
            check_out: self.check_out,
            total_hours: self.total_hours.unwrap_or(0.0),
            is_present: self.is_present.unwrap_or(false),
            created_at: self.created_at,
        }
    }
}

// ============================================================================
// Domain record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub user_id: String,
    pub employee_name: Option<String>,
    pub employee_code: Option<String>,
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub total_hours: f64,
    pub is_present: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    pub fn status_label(&self) -> &'static str {
        if self.is_present {
            "Present"
        } else {
            "Absent"
        }
    }
}

impl Searchable for AttendanceRecord {
    fn search_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.user_id.as_str()];
        if let Some(name) = self.employee_name.as_deref() {
            keys.push(name);
        }
        if let Some(code) = self.employee_code.as_deref() {
            keys.push(code);
        }
        keys
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(if self.is_present { "present" } else { "absent" }.to_string()),
            "date" => Some(self.date.to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// Writes
// ============================================================================

/// Insert payload for an attendance row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAttendance {
    pub user_id: String,
    pub date: NaiveDate,
    pub check_in: Option<DateTime<Utc>>,
    pub check_out: Option<DateTime<Utc>>,
    pub total_hours: f64,
    pub is_present: bool,
}

impl NewAttendance {
    /// An absent marker: no check-in, no check-out, zero hours.
    pub fn absent(user_id: &str, date: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            date,
            check_in: None,
            check_out: None,
            total_hours: 0.0,
            is_present: false,
        }
    }
}

/// Plan the auto-absent sweep for `date`: every regular employee without
/// an attendance row that day gets an absent record. Admin/HR accounts and
/// users without an employment category are excluded, matching what the
/// nightly job covers.
pub fn plan_auto_absent(
    users: &[UserRecord],
    existing: &[AttendanceRecord],
    date: NaiveDate,
) -> Vec<NewAttendance> {
    let covered: HashSet<&str> = existing
        .iter()
        .filter(|a| a.date == date)
        .map(|a| a.user_id.as_str())
        .collect();

    users
        .iter()
        .filter(|u| u.role == Role::Employee)
        .filter(|u| u.employee_type.is_some())
        .filter(|u| !covered.contains(u.id.as_str()))
        .map(|u| NewAttendance::absent(&u.id, date))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::EmployeeType;

    fn employee(id: &str, employee_type: Option<EmployeeType>, role: Role) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            role,
            employee_code: None,
            is_active: true,
            first_login: false,
            profile_image: None,
            department: None,
            employee_type,
            mobile: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn present_record(user_id: &str, date: NaiveDate) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("att-{user_id}"),
            user_id: user_id.to_string(),
            employee_name: None,
            employee_code: None,
            date,
            check_in: None,
            check_out: None,
            total_hours: 8.0,
            is_present: true,
            created_at: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 14).expect("valid date")
    }

    #[test]
    fn test_plan_auto_absent_marks_uncovered_employees() {
        let users = vec![
            employee("u1", Some(EmployeeType::FullTime), Role::Employee),
            employee("u2", Some(EmployeeType::Internship), Role::Employee),
            employee("u3", Some(EmployeeType::Temporary), Role::Employee),
        ];
        let existing = vec![present_record("u2", day())];

        let planned = plan_auto_absent(&users, &existing, day());
        let ids: Vec<&str> = planned.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u3"]);
        assert!(planned.iter().all(|p| !p.is_present));
        assert!(planned.iter().all(|p| p.total_hours == 0.0));
    }

    #[test]
    fn test_plan_auto_absent_skips_staff_roles_and_untyped_users() {
        let users = vec![
            employee("admin", Some(EmployeeType::FullTime), Role::Admin),
            employee("hr", Some(EmployeeType::FullTime), Role::Hr),
            employee("untyped", None, Role::Employee),
            employee("regular", Some(EmployeeType::FullTime), Role::Employee),
        ];

        let planned = plan_auto_absent(&users, &[], day());
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].user_id, "regular");
    }

    #[test]
    fn test_plan_auto_absent_all_covered() {
        let users = vec![employee("u1", Some(EmployeeType::FullTime), Role::Employee)];
        let existing = vec![present_record("u1", day())];
        assert!(plan_auto_absent(&users, &existing, day()).is_empty());
    }

    #[test]
    fn test_plan_auto_absent_ignores_other_dates() {
        let users = vec![employee("u1", Some(EmployeeType::FullTime), Role::Employee)];
        let other_day = NaiveDate::from_ymd_opt(2025, 7, 13).expect("valid date");
        let existing = vec![present_record("u1", other_day)];

        let planned = plan_auto_absent(&users, &existing, day());
        assert_eq!(planned.len(), 1);
    }

    #[test]
    fn test_attendance_row_with_embedded_user() {
        let json = r#"{
            "id": "att-1",
            "user_id": "u9",
            "date": "2025-07-14",
            "check_in": "2025-07-14T03:45:00Z",
            "check_out": "2025-07-14T12:15:00Z",
            "total_hours": 8.5,
            "is_present": true,
            "created_at": "2025-07-14T03:45:01Z",
            "users": {"name": "Dev Patel", "employee_id": "EMP031"}
        }"#;

        let row: AttendanceRow = serde_json::from_str(json).expect("row should parse");
        let record = row.to_record();
        assert_eq!(record.employee_name.as_deref(), Some("Dev Patel"));
        assert_eq!(record.employee_code.as_deref(), Some("EMP031"));
        assert!(record.search_keys().contains(&"Dev Patel"));
        assert_eq!(record.filter_value("status").as_deref(), Some("present"));
        assert_eq!(record.filter_value("date").as_deref(), Some("2025-07-14"));
    }

    #[test]
    fn test_attendance_row_without_embed() {
        let json = r#"{"id": "att-2", "user_id": "u1", "date": "2025-07-14"}"#;
        let row: AttendanceRow = serde_json::from_str(json).expect("row should parse");
        let record = row.to_record();
        assert_eq!(record.total_hours, 0.0);
        assert!(!record.is_present);
        assert_eq!(record.status_label(), "Absent");
    }
}
