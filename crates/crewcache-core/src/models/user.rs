//! Organizational user accounts: admins, employees, and HR staff.
//!
//! One physical `users` collection is partitioned by the `role` column.
//! The wire row keeps the store's column names (`isactive`,
//! `profileimage`, `employee_id`); everything past the store boundary
//! works with the normalized `UserRecord`.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cache::listing::Searchable;

/// Length of generated temporary passwords sent in welcome mail.
pub const TEMP_PASSWORD_LEN: usize = 10;

/// Digits in generated employee codes (`EMP007`).
const CODE_DIGITS: usize = 3;

// ============================================================================
// Discriminators
// ============================================================================

/// Role discriminator partitioning the `users` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    SuperAdmin,
    Admin,
    Hr,
    Employee,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "superadmin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "hr" => Some(Role::Hr),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "superadmin",
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Employee => "employee",
        }
    }

    /// Display title for headers and tags.
    pub fn title(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Hr => "HR",
            Role::Employee => "Employee",
        }
    }

    /// Prefix for generated employee codes of this role.
    pub fn code_prefix(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUP",
            Role::Admin => "ADM",
            Role::Hr => "HRM",
            Role::Employee => "EMP",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Employment category used by attendance and payroll-adjacent screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmployeeType {
    FullTime,
    Internship,
    Temporary,
}

impl EmployeeType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "full-time" | "fulltime" => Some(EmployeeType::FullTime),
            "internship" | "intern" => Some(EmployeeType::Internship),
            "temporary" => Some(EmployeeType::Temporary),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeType::FullTime => "full-time",
            EmployeeType::Internship => "internship",
            EmployeeType::Temporary => "temporary",
        }
    }
}

// ============================================================================
// Wire row
// ============================================================================

/// Raw `users` row as the store returns it. Column names follow the
/// backend schema, not Rust conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub employee_id: Option<String>,
    pub isactive: Option<bool>,
    pub isfirstlogin: Option<bool>,
    pub profileimage: Option<String>,
    pub department: Option<String>,
    pub employee_type: Option<String>,
    pub mobile: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRow {
    /// Normalize into the domain record.
    pub fn to_record(&self) -> UserRecord {
        UserRecord {
            id: self.id.clone(),
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone().unwrap_or_default(),
            role: self
                .role
                .as_deref()
                .and_then(Role::parse)
                .unwrap_or(Role::Employee),
            employee_code: self.employee_id.clone(),
            is_active: self.isactive.unwrap_or(false),
            first_login: self.isfirstlogin.unwrap_or(false),
            profile_image: self.profileimage.clone(),
            department: self.department.clone(),
            employee_type: self.employee_type.as_deref().and_then(EmployeeType::parse),
            mobile: self.mobile.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// Domain record
// ============================================================================

/// Normalized user record held in listing snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub employee_code: Option<String>,
    pub is_active: bool,
    pub first_login: bool,
    pub profile_image: Option<String>,
    pub department: Option<String>,
    pub employee_type: Option<EmployeeType>,
    pub mobile: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }
}

impl Searchable for UserRecord {
    fn search_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.name.as_str(), self.email.as_str()];
        if let Some(code) = self.employee_code.as_deref() {
            keys.push(code);
        }
        keys
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "status" => Some(if self.is_active { "active" } else { "inactive" }.to_string()),
            "role" => Some(self.role.as_str().to_string()),
            "department" => self.department.as_ref().map(|d| d.to_lowercase()),
            "employee_type" => self.employee_type.map(|t| t.as_str().to_string()),
            _ => None,
        }
    }
}

// ============================================================================
// Write payloads
// ============================================================================

/// Insert payload for a new account. New accounts start inactive with the
/// first-login flag set; they activate on first sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: String,
    pub employee_id: String,
    pub isactive: bool,
    pub isfirstlogin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_type: Option<String>,
}

impl NewUser {
    pub fn new(name: &str, email: &str, role: Role, employee_code: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            role: role.as_str().to_string(),
            employee_id: employee_code.to_string(),
            isactive: false,
            isfirstlogin: true,
            department: None,
            employee_type: None,
        }
    }
}

/// Partial update for an existing account.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isactive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserPatch {
    /// Patch that flips the active flag.
    pub fn active(flag: bool) -> Self {
        Self {
            isactive: Some(flag),
            updated_at: Some(Utc::now()),
            ..Default::default()
        }
    }
}

// ============================================================================
// Derived helpers
// ============================================================================

/// Counts for the stat cards above a user listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

pub fn user_stats(records: &[UserRecord]) -> UserStats {
    let total = records.len();
    let active = records.iter().filter(|u| u.is_active).count();
    UserStats {
        total,
        active,
        inactive: total - active,
    }
}

/// Allocate the next employee code for a role by scanning the highest
/// numeric suffix among existing codes with the role's prefix.
/// Codes that do not parse are skipped.
pub fn next_employee_code(existing: &[UserRecord], role: Role) -> String {
    let prefix = role.code_prefix();
    let highest = existing
        .iter()
        .filter_map(|u| u.employee_code.as_deref())
        .filter_map(|code| code.strip_prefix(prefix))
        .filter_map(|suffix| suffix.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{}{:0width$}", prefix, highest + 1, width = CODE_DIGITS)
}

/// Generate a temporary password for the welcome mail. Alphanumeric only
/// so it survives every mail client and copy-paste path.
pub fn generate_temp_password(len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: Option<&str>, role: Role, active: bool) -> UserRecord {
        UserRecord {
            id: "u1".to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role,
            employee_code: code.map(String::from),
            is_active: active,
            first_login: false,
            profile_image: None,
            department: None,
            employee_type: None,
            mobile: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse(" hr "), Some(Role::Hr));
        assert_eq!(Role::parse("superadmin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("employee"), Some(Role::Employee));
        assert_eq!(Role::parse("manager"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_employee_type_parse() {
        assert_eq!(EmployeeType::parse("full-time"), Some(EmployeeType::FullTime));
        assert_eq!(EmployeeType::parse("FullTime"), Some(EmployeeType::FullTime));
        assert_eq!(EmployeeType::parse("intern"), Some(EmployeeType::Internship));
        assert_eq!(EmployeeType::parse("temporary"), Some(EmployeeType::Temporary));
        assert_eq!(EmployeeType::parse("contractor"), None);
    }

    #[test]
    fn test_user_row_to_record() {
        let json = r#"{
            "id": "5e7c2b9a-0b1f-4a6e-9c3d-1f2a3b4c5d6e",
            "name": "Priya Sharma",
            "email": "priya@example.com",
            "role": "admin",
            "employee_id": "ADM004",
            "isactive": true,
            "isfirstlogin": false,
            "profileimage": null,
            "department": "Operations",
            "employee_type": "full-time",
            "mobile": "5551234567",
            "created_at": "2024-11-03T08:15:00Z",
            "updated_at": null
        }"#;

        let row: UserRow = serde_json::from_str(json).expect("row should parse");
        let record = row.to_record();

        assert_eq!(record.name, "Priya Sharma");
        assert_eq!(record.role, Role::Admin);
        assert_eq!(record.employee_code.as_deref(), Some("ADM004"));
        assert!(record.is_active);
        assert!(!record.first_login);
        assert_eq!(record.employee_type, Some(EmployeeType::FullTime));
        assert!(record.created_at.is_some());
    }

    #[test]
    fn test_to_record_defaults_unknown_role() {
        let json = r#"{"id": "x", "role": "intruder"}"#;
        let row: UserRow = serde_json::from_str(json).expect("row should parse");
        assert_eq!(row.to_record().role, Role::Employee);
    }

    #[test]
    fn test_search_keys_include_employee_code() {
        let with_code = record(Some("ADM007"), Role::Admin, true);
        assert_eq!(with_code.search_keys().len(), 3);

        let without_code = record(None, Role::Admin, true);
        assert_eq!(without_code.search_keys().len(), 2);
    }

    #[test]
    fn test_filter_values() {
        let user = record(Some("EMP001"), Role::Employee, false);
        assert_eq!(user.filter_value("status").as_deref(), Some("inactive"));
        assert_eq!(user.filter_value("role").as_deref(), Some("employee"));
        assert_eq!(user.filter_value("nonsense"), None);
    }

    #[test]
    fn test_next_employee_code_empty_roster() {
        assert_eq!(next_employee_code(&[], Role::Admin), "ADM001");
        assert_eq!(next_employee_code(&[], Role::Hr), "HRM001");
    }

    #[test]
    fn test_next_employee_code_skips_other_prefixes_and_junk() {
        let existing = vec![
            record(Some("ADM007"), Role::Admin, true),
            record(Some("ADM002"), Role::Admin, true),
            record(Some("EMP950"), Role::Employee, true),
            record(Some("legacy-id"), Role::Admin, true),
            record(None, Role::Admin, true),
        ];
        assert_eq!(next_employee_code(&existing, Role::Admin), "ADM008");
        assert_eq!(next_employee_code(&existing, Role::Employee), "EMP951");
    }

    #[test]
    fn test_user_stats() {
        let records = vec![
            record(None, Role::Admin, true),
            record(None, Role::Admin, true),
            record(None, Role::Admin, false),
        ];
        let stats = user_stats(&records);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.inactive, 1);
    }

    #[test]
    fn test_generate_temp_password() {
        let password = generate_temp_password(TEMP_PASSWORD_LEN);
        assert_eq!(password.len(), TEMP_PASSWORD_LEN);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_new_user_starts_inactive_pending_first_login() {
        let user = NewUser::new("A", "a@b.com", Role::Hr, "HRM001");
        assert!(!user.isactive);
        assert!(user.isfirstlogin);
        assert_eq!(user.role, "hr");
    }

    #[test]
    fn test_user_patch_serializes_only_set_fields() {
        let patch = UserPatch::active(true);
        let json = serde_json::to_value(&patch).expect("patch should serialize");
        let obj = json.as_object().expect("patch should be an object");
        assert_eq!(obj.get("isactive"), Some(&serde_json::Value::Bool(true)));
        assert!(!obj.contains_key("name"));
        assert!(!obj.contains_key("email"));
    }
}
