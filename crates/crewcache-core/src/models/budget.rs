//! Project budget tracking.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::listing::Searchable;

/// Raw `project_budgets` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetRow {
    pub id: String,
    pub project_name: Option<String>,
    pub department: Option<String>,
    pub allocated: Option<f64>,
    pub spent: Option<f64>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

impl BudgetRow {
    pub fn to_record(&self) -> ProjectBudget {
        ProjectBudget {
            id: self.id.clone(),
            project_name: self.project_name.clone().unwrap_or_default(),
            department: self.department.clone(),
            allocated: self.allocated.unwrap_or(0.0),
            spent: self.spent.unwrap_or(0.0),
            status: self.status.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBudget {
    pub id: String,
    pub project_name: String,
    pub department: Option<String>,
    pub allocated: f64,
    pub spent: f64,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

impl ProjectBudget {
    pub fn remaining(&self) -> f64 {
        self.allocated - self.spent
    }

    /// Spend as a percentage of allocation. Zero allocation reads as 0%
    /// rather than dividing by zero.
    pub fn utilization_pct(&self) -> f64 {
        if self.allocated <= 0.0 {
            0.0
        } else {
            (self.spent / self.allocated * 1000.0).round() / 10.0
        }
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.allocated
    }
}

impl Searchable for ProjectBudget {
    fn search_keys(&self) -> Vec<&str> {
        let mut keys = vec![self.project_name.as_str()];
        if let Some(dept) = self.department.as_deref() {
            keys.push(dept);
        }
        keys
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "status" => self.status.as_ref().map(|s| s.to_lowercase()),
            "department" => self.department.as_ref().map(|d| d.to_lowercase()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(allocated: f64, spent: f64) -> ProjectBudget {
        ProjectBudget {
            id: "b1".to_string(),
            project_name: "Migration".to_string(),
            department: Some("Engineering".to_string()),
            allocated,
            spent,
            status: Some("active".to_string()),
            start_date: None,
            end_date: None,
            created_at: None,
        }
    }

    #[test]
    fn test_remaining_and_utilization() {
        let b = budget(10_000.0, 2_500.0);
        assert_eq!(b.remaining(), 7_500.0);
        assert_eq!(b.utilization_pct(), 25.0);
        assert!(!b.is_over_budget());
    }

    #[test]
    fn test_over_budget() {
        let b = budget(1_000.0, 1_300.0);
        assert!(b.is_over_budget());
        assert_eq!(b.utilization_pct(), 130.0);
        assert_eq!(b.remaining(), -300.0);
    }

    #[test]
    fn test_zero_allocation_reads_as_zero_percent() {
        let b = budget(0.0, 500.0);
        assert_eq!(b.utilization_pct(), 0.0);
    }

    #[test]
    fn test_budget_row_parse() {
        let json = r#"{
            "id": "b-7",
            "project_name": "Portal Revamp",
            "department": "IT",
            "allocated": 50000,
            "spent": 12000.5,
            "status": "active",
            "start_date": "2025-01-01",
            "end_date": "2025-12-31",
            "created_at": "2025-01-02T09:00:00Z"
        }"#;

        let row: BudgetRow = serde_json::from_str(json).expect("row should parse");
        let record = row.to_record();
        assert_eq!(record.allocated, 50_000.0);
        assert_eq!(record.spent, 12_000.5);
        assert_eq!(record.filter_value("department").as_deref(), Some("it"));
    }
}
