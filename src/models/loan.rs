//! Loan (checkout) model and related types

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Well-known values of the `estado` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Borrowed,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "BORROWED",
            LoanStatus::Returned => "RETURNED",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BORROWED" => Ok(LoanStatus::Borrowed),
            "RETURNED" => Ok(LoanStatus::Returned),
            other => Err(format!("unknown loan status: {}", other)),
        }
    }
}

/// Loan joined with its user, book and publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub copy_id: i64,
    pub renewal_count: i64,
    /// Free text; see [`LoanStatus`] for the values this crate writes
    pub status: String,
    pub loan_date: NaiveDateTime,
    pub due_date: NaiveDateTime,
    pub return_date: Option<NaiveDateTime>,
    pub user_name: String,
    pub book_title: String,
    pub book_max_renewals: i64,
    pub publisher_name: String,
}

impl LoanView {
    /// Parsed status, `None` for values outside [`LoanStatus`]
    pub fn loan_status(&self) -> Option<LoanStatus> {
        self.status.parse().ok()
    }
}

/// Insert request for a new loan.
///
/// Fields left as `None` are filled in by the repository when the
/// insert runs, never ahead of time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLoan {
    pub user_id: i64,
    pub book_id: i64,
    pub copy_id: i64,
    pub status: Option<String>,
    pub loan_date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub return_date: Option<NaiveDateTime>,
    pub renewal_count: Option<i64>,
}

impl NewLoan {
    pub fn new(user_id: i64, book_id: i64, copy_id: i64) -> Self {
        Self {
            user_id,
            book_id,
            copy_id,
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_loan_date(mut self, loan_date: NaiveDateTime) -> Self {
        self.loan_date = Some(loan_date);
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDateTime) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_return_date(mut self, return_date: NaiveDateTime) -> Self {
        self.return_date = Some(return_date);
        self
    }

    pub fn with_renewal_count(mut self, renewal_count: i64) -> Self {
        self.renewal_count = Some(renewal_count);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_view() -> LoanView {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        LoanView {
            id: 1,
            user_id: 1,
            book_id: 7,
            copy_id: 3,
            renewal_count: 0,
            status: "BORROWED".to_string(),
            loan_date: at,
            due_date: at + chrono::Duration::days(3),
            return_date: None,
            user_name: "Ana".to_string(),
            book_title: "Dom Casmurro".to_string(),
            book_max_renewals: 2,
            publisher_name: "Garnier".to_string(),
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("BORROWED".parse::<LoanStatus>(), Ok(LoanStatus::Borrowed));
        assert_eq!("RETURNED".parse::<LoanStatus>(), Ok(LoanStatus::Returned));
        assert!("LOST".parse::<LoanStatus>().is_err());
        assert_eq!(LoanStatus::Returned.to_string(), "RETURNED");
    }

    #[test]
    fn test_loan_status_of_free_text() {
        let mut view = sample_view();
        assert_eq!(view.loan_status(), Some(LoanStatus::Borrowed));
        view.status = "LOST".to_string();
        assert_eq!(view.loan_status(), None);
    }

    #[test]
    fn test_view_serializes_missing_return_date_as_null() {
        let json = serde_json::to_value(sample_view()).unwrap();
        assert!(json["return_date"].is_null());
        assert_eq!(json["book_title"], "Dom Casmurro");
    }

    #[test]
    fn test_new_loan_leaves_defaults_unset() {
        let loan = NewLoan::new(1, 7, 3);
        assert!(loan.status.is_none());
        assert!(loan.loan_date.is_none());
        assert!(loan.due_date.is_none());
        assert!(loan.renewal_count.is_none());
    }
}
