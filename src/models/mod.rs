//! Data models for library loans

pub mod loan;

// Re-export commonly used types
pub use loan::{LoanStatus, LoanView, NewLoan};
