//! Capability interface to the remote ordering system.
//!
//! Element locators and click sequences live behind [`OrderingSession`];
//! the engine only sees these bounded, individually fallible operations.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Login and operating context for one ordering session.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionContext {
    pub url: String,
    pub company_code: String,
    pub username: String,
    pub password: String,
    /// Business unit the order is placed for.
    pub business_name: String,
    /// Counterparty (supplier).
    pub supplier_name: String,
    /// Effective delivery date, as typed into the form.
    pub delivery_date: String,
    /// Order reference numbers.
    pub reference: String,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("url", &self.url)
            .field("company_code", &self.company_code)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("business_name", &self.business_name)
            .field("supplier_name", &self.supplier_name)
            .field("delivery_date", &self.delivery_date)
            .field("reference", &self.reference)
            .finish()
    }
}

/// One row of the search results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub code: String,
    pub product: String,
}

impl Candidate {
    pub fn new(code: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            product: product.into(),
        }
    }

    /// Exact match on trimmed code and description.
    pub fn matches(&self, code: &str, product: &str) -> bool {
        self.code.trim() == code && self.product.trim() == product
    }
}

/// Editable inputs of a candidate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OrderField {
    Quantity,
    UnitCost,
}

impl OrderField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::UnitCost => "unit cost",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    /// The awaited element or state did not appear in time.
    #[error("timed out after {}s waiting for {operation}", waited.as_secs_f64())]
    Timeout {
        operation: &'static str,
        waited: Duration,
    },
    #[error("element not found: {element}")]
    ElementMissing { element: String },
    #[error("driver transport failure: {message}")]
    Transport { message: String },
    #[error("input rejected: {message}")]
    Rejected { message: String },
}

impl DriverError {
    pub fn timeout(operation: &'static str, waited: Duration) -> Self {
        Self::Timeout { operation, waited }
    }

    pub fn missing(element: impl Into<String>) -> Self {
        Self::ElementMissing {
            element: element.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A live, stateful session with the ordering system.
///
/// Only one form is active at a time, so a session is never shared between
/// concurrent operations. Every call blocks for at most its `timeout`.
pub trait OrderingSession {
    /// Authenticate, navigate to the order workflow and select the
    /// operating context.
    fn open(&mut self, context: &SessionContext, timeout: Duration) -> DriverResult<()>;

    /// Open the item search and type `term` into it.
    fn search(&mut self, term: &str, timeout: Duration) -> DriverResult<()>;

    /// Wait for the results table and read every visible candidate.
    ///
    /// `Err(Timeout)` means the table never appeared; `Ok(vec![])` means it
    /// appeared with no rows.
    fn wait_for_results(&mut self, timeout: Duration) -> DriverResult<Vec<Candidate>>;

    /// Clear an input of the candidate at `position`.
    fn clear_field(&mut self, position: usize, field: OrderField, timeout: Duration)
    -> DriverResult<()>;

    /// Type `value` into an input of the candidate at `position`.
    fn set_field(
        &mut self,
        position: usize,
        field: OrderField,
        value: &str,
        timeout: Duration,
    ) -> DriverResult<()>;

    /// Raw text of the total the system computed for the candidate.
    fn read_total(&mut self, position: usize, timeout: Duration) -> DriverResult<String>;

    /// Close the per-item detail view. A no-op when already closed.
    fn close_detail_view(&mut self, timeout: Duration) -> DriverResult<()>;

    /// Save the order form.
    fn commit_form(&mut self, timeout: Duration) -> DriverResult<()>;

    /// Release the session.
    fn release(&mut self) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_redacted() {
        let context = SessionContext {
            username: "clerk".to_string(),
            password: "hunter2".to_string(),
            ..SessionContext::default()
        };
        let rendered = format!("{context:?}");
        assert!(rendered.contains("clerk"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn candidate_match_is_exact() {
        let candidate = Candidate::new(" 1001 ", "Flour 25kg ");
        assert!(candidate.matches("1001", "Flour 25kg"));
        assert!(!candidate.matches("1001", "Flour 25 kg"));
        assert!(!candidate.matches("100", "Flour 25kg"));
    }

    #[test]
    fn timeout_display() {
        let err = DriverError::timeout("search results", Duration::from_secs(30));
        assert_eq!(err.to_string(), "timed out after 30s waiting for search results");
        assert!(err.is_timeout());
    }
}
