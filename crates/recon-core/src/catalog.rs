//! In-process ordering session over a product catalogue.
//!
//! Stands in for the remote system in dry runs and tests: searches match
//! item codes, and the displayed total is quantity times unit cost
//! rendered the way an order form shows money (`1,234.50`).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::driver::{
    Candidate, DriverError, DriverResult, OrderField, OrderingSession, SessionContext,
};
use crate::store::{Result, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub code: String,
    pub product: String,
}

impl CatalogItem {
    pub fn new(code: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            product: product.into(),
        }
    }
}

/// A line of the order form after its total was read back.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub code: String,
    pub product: String,
    pub quantity: i64,
    pub cost_per_unit: f64,
    pub total: f64,
}

#[derive(Debug, Default)]
pub struct CatalogDriver {
    items: Vec<CatalogItem>,
    context: Option<SessionContext>,
    open: bool,
    results: Option<Vec<Candidate>>,
    inputs: BTreeMap<(usize, OrderField), String>,
    detail_open: bool,
    lines: Vec<OrderLine>,
    committed: Vec<OrderLine>,
}

impl CatalogDriver {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// Load a JSON array of `{ "code", "product" }` objects.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| StoreError::io("read", path, e))?;
        let items: Vec<CatalogItem> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Deserialization {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), items = items.len(), "catalogue loaded");
        Ok(Self::new(items))
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_detail_open(&self) -> bool {
        self.detail_open
    }

    /// Lines entered since the session opened.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Lines saved by the last commit.
    pub fn committed(&self) -> &[OrderLine] {
        &self.committed
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(DriverError::Transport {
                message: "session is not open".to_string(),
            })
        }
    }

    fn candidate(&self, position: usize) -> DriverResult<&Candidate> {
        self.results
            .as_ref()
            .and_then(|results| results.get(position))
            .ok_or_else(|| DriverError::missing(format!("result row {}", position + 1)))
    }

    fn input(&self, position: usize, field: OrderField) -> DriverResult<&str> {
        self.inputs
            .get(&(position, field))
            .map(String::as_str)
            .ok_or_else(|| DriverError::missing(format!("{} value", field.as_str())))
    }
}

impl OrderingSession for CatalogDriver {
    fn open(&mut self, context: &SessionContext, _timeout: Duration) -> DriverResult<()> {
        debug!(
            business = %context.business_name,
            supplier = %context.supplier_name,
            "opening catalogue session"
        );
        self.context = Some(context.clone());
        self.open = true;
        self.lines.clear();
        Ok(())
    }

    fn search(&mut self, term: &str, _timeout: Duration) -> DriverResult<()> {
        self.ensure_open()?;
        let term = term.trim();
        let found: Vec<Candidate> = self
            .items
            .iter()
            .filter(|item| !term.is_empty() && item.code.contains(term))
            .map(|item| Candidate::new(item.code.clone(), item.product.clone()))
            .collect();
        self.results = Some(found);
        self.inputs.clear();
        Ok(())
    }

    fn wait_for_results(&mut self, timeout: Duration) -> DriverResult<Vec<Candidate>> {
        self.ensure_open()?;
        self.results
            .clone()
            .ok_or_else(|| DriverError::timeout("search results", timeout))
    }

    fn clear_field(
        &mut self,
        position: usize,
        field: OrderField,
        _timeout: Duration,
    ) -> DriverResult<()> {
        self.ensure_open()?;
        self.candidate(position)?;
        self.detail_open = true;
        self.inputs.remove(&(position, field));
        Ok(())
    }

    fn set_field(
        &mut self,
        position: usize,
        field: OrderField,
        value: &str,
        _timeout: Duration,
    ) -> DriverResult<()> {
        self.ensure_open()?;
        self.candidate(position)?;
        let valid = match field {
            OrderField::Quantity => value.trim().parse::<i64>().is_ok(),
            OrderField::UnitCost => value
                .trim()
                .parse::<f64>()
                .is_ok_and(|cost| cost.is_finite()),
        };
        if !valid {
            return Err(DriverError::Rejected {
                message: format!("'{value}' is not a valid {}", field.as_str()),
            });
        }
        self.detail_open = true;
        self.inputs.insert((position, field), value.trim().to_string());
        Ok(())
    }

    fn read_total(&mut self, position: usize, _timeout: Duration) -> DriverResult<String> {
        self.ensure_open()?;
        let candidate = self.candidate(position)?.clone();
        let quantity: i64 = self
            .input(position, OrderField::Quantity)?
            .parse()
            .map_err(|_| DriverError::missing("quantity value"))?;
        let cost_per_unit: f64 = self
            .input(position, OrderField::UnitCost)?
            .parse()
            .map_err(|_| DriverError::missing("unit cost value"))?;
        let total = quantity as f64 * cost_per_unit;

        let line = OrderLine {
            code: candidate.code,
            product: candidate.product,
            quantity,
            cost_per_unit,
            total,
        };
        match self
            .lines
            .iter_mut()
            .find(|existing| existing.code == line.code && existing.product == line.product)
        {
            Some(existing) => *existing = line,
            None => self.lines.push(line),
        }
        Ok(format_amount(total))
    }

    fn close_detail_view(&mut self, _timeout: Duration) -> DriverResult<()> {
        self.detail_open = false;
        Ok(())
    }

    fn commit_form(&mut self, _timeout: Duration) -> DriverResult<()> {
        self.ensure_open()?;
        self.committed = self.lines.clone();
        info!(lines = self.committed.len(), "order form saved");
        Ok(())
    }

    fn release(&mut self) -> DriverResult<()> {
        self.open = false;
        self.results = None;
        self.inputs.clear();
        self.detail_open = false;
        Ok(())
    }
}

/// Two decimals with comma thousands separators.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}
