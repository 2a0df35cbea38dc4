use models::{AnalysisPayload, DebtRecord, DebtRow, FinancialState};
use thiserror::Error;

use crate::numbers::parse_decimal;

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("monthly income is not set")]
    MissingIncome,

    #[error("monthly costs are not set")]
    MissingCosts,

    #[error("no valid debt: each debt needs a type, a total, a rate and a payment")]
    NoValidDebts,
}

/// Validates a row for analysis: non-empty type and three parsable numbers.
pub fn debt_record(row: &DebtRow) -> Option<DebtRecord> {
    if row.debt_type.is_empty() {
        return None;
    }
    Some(DebtRecord {
        debt_type: row.debt_type.clone(),
        principal: parse_decimal(&row.total)?,
        monthly_rate_percent: parse_decimal(&row.rate)?,
        monthly_payment: parse_decimal(&row.payment)?,
    })
}

/// Valid rows in display order; the rest are dropped without complaint.
pub fn valid_debt_records(rows: &[DebtRow]) -> Vec<DebtRecord> {
    rows.iter().filter_map(debt_record).collect()
}

/// Builds the request payload sent to the analysis service.
pub fn analysis_payload(state: &FinancialState) -> Result<AnalysisPayload, PayloadError> {
    let monthly_income = state.monthly_income.ok_or(PayloadError::MissingIncome)?;
    let monthly_costs = state.monthly_costs.ok_or(PayloadError::MissingCosts)?;

    let debts = valid_debt_records(&state.debts);
    let skipped = state.debts.len() - debts.len();
    if debts.is_empty() {
        return Err(PayloadError::NoValidDebts);
    }
    if skipped > 0 {
        tracing::debug!(skipped, "debt rows left out of the analysis payload");
    }

    Ok(AnalysisPayload {
        monthly_income,
        monthly_costs,
        debts,
        proposal: state.proposal,
        what_if_payment: state.what_if_payment.filter(|v| *v > 0.0),
    })
}
