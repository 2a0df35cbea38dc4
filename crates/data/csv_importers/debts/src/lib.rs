use models::{DebtRow, FinancialState};
use utils::{normalize_brazilian_number, ImportError, Ledger};

pub const PARSER_NAME: &str = "debts";

/// Type, total, monthly rate and payment.
pub const COLUMNS: usize = 4;

/// Parses a `Type;Total;Rate;Payment` ledger into debt rows, in file order.
///
/// Numeric fields are normalized but not validated: a row with a broken
/// total imports fine and is only dropped when the analysis payload is
/// built. A ledger without data rows gives a single placeholder row.
pub fn parse_debts(text: &str) -> Result<Vec<DebtRow>, ImportError> {
    let Some(ledger) = Ledger::split(text) else {
        return Ok(vec![DebtRow::placeholder()]);
    };

    let mut rows = Vec::new();
    for row in ledger.rows() {
        row.expect_columns(COLUMNS)?;

        rows.push(DebtRow {
            debt_type: row.fields[0].clone(),
            total: normalize_brazilian_number(&row.fields[1]),
            rate: normalize_brazilian_number(&row.fields[2]),
            payment: normalize_brazilian_number(&row.fields[3]),
        });
    }

    Ok(rows)
}

/// Parses `text` and replaces the whole debt list in `state` on success.
///
/// On error the state is left exactly as it was.
pub fn import_into(state: &mut FinancialState, text: &str) -> Result<usize, ImportError> {
    let rows = parse_debts(text)?;
    let count = rows.iter().filter(|r| !r.is_placeholder()).count();
    state.replace_debts(rows);
    tracing::info!(parser = PARSER_NAME, rows = count, "debt table replaced");
    Ok(count)
}
