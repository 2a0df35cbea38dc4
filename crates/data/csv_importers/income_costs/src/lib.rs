use models::FinancialState;
use utils::{normalize_brazilian_number, parse_decimal, ImportError, Ledger};

pub const PARSER_NAME: &str = "income_costs";

/// Description and signed value.
pub const COLUMNS: usize = 2;

/// Monthly totals computed from an income/costs ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IncomeCostTotals {
    pub total_income: f64,
    pub total_costs: f64,
}

/// Parses a `Description;Value` ledger.
///
/// Returns `Ok(None)` when there is nothing to import (no data rows).
/// Positive values are income; zero and negative values go to costs by
/// magnitude. The first bad row aborts the whole parse.
pub fn parse_income_costs(text: &str) -> Result<Option<IncomeCostTotals>, ImportError> {
    let Some(ledger) = Ledger::split(text) else {
        return Ok(None);
    };

    let mut totals = IncomeCostTotals::default();

    for row in ledger.rows() {
        row.expect_columns(COLUMNS)?;

        let token = &row.fields[1];
        let value = parse_decimal(&normalize_brazilian_number(token)).ok_or_else(|| {
            ImportError::InvalidNumber {
                token: token.clone(),
                line: row.line,
            }
        })?;

        if value > 0.0 {
            totals.total_income += value;
        } else {
            totals.total_costs += value.abs();
        }
    }

    Ok(Some(totals))
}

/// Parses `text` and, on success, overwrites income and costs in `state`.
///
/// On error the state is left exactly as it was.
pub fn import_into(
    state: &mut FinancialState,
    text: &str,
) -> Result<Option<IncomeCostTotals>, ImportError> {
    let totals = parse_income_costs(text)?;
    match totals {
        Some(t) => {
            state.set_income_and_costs(t.total_income, t.total_costs);
            tracing::info!(
                parser = PARSER_NAME,
                income = t.total_income,
                costs = t.total_costs,
                "income and costs imported"
            );
        }
        None => tracing::info!(parser = PARSER_NAME, "ledger has no data rows, nothing imported"),
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::DebtRow;

    #[test]
    fn test_income_and_costs_split_by_sign() {
        let totals = parse_income_costs("Desc;Valor\nSalário;5000\nAluguel;-1500")
            .unwrap()
            .unwrap();
        assert_eq!(
            totals,
            IncomeCostTotals {
                total_income: 5000.0,
                total_costs: 1500.0
            }
        );
    }

    #[test]
    fn test_brazilian_numbers_and_comma_separator() {
        let totals = parse_income_costs("Desc,Valor\r\nSalário,5000\r\nAluguel,-1500\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(totals.total_income, 5000.0);
        assert_eq!(totals.total_costs, 1500.0);

        let totals = parse_income_costs("Desc;Valor\nSalário;1.234,56\nLuz;-100,44")
            .unwrap()
            .unwrap();
        assert!((totals.total_income - 1234.56).abs() < 1e-9);
        assert!((totals.total_costs - 100.44).abs() < 1e-9);
    }

    #[test]
    fn test_zero_is_a_cost() {
        let totals = parse_income_costs("Desc;Valor\nX;0").unwrap().unwrap();
        assert_eq!(totals.total_income, 0.0);
        assert_eq!(totals.total_costs, 0.0);
    }

    #[test]
    fn test_three_columns_is_malformed() {
        let err = parse_income_costs("Desc;Valor\nSalário;5000;extra").unwrap_err();
        match err {
            ImportError::MalformedRow { line, expected, found } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_line_numbers_ignore_blank_lines() {
        let err = parse_income_costs("Desc;Valor\n\nA;1\n\nB;abc").unwrap_err();
        match err {
            ImportError::InvalidNumber { token, line } => {
                assert_eq!(token, "abc");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_nothing_to_import() {
        assert_eq!(parse_income_costs("").unwrap(), None);
        assert_eq!(parse_income_costs("Desc;Valor\n").unwrap(), None);
    }

    #[test]
    fn test_failed_import_leaves_state_untouched() {
        let mut state = FinancialState {
            monthly_income: Some(900.0),
            monthly_costs: Some(100.0),
            debts: vec![DebtRow::new("Cartão", "1", "1", "1")],
            ..Default::default()
        };
        let before = state.clone();

        assert!(import_into(&mut state, "Desc;Valor\nA;10\nB;1,2,3").is_err());
        assert_eq!(state, before);

        assert_eq!(import_into(&mut state, "Desc;Valor").unwrap(), None);
        assert_eq!(state, before);
    }

    #[test]
    fn test_import_overwrites_even_with_zero_totals() {
        let mut state = FinancialState {
            monthly_income: Some(900.0),
            monthly_costs: Some(100.0),
            ..Default::default()
        };
        import_into(&mut state, "Desc;Valor\nX;0").unwrap();
        assert_eq!(state.monthly_income, Some(0.0));
        assert_eq!(state.monthly_costs, Some(0.0));
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let csv = "Desc;Valor\nSalário;5000\nRenda Extra;500\nAluguel;-1500";
        let mut state = FinancialState::default();
        import_into(&mut state, csv).unwrap();
        let first = state.clone();
        import_into(&mut state, csv).unwrap();
        assert_eq!(state, first);
        assert_eq!(state.monthly_income, Some(5500.0));
    }
}
