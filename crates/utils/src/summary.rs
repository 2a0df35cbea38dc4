use models::{FinancialState, Summary};

use crate::numbers::parse_or_zero;

/// Recomputes the live totals from the current state.
///
/// Blank or unparsable debt fields count as zero; missing income or costs
/// count as zero. `payment_potential` can go negative.
pub fn summarize(state: &FinancialState) -> Summary {
    let (total_debt, total_scheduled_payments) =
        state.debts.iter().fold((0.0, 0.0), |(debt, payments), row| {
            (
                debt + parse_or_zero(&row.total),
                payments + parse_or_zero(&row.payment),
            )
        });

    Summary {
        total_debt,
        total_scheduled_payments,
        payment_potential: state.monthly_income.unwrap_or(0.0)
            - state.monthly_costs.unwrap_or(0.0),
    }
}
