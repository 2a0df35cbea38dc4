use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;

use ai_client::{Analysis, GeminiClient, GeminiClientConfig};
use models::{DebtRow, FinancialState, Proposal};
use utils::samples::{
    export_debts_csv, write_sample, DEBTS_SAMPLE, DEBTS_SAMPLE_FILE, INCOME_COSTS_SAMPLE,
    INCOME_COSTS_SAMPLE_FILE,
};
use utils::{format_brl, normalize_manual_entry, parse_decimal};

use crate::report::{render_analysis, render_state, render_summary};

/// Which sample file to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    IncomeCosts,
    Debts,
}

/// Parses an amount typed on the command line ("1.234,56" or "1234.56").
pub fn parse_amount(raw: &str) -> Result<f64> {
    parse_decimal(&normalize_manual_entry(raw))
        .ok_or_else(|| anyhow!("'{}' is not a valid amount", raw))
}

/// Loads the snapshot, applies `edit` and saves it back.
///
/// Returns the edit's message followed by the recomputed totals. If `edit`
/// fails nothing is written.
fn mutate<F>(state_path: &Path, edit: F) -> Result<String>
where
    F: FnOnce(&mut FinancialState) -> Result<String>,
{
    let mut state = utils::load_state(state_path)?;
    let message = edit(&mut state)?;
    utils::save_state(state_path, &mut state)?;

    let summary = utils::summarize(&state);
    Ok(format!("{}\n\n{}", message, render_summary(&summary)))
}

pub fn show(state_path: &Path) -> Result<String> {
    let state = utils::load_state(state_path)?;
    let summary = utils::summarize(&state);
    Ok(render_state(&state, &summary))
}

pub fn summary(state_path: &Path) -> Result<String> {
    let state = utils::load_state(state_path)?;
    Ok(render_summary(&utils::summarize(&state)))
}

pub fn set_income(state_path: &Path, raw: &str) -> Result<String> {
    let value = parse_amount(raw)?;
    mutate(state_path, |state| {
        state.monthly_income = Some(value);
        Ok(format!("✓ Monthly income set to {}", format_brl(value)))
    })
}

pub fn set_costs(state_path: &Path, raw: &str) -> Result<String> {
    let value = parse_amount(raw)?;
    mutate(state_path, |state| {
        state.monthly_costs = Some(value);
        Ok(format!("✓ Monthly costs set to {}", format_brl(value)))
    })
}

/// Adds a debt row. Numbers follow the same notation rule as income and
/// costs and are not validated; rows that do not parse are left out of the
/// analysis.
pub fn add_debt(
    state_path: &Path,
    debt_type: &str,
    total: &str,
    rate: &str,
    payment: &str,
) -> Result<String> {
    let row = DebtRow::new(
        debt_type.trim(),
        normalize_manual_entry(total),
        normalize_manual_entry(rate),
        normalize_manual_entry(payment),
    );
    let complete = utils::debt_record(&row).is_some();

    mutate(state_path, |state| {
        state.push_debt(row);
        let mut message = format!("✓ Debt row {} added", state.debts.len());
        if !complete {
            message.push_str("\n⚠ Row is incomplete and will be left out of the analysis");
        }
        Ok(message)
    })
}

/// Removes the debt row at `position` (1-based, as listed by `show`).
pub fn remove_debt(state_path: &Path, position: usize) -> Result<String> {
    mutate(state_path, |state| {
        let removed = position
            .checked_sub(1)
            .and_then(|idx| state.remove_debt(idx))
            .ok_or_else(|| {
                anyhow!(
                    "No debt row {} (there are {} row(s))",
                    position,
                    state.debts.len()
                )
            })?;
        let label = if removed.debt_type.is_empty() {
            "(empty)"
        } else {
            removed.debt_type.as_str()
        };
        Ok(format!("✓ Debt row {} removed: {}", position, label))
    })
}

pub fn set_proposal(state_path: &Path, payment: &str, term_months: u32, rate: &str) -> Result<String> {
    let proposal = Proposal {
        payment: parse_amount(payment)?,
        term_months,
        rate_percent: parse_amount(rate)?,
    };
    mutate(state_path, |state| {
        state.proposal = Some(proposal);
        Ok(format!(
            "✓ Proposal set: {} for {} months at {}% a.m.",
            format_brl(proposal.payment),
            proposal.term_months,
            proposal.rate_percent
        ))
    })
}

pub fn clear_proposal(state_path: &Path) -> Result<String> {
    mutate(state_path, |state| {
        state.proposal = None;
        Ok("✓ Proposal cleared".to_string())
    })
}

pub fn set_what_if(state_path: &Path, raw: &str) -> Result<String> {
    let value = parse_amount(raw)?;
    mutate(state_path, |state| {
        state.what_if_payment = Some(value);
        let mut message = format!("✓ Extra monthly payment set to {}", format_brl(value));
        if value <= 0.0 {
            message.push_str("\n⚠ Only amounts above zero are sent for analysis");
        }
        Ok(message)
    })
}

pub fn clear_what_if(state_path: &Path) -> Result<String> {
    mutate(state_path, |state| {
        state.what_if_payment = None;
        Ok("✓ Extra monthly payment cleared".to_string())
    })
}

pub fn import_income_costs(state_path: &Path, file: &Path) -> Result<String> {
    let text = utils::read_ledger_file(file)?;
    let mut state = utils::load_state(state_path)?;

    let totals = income_costs::import_into(&mut state, &text)
        .with_context(|| format!("Could not import {}", file.display()))?;
    let Some(totals) = totals else {
        return Ok(format!(
            "⚠ {} has no data rows, state left unchanged",
            file.display()
        ));
    };

    utils::save_state(state_path, &mut state)?;
    Ok(format!(
        "✓ Monthly income: {}\n✓ Monthly costs:  {}\n\n{}",
        format_brl(totals.total_income),
        format_brl(totals.total_costs),
        render_summary(&utils::summarize(&state))
    ))
}

pub fn import_debts(state_path: &Path, file: &Path) -> Result<String> {
    let text = utils::read_ledger_file(file)?;
    let mut state = utils::load_state(state_path)?;

    let imported = debts::import_into(&mut state, &text)
        .with_context(|| format!("Could not import {}", file.display()))?;
    utils::save_state(state_path, &mut state)?;

    let valid = utils::valid_debt_records(&state.debts).len();
    let mut out = format!("✓ Debt rows imported: {}", imported);
    if valid < imported {
        out.push_str(&format!(
            "\n⚠ {} row(s) have a missing type or non-numeric value and will be left out of the analysis",
            imported - valid
        ));
    }
    out.push_str("\n\n");
    out.push_str(&render_summary(&utils::summarize(&state)));
    Ok(out)
}

/// Writes a sample file to `target` (a file, or a directory for the default name).
pub fn sample(kind: SampleKind, target: &Path) -> Result<String> {
    let (name, content) = match kind {
        SampleKind::IncomeCosts => (INCOME_COSTS_SAMPLE_FILE, INCOME_COSTS_SAMPLE),
        SampleKind::Debts => (DEBTS_SAMPLE_FILE, DEBTS_SAMPLE),
    };
    let written = write_sample(target, name, content)?;
    Ok(format!("✅ Sample written to: {}", written.display()))
}

/// Exports the debt rows as importable CSV. Without `out` the CSV is returned.
pub fn export_debts(state_path: &Path, out: Option<&Path>) -> Result<String> {
    let state = utils::load_state(state_path)?;

    let mut buf = Vec::new();
    let rows = export_debts_csv(&state.debts, &mut buf)?;
    let csv = String::from_utf8(buf).context("Exported CSV is not valid UTF-8")?;

    match out {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("Cannot write export file {:?}", path))?;
            Ok(format!("✅ {} debt row(s) exported to: {}", rows, path.display()))
        }
        None => Ok(csv),
    }
}

/// Discards the saved snapshot. Refuses to run without confirmation.
pub fn reset(state_path: &Path, confirmed: bool) -> Result<String> {
    if !confirmed {
        bail!("Reset discards all entered data; run again with --yes to confirm");
    }
    let removed = utils::clear_state(state_path)?;
    let summary = utils::summarize(&FinancialState::default());
    let message = if removed {
        "✓ Saved data cleared"
    } else {
        "✓ Nothing saved, already empty"
    };
    Ok(format!("{}\n\n{}", message, render_summary(&summary)))
}

/// Runs the analysis against the configured model.
///
/// With `raw_json` the parsed report is printed as JSON instead of the
/// terminal report.
pub fn analyze(state_path: &Path, raw_json: bool) -> Result<String> {
    let state = utils::load_state(state_path)?;
    let payload = utils::analysis_payload(&state).context("Cannot run the analysis")?;

    let client = GeminiClient::new(GeminiClientConfig::from_env()?)?;
    tracing::info!(
        model = client.model(),
        debts = payload.debts.len(),
        "starting analysis"
    );
    let analysis = client
        .analyze(&payload)
        .context("Failed to generate the analysis")?;

    render_analysis_output(&analysis, raw_json)
}

fn render_analysis_output(analysis: &Analysis, raw_json: bool) -> Result<String> {
    if raw_json {
        return serde_json::to_string_pretty(analysis).context("Failed to serialize the analysis");
    }
    Ok(render_analysis(analysis))
}
