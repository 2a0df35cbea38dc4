use anyhow::{Context, Result};
use std::env;

use debts::import_into;

fn main() -> Result<()> {
    // Usage:
    //   debts_importer <debts.csv> [state_path]
    //
    // Defaults:
    //   debts.csv  = exemplo_dividas.csv
    //   state_path = . (resolves to ./advisor_state.json)

    logger::init();

    let args: Vec<String> = env::args().collect();
    let input_csv = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or(utils::samples::DEBTS_SAMPLE_FILE);
    let state_path = args.get(2).map(|s| s.as_str()).unwrap_or(".");

    println!("📖 Reading {}", input_csv);
    let text = utils::read_ledger_file(input_csv)?;

    let mut state = utils::load_state(state_path)?;
    let imported = import_into(&mut state, &text)
        .with_context(|| format!("Could not import {}", input_csv))?;

    let written = utils::save_state(state_path, &mut state)?;
    let valid = utils::valid_debt_records(&state.debts).len();
    let summary = utils::summarize(&state);

    println!("\n📊 Summary:");
    println!("─────────────────────────────────────────");
    println!("✓ Debt rows imported: {}", imported);
    if valid < imported {
        println!(
            "⚠ {} row(s) have a missing type or non-numeric value and will be left out of the analysis",
            imported - valid
        );
    }
    println!("✓ Total debt: {}", utils::format_brl(summary.total_debt));
    println!(
        "✓ Total scheduled payments: {}",
        utils::format_brl(summary.total_scheduled_payments)
    );
    println!("─────────────────────────────────────────");
    println!("✅ State written to: {}", written.display());

    Ok(())
}
