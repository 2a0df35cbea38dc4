use anyhow::{Context, Result};
use std::env;

use income_costs::import_into;

fn main() -> Result<()> {
    // Usage:
    //   income_costs_importer <ledger.csv> [state_path]
    //
    // Defaults:
    //   ledger.csv = exemplo_renda_custos.csv
    //   state_path = . (resolves to ./advisor_state.json)

    logger::init();

    let args: Vec<String> = env::args().collect();
    let input_csv = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or(utils::samples::INCOME_COSTS_SAMPLE_FILE);
    let state_path = args.get(2).map(|s| s.as_str()).unwrap_or(".");

    println!("📖 Reading {}", input_csv);
    let text = utils::read_ledger_file(input_csv)?;

    let mut state = utils::load_state(state_path)?;
    let totals = import_into(&mut state, &text)
        .with_context(|| format!("Could not import {}", input_csv))?;

    let Some(totals) = totals else {
        println!("⚠ {} has no data rows, state left unchanged", input_csv);
        return Ok(());
    };

    let written = utils::save_state(state_path, &mut state)?;

    println!("\n📊 Summary:");
    println!("─────────────────────────────────────────");
    println!("✓ Monthly income: {}", utils::format_brl(totals.total_income));
    println!("✓ Monthly costs:  {}", utils::format_brl(totals.total_costs));
    println!(
        "✓ Payment potential: {}",
        utils::format_brl(utils::summarize(&state).payment_potential)
    );
    println!("─────────────────────────────────────────");
    println!("✅ State written to: {}", written.display());

    Ok(())
}
