use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use cli::SampleKind;
use cli::commands;

/// Debt advisor: record income, costs and debts, then ask for an analysis.
#[derive(Debug, Parser)]
#[command(name = "advisor", version, about)]
struct Args {
    /// State file, or a directory holding advisor_state.json
    #[arg(long, global = true, env = "ADVISOR_STATE_PATH", default_value = ".")]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the entered data and the totals
    Show,
    /// Print only the totals
    Summary,
    /// Set the monthly income (e.g. 5.000,00 or 5000.00)
    SetIncome { value: String },
    /// Set the monthly costs
    SetCosts { value: String },
    /// Add a debt row
    AddDebt {
        debt_type: String,
        total: String,
        /// Monthly interest rate in percent
        rate: String,
        payment: String,
    },
    /// Remove a debt row by its number in `show`
    RemoveDebt { position: usize },
    /// Record a negotiation proposal received from a creditor
    SetProposal {
        payment: String,
        term_months: u32,
        /// Monthly interest rate in percent
        rate: String,
    },
    ClearProposal,
    /// Set the extra monthly amount for the "E se?" simulation
    SetWhatIf {
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
    ClearWhatIf,
    /// Import income and costs from a `Description;Value` CSV
    ImportIncome { file: PathBuf },
    /// Replace the debts with the rows of a debts CSV
    ImportDebts { file: PathBuf },
    /// Write a sample CSV
    Sample {
        #[arg(value_enum)]
        kind: SampleArg,
        /// Target file or directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Export the debt rows as CSV (stdout unless --out is given)
    ExportDebts {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Discard all saved data
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Ask the model for an analysis (needs GEMINI_API_KEY)
    Analyze {
        /// Print the parsed report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SampleArg {
    Income,
    Debts,
}

impl From<SampleArg> for SampleKind {
    fn from(arg: SampleArg) -> Self {
        match arg {
            SampleArg::Income => SampleKind::IncomeCosts,
            SampleArg::Debts => SampleKind::Debts,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logger::init();

    let args = Args::parse();
    let state = args.state.as_path();

    let output = match args.command {
        Command::Show => commands::show(state)?,
        Command::Summary => commands::summary(state)?,
        Command::SetIncome { value } => commands::set_income(state, &value)?,
        Command::SetCosts { value } => commands::set_costs(state, &value)?,
        Command::AddDebt {
            debt_type,
            total,
            rate,
            payment,
        } => commands::add_debt(state, &debt_type, &total, &rate, &payment)?,
        Command::RemoveDebt { position } => commands::remove_debt(state, position)?,
        Command::SetProposal {
            payment,
            term_months,
            rate,
        } => commands::set_proposal(state, &payment, term_months, &rate)?,
        Command::ClearProposal => commands::clear_proposal(state)?,
        Command::SetWhatIf { value } => commands::set_what_if(state, &value)?,
        Command::ClearWhatIf => commands::clear_what_if(state)?,
        Command::ImportIncome { file } => {
            println!("📖 Reading {}", file.display());
            commands::import_income_costs(state, &file)?
        }
        Command::ImportDebts { file } => {
            println!("📖 Reading {}", file.display());
            commands::import_debts(state, &file)?
        }
        Command::Sample { kind, out } => commands::sample(kind.into(), &out)?,
        Command::ExportDebts { out } => commands::export_debts(state, out.as_deref())?,
        Command::Reset { yes } => commands::reset(state, yes)?,
        Command::Analyze { json } => {
            if !json {
                println!("🔎 Analyzing, this can take a minute...");
            }
            commands::analyze(state, json)?
        }
    };

    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}
