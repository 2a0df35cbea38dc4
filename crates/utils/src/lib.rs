pub mod database;
pub mod ledger;
pub mod numbers;
pub mod payload;
pub mod samples;
pub mod summary;

// Re-export commonly used items
pub use crate::database::{clear_state, load_state, resolve_state_path, save_state};
pub use crate::ledger::{read_ledger_file, ImportError, Ledger, LedgerRow};
pub use crate::numbers::{format_brl, normalize_brazilian_number, normalize_manual_entry, parse_decimal};
pub use crate::payload::{analysis_payload, debt_record, valid_debt_records, PayloadError};
pub use crate::summary::summarize;
