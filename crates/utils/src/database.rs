use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use models::FinancialState;
use std::{
    fs::File,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

pub const STATE_FILE_NAME: &str = "advisor_state.json";

/// Resolves a state location to the snapshot file.
///
/// A directory, or a path that does not exist yet and does not end in
/// `.json`, resolves to `<path>/advisor_state.json`.
pub fn resolve_state_path<P: AsRef<Path>>(state_path: P) -> PathBuf {
    let path = state_path.as_ref();
    if path.is_dir() || (!path.exists() && !path.to_string_lossy().ends_with(".json")) {
        path.join(STATE_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

/// Loads the saved snapshot.
///
/// A missing file gives the empty state. So does a file that is not valid
/// JSON, after a warning; a broken snapshot should never block the user.
///
/// # Example
/// ```no_run
/// let state = utils::load_state("state").unwrap();
/// println!("{} debt rows", state.debts.len());
/// ```
pub fn load_state<P: AsRef<Path>>(state_path: P) -> Result<FinancialState> {
    let db_path = resolve_state_path(state_path);

    let contents = match std::fs::read_to_string(&db_path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %db_path.display(), "no saved state, starting empty");
            return Ok(FinancialState::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Cannot read state file at {:?}", db_path));
        }
    };

    let mut state = match serde_json::from_str::<FinancialState>(&contents) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(path = %db_path.display(), error = %e, "saved state is not valid, starting empty");
            return Ok(FinancialState::default());
        }
    };

    state.ensure_debt_row();
    Ok(state)
}

/// Writes the snapshot, stamping `saved_at`. Returns the resolved file path.
pub fn save_state<P: AsRef<Path>>(state_path: P, state: &mut FinancialState) -> Result<PathBuf> {
    let db_path = resolve_state_path(state_path);

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create directory {:?}", parent))?;
        }
    }

    state.ensure_debt_row();
    state.saved_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

    let mut file = File::create(&db_path)
        .with_context(|| format!("Cannot create state file at {:?}", db_path))?;
    let formatted = serde_json::to_string_pretty(state)?;
    file.write_all(formatted.as_bytes())?;

    tracing::debug!(path = %db_path.display(), "state saved");
    Ok(db_path)
}

/// Deletes the snapshot. Returns whether a file was there.
pub fn clear_state<P: AsRef<Path>>(state_path: P) -> Result<bool> {
    let db_path = resolve_state_path(state_path);
    match std::fs::remove_file(&db_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Cannot remove state file at {:?}", db_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::DebtRow;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "advisor-utils-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_path_resolution() {
        let dir = scratch_dir("resolve");
        assert_eq!(resolve_state_path(&dir), dir.join(STATE_FILE_NAME));
        assert_eq!(resolve_state_path(dir.join("other.json")), dir.join("other.json"));
        assert_eq!(resolve_state_path(dir.join("nested")), dir.join("nested").join(STATE_FILE_NAME));
    }

    #[test]
    fn test_missing_state_is_empty() {
        let dir = scratch_dir("missing");
        let state = load_state(&dir).unwrap();
        assert_eq!(state, FinancialState::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = scratch_dir("save");
        let mut state = FinancialState {
            monthly_income: Some(5000.0),
            monthly_costs: Some(1500.0),
            debts: vec![DebtRow::new("Cartão", "15000", "14.5", "950")],
            ..Default::default()
        };

        let written = save_state(&dir, &mut state).unwrap();
        assert_eq!(written, dir.join(STATE_FILE_NAME));
        assert!(state.saved_at.is_some());

        let loaded = load_state(&dir).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_invalid_json_falls_back_to_empty() {
        let dir = scratch_dir("invalid");
        std::fs::write(dir.join(STATE_FILE_NAME), "{ not json").unwrap();
        let state = load_state(&dir).unwrap();
        assert_eq!(state, FinancialState::default());
    }

    #[test]
    fn test_empty_debt_list_gets_placeholder() {
        let dir = scratch_dir("placeholder");
        std::fs::write(dir.join(STATE_FILE_NAME), r#"{"monthly_income": 10.0, "debts": []}"#).unwrap();
        let state = load_state(&dir).unwrap();
        assert_eq!(state.debts, vec![DebtRow::placeholder()]);
    }

    #[test]
    fn test_clear_state() {
        let dir = scratch_dir("clear");
        let mut state = FinancialState::default();
        save_state(&dir, &mut state).unwrap();
        assert!(clear_state(&dir).unwrap());
        assert!(!clear_state(&dir).unwrap());
        assert_eq!(load_state(&dir).unwrap(), FinancialState::default());
    }
}
