use serde::{Deserialize, Serialize, Serializer};

// Persisted state models
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DebtRow {
	#[serde(rename = "type", default)]
	pub debt_type: String,
	#[serde(default)]
	pub total: String,
	#[serde(default)]
	pub rate: String,
	#[serde(default)]
	pub payment: String,
}

impl DebtRow {
	pub fn new(
		debt_type: impl Into<String>,
		total: impl Into<String>,
		rate: impl Into<String>,
		payment: impl Into<String>,
	) -> Self {
		Self {
			debt_type: debt_type.into(),
			total: total.into(),
			rate: rate.into(),
			payment: payment.into(),
		}
	}

	/// The empty row shown when no debts are configured.
	pub fn placeholder() -> Self {
		Self::default()
	}

	pub fn is_placeholder(&self) -> bool {
		self.debt_type.is_empty()
			&& self.total.is_empty()
			&& self.rate.is_empty()
			&& self.payment.is_empty()
	}
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Proposal {
	pub payment: f64,
	pub term_months: u32,
	pub rate_percent: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FinancialState {
	#[serde(default)]
	pub monthly_income: Option<f64>,
	#[serde(default)]
	pub monthly_costs: Option<f64>,
	#[serde(default)]
	pub debts: Vec<DebtRow>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub proposal: Option<Proposal>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub what_if_payment: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub saved_at: Option<String>,
}

impl Default for FinancialState {
	fn default() -> Self {
		Self {
			monthly_income: None,
			monthly_costs: None,
			debts: vec![DebtRow::placeholder()],
			proposal: None,
			what_if_payment: None,
			saved_at: None,
		}
	}
}

impl FinancialState {
	/// Restores the one-placeholder-row invariant after a load or a removal.
	pub fn ensure_debt_row(&mut self) {
		if self.debts.is_empty() {
			self.debts.push(DebtRow::placeholder());
		}
	}

	/// Overwrites both totals, last write wins.
	pub fn set_income_and_costs(&mut self, income: f64, costs: f64) {
		self.monthly_income = Some(income);
		self.monthly_costs = Some(costs);
	}

	/// Drops the whole debt list in favour of `rows`, keeping their order.
	pub fn replace_debts(&mut self, rows: Vec<DebtRow>) {
		self.debts = rows;
		self.ensure_debt_row();
	}

	/// Appends a row. A lone placeholder row is replaced instead of kept.
	pub fn push_debt(&mut self, row: DebtRow) {
		if self.debts.len() == 1 && self.debts[0].is_placeholder() {
			self.debts.clear();
		}
		self.debts.push(row);
	}

	/// Removes the row at `index` (0-based) and returns it.
	pub fn remove_debt(&mut self, index: usize) -> Option<DebtRow> {
		if index >= self.debts.len() {
			return None;
		}
		let removed = self.debts.remove(index);
		self.ensure_debt_row();
		Some(removed)
	}
}

// Derived models
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Summary {
	pub total_debt: f64,
	pub total_scheduled_payments: f64,
	pub payment_potential: f64,
}

/// A debt row whose four fields all validated.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DebtRecord {
	#[serde(rename = "tipo")]
	pub debt_type: String,
	#[serde(rename = "valorTotal", serialize_with = "whole_as_integer")]
	pub principal: f64,
	#[serde(rename = "taxaJuros", serialize_with = "whole_as_integer")]
	pub monthly_rate_percent: f64,
	#[serde(rename = "pagamentoMensal", serialize_with = "whole_as_integer")]
	pub monthly_payment: f64,
}

// 15000.0 is written as 15000, the way JavaScript clients print it.
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
	const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
	if value.fract() == 0.0 && value.abs() <= MAX_EXACT {
		serializer.serialize_i64(*value as i64)
	} else {
		serializer.serialize_f64(*value)
	}
}

// Analysis request payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AnalysisPayload {
	pub monthly_income: f64,
	pub monthly_costs: f64,
	pub debts: Vec<DebtRecord>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub proposal: Option<Proposal>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub what_if_payment: Option<f64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_state_has_one_placeholder_row() {
		let state = FinancialState::default();
		assert_eq!(state.debts.len(), 1);
		assert!(state.debts[0].is_placeholder());
		assert_eq!(state.monthly_income, None);
	}

	#[test]
	fn test_push_debt_replaces_lone_placeholder() {
		let mut state = FinancialState::default();
		state.push_debt(DebtRow::new("Cartão", "1000", "10", "100"));
		state.push_debt(DebtRow::new("Cheque", "500", "8", "50"));
		assert_eq!(state.debts.len(), 2);
		assert_eq!(state.debts[0].debt_type, "Cartão");
	}

	#[test]
	fn test_remove_last_debt_leaves_placeholder() {
		let mut state = FinancialState::default();
		state.push_debt(DebtRow::new("Cartão", "1000", "10", "100"));
		let removed = state.remove_debt(0).unwrap();
		assert_eq!(removed.debt_type, "Cartão");
		assert_eq!(state.debts, vec![DebtRow::placeholder()]);
		assert!(state.remove_debt(5).is_none());
	}

	#[test]
	fn test_debt_row_serializes_with_type_key() {
		let row = DebtRow::new("Cartão", "15000", "14.5", "950");
		let v = serde_json::to_value(&row).unwrap();
		assert_eq!(v["type"], "Cartão");
		assert_eq!(v["rate"], "14.5");
	}

	#[test]
	fn test_state_missing_fields_default() {
		let state: FinancialState = serde_json::from_str(r#"{"monthly_income": 5000.0}"#).unwrap();
		assert_eq!(state.monthly_income, Some(5000.0));
		assert!(state.debts.is_empty());
		assert!(state.proposal.is_none());
	}

	#[test]
	fn test_debt_record_writes_whole_numbers_as_integers() {
		let record = DebtRecord {
			debt_type: "Cartão".to_string(),
			principal: 15000.0,
			monthly_rate_percent: 14.5,
			monthly_payment: 950.0,
		};
		assert_eq!(
			serde_json::to_string(&record).unwrap(),
			r#"{"tipo":"Cartão","valorTotal":15000,"taxaJuros":14.5,"pagamentoMensal":950}"#
		);

		let back: DebtRecord = serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();
		assert_eq!(back, record);
	}
}
