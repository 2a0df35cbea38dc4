//! Structured analysis returned by the model.
//!
//! The schema is not under our control, so every field is optional and
//! numbers are accepted either as JSON numbers or as text ("R$ 1.200,50",
//! "14.0%").

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

/// Name the model uses for the user's current situation.
pub const CURRENT_SITUATION: &str = "Situação Atual";
/// Name the model uses for the proposal the user supplied.
pub const USER_PROPOSAL: &str = "Sua Proposta";

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("fenced JSON pattern is valid")
});

// "1.200" or "12.345.678": dots are thousands separators.
static GROUPED_THOUSANDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}(\.\d{3})+$").expect("grouped thousands pattern is valid")
});

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("the model returned an empty response")]
    EmptyResponse,

    #[error("the model response was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisReport {
    #[serde(deserialize_with = "lenient_object")]
    pub diagnostico: Option<Diagnosis>,
    #[serde(deserialize_with = "lenient_object")]
    pub simulacao: Option<Simulation>,
    #[serde(deserialize_with = "lenient_text")]
    pub resumo_analise: Option<String>,
    #[serde(deserialize_with = "lenient_object")]
    pub recomendacao: Option<Recommendation>,
}

impl AnalysisReport {
    pub fn scenarios(&self) -> &[Scenario] {
        self.simulacao
            .as_ref()
            .map(|s| s.cenarios.as_slice())
            .unwrap_or(&[])
    }

    pub fn best_option(&self) -> Option<&str> {
        self.recomendacao
            .as_ref()
            .and_then(|r| r.melhor_opcao.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Monthly rate of the first scenario, the baseline for comparisons.
    pub fn current_monthly_rate(&self) -> Option<f64> {
        self.scenarios().first().and_then(Scenario::monthly_rate)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Diagnosis {
    #[serde(deserialize_with = "lenient_number")]
    pub receita_mensal: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub custo_mensal: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub potencial_pagamento: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Simulation {
    #[serde(deserialize_with = "lenient_list")]
    pub cenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scenario {
    #[serde(deserialize_with = "lenient_text")]
    pub proposta: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub banco: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub link: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub taxa_mensal: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub taxa_anual: Option<String>,
    #[serde(deserialize_with = "lenient_number")]
    pub prazo: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub parcela: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    pub valor_total: Option<f64>,
}

impl Scenario {
    pub fn name(&self) -> &str {
        self.proposta.as_deref().unwrap_or("N/A")
    }

    pub fn is_current_situation(&self) -> bool {
        self.proposta.as_deref() == Some(CURRENT_SITUATION)
    }

    pub fn is_user_proposal(&self) -> bool {
        self.proposta.as_deref() == Some(USER_PROPOSAL)
    }

    /// Leading number of `taxaMensal`, so "3.5%" and "3,5% a.m." both give 3.5.
    pub fn monthly_rate(&self) -> Option<f64> {
        self.taxa_mensal.as_deref().and_then(leading_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recommendation {
    #[serde(deserialize_with = "lenient_text")]
    pub melhor_opcao: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub justificativa: Option<String>,
}

/// Parses the model text into a report.
///
/// A fenced ```json block is unwrapped when present. If the text still is
/// not JSON, the outermost `{...}` span is tried before giving up.
pub fn parse_analysis(text: &str) -> Result<AnalysisReport, AnalysisError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AnalysisError::EmptyResponse);
    }

    let json_text = extract_fenced_json(text).unwrap_or(text);

    match serde_json::from_str::<AnalysisReport>(json_text) {
        Ok(report) => Ok(report),
        Err(e) => {
            let start = json_text.find('{');
            let end = json_text.rfind('}');
            match (start, end) {
                (Some(s), Some(e2)) if s < e2 && (s > 0 || e2 + 1 < json_text.len()) => {
                    tracing::debug!("retrying analysis parse on the outermost object");
                    Ok(serde_json::from_str(&json_text[s..=e2])?)
                }
                _ => Err(AnalysisError::InvalidJson(e)),
            }
        }
    }
}

fn extract_fenced_json(text: &str) -> Option<&str> {
    FENCED_JSON
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
}

/// Reads the number at the start of `raw`, ignoring a currency prefix.
///
/// Text with a comma is pt-BR notation. Without one, dots are only read as
/// thousands separators in an `R$` amount grouped in threes.
fn leading_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let currency = raw.starts_with("R$");
    let trimmed = raw.trim_start_matches("R$").trim();
    let prefix: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
        .collect();
    if prefix.is_empty() {
        return None;
    }

    let normalized = if prefix.contains(',') || (currency && GROUPED_THOUSANDS.is_match(&prefix)) {
        utils::normalize_brazilian_number(&prefix)
    } else {
        prefix
    };
    utils::parse_decimal(&normalized)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => leading_number(&s),
        _ => None,
    })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(v @ Value::Object(_)) => serde_json::from_value(v).ok(),
        _ => None,
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Scenario>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Scenario>(item).ok())
        .collect())
}
