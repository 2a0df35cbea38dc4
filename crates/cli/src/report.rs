use std::fmt::Write;

use ai_client::{Analysis, Scenario};
use models::{FinancialState, Summary};
use utils::format_brl;

/// Live totals shown after every change.
pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total em dívidas:          {}", format_brl(summary.total_debt));
    let _ = writeln!(
        out,
        "Pagamentos mensais:        {}",
        format_brl(summary.total_scheduled_payments)
    );
    let _ = writeln!(
        out,
        "Potencial de pagamento:    {}",
        format_brl(summary.payment_potential)
    );
    out
}

/// Full view of the form: inputs, debt table and totals.
pub fn render_state(state: &FinancialState, summary: &Summary) -> String {
    let amount = |v: Option<f64>| v.map(format_brl).unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "Receita mensal:  {}", amount(state.monthly_income));
    let _ = writeln!(out, "Custos mensais:  {}", amount(state.monthly_costs));
    out.push('\n');

    let _ = writeln!(
        out,
        "{:>3}  {:<28} {:>14} {:>10} {:>14}",
        "#", "Tipo de Dívida", "Valor Total", "Juros a.m.", "Pagamento"
    );
    for (idx, row) in state.debts.iter().enumerate() {
        let cell = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
        let _ = writeln!(
            out,
            "{:>3}  {:<28} {:>14} {:>10} {:>14}",
            idx + 1,
            cell(&row.debt_type),
            cell(&row.total),
            cell(&row.rate),
            cell(&row.payment)
        );
    }
    out.push('\n');

    if let Some(p) = &state.proposal {
        let _ = writeln!(
            out,
            "Proposta recebida: parcela {} por {} meses a {}% a.m.",
            format_brl(p.payment),
            p.term_months,
            p.rate_percent
        );
    }
    if let Some(extra) = state.what_if_payment {
        let _ = writeln!(out, "Valor extra \"E se?\": {}", format_brl(extra));
    }
    if state.proposal.is_some() || state.what_if_payment.is_some() {
        out.push('\n');
    }

    out.push_str(&render_summary(summary));
    out
}

/// Terminal rendering of the analysis returned by the model.
pub fn render_analysis(analysis: &Analysis) -> String {
    let report = &analysis.report;
    let mut out = String::new();

    if let Some(text) = report.resumo_analise.as_deref().filter(|t| !t.trim().is_empty()) {
        section(&mut out, "Resumo da Análise");
        let _ = writeln!(out, "{}\n", text.trim());
    }

    if let Some(diag) = &report.diagnostico {
        let potential = diag.potencial_pagamento.unwrap_or(0.0);
        section(&mut out, "Raio-X Financeiro");
        let _ = writeln!(out, "Receita Mensal:          {}", format_brl(diag.receita_mensal.unwrap_or(0.0)));
        let _ = writeln!(out, "Custo Mensal:            {}", format_brl(diag.custo_mensal.unwrap_or(0.0)));
        let _ = writeln!(
            out,
            "Potencial de Pagamento:  {} ({})\n",
            format_brl(potential),
            if potential >= 0.0 { "positivo" } else { "negativo" }
        );
    }

    if let Some(rec) = &report.recomendacao {
        section(&mut out, "Recomendação da IA");
        let _ = writeln!(out, "✔ {}", rec.melhor_opcao.as_deref().unwrap_or("N/A"));
        if let Some(why) = rec.justificativa.as_deref() {
            let _ = writeln!(out, "{}", why);
        }
        out.push('\n');
    }

    let scenarios = report.scenarios();
    if !scenarios.is_empty() {
        section(&mut out, "Análise Comparativa");
        let current_rate = report.current_monthly_rate();
        let best = report.best_option();

        let _ = writeln!(
            out,
            "{:<36} {:>10} {:>10} {:>8} {:>14} {:>16}",
            "Proposta / Banco", "Taxa mês", "Taxa ano", "Prazo", "Parcela", "Valor Total"
        );
        for scenario in scenarios {
            let _ = writeln!(
                out,
                "{:<36} {:>10} {:>10} {:>8} {:>14} {:>16}",
                scenario_label(scenario, best),
                rate_cell(scenario, current_rate),
                scenario.taxa_anual.as_deref().unwrap_or("N/A"),
                scenario
                    .prazo
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                format_brl(scenario.parcela.unwrap_or(0.0)),
                format_brl(scenario.valor_total.unwrap_or(0.0)),
            );
            let bank = scenario.banco.as_deref().unwrap_or("N/A");
            match scenario.link.as_deref().filter(|l| !l.is_empty()) {
                Some(link) => {
                    let _ = writeln!(out, "    {} <{}>", bank, link);
                }
                None => {
                    let _ = writeln!(out, "    {}", bank);
                }
            }
        }
        out.push('\n');
    }

    if !analysis.sources.is_empty() {
        section(&mut out, "Fontes da Pesquisa");
        for source in &analysis.sources {
            let _ = writeln!(
                out,
                "- {} <{}>",
                source.title.as_deref().unwrap_or(&source.uri),
                source.uri
            );
        }
    }

    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "─".repeat(title.chars().count()));
}

fn scenario_label(scenario: &Scenario, best: Option<&str>) -> String {
    let mut label = scenario.name().to_string();
    if scenario.is_user_proposal() {
        label.push_str(" ★");
    }
    if best.is_some_and(|b| scenario.proposta.as_deref() == Some(b)) {
        label.push_str(" ✔");
    }
    label
}

/// Monthly rate with an arrow when it beats or loses to the current situation.
fn rate_cell(scenario: &Scenario, current_rate: Option<f64>) -> String {
    let shown = scenario.taxa_mensal.as_deref().unwrap_or("N/A").to_string();
    if scenario.is_current_situation() {
        return shown;
    }
    match (scenario.monthly_rate(), current_rate) {
        (Some(rate), Some(current)) if rate < current => format!("{shown} ↓"),
        (Some(rate), Some(current)) if rate > current => format!("{shown} ↑"),
        _ => shown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_client::{parse_analysis, Source};
    use models::DebtRow;

    fn analysis() -> Analysis {
        let report = parse_analysis(
            r#"{
              "diagnostico": {"receitaMensal": 2000, "custoMensal": 2500, "potencialPagamento": -500},
              "simulacao": {"cenarios": [
                {"proposta": "Situação Atual", "taxaMensal": "14.0%", "prazo": 48, "parcela": 1800, "valorTotal": 86400},
                {"proposta": "Sua Proposta", "taxaMensal": "3.5%", "prazo": 60, "parcela": 1200, "valorTotal": 72000},
                {"proposta": "Crédito Caro", "banco": "Banco X", "link": "https://x.example", "taxaMensal": "15%"}
              ]},
              "resumoAnalise": "Situação apertada.",
              "recomendacao": {"melhorOpcao": "Sua Proposta", "justificativa": "Menor custo."}
            }"#,
        )
        .unwrap();
        Analysis {
            report,
            sources: vec![Source {
                uri: "https://fonte.example".to_string(),
                title: Some("Fonte".to_string()),
            }],
        }
    }

    #[test]
    fn test_render_analysis_sections() {
        let text = render_analysis(&analysis());
        assert!(text.contains("Resumo da Análise"));
        assert!(text.contains("Situação apertada."));
        assert!(text.contains("-R$ 500,00 (negativo)"));
        assert!(text.contains("✔ Sua Proposta"));
        assert!(text.contains("Sua Proposta ★ ✔"));
        assert!(text.contains("3.5% ↓"));
        assert!(text.contains("15% ↑"));
        assert!(text.contains("Banco X <https://x.example>"));
        assert!(text.contains("- Fonte <https://fonte.example>"));
    }

    #[test]
    fn test_render_empty_analysis() {
        let empty = Analysis {
            report: Default::default(),
            sources: Vec::new(),
        };
        assert_eq!(render_analysis(&empty), "");
    }

    #[test]
    fn test_render_state() {
        let state = FinancialState {
            monthly_income: Some(5000.0),
            monthly_costs: None,
            debts: vec![DebtRow::new("Cartão", "15000", "14.5", "950")],
            ..Default::default()
        };
        let summary = utils::summarize(&state);
        let text = render_state(&state, &summary);
        assert!(text.contains("Receita mensal:  R$ 5.000,00"));
        assert!(text.contains("Custos mensais:  -"));
        assert!(text.contains("Cartão"));
        assert!(text.contains("Total em dívidas:          R$ 15.000,00"));
        assert!(text.contains("Potencial de pagamento:    R$ 5.000,00"));
    }
}
