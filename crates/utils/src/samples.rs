use anyhow::{Context, Result};
use models::DebtRow;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::numbers::to_brazilian_text;

pub const INCOME_COSTS_SAMPLE_FILE: &str = "exemplo_renda_custos.csv";
pub const DEBTS_SAMPLE_FILE: &str = "exemplo_dividas.csv";

pub const INCOME_COSTS_SAMPLE: &str = "Descrição;Valor\nSalário;5000\nRenda Extra;500\nAluguel;-1500\nSupermercado;-800\nTransporte;-200";

pub const DEBTS_HEADER: [&str; 4] = [
    "Tipo de Dívida",
    "Valor Total (R$)",
    "Juros (% a.m.)",
    "Pagamento Atual (R$)",
];

pub const DEBTS_SAMPLE: &str = "Tipo de Dívida;Valor Total (R$);Juros (% a.m.);Pagamento Atual (R$)\nCartão de Crédito;15000;14,5;950\nCheque Especial;5000;8,0;400\nEmpréstimo Pessoal;20000;4,5;1200";

const UTF8_BOM: &str = "\u{FEFF}";

/// Writes `content` with a UTF-8 BOM so spreadsheet tools pick the right encoding.
///
/// A directory target gets `default_name` appended.
pub fn write_sample<P: AsRef<Path>>(target: P, default_name: &str, content: &str) -> Result<PathBuf> {
    let target = target.as_ref();
    let path = if target.is_dir() {
        target.join(default_name)
    } else {
        target.to_path_buf()
    };

    std::fs::write(&path, format!("{UTF8_BOM}{content}"))
        .with_context(|| format!("Cannot write sample file {:?}", path))?;
    Ok(path)
}

/// Writes the debt rows in the importable debts format.
///
/// Placeholder rows are skipped; numbers go back to decimal-comma notation
/// so the output imports to the same rows. A `;` inside a field would split
/// it on import, so it is written as `,`.
pub fn export_debts_csv<W: Write>(rows: &[DebtRow], writer: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(DEBTS_HEADER)?;

    let mut written = 0usize;
    for row in rows.iter().filter(|r| !r.is_placeholder()) {
        let debt_type = export_field(&row.debt_type);
        let total = export_field(&to_brazilian_text(&row.total));
        let rate = export_field(&to_brazilian_text(&row.rate));
        let payment = export_field(&to_brazilian_text(&row.payment));
        wtr.write_record([
            debt_type.as_str(),
            total.as_str(),
            rate.as_str(),
            payment.as_str(),
        ])?;
        written += 1;
    }

    wtr.flush().context("Failed to flush debts CSV")?;
    Ok(written)
}

/// Keeps a field on one line and inside its column.
fn export_field(raw: &str) -> String {
    if !raw.contains([';', '\n', '\r']) {
        return raw.to_string();
    }
    tracing::warn!(field = raw, "separator in debt field replaced on export");
    raw.replace(';', ",").replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_debts_csv() {
        let rows = vec![
            DebtRow::new("Cartão de Crédito", "15000", "14.5", "950"),
            DebtRow::placeholder(),
            DebtRow::new("Cheque Especial", "5000.75", "8", "400"),
        ];

        let mut buf = Vec::new();
        let written = export_debts_csv(&rows, &mut buf).unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Tipo de Dívida;Valor Total (R$);Juros (% a.m.);Pagamento Atual (R$)\n\
             Cartão de Crédito;15000;14,5;950\n\
             Cheque Especial;5000,75;8;400\n"
        );
    }

    #[test]
    fn test_export_keeps_separator_out_of_fields() {
        let rows = vec![
            DebtRow::new("Cartão;Visa", "100", "1", "10"),
            DebtRow::new("Linha\nquebrada", "1;5", "2", "3"),
        ];

        let mut buf = Vec::new();
        export_debts_csv(&rows, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "Cartão,Visa;100;1;10");
        assert_eq!(lines[2], "Linha quebrada;1,5;2;3");
        assert!(lines.iter().all(|l| l.split(';').count() == 4));
    }

    #[test]
    fn test_write_sample_adds_bom() {
        let dir = std::env::temp_dir().join(format!("advisor-samples-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = write_sample(&dir, DEBTS_SAMPLE_FILE, DEBTS_SAMPLE).unwrap();
        assert_eq!(path, dir.join(DEBTS_SAMPLE_FILE));

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
    }

    #[test]
    fn test_sample_headers_match() {
        assert!(DEBTS_SAMPLE.starts_with(&DEBTS_HEADER.join(";")));
        assert!(INCOME_COSTS_SAMPLE.starts_with("Descrição;Valor"));
    }
}
