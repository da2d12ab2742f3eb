//! Documentos HTML para impressão (receita e prontuário completo)
//!
//! Todo valor interpolado passa por `escape_html`.

use chrono::{DateTime, Utc};
use common_db::models::Patient;

use crate::services::records::RecordView;

const STYLE: &str = "body { font-family: Arial, sans-serif; max-width: 800px; margin: 40px auto; padding: 20px; }
.header { text-align: center; border-bottom: 2px solid #667eea; padding-bottom: 20px; margin-bottom: 30px; }
.header h1 { color: #667eea; margin: 0; }
.patient-info { background: #f8f9fa; padding: 15px; border-radius: 8px; margin-bottom: 20px; }
.section { margin-bottom: 25px; }
.record { page-break-inside: avoid; margin-bottom: 30px; border: 1px solid #ddd; padding: 20px; border-radius: 8px; }
.prescription-box { background: #e8f4ff; padding: 20px; border-radius: 8px; border-left: 4px solid #007bff; }
.prescription-box pre { white-space: pre-wrap; margin: 0; }
.footer { text-align: center; margin-top: 40px; font-size: 12px; color: #666; }
@media print { body { margin: 0; } .no-print { display: none; } }";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn document(title: &str, subtitle: &str, patient_info: &str, body: &str, footer: &str) -> String {
    format!(
        "<!DOCTYPE html>
<html lang=\"pt-BR\">
<head>
<meta charset=\"utf-8\">
<title>{title}</title>
<style>
{style}
</style>
</head>
<body>
<div class=\"header\">
<h1>Prontuário Eletrônico</h1>
<p>{subtitle}</p>
</div>
<div class=\"patient-info\">
{patient_info}
</div>
{body}
<div class=\"footer\">
{footer}
</div>
<div class=\"no-print\" style=\"text-align: center; margin-top: 20px;\">
<button onclick=\"window.print()\">Imprimir / Salvar como PDF</button>
</div>
</body>
</html>
",
        title = title,
        style = STYLE,
        subtitle = subtitle,
        patient_info = patient_info,
        body = body,
        footer = footer,
    )
}

fn patient_header(patient: &Patient) -> String {
    format!(
        "<strong>Paciente:</strong> {}<br>\n<strong>MRN:</strong> {}<br>\n<strong>Data de nascimento:</strong> {}<br>",
        escape_html(&patient.full_name),
        escape_html(&patient.mrn),
        patient.date_of_birth.format("%Y-%m-%d"),
    )
}

/// Receita de um único registro
pub fn render_prescription(patient: &Patient, record: &RecordView, generated_at: DateTime<Utc>) -> String {
    let info = format!(
        "{}\n<strong>Data:</strong> {} UTC",
        patient_header(patient),
        record.created_at.format("%Y-%m-%d %H:%M"),
    );
    let body = format!(
        "<div class=\"section\">
<h3>Diagnóstico</h3>
<p>{}</p>
</div>
<div class=\"section\">
<h3>Prescrição</h3>
<div class=\"prescription-box\"><pre>{}</pre></div>
</div>
<div class=\"section\">
<h3>Anotações clínicas</h3>
<p>{}</p>
</div>",
        escape_html(&record.diagnosis),
        escape_html(&record.prescriptions),
        escape_html(&record.clinical_notes),
    );
    let footer = format!(
        "<p>Documento emitido pelo prontuário eletrônico</p>\n<p>Gerado em {} UTC | Registro: {}</p>",
        generated_at.format("%Y-%m-%d %H:%M"),
        record.id,
    );
    document(
        &format!("Receita - {}", escape_html(&patient.full_name)),
        "Receita médica",
        &info,
        &body,
        &footer,
    )
}

/// Todos os registros do paciente, na ordem recebida
pub fn render_all_records(patient: &Patient, records: &[RecordView], generated_at: DateTime<Utc>) -> String {
    let info = format!(
        "{}\n<strong>Total de registros:</strong> {}",
        patient_header(patient),
        records.len()
    );
    let body = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            format!(
                "<div class=\"record\">
<h3>Registro #{} - {}</h3>
<p><strong>Diagnóstico:</strong> {}</p>
<div class=\"prescription-box\"><strong>Prescrição:</strong><br><pre>{}</pre></div>
<p><strong>Anotações clínicas:</strong> {}</p>
</div>",
                i + 1,
                record.created_at.format("%Y-%m-%d"),
                escape_html(&record.diagnosis),
                escape_html(&record.prescriptions),
                escape_html(&record.clinical_notes),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let footer = format!(
        "<p>Documento emitido pelo prontuário eletrônico</p>\n<p>Gerado em {} UTC</p>",
        generated_at.format("%Y-%m-%d %H:%M"),
    );
    document(
        &format!("Prontuário - {}", escape_html(&patient.full_name)),
        "Prontuário completo",
        &info,
        &body,
        &footer,
    )
}
