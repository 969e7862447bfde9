//! Batch report: the uploaded table with the prediction columns appended,
//! plus the accuracy check and label distribution computed over it.

use crate::classifier::{Eligibility, PredictionResult};
use crate::config::{LabelConfig, ReportConfig};
use crate::errors::{EligibilityError, Result};
use crate::record::{ApplicantRecord, FieldValue};
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Tabular batch: a header row and string cells
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordTable {
    /// Rows must match the header width and header names must be unique,
    /// since records are keyed by column name.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(headers.len());
        if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(EligibilityError::Table(format!("column `{dup}` appears more than once")));
        }
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(EligibilityError::Table(format!(
                "row {idx} has {} cell(s), header has {}",
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// One record per row, every column carried as text
    pub fn to_records(&self) -> Vec<ApplicantRecord> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(h, cell)| (h.clone(), FieldValue::Text(cell.clone())))
                    .collect()
            })
            .collect()
    }

    /// Remove a column; true when it was present
    fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }
}

/// Format a percentage the way the report shows it
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}")
}

/// Text written for a label
pub fn label_text(labels: &LabelConfig, label: Eligibility) -> &str {
    match label {
        Eligibility::Eligible => &labels.eligible,
        Eligibility::Ineligible => &labels.ineligible,
    }
}

/// Append predicted label, eligible %, ineligible % (in that order) after
/// every original column. Stale columns with the same names are replaced.
pub fn annotate(
    mut table: RecordTable,
    results: &[PredictionResult],
    labels: &LabelConfig,
    columns: &ReportConfig,
) -> Result<RecordTable> {
    if results.len() != table.len() {
        return Err(EligibilityError::Table(format!(
            "{} result(s) for {} row(s)",
            results.len(),
            table.len()
        )));
    }

    let appended = [
        &columns.prediction_column,
        &columns.eligible_probability_column,
        &columns.ineligible_probability_column,
    ];
    for name in appended {
        if table.drop_column(name) {
            warn!(column = %name, "Input column replaced by prediction output");
        }
    }
    table.headers.extend(appended.iter().map(|s| s.to_string()));

    for (row, result) in table.rows.iter_mut().zip(results) {
        row.push(label_text(labels, result.label).to_string());
        row.push(format_percent(result.eligible_percent()));
        row.push(format_percent(result.ineligible_percent()));
    }
    Ok(table)
}

/// Ground truth vs prediction agreement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub matches: usize,
    pub total: usize,
    /// `matches / total * 100`, two decimals
    pub percent: f64,
}

impl std::fmt::Display for AccuracyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}% ({} of {})",
            format_percent(self.percent),
            self.matches,
            self.total
        )
    }
}

/// Compare the ground-truth column with the predicted column (trimmed,
/// case-insensitive). `None` when either column is absent or the table is
/// empty.
pub fn accuracy(table: &RecordTable, truth_column: &str, predicted_column: &str) -> Option<AccuracyReport> {
    if table.is_empty() {
        return None;
    }
    let truth = table.column(truth_column)?;
    let predicted = table.column(predicted_column)?;
    let matches = truth
        .zip(predicted)
        .filter(|(t, p)| t.trim().to_lowercase() == p.trim().to_lowercase())
        .count();
    let total = table.len();
    let percent = ((matches as f64 / total as f64) * 100.0 * 100.0).round() / 100.0;
    Some(AccuracyReport {
        matches,
        total,
        percent,
    })
}

/// Count of predictions per label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LabelDistribution {
    pub eligible: usize,
    pub ineligible: usize,
}

impl LabelDistribution {
    pub fn total(&self) -> usize {
        self.eligible + self.ineligible
    }
}

pub fn label_distribution(results: &[PredictionResult]) -> LabelDistribution {
    results
        .iter()
        .fold(LabelDistribution::default(), |mut acc, r| {
            match r.label {
                Eligibility::Eligible => acc.eligible += 1,
                Eligibility::Ineligible => acc.ineligible += 1,
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn result(label: Eligibility, p_eligible: f64) -> PredictionResult {
        PredictionResult {
            label,
            probability_eligible: p_eligible,
            probability_ineligible: 1.0 - p_eligible,
        }
    }

    #[test]
    fn annotate_appends_three_columns_in_order() {
        let table = RecordTable::new(
            strings(&["Nama", "Umur"]),
            vec![strings(&["Siti", "41"]), strings(&["Budi", "29"])],
        )
        .unwrap();
        let results = [
            result(Eligibility::Eligible, 0.8765),
            result(Eligibility::Ineligible, 0.1),
        ];
        let out = annotate(table, &results, &LabelConfig::default(), &ReportConfig::default()).unwrap();

        assert_eq!(
            out.headers(),
            strings(&["Nama", "Umur", "Hasil Prediksi", "Prob_LAYAK (%)", "Prob_TIDAK_LAYAK (%)"]).as_slice()
        );
        assert_eq!(out.rows()[0], strings(&["Siti", "41", "LAYAK", "87.65", "12.35"]));
        assert_eq!(out.rows()[1], strings(&["Budi", "29", "TIDAK LAYAK", "10.00", "90.00"]));
    }

    #[test]
    fn annotate_replaces_stale_prediction_columns() {
        let table = RecordTable::new(
            strings(&["Hasil Prediksi", "Nama"]),
            vec![strings(&["old", "Siti"])],
        )
        .unwrap();
        let out = annotate(
            table,
            &[result(Eligibility::Eligible, 0.9)],
            &LabelConfig::default(),
            &ReportConfig::default(),
        )
        .unwrap();
        assert_eq!(out.headers()[0], "Nama");
        assert_eq!(out.headers().len(), 4);
        assert_eq!(out.rows()[0][1], "LAYAK");
    }

    #[test]
    fn annotate_rejects_misaligned_results() {
        let table = RecordTable::new(strings(&["Nama"]), vec![strings(&["Siti"])]).unwrap();
        assert!(annotate(table, &[], &LabelConfig::default(), &ReportConfig::default()).is_err());
    }

    #[test]
    fn accuracy_is_trimmed_and_case_insensitive() {
        let table = RecordTable::new(
            strings(&["Status Kelayakan", "Hasil Prediksi"]),
            vec![
                strings(&[" layak ", "LAYAK"]),
                strings(&["Tidak Layak", "TIDAK LAYAK"]),
                strings(&["LAYAK", "TIDAK LAYAK"]),
            ],
        )
        .unwrap();
        let report = accuracy(&table, "Status Kelayakan", "Hasil Prediksi").unwrap();
        assert_eq!(report.matches, 2);
        assert_eq!(report.total, 3);
        assert_eq!(report.percent, 66.67);
        assert_eq!(report.to_string(), "66.67% (2 of 3)");
    }

    #[test]
    fn accuracy_absent_without_ground_truth() {
        let table = RecordTable::new(strings(&["Hasil Prediksi"]), vec![strings(&["LAYAK"])]).unwrap();
        assert!(accuracy(&table, "Status Kelayakan", "Hasil Prediksi").is_none());
    }

    #[test]
    fn distribution_counts_labels() {
        let results = [
            result(Eligibility::Eligible, 0.7),
            result(Eligibility::Ineligible, 0.2),
            result(Eligibility::Eligible, 0.6),
        ];
        let dist = label_distribution(&results);
        assert_eq!(dist.eligible, 2);
        assert_eq!(dist.ineligible, 1);
        assert_eq!(dist.total(), 3);
    }

    #[test]
    fn to_records_keeps_every_column_as_text() {
        let table = RecordTable::new(strings(&["Umur", "Catatan"]), vec![strings(&["41", "x"])]).unwrap();
        let records = table.to_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Umur"), Some(&FieldValue::Text("41".into())));
        assert_eq!(records[0].get("Catatan"), Some(&FieldValue::Text("x".into())));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let err = RecordTable::new(strings(&["Umur", "Nama", "Umur"]), vec![strings(&["10", "Siti", "99"])])
            .unwrap_err();
        match err {
            EligibilityError::Table(reason) => assert!(reason.contains("Umur")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ragged_tables_are_rejected() {
        assert!(RecordTable::new(strings(&["A", "B"]), vec![strings(&["1"])]).is_err());
    }
}
