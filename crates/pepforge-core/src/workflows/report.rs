use super::label::ResidueReport;
use itertools::Itertools;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush report: {0}")]
    Flush(#[source] std::io::Error),
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    source: &'a str,
    subst_id: usize,
    subst_name: &'a str,
    context: String,
    status: &'static str,
    reason: String,
    backbone: String,
    nitrogen_hydrogens: String,
    hydroxyl_oxygens: String,
    resolved_oxygens: String,
    repaired: bool,
}

fn join_ids(ids: &[usize]) -> String {
    ids.iter().join(" ")
}

/// Writes residue reports as CSV rows, one header for the whole stream.
///
/// Id lists are space separated inside their column.
pub struct ReportWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: csv::Writer::from_writer(writer),
        }
    }

    /// Appends the reports of one labeled structure, tagged with `source`.
    pub fn write_reports(&mut self, source: &str, reports: &[ResidueReport]) -> Result<(), ReportError> {
        for report in reports {
            self.inner.serialize(ReportRow {
                source,
                subst_id: report.subst_id,
                subst_name: &report.subst_name,
                context: report.context.to_string(),
                status: report.status.label(),
                reason: report.status.reason().unwrap_or_default(),
                backbone: join_ids(&report.backbone),
                nitrogen_hydrogens: join_ids(&report.nitrogen_hydrogens),
                hydroxyl_oxygens: join_ids(&report.hydroxyl_oxygens),
                resolved_oxygens: join_ids(&report.resolved_oxygens),
                repaired: report.repaired,
            })?;
        }
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(self) -> Result<W, ReportError> {
        self.inner
            .into_inner()
            .map_err(|e| ReportError::Flush(e.into_error()))
    }
}

pub fn write_csv<W: Write>(writer: W, source: &str, reports: &[ResidueReport]) -> Result<W, ReportError> {
    let mut report_writer = ReportWriter::new(writer);
    report_writer.write_reports(source, reports)?;
    report_writer.finish()
}

pub fn write_csv_to_path(
    path: &Path,
    entries: &[(String, Vec<ResidueReport>)],
) -> Result<(), ReportError> {
    let path_str = path.to_string_lossy().to_string();
    let file = File::create(path).map_err(|e| ReportError::Io {
        path: path_str.clone(),
        source: e,
    })?;
    let mut report_writer = ReportWriter::new(file);
    for (source, reports) in entries {
        report_writer.write_reports(source, reports)?;
    }
    report_writer.finish().map(|_| ()).map_err(|e| match e {
        ReportError::Flush(source) => ReportError::Io {
            path: path_str,
            source,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::locator::LocateFailure;
    use crate::engine::templates::Context;
    use crate::workflows::label::ResidueStatus;
    use tempfile::tempdir;

    fn create_reports() -> Vec<ResidueReport> {
        vec![
            ResidueReport {
                subst_id: 1,
                subst_name: "GLY1".to_string(),
                context: Context::NTerminus,
                status: ResidueStatus::Found,
                backbone: vec![1, 2, 3, 4],
                nitrogen_hydrogens: vec![5, 6, 7],
                hydroxyl_oxygens: vec![],
                resolved_oxygens: vec![],
                repaired: true,
            },
            ResidueReport {
                subst_id: 2,
                subst_name: "ALA2".to_string(),
                context: Context::CTerminus,
                status: ResidueStatus::NotFound {
                    reason: LocateFailure::CarbonylMismatch,
                },
                backbone: vec![],
                nitrogen_hydrogens: vec![],
                hydroxyl_oxygens: vec![],
                resolved_oxygens: vec![],
                repaired: false,
            },
        ]
    }

    #[test]
    fn csv_has_header_and_one_row_per_residue() {
        let bytes = write_csv(Vec::new(), "gly.mol2", &create_reports()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "source,subst_id,subst_name,context,status,reason,backbone,nitrogen_hydrogens,hydroxyl_oxygens,resolved_oxygens,repaired"
        );
        assert_eq!(lines[1], "gly.mol2,1,GLY1,n-terminus,found,,1 2 3 4,5 6 7,,,true");
        assert_eq!(
            lines[2],
            "gly.mol2,2,ALA2,c-terminus,not-found,no carbonyl carbon matched its templates,,,,,false"
        );
    }

    #[test]
    fn empty_report_list_writes_nothing() {
        let bytes = write_csv(Vec::new(), "empty.mol2", &[]).unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn path_writer_concatenates_sources_under_one_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let entries = vec![
            ("a.mol2".to_string(), create_reports()),
            ("b.mol2".to_string(), create_reports()),
        ];
        write_csv_to_path(&path, &entries).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("source"));
        let sources: Vec<String> = reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect();
        assert_eq!(sources, vec!["a.mol2", "a.mol2", "b.mol2", "b.mol2"]);
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("report.csv");
        let result = write_csv_to_path(&path, &[]);
        assert!(matches!(result, Err(ReportError::Io { .. })));
    }
}
