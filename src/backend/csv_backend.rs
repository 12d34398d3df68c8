//! The one concrete [`TabularBackend`]: a directory of CSV files, one per
//! logical table, with per-technician ledgers and an aggregated archive
//! written back out to a (possibly separate) output directory.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::backend::TabularBackend;
use crate::model::TechnicianLedger;
use crate::roster::{normalize_name, RosterRow};

const ROSTER_FILE: &str = "Main.csv";

fn table_file_name(table: &str) -> &'static str {
    match table {
        "pbp" => "PBP.csv",
        "spiff_bonus" => "Spiff_Bonus.csv",
        "yard_sign" => "Yard_Sign.csv",
        "lead_set" => "Lead_Set.csv",
        "time_sheet" => "Time_Sheet.csv",
        "service" => "Service.csv",
        "kpi" => "Kpi.csv",
        other => panic!("unknown logical table {other:?}"),
    }
}

pub struct CsvDirBackend {
    input_dir: PathBuf,
    output_dir: PathBuf,
    roster_rows: Vec<RosterRow>,
    roster_pay: HashMap<String, f64>,
}

impl CsvDirBackend {
    pub fn open(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let input_dir = input_dir.into();
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;

        let roster_rows = read_csv(&input_dir.join(ROSTER_FILE))
            .map(|rows| crate::loaders::load_roster(ROSTER_FILE, &rows))
            .unwrap_or_default();

        Ok(CsvDirBackend { input_dir, output_dir, roster_rows, roster_pay: HashMap::new() })
    }

    fn ledger_file(&self, technician_name: &str) -> PathBuf {
        let slug: String = technician_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        self.output_dir.join(format!("ledger_{slug}.csv"))
    }

    fn archive_file(&self) -> PathBuf {
        self.output_dir.join("archive.csv")
    }
}

fn read_csv(path: &Path) -> Option<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(path).ok()?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.ok()?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Some(rows)
}

impl TabularBackend for CsvDirBackend {
    fn list_roster(&self) -> Result<Vec<RosterRow>> {
        Ok(self.roster_rows.clone())
    }

    fn read_table(&self, table: &str) -> Result<Vec<Vec<String>>> {
        let path = self.input_dir.join(table_file_name(table));
        Ok(read_csv(&path).unwrap_or_default())
    }

    fn has_ledger(&self, technician_name: &str) -> bool {
        let key = normalize_name(technician_name);
        self.roster_rows.iter().any(|row| normalize_name(&row.name) == key)
    }

    fn write_ledger(&mut self, technician_name: &str, ledger: &TechnicianLedger) -> Result<()> {
        let path = self.ledger_file(technician_name);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("opening ledger file {}", path.display()))?;
        writer.write_record(["customer", "business_unit", "completion_date", "category", "amount", "notes"])?;
        for line in &ledger.lines {
            writer.write_record([
                line.customer.as_str(),
                line.business_unit.as_deref().unwrap_or(""),
                &line.completion_date.map(|d| d.to_string()).unwrap_or_default(),
                &line.category_tag.to_string(),
                &format!("{:.2}", line.amount),
                line.notes.as_deref().unwrap_or(""),
            ])?;
        }
        writer.flush()?;

        self.append_to_archive(technician_name, ledger)?;
        Ok(())
    }

    fn update_roster_pay(&mut self, technician_name: &str, total_pay: f64) -> Result<()> {
        self.roster_pay.insert(normalize_name(technician_name), total_pay);
        self.flush_roster_pay()
    }
}

impl CsvDirBackend {
    fn append_to_archive(&self, technician_name: &str, ledger: &TechnicianLedger) -> Result<()> {
        let path = self.archive_file();
        let mut existing: Vec<(String, String, String, String, String, String)> = Vec::new();
        if let Some(rows) = read_csv(&path) {
            for row in rows.into_iter().skip(1) {
                if row.len() >= 6 {
                    existing.push((row[0].clone(), row[1].clone(), row[2].clone(), row[3].clone(), row[4].clone(), row[5].clone()));
                }
            }
        }
        existing.retain(|row| normalize_name(&row.0) != normalize_name(technician_name));

        let summary = &ledger.summary;
        existing.push((
            technician_name.to_string(),
            format!("{:.2}", summary.total_hourly_pay),
            format!("{:.2}", summary.bonus),
            format!("{:.2}", summary.total_install_pay + summary.yard_sign_spiff),
            format!("{:.2}", summary.lead_set_commission),
            format!("{:.2}", summary.total_pay),
        ));

        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("opening archive file {}", path.display()))?;
        writer.write_record(["technician", "total_hourly_pay", "bonus", "install_pay", "lead_set_commission", "total_pay"])?;
        for row in existing {
            writer.write_record([row.0, row.1, row.2, row.3, row.4, row.5])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn flush_roster_pay(&self) -> Result<()> {
        let path = self.output_dir.join(ROSTER_FILE);
        let mut writer =
            csv::Writer::from_path(&path).with_context(|| format!("opening roster pay file {}", path.display()))?;
        writer.write_record(["name", "department", "position", "base_rate", "exempt", "commission_override", "pay"])?;
        for row in &self.roster_rows {
            let pay = self.roster_pay.get(&normalize_name(&row.name)).copied();
            writer.write_record([
                row.name.as_str(),
                row.department.as_str(),
                row.position.as_str(),
                row.base_rate_raw.as_str(),
                row.exempt_raw.as_str(),
                row.commission_override_raw.as_str(),
                &pay.map(|p| format!("{p:.2}")).unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryTag, ComputedLine};
    use std::fs;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn writes_a_ledger_and_mirrors_pay_to_the_roster_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_file(
            input.path(),
            ROSTER_FILE,
            "Name,Department,Position,Base Rate,Exempt,,,Commission\nJohn,Install,Class 4,25.00,No,,,\n",
        );

        let mut backend = CsvDirBackend::open(input.path(), output.path()).unwrap();
        assert!(backend.has_ledger("john"));
        assert!(!backend.has_ledger("Someone Else"));

        let mut ledger = TechnicianLedger::default();
        ledger.lines.push(ComputedLine {
            customer: "Acme".into(),
            business_unit: Some("Residential".into()),
            completion_date: None,
            amount: 260.0,
            notes: Some("Install".into()),
            category_tag: CategoryTag::Pbp,
        });
        ledger.summary.total_install_pay = 260.0;
        ledger.summary.total_pay = 260.0;

        backend.write_ledger("John", &ledger).unwrap();
        backend.update_roster_pay("John", 260.0).unwrap();

        let ledger_contents = fs::read_to_string(output.path().join("ledger_john.csv")).unwrap();
        assert!(ledger_contents.contains("Acme"));
        assert!(ledger_contents.contains("260.00"));

        let archive_contents = fs::read_to_string(output.path().join("archive.csv")).unwrap();
        assert!(archive_contents.contains("John"));
        assert!(archive_contents.contains("260.00"));

        let roster_contents = fs::read_to_string(output.path().join(ROSTER_FILE)).unwrap();
        assert!(roster_contents.contains("260.00"));
    }

    #[test]
    fn rewriting_a_ledger_replaces_its_archive_row_rather_than_duplicating_it() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        write_file(input.path(), ROSTER_FILE, "Name,Department,Position,Base Rate,Exempt\nJane,Install,Class 2,20.00,No\n");

        let mut backend = CsvDirBackend::open(input.path(), output.path()).unwrap();
        let mut first = TechnicianLedger::default();
        first.summary.total_pay = 100.0;
        backend.write_ledger("Jane", &first).unwrap();

        let mut second = TechnicianLedger::default();
        second.summary.total_pay = 200.0;
        backend.write_ledger("Jane", &second).unwrap();

        let archive_contents = fs::read_to_string(output.path().join("archive.csv")).unwrap();
        assert_eq!(archive_contents.matches("Jane").count(), 1);
        assert!(archive_contents.contains("200.00"));
        assert!(!archive_contents.contains("100.00"));
    }
}
