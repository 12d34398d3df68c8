use std::io::Write;

use chrono::Utc;
use clap::CommandFactory as _;

use crate::apis::google_sheets::{
    self,
    spreadsheet::{CellData, ExtendedValue, GridData, RowData, Sheet, SheetProperties, Spreadsheet, SpreadsheetProperties},
};
use crate::backend::csv_backend::CsvDirBackend;
use crate::backend::{self, TabularBackend};
use crate::date_range::PayPeriod;
use crate::loaders;
use crate::orchestrator::{CategoryOutcome, Orchestrator, RunReport, TechnicianRunReport};
use crate::roster::Roster;
use crate::CliArgs;

#[derive(Debug, clap::ValueEnum, Clone, Copy, Eq, PartialEq)]
enum OutputFormat {
    /// Prints a human-readable run report.
    Human,
    /// Prints a CSV summary, one row per technician.
    Csv,
    /// Publishes a run report to a Google Sheet (requires OAuth authorization).
    GoogleSheets,
}

#[derive(clap::Args, Debug)]
pub struct RunAllArgs {
    /// Directory holding the input CSV tables (Main, PBP, Spiff_Bonus, ...).
    #[arg(long, env)]
    input_dir: String,

    /// Directory the per-technician ledgers, archive, and updated roster are
    /// written to. Defaults to `input_dir`.
    #[arg(long, env)]
    output_dir: Option<String>,

    /// The pay period to run, either `MM/DD/YY - MM/DD/YY` or a single date
    /// naming the end of a trailing 7-day window.
    #[arg(long, env)]
    pay_period: String,

    /// The format in which to print the run report.
    #[arg(long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// The file to write the report to. "-" or unspecified writes to stdout.
    /// Ignored with `--format google-sheets`.
    #[arg(short, long, default_value = None)]
    output: Option<String>,

    /// Only valid with `--format google-sheets`. Update an existing sheet
    /// rather than creating a new one.
    #[arg(long)]
    update: bool,

    /// Path to the cached OAuth token, used only with `--format google-sheets`.
    #[arg(long, env, default_value = "google_oauth_token.json")]
    oauth_cache_file: String,
}

#[derive(clap::Args, Debug)]
pub struct RunTechArgs {
    /// The technician's name, matched case-insensitively against the roster.
    technician: String,

    #[arg(long, env)]
    input_dir: String,

    #[arg(long, env)]
    output_dir: Option<String>,

    #[arg(long, env)]
    pay_period: String,
}

#[derive(clap::Args, Debug)]
pub struct PrintSummaryArgs {
    #[arg(long, env)]
    input_dir: String,

    #[arg(long, env)]
    output_dir: Option<String>,

    #[arg(long, env)]
    pay_period: String,

    #[arg(long, value_enum, default_value = "human")]
    format: OutputFormat,

    #[arg(short, long, default_value = None)]
    output: Option<String>,
}

/// Opens the backend and builds the roster/entry data the orchestrator needs
/// to run any category over any technician.
struct LoadedRun {
    backend: CsvDirBackend,
    roster: Roster,
    pay_period: PayPeriod,
}

fn load_run(input_dir: &str, output_dir: &Option<String>, pay_period: &str) -> anyhow::Result<LoadedRun> {
    let output_dir = output_dir.clone().unwrap_or_else(|| input_dir.to_string());
    let backend = CsvDirBackend::open(input_dir, output_dir)?;
    let roster_rows = backend.list_roster()?;
    let roster = Roster::new(roster_rows.iter().map(|row| row.resolve()).collect());
    let pay_period = PayPeriod::parse(pay_period)?;
    Ok(LoadedRun { backend, roster, pay_period })
}

/// The per-category input rows, loaded once up front so the orchestrator can
/// borrow them independently of the backend (which the caller still needs
/// mutably, to write ledgers back).
#[derive(Default)]
struct EntryBundle {
    pbp: Vec<crate::model::PbpEntry>,
    spiff: Vec<crate::model::SpiffBonusEntry>,
    yard_sign: Vec<crate::model::YardSignEntry>,
    lead_set: Vec<crate::model::LeadEntry>,
    timesheet: Vec<crate::model::TimesheetEntry>,
    service: Vec<crate::model::ServiceEntry>,
    kpi: Vec<crate::model::KpiEntry>,
}

/// A required column (PBP's amount/assigned-technicians, Spiff's
/// bonus-amount/assigned-technicians) is entirely unmapped in that table's
/// header. This is surfaced, not fatal: the category runs empty for every
/// technician rather than aborting the load.
fn schema_error_to_empty<T>(table: &str, result: Result<Vec<T>, crate::errors::EngineError>) -> Vec<T> {
    match result {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(table, error = %e, "category will run empty for this table");
            Vec::new()
        }
    }
}

fn load_entries(backend: &CsvDirBackend) -> anyhow::Result<EntryBundle> {
    Ok(EntryBundle {
        pbp: schema_error_to_empty(
            backend::TABLE_PBP,
            loaders::load_pbp_entries(backend::TABLE_PBP, &backend.read_table(backend::TABLE_PBP)?),
        ),
        spiff: schema_error_to_empty(
            backend::TABLE_SPIFF_BONUS,
            loaders::load_spiff_entries(backend::TABLE_SPIFF_BONUS, &backend.read_table(backend::TABLE_SPIFF_BONUS)?),
        ),
        yard_sign: loaders::load_yard_sign_entries(backend::TABLE_YARD_SIGN, &backend.read_table(backend::TABLE_YARD_SIGN)?),
        lead_set: loaders::load_lead_entries(backend::TABLE_LEAD_SET, &backend.read_table(backend::TABLE_LEAD_SET)?),
        timesheet: loaders::load_timesheet_entries(backend::TABLE_TIME_SHEET, &backend.read_table(backend::TABLE_TIME_SHEET)?),
        service: loaders::load_service_entries(backend::TABLE_SERVICE, &backend.read_table(backend::TABLE_SERVICE)?),
        kpi: loaders::load_kpi_entries(backend::TABLE_KPI, &backend.read_table(backend::TABLE_KPI)?),
    })
}

fn build_orchestrator<'a>(roster: &'a Roster, entries: &'a EntryBundle, pay_period: PayPeriod) -> Orchestrator<'a> {
    Orchestrator::new(
        roster,
        &entries.pbp,
        &entries.spiff,
        &entries.yard_sign,
        &entries.lead_set,
        &entries.timesheet,
        &entries.service,
        &entries.kpi,
        pay_period,
    )
}

pub fn run_all(args: RunAllArgs) -> anyhow::Result<i32> {
    let RunAllArgs { input_dir, output_dir, pay_period, format, output, update, oauth_cache_file } = args;

    if format == OutputFormat::GoogleSheets && output.is_some() {
        CliArgs::command()
            .error(
                clap::error::ErrorKind::ArgumentConflict,
                "The `--output` option cannot be used with `--format google-sheets`",
            )
            .exit();
    }
    if format != OutputFormat::GoogleSheets && update {
        CliArgs::command()
            .error(
                clap::error::ErrorKind::ArgumentConflict,
                "The `--update` option can only be used with `--format google-sheets`",
            )
            .exit();
    }

    let LoadedRun { mut backend, roster, pay_period } = load_run(&input_dir, &output_dir, &pay_period)?;
    if roster.is_empty() {
        tracing::error!("roster is empty or could not be read; nothing to run");
        return Ok(2);
    }

    let entries = load_entries(&backend)?;
    let orchestrator = build_orchestrator(&roster, &entries, pay_period);
    let report = orchestrator.run_all(&mut backend);

    match format {
        OutputFormat::Human => print_human_report(&report, output_writer(&output)?)?,
        OutputFormat::Csv => print_csv_report(&report, output_writer(&output)?)?,
        OutputFormat::GoogleSheets => publish_report_to_google_sheets(&report, update, &oauth_cache_file)?,
    }

    Ok(if report.any_errors() { 3 } else { 0 })
}

pub fn run_tech(args: RunTechArgs) -> anyhow::Result<i32> {
    let RunTechArgs { technician, input_dir, output_dir, pay_period } = args;

    let LoadedRun { mut backend, roster, pay_period } = load_run(&input_dir, &output_dir, &pay_period)?;
    let entries = load_entries(&backend)?;
    let orchestrator = build_orchestrator(&roster, &entries, pay_period);

    let report = orchestrator.run_for_named_technician(&mut backend, &technician)?;
    print_technician(&report, &mut std::io::stdout())?;

    Ok(if report.worst == CategoryOutcome::Error { 3 } else { 0 })
}

pub fn print_summary(args: PrintSummaryArgs) -> anyhow::Result<i32> {
    let PrintSummaryArgs { input_dir, output_dir, pay_period, format, output } = args;

    let LoadedRun { backend, roster, pay_period } = load_run(&input_dir, &output_dir, &pay_period)?;
    if roster.is_empty() {
        tracing::error!("roster is empty or could not be read; nothing to summarize");
        return Ok(2);
    }

    let entries = load_entries(&backend)?;
    let orchestrator = build_orchestrator(&roster, &entries, pay_period);

    // `print-summary` computes but does not write anything back; it exists
    // to preview a run before committing it with `run-all`.
    let mut report = RunReport::default();
    for tech in roster.iter() {
        let (_, tech_report) = orchestrator.run_for_technician(tech);
        report.technicians.push(tech_report);
    }

    match format {
        OutputFormat::Human => print_human_report(&report, output_writer(&output)?)?,
        OutputFormat::Csv => print_csv_report(&report, output_writer(&output)?)?,
        OutputFormat::GoogleSheets => {
            CliArgs::command()
                .error(
                    clap::error::ErrorKind::ArgumentConflict,
                    "`print-summary` does not support `--format google-sheets`; use `run-all`",
                )
                .exit();
        }
    }

    Ok(if report.any_errors() { 3 } else { 0 })
}

fn output_writer(output: &Option<String>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output.as_deref() {
        Some("-") | None => Box::new(std::io::stdout()),
        Some(path) => Box::new(std::fs::File::create(path)?),
    })
}

fn print_technician(report: &TechnicianRunReport, mut out: impl Write) -> std::io::Result<()> {
    writeln!(out, "{}: total pay ${:.2} ({:?})", report.name, report.total_pay, report.worst)?;
    for (category, outcome) in &report.category_outcomes {
        writeln!(out, "    - {category}: {outcome:?}")?;
    }
    Ok(())
}

fn print_human_report(report: &RunReport, mut out: impl Write) -> std::io::Result<()> {
    for tech in &report.technicians {
        print_technician(tech, &mut out)?;
    }
    if !report.skipped_technicians.is_empty() {
        writeln!(out, "Skipped (no ledger destination): {}", report.skipped_technicians.join(", "))?;
    }
    Ok(())
}

fn print_csv_report(report: &RunReport, writer: impl Write) -> std::io::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["technician", "total_pay", "worst_outcome"])?;
    for tech in &report.technicians {
        writer.write_record([tech.name.as_str(), &format!("{:.2}", tech.total_pay), &format!("{:?}", tech.worst)])?;
    }
    writer.flush()?;
    Ok(())
}

fn publish_report_to_google_sheets(report: &RunReport, update: bool, oauth_cache_file: &str) -> anyhow::Result<()> {
    fn mk_row(cells: impl IntoIterator<Item = ExtendedValue>) -> RowData {
        RowData { values: cells.into_iter().map(|cell| CellData { user_entered_value: Some(cell) }).collect() }
    }

    let mut rows = vec![mk_row([
        ExtendedValue::StringValue("Technician".to_string()),
        ExtendedValue::StringValue("Total Pay".to_string()),
        ExtendedValue::StringValue("Worst Outcome".to_string()),
    ])];
    for tech in &report.technicians {
        rows.push(mk_row([
            ExtendedValue::StringValue(tech.name.clone()),
            ExtendedValue::NumberValue(tech.total_pay),
            ExtendedValue::StringValue(format!("{:?}", tech.worst)),
        ]));
    }

    let spreadsheet = Spreadsheet {
        properties: SpreadsheetProperties { title: Some(format!("Payroll Report ({})", Utc::now())) },
        sheets: Some(vec![Sheet {
            properties: SheetProperties { title: Some("Payroll".to_string()), ..Default::default() },
            data: Some(GridData { start_row: 1, start_column: 1, row_data: rows }),
        }]),
        ..Default::default()
    };

    let cache_file = std::path::Path::new(oauth_cache_file);
    let url = google_sheets::run_with_credentials(cache_file, |token| {
        let spreadsheet = spreadsheet.clone();
        if update {
            google_sheets::create_or_write_spreadsheet(token, google_sheets::SheetNickname::LedgerReport, spreadsheet)
        } else {
            google_sheets::create_spreadsheet(token, google_sheets::SheetNickname::LedgerReport, spreadsheet)
        }
    })?;
    crate::utils::open_url(url.as_str());
    Ok(())
}
