//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_snapshot_adapter::JsonSnapshotAdapter;
use crate::domain::adjustment::MonthAdjustment;
use crate::domain::aggregation::{self, BalancePoint, BillStatus, MonthlySummary, YearSummary};
use crate::domain::entry::{Category, Entry, EntryId, NewEntry};
use crate::domain::error::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::session::Session;
use crate::domain::settings::{DEFAULT_LOG_LEVEL, Settings, StorageBackend};
use crate::logging;
use crate::ports::export_port::ExportPort;
use crate::ports::snapshot_port::SnapshotPort;

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "ledgerbook.ini";

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Parser, Debug)]
#[command(name = "ledgerbook", about = "Personal income, expense, bill and savings ledger")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Snapshot file, overrides [storage] path
    #[arg(short, long, global = true)]
    pub data: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a new entry
    Add {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        category: Category,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        paid: bool,
    },
    /// Replace an existing entry
    Edit {
        #[arg(long)]
        id: u64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        category: Category,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        paid: bool,
    },
    /// Delete an entry
    Remove {
        #[arg(long)]
        id: u64,
    },
    /// List entries by date
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Totals for one month
    Summary {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// Month-by-month comparison for one year
    Year {
        #[arg(long)]
        year: i32,
    },
    /// Category totals for one month
    Breakdown {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// Paid/unpaid bills for one month
    Bills {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// Running balance over a date range
    Balance {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },
    /// Write entries to a CSV file
    Export {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Add entries from a CSV file
    Import {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Set a month's rollover and debt payment
    Adjust {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
        /// Carried in from the previous month, may be negative
        #[arg(long, allow_negative_numbers = true)]
        rollover: Option<Decimal>,
        /// Debt paid off this month
        #[arg(long)]
        debt: Option<Decimal>,
    },
    /// Delete every entry and adjustment of one month
    Reset {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// Years that have entries
    Years,
}

pub fn run(cli: Cli) -> ExitCode {
    let settings = match load_settings(cli.config.as_deref(), cli.data.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            logging::init(DEFAULT_LOG_LEVEL);
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    logging::init(&settings.log_level);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match execute(&cli.command, &settings, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_settings(
    config_path: Option<&Path>,
    data_override: Option<&Path>,
) -> Result<Settings, LedgerError> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let config_path = config_path.or_else(|| default_path.exists().then_some(default_path));

    let adapter = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path).map_err(|e| LedgerError::ConfigParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?
        }
        None => FileConfigAdapter::empty(),
    };

    let mut settings = Settings::from_config(&adapter)?;
    if let Some(path) = data_override {
        settings.data_path = path.to_path_buf();
    }
    Ok(settings)
}

pub fn open_store(settings: &Settings) -> Result<Box<dyn SnapshotPort>, LedgerError> {
    match settings.backend {
        StorageBackend::Json => Ok(Box::new(JsonSnapshotAdapter::new(settings.data_path.clone()))),
        StorageBackend::Sqlite => {
            #[cfg(feature = "sqlite")]
            {
                use crate::adapters::sqlite_adapter::SqliteAdapter;
                Ok(Box::new(SqliteAdapter::open(&settings.data_path, settings.pool_size)?))
            }

            #[cfg(not(feature = "sqlite"))]
            {
                Err(LedgerError::ConfigInvalid {
                    section: "storage".into(),
                    key: "backend".into(),
                    reason: "sqlite feature is required for the sqlite backend".into(),
                })
            }
        }
    }
}

/// Runs one command against the configured store, writing results to `out`.
pub fn execute(command: &Command, settings: &Settings, out: &mut dyn Write) -> Result<(), LedgerError> {
    let store = open_store(settings)?;
    let (mut session, warning) = Session::open(&*store)?;
    if let Some(w) = warning {
        eprintln!("warning: {w}; starting with an empty ledger");
    }

    match command {
        Command::Add {
            date,
            category,
            amount,
            label,
            paid,
        } => {
            let entry = new_entry(*date, *category, *amount, label.as_deref(), *paid);
            let id = session.add(entry)?;
            tracing::info!(%id, "entry added");
            writeln!(out, "added entry {id}")?;
        }
        Command::Edit {
            id,
            date,
            category,
            amount,
            label,
            paid,
        } => {
            let entry = new_entry(*date, *category, *amount, label.as_deref(), *paid);
            session.replace(EntryId(*id), entry)?;
            tracing::info!(id, "entry replaced");
            writeln!(out, "updated entry {id}")?;
        }
        Command::Remove { id } => {
            let removed = session.remove(EntryId(*id))?;
            tracing::info!(id, "entry removed");
            writeln!(out, "removed entry {} ({} {})", removed.id, removed.date, removed.category)?;
        }
        Command::List { from, to } => {
            let entries = entries_in_range(session.ledger(), *from, *to);
            render_entries(&entries, out)?;
        }
        Command::Summary { year, month } => {
            let summary = aggregation::monthly_summary(session.ledger(), *year, *month);
            render_summary(&summary, out)?;
        }
        Command::Year { year } => {
            let months = aggregation::yearly_comparison(session.ledger(), *year);
            let totals = aggregation::year_summary(session.ledger(), *year);
            render_year(&months, &totals, out)?;
        }
        Command::Breakdown { year, month } => {
            let breakdown = aggregation::category_breakdown(session.ledger(), *year, *month);
            let gross: Decimal = breakdown.values().copied().sum();
            writeln!(out, "{} {}", month_name(*month), year)?;
            for (category, amount) in &breakdown {
                writeln!(out, "{:<10}{:>14.2}{:>8}", category, amount, percent(*amount, gross))?;
            }
        }
        Command::Bills { year, month } => {
            let status = aggregation::bill_status(session.ledger(), *year, *month);
            render_bills(&status, out)?;
        }
        Command::Balance { from, to } => {
            let points: Vec<BalancePoint> =
                aggregation::running_balance(session.ledger(), *from, *to).collect();
            render_balance(&points, out)?;
        }
        Command::Export { output, from, to } => {
            let entries = entries_in_range(session.ledger(), *from, *to);
            let rows = CsvAdapter::new().write_file(&entries, output)?;
            tracing::info!(rows, path = %output.display(), "export written");
            writeln!(out, "exported {} entries to {}", rows, output.display())?;
        }
        Command::Import { input } => {
            let file = File::open(input).map_err(|e| LedgerError::Storage {
                reason: format!("failed to open {}: {}", input.display(), e),
            })?;
            let drafts = CsvAdapter::new().read_entries(BufReader::new(file))?;
            let ids = session.import(drafts)?;
            tracing::info!(count = ids.len(), path = %input.display(), "import finished");
            writeln!(out, "imported {} entries", ids.len())?;
        }
        Command::Adjust {
            year,
            month,
            rollover,
            debt,
        } => {
            let current = session.ledger().adjustment(*year, *month).copied();
            let adjustment = MonthAdjustment::new(
                *year,
                *month,
                rollover.or(current.map(|a| a.rollover)).unwrap_or_default(),
                debt.or(current.map(|a| a.debt)).unwrap_or_default(),
            )?;
            session.set_adjustment(adjustment)?;
            tracing::info!(year, month, "adjustment set");
            if adjustment.is_zero() {
                writeln!(out, "cleared adjustments for {} {}", month_name(*month), year)?;
            } else {
                writeln!(
                    out,
                    "{} {}: rollover {:.2}, debt {:.2}",
                    month_name(*month),
                    year,
                    adjustment.rollover,
                    adjustment.debt
                )?;
            }
        }
        Command::Reset { year, month } => {
            let removed = session.reset_month(*year, *month)?;
            tracing::info!(year, month, removed = removed.len(), "month reset");
            writeln!(
                out,
                "reset {} {}: removed {} entries",
                month_name(*month),
                year,
                removed.len()
            )?;
        }
        Command::Years => {
            for year in session.ledger().years() {
                writeln!(out, "{year}")?;
            }
        }
    }

    session.close()?;
    Ok(())
}

/// Short month name, or `???` outside 1-12.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("???")
}

fn new_entry(
    date: NaiveDate,
    category: Category,
    amount: Decimal,
    label: Option<&str>,
    paid: bool,
) -> NewEntry {
    let entry = NewEntry::new(date, category, amount).with_paid(paid);
    match label {
        Some(l) => entry.with_label(l),
        None => entry,
    }
}

/// Entries within the optional inclusive bounds, ordered by date then id.
pub fn entries_in_range(
    ledger: &Ledger,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<&Entry> {
    ledger
        .sorted()
        .into_iter()
        .filter(|e| from.is_none_or(|f| e.date >= f) && to.is_none_or(|t| e.date <= t))
        .collect()
}

/// Share of `part` in `whole` as a one-decimal percentage string.
pub fn percent(part: Decimal, whole: Decimal) -> String {
    if whole.is_zero() {
        return "-".to_string();
    }
    let share = (part / whole * Decimal::ONE_HUNDRED).round_dp(1);
    format!("{:.1}%", share)
}

pub fn render_entries(entries: &[&Entry], out: &mut dyn Write) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "no entries");
    }
    writeln!(out, "{:>5}  {:<10}  {:<8}  {:>12}  label", "id", "date", "category", "amount")?;
    for e in entries {
        let paid = if e.category == Category::Bill && e.paid {
            " (paid)"
        } else {
            ""
        };
        writeln!(
            out,
            "{:>5}  {:<10}  {:<8}  {:>12.2}  {}{}",
            e.id, e.date, e.category, e.amount, e.label, paid
        )?;
    }
    Ok(())
}

pub fn render_summary(summary: &MonthlySummary, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "{} {}", month_name(summary.month), summary.year)?;
    writeln!(out, "+ Income   {:>14.2}", summary.income)?;
    writeln!(out, "+ Savings  {:>14.2}", summary.savings)?;
    writeln!(out, "- Expenses {:>14.2}", summary.expenses)?;
    writeln!(out, "- Bills    {:>14.2}", summary.bills)?;
    writeln!(out, "= Net      {:>14.2}", summary.net)?;
    writeln!(out, "+ Rollover {:>14.2}", summary.rollover)?;
    writeln!(out, "- Debt     {:>14.2}", summary.debt)?;
    writeln!(out, "= Left     {:>14.2}", summary.left)?;
    if summary.left.is_sign_negative() && !summary.left.is_zero() {
        writeln!(out, "spent {:.2} more than came in", summary.left.abs())?;
    }
    Ok(())
}

pub fn render_year(months: &[MonthlySummary], totals: &YearSummary, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "{:<5}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}",
        "month", "income", "expenses", "bills", "savings", "net", "debt", "left"
    )?;
    for m in months {
        writeln!(
            out,
            "{:<5}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}",
            month_name(m.month),
            m.income,
            m.expenses,
            m.bills,
            m.savings,
            m.net,
            m.debt,
            m.left
        )?;
    }
    writeln!(
        out,
        "{:<5}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}",
        totals.year,
        totals.income,
        totals.expenses,
        totals.bills,
        totals.savings,
        totals.net,
        totals.debt,
        totals.left
    )
}

pub fn render_bills(status: &BillStatus, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Paid: {}/{}", status.paid, status.count)?;
    writeln!(out, "Total bills {:>14.2}", status.total)?;
    writeln!(out, "Unpaid      {:>14.2}", status.unpaid_total)
}

pub fn render_balance(points: &[BalancePoint], out: &mut dyn Write) -> io::Result<()> {
    if points.is_empty() {
        return writeln!(out, "no entries in range");
    }
    for p in points {
        writeln!(out, "{}  {:>14.2}", p.date, p.balance)?;
    }
    Ok(())
}
