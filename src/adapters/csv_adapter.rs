//! CSV export and import.

use crate::domain::entry::{Category, Entry, NewEntry, parse_amount, parse_date};
use crate::domain::error::LedgerError;
use crate::ports::export_port::ExportPort;
use std::io::{Read, Write};

pub const HEADER: [&str; 4] = ["date", "category", "label", "amount"];

/// Optional fifth column accepted on import.
pub const PAID_COLUMN: &str = "paid";

pub struct CsvAdapter;

impl CsvAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Reads `date,category,label,amount[,paid]` rows into unvalidated
    /// entries. Errors name the 1-based line the row starts on.
    pub fn read_entries<R: Read>(&self, input: R) -> Result<Vec<NewEntry>, LedgerError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);

        let headers = rdr.headers().map_err(|e| LedgerError::Validation {
            field: "header".into(),
            reason: format!("CSV parse error: {}", e),
        })?;
        let columns: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
        let has_paid = columns.len() == 5 && columns[4] == PAID_COLUMN;
        if !(columns.len() == 4 || has_paid) || columns[..4] != HEADER {
            return Err(LedgerError::validation(
                "header",
                format!(
                    "expected '{}' with optional '{}', got '{}'",
                    HEADER.join(","),
                    PAID_COLUMN,
                    columns.join(",")
                ),
            ));
        }

        let mut entries = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                let reason = match e.position() {
                    Some(pos) => format!("line {}: CSV parse error: {}", pos.line(), e),
                    None => format!("CSV parse error: {}", e),
                };
                LedgerError::validation("row", reason)
            })?;
            let line = record.position().map_or(0, |p| p.line());

            let field = |i: usize, name: &str| -> Result<String, LedgerError> {
                record.get(i).map(str::to_string).ok_or_else(|| {
                    LedgerError::validation(name, format!("line {}: missing {} column", line, name))
                })
            };
            let at_line = |err: LedgerError| match err {
                LedgerError::Validation { field, reason } => LedgerError::Validation {
                    field,
                    reason: format!("line {}: {}", line, reason),
                },
                other => other,
            };

            let date = parse_date(&field(0, "date")?).map_err(at_line)?;
            let category: Category = field(1, "category")?.parse().map_err(at_line)?;
            let label = field(2, "label")?;
            let amount = parse_amount(&field(3, "amount")?).map_err(at_line)?;
            let paid = if has_paid {
                parse_paid(&field(4, PAID_COLUMN)?).map_err(at_line)?
            } else {
                false
            };

            entries.push(
                NewEntry::new(date, category, amount)
                    .with_label(label)
                    .with_paid(paid),
            );
        }

        Ok(entries)
    }
}

fn parse_paid(value: &str) -> Result<bool, LedgerError> {
    match value.to_lowercase().as_str() {
        "" | "false" | "no" | "0" => Ok(false),
        "true" | "yes" | "1" => Ok(true),
        other => Err(LedgerError::validation(
            PAID_COLUMN,
            format!("expected true or false, got '{other}'"),
        )),
    }
}

impl Default for CsvAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportPort for CsvAdapter {
    fn write(&self, entries: &[&Entry], output: &mut dyn Write) -> Result<usize, LedgerError> {
        let export_err = |e: csv::Error| LedgerError::Export {
            reason: format!("CSV write error: {}", e),
        };

        let mut wtr = csv::Writer::from_writer(output);
        wtr.write_record(HEADER).map_err(export_err)?;
        for entry in entries {
            wtr.write_record([
                entry.date.format("%Y-%m-%d").to_string(),
                entry.category.to_string(),
                entry.label.clone(),
                entry.amount.normalize().to_string(),
            ])
            .map_err(export_err)?;
        }
        wtr.flush()?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry::EntryId;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn entry(id: u64, day: u32, category: Category, label: &str, amount: rust_decimal::Decimal) -> Entry {
        NewEntry::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), category, amount)
            .with_label(label)
            .validate(EntryId(id))
            .unwrap()
    }

    fn export(entries: &[Entry]) -> String {
        let refs: Vec<&Entry> = entries.iter().collect();
        let mut buf = Vec::new();
        CsvAdapter::new().write(&refs, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn export_writes_header_and_rows() {
        let csv = export(&[
            entry(1, 5, Category::Income, "salary", dec!(3000)),
            entry(2, 10, Category::Expense, "rent", dec!(1200.50)),
        ]);
        assert_eq!(
            csv,
            "date,category,label,amount\n\
             2024-01-05,income,salary,3000\n\
             2024-01-10,expense,rent,1200.5\n"
        );
    }

    #[test]
    fn export_empty_still_has_header() {
        assert_eq!(export(&[]), "date,category,label,amount\n");
    }

    #[test]
    fn export_quotes_labels_with_commas() {
        let csv = export(&[entry(1, 3, Category::Bill, "gas, electric", dec!(80))]);
        assert!(csv.contains("\"gas, electric\""));
    }

    #[test]
    fn export_has_no_thousands_separator() {
        let csv = export(&[entry(1, 3, Category::Income, "bonus", dec!(1234567.89))]);
        assert!(csv.ends_with("1234567.89\n"));
    }

    #[test]
    fn import_reads_exported_rows() {
        let entries = vec![
            entry(1, 5, Category::Income, "salary", dec!(3000)),
            entry(2, 15, Category::Bill, "gas, electric", dec!(80.25)),
        ];
        let csv = export(&entries);
        let drafts = CsvAdapter::new().read_entries(csv.as_bytes()).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[1].label.as_deref(), Some("gas, electric"));
        assert_eq!(drafts[1].amount, Some(dec!(80.25)));
        assert_eq!(drafts[1].category, Some(Category::Bill));
    }

    #[test]
    fn import_rejects_wrong_header() {
        let result = CsvAdapter::new().read_entries("when,what,amount\n".as_bytes());
        assert!(matches!(result, Err(LedgerError::Validation { field, .. }) if field == "header"));
    }

    #[test]
    fn import_reads_optional_paid_column() {
        let csv = "date,category,label,amount,paid\n\
                   2024-01-15,bill,electric,80,true\n\
                   2024-01-20,bill,water,30,\n\
                   2024-01-21,bill,phone,25,NO\n";
        let drafts = CsvAdapter::new().read_entries(csv.as_bytes()).unwrap();
        let paid: Vec<bool> = drafts.iter().map(|d| d.paid).collect();
        assert_eq!(paid, vec![true, false, false]);
    }

    #[test]
    fn import_rejects_bad_paid_value() {
        let csv = "date,category,label,amount,paid\n2024-01-15,bill,electric,80,maybe\n";
        let err = CsvAdapter::new().read_entries(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation { field, reason }
            if field == "paid" && reason.starts_with("line 2:")));
    }

    #[test]
    fn import_rejects_unknown_fifth_column() {
        let csv = "date,category,label,amount,note\n2024-01-15,bill,electric,80,x\n";
        let result = CsvAdapter::new().read_entries(csv.as_bytes());
        assert!(matches!(result, Err(LedgerError::Validation { field, .. }) if field == "header"));
    }

    #[test]
    fn import_line_numbers_follow_multiline_labels() {
        let csv = "date,category,label,amount\n\
                   2024-01-01,income,\"first\nsecond\nthird\",1\n\
                   2024-01-02,fun,b,2\n";
        let err = CsvAdapter::new().read_entries(csv.as_bytes()).unwrap_err();
        match err {
            LedgerError::Validation { field, reason } => {
                assert_eq!(field, "category");
                assert!(reason.starts_with("line 5:"), "got: {reason}");
            }
            other => panic!("expected Validation, got: {other}"),
        }
    }

    #[test]
    fn import_reports_line_of_bad_row() {
        let csv = "date,category,label,amount\n2024-01-01,income,a,1\n2024-01-02,fun,b,2\n";
        let err = CsvAdapter::new().read_entries(csv.as_bytes()).unwrap_err();
        match err {
            LedgerError::Validation { field, reason } => {
                assert_eq!(field, "category");
                assert!(reason.starts_with("line 3:"), "got: {reason}");
            }
            other => panic!("expected Validation, got: {other}"),
        }
    }
}
