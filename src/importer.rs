use std::path::Path;

use regex::Regex;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::error::{FatouraError, Result};
use crate::models::ParsedRow;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse Moroccan bank amounts: "1 234,56", "1.234,56", "(500,00)", "1200.50 MAD".
pub fn parse_amount(raw: &str) -> f64 {
    let mut s = raw
        .replace('\u{a0}', "")
        .replace(' ', "")
        .replace('"', "")
        .replace("MAD", "")
        .replace("DH", "");
    let negative_paren = s.starts_with('(') && s.ends_with(')');
    if negative_paren {
        s = s[1..s.len() - 1].to_string();
    }
    if s.contains(',') {
        if s.contains('.') {
            // Period is the thousands separator, comma the decimal one.
            s = s.replace('.', "");
        }
        s = s.replace(',', ".");
    }
    let value = s.trim().parse::<f64>().unwrap_or(0.0);
    if negative_paren {
        -value
    } else {
        value
    }
}

/// Accepts ISO (YYYY-MM-DD) or DD/MM/YYYY; returns ISO.
pub fn parse_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let d: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let y: i32 = parts[2].parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(y, m, d).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Pull an invoice-number-shaped token (FAC-2025-0001, DEV-…) out of a
/// statement line so it can serve as the transaction reference.
pub fn extract_reference(description: &str) -> Option<String> {
    let re = Regex::new(r"\b[A-Z]{2,4}-\d{4}-\d{3,6}\b").ok()?;
    re.find(description).map(|m| m.as_str().to_string())
}

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn is_duplicate_row(conn: &Connection, account: &str, row: &ParsedRow) -> bool {
    conn.prepare_cached(
        "SELECT 1 FROM bank_transactions WHERE account = ?1 AND date = ?2 AND amount = ?3 AND description = ?4",
    )
    .and_then(|mut stmt| {
        stmt.exists(rusqlite::params![account, row.date, row.amount, row.description])
    })
    .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Importer kinds — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImporterKind {
    BankGeneric,
    BankDebitCredit,
}

impl ImporterKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::BankGeneric => "bank_generic",
            Self::BankDebitCredit => "bank_debit_credit",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BankGeneric => "Single amount column (Date, Libellé, Référence, Montant)",
            Self::BankDebitCredit => "Separate debit/credit columns",
        }
    }

    pub fn detect(&self, file_path: &Path) -> bool {
        match self {
            Self::BankGeneric => header_contains(file_path, "Montant"),
            Self::BankDebitCredit => {
                header_contains(file_path, "Crédit") || header_contains(file_path, "Credit")
            }
        }
    }

    pub fn parse(&self, file_path: &Path) -> Result<Vec<ParsedRow>> {
        match self {
            Self::BankGeneric => parse_bank_generic(file_path),
            Self::BankDebitCredit => parse_bank_debit_credit(file_path),
        }
    }
}

const ALL_IMPORTERS: &[ImporterKind] = &[ImporterKind::BankDebitCredit, ImporterKind::BankGeneric];

pub fn get_by_key(key: &str) -> Option<ImporterKind> {
    ALL_IMPORTERS.iter().find(|i| i.key() == key).copied()
}

pub fn get_for_file(file_path: &Path) -> ImporterKind {
    for imp in ALL_IMPORTERS {
        if imp.detect(file_path) {
            return *imp;
        }
    }
    ImporterKind::BankGeneric
}

fn header_contains(file_path: &Path, needle: &str) -> bool {
    let Ok(file) = std::fs::File::open(file_path) else {
        return false;
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    for result in rdr.records() {
        let Ok(record) = result else { continue };
        if record.iter().any(|f| f.trim() == needle) {
            return true;
        }
    }
    false
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

pub fn import_file(
    conn: &Connection,
    file_path: &Path,
    account: &str,
    format_key: Option<&str>,
) -> Result<ImportResult> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1 AND account = ?2")?;
        if stmt.exists(rusqlite::params![checksum, account])? {
            return Ok(ImportResult {
                imported: 0,
                skipped: 0,
                duplicate_file: true,
            });
        }
    }

    let importer = match format_key {
        Some(key) => get_by_key(key).ok_or_else(|| FatouraError::UnknownFormat(key.to_string()))?,
        None => get_for_file(file_path),
    };

    let parsed_rows = importer.parse(file_path)?;

    let dates: Vec<&str> = parsed_rows.iter().map(|r| r.date.as_str()).collect();
    let min_date = dates.iter().min().copied();
    let max_date = dates.iter().max().copied();
    conn.execute(
        "INSERT INTO imports (filename, account, record_count, date_range_start, date_range_end, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            file_path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
            account,
            parsed_rows.len() as i64,
            min_date,
            max_date,
            checksum,
        ],
    )?;
    let import_id = conn.last_insert_rowid();

    let mut imported = 0usize;
    let mut skipped = 0usize;
    for row in &parsed_rows {
        if is_duplicate_row(conn, account, row) {
            skipped += 1;
            continue;
        }
        conn.execute(
            "INSERT INTO bank_transactions (account, date, description, amount, reference, status, import_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, 'unmatched', ?6)",
            rusqlite::params![account, row.date, row.description, row.amount, row.reference, import_id],
        )?;
        imported += 1;
    }

    Ok(ImportResult {
        imported,
        skipped,
        duplicate_file: false,
    })
}

// ---------------------------------------------------------------------------
// Generic statement parser — Date, Libellé, Référence, Montant
// ---------------------------------------------------------------------------

fn parse_bank_generic(file_path: &Path) -> Result<Vec<ParsedRow>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    let mut found_header = false;
    let (mut idx_date, mut idx_desc, mut idx_ref, mut idx_amount) = (0, 1, 2, 3);

    for result in rdr.records() {
        let record = result?;
        if !found_header {
            if record.iter().any(|f| f.trim() == "Montant") {
                for (i, field) in record.iter().enumerate() {
                    let f = field.trim();
                    if f == "Date" { idx_date = i; }
                    if f == "Libellé" || f == "Libelle" { idx_desc = i; }
                    if f == "Référence" || f == "Reference" { idx_ref = i; }
                    if f == "Montant" { idx_amount = i; }
                }
                found_header = true;
            }
            continue;
        }
        let min_cols = [idx_date, idx_desc, idx_ref, idx_amount].into_iter().max().unwrap_or(0) + 1;
        if record.len() < min_cols {
            continue;
        }
        let Some(date) = parse_date(&record[idx_date]) else {
            continue;
        };
        let description = record[idx_desc].trim().to_string();
        if description.is_empty() {
            continue;
        }
        let reference = match record[idx_ref].trim() {
            "" => extract_reference(&description),
            r => Some(r.to_string()),
        };
        rows.push(ParsedRow {
            date,
            description,
            reference,
            amount: parse_amount(&record[idx_amount]),
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Debit/credit statement parser — Date, Libellé, Débit, Crédit
// ---------------------------------------------------------------------------

fn parse_bank_debit_credit(file_path: &Path) -> Result<Vec<ParsedRow>> {
    let file = std::fs::File::open(file_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut rows = Vec::new();
    let mut found_header = false;
    let (mut idx_date, mut idx_desc, mut idx_debit, mut idx_credit) = (0, 1, 2, 3);

    for result in rdr.records() {
        let record = result?;
        if !found_header {
            if record.iter().any(|f| matches!(f.trim(), "Crédit" | "Credit")) {
                for (i, field) in record.iter().enumerate() {
                    let f = field.trim();
                    if f == "Date" { idx_date = i; }
                    if f == "Libellé" || f == "Libelle" { idx_desc = i; }
                    if f == "Débit" || f == "Debit" { idx_debit = i; }
                    if f == "Crédit" || f == "Credit" { idx_credit = i; }
                }
                found_header = true;
            }
            continue;
        }
        let min_cols = [idx_date, idx_desc, idx_debit, idx_credit].into_iter().max().unwrap_or(0) + 1;
        if record.len() < min_cols {
            continue;
        }
        let Some(date) = parse_date(&record[idx_date]) else {
            continue;
        };
        let description = record[idx_desc].trim().to_string();
        if description.is_empty() {
            continue;
        }
        let debit = parse_amount(&record[idx_debit]);
        let credit = parse_amount(&record[idx_credit]);
        let amount = if credit != 0.0 { credit.abs() } else { -debit.abs() };
        rows.push(ParsedRow {
            date,
            description: description.clone(),
            reference: extract_reference(&description),
            amount,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn write_generic_csv(dir: &Path, name: &str, rows: &[(&str, &str, &str, &str)]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut content = String::from("Date,Libellé,Référence,Montant\n");
        for (date, desc, reference, amount) in rows {
            content.push_str(&format!("{date},{desc},{reference},{amount}\n"));
        }
        std::fs::write(&path, &content).unwrap();
        path
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1 234,56"), 1234.56);
        assert_eq!(parse_amount("1.234,56"), 1234.56);
        assert_eq!(parse_amount("1234.56"), 1234.56);
        assert_eq!(parse_amount("1200.50 MAD"), 1200.5);
        assert_eq!(parse_amount("(500,00)"), -500.0);
        assert_eq!(parse_amount("-42,50"), -42.5);
        assert_eq!(parse_amount("0"), 0.0);
        assert_eq!(parse_amount("n/a"), 0.0);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-01-15"), Some("2025-01-15".to_string()));
        assert_eq!(parse_date("15/01/2025"), Some("2025-01-15".to_string()));
        assert_eq!(parse_date("31/02/2025"), None);
        assert_eq!(parse_date("invalid"), None);
    }

    #[test]
    fn test_extract_reference() {
        assert_eq!(
            extract_reference("VIR RECU FAC-2025-0012 MAROC TELECOM"),
            Some("FAC-2025-0012".to_string())
        );
        assert_eq!(extract_reference("FRAIS TENUE DE COMPTE"), None);
        assert_eq!(
            extract_reference("REGLEMENT DEV-2024-003"),
            Some("DEV-2024-003".to_string())
        );
    }

    #[test]
    fn test_parse_bank_generic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("releve.csv");
        let content = "\
Compte: 007 810 0001234567890123
Période: janvier 2025

Date,Libellé,Référence,Montant
15/01/2025,VIR RECU MAROC TELECOM,FAC-2025-0001,\"12 000,00\"
18/01/2025,FRAIS TENUE DE COMPTE,,\"-25,00\"
20/01/2025,VIR RECU OCP FAC-2025-0002,,\"4 800,00\"
";
        std::fs::write(&path, content).unwrap();
        let rows = ImporterKind::BankGeneric.parse(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].amount, 12000.0);
        assert_eq!(rows[0].reference.as_deref(), Some("FAC-2025-0001"));
        assert_eq!(rows[1].amount, -25.0);
        assert_eq!(rows[1].reference, None);
        // Reference recovered from the description when the column is empty.
        assert_eq!(rows[2].reference.as_deref(), Some("FAC-2025-0002"));
    }

    #[test]
    fn test_parse_bank_debit_credit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("releve.csv");
        let content = "\
Date,Libellé,Débit,Crédit
15/01/2025,VIR RECU FAC-2025-0001,,\"12 000,00\"
18/01/2025,FRAIS TENUE DE COMPTE,\"25,00\",
";
        std::fs::write(&path, content).unwrap();
        let rows = ImporterKind::BankDebitCredit.parse(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, 12000.0);
        assert_eq!(rows[0].reference.as_deref(), Some("FAC-2025-0001"));
        assert_eq!(rows[1].amount, -25.0);
    }

    #[test]
    fn test_format_detection() {
        let dir = tempfile::tempdir().unwrap();
        let generic = write_generic_csv(dir.path(), "a.csv", &[("15/01/2025", "VIR", "", "100,00")]);
        assert_eq!(get_for_file(&generic), ImporterKind::BankGeneric);

        let path = dir.path().join("b.csv");
        std::fs::write(&path, "Date,Libellé,Débit,Crédit\n").unwrap();
        assert_eq!(get_for_file(&path), ImporterKind::BankDebitCredit);
    }

    #[test]
    fn test_import_file_inserts_unmatched_transactions() {
        let (dir, conn) = test_db();
        let path = write_generic_csv(dir.path(), "releve.csv", &[
            ("15/01/2025", "VIR RECU MAROC TELECOM", "FAC-2025-0001", "\"12 000,00\""),
            ("18/01/2025", "FRAIS TENUE DE COMPTE", "", "\"-25,00\""),
        ]);
        let result = import_file(&conn, &path, "Attijariwafa", Some("bank_generic")).unwrap();
        assert_eq!(result.imported, 2);
        assert!(!result.duplicate_file);

        let (count, unmatched): (i64, i64) = conn
            .query_row(
                "SELECT count(*), sum(status = 'unmatched') FROM bank_transactions",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(unmatched, 2);
    }

    #[test]
    fn test_import_file_detects_file_duplicate() {
        let (dir, conn) = test_db();
        let path = write_generic_csv(dir.path(), "releve.csv", &[
            ("15/01/2025", "VIR RECU", "", "\"100,00\""),
        ]);
        let r1 = import_file(&conn, &path, "Attijariwafa", None).unwrap();
        assert_eq!(r1.imported, 1);
        let r2 = import_file(&conn, &path, "Attijariwafa", None).unwrap();
        assert!(r2.duplicate_file);
        assert_eq!(r2.imported, 0);
    }

    #[test]
    fn test_import_file_skips_duplicate_rows() {
        let (dir, conn) = test_db();
        let a = write_generic_csv(dir.path(), "a.csv", &[
            ("15/01/2025", "VIR RECU", "", "\"100,00\""),
            ("16/01/2025", "VIR RECU BIS", "", "\"200,00\""),
        ]);
        import_file(&conn, &a, "Attijariwafa", None).unwrap();
        let b = write_generic_csv(dir.path(), "b.csv", &[
            ("16/01/2025", "VIR RECU BIS", "", "\"200,00\""),
            ("17/01/2025", "VIR RECU TER", "", "\"300,00\""),
        ]);
        let r = import_file(&conn, &b, "Attijariwafa", None).unwrap();
        assert_eq!(r.imported, 1);
        assert_eq!(r.skipped, 1);
    }

    #[test]
    fn test_import_records_batch() {
        let (dir, conn) = test_db();
        let path = write_generic_csv(dir.path(), "releve.csv", &[
            ("15/01/2025", "VIR RECU", "", "\"100,00\""),
            ("20/01/2025", "VIR RECU BIS", "", "\"200,00\""),
        ]);
        import_file(&conn, &path, "Attijariwafa", None).unwrap();
        let (count, start, end): (i64, String, String) = conn
            .query_row(
                "SELECT record_count, date_range_start, date_range_end FROM imports LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(start, "2025-01-15");
        assert_eq!(end, "2025-01-20");
    }

    #[test]
    fn test_unknown_format_key_rejected() {
        let (dir, conn) = test_db();
        let path = write_generic_csv(dir.path(), "releve.csv", &[
            ("15/01/2025", "VIR RECU", "", "\"100,00\""),
        ]);
        assert!(import_file(&conn, &path, "Attijariwafa", Some("nope")).is_err());
    }
}
