use chrono::Local;
use rusqlite::Connection;

use crate::error::{FatouraError, Result};
use crate::matcher::EXACT_TOLERANCE;
use crate::models::{Invoice, InvoiceStatus, QuoteStatus};

pub const VAT_RATES: &[f64] = &[0.0, 7.0, 10.0, 14.0, 20.0];

/// Law 69-21 late-payment indemnity: 3% of the outstanding (VAT included)
/// for the first month, 0.85% per additional started month.
const FIRST_MONTH_RATE: f64 = 0.03;
const ADDITIONAL_MONTH_RATE: f64 = 0.0085;

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Numbering — FAC-2025-0001 / DEV-2025-0001 / AV-2025-0001, per-year sequence
// ---------------------------------------------------------------------------

pub fn next_number(conn: &Connection, table: &str, column: &str, prefix: &str, year: i32) -> Result<String> {
    let pattern = format!("{prefix}-{year:04}-%");
    let sql = format!("SELECT {column} FROM {table} WHERE {column} LIKE ?1 ORDER BY {column} DESC LIMIT 1");
    let last: Option<String> = conn.query_row(&sql, [&pattern], |r| r.get(0)).ok();
    let next = match last {
        Some(number) => number
            .rsplit('-')
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0)
            + 1,
        None => 1,
    };
    Ok(format!("{prefix}-{year:04}-{next:04}"))
}

fn year_of(date: &str) -> i32 {
    date.get(..4).and_then(|y| y.parse().ok()).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Invoice creation and lookup
// ---------------------------------------------------------------------------

pub fn client_id_by_name(conn: &Connection, name: &str) -> Result<i64> {
    conn.query_row("SELECT id FROM clients WHERE name = ?1", [name], |r| r.get(0))
        .map_err(|_| FatouraError::UnknownClient(name.to_string()))
}

pub fn validate_vat_rate(rate: f64) -> Result<()> {
    if VAT_RATES.iter().any(|r| (r - rate).abs() < f64::EPSILON) {
        Ok(())
    } else {
        Err(FatouraError::InvalidVatRate(rate))
    }
}

pub fn create_invoice(
    conn: &Connection,
    client_id: i64,
    date: &str,
    due_date: &str,
    total_ht: f64,
    vat_rate: f64,
) -> Result<Invoice> {
    validate_vat_rate(vat_rate)?;
    let vat_amount = round_cents(total_ht * vat_rate / 100.0);
    let total = round_cents(total_ht + vat_amount);
    let number = next_number(conn, "invoices", "invoice_number", "FAC", year_of(date))?;

    conn.execute(
        "INSERT INTO invoices (invoice_number, client_id, date, due_date, total_ht, vat_rate, vat_amount, total, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'draft')",
        rusqlite::params![number, client_id, date, due_date, total_ht, vat_rate, vat_amount, total],
    )?;
    get_invoice(conn, conn.last_insert_rowid())
}

pub fn get_invoice(conn: &Connection, id: i64) -> Result<Invoice> {
    read_invoice(conn, "id = ?1", &id.to_string())
        .map_err(|_| FatouraError::UnknownInvoice(id.to_string()))
}

pub fn get_invoice_by_number(conn: &Connection, number: &str) -> Result<Invoice> {
    read_invoice(conn, "invoice_number = ?1", number)
        .map_err(|_| FatouraError::UnknownInvoice(number.to_string()))
}

fn read_invoice(conn: &Connection, clause: &str, param: &str) -> Result<Invoice> {
    let sql = format!(
        "SELECT id, invoice_number, client_id, date, due_date, total_ht, vat_rate, vat_amount, total, paid_amount, status \
         FROM invoices WHERE {clause}"
    );
    let (invoice, status): (Invoice, String) = conn.query_row(&sql, [param], |row| {
        Ok((
            Invoice {
                id: row.get(0)?,
                invoice_number: row.get(1)?,
                client_id: row.get(2)?,
                date: row.get(3)?,
                due_date: row.get(4)?,
                total_ht: row.get(5)?,
                vat_rate: row.get(6)?,
                vat_amount: row.get(7)?,
                total: row.get(8)?,
                paid_amount: row.get(9)?,
                status: InvoiceStatus::Draft,
            },
            row.get(10)?,
        ))
    })?;
    Ok(Invoice {
        status: InvoiceStatus::parse(&status)?,
        ..invoice
    })
}

pub fn send_invoice(conn: &Connection, number: &str) -> Result<()> {
    let invoice = get_invoice_by_number(conn, number)?;
    if invoice.status != InvoiceStatus::Draft {
        return Err(FatouraError::InvalidTransition(format!(
            "{number} is {}, only draft invoices can be sent",
            invoice.status.as_str()
        )));
    }
    conn.execute("UPDATE invoices SET status = 'sent' WHERE id = ?1", [invoice.id])?;
    Ok(())
}

pub fn cancel_invoice(conn: &Connection, number: &str) -> Result<()> {
    let invoice = get_invoice_by_number(conn, number)?;
    if invoice.paid_amount > EXACT_TOLERANCE {
        return Err(FatouraError::InvalidTransition(format!(
            "{number} has settlements, cancel the payments first"
        )));
    }
    conn.execute("UPDATE invoices SET status = 'cancelled' WHERE id = ?1", [invoice.id])?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Settlements — payments and credit notes funnel through here
// ---------------------------------------------------------------------------

fn recompute_status(paid: f64, total: f64, due_date: &str, today: &str) -> InvoiceStatus {
    if paid >= total - EXACT_TOLERANCE {
        InvoiceStatus::Paid
    } else if paid > EXACT_TOLERANCE {
        InvoiceStatus::Partial
    } else if due_date < today {
        InvoiceStatus::Overdue
    } else {
        InvoiceStatus::Sent
    }
}

/// Increase `paid_amount` and recompute status. The invoice must be open.
pub fn apply_settlement(conn: &Connection, invoice_id: i64, amount: f64) -> Result<InvoiceStatus> {
    let invoice = get_invoice(conn, invoice_id)?;
    if !invoice.status.is_open() {
        return Err(FatouraError::InvalidTransition(format!(
            "{} is {}, not open for settlement",
            invoice.invoice_number,
            invoice.status.as_str()
        )));
    }
    let paid = round_cents(invoice.paid_amount + amount);
    let status = recompute_status(paid, invoice.total, &invoice.due_date, &today());
    conn.execute(
        "UPDATE invoices SET paid_amount = ?1, status = ?2 WHERE id = ?3",
        rusqlite::params![paid, status.as_str(), invoice_id],
    )?;
    Ok(status)
}

/// Roll a settlement back (used when a reconciliation match is replaced).
pub fn reverse_settlement(conn: &Connection, invoice_id: i64, amount: f64) -> Result<InvoiceStatus> {
    let invoice = get_invoice(conn, invoice_id)?;
    let paid = round_cents((invoice.paid_amount - amount).max(0.0));
    let status = recompute_status(paid, invoice.total, &invoice.due_date, &today());
    conn.execute(
        "UPDATE invoices SET paid_amount = ?1, status = ?2 WHERE id = ?3",
        rusqlite::params![paid, status.as_str(), invoice_id],
    )?;
    Ok(status)
}

/// Promote past-due sent invoices to overdue. Returns how many changed.
pub fn refresh_overdue(conn: &Connection) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE invoices SET status = 'overdue' WHERE status = 'sent' AND due_date < ?1",
        [today()],
    )?;
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Late fees
// ---------------------------------------------------------------------------

pub fn days_overdue(due_date: &str, today: &str) -> i64 {
    let due = chrono::NaiveDate::parse_from_str(due_date, "%Y-%m-%d");
    let now = chrono::NaiveDate::parse_from_str(today, "%Y-%m-%d");
    match (due, now) {
        (Ok(due), Ok(now)) => (now - due).num_days(),
        _ => 0,
    }
}

pub fn late_fee(outstanding: f64, days_overdue: i64) -> f64 {
    if days_overdue <= 0 || outstanding <= 0.0 {
        return 0.0;
    }
    let started_months = (days_overdue - 1) / 30 + 1;
    let rate = FIRST_MONTH_RATE + (started_months - 1) as f64 * ADDITIONAL_MONTH_RATE;
    round_cents(outstanding * rate)
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

pub fn create_quote(
    conn: &Connection,
    client_id: i64,
    date: &str,
    valid_until: &str,
    total_ht: f64,
    vat_rate: f64,
) -> Result<String> {
    validate_vat_rate(vat_rate)?;
    let vat_amount = round_cents(total_ht * vat_rate / 100.0);
    let total = round_cents(total_ht + vat_amount);
    let number = next_number(conn, "quotes", "quote_number", "DEV", year_of(date))?;

    conn.execute(
        "INSERT INTO quotes (quote_number, client_id, date, valid_until, total_ht, vat_rate, vat_amount, total, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'draft')",
        rusqlite::params![number, client_id, date, valid_until, total_ht, vat_rate, vat_amount, total],
    )?;
    Ok(number)
}

fn quote_row(conn: &Connection, number: &str) -> Result<(i64, i64, f64, f64, String)> {
    conn.query_row(
        "SELECT id, client_id, total_ht, vat_rate, status FROM quotes WHERE quote_number = ?1",
        [number],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
    )
    .map_err(|_| FatouraError::UnknownQuote(number.to_string()))
}

pub fn set_quote_status(conn: &Connection, number: &str, from: &[QuoteStatus], to: QuoteStatus) -> Result<()> {
    let (id, _, _, _, status) = quote_row(conn, number)?;
    let current = QuoteStatus::parse(&status)?;
    if !from.contains(&current) {
        return Err(FatouraError::InvalidTransition(format!(
            "{number} is {}, cannot move to {}",
            current.as_str(),
            to.as_str()
        )));
    }
    conn.execute(
        "UPDATE quotes SET status = ?1 WHERE id = ?2",
        rusqlite::params![to.as_str(), id],
    )?;
    Ok(())
}

/// Accepting a quote creates a draft invoice carrying its amounts and links
/// the two documents. Due date: 30 days from the invoice date.
pub fn accept_quote(conn: &Connection, number: &str, date: &str) -> Result<Invoice> {
    let (id, client_id, total_ht, vat_rate, status) = quote_row(conn, number)?;
    let current = QuoteStatus::parse(&status)?;
    if !matches!(current, QuoteStatus::Draft | QuoteStatus::Sent) {
        return Err(FatouraError::InvalidTransition(format!(
            "{number} is {}, cannot accept",
            current.as_str()
        )));
    }

    let due = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| (d + chrono::Duration::days(30)).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| date.to_string());
    let invoice = create_invoice(conn, client_id, date, &due, total_ht, vat_rate)?;

    conn.execute(
        "UPDATE quotes SET status = 'accepted', invoice_id = ?1 WHERE id = ?2",
        rusqlite::params![invoice.id, id],
    )?;
    Ok(invoice)
}

// ---------------------------------------------------------------------------
// Credit notes
// ---------------------------------------------------------------------------

/// An avoir settles part of the invoice balance without cash. Capped at the
/// outstanding amount.
pub fn create_credit_note(
    conn: &Connection,
    invoice_number: &str,
    date: &str,
    amount: f64,
    reason: Option<&str>,
) -> Result<String> {
    let invoice = get_invoice_by_number(conn, invoice_number)?;
    if !invoice.status.is_open() {
        return Err(FatouraError::InvalidTransition(format!(
            "{invoice_number} is {}, not open for a credit note",
            invoice.status.as_str()
        )));
    }
    let applied = amount.min(invoice.outstanding());
    let number = next_number(conn, "credit_notes", "credit_note_number", "AV", year_of(date))?;

    conn.execute(
        "INSERT INTO credit_notes (credit_note_number, invoice_id, date, amount, reason) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![number, invoice.id, date, applied, reason],
    )?;
    apply_settlement(conn, invoice.id, applied)?;
    Ok(number)
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

    fn add_client(conn: &Connection) -> i64 {
        conn.execute(
            "INSERT INTO clients (name, ice) VALUES ('Maroc Telecom', '001234567000089')",
            [],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn test_invoice_numbering_per_year() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let a = create_invoice(&conn, client, "2025-01-10", "2025-02-10", 1000.0, 20.0).unwrap();
        let b = create_invoice(&conn, client, "2025-03-10", "2025-04-10", 500.0, 20.0).unwrap();
        let c = create_invoice(&conn, client, "2026-01-05", "2026-02-05", 500.0, 20.0).unwrap();
        assert_eq!(a.invoice_number, "FAC-2025-0001");
        assert_eq!(b.invoice_number, "FAC-2025-0002");
        assert_eq!(c.invoice_number, "FAC-2026-0001");
    }

    #[test]
    fn test_vat_computation() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let inv = create_invoice(&conn, client, "2025-01-10", "2025-02-10", 1000.0, 20.0).unwrap();
        assert_eq!(inv.vat_amount, 200.0);
        assert_eq!(inv.total, 1200.0);
        assert_eq!(inv.status, InvoiceStatus::Draft);
    }

    #[test]
    fn test_invalid_vat_rate_rejected() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let err = create_invoice(&conn, client, "2025-01-10", "2025-02-10", 1000.0, 19.6);
        assert!(err.is_err());
    }

    #[test]
    fn test_send_then_cancel_rules() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let inv = create_invoice(&conn, client, "2025-01-10", "2025-02-10", 1000.0, 20.0).unwrap();
        send_invoice(&conn, &inv.invoice_number).unwrap();
        assert!(send_invoice(&conn, &inv.invoice_number).is_err(), "double send rejected");

        apply_settlement(&conn, inv.id, 100.0).unwrap();
        assert!(cancel_invoice(&conn, &inv.invoice_number).is_err(), "settled invoice cannot cancel");
    }

    #[test]
    fn test_settlement_status_progression() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let inv = create_invoice(&conn, client, "2025-01-10", "2099-01-01", 1000.0, 20.0).unwrap();
        send_invoice(&conn, &inv.invoice_number).unwrap();

        let status = apply_settlement(&conn, inv.id, 700.0).unwrap();
        assert_eq!(status, InvoiceStatus::Partial);
        let status = apply_settlement(&conn, inv.id, 500.0).unwrap();
        assert_eq!(status, InvoiceStatus::Paid);

        let status = reverse_settlement(&conn, inv.id, 500.0).unwrap();
        assert_eq!(status, InvoiceStatus::Partial);
        let status = reverse_settlement(&conn, inv.id, 700.0).unwrap();
        assert_eq!(status, InvoiceStatus::Sent);
    }

    #[test]
    fn test_settlement_rejected_on_draft() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let inv = create_invoice(&conn, client, "2025-01-10", "2025-02-10", 1000.0, 20.0).unwrap();
        assert!(apply_settlement(&conn, inv.id, 100.0).is_err());
    }

    #[test]
    fn test_refresh_overdue() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let old = create_invoice(&conn, client, "2020-01-10", "2020-02-10", 1000.0, 20.0).unwrap();
        let new = create_invoice(&conn, client, "2020-01-10", "2099-02-10", 1000.0, 20.0).unwrap();
        send_invoice(&conn, &old.invoice_number).unwrap();
        send_invoice(&conn, &new.invoice_number).unwrap();

        let changed = refresh_overdue(&conn).unwrap();
        assert_eq!(changed, 1);
        assert_eq!(get_invoice(&conn, old.id).unwrap().status, InvoiceStatus::Overdue);
        assert_eq!(get_invoice(&conn, new.id).unwrap().status, InvoiceStatus::Sent);
    }

    #[test]
    fn test_late_fee_schedule() {
        assert_eq!(late_fee(1000.0, 0), 0.0);
        assert_eq!(late_fee(1000.0, -5), 0.0);
        assert_eq!(late_fee(1000.0, 15), 30.0); // first started month: 3%
        assert_eq!(late_fee(1000.0, 30), 30.0);
        assert_eq!(late_fee(1000.0, 31), 38.5); // +0.85% for the second month
        assert_eq!(late_fee(1000.0, 95), 55.5); // 4 started months
        assert_eq!(late_fee(0.0, 60), 0.0);
    }

    #[test]
    fn test_days_overdue() {
        assert_eq!(days_overdue("2025-01-01", "2025-01-31"), 30);
        assert_eq!(days_overdue("2025-01-31", "2025-01-01"), -30);
        assert_eq!(days_overdue("garbage", "2025-01-01"), 0);
    }

    #[test]
    fn test_quote_accept_creates_linked_invoice() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let number = create_quote(&conn, client, "2025-01-10", "2025-02-10", 2000.0, 20.0).unwrap();
        assert_eq!(number, "DEV-2025-0001");

        let invoice = accept_quote(&conn, &number, "2025-01-20").unwrap();
        assert_eq!(invoice.total, 2400.0);
        assert_eq!(invoice.due_date, "2025-02-19");

        let (status, linked): (String, Option<i64>) = conn
            .query_row(
                "SELECT status, invoice_id FROM quotes WHERE quote_number = ?1",
                [&number],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(status, "accepted");
        assert_eq!(linked, Some(invoice.id));

        assert!(accept_quote(&conn, &number, "2025-01-21").is_err(), "double accept rejected");
    }

    #[test]
    fn test_quote_decline() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let number = create_quote(&conn, client, "2025-01-10", "2025-02-10", 2000.0, 20.0).unwrap();
        set_quote_status(&conn, &number, &[QuoteStatus::Draft, QuoteStatus::Sent], QuoteStatus::Declined).unwrap();
        assert!(accept_quote(&conn, &number, "2025-01-21").is_err());
    }

    #[test]
    fn test_credit_note_caps_at_outstanding() {
        let (_dir, conn) = test_db();
        let client = add_client(&conn);
        let inv = create_invoice(&conn, client, "2025-01-10", "2099-01-01", 1000.0, 20.0).unwrap();
        send_invoice(&conn, &inv.invoice_number).unwrap();
        apply_settlement(&conn, inv.id, 1000.0).unwrap();

        let number = create_credit_note(&conn, &inv.invoice_number, "2025-02-01", 500.0, Some("remise")).unwrap();
        assert_eq!(number, "AV-2025-0001");

        let applied: f64 = conn
            .query_row("SELECT amount FROM credit_notes WHERE credit_note_number = ?1", [&number], |r| r.get(0))
            .unwrap();
        assert_eq!(applied, 200.0);
        assert_eq!(get_invoice(&conn, inv.id).unwrap().status, InvoiceStatus::Paid);
    }
}
