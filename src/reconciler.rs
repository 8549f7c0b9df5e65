use rusqlite::Connection;

use crate::error::{FatouraError, Result};
use crate::invoices::{apply_settlement, get_invoice, reverse_settlement};
use crate::matcher::{self, MatchCandidate, OpenInvoice};
use crate::models::{BankTransaction, TxnStatus};

/// Confidence recorded by `auto_match_all` — static, not the interactive score.
const AUTO_MATCH_CONFIDENCE: i64 = 90;

pub struct ConfirmResult {
    pub status: TxnStatus,
    pub payments: usize,
    /// Sum of materialized payment amounts; can differ from the transaction
    /// amount since each payment settles the invoice's full balance.
    pub allocated: f64,
    pub transaction_amount: f64,
}

pub struct AutoMatchResult {
    pub matched: usize,
    pub remaining: usize,
}

pub fn load_transaction(conn: &Connection, txn_id: i64) -> Result<BankTransaction> {
    let (txn, status): (BankTransaction, String) = conn
        .query_row(
            "SELECT id, account, date, description, amount, reference, status, match_confidence \
             FROM bank_transactions WHERE id = ?1",
            [txn_id],
            |row| {
                Ok((
                    BankTransaction {
                        id: row.get(0)?,
                        account: row.get(1)?,
                        date: row.get(2)?,
                        description: row.get(3)?,
                        amount: row.get(4)?,
                        reference: row.get(5)?,
                        status: TxnStatus::Unmatched,
                        match_confidence: row.get(7)?,
                    },
                    row.get(6)?,
                ))
            },
        )
        .map_err(|_| FatouraError::UnknownTransaction(txn_id))?;
    Ok(BankTransaction {
        status: TxnStatus::parse(&status)?,
        ..txn
    })
}

/// The matching universe: open invoices joined with client names, ordered by
/// invoice date then id. This order is the candidate tie-break.
pub fn open_invoices(conn: &Connection) -> Result<Vec<OpenInvoice>> {
    let mut stmt = conn.prepare(
        "SELECT i.id, i.invoice_number, c.name, i.total, i.paid_amount, i.date \
         FROM invoices i JOIN clients c ON i.client_id = c.id \
         WHERE i.status IN ('sent', 'overdue', 'partial') \
         ORDER BY i.date, i.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(OpenInvoice {
            id: row.get(0)?,
            invoice_number: row.get(1)?,
            client_name: row.get(2)?,
            total: row.get(3)?,
            paid_amount: row.get(4)?,
            date: row.get(5)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Ranked candidates for one transaction (≤5, descending confidence).
pub fn candidates_for(conn: &Connection, txn_id: i64) -> Result<Vec<MatchCandidate>> {
    let txn = load_transaction(conn, txn_id)?;
    let universe = open_invoices(conn)?;
    Ok(matcher::candidates(&txn, &universe))
}

/// Sets the transaction to `ignored` unconditionally. Any payments this
/// transaction materialized are rolled back first so an ignored transaction
/// carries none.
pub fn ignore(conn: &Connection, txn_id: i64) -> Result<()> {
    load_transaction(conn, txn_id)?;
    rollback_payments(conn, txn_id)?;
    conn.execute(
        "UPDATE bank_transactions SET status = 'ignored', match_confidence = NULL WHERE id = ?1",
        [txn_id],
    )?;
    Ok(())
}

/// Confirm a match: materialize one payment per selected invoice and set the
/// transaction status (`matched` for one invoice, `partially_matched` for
/// several). An empty selection is a no-op, leaving prior state untouched.
/// Re-confirming replaces the previous payment set.
pub fn confirm_match(conn: &Connection, txn_id: i64, invoice_ids: &[i64]) -> Result<ConfirmResult> {
    let txn = load_transaction(conn, txn_id)?;

    if invoice_ids.is_empty() {
        return Ok(ConfirmResult {
            status: txn.status,
            payments: 0,
            allocated: 0.0,
            transaction_amount: txn.amount,
        });
    }

    let mut selected: Vec<i64> = Vec::new();
    for &id in invoice_ids {
        if !selected.contains(&id) {
            selected.push(id);
        }
    }

    rollback_payments(conn, txn_id)?;

    let mut allocated = 0.0;
    let mut confidence: u8 = 0;
    let universe = open_invoices(conn)?;
    for &invoice_id in &selected {
        if let Some(open) = universe.iter().find(|inv| inv.id == invoice_id) {
            confidence = confidence.max(matcher::score(&txn, open));
        }
        allocated += materialize_payment(conn, &txn, invoice_id)?;
    }

    let status = if selected.len() == 1 {
        TxnStatus::Matched
    } else {
        TxnStatus::PartiallyMatched
    };
    conn.execute(
        "UPDATE bank_transactions SET status = ?1, match_confidence = ?2 WHERE id = ?3",
        rusqlite::params![status.as_str(), confidence as i64, txn_id],
    )?;

    Ok(ConfirmResult {
        status,
        payments: selected.len(),
        allocated,
        transaction_amount: txn.amount,
    })
}

/// Bulk pass over unmatched credit transactions: the first open invoice in
/// list order whose outstanding is within 1% of the transaction amount wins,
/// with confidence fixed at 90. No match is a no-op, never an error.
pub fn auto_match_all(conn: &Connection) -> Result<AutoMatchResult> {
    let mut stmt = conn.prepare(
        "SELECT id, amount FROM bank_transactions WHERE status = 'unmatched' ORDER BY id",
    )?;
    let unmatched: Vec<(i64, f64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut matched = 0usize;
    let mut remaining = 0usize;

    for (txn_id, amount) in unmatched {
        if amount <= 0.0 {
            // Debit lines cannot settle receivables.
            remaining += 1;
            continue;
        }
        let txn = load_transaction(conn, txn_id)?;
        let hit = open_invoices(conn)?.into_iter().find(|inv| {
            matcher::within_prefilter(txn.amount, inv.outstanding())
                && !already_referenced(conn, txn_id, inv.id)
        });

        match hit {
            Some(inv) => {
                materialize_payment(conn, &txn, inv.id)?;
                conn.execute(
                    "UPDATE bank_transactions SET status = 'matched', match_confidence = ?1 WHERE id = ?2",
                    rusqlite::params![AUTO_MATCH_CONFIDENCE, txn_id],
                )?;
                matched += 1;
            }
            None => remaining += 1,
        }
    }

    Ok(AutoMatchResult { matched, remaining })
}

fn already_referenced(conn: &Connection, txn_id: i64, invoice_id: i64) -> bool {
    conn.prepare_cached(
        "SELECT 1 FROM payments WHERE bank_transaction_id = ?1 AND invoice_id = ?2",
    )
    .and_then(|mut stmt| stmt.exists(rusqlite::params![txn_id, invoice_id]))
    .unwrap_or(false)
}

/// Emit one payment settling the invoice's full remaining balance, dated and
/// referenced from the transaction. Returns the materialized amount.
fn materialize_payment(conn: &Connection, txn: &BankTransaction, invoice_id: i64) -> Result<f64> {
    let invoice = get_invoice(conn, invoice_id)?;
    let amount = invoice.outstanding();
    let reference = txn
        .reference
        .clone()
        .unwrap_or_else(|| format!("TXN-{}", txn.id));

    conn.execute(
        "INSERT INTO payments (invoice_id, amount, method, date, reference, notes, bank_transaction_id) \
         VALUES (?1, ?2, 'bank', ?3, ?4, ?5, ?6)",
        rusqlite::params![
            invoice_id,
            amount,
            txn.date,
            reference,
            format!("Rapprochement: {}", txn.description),
            txn.id,
        ],
    )?;
    apply_settlement(conn, invoice_id, amount)?;
    Ok(amount)
}

/// Remove the transaction's materialized payments and reverse their effect
/// on the invoices they settled.
fn rollback_payments(conn: &Connection, txn_id: i64) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, invoice_id, amount FROM payments WHERE bank_transaction_id = ?1",
    )?;
    let prior: Vec<(i64, i64, f64)> = stmt
        .query_map([txn_id], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for (payment_id, invoice_id, amount) in prior {
        reverse_settlement(conn, invoice_id, amount)?;
        conn.execute("DELETE FROM payments WHERE id = ?1", [payment_id])?;
    }
    Ok(())
}
