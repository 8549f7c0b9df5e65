use rusqlite::Connection;

use crate::error::Result;
use crate::invoices::{self, days_overdue, late_fee};

// ---------------------------------------------------------------------------
// Receivables aging
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AgingRow {
    pub client: String,
    pub current: f64,
    pub days_31_60: f64,
    pub days_61_90: f64,
    pub days_over_90: f64,
    pub total: f64,
}

/// Open balances bucketed by days past due, grouped by client.
pub fn aging(conn: &Connection) -> Result<Vec<AgingRow>> {
    let today = invoices::today();
    let mut stmt = conn.prepare(
        "SELECT c.name, i.due_date, i.total - i.paid_amount \
         FROM invoices i JOIN clients c ON i.client_id = c.id \
         WHERE i.status IN ('sent', 'overdue', 'partial') \
         ORDER BY c.name, i.due_date",
    )?;
    let rows: Vec<(String, String, f64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut out: Vec<AgingRow> = Vec::new();
    for (client, due_date, outstanding) in rows {
        let idx = match out.iter().position(|r| r.client == client) {
            Some(i) => i,
            None => {
                out.push(AgingRow {
                    client: client.clone(),
                    ..AgingRow::default()
                });
                out.len() - 1
            }
        };
        let row = &mut out[idx];
        let days = days_overdue(&due_date, &today);
        match days {
            d if d <= 30 => row.current += outstanding,
            d if d <= 60 => row.days_31_60 += outstanding,
            d if d <= 90 => row.days_61_90 += outstanding,
            _ => row.days_over_90 += outstanding,
        }
        row.total += outstanding;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Revenue — invoiced vs collected per month
// ---------------------------------------------------------------------------

pub struct RevenueRow {
    pub month: String,
    pub invoiced_ht: f64,
    pub invoiced_ttc: f64,
    pub collected: f64,
}

pub fn revenue(conn: &Connection, year: i32) -> Result<Vec<RevenueRow>> {
    let pattern = format!("{year}%");
    let mut stmt = conn.prepare(
        "SELECT substr(date, 1, 7), SUM(total_ht), SUM(total) FROM invoices \
         WHERE date LIKE ?1 AND status != 'cancelled' \
         GROUP BY substr(date, 1, 7) ORDER BY 1",
    )?;
    let invoiced: Vec<(String, f64, f64)> = stmt
        .query_map([&pattern], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut cstmt = conn.prepare(
        "SELECT substr(date, 1, 7), SUM(amount) FROM payments \
         WHERE date LIKE ?1 GROUP BY substr(date, 1, 7)",
    )?;
    let collected: Vec<(String, f64)> = cstmt
        .query_map([&pattern], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut out: Vec<RevenueRow> = invoiced
        .into_iter()
        .map(|(month, ht, ttc)| RevenueRow {
            month,
            invoiced_ht: ht,
            invoiced_ttc: ttc,
            collected: 0.0,
        })
        .collect();
    for (month, amount) in collected {
        match out.iter().position(|r| r.month == month) {
            Some(i) => out[i].collected = amount,
            None => out.push(RevenueRow {
                month,
                invoiced_ht: 0.0,
                invoiced_ttc: 0.0,
                collected: amount,
            }),
        }
    }
    out.sort_by(|a, b| a.month.cmp(&b.month));
    Ok(out)
}

// ---------------------------------------------------------------------------
// Late fees over the overdue set
// ---------------------------------------------------------------------------

pub struct LateFeeRow {
    pub invoice_number: String,
    pub client: String,
    pub due_date: String,
    pub days_overdue: i64,
    pub outstanding: f64,
    pub fee: f64,
}

pub fn late_fees(conn: &Connection) -> Result<Vec<LateFeeRow>> {
    invoices::refresh_overdue(conn)?;
    let today = invoices::today();
    let mut stmt = conn.prepare(
        "SELECT i.invoice_number, c.name, i.due_date, i.total - i.paid_amount \
         FROM invoices i JOIN clients c ON i.client_id = c.id \
         WHERE i.status IN ('sent', 'overdue', 'partial') AND i.due_date < ?1 \
         ORDER BY i.due_date",
    )?;
    let rows: Vec<(String, String, String, f64)> = stmt
        .query_map([&today], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows
        .into_iter()
        .map(|(invoice_number, client, due_date, outstanding)| {
            let days = days_overdue(&due_date, &today);
            LateFeeRow {
                invoice_number,
                client,
                due_date,
                days_overdue: days,
                outstanding,
                fee: late_fee(outstanding, days),
            }
        })
        .collect())
}
