use rusqlite::Connection;

use crate::error::Result;

/// One declaration period (a month "2025-01" or a quarter "2025-T1").
pub struct VatPeriod {
    pub period: String,
    pub collected: f64,
    pub vat_due: f64,
}

pub struct VatReport {
    pub periods: Vec<VatPeriod>,
    pub total_collected: f64,
    pub total_vat: f64,
}

/// VAT under the encashment regime: the tax is declared in the period the
/// payment is received, not when the invoice is issued. The VAT portion of
/// each payment is derived from its invoice's rate:
/// `vat = amount × rate / (100 + rate)`.
pub fn vat_encashment(conn: &Connection, year: i32, quarterly: bool) -> Result<VatReport> {
    let mut stmt = conn.prepare(
        "SELECT substr(p.date, 1, 7), p.amount, i.vat_rate \
         FROM payments p JOIN invoices i ON p.invoice_id = i.id \
         WHERE p.date LIKE ?1 ORDER BY p.date",
    )?;
    let rows: Vec<(String, f64, f64)> = stmt
        .query_map([format!("{year}%")], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut periods: Vec<VatPeriod> = Vec::new();
    for (month, amount, rate) in rows {
        let period = if quarterly { quarter_of(&month) } else { month };
        let vat = amount * rate / (100.0 + rate);
        let idx = match periods.iter().position(|p| p.period == period) {
            Some(i) => i,
            None => {
                periods.push(VatPeriod {
                    period,
                    collected: 0.0,
                    vat_due: 0.0,
                });
                periods.len() - 1
            }
        };
        periods[idx].collected += amount;
        periods[idx].vat_due += vat;
    }

    for p in &mut periods {
        p.collected = round_cents(p.collected);
        p.vat_due = round_cents(p.vat_due);
    }

    let total_collected = round_cents(periods.iter().map(|p| p.collected).sum());
    let total_vat = round_cents(periods.iter().map(|p| p.vat_due).sum());

    Ok(VatReport {
        periods,
        total_collected,
        total_vat,
    })
}

fn quarter_of(month: &str) -> String {
    let year = &month[..4];
    let m: u32 = month.get(5..7).and_then(|s| s.parse().ok()).unwrap_or(1);
    format!("{year}-T{}", (m - 1) / 3 + 1)
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
