use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::invoices::{get_invoice_by_number, refresh_overdue};
use crate::reconciler;
use crate::settings::get_data_dir;

pub fn list(status: Option<&str>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let (clause, params) = match status {
        Some(s) => ("AND status = ?1", vec![s.to_string()]),
        None => ("", vec![]),
    };
    let sql = format!(
        "SELECT id, date, description, amount, reference, status, match_confidence \
         FROM bank_transactions WHERE 1=1 {clause} ORDER BY date, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let param_values: Vec<&dyn rusqlite::types::ToSql> =
        params.iter().map(|p| p as &dyn rusqlite::types::ToSql).collect();
    let rows: Vec<(i64, String, String, f64, Option<String>, String, Option<i64>)> = stmt
        .query_map(param_values.as_slice(), |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Amount", "Reference", "Status", "Conf."]);
    for (id, date, description, amount, reference, status, confidence) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(date),
            Cell::new(description),
            Cell::new(money(amount)),
            Cell::new(reference.unwrap_or_default()),
            Cell::new(styled_status(&status)),
            Cell::new(confidence.map(|c| c.to_string()).unwrap_or_default()),
        ]);
    }
    println!("Bank transactions\n{table}");
    Ok(())
}

fn styled_status(status: &str) -> String {
    match status {
        "matched" => status.green().to_string(),
        "partially_matched" => status.yellow().to_string(),
        "ignored" => status.dimmed().to_string(),
        _ => status.to_string(),
    }
}

pub fn candidates(id: i64) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    refresh_overdue(&conn)?;
    let txn = reconciler::load_transaction(&conn, id)?;
    let found = reconciler::candidates_for(&conn, id)?;

    println!(
        "Transaction #{id}: {} {} {}",
        txn.date,
        money(txn.amount),
        txn.description
    );
    if found.is_empty() {
        println!("No candidates (no open invoice within 1% of the amount).");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Invoice", "Client", "Date", "Outstanding", "Confidence"]);
    for c in found {
        table.add_row(vec![
            Cell::new(c.invoice_number),
            Cell::new(c.client_name),
            Cell::new(c.date),
            Cell::new(money(c.amount)),
            Cell::new(format!("{}%", c.confidence)),
        ]);
    }
    println!("{table}");
    println!("Confirm with: fatoura reconcile confirm {id} <INVOICE>...");
    Ok(())
}

pub fn confirm(id: i64, invoice_numbers: &[String]) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let mut invoice_ids = Vec::with_capacity(invoice_numbers.len());
    for number in invoice_numbers {
        invoice_ids.push(get_invoice_by_number(&conn, number)?.id);
    }

    let result = reconciler::confirm_match(&conn, id, &invoice_ids)?;
    if result.payments == 0 {
        println!("Nothing selected; transaction left as {}.", result.status.as_str());
        return Ok(());
    }

    println!(
        "Transaction #{id} {}: {} payment(s), {} allocated",
        result.status.as_str(),
        result.payments,
        money(result.allocated)
    );
    let delta = result.allocated - result.transaction_amount;
    if delta.abs() >= 0.01 {
        let direction = if delta > 0.0 { "exceeds" } else { "falls short of" };
        println!(
            "Note: allocation {} the transaction amount by {}.",
            direction,
            money(delta.abs())
        );
    }
    Ok(())
}

pub fn ignore(id: i64) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    reconciler::ignore(&conn, id)?;
    println!("Transaction #{id} ignored");
    Ok(())
}

pub fn auto() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    refresh_overdue(&conn)?;
    let result = reconciler::auto_match_all(&conn)?;
    println!("{} matched, {} left unmatched", result.matched, result.remaining);
    Ok(())
}
