use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::invoices::{self, client_id_by_name};
use crate::settings::get_data_dir;

fn default_due(date: &str) -> String {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| (d + chrono::Duration::days(30)).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| date.to_string())
}

pub fn create(client: &str, amount: f64, vat: f64, date: Option<String>, due: Option<String>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let client_id = client_id_by_name(&conn, client)?;
    let date = date.unwrap_or_else(invoices::today);
    let due = due.unwrap_or_else(|| default_due(&date));

    let invoice = invoices::create_invoice(&conn, client_id, &date, &due, amount, vat)?;
    println!(
        "Created {} for {}: {} HT + {} VAT = {} (due {})",
        invoice.invoice_number,
        client,
        money(invoice.total_ht),
        money(invoice.vat_amount),
        money(invoice.total),
        invoice.due_date
    );
    Ok(())
}

pub fn list(status: Option<String>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    invoices::refresh_overdue(&conn)?;

    let (clause, params) = match &status {
        Some(s) => ("AND i.status = ?1", vec![s.clone()]),
        None => ("", vec![]),
    };
    let sql = format!(
        "SELECT i.invoice_number, c.name, i.date, i.due_date, i.total, i.paid_amount, i.status \
         FROM invoices i JOIN clients c ON i.client_id = c.id \
         WHERE 1=1 {clause} ORDER BY i.invoice_number"
    );
    let mut stmt = conn.prepare(&sql)?;
    let param_values: Vec<&dyn rusqlite::types::ToSql> =
        params.iter().map(|p| p as &dyn rusqlite::types::ToSql).collect();
    let rows: Vec<(String, String, String, String, f64, f64, String)> = stmt
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
    table.set_header(vec!["Number", "Client", "Date", "Due", "Total", "Outstanding", "Status"]);
    for (number, client, date, due, total, paid, status) in rows {
        table.add_row(vec![
            Cell::new(number),
            Cell::new(client),
            Cell::new(date),
            Cell::new(due),
            Cell::new(money(total)),
            Cell::new(money(total - paid)),
            Cell::new(styled_status(&status)),
        ]);
    }
    println!("Invoices\n{table}");
    Ok(())
}

fn styled_status(status: &str) -> String {
    match status {
        "paid" => status.green().to_string(),
        "overdue" => status.red().bold().to_string(),
        "partial" => status.yellow().to_string(),
        "cancelled" => status.dimmed().to_string(),
        _ => status.to_string(),
    }
}

pub fn show(number: &str) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    invoices::refresh_overdue(&conn)?;
    let invoice = invoices::get_invoice_by_number(&conn, number)?;
    let client: String = conn.query_row(
        "SELECT name FROM clients WHERE id = ?1",
        [invoice.client_id],
        |r| r.get(0),
    )?;

    println!("{}", invoice.invoice_number.bold());
    println!("Client:      {client}");
    println!("Date:        {}  (due {})", invoice.date, invoice.due_date);
    println!("Total HT:    {}", money(invoice.total_ht));
    println!("VAT ({}%):   {}", invoice.vat_rate, money(invoice.vat_amount));
    println!("Total TTC:   {}", money(invoice.total));
    println!("Paid:        {}", money(invoice.paid_amount));
    println!("Outstanding: {}", money(invoice.outstanding()));
    println!("Status:      {}", styled_status(invoice.status.as_str()));

    let mut stmt = conn.prepare(
        "SELECT date, amount, method, reference FROM payments WHERE invoice_id = ?1 ORDER BY date",
    )?;
    let payments: Vec<(String, f64, String, Option<String>)> = stmt
        .query_map([invoice.id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if !payments.is_empty() {
        println!();
        println!("Payments:");
        for (date, amount, method, reference) in payments {
            println!(
                "  {date}  {}  {method}  {}",
                money(amount),
                reference.unwrap_or_default()
            );
        }
    }

    let mut cstmt = conn.prepare(
        "SELECT credit_note_number, date, amount, reason FROM credit_notes WHERE invoice_id = ?1 ORDER BY date",
    )?;
    let credits: Vec<(String, String, f64, Option<String>)> = cstmt
        .query_map([invoice.id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if !credits.is_empty() {
        println!();
        println!("Credit notes:");
        for (number, date, amount, reason) in credits {
            println!("  {number}  {date}  {}  {}", money(amount), reason.unwrap_or_default());
        }
    }
    Ok(())
}

pub fn send(number: &str) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    invoices::send_invoice(&conn, number)?;
    println!("{number} marked as sent");
    Ok(())
}

pub fn cancel(number: &str) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    invoices::cancel_invoice(&conn, number)?;
    println!("{number} cancelled");
    Ok(())
}
