use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::invoices::{self, client_id_by_name};
use crate::models::QuoteStatus;
use crate::settings::get_data_dir;

pub fn create(client: &str, amount: f64, vat: f64, date: Option<String>, valid_until: Option<String>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let client_id = client_id_by_name(&conn, client)?;
    let date = date.unwrap_or_else(invoices::today);
    let valid_until = valid_until.unwrap_or_else(|| {
        chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map(|d| (d + chrono::Duration::days(30)).format("%Y-%m-%d").to_string())
            .unwrap_or_else(|_| date.clone())
    });

    let number = invoices::create_quote(&conn, client_id, &date, &valid_until, amount, vat)?;
    println!("Created {number} for {client} (valid until {valid_until})");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let mut stmt = conn.prepare(
        "SELECT q.quote_number, c.name, q.date, q.valid_until, q.total, q.status, i.invoice_number \
         FROM quotes q JOIN clients c ON q.client_id = c.id \
         LEFT JOIN invoices i ON q.invoice_id = i.id \
         ORDER BY q.quote_number",
    )?;
    let rows: Vec<(String, String, String, String, f64, String, Option<String>)> = stmt
        .query_map([], |row| {
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
    table.set_header(vec!["Number", "Client", "Date", "Valid until", "Total", "Status", "Invoice"]);
    for (number, client, date, valid_until, total, status, invoice) in rows {
        table.add_row(vec![
            Cell::new(number),
            Cell::new(client),
            Cell::new(date),
            Cell::new(valid_until),
            Cell::new(money(total)),
            Cell::new(status),
            Cell::new(invoice.unwrap_or_default()),
        ]);
    }
    println!("Quotes\n{table}");
    Ok(())
}

pub fn send(number: &str) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    invoices::set_quote_status(&conn, number, &[QuoteStatus::Draft], QuoteStatus::Sent)?;
    println!("{number} marked as sent");
    Ok(())
}

pub fn accept(number: &str, date: Option<String>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let date = date.unwrap_or_else(invoices::today);
    let invoice = invoices::accept_quote(&conn, number, &date)?;
    println!("{number} accepted, created {}", invoice.invoice_number);
    Ok(())
}

pub fn decline(number: &str) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    invoices::set_quote_status(
        &conn,
        number,
        &[QuoteStatus::Draft, QuoteStatus::Sent],
        QuoteStatus::Declined,
    )?;
    println!("{number} declined");
    Ok(())
}
