use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::invoices;
use crate::settings::get_data_dir;

pub fn create(invoice: &str, amount: f64, date: Option<String>, reason: Option<String>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let date = date.unwrap_or_else(invoices::today);
    let number = invoices::create_credit_note(&conn, invoice, &date, amount, reason.as_deref())?;
    println!("Created {number} against {invoice}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let mut stmt = conn.prepare(
        "SELECT cn.credit_note_number, i.invoice_number, c.name, cn.date, cn.amount, cn.reason \
         FROM credit_notes cn \
         JOIN invoices i ON cn.invoice_id = i.id \
         JOIN clients c ON i.client_id = c.id \
         ORDER BY cn.credit_note_number",
    )?;
    let rows: Vec<(String, String, String, String, f64, Option<String>)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["Number", "Invoice", "Client", "Date", "Amount", "Reason"]);
    for (number, invoice, client, date, amount, reason) in rows {
        table.add_row(vec![
            Cell::new(number),
            Cell::new(invoice),
            Cell::new(client),
            Cell::new(date),
            Cell::new(money(amount)),
            Cell::new(reason.unwrap_or_default()),
        ]);
    }
    println!("Credit notes\n{table}");
    Ok(())
}
