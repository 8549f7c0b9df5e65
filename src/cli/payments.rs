use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::invoices::{self, get_invoice_by_number};
use crate::settings::get_data_dir;

pub fn record(
    invoice: &str,
    amount: f64,
    method: &str,
    date: Option<String>,
    reference: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let inv = get_invoice_by_number(&conn, invoice)?;
    let date = date.unwrap_or_else(invoices::today);

    conn.execute(
        "INSERT INTO payments (invoice_id, amount, method, date, reference, notes) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![inv.id, amount, method, date, reference, notes],
    )?;
    let status = invoices::apply_settlement(&conn, inv.id, amount)?;
    println!("Recorded {} against {invoice} ({})", money(amount), status.as_str());
    Ok(())
}

pub fn list(invoice: Option<String>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let (clause, params) = match &invoice {
        Some(number) => ("AND i.invoice_number = ?1", vec![number.clone()]),
        None => ("", vec![]),
    };
    let sql = format!(
        "SELECT p.date, i.invoice_number, c.name, p.amount, p.method, p.reference \
         FROM payments p \
         JOIN invoices i ON p.invoice_id = i.id \
         JOIN clients c ON i.client_id = c.id \
         WHERE 1=1 {clause} ORDER BY p.date, p.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let param_values: Vec<&dyn rusqlite::types::ToSql> =
        params.iter().map(|p| p as &dyn rusqlite::types::ToSql).collect();
    let rows: Vec<(String, String, String, f64, String, Option<String>)> = stmt
        .query_map(param_values.as_slice(), |row| {
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
    table.set_header(vec!["Date", "Invoice", "Client", "Amount", "Method", "Reference"]);
    let mut total = 0.0;
    for (date, number, client, amount, method, reference) in rows {
        total += amount;
        table.add_row(vec![
            Cell::new(date),
            Cell::new(number),
            Cell::new(client),
            Cell::new(money(amount)),
            Cell::new(method),
            Cell::new(reference.unwrap_or_default()),
        ]);
    }
    println!("Payments (total {})\n{table}", money(total));
    Ok(())
}
