use chrono::Datelike;
use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::reports;
use crate::settings::get_data_dir;
use crate::vat;

fn current_year() -> i32 {
    chrono::Local::now().year()
}

pub fn vat(year: Option<i32>, quarterly: bool) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let year = year.unwrap_or_else(current_year);
    let report = vat::vat_encashment(&conn, year, quarterly)?;

    if report.periods.is_empty() {
        println!("No payments collected in {year}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Period", "Collected (TTC)", "VAT due"]);
    for p in &report.periods {
        table.add_row(vec![
            Cell::new(&p.period),
            Cell::new(money(p.collected)),
            Cell::new(money(p.vat_due)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL".bold()),
        Cell::new(money(report.total_collected)),
        Cell::new(money(report.total_vat)),
    ]);
    println!("VAT — encashment regime, {year}\n{table}");
    Ok(())
}

pub fn aging() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    crate::invoices::refresh_overdue(&conn)?;
    let rows = reports::aging(&conn)?;

    if rows.is_empty() {
        println!("No outstanding receivables.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Client", "Current", "31-60", "61-90", "90+", "Total"]);
    let mut grand_total = 0.0;
    for r in &rows {
        grand_total += r.total;
        table.add_row(vec![
            Cell::new(&r.client),
            Cell::new(money(r.current)),
            Cell::new(money(r.days_31_60)),
            Cell::new(money(r.days_61_90)),
            Cell::new(money(r.days_over_90)),
            Cell::new(money(r.total)),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(money(grand_total)),
    ]);
    println!("Receivables aging\n{table}");
    Ok(())
}

pub fn revenue(year: Option<i32>) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let year = year.unwrap_or_else(current_year);
    let rows = reports::revenue(&conn, year)?;

    if rows.is_empty() {
        println!("No activity in {year}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Month", "Invoiced HT", "Invoiced TTC", "Collected"]);
    for r in &rows {
        table.add_row(vec![
            Cell::new(&r.month),
            Cell::new(money(r.invoiced_ht)),
            Cell::new(money(r.invoiced_ttc)),
            Cell::new(money(r.collected)),
        ]);
    }
    println!("Revenue {year}\n{table}");
    Ok(())
}

pub fn late_fees() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let rows = reports::late_fees(&conn)?;

    if rows.is_empty() {
        println!("No overdue invoices.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Invoice", "Client", "Due", "Days late", "Outstanding", "Penalty"]);
    for r in &rows {
        table.add_row(vec![
            Cell::new(&r.invoice_number),
            Cell::new(&r.client),
            Cell::new(&r.due_date),
            Cell::new(r.days_overdue),
            Cell::new(money(r.outstanding)),
            Cell::new(money(r.fee).red().to_string()),
        ]);
    }
    println!("Late-payment penalties (law 69-21)\n{table}");
    Ok(())
}
