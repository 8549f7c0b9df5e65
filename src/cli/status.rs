use crate::db::{get_connection, get_metadata};
use crate::error::Result;
use crate::fmt::{format_bytes, money};
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join("fatoura.db");

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;

        let company = get_metadata(&conn, "company_name");
        println!("Company:    {}", company.as_deref().unwrap_or("(not set)"));

        let clients: i64 = conn.query_row("SELECT count(*) FROM clients", [], |r| r.get(0))?;
        let invoices: i64 = conn.query_row("SELECT count(*) FROM invoices", [], |r| r.get(0))?;
        let outstanding: f64 = conn.query_row(
            "SELECT COALESCE(SUM(total - paid_amount), 0) FROM invoices \
             WHERE status IN ('sent', 'overdue', 'partial')",
            [],
            |r| r.get(0),
        )?;
        let unmatched: i64 = conn.query_row(
            "SELECT count(*) FROM bank_transactions WHERE status = 'unmatched'",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Clients:       {clients}");
        println!("Invoices:      {invoices}");
        println!("Outstanding:   {}", money(outstanding));
        println!("Unmatched bank transactions: {unmatched}");
    } else {
        println!();
        println!("Database not found. Run `fatoura init` to set up.");
    }

    Ok(())
}
