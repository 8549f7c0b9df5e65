use std::path::PathBuf;

use rusqlite::Connection;

use crate::db::{get_connection, init_db, set_metadata};
use crate::error::Result;
use crate::invoices::{apply_settlement, create_invoice, create_quote, send_invoice};
use crate::settings::load_settings;

const DEMO_GUARD_CLIENT: &str = "Maroc Telecom";

struct DemoClient {
    name: &'static str,
    ice: &'static str,
    city: &'static str,
}

const CLIENTS: &[DemoClient] = &[
    DemoClient { name: "Maroc Telecom", ice: "001537559000011", city: "Rabat" },
    DemoClient { name: "OCP Group", ice: "001626048000034", city: "Casablanca" },
    DemoClient { name: "Atlas Hosting SARL", ice: "002845127000062", city: "Marrakech" },
    DemoClient { name: "Menara Consulting", ice: "003108794000018", city: "Fès" },
];

// (client index, date, due date, total HT, VAT rate, paid HT-inclusive amount)
const INVOICES: &[(usize, &str, &str, f64, f64, f64)] = &[
    (0, "2025-01-10", "2025-02-09", 10000.0, 20.0, 12000.0), // fully paid
    (0, "2025-02-15", "2025-03-17", 4000.0, 20.0, 0.0),
    (1, "2025-01-20", "2025-02-19", 25000.0, 20.0, 15000.0), // partial
    (1, "2025-03-05", "2025-04-04", 8000.0, 10.0, 0.0),
    (2, "2025-02-01", "2025-03-03", 1500.0, 20.0, 0.0),
    (3, "2025-03-12", "2025-04-11", 6000.0, 14.0, 0.0),
];

// (date, description, reference, amount)
const BANK_TXNS: &[(&str, &str, Option<&str>, f64)] = &[
    ("2025-03-20", "VIR RECU MAROC TELECOM", Some("FAC-2025-0002"), 4800.0),
    ("2025-03-22", "VIR RECU OCP GROUP", None, 8800.0),
    ("2025-03-25", "VIR RECU ATLAS HOSTING", None, 1800.0),
    ("2025-03-26", "VIR RECU DIVERS", None, 777.77),
    ("2025-03-31", "FRAIS TENUE DE COMPTE", None, -35.0),
];

fn insert_demo_data(conn: &Connection) -> Result<(usize, usize)> {
    set_metadata(conn, "company_name", "Atlas Digital SARL")?;
    set_metadata(conn, "company_ice", "002945813000025")?;

    let mut client_ids = Vec::new();
    for client in CLIENTS {
        conn.execute(
            "INSERT INTO clients (name, ice, address) VALUES (?1, ?2, ?3)",
            rusqlite::params![client.name, client.ice, client.city],
        )?;
        client_ids.push(conn.last_insert_rowid());
    }

    for &(client_idx, date, due, total_ht, vat_rate, paid) in INVOICES {
        let invoice = create_invoice(conn, client_ids[client_idx], date, due, total_ht, vat_rate)?;
        send_invoice(conn, &invoice.invoice_number)?;
        if paid > 0.0 {
            conn.execute(
                "INSERT INTO payments (invoice_id, amount, method, date, reference) \
                 VALUES (?1, ?2, 'bank', ?3, 'demo seed')",
                rusqlite::params![invoice.id, paid, date],
            )?;
            apply_settlement(conn, invoice.id, paid)?;
        }
    }

    create_quote(conn, client_ids[3], "2025-03-18", "2025-04-17", 12500.0, 20.0)?;

    for &(date, description, reference, amount) in BANK_TXNS {
        conn.execute(
            "INSERT INTO bank_transactions (account, date, description, amount, reference) \
             VALUES ('Attijariwafa', ?1, ?2, ?3, ?4)",
            rusqlite::params![date, description, amount, reference],
        )?;
    }

    Ok((INVOICES.len(), BANK_TXNS.len()))
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = PathBuf::from(&settings.data_dir).join("fatoura.db");

    if !db_path.exists() {
        eprintln!("No database found. Run `fatoura init` first.");
        std::process::exit(1);
    }

    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    // Idempotency guard
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM clients WHERE name = ?1)",
        [DEMO_GUARD_CLIENT],
        |r| r.get(0),
    )?;
    if exists {
        println!("Demo data already loaded (client '{DEMO_GUARD_CLIENT}' exists).");
        return Ok(());
    }

    let (invoice_count, txn_count) = insert_demo_data(&conn)?;

    println!("Demo data loaded!");
    println!("  Clients:           {}", CLIENTS.len());
    println!("  Invoices:          {invoice_count}");
    println!("  Bank transactions: {txn_count}");
    println!();
    println!("Try these next:");
    println!("  fatoura invoices list");
    println!("  fatoura reconcile list");
    println!("  fatoura reconcile candidates 1");
    println!("  fatoura reconcile auto");
    println!("  fatoura report vat --year 2025");
    println!("  fatoura report aging");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::reconciler;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_demo_creates_data() {
        let (_dir, conn) = test_db();
        let (invoice_count, txn_count) = insert_demo_data(&conn).unwrap();

        let clients: i64 = conn.query_row("SELECT count(*) FROM clients", [], |r| r.get(0)).unwrap();
        let invoices: i64 = conn.query_row("SELECT count(*) FROM invoices", [], |r| r.get(0)).unwrap();
        let txns: i64 =
            conn.query_row("SELECT count(*) FROM bank_transactions", [], |r| r.get(0)).unwrap();

        assert_eq!(clients, CLIENTS.len() as i64);
        assert_eq!(invoices, invoice_count as i64);
        assert_eq!(txns, txn_count as i64);
    }

    #[test]
    fn test_demo_has_reconcilable_transactions() {
        let (_dir, conn) = test_db();
        insert_demo_data(&conn).unwrap();

        // The seeded transfers are crafted to settle open invoices.
        let result = reconciler::auto_match_all(&conn).unwrap();
        assert!(result.matched >= 2, "expected at least 2 auto-matches, got {}", result.matched);
        assert!(result.remaining >= 1, "the stray transfer and the fee stay unmatched");
    }

    #[test]
    fn test_demo_statuses_mixed() {
        let (_dir, conn) = test_db();
        insert_demo_data(&conn).unwrap();

        let paid: i64 = conn
            .query_row("SELECT count(*) FROM invoices WHERE status = 'paid'", [], |r| r.get(0))
            .unwrap();
        let partial: i64 = conn
            .query_row("SELECT count(*) FROM invoices WHERE status = 'partial'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(paid, 1);
        assert_eq!(partial, 1);
    }
}
