use std::path::PathBuf;

use crate::db::{get_connection, init_db, set_metadata};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, company: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }

    let dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&dir)?;

    let db_path = dir.join("fatoura.db");
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    if let Some(name) = company {
        set_metadata(&conn, "company_name", &name)?;
        settings.company_name = name;
    }
    save_settings(&settings)?;

    println!("Initialized database at {}", db_path.display());
    println!();
    println!("Try these next:");
    println!("  fatoura clients add 'Maroc Telecom' --ice 001234567000089");
    println!("  fatoura invoices create --client 'Maroc Telecom' --amount 10000 --vat 20");
    println!("  fatoura demo");
    Ok(())
}
