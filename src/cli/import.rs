use std::path::PathBuf;

use crate::db::get_connection;
use crate::error::Result;
use crate::importer::import_file;
use crate::settings::get_data_dir;

pub fn run(file: &str, account: &str, format: Option<&str>) -> Result<()> {
    let file_path = PathBuf::from(file);
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;

    let result = import_file(&conn, &file_path, account, format)?;

    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    println!("{} imported, {} skipped (duplicates)", result.imported, result.skipped);
    println!("Run `fatoura reconcile auto` to match them against open invoices.");
    Ok(())
}
