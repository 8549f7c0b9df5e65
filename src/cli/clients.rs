use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::models::Client;
use crate::settings::get_data_dir;

#[allow(clippy::too_many_arguments)]
pub fn add(
    name: &str,
    ice: Option<&str>,
    if_number: Option<&str>,
    rc: Option<&str>,
    address: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    conn.execute(
        "INSERT INTO clients (name, ice, if_number, rc, address, email, phone) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![name, ice, if_number, rc, address, email, phone],
    )?;
    println!("Added client: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("fatoura.db"))?;
    let mut stmt = conn.prepare(
        "SELECT id, name, ice, if_number, rc, address, email, phone FROM clients ORDER BY name",
    )?;
    let clients: Vec<Client> = stmt
        .query_map([], |row| {
            Ok(Client {
                id: row.get(0)?,
                name: row.get(1)?,
                ice: row.get(2)?,
                if_number: row.get(3)?,
                rc: row.get(4)?,
                address: row.get(5)?,
                email: row.get(6)?,
                phone: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "ICE", "IF", "RC", "Email"]);
    for client in clients {
        table.add_row(vec![
            Cell::new(client.id),
            Cell::new(client.name),
            Cell::new(client.ice.unwrap_or_default()),
            Cell::new(client.if_number.unwrap_or_default()),
            Cell::new(client.rc.unwrap_or_default()),
            Cell::new(client.email.unwrap_or_default()),
        ]);
    }
    println!("Clients\n{table}");
    Ok(())
}
