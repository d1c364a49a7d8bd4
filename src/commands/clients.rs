// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap().trim();
            store::add_client(conn, name)?;
            println!("Added client '{}'", name);
        }
        Some(("list", _)) => {
            let mut stmt = conn.prepare(
                "SELECT c.name, COUNT(p.id), c.created_at FROM clients c
                 LEFT JOIN projects p ON p.client_id=c.id
                 GROUP BY c.id ORDER BY c.name",
            )?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, p, cr) = row?;
                data.push(vec![n, p.to_string(), cr]);
            }
            println!("{}", pretty_table(&["Name", "Projects", "Created"], data));
        }
        _ => {}
    }
    Ok(())
}
