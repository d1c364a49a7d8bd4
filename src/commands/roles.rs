// Copyright (c) AlphaVelocity.
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
            let category = sub.get_one::<String>("category").map(|s| s.trim());
            let seniority = sub.get_one::<String>("seniority").map(|s| s.trim());
            store::add_role(conn, name, category, seniority)?;
            println!("Added role '{}'", name);
        }
        Some(("list", _)) => {
            let mut stmt =
                conn.prepare("SELECT name, category, seniority FROM roles ORDER BY name")?;
            let rows = stmt.query_map([], |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, Option<String>>(1)?,
                    r.get::<_, Option<String>>(2)?,
                ))
            })?;
            let mut data = Vec::new();
            for row in rows {
                let (n, c, s) = row?;
                data.push(vec![n, c.unwrap_or_default(), s.unwrap_or_default()]);
            }
            println!("{}", pretty_table(&["Role", "Category", "Seniority"], data));
        }
        _ => {}
    }
    Ok(())
}
