// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::{Path, PathBuf};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Staffledger", "staffledger"));

pub const DB_ENV: &str = "STAFFLEDGER_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(DB_ENV) {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p.trim()));
        }
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("staffledger.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    open_at(&path)
}

pub fn open_at(path: &Path) -> Result<Connection> {
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Extra reader on an existing database; the schema is left untouched.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Open DB read-only at {}", path.display()))
}

pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS clients(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS roles(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        category TEXT,
        seniority TEXT
    );

    CREATE TABLE IF NOT EXISTS rate_cards(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        currency TEXT NOT NULL,
        valid_from TEXT NOT NULL,
        valid_to TEXT
    );

    CREATE TABLE IF NOT EXISTS rate_card_lines(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        rate_card_id INTEGER NOT NULL,
        role_id INTEGER NOT NULL,
        price TEXT NOT NULL,
        unit TEXT NOT NULL CHECK(unit IN ('hour','month')),
        UNIQUE(rate_card_id, role_id),
        FOREIGN KEY(rate_card_id) REFERENCES rate_cards(id) ON DELETE CASCADE,
        FOREIGN KEY(role_id) REFERENCES roles(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS projects(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_id INTEGER NOT NULL,
        name TEXT NOT NULL UNIQUE,
        currency TEXT NOT NULL,
        rate_card_id INTEGER,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(client_id) REFERENCES clients(id) ON DELETE CASCADE,
        FOREIGN KEY(rate_card_id) REFERENCES rate_cards(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS resources(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        role_id INTEGER NOT NULL,
        monthly_cost TEXT NOT NULL DEFAULT '0',
        cost_currency TEXT NOT NULL,
        FOREIGN KEY(role_id) REFERENCES roles(id)
    );

    -- demand: planned FTE per role line; soft-deleted via deleted_at
    CREATE TABLE IF NOT EXISTS demand_lines(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL,
        role_id INTEGER NOT NULL,
        label TEXT,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f','now')),
        deleted_at TEXT,
        FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE,
        FOREIGN KEY(role_id) REFERENCES roles(id)
    );
    CREATE INDEX IF NOT EXISTS idx_demand_lines_project ON demand_lines(project_id);

    CREATE TABLE IF NOT EXISTS demand_forecasts(
        demand_line_id INTEGER NOT NULL,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        fte TEXT NOT NULL,
        PRIMARY KEY(demand_line_id, year, month),
        FOREIGN KEY(demand_line_id) REFERENCES demand_lines(id) ON DELETE CASCADE
    );

    -- supply: a resource allocated to a project over a date range
    CREATE TABLE IF NOT EXISTS assignments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL,
        resource_id INTEGER NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT,
        billable INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(project_id) REFERENCES projects(id) ON DELETE CASCADE,
        FOREIGN KEY(resource_id) REFERENCES resources(id) ON DELETE CASCADE
    );
    CREATE INDEX IF NOT EXISTS idx_assignments_project ON assignments(project_id);

    CREATE TABLE IF NOT EXISTS assignment_allocations(
        assignment_id INTEGER NOT NULL,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        pct TEXT NOT NULL,
        PRIMARY KEY(assignment_id, year, month),
        FOREIGN KEY(assignment_id) REFERENCES assignments(id) ON DELETE CASCADE
    );

    -- FX: 1 base = rate quote for the configured pair, per month and kind
    CREATE TABLE IF NOT EXISTS fx_rates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        year INTEGER NOT NULL,
        month INTEGER NOT NULL CHECK(month BETWEEN 1 AND 12),
        kind TEXT NOT NULL CHECK(kind IN ('ACTUAL','PLANNED')),
        rate TEXT NOT NULL,
        UNIQUE(year, month, kind)
    );
    "#,
    )?;
    Ok(())
}
