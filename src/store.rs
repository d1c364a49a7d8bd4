// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read snapshots for the engine and the upserts that feed them.

use crate::config::EngineConfig;
use crate::engine::financials::ProjectInputs;
use crate::engine::fx::FxSeed;
use crate::errors::{LedgerError, check_allocation, check_fte, check_month, check_year};
use crate::models::{
    DemandLine, FxEntry, FxKind, MonthlyValues, Project, RateCard, RateCardLine, RateUnit,
    RoleRef, SupplyRecord,
};
use crate::utils::parse_date;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationUpdate {
    pub assignment_id: i64,
    pub year: i32,
    pub month: u32,
    pub pct: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastUpdate {
    pub demand_line_id: i64,
    pub year: i32,
    pub month: u32,
    pub fte: Decimal,
}

fn dec(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid {} '{}'", what, s))
}

fn opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
    s.map(|d| parse_date(&d)).transpose()
}

// ---- creators -------------------------------------------------------------

pub fn add_client(conn: &Connection, name: &str) -> Result<i64> {
    conn.execute("INSERT INTO clients(name) VALUES (?1)", params![name.trim()])
        .with_context(|| format!("Add client '{}'", name.trim()))?;
    Ok(conn.last_insert_rowid())
}

pub fn add_role(
    conn: &Connection,
    name: &str,
    category: Option<&str>,
    seniority: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO roles(name, category, seniority) VALUES (?1, ?2, ?3)",
        params![name.trim(), category, seniority],
    )
    .with_context(|| format!("Add role '{}'", name.trim()))?;
    Ok(conn.last_insert_rowid())
}

pub fn add_rate_card(
    conn: &Connection,
    name: &str,
    currency: &str,
    valid_from: NaiveDate,
    valid_to: Option<NaiveDate>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO rate_cards(name, currency, valid_from, valid_to) VALUES (?1, ?2, ?3, ?4)",
        params![
            name.trim(),
            currency,
            valid_from.to_string(),
            valid_to.map(|d| d.to_string())
        ],
    )
    .with_context(|| format!("Add rate card '{}'", name.trim()))?;
    Ok(conn.last_insert_rowid())
}

pub fn set_rate_card_line(
    conn: &Connection,
    rate_card_id: i64,
    role_id: i64,
    price: Decimal,
    unit: RateUnit,
) -> Result<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(anyhow!("Price must not be negative, got {}", price));
    }
    conn.execute(
        "INSERT INTO rate_card_lines(rate_card_id, role_id, price, unit) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(rate_card_id, role_id) DO UPDATE SET price=excluded.price, unit=excluded.unit",
        params![rate_card_id, role_id, price.to_string(), unit.as_str()],
    )?;
    Ok(())
}

pub fn add_project(
    conn: &Connection,
    client_id: i64,
    name: &str,
    currency: &str,
    rate_card_id: Option<i64>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO projects(client_id, name, currency, rate_card_id) VALUES (?1, ?2, ?3, ?4)",
        params![client_id, name.trim(), currency, rate_card_id],
    )
    .with_context(|| format!("Add project '{}'", name.trim()))?;
    Ok(conn.last_insert_rowid())
}

/// Point a project at another rate card. Its live demand lines were priced
/// against the old card, so they are soft-deleted. Returns how many.
pub fn set_project_rate_card(
    conn: &mut Connection,
    project_id: i64,
    rate_card_id: Option<i64>,
) -> Result<usize> {
    let tx = conn.transaction()?;
    let current: Option<Option<i64>> = tx
        .query_row(
            "SELECT rate_card_id FROM projects WHERE id=?1",
            params![project_id],
            |r| r.get(0),
        )
        .optional()?;
    let current =
        current.ok_or_else(|| LedgerError::NotFound(format!("Project {}", project_id)))?;
    if current == rate_card_id {
        return Ok(0);
    }
    tx.execute(
        "UPDATE projects SET rate_card_id=?1 WHERE id=?2",
        params![rate_card_id, project_id],
    )?;
    let removed = tx.execute(
        "UPDATE demand_lines SET deleted_at=datetime('now') WHERE project_id=?1 AND deleted_at IS NULL",
        params![project_id],
    )?;
    tx.commit()?;
    info!(project_id, removed, "rate card changed, demand lines retired");
    Ok(removed)
}

pub fn add_resource(
    conn: &Connection,
    name: &str,
    role_id: i64,
    monthly_cost: Decimal,
    cost_currency: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO resources(name, role_id, monthly_cost, cost_currency) VALUES (?1, ?2, ?3, ?4)",
        params![name.trim(), role_id, monthly_cost.to_string(), cost_currency],
    )
    .with_context(|| format!("Add resource '{}'", name.trim()))?;
    Ok(conn.last_insert_rowid())
}

pub fn add_demand_line(
    conn: &Connection,
    project_id: i64,
    role_id: i64,
    label: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO demand_lines(project_id, role_id, label) VALUES (?1, ?2, ?3)",
        params![project_id, role_id, label],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn soft_delete_demand_line(conn: &Connection, demand_line_id: i64) -> Result<()> {
    let n = conn.execute(
        "UPDATE demand_lines SET deleted_at=datetime('now') WHERE id=?1 AND deleted_at IS NULL",
        params![demand_line_id],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound(format!("Demand line {}", demand_line_id)).into());
    }
    Ok(())
}

pub fn add_assignment(
    conn: &Connection,
    project_id: i64,
    resource_id: i64,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    billable: bool,
) -> Result<i64> {
    if let Some(end) = end_date {
        if end < start_date {
            return Err(anyhow!("Assignment ends ({}) before it starts ({})", end, start_date));
        }
    }
    conn.execute(
        "INSERT INTO assignments(project_id, resource_id, start_date, end_date, billable)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            project_id,
            resource_id,
            start_date.to_string(),
            end_date.map(|d| d.to_string()),
            billable
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ---- batch upserts --------------------------------------------------------

/// Apply every allocation or none of them.
pub fn upsert_allocations(conn: &mut Connection, batch: &[AllocationUpdate]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut exists = tx.prepare_cached("SELECT 1 FROM assignments WHERE id=?1")?;
        let mut upsert = tx.prepare_cached(
            "INSERT INTO assignment_allocations(assignment_id, year, month, pct) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(assignment_id, year, month) DO UPDATE SET pct=excluded.pct",
        )?;
        for u in batch {
            check_year(u.year)?;
            check_allocation(u.month, u.pct)?;
            let found: Option<i32> = exists
                .query_row(params![u.assignment_id], |r| r.get(0))
                .optional()?;
            if found.is_none() {
                return Err(LedgerError::NotFound(format!("Assignment {}", u.assignment_id)).into());
            }
            upsert.execute(params![
                u.assignment_id,
                u.year,
                u.month,
                u.pct.normalize().to_string()
            ])?;
        }
    }
    tx.commit()?;
    info!(rows = batch.len(), "allocations upserted");
    Ok(batch.len())
}

/// Apply every forecast cell or none of them.
pub fn upsert_forecast(conn: &mut Connection, batch: &[ForecastUpdate]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut live = tx
            .prepare_cached("SELECT 1 FROM demand_lines WHERE id=?1 AND deleted_at IS NULL")?;
        let mut upsert = tx.prepare_cached(
            "INSERT INTO demand_forecasts(demand_line_id, year, month, fte) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(demand_line_id, year, month) DO UPDATE SET fte=excluded.fte",
        )?;
        for u in batch {
            check_year(u.year)?;
            check_fte(u.month, u.fte)?;
            let found: Option<i32> = live
                .query_row(params![u.demand_line_id], |r| r.get(0))
                .optional()?;
            if found.is_none() {
                return Err(
                    LedgerError::NotFound(format!("Demand line {}", u.demand_line_id)).into(),
                );
            }
            upsert.execute(params![
                u.demand_line_id,
                u.year,
                u.month,
                u.fte.normalize().to_string()
            ])?;
        }
    }
    tx.commit()?;
    info!(rows = batch.len(), "forecast upserted");
    Ok(batch.len())
}

pub fn upsert_fx_entry(
    conn: &Connection,
    year: i32,
    month: u32,
    kind: FxKind,
    rate: Decimal,
) -> Result<()> {
    check_year(year)?;
    check_month(month)?;
    if rate <= Decimal::ZERO {
        return Err(anyhow!("FX rate must be positive, got {}", rate));
    }
    conn.execute(
        "INSERT INTO fx_rates(year, month, kind, rate) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(year, month, kind) DO UPDATE SET rate=excluded.rate",
        params![year, month, kind.as_str(), rate.to_string()],
    )?;
    Ok(())
}

// ---- read snapshots -------------------------------------------------------

fn project_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: r.get(0)?,
        client_id: r.get(1)?,
        name: r.get(2)?,
        currency: r.get(3)?,
        rate_card_id: r.get(4)?,
    })
}

pub fn get_project(conn: &Connection, project_id: i64) -> Result<Project> {
    conn.query_row(
        "SELECT id, client_id, name, currency, rate_card_id FROM projects WHERE id=?1",
        params![project_id],
        project_from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::NotFound(format!("Project {}", project_id)).into())
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, client_id, name, currency, rate_card_id FROM projects ORDER BY name",
    )?;
    let rows = stmt.query_map([], project_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Live demand lines of a project with their forecast for `year`,
/// ordered by creation time then id.
pub fn get_demand_lines(conn: &Connection, project_id: i64, year: i32) -> Result<Vec<DemandLine>> {
    let mut stmt = conn.prepare_cached(
        "SELECT d.id, d.project_id, r.id, r.name, r.category, r.seniority, d.label, d.created_at
         FROM demand_lines d JOIN roles r ON d.role_id=r.id
         WHERE d.project_id=?1 AND d.deleted_at IS NULL
         ORDER BY d.created_at, d.id",
    )?;
    let rows = stmt.query_map(params![project_id], |r| {
        Ok(DemandLine {
            id: r.get(0)?,
            project_id: r.get(1)?,
            role: RoleRef {
                id: r.get(2)?,
                name: r.get(3)?,
                category: r.get(4)?,
                seniority: r.get(5)?,
            },
            label: r.get(6)?,
            created_at: r.get(7)?,
            monthly_forecast: MonthlyValues::new(),
        })
    })?;
    let mut lines = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();
    for row in rows {
        let line = row?;
        index.insert(line.id, lines.len());
        lines.push(line);
    }

    let mut fstmt = conn.prepare_cached(
        "SELECT f.demand_line_id, f.month, f.fte FROM demand_forecasts f
         JOIN demand_lines d ON f.demand_line_id=d.id
         WHERE d.project_id=?1 AND d.deleted_at IS NULL AND f.year=?2",
    )?;
    let mut cur = fstmt.query(params![project_id, year])?;
    while let Some(r) = cur.next()? {
        let line_id: i64 = r.get(0)?;
        let month: u32 = r.get(1)?;
        let fte: String = r.get(2)?;
        if let Some(i) = index.get(&line_id) {
            lines[*i]
                .monthly_forecast
                .insert(month, dec(&fte, "forecast FTE")?);
        }
    }
    Ok(lines)
}

/// Assignments of a project whose date range intersects `year`, with their
/// allocation percentages for that year.
pub fn get_active_supply(conn: &Connection, project_id: i64, year: i32) -> Result<Vec<SupplyRecord>> {
    let year_start = format!("{:04}-01-01", year);
    let year_end = format!("{:04}-12-31", year);
    let mut stmt = conn.prepare_cached(
        "SELECT a.id, res.id, res.name, ro.id, ro.name, a.start_date, a.end_date, a.billable,
                res.monthly_cost, res.cost_currency
         FROM assignments a
         JOIN resources res ON a.resource_id=res.id
         JOIN roles ro ON res.role_id=ro.id
         WHERE a.project_id=?1 AND a.start_date<=?2 AND (a.end_date IS NULL OR a.end_date>=?3)
         ORDER BY a.id",
    )?;
    let rows = stmt.query_map(params![project_id, year_end, year_start], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, i64>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, i64>(3)?,
            r.get::<_, String>(4)?,
            r.get::<_, String>(5)?,
            r.get::<_, Option<String>>(6)?,
            r.get::<_, bool>(7)?,
            r.get::<_, String>(8)?,
            r.get::<_, String>(9)?,
        ))
    })?;
    let mut supply = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();
    for row in rows {
        let (id, resource_id, resource_name, role_id, role_name, start, end, billable, cost, ccy) =
            row?;
        index.insert(id, supply.len());
        supply.push(SupplyRecord {
            id,
            resource_id,
            resource_name,
            role_id,
            role_name,
            start_date: parse_date(&start)?,
            end_date: opt_date(end)?,
            billable,
            monthly_cost: dec(&cost, "monthly cost")?,
            cost_currency: ccy,
            monthly_allocation_pct: MonthlyValues::new(),
        });
    }

    let mut astmt = conn.prepare_cached(
        "SELECT al.assignment_id, al.month, al.pct FROM assignment_allocations al
         JOIN assignments a ON al.assignment_id=a.id
         WHERE a.project_id=?1 AND al.year=?2",
    )?;
    let mut cur = astmt.query(params![project_id, year])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let month: u32 = r.get(1)?;
        let pct: String = r.get(2)?;
        if let Some(i) = index.get(&id) {
            supply[*i]
                .monthly_allocation_pct
                .insert(month, dec(&pct, "allocation %")?);
        }
    }
    Ok(supply)
}

pub fn get_rate_card(conn: &Connection, rate_card_id: i64) -> Result<RateCard> {
    let head: Option<(i64, String, String, String, Option<String>)> = conn
        .query_row(
            "SELECT id, name, currency, valid_from, valid_to FROM rate_cards WHERE id=?1",
            params![rate_card_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .optional()?;
    let (id, name, currency, valid_from, valid_to) =
        head.ok_or_else(|| LedgerError::NotFound(format!("Rate card {}", rate_card_id)))?;

    let mut stmt = conn.prepare_cached(
        "SELECT l.role_id, r.name, l.price, l.unit FROM rate_card_lines l
         JOIN roles r ON l.role_id=r.id
         WHERE l.rate_card_id=?1 ORDER BY r.name",
    )?;
    let rows = stmt.query_map(params![rate_card_id], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
        ))
    })?;
    let mut lines = Vec::new();
    for row in rows {
        let (role_id, role_name, price, unit) = row?;
        let unit = RateUnit::parse(&unit).ok_or_else(|| anyhow!("Invalid rate unit '{}'", unit))?;
        lines.push(RateCardLine {
            role_id,
            role_name,
            price: dec(&price, "price")?,
            unit,
        });
    }
    Ok(RateCard {
        id,
        name,
        currency,
        valid_from: parse_date(&valid_from)?,
        valid_to: opt_date(valid_to)?,
        lines,
    })
}

fn fx_from_row(r: &rusqlite::Row<'_>) -> Result<FxEntry> {
    let kind: String = r.get(2)?;
    let rate: String = r.get(3)?;
    Ok(FxEntry {
        year: r.get(0)?,
        month: r.get(1)?,
        kind: FxKind::parse(&kind).ok_or_else(|| anyhow!("Invalid FX kind '{}'", kind))?,
        rate: dec(&rate, "FX rate")?,
    })
}

pub fn get_fx_entries(conn: &Connection, year: i32) -> Result<Vec<FxEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT year, month, kind, rate FROM fx_rates WHERE year=?1 ORDER BY month, kind",
    )?;
    let mut cur = stmt.query(params![year])?;
    let mut out = Vec::new();
    while let Some(r) = cur.next()? {
        out.push(fx_from_row(r)?);
    }
    Ok(out)
}

/// Latest entry strictly before `year`: last month of the most recent year,
/// ACTUAL preferred over PLANNED.
pub fn latest_fx_before(conn: &Connection, year: i32) -> Result<Option<FxEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT year, month, kind, rate FROM fx_rates WHERE year<?1
         ORDER BY year DESC, month DESC, CASE kind WHEN 'ACTUAL' THEN 0 ELSE 1 END
         LIMIT 1",
    )?;
    let mut cur = stmt.query(params![year])?;
    match cur.next()? {
        Some(r) => Ok(Some(fx_from_row(r)?)),
        None => Ok(None),
    }
}

/// Seed for the resolver: the prior-year entry, else the configured default.
pub fn fx_seed(conn: &Connection, year: i32, cfg: &EngineConfig) -> Result<Option<FxSeed>> {
    Ok(latest_fx_before(conn, year)?
        .map(|e| FxSeed::from_entry(&e))
        .or_else(|| cfg.default_fx_rate.map(FxSeed::default_rate)))
}

/// Everything `project_financials` needs for one project-year.
pub fn load_project_inputs(
    conn: &Connection,
    project_id: i64,
    year: i32,
    cfg: &EngineConfig,
) -> Result<ProjectInputs> {
    let project = get_project(conn, project_id)?;
    let rate_card = match project.rate_card_id {
        Some(id) => Some(get_rate_card(conn, id)?),
        None => None,
    };
    Ok(ProjectInputs {
        demand_lines: get_demand_lines(conn, project_id, year)?,
        supply: get_active_supply(conn, project_id, year)?,
        rate_card,
        fx_entries: get_fx_entries(conn, year)?,
        fx_seed: fx_seed(conn, year, cfg)?,
        project,
        year,
    })
}
