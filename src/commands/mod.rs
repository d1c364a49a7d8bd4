// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod clients;
pub mod roles;
pub mod ratecards;
pub mod projects;
pub mod resources;
pub mod plan;
pub mod assign;
pub mod fx;
pub mod reports;
pub mod importer;
pub mod exporter;
pub mod doctor;
pub mod settings;

use crate::utils::{id_for_project, parse_year};
use anyhow::Result;
use rusqlite::Connection;

/// Resolve the `--project` / `--year` pair most reports take.
pub(crate) fn project_and_year(conn: &Connection, sub: &clap::ArgMatches) -> Result<(i64, i32)> {
    let project = sub.get_one::<String>("project").unwrap();
    let year = parse_year(sub.get_one::<String>("year").unwrap())?;
    Ok((id_for_project(conn, project)?, year))
}
