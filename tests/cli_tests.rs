// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use staffledger::commands::{doctor, exporter, importer, reports};
use staffledger::models::RateUnit;
use staffledger::{cli, db, store};
use std::io::Write;
use tempfile::{NamedTempFile, tempdir};

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn jan1() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

// Apollo: demand line 1 (Dev), assignment 1 (Ana, Dev) and assignment 2 (Bo, QA, no rate).
fn setup() -> Connection {
    let conn = db::open_in_memory().unwrap();
    let client = store::add_client(&conn, "Acme").unwrap();
    let dev = store::add_role(&conn, "Dev", None, None).unwrap();
    let qa = store::add_role(&conn, "QA", None, None).unwrap();
    let card = store::add_rate_card(&conn, "Std", "USD", jan1(), None).unwrap();
    store::set_rate_card_line(&conn, card, dev, d("5000"), RateUnit::Month).unwrap();
    let project = store::add_project(&conn, client, "Apollo", "USD", Some(card)).unwrap();
    let ana = store::add_resource(&conn, "Ana", dev, d("3000"), "USD").unwrap();
    let bo = store::add_resource(&conn, "Bo", qa, d("2500"), "USD").unwrap();
    store::add_demand_line(&conn, project, dev, None).unwrap();
    store::add_assignment(&conn, project, ana, jan1(), None, true).unwrap();
    store::add_assignment(&conn, project, bo, jan1(), None, true).unwrap();
    conn
}

fn csv_file(body: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

#[test]
fn import_applies_whole_file() {
    let mut conn = setup();
    let forecast = csv_file("demand_line_id,year,month,fte\n1,2025,1,2\n1,2025,2, 1.5 \n");
    let n = importer::import_forecast(&mut conn, forecast.path()).unwrap();
    assert_eq!(n, 2);

    let allocations = csv_file("assignment_id,year,month,pct\n1,2025,1,100\n2,2025,1,50\n");
    importer::import_allocations(&mut conn, allocations.path()).unwrap();

    let lines = store::get_demand_lines(&conn, 1, 2025).unwrap();
    assert_eq!(lines[0].monthly_forecast.get(&2), Some(&d("1.5")));
    let supply = store::get_active_supply(&conn, 1, 2025).unwrap();
    assert_eq!(supply[1].allocation_pct(1), d("50"));
}

#[test]
fn import_with_a_bad_line_changes_nothing() {
    let mut conn = setup();
    let bad = csv_file("assignment_id,year,month,pct\n1,2025,3,100\n2,2025,13,50\n");
    assert!(importer::import_allocations(&mut conn, bad.path()).is_err());

    let unparsable = csv_file("assignment_id,year,month,pct\n1,2025,3,100\n2,2025,4,lots\n");
    let err = importer::import_allocations(&mut conn, unparsable.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("line 3"), "{:#}", err);

    let supply = store::get_active_supply(&conn, 1, 2025).unwrap();
    assert!(supply.iter().all(|s| s.allocation_pct(3).is_zero()));
}

#[test]
fn export_coverage_csv() {
    let mut conn = setup();
    let forecast = csv_file("demand_line_id,year,month,fte\n1,2025,1,2\n");
    importer::import_forecast(&mut conn, forecast.path()).unwrap();
    let allocations = csv_file("assignment_id,year,month,pct\n1,2025,1,100\n2,2025,1,50\n");
    importer::import_allocations(&mut conn, allocations.path()).unwrap();

    let dir = tempdir().unwrap();
    let out = dir.path().join("coverage.csv");
    let out_str = out.to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from([
        "staffledger",
        "export",
        "coverage",
        "--project",
        "Apollo",
        "--year",
        "2025",
        "--out",
        out_str.as_str(),
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    exporter::handle(&conn, sub).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "project,year,month,line,role,label,demand_fte,assigned_fte,ratio,status"
    );
    assert_eq!(
        lines.next().unwrap(),
        "Apollo,2025,1,1,Dev,,2.00,1.50,0.75,PARCIAL"
    );
    assert_eq!(text.lines().count(), 13);
}

#[test]
fn report_commands_run_against_the_store() {
    let conn = setup();
    for args in [
        vec!["staffledger", "coverage", "--project", "Apollo", "--year", "2025", "--json"],
        vec!["staffledger", "revenue", "--project", "Apollo", "--year", "2025", "--base", "hours"],
        vec!["staffledger", "summary", "--project", "Apollo", "--year", "2025", "--jsonl"],
        vec!["staffledger", "portfolio", "--year", "2025"],
    ] {
        let matches = cli::build_cli().get_matches_from(args.clone());
        let res = match matches.subcommand() {
            Some(("coverage", sub)) => reports::coverage(&conn, sub),
            Some(("revenue", sub)) => reports::revenue(&conn, sub),
            Some(("summary", sub)) => reports::summary(&conn, sub),
            Some(("portfolio", sub)) => reports::portfolio(&conn, sub),
            _ => panic!("unexpected {:?}", args),
        };
        res.unwrap();
    }

    let matches = cli::build_cli().get_matches_from([
        "staffledger", "coverage", "--project", "Nope", "--year", "2025",
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    assert!(reports::coverage(&conn, sub).is_err());
}

#[test]
fn cli_rejects_unknown_choices() {
    let res = cli::build_cli().try_get_matches_from([
        "staffledger", "revenue", "--project", "Apollo", "--year", "2025", "--base", "weekly",
    ]);
    assert!(res.is_err());
    let res = cli::build_cli().try_get_matches_from([
        "staffledger", "plan", "set", "--line", "x", "--month", "2025-01", "--fte", "1",
    ]);
    assert!(res.is_err());
}

#[test]
fn doctor_lists_gaps() {
    let mut conn = setup();
    let allocations = csv_file("assignment_id,year,month,pct\n1,2025,1,100\n2,2025,1,50\n");
    importer::import_allocations(&mut conn, allocations.path()).unwrap();
    // Ana is also fully booked on a second project in January
    let client = staffledger::utils::id_for_client(&conn, "Acme").unwrap();
    let other = store::add_project(&conn, client, "Borealis", "USD", None).unwrap();
    let ana = staffledger::utils::id_for_resource(&conn, "Ana").unwrap();
    let a = store::add_assignment(&conn, other, ana, jan1(), None, true).unwrap();
    store::upsert_allocations(
        &mut conn,
        &[store::AllocationUpdate {
            assignment_id: a,
            year: 2025,
            month: 1,
            pct: d("60"),
        }],
    )
    .unwrap();

    let findings = doctor::diagnose(&conn, 2025).unwrap();
    let issues: Vec<(&str, &str)> = findings
        .iter()
        .map(|f| (f.issue.as_str(), f.detail.as_str()))
        .collect();
    assert!(issues.contains(&("missing_rate", "Apollo: QA on 'Std'")), "{:?}", issues);
    assert!(issues.contains(&("no_rate_card", "Borealis")));
    assert!(issues.contains(&("over_allocated", "Ana 2025-01: 160%")));
    assert!(issues.iter().any(|(i, _)| *i == "missing_fx"));
}
