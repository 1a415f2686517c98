// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use solcalc_app::{calculate, generate_quote};
use solcalc_report::{
    LINES_PER_PAGE, ProposalReport, json_file_name, proposal_file_name, render_json_report,
    write_export,
};
use solcalc_testkit::{LoadFaker, bill_input, temp_export_dir};
use std::fs;
use time::macros::datetime;

#[test]
fn exports_land_in_directory_with_expected_names() -> Result<()> {
    let (_guard, export_dir) = temp_export_dir()?;
    let at = datetime!(2026-02-19 12:34:56 UTC);
    let input = bill_input();
    let result = calculate(&input)?;
    let quote = generate_quote(&input, &result);

    let json = render_json_report(&input, &result, &quote, None, at)?;
    let json_path = write_export(&export_dir, &json_file_name(at), &json)?;
    assert!(json_path.ends_with("solar-calc-report-1771504496000.json"));

    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path)?)?;
    assert_eq!(parsed["aiAnalysis"], "Not generated");

    let report = ProposalReport::build(&input, &result, &quote, None, at.date());
    let report_path = write_export(&export_dir, &proposal_file_name(&input, at), &report.render())?;
    let text = fs::read_to_string(report_path)?;
    assert!(text.contains("4. Economic Offer"));
    Ok(())
}

#[test]
fn generated_proposals_paginate_cleanly() -> Result<()> {
    for seed in 0_u64..60_u64 {
        let mut faker = LoadFaker::new(seed);
        let input = faker.sizing_input();
        let result = calculate(&input)?;
        let quote = generate_quote(&input, &result);
        let report = ProposalReport::build(
            &input,
            &result,
            &quote,
            Some("## Summary\n**Feasible** with the proposed array."),
            datetime!(2026-02-19 00:00 UTC).date(),
        );

        assert!(report.page_count() >= 2, "seed {seed}");
        for page in report.pages() {
            assert!(page.len() <= LINES_PER_PAGE, "seed {seed}");
        }
        let rendered = report.render();
        let footer = format!("Page {0}/{0}", report.page_count());
        assert!(rendered.contains(&footer), "seed {seed}");
        assert!(rendered.contains(&input.customer.name), "seed {seed}");
    }
    Ok(())
}

#[test]
fn customer_names_with_slashes_still_export() -> Result<()> {
    let (_guard, export_dir) = temp_export_dir()?;
    let at = datetime!(2026-02-19 12:34:56 UTC);
    let mut input = bill_input();
    input.customer.name = "Finca El Sol S.A.S / Sede 2".to_owned();
    let result = calculate(&input)?;

    let report = ProposalReport::build(&input, &result, &[], None, at.date());
    let path = write_export(&export_dir, &proposal_file_name(&input, at), &report.render())?;
    assert_eq!(path.parent(), Some(export_dir.as_path()));
    assert!(fs::read_to_string(path)?.contains("Finca El Sol S.A.S / Sede 2"));
    Ok(())
}
