// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use serde::Serialize;
use solcalc_app::{HourlyPoint, QuoteItem, SizingInput, SizingResult, hourly_profile};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const NARRATIVE_PLACEHOLDER: &str = "Not generated";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope<'a> {
    pub timestamp: String,
    pub inputs: &'a SizingInput,
    pub results: &'a SizingResult,
    pub quote: &'a [QuoteItem],
    pub hourly_profile: Vec<HourlyPoint>,
    pub ai_analysis: &'a str,
}

impl<'a> ExportEnvelope<'a> {
    pub fn new(
        input: &'a SizingInput,
        result: &'a SizingResult,
        quote: &'a [QuoteItem],
        narrative: Option<&'a str>,
        generated_at: OffsetDateTime,
    ) -> Result<Self> {
        let timestamp = generated_at
            .format(&Rfc3339)
            .context("format export timestamp")?;
        Ok(Self {
            timestamp,
            inputs: input,
            results: result,
            quote,
            hourly_profile: hourly_profile(input, result),
            ai_analysis: narrative.unwrap_or(NARRATIVE_PLACEHOLDER),
        })
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize export envelope")
    }
}

pub fn render_json_report(
    input: &SizingInput,
    result: &SizingResult,
    quote: &[QuoteItem],
    narrative: Option<&str>,
    generated_at: OffsetDateTime,
) -> Result<String> {
    ExportEnvelope::new(input, result, quote, narrative, generated_at)?.to_pretty_json()
}

pub fn json_file_name(generated_at: OffsetDateTime) -> String {
    format!("solar-calc-report-{}.json", unix_millis(generated_at))
}

pub fn unix_millis(at: OffsetDateTime) -> i128 {
    at.unix_timestamp_nanos() / 1_000_000
}
