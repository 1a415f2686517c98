// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use solcalc_app::{CalculationMode, SizingInput, SizingResult, format_decimal};
use std::fmt::Write as _;
use tracing::{info, warn};

use crate::{Client, Message};

pub const EMPTY_NARRATIVE: &str = "Could not generate the detailed report.";
pub const NARRATIVE_FAILURE: &str =
    "An error occurred while contacting the AI assistant. Please check your connection or API key.";

const SYSTEM_PROMPT: &str = "You are a senior renewable-energy engineer. Write concise, \
professional and educational technical reports in Markdown.";

pub fn build_report_prompt(
    input: &SizingInput,
    result: &SizingResult,
    extra_context: Option<&str>,
) -> String {
    let panel = &input.selected_panel;
    let voltage = format_decimal(input.battery_voltage);
    let inverter = &result.inverter;
    let mut out = String::new();

    out.push_str(
        "Write a concise technical report with recommendations for the following \
photovoltaic system.\n",
    );

    out.push_str("\n## Input data\n\n");
    let _ = writeln!(out, "- Calculation mode: {}", input.calculation_mode.label());
    let _ = writeln!(
        out,
        "- Estimated daily consumption: {:.2} kWh",
        result.daily_consumption_wh / 1000.0
    );
    let _ = writeln!(
        out,
        "- Peak sun hours (HSP): {} h",
        format_decimal(input.peak_sun_hours)
    );
    let _ = writeln!(
        out,
        "- Selected panel: {} {} ({}W)",
        panel.brand, panel.model, panel.rated_power_w
    );
    let _ = writeln!(out, "- System voltage: {voltage} V");
    let _ = writeln!(
        out,
        "- Autonomy: {} days",
        format_decimal(input.autonomy_days)
    );

    if input.calculation_mode == CalculationMode::LoadAnalysis && !input.appliances.is_empty() {
        out.push_str("\n## Detailed load list\n\n");
        for appliance in &input.appliances {
            let _ = writeln!(
                out,
                "- {}x {} ({}W, {}h/day)",
                appliance.quantity,
                appliance.name,
                format_decimal(appliance.power_w),
                format_decimal(appliance.hours_per_day)
            );
        }
        out.push_str(
            "\nCheck whether any inductive loads (motors, pumps, refrigerators) need \
special start-up peak handling from the inverter.\n",
        );
    }

    out.push_str("\n## Calculated results\n\n");
    let _ = writeln!(
        out,
        "- PV array: {} panels of {}W (total {} Wp)",
        result.number_of_panels,
        panel.rated_power_w,
        u64::from(result.number_of_panels) * u64::from(panel.rated_power_w)
    );
    let _ = writeln!(
        out,
        "- Recommended inverter: {}W ({})",
        inverter.suggested_size_w, inverter.type_label
    );
    let _ = writeln!(
        out,
        "- Battery bank: {} Ah at {voltage}V",
        result.battery_capacity_ah.round()
    );
    let _ = writeln!(
        out,
        "- Estimated peak demand: {} W",
        format_decimal(result.max_power_demand_w.round())
    );

    out.push_str("\n## Report structure (Markdown)\n\n");
    out.push_str(
        "1. **Feasibility analysis**: judge whether the system is balanced; comment on the \
inverter if inductive loads were listed.\n",
    );
    let _ = writeln!(
        out,
        "2. **Inverter specification**: explain why a {}W {} inverter is suggested and \
whether the suggested {}A DC breaker is adequate.",
        inverter.suggested_size_w, inverter.type_label, inverter.suggested_breaker_amps
    );
    let _ = writeln!(
        out,
        "3. **Solar panel and efficiency**: briefly comment on the quality of the selected \
{} panel.",
        panel.brand
    );
    out.push_str("4. **Battery bank**: comment on the real autonomy to expect.\n");
    out.push_str(
        "5. **Installation recommendations**: orientation, tilt and wiring tips (mention \
heavy-gauge AWG cable for the batteries).\n",
    );
    out.push_str("\nKeep a professional, technical but educational tone.\n");

    if let Some(context) = extra_context
        && !context.trim().is_empty()
    {
        out.push_str("\n## Additional context\n\n");
        out.push_str(context.trim());
        out.push('\n');
    }
    out
}

/// Requests the narrative; failures become user-facing fallback text, never errors.
pub fn generate_narrative(
    client: &Client,
    input: &SizingInput,
    result: &SizingResult,
    extra_context: Option<&str>,
) -> String {
    let messages = [
        Message::system(SYSTEM_PROMPT),
        Message::user(build_report_prompt(input, result, extra_context)),
    ];
    match client
        .chat_stream(&messages)
        .and_then(|stream| stream.collect_text())
    {
        Ok(text) if text.trim().is_empty() => {
            warn!(model = client.model(), "narrative response was empty");
            EMPTY_NARRATIVE.to_owned()
        }
        Ok(text) => {
            info!(model = client.model(), chars = text.len(), "narrative generated");
            text.trim().to_owned()
        }
        Err(error) => {
            warn!(model = client.model(), error = %format!("{error:#}"), "narrative request failed");
            NARRATIVE_FAILURE.to_owned()
        }
    }
}
