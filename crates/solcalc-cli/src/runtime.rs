// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use solcalc_app::{
    CalculationMode, Catalog, FormCommand, ProposalState, SizingResult, format_decimal,
    load_summary,
};
use solcalc_llm::{Client, generate_narrative};
use solcalc_report::{
    ProposalReport, format_cop, format_count, json_file_name, proposal_file_name,
    render_json_report, write_export,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::info;

use crate::config::Config;
use crate::project::ProjectFile;

/// Config defaults first, then the input file, then one calculation and the quote edits.
pub fn build_state(config: &Config, project: Option<&ProjectFile>) -> Result<ProposalState> {
    let mut state = ProposalState::new(Catalog::builtin(), config.quote_generator());
    if let Some(city) = config.default_city() {
        state.dispatch(FormCommand::SelectCity(city.to_owned()))?;
    }
    if let Some(panel) = config.default_panel() {
        state.dispatch(FormCommand::SelectPanel(panel.to_owned()))?;
    }
    if let Some(project) = project {
        project.apply(&mut state)?;
    }
    state.dispatch(FormCommand::Calculate)?;
    if let Some(project) = project {
        project.apply_quote_edits(&mut state)?;
    }
    Ok(state)
}

pub struct ProposalRuntime {
    state: ProposalState,
    export_dir: PathBuf,
    llm_client: Option<Client>,
    extra_context: String,
}

impl ProposalRuntime {
    pub fn new(state: ProposalState, export_dir: PathBuf) -> Self {
        Self {
            state,
            export_dir,
            llm_client: None,
            extra_context: String::new(),
        }
    }

    pub fn with_llm_client(mut self, client: Option<Client>, extra_context: &str) -> Self {
        self.llm_client = client;
        self.extra_context = extra_context.to_owned();
        self
    }

    pub fn state(&self) -> &ProposalState {
        &self.state
    }

    fn result(&self) -> Result<&SizingResult> {
        self.state
            .result()
            .ok_or_else(|| anyhow!("no calculation yet -- fix the input and retry"))
    }

    /// Stores the narrative (or its fallback text); false when no client is configured.
    pub fn request_narrative(&mut self) -> Result<bool> {
        let Some(client) = &self.llm_client else {
            return Ok(false);
        };
        let result = self.result()?;
        let extra = Some(self.extra_context.as_str()).filter(|text| !text.trim().is_empty());
        let text = generate_narrative(client, self.state.input(), result, extra);
        self.state.set_narrative(text);
        Ok(true)
    }

    pub fn summary(&self) -> Result<String> {
        let input = self.state.input();
        let result = self.result()?;
        let panel = &input.selected_panel;
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{} ({} h peak sun)",
            input.city_name,
            format_decimal(input.peak_sun_hours)
        );
        let _ = writeln!(out, "Mode:               {}", input.calculation_mode.label());
        if input.calculation_mode == CalculationMode::LoadAnalysis {
            let loads = load_summary(&input.appliances);
            let _ = writeln!(
                out,
                "Loads:              {} appliances, {} W connected, {} Wh/day",
                input.appliances.len(),
                format_count(loads.connected_power_w),
                format_count(loads.daily_energy_wh)
            );
        }
        let _ = writeln!(
            out,
            "Daily consumption:  {:.2} kWh",
            result.daily_consumption_wh / 1000.0
        );
        let _ = writeln!(
            out,
            "Peak demand:        {} W",
            format_count(result.max_power_demand_w)
        );
        let _ = writeln!(
            out,
            "PV array:           {} x {} = {:.2} kWp",
            result.number_of_panels,
            panel.display_name(),
            result.installed_power_kwp(panel)
        );
        let _ = writeln!(
            out,
            "Generation:         {:.2} kWh/day",
            result.estimated_generation_daily_wh / 1000.0
        );
        let _ = writeln!(
            out,
            "Inverter:           {} W {} ({} A DC breaker)",
            result.inverter.suggested_size_w,
            result.inverter.type_label,
            result.inverter.suggested_breaker_amps
        );
        let _ = writeln!(
            out,
            "Battery bank:       {} Ah at {} V ({:.2} kWh)",
            result.battery_capacity_ah.round(),
            format_decimal(input.battery_voltage),
            result.storage_kwh(input.battery_voltage)
        );

        let quote = self.state.quote();
        if !quote.is_empty() {
            out.push_str("\nQuote\n");
            for (category, items) in quote.by_category() {
                let _ = writeln!(out, "  {}", category.label());
                for item in items {
                    let _ = writeln!(
                        out,
                        "    {:>3} x {:<42} {:>14}",
                        item.quantity,
                        item.name,
                        format_cop(item.subtotal())
                    );
                }
            }
            let _ = writeln!(out, "  Total: {}", format_cop(quote.total()));
        }

        if let Some(narrative) = self.state.narrative() {
            out.push_str("\nTechnical analysis\n");
            out.push_str(narrative);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn export_json(&self, target: Option<&Path>, generated_at: OffsetDateTime) -> Result<PathBuf> {
        let result = self.result()?;
        let contents = render_json_report(
            self.state.input(),
            result,
            self.state.quote_items(),
            self.state.narrative(),
            generated_at,
        )?;
        let (dir, name) = resolve_target(&self.export_dir, target, json_file_name(generated_at));
        write_export(&dir, &name, &contents)
    }

    pub fn export_report(
        &self,
        target: Option<&Path>,
        generated_at: OffsetDateTime,
    ) -> Result<PathBuf> {
        let input = self.state.input();
        let report = ProposalReport::build(
            input,
            self.result()?,
            self.state.quote_items(),
            self.state.narrative(),
            generated_at.date(),
        );
        info!(pages = report.page_count(), "rendered proposal");
        let default_name = proposal_file_name(input, generated_at);
        let (dir, name) = resolve_target(&self.export_dir, target, default_name);
        write_export(&dir, &name, &report.render())
    }
}

/// An explicit path is split into directory and file name; a directory keeps the default name.
fn resolve_target(
    export_dir: &Path,
    target: Option<&Path>,
    default_name: String,
) -> (PathBuf, String) {
    let Some(target) = target else {
        return (export_dir.to_path_buf(), default_name);
    };
    if target.is_dir() {
        return (target.to_path_buf(), default_name);
    }
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or(default_name);
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    (dir, name)
}

pub fn panel_listing(catalog: &Catalog) -> String {
    let mut out = String::new();
    for panel in catalog.panels() {
        let _ = writeln!(
            out,
            "{:<12} {:<40} {}",
            panel.id,
            panel.display_name(),
            panel.cell_type
        );
    }
    out
}

pub fn city_listing(catalog: &Catalog) -> String {
    let mut out = String::new();
    for city in catalog.cities() {
        let marker = if city.is_custom { " (enter HSP manually)" } else { "" };
        let _ = writeln!(
            out,
            "{:<28} {:>4}{marker}",
            city.name,
            format_decimal(city.peak_sun_hours)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{ProposalRuntime, build_state, city_listing, panel_listing, resolve_target};
    use crate::config::Config;
    use crate::project::ProjectFile;
    use anyhow::{Result, anyhow};
    use solcalc_app::{CalculationStatus, Catalog};
    use solcalc_llm::{Client, NARRATIVE_FAILURE};
    use std::path::{Path, PathBuf};
    use std::thread;
    use std::time::Duration;
    use time::OffsetDateTime;
    use tiny_http::{Header, Response, Server};

    fn fixed_time() -> Result<OffsetDateTime> {
        Ok(OffsetDateTime::from_unix_timestamp(1_767_225_600)?)
    }

    #[test]
    fn default_state_is_calculated_bill_scenario() -> Result<()> {
        let state = build_state(&Config::default(), None)?;
        assert_eq!(state.status(), CalculationStatus::Calculated);
        let result = state.result().ok_or_else(|| anyhow!("missing result"))?;
        assert_eq!(result.number_of_panels, 6);
        assert!(!state.quote().is_empty());
        Ok(())
    }

    #[test]
    fn config_defaults_apply_before_input_file() -> Result<()> {
        let mut config = Config::default();
        config.catalog.default_city = Some("Cali".to_owned());
        config.catalog.default_panel = Some("jinko-625".to_owned());

        let state = build_state(&config, None)?;
        assert_eq!(state.input().city_name, "Cali");
        assert_eq!(state.input().selected_panel.id, "jinko-625");

        let project: ProjectFile = toml::from_str("city = \"Medellín\"\n")?;
        let state = build_state(&config, Some(&project))?;
        assert_eq!(state.input().city_name, "Medellín");
        assert_eq!(state.input().selected_panel.id, "jinko-625");
        Ok(())
    }

    #[test]
    fn quote_edits_from_input_reach_the_summary() -> Result<()> {
        let project: ProjectFile = toml::from_str(
            "[[quote_item]]\nname = \"Monitoring kit\"\nunit_price = 320000\n\n[[quote_item]]\nid = \"labor\"\nremove = true\n",
        )?;
        let plain = build_state(&Config::default(), None)?;
        let state = build_state(&Config::default(), Some(&project))?;
        let labor = plain.quote().get("labor").map(|item| item.subtotal()).unwrap_or(0);
        assert_eq!(state.quote().total(), plain.quote().total() - labor + 320_000);

        let summary = ProposalRuntime::new(state, PathBuf::from("/unused")).summary()?;
        assert!(summary.contains("Monitoring kit"));
        assert!(summary.contains("$320.000"));
        Ok(())
    }

    #[test]
    fn summary_lists_sizing_and_quote_total() -> Result<()> {
        let state = build_state(&Config::default(), None)?;
        let runtime = ProposalRuntime::new(state, PathBuf::from("/unused"));
        let summary = runtime.summary()?;
        assert!(summary.contains("Daily consumption:  9.80 kWh"));
        assert!(summary.contains("Battery bank:       817 Ah at 24 V"));
        assert!(summary.contains("  Total: $"));
        assert!(!summary.contains("Loads:"));
        assert!(!summary.contains("Technical analysis"));
        Ok(())
    }

    #[test]
    fn load_mode_summary_reports_appliance_totals() -> Result<()> {
        let project: ProjectFile = toml::from_str(
            "mode = \"load_analysis\"\n[[appliance]]\ntemplate = \"Refrigerator\"\n",
        )?;
        let state = build_state(&Config::default(), Some(&project))?;
        let runtime = ProposalRuntime::new(state, PathBuf::from("/unused"));
        let summary = runtime.summary()?;
        assert!(summary.contains("Loads:              1 appliances, 150 W connected, 3,600 Wh/day"));
        Ok(())
    }

    #[test]
    fn exports_land_in_export_dir_with_default_names() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let state = build_state(&Config::default(), None)?;
        let runtime = ProposalRuntime::new(state, temp.path().join("out"));
        let at = fixed_time()?;

        let json = runtime.export_json(None, at)?;
        assert_eq!(
            json,
            temp.path().join("out").join("solar-calc-report-1767225600000.json")
        );
        let raw = std::fs::read_to_string(&json)?;
        assert!(raw.contains("\"aiAnalysis\": \"Not generated\""));

        let report = runtime.export_report(None, at)?;
        assert_eq!(
            report.file_name().and_then(|name| name.to_str()),
            Some("solar-report-Medellín-1767225600000.txt")
        );
        assert!(std::fs::read_to_string(&report)?.contains("Page 1/"));
        Ok(())
    }

    #[test]
    fn explicit_export_path_overrides_dir_and_name() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let state = build_state(&Config::default(), None)?;
        let runtime = ProposalRuntime::new(state, PathBuf::from("/unused"));
        let target = temp.path().join("client.json");
        let written = runtime.export_json(Some(&target), fixed_time()?)?;
        assert_eq!(written, target);
        Ok(())
    }

    #[test]
    fn resolve_target_handles_dirs_and_bare_names() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let export = Path::new("/exports");

        let (dir, name) = resolve_target(export, None, "a.json".to_owned());
        assert_eq!((dir, name.as_str()), (PathBuf::from("/exports"), "a.json"));

        let (dir, name) = resolve_target(export, Some(temp.path()), "a.json".to_owned());
        assert_eq!((dir, name.as_str()), (temp.path().to_path_buf(), "a.json"));

        let (dir, name) = resolve_target(export, Some(Path::new("b.json")), "a.json".to_owned());
        assert_eq!((dir, name.as_str()), (PathBuf::from("."), "b.json"));
        Ok(())
    }

    #[test]
    fn narrative_without_client_is_a_no_op() -> Result<()> {
        let state = build_state(&Config::default(), None)?;
        let mut runtime = ProposalRuntime::new(state, PathBuf::from("/unused"));
        assert!(!runtime.request_narrative()?);
        assert!(runtime.state().narrative().is_none());
        Ok(())
    }

    #[test]
    fn narrative_is_stored_and_shown_in_summary() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}/v1", server.server_addr());
        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            let body = concat!(
                "data: {\"choices\":[{\"delta\":{\"content\":\"Balanced system.\"},\"finish_reason\":\"stop\"}]}\n\n",
                "data: [DONE]\n\n",
            );
            let response = Response::from_string(body).with_header(
                Header::from_bytes("Content-Type", "text/event-stream")
                    .expect("valid content type header"),
            );
            request.respond(response).expect("response should succeed");
        });

        let state = build_state(&Config::default(), None)?;
        let client = Client::new(&addr, "gpt-4o-mini", Duration::from_secs(1))?;
        let mut runtime =
            ProposalRuntime::new(state, PathBuf::from("/unused")).with_llm_client(Some(client), "");
        assert!(runtime.request_narrative()?);
        assert_eq!(runtime.state().narrative(), Some("Balanced system."));
        assert!(runtime.summary()?.contains("Technical analysis\nBalanced system."));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn unreachable_llm_stores_fallback_text() -> Result<()> {
        let state = build_state(&Config::default(), None)?;
        let client = Client::new("http://127.0.0.1:1/v1", "gpt-4o-mini", Duration::from_millis(50))?;
        let mut runtime = ProposalRuntime::new(state, PathBuf::from("/unused"))
            .with_llm_client(Some(client), "Rural farm");
        assert!(runtime.request_narrative()?);
        assert_eq!(runtime.state().narrative(), Some(NARRATIVE_FAILURE));
        Ok(())
    }

    #[test]
    fn listings_include_every_catalog_row() {
        let catalog = Catalog::builtin();
        let panels = panel_listing(&catalog);
        assert_eq!(panels.lines().count(), catalog.panels().len());
        assert!(panels.contains("cs-550"));

        let cities = city_listing(&catalog);
        assert_eq!(cities.lines().count(), catalog.cities().len());
        assert!(cities.contains("Custom"));
        assert!(cities.contains("(enter HSP manually)"));
    }
}
