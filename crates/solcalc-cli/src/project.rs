// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use solcalc_app::{
    ApplianceFormInput, CalculationMode, FormCommand, InverterType, ProposalState, QuoteCategory,
};
use std::fs;
use std::path::Path;
use tracing::warn;

/// A proposal input file; anything left out keeps the session default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    pub mode: Option<String>,
    pub city: Option<String>,
    pub peak_sun_hours: Option<f64>,
    pub panel: Option<String>,
    pub monthly_bill: Option<f64>,
    pub electricity_rate: Option<f64>,
    pub monthly_consumption_kwh: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub autonomy_days: Option<f64>,
    pub system_efficiency: Option<f64>,
    pub inverter_type: Option<String>,
    pub customer: CustomerSection,
    #[serde(rename = "appliance")]
    pub appliances: Vec<ApplianceEntry>,
    #[serde(rename = "quote_item")]
    pub quote_items: Vec<QuoteEdit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerSection {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplianceEntry {
    pub template: Option<String>,
    pub name: Option<String>,
    pub power_w: Option<f64>,
    pub quantity: Option<u32>,
    pub hours_per_day: Option<f64>,
}

impl ApplianceEntry {
    fn to_form_input(&self) -> Result<ApplianceFormInput> {
        let mut input = match &self.template {
            Some(template) => ApplianceFormInput::from_template(template)?,
            None => ApplianceFormInput {
                name: self.name.clone().unwrap_or_default(),
                power_w: self.power_w.ok_or_else(|| {
                    anyhow!("appliance power_w is required -- set power_w or use a template")
                })?,
                quantity: 1,
                hours_per_day: self.hours_per_day.ok_or_else(|| {
                    anyhow!("appliance hours_per_day is required -- set hours_per_day or use a template")
                })?,
            },
        };
        if let Some(name) = &self.name {
            input.name = name.clone();
        }
        if let Some(power_w) = self.power_w {
            input.power_w = power_w;
        }
        if let Some(quantity) = self.quantity {
            input.quantity = quantity;
        }
        if let Some(hours) = self.hours_per_day {
            input.hours_per_day = hours;
        }
        Ok(input)
    }
}

/// Edits one generated quote line, or adds a custom line when `id` is absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteEdit {
    pub id: Option<String>,
    pub remove: bool,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<u32>,
    pub unit_price: Option<i64>,
}

impl QuoteEdit {
    fn apply(&self, state: &mut ProposalState) -> Result<()> {
        let id = match &self.id {
            Some(id) => id.trim().to_owned(),
            None if self.remove => {
                bail!("quote_item with remove = true needs an id -- set id to the line to drop")
            }
            None => state.add_custom_quote_item().id.clone(),
        };
        let quote = state.quote_mut();

        if self.remove {
            quote.remove(&id)?;
            return Ok(());
        }
        if self.name.is_some() || self.description.is_some() {
            let current = quote.get(&id).ok_or_else(|| {
                anyhow!("quote item {id:?} not found -- run with --json to see the generated ids")
            })?;
            let name = self.name.clone().unwrap_or_else(|| current.name.clone());
            let description = self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone());
            quote.rename(&id, &name, &description)?;
        }
        if let Some(raw) = &self.category {
            let category = QuoteCategory::parse(raw.trim()).ok_or_else(|| {
                let known: Vec<&str> = QuoteCategory::DISPLAY_ORDER
                    .iter()
                    .map(|category| category.as_str())
                    .collect();
                anyhow!("unknown quote category {raw:?} -- use one of: {}", known.join(", "))
            })?;
            quote.set_category(&id, category)?;
        }
        if let Some(quantity) = self.quantity {
            quote.set_quantity(&id, quantity)?;
        }
        if let Some(unit_price) = self.unit_price {
            quote.set_unit_price(&id, unit_price)?;
        }
        Ok(())
    }
}

impl ProjectFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read input file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| {
            format!(
                "parse input file {} -- run `solcalc --print-example-input` for the format",
                path.display()
            )
        })
    }

    /// Replays the file as form commands so every field goes through the same checks.
    pub fn apply(&self, state: &mut ProposalState) -> Result<()> {
        let mut commands = Vec::new();

        if let Some(mode) = &self.mode {
            let mode = CalculationMode::parse(mode).ok_or_else(|| {
                anyhow!("unknown mode {mode:?} -- use \"bill\" or \"load_analysis\"")
            })?;
            commands.push(FormCommand::SetMode(mode));
        }
        if let Some(city) = &self.city {
            commands.push(FormCommand::SelectCity(city.clone()));
        }
        if let Some(hours) = self.peak_sun_hours {
            commands.push(FormCommand::SetPeakSunHours(hours));
        }
        if let Some(panel) = &self.panel {
            commands.push(FormCommand::SelectPanel(panel.clone()));
        }
        if let Some(bill) = self.monthly_bill {
            commands.push(FormCommand::SetMonthlyBill(bill));
        }
        if let Some(rate) = self.electricity_rate {
            commands.push(FormCommand::SetElectricityRate(rate));
        }
        if let Some(kwh) = self.monthly_consumption_kwh {
            commands.push(FormCommand::SetMonthlyConsumption(kwh));
        }
        if let Some(voltage) = self.battery_voltage {
            commands.push(FormCommand::SetBatteryVoltage(voltage));
        }
        if let Some(days) = self.autonomy_days {
            commands.push(FormCommand::SetAutonomyDays(days));
        }
        if let Some(efficiency) = self.system_efficiency {
            commands.push(FormCommand::SetSystemEfficiency(efficiency));
        }
        if let Some(raw) = &self.inverter_type {
            let inverter_type = InverterType::parse_or_off_grid(raw);
            if InverterType::parse(raw).is_none() {
                warn!(value = %raw, "unrecognized inverter type, sizing as off-grid");
            }
            commands.push(FormCommand::SetInverterType(inverter_type));
        }

        let customer = &self.customer;
        if let Some(name) = &customer.name {
            commands.push(FormCommand::SetCustomerName(name.clone()));
        }
        if let Some(address) = &customer.address {
            commands.push(FormCommand::SetCustomerAddress(address.clone()));
        }
        if let Some(phone) = &customer.phone {
            commands.push(FormCommand::SetCustomerPhone(phone.clone()));
        }
        if let Some(email) = &customer.email {
            commands.push(FormCommand::SetCustomerEmail(email.clone()));
        }

        for (index, entry) in self.appliances.iter().enumerate() {
            let input = entry
                .to_form_input()
                .with_context(|| format!("appliance #{}", index + 1))?;
            commands.push(FormCommand::AddAppliance(input));
        }

        for command in commands {
            state.dispatch(command)?;
        }
        Ok(())
    }

    /// Applied after a calculation; a later calculation discards these edits.
    pub fn apply_quote_edits(&self, state: &mut ProposalState) -> Result<()> {
        for (index, edit) in self.quote_items.iter().enumerate() {
            edit.apply(state)
                .with_context(|| format!("quote_item #{}", index + 1))?;
        }
        Ok(())
    }

    pub fn example() -> &'static str {
        "# solcalc proposal input\n\
# mode is \"bill\" or \"load_analysis\"\n\
mode = \"load_analysis\"\n\
city = \"Medellín\"\n\
panel = \"cs-550\"\n\
monthly_bill = 250000\n\
electricity_rate = 850\n\
battery_voltage = 24\n\
autonomy_days = 1\n\
system_efficiency = 0.75\n\
inverter_type = \"off_grid\"\n\
\n\
[customer]\n\
name = \"Ana María Restrepo\"\n\
address = \"Calle 10 # 43-12\"\n\
phone = \"3001234567\"\n\
email = \"ana@example.com\"\n\
\n\
[[appliance]]\n\
template = \"Refrigerator\"\n\
\n\
[[appliance]]\n\
template = \"LED bulb\"\n\
quantity = 8\n\
hours_per_day = 5\n\
\n\
[[appliance]]\n\
name = \"Electric fence\"\n\
power_w = 15\n\
hours_per_day = 12\n\
\n\
# quote lines are edited after sizing; leave out id to add a line\n\
[[quote_item]]\n\
id = \"labor\"\n\
unit_price = 1500000\n\
\n\
[[quote_item]]\n\
name = \"Monitoring kit\"\n\
description = \"Wi-Fi datalogger\"\n\
category = \"power-electronics\"\n\
unit_price = 320000\n"
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectFile;
    use anyhow::Result;
    use solcalc_app::{CalculationMode, FormCommand, InverterType, ProposalState, QuoteCategory};

    fn parse(raw: &str) -> Result<ProjectFile> {
        Ok(toml::from_str(raw)?)
    }

    #[test]
    fn example_input_applies_cleanly() -> Result<()> {
        let project = parse(ProjectFile::example())?;
        let mut state = ProposalState::default();
        project.apply(&mut state)?;

        let input = state.input();
        assert_eq!(input.calculation_mode, CalculationMode::LoadAnalysis);
        assert_eq!(input.customer.name, "Ana María Restrepo");
        assert_eq!(input.appliances.len(), 3);
        assert_eq!(input.appliances[0].hours_per_day, 24.0);
        assert_eq!(input.appliances[1].quantity, 8);
        assert_eq!(input.appliances[1].hours_per_day, 5.0);
        assert_eq!(input.appliances[2].name, "Electric fence");

        state.dispatch(FormCommand::Calculate)?;
        assert!(state.result().is_some());
        Ok(())
    }

    #[test]
    fn empty_file_keeps_defaults() -> Result<()> {
        let mut state = ProposalState::default();
        parse("")?.apply(&mut state)?;
        assert_eq!(state.input(), ProposalState::default().input());
        Ok(())
    }

    #[test]
    fn explicit_consumption_wins_over_derived() -> Result<()> {
        let project = parse("monthly_bill = 170000\nelectricity_rate = 850\nmonthly_consumption_kwh = 150\n")?;
        let mut state = ProposalState::default();
        project.apply(&mut state)?;
        assert_eq!(state.input().monthly_consumption_kwh, 150.0);
        Ok(())
    }

    #[test]
    fn unknown_inverter_type_falls_back_to_off_grid() -> Result<()> {
        let mut state = ProposalState::default();
        parse("inverter_type = \"hybrid\"\n")?.apply(&mut state)?;
        assert_eq!(state.input().inverter_type, InverterType::Hybrid);

        parse("inverter_type = \"diesel\"\n")?.apply(&mut state)?;
        assert_eq!(state.input().inverter_type, InverterType::OffGrid);
        Ok(())
    }

    #[test]
    fn bad_values_surface_form_errors() -> Result<()> {
        let mut state = ProposalState::default();
        let error = parse("battery_voltage = 36\n")?
            .apply(&mut state)
            .expect_err("36 V should fail");
        assert!(error.to_string().contains("12, 24 or 48"));

        let error = parse("mode = \"guess\"\n")?
            .apply(&mut state)
            .expect_err("unknown mode should fail");
        assert!(error.to_string().contains("load_analysis"));

        let error = parse("[[appliance]]\nname = \"Heater\"\n")?
            .apply(&mut state)
            .expect_err("missing power should fail");
        assert!(format!("{error:#}").contains("power_w is required"));
        Ok(())
    }

    #[test]
    fn quote_items_edit_and_extend_the_generated_quote() -> Result<()> {
        let project = parse(ProjectFile::example())?;
        let mut state = ProposalState::default();
        project.apply(&mut state)?;
        state.dispatch(FormCommand::Calculate)?;
        let generated_total = state.quote().total();
        let old_labor = state.quote().get("labor").map(|item| item.subtotal()).unwrap_or(0);

        project.apply_quote_edits(&mut state)?;
        let quote = state.quote();
        let labor = quote.get("labor").expect("labor line");
        assert_eq!(labor.unit_price, 1_500_000);

        let custom = quote.get("custom-1").expect("custom line");
        assert_eq!(custom.name, "Monitoring kit");
        assert_eq!(custom.description, "Wi-Fi datalogger");
        assert_eq!(custom.category, QuoteCategory::PowerElectronics);
        assert_eq!(custom.quantity, 1);
        assert!(custom.image_url.is_some());

        assert_eq!(
            quote.total(),
            generated_total - old_labor + labor.subtotal() + 320_000
        );
        Ok(())
    }

    #[test]
    fn quote_items_can_remove_rename_and_requantify() -> Result<()> {
        let project = parse(
            "[[quote_item]]\nid = \"conduits\"\nremove = true\n\n[[quote_item]]\nid = \"grounding\"\nname = \"Grounding rod kit\"\nquantity = 2\n",
        )?;
        let mut state = ProposalState::default();
        state.dispatch(FormCommand::Calculate)?;
        let description = state
            .quote()
            .get("grounding")
            .map(|item| item.description.clone())
            .expect("grounding line");

        project.apply_quote_edits(&mut state)?;
        assert!(state.quote().get("conduits").is_none());
        let grounding = state.quote().get("grounding").expect("grounding line");
        assert_eq!(grounding.name, "Grounding rod kit");
        assert_eq!(grounding.description, description);
        assert_eq!(grounding.quantity, 2);

        state.dispatch(FormCommand::Calculate)?;
        assert!(state.quote().get("conduits").is_some());
        Ok(())
    }

    #[test]
    fn bad_quote_items_name_the_offending_entry() -> Result<()> {
        let mut state = ProposalState::default();
        state.dispatch(FormCommand::Calculate)?;

        let error = parse("[[quote_item]]\nid = \"nope\"\nquantity = 3\n")?
            .apply_quote_edits(&mut state)
            .expect_err("unknown id should fail");
        assert!(format!("{error:#}").contains("quote_item #1"));

        let error = parse("[[quote_item]]\nid = \"labor\"\ncategory = \"misc\"\n")?
            .apply_quote_edits(&mut state)
            .expect_err("unknown category should fail");
        assert!(format!("{error:#}").contains("installation-services"));

        let error = parse("[[quote_item]]\nid = \"labor\"\nunit_price = -1\n")?
            .apply_quote_edits(&mut state)
            .expect_err("negative price should fail");
        assert!(format!("{error:#}").contains("cannot be negative"));

        let error = parse("[[quote_item]]\nremove = true\n")?
            .apply_quote_edits(&mut state)
            .expect_err("remove without id should fail");
        assert!(error.to_string().contains("needs an id"));
        Ok(())
    }
}
