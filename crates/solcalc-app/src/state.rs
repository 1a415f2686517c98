// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};

use crate::{
    ApplianceFormInput, ApplianceId, CalculationMode, CalculationStatus, Catalog, InverterType,
    Quote, QuoteGenerator, QuoteItem, SizingInput, SizingResult, calculate,
    derive_monthly_consumption, validate_battery_voltage,
};

#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    SetMode(CalculationMode),
    SelectCity(String),
    SetPeakSunHours(f64),
    SelectPanel(String),
    SetMonthlyBill(f64),
    SetElectricityRate(f64),
    SetMonthlyConsumption(f64),
    SetBatteryVoltage(f64),
    SetAutonomyDays(f64),
    SetSystemEfficiency(f64),
    SetInverterType(InverterType),
    SetCustomerName(String),
    SetCustomerAddress(String),
    SetCustomerPhone(String),
    SetCustomerEmail(String),
    AddAppliance(ApplianceFormInput),
    AddApplianceFromTemplate(String),
    UpdateAppliance {
        id: ApplianceId,
        input: ApplianceFormInput,
    },
    RemoveAppliance(ApplianceId),
    Calculate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    ModeChanged(CalculationMode),
    CityChanged { name: String, peak_sun_hours: f64 },
    PanelChanged(String),
    InputUpdated(&'static str),
    ConsumptionDerived(f64),
    CustomerUpdated,
    ApplianceAdded(ApplianceId),
    ApplianceUpdated(ApplianceId),
    ApplianceRemoved(ApplianceId),
    Calculated { panels: u32, quote_total: i64 },
    MarkedStale,
}

/// Everything one proposal session holds between edits.
#[derive(Debug, Clone)]
pub struct ProposalState {
    catalog: Catalog,
    generator: QuoteGenerator,
    input: SizingInput,
    status: CalculationStatus,
    result: Option<SizingResult>,
    quote: Quote,
    narrative: Option<String>,
    next_appliance: ApplianceId,
}

impl ProposalState {
    pub fn new(catalog: Catalog, generator: QuoteGenerator) -> Self {
        let input = catalog.default_input();
        Self::with_input(catalog, generator, input)
    }

    pub fn with_input(catalog: Catalog, generator: QuoteGenerator, input: SizingInput) -> Self {
        let next_appliance = input
            .appliances
            .iter()
            .map(|appliance| appliance.id)
            .max()
            .map_or(ApplianceId::new(1), ApplianceId::next);
        Self {
            catalog,
            generator,
            input,
            status: CalculationStatus::Idle,
            result: None,
            quote: Quote::default(),
            narrative: None,
            next_appliance,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn input(&self) -> &SizingInput {
        &self.input
    }

    pub fn status(&self) -> CalculationStatus {
        self.status
    }

    pub fn result(&self) -> Option<&SizingResult> {
        self.result.as_ref()
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn quote_mut(&mut self) -> &mut Quote {
        &mut self.quote
    }

    pub fn quote_items(&self) -> &[QuoteItem] {
        self.quote.items()
    }

    pub fn add_custom_quote_item(&mut self) -> &QuoteItem {
        let image = self.generator.custom_item_image().to_owned();
        self.quote.add_custom_item(Some(image))
    }

    pub fn narrative(&self) -> Option<&str> {
        self.narrative.as_deref()
    }

    pub fn set_narrative(&mut self, narrative: String) {
        self.narrative = Some(narrative);
    }

    pub fn dispatch(&mut self, command: FormCommand) -> Result<Vec<FormEvent>> {
        let mut events = match command {
            FormCommand::SetMode(mode) => {
                self.input.calculation_mode = mode;
                vec![FormEvent::ModeChanged(mode)]
            }
            FormCommand::SelectCity(name) => {
                let city = self.catalog.city(&name).ok_or_else(|| {
                    anyhow!("unknown city {name:?} -- run `solcalc --list-cities` and retry")
                })?;
                self.input.city_name = city.name.clone();
                self.input.peak_sun_hours = city.peak_sun_hours;
                vec![FormEvent::CityChanged {
                    name: city.name.clone(),
                    peak_sun_hours: city.peak_sun_hours,
                }]
            }
            FormCommand::SetPeakSunHours(hours) => {
                if !(hours.is_finite() && hours > 0.0) {
                    bail!("peak sun hours must be positive, got {hours}");
                }
                self.input.peak_sun_hours = hours;
                vec![FormEvent::InputUpdated("peak sun hours")]
            }
            FormCommand::SelectPanel(id) => {
                let panel = self.catalog.panel(&id).ok_or_else(|| {
                    anyhow!("unknown panel {id:?} -- run `solcalc --list-panels` and retry")
                })?;
                self.input.selected_panel = panel.clone();
                vec![FormEvent::PanelChanged(panel.id.clone())]
            }
            FormCommand::SetMonthlyBill(amount) => {
                ensure_non_negative("monthly bill", amount)?;
                self.input.monthly_bill_amount = amount;
                self.rederive_consumption("monthly bill")
            }
            FormCommand::SetElectricityRate(rate) => {
                ensure_non_negative("electricity rate", rate)?;
                self.input.electricity_rate = rate;
                self.rederive_consumption("electricity rate")
            }
            FormCommand::SetMonthlyConsumption(kwh) => {
                ensure_non_negative("monthly consumption", kwh)?;
                self.input.monthly_consumption_kwh = kwh;
                vec![FormEvent::InputUpdated("monthly consumption")]
            }
            FormCommand::SetBatteryVoltage(voltage) => {
                validate_battery_voltage(voltage)?;
                self.input.battery_voltage = voltage;
                vec![FormEvent::InputUpdated("battery voltage")]
            }
            FormCommand::SetAutonomyDays(days) => {
                ensure_non_negative("autonomy days", days)?;
                self.input.autonomy_days = days;
                vec![FormEvent::InputUpdated("autonomy days")]
            }
            FormCommand::SetSystemEfficiency(efficiency) => {
                if !(efficiency > 0.0 && efficiency <= 1.0) {
                    bail!("system efficiency must be within (0, 1], got {efficiency}");
                }
                self.input.system_efficiency = efficiency;
                vec![FormEvent::InputUpdated("system efficiency")]
            }
            FormCommand::SetInverterType(inverter_type) => {
                self.input.inverter_type = inverter_type;
                vec![FormEvent::InputUpdated("inverter type")]
            }
            FormCommand::SetCustomerName(value) => {
                self.input.customer.name = value.trim().to_owned();
                return Ok(vec![FormEvent::CustomerUpdated]);
            }
            FormCommand::SetCustomerAddress(value) => {
                self.input.customer.address = value.trim().to_owned();
                return Ok(vec![FormEvent::CustomerUpdated]);
            }
            FormCommand::SetCustomerPhone(value) => {
                self.input.customer.phone = value.trim().to_owned();
                return Ok(vec![FormEvent::CustomerUpdated]);
            }
            FormCommand::SetCustomerEmail(value) => {
                self.input.customer.email = value.trim().to_owned();
                return Ok(vec![FormEvent::CustomerUpdated]);
            }
            FormCommand::AddAppliance(input) => self.add_appliance(input)?,
            FormCommand::AddApplianceFromTemplate(name) => {
                self.add_appliance(ApplianceFormInput::from_template(&name)?)?
            }
            FormCommand::UpdateAppliance { id, input } => {
                let appliance = input.into_appliance(id)?;
                let slot = self
                    .input
                    .appliances
                    .iter_mut()
                    .find(|existing| existing.id == id)
                    .ok_or_else(|| anyhow!("appliance {} not found", id.get()))?;
                *slot = appliance;
                vec![FormEvent::ApplianceUpdated(id)]
            }
            FormCommand::RemoveAppliance(id) => {
                let before = self.input.appliances.len();
                self.input.appliances.retain(|appliance| appliance.id != id);
                if self.input.appliances.len() == before {
                    bail!("appliance {} not found", id.get());
                }
                vec![FormEvent::ApplianceRemoved(id)]
            }
            FormCommand::Calculate => return self.recalculate(),
        };

        if self.status == CalculationStatus::Calculated {
            self.status = CalculationStatus::Stale;
            events.push(FormEvent::MarkedStale);
        }
        Ok(events)
    }

    fn rederive_consumption(&mut self, field: &'static str) -> Vec<FormEvent> {
        let mut events = vec![FormEvent::InputUpdated(field)];
        if let Some(kwh) =
            derive_monthly_consumption(self.input.monthly_bill_amount, self.input.electricity_rate)
        {
            self.input.monthly_consumption_kwh = kwh;
            events.push(FormEvent::ConsumptionDerived(kwh));
        }
        events
    }

    fn add_appliance(&mut self, input: ApplianceFormInput) -> Result<Vec<FormEvent>> {
        let id = self.next_appliance;
        let appliance = input.into_appliance(id)?;
        self.next_appliance = id.next();
        self.input.appliances.push(appliance);
        Ok(vec![FormEvent::ApplianceAdded(id)])
    }

    fn recalculate(&mut self) -> Result<Vec<FormEvent>> {
        let result = calculate(&self.input)?;
        self.quote = Quote::new(self.generator.generate(&self.input, &result));
        self.narrative = None;
        self.status = CalculationStatus::Calculated;
        let event = FormEvent::Calculated {
            panels: result.number_of_panels,
            quote_total: self.quote.total(),
        };
        self.result = Some(result);
        Ok(vec![event])
    }
}

impl Default for ProposalState {
    fn default() -> Self {
        Self::new(Catalog::builtin(), QuoteGenerator::default())
    }
}

fn ensure_non_negative(field: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        bail!("{field} cannot be negative, got {value}");
    }
    Ok(())
}
