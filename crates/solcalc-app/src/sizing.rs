// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

use crate::{CalculationMode, InverterSpec, SizingInput, SizingResult};

/// Usable fraction of a lead-acid style bank before it must be recharged.
pub const DEPTH_OF_DISCHARGE: f64 = 0.5;
pub const INVERTER_EFFICIENCY: f64 = 0.92;
pub const SAFETY_MARGIN: f64 = 1.25;
/// Floor for peak demand in load-analysis mode; covers simultaneous starts.
pub const MIN_LOAD_PEAK_W: f64 = 500.0;
pub const DAYS_PER_MONTH: f64 = 30.0;
/// Bill mode spreads the daily energy over a flat four-hour equivalent load.
pub const BILL_PEAK_HOURS: f64 = 4.0;
pub const MAX_HOURS_PER_DAY: f64 = 24.0;

const INVERTER_STEP_W: f64 = 100.0;
const BREAKER_STEP_A: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInputError {
    #[error("peak sun hours must be positive, got {0}")]
    PeakSunHours(f64),

    #[error("system efficiency must be within (0, 1], got {0}")]
    SystemEfficiency(f64),

    #[error("battery voltage must be positive, got {0}")]
    BatteryVoltage(f64),

    #[error("autonomy days cannot be negative, got {0}")]
    AutonomyDays(f64),

    #[error("monthly consumption cannot be negative, got {0} kWh")]
    MonthlyConsumption(f64),

    #[error("panel {0:?} has no rated power")]
    PanelPower(String),

    #[error("appliance {name:?}: {reason}")]
    Appliance { name: String, reason: &'static str },

    #[error("{0} must be a finite number")]
    NotFinite(&'static str),
}

impl SizingInput {
    /// Checks every numeric domain the sizing arithmetic divides or multiplies by.
    pub fn validate(&self) -> Result<(), InvalidInputError> {
        for (field, value) in [
            ("peak sun hours", self.peak_sun_hours),
            ("system efficiency", self.system_efficiency),
            ("battery voltage", self.battery_voltage),
            ("autonomy days", self.autonomy_days),
            ("monthly consumption", self.monthly_consumption_kwh),
        ] {
            if !value.is_finite() {
                return Err(InvalidInputError::NotFinite(field));
            }
        }

        if self.peak_sun_hours <= 0.0 {
            return Err(InvalidInputError::PeakSunHours(self.peak_sun_hours));
        }
        if self.system_efficiency <= 0.0 || self.system_efficiency > 1.0 {
            return Err(InvalidInputError::SystemEfficiency(self.system_efficiency));
        }
        if self.battery_voltage <= 0.0 {
            return Err(InvalidInputError::BatteryVoltage(self.battery_voltage));
        }
        if self.autonomy_days < 0.0 {
            return Err(InvalidInputError::AutonomyDays(self.autonomy_days));
        }
        if self.selected_panel.rated_power_w == 0 {
            return Err(InvalidInputError::PanelPower(self.selected_panel.id.clone()));
        }

        match self.calculation_mode {
            CalculationMode::Bill => {
                if self.monthly_consumption_kwh < 0.0 {
                    return Err(InvalidInputError::MonthlyConsumption(
                        self.monthly_consumption_kwh,
                    ));
                }
            }
            CalculationMode::LoadAnalysis => {
                for appliance in &self.appliances {
                    let reason = if !appliance.power_w.is_finite()
                        || !appliance.hours_per_day.is_finite()
                    {
                        Some("power and hours must be finite")
                    } else if appliance.power_w < 0.0 {
                        Some("power cannot be negative")
                    } else if appliance.hours_per_day < 0.0 {
                        Some("hours per day cannot be negative")
                    } else if appliance.hours_per_day > MAX_HOURS_PER_DAY {
                        Some("hours per day cannot exceed 24")
                    } else {
                        None
                    };
                    if let Some(reason) = reason {
                        return Err(InvalidInputError::Appliance {
                            name: appliance.name.clone(),
                            reason,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Sizes the array, inverter and battery bank for one input record.
///
/// The result is always complete: the input is validated up front so none of
/// the divisions below can produce a non-finite figure.
pub fn calculate(input: &SizingInput) -> Result<SizingResult, InvalidInputError> {
    input.validate()?;

    let (daily_consumption_wh, max_power_demand_w) = consumption_and_peak(input);

    let required_generation_wh = daily_consumption_wh / input.system_efficiency;
    let total_power_needed_w = required_generation_wh / input.peak_sun_hours;

    let panel_w = f64::from(input.selected_panel.rated_power_w);
    let number_of_panels = ((total_power_needed_w / panel_w).ceil() as u32).max(1);

    let inverter = size_inverter(input, max_power_demand_w);

    let battery_capacity_ah = (daily_consumption_wh * input.autonomy_days)
        / (input.battery_voltage * DEPTH_OF_DISCHARGE);

    let estimated_generation_daily_wh = f64::from(number_of_panels)
        * panel_w
        * input.peak_sun_hours
        * input.system_efficiency;

    Ok(SizingResult {
        daily_consumption_wh,
        max_power_demand_w,
        required_generation_wh,
        total_power_needed_w,
        number_of_panels,
        inverter,
        battery_capacity_ah,
        estimated_generation_daily_wh,
    })
}

fn consumption_and_peak(input: &SizingInput) -> (f64, f64) {
    match input.calculation_mode {
        CalculationMode::LoadAnalysis => {
            // An empty f64 sum() is -0.0; folding from 0.0 keeps empty lists at +0.0.
            let daily = input
                .appliances
                .iter()
                .fold(0.0, |total, appliance| total + appliance.daily_energy_wh());
            let connected = input
                .appliances
                .iter()
                .fold(0.0, |total, appliance| total + appliance.connected_power_w());
            (daily, connected.max(MIN_LOAD_PEAK_W))
        }
        CalculationMode::Bill => {
            let daily = input.monthly_consumption_kwh * 1000.0 / DAYS_PER_MONTH;
            (daily, daily / BILL_PEAK_HOURS)
        }
    }
}

fn size_inverter(input: &SizingInput, max_power_demand_w: f64) -> InverterSpec {
    let suggested_size_w = round_up_to(max_power_demand_w * SAFETY_MARGIN, INVERTER_STEP_W);
    let max_dc_current = f64::from(suggested_size_w) / input.battery_voltage;
    let suggested_breaker_amps = round_up_to(max_dc_current * SAFETY_MARGIN, BREAKER_STEP_A);

    InverterSpec {
        suggested_size_w,
        type_label: input.inverter_type.label().to_owned(),
        input_voltage: input.battery_voltage,
        suggested_breaker_amps,
        efficiency: INVERTER_EFFICIENCY,
    }
}

fn round_up_to(value: f64, step: f64) -> u32 {
    ((value / step).ceil() * step) as u32
}
