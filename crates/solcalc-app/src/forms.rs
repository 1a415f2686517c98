// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::{Appliance, ApplianceId, MAX_HOURS_PER_DAY, appliance_template};

pub const SUPPORTED_BATTERY_VOLTAGES: [f64; 3] = [12.0, 24.0, 48.0];

#[derive(Debug, Clone, PartialEq)]
pub struct ApplianceFormInput {
    pub name: String,
    pub power_w: f64,
    pub quantity: u32,
    pub hours_per_day: f64,
}

impl ApplianceFormInput {
    pub fn blank() -> Self {
        Self {
            name: "New appliance".to_owned(),
            power_w: 100.0,
            quantity: 1,
            hours_per_day: 1.0,
        }
    }

    pub fn from_template(name: &str) -> Result<Self> {
        let Some(template) = appliance_template(name) else {
            bail!("unknown appliance template {name:?} -- pick one from the template list and retry");
        };
        Ok(Self {
            name: template.name.to_owned(),
            power_w: template.power_w,
            quantity: 1,
            hours_per_day: template.hours_per_day,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("appliance name is required -- enter a name and retry");
        }
        if !self.power_w.is_finite() || self.power_w < 0.0 {
            bail!("appliance power must be a non-negative number of watts");
        }
        if !self.hours_per_day.is_finite()
            || self.hours_per_day < 0.0
            || self.hours_per_day > MAX_HOURS_PER_DAY
        {
            bail!("appliance hours per day must be between 0 and 24");
        }
        Ok(())
    }

    pub fn into_appliance(self, id: ApplianceId) -> Result<Appliance> {
        self.validate()?;
        Ok(Appliance {
            id,
            name: self.name.trim().to_owned(),
            power_w: self.power_w,
            quantity: self.quantity,
            hours_per_day: self.hours_per_day,
        })
    }
}

/// Monthly kWh implied by a bill and tariff, when both are known.
pub fn derive_monthly_consumption(monthly_bill: f64, rate: f64) -> Option<f64> {
    (monthly_bill > 0.0 && rate > 0.0 && monthly_bill.is_finite() && rate.is_finite())
        .then(|| (monthly_bill / rate).round())
}

pub fn validate_battery_voltage(voltage: f64) -> Result<()> {
    if !SUPPORTED_BATTERY_VOLTAGES.contains(&voltage) {
        bail!("battery voltage must be 12, 24 or 48 V, got {voltage}");
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadSummary {
    pub daily_energy_wh: f64,
    pub connected_power_w: f64,
}

pub fn load_summary(appliances: &[Appliance]) -> LoadSummary {
    appliances
        .iter()
        .fold(LoadSummary::default(), |summary, appliance| LoadSummary {
            daily_energy_wh: summary.daily_energy_wh + appliance.daily_energy_wh(),
            connected_power_w: summary.connected_power_w + appliance.connected_power_w(),
        })
}
