// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMode {
    #[serde(rename = "BILL")]
    Bill,
    #[serde(rename = "LOAD_ANALYSIS")]
    LoadAnalysis,
}

impl CalculationMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bill => "BILL",
            Self::LoadAnalysis => "LOAD_ANALYSIS",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BILL" => Some(Self::Bill),
            "LOAD_ANALYSIS" | "LOAD-ANALYSIS" | "LOADS" => Some(Self::LoadAnalysis),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Bill => "Based on monthly bill",
            Self::LoadAnalysis => "Manual load analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InverterType {
    #[serde(rename = "OFF_GRID")]
    OffGrid,
    #[serde(rename = "ON_GRID")]
    OnGrid,
    #[serde(rename = "HYBRID")]
    Hybrid,
}

impl InverterType {
    pub const ALL: [Self; 3] = [Self::OffGrid, Self::OnGrid, Self::Hybrid];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OffGrid => "OFF_GRID",
            Self::OnGrid => "ON_GRID",
            Self::Hybrid => "HYBRID",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "OFF_GRID" => Some(Self::OffGrid),
            "ON_GRID" => Some(Self::OnGrid),
            "HYBRID" => Some(Self::Hybrid),
            _ => None,
        }
    }

    /// Unrecognized values size the system as a stand-alone off-grid install.
    pub fn parse_or_off_grid(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::OffGrid)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OnGrid => "Grid-Tie",
            Self::Hybrid => "Hybrid (Grid+Battery)",
            Self::OffGrid => "Off-Grid Pure Sine",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuoteCategory {
    Generation,
    Storage,
    PowerElectronics,
    Structure,
    Protection,
    Wiring,
    InstallationServices,
}

impl QuoteCategory {
    /// Display grouping order used by quote views and the proposal report.
    pub const DISPLAY_ORDER: [Self; 7] = [
        Self::Generation,
        Self::PowerElectronics,
        Self::Storage,
        Self::Structure,
        Self::Protection,
        Self::Wiring,
        Self::InstallationServices,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Storage => "storage",
            Self::PowerElectronics => "power-electronics",
            Self::Structure => "structure",
            Self::Protection => "protection",
            Self::Wiring => "wiring",
            Self::InstallationServices => "installation-services",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "generation" => Some(Self::Generation),
            "storage" => Some(Self::Storage),
            "power-electronics" => Some(Self::PowerElectronics),
            "structure" => Some(Self::Structure),
            "protection" => Some(Self::Protection),
            "wiring" => Some(Self::Wiring),
            "installation-services" => Some(Self::InstallationServices),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Generation => "Solar generation",
            Self::Storage => "Batteries",
            Self::PowerElectronics => "Power electronics",
            Self::Structure => "Structure and mounting",
            Self::Protection => "Electrical protection",
            Self::Wiring => "Conductors and ducts",
            Self::InstallationServices => "Services and engineering",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationStatus {
    Idle,
    Calculated,
    /// A governing input changed after the last calculation.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSpec {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub rated_power_w: u32,
    pub cell_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_estimate: Option<i64>,
}

impl PanelSpec {
    pub fn display_name(&self) -> String {
        format!("{} {} ({}W)", self.brand, self.model, self.rated_power_w)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityEntry {
    pub name: String,
    pub peak_sun_hours: f64,
    #[serde(default)]
    pub is_custom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appliance {
    pub id: ApplianceId,
    pub name: String,
    pub power_w: f64,
    pub quantity: u32,
    pub hours_per_day: f64,
}

impl Appliance {
    pub fn connected_power_w(&self) -> f64 {
        self.power_w * f64::from(self.quantity)
    }

    pub fn daily_energy_wh(&self) -> f64 {
        self.connected_power_w() * self.hours_per_day
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingInput {
    pub calculation_mode: CalculationMode,
    pub city_name: String,
    pub customer: Customer,
    pub monthly_bill_amount: f64,
    pub electricity_rate: f64,
    pub monthly_consumption_kwh: f64,
    pub peak_sun_hours: f64,
    pub selected_panel: PanelSpec,
    pub battery_voltage: f64,
    pub autonomy_days: f64,
    pub system_efficiency: f64,
    pub inverter_type: InverterType,
    pub appliances: Vec<Appliance>,
}

impl SizingInput {
    /// Battery items are quoted unless the system is grid-tied with no autonomy.
    pub fn needs_battery_bank(&self) -> bool {
        self.inverter_type != InverterType::OnGrid || self.autonomy_days > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InverterSpec {
    pub suggested_size_w: u32,
    pub type_label: String,
    pub input_voltage: f64,
    pub suggested_breaker_amps: u32,
    pub efficiency: f64,
}

impl InverterSpec {
    pub fn denotes_hybrid(&self) -> bool {
        self.type_label.to_lowercase().contains("hybrid")
    }

    /// DC current drawn from the battery bank at rated inverter output.
    pub fn dc_current_a(&self) -> f64 {
        f64::from(self.suggested_size_w) / self.input_voltage
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizingResult {
    pub daily_consumption_wh: f64,
    pub max_power_demand_w: f64,
    pub required_generation_wh: f64,
    pub total_power_needed_w: f64,
    pub number_of_panels: u32,
    pub inverter: InverterSpec,
    pub battery_capacity_ah: f64,
    pub estimated_generation_daily_wh: f64,
}

impl SizingResult {
    pub fn installed_power_kwp(&self, panel: &PanelSpec) -> f64 {
        f64::from(self.number_of_panels) * f64::from(panel.rated_power_w) / 1000.0
    }

    pub fn storage_kwh(&self, battery_voltage: f64) -> f64 {
        self.battery_capacity_ah * battery_voltage / 1000.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteItem {
    pub id: String,
    pub category: QuoteCategory,
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub unit_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl QuoteItem {
    pub fn subtotal(&self) -> i64 {
        i64::from(self.quantity) * self.unit_price
    }
}

/// Renders whole numbers without a fractional part ("24", not "24.0").
pub fn format_decimal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::{CalculationMode, InverterType, QuoteCategory, format_decimal};

    #[test]
    fn format_decimal_drops_zero_fraction() {
        assert_eq!(format_decimal(24.0), "24");
        assert_eq!(format_decimal(4.5), "4.5");
        assert_eq!(format_decimal(-3.0), "-3");
    }

    #[test]
    fn inverter_type_falls_back_to_off_grid() {
        assert_eq!(InverterType::parse_or_off_grid("on-grid"), InverterType::OnGrid);
        assert_eq!(InverterType::parse_or_off_grid("HYBRID"), InverterType::Hybrid);
        assert_eq!(InverterType::parse_or_off_grid("diesel"), InverterType::OffGrid);
        assert!(InverterType::parse("diesel").is_none());
    }

    #[test]
    fn quote_category_parse_and_as_str_agree() {
        for category in QuoteCategory::DISPLAY_ORDER {
            assert_eq!(QuoteCategory::parse(category.as_str()), Some(category));
        }
        assert!(QuoteCategory::parse("plumbing").is_none());
    }

    #[test]
    fn quote_category_serializes_kebab_case() {
        let json = serde_json::to_string(&QuoteCategory::InstallationServices)
            .expect("serialize category");
        assert_eq!(json, "\"installation-services\"");
    }

    #[test]
    fn calculation_mode_uses_wire_names() {
        let json = serde_json::to_string(&CalculationMode::LoadAnalysis).expect("serialize mode");
        assert_eq!(json, "\"LOAD_ANALYSIS\"");
        assert_eq!(CalculationMode::parse("bill"), Some(CalculationMode::Bill));
    }
}
