// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::BTreeSet;

use crate::{CalculationMode, CityEntry, Customer, InverterType, PanelSpec, SizingInput};

pub const CUSTOM_CITY: &str = "Custom";
pub const DEFAULT_PANEL_ID: &str = "cs-550";
pub const DEFAULT_CITY: &str = "Medellín";

const PANELS: [(&str, &str, &str, u32, &str); 9] = [
    ("trina-700", "Trina Solar", "Vertex N Gen2 (Bifacial)", 700, "Monocrystalline N-Type"),
    ("cs-665", "Canadian Solar", "HiKu7 Mono PERC", 665, "Monocrystalline"),
    ("jinko-625", "Jinko Solar", "Tiger Neo N-Type", 625, "Monocrystalline N-Type"),
    ("risen-600", "Risen", "Titan Series", 600, "Monocrystalline"),
    ("trina-580", "Trina Solar", "Vertex S+", 580, "Monocrystalline"),
    ("longi-570", "Longi", "Hi-MO 6 Scientist", 570, "Monocrystalline"),
    ("cs-550", "Canadian Solar", "HiKu6 Mono PERC", 550, "Monocrystalline"),
    ("jinko-470", "Jinko Solar", "Tiger Neo", 470, "Monocrystalline"),
    ("era-400", "Era Solar", "Half-Cut Cell", 400, "Monocrystalline"),
];

// Average peak sun hours for major Colombian cities.
const CITIES: [(&str, f64); 16] = [
    ("Bogotá D.C.", 4.2),
    ("Medellín", 4.5),
    ("Cali", 4.8),
    ("Barranquilla", 5.6),
    ("Cartagena", 5.4),
    ("Bucaramanga", 4.9),
    ("Pereira", 4.4),
    ("Santa Marta", 5.8),
    ("Cúcuta", 5.1),
    ("Villavicencio", 4.6),
    ("Ibagué", 4.5),
    ("Riohacha (La Guajira)", 6.0),
    ("Pasto", 3.8),
    ("Manizales", 4.2),
    ("Montería", 5.2),
    ("Valledupar", 5.7),
];

const CUSTOM_CITY_HSP: f64 = 4.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplianceTemplate {
    pub name: &'static str,
    pub power_w: f64,
    pub hours_per_day: f64,
}

const ROUTINE_HOURS: f64 = 4.0;
const ALWAYS_ON_HOURS: f64 = 24.0;

pub const APPLIANCE_TEMPLATES: [ApplianceTemplate; 11] = [
    ApplianceTemplate { name: "LED bulb", power_w: 10.0, hours_per_day: ROUTINE_HOURS },
    ApplianceTemplate { name: "Phone charger", power_w: 10.0, hours_per_day: ROUTINE_HOURS },
    ApplianceTemplate { name: "Refrigerator", power_w: 150.0, hours_per_day: ALWAYS_ON_HOURS },
    ApplianceTemplate { name: "LED TV", power_w: 80.0, hours_per_day: ROUTINE_HOURS },
    ApplianceTemplate { name: "Wi-Fi router", power_w: 10.0, hours_per_day: ROUTINE_HOURS },
    ApplianceTemplate { name: "Laptop", power_w: 60.0, hours_per_day: ROUTINE_HOURS },
    ApplianceTemplate { name: "Fan", power_w: 50.0, hours_per_day: ROUTINE_HOURS },
    ApplianceTemplate { name: "Washing machine", power_w: 500.0, hours_per_day: ROUTINE_HOURS },
    ApplianceTemplate {
        name: "Air conditioner (9000 BTU)",
        power_w: 1000.0,
        hours_per_day: ROUTINE_HOURS,
    },
    ApplianceTemplate { name: "Microwave", power_w: 1000.0, hours_per_day: ROUTINE_HOURS },
    ApplianceTemplate { name: "Water pump (0.5 HP)", power_w: 375.0, hours_per_day: ROUTINE_HOURS },
];

pub fn appliance_template(name: &str) -> Option<&'static ApplianceTemplate> {
    APPLIANCE_TEMPLATES
        .iter()
        .find(|template| template.name.eq_ignore_ascii_case(name.trim()))
}

/// Read-only reference tables handed to the form layer and exporters.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    panels: Vec<PanelSpec>,
    cities: Vec<CityEntry>,
}

impl Catalog {
    pub fn new(panels: Vec<PanelSpec>, cities: Vec<CityEntry>) -> Result<Self> {
        if panels.is_empty() {
            bail!("catalog needs at least one panel");
        }
        let mut seen = BTreeSet::new();
        for panel in &panels {
            if !seen.insert(panel.id.as_str()) {
                bail!("duplicate panel id {:?} in catalog", panel.id);
            }
            if panel.rated_power_w == 0 {
                bail!("panel {:?} must have a positive rated power", panel.id);
            }
        }
        for city in &cities {
            if !(city.peak_sun_hours.is_finite() && city.peak_sun_hours > 0.0) {
                bail!(
                    "city {:?} has invalid peak sun hours {}",
                    city.name,
                    city.peak_sun_hours
                );
            }
        }
        Ok(Self { panels, cities })
    }

    pub fn builtin() -> Self {
        let panels = PANELS
            .iter()
            .map(|(id, brand, model, watts, cell)| PanelSpec {
                id: (*id).to_owned(),
                brand: (*brand).to_owned(),
                model: (*model).to_owned(),
                rated_power_w: *watts,
                cell_type: (*cell).to_owned(),
                price_estimate: None,
            })
            .collect();

        let mut cities: Vec<CityEntry> = CITIES
            .iter()
            .map(|(name, hsp)| CityEntry {
                name: (*name).to_owned(),
                peak_sun_hours: *hsp,
                is_custom: false,
            })
            .collect();
        cities.push(CityEntry {
            name: CUSTOM_CITY.to_owned(),
            peak_sun_hours: CUSTOM_CITY_HSP,
            is_custom: true,
        });

        Self { panels, cities }
    }

    pub fn panels(&self) -> &[PanelSpec] {
        &self.panels
    }

    pub fn cities(&self) -> &[CityEntry] {
        &self.cities
    }

    pub fn panel(&self, id: &str) -> Option<&PanelSpec> {
        self.panels.iter().find(|panel| panel.id == id.trim())
    }

    pub fn city(&self, name: &str) -> Option<&CityEntry> {
        let name = name.trim();
        self.cities
            .iter()
            .find(|city| city.name == name)
            .or_else(|| self.cities.iter().find(|city| city.name.eq_ignore_ascii_case(name)))
    }

    pub fn default_panel(&self) -> &PanelSpec {
        self.panel(DEFAULT_PANEL_ID).unwrap_or(&self.panels[0])
    }

    pub fn default_input(&self) -> SizingInput {
        let city = self.city(DEFAULT_CITY);
        SizingInput {
            calculation_mode: CalculationMode::Bill,
            city_name: city.map_or_else(|| CUSTOM_CITY.to_owned(), |city| city.name.clone()),
            customer: Customer::default(),
            monthly_bill_amount: 250_000.0,
            electricity_rate: 850.0,
            monthly_consumption_kwh: 294.0,
            peak_sun_hours: city.map_or(CUSTOM_CITY_HSP, |city| city.peak_sun_hours),
            selected_panel: self.default_panel().clone(),
            battery_voltage: 24.0,
            autonomy_days: 1.0,
            system_efficiency: 0.75,
            inverter_type: InverterType::OffGrid,
            appliances: Vec::new(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::{Catalog, CUSTOM_CITY, appliance_template};
    use crate::{CityEntry, PanelSpec};

    fn panel(id: &str, watts: u32) -> PanelSpec {
        PanelSpec {
            id: id.to_owned(),
            brand: "Test".to_owned(),
            model: "T".to_owned(),
            rated_power_w: watts,
            cell_type: "Mono".to_owned(),
            price_estimate: None,
        }
    }

    #[test]
    fn builtin_catalog_has_default_panel_and_custom_city() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.panels().len(), 9);
        assert_eq!(catalog.default_panel().rated_power_w, 550);

        let custom = catalog.city(CUSTOM_CITY).expect("custom placeholder");
        assert!(custom.is_custom);
        assert_eq!(catalog.cities().iter().filter(|city| city.is_custom).count(), 1);
    }

    #[test]
    fn city_lookup_is_exact_then_case_insensitive() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.city("Cali").map(|c| c.peak_sun_hours), Some(4.8));
        assert_eq!(catalog.city(" pasto ").map(|c| c.peak_sun_hours), Some(3.8));
        assert!(catalog.city("Lima").is_none());
    }

    #[test]
    fn default_input_matches_bill_scenario() {
        let input = Catalog::builtin().default_input();
        assert_eq!(input.city_name, "Medellín");
        assert_eq!(input.monthly_consumption_kwh, 294.0);
        assert_eq!(input.peak_sun_hours, 4.5);
        assert_eq!(input.selected_panel.id, "cs-550");
        assert!(input.appliances.is_empty());
    }

    #[test]
    fn new_rejects_empty_and_duplicate_panels() {
        assert!(Catalog::new(Vec::new(), Vec::new()).is_err());
        let error = Catalog::new(vec![panel("a", 400), panel("a", 500)], Vec::new())
            .expect_err("duplicate ids should fail");
        assert!(error.to_string().contains("duplicate panel id"));
        assert!(Catalog::new(vec![panel("z", 0)], Vec::new()).is_err());
    }

    #[test]
    fn new_rejects_non_positive_city_hsp() {
        let cities = vec![CityEntry {
            name: "Nowhere".to_owned(),
            peak_sun_hours: 0.0,
            is_custom: false,
        }];
        assert!(Catalog::new(vec![panel("a", 400)], cities).is_err());
    }

    #[test]
    fn fridge_template_runs_all_day() {
        let fridge = appliance_template("refrigerator").expect("fridge template");
        assert_eq!(fridge.hours_per_day, 24.0);
        assert_eq!(appliance_template("Laptop").map(|t| t.hours_per_day), Some(4.0));
    }
}
