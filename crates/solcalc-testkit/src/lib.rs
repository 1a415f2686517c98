// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use solcalc_app::{
    APPLIANCE_TEMPLATES, Appliance, ApplianceId, CalculationMode, Catalog, Customer,
    InverterType, SizingInput,
};
use std::path::PathBuf;

const FIRST_NAMES: [&str; 14] = [
    "Valentina", "Santiago", "Camila", "Mateo", "Isabella", "Sebastián", "Mariana", "Nicolás",
    "Daniela", "Samuel", "Gabriela", "Alejandro", "Lucía", "Tomás",
];
const LAST_NAMES: [&str; 14] = [
    "Restrepo", "Gómez", "Rodríguez", "Martínez", "García", "López", "Hernández", "Zapata",
    "Ospina", "Castaño", "Vargas", "Moreno", "Jaramillo", "Cárdenas",
];
const STREET_KINDS: [&str; 4] = ["Calle", "Carrera", "Avenida", "Transversal"];
const VOLTAGES: [f64; 3] = [12.0, 24.0, 48.0];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1_u64 << 53) as f64
    }
}

/// Seeded generator of plausible household loads and sizing inputs.
#[derive(Debug, Clone)]
pub struct LoadFaker {
    rng: DeterministicRng,
    next_id: ApplianceId,
    catalog: Catalog,
}

impl LoadFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: ApplianceId::new(1),
            catalog: Catalog::builtin(),
        }
    }

    pub fn int_range(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        min + self.rng.int_n((max - min + 1) as usize) as u32
    }

    /// Uniform in `[min, max)`, rounded to one decimal.
    pub fn float_range(&mut self, min: f64, max: f64) -> f64 {
        let value = min + (max - min) * self.rng.unit();
        (value * 10.0).floor() / 10.0
    }

    pub fn appliance(&mut self) -> Appliance {
        let template = APPLIANCE_TEMPLATES[self.rng.int_n(APPLIANCE_TEMPLATES.len())];
        let id = self.next_id;
        self.next_id = id.next();
        Appliance {
            id,
            name: template.name.to_owned(),
            power_w: template.power_w,
            quantity: self.int_range(1, 6),
            hours_per_day: self.float_range(0.0, 24.0),
        }
    }

    pub fn appliance_set(&mut self, max_len: u32) -> Vec<Appliance> {
        let len = self.int_range(0, max_len);
        (0..len).map(|_| self.appliance()).collect()
    }

    pub fn customer(&mut self) -> Customer {
        let first = FIRST_NAMES[self.rng.int_n(FIRST_NAMES.len())];
        let last = LAST_NAMES[self.rng.int_n(LAST_NAMES.len())];
        let street = STREET_KINDS[self.rng.int_n(STREET_KINDS.len())];
        Customer {
            name: format!("{first} {last}"),
            address: format!(
                "{street} {} # {}-{}",
                self.int_range(1, 120),
                self.int_range(1, 99),
                self.int_range(1, 99)
            ),
            phone: format!("300{:07}", self.int_range(0, 9_999_999)),
            email: format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase()),
        }
    }

    /// A valid input in either mode, against a random panel and city.
    pub fn sizing_input(&mut self) -> SizingInput {
        let mut input = self.catalog.default_input();
        let panels = self.catalog.panels();
        input.selected_panel = panels[self.rng.int_n(panels.len())].clone();
        let cities = self.catalog.cities();
        let city = &cities[self.rng.int_n(cities.len())];
        input.city_name = city.name.clone();
        input.peak_sun_hours = city.peak_sun_hours;
        input.battery_voltage = VOLTAGES[self.rng.int_n(VOLTAGES.len())];
        input.autonomy_days = f64::from(self.int_range(0, 3));
        input.system_efficiency = self.float_range(0.6, 0.95);
        input.inverter_type = InverterType::ALL[self.rng.int_n(InverterType::ALL.len())];
        input.customer = self.customer();

        if self.rng.int_n(2) == 0 {
            input.calculation_mode = CalculationMode::Bill;
            input.monthly_consumption_kwh = f64::from(self.int_range(0, 1200));
        } else {
            input.calculation_mode = CalculationMode::LoadAnalysis;
            input.appliances = self.appliance_set(12);
        }
        input
    }
}

/// The 294 kWh Medellín bill scenario.
pub fn bill_input() -> SizingInput {
    Catalog::builtin().default_input()
}

/// A single always-on refrigerator in load-analysis mode.
pub fn fridge_input() -> SizingInput {
    let mut input = Catalog::builtin().default_input();
    input.calculation_mode = CalculationMode::LoadAnalysis;
    input.appliances = vec![Appliance {
        id: ApplianceId::new(1),
        name: "Refrigerator".to_owned(),
        power_w: 150.0,
        quantity: 1,
        hours_per_day: 24.0,
    }];
    input
}

pub fn temp_export_dir() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let export_dir = dir.path().join("exports");
    Ok((dir, export_dir))
}

pub fn fixture_timestamp_millis() -> i64 {
    1_771_504_496_000
}
