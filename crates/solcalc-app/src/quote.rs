// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::{
    CustomItemId, InverterType, QuoteCategory, QuoteItem, SizingInput, SizingResult,
    format_decimal,
};

pub const BATTERY_BLOCK_VOLTAGE: f64 = 12.0;
pub const BATTERY_BLOCK_AH: f64 = 150.0;
pub const BATTERY_CABLE_COUNT: u32 = 6;

/// Unit prices in COP used for the initial bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceList {
    pub panel_unit: i64,
    pub inverter_per_watt: i64,
    pub charge_controller: i64,
    pub battery_block: i64,
    pub structure_per_panel: i64,
    pub surge_protector: i64,
    pub dc_breaker: i64,
    pub combiner_box: i64,
    pub pv_wiring_kit: i64,
    pub battery_cable: i64,
    pub grounding: i64,
    pub conduit: i64,
    pub labor_base: i64,
    pub labor_per_panel: i64,
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            panel_unit: 350_000,
            inverter_per_watt: 950,
            charge_controller: 450_000,
            battery_block: 950_000,
            structure_per_panel: 120_000,
            surge_protector: 150_000,
            dc_breaker: 85_000,
            combiner_box: 120_000,
            pv_wiring_kit: 150_000,
            battery_cable: 35_000,
            grounding: 180_000,
            conduit: 250_000,
            labor_base: 800_000,
            labor_per_panel: 50_000,
        }
    }
}

impl PriceList {
    pub fn entries(&self) -> [(&'static str, i64); 14] {
        [
            ("panel_unit", self.panel_unit),
            ("inverter_per_watt", self.inverter_per_watt),
            ("charge_controller", self.charge_controller),
            ("battery_block", self.battery_block),
            ("structure_per_panel", self.structure_per_panel),
            ("surge_protector", self.surge_protector),
            ("dc_breaker", self.dc_breaker),
            ("combiner_box", self.combiner_box),
            ("pv_wiring_kit", self.pv_wiring_kit),
            ("battery_cable", self.battery_cable),
            ("grounding", self.grounding),
            ("conduit", self.conduit),
            ("labor_base", self.labor_base),
            ("labor_per_panel", self.labor_per_panel),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        for (name, price) in self.entries() {
            if price < 0 {
                bail!("price {name} cannot be negative, got {price}");
            }
        }
        Ok(())
    }
}

/// Reference pictures attached to generated quote lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCatalog {
    pub panel: String,
    pub inverter_off_grid: String,
    pub inverter_on_grid: String,
    pub inverter_hybrid: String,
    pub controller: String,
    pub battery: String,
    pub structure: String,
    pub surge_protector: String,
    pub breaker: String,
    pub combiner_box: String,
    pub pv_cable: String,
    pub battery_cable: String,
    pub grounding: String,
    pub labor: String,
    pub custom_item: String,
}

impl Default for ImageCatalog {
    fn default() -> Self {
        Self {
            panel: "https://image.made-in-china.com/2f0j00UZuqiabrnyod/Jinko-Tiger-Neo-Bifacial-Solar-Panel-615-620-635-Watts-N-Type-PV-Modules.jpg".to_owned(),
            inverter_off_grid: "https://www.emergente.com.co/wp-content/uploads/2024/11/Inversor-Off-Grid-Growatt-SPF-3000TL-LVM-24V.webp".to_owned(),
            inverter_on_grid: "https://www.ecozaque.com/wp-content/uploads/2025/10/ph11-eu-001-600x600.jpg".to_owned(),
            inverter_hybrid: "https://www.ecogreensolar.co/wp-content/uploads/2024/11/Inversor-Hibrido-Must-4000W-48V-PV3300-Fase-Dividida-Ecogreensolar-02.webp".to_owned(),
            controller: "https://www.emergente.com.co/wp-content/uploads/2024/07/Controlador-Regulador-De-Carga-MPPT-de-20A-1.jpg".to_owned(),
            battery: "https://cosostenible.com/wp-content/uploads/2025/07/varias-baterias-de-litio-1024x576.png".to_owned(),
            structure: "https://selfersac.com.pe/wp-content/uploads/2023/11/accesorios.png".to_owned(),
            surge_protector: "https://cdn.autosolar.co/images/7102527/dps-solar-dc-2p-600vdc-2040ka-moreday.jpg".to_owned(),
            breaker: "https://www.solar4rvs.com.au/assets/full/Noa-84453.png?20230529192912".to_owned(),
            combiner_box: "https://m.media-amazon.com/images/I/71lplr1DvOL._AC_SL1500_.jpg".to_owned(),
            pv_cable: "https://m.media-amazon.com/images/I/717imcxp-VL.jpg".to_owned(),
            battery_cable: "https://www.sunrichenergy.com/cdn/shop/files/Sunrich_Energy_Inverter_Battery_Cables_2.jpg?v=1721716195".to_owned(),
            grounding: "https://transequipos.com/wp-content/uploads/2024/08/importancia-sistema-puesta-tierra.jpg".to_owned(),
            labor: "https://unies.edu.co/wp-content/uploads/2021/10/ENERGIAS-LIMPIAS-768x576.png".to_owned(),
            custom_item: "https://images.unsplash.com/photo-1621905251189-08b45d6a269e?auto=format&fit=crop&q=80&w=300&h=200".to_owned(),
        }
    }
}

/// Maps a sizing result to the initial bill of materials.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuoteGenerator {
    prices: PriceList,
    images: ImageCatalog,
}

impl QuoteGenerator {
    pub fn new(prices: PriceList, images: ImageCatalog) -> Self {
        Self { prices, images }
    }

    pub fn prices(&self) -> &PriceList {
        &self.prices
    }

    /// Builds the full item list from scratch; earlier edits are never merged in.
    pub fn generate(&self, input: &SizingInput, result: &SizingResult) -> Vec<QuoteItem> {
        let prices = &self.prices;
        let images = &self.images;
        let panel = &input.selected_panel;
        let panels = result.number_of_panels;
        let inverter_w = result.inverter.suggested_size_w;
        let voltage = format_decimal(input.battery_voltage);
        let mut items = Vec::with_capacity(13);

        items.push(QuoteItem {
            id: "panel-main".to_owned(),
            category: QuoteCategory::Generation,
            name: format!("Solar Panel {} {}W", panel.brand, panel.rated_power_w),
            description: format!("{} - High efficiency - RETIE certified", panel.cell_type),
            quantity: panels,
            unit_price: panel.price_estimate.unwrap_or(prices.panel_unit),
            image_url: Some(images.panel.clone()),
        });

        let (inverter_description, inverter_image) = match input.inverter_type {
            InverterType::OnGrid => (
                format!("Grid-Tie {inverter_w}W - Grid connection - WiFi monitoring"),
                &images.inverter_on_grid,
            ),
            InverterType::Hybrid => (
                format!("Hybrid {inverter_w}W - Smart grid/battery management"),
                &images.inverter_hybrid,
            ),
            InverterType::OffGrid => (
                format!("Capacity {inverter_w}W - Pure sine wave"),
                &images.inverter_off_grid,
            ),
        };
        items.push(QuoteItem {
            id: "inverter-main".to_owned(),
            category: QuoteCategory::PowerElectronics,
            name: format!("Inverter {}", result.inverter.type_label),
            description: inverter_description,
            quantity: 1,
            unit_price: i64::from(inverter_w) * prices.inverter_per_watt,
            image_url: Some(inverter_image.clone()),
        });

        // Hybrid units carry their own MPPT stage and grid-tie units feed the grid directly.
        if input.inverter_type == InverterType::OffGrid && !result.inverter.denotes_hybrid() {
            let array_w = f64::from(panels) * f64::from(panel.rated_power_w);
            let controller_amps = (array_w / input.battery_voltage).ceil() as u32;
            items.push(QuoteItem {
                id: "controller".to_owned(),
                category: QuoteCategory::PowerElectronics,
                name: format!("MPPT Charge Controller {controller_amps}A"),
                description: format!("98% efficiency - LCD display - {voltage}V auto"),
                quantity: 1,
                unit_price: prices.charge_controller,
                image_url: Some(images.controller.clone()),
            });
        }

        let needs_battery = input.needs_battery_bank();
        if needs_battery {
            items.push(QuoteItem {
                id: "battery-bank".to_owned(),
                category: QuoteCategory::Storage,
                name: format!(
                    "Deep-Cycle Gel Battery {}V {}Ah",
                    format_decimal(BATTERY_BLOCK_VOLTAGE),
                    format_decimal(BATTERY_BLOCK_AH)
                ),
                description: "VRLA technology - Maintenance free - 5-7 year service life"
                    .to_owned(),
                quantity: battery_blocks(result.battery_capacity_ah, input.battery_voltage),
                unit_price: prices.battery_block,
                image_url: Some(images.battery.clone()),
            });
        }

        items.push(QuoteItem {
            id: "structure".to_owned(),
            category: QuoteCategory::Structure,
            name: "Certified Aluminium Mounting System".to_owned(),
            description: format!(
                "Anodized rails, clamps, L-feet and stainless hardware for {panels} modules"
            ),
            quantity: 1,
            unit_price: i64::from(panels) * prices.structure_per_panel,
            image_url: Some(images.structure.clone()),
        });

        items.push(QuoteItem {
            id: "dps-dc".to_owned(),
            category: QuoteCategory::Protection,
            name: "DC Surge Protector 600V".to_owned(),
            description: "Lightning protection device (Class II)".to_owned(),
            quantity: 1,
            unit_price: prices.surge_protector,
            image_url: Some(images.surge_protector.clone()),
        });

        let breaker_amps = result.inverter.suggested_breaker_amps;
        items.push(QuoteItem {
            id: "breaker-dc".to_owned(),
            category: QuoteCategory::Protection,
            name: format!("DC Breaker {breaker_amps}A 2P (C curve)"),
            description: format!("Thermomagnetic breaker for direct current, rated {breaker_amps}A"),
            quantity: 1,
            unit_price: prices.dc_breaker,
            image_url: Some(images.breaker.clone()),
        });

        items.push(QuoteItem {
            id: "box-combiner".to_owned(),
            category: QuoteCategory::Protection,
            name: "IP65 Combiner Box".to_owned(),
            description: "Weatherproof distribution board with DIN rail".to_owned(),
            quantity: 1,
            unit_price: prices.combiner_box,
            image_url: Some(images.combiner_box.clone()),
        });

        items.push(QuoteItem {
            id: "cable-pv-kit".to_owned(),
            category: QuoteCategory::Wiring,
            name: "Solar PV Wiring Kit 10 AWG (Red/Black)".to_owned(),
            description: "XLPE PV cable 90°C UV 1.5kV - 40 metres total".to_owned(),
            quantity: 1,
            unit_price: prices.pv_wiring_kit,
            image_url: Some(images.pv_cable.clone()),
        });

        if needs_battery {
            let gauge = battery_cable_gauge(result.inverter.dc_current_a());
            items.push(QuoteItem {
                id: "cable-batt".to_owned(),
                category: QuoteCategory::Wiring,
                name: format!("Battery Power Cable {gauge}"),
                description: "Extra-tough flexible cable for power connections".to_owned(),
                quantity: BATTERY_CABLE_COUNT,
                unit_price: prices.battery_cable,
                image_url: Some(images.battery_cable.clone()),
            });
        }

        items.push(QuoteItem {
            id: "grounding".to_owned(),
            category: QuoteCategory::InstallationServices,
            name: "Grounding System".to_owned(),
            description: "2.4m copper-bonded rod + connectors + bare conductor".to_owned(),
            quantity: 1,
            unit_price: prices.grounding,
            image_url: Some(images.grounding.clone()),
        });

        items.push(QuoteItem {
            id: "conduits".to_owned(),
            category: QuoteCategory::InstallationServices,
            name: "Conduit and Accessories".to_owned(),
            description: "EMT/PVC conduit, bends, condulets and terminals".to_owned(),
            quantity: 1,
            unit_price: prices.conduit,
            image_url: Some(images.structure.clone()),
        });

        items.push(QuoteItem {
            id: "labor".to_owned(),
            category: QuoteCategory::InstallationServices,
            name: "Certified Engineering and Installation".to_owned(),
            description: "Design, installation and commissioning".to_owned(),
            quantity: 1,
            unit_price: prices.labor_base + i64::from(panels) * prices.labor_per_panel,
            image_url: Some(images.labor.clone()),
        });

        items
    }

    pub fn custom_item_image(&self) -> &str {
        &self.images.custom_item
    }
}

/// Generates the initial quote with the default price list.
pub fn generate_quote(input: &SizingInput, result: &SizingResult) -> Vec<QuoteItem> {
    QuoteGenerator::default().generate(input, result)
}

/// Number of 12 V blocks needed to hold the bank's energy, never fewer than one.
pub fn battery_blocks(battery_capacity_ah: f64, battery_voltage: f64) -> u32 {
    let total_wh = battery_capacity_ah * battery_voltage;
    let block_wh = BATTERY_BLOCK_VOLTAGE * BATTERY_BLOCK_AH;
    ((total_wh / block_wh).ceil() as u32).max(1)
}

pub fn battery_cable_gauge(current_a: f64) -> &'static str {
    if current_a > 150.0 {
        "1/0 AWG"
    } else if current_a > 100.0 {
        "2 AWG"
    } else {
        "4 AWG"
    }
}

/// An editable quote. Edits last until the next calculation replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    items: Vec<QuoteItem>,
    next_custom: CustomItemId,
}

impl Default for Quote {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Quote {
    pub fn new(items: Vec<QuoteItem>) -> Self {
        Self {
            items,
            next_custom: CustomItemId::new(1),
        }
    }

    pub fn items(&self) -> &[QuoteItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&QuoteItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn total(&self) -> i64 {
        quote_total(&self.items)
    }

    pub fn by_category(&self) -> Vec<(QuoteCategory, Vec<&QuoteItem>)> {
        group_by_category(&self.items)
    }

    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> Result<()> {
        self.item_mut(id)?.quantity = quantity;
        Ok(())
    }

    pub fn set_unit_price(&mut self, id: &str, unit_price: i64) -> Result<()> {
        if unit_price < 0 {
            bail!("unit price for {id:?} cannot be negative");
        }
        self.item_mut(id)?.unit_price = unit_price;
        Ok(())
    }

    pub fn set_category(&mut self, id: &str, category: QuoteCategory) -> Result<()> {
        self.item_mut(id)?.category = category;
        Ok(())
    }

    pub fn rename(&mut self, id: &str, name: &str, description: &str) -> Result<()> {
        if name.trim().is_empty() {
            bail!("quote item name is required -- enter a name and retry");
        }
        let item = self.item_mut(id)?;
        item.name = name.trim().to_owned();
        item.description = description.trim().to_owned();
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<QuoteItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| anyhow!("quote item {id:?} not found"))?;
        Ok(self.items.remove(index))
    }

    pub fn add_custom_item(&mut self, image_url: Option<String>) -> &QuoteItem {
        let id = self.next_custom;
        self.next_custom = id.next();
        self.items.push(QuoteItem {
            id: format!("custom-{}", id.get()),
            category: QuoteCategory::InstallationServices,
            name: "Additional item".to_owned(),
            description: "Item description".to_owned(),
            quantity: 1,
            unit_price: 0,
            image_url,
        });
        &self.items[self.items.len() - 1]
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut QuoteItem> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| anyhow!("quote item {id:?} not found"))
    }
}

pub fn quote_total(items: &[QuoteItem]) -> i64 {
    items.iter().map(QuoteItem::subtotal).sum()
}

/// Groups items in display order; categories without items are skipped.
pub fn group_by_category(items: &[QuoteItem]) -> Vec<(QuoteCategory, Vec<&QuoteItem>)> {
    QuoteCategory::DISPLAY_ORDER
        .iter()
        .filter_map(|category| {
            let members: Vec<&QuoteItem> = items
                .iter()
                .filter(|item| item.category == *category)
                .collect();
            (!members.is_empty()).then_some((*category, members))
        })
        .collect()
}
