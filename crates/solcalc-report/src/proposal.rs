// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use solcalc_app::{CalculationMode, QuoteItem, SizingInput, SizingResult, format_decimal};
use time::{Date, OffsetDateTime};

use crate::json::unix_millis;
use crate::money::{format_cop, format_cop_f64};

pub const PAGE_WIDTH: usize = 80;
/// Body lines per page; the footer is printed below them.
pub const LINES_PER_PAGE: usize = 56;

const NAME_LIMIT: usize = 45;
const DESCRIPTION_LIMIT: usize = 60;
const INDENT: &str = "  ";
const PAGE_BREAK: char = '\u{c}';

/// Printable proposal split into fixed-height pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalReport {
    pages: Vec<Vec<String>>,
    footer_name: String,
    date: String,
}

impl ProposalReport {
    pub fn build(
        input: &SizingInput,
        result: &SizingResult,
        quote: &[QuoteItem],
        narrative: Option<&str>,
        date: Date,
    ) -> Self {
        let mut writer = PageWriter::default();
        let date = date.to_string();

        write_header(&mut writer, input, &date);
        write_location(&mut writer, input, result);
        write_equipment(&mut writer, input);
        write_summary(&mut writer, input, result);
        if !quote.is_empty() {
            write_offer(&mut writer, quote);
        }
        if let Some(text) = narrative.filter(|text| !text.trim().is_empty()) {
            write_analysis(&mut writer, text);
        }

        let footer_name = if input.customer.name.trim().is_empty() {
            "Customer".to_owned()
        } else {
            input.customer.name.trim().to_owned()
        };

        Self {
            pages: writer.finish(),
            footer_name,
            date,
        }
    }

    pub fn pages(&self) -> &[Vec<String>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn footer(&self, page: usize) -> String {
        let text = format!(
            "solcalc - Proposal for {} - {} - Page {}/{}",
            self.footer_name,
            self.date,
            page,
            self.page_count()
        );
        center(&text, PAGE_WIDTH)
    }

    /// Pages are padded to full height and separated by form feeds.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, page) in self.pages.iter().enumerate() {
            if index > 0 {
                out.push(PAGE_BREAK);
            }
            for line in page {
                out.push_str(line.trim_end());
                out.push('\n');
            }
            for _ in page.len()..LINES_PER_PAGE {
                out.push('\n');
            }
            out.push_str(self.footer(index + 1).trim_end());
            out.push('\n');
        }
        out
    }
}

pub fn proposal_file_name(input: &SizingInput, generated_at: OffsetDateTime) -> String {
    let name = input.customer.name.trim();
    if name.is_empty() {
        format!(
            "solar-report-{}-{}.txt",
            file_name_part(input.city_name.trim()),
            unix_millis(generated_at)
        )
    } else {
        format!("solar-proposal-{}.txt", file_name_part(name))
    }
}

/// Strips the markdown markers a plain-text page cannot show.
pub fn clean_markdown(text: &str) -> String {
    text.replace("**", "").replace("##", "").replace('*', "•")
}

#[derive(Debug, Default)]
struct PageWriter {
    pages: Vec<Vec<String>>,
    current: Vec<String>,
}

impl PageWriter {
    fn line(&mut self, text: impl Into<String>) {
        if self.current.len() >= LINES_PER_PAGE {
            self.new_page();
        }
        self.current.push(text.into());
    }

    fn blank(&mut self) {
        if !self.current.is_empty() {
            self.line("");
        }
    }

    fn ensure(&mut self, lines: usize) {
        if self.current.len() + lines > LINES_PER_PAGE {
            self.new_page();
        }
    }

    fn new_page(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }
    }

    fn section(&mut self, title: &str) {
        self.ensure(4);
        self.blank();
        self.line(title);
        self.line("-".repeat(title.chars().count()));
    }

    fn finish(mut self) -> Vec<Vec<String>> {
        self.new_page();
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        self.pages
    }
}

fn write_header(writer: &mut PageWriter, input: &SizingInput, date: &str) {
    let date_label = format!("Date: {date}");
    writer.line(two_columns("SOLCALC", &date_label, PAGE_WIDTH));
    writer.line("Technical and Economic Proposal");
    writer.line("=".repeat(PAGE_WIDTH));

    let customer = &input.customer;
    writer.section("Customer Information");
    writer.line(pair(
        &format!("Name: {}", or_na(&customer.name)),
        &format!("Email: {}", or_na(&customer.email)),
    ));
    writer.line(pair(
        &format!("Phone: {}", or_na(&customer.phone)),
        &format!("Address: {}", or_na(&customer.address)),
    ));
}

fn write_location(writer: &mut PageWriter, input: &SizingInput, result: &SizingResult) {
    writer.section("1. Location and Financial Data");
    writer.line(pair(
        &format!("City: {}", input.city_name),
        &format!(
            "Solar resource (HSP): {} h",
            format_decimal(input.peak_sun_hours)
        ),
    ));
    if input.calculation_mode == CalculationMode::Bill {
        writer.line(pair(
            &format!(
                "Average current bill: {}",
                format_cop_f64(input.monthly_bill_amount)
            ),
            &format!("Unit cost per kWh: {}", format_cop_f64(input.electricity_rate)),
        ));
    }
    writer.line(pair(
        &format!("System voltage: {} VDC", format_decimal(input.battery_voltage)),
        &format!("Autonomy: {} day(s)", format_decimal(input.autonomy_days)),
    ));
    let consumption = match input.calculation_mode {
        CalculationMode::Bill => format!(
            "Calculated consumption: {} kWh/month",
            format_decimal(input.monthly_consumption_kwh)
        ),
        CalculationMode::LoadAnalysis => format!(
            "Calculated daily load: {:.2} kWh/day",
            result.daily_consumption_wh / 1000.0
        ),
    };
    writer.line(format!("{INDENT}{consumption}"));
}

fn write_equipment(writer: &mut PageWriter, input: &SizingInput) {
    let panel = &input.selected_panel;
    writer.section("2. Generation Equipment (Panels)");
    writer.line(pair(
        &format!("Brand: {}", panel.brand),
        &format!("Model: {}", panel.model),
    ));
    writer.line(pair(
        &format!("Unit power: {} W", panel.rated_power_w),
        &format!("Technology: {}", panel.cell_type),
    ));
}

fn write_summary(writer: &mut PageWriter, input: &SizingInput, result: &SizingResult) {
    let voltage = format_decimal(input.battery_voltage);
    writer.section("3. System Summary (Results)");
    let bullets = [
        format!("Number of panels: {} units", result.number_of_panels),
        format!(
            "Installed array power: {:.2} kWp",
            result.installed_power_kwp(&input.selected_panel)
        ),
        format!(
            "Estimated daily generation: {:.2} kWh/day",
            result.estimated_generation_daily_wh / 1000.0
        ),
        format!(
            "Battery bank: {} Ah (@ {voltage}V)",
            result.battery_capacity_ah.round()
        ),
        format!(
            "Storage capacity: {:.2} kWh",
            result.storage_kwh(input.battery_voltage)
        ),
        format!("Suggested inverter: {} W", result.inverter.suggested_size_w),
        format!("Type: {}", result.inverter.type_label),
        format!(
            "Suggested DC protection: {} A breaker",
            result.inverter.suggested_breaker_amps
        ),
    ];
    for bullet in bullets {
        writer.line(format!("{INDENT}• {bullet}"));
    }
}

fn write_offer(writer: &mut PageWriter, quote: &[QuoteItem]) {
    writer.new_page();
    writer.section("4. Economic Offer (Bill of Materials)");
    writer.line(table_row("Item / Description", "Qty", "Unit price", "Total"));
    writer.line("-".repeat(PAGE_WIDTH));

    let mut grand_total = 0_i64;
    for item in quote {
        let subtotal = item.subtotal();
        grand_total += subtotal;
        writer.ensure(2);
        writer.line(table_row(
            &truncate(&item.name, NAME_LIMIT),
            &item.quantity.to_string(),
            &format_cop(item.unit_price),
            &format_cop(subtotal),
        ));
        writer.line(format!(
            "{INDENT}{}",
            truncate(&item.description, DESCRIPTION_LIMIT)
        ));
    }

    writer.ensure(3);
    writer.line("=".repeat(PAGE_WIDTH));
    writer.line(two_columns(
        "PROJECT TOTAL:",
        &format_cop(grand_total),
        PAGE_WIDTH,
    ));
}

fn write_analysis(writer: &mut PageWriter, text: &str) {
    let lines = wrap_text(&clean_markdown(text), PAGE_WIDTH - INDENT.len());
    writer.section("5. Detailed Technical Analysis (AI)");
    if writer.current.len() + lines.len() > LINES_PER_PAGE && lines.len() <= LINES_PER_PAGE - 3 {
        let heading = writer.current.split_off(writer.current.len() - 2);
        writer.new_page();
        writer.current = heading;
    }
    for line in lines {
        if line.is_empty() {
            writer.line("");
        } else {
            writer.line(format!("{INDENT}{line}"));
        }
    }
}

fn table_row(name: &str, quantity: &str, unit: &str, total: &str) -> String {
    format!(
        "{name:<width$} {quantity:>5} {unit:>13} {total:>13}",
        width = NAME_LIMIT
    )
}

fn pair(left: &str, right: &str) -> String {
    let column = PAGE_WIDTH / 2;
    let left = format!("{INDENT}{left}");
    let padding = column.saturating_sub(left.chars().count()).max(1);
    format!("{left}{}{right}", " ".repeat(padding))
}

fn two_columns(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    let padding = width.saturating_sub(used).max(1);
    format!("{left}{}{right}", " ".repeat(padding))
}

fn center(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.chars().count()) / 2;
    format!("{}{text}", " ".repeat(padding))
}

fn or_na(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() { "N/A" } else { trimmed }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Whitespace, path separators and characters Windows forbids become `_`.
fn file_name_part(value: &str) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_whitespace()
                || ch.is_control()
                || matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
            {
                '_'
            } else {
                ch
            }
        })
        .collect()
}

/// Greedy word wrap; blank input lines are kept as paragraph breaks.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
        lines.push(current);
    }
    lines
}
