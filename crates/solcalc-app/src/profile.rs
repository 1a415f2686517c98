// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::{SizingInput, SizingResult};

const SUNRISE_HOUR: u32 = 6;
const SUNSET_HOUR: u32 = 18;
/// Shapes the half-sine so its area roughly matches the daily estimate.
const CURVE_SPREAD: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub hour: String,
    pub production: i64,
    pub consumption: i64,
}

/// Illustrative 24-hour production and flat consumption curve for charts.
pub fn hourly_profile(input: &SizingInput, result: &SizingResult) -> Vec<HourlyPoint> {
    let consumption = (result.daily_consumption_wh / 24.0).round() as i64;
    (0..24)
        .map(|hour| {
            let production = if (SUNRISE_HOUR..=SUNSET_HOUR).contains(&hour) {
                let angle = f64::from(hour - SUNRISE_HOUR) * PI / 12.0;
                let watts = result.estimated_generation_daily_wh * angle.sin()
                    / (input.peak_sun_hours * CURVE_SPREAD);
                (watts.round() as i64).max(0)
            } else {
                0
            };
            HourlyPoint {
                hour: format!("{hour}:00"),
                production,
                consumption,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::hourly_profile;
    use crate::{Catalog, calculate};

    #[test]
    fn production_is_zero_at_night_and_peaks_at_noon() {
        let input = Catalog::builtin().default_input();
        let result = calculate(&input).expect("valid input");
        let profile = hourly_profile(&input, &result);

        assert_eq!(profile.len(), 24);
        assert_eq!(profile[0].hour, "0:00");
        for point in profile.iter().take(6).chain(profile.iter().skip(19)) {
            assert_eq!(point.production, 0, "hour {}", point.hour);
        }
        let peak = profile
            .iter()
            .max_by_key(|point| point.production)
            .expect("non-empty profile");
        assert_eq!(peak.hour, "12:00");
        // 11 137.5 Wh / (4.5 h * 1.5)
        assert_eq!(peak.production, 1650);
        assert_eq!(profile[18].production, 0);
    }

    #[test]
    fn consumption_is_flat_share_of_daily_energy() {
        let input = Catalog::builtin().default_input();
        let result = calculate(&input).expect("valid input");
        let profile = hourly_profile(&input, &result);
        // 9 800 Wh / 24 = 408.3
        assert!(profile.iter().all(|point| point.consumption == 408));
    }
}
