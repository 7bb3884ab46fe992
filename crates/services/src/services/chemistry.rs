//! Water balance evaluation and dosing recommendations.
//!
//! Concentrations are ppm (mg/L), temperature °C, volumes litres. Dose rates
//! are rule-of-thumb figures per 1000 L and assume commercial-strength
//! products (12.5% liquid chlorine, 77% calcium chloride flake).

use db::{
    models::{
        unit::{Unit, UnitType, WaterType},
        water_test::WaterReadings,
    },
    validation::ValidationError,
};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Parameter {
    Ph,
    FreeChlorine,
    TotalAlkalinity,
    CalciumHardness,
    CyanuricAcid,
    Salt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Ok,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn level(&self, value: f64) -> Level {
        if value < self.min {
            Level::Low
        } else if value > self.max {
            Level::High
        } else {
            Level::Ok
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Target ranges for one body of water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TargetRanges {
    pub ph: Range,
    pub free_chlorine: Range,
    pub total_alkalinity: Range,
    pub calcium_hardness: Range,
    pub cyanuric_acid: Range,
    pub salt: Option<Range>,
}

impl TargetRanges {
    pub fn for_unit(unit_type: UnitType, water_type: WaterType, is_indoor: bool) -> Self {
        let spa = unit_type == UnitType::Spa;
        TargetRanges {
            ph: Range::new(7.2, 7.6),
            free_chlorine: match (spa, water_type) {
                (_, WaterType::Bromine) => Range::new(3.0, 5.0),
                (true, _) => Range::new(3.0, 5.0),
                (false, _) => Range::new(1.0, 3.0),
            },
            total_alkalinity: Range::new(80.0, 120.0),
            calcium_hardness: if spa {
                Range::new(150.0, 250.0)
            } else {
                Range::new(200.0, 400.0)
            },
            cyanuric_acid: if spa || is_indoor {
                Range::new(0.0, 30.0)
            } else {
                Range::new(30.0, 50.0)
            },
            salt: (water_type == WaterType::Salt).then_some(Range::new(2700.0, 3400.0)),
        }
    }

    fn range(&self, parameter: Parameter) -> Option<Range> {
        match parameter {
            Parameter::Ph => Some(self.ph),
            Parameter::FreeChlorine => Some(self.free_chlorine),
            Parameter::TotalAlkalinity => Some(self.total_alkalinity),
            Parameter::CalciumHardness => Some(self.calcium_hardness),
            Parameter::CyanuricAcid => Some(self.cyanuric_acid),
            Parameter::Salt => self.salt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ParameterCheck {
    pub parameter: Parameter,
    pub value: f64,
    pub target: Range,
    pub level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum LsiStatus {
    Corrosive,
    Balanced,
    Scaling,
}

impl LsiStatus {
    pub fn from_index(lsi: f64) -> Self {
        if lsi < -0.3 {
            LsiStatus::Corrosive
        } else if lsi > 0.3 {
            LsiStatus::Scaling
        } else {
            LsiStatus::Balanced
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct WaterBalance {
    pub checks: Vec<ParameterCheck>,
    pub lsi: Option<f64>,
    pub lsi_status: Option<LsiStatus>,
    pub combined_chlorine: Option<f64>,
}

impl WaterBalance {
    pub fn check(&self, parameter: Parameter) -> Option<&ParameterCheck> {
        self.checks.iter().find(|c| c.parameter == parameter)
    }

    pub fn is_balanced(&self) -> bool {
        self.checks.iter().all(|c| c.level == Level::Ok)
            && self.lsi_status.is_none_or(|s| s == LsiStatus::Balanced)
    }
}

fn measured(readings: &WaterReadings) -> [(Parameter, Option<f64>); 6] {
    [
        (Parameter::Ph, readings.ph),
        (Parameter::FreeChlorine, readings.free_chlorine),
        (Parameter::TotalAlkalinity, readings.total_alkalinity),
        (Parameter::CalciumHardness, readings.calcium_hardness),
        (Parameter::CyanuricAcid, readings.cyanuric_acid),
        (Parameter::Salt, readings.salt),
    ]
}

pub fn evaluate(
    unit_type: UnitType,
    water_type: WaterType,
    is_indoor: bool,
    readings: &WaterReadings,
) -> WaterBalance {
    let targets = TargetRanges::for_unit(unit_type, water_type, is_indoor);
    let checks = measured(readings)
        .into_iter()
        .filter_map(|(parameter, value)| {
            let value = value?;
            let target = targets.range(parameter)?;
            Some(ParameterCheck {
                parameter,
                value,
                target,
                level: target.level(value),
            })
        })
        .collect();
    let lsi = langelier_index(readings, water_type == WaterType::Salt);
    WaterBalance {
        checks,
        lsi,
        lsi_status: lsi.map(LsiStatus::from_index),
        combined_chlorine: readings.combined_chlorine(),
    }
}

/// (°C, factor) pairs; intermediate temperatures are interpolated.
const TEMPERATURE_FACTORS: [(f64, f64); 11] = [
    (0.0, 0.0),
    (3.3, 0.1),
    (7.8, 0.2),
    (11.7, 0.3),
    (15.6, 0.4),
    (18.9, 0.5),
    (24.4, 0.6),
    (28.9, 0.7),
    (34.4, 0.8),
    (40.6, 0.9),
    (53.3, 1.0),
];

fn temperature_factor(celsius: f64) -> f64 {
    let (first, last) = (TEMPERATURE_FACTORS[0], TEMPERATURE_FACTORS[10]);
    if celsius <= first.0 {
        return first.1;
    }
    if celsius >= last.0 {
        return last.1;
    }
    TEMPERATURE_FACTORS
        .windows(2)
        .find(|w| celsius <= w[1].0)
        .map(|w| {
            let ((t0, f0), (t1, f1)) = (w[0], w[1]);
            f0 + (f1 - f0) * (celsius - t0) / (t1 - t0)
        })
        .unwrap_or(last.1)
}

/// Langelier Saturation Index. Needs pH, temperature, calcium hardness and
/// total alkalinity; alkalinity is corrected for cyanurate when CYA is known.
pub fn langelier_index(readings: &WaterReadings, salt_water: bool) -> Option<f64> {
    let ph = readings.ph?;
    let temperature = readings.temperature_c?;
    let hardness = readings.calcium_hardness?;
    let alkalinity = readings.total_alkalinity?;
    let carbonate_alkalinity = alkalinity - readings.cyanuric_acid.unwrap_or(0.0) / 3.0;
    if hardness <= 0.0 || carbonate_alkalinity <= 0.0 {
        return None;
    }
    let tds_factor = if salt_water { 12.2 } else { 12.1 };
    let lsi = ph + temperature_factor(temperature) + (hardness.log10() - 0.4)
        + carbonate_alkalinity.log10()
        - tds_factor;
    Some((lsi * 100.0).round() / 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct DosingRecommendation {
    pub parameter: Parameter,
    pub chemical: String,
    pub quantity: f64,
    pub unit_of_measure: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct DosingPlan {
    pub volume_litres: f64,
    pub balance: WaterBalance,
    pub recommendations: Vec<DosingRecommendation>,
}

/// Grams (or millilitres) per 1000 L to move a parameter by `step` ppm.
struct Rate {
    chemical: &'static str,
    unit_of_measure: &'static str,
    per_kilolitre: f64,
    step: f64,
}

const SODA_ASH: Rate = Rate {
    chemical: "Soda ash",
    unit_of_measure: "g",
    per_kilolitre: 7.5,
    step: 0.1,
};
const DRY_ACID: Rate = Rate {
    chemical: "Dry acid (sodium bisulfate)",
    unit_of_measure: "g",
    per_kilolitre: 10.0,
    step: 0.1,
};
const LIQUID_CHLORINE: Rate = Rate {
    chemical: "Liquid chlorine",
    unit_of_measure: "mL",
    per_kilolitre: 8.0,
    step: 1.0,
};
const SODIUM_BICARBONATE: Rate = Rate {
    chemical: "Sodium bicarbonate",
    unit_of_measure: "g",
    per_kilolitre: 18.0,
    step: 10.0,
};
const ALKALINITY_ACID: Rate = Rate {
    chemical: "Dry acid (sodium bisulfate)",
    unit_of_measure: "g",
    per_kilolitre: 21.0,
    step: 10.0,
};
const CALCIUM_CHLORIDE: Rate = Rate {
    chemical: "Calcium chloride",
    unit_of_measure: "g",
    per_kilolitre: 14.0,
    step: 10.0,
};
const STABILISER: Rate = Rate {
    chemical: "Stabiliser (cyanuric acid)",
    unit_of_measure: "g",
    per_kilolitre: 10.0,
    step: 10.0,
};
const POOL_SALT: Rate = Rate {
    chemical: "Pool salt",
    unit_of_measure: "g",
    per_kilolitre: 1.0,
    step: 1.0,
};

impl Rate {
    fn dose(&self, change: f64, volume_litres: f64) -> f64 {
        let quantity = change / self.step * self.per_kilolitre * volume_litres / 1000.0;
        (quantity * 10.0).round() / 10.0
    }
}

fn chemical_for(parameter: Parameter, level: Level) -> Option<&'static Rate> {
    match (parameter, level) {
        (Parameter::Ph, Level::Low) => Some(&SODA_ASH),
        (Parameter::Ph, Level::High) => Some(&DRY_ACID),
        (Parameter::FreeChlorine, Level::Low) => Some(&LIQUID_CHLORINE),
        (Parameter::TotalAlkalinity, Level::Low) => Some(&SODIUM_BICARBONATE),
        (Parameter::TotalAlkalinity, Level::High) => Some(&ALKALINITY_ACID),
        (Parameter::CalciumHardness, Level::Low) => Some(&CALCIUM_CHLORIDE),
        (Parameter::CyanuricAcid, Level::Low) => Some(&STABILISER),
        (Parameter::Salt, Level::Low) => Some(&POOL_SALT),
        _ => None,
    }
}

/// Percentage of water to replace with fresh water to bring `value` down to `target`.
fn dilution_percent(value: f64, target: f64) -> f64 {
    (((1.0 - target / value) * 100.0) * 10.0).round() / 10.0
}

pub fn recommend(unit: &Unit, readings: &WaterReadings) -> Result<DosingPlan, ValidationError> {
    let volume_litres = unit
        .volume_litres
        .filter(|v| *v > 0.0)
        .ok_or_else(|| ValidationError::new("unit volume_litres is required for dosing"))?;
    let balance = evaluate(unit.unit_type, unit.water_type, unit.is_indoor, readings);

    let mut recommendations = Vec::new();
    for check in balance.checks.iter().filter(|c| c.level != Level::Ok) {
        let target = check.target.midpoint();
        let change = (target - check.value).abs();
        if let Some(rate) = chemical_for(check.parameter, check.level) {
            recommendations.push(DosingRecommendation {
                parameter: check.parameter,
                chemical: rate.chemical.to_string(),
                quantity: rate.dose(change, volume_litres),
                unit_of_measure: rate.unit_of_measure.to_string(),
                reason: format!(
                    "{} is {} ({} ppm vs {}-{})",
                    check.parameter,
                    if check.level == Level::Low { "low" } else { "high" },
                    check.value,
                    check.target.min,
                    check.target.max
                ),
            });
        } else if check.level == Level::High && check.parameter != Parameter::FreeChlorine {
            recommendations.push(DosingRecommendation {
                parameter: check.parameter,
                chemical: "Partial drain and refill".to_string(),
                quantity: dilution_percent(check.value, target),
                unit_of_measure: "% of volume".to_string(),
                reason: format!(
                    "{} is high ({} ppm vs {}-{}) and can only be reduced by dilution",
                    check.parameter, check.value, check.target.min, check.target.max
                ),
            });
        }
    }

    Ok(DosingPlan {
        volume_litres,
        balance,
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn pool(volume: Option<f64>, water_type: WaterType) -> Unit {
        Unit {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            name: "Main pool".into(),
            unit_type: UnitType::Pool,
            water_type,
            volume_litres: volume,
            is_indoor: false,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn balanced() -> WaterReadings {
        WaterReadings {
            ph: Some(7.4),
            free_chlorine: Some(2.0),
            total_chlorine: Some(2.2),
            total_alkalinity: Some(100.0),
            calcium_hardness: Some(300.0),
            cyanuric_acid: Some(40.0),
            salt: None,
            temperature_c: Some(27.0),
            tds: None,
        }
    }

    #[test]
    fn spa_ranges_differ_from_pool() {
        let pool = TargetRanges::for_unit(UnitType::Pool, WaterType::Chlorine, false);
        let spa = TargetRanges::for_unit(UnitType::Spa, WaterType::Chlorine, false);
        assert_eq!(pool.free_chlorine, Range::new(1.0, 3.0));
        assert_eq!(spa.free_chlorine, Range::new(3.0, 5.0));
        assert!(pool.salt.is_none());
        assert!(
            TargetRanges::for_unit(UnitType::Pool, WaterType::Salt, false)
                .salt
                .is_some()
        );
    }

    #[test]
    fn balanced_water_evaluates_ok() {
        let balance = evaluate(UnitType::Pool, WaterType::Chlorine, false, &balanced());
        assert!(balance.checks.iter().all(|c| c.level == Level::Ok));
        assert_eq!(balance.lsi_status, Some(LsiStatus::Balanced));
        assert!(balance.is_balanced());
        let cc = balance.combined_chlorine.unwrap();
        assert!((cc - 0.2).abs() < 1e-9);
    }

    #[test]
    fn lsi_known_values() {
        // pH 7.4, 27 °C, CH 300, TA 100, CYA 30: carbonate alk 90
        // 7.4 + 0.66 + (2.477 - 0.4) + 1.954 - 12.1 ≈ -0.01
        let readings = WaterReadings {
            cyanuric_acid: Some(30.0),
            ..balanced()
        };
        let lsi = langelier_index(&readings, false).unwrap();
        assert!(lsi.abs() <= 0.05, "lsi was {lsi}");

        let acidic = WaterReadings {
            ph: Some(6.8),
            total_alkalinity: Some(50.0),
            calcium_hardness: Some(100.0),
            ..balanced()
        };
        assert_eq!(
            LsiStatus::from_index(langelier_index(&acidic, false).unwrap()),
            LsiStatus::Corrosive
        );
        assert_eq!(
            langelier_index(&WaterReadings { ph: None, ..balanced() }, false),
            None
        );
    }

    #[test]
    fn salt_water_lowers_lsi() {
        let fresh = langelier_index(&balanced(), false).unwrap();
        let salt = langelier_index(&balanced(), true).unwrap();
        assert!(salt < fresh);
    }

    #[test]
    fn temperature_factor_interpolates() {
        assert_eq!(temperature_factor(-2.0), 0.0);
        assert_eq!(temperature_factor(60.0), 1.0);
        let mid = temperature_factor(26.65);
        assert!((mid - 0.65).abs() < 1e-9);
    }

    #[test]
    fn low_chlorine_and_alkalinity_dosed_for_volume() {
        let readings = WaterReadings {
            free_chlorine: Some(0.0),
            total_chlorine: None,
            total_alkalinity: Some(60.0),
            ..balanced()
        };
        let plan = recommend(&pool(Some(50_000.0), WaterType::Chlorine), &readings).unwrap();
        let chlorine = plan
            .recommendations
            .iter()
            .find(|r| r.parameter == Parameter::FreeChlorine)
            .unwrap();
        // 2 ppm on 50 kL at 8 mL/kL/ppm
        assert_eq!(chlorine.quantity, 800.0);
        assert_eq!(chlorine.unit_of_measure, "mL");

        let bicarb = plan
            .recommendations
            .iter()
            .find(|r| r.parameter == Parameter::TotalAlkalinity)
            .unwrap();
        // +40 ppm on 50 kL at 18 g/kL per 10 ppm
        assert_eq!(bicarb.quantity, 3600.0);
        assert_eq!(bicarb.chemical, "Sodium bicarbonate");
    }

    #[test]
    fn high_hardness_means_dilution() {
        let readings = WaterReadings {
            calcium_hardness: Some(600.0),
            ..balanced()
        };
        let plan = recommend(&pool(Some(40_000.0), WaterType::Chlorine), &readings).unwrap();
        let dilution = plan
            .recommendations
            .iter()
            .find(|r| r.parameter == Parameter::CalciumHardness)
            .unwrap();
        assert_eq!(dilution.unit_of_measure, "% of volume");
        assert_eq!(dilution.quantity, 50.0);
    }

    #[test]
    fn balanced_water_needs_nothing() {
        let plan = recommend(&pool(Some(40_000.0), WaterType::Chlorine), &balanced()).unwrap();
        assert!(plan.recommendations.is_empty());
    }

    #[test]
    fn volume_is_required() {
        assert!(recommend(&pool(None, WaterType::Chlorine), &balanced()).is_err());
        assert!(recommend(&pool(Some(0.0), WaterType::Chlorine), &balanced()).is_err());
    }
}
