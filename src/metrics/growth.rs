use serde::Serialize;

/// Decimal places kept on a growth figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Training stats report two decimals.
    Hundredths,
    /// Webinar stats report one decimal.
    Tenths,
}

impl Precision {
    fn places(self) -> i32 {
        match self {
            Precision::Hundredths => 2,
            Precision::Tenths => 1,
        }
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Percentage change from `old` to `new`.
///
/// A zero baseline yields `100` when anything appeared and `0` otherwise,
/// never infinity.
pub fn growth(old: f64, new: f64, precision: Precision) -> f64 {
    if old == 0.0 {
        return if new > 0.0 { 100.0 } else { 0.0 };
    }
    round_to((new - old) / old * 100.0, precision.places())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthType {
    Increase,
    Decrease,
}

impl GrowthType {
    /// Zero counts as an increase.
    pub fn of(growth: f64) -> Self {
        if growth >= 0.0 {
            GrowthType::Increase
        } else {
            GrowthType::Decrease
        }
    }
}
