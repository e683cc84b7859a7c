use serde::{Deserialize, Serialize};
use std::fmt;

/// Pounds per kilogram.
pub const KG_TO_LB: f64 = 2.20462;

/// Unit used to display and enter weights.
///
/// Stored weights are always kilograms; the unit only affects how values are
/// shown in the table and chart and how form input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "lb")]
    Lb,
}

impl WeightUnit {
    pub fn label(self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }

    /// Parse the persisted preference string.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim() {
            "kg" => Some(WeightUnit::Kg),
            "lb" => Some(WeightUnit::Lb),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            WeightUnit::Kg => WeightUnit::Lb,
            WeightUnit::Lb => WeightUnit::Kg,
        }
    }

    /// Convert a canonical kilogram value into this unit without rounding.
    pub fn to_display(self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kg => kg,
            WeightUnit::Lb => kg * KG_TO_LB,
        }
    }

    /// Convert a value entered in this unit back to kilograms.
    pub fn from_display(self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lb => value / KG_TO_LB,
        }
    }

    /// Converted and rounded to one decimal, as shown to the user.
    pub fn display_rounded(self, kg: f64) -> f64 {
        round1(self.to_display(kg))
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bench_press_total_in_both_units() {
        let total = 10.0 * 60.0 + 8.0 * 65.0;
        assert_eq!(WeightUnit::Kg.display_rounded(total), 1120.0);
        assert_eq!(WeightUnit::Lb.display_rounded(total), 2469.2);
    }

    #[test]
    fn kg_lb_kg_within_rounding() {
        for kg in [0.0, 2.5, 60.0, 102.3, 227.7, 1120.0] {
            let lb = WeightUnit::Lb.to_display(kg);
            let back = WeightUnit::Lb.from_display(lb);
            assert!((round1(back) - round1(kg)).abs() <= 0.1, "{kg} -> {back}");
        }
    }

    #[test]
    fn labels_parse_and_toggle() {
        assert_eq!(WeightUnit::from_label("kg"), Some(WeightUnit::Kg));
        assert_eq!(WeightUnit::from_label(" lb\n"), Some(WeightUnit::Lb));
        assert_eq!(WeightUnit::from_label("stone"), None);
        assert_eq!(WeightUnit::Kg.toggled(), WeightUnit::Lb);
        assert_eq!(WeightUnit::Lb.toggled().label(), "kg");
    }

    #[test]
    fn serde_uses_short_labels() {
        assert_eq!(serde_json::to_string(&WeightUnit::Lb).unwrap(), "\"lb\"");
        let u: WeightUnit = serde_json::from_str("\"kg\"").unwrap();
        assert_eq!(u, WeightUnit::Kg);
    }
}
