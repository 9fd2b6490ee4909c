use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
    Sulfur,
    Calcium,
    Magnesium,
}

impl Nutrient {
    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "Nitrogen",
            Nutrient::Phosphorus => "Phosphorus",
            Nutrient::Potassium => "Potassium",
            Nutrient::Sulfur => "Sulfur",
            Nutrient::Calcium => "Calcium",
            Nutrient::Magnesium => "Magnesium",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "N",
            Nutrient::Phosphorus => "P",
            Nutrient::Potassium => "K",
            Nutrient::Sulfur => "S",
            Nutrient::Calcium => "Ca",
            Nutrient::Magnesium => "Mg",
        }
    }

    /// Typical visual deficiency symptom, for growers scouting the field.
    pub fn deficiency_symptom(&self) -> &'static str {
        match self {
            Nutrient::Nitrogen => {
                "Uniform yellowing of older leaves starting at the tip, stunted growth"
            }
            Nutrient::Phosphorus => {
                "Dark green or purplish older leaves, poor root development, delayed maturity"
            }
            Nutrient::Potassium => "Scorching and browning along older leaf margins, weak stalks",
            Nutrient::Sulfur => "Pale yellowing of young leaves, thin stems",
            Nutrient::Calcium => "Distorted or dying growing points, blossom-end rot in fruit",
            Nutrient::Magnesium => "Interveinal chlorosis on older leaves, veins stay green",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nitrogen" | "n" => Some(Nutrient::Nitrogen),
            "phosphorus" | "p" => Some(Nutrient::Phosphorus),
            "potassium" | "k" => Some(Nutrient::Potassium),
            "sulfur" | "sulphur" | "s" => Some(Nutrient::Sulfur),
            "calcium" | "ca" => Some(Nutrient::Calcium),
            "magnesium" | "mg" => Some(Nutrient::Magnesium),
            _ => None,
        }
    }

    pub fn all() -> &'static [Nutrient] {
        &[
            Nutrient::Nitrogen,
            Nutrient::Phosphorus,
            Nutrient::Potassium,
            Nutrient::Sulfur,
            Nutrient::Calcium,
            Nutrient::Magnesium,
        ]
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Nutrient quantities in kg/ha.
///
/// Subtraction clamps every component at zero, so `a - b` reads as
/// "what is still missing from `a` after `b`".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientVector {
    #[serde(default)]
    pub nitrogen: f64,
    #[serde(default)]
    pub phosphorus: f64,
    #[serde(default)]
    pub potassium: f64,
    #[serde(default)]
    pub sulfur: f64,
    #[serde(default)]
    pub calcium: f64,
    #[serde(default)]
    pub magnesium: f64,
}

impl NutrientVector {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Nitrogen, phosphorus and potassium only; secondary nutrients zero.
    pub fn npk(nitrogen: f64, phosphorus: f64, potassium: f64) -> Self {
        Self {
            nitrogen,
            phosphorus,
            potassium,
            ..Self::default()
        }
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Nitrogen => self.nitrogen,
            Nutrient::Phosphorus => self.phosphorus,
            Nutrient::Potassium => self.potassium,
            Nutrient::Sulfur => self.sulfur,
            Nutrient::Calcium => self.calcium,
            Nutrient::Magnesium => self.magnesium,
        }
    }

    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        let slot = match nutrient {
            Nutrient::Nitrogen => &mut self.nitrogen,
            Nutrient::Phosphorus => &mut self.phosphorus,
            Nutrient::Potassium => &mut self.potassium,
            Nutrient::Sulfur => &mut self.sulfur,
            Nutrient::Calcium => &mut self.calcium,
            Nutrient::Magnesium => &mut self.magnesium,
        };
        *slot = value;
    }

    pub fn with(mut self, nutrient: Nutrient, value: f64) -> Self {
        self.set(nutrient, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::all().iter().map(move |n| (*n, self.get(*n)))
    }

    pub fn map(&self, f: impl Fn(Nutrient, f64) -> f64) -> Self {
        let mut out = Self::zero();
        for (nutrient, value) in self.iter() {
            out.set(nutrient, f(nutrient, value));
        }
        out
    }

    pub fn zip_with(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        self.map(|n, v| f(v, other.get(n)))
    }

    /// Component-wise `max(0, self - other)`.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| (a - b).max(0.0))
    }

    pub fn total(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, v)| v <= 0.0)
    }

    pub fn is_non_negative(&self) -> bool {
        self.iter().all(|(_, v)| v >= 0.0 && v.is_finite())
    }
}

impl Add for NutrientVector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(&rhs, |a, b| a + b)
    }
}

impl AddAssign for NutrientVector {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for NutrientVector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.saturating_sub(&rhs)
    }
}

impl Mul<f64> for NutrientVector {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        self.map(|_, v| v * factor)
    }
}

impl std::iter::Sum for NutrientVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, v| acc + v)
    }
}

impl std::fmt::Display for NutrientVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(n, v)| format!("{} {:.1}", n.symbol(), v))
            .collect();
        write!(f, "{} kg/ha", parts.join(", "))
    }
}
