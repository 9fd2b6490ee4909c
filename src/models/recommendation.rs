use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Irrigation,
    Nitrogen,
    Phosphorus,
    Potassium,
    SecondaryNutrients,
    NutrientSurplus,
    Schedule,
    General,
}

impl RecommendationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationCategory::Irrigation => "Irrigation",
            RecommendationCategory::Nitrogen => "Nitrogen",
            RecommendationCategory::Phosphorus => "Phosphorus",
            RecommendationCategory::Potassium => "Potassium",
            RecommendationCategory::SecondaryNutrients => "Secondary Nutrients",
            RecommendationCategory::NutrientSurplus => "Nutrient Surplus",
            RecommendationCategory::Schedule => "Schedule",
            RecommendationCategory::General => "General",
        }
    }
}

impl std::fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Advisory,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Advisory => "Advisory",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ",
            Severity::Advisory => "→",
            Severity::Warning => "⚠",
            Severity::Critical => "!",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: String,
}

impl DataPoint {
    pub fn new(label: &str, value: impl std::fmt::Display) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub category: RecommendationCategory,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub explanation: String,
    pub data_points: Vec<DataPoint>,
    pub suggested_action: Option<String>,
}

impl Recommendation {
    pub fn new(
        id: impl Into<String>,
        category: RecommendationCategory,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            severity,
            title: title.into(),
            description: description.into(),
            explanation: String::new(),
            data_points: Vec::new(),
            suggested_action: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_data_point(mut self, label: &str, value: impl std::fmt::Display) -> Self {
        self.data_points.push(DataPoint::new(label, value));
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    /// Warnings flag risk; everything below is advice.
    pub fn is_warning(&self) -> bool {
        self.severity >= Severity::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_data_points() {
        let rec = Recommendation::new(
            "n_topdress",
            RecommendationCategory::Nitrogen,
            Severity::Warning,
            "Top-dress nitrogen",
            "Nitrogen deficit exceeds 20 kg/ha",
        )
        .with_explanation("Nitrogen drives canopy growth.")
        .with_data_point("Deficit", "35.0 kg/ha")
        .with_action("Apply 76 kg/ha urea");

        assert_eq!(rec.data_points.len(), 1);
        assert_eq!(rec.data_points[0].label, "Deficit");
        assert_eq!(rec.suggested_action.as_deref(), Some("Apply 76 kg/ha urea"));
        assert!(rec.is_warning());
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Advisory);
        assert!(Severity::Advisory < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }
}
