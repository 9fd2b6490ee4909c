//! Root-zone soil water balance (FAO-56 chapter 8).

use crate::error::{FieldPlanError, Result};
use crate::models::SoilWaterParameters;

/// Water-holding capacity of the root zone of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootZone {
    soil: SoilWaterParameters,
    root_depth_m: f64,
}

impl RootZone {
    pub fn new(soil: SoilWaterParameters, root_depth_m: f64) -> Result<Self> {
        if !root_depth_m.is_finite() || root_depth_m <= 0.0 {
            return Err(FieldPlanError::InvalidInput(format!(
                "root depth must be positive, got {} m",
                root_depth_m
            )));
        }
        Ok(Self { soil, root_depth_m })
    }

    pub fn soil(&self) -> &SoilWaterParameters {
        &self.soil
    }

    pub fn root_depth_m(&self) -> f64 {
        self.root_depth_m
    }

    /// Total available water, mm (eq. 82).
    pub fn total_available_water(&self) -> f64 {
        self.soil.available_water_per_m() * self.root_depth_m
    }

    /// Readily available water, mm (eq. 83). Depletion beyond this triggers irrigation.
    pub fn readily_available_water(&self) -> f64 {
        self.soil.allowable_depletion() * self.total_available_water()
    }

    /// Depletion below field capacity for a volumetric moisture reading, mm.
    pub fn depletion_from_moisture(&self, moisture: f64) -> f64 {
        let depletion = 1000.0 * (self.soil.field_capacity() - moisture) * self.root_depth_m;
        depletion.clamp(0.0, self.total_available_water())
    }

    pub fn moisture_from_depletion(&self, depletion_mm: f64) -> f64 {
        self.soil.field_capacity() - depletion_mm / (1000.0 * self.root_depth_m)
    }

    /// Water stress coefficient Ks (eq. 84).
    pub fn stress_coefficient(&self, depletion_mm: f64) -> f64 {
        let taw = self.total_available_water();
        let raw = self.readily_available_water();
        if depletion_mm <= raw {
            return 1.0;
        }
        if taw <= raw {
            return 0.0;
        }
        ((taw - depletion_mm) / (taw - raw)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceStep {
    pub depletion_mm: f64,
    pub deep_percolation_mm: f64,
}

/// Daily depletion bookkeeping for one root zone.
#[derive(Debug, Clone)]
pub struct SoilWaterBalance {
    zone: RootZone,
    depletion_mm: f64,
}

impl SoilWaterBalance {
    /// Starts at field capacity.
    pub fn new(zone: RootZone) -> Self {
        Self {
            zone,
            depletion_mm: 0.0,
        }
    }

    pub fn from_moisture(zone: RootZone, moisture: f64) -> Self {
        Self {
            zone,
            depletion_mm: zone.depletion_from_moisture(moisture),
        }
    }

    pub fn zone(&self) -> &RootZone {
        &self.zone
    }

    pub fn depletion_mm(&self) -> f64 {
        self.depletion_mm
    }

    pub fn needs_irrigation(&self) -> bool {
        self.depletion_mm >= self.zone.readily_available_water()
    }

    pub fn stress_coefficient(&self) -> f64 {
        self.zone.stress_coefficient(self.depletion_mm)
    }

    /// Advances one day (eqs. 85-88). Water in excess of field capacity
    /// drains as deep percolation; depletion is capped at TAW.
    pub fn step(&mut self, etc_mm: f64, effective_precip_mm: f64, irrigation_mm: f64) -> BalanceStep {
        let inflow = effective_precip_mm.max(0.0) + irrigation_mm.max(0.0);
        let deep_percolation = (inflow - etc_mm.max(0.0) - self.depletion_mm).max(0.0);
        let depletion = self.depletion_mm - inflow + etc_mm.max(0.0) + deep_percolation;

        self.depletion_mm = depletion.clamp(0.0, self.zone.total_available_water());

        BalanceStep {
            depletion_mm: self.depletion_mm,
            deep_percolation_mm: deep_percolation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loam() -> SoilWaterParameters {
        SoilWaterParameters::new(0.30, 0.15, 0.5).unwrap()
    }

    fn zone() -> RootZone {
        RootZone::new(loam(), 0.6).unwrap()
    }

    #[test]
    fn available_water() {
        let z = zone();
        assert!((z.total_available_water() - 90.0).abs() < 1e-9);
        assert!((z.readily_available_water() - 45.0).abs() < 1e-9);
    }

    #[test]
    fn depletion_from_moisture_is_clamped() {
        let z = zone();
        assert!((z.depletion_from_moisture(0.25) - 30.0).abs() < 1e-9);
        assert_eq!(z.depletion_from_moisture(0.35), 0.0);
        assert!((z.depletion_from_moisture(0.05) - 90.0).abs() < 1e-9);
        assert!((z.moisture_from_depletion(30.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn stress_coefficient_declines_past_raw() {
        let z = zone();
        assert_eq!(z.stress_coefficient(20.0), 1.0);
        assert_eq!(z.stress_coefficient(45.0), 1.0);
        assert!((z.stress_coefficient(67.5) - 0.5).abs() < 1e-9);
        assert_eq!(z.stress_coefficient(90.0), 0.0);
    }

    #[test]
    fn rejects_non_positive_root_depth() {
        assert!(RootZone::new(loam(), 0.0).is_err());
        assert!(RootZone::new(loam(), -0.2).is_err());
    }

    #[test]
    fn step_accumulates_and_drains() {
        let mut balance = SoilWaterBalance::new(zone());

        let s = balance.step(5.0, 0.0, 0.0);
        assert!((s.depletion_mm - 5.0).abs() < 1e-9);
        assert_eq!(s.deep_percolation_mm, 0.0);

        // 20 mm rain on a 5 mm deficit with 4 mm ET: 11 mm drains.
        let s = balance.step(4.0, 20.0, 0.0);
        assert_eq!(s.depletion_mm, 0.0);
        assert!((s.deep_percolation_mm - 11.0).abs() < 1e-9);
    }

    #[test]
    fn step_caps_at_total_available_water() {
        let mut balance = SoilWaterBalance::from_moisture(zone(), 0.16);
        balance.step(20.0, 0.0, 0.0);
        assert!((balance.depletion_mm() - 90.0).abs() < 1e-9);
        assert!(balance.needs_irrigation());
        assert_eq!(balance.stress_coefficient(), 0.0);
    }
}
