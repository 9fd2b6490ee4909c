use super::crop_coefficient::{crop_phase, kc_on_day};
use super::evapotranspiration::{calculate_et0, calculate_etc};
use super::water_balance::{RootZone, SoilWaterBalance};
use crate::error::{FieldPlanError, Result};
use crate::models::{
    CropPhase, Field, GrowingSeasonProfile, IrrigationAction, IrrigationMethod,
    IrrigationRecommendation, IrrigationSchedule, SoilWaterParameters, WaterBalanceDay,
    WeatherObservation,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RainfallTier {
    /// Cumulative daily rainfall this tier extends to.
    pub up_to_mm: f64,
    /// Fraction of rain within the tier that reaches the root zone.
    pub factor: f64,
}

/// Tiered effective-rainfall policy. Each tier's factor applies only to the
/// rain falling within that tier, so effective rainfall never decreases as
/// total rainfall increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveRainfallPolicy {
    pub tiers: Vec<RainfallTier>,
    /// Factor for rainfall above the last tier.
    pub excess_factor: f64,
}

impl Default for EffectiveRainfallPolicy {
    fn default() -> Self {
        Self {
            tiers: vec![
                RainfallTier {
                    up_to_mm: 25.0,
                    factor: 0.8,
                },
                RainfallTier {
                    up_to_mm: 50.0,
                    factor: 0.6,
                },
            ],
            excess_factor: 0.4,
        }
    }
}

impl EffectiveRainfallPolicy {
    pub fn validate(&self) -> Result<()> {
        let factors = self
            .tiers
            .iter()
            .map(|t| t.factor)
            .chain(std::iter::once(self.excess_factor));
        for factor in factors {
            if !(0.0..=1.0).contains(&factor) {
                return Err(FieldPlanError::Config(format!(
                    "effective rainfall factor {} outside 0..1",
                    factor
                )));
            }
        }

        let mut previous = 0.0;
        for tier in &self.tiers {
            if tier.up_to_mm <= previous {
                return Err(FieldPlanError::Config(format!(
                    "rainfall tiers must ascend, {} mm follows {} mm",
                    tier.up_to_mm, previous
                )));
            }
            previous = tier.up_to_mm;
        }
        Ok(())
    }

    pub fn effective(&self, precipitation_mm: f64) -> f64 {
        let rain = precipitation_mm.max(0.0);
        let mut effective = 0.0;
        let mut lower = 0.0;

        for tier in &self.tiers {
            if rain <= lower {
                return effective;
            }
            effective += (rain.min(tier.up_to_mm) - lower) * tier.factor;
            lower = tier.up_to_mm;
        }

        if rain > lower {
            effective += (rain - lower) * self.excess_factor;
        }
        effective
    }
}

/// Fraction of applied water that reaches the root zone, per delivery method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApplicationEfficiency {
    pub drip: f64,
    pub sprinkler: f64,
    pub center_pivot: f64,
    pub surface: f64,
    /// Used for rainfed fields, where the gross figure is informational.
    pub default: f64,
}

impl Default for ApplicationEfficiency {
    fn default() -> Self {
        Self {
            drip: 0.90,
            sprinkler: 0.75,
            center_pivot: 0.85,
            surface: 0.60,
            default: 0.75,
        }
    }
}

impl ApplicationEfficiency {
    pub fn for_method(&self, method: IrrigationMethod) -> f64 {
        match method {
            IrrigationMethod::Drip => self.drip,
            IrrigationMethod::Sprinkler => self.sprinkler,
            IrrigationMethod::CenterPivot => self.center_pivot,
            IrrigationMethod::Surface => self.surface,
            IrrigationMethod::None => self.default,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("drip", self.drip),
            ("sprinkler", self.sprinkler),
            ("center_pivot", self.center_pivot),
            ("surface", self.surface),
            ("default", self.default),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(FieldPlanError::Config(format!(
                    "{} application efficiency must be in (0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationPolicy {
    #[serde(default)]
    pub effective_rainfall: EffectiveRainfallPolicy,
    #[serde(default)]
    pub application_efficiency: ApplicationEfficiency,
    #[serde(default = "default_root_depth")]
    pub default_root_depth_m: f64,
    /// Oldest stored soil moisture reading still trusted for a decision.
    #[serde(default = "default_moisture_age")]
    pub max_moisture_age_days: u32,
}

fn default_root_depth() -> f64 {
    0.6
}

fn default_moisture_age() -> u32 {
    3
}

impl Default for IrrigationPolicy {
    fn default() -> Self {
        Self {
            effective_rainfall: EffectiveRainfallPolicy::default(),
            application_efficiency: ApplicationEfficiency::default(),
            default_root_depth_m: default_root_depth(),
            max_moisture_age_days: default_moisture_age(),
        }
    }
}

impl IrrigationPolicy {
    pub fn validate(&self) -> Result<()> {
        self.effective_rainfall.validate()?;
        self.application_efficiency.validate()?;
        if !(self.default_root_depth_m > 0.0) {
            return Err(FieldPlanError::Config(format!(
                "default root depth must be positive, got {}",
                self.default_root_depth_m
            )));
        }
        Ok(())
    }

    /// A reading counts for `date` only if taken on or before it and no more
    /// than `max_moisture_age_days` earlier.
    pub fn moisture_usable(&self, observed_on: NaiveDate, date: NaiveDate) -> bool {
        let age = (date - observed_on).num_days();
        (0..=i64::from(self.max_moisture_age_days)).contains(&age)
    }
}

/// Everything the irrigation engine needs to know about one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSite<'a> {
    pub field: &'a Field,
    pub soil: &'a SoilWaterParameters,
    pub profile: &'a GrowingSeasonProfile,
}

#[derive(Debug, Clone, Default)]
pub struct IrrigationEngine {
    policy: IrrigationPolicy,
}

impl IrrigationEngine {
    pub fn new(policy: IrrigationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IrrigationPolicy {
        &self.policy
    }

    pub fn calculate_et0(&self, weather: &WeatherObservation, latitude: f64, elevation: f64) -> f64 {
        calculate_et0(weather, latitude, elevation)
    }

    pub fn calculate_etc(&self, et0: f64, kc: f64) -> f64 {
        calculate_etc(et0, kc)
    }

    pub fn effective_precipitation(&self, precipitation_mm: f64) -> f64 {
        self.policy.effective_rainfall.effective(precipitation_mm)
    }

    pub fn efficiency(&self, method: IrrigationMethod) -> f64 {
        self.policy.application_efficiency.for_method(method)
    }

    fn root_zone(&self, site: &FieldSite<'_>) -> Result<RootZone> {
        let depth = site
            .field
            .root_depth_m
            .unwrap_or(self.policy.default_root_depth_m);
        RootZone::new(*site.soil, depth)
    }

    fn validate_site(site: &FieldSite<'_>) -> Result<()> {
        if !(-90.0..=90.0).contains(&site.field.latitude) {
            return Err(FieldPlanError::InvalidInput(format!(
                "field {} latitude {} outside -90..90",
                site.field.id, site.field.latitude
            )));
        }
        Ok(())
    }

    pub fn calculate_irrigation_requirement(
        &self,
        site: &FieldSite<'_>,
        weather: &WeatherObservation,
        current_soil_moisture: Option<f64>,
    ) -> Result<IrrigationRecommendation> {
        Self::validate_site(site)?;
        if let Some(m) = current_soil_moisture {
            if !(0.0..=1.0).contains(&m) {
                return Err(FieldPlanError::InvalidInput(format!(
                    "soil moisture {} is not a volumetric fraction",
                    m
                )));
            }
        }

        let field = site.field;
        let dap = site.profile.days_after_planting(weather.date);
        let phase = crop_phase(dap, site.profile);
        let kc = kc_on_day(dap, site.profile);
        let et0 = self.calculate_et0(weather, field.latitude, field.elevation_m);
        let etc = self.calculate_etc(et0, kc);
        let effective_precip = self.effective_precipitation(weather.precipitation_mm);
        let in_season = !matches!(phase, CropPhase::PreSowing | CropPhase::Harvest);
        // ETc stays informative out of season, but there is no crop to irrigate.
        let net = if in_season {
            (etc - effective_precip).max(0.0)
        } else {
            0.0
        };
        let efficiency = self.efficiency(field.irrigation_method);
        let gross = net / efficiency;

        let zone = self.root_zone(site)?;
        let depletion = current_soil_moisture.map(|m| zone.depletion_from_moisture(m));

        let action = if !in_season {
            IrrigationAction::NotNeeded
        } else {
            match current_soil_moisture {
                Some(moisture) => Self::decide_with_moisture(&zone, moisture, net),
                None if net > 0.0 => IrrigationAction::Estimate,
                None => IrrigationAction::NotNeeded,
            }
        };

        tracing::debug!(
            field = %field.id,
            date = %weather.date,
            et0,
            kc,
            etc,
            net,
            action = action.as_str(),
            "irrigation requirement"
        );

        let refill_gross = depletion.filter(|_| in_season).map(|d| d / efficiency);
        let recommended_action = describe_action(
            action,
            phase,
            field.irrigation_method,
            gross,
            depletion,
            refill_gross,
            zone.readily_available_water(),
        );

        Ok(IrrigationRecommendation {
            field_id: field.id.clone(),
            date: weather.date,
            crop_phase: phase,
            et0_mm: et0,
            kc,
            etc_mm: etc,
            precipitation_mm: weather.precipitation_mm,
            effective_precipitation_mm: effective_precip,
            net_irrigation_mm: net,
            gross_irrigation_mm: gross,
            current_soil_moisture,
            depletion_mm: depletion,
            refill_gross_mm: refill_gross,
            action,
            severity: action.severity(),
            recommended_action,
            is_estimate: current_soil_moisture.is_none(),
        })
    }

    fn decide_with_moisture(zone: &RootZone, moisture: f64, daily_net: f64) -> IrrigationAction {
        let soil = zone.soil();
        if moisture <= soil.wilting_point() {
            return IrrigationAction::IrrigateUrgently;
        }
        if moisture >= soil.field_capacity() {
            return IrrigationAction::NotNeeded;
        }

        let depletion = zone.depletion_from_moisture(moisture);
        let raw = zone.readily_available_water();
        if depletion >= raw {
            return IrrigationAction::IrrigateNow;
        }
        if daily_net <= 0.0 {
            return IrrigationAction::NotNeeded;
        }

        let days_until_due = ((raw - depletion) / daily_net).ceil().max(1.0) as u32;
        IrrigationAction::Forecast { days_until_due }
    }

    /// Walks a weather series through the root-zone balance, irrigating back
    /// to field capacity whenever depletion reaches readily available water.
    /// Rainfed fields are simulated without irrigation.
    pub fn irrigation_schedule(
        &self,
        site: &FieldSite<'_>,
        observations: &[WeatherObservation],
        initial_moisture: Option<f64>,
    ) -> Result<IrrigationSchedule> {
        Self::validate_site(site)?;
        let zone = self.root_zone(site)?;
        let mut balance = match initial_moisture {
            Some(m) if (0.0..=1.0).contains(&m) => SoilWaterBalance::from_moisture(zone, m),
            Some(m) => {
                return Err(FieldPlanError::InvalidInput(format!(
                    "soil moisture {} is not a volumetric fraction",
                    m
                )))
            }
            None => SoilWaterBalance::new(zone),
        };

        let mut ordered: Vec<&WeatherObservation> = observations.iter().collect();
        ordered.sort_by_key(|o| o.date);

        let field = site.field;
        let irrigable = field.irrigation_method != IrrigationMethod::None;
        let efficiency = self.efficiency(field.irrigation_method);
        let mut days = Vec::with_capacity(ordered.len());

        for weather in ordered {
            let dap = site.profile.days_after_planting(weather.date);
            let in_season = !matches!(
                crop_phase(dap, site.profile),
                CropPhase::PreSowing | CropPhase::Harvest
            );

            let et0 = self.calculate_et0(weather, field.latitude, field.elevation_m);
            let ks = balance.stress_coefficient();
            let etc = self.calculate_etc(et0, kc_on_day(dap, site.profile)) * ks;
            let effective_precip = self.effective_precipitation(weather.precipitation_mm);

            let step = balance.step(etc, effective_precip, 0.0);
            let mut deep_percolation = step.deep_percolation_mm;
            let mut irrigation_net = 0.0;

            if irrigable && in_season && balance.needs_irrigation() {
                irrigation_net = balance.depletion_mm();
                deep_percolation += balance.step(0.0, 0.0, irrigation_net).deep_percolation_mm;
                tracing::debug!(
                    field = %field.id,
                    date = %weather.date,
                    net_mm = irrigation_net,
                    "scheduled irrigation"
                );
            }

            days.push(WaterBalanceDay {
                date: weather.date,
                etc_mm: etc,
                effective_precipitation_mm: effective_precip,
                irrigation_net_mm: irrigation_net,
                irrigation_gross_mm: irrigation_net / efficiency,
                deep_percolation_mm: deep_percolation,
                depletion_mm: balance.depletion_mm(),
                ks,
            });
        }

        Ok(IrrigationSchedule {
            field_id: field.id.clone(),
            total_available_water_mm: zone.total_available_water(),
            readily_available_water_mm: zone.readily_available_water(),
            days,
        })
    }
}

fn describe_action(
    action: IrrigationAction,
    phase: CropPhase,
    method: IrrigationMethod,
    gross: f64,
    depletion: Option<f64>,
    refill_gross: Option<f64>,
    raw: f64,
) -> String {
    let rainfed = method == IrrigationMethod::None;
    let text = match action {
        IrrigationAction::NotNeeded => match phase {
            CropPhase::PreSowing => "No crop planted yet; no irrigation required.".to_string(),
            CropPhase::Harvest => "Season complete; no irrigation required.".to_string(),
            _ => match depletion {
                Some(d) if d <= 0.0 => {
                    "Root zone is at field capacity; hold irrigation.".to_string()
                }
                _ => "Rainfall covers today's crop water use; no irrigation required.".to_string(),
            },
        },
        IrrigationAction::Forecast { days_until_due } => format!(
            "Root zone depleted {:.1} mm of {:.1} mm readily available. \
             Irrigation expected in about {} day(s) at today's water use.",
            depletion.unwrap_or(0.0),
            raw,
            days_until_due
        ),
        IrrigationAction::IrrigateNow => format!(
            "Root zone depleted {:.1} mm, past the {:.1} mm threshold. \
             Apply {:.1} mm gross to refill to field capacity.",
            depletion.unwrap_or(0.0),
            raw,
            refill_gross.unwrap_or(gross)
        ),
        IrrigationAction::IrrigateUrgently => format!(
            "Soil moisture at or below wilting point. Irrigate immediately with {:.1} mm gross \
             to prevent permanent crop damage.",
            refill_gross.unwrap_or(gross)
        ),
        IrrigationAction::Estimate => format!(
            "No soil moisture reading. Estimated requirement {:.1} mm gross \
             from crop water use and rainfall.",
            gross
        ),
    };

    if rainfed
        && matches!(
            action,
            IrrigationAction::IrrigateNow
                | IrrigationAction::IrrigateUrgently
                | IrrigationAction::Estimate
        )
    {
        format!("Rainfed field: {} Expect water stress.", text)
    } else {
        text
    }
}
