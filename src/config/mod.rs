pub mod groups;

pub use groups::*;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::*;

fn default_true() -> bool {
    true
}

/// Which kinds of columns an extractor emits. Categorical columns always
/// precede numeric ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputModes {
    #[serde(default = "default_true")]
    pub categorical: bool,
    #[serde(default)]
    pub numeric: bool,
}

impl Default for OutputModes {
    fn default() -> Self {
        Self {
            categorical: true,
            numeric: false,
        }
    }
}

impl OutputModes {
    pub fn both() -> Self {
        Self {
            categorical: true,
            numeric: true,
        }
    }

    pub fn numeric_only() -> Self {
        Self {
            categorical: false,
            numeric: true,
        }
    }
}

/// A per-unit attribute that force-factor extractors aggregate over groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFactor {
    Health,
    Shield,
    Energy,
    HealthRatio,
    ShieldRatio,
    EnergyRatio,
    BuildProgress,
    WeaponCooldown,
    TotalCost,
    MineralCost,
    GasCost,
}

impl UnitFactor {
    /// The factor's value for `unit`. Cost factors look the unit type up in
    /// `costs` and count unknown types as free.
    pub fn value(self, unit: &Unit, costs: &HashMap<u32, [f64; 2]>) -> f64 {
        let ratio = |value: f32, max: f32| {
            if max > 0.0 {
                (value / max) as f64
            } else {
                0.0
            }
        };
        let cost = costs.get(&unit.unit_type).copied().unwrap_or([0.0, 0.0]);
        match self {
            UnitFactor::Health => unit.health as f64,
            UnitFactor::Shield => unit.shield as f64,
            UnitFactor::Energy => unit.energy as f64,
            UnitFactor::HealthRatio => ratio(unit.health, unit.health_max),
            UnitFactor::ShieldRatio => ratio(unit.shield, unit.shield_max),
            UnitFactor::EnergyRatio => ratio(unit.energy, unit.energy_max),
            UnitFactor::BuildProgress => unit.build_progress as f64,
            UnitFactor::WeaponCooldown => unit.weapon_cooldown as f64,
            UnitFactor::TotalCost => cost[0] + cost[1],
            UnitFactor::MineralCost => cost[0],
            UnitFactor::GasCost => cost[1],
        }
    }
}

/// Reduction applied to the factor values of all units in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationOp {
    Sum,
    Mean,
    Max,
    Min,
    Median,
    Std,
    Count,
}

impl AggregationOp {
    /// `None` when there is nothing to aggregate.
    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let count = values.len() as f64;
        let sum: f64 = values.iter().sum();
        Some(match self {
            AggregationOp::Sum => sum,
            AggregationOp::Mean => sum / count,
            AggregationOp::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            AggregationOp::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            AggregationOp::Median => median(values),
            AggregationOp::Std => {
                let mean = sum / count;
                let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
                variance.sqrt()
            }
            AggregationOp::Count => count,
        })
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<float_ord::FloatOrd<f64>> =
        values.iter().copied().map(float_ord::FloatOrd).collect();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1].0 + sorted[mid].0) / 2.0
    } else {
        sorted[mid].0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct FactorLevel {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceFactorConfig {
    pub factor: UnitFactor,
    pub name: String,
    pub op: AggregationOp,
    pub friendly_filter: Vec<String>,
    pub enemy_filter: Vec<String>,
    pub levels: Vec<FactorLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceRelativeFactorConfig {
    pub factor: UnitFactor,
    pub name: String,
    pub friendly_filter: Vec<String>,
    pub enemy_filter: Vec<String>,
    /// Below this friendly/enemy ratio the friendly force is at a
    /// disadvantage.
    pub ratio: f64,
    pub advantage: String,
    pub disadvantage: String,
    pub balanced: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct OrderConfig {
    pub name: String,
    pub raw_abilities: Vec<u32>,
    pub unit_group_filter: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitGroupConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub friendly_filter: Vec<String>,
    pub enemy_filter: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub friendly_filter: Vec<String>,
    pub enemy_filter: Vec<String>,
    pub melee_range_ratio: f64,
    pub close_range_ratio: f64,
    pub far_range_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub friendly_filter: Vec<String>,
    pub enemy_filter: Vec<String>,
    pub compact_ratio: f64,
    pub spread_ratio: f64,
    pub scattered_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub friendly_filter: Vec<String>,
    pub enemy_filter: Vec<String>,
    pub low_elevation: f64,
    pub medium_elevation: f64,
    pub high_elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceFactorsConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub factors: Vec<ForceFactorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceRelativeFactorsConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub factors: Vec<ForceRelativeFactorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderAttackConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub friendly_filter: Vec<String>,
    pub enemy_filter: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub friendly_move_friendly_filter: Vec<String>,
    pub friendly_move_enemy_filter: Vec<String>,
    pub enemy_move_friendly_filter: Vec<String>,
    pub enemy_move_enemy_filter: Vec<String>,
    /// Minimum center-of-mass displacement per step for a force to count as
    /// moving.
    pub velocity_threshold: f64,
    pub max_velocity: f64,
    /// `[start, end)` interval, in radians.
    pub advance_angle_thresh: [f64; 2],
    /// `(start, end]` interval, in radians.
    pub retreat_angle_thresh: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetweenConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    pub friendly_filter: Vec<String>,
    pub enemy_filter: Vec<String>,
    pub barrier_filter: Vec<String>,
    pub between_units_ratio: f64,
    pub barrier_angle_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdersConfig {
    #[serde(flatten)]
    pub output: OutputModes,
    #[serde(default)]
    pub friendly: Vec<OrderConfig>,
    #[serde(default)]
    pub enemy: Vec<OrderConfig>,
}

/// Every parameter of a feature extraction run. Loaded once, validated, and
/// then shared read-only by every pipeline of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureExtractorConfig {
    pub sample_int: usize,
    pub friendly_id: u32,
    /// Extra unit-type names on top of the built-in SC2 table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unit_types: BTreeMap<String, u32>,
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub unit_costs: BTreeMap<String, [f64; 2]>,
    #[serde(default)]
    pub max_friendly_units: BTreeMap<String, u32>,
    #[serde(default)]
    pub max_enemy_units: BTreeMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_group: Option<UnitGroupConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<DistanceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentration: Option<ConcentrationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<ElevationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_factors: Option<ForceFactorsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_relative_factors: Option<ForceRelativeFactorsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub under_attack: Option<UnderAttackConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement: Option<MovementConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<BetweenConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<OrdersConfig>,
}

macro_rules! section_accessor {
    ($( $name:ident: $ty:ty ),* $(,)?) => {
        $(
            pub fn $name(&self) -> FeatureExtractorResult<&$ty> {
                self.$name.as_ref().ok_or_else(|| {
                    FeatureExtractorError::new(FeatureExtractorErrorVariant::MissingParameter {
                        extractor: stringify!($name),
                        parameter: stringify!($name).to_string(),
                    })
                })
            }
        )*
    };
}

impl FeatureExtractorConfig {
    /// A configuration with no unit groups and no extractor sections.
    pub fn empty(sample_int: usize, friendly_id: u32) -> Self {
        Self {
            sample_int,
            friendly_id,
            unit_types: BTreeMap::new(),
            groups: BTreeMap::new(),
            unit_costs: BTreeMap::new(),
            max_friendly_units: BTreeMap::new(),
            max_enemy_units: BTreeMap::new(),
            unit_group: None,
            distance: None,
            concentration: None,
            elevation: None,
            force_factors: None,
            force_relative_factors: None,
            under_attack: None,
            movement: None,
            between: None,
            orders: None,
        }
    }

    section_accessor!(
        unit_group: UnitGroupConfig,
        distance: DistanceConfig,
        concentration: ConcentrationConfig,
        elevation: ElevationConfig,
        force_factors: ForceFactorsConfig,
        force_relative_factors: ForceRelativeFactorsConfig,
        under_attack: UnderAttackConfig,
        movement: MovementConfig,
        between: BetweenConfig,
        orders: OrdersConfig,
    );

    pub fn from_json_str(json: &str) -> FeatureExtractorResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> FeatureExtractorResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded configuration from {:?}", path.as_ref());
        Ok(config)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> FeatureExtractorResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn unit_registry(&self) -> UnitRegistry {
        UnitRegistry::new(&self.unit_types)
    }

    pub fn resolve_filter(&self, refs: &[String]) -> FeatureExtractorResult<GroupFilter> {
        GroupFilter::resolve(self, refs)
    }

    pub fn unit_costs_by_type(&self) -> FeatureExtractorResult<HashMap<u32, [f64; 2]>> {
        self.unit_table(&self.unit_costs)
    }

    pub fn max_units_by_type(&self, side: Side) -> FeatureExtractorResult<HashMap<u32, u32>> {
        match side {
            Side::Friendly => self.unit_table(&self.max_friendly_units),
            Side::Enemy => self.unit_table(&self.max_enemy_units),
        }
    }

    fn unit_table<T: Copy>(
        &self,
        table: &BTreeMap<String, T>,
    ) -> FeatureExtractorResult<HashMap<u32, T>> {
        let registry = self.unit_registry();
        table
            .iter()
            .map(|(reference, value)| Ok((registry.resolve(reference)?.1, *value)))
            .collect()
    }

    /// Checks every parameter that could otherwise only fail once replays are
    /// being processed.
    pub fn validate(&self) -> FeatureExtractorResult<()> {
        if self.sample_int == 0 {
            return invalid("sample_int", "must be greater than zero");
        }
        self.unit_costs_by_type()?;
        self.max_units_by_type(Side::Friendly)?;
        self.max_units_by_type(Side::Enemy)?;

        let mut filters: Vec<&[String]> = Vec::new();
        if let Some(c) = &self.unit_group {
            filters.extend([&c.friendly_filter[..], &c.enemy_filter[..]]);
        }
        if let Some(c) = &self.distance {
            filters.extend([&c.friendly_filter[..], &c.enemy_filter[..]]);
            check_ascending(
                "distance",
                &[c.melee_range_ratio, c.close_range_ratio, c.far_range_ratio],
            )?;
        }
        if let Some(c) = &self.concentration {
            filters.extend([&c.friendly_filter[..], &c.enemy_filter[..]]);
            check_ascending(
                "concentration",
                &[c.compact_ratio, c.spread_ratio, c.scattered_ratio],
            )?;
        }
        if let Some(c) = &self.elevation {
            filters.extend([&c.friendly_filter[..], &c.enemy_filter[..]]);
            check_ascending(
                "elevation",
                &[c.low_elevation, c.medium_elevation, c.high_elevation],
            )?;
        }
        if let Some(c) = &self.force_factors {
            for factor in c.factors.iter() {
                filters.extend([&factor.friendly_filter[..], &factor.enemy_filter[..]]);
                if factor.levels.is_empty() {
                    return FeatureExtractorError::new_result(
                        FeatureExtractorErrorVariant::MissingParameter {
                            extractor: "force_factors",
                            parameter: format!("{}.levels", factor.name),
                        },
                    );
                }
            }
        }
        if let Some(c) = &self.force_relative_factors {
            for factor in c.factors.iter() {
                filters.extend([&factor.friendly_filter[..], &factor.enemy_filter[..]]);
                if !(factor.ratio > 0.0 && factor.ratio <= 1.0) {
                    return invalid(&format!("{}.ratio", factor.name), "must be within (0, 1]");
                }
            }
        }
        if let Some(c) = &self.under_attack {
            filters.extend([&c.friendly_filter[..], &c.enemy_filter[..]]);
        }
        if let Some(c) = &self.movement {
            filters.extend([
                &c.friendly_move_friendly_filter[..],
                &c.friendly_move_enemy_filter[..],
                &c.enemy_move_friendly_filter[..],
                &c.enemy_move_enemy_filter[..],
            ]);
            if !(c.max_velocity > 0.0) {
                return invalid("max_velocity", "must be positive");
            }
        }
        if let Some(c) = &self.between {
            filters.extend([
                &c.friendly_filter[..],
                &c.enemy_filter[..],
                &c.barrier_filter[..],
            ]);
            if !(0.0..=1.0).contains(&c.between_units_ratio) {
                return invalid("between_units_ratio", "must be within [0, 1]");
            }
        }
        if let Some(c) = &self.orders {
            filters.extend(
                c.friendly
                    .iter()
                    .chain(c.enemy.iter())
                    .map(|order| &order.unit_group_filter[..]),
            );
        }

        for refs in filters {
            self.resolve_filter(refs)?;
        }
        Ok(())
    }
}

fn invalid<T>(parameter: &str, reason: &str) -> FeatureExtractorResult<T> {
    FeatureExtractorError::new_result(FeatureExtractorErrorVariant::InvalidParameter {
        parameter: parameter.to_string(),
        reason: reason.to_string(),
    })
}

fn check_ascending(section: &str, thresholds: &[f64]) -> FeatureExtractorResult<()> {
    if thresholds.windows(2).all(|pair| pair[0] <= pair[1]) {
        Ok(())
    } else {
        invalid(section, "thresholds must be in ascending order")
    }
}
