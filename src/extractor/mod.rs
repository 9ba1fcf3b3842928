pub mod between;
pub mod concentration;
pub mod distance;
pub mod elevation;
pub mod force;
pub mod force_relative;
pub mod group;
pub mod meta;
pub mod movement;
pub mod orders;
pub mod under_attack;

pub use between::*;
pub use concentration::*;
pub use distance::*;
pub use elevation::*;
pub use force::*;
pub use force_relative::*;
pub use group::*;
pub use meta::*;
pub use movement::*;
pub use orders::*;
pub use under_attack::*;

use serde::{Serialize, Serializer};

use crate::*;

/// A single cell of a feature row.
#[derive(Debug, Clone)]
pub enum FeatureValue {
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(String),
    /// The value could not be computed for this observation.
    Undefined,
}

impl FeatureValue {
    pub fn nan() -> Self {
        FeatureValue::Real(f64::NAN)
    }

    pub fn label(label: &str) -> Self {
        FeatureValue::Str(label.to_string())
    }

    pub fn real_or_nan(value: Option<f64>) -> Self {
        FeatureValue::Real(value.unwrap_or(f64::NAN))
    }

    pub fn is_missing(&self) -> bool {
        match self {
            FeatureValue::Undefined => true,
            FeatureValue::Real(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Real(v) => Some(*v),
            FeatureValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FeatureValue::Int(v) => Some(*v),
            FeatureValue::Real(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FeatureValue::Int(_) | FeatureValue::Real(_))
    }

    /// Reads back a value written by [`FeatureValue::to_cell`].
    pub fn parse(cell: &str) -> Self {
        if cell.is_empty() {
            return FeatureValue::nan();
        }
        if cell == TRUE_VALUE {
            return FeatureValue::Bool(true);
        }
        if cell == FALSE_VALUE {
            return FeatureValue::Bool(false);
        }
        if cell == UNDEFINED_FEATURE_VALUE {
            return FeatureValue::Undefined;
        }
        if let Ok(v) = cell.parse::<i64>() {
            return FeatureValue::Int(v);
        }
        match cell.parse::<f64>() {
            Ok(v) => FeatureValue::Real(v),
            Err(_) => FeatureValue::Str(cell.to_string()),
        }
    }

    /// The textual form used in feature tables. NaN is written as an empty
    /// cell. Reals always carry a decimal point or exponent, so integral
    /// reals are read back as reals.
    pub fn to_cell(&self) -> String {
        match self {
            FeatureValue::Bool(true) => TRUE_VALUE.to_string(),
            FeatureValue::Bool(false) => FALSE_VALUE.to_string(),
            FeatureValue::Int(v) => v.to_string(),
            FeatureValue::Real(v) if v.is_nan() => String::new(),
            FeatureValue::Real(v) => format!("{:?}", v),
            FeatureValue::Str(s) => s.clone(),
            FeatureValue::Undefined => UNDEFINED_FEATURE_VALUE.to_string(),
        }
    }
}

impl PartialEq for FeatureValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FeatureValue::Bool(a), FeatureValue::Bool(b)) => a == b,
            (FeatureValue::Int(a), FeatureValue::Int(b)) => a == b,
            (FeatureValue::Real(a), FeatureValue::Real(b)) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (FeatureValue::Str(a), FeatureValue::Str(b)) => a == b,
            (FeatureValue::Undefined, FeatureValue::Undefined) => true,
            _ => false,
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Int(value)
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Real(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Str(value.to_string())
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_cell())
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Bool(v) => serializer.serialize_bool(*v),
            FeatureValue::Int(v) => serializer.serialize_i64(*v),
            FeatureValue::Real(v) if v.is_nan() => serializer.serialize_none(),
            FeatureValue::Real(v) => serializer.serialize_f64(*v),
            FeatureValue::Str(s) => serializer.serialize_str(s),
            FeatureValue::Undefined => serializer.serialize_str(UNDEFINED_FEATURE_VALUE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureType {
    /// Boolean, or undefined.
    Boolean = 1,
    /// Boolean, never undefined.
    BooleanPositive = 2,
    Categorical = 3,
    String = 4,
    Integer = 5,
    Real = 6,
}

/// Describes one output column, for downstream tooling.
#[derive(Debug, Clone, PartialEq, Serialize, new)]
pub struct FeatureDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    pub values: Option<Vec<FeatureValue>>,
}

impl FeatureDescriptor {
    pub fn boolean(name: String) -> Self {
        Self::new(name, FeatureType::Boolean, None)
    }

    pub fn categorical(name: String, values: &[&str]) -> Self {
        Self::new(
            name,
            FeatureType::Categorical,
            Some(values.iter().map(|v| FeatureValue::label(v)).collect()),
        )
    }

    pub fn real(name: String, min: f64, max: f64) -> Self {
        Self::new(
            name,
            FeatureType::Real,
            Some(vec![FeatureValue::Real(min), FeatureValue::Real(max)]),
        )
    }

    pub fn integer(name: String, min: i64, max: i64) -> Self {
        Self::new(
            name,
            FeatureType::Integer,
            Some(vec![FeatureValue::Int(min), FeatureValue::Int(max)]),
        )
    }
}

/// Where in a replay an observation was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct StepInfo<'a> {
    pub episode: usize,
    pub timestep: usize,
    pub replay_name: &'a str,
}

/// Converts observations into an ordered row of feature values. The number
/// and order of the values added per step always match
/// [`FeatureExtractor::features_labels`].
pub trait FeatureExtractor {
    fn features_labels(&self) -> Vec<String>;

    fn features_descriptors(&self) -> Vec<FeatureDescriptor>;

    fn add_features(&mut self, step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>);

    /// Discards any state carried over from previous observations.
    fn reset(&mut self) {}

    fn features_added(&self) -> usize {
        self.features_labels().len()
    }

    fn extract(&mut self, step: &StepInfo, obs: &Observation) -> Vec<FeatureValue> {
        let mut row = Vec::new();
        self.add_features(step, obs, &mut row);
        row
    }
}

macro_rules! extractor_enum {
    ($( $variant:ident($ty:ty) ),* $(,)?) => {
        /// Every extractor kind a pipeline can be composed of.
        #[derive(Debug, Clone)]
        pub enum Extractor {
            $( $variant($ty), )*
        }

        $(
            impl From<$ty> for Extractor {
                fn from(extractor: $ty) -> Self {
                    Extractor::$variant(extractor)
                }
            }
        )*

        impl FeatureExtractor for Extractor {
            fn features_labels(&self) -> Vec<String> {
                match self {
                    $( Extractor::$variant(e) => e.features_labels(), )*
                }
            }

            fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
                match self {
                    $( Extractor::$variant(e) => e.features_descriptors(), )*
                }
            }

            fn add_features(
                &mut self,
                step: &StepInfo,
                obs: &Observation,
                row: &mut Vec<FeatureValue>,
            ) {
                match self {
                    $( Extractor::$variant(e) => e.add_features(step, obs, row), )*
                }
            }

            fn reset(&mut self) {
                match self {
                    $( Extractor::$variant(e) => e.reset(), )*
                }
            }
        }
    };
}

extractor_enum!(
    Meta(MetaExtractor),
    UnitGroup(UnitGroupExtractor),
    Distance(DistanceExtractor),
    Concentration(ConcentrationExtractor),
    Elevation(ElevationExtractor),
    ForceFactors(ForceFactorsExtractor),
    ForceRelativeFactors(ForceRelativeFactorsExtractor),
    UnderAttack(UnderAttackExtractor),
    Movement(RelativeMovementExtractor),
    Between(BetweenExtractor),
    Orders(OrdersExtractor),
);

macro_rules! extractor_names {
    ($( $name:literal => |$config:ident| $build:expr ),* $(,)?) => {
        impl Extractor {
            pub const NAMES: &'static [&'static str] = &[$( $name ),*];

            /// Builds the extractor registered under `name`.
            pub fn from_name(
                name: &str,
                config: &FeatureExtractorConfig,
            ) -> FeatureExtractorResult<Self> {
                match name {
                    $( $name => {
                        let $config = config;
                        Ok(Extractor::from($build?))
                    } )*
                    _ => FeatureExtractorError::new_result(
                        FeatureExtractorErrorVariant::UnknownExtractorName(name.to_string()),
                    ),
                }
            }
        }
    };
}

extractor_names!(
    "meta" => |_c| Ok::<_, FeatureExtractorError>(MetaExtractor::default()),
    "unit_group" => |c| UnitGroupExtractor::new(c),
    "distance" => |c| DistanceExtractor::new(c),
    "concentration" => |c| ConcentrationExtractor::new(c),
    "elevation" => |c| ElevationExtractor::new(c),
    "force_factors" => |c| ForceFactorsExtractor::new(c),
    "force_relative_factors" => |c| ForceRelativeFactorsExtractor::new(c),
    "under_attack" => |c| UnderAttackExtractor::new(c),
    "friendly_movement" => |c| RelativeMovementExtractor::new(c, Side::Friendly),
    "enemy_movement" => |c| RelativeMovementExtractor::new(c, Side::Enemy),
    "between" => |c| BetweenExtractor::new(c),
    "friendly_orders" => |c| OrdersExtractor::new(c, Side::Friendly),
    "enemy_orders" => |c| OrdersExtractor::new(c, Side::Enemy),
);

/// Labels for each group of both sides, friendly groups first.
pub(crate) fn side_group_labels(
    prefix: &str,
    friendly: &GroupFilter,
    enemy: &GroupFilter,
) -> Vec<String> {
    friendly
        .labels()
        .map(|g| format!("{}{}_{}", prefix, FRIENDLY_LABEL, g))
        .chain(
            enemy
                .labels()
                .map(|g| format!("{}{}_{}", prefix, ENEMY_LABEL, g)),
        )
        .collect()
}

/// Labels for every `(a, b)` group combination.
pub(crate) fn pair_labels(prefix: &str, pairs: &[(String, String)]) -> Vec<String> {
    pairs
        .iter()
        .map(|(a, b)| format!("{}_{}_{}", prefix, a, b))
        .collect()
}

pub(crate) fn owned_product(a: &GroupFilter, b: &GroupFilter) -> Vec<(String, String)> {
    a.product(b)
        .into_iter()
        .map(|(x, y)| (x.to_string(), y.to_string()))
        .collect()
}

/// Category label for the index returned by
/// [`first_level_not_exceeded`], or undefined.
pub(crate) fn category(index: Option<usize>, labels: &[&str]) -> FeatureValue {
    index
        .and_then(|i| labels.get(i))
        .map_or(FeatureValue::Undefined, |label| FeatureValue::label(label))
}
