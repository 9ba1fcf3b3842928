use std::collections::HashMap;

use glam::DVec2;

use crate::*;

/// Per-group tracking of unit positions across observations.
#[derive(Debug, Clone, Default)]
struct GroupTrack {
    previous: Option<HashMap<u64, DVec2>>,
    center: Option<DVec2>,
    velocity: Option<DVec2>,
}

impl GroupTrack {
    /// Velocity and centre of mass are computed over the units seen in both
    /// this and the previous observation only.
    fn update(&mut self, current: HashMap<u64, DVec2>, elapsed: f64) {
        let centers = self
            .previous
            .as_ref()
            .and_then(|previous| shared_centers(previous, &current));
        self.center = centers.map(|(_, after)| after);
        self.velocity = centers.map(|(before, after)| (after - before) / elapsed);
        self.previous = Some(current);
    }
}

/// Whether a moving force heads towards or away from a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementClass {
    Advancing,
    Retreating,
    Neither,
}

/// Classifies the movement of each group of one side relative to each group
/// of the other side, from the velocity of the groups' centres of mass.
#[derive(Debug, Clone)]
pub struct RelativeMovementExtractor {
    output: OutputModes,
    mover: Side,
    own: GroupFilter,
    other: GroupFilter,
    pairs: Vec<(String, String)>,
    velocity_threshold: f64,
    max_velocity: f64,
    advance_angle: [f64; 2],
    retreat_angle: [f64; 2],
    previous_step: Option<usize>,
    own_tracks: Vec<GroupTrack>,
    other_tracks: Vec<GroupTrack>,
}

impl RelativeMovementExtractor {
    /// `mover` is the side whose movement is classified.
    pub fn new(config: &FeatureExtractorConfig, mover: Side) -> FeatureExtractorResult<Self> {
        let section = config.movement()?;
        let (own, other) = match mover {
            Side::Friendly => (
                &section.friendly_move_friendly_filter,
                &section.friendly_move_enemy_filter,
            ),
            Side::Enemy => (
                &section.enemy_move_enemy_filter,
                &section.enemy_move_friendly_filter,
            ),
        };
        let own = config.resolve_filter(own)?;
        let other = config.resolve_filter(other)?;
        let mut extractor = Self {
            output: section.output,
            mover,
            pairs: owned_product(&own, &other),
            own,
            other,
            velocity_threshold: section.velocity_threshold,
            max_velocity: section.max_velocity,
            advance_angle: section.advance_angle_thresh,
            retreat_angle: section.retreat_angle_thresh,
            previous_step: None,
            own_tracks: Vec::new(),
            other_tracks: Vec::new(),
        };
        extractor.reset();
        Ok(extractor)
    }

    pub fn classify(&self, speed: f64, angle: f64) -> MovementClass {
        let [advance_start, advance_end] = self.advance_angle;
        let [retreat_start, retreat_end] = self.retreat_angle;
        if speed <= self.velocity_threshold {
            MovementClass::Neither
        } else if advance_start <= angle && angle < advance_end {
            MovementClass::Advancing
        } else if retreat_start < angle && angle <= retreat_end {
            MovementClass::Retreating
        } else {
            MovementClass::Neither
        }
    }

    /// Speed and heading relative to the target for every (own group,
    /// other group) pair, if both groups could be tracked.
    fn motions(&self) -> Vec<Option<(f64, f64)>> {
        self.own_tracks
            .iter()
            .flat_map(|own| {
                self.other_tracks.iter().map(move |other| {
                    let velocity = own.velocity?;
                    let center = own.center?;
                    let target = other.center?;
                    Some((velocity.length(), angle_between(velocity, target - center)))
                })
            })
            .collect()
    }

    fn labels(&self, first: &str, second: &str) -> Vec<String> {
        self.pairs
            .iter()
            .flat_map(|(own, other)| {
                [first, second]
                    .map(|prefix| format!("{}_{}_{}_{}", prefix, self.mover, own, other))
            })
            .collect()
    }
}

fn tagged_locations(
    obs: &Observation,
    side: Side,
    filter: &GroupFilter,
) -> Vec<HashMap<u64, DVec2>> {
    filter
        .iter()
        .map(|(_, types)| {
            obs.group_units(side, types)
                .map(|unit| (unit.tag, unit.location()))
                .collect()
        })
        .collect()
}

impl FeatureExtractor for RelativeMovementExtractor {
    fn features_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.output.categorical {
            labels.extend(self.labels("Advancing", "Retreating"));
        }
        if self.output.numeric {
            labels.extend(self.labels("Velocity", "Angle"));
        }
        labels
    }

    fn features_descriptors(&self) -> Vec<FeatureDescriptor> {
        let mut descriptors = Vec::new();
        if self.output.categorical {
            descriptors.extend(
                self.labels("Advancing", "Retreating")
                    .into_iter()
                    .map(FeatureDescriptor::boolean),
            );
        }
        if self.output.numeric {
            descriptors.extend(
                self.labels("Velocity", "Angle")
                    .into_iter()
                    .enumerate()
                    .map(|(i, label)| {
                        let max = if i % 2 == 0 { 1.0 } else { std::f64::consts::PI };
                        FeatureDescriptor::real(label, 0.0, max)
                    }),
            );
        }
        descriptors
    }

    fn add_features(&mut self, step: &StepInfo, obs: &Observation, row: &mut Vec<FeatureValue>) {
        let elapsed = step
            .timestep
            .saturating_sub(self.previous_step.unwrap_or(0))
            .max(1) as f64;
        let own = tagged_locations(obs, self.mover, &self.own);
        let other = tagged_locations(obs, self.mover.opposite(), &self.other);
        for (track, locations) in self.own_tracks.iter_mut().zip(own) {
            track.update(locations, elapsed);
        }
        for (track, locations) in self.other_tracks.iter_mut().zip(other) {
            track.update(locations, elapsed);
        }

        let motions = self.motions();
        if self.output.categorical {
            for motion in motions.iter() {
                match motion {
                    None => row.extend([FeatureValue::Undefined, FeatureValue::Undefined]),
                    Some((speed, angle)) => {
                        let class = self.classify(*speed, *angle);
                        row.extend([
                            FeatureValue::Bool(class == MovementClass::Advancing),
                            FeatureValue::Bool(class == MovementClass::Retreating),
                        ]);
                    }
                }
            }
        }
        if self.output.numeric {
            for motion in motions.iter() {
                match motion {
                    None => row.extend([FeatureValue::nan(), FeatureValue::nan()]),
                    Some((speed, angle)) => row.extend([
                        FeatureValue::Real((speed / self.max_velocity).min(1.0)),
                        FeatureValue::Real(*angle),
                    ]),
                }
            }
        }
        self.previous_step = Some(step.timestep);
    }

    fn reset(&mut self) {
        self.previous_step = None;
        self.own_tracks = vec![GroupTrack::default(); self.own.len()];
        self.other_tracks = vec![GroupTrack::default(); self.other.len()];
    }
}
