use std::collections::HashMap;
use std::path::Path;

use glam::DVec2;

use crate::*;

/// `vec` scaled to unit length; the zero vector is returned unchanged.
pub fn unit_vector(vec: DVec2) -> DVec2 {
    let norm = vec.length();
    if norm == 0.0 {
        vec
    } else {
        vec / norm
    }
}

/// Angle in radians between two directions, in `[0, π]`. Zero vectors are
/// treated as orthogonal to everything.
pub fn angle_between(a: DVec2, b: DVec2) -> f64 {
    unit_vector(a).dot(unit_vector(b)).clamp(-1.0, 1.0).acos()
}

/// Whether `point` lies on the straight path between `a` and `b`, that is,
/// whether the angle subtended at `point` by the two endpoints is within
/// `tolerance` radians of a straight angle.
pub fn is_on_path(point: DVec2, a: DVec2, b: DVec2, tolerance: f64) -> bool {
    let direction = |to: DVec2| {
        let vec = to - point;
        let norm = vec.length();
        vec / if norm == 0.0 { 1.0 } else { norm }
    };
    let angle = direction(a).dot(direction(b)).clamp(-1.0, 1.0).acos();
    (angle - std::f64::consts::PI).abs() < tolerance
}

/// Smallest distance between any location in `a` and any location in `b`.
pub fn min_distance(a: &[DVec2], b: &[DVec2]) -> Option<f64> {
    a.iter()
        .flat_map(|p| b.iter().map(move |q| p.distance(*q)))
        .map(float_ord::FloatOrd)
        .min()
        .map(|d| d.0)
}

/// Mean distance over every unordered pair of `locations`: `None` without
/// locations, `0` for a single one.
pub fn mean_pairwise_distance(locations: &[DVec2]) -> Option<f64> {
    match locations.len() {
        0 => None,
        1 => Some(0.0),
        n => {
            let mut total = 0.0;
            for (i, p) in locations.iter().enumerate() {
                for q in locations[i + 1..].iter() {
                    total += p.distance(*q);
                }
            }
            Some(total / (n * (n - 1) / 2) as f64)
        }
    }
}

pub fn center_of_mass<'a, I>(locations: I) -> Option<DVec2>
where
    I: IntoIterator<Item = &'a DVec2>,
{
    let (sum, count) = locations
        .into_iter()
        .fold((DVec2::ZERO, 0usize), |(sum, count), loc| (sum + *loc, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Index of the first threshold, scaled by `scale`, that `value` does not
/// exceed.
pub fn first_level_not_exceeded(value: f64, thresholds: &[f64], scale: f64) -> Option<usize> {
    thresholds
        .iter()
        .position(|threshold| value <= threshold * scale)
}

/// Centre of mass over the units present in both snapshots, for the
/// previous and current snapshot respectively.
pub fn shared_centers(
    previous: &HashMap<u64, DVec2>,
    current: &HashMap<u64, DVec2>,
) -> Option<(DVec2, DVec2)> {
    let shared: Vec<u64> = previous
        .keys()
        .filter(|tag| current.contains_key(tag))
        .copied()
        .collect();
    let before = center_of_mass(shared.iter().filter_map(|tag| previous.get(tag)))?;
    let after = center_of_mass(shared.iter().filter_map(|tag| current.get(tag)))?;
    Some((before, after))
}

/// The file name of `path` without its extension, used to name replays.
pub fn replay_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Parses the episode number following an `ep` marker in a replay name, as
/// in `replay_ep12_v2`. The marker must be followed directly by digits.
pub fn episode_from_name(name: &str) -> Option<i64> {
    let mut rest = name;
    while let Some(start) = rest.find(EPISODE_MARKER) {
        let after = &rest[start + EPISODE_MARKER.len()..];
        let digits: &str = after
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map_or(after, |(end, _)| &after[..end]);
        if let Ok(episode) = digits.parse() {
            return Some(episode);
        }
        rest = after;
    }
    None
}

/// Parses the global step indices at which a new episode starts, given as
/// comma separated integers.
pub fn parse_episode_breaks(text: &str) -> FeatureExtractorResult<Vec<usize>> {
    text.split([',', '\n', '\r'])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse().map_err(|_| {
                FeatureExtractorError::new(FeatureExtractorErrorVariant::InvalidParameter {
                    parameter: EPISODE_BREAKS_FILE.to_string(),
                    reason: format!("{:?} is not a step index", entry),
                })
            })
        })
        .collect()
}
