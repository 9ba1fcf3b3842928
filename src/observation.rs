use std::collections::BTreeSet;

use glam::{DVec2, Vec2};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// The relation of a unit's owner to the observing player, as tagged by the
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alliance {
    Own,
    Ally,
    Neutral,
    Enemy,
}

impl Alliance {
    pub fn side(self) -> Side {
        match self {
            Alliance::Own => Side::Friendly,
            _ => Side::Enemy,
        }
    }

    fn swapped(self) -> Self {
        match self {
            Alliance::Own => Alliance::Enemy,
            Alliance::Enemy => Alliance::Own,
            other => other,
        }
    }
}

/// Friendly units are the ones owned by the configured friendly player;
/// every other unit, neutral ones included, is on the enemy side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Friendly,
    Enemy,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Friendly => FRIENDLY_LABEL,
            Side::Enemy => ENEMY_LABEL,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Friendly => Side::Enemy,
            Side::Enemy => Side::Friendly,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub tag: u64,
    pub unit_type: u32,
    pub alliance: Alliance,
    pub pos: Vec2,
    #[serde(default)]
    pub health: f32,
    #[serde(default)]
    pub health_max: f32,
    #[serde(default)]
    pub shield: f32,
    #[serde(default)]
    pub shield_max: f32,
    #[serde(default)]
    pub energy: f32,
    #[serde(default)]
    pub energy_max: f32,
    #[serde(default = "fully_built")]
    pub build_progress: f32,
    #[serde(default)]
    pub weapon_cooldown: f32,
    #[serde(default)]
    pub orders: Vec<u32>,
    #[serde(default)]
    pub order_length: usize,
}

fn fully_built() -> f32 {
    1.0
}

impl Unit {
    pub fn new(tag: u64, unit_type: u32, alliance: Alliance, pos: Vec2) -> Self {
        Self {
            tag,
            unit_type,
            alliance,
            pos,
            health: 0.0,
            health_max: 0.0,
            shield: 0.0,
            shield_max: 0.0,
            energy: 0.0,
            energy_max: 0.0,
            build_progress: fully_built(),
            weapon_cooldown: 0.0,
            orders: Vec::new(),
            order_length: 0,
        }
    }

    pub fn with_health(mut self, health: f32, health_max: f32) -> Self {
        self.health = health;
        self.health_max = health_max;
        self
    }

    pub fn with_orders(mut self, orders: Vec<u32>) -> Self {
        self.order_length = orders.len();
        self.orders = orders;
        self
    }

    /// The orders currently queued for this unit. Only the first
    /// `order_length` slots are meaningful, and at most [`MAX_ORDERS`] slots
    /// are reported.
    pub fn active_orders(&self) -> &[u32] {
        let len = self.order_length.min(self.orders.len()).min(MAX_ORDERS);
        &self.orders[..len]
    }

    pub fn side(&self) -> Side {
        self.alliance.side()
    }

    pub fn location(&self) -> DVec2 {
        self.pos.as_dvec2()
    }
}

/// Terrain height per map cell, indexed `[x, y]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Vec<f32>>", into = "Vec<Vec<f32>>")]
pub struct HeightMap(Array2<f32>);

impl HeightMap {
    pub fn new(heights: Array2<f32>) -> Self {
        Self(heights)
    }

    pub fn flat(width: usize, height: usize, value: f32) -> Self {
        Self(Array2::from_elem((width, height), value))
    }

    pub fn heights(&self) -> &Array2<f32> {
        &self.0
    }

    /// Height of the cell containing `pos`, clamping positions outside the
    /// map onto its border. `None` for an empty map.
    pub fn height_at(&self, pos: Vec2) -> Option<f32> {
        let (width, height) = self.0.dim();
        if width == 0 || height == 0 {
            return None;
        }
        let x = clamp_cell(pos.x, width);
        let y = clamp_cell(pos.y, height);
        Some(self.0[[x, y]])
    }
}

fn clamp_cell(coordinate: f32, cells: usize) -> usize {
    if coordinate.is_nan() || coordinate <= 0.0 {
        0
    } else {
        (coordinate.floor() as usize).min(cells - 1)
    }
}

impl From<Vec<Vec<f32>>> for HeightMap {
    fn from(columns: Vec<Vec<f32>>) -> Self {
        let width = columns.len();
        let height = columns.iter().map(Vec::len).min().unwrap_or(0);
        let heights = Array2::from_shape_fn((width, height), |(x, y)| columns[x][y]);
        Self(heights)
    }
}

impl From<HeightMap> for Vec<Vec<f32>> {
    fn from(map: HeightMap) -> Self {
        map.0.outer_iter().map(|column| column.to_vec()).collect()
    }
}

/// One snapshot of the game, as seen by the observing player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub units: Vec<Unit>,
    #[serde(default)]
    pub height_map: HeightMap,
    pub map_size: Vec2,
}

impl Observation {
    pub fn new(units: Vec<Unit>, map_size: Vec2) -> Self {
        Self {
            units,
            height_map: HeightMap::default(),
            map_size,
        }
    }

    pub fn with_height_map(mut self, height_map: HeightMap) -> Self {
        self.height_map = height_map;
        self
    }

    /// Length of the map diagonal, used to normalize distances.
    pub fn map_diagonal(&self) -> f64 {
        self.map_size.as_dvec2().length()
    }

    pub fn units_of(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(move |unit| unit.side() == side)
    }

    pub fn group_units<'a>(
        &'a self,
        side: Side,
        unit_types: &'a BTreeSet<u32>,
    ) -> impl Iterator<Item = &'a Unit> + 'a {
        self.units_of(side)
            .filter(move |unit| unit_types.contains(&unit.unit_type))
    }

    pub fn group_locations(&self, side: Side, unit_types: &BTreeSet<u32>) -> Vec<DVec2> {
        self.group_units(side, unit_types)
            .map(Unit::location)
            .collect()
    }

    /// The same snapshot with the observing player's units and the opposing
    /// player's units swapped, so that a replay observed from the opposing
    /// player's point of view can be processed as if observed by the
    /// friendly player.
    pub fn relabeled(&self) -> Self {
        let units = self
            .units
            .iter()
            .map(|unit| Unit {
                alliance: unit.alliance.swapped(),
                ..unit.clone()
            })
            .collect();
        Self {
            units,
            height_map: self.height_map.clone(),
            map_size: self.map_size,
        }
    }
}

/// A raw action issued during a step. Actions are accepted by the collector
/// but no extractor depends on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct RawAction {
    pub ability_id: u32,
    #[serde(default)]
    pub unit_tags: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct PlayerInfo {
    pub player_id: u32,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
pub struct ReplayInfo {
    #[serde(default)]
    pub map_name: String,
    #[serde(default)]
    pub game_duration_loops: u64,
    pub players: Vec<PlayerInfo>,
}

impl ReplayInfo {
    pub fn num_players(&self) -> usize {
        self.players.len()
    }
}
