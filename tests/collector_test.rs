use glam::Vec2;
use sc2_feature_extractor::*;
use std::path::Path;

static DEFAULT_CONFIG: &str = "assets/config/default.json";

const MARINE: u32 = 48;
const ZERGLING: u32 = 105;
const ATTACK: u32 = 23;

fn players(count: u32) -> ReplayInfo {
    ReplayInfo::new(
        "Acropolis".to_string(),
        1000,
        (1..=count)
            .map(|id| PlayerInfo::new(id, String::new(), None))
            .collect(),
    )
}

/// The same skirmish seen by either player: the observing player's units
/// are always `Own`.
fn view(terran_alliance: Alliance, zerg_alliance: Alliance, timestep: usize) -> Observation {
    let x = timestep as f32;
    Observation::new(
        vec![
            Unit::new(1, MARINE, terran_alliance, Vec2::new(x, 10.0)).with_health(45.0, 45.0),
            Unit::new(2, ZERGLING, zerg_alliance, Vec2::new(30.0, 10.0))
                .with_health(35.0, 35.0)
                .with_orders(vec![ATTACK]),
        ],
        Vec2::new(64.0, 64.0),
    )
}

fn terran_view(timestep: usize) -> Observation {
    view(Alliance::Own, Alliance::Enemy, timestep)
}

fn zerg_view(timestep: usize) -> Observation {
    view(Alliance::Enemy, Alliance::Own, timestep)
}

fn play(collector: &mut ReplayFeatureCollector, steps: usize, observe: fn(usize) -> Observation) {
    collector.reset_extractors().unwrap();
    for timestep in 0..steps {
        collector.record_step(0, timestep, &observe(timestep)).unwrap();
    }
}

#[test]
fn test_both_perspectives_are_joined() {
    let config = FeatureExtractorConfig::load_json(DEFAULT_CONFIG).unwrap();
    let mut collector = ReplayFeatureCollector::standard(&config).unwrap();
    let path = Path::new("replays/skirmish_ep7.json");
    let info = players(2);

    collector.begin_replay(path, &info, 1).unwrap();
    assert_eq!(collector.side(), Side::Friendly);
    play(&mut collector, 9, terran_view);
    assert!(collector.build_table().unwrap().is_none());

    collector.begin_replay(path, &info, 2).unwrap();
    assert_eq!(collector.side(), Side::Enemy);
    play(&mut collector, 9, zerg_view);
    let table = collector.build_table().unwrap().unwrap();
    assert_eq!(collector.state(), CollectorState::ReplayFinished);

    assert_eq!(table.columns, collector.features_labels(2));
    // Sampled every fourth step.
    assert_eq!(table.len(), 3);
    let timesteps: Vec<_> = table
        .column(table.column_index(TIMESTEP_COLUMN).unwrap())
        .cloned()
        .collect();
    assert_eq!(
        timesteps,
        vec![
            FeatureValue::Int(0),
            FeatureValue::Int(4),
            FeatureValue::Int(8)
        ]
    );
    let file = table.column_index(REPLAY_FILE_COLUMN).unwrap();
    assert!(table
        .column(file)
        .all(|value| *value == FeatureValue::label("skirmish_ep7")));

    // The zerg player's own orders are reported as enemy orders.
    let attacking = table.column_index("Attack_Enemy_Light").unwrap();
    assert!(table
        .column(attacking)
        .all(|value| *value == FeatureValue::Bool(true)));
    let present = table.column_index("Present_Enemy_Light").unwrap();
    assert!(table
        .column(present)
        .all(|value| *value == FeatureValue::Bool(true)));
}

#[test]
fn test_mismatched_perspectives_are_discarded() {
    let config = FeatureExtractorConfig::load_json(DEFAULT_CONFIG).unwrap();
    let mut collector = ReplayFeatureCollector::standard(&config).unwrap();
    let path = Path::new("replays/short.json");
    let info = players(2);

    collector.begin_replay(path, &info, 1).unwrap();
    play(&mut collector, 9, terran_view);
    assert!(collector.build_table().unwrap().is_none());

    collector.begin_replay(path, &info, 2).unwrap();
    play(&mut collector, 5, zerg_view);
    assert!(collector.build_table().unwrap().is_none());
}

#[test]
fn test_single_player_replay() {
    let config = FeatureExtractorConfig::load_json(DEFAULT_CONFIG).unwrap();
    let mut collector = ReplayFeatureCollector::standard(&config).unwrap();

    collector
        .begin_replay(Path::new("replays/solo.json"), &players(1), 1)
        .unwrap();
    play(&mut collector, 8, terran_view);
    let table = collector.build_table().unwrap().unwrap();
    assert_eq!(table.columns, collector.features_labels(1));
    assert_eq!(table.len(), 2);
    assert!(table.column_index("Attack_Enemy_Light").is_none());
}

#[test]
fn test_new_replay_discards_previous_rows() {
    let config = FeatureExtractorConfig::load_json(DEFAULT_CONFIG).unwrap();
    let mut collector = ReplayFeatureCollector::standard(&config).unwrap();
    let info = players(2);

    collector
        .begin_replay(Path::new("replays/first.json"), &info, 1)
        .unwrap();
    play(&mut collector, 9, terran_view);
    assert!(collector.build_table().unwrap().is_none());

    // The enemy perspective of a different replay does not complete the
    // first one.
    collector
        .begin_replay(Path::new("replays/second.json"), &info, 2)
        .unwrap();
    play(&mut collector, 9, zerg_view);
    assert!(collector.build_table().unwrap().is_none());
}

#[test]
fn test_operations_out_of_order() {
    let config = FeatureExtractorConfig::load_json(DEFAULT_CONFIG).unwrap();
    let mut collector = ReplayFeatureCollector::standard(&config).unwrap();
    assert_eq!(collector.state(), CollectorState::Idle);

    let error = collector.record_step(0, 0, &terran_view(0)).unwrap_err();
    assert!(matches!(
        error.variant,
        FeatureExtractorErrorVariant::InvalidCollectorState { .. }
    ));
    assert!(collector.build_table().is_err());

    let path = Path::new("replays/skirmish.json");
    collector.begin_replay(path, &players(2), 1).unwrap();
    assert!(collector.begin_replay(path, &players(2), 1).is_err());

    collector.abort();
    assert_eq!(collector.state(), CollectorState::Idle);
    collector.begin_replay(path, &players(2), 1).unwrap();
}

#[test]
fn test_episode_change_resets_extractors() {
    let config = FeatureExtractorConfig::load_json(DEFAULT_CONFIG).unwrap();
    let friendly = ExtractorPipeline::from_names(&["meta", "under_attack"], &config).unwrap();
    let mut collector = ReplayFeatureCollector::new(&config, friendly, ExtractorPipeline::new(Vec::new()));
    let marines = |health: f32| {
        Observation::new(
            vec![Unit::new(1, MARINE, Alliance::Own, Vec2::new(5.0, 5.0)).with_health(health, 45.0)],
            Vec2::new(64.0, 64.0),
        )
    };

    collector
        .begin_replay(Path::new("replays/episodes.json"), &players(1), 1)
        .unwrap();
    collector.reset_extractors().unwrap();
    collector.record_step(0, 0, &marines(45.0)).unwrap();
    collector.record_step(0, 4, &marines(30.0)).unwrap();
    collector.record_step(1, 0, &marines(30.0)).unwrap();
    collector.record_step(1, 4, &marines(20.0)).unwrap();
    let table = collector.build_table().unwrap().unwrap();

    let attacked = table.column_index("Attacking_Enemy_Red_Bio").unwrap();
    let values: Vec<_> = table.column(attacked).cloned().collect();
    assert_eq!(
        values,
        vec![
            FeatureValue::Bool(false),
            FeatureValue::Bool(true),
            FeatureValue::Bool(false),
            FeatureValue::Bool(true),
        ]
    );
}

#[test]
fn test_descriptors_are_saved() {
    let config = FeatureExtractorConfig::load_json(DEFAULT_CONFIG).unwrap();
    let collector = ReplayFeatureCollector::standard(&config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(FEATURE_DESCRIPTORS_FILE);
    collector.save_descriptors(&path, 2).unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let saved = saved.as_array().unwrap();
    assert_eq!(saved.len(), collector.features_labels(2).len());
    assert_eq!(saved[0]["name"], "Episode");
    assert_eq!(saved[0]["type"], "Integer");
}
