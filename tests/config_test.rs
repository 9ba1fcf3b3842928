use sc2_feature_extractor::*;

fn refs(names: &[&str]) -> Vec<String> {
    names.iter().map(|r| r.to_string()).collect()
}

fn config_with_groups(groups: &[(&str, &[&str])]) -> FeatureExtractorConfig {
    let mut config = FeatureExtractorConfig::empty(1, 1);
    for (name, members) in groups {
        config.groups.insert(name.to_string(), refs(members));
    }
    config
}

fn variant_of<T: std::fmt::Debug>(result: FeatureExtractorResult<T>) -> FeatureExtractorErrorVariant {
    result.unwrap_err().variant
}

#[test]
fn test_default_config_loads() {
    let config = FeatureExtractorConfig::load_json("assets/config/default.json").unwrap();
    assert_eq!(config.sample_int, 4);
    assert_eq!(config.friendly_id, 1);
    assert!(config.distance().is_ok());
    assert!(config.movement().is_ok());

    let bio = config.resolve_filter(&refs(&["Bio"])).unwrap();
    assert_eq!(
        bio.get("Bio").unwrap().iter().copied().collect::<Vec<_>>(),
        vec![48, 51]
    );
}

#[test]
fn test_minimal_document_uses_defaults() {
    let config = FeatureExtractorConfig::from_json_str(
        r#"{
            "sample_int": 2,
            "friendly_id": 1,
            "distance": {
                "friendly_filter": ["Terran.Marine"],
                "enemy_filter": ["Zerg.Roach"],
                "melee_range_ratio": 0.01,
                "close_range_ratio": 0.05,
                "far_range_ratio": 0.1
            }
        }"#,
    )
    .unwrap();
    let distance = config.distance().unwrap();
    assert!(distance.output.categorical);
    assert!(!distance.output.numeric);
    assert!(config.groups.is_empty());
    assert!(config.between.is_none());
}

#[test]
fn test_singleton_labels() {
    let config = config_with_groups(&[]);
    let filter = config
        .resolve_filter(&refs(&["Terran.Marine", "110"]))
        .unwrap();
    assert_eq!(filter.labels().collect::<Vec<_>>(), vec!["Marine", "110"]);
    assert!(filter.get("110").unwrap().contains(&110));
}

#[test]
fn test_custom_unit_type_names() {
    let mut config = config_with_groups(&[("Mine", &["Sapper"])]);
    config.unit_types.insert("Sapper".to_string(), 9001);
    let filter = config.resolve_filter(&refs(&["Mine", "Sapper"])).unwrap();
    assert!(filter.get("Mine").unwrap().contains(&9001));
    assert!(filter.get("Sapper").unwrap().contains(&9001));
}

#[test]
fn test_unresolvable_references() {
    let config = config_with_groups(&[("Bio", &["Terran.Marine"])]);
    assert!(matches!(
        variant_of(config.resolve_filter(&refs(&["Terran.Battlestar"]))),
        FeatureExtractorErrorVariant::UnknownUnitType { .. }
    ));
    assert!(matches!(
        variant_of(config.resolve_filter(&refs(&["Mech"]))),
        FeatureExtractorErrorVariant::UnknownUnitGroup { .. }
    ));
}

#[test]
fn test_groups_are_one_level_deep() {
    let config = config_with_groups(&[
        ("Bio", &["Terran.Marine"]),
        ("Army", &["Bio", "Terran.SiegeTank"]),
    ]);
    assert!(matches!(
        variant_of(config.resolve_filter(&refs(&["Army"]))),
        FeatureExtractorErrorVariant::NestedGroupReference { .. }
    ));

    let config = config_with_groups(&[("Nothing", &[])]);
    assert!(matches!(
        variant_of(config.resolve_filter(&refs(&["Nothing"]))),
        FeatureExtractorErrorVariant::EmptyGroup { .. }
    ));
}

#[test]
fn test_validation_rejects_bad_parameters() {
    let mut config = config_with_groups(&[]);
    config.sample_int = 0;
    assert!(matches!(
        variant_of(config.validate()),
        FeatureExtractorErrorVariant::InvalidParameter { .. }
    ));

    let mut config = config_with_groups(&[]);
    config.force_factors = Some(ForceFactorsConfig {
        output: OutputModes::default(),
        factors: vec![ForceFactorConfig {
            factor: UnitFactor::Health,
            name: "Health".to_string(),
            op: AggregationOp::Sum,
            friendly_filter: refs(&["Terran.Marine"]),
            enemy_filter: refs(&["Zerg.Roach"]),
            levels: Vec::new(),
        }],
    });
    let error = config.validate().unwrap_err();
    assert!(error.variant.is_configuration_error());
    assert!(matches!(
        error.variant,
        FeatureExtractorErrorVariant::MissingParameter { .. }
    ));

    let mut config = config_with_groups(&[]);
    config.distance = Some(DistanceConfig {
        output: OutputModes::default(),
        friendly_filter: refs(&["Terran.Marine"]),
        enemy_filter: refs(&["Zerg.Roach"]),
        melee_range_ratio: 0.1,
        close_range_ratio: 0.05,
        far_range_ratio: 0.2,
    });
    assert!(config.validate().is_err());

    let mut config = config_with_groups(&[]);
    config.between = Some(BetweenConfig {
        output: OutputModes::default(),
        friendly_filter: refs(&["Terran.Marine"]),
        enemy_filter: refs(&["Zerg.Roach"]),
        barrier_filter: refs(&["Ghosts"]),
        between_units_ratio: 0.5,
        barrier_angle_threshold: 0.1,
    });
    assert!(matches!(
        variant_of(config.validate()),
        FeatureExtractorErrorVariant::UnknownUnitGroup { .. }
    ));
}

#[test]
fn test_unknown_cost_reference_is_fatal() {
    let mut config = config_with_groups(&[]);
    config
        .unit_costs
        .insert("Protoss.Dragoon".to_string(), [125.0, 50.0]);
    assert!(matches!(
        variant_of(config.validate()),
        FeatureExtractorErrorVariant::UnknownUnitType { .. }
    ));
}

#[test]
fn test_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(CONFIG_FILE);
    let config = FeatureExtractorConfig::load_json("assets/config/default.json").unwrap();
    config.save_json(&path).unwrap();
    assert_eq!(FeatureExtractorConfig::load_json(&path).unwrap(), config);
}

#[test]
fn test_aggregation_ops() {
    let values = [1.0, 2.0, 3.0, 10.0];
    assert_eq!(AggregationOp::Sum.apply(&values), Some(16.0));
    assert_eq!(AggregationOp::Median.apply(&values), Some(2.5));
    assert_eq!(AggregationOp::Count.apply(&values), Some(4.0));
    assert_eq!(AggregationOp::Max.apply(&[]), None);
}
