use sc2_feature_extractor::*;

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn row(episode: i64, timestep: i64, file: &str, range: &str, health: f64) -> Vec<FeatureValue> {
    vec![
        FeatureValue::Int(episode),
        FeatureValue::Int(timestep),
        FeatureValue::label(file),
        FeatureValue::label(range),
        FeatureValue::Real(health),
    ]
}

fn table(rows: Vec<Vec<FeatureValue>>) -> FeatureTable {
    FeatureTable::from_rows(
        columns(&["Episode", "Timestep", "File", "Range", "Health"]),
        rows,
    )
    .unwrap()
}

fn episodes(table: &FeatureTable) -> Vec<i64> {
    table
        .column(table.column_index(EPISODE_COLUMN).unwrap())
        .map(|value| value.as_i64().unwrap())
        .collect()
}

fn timesteps(table: &FeatureTable) -> Vec<i64> {
    table
        .column(table.column_index(TIMESTEP_COLUMN).unwrap())
        .map(|value| value.as_i64().unwrap())
        .collect()
}

#[test]
fn test_episode_ids_from_replay_names() {
    let merged = DatasetMerger::default()
        .merge(vec![
            table(vec![
                row(0, 4, "game_ep3", "far", 0.5),
                row(0, 0, "game_ep3", "close", 0.25),
            ]),
            table(vec![row(0, 0, "game_ep1", "melee", 0.75)]),
        ])
        .unwrap();

    assert_eq!(episodes(&merged), vec![1, 3, 3]);
    assert_eq!(timesteps(&merged), vec![0, 0, 4]);
    assert_eq!(merged.rows[1][3], FeatureValue::label("close"));
}

#[test]
fn test_sequential_episode_ids() {
    let merged = DatasetMerger::new(false, None)
        .merge(vec![
            table(vec![
                row(0, 0, "game_ep7", "far", 0.5),
                row(1, 0, "game_ep7", "far", 0.5),
            ]),
            table(vec![row(0, 0, "game_ep7", "close", 0.5)]),
        ])
        .unwrap();
    assert_eq!(episodes(&merged), vec![0, 1, 2]);
}

#[test]
fn test_unmarked_replays_are_numbered_sequentially() {
    let merged = merge(
        vec![
            table(vec![row(0, 0, "skirmish", "far", 0.5)]),
            table(vec![row(0, 0, "game_ep5", "far", 0.5)]),
        ],
        true,
        None,
    )
    .unwrap();
    assert_eq!(episodes(&merged), vec![0, 5]);
}

#[test]
fn test_duplicate_episode_ids() {
    let error = DatasetMerger::default()
        .merge(vec![
            table(vec![row(0, 0, "first_ep2", "far", 0.5)]),
            table(vec![row(0, 0, "second_ep2", "far", 0.5)]),
        ])
        .unwrap_err();
    match error.variant {
        FeatureExtractorErrorVariant::DuplicateEpisodeId {
            episode,
            replay_file,
        } => {
            assert_eq!(episode, 2);
            assert_eq!(replay_file, "second_ep2");
        }
        other => panic!("Unexpected error {:?}", other),
    }
}

#[test]
fn test_columns_are_aligned_by_name() {
    let swapped = FeatureTable::from_rows(
        columns(&["Episode", "Timestep", "File", "Health", "Range"]),
        vec![vec![
            FeatureValue::Int(0),
            FeatureValue::Int(0),
            FeatureValue::label("game_ep2"),
            FeatureValue::Real(0.5),
            FeatureValue::label("melee"),
        ]],
    )
    .unwrap();
    let merged = DatasetMerger::default()
        .merge(vec![table(vec![row(0, 0, "game_ep1", "far", 0.25)]), swapped])
        .unwrap();
    assert_eq!(merged.columns, columns(&["Episode", "Timestep", "File", "Range", "Health"]));
    assert_eq!(merged.rows[1][3], FeatureValue::label("melee"));
    assert_eq!(merged.rows[1][4], FeatureValue::Real(0.5));

    let narrow = FeatureTable::from_rows(
        columns(&["Episode", "Timestep", "File", "Range"]),
        vec![vec![
            FeatureValue::Int(0),
            FeatureValue::Int(0),
            FeatureValue::label("game_ep2"),
            FeatureValue::label("melee"),
        ]],
    )
    .unwrap();
    let error = DatasetMerger::default()
        .merge(vec![table(vec![row(0, 0, "game_ep1", "far", 0.25)]), narrow])
        .unwrap_err();
    assert!(matches!(
        error.variant,
        FeatureExtractorErrorVariant::ColumnMismatch { .. }
    ));
}

#[test]
fn test_merging_a_merged_table_changes_nothing() {
    let merger = DatasetMerger::default();
    let merged = merger
        .merge(vec![
            table(vec![row(0, 0, "game_ep3", "far", 0.5)]),
            table(vec![
                row(0, 8, "game_ep1", "close", 0.25),
                row(0, 4, "game_ep1", "melee", f64::NAN),
            ]),
        ])
        .unwrap();
    assert_eq!(merger.merge(vec![merged.clone()]).unwrap(), merged);
}

fn mixed_tables() -> Vec<FeatureTable> {
    vec![
        table(vec![row(0, 0, "a", "far", 0.5), row(1, 0, "a", "close", 0.5)]),
        table(vec![row(0, 0, "c_ep1", "far", 0.25)]),
        table(vec![row(0, 0, "d", "melee", 0.75)]),
    ]
}

fn files(table: &FeatureTable) -> Vec<String> {
    table
        .column(table.column_index(REPLAY_FILE_COLUMN).unwrap())
        .map(FeatureValue::to_cell)
        .collect()
}

#[test]
fn test_sequential_ids_skip_replay_derived_ids() {
    let merged = DatasetMerger::default().merge(mixed_tables()).unwrap();
    assert_eq!(episodes(&merged), vec![0, 1, 2, 3]);
    assert_eq!(files(&merged), vec!["a", "c_ep1", "a", "d"]);

    let merged = DatasetMerger::default()
        .merge(vec![
            table(vec![row(0, 0, "a", "far", 0.5), row(1, 0, "a", "far", 0.5)]),
            table(vec![row(0, 0, "c_ep7", "far", 0.5)]),
            table(vec![row(0, 0, "d", "far", 0.5)]),
        ])
        .unwrap();
    assert_eq!(episodes(&merged), vec![0, 1, 2, 7]);
}

#[test]
fn test_merging_mixed_ids_twice_changes_nothing() {
    for merger in [DatasetMerger::default(), DatasetMerger::new(false, None)] {
        let merged = merger.merge(mixed_tables()).unwrap();
        assert_eq!(merger.merge(vec![merged.clone()]).unwrap(), merged);
    }
    let sequential = DatasetMerger::new(false, None).merge(mixed_tables()).unwrap();
    assert_eq!(files(&sequential), vec!["a", "a", "c_ep1", "d"]);
}

#[test]
fn test_empty_merge() {
    let merged = merge(Vec::new(), true, None).unwrap();
    assert!(merged.is_empty());
    assert_eq!(merged.columns, columns(&["Episode", "Timestep", "File"]));
}

#[test]
fn test_coerce_non_numeric_columns() {
    let mut attacked = FeatureTable::from_rows(
        columns(&["Episode", "Timestep", "File", "Attacked", "Health"]),
        vec![
            vec![
                FeatureValue::Int(0),
                FeatureValue::Int(0),
                FeatureValue::label("game"),
                FeatureValue::Bool(true),
                FeatureValue::Real(0.5),
            ],
            vec![
                FeatureValue::Int(0),
                FeatureValue::Int(1),
                FeatureValue::label("game"),
                FeatureValue::Undefined,
                FeatureValue::Real(0.25),
            ],
        ],
    )
    .unwrap();
    attacked = DatasetMerger::new(true, Some(ScalarKind::String))
        .merge(vec![attacked])
        .unwrap();
    assert_eq!(attacked.rows[0][3], FeatureValue::label("True"));
    assert_eq!(attacked.rows[1][3], FeatureValue::Undefined);
    assert_eq!(attacked.rows[0][4], FeatureValue::Real(0.5));
    // The replay file is not a feature column.
    assert_eq!(attacked.rows[0][2], FeatureValue::label("game"));
}

#[test]
fn test_scalar_kinds() {
    assert_eq!("float".parse::<ScalarKind>().unwrap(), ScalarKind::Real);
    assert_eq!("BOOL".parse::<ScalarKind>().unwrap(), ScalarKind::Boolean);
    assert!("complex".parse::<ScalarKind>().is_err());

    assert_eq!(
        ScalarKind::Boolean.coerce(FeatureValue::label("False")),
        FeatureValue::Bool(false)
    );
    assert_eq!(
        ScalarKind::Integer.coerce(FeatureValue::label("12")),
        FeatureValue::Int(12)
    );
    assert!(ScalarKind::Real
        .coerce(FeatureValue::label("melee"))
        .is_missing());
}

#[test]
fn test_csv_round_trip() {
    let table = FeatureTable::from_rows(
        columns(&["Episode", "Timestep", "File", "A", "B", "C"]),
        vec![
            vec![
                FeatureValue::Int(0),
                FeatureValue::Int(0),
                FeatureValue::label("game_ep0"),
                FeatureValue::Bool(false),
                FeatureValue::Undefined,
                FeatureValue::Real(0.125),
            ],
            vec![
                FeatureValue::Int(0),
                FeatureValue::Int(4),
                FeatureValue::label("game_ep0"),
                FeatureValue::label("compact"),
                FeatureValue::Int(-3),
                FeatureValue::nan(),
            ],
        ],
    )
    .unwrap();

    let mut buffer = Vec::new();
    table.write_csv(&mut buffer).unwrap();
    let text = String::from_utf8(buffer.clone()).unwrap();
    assert!(text.starts_with("Episode,Timestep,File,A,B,C\n"));
    assert!(text.contains("0,4,game_ep0,compact,-3,\n"));
    assert_eq!(FeatureTable::read_csv(buffer.as_slice()).unwrap(), table);
}

#[test]
fn test_integral_reals_stay_real() {
    let table = FeatureTable::from_rows(
        columns(&["Episode", "Timestep", "File", "Health", "Count"]),
        vec![vec![
            FeatureValue::Int(0),
            FeatureValue::Int(0),
            FeatureValue::label("game_ep0"),
            FeatureValue::Real(1.0),
            FeatureValue::Int(1),
        ]],
    )
    .unwrap();
    assert_eq!(FeatureValue::Real(1.0).to_cell(), "1.0");
    assert_eq!(FeatureValue::parse("1.0"), FeatureValue::Real(1.0));

    let mut buffer = Vec::new();
    table.write_csv(&mut buffer).unwrap();
    let text = String::from_utf8(buffer.clone()).unwrap();
    assert!(text.ends_with("0,0,game_ep0,1.0,1\n"));
    let read = FeatureTable::read_csv(buffer.as_slice()).unwrap();
    assert!(matches!(read.rows[0][3], FeatureValue::Real(v) if v == 1.0));
    assert_eq!(read, table);
}

#[test]
fn test_merge_directory() {
    let dir = tempfile::tempdir().unwrap();
    table(vec![row(0, 0, "b_ep2", "far", 0.5)])
        .save_csv(dir.path().join("b_ep2.csv"))
        .unwrap();
    table(vec![row(0, 0, "a_ep9", "close", 0.25)])
        .save_csv(dir.path().join("a_ep9.csv"))
        .unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE), "{}").unwrap();

    let loaded = load_feature_tables(dir.path()).unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded[0].0.ends_with("a_ep9.csv"));

    let merged = DatasetMerger::default().merge_directory(dir.path()).unwrap();
    assert_eq!(episodes(&merged), vec![2, 9]);
    assert_eq!(merged.rows[1][3], FeatureValue::label("close"));
}

#[test]
fn test_dataset_statistics() {
    let dataset = table(vec![
        row(0, 0, "game_ep0", "close", 10.0),
        row(0, 1, "game_ep0", "close", 20.0),
        row(0, 2, "game_ep0", "far", f64::NAN),
        row(1, 0, "game_ep1", "far", 30.0),
        row(1, 1, "game_ep1", "close", 40.0),
    ]);
    let stats = StatsAggregator::new().compute(&dataset).unwrap();

    assert_eq!(stats.num_steps, 5);
    assert_eq!(stats.num_episodes, 2);
    assert_eq!(stats.episode_length.mean, Some(2.5));
    assert_eq!(stats.episode_length.max, Some(3.0));

    assert!(!stats.categorical.contains_key("File"));
    assert!(!stats.numeric.contains_key("Episode"));

    let range = &stats.categorical["Range"];
    assert_eq!(range.all_steps["close"], 3);
    assert_eq!(range.all_steps["far"], 2);
    assert_eq!(range.first_step["close"], 1);
    assert_eq!(range.first_step["far"], 1);
    assert_eq!(range.episodes["far"], 2);
    assert_eq!(range.mean_longest_run["close"], 1.5);
    assert_eq!(range.mean_longest_run["far"], 1.0);

    let health = &stats.numeric["Health"];
    assert_eq!(health.all_steps.count, 4);
    assert_eq!(health.all_steps.nan_count, 1);
    assert_eq!(health.all_steps.mean, Some(25.0));
    assert_eq!(health.all_steps.median, Some(25.0));
    assert_eq!(health.episode_means.min, Some(15.0));
    assert_eq!(health.episode_means.max, Some(35.0));
    assert_eq!(health.last_step.count, 1);
    assert_eq!(health.last_step.nan_count, 1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.json");
    stats.save_json(&path).unwrap();
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["num_episodes"], 2);
}
