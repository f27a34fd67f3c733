use previsor::{ArtifactError, ArtifactStore, Predictor, ProjectRecord, TrainConfig};

fn sample_records() -> Vec<ProjectRecord> {
    (0..40u32)
        .map(|i| {
            let resources = ["Alto", "Médio", "Baixo"][(i % 3) as usize];
            ProjectRecord {
                duration_months: 3.0 + f64::from(i % 9),
                budget: 90_000.0 * f64::from(1 + i % 14),
                team_size: 3 + (i % 8),
                resources: resources.to_string(),
                success: resources != "Baixo" && i % 5 != 0,
            }
        })
        .collect()
}

#[test]
fn test_roundtrip_preserves_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("model.json")).unwrap();

    let (predictor, _) = Predictor::train(&sample_records(), &TrainConfig::default()).unwrap();
    store.save(&predictor.to_artifact()).unwrap();
    let restored = Predictor::from_artifact(store.load().unwrap()).unwrap();

    // The save→load cycle must not change a single probability.
    let probes = [
        (8.0, 650_000.0, 12, "Alto"),
        (3.0, 120_000.0, 4, "Baixo"),
        (14.0, 900_000.0, 20, "Médio"),
        (27.5, 1_260_000.0, 31, "Alto"),
    ];
    for (duracao, orcamento, equipe, recursos) in probes {
        let before = predictor
            .predict(duracao, orcamento, equipe, recursos)
            .unwrap();
        let after = restored
            .predict(duracao, orcamento, equipe, recursos)
            .unwrap();
        assert_eq!(before, after);
    }
}

#[test]
fn test_retraining_supersedes_previous_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("model.json")).unwrap();

    let records = sample_records();
    let (first, _) = Predictor::train(&records, &TrainConfig::default()).unwrap();
    store.save(&first.to_artifact()).unwrap();

    let retrain_config = TrainConfig {
        seed: 7,
        ..TrainConfig::default()
    };
    let (second, _) = Predictor::train(&records, &retrain_config).unwrap();
    store.save(&second.to_artifact()).unwrap();

    let restored = Predictor::from_artifact(store.load().unwrap()).unwrap();
    let expected = second.predict(8.0, 650_000.0, 12, "Alto").unwrap();
    let actual = restored.predict(8.0, 650_000.0, 12, "Alto").unwrap();
    assert_eq!(expected, actual);
}

#[test]
fn test_missing_artifact_is_a_structured_failure() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("model.json")).unwrap();
    match store.load() {
        Err(ArtifactError::NotFound(path)) => {
            assert_eq!(path, store.artifact_path());
        }
        other => panic!("expected NotFound, got {:?}", other.map(|_| "artifact")),
    }
}

#[test]
fn test_garbage_file_is_corrupt_payload() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("model.json")).unwrap();
    std::fs::write(store.artifact_path(), b"{\"schema_version\": oops").unwrap();
    assert!(matches!(
        store.load(),
        Err(ArtifactError::CorruptPayload(_))
    ));
}

#[test]
fn test_save_refuses_untrained_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("model.json")).unwrap();

    let (predictor, _) = Predictor::train(&sample_records(), &TrainConfig::default()).unwrap();
    let mut artifact = predictor.to_artifact();
    artifact.trained = false;

    assert!(matches!(
        store.save(&artifact),
        Err(ArtifactError::NotTrained)
    ));
    assert!(!store.exists());
}
