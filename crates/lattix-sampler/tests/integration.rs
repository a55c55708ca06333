//! Integration tests for the full pipeline:
//! index -> builders -> loaders -> alternating stream / evaluation batches.

use std::sync::Arc;

use lattix_sampler::{
    AlternatingStream, BatchSource, EvaluationExampleBuilder, EvaluationLoader, Fact, FactIndex,
    FactSet, Mode, PathEvidenceIndex, SamplerConfig, TrainingBatch, TrainingExampleBuilder,
    TrainingLoader,
};

/// A small synthetic family graph.
///
/// Relations: 0 = parentOf, 1 = siblingOf, 2 = grandparentOf, 3 = spouseOf
/// (declared but unused).
fn family() -> Vec<Fact> {
    vec![
        Fact::new(0, 0, 2),
        Fact::new(0, 0, 3),
        Fact::new(1, 0, 2),
        Fact::new(1, 0, 3),
        Fact::new(2, 0, 4),
        Fact::new(3, 0, 5),
        Fact::new(2, 1, 3),
        Fact::new(3, 1, 2),
        Fact::new(0, 2, 4),
        Fact::new(1, 2, 5),
    ]
}

const NENTITY: usize = 8;
const NRELATION: usize = 4;

fn config() -> SamplerConfig {
    SamplerConfig::default()
        .with_negative_sample_size(3)
        .with_pair_sample_size(2)
        .with_batch_size(4)
        .with_seed(2024)
}

/// parentOf/parentOf explains grandparentOf, mined for the last two facts.
fn path_bundle_json() -> String {
    let mut path_probs = vec!["[]".to_string(); 8];
    path_probs.push(r#"[{"relations": [0, 0], "probability": 0.8}, {"relations": [1, 0], "probability": 0.2}]"#.into());
    path_probs.push(r#"[{"relations": [0, 0], "probability": 0.6}]"#.into());
    format!(
        r#"{{
            "path_probs": [{}],
            "path_confidence": [{{"path": [0, 0], "relation": 2, "confidence": 0.9}}],
            "max_n_cand": 3,
            "max_steps": 2
        }}"#,
        path_probs.join(",")
    )
}

fn loaders(config: &SamplerConfig, paths: Option<Arc<PathEvidenceIndex>>) -> (TrainingLoader, TrainingLoader) {
    let index = Arc::new(FactIndex::from_config(family(), NENTITY, NRELATION, config).unwrap());
    let make = |mode| {
        let mut builder = TrainingExampleBuilder::new(index.clone(), mode, config).unwrap();
        if let Some(paths) = &paths {
            builder = builder.with_path_evidence(paths.clone()).unwrap();
        }
        TrainingLoader::new(builder, config).unwrap()
    };
    (make(Mode::HeadBatch), make(Mode::TailBatch))
}

#[test]
fn alternating_stream_outlives_epochs() {
    let config = config();
    let (head, tail) = loaders(&config, None);
    let batches_per_epoch = head.num_batches();
    assert_eq!(batches_per_epoch, 3);

    let stream = AlternatingStream::new(head, tail);
    let pulled: Vec<TrainingBatch> = stream
        .take(4 * batches_per_epoch * 2)
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(pulled.len(), 24);
    for (i, batch) in pulled.iter().enumerate() {
        let expected = if i % 2 == 0 { Mode::HeadBatch } else { Mode::TailBatch };
        assert_eq!(batch.mode, expected, "pull {i}");
        assert_eq!(batch.negatives.ncols(), 3);
        assert_eq!(batch.positive_pairs.ncols(), 2);
        assert!(batch.paths.is_none());
    }
}

#[test]
fn batches_respect_filters() {
    let config = config();
    let index = FactIndex::new(family(), NENTITY, NRELATION).unwrap();
    let (mut head, mut tail) = loaders(&config, None);

    for (loader, mode) in [(&mut head, Mode::HeadBatch), (&mut tail, Mode::TailBatch)] {
        for batch in loader.pass() {
            let batch = batch.unwrap();
            for (row, negatives) in batch.positive.rows().into_iter().zip(batch.negatives.rows()) {
                let fact = Fact::new(row[0], row[1], row[2]);
                for &e in negatives {
                    assert!(!index.contains(&fact.corrupt(mode, e)), "{fact:?} -> {e}");
                }
            }
            for (row, w) in batch.positive.rows().into_iter().zip(&batch.subsampling_weight) {
                let fact = Fact::new(row[0], row[1], row[2]);
                assert_eq!(*w, index.subsampling_weight(&fact).unwrap());
            }
        }
    }
}

#[test]
fn path_evidence_flows_into_batches() {
    let paths = Arc::new(PathEvidenceIndex::from_json_reader(path_bundle_json().as_bytes()).unwrap());
    let config = config().with_shuffle(false).with_batch_size(10);
    let (mut head, _) = loaders(&config, Some(paths));

    let batch = head.pass().next().unwrap().unwrap();
    let paths = batch.paths.expect("path variant");

    assert_eq!(paths.paths.dim(), (10, 3, 2));
    assert_eq!(paths.reliabilities.dim(), (10, 3));
    assert_eq!(paths.negative_relation.dim(), (10, 1));

    // fact 8: [0, 0] ranked above [1, 0]
    assert_eq!(paths.paths[[8, 0, 0]], 0);
    assert_eq!(paths.paths[[8, 1, 0]], 1);
    assert_eq!(paths.paths[[8, 2, 0]], -1);
    assert!((paths.reliabilities[[8, 0]] - 0.8 * (0.99 * 0.9 + 0.01)).abs() < 1e-12);
    assert!((paths.reliabilities[[8, 1]] - 0.2 * 0.01).abs() < 1e-12);
    // fact 8 excludes {0, 1, 2}; fact 9 only {0, 2}
    assert_eq!(paths.negative_relation[[8, 0]], 3);
    assert!([1, 3].contains(&paths.negative_relation[[9, 0]]));
    for (r, neg) in batch.positive.column(1).iter().zip(paths.negative_relation.column(0)) {
        assert_ne!(r, neg);
    }

    // facts without candidates are all padding
    assert!(paths.paths.index_axis(ndarray::Axis(0), 0).iter().all(|&r| r == -1));
}

#[test]
fn evaluation_batches_filter_known_facts() {
    let known: Arc<FactSet> = Arc::new(family().iter().collect());
    let test = vec![Fact::new(0, 0, 2), Fact::new(2, 1, 3)];
    let builder = EvaluationExampleBuilder::new(test, known, NENTITY, Mode::TailBatch);
    let mut loader = EvaluationLoader::new(builder, &config().with_batch_size(8)).unwrap();

    let batch = loader.pass().next().unwrap().unwrap();
    assert_eq!(batch.candidates.dim(), (2, NENTITY));

    // (0, parentOf, ?) is known for 2 and 3; 2 is the answer
    assert_eq!(batch.filter_bias.row(0).to_vec(), vec![0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(batch.candidates[[0, 3]], 2);
    // (2, siblingOf, ?) only has the answer itself
    assert!(batch.filter_bias.row(1).iter().all(|&b| b == 0.0));
}
