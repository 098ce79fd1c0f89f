//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sentinel::{
    CandidateMetadata, Config, Engine, EngineBuilder, MockEmbedder, MockGenerator, MockPoint,
    MockVectorIndex,
};

pub const GUIDE_SCORES: [f32; 5] = [0.9, 0.85, 0.8, 0.7, 0.6];

pub const VALID_DRAFT: &str = r#"```yaml
ProductName: Sentinel Tablet 10 mg
DosageForm: tablet
DrugSubstance: Sentinelib hydrochloride [CIT-1]
DrugProduct: Immediate-release tablet [CIT-2]
References:
  - {doc: ICH Q6A, section: "3.2", page: 1, para_id: p1}
```"#;

fn guide_point(i: usize, score: f32) -> MockPoint {
    MockPoint::new(format!("guide-{i}"), format!("M2.3 guidance passage {i}"))
        .with_score(score)
        .with_metadata(
            CandidateMetadata::default()
                .with_source("GUIDE")
                .with_module("M2.3")
                .with_doc(format!("QOS guideline {i}"))
                .with_page(i as i64 + 1),
        )
}

/// Guideline, reference and glossary collections under the default names.
pub fn seeded_index(ich_score: f32) -> Arc<MockVectorIndex> {
    let config = Config::default();
    let index = MockVectorIndex::new();

    for (i, score) in GUIDE_SCORES.iter().enumerate() {
        index.insert(&config.guide_collection, guide_point(i, *score));
    }

    index.insert(
        &config.reference_collection,
        MockPoint::new("ich-q6a", "ICH Q6A specifications")
            .with_score(ich_score)
            .with_metadata(
                CandidateMetadata::default()
                    .with_source("ICH")
                    .with_module("M2.3")
                    .with_doc("ICH Q6A")
                    .with_page(4),
            ),
    );
    index.insert(
        &config.reference_collection,
        MockPoint::new("term-tablet", "정제: tablet")
            .with_score(0.9)
            .with_metadata(
                CandidateMetadata::default()
                    .with_source("GLOSSARY")
                    .with_term("정제")
                    .with_term_en("tablet"),
            ),
    );

    index.insert(
        &config.glossary_collection,
        MockPoint::new("gl-assay", "assay").with_score(0.8),
    );
    index.insert(
        &config.glossary_collection,
        MockPoint::new("gl-impurity", "impurity").with_score(0.6),
    );

    Arc::new(index)
}

pub fn builder(index: Arc<MockVectorIndex>) -> EngineBuilder {
    Engine::builder(Config::default())
        .embedder(Arc::new(MockEmbedder::new(16)))
        .index(index)
}

pub fn engine_with_generator(index: Arc<MockVectorIndex>, generator: Arc<MockGenerator>) -> Engine {
    builder(index)
        .generator(generator)
        .build()
        .expect("should build engine")
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}
