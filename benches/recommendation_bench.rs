use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recforge::algorithms::ranker::{rank, RankPolicy};
use recforge::algorithms::tfidf::TfidfVectorizer;
use recforge::config::ContentConfig;
use recforge::*;
use std::collections::HashMap;

const WORDS: &[&str] = &[
    "space", "crew", "heist", "bank", "detective", "romance", "paris", "london", "robot",
    "dragon", "castle", "family", "comedy", "thriller", "horror", "war", "ocean", "desert",
    "jungle", "city", "music", "school", "island", "train",
];

fn sentence(rng: &mut StdRng, words: usize) -> String {
    (0..words)
        .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn catalogue(rows: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(7);
    Dataset::new(
        vec!["title".into(), "genre".into(), "plot".into()],
        (0..rows)
            .map(|i| {
                vec![
                    Value::from(format!("title-{}", i)),
                    Value::from(sentence(&mut rng, 2)),
                    Value::from(sentence(&mut rng, 12)),
                ]
            })
            .collect(),
    )
    .unwrap()
}

fn interactions(users: i64, items: i64, per_user: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(11);
    let rows = (0..users)
        .flat_map(|user| {
            (0..per_user)
                .map(|_| {
                    vec![
                        Value::Int(user),
                        Value::Int(rng.gen_range(0..items)),
                        Value::Int(rng.gen_range(1..=5)),
                    ]
                })
                .collect::<Vec<_>>()
        })
        .collect();
    Dataset::new(vec!["user".into(), "item".into(), "rating".into()], rows).unwrap()
}

fn collaborative(algorithm: CollaborativeAlgorithm) -> CompileSpec {
    CompileSpec::Collaborative(CollaborativeRoles {
        user_column: "user".into(),
        item_column: "item".into(),
        rating_column: "rating".into(),
        label_column: None,
        algorithm,
    })
}

fn benchmark_content(c: &mut Criterion) {
    let dataset = catalogue(2000);
    let documents: Vec<String> = dataset
        .rows()
        .iter()
        .map(|row| format!("{} {}", row[1], row[2]))
        .collect();

    c.bench_function("tfidf_fit_2000_docs", |b| {
        b.iter(|| {
            let mut vectorizer = TfidfVectorizer::new(&ContentConfig::default());
            black_box(vectorizer.fit_transform(&documents).unwrap());
        });
    });

    let spec = CompileSpec::ContentBased(ContentRoles {
        input_columns: vec!["genre".into(), "plot".into()],
        output_column: "title".into(),
    });
    let mut recommender = Recommender::new(spec, &Config::default());
    recommender.fit(&dataset).unwrap();

    let mut inputs = HashMap::new();
    inputs.insert("genre".to_string(), Value::from("space thriller"));
    inputs.insert("plot".to_string(), Value::from("a crew stranded on an island"));
    let query = QueryInput::Attributes { inputs };

    c.bench_function("content_query_2000_docs", |b| {
        b.iter(|| black_box(recommender.recommend(&query, 10).unwrap()));
    });
}

fn benchmark_collaborative(c: &mut Criterion) {
    let dataset = interactions(300, 200, 20);

    c.bench_function("svd_fit_300x200", |b| {
        b.iter(|| {
            let mut recommender =
                Recommender::new(collaborative(CollaborativeAlgorithm::Svd), &Config::default());
            black_box(recommender.fit(&dataset).unwrap());
        });
    });

    let mut knn = Recommender::new(collaborative(CollaborativeAlgorithm::Knn), &Config::default());
    knn.fit(&dataset).unwrap();
    let query = QueryInput::User {
        user_id: Value::Int(42),
    };

    c.bench_function("knn_recommend_300x200", |b| {
        b.iter(|| black_box(knn.recommend(&query, 10).unwrap()));
    });
}

fn benchmark_ranker(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let candidates: Vec<(usize, f64)> = (0..10_000).map(|i| (i, rng.gen::<f64>())).collect();
    let policy = RankPolicy::content(0.1);

    c.bench_function("rank_10000_candidates", |b| {
        b.iter(|| {
            black_box(rank(candidates.clone(), &policy, 50, |i| format!("label-{}", i % 500)))
        });
    });
}

criterion_group!(benches, benchmark_content, benchmark_collaborative, benchmark_ranker);
criterion_main!(benches);
