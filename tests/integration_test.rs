use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use recforge::api::create_router;
use recforge::*;
use serde_json::{json, Value as Json};
use std::collections::{HashMap, HashSet};
use tower::ServiceExt;

fn text_rows(columns: &[&str], rows: &[&[&str]]) -> Dataset {
    Dataset::new(
        columns.iter().map(|c| c.to_string()).collect(),
        rows.iter()
            .map(|row| row.iter().map(|v| Value::from(*v)).collect())
            .collect(),
    )
    .unwrap()
}

fn movies() -> Dataset {
    text_rows(
        &["title", "genre", "plot"],
        &[
            &["Heat", "crime thriller", "a detective hunts a crew of bank robbers"],
            &["Ronin", "crime thriller", "mercenaries chase a mysterious case"],
            &["Heat", "crime drama", "bank robbers plan one last heist"],
            &["Amelie", "romance comedy", "a shy waitress in paris"],
            &["Paddington", "family comedy", "a bear moves to london"],
            &["Alien", "science fiction horror", "a crew hunted aboard a ship"],
        ],
    )
}

fn content(inputs: &[&str], output: &str) -> CompileSpec {
    CompileSpec::ContentBased(ContentRoles {
        input_columns: inputs.iter().map(|c| c.to_string()).collect(),
        output_column: output.to_string(),
    })
}

fn attributes(pairs: &[(&str, &str)]) -> QueryInput {
    QueryInput::Attributes {
        inputs: pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect::<HashMap<_, _>>(),
    }
}

fn ratings() -> Dataset {
    let rows = [
        (1, "x", Value::Int(5)),
        (1, "y", Value::Int(3)),
        (2, "x", Value::Int(4)),
        (2, "z", Value::Int(1)),
        (3, "y", Value::Int(2)),
        (3, "z", Value::Float(4.5)),
        (4, "x", Value::Int(1)),
        (4, "w", Value::Int(5)),
    ];
    Dataset::new(
        vec!["user".into(), "item".into(), "rating".into()],
        rows.into_iter()
            .map(|(u, i, r)| vec![Value::Int(u), Value::from(i), r])
            .collect(),
    )
    .unwrap()
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

fn fitted(spec: CompileSpec, dataset: &Dataset) -> Recommender {
    let mut recommender = Recommender::new(spec, &Config::default());
    recommender.fit(dataset).unwrap();
    recommender
}

#[test]
fn test_scenario_a_content_ranking() {
    let dataset = text_rows(
        &["genre", "title"],
        &[&["action", "A"], &["action", "B"], &["comedy", "C"]],
    );
    let recommender = fitted(content(&["genre"], "title"), &dataset);

    let results = recommender
        .recommend(&attributes(&[("genre", "action")]), 2)
        .unwrap();
    let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["A", "B"]);
    assert!(results.iter().all(|r| r.score > 0.0));
}

#[test]
fn test_scenario_b_unknown_user() {
    for algorithm in [CollaborativeAlgorithm::Svd, CollaborativeAlgorithm::Knn] {
        let recommender = fitted(collaborative(algorithm), &ratings());
        let query = QueryInput::User {
            user_id: Value::Int(99),
        };
        assert!(matches!(
            recommender.recommend(&query, 5),
            Err(RecommenderError::UnknownEntity { entity: "user", .. })
        ));
    }
}

#[test]
fn test_scenario_c_zero_limit_is_empty() {
    let content_model = fitted(content(&["genre", "plot"], "title"), &movies());
    assert!(content_model
        .recommend(&attributes(&[("genre", "crime")]), 0)
        .unwrap()
        .is_empty());

    let collaborative_model = fitted(collaborative(CollaborativeAlgorithm::Svd), &ratings());
    let query = QueryInput::User {
        user_id: Value::Int(1),
    };
    assert!(collaborative_model.recommend(&query, 0).unwrap().is_empty());
}

#[test]
fn test_scenario_d_non_numeric_rating() {
    let mut dataset = ratings().rows().to_vec();
    dataset[3][2] = Value::from("five");
    let dataset = Dataset::new(
        vec!["user".into(), "item".into(), "rating".into()],
        dataset,
    )
    .unwrap();

    for algorithm in [CollaborativeAlgorithm::Svd, CollaborativeAlgorithm::Knn] {
        let mut recommender = Recommender::new(collaborative(algorithm), &Config::default());
        assert!(matches!(
            recommender.fit(&dataset),
            Err(RecommenderError::Configuration(_))
        ));
        assert!(!recommender.is_fitted());
    }
}

#[test]
fn test_content_results_respect_threshold_dedup_and_order() {
    let recommender = fitted(content(&["genre", "plot"], "title"), &movies());
    let results = recommender
        .recommend(&attributes(&[("genre", "crime thriller"), ("plot", "bank robbers")]), 10)
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].label, "Heat");
    assert!(results.iter().all(|r| r.score >= 0.1 && r.score <= 1.0 + 1e-12));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));

    let labels: HashSet<&str> = results.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels.len(), results.len());
}

#[test]
fn test_content_fit_is_idempotent() {
    let query = attributes(&[("genre", "comedy"), ("plot", "london")]);
    let first = fitted(content(&["genre", "plot"], "title"), &movies())
        .recommend(&query, 5)
        .unwrap();
    let second = fitted(content(&["genre", "plot"], "title"), &movies())
        .recommend(&query, 5)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_collaborative_results_exclude_rated_items() {
    let dataset = ratings();
    for algorithm in [CollaborativeAlgorithm::Svd, CollaborativeAlgorithm::Knn] {
        let recommender = fitted(collaborative(algorithm), &dataset);
        for user in 1..=4 {
            let rated: HashSet<String> = dataset
                .rows()
                .iter()
                .filter(|row| row[0] == Value::Int(user))
                .map(|row| row[1].to_string())
                .collect();

            let query = QueryInput::User {
                user_id: Value::Int(user),
            };
            let results = recommender.recommend(&query, 10).unwrap();
            assert_eq!(results.len(), 4 - rated.len());
            assert!(results.iter().all(|r| !rated.contains(&r.label)));
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}

#[test]
fn test_collaborative_fit_is_idempotent() {
    let query = QueryInput::User {
        user_id: Value::Int(3),
    };
    for algorithm in [CollaborativeAlgorithm::Svd, CollaborativeAlgorithm::Knn] {
        let first = fitted(collaborative(algorithm), &ratings()).recommend(&query, 5).unwrap();
        let second = fitted(collaborative(algorithm), &ratings()).recommend(&query, 5).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_similar_items_by_label() {
    let recommender = fitted(collaborative(CollaborativeAlgorithm::Knn), &ratings());
    let results = recommender
        .recommend(&QueryInput::SimilarItems { item: "X".into() }, 5)
        .unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.label != "x"));

    assert!(matches!(
        recommender.recommend(&QueryInput::SimilarItems { item: "nothing".into() }, 5),
        Err(RecommenderError::UnknownEntity { entity: "item", .. })
    ));
}

#[test]
fn test_single_item_factorization_is_degenerate() {
    let dataset = Dataset::new(
        vec!["user".into(), "item".into(), "rating".into()],
        vec![
            vec![Value::Int(1), Value::from("x"), Value::Int(4)],
            vec![Value::Int(2), Value::from("x"), Value::Int(2)],
        ],
    )
    .unwrap();
    let mut recommender =
        Recommender::new(collaborative(CollaborativeAlgorithm::Svd), &Config::default());
    assert!(matches!(
        recommender.fit(&dataset),
        Err(RecommenderError::NumericDegeneracy(_))
    ));
}

#[test]
fn test_dataset_json_shape() {
    let dataset: Dataset = serde_json::from_value(json!({
        "columns": ["title", "year"],
        "rows": [["Heat", 1995], ["Ronin", null]]
    }))
    .unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.value(0, 1), &Value::Int(1995));
    assert!(dataset.value(1, 1).is_null());

    let ragged = serde_json::from_value::<Dataset>(json!({
        "columns": ["title", "year"],
        "rows": [["Heat"]]
    }));
    assert!(ragged.is_err());
}

async fn call(app: &axum::Router, method: &str, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_http_session_flow() {
    let app = create_router(AppState::new(Config::default()));

    let (status, health) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["data"]["status"], "healthy");

    let (status, created) = call(
        &app,
        "POST",
        "/sessions",
        Some(json!({
            "columns": ["genre", "title"],
            "rows": [["action", "A"], ["action", "B"], ["comedy", "C"]]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["data"]["session_id"].as_str().unwrap().to_string();

    let query = json!({
        "query": {"kind": "attributes", "inputs": {"genre": "action"}},
        "limit": 2
    });
    let (status, body) = call(
        &app,
        "POST",
        &format!("/sessions/{}/recommendations", id),
        Some(query.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, compiled) = call(
        &app,
        "POST",
        &format!("/sessions/{}/compile", id),
        Some(json!({
            "system_type": "content_based",
            "input_columns": ["genre"],
            "output_column": "title"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(compiled["data"]["algorithm"], "tfidf");

    let (status, body) = call(
        &app,
        "POST",
        &format!("/sessions/{}/recommendations", id),
        Some(query),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let labels: Vec<&str> = body["data"]["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["A", "B"]);

    let (status, summary) = call(&app, "GET", &format!("/sessions/{}/summary", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["data"]["rows"], 3);

    let (status, _) = call(&app, "DELETE", &format!("/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", &format!("/sessions/{}/summary", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_http_compile_errors_map_to_status() {
    let app = create_router(AppState::new(Config::default()));
    let (_, created) = call(
        &app,
        "POST",
        "/sessions",
        Some(json!({
            "columns": ["user", "item", "rating"],
            "rows": [[1, "x", 5], [2, "y", "five"]]
        })),
    )
    .await;
    let id = created["data"]["session_id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        &format!("/sessions/{}/compile", id),
        Some(json!({
            "system_type": "collaborative",
            "user_column": "user",
            "item_column": "item",
            "rating_column": "rating",
            "algorithm": "knn"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("non-numeric"));
}
