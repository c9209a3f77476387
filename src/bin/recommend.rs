//! Offline compile-and-query over a JSON dataset, for scripting and debugging.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use recforge::{
    init_tracing, CollaborativeAlgorithm, CollaborativeRoles, CompileSpec, Config, ContentRoles,
    Dataset, QueryInput, Recommender, Value,
};
use std::collections::HashMap;
use tracing::info;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    Content,
    Svd,
    Knn,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile a recommender from a JSON dataset and query it once", long_about = None)]
struct Args {
    /// Dataset file shaped as `{"columns": [...], "rows": [[...], ...]}`.
    #[arg(short, long)]
    dataset: String,

    #[arg(short, long, value_enum, default_value = "content")]
    mode: Mode,

    /// Content input columns, comma separated.
    #[arg(long, value_delimiter = ',')]
    inputs: Vec<String>,

    /// Content output column.
    #[arg(long)]
    output: Option<String>,

    #[arg(long, default_value = "user")]
    user_column: String,

    #[arg(long, default_value = "item")]
    item_column: String,

    #[arg(long, default_value = "rating")]
    rating_column: String,

    #[arg(long)]
    label_column: Option<String>,

    /// Content query as `column=value`, repeatable.
    #[arg(short, long = "set")]
    set: Vec<String>,

    /// Collaborative query: recommend for this user.
    #[arg(long)]
    user: Option<String>,

    /// Collaborative query: items co-rated like the first item matching this text.
    #[arg(long)]
    like: Option<String>,

    #[arg(short = 'n', long, default_value_t = 5)]
    limit: usize,

    #[arg(long)]
    config: Option<String>,

    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let raw = std::fs::read_to_string(&args.dataset)
        .with_context(|| format!("failed to read dataset {}", args.dataset))?;
    let dataset: Dataset = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse dataset {}", args.dataset))?;
    info!("Loaded {} rows from {}", dataset.len(), args.dataset);

    let spec = compile_spec(&args)?;
    let query = query_input(&args)?;

    let mut recommender = Recommender::new(spec, &config);
    let summary = recommender.fit(&dataset)?;
    info!("Compiled: {:?}", summary);

    let recommendations = recommender.recommend(&query, args.limit)?;
    println!("{}", serde_json::to_string_pretty(&recommendations)?);

    Ok(())
}

fn compile_spec(args: &Args) -> Result<CompileSpec> {
    let algorithm = match args.mode {
        Mode::Content => {
            let output = args
                .output
                .clone()
                .context("--output is required in content mode")?;
            return Ok(CompileSpec::ContentBased(ContentRoles {
                input_columns: args.inputs.clone(),
                output_column: output,
            }));
        }
        Mode::Svd => CollaborativeAlgorithm::Svd,
        Mode::Knn => CollaborativeAlgorithm::Knn,
    };

    Ok(CompileSpec::Collaborative(CollaborativeRoles {
        user_column: args.user_column.clone(),
        item_column: args.item_column.clone(),
        rating_column: args.rating_column.clone(),
        label_column: args.label_column.clone(),
        algorithm,
    }))
}

fn query_input(args: &Args) -> Result<QueryInput> {
    if let Some(item) = &args.like {
        return Ok(QueryInput::SimilarItems { item: item.clone() });
    }
    if let Some(user) = &args.user {
        return Ok(QueryInput::User {
            user_id: Value::from(user.as_str()),
        });
    }

    let inputs = args
        .set
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(column, value)| (column.to_string(), Value::from(value)))
                .with_context(|| format!("expected column=value, got '{}'", pair))
        })
        .collect::<Result<HashMap<_, _>>>()?;
    Ok(QueryInput::Attributes { inputs })
}
