mod cli;

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Args, Commands};
use seekbox_rs::prelude::*;

struct Analysis {
  source: ImageSource,
  image: Arc<SourceImage>,
  rendered: RenderSize,
  result: DetectionResult,
  boxes: Vec<RenderedBox>,
}

#[tokio::main]
async fn main() {
  let args = Args::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();

  if let Err(e) = run(args).await {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}

async fn run(args: Args) -> Result<()> {
  let mut config = Config::load(args.config.as_deref())?;
  if let Some(api_url) = args.api_url {
    config.api_url = api_url;
  }
  let api = Arc::new(ApiClient::new(&config.api_url));

  match args.command {
    Commands::Version => {
      println!("seekbox {}", env!("CARGO_PKG_VERSION"));
    }
    Commands::Detect { image, mode, width, actor } => {
      let mode = mode.unwrap_or(config.detection_mode);
      let actor = actor.map(ActorId);
      let analysis = analyze(&config, &api, &image, mode, width, actor).await?;
      let output = json!({
        "summary": analysis.result.summary().to_string(),
        "rendered": analysis.rendered,
        "boxes": analysis
          .boxes
          .iter()
          .map(|b| json!({ "label": b.label(), "box": b }))
          .collect::<Vec<_>>(),
      });
      println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Commands::Search { image, kind, index, search_mode, width } => {
      let analysis = analyze(&config, &api, &image, config.detection_mode, width, None).await?;
      let selected = find(&analysis.boxes, kind, index)
        .ok_or_else(|| anyhow!("no {:?} box #{} in {}", kind, index, analysis.result.summary()))?;
      let click = selected.click();

      let host = Arc::new(ImgbbHost::new(&config.upload_url, config.imgbb_api_key.clone()));
      let loader = ImageLoader::new(Arc::new(HttpImageFetcher::default())).with_timeout(config.image_load_timeout());
      let workflow = CropSearchWorkflow::new(api.clone(), host, loader);
      let target = SearchTarget::new(
        analysis.source,
        analysis.rendered,
        search_mode.unwrap_or(config.search_mode),
      )
      .with_loaded(analysis.image);

      match workflow.on_click(&click, &target).await {
        SearchOutcome::Resolved(results) => print_results(&click.query(), &results)?,
        SearchOutcome::Failed => bail!("Search failed"),
        SearchOutcome::Superseded => {}
      }
    }
    Commands::Lookup { query } => {
      let results = api.search(&SearchRequest::text(&query)).await.context("Search failed")?;
      print_results(&query, &results)?;
    }
  }

  Ok(())
}

/// Loads the image, runs detection and lays the boxes out at the rendered size.
async fn analyze(
  config: &Config,
  api: &Arc<ApiClient>,
  image: &str,
  mode: DetectionMode,
  width: Option<f64>,
  actor: Option<ActorId>,
) -> Result<Analysis> {
  let source = ImageSource::parse(image)?;

  let loader = ImageLoader::new(Arc::new(HttpImageFetcher::default())).with_timeout(config.image_load_timeout());
  let loaded = loader.load(&source).await.map_err(|e| {
    warn!("{}", e);
    anyhow!(e.user_message())
  })?;
  let rendered = loaded.rendered_size(width.unwrap_or(config.rendered_width));

  let mut orchestrator = DetectionOrchestrator::new(api.clone()).with_policy(config.filter_policy());
  let listener = match actor {
    Some(_) => {
      let (tx, rx) = event_channel();
      orchestrator = orchestrator.with_events(tx);
      Some(EntryCounterListener::new(api.clone()).spawn(rx))
    }
    None => None,
  };

  let result = orchestrator
    .detect(mode, &source, actor.as_ref())
    .await
    .context("Detection failed")?;
  drop(orchestrator);

  if let Some(listener) = listener {
    let report = listener.await?;
    if let Some(entries) = report.last_count {
      info!(entries, "entries updated");
    }
  }

  let boxes = render(&result, Some(rendered));
  Ok(Analysis {
    source,
    image: Arc::new(loaded),
    rendered,
    result,
    boxes,
  })
}

fn print_results(query: &str, results: &SearchResults) -> Result<()> {
  let output = json!({
    "query": query,
    "matches": results.match_count(),
    "results": results.display_items(),
  });
  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}
