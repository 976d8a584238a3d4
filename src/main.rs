use anyhow::{bail, Context, Result};
use speaknow_site::config::Config;
use speaknow_site::dom::Document;
use speaknow_site::page::Page;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const USAGE: &str = "usage: speaknow-site render <page.html> [--lang <code>] [--path <page path>]";

#[derive(Debug, PartialEq, Eq)]
struct RenderArgs {
    page: PathBuf,
    lang: Option<String>,
    path: Option<String>,
}

fn parse_args(args: &[String]) -> Result<RenderArgs> {
    let mut iter = args.iter();
    match iter.next().map(String::as_str) {
        Some("render") => {}
        Some(other) => bail!("unknown command {:?}\n{}", other, USAGE),
        None => bail!("{}", USAGE),
    }

    let mut page = None;
    let mut lang = None;
    let mut path = None;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--lang" => lang = Some(iter.next().context("--lang needs a value")?.clone()),
            "--path" => path = Some(iter.next().context("--path needs a value")?.clone()),
            flag if flag.starts_with("--") => bail!("unknown option {}\n{}", flag, USAGE),
            file if page.is_none() => page = Some(PathBuf::from(file)),
            extra => bail!("unexpected argument {:?}\n{}", extra, USAGE),
        }
    }

    Ok(RenderArgs {
        page: page.context(USAGE)?,
        lang,
        path,
    })
}

/// `/contact.html` for `pages/contact.html`.
fn default_location(page: &Path) -> String {
    let name = page
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("/{}", name)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("speaknow_site=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;

    let config = Config::from_env()?;

    let source = std::fs::read_to_string(&args.page)
        .with_context(|| format!("Failed to read {}", args.page.display()))?;
    let location = args.path.clone().unwrap_or_else(|| default_location(&args.page));
    let doc = Document::parse(&source).with_location(&location);

    info!("Rendering {} as {}", args.page.display(), location);
    let mut page = Page::from_config(&config, doc)?;

    let boot = page.boot().await;
    if let Err(e) = &boot.navigation {
        warn!("Navigation unavailable: {}", e);
    }

    let report = match &args.lang {
        Some(lang) => Some(page.change_language(lang).await),
        None => page.run_scheduled().await,
    };
    if let Some(report) = report {
        info!(
            "Translations applied: {}, missing: {}",
            report.applied,
            report.missing.len()
        );
    }

    let metrics = page.loader().metrics().report();
    info!("Translation loader: {}", serde_json::to_string(&metrics)?);

    page.cleanup();
    println!("{}", page.document().to_html());
    Ok(())
}
