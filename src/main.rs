/// Command-line front end over the client library
/// This file is part of the outermost layer (Frameworks & Drivers)

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xapiand_client::{
    Action, ClientConfig, MetaOptions, Payload, ReadOptions, RequestBody, SearchOptions,
    WriteOptions, XapiandClient,
};

const USAGE: &str = "Usage: xapiand-client [--config settings.xml] <action> <index> [id|query] [body]
Actions: search, facets, stats, get, head, delete, post, put, index, patch";

struct Args {
    config: Option<PathBuf>,
    action: Action,
    index: String,
    rest: Vec<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut config = None;
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a path")?;
            config = Some(PathBuf::from(path));
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let (Some(action), Some(index)) = (positional.next(), positional.next()) else {
        bail!("{}", USAGE);
    };
    let action = action.parse::<Action>()?;

    Ok(Args {
        config,
        action,
        index,
        rest: positional.collect(),
    })
}

/// Inline JSON, or anything else (a file path, raw text) passed through as-is
fn parse_body(arg: &str) -> RequestBody {
    match serde_json::from_str::<Value>(arg) {
        Ok(value) => RequestBody::Json(value),
        Err(_) => RequestBody::Text(arg.to_string()),
    }
}

fn required<'a>(rest: &'a [String], position: usize, name: &str) -> Result<&'a str> {
    match rest.get(position) {
        Some(value) => Ok(value.as_str()),
        None => bail!("Missing <{}>\n{}", name, USAGE),
    }
}

async fn print_payload(payload: Payload) -> Result<()> {
    match payload {
        Payload::Result(document) => {
            println!("{}", serde_json::to_string_pretty(&document.into_value())?);
        }
        Payload::Results(mut results) => {
            tracing::info!("{} total matches", results.total_count());
            while let Some(document) = results.next().await {
                println!("{}", serde_json::to_string_pretty(&document?.into_value())?);
            }
        }
        Payload::Raw(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
        Payload::Empty => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "xapiand_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading settings from: {}", path.display());
            ClientConfig::from_file(path)?
        }
        None => ClientConfig::default(),
    }
    .with_env_overrides()?;

    let client = XapiandClient::new(config)?;
    let index = args.index.as_str();
    let rest = &args.rest;

    let response = match args.action {
        Action::Search | Action::Facets => {
            let mut opts = SearchOptions::new();
            if let Some(query) = rest.first() {
                opts = opts.query(query.as_str());
            }
            if args.action == Action::Search {
                client.search(index, opts).await?
            } else {
                client.facets(index, opts).await?
            }
        }
        Action::Stats => client.stats(index, MetaOptions::new()).await?,
        Action::Head => {
            let id = required(rest, 0, "id")?;
            client.head(index, id, MetaOptions::new()).await?
        }
        Action::Get => {
            let id = required(rest, 0, "id")?;
            client.get(index, id, ReadOptions::new()).await?
        }
        Action::Delete => {
            let id = required(rest, 0, "id")?;
            client.delete(index, id, WriteOptions::new()).await?
        }
        Action::Post => {
            let body = parse_body(required(rest, 0, "body")?);
            client.post(index, body, WriteOptions::new()).await?
        }
        Action::Put => {
            let id = required(rest, 0, "id")?;
            let body = parse_body(required(rest, 1, "body")?);
            client.put(index, id, body, WriteOptions::new()).await?
        }
        Action::Patch => {
            let id = required(rest, 0, "id")?;
            let body = parse_body(required(rest, 1, "body")?);
            client.patch(index, id, body, WriteOptions::new()).await?
        }
    };

    tracing::debug!("{} -> {}", args.action, response.status());
    print_payload(response.into_payload()).await
}
