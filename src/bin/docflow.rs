//! Command-line front end: run one tool, or a two-tool pipeline, on local
//! files or URLs and save the result.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use docflow::{ApiConfig, FileSource, ProcessOptions, TaskFactory, Tool, ToolOptions};

#[derive(Parser, Debug)]
#[command(name = "docflow")]
#[command(about = "Run document tools on a remote processing service")]
struct Cli {
    /// Tool to run first (merge, split, compress, ...)
    #[arg(long)]
    tool: Tool,

    /// Tool to chain on the first tool's output
    #[arg(long)]
    then: Option<Tool>,

    /// Option for the first tool, as key=value (value parsed as JSON when
    /// possible; required parameters such as `password` stay text)
    #[arg(long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Option for the chained tool
    #[arg(long = "then-option", value_name = "KEY=VALUE")]
    then_options: Vec<String>,

    /// JSON config file; DOCFLOW_* environment variables are used otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the result
    #[arg(short, long)]
    output: PathBuf,

    /// Input files or http(s) URLs
    #[arg(required = true)]
    inputs: Vec<String>,
}

/// Parse `key=value` pairs. Values of `text_keys` are kept verbatim.
fn parse_options(pairs: &[String], text_keys: &[&str]) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("option '{}' is not in key=value form", pair);
        };
        let key = key.trim();
        let value = if text_keys.contains(&key) {
            Value::String(raw.to_string())
        } else {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        };
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

fn tool_options(tool: Tool, pairs: &[String]) -> Result<ToolOptions> {
    let map = parse_options(pairs, tool.required_parameters())?;
    Ok(if map.is_empty() {
        ToolOptions::None
    } else {
        ToolOptions::Raw(map)
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ApiConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ApiConfig::from_env().context("reading DOCFLOW_* environment")?,
    };
    let factory = TaskFactory::from_config(config);

    let mut first = factory
        .new_tool_task(cli.tool, tool_options(cli.tool, &cli.options)?)?
        .into_task();
    first.start().await?;
    for input in &cli.inputs {
        let file = first.add_file(FileSource::from_arg(input)).await?;
        tracing::info!("Added {} as {}", input, file.server_filename);
    }
    first.process(ProcessOptions::new()).await?;

    let written = match cli.then {
        Some(next) => {
            let mut second = first
                .connect_with_options(next, tool_options(next, &cli.then_options)?)
                .await?
                .into_task();
            second.process(ProcessOptions::new()).await?;
            second.download_to(&cli.output).await?
        }
        None => first.download_to(&cli.output).await?,
    };

    println!("Wrote {} bytes to {}", written, cli.output.display());
    Ok(())
}
