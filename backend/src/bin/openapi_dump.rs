//! Print the OpenAPI document as JSON, or write it to `--output`.

use std::path::PathBuf;

use clap::Parser;
use cks_backend::doc::ApiDoc;
use color_eyre::eyre::{Context, Result};
use utoipa::OpenApi;

#[derive(Debug, Parser)]
#[command(name = "openapi-dump", about = "Export the CKS portal OpenAPI document")]
struct CliArgs {
    /// Destination file. Standard output when omitted.
    #[arg(long, value_name = "path")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("serialise OpenAPI document")?;
    match args.output {
        Some(path) => std::fs::write(&path, json)
            .with_context(|| format!("write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
