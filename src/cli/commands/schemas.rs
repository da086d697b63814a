use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::{utils, OutputFormat};
use crate::config;
use crate::schema::{SchemaCatalog, SchemaStore};

#[derive(Args, Debug)]
pub struct SchemasArgs {
    #[arg(long, help = "Schema directory (defaults to SCHEMA_DIR)")]
    pub dir: Option<PathBuf>,
}

pub async fn handle(args: SchemasArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let dir = args.dir.unwrap_or_else(|| config::config().schemas.dir.clone());
    let catalog = SchemaCatalog::from_dir(&dir)?;

    let names = catalog.names();
    if names.is_empty() {
        return utils::output_success(&output_format, &format!("No schemas in {}", dir.display()), None);
    }

    match output_format {
        OutputFormat::Json => {
            let schemas: Vec<_> = names
                .iter()
                .filter_map(|name| catalog.get(name))
                .map(|schema| schema.as_ref().clone())
                .collect();
            utils::output_success(
                &output_format,
                &format!("{} schema(s) loaded", schemas.len()),
                Some(json!({ "schemas": schemas })),
            )
        }
        OutputFormat::Text => {
            for schema in names.iter().filter_map(|name| catalog.get(name)) {
                println!(
                    "{:<24} collection={:<24} fields={}",
                    schema.name,
                    schema.collection(),
                    schema.fields.len()
                );
            }
            Ok(())
        }
    }
}
