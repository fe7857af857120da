use std::path::PathBuf;

use clap::Subcommand;

use crate::cli::OutputFormat;
use crate::schema::{load_schema_file, Field, Schema};

#[derive(Subcommand)]
pub enum SchemaCommands {
    #[command(about = "Print models and fields from the schema file")]
    Show {
        #[arg(long, env = "PRADA_SCHEMA", help = "Schema file (defaults to the usual locations)")]
        schema: Option<PathBuf>,
    },
}

pub async fn handle(cmd: SchemaCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SchemaCommands::Show { schema } => {
            let schema = load_schema_file(schema.as_deref())?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schema)?),
                OutputFormat::Text => print!("{}", render_schema(&schema)),
            }
            Ok(())
        }
    }
}

fn render_schema(schema: &Schema) -> String {
    let mut out = String::new();
    for model in &schema.models {
        out.push_str(&format!("{} ({})\n", model.name, model.storage_name()));
        for field in &model.fields {
            out.push_str(&format!("  {}\n", describe_field(field)));
        }
    }
    for e in &schema.enums {
        let values: Vec<&str> = e.values.iter().map(String::as_str).collect();
        out.push_str(&format!("enum {} = {}\n", e.name, values.join(" | ")));
    }
    out
}

fn describe_field(field: &Field) -> String {
    let mut ty = match &field.related_model {
        Some(target) => target.clone(),
        None => format!("{:?}", field.field_type),
    };
    if field.is_list {
        ty.push_str("[]");
    }
    if !field.is_required {
        ty.push('?');
    }

    let mut flags = Vec::new();
    if field.is_id {
        flags.push("id");
    }
    if field.is_unique {
        flags.push("unique");
    }
    if field.is_updated_at {
        flags.push("updatedAt");
    }
    if field.has_default_value {
        flags.push("default");
    }

    if flags.is_empty() {
        format!("{}: {}", field.name, ty)
    } else {
        format!("{}: {} [{}]", field.name, ty, flags.join(", "))
    }
}
