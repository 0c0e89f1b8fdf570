use clap::Args;

use super::document::report;
use crate::provider::Provider;

#[derive(Args)]
pub(crate) struct SchemaArgs {
    /// Only print the schema of this type
    pub(crate) type_name: Option<String>,
}

pub(crate) fn run(provider: &Provider, args: &SchemaArgs) -> anyhow::Result<bool> {
    let schemas = provider.schemas();
    let out = match &args.type_name {
        None => serde_json::to_string_pretty(&schemas)?,
        Some(name) => {
            let schema = schemas
                .data_source_schemas
                .get(name)
                .or_else(|| schemas.resource_schemas.get(name))
                .ok_or_else(|| anyhow::anyhow!("unknown type {:?}", name))?;
            serde_json::to_string_pretty(schema)?
        }
    };
    println!("{}", out);
    Ok(true)
}

pub(crate) fn validate(provider: &Provider) -> anyhow::Result<bool> {
    let diags = provider.validate_schemas();
    let ok = report(&diags);
    if ok {
        let count = provider.data_source_types().len() + provider.resource_types().len();
        eprintln!("{} schemas are valid", count);
    }
    Ok(ok)
}
