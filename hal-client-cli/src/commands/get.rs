use crate::error::CliResult;
use crate::output;
use hal_client::{HalClient, RepresentationSet, TemplateVars};
use tracing::info;

pub fn run(
    client: &HalClient,
    url: &str,
    follow: &[String],
    vars: &TemplateVars,
    property: Option<&str>,
) -> CliResult<()> {
    let mut current = RepresentationSet::new([client.get(url)?]);
    for rel in follow {
        current = current.related_with(rel, vars)?;
        info!(rel = %rel, count = current.len(), "followed relation");
    }

    for repr in &current {
        let value = match property {
            Some(name) => repr.property(name)?,
            None => repr.raw()?,
        };
        println!("{}", output::format_json(&value)?);
    }
    Ok(())
}
