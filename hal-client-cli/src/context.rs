//! Transport configuration and template variables from the command line

use crate::cli::Cli;
use crate::error::{CliError, CliResult};
use hal_client::{HalClient, TemplateVars};
use hal_client_http::HttpConfig;

/// Load `--config` (or defaults) and apply flag / env overrides.
pub fn http_config(cli: &Cli) -> CliResult<HttpConfig> {
    let mut config = match &cli.config {
        Some(path) => HttpConfig::from_path(path).map_err(|e| {
            CliError::Config(format!("failed to load {}: {e}", path.display()))
        })?,
        None => HttpConfig::default(),
    };
    if let Some(accept) = &cli.accept {
        config.accept = accept.clone();
    }
    if let Some(ms) = cli.timeout_ms {
        config.timeout_ms = Some(ms);
    }
    Ok(config)
}

pub fn build_client(cli: &Cli) -> CliResult<HalClient> {
    Ok(hal_client_http::client(http_config(cli)?)?)
}

/// Parse `name=value` pairs. Values are always strings.
pub fn parse_vars(pairs: &[String]) -> CliResult<TemplateVars> {
    let mut vars = TemplateVars::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((name, value)) if !name.is_empty() => vars.insert(name, value),
            _ => {
                return Err(CliError::Usage(format!(
                    "invalid --var '{pair}': expected NAME=VALUE"
                )))
            }
        }
    }
    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_vars() {
        let vars = parse_vars(&["q=rust".to_string(), "expr=a=b".to_string()]).unwrap();
        assert_eq!(vars.get("q"), Some(&json!("rust")));
        assert_eq!(vars.get("expr"), Some(&json!("a=b")));
    }

    #[test]
    fn test_parse_vars_rejects_missing_name() {
        assert!(matches!(
            parse_vars(&["=x".to_string()]),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_vars(&["novalue".to_string()]),
            Err(CliError::Usage(_))
        ));
    }
}
