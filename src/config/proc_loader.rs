use std::path::Path;

use anyhow::{anyhow, Result};
use regex::Regex;
use tracing::{debug, error};

use crate::config::channels::ServiceConfig;
use crate::config::proc_initiateor::initiate_default_values;
use crate::config::proc_validator;
use crate::observability::metrics::get_metrics;

/// Load and validate config from YAML file
pub async fn file_to_config(path: &Path) -> Result<ServiceConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow!("cannot read config '{}': {}", path.display(), e))?;

    let expanded = expand_env_vars(&content)?;
    parse_config(expanded).await
}

pub async fn parse_config(content: String) -> Result<ServiceConfig> {
    let metrics = get_metrics().await;
    let service_config: ServiceConfig = serde_yaml::from_str(&content).inspect_err(|e| {
        error!("parse config error: {}", e);
        metrics.config_parse_failures.inc();
    })?;

    let service_config = initiate_default_values(service_config);
    debug!("validation config ...");
    proc_validator::validate_service_config(&service_config)
        .await
        .map_err(|errors| {
            anyhow!(
                "config is not valid, total errors:{}, \n{}",
                errors.len(),
                errors.join("\n")
            )
        })?;

    Ok(service_config)
}

/// Replace `${VAR}` and `${VAR:default}` with values from the process environment.
pub fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]*))?\}")?;
    let expanded = re.replace_all(input, |caps: &regex::Captures| {
        let var = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        std::env::var(var).unwrap_or_else(|_| default.to_string())
    });
    Ok(expanded.into_owned())
}
