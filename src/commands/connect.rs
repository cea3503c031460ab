// ABOUTME: Builds the per-host engine facade from the config file.
// ABOUTME: Connections are lazy; nothing touches the network until the first call.

use cohort::config::Config;
use cohort::error::Result;
use cohort::output::Output;
use cohort::runtime::HostFacade;

pub fn host_facade(config: &Config, host: &str, output: &Output) -> Result<HostFacade> {
    let params = config.connection_params(host)?;
    output.progress(&format!("  → {}", params.describe()));
    Ok(HostFacade::with_cli_path(params, config.engine.cli_path.clone()))
}

/// Facades for every configured host, in config order.
pub fn all_hosts(config: &Config, output: &Output) -> Result<Vec<HostFacade>> {
    config
        .hosts
        .iter()
        .map(|host| host_facade(config, host, output))
        .collect()
}
