// ABOUTME: Cleanup, restart, pull, and status commands.
// ABOUTME: Each runs against every configured host in order.

use super::connect::all_hosts;
use super::deploy::prune_all;
use cohort::config::Config;
use cohort::deploy::{DeployError, pull_image, restart_container};
use cohort::error::Result;
use cohort::output::Output;
use cohort::runtime::Discovery;

pub async fn cleanup(config: Config, output: Output) -> Result<()> {
    let hosts = all_hosts(&config, &output)?;
    prune_all(&hosts, config.name.as_str(), &output).await?;
    output.success("Cleanup complete");
    Ok(())
}

pub async fn restart(config: Config, output: Output) -> Result<()> {
    let spec = config.service_spec()?;
    for facade in all_hosts(&config, &output)? {
        let host = facade.hostname();
        let id = restart_container(&facade, host, &spec).await?;
        output.result(host, &format!("restarted {}", id.short()));
    }
    output.success("Restart complete");
    Ok(())
}

pub async fn pull(config: Config, output: Output) -> Result<()> {
    let image = config.image_ref();
    for facade in all_hosts(&config, &output)? {
        let host = facade.hostname();
        pull_image(&facade, host, &image).await?;
        output.result(host, &format!("pulled {image}"));
    }
    Ok(())
}

pub async fn status(config: Config, output: Output) -> Result<()> {
    let image = config.image_ref();
    for facade in all_hosts(&config, &output)? {
        let host = facade.hostname();
        let tags = facade
            .current_tags_for(&image)
            .await
            .map_err(|source| DeployError::Discovery {
                host: host.to_string(),
                source,
            })?;

        let line = if tags.is_empty() {
            format!("{}: not running", image.repository())
        } else {
            format!("{}: {}", image.repository(), tags.join(", "))
        };
        output.result(host, &line);
    }
    Ok(())
}
