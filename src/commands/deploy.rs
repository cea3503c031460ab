// ABOUTME: Deploy command implementation.
// ABOUTME: Rolls hosts one at a time and stops at the first failure, then prunes stopped containers.

use super::connect::all_hosts;
use super::emit_warnings;
use cohort::config::Config;
use cohort::deploy::{DEFAULT_KEEP, DeploySettings, deploy_host, prune_stopped, pull_image};
use cohort::diagnostics::Diagnostics;
use cohort::error::Result;
use cohort::output::Output;
use cohort::runtime::HostFacade;
use cohort::service::ServiceSpec;

pub async fn deploy(config: Config, skip_cleanup: bool, mut output: Output) -> Result<()> {
    output.start_timer();
    let spec = config.service_spec()?;
    let settings = config.deploy_settings()?;
    let image = config.image_ref();
    let mut diag = Diagnostics::default();

    output.progress(&format!(
        "Deploying {} ({}) to {} host(s)",
        config.name,
        image,
        config.hosts.len()
    ));

    let hosts = all_hosts(&config, &output)?;
    let result = roll_hosts(&config, &hosts, &spec, &settings, &output, &mut diag).await;
    let result = match result {
        Ok(()) if config.cleanup && !skip_cleanup => {
            prune_all(&hosts, config.name.as_str(), &output).await
        }
        other => other,
    };

    emit_warnings(&diag, &output);
    result?;

    output.success("Deployment complete!");
    Ok(())
}

async fn roll_hosts(
    config: &Config,
    hosts: &[HostFacade],
    spec: &ServiceSpec,
    settings: &DeploySettings,
    output: &Output,
    diag: &mut Diagnostics,
) -> Result<()> {
    let image = config.image_ref();
    for facade in hosts {
        let host = facade.hostname();
        if config.pull {
            output.progress(&format!("  → Pulling {image} on {host}..."));
            pull_image(facade, host, &image).await?;
        }

        let report = deploy_host(facade, host, spec, config.probe(), settings, diag).await?;
        output.result(
            host,
            &format!(
                "started {} ({}), stopped {}",
                report.container_name,
                report.container.short(),
                report.stopped.len()
            ),
        );
    }
    Ok(())
}

pub(super) async fn prune_all(hosts: &[HostFacade], service: &str, output: &Output) -> Result<()> {
    for facade in hosts {
        let host = facade.hostname();
        let cleaned = prune_stopped(facade, host, service, DEFAULT_KEEP).await?;
        if !cleaned.removed.is_empty() {
            output.result(
                host,
                &format!("removed {} old container(s)", cleaned.removed.len()),
            );
        }
    }
    Ok(())
}
