// ABOUTME: Interactive commands: console, enter, and logs.
// ABOUTME: These attach the local terminal and only ever target the first host.

use super::connect::host_facade;
use cohort::config::Config;
use cohort::deploy::{enter_container, launch_console, tail_logs};
use cohort::error::Result;
use cohort::output::Output;

pub async fn console(config: Config, output: Output) -> Result<()> {
    let spec = config.service_spec()?;
    let facade = host_facade(&config, config.hosts.first(), &output)?;
    let id = launch_console(&facade, facade.hostname(), &spec).await?;
    output.progress(&format!("console container {} detached", id.short()));
    Ok(())
}

pub async fn enter(config: Config, output: Output) -> Result<()> {
    let spec = config.service_spec()?;
    let facade = host_facade(&config, config.hosts.first(), &output)?;
    let exit = enter_container(&facade, facade.hostname(), &spec).await?;
    match exit.code {
        Some(0) => {}
        Some(code) => output.warning(&format!("shell exited with status {code}")),
        None => output.warning("shell was terminated by a signal"),
    }
    Ok(())
}

pub async fn logs(config: Config, output: Output) -> Result<()> {
    let spec = config.service_spec()?;
    let facade = host_facade(&config, config.hosts.first(), &output)?;
    tail_logs(&facade, facade.hostname(), &spec).await?;
    Ok(())
}
