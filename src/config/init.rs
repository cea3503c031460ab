// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a commented cohort.yml template.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{ImageRef, ServiceName};

use super::CONFIG_FILENAME;

const DEFAULT_NAME: &str = "my-app";
const DEFAULT_IMAGE: &str = "registry.example.com/my-app:latest";

pub fn init_config(
    dir: &Path,
    name: Option<&str>,
    image: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let name = ServiceName::new(name.unwrap_or(DEFAULT_NAME))
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let image =
        ImageRef::parse(image.unwrap_or(DEFAULT_IMAGE)).map_err(|e| Error::InvalidConfig(e.to_string()))?;

    std::fs::write(&config_path, template_yaml(&name, &image))?;
    tracing::debug!("wrote {}", config_path.display());

    Ok(())
}

fn template_yaml(name: &ServiceName, image: &ImageRef) -> String {
    format!(
        r#"name: {name}
image: {image}
hosts:
  - docker1.example.com
port_bindings:
  - "8080:80"
env_vars:
  ENGINE_HOST: "%ENGINE_HOSTNAME%"
health:
  endpoint: /
  # port: 8080
  # retries: 12
  # interval: 5s
# rolling_deploy_wait: 10s
# restart_policy: on-failure:5
# engine:
#   tls:
#     verify: true
#   tunnel:
#     user: deploy
#     trust_first_connection: false
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn template_parses_back() {
        let name = ServiceName::new("api").unwrap();
        let image = ImageRef::parse("quay.io/org/api:v1").unwrap();
        let config = Config::from_yaml(&template_yaml(&name, &image)).unwrap();
        assert_eq!(config.name.as_str(), "api");
        assert_eq!(config.image_ref().to_string(), "quay.io/org/api:v1");
        assert_eq!(config.health_port().unwrap(), Some(8080));
    }
}
