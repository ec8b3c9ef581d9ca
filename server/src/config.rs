use anyhow::ensure;
use anyhow::Context;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, serde::Deserialize)]
pub struct Config {
    #[serde(rename = "bind-address")]
    pub bind_address: SocketAddr,

    /// The base url of the episode api
    #[serde(rename = "api-url")]
    pub api_url: Url,

    #[serde(rename = "public-directory")]
    pub public_directory: PathBuf,

    /// Whether to generate the home page before accepting connections.
    #[serde(default = "default_prerender")]
    pub prerender: bool,

    /// The api request timeout, in seconds.
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(default)]
    pub logging: ConfigLogging,
}

impl Config {
    /// Load and validate a config.
    pub fn load_path<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to load config file at \"{}\"", path.display()))?;
        let config: Self = toml::from_str(&data)
            .with_context(|| format!("failed to parse config file at \"{}\"", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            !self.api_url.cannot_be_a_base(),
            "the api url \"{}\" cannot be a base url",
            self.api_url
        );
        ensure!(self.request_timeout > 0, "the request timeout must be positive");

        let public_directory_exists = self.public_directory.try_exists().with_context(|| {
            format!(
                "failed to check if the public directory path \"{}\" exists",
                self.public_directory.display()
            )
        })?;
        ensure!(
            public_directory_exists,
            "the public directory path \"{}\" does not exist",
            self.public_directory.display()
        );

        Ok(())
    }
}

fn default_prerender() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct ConfigLogging {
    #[serde(default)]
    pub directives: Vec<String>,
}
