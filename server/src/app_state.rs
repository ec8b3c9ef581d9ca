mod episode;
mod page;

pub use self::episode::map_episode;
pub use self::episode::DisplayEpisode;
pub use self::episode::MalformedRecordError;
pub use self::page::EpisodePage;
pub use self::page::GenerateError;
pub use self::page::HomePage;
pub use self::page::PageOptions;
use self::page::PageTask;
use crate::render::Renderer;
use crate::Config;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct AppState {
    page_task: PageTask,
    renderer: Renderer,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .context("failed to build http client")?;
        let client = podcastr_api::Client::with_client(client, config.api_url.clone());

        Self::with_client(client, PageOptions::default())
    }

    /// Make an app state around an api client.
    pub fn with_client(client: podcastr_api::Client, options: PageOptions) -> anyhow::Result<Self> {
        let renderer = Renderer::new().context("failed to load templates")?;

        Ok(Self {
            page_task: PageTask::new(client, options),
            renderer,
        })
    }

    /// Get the html renderer
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Get the home page props
    pub async fn get_home_page(&self) -> Result<Arc<HomePage>, GenerateError> {
        self.page_task.get_home().await
    }

    /// Get the episode page props for an episode id
    pub async fn get_episode_page(&self, id: &str) -> Result<Arc<EpisodePage>, GenerateError> {
        self.page_task.get_episode(id).await
    }

    /// Generate the pages that are built ahead of time.
    ///
    /// Episode pages are only generated on demand.
    pub async fn prerender(&self) -> anyhow::Result<()> {
        let page = self
            .get_home_page()
            .await
            .context("failed to generate the home page")?;

        info!(
            "prerendered home page with {} episodes",
            page.latest_episodes.len() + page.all_episodes.len()
        );

        Ok(())
    }

    /// Shutdown the app state.
    ///
    /// This should only be called once
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.page_task
            .shutdown()
            .await
            .context("failed to shutdown the page task")
    }
}
