use super::map_episode;
use super::DisplayEpisode;
use super::MalformedRecordError;
use anyhow::Context;
use chrono::Locale;
use podcastr_api::EpisodeQuery;
use podcastr_util::AsyncTimedCacheCell;
use podcastr_util::AsyncTimedLruCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::info;
use tracing::warn;

/// The number of episodes shown on the home page.
pub const HOME_PAGE_SIZE: u32 = 12;

/// The number of episodes listed as latest releases.
pub const LATEST_EPISODES: usize = 2;

/// The locale dates are rendered in.
pub const LOCALE: Locale = Locale::pt_BR;

type HomeCache = AsyncTimedCacheCell<Arc<HomePage>>;
type EpisodeCache = AsyncTimedLruCache<Box<str>, Arc<EpisodePage>>;
type GenerateResult<T> = Result<Arc<T>, GenerateError>;

/// A failed page generation
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The api could not be reached or answered with an error status
    #[error("failed to fetch from the episode api")]
    Network(#[source] podcastr_api::Error),

    /// The api answered with a record that cannot be displayed
    #[error("malformed episode record")]
    MalformedRecord(#[from] MalformedRecordError),

    /// The requested episode does not exist
    #[error("episode \"{id}\" not found")]
    NotFound { id: Box<str> },

    /// The page task is gone
    #[error("the page task is not running")]
    TaskClosed,
}

impl GenerateError {
    fn from_api(error: podcastr_api::Error, id: Option<&str>) -> Self {
        match (error, id) {
            (podcastr_api::Error::NotFound, Some(id)) => Self::NotFound { id: id.into() },
            (error @ podcastr_api::Error::InvalidJson(_), _) => {
                Self::MalformedRecord(MalformedRecordError::InvalidPayload(error))
            }
            (error, _) => Self::Network(error),
        }
    }
}

/// The home page props
#[derive(Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    /// The newest episodes
    pub latest_episodes: Vec<DisplayEpisode>,

    /// Every other episode, newest first
    pub all_episodes: Vec<DisplayEpisode>,
}

impl HomePage {
    /// Split episodes, newest first, into the home page sections.
    pub fn from_episodes(mut episodes: Vec<DisplayEpisode>) -> Self {
        let split = episodes.len().min(LATEST_EPISODES);
        let all_episodes = episodes.split_off(split);

        Self {
            latest_episodes: episodes,
            all_episodes,
        }
    }
}

/// The episode page props
#[derive(Debug, PartialEq, Eq, serde::Serialize)]
pub struct EpisodePage {
    pub episode: DisplayEpisode,
}

/// How long generated pages stay fresh
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// The home page revalidation window
    pub home_valid_for: Duration,

    /// The episode page revalidation window
    pub episode_valid_for: Duration,

    /// The max number of cached episode pages
    pub episode_cache_capacity: usize,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            home_valid_for: Duration::from_secs(60 * 60 * 8),
            episode_valid_for: Duration::from_secs(60 * 60 * 24),
            episode_cache_capacity: 128,
        }
    }
}

#[derive(Debug)]
enum PageTaskMessage {
    Close {
        tx: tokio::sync::oneshot::Sender<()>,
    },
    GetHome {
        tx: tokio::sync::oneshot::Sender<GenerateResult<HomePage>>,
    },
    GetEpisode {
        id: Box<str>,
        tx: tokio::sync::oneshot::Sender<GenerateResult<EpisodePage>>,
    },
}

/// A task that generates and caches pages
#[derive(Debug)]
pub struct PageTask {
    tx: tokio::sync::mpsc::Sender<PageTaskMessage>,
    handle: std::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl PageTask {
    pub fn new(client: podcastr_api::Client, options: PageOptions) -> Self {
        let (tx, rx) = tokio::sync::mpsc::channel(32);

        let handle = tokio::spawn(page_task_impl(rx, client, options));

        Self {
            tx,
            handle: std::sync::Mutex::new(Some(handle)),
        }
    }

    /// Get the home page, generating it if it is missing or stale.
    pub async fn get_home(&self) -> GenerateResult<HomePage> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(PageTaskMessage::GetHome { tx })
            .await
            .map_err(|_error| GenerateError::TaskClosed)?;
        rx.await.map_err(|_error| GenerateError::TaskClosed)?
    }

    /// Get an episode page, generating it if it is missing or stale.
    pub async fn get_episode(&self, id: &str) -> GenerateResult<EpisodePage> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.tx
            .send(PageTaskMessage::GetEpisode { id: id.into(), tx })
            .await
            .map_err(|_error| GenerateError::TaskClosed)?;
        rx.await.map_err(|_error| GenerateError::TaskClosed)?
    }

    async fn close(&self) -> anyhow::Result<()> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.tx.send(PageTaskMessage::Close { tx }).await?;
        rx.await?;
        Ok(())
    }

    async fn join(&self) -> anyhow::Result<()> {
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .context("missing handle")?;

        handle.await?;

        Ok(())
    }

    /// Close and join the task
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        // If we failed to close,
        // its probably because the task is dead.
        // Therefore, it is safe to join.
        let close_result = self.close().await;
        let join_result = self.join().await;

        join_result.or(close_result)
    }
}

async fn page_task_impl(
    mut rx: tokio::sync::mpsc::Receiver<PageTaskMessage>,
    client: podcastr_api::Client,
    options: PageOptions,
) {
    let home_cache = Arc::new(HomeCache::new(options.home_valid_for));
    let episode_cache = Arc::new(EpisodeCache::new(
        options.episode_cache_capacity,
        options.episode_valid_for,
    ));
    let mut join_set = JoinSet::new();

    loop {
        tokio::select! {
            message = rx.recv() => {
                match message {
                    Some(PageTaskMessage::Close { tx }) => {
                        rx.close();
                        let _ = tx.send(()).is_ok();
                    }
                    Some(PageTaskMessage::GetHome { tx }) => {
                        let client = client.clone();
                        let home_cache = home_cache.clone();
                        join_set.spawn(async move {
                            let result = home_cache
                                .try_get(|| generate_home_page(&client))
                                .await;
                            let _ = tx.send(result).is_ok();
                        });
                    }
                    Some(PageTaskMessage::GetEpisode { id, tx }) => {
                        let client = client.clone();
                        let episode_cache = episode_cache.clone();
                        join_set.spawn(async move {
                            let result = episode_cache
                                .try_get(id.clone(), || generate_episode_page(&client, &id))
                                .await;
                            let _ = tx.send(result).is_ok();
                        });
                    }
                    None => {
                        break;
                    }
                }
            }
            Some(result) = join_set.join_next() => {
                match result.context("failed to join task") {
                    Ok(()) => {}
                    Err(error) => {
                        warn!("{error}");
                    }
                }
            }
        }
    }

    // Let in-flight generations answer their requesters.
    while let Some(result) = join_set.join_next().await {
        if let Err(error) = result.context("failed to join task") {
            warn!("{error}");
        }
    }
}

//
// Generators
//

async fn generate_home_page(client: &podcastr_api::Client) -> GenerateResult<HomePage> {
    info!("generating home page");

    let episodes = client
        .list_episodes(&EpisodeQuery::latest(HOME_PAGE_SIZE))
        .await
        .map_err(|error| GenerateError::from_api(error, None))?;
    let episodes = episodes
        .iter()
        .map(|episode| map_episode(episode, LOCALE))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Arc::new(HomePage::from_episodes(episodes)))
}

async fn generate_episode_page(
    client: &podcastr_api::Client,
    id: &str,
) -> GenerateResult<EpisodePage> {
    info!("generating episode page \"{id}\"");

    let episode = client
        .get_episode(id)
        .await
        .map_err(|error| GenerateError::from_api(error, Some(id)))?;
    let episode = map_episode(&episode, LOCALE)?;

    Ok(Arc::new(EpisodePage { episode }))
}

#[cfg(test)]
mod test {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use url::Url;

    const EPISODES: &str = include_str!("../../../lib/podcastr-api-rs/test_data/episodes.json");
    const EPISODE: &str = include_str!("../../../lib/podcastr-api-rs/test_data/episode.json");

    fn display_episode(id: usize) -> DisplayEpisode {
        DisplayEpisode {
            id: id.to_string(),
            title: format!("Episode {id}"),
            members: "Mayk Brito".into(),
            thumbnail: "https://storage.example.com/thumb.jpg".into(),
            published_at: "8 jan 21".into(),
            description: String::new(),
            url: "https://storage.example.com/audio.mp3".into(),
            duration: 60,
            duration_as_string: "00:01:00".into(),
        }
    }

    fn page_task(server: &MockServer, options: PageOptions) -> PageTask {
        let base_url = Url::parse(&server.base_url()).expect("invalid mock url");
        PageTask::new(podcastr_api::Client::new(base_url), options)
    }

    #[test]
    fn home_page_split() {
        for n in 0..6 {
            let episodes: Vec<_> = (0..n).map(display_episode).collect();
            let page = HomePage::from_episodes(episodes.clone());

            let latest = n.min(LATEST_EPISODES);
            assert_eq!(page.latest_episodes, episodes[..latest]);
            assert_eq!(page.all_episodes, episodes[latest..]);
        }
    }

    #[test]
    fn home_page_props_are_camel_case() {
        let page = HomePage::from_episodes((0..3).map(display_episode).collect());
        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(value["latestEpisodes"].as_array().unwrap().len(), 2);
        assert_eq!(value["allEpisodes"].as_array().unwrap().len(), 1);
        assert_eq!(value["allEpisodes"][0]["durationAsString"], "00:01:00");
        assert_eq!(value["allEpisodes"][0]["publishedAt"], "8 jan 21");
    }

    #[tokio::test]
    async fn home_page_is_generated_and_cached() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/episodes")
                .query_param("_limit", "12")
                .query_param("_sort", "published_at")
                .query_param("_order", "desc");
            then.status(200)
                .header("content-type", "application/json")
                .body(EPISODES);
        });
        let task = page_task(&server, PageOptions::default());

        let page = task.get_home().await.expect("failed to get home page");
        let ids: Vec<_> = page.latest_episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "a-importancia-da-contribuicao-em-open-source",
                "uma-conversa-sobre-programacao-funcional-e-orientacao-a-objetos"
            ]
        );
        let ids: Vec<_> = page.all_episodes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["comunidades-e-tecnologia", "typescript-vale-a-pena"]);

        let again = task.get_home().await.expect("failed to get home page");
        assert!(Arc::ptr_eq(&page, &again));
        mock.assert_hits(1);

        task.shutdown().await.expect("failed to shutdown");
    }

    #[tokio::test]
    async fn stale_home_page_is_regenerated() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/episodes");
            then.status(200)
                .header("content-type", "application/json")
                .body(EPISODES);
        });
        let task = page_task(
            &server,
            PageOptions {
                home_valid_for: Duration::ZERO,
                ..PageOptions::default()
            },
        );

        task.get_home().await.expect("failed to get home page");
        tokio::time::sleep(Duration::from_millis(10)).await;
        task.get_home().await.expect("failed to get home page");
        mock.assert_hits(2);

        task.shutdown().await.expect("failed to shutdown");
    }

    #[tokio::test]
    async fn concurrent_home_requests_share_a_generation() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/episodes");
            then.status(200)
                .header("content-type", "application/json")
                .delay(Duration::from_millis(100))
                .body(EPISODES);
        });
        let task = Arc::new(page_task(&server, PageOptions::default()));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let task = task.clone();
            handles.push(tokio::spawn(async move { task.get_home().await }));
        }
        for handle in handles {
            handle.await.unwrap().expect("failed to get home page");
        }
        mock.assert_hits(1);

        task.shutdown().await.expect("failed to shutdown");
    }

    #[tokio::test]
    async fn home_page_api_failure_is_network_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/episodes");
            then.status(503);
        });
        let task = page_task(&server, PageOptions::default());

        let error = task.get_home().await.unwrap_err();
        assert!(matches!(error, GenerateError::Network(_)), "{error:?}");

        task.shutdown().await.expect("failed to shutdown");
    }

    #[tokio::test]
    async fn home_page_bad_record_is_malformed() {
        let server = MockServer::start();
        let mut episodes: serde_json::Value = serde_json::from_str(EPISODES).unwrap();
        episodes[3]["file"]["duration"] = "long".into();
        server.mock(|when, then| {
            when.method(GET).path("/episodes");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(episodes);
        });
        let task = page_task(&server, PageOptions::default());

        let error = task.get_home().await.unwrap_err();
        assert!(
            matches!(
                error,
                GenerateError::MalformedRecord(MalformedRecordError::InvalidDuration { .. })
            ),
            "{error:?}"
        );

        task.shutdown().await.expect("failed to shutdown");
    }

    #[tokio::test]
    async fn episode_page_is_generated_on_demand() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/episodes/comunidades-e-tecnologia");
            then.status(200)
                .header("content-type", "application/json")
                .body(EPISODE);
        });
        let task = page_task(&server, PageOptions::default());

        let page = task
            .get_episode("comunidades-e-tecnologia")
            .await
            .expect("failed to get episode page");
        assert_eq!(page.episode.id, "comunidades-e-tecnologia");
        assert_eq!(page.episode.published_at, "8 jan 21");
        assert_eq!(page.episode.duration_as_string, "01:09:10");

        task.get_episode("comunidades-e-tecnologia")
            .await
            .expect("failed to get episode page");
        mock.assert_hits(1);

        task.shutdown().await.expect("failed to shutdown");
    }

    #[tokio::test]
    async fn unknown_episode_is_not_found() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/episodes/missing");
            then.status(404).body("{}");
        });
        let task = page_task(&server, PageOptions::default());

        for _ in 0..2 {
            let error = task.get_episode("missing").await.unwrap_err();
            assert!(
                matches!(&error, GenerateError::NotFound { id } if &**id == "missing"),
                "{error:?}"
            );
        }
        // Not found results are not cached.
        mock.assert_hits(2);

        task.shutdown().await.expect("failed to shutdown");
    }

    #[tokio::test]
    async fn closed_task_errors() {
        let server = MockServer::start();
        let task = page_task(&server, PageOptions::default());
        task.shutdown().await.expect("failed to shutdown");

        let error = task.get_home().await.unwrap_err();
        assert!(matches!(error, GenerateError::TaskClosed), "{error:?}");
    }
}
