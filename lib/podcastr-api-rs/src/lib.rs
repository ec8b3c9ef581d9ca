mod episode;

pub use crate::episode::Episode;
pub use crate::episode::File;
pub use crate::episode::FileDuration;
use url::Url;

/// The error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A HTTP error
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// The response body did not match the expected schema
    #[error("invalid json")]
    InvalidJson(#[from] serde_json::Error),

    /// The requested resource does not exist
    #[error("not found")]
    NotFound,

    /// The base url cannot have path segments
    #[error("the base url \"{0}\" cannot be a base")]
    CannotBeABase(Url),
}

/// The sort order of a list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Get this as a query param value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Parameters for listing episodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeQuery {
    /// The max number of episodes to return
    pub limit: Option<u32>,

    /// The field to sort by
    pub sort: Option<String>,

    /// The sort order
    pub order: Option<SortOrder>,
}

impl EpisodeQuery {
    /// The `limit` newest episodes, newest first.
    pub fn latest(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            sort: Some("published_at".into()),
            order: Some(SortOrder::Desc),
        }
    }
}

/// The client
#[derive(Debug, Clone)]
pub struct Client {
    /// The inner http client
    pub client: reqwest::Client,

    /// The api base url
    base_url: Url,
}

impl Client {
    /// Make a new client for the api at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Make a new client for the api at `base_url` with a custom http client.
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    /// Get a url under the base url
    fn url<'a, I>(&self, segments: I) -> Result<Url, Error>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::CannotBeABase(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Get the url as json
    async fn get_json<T>(&self, url: Url) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound);
        }
        let body = response.error_for_status()?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// List episodes
    pub async fn list_episodes(&self, query: &EpisodeQuery) -> Result<Vec<Episode>, Error> {
        let mut url = self.url(["episodes"])?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(limit) = query.limit {
                pairs.append_pair("_limit", itoa::Buffer::new().format(limit));
            }
            if let Some(sort) = query.sort.as_deref() {
                pairs.append_pair("_sort", sort);
            }
            if let Some(order) = query.order {
                pairs.append_pair("_order", order.as_str());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        self.get_json(url).await
    }

    /// Get an episode by id.
    ///
    /// Returns [`Error::NotFound`] if the api has no episode with this id.
    pub async fn get_episode(&self, id: &str) -> Result<Episode, Error> {
        let url = self.url(["episodes", id])?;
        self.get_json(url).await
    }
}
