use url::Url;

/// A podcast episode, as returned by the api
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Episode {
    /// The unique id.
    ///
    /// This is usually a url slug, but numeric ids are accepted and stringified.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// The title
    pub title: String,

    /// The people taking part, as one display string
    pub members: String,

    /// The thumbnail image url, as sent by the api
    #[serde(deserialize_with = "deserialize_url")]
    pub thumbnail: String,

    /// The publish timestamp.
    ///
    /// This is an ISO-8601 string, but the api is loose about the exact shape.
    pub published_at: String,

    /// The description, as html
    pub description: String,

    /// The audio file
    pub file: File,
}

/// An episode audio file
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct File {
    /// The audio url, as sent by the api
    #[serde(deserialize_with = "deserialize_url")]
    pub url: String,

    /// The mime type
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// The length, in seconds
    #[serde(default)]
    pub duration: Option<FileDuration>,
}

/// A file duration.
///
/// The api sends either a number or a stringified number.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum FileDuration {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for FileDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => number.fmt(f),
            Self::Text(text) => text.fmt(f),
        }
    }
}

/// Deserialize a string that must be a valid url, without normalizing it.
fn deserialize_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: String = serde::Deserialize::deserialize(deserializer)?;
    Url::parse(&value).map_err(|error| {
        serde::de::Error::custom(format!("invalid url \"{value}\": {error}"))
    })?;
    Ok(value)
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> serde::de::Visitor<'de> for IdVisitor {
        type Value = String;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a string or integer id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(IdVisitor)
}
