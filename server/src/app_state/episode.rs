use chrono::DateTime;
use chrono::Locale;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use podcastr_api::FileDuration;

/// The date format used for episode publish dates, like `8 jan 21`.
const PUBLISHED_AT_FORMAT: &str = "%-d %b %y";

/// Offset timestamp shapes that are not rfc3339, like `2021-01-08T09:00:00-0300`.
const OFFSET_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"];

/// Naive timestamp shapes the api is known to send.
const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// An episode record that cannot be displayed
#[derive(Debug, thiserror::Error)]
pub enum MalformedRecordError {
    /// The api payload did not match the raw episode schema
    #[error("invalid episode payload")]
    InvalidPayload(#[source] podcastr_api::Error),

    /// The publish timestamp could not be parsed
    #[error("invalid publish timestamp \"{value}\" for episode \"{id}\"")]
    InvalidPublishedAt { id: String, value: String },

    /// The file duration is absent
    #[error("missing file duration for episode \"{id}\"")]
    MissingDuration { id: String },

    /// The file duration is not a non-negative integer
    #[error("invalid file duration \"{value}\" for episode \"{id}\"")]
    InvalidDuration { id: String, value: String },
}

/// An episode, ready to be rendered
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEpisode {
    pub id: String,
    pub title: String,
    pub members: String,
    pub thumbnail: String,

    /// The localized publish date
    pub published_at: String,

    /// The description, as html
    pub description: String,

    /// The audio url
    pub url: String,

    /// The length, in seconds
    pub duration: u64,

    /// The length, as `HH:MM:SS`
    pub duration_as_string: String,
}

/// Map an api episode into a [`DisplayEpisode`].
///
/// Publish dates are formatted in `locale`.
pub fn map_episode(
    episode: &podcastr_api::Episode,
    locale: Locale,
) -> Result<DisplayEpisode, MalformedRecordError> {
    let published_at = parse_published_at(&episode.published_at).ok_or_else(|| {
        MalformedRecordError::InvalidPublishedAt {
            id: episode.id.clone(),
            value: episode.published_at.clone(),
        }
    })?;
    let published_at = published_at
        .and_utc()
        .format_localized(PUBLISHED_AT_FORMAT, locale)
        .to_string();

    let duration = episode
        .file
        .duration
        .as_ref()
        .ok_or_else(|| MalformedRecordError::MissingDuration {
            id: episode.id.clone(),
        })?;
    let duration = parse_duration(duration).ok_or_else(|| MalformedRecordError::InvalidDuration {
        id: episode.id.clone(),
        value: duration.to_string(),
    })?;

    Ok(DisplayEpisode {
        id: episode.id.clone(),
        title: episode.title.clone(),
        members: episode.members.clone(),
        thumbnail: episode.thumbnail.clone(),
        published_at,
        description: episode.description.clone(),
        url: episode.file.url.clone(),
        duration,
        duration_as_string: podcastr_util::format_duration(duration),
    })
}

/// Parse a publish timestamp.
///
/// Timestamps with an offset keep the wall clock time of that offset.
fn parse_published_at(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Some(date_time.naive_local());
    }

    for format in OFFSET_DATE_TIME_FORMATS {
        if let Ok(date_time) = DateTime::parse_from_str(value, format) {
            return Some(date_time.naive_local());
        }
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(value, format) {
            return Some(date_time);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Coerce a file duration into whole seconds.
fn parse_duration(duration: &FileDuration) -> Option<u64> {
    match duration {
        FileDuration::Number(number) => number.as_u64().or_else(|| {
            // Whole floats like `3981.0`
            let number = number.as_f64()?;
            let whole = number.is_finite()
                && number >= 0.0
                && number.fract() == 0.0
                && number < u64::MAX as f64;
            whole.then_some(number as u64)
        }),
        FileDuration::Text(text) => {
            let text = text.trim();
            // `u64::from_str` accepts a leading `+`.
            if text.starts_with('+') {
                return None;
            }
            text.parse().ok()
        }
    }
}
