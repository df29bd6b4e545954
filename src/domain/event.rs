//! Canonical event and photo types exposed by the snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GalleryError;

/// Sentinel stored and served when an event has no representative image.
pub const PLACEHOLDER_THUMBNAIL: &str = "/placeholder.jpg";

/// Representative image of an event.
///
/// Serialized as a plain string: either a URL or [`PLACEHOLDER_THUMBNAIL`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Thumbnail {
    /// Fetchable image URL.
    Url(String),
    /// No thumbnail set.
    #[default]
    Placeholder,
}

impl Thumbnail {
    /// Interprets a stored column value. `None`, empty strings and the
    /// sentinel all mean "no thumbnail".
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::Placeholder,
            Some(v) if v == PLACEHOLDER_THUMBNAIL => Self::Placeholder,
            Some(v) => Self::Url(v.to_string()),
        }
    }

    /// Returns `true` when no real image is set.
    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Keeps a real thumbnail, otherwise falls back to the first photo.
    #[must_use]
    pub fn or_first_photo(self, photos: &[Photo]) -> Self {
        match self {
            Self::Url(url) => Self::Url(url),
            Self::Placeholder => photos
                .first()
                .map_or(Self::Placeholder, |p| Self::Url(p.url.clone())),
        }
    }

    /// String form as stored in the `thumbnail` column.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Placeholder => PLACEHOLDER_THUMBNAIL,
        }
    }
}

impl From<String> for Thumbnail {
    fn from(value: String) -> Self {
        Self::from_stored(Some(&value))
    }
}

impl From<Thumbnail> for String {
    fn from(value: Thumbnail) -> Self {
        match value {
            Thumbnail::Url(url) => url,
            Thumbnail::Placeholder => PLACEHOLDER_THUMBNAIL.to_string(),
        }
    }
}

/// A single photo of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Photo {
    /// Opaque photo identifier. For photos discovered only in the object
    /// store this is the object key.
    pub id: String,
    /// Object-store key holding the bytes.
    pub filename: String,
    /// Fetchable address of the image.
    pub url: String,
}

/// A named, dated collection of photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Stable identifier; also the object-store prefix of its photos.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Point in time used for the default descending sort.
    pub date: DateTime<Utc>,
    /// Representative image URL or the placeholder sentinel.
    #[schema(value_type = String)]
    pub thumbnail: Thumbnail,
    /// Photos in upload order.
    pub photos: Vec<Photo>,
    /// Whether the event appears in the public listing.
    pub visible: bool,
}

impl Event {
    /// Object-store prefix under which this event's photos live.
    #[must_use]
    pub fn prefix(&self) -> String {
        event_prefix(&self.id)
    }
}

/// Object-store prefix for an event id (`"{id}/"`).
#[must_use]
pub fn event_prefix(event_id: &str) -> String {
    format!("{event_id}/")
}

/// Sorts events newest first. Stable, so equal dates keep their order.
pub fn sort_newest_first(events: &mut [Event]) {
    events.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Turns a folder name into a display name: underscores become spaces and
/// each word is capitalized (`"maria_joao"` → `"Maria Joao"`).
#[must_use]
pub fn display_name_from_folder(folder: &str) -> String {
    folder
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validates a display name.
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] if the name is blank or longer
/// than 200 characters.
pub fn validate_name(name: &str) -> Result<String, GalleryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(GalleryError::Validation("name is required".to_string()));
    }
    if trimmed.chars().count() > 200 {
        return Err(GalleryError::Validation(
            "name must be at most 200 characters".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Parses an event date. Accepts RFC 3339 timestamps and plain
/// `YYYY-MM-DD` dates (midnight UTC).
///
/// # Errors
///
/// Returns [`GalleryError::Validation`] if the input is blank or not a
/// recognizable date.
pub fn parse_event_date(input: &str) -> Result<DateTime<Utc>, GalleryError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(GalleryError::Validation("date is required".to_string()));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| GalleryError::Validation(format!("invalid date format: {input}")))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        let Some(ts) = Utc.with_ymd_and_hms(y, m, d, h, min, 0).single() else {
            panic!("valid timestamp");
        };
        ts
    }

    fn photo(url: &str) -> Photo {
        Photo {
            id: url.to_string(),
            filename: url.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn thumbnail_sentinel_round_trips_as_string() {
        let json = serde_json::to_string(&Thumbnail::Placeholder).ok();
        assert_eq!(json.as_deref(), Some("\"/placeholder.jpg\""));

        let parsed: Option<Thumbnail> = serde_json::from_str("\"/placeholder.jpg\"").ok();
        assert_eq!(parsed, Some(Thumbnail::Placeholder));
    }

    #[test]
    fn placeholder_falls_back_to_first_photo() {
        let photos = vec![photo("http://a/1.jpg"), photo("http://a/2.jpg")];
        assert_eq!(
            Thumbnail::Placeholder.or_first_photo(&photos),
            Thumbnail::Url("http://a/1.jpg".into())
        );
        assert_eq!(
            Thumbnail::Placeholder.or_first_photo(&[]),
            Thumbnail::Placeholder
        );
        assert_eq!(
            Thumbnail::Url("http://t".into()).or_first_photo(&photos),
            Thumbnail::Url("http://t".into())
        );
    }

    #[test]
    fn stored_blank_thumbnail_is_placeholder() {
        assert!(Thumbnail::from_stored(None).is_placeholder());
        assert!(Thumbnail::from_stored(Some("  ")).is_placeholder());
        assert!(Thumbnail::from_stored(Some(PLACEHOLDER_THUMBNAIL)).is_placeholder());
    }

    #[test]
    fn folder_names_become_title_case() {
        assert_eq!(display_name_from_folder("maria_joao"), "Maria Joao");
        assert_eq!(display_name_from_folder("festa"), "Festa");
        assert_eq!(display_name_from_folder("tech_2024_day_1"), "Tech 2024 Day 1");
    }

    #[test]
    fn dates_parse_in_both_formats() {
        let Ok(d) = parse_event_date("2025-01-15") else {
            panic!("plain date should parse");
        };
        assert_eq!(d, at(2025, 1, 15, 0, 0));

        let Ok(ts) = parse_event_date("2025-01-15T10:30:00-03:00") else {
            panic!("rfc3339 should parse");
        };
        assert_eq!(ts, at(2025, 1, 15, 13, 30));

        assert!(matches!(
            parse_event_date("15/01/2025"),
            Err(GalleryError::Validation(_))
        ));
        assert!(matches!(parse_event_date(""), Err(GalleryError::Validation(_))));
    }

    #[test]
    fn sort_puts_newest_first() {
        let mk = |id: &str, y: i32| Event {
            id: id.into(),
            name: id.into(),
            date: at(y, 1, 1, 0, 0),
            thumbnail: Thumbnail::Placeholder,
            photos: vec![],
            visible: true,
        };
        let mut events = vec![mk("a", 2020), mk("b", 2025), mk("c", 2022)];
        sort_newest_first(&mut events);
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(validate_name("   ").is_err());
        assert_eq!(validate_name(" Wedding ").ok().as_deref(), Some("Wedding"));
    }
}
