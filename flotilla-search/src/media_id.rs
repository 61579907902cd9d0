//! Parsing of inbound Stremio media identifiers.
//!
//! Accepted forms: `tt0133093`, `tt0944947:1:2`, `tmdb:603`, `tmdb:1399:1:2`
//! and bare numeric TMDB ids. Series coordinates that are absent default to 1.

use crate::errors::MediaIdError;
use crate::types::{MediaKind, MediaReference};

/// Prefix marking an id that is already a TMDB id.
pub const TMDB_PREFIX: &str = "tmdb:";

/// Parses a Stremio id of the given kind into an unresolved media reference.
///
/// # Errors
/// - `MediaIdError::UnsupportedId` - Unknown id scheme or malformed id
/// - `MediaIdError::InvalidCoordinate` - Season or episode is not a positive integer
/// - `MediaIdError::UnexpectedCoordinates` - Film id carries season or episode
pub fn parse_media_id(kind: MediaKind, raw: &str) -> Result<MediaReference, MediaIdError> {
    let raw = raw.trim();
    let unsupported = || MediaIdError::UnsupportedId { id: raw.to_string() };

    let mut segments = raw.split(':');
    let head = segments.next().ok_or_else(unsupported)?;

    let external_id = if head == "tmdb" {
        let tmdb_id = segments.next().ok_or_else(unsupported)?;
        if !is_numeric(tmdb_id) {
            return Err(unsupported());
        }
        format!("{TMDB_PREFIX}{tmdb_id}")
    } else if is_imdb_id(head) || is_numeric(head) {
        head.to_string()
    } else {
        return Err(unsupported());
    };

    let coordinates: Vec<&str> = segments.collect();
    if coordinates.len() > 2 {
        return Err(unsupported());
    }

    match kind {
        MediaKind::Film if !coordinates.is_empty() => Err(MediaIdError::UnexpectedCoordinates {
            id: raw.to_string(),
        }),
        MediaKind::Film => Ok(MediaReference::film(external_id)),
        MediaKind::Series => {
            let season = coordinates
                .first()
                .map(|value| parse_coordinate("season", value))
                .transpose()?;
            let episode = coordinates
                .get(1)
                .map(|value| parse_coordinate("episode", value))
                .transpose()?;
            Ok(MediaReference::series(external_id, season, episode).normalized())
        }
    }
}

/// Returns the TMDB id if `external_id` already is one (`tmdb:603` or `603`).
pub fn internal_id_from(external_id: &str) -> Option<String> {
    let candidate = external_id.strip_prefix(TMDB_PREFIX).unwrap_or(external_id);
    is_numeric(candidate).then(|| candidate.to_string())
}

/// Whether the id is an IMDb title id (`tt` followed by digits).
pub fn is_imdb_id(id: &str) -> bool {
    id.strip_prefix("tt").is_some_and(is_numeric)
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn parse_coordinate(field: &'static str, value: &str) -> Result<u32, MediaIdError> {
    match value.parse::<u32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(MediaIdError::InvalidCoordinate {
            field,
            value: value.to_string(),
        }),
    }
}
