//! DTOs for link management endpoints.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, de};
use validator::Validate;

use crate::domain::entities::Link;

/// Request to create a short link.
///
/// `url` and `nome` are required; a request without them is rejected with
/// `400` before reaching the service.
#[derive(Debug, Deserialize, Validate)]
pub struct NewLinkRequest {
    #[validate(length(min = 1, max = 2048, message = "url must have 1 to 2048 characters"))]
    pub url: String,

    #[serde(rename = "nome")]
    #[validate(length(min = 1, max = 255, message = "nome must have 1 to 255 characters"))]
    pub name: String,

    /// Last day on which the link still redirects. Datetimes are cut to
    /// their date as written.
    #[serde(
        rename = "expira_em",
        default,
        deserialize_with = "deserialize_expiration"
    )]
    pub expires_on: Option<NaiveDate>,
}

/// Parses `YYYY-MM-DD`, an RFC 3339 datetime or a datetime without offset.
pub fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

fn deserialize_expiration<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    parse_expiration(&raw).map(Some).ok_or_else(|| {
        de::Error::custom(format!(
            "expira_em must be a date (YYYY-MM-DD) or an ISO 8601 datetime, got '{raw}'"
        ))
    })
}

/// Response of `POST /new`.
#[derive(Debug, Serialize)]
pub struct NewLinkResponse {
    #[serde(rename = "urlEnviada")]
    pub submitted_url: String,

    #[serde(rename = "urlCriada")]
    pub short_url: String,

    #[serde(rename = "nome")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteLinkRequest {
    pub id: i64,
}

/// Response of `POST /del`, carrying the row as it was before deletion.
#[derive(Debug, Serialize)]
pub struct DeleteLinkResponse {
    #[serde(rename = "linkDeletado")]
    pub deleted: Link,
}

/// Request to rename a link.
///
/// Length rules apply after trimming and are enforced by the service.
#[derive(Debug, Deserialize)]
pub struct RenameLinkRequest {
    #[serde(rename = "nome")]
    pub name: String,
}
