//! Managed backend over its PostgREST HTTP API (`{url}/rest/v1/{table}`).

use super::{GuestStore, NamePattern};
use crate::config::{RemoteSettings, TableNames};
use crate::error::{AppError, ConfigError};
use crate::model::{Attendance, GuestChanges, GuestId, GuestRow, MasterGuest, NewGuest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

const REST_PATH: &str = "rest/v1";

#[derive(Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// PATCH body: the partial changes plus the update stamp.
#[derive(Serialize)]
struct PatchBody<'a> {
    #[serde(flatten)]
    changes: &'a GuestChanges,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    guests_url: String,
    master_url: String,
}

impl PostgrestStore {
    /// Build the client. Both URL and key are required; a missing one is a config error.
    pub fn new(remote: &RemoteSettings, tables: &TableNames) -> Result<Self, AppError> {
        let url = remote.url.as_deref().ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let key = remote.anon_key.as_deref().ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let mut headers = HeaderMap::new();
        let invalid_key = || ConfigError::Invalid {
            key: "SUPABASE_ANON_KEY",
            reason: "not a valid header value".into(),
        };
        headers.insert("apikey", HeaderValue::from_str(key).map_err(|_| invalid_key())?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| invalid_key())?,
        );
        let client = Client::builder().default_headers(headers).build()?;

        Ok(PostgrestStore {
            client,
            guests_url: table_url(url, &tables.guests),
            master_url: table_url(url, &tables.master),
        })
    }

    async fn send(request: RequestBuilder) -> Result<Response, AppError> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Err(remote_error(status, &text))
    }

    async fn first_guest(request: RequestBuilder) -> Result<Option<GuestRow>, AppError> {
        let rows: Vec<GuestRow> = Self::send(request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn first_master(request: RequestBuilder) -> Result<Option<MasterGuest>, AppError> {
        let rows: Vec<MasterGuest> = Self::send(request).await?.json().await?;
        Ok(rows.into_iter().next())
    }
}

fn table_url(base: &str, table: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), REST_PATH, table)
}

fn eq_filter(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// PostgREST accepts `*` as the LIKE wildcard in URLs and rewrites every `*` to `%`
/// before the query runs, so a literal `*` in a name cannot be matched over REST;
/// it behaves as a wildcard.
fn ilike_filter(pattern: &NamePattern) -> String {
    let escaped: String = pattern
        .needle()
        .chars()
        .flat_map(|c| match c {
            '%' | '_' | '\\' => vec!['\\', c],
            c => vec![c],
        })
        .collect();
    match pattern {
        NamePattern::Exact(_) => format!("ilike.{}", escaped),
        NamePattern::Contains(_) => format!("ilike.*{}*", escaped),
    }
}

/// Total from a `Content-Range` header such as `0-9/42` or `*/0`.
fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/').and_then(|(_, total)| total.trim().parse().ok())
}

fn remote_error(status: u16, body: &str) -> AppError {
    match serde_json::from_str::<PostgrestErrorBody>(body) {
        Ok(parsed) => {
            let mut message = parsed.message.unwrap_or_else(|| "request failed".into());
            if let Some(details) = parsed.details {
                message = format!("{} ({})", message, details);
            }
            AppError::Remote {
                status,
                code: parsed.code,
                message,
            }
        }
        Err(_) => AppError::Remote {
            status,
            code: None,
            message: if body.is_empty() { "request failed".into() } else { body.to_string() },
        },
    }
}

#[async_trait]
impl GuestStore for PostgrestStore {
    fn backend_name(&self) -> &'static str {
        "postgrest"
    }

    async fn ping(&self) -> Result<(), AppError> {
        Self::send(self.client.get(&self.guests_url).query(&[("select", "id"), ("limit", "1")])).await?;
        Ok(())
    }

    async fn insert_guest(&self, guest: &NewGuest) -> Result<GuestRow, AppError> {
        tracing::debug!(url = %self.guests_url, name = %guest.name, "insert");
        let request = self
            .client
            .post(&self.guests_url)
            .header("Prefer", "return=representation")
            .query(&[("select", "*")])
            .json(&[guest]);
        Self::first_guest(request).await?.ok_or_else(|| AppError::Remote {
            status: 200,
            code: None,
            message: "insert returned no row".into(),
        })
    }

    async fn list_guests(&self, attendance: Option<Attendance>) -> Result<Vec<GuestRow>, AppError> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc,id.desc".to_string()),
        ];
        if let Some(a) = attendance {
            params.push(("attendance", eq_filter(a)));
        }
        tracing::debug!(url = %self.guests_url, params = ?params, "select");
        let rows = Self::send(self.client.get(&self.guests_url).query(&params)).await?.json().await?;
        Ok(rows)
    }

    async fn fetch_guest(&self, id: GuestId) -> Result<Option<GuestRow>, AppError> {
        tracing::debug!(url = %self.guests_url, id, "select");
        let request = self
            .client
            .get(&self.guests_url)
            .query(&[("select", "*".to_string()), ("id", eq_filter(id))]);
        Self::first_guest(request).await
    }

    async fn update_guest(&self, id: GuestId, changes: &GuestChanges) -> Result<Option<GuestRow>, AppError> {
        tracing::debug!(url = %self.guests_url, id, "update");
        let request = self
            .client
            .patch(&self.guests_url)
            .header("Prefer", "return=representation")
            .query(&[("select", "*".to_string()), ("id", eq_filter(id))])
            .json(&PatchBody {
                changes,
                updated_at: Utc::now(),
            });
        Self::first_guest(request).await
    }

    async fn delete_guest(&self, id: GuestId) -> Result<(), AppError> {
        tracing::debug!(url = %self.guests_url, id, "delete");
        Self::send(self.client.delete(&self.guests_url).query(&[("id", eq_filter(id))])).await?;
        Ok(())
    }

    async fn count_guests(&self, attendance: Attendance) -> Result<u64, AppError> {
        tracing::debug!(url = %self.guests_url, attendance = %attendance, "count");
        let request = self
            .client
            .head(&self.guests_url)
            .header("Prefer", "count=exact")
            .query(&[("select", "*".to_string()), ("attendance", eq_filter(attendance))]);
        let response = Self::send(request).await?;
        Ok(response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0))
    }

    async fn find_guest(&self, pattern: &NamePattern) -> Result<Option<GuestRow>, AppError> {
        tracing::debug!(url = %self.guests_url, pattern = ?pattern, "select");
        let request = self.client.get(&self.guests_url).query(&[
            ("select", "*".to_string()),
            ("name", ilike_filter(pattern)),
            ("order", "id.asc".to_string()),
            ("limit", "1".to_string()),
        ]);
        Self::first_guest(request).await
    }

    async fn find_master(&self, pattern: &NamePattern) -> Result<Option<MasterGuest>, AppError> {
        tracing::debug!(url = %self.master_url, pattern = ?pattern, "select");
        let request = self.client.get(&self.master_url).query(&[
            ("select", "id,nombre,pases".to_string()),
            ("nombre", ilike_filter(pattern)),
            ("order", "id.asc".to_string()),
            ("limit", "1".to_string()),
        ]);
        Self::first_master(request).await
    }

    async fn list_master(&self) -> Result<Vec<MasterGuest>, AppError> {
        tracing::debug!(url = %self.master_url, "select");
        let request = self
            .client
            .get(&self.master_url)
            .query(&[("select", "id,nombre,pases"), ("order", "id.asc")]);
        let rows = Self::send(request).await?.json().await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_table_urls() {
        assert_eq!(
            table_url("https://abc.supabase.co/", "wedding_guests"),
            "https://abc.supabase.co/rest/v1/wedding_guests"
        );
    }

    #[test]
    fn builds_filters() {
        assert_eq!(eq_filter(Attendance::Yes), "eq.yes");
        assert_eq!(eq_filter(42), "eq.42");
        assert_eq!(ilike_filter(&NamePattern::Exact("Ana López".into())), "ilike.Ana López");
        assert_eq!(ilike_filter(&NamePattern::Contains("Ana".into())), "ilike.*Ana*");
        assert_eq!(ilike_filter(&NamePattern::Exact("50%_off".into())), "ilike.50\\%\\_off");
        // `*` is PostgREST's wildcard; it passes through unescaped.
        assert_eq!(ilike_filter(&NamePattern::Contains("a*b".into())), "ilike.*a*b*");
    }

    #[test]
    fn parses_content_range() {
        assert_eq!(parse_content_range_total("0-9/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-9/*"), None);
    }

    #[test]
    fn maps_error_bodies() {
        let err = remote_error(400, r#"{"code":"22P02","message":"invalid input syntax","details":"id"}"#);
        match err {
            AppError::Remote { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("22P02"));
                assert_eq!(message, "invalid input syntax (id)");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(remote_error(502, "bad gateway"), AppError::Remote { code: None, .. }));
    }

    #[test]
    fn requires_url_and_key() {
        let tables = TableNames::default();
        let missing_key = RemoteSettings {
            url: Some("https://abc.supabase.co".into()),
            anon_key: None,
        };
        assert!(matches!(
            PostgrestStore::new(&missing_key, &tables),
            Err(AppError::Config(ConfigError::Missing("SUPABASE_ANON_KEY")))
        ));
    }
}
