//! HTTP client for the hosted data service.
//!
//! Data calls go to `{url}/rest/v1/{table}`; auth calls go to
//! `{url}/auth/v1/*`. Every request carries the `apikey` header. Requests made
//! on behalf of a signed-in user send that user's bearer token, anonymous
//! requests send the anon key as the bearer.

use aitoonic_core::store::{
    AccessToken, AuthEvent, AuthSubscription, Credentials, DataStore, Filter, Select, Session,
    StoreResult,
};
use aitoonic_core::{Table, UserId};
use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::error::{SupabaseError, from_response};
use super::query::{filter_pairs, parse_content_range, select_pairs, with_pairs};
use crate::config::StoreConfig;

const AUTH_EVENT_CAPACITY: usize = 64;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserResponse,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Client for the hosted data service.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    /// Project URL without a trailing slash.
    base_url: String,
    anon_key: SecretString,
    events: broadcast::Sender<AuthEvent>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .field("anon_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &StoreConfig) -> Result<Self, SupabaseError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);

        Ok(Self {
            client,
            base_url: config.url.as_str().trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            events,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SupabaseError> {
        Ok(Url::parse(&format!("{}/{path}", self.base_url))?)
    }

    fn table_url(&self, table: Table, pairs: &[(String, String)]) -> Result<Url, SupabaseError> {
        let url = self.endpoint(&format!("rest/v1/{}", table.as_str()))?;
        Ok(with_pairs(url, pairs))
    }

    /// Attach the API key and the caller's (or the anon) bearer token.
    fn authorize(&self, request: RequestBuilder, token: Option<&AccessToken>) -> RequestBuilder {
        let bearer = token.map_or_else(|| self.anon_key.expose_secret(), AccessToken::expose);
        request
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(bearer)
    }

    async fn check(response: Response) -> Result<Response, SupabaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(from_response(status.as_u16(), &body))
    }

    /// Decode a `return=representation` body and take its single row.
    async fn single_row(response: Response, what: &str) -> Result<serde_json::Value, SupabaseError> {
        let rows: Vec<serde_json::Value> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::NoRow(what.to_string()))
    }

    fn publish(&self, event: AuthEvent) {
        // No receivers is fine: nobody is watching auth state right now.
        let _ = self.events.send(event);
    }

    async fn fetch_user(&self, token: &AccessToken) -> Result<Option<Session>, SupabaseError> {
        let response = self
            .authorize(self.client.get(self.endpoint("auth/v1/user")?), Some(token))
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let user: UserResponse = Self::check(response).await?.json().await?;
        Ok(Some(Session {
            user_id: UserId::new(user.id),
            email: user.email.unwrap_or_default(),
            access_token: token.clone(),
        }))
    }
}

#[async_trait]
impl DataStore for SupabaseClient {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn authenticate(&self, credentials: &Credentials) -> StoreResult<Session> {
        let url = with_pairs(
            self.endpoint("auth/v1/token")?,
            &[("grant_type".to_string(), "password".to_string())],
        );
        let body = serde_json::json!({
            "email": credentials.email,
            "password": credentials.password,
        });

        let response = self
            .client
            .post(url)
            .header("apikey", self.anon_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let token: TokenResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(SupabaseError::from)?;

        let session = Session {
            user_id: UserId::new(token.user.id),
            email: token.user.email.unwrap_or_else(|| credentials.email.clone()),
            access_token: AccessToken::new(token.access_token),
        };
        debug!(user_id = %session.user_id, "Signed in");
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn get_session(&self, token: &AccessToken) -> StoreResult<Option<Session>> {
        Ok(self.fetch_user(token).await?)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, token: &AccessToken) -> StoreResult<()> {
        let session = self.fetch_user(token).await?;

        let response = self
            .authorize(self.client.post(self.endpoint("auth/v1/logout")?), Some(token))
            .send()
            .await
            .map_err(SupabaseError::from)?;
        Self::check(response).await?;

        match session {
            Some(session) => {
                debug!(user_id = %session.user_id, "Signed out");
                self.publish(AuthEvent::SignedOut {
                    user_id: session.user_id,
                });
            }
            None => warn!("Sign-out for a token with no live session"),
        }
        Ok(())
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::new(self.events.subscribe())
    }

    #[instrument(skip(self, query, token), fields(table = %table))]
    async fn select(
        &self,
        table: Table,
        query: &Select,
        token: Option<&AccessToken>,
    ) -> StoreResult<Vec<serde_json::Value>> {
        let url = self.table_url(table, &select_pairs(query))?;
        let response = self
            .authorize(self.client.get(url), token)
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let rows = Self::check(response)
            .await?
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(SupabaseError::from)?;

        debug!(rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    #[instrument(skip(self, filters, token), fields(table = %table))]
    async fn count(
        &self,
        table: Table,
        filters: &[Filter],
        token: Option<&AccessToken>,
    ) -> StoreResult<u64> {
        let mut pairs = vec![("select".to_string(), "id".to_string())];
        pairs.extend(filter_pairs(filters));
        let url = self.table_url(table, &pairs)?;

        let response = self
            .authorize(self.client.head(url), token)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(SupabaseError::from)?;
        let response = Self::check(response).await?;

        let count = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value: &HeaderValue| value.to_str().ok())
            .and_then(parse_content_range)
            .ok_or(SupabaseError::MissingCount)?;
        Ok(count)
    }

    #[instrument(skip(self, record, token), fields(table = %table))]
    async fn insert(
        &self,
        table: Table,
        record: &serde_json::Value,
        token: Option<&AccessToken>,
    ) -> StoreResult<serde_json::Value> {
        let url = self.table_url(table, &[])?;
        let response = self
            .authorize(self.client.post(url), token)
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await
            .map_err(SupabaseError::from)?;

        let response = Self::check(response).await.inspect_err(|e| {
            error!(error = %e, "Insert rejected");
        })?;
        Ok(Self::single_row(response, table.as_str()).await?)
    }

    #[instrument(skip(self, record, token), fields(table = %table, id = %id))]
    async fn update(
        &self,
        table: Table,
        id: &str,
        record: &serde_json::Value,
        token: Option<&AccessToken>,
    ) -> StoreResult<serde_json::Value> {
        let pairs = filter_pairs(&[Filter::eq("id", id)]);
        let url = self.table_url(table, &pairs)?;
        let response = self
            .authorize(self.client.patch(url), token)
            .header("Prefer", "return=representation")
            .json(record)
            .send()
            .await
            .map_err(SupabaseError::from)?;

        let response = Self::check(response).await.inspect_err(|e| {
            error!(error = %e, "Update rejected");
        })?;
        Ok(Self::single_row(response, id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        let config = StoreConfig::new("https://abcd.supabase.co/", "anon-key").unwrap();
        SupabaseClient::new(&config).unwrap()
    }

    #[test]
    fn test_table_url() {
        let url = client()
            .table_url(
                Table::Tools,
                &select_pairs(&Select::all().filter(Filter::eq("category_id", "c1"))),
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://abcd.supabase.co/rest/v1/tools?select=*&category_id=eq.c1"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("abcd.supabase.co"));
        assert!(!debug.contains("anon-key"));
    }

    #[test]
    fn test_subscribers_share_one_channel() {
        let client = client();
        let _first = client.subscribe();
        let _second = client.subscribe();
        assert_eq!(client.events.receiver_count(), 2);
    }
}
