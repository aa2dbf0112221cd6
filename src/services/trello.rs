//! Read-only Trello REST client.
//!
//! Two calls are supported: listing a board's labels and listing the cards
//! carrying a label. Both are blocking and are meant to run on a worker
//! thread (see [`crate::services::requests`]). There are no retries.

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::TrelloConfig;
use crate::models::{Card, CardSet, Credentials, Label, ValidationError};
use crate::services::{Cancellation, Storage};

/// Errors surfaced by the Trello gateway.
#[derive(Debug, Error)]
pub enum TrelloError {
    /// Credentials were incomplete; no request was made
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Trello answered with a non-success status
    #[error("Failed to fetch {resource}: {status} {status_text}")]
    Gateway {
        /// What was being fetched ("labels" or "cards")
        resource: &'static str,
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        status_text: String,
    },

    /// The request never produced a response (DNS, TLS, refused, timeout)
    #[error("Network error while fetching {resource}: {source}")]
    Network {
        /// What was being fetched
        resource: &'static str,
        /// Underlying transport error
        source: reqwest::Error,
    },

    /// A success response whose body was not the expected JSON
    #[error("Unexpected response while fetching {resource}: {source}")]
    Decode {
        /// What was being fetched
        resource: &'static str,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// The configured API base URL cannot carry a path
    #[error("Invalid Trello API base URL: {0}")]
    InvalidBaseUrl(String),

    /// The background worker stopped without reporting a result
    #[error("Request was interrupted before it completed")]
    Interrupted,
}

impl TrelloError {
    /// HTTP status for gateway errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Gateway { status, .. } => Some(*status),
            _ => None,
        }
    }
}

const LABELS: &str = "labels";
const CARDS: &str = "cards";

/// Blocking Trello API client bound to one set of credentials.
#[derive(Debug, Clone)]
pub struct TrelloClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
}

impl TrelloClient {
    /// Creates a client.
    ///
    /// # Arguments
    ///
    /// * `credentials` - API key, token and board id (whitespace is trimmed)
    /// * `config` - Base URL and request timeout
    ///
    /// # Errors
    ///
    /// * `TrelloError::Validation` - a credential is blank
    /// * `TrelloError::InvalidBaseUrl` - the base URL cannot be used
    pub fn new(credentials: &Credentials, config: &TrelloConfig) -> Result<Self, TrelloError> {
        let credentials = credentials.trimmed();
        credentials.validate()?;

        let base_url = Url::parse(&config.api_base_url)
            .map_err(|_| TrelloError::InvalidBaseUrl(config.api_base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(TrelloError::InvalidBaseUrl(config.api_base_url.clone()));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|source| TrelloError::Network {
                resource: LABELS,
                source,
            })?;

        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// The credentials this client sends.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Fetches every label defined on the board.
    pub fn fetch_board_labels(&self) -> Result<Vec<Label>, TrelloError> {
        let url = self.endpoint(&["1", "boards", &self.credentials.board_id, "labels"])?;
        let labels: Vec<Label> = self.get_json(url, LABELS)?;
        info!("Fetched {} labels for the board", labels.len());
        Ok(labels)
    }

    /// Fetches the cards carrying `label_id` and stores them as the current
    /// (not yet arranged) card set.
    pub fn fetch_cards_by_label(
        &self,
        label_id: &str,
        storage: &Storage,
    ) -> Result<Vec<Card>, TrelloError> {
        self.fetch_cards_for_request(label_id, storage, &Cancellation::new())
    }

    /// Like [`TrelloClient::fetch_cards_by_label`], but leaves storage alone
    /// once `cancellation` has fired.
    pub fn fetch_cards_for_request(
        &self,
        label_id: &str,
        storage: &Storage,
        cancellation: &Cancellation,
    ) -> Result<Vec<Card>, TrelloError> {
        let url = self.endpoint(&["1", "labels", label_id, "cards"])?;
        let cards: Vec<Card> = self.get_json(url, CARDS)?;
        info!("Fetched {} cards for label {label_id}", cards.len());

        let stored = cancellation.unless_cancelled(|| {
            storage.set_cards(&CardSet::Fetched {
                cards: cards.clone(),
            });
        });
        if !stored {
            debug!("Request for label {label_id} was abandoned; not storing its cards");
        }
        Ok(cards)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TrelloError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TrelloError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        resource: &'static str,
    ) -> Result<T, TrelloError> {
        debug!("GET {}", url.path());

        let response = self
            .http
            .get(url)
            .query(&[
                ("key", self.credentials.api_key.as_str()),
                ("token", self.credentials.api_token.as_str()),
            ])
            .send()
            .map_err(|source| TrelloError::Network { resource, source })?;

        let body = Self::success_body(response, resource)?;
        serde_json::from_str(&body).map_err(|source| {
            warn!("Trello returned malformed {resource}: {source}");
            TrelloError::Decode { resource, source }
        })
    }

    fn success_body(response: Response, resource: &'static str) -> Result<String, TrelloError> {
        let status = response.status();
        if !status.is_success() {
            warn!("Trello returned {status} for {resource}");
            return Err(TrelloError::Gateway {
                resource,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        response
            .text()
            .map_err(|source| TrelloError::Network { resource, source })
    }
}
