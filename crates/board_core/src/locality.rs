//! Read-only reference lookups: postal codes, states and cities.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::protocol::{CityRef, PostalAddress, StateRef};
use tracing::info;
use url::Url;

use crate::{
    api::{decode, execute, fetch_json, join_segments, parse_base_url},
    error::{ClientError, ClientResult, ValidationError},
};

pub const CEP_DIGITS: usize = 8;

/// Strips punctuation from a postal code and checks it has eight digits.
pub fn normalize_cep(raw: &str) -> Result<String, ValidationError> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | '.' | ' '))
        .collect();
    if digits.len() != CEP_DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            "cep",
            format!("'{raw}' is not an 8-digit postal code"),
        ));
    }
    Ok(digits)
}

#[async_trait]
pub trait LocalityLookup: Send + Sync {
    async fn lookup_postal_code(&self, cep: &str) -> ClientResult<PostalAddress>;
    async fn states(&self) -> ClientResult<Vec<StateRef>>;
    async fn cities(&self, state_id: i64) -> ClientResult<Vec<CityRef>>;
}

pub struct HttpLocality {
    http: Client,
    postal_code_url: Url,
    locality_url: Url,
}

impl HttpLocality {
    pub fn new(http: Client, postal_code_url: &str, locality_url: &str) -> ClientResult<Self> {
        Ok(Self {
            http,
            postal_code_url: parse_base_url(postal_code_url)?,
            locality_url: parse_base_url(locality_url)?,
        })
    }
}

#[async_trait]
impl LocalityLookup for HttpLocality {
    async fn lookup_postal_code(&self, cep: &str) -> ClientResult<PostalAddress> {
        let cep = normalize_cep(cep)?;
        let url = join_segments(&self.postal_code_url, &["ws", &cep, "json", ""]);
        let body = execute(self.http.get(url), "postal code lookup").await?;

        // Unknown codes come back as 200 with an `erro` flag.
        let raw: Value = decode(&body, "postal code lookup")?;
        let flagged = match raw.get("erro") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag == "true",
            _ => false,
        };
        if flagged {
            return Err(ClientError::NotFound(format!("postal code {cep}")));
        }
        let address: PostalAddress =
            serde_json::from_value(raw).map_err(|source| ClientError::Decode {
                context: "postal code lookup".into(),
                source,
            })?;
        info!(%cep, city = %address.localidade, "postal code resolved");
        Ok(address)
    }

    async fn states(&self) -> ClientResult<Vec<StateRef>> {
        let url = join_segments(
            &self.locality_url,
            &["api", "v1", "localidades", "estados"],
        );
        let mut states: Vec<StateRef> = fetch_json(self.http.get(url), "fetch states").await?;
        states.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(states)
    }

    async fn cities(&self, state_id: i64) -> ClientResult<Vec<CityRef>> {
        let id = state_id.to_string();
        let url = join_segments(
            &self.locality_url,
            &["api", "v1", "localidades", "estados", &id, "municipios"],
        );
        fetch_json(self.http.get(url), "fetch cities").await
    }
}
