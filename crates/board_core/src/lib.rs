use std::{sync::Arc, time::Duration};

use reqwest::Client;

pub mod api;
pub mod board;
pub mod drag;
pub mod draft;
pub mod error;
pub mod filter;
pub mod locality;
pub mod menu;
pub mod neighborhoods;
pub mod store;
pub mod sync;
pub mod transitions;

pub use api::{HttpBackend, MenuBackend, NeighborhoodBackend, OrderBackend};
pub use board::{Board, BoardError};
pub use drag::{DragEnd, DragLocation, DragOutcome};
pub use draft::{DeliveryAddress, OrderDraft};
pub use error::{ClientError, ClientResult, ValidationError};
pub use filter::{filter_by_delivery_type, DeliveryFilter};
pub use locality::{HttpLocality, LocalityLookup};
pub use menu::MenuCatalog;
pub use neighborhoods::NeighborhoodDirectory;
pub use store::{BoardEvent, BoardStore};
pub use sync::{BoardSync, TransitionOutcome};
pub use transitions::{Direction, TransitionError, TransitionRequest};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_url: String,
    pub postal_code_url: String,
    pub locality_url: String,
    /// `None` keeps reqwest's defaults.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".into(),
            postal_code_url: "https://viacep.com.br".into(),
            locality_url: "https://servicodados.ibge.gov.br".into(),
            request_timeout: None,
        }
    }
}

/// Everything a front-end needs, wired to one HTTP client.
pub struct Services {
    pub board: BoardSync,
    pub menu: MenuCatalog,
    pub neighborhoods: NeighborhoodDirectory,
    pub locality: HttpLocality,
}

impl Services {
    pub fn connect(settings: &ClientSettings) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|source| ClientError::Transport {
            context: "build http client".into(),
            source,
        })?;

        let backend = Arc::new(HttpBackend::with_client(http.clone(), &settings.api_url)?);
        Ok(Self {
            board: BoardSync::new(backend.clone(), BoardStore::new()),
            menu: MenuCatalog::new(backend.clone()),
            neighborhoods: NeighborhoodDirectory::new(backend),
            locality: HttpLocality::new(
                http,
                &settings.postal_code_url,
                &settings.locality_url,
            )?,
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
