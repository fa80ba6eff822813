//! Backend seams and their reqwest implementation.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        Category, CategoryId, MenuItem, MenuItemId, Neighborhood, NeighborhoodId, Order, OrderId,
        OrderStatus,
    },
    protocol::{
        CategoryInput, MenuItemInput, NeighborhoodInput, OrderPayload, UpdateStatusRequest,
    },
};
use tracing::{debug, error, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};

#[async_trait]
pub trait OrderBackend: Send + Sync {
    async fn list_orders(&self) -> ClientResult<Vec<Order>>;
    async fn create_order(&self, payload: &OrderPayload) -> ClientResult<Order>;
    async fn update_order(&self, order_id: OrderId, payload: &OrderPayload) -> ClientResult<Order>;
    /// Returns the acknowledged order when the backend echoes it back.
    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> ClientResult<Option<Order>>;
}

#[async_trait]
pub trait MenuBackend: Send + Sync {
    async fn list_categories(&self) -> ClientResult<Vec<Category>>;
    async fn create_category(&self, input: &CategoryInput) -> ClientResult<Category>;
    async fn update_category(
        &self,
        category_id: CategoryId,
        input: &CategoryInput,
    ) -> ClientResult<Category>;
    async fn delete_category(&self, category_id: CategoryId) -> ClientResult<()>;
    async fn add_item(
        &self,
        category_id: CategoryId,
        input: &MenuItemInput,
    ) -> ClientResult<MenuItem>;
    async fn update_item(
        &self,
        category_id: CategoryId,
        item_id: MenuItemId,
        input: &MenuItemInput,
    ) -> ClientResult<MenuItem>;
    async fn delete_item(&self, category_id: CategoryId, item_id: MenuItemId) -> ClientResult<()>;
}

#[async_trait]
pub trait NeighborhoodBackend: Send + Sync {
    async fn list_neighborhoods(&self) -> ClientResult<Vec<Neighborhood>>;
    async fn neighborhoods_in_city(&self, city: &str) -> ClientResult<Vec<Neighborhood>>;
    async fn create_neighborhood(&self, input: &NeighborhoodInput) -> ClientResult<Neighborhood>;
    async fn update_neighborhood(
        &self,
        neighborhood_id: NeighborhoodId,
        input: &NeighborhoodInput,
    ) -> ClientResult<Neighborhood>;
    async fn delete_neighborhood(&self, neighborhood_id: NeighborhoodId) -> ClientResult<()>;
}

pub fn parse_base_url(raw: &str) -> ClientResult<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|source| ClientError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}

pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Sends the request and returns the raw body of a 2xx response.
pub(crate) async fn execute(request: RequestBuilder, context: &str) -> ClientResult<Vec<u8>> {
    let response = request.send().await.map_err(|source| {
        error!(%context, error = %source, "request failed before a response arrived");
        ClientError::Transport {
            context: context.to_string(),
            source,
        }
    })?;
    let status = response.status();
    let body = response.bytes().await.map_err(|source| {
        error!(%context, error = %source, "failed to read response body");
        ClientError::Transport {
            context: context.to_string(),
            source,
        }
    })?;

    if !status.is_success() {
        let body = String::from_utf8_lossy(&body).into_owned();
        error!(%context, status = status.as_u16(), %body, "server rejected request");
        return Err(ClientError::Status {
            context: context.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    debug!(%context, status = status.as_u16(), bytes = body.len(), "request completed");
    Ok(body.to_vec())
}

pub(crate) fn decode<T: DeserializeOwned>(body: &[u8], context: &str) -> ClientResult<T> {
    serde_json::from_slice(body).map_err(|source| {
        warn!(%context, error = %source, "response body did not match the expected shape");
        ClientError::Decode {
            context: context.to_string(),
            source,
        }
    })
}

pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    context: &str,
) -> ClientResult<T> {
    let body = execute(request, context).await?;
    decode(&body, context)
}

/// reqwest implementation of every backend trait against one base URL.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> ClientResult<Self> {
        Ok(Self {
            http,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        join_segments(&self.base_url, segments)
    }
}

#[async_trait]
impl OrderBackend for HttpBackend {
    async fn list_orders(&self) -> ClientResult<Vec<Order>> {
        let url = self.endpoint(&["api", "orders"]);
        fetch_json(self.http.get(url), "fetch orders").await
    }

    async fn create_order(&self, payload: &OrderPayload) -> ClientResult<Order> {
        let url = self.endpoint(&["api", "orders"]);
        fetch_json(self.http.post(url).json(payload), "create order").await
    }

    async fn update_order(&self, order_id: OrderId, payload: &OrderPayload) -> ClientResult<Order> {
        let id = order_id.to_string();
        let url = self.endpoint(&["api", "orders", &id]);
        fetch_json(self.http.put(url).json(payload), "update order").await
    }

    async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> ClientResult<Option<Order>> {
        let id = order_id.to_string();
        let url = self.endpoint(&["api", "orders", &id, "status"]);
        let request = self
            .http
            .put(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&UpdateStatusRequest { status });
        let body = execute(request, "update order status").await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        decode(&body, "update order status").map(Some)
    }
}

#[async_trait]
impl MenuBackend for HttpBackend {
    async fn list_categories(&self) -> ClientResult<Vec<Category>> {
        let url = self.endpoint(&["api", "categories"]);
        let categories: Vec<Category> =
            fetch_json(self.http.get(url), "fetch categories").await?;
        Ok(categories.into_iter().map(Category::link_items).collect())
    }

    async fn create_category(&self, input: &CategoryInput) -> ClientResult<Category> {
        let url = self.endpoint(&["api", "categories"]);
        fetch_json(self.http.post(url).json(input), "create category").await
    }

    async fn update_category(
        &self,
        category_id: CategoryId,
        input: &CategoryInput,
    ) -> ClientResult<Category> {
        let id = category_id.to_string();
        let url = self.endpoint(&["api", "categories", &id]);
        fetch_json(self.http.put(url).json(input), "update category").await
    }

    async fn delete_category(&self, category_id: CategoryId) -> ClientResult<()> {
        let id = category_id.to_string();
        let url = self.endpoint(&["api", "categories", &id]);
        execute(self.http.delete(url), "delete category").await?;
        Ok(())
    }

    async fn add_item(
        &self,
        category_id: CategoryId,
        input: &MenuItemInput,
    ) -> ClientResult<MenuItem> {
        let id = category_id.to_string();
        let url = self.endpoint(&["api", "categories", &id, "items"]);
        let mut item: MenuItem =
            fetch_json(self.http.post(url).json(input), "add menu item").await?;
        item.category_id = Some(category_id);
        Ok(item)
    }

    async fn update_item(
        &self,
        category_id: CategoryId,
        item_id: MenuItemId,
        input: &MenuItemInput,
    ) -> ClientResult<MenuItem> {
        let id = category_id.to_string();
        let item = item_id.to_string();
        let url = self.endpoint(&["api", "categories", &id, "items", &item]);
        let mut item: MenuItem =
            fetch_json(self.http.put(url).json(input), "update menu item").await?;
        item.category_id = Some(category_id);
        Ok(item)
    }

    async fn delete_item(&self, category_id: CategoryId, item_id: MenuItemId) -> ClientResult<()> {
        let id = category_id.to_string();
        let item = item_id.to_string();
        let url = self.endpoint(&["api", "categories", &id, "items", &item]);
        execute(self.http.delete(url), "delete menu item").await?;
        Ok(())
    }
}

#[async_trait]
impl NeighborhoodBackend for HttpBackend {
    async fn list_neighborhoods(&self) -> ClientResult<Vec<Neighborhood>> {
        let url = self.endpoint(&["api", "neighborhoods"]);
        fetch_json(self.http.get(url), "fetch neighborhoods").await
    }

    async fn neighborhoods_in_city(&self, city: &str) -> ClientResult<Vec<Neighborhood>> {
        let url = self.endpoint(&["api", "neighborhoods", "city", city]);
        fetch_json(self.http.get(url), "fetch neighborhoods by city").await
    }

    async fn create_neighborhood(&self, input: &NeighborhoodInput) -> ClientResult<Neighborhood> {
        let url = self.endpoint(&["api", "neighborhoods"]);
        fetch_json(self.http.post(url).json(input), "create neighborhood").await
    }

    async fn update_neighborhood(
        &self,
        neighborhood_id: NeighborhoodId,
        input: &NeighborhoodInput,
    ) -> ClientResult<Neighborhood> {
        let id = neighborhood_id.to_string();
        let url = self.endpoint(&["api", "neighborhoods", &id]);
        fetch_json(self.http.put(url).json(input), "update neighborhood").await
    }

    async fn delete_neighborhood(&self, neighborhood_id: NeighborhoodId) -> ClientResult<()> {
        let id = neighborhood_id.to_string();
        let url = self.endpoint(&["api", "neighborhoods", &id]);
        execute(self.http.delete(url), "delete neighborhood").await?;
        Ok(())
    }
}
