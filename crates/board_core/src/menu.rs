use std::sync::Arc;

use shared::{
    domain::{Category, CategoryId, MenuItem, MenuItemId},
    protocol::{CategoryInput, MenuItemInput},
};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::{
    api::MenuBackend,
    error::{ClientResult, ValidationError},
};

fn validate_category(input: &CategoryInput) -> Result<(), ValidationError> {
    if input.name.trim().is_empty() {
        return Err(ValidationError::required("category name"));
    }
    Ok(())
}

fn validate_item(input: &MenuItemInput) -> Result<(), ValidationError> {
    if input.name.trim().is_empty() {
        return Err(ValidationError::required("item name"));
    }
    if !input.price.is_finite() || input.price <= 0.0 {
        return Err(ValidationError::new("price", "must be greater than zero"));
    }
    Ok(())
}

/// Cached category list. Every mutation is followed by a full refetch.
pub struct MenuCatalog {
    backend: Arc<dyn MenuBackend>,
    categories: RwLock<Vec<Category>>,
}

impl MenuCatalog {
    pub fn new(backend: Arc<dyn MenuBackend>) -> Self {
        Self {
            backend,
            categories: RwLock::new(Vec::new()),
        }
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.categories.read().await.clone()
    }

    pub async fn item(&self, item_id: MenuItemId) -> Option<MenuItem> {
        self.categories
            .read()
            .await
            .iter()
            .find_map(|category| category.item(item_id).cloned())
    }

    pub async fn refresh(&self) -> ClientResult<usize> {
        let categories = self.backend.list_categories().await.inspect_err(|err| {
            error!(error = %err, "failed to fetch categories");
        })?;
        let count = categories.len();
        *self.categories.write().await = categories;
        info!(categories = count, "menu refreshed");
        Ok(count)
    }

    pub async fn add_category(&self, name: &str) -> ClientResult<Category> {
        let input = CategoryInput {
            name: name.trim().to_string(),
        };
        validate_category(&input)?;
        let category = self.backend.create_category(&input).await?;
        info!(category_id = %category.id, name = %category.name, "category created");
        self.refresh().await?;
        Ok(category)
    }

    pub async fn rename_category(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> ClientResult<Category> {
        let input = CategoryInput {
            name: name.trim().to_string(),
        };
        validate_category(&input)?;
        let category = self.backend.update_category(category_id, &input).await?;
        self.refresh().await?;
        Ok(category)
    }

    /// Deletes the category together with its items.
    pub async fn delete_category(&self, category_id: CategoryId) -> ClientResult<()> {
        self.backend.delete_category(category_id).await?;
        info!(%category_id, "category deleted");
        self.refresh().await?;
        Ok(())
    }

    pub async fn add_item(
        &self,
        category_id: CategoryId,
        input: MenuItemInput,
    ) -> ClientResult<MenuItem> {
        validate_item(&input)?;
        let item = self.backend.add_item(category_id, &input).await?;
        info!(%category_id, item_id = %item.id, "menu item added");
        self.refresh().await?;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        category_id: CategoryId,
        item_id: MenuItemId,
        input: MenuItemInput,
    ) -> ClientResult<MenuItem> {
        validate_item(&input)?;
        let item = self.backend.update_item(category_id, item_id, &input).await?;
        self.refresh().await?;
        Ok(item)
    }

    pub async fn delete_item(
        &self,
        category_id: CategoryId,
        item_id: MenuItemId,
    ) -> ClientResult<()> {
        self.backend.delete_item(category_id, item_id).await?;
        info!(%category_id, %item_id, "menu item deleted");
        self.refresh().await?;
        Ok(())
    }
}
