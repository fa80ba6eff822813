use std::sync::Arc;

use shared::{
    domain::{Neighborhood, NeighborhoodId},
    protocol::NeighborhoodInput,
};
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::{
    api::NeighborhoodBackend,
    error::{ClientError, ClientResult, ValidationError},
};

pub fn validate_neighborhood(input: &NeighborhoodInput) -> Result<(), ValidationError> {
    for (field, value) in [
        ("name", &input.name),
        ("state", &input.state),
        ("city", &input.city),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::required(field));
        }
    }
    if !input.delivery_fee.is_finite() || input.delivery_fee < 0.0 {
        return Err(ValidationError::new("delivery fee", "must not be negative"));
    }
    if let Some(latitude) = input.latitude {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::new("latitude", "must be within [-90, 90]"));
        }
    }
    if let Some(longitude) = input.longitude {
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::new(
                "longitude",
                "must be within [-180, 180]",
            ));
        }
    }
    Ok(())
}

/// Delivery neighborhoods and their fees.
pub struct NeighborhoodDirectory {
    backend: Arc<dyn NeighborhoodBackend>,
    neighborhoods: RwLock<Vec<Neighborhood>>,
}

impl NeighborhoodDirectory {
    pub fn new(backend: Arc<dyn NeighborhoodBackend>) -> Self {
        Self {
            backend,
            neighborhoods: RwLock::new(Vec::new()),
        }
    }

    pub async fn neighborhoods(&self) -> Vec<Neighborhood> {
        self.neighborhoods.read().await.clone()
    }

    pub async fn get(&self, neighborhood_id: NeighborhoodId) -> Option<Neighborhood> {
        self.neighborhoods
            .read()
            .await
            .iter()
            .find(|neighborhood| neighborhood.id == neighborhood_id)
            .cloned()
    }

    pub async fn fee_for(&self, neighborhood_id: NeighborhoodId) -> ClientResult<f64> {
        self.get(neighborhood_id)
            .await
            .map(|neighborhood| neighborhood.delivery_fee)
            .ok_or_else(|| ClientError::NotFound(format!("neighborhood {neighborhood_id}")))
    }

    pub async fn refresh(&self) -> ClientResult<usize> {
        let neighborhoods = self.backend.list_neighborhoods().await.inspect_err(|err| {
            error!(error = %err, "failed to fetch neighborhoods");
        })?;
        let count = neighborhoods.len();
        *self.neighborhoods.write().await = neighborhoods;
        info!(neighborhoods = count, "neighborhoods refreshed");
        Ok(count)
    }

    /// Straight from the backend; does not touch the cached list.
    pub async fn in_city(&self, city: &str) -> ClientResult<Vec<Neighborhood>> {
        if city.trim().is_empty() {
            return Err(ValidationError::required("city").into());
        }
        self.backend.neighborhoods_in_city(city.trim()).await
    }

    pub async fn create(&self, input: NeighborhoodInput) -> ClientResult<Neighborhood> {
        validate_neighborhood(&input)?;
        let neighborhood = self.backend.create_neighborhood(&input).await?;
        info!(
            neighborhood_id = %neighborhood.id,
            name = %neighborhood.name,
            "neighborhood created"
        );
        self.refresh().await?;
        Ok(neighborhood)
    }

    pub async fn update(
        &self,
        neighborhood_id: NeighborhoodId,
        input: NeighborhoodInput,
    ) -> ClientResult<Neighborhood> {
        validate_neighborhood(&input)?;
        let neighborhood = self
            .backend
            .update_neighborhood(neighborhood_id, &input)
            .await?;
        self.refresh().await?;
        Ok(neighborhood)
    }

    pub async fn delete(&self, neighborhood_id: NeighborhoodId) -> ClientResult<()> {
        self.backend.delete_neighborhood(neighborhood_id).await?;
        info!(%neighborhood_id, "neighborhood deleted");
        self.refresh().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NeighborhoodInput {
        NeighborhoodInput {
            name: "Centro".into(),
            state: "SP".into(),
            city: "Campinas".into(),
            delivery_fee: 0.0,
            latitude: Some(-22.9),
            longitude: Some(-47.06),
        }
    }

    #[test]
    fn zero_fee_is_allowed_negative_is_not() {
        let mut neighborhood = input();
        assert!(validate_neighborhood(&neighborhood).is_ok());
        neighborhood.delivery_fee = -1.0;
        assert_eq!(
            validate_neighborhood(&neighborhood)
                .expect_err("negative")
                .field,
            "delivery fee"
        );
    }

    #[test]
    fn coordinates_must_be_on_the_globe() {
        let mut neighborhood = input();
        neighborhood.latitude = Some(123.0);
        assert_eq!(
            validate_neighborhood(&neighborhood)
                .expect_err("latitude")
                .field,
            "latitude"
        );
    }

    #[test]
    fn city_is_required() {
        let mut neighborhood = input();
        neighborhood.city = String::new();
        assert_eq!(
            validate_neighborhood(&neighborhood),
            Err(ValidationError::required("city"))
        );
    }
}
