// src/services/catalog.rs

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::models::{Actor, ServiceOffering};
use crate::store::{self, DocumentStore, Filter, Sort};

use super::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct NewService {
    pub name: String,
    pub duration_minutes: u32,
    pub price_cents: i64,
}

pub async fn list_services(store: &dyn DocumentStore) -> Result<Vec<ServiceOffering>, ServiceError> {
    let filter = Filter::new().eq("is_active", json!(true));
    Ok(store::find::<ServiceOffering>(store, &filter, Some(Sort::asc("name"))).await?)
}

pub async fn create_service(
    store: &dyn DocumentStore,
    actor: &Actor,
    new: NewService,
) -> Result<ServiceOffering, ServiceError> {
    if !actor.is_barber() {
        return Err(ServiceError::Forbidden(
            "Only barbers can add services".into(),
        ));
    }

    let name = new.name.trim();
    if name.is_empty() {
        return Err(ServiceError::validation("name is required"));
    }
    if new.duration_minutes == 0 {
        return Err(ServiceError::validation("duration_minutes must be positive"));
    }
    if new.price_cents < 0 {
        return Err(ServiceError::validation("price_cents must not be negative"));
    }

    let service = ServiceOffering {
        id: Uuid::new_v4(),
        name: name.to_string(),
        duration_minutes: new.duration_minutes,
        price_cents: new.price_cents,
        is_active: true,
        created_at: Utc::now(),
    };
    store::insert(store, &service).await?;

    tracing::info!(service_id = %service.id, name = %service.name, "service created");
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn haircut(name: &str) -> NewService {
        NewService {
            name: name.into(),
            duration_minutes: 30,
            price_cents: 2000,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_sorted() {
        let store = MemoryStore::new();
        let barber = Actor::barber(Uuid::new_v4());
        create_service(&store, &barber, haircut("Shave")).await.unwrap();
        create_service(&store, &barber, haircut(" Beard trim ")).await.unwrap();

        let names: Vec<String> = list_services(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Beard trim", "Shave"]);
    }

    #[tokio::test]
    async fn test_create_rules() {
        let store = MemoryStore::new();
        let customer = Actor::customer(Uuid::new_v4());
        assert!(matches!(
            create_service(&store, &customer, haircut("Cut")).await,
            Err(ServiceError::Forbidden(_))
        ));

        let barber = Actor::barber(Uuid::new_v4());
        assert!(matches!(
            create_service(&store, &barber, haircut("  ")).await,
            Err(ServiceError::Validation { .. })
        ));
        let mut zero = haircut("Cut");
        zero.duration_minutes = 0;
        assert!(create_service(&store, &barber, zero).await.is_err());
        assert_eq!(store.count("services"), 0);
    }
}
