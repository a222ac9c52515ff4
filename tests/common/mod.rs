//! Fixtures compartidas por los tests de integración

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use laundry_routing::config::environment::EnvironmentConfig;
use laundry_routing::models::{Agent, Hotel, NewService, Service, ServicePriority};
use laundry_routing::repositories::InMemoryStore;
use laundry_routing::state::AppState;

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::in_memory(EnvironmentConfig::default(), store.clone());
        Self { store, state }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    pub async fn hotel(&self, name: &str, zone: &str) -> Hotel {
        let hotel = Hotel {
            id: Uuid::new_v4(),
            name: name.to_string(),
            zone: zone.to_string(),
            address: None,
            price_per_kg: Decimal::new(250, 2),
        };
        self.store.upsert_hotel(hotel.clone()).await;
        hotel
    }

    pub async fn agent(&self, name: &str, zone: &str) -> Agent {
        let agent = Agent {
            id: Uuid::new_v4(),
            name: name.to_string(),
            zone: zone.to_string(),
            active: true,
        };
        self.store.upsert_agent(agent.clone()).await;
        agent
    }

    pub async fn service(
        &self,
        hotel: &Hotel,
        agent: Option<&Agent>,
        priority: ServicePriority,
        bag_count: i32,
    ) -> Service {
        self.state
            .workflow
            .register_service(NewService {
                hotel_id: hotel.id,
                guest_name: "Carmen Ruiz".to_string(),
                room_number: "214".to_string(),
                bag_count,
                priority: Some(priority),
                observations: None,
                pickup_agent_id: agent.map(|agent| agent.id),
            })
            .await
            .unwrap()
    }
}
