//! Ordenación de servicios por urgencia
//!
//! HIGH antes que MEDIUM antes que NORMAL; a igual prioridad, el servicio
//! registrado antes va primero. La ordenación es estable.

use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::models::Service;

/// Comparador de urgencia entre dos servicios
pub fn compare_by_urgency(a: &Service, b: &Service) -> Ordering {
    b.priority
        .urgency()
        .cmp(&a.priority.urgency())
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Ordena en sitio cualquier colección de servicios (propios o prestados)
pub fn rank_services<S: Borrow<Service>>(services: &mut [S]) {
    services.sort_by(|a, b| compare_by_urgency(a.borrow(), b.borrow()));
}

pub fn ranked(mut services: Vec<Service>) -> Vec<Service> {
    rank_services(&mut services);
    services
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServicePriority, ServiceStatus};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn service(priority: ServicePriority, minute: i64) -> Service {
        Service {
            id: Uuid::new_v4(),
            hotel_id: Uuid::nil(),
            zone: "Centro".to_string(),
            guest_name: format!("Huésped {}", minute),
            room_number: "1".to_string(),
            bag_count: 1,
            weight: None,
            priority,
            status: ServiceStatus::PendingPickup,
            pickup_agent_id: None,
            delivery_agent_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::minutes(minute),
            pickup_date: None,
            labeling_date: None,
            delivery_date: None,
            delivered_bag_count: None,
            delivery_percentage: None,
            price: None,
            observations: None,
            label_photos: Vec::new(),
            cancellation_reason: None,
            version: 0,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert!(ranked(Vec::new()).is_empty());
    }

    #[test]
    fn test_priority_order_then_chronological() {
        let input = vec![
            service(ServicePriority::Normal, 0),
            service(ServicePriority::Medium, 5),
            service(ServicePriority::High, 10),
            service(ServicePriority::Normal, -5),
            service(ServicePriority::High, 1),
        ];

        let order: Vec<(ServicePriority, i64)> = ranked(input)
            .iter()
            .map(|s| (s.priority, (s.created_at.timestamp() - 1714550400) / 60))
            .collect();

        assert_eq!(
            order,
            vec![
                (ServicePriority::High, 1),
                (ServicePriority::High, 10),
                (ServicePriority::Medium, 5),
                (ServicePriority::Normal, -5),
                (ServicePriority::Normal, 0),
            ]
        );
    }

    #[test]
    fn test_no_lower_priority_precedes_higher() {
        let priorities = [ServicePriority::Normal, ServicePriority::High, ServicePriority::Medium];
        let input: Vec<Service> = (0..30).map(|i| service(priorities[i % 3], i as i64)).collect();

        let result = ranked(input);
        for pair in result.windows(2) {
            assert!(pair[0].priority.urgency() >= pair[1].priority.urgency());
        }
    }

    #[test]
    fn test_ranks_borrowed_services() {
        let a = service(ServicePriority::Normal, 0);
        let b = service(ServicePriority::High, 3);
        let mut refs = vec![&a, &b];
        rank_services(&mut refs);
        assert_eq!(refs[0].id, b.id);
    }
}
