//! Ciclo de vida de la ruta
//!
//! PENDING → IN_PROGRESS → COMPLETED, sin saltos ni vuelta atrás. Cada
//! operación valida antes de mutar: si falla, la ruta queda intacta. El orden
//! de las paradas nunca cambia; solo cambian sus marcas de completado.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::models::{CompletionKind, Route, RouteEventKind, RouteStatus, ServiceStatus, Stop};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Datos opcionales al cerrar una parada a mano
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopCompletion {
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Cierre administrativo de una ruta con paradas pendientes
#[derive(Debug, Clone, Deserialize)]
pub struct AdminOverride {
    pub admin_id: Uuid,
    pub reason: String,
}

pub fn start(route: &mut Route, agent_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
    if route.status != RouteStatus::Pending {
        return Err(AppError::RouteNotPending { route_id: route.id });
    }
    if route.agent_id != agent_id {
        return Err(AppError::NotRouteOwner { route_id: route.id, agent_id });
    }

    route.status = RouteStatus::InProgress;
    route.started_at = Some(now);
    route.record(now, RouteEventKind::Started { agent_id });

    info!("🚚 Ruta {} iniciada por {}", route.route_number, route.agent_name);
    Ok(())
}

/// Cierra la parada a mano. Devuelve `false` si ya estaba cerrada: repetir
/// la llamada no cambia la ruta ni añade eventos.
pub fn mark_stop_complete(
    route: &mut Route,
    stop_id: Uuid,
    completion: StopCompletion,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    if route.status != RouteStatus::InProgress {
        return Err(AppError::RouteNotInProgress { route_id: route.id });
    }

    let route_id = route.id;
    let stop = route
        .stops
        .iter_mut()
        .find(|stop| stop.id == stop_id)
        .ok_or_else(|| not_found_error("Stop", stop_id))?;

    if stop.completed {
        return Ok(false);
    }

    stop.completed = true;
    stop.completed_at = Some(completion.completed_at.unwrap_or(now));
    if completion.notes.is_some() {
        stop.notes = completion.notes;
    }
    route.record(now, RouteEventKind::StopCompleted { stop_id, automatic: false });

    info!("✅ Parada {} de la ruta {} completada", stop_id, route_id);
    Ok(true)
}

/// Una parada está cumplida cuando ninguna recogida sigue pendiente y todas
/// las entregas están completadas o canceladas
pub fn stop_is_satisfied(stop: &Stop, statuses: &HashMap<Uuid, ServiceStatus>) -> bool {
    let pickups_done = stop
        .pickups
        .iter()
        .all(|id| statuses.get(id).map_or(false, |status| *status != ServiceStatus::PendingPickup));
    let deliveries_done = stop.deliveries.iter().all(|id| {
        statuses
            .get(id)
            .map_or(false, |status| matches!(status, ServiceStatus::Completed | ServiceStatus::Cancelled))
    });
    pickups_done && deliveries_done
}

/// Reevalúa una parada tras un cambio de estado de sus servicios.
/// Devuelve `true` si la parada pasó a completada. Nunca la reabre.
pub fn reevaluate_stop(
    route: &mut Route,
    stop_id: Uuid,
    statuses: &HashMap<Uuid, ServiceStatus>,
    now: DateTime<Utc>,
) -> AppResult<bool> {
    if route.status != RouteStatus::InProgress {
        return Ok(false);
    }

    let stop = route
        .stops
        .iter_mut()
        .find(|stop| stop.id == stop_id)
        .ok_or_else(|| not_found_error("Stop", stop_id))?;

    if stop.completed || !stop_is_satisfied(stop, statuses) {
        return Ok(false);
    }

    stop.completed = true;
    stop.completed_at = Some(now);
    route.record(now, RouteEventKind::StopCompleted { stop_id, automatic: true });
    Ok(true)
}

pub fn complete(route: &mut Route, now: DateTime<Utc>) -> AppResult<()> {
    if route.status != RouteStatus::InProgress {
        return Err(AppError::RouteNotInProgress { route_id: route.id });
    }

    let pending_stops = route.pending_stops();
    if !pending_stops.is_empty() {
        return Err(AppError::RouteIncomplete { route_id: route.id, pending_stops });
    }

    route.status = RouteStatus::Completed;
    route.ended_at = Some(now);
    route.completion_kind = Some(CompletionKind::Organic);
    route.record(now, RouteEventKind::Completed);

    info!("🏁 Ruta {} completada", route.route_number);
    Ok(())
}

/// Cierre forzado: se registra quién lo hizo, por qué y qué paradas quedaron abiertas
pub fn force_complete(route: &mut Route, admin: AdminOverride, now: DateTime<Utc>) -> AppResult<()> {
    if route.status != RouteStatus::InProgress {
        return Err(AppError::RouteNotInProgress { route_id: route.id });
    }
    if admin.reason.trim().is_empty() {
        return Err(AppError::MissingRequiredField { field: "reason" });
    }

    let pending_stops = route.pending_stops();
    route.status = RouteStatus::Completed;
    route.ended_at = Some(now);
    route.completion_kind = Some(CompletionKind::AdminOverride {
        admin_id: admin.admin_id,
        reason: admin.reason.clone(),
    });
    route.record(
        now,
        RouteEventKind::ForceCompleted {
            admin_id: admin.admin_id,
            reason: admin.reason,
            pending_stops: pending_stops.clone(),
        },
    );

    tracing::warn!(
        "⚠️ Ruta {} cerrada por administrador {} con {} paradas pendientes",
        route.route_number,
        admin.admin_id,
        pending_stops.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServicePriority;
    use chrono::{NaiveDate, NaiveTime};

    fn route_with_stops(count: usize) -> Route {
        let stops = (0..count)
            .map(|i| Stop {
                id: Uuid::new_v4(),
                sequence: i as i32 + 1,
                hotel_id: Uuid::new_v4(),
                hotel_name: format!("Hotel {}", i),
                pickups: vec![Uuid::new_v4()],
                deliveries: Vec::new(),
                priority: ServicePriority::Normal,
                eta: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                completed: false,
                completed_at: None,
                notes: None,
            })
            .collect();

        Route {
            id: Uuid::new_v4(),
            route_number: 1,
            agent_id: Uuid::new_v4(),
            agent_name: "Lucía".to_string(),
            route_date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            status: RouteStatus::Pending,
            estimated_duration_minutes: 45 * count as i32,
            stops,
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
            total_pickups: count as i32,
            total_deliveries: 0,
            completion_kind: None,
            audit_trail: Vec::new(),
        }
    }

    #[test]
    fn test_start_requires_pending_and_owner() {
        let mut route = route_with_stops(1);
        let intruder = Uuid::new_v4();
        assert!(matches!(start(&mut route, intruder, Utc::now()), Err(AppError::NotRouteOwner { .. })));
        assert_eq!(route.status, RouteStatus::Pending);

        let owner = route.agent_id;
        start(&mut route, owner, Utc::now()).unwrap();
        assert_eq!(route.status, RouteStatus::InProgress);
        assert!(route.started_at.is_some());

        assert!(matches!(start(&mut route, owner, Utc::now()), Err(AppError::RouteNotPending { .. })));
    }

    #[test]
    fn test_stop_completion_requires_in_progress() {
        let mut route = route_with_stops(1);
        let stop_id = route.stops[0].id;
        let result = mark_stop_complete(&mut route, stop_id, StopCompletion::default(), Utc::now());
        assert!(matches!(result, Err(AppError::RouteNotInProgress { .. })));
    }

    #[test]
    fn test_complete_with_open_stop_fails_unless_forced() {
        let mut route = route_with_stops(2);
        let owner = route.agent_id;
        start(&mut route, owner, Utc::now()).unwrap();

        let first = route.stops[0].id;
        mark_stop_complete(&mut route, first, StopCompletion::default(), Utc::now()).unwrap();

        match complete(&mut route, Utc::now()) {
            Err(AppError::RouteIncomplete { pending_stops, .. }) => assert_eq!(pending_stops, vec![route.stops[1].id]),
            other => panic!("expected RouteIncomplete, got {:?}", other),
        }
        assert_eq!(route.status, RouteStatus::InProgress);

        let admin_id = Uuid::new_v4();
        force_complete(
            &mut route,
            AdminOverride { admin_id, reason: "Hotel cerrado".to_string() },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(route.status, RouteStatus::Completed);
        assert!(matches!(route.completion_kind, Some(CompletionKind::AdminOverride { .. })));
        assert!(route
            .audit_trail
            .iter()
            .any(|event| matches!(event.kind, RouteEventKind::ForceCompleted { .. })));
    }

    #[test]
    fn test_organic_completion_is_recorded() {
        let mut route = route_with_stops(1);
        let owner = route.agent_id;
        start(&mut route, owner, Utc::now()).unwrap();
        let stop_id = route.stops[0].id;
        mark_stop_complete(&mut route, stop_id, StopCompletion::default(), Utc::now()).unwrap();

        complete(&mut route, Utc::now()).unwrap();
        assert_eq!(route.completion_kind, Some(CompletionKind::Organic));
        assert!(route.ended_at.is_some());
    }

    #[test]
    fn test_reevaluate_marks_stop_when_services_advance() {
        let mut route = route_with_stops(1);
        let owner = route.agent_id;
        start(&mut route, owner, Utc::now()).unwrap();

        let stop_id = route.stops[0].id;
        let pickup = route.stops[0].pickups[0];

        let mut statuses = HashMap::from([(pickup, ServiceStatus::PendingPickup)]);
        assert!(!reevaluate_stop(&mut route, stop_id, &statuses, Utc::now()).unwrap());

        statuses.insert(pickup, ServiceStatus::PickedUp);
        assert!(reevaluate_stop(&mut route, stop_id, &statuses, Utc::now()).unwrap());
        assert!(route.stops[0].completed);
    }

    #[test]
    fn test_stop_order_is_unchanged_by_completion() {
        let mut route = route_with_stops(3);
        let order: Vec<Uuid> = route.stops.iter().map(|s| s.id).collect();
        let owner = route.agent_id;
        start(&mut route, owner, Utc::now()).unwrap();
        mark_stop_complete(&mut route, order[2], StopCompletion::default(), Utc::now()).unwrap();

        let after: Vec<Uuid> = route.stops.iter().map(|s| s.id).collect();
        assert_eq!(order, after);
    }

    #[test]
    fn test_completing_a_closed_stop_changes_nothing() {
        let mut route = route_with_stops(1);
        let owner = route.agent_id;
        start(&mut route, owner, Utc::now()).unwrap();
        let stop_id = route.stops[0].id;

        assert!(mark_stop_complete(&mut route, stop_id, StopCompletion::default(), Utc::now()).unwrap());
        let snapshot = route.clone();

        let again = StopCompletion { notes: Some("otra nota".to_string()), completed_at: None };
        assert!(!mark_stop_complete(&mut route, stop_id, again, Utc::now()).unwrap());
        assert_eq!(route.audit_trail.len(), snapshot.audit_trail.len());
        assert_eq!(route.stops[0].notes, snapshot.stops[0].notes);
        assert_eq!(route.stops[0].completed_at, snapshot.stops[0].completed_at);
    }
}
