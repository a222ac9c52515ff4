//! Constructor de rutas
//!
//! Agrupa el trabajo reclamable de una fecha en rutas, una por repartidor:
//! primero por repartidor, luego por hotel (una parada por hotel). Las paradas
//! se ordenan por su prioridad derivada y, dentro de cada parada, recogidas y
//! entregas pasan por el ordenador de prioridad.
//!
//! Es una función pura sobre datos ya cargados: mismas entradas, misma
//! agrupación y mismo orden. La E/S la hace `RoutePlanningService`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::models::{Agent, Hotel, Route, RouteEventKind, RouteStatus, Service, ServicePriority, Stop};
use crate::services::priority_ranker::rank_services;
use crate::utils::errors::{AppError, AppResult};

/// Registro omitido durante la construcción (la construcción continúa)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DataIntegrityWarning {
    UnknownHotel { service_id: Uuid, hotel_id: Uuid },
    UnknownAgent { service_id: Uuid, agent_id: Uuid },
}

/// Datos ya resueltos que necesita el constructor
pub struct PlanningInput<'a> {
    pub date: NaiveDate,
    pub services: &'a [Service],
    pub hotels: &'a HashMap<Uuid, Hotel>,
    pub agents: &'a HashMap<Uuid, Agent>,
    pub existing_routes: &'a [Route],
}

#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub routes: Vec<Route>,
    pub warnings: Vec<DataIntegrityWarning>,
    /// Repartidores omitidos porque ya tienen ruta pendiente o en curso
    pub covered_agents: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub enum BuildResult {
    Planned(RoutePlan),
    /// Nada que planificar; no es un error
    NoEligibleWork { warnings: Vec<DataIntegrityWarning> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WorkKind {
    Pickup,
    Delivery,
}

struct HotelWork<'a> {
    hotel: &'a Hotel,
    pickups: Vec<&'a Service>,
    deliveries: Vec<&'a Service>,
}

struct AgentWork<'a> {
    agent: &'a Agent,
    hotels: Vec<HotelWork<'a>>,
}

pub struct RouteBuilder {
    config: PlanningConfig,
}

impl RouteBuilder {
    pub fn new(config: PlanningConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, input: &PlanningInput<'_>, now: DateTime<Utc>) -> AppResult<BuildResult> {
        let mut warnings = Vec::new();
        let mut work: Vec<AgentWork<'_>> = Vec::new();
        let mut agent_index: HashMap<Uuid, usize> = HashMap::new();

        for (service, agent_id, kind) in eligible_services(input) {
            let hotel = match input.hotels.get(&service.hotel_id) {
                Some(hotel) => hotel,
                None => {
                    warn!(
                        "⚠️ Servicio {} referencia un hotel inexistente ({}), se omite",
                        service.id, service.hotel_id
                    );
                    warnings.push(DataIntegrityWarning::UnknownHotel {
                        service_id: service.id,
                        hotel_id: service.hotel_id,
                    });
                    continue;
                }
            };

            let agent = match input.agents.get(&agent_id) {
                Some(agent) => agent,
                None => {
                    warn!(
                        "⚠️ Servicio {} asignado a un repartidor inactivo o desconocido ({}), se omite",
                        service.id, agent_id
                    );
                    warnings.push(DataIntegrityWarning::UnknownAgent { service_id: service.id, agent_id });
                    continue;
                }
            };

            let slot = *agent_index.entry(agent.id).or_insert_with(|| {
                work.push(AgentWork { agent, hotels: Vec::new() });
                work.len() - 1
            });
            let agent_work = &mut work[slot];

            let hotel_work = match agent_work.hotels.iter().position(|h| h.hotel.id == hotel.id) {
                Some(position) => &mut agent_work.hotels[position],
                None => {
                    agent_work.hotels.push(HotelWork { hotel, pickups: Vec::new(), deliveries: Vec::new() });
                    let last = agent_work.hotels.len() - 1;
                    &mut agent_work.hotels[last]
                }
            };

            match kind {
                WorkKind::Pickup => hotel_work.pickups.push(service),
                WorkKind::Delivery => hotel_work.deliveries.push(service),
            }
        }

        if work.is_empty() {
            info!("📭 Sin trabajo elegible para {}", input.date);
            return Ok(BuildResult::NoEligibleWork { warnings });
        }

        let active_agents: HashSet<Uuid> = input
            .existing_routes
            .iter()
            .filter(|route| route.route_date == input.date && route.status.is_active())
            .map(|route| route.agent_id)
            .collect();

        let (covered, pending): (Vec<AgentWork<'_>>, Vec<AgentWork<'_>>) =
            work.into_iter().partition(|w| active_agents.contains(&w.agent.id));
        let covered_agents: Vec<Uuid> = covered.iter().map(|w| w.agent.id).collect();

        if pending.is_empty() {
            return Err(AppError::RoutesAlreadyExist { date: input.date, agents: covered_agents });
        }

        let mut next_number = input
            .existing_routes
            .iter()
            .filter(|route| route.route_date == input.date)
            .map(|route| route.route_number)
            .max()
            .unwrap_or(0)
            + 1;

        let mut routes = Vec::with_capacity(pending.len());
        for agent_work in pending {
            if let Some(route) = self.synthesize_route(input.date, next_number, agent_work, now) {
                next_number += 1;
                routes.push(route);
            }
        }

        info!(
            "🗺️ {} rutas generadas para {} ({} repartidores ya cubiertos, {} avisos)",
            routes.len(),
            input.date,
            covered_agents.len(),
            warnings.len()
        );

        Ok(BuildResult::Planned(RoutePlan { routes, warnings, covered_agents }))
    }

    fn synthesize_route(
        &self,
        date: NaiveDate,
        route_number: i32,
        agent_work: AgentWork<'_>,
        now: DateTime<Utc>,
    ) -> Option<Route> {
        let mut stops: Vec<Stop> = agent_work
            .hotels
            .into_iter()
            .filter(|h| !h.pickups.is_empty() || !h.deliveries.is_empty())
            .map(|mut h| {
                rank_services(&mut h.pickups);
                rank_services(&mut h.deliveries);

                let priority = h
                    .pickups
                    .iter()
                    .chain(h.deliveries.iter())
                    .map(|service| service.priority)
                    .max_by_key(|priority| priority.urgency())
                    .unwrap_or(ServicePriority::Normal);

                Stop {
                    id: Uuid::new_v4(),
                    sequence: 0,
                    hotel_id: h.hotel.id,
                    hotel_name: h.hotel.name.clone(),
                    pickups: h.pickups.iter().map(|service| service.id).collect(),
                    deliveries: h.deliveries.iter().map(|service| service.id).collect(),
                    priority,
                    eta: self.config.day_start,
                    completed: false,
                    completed_at: None,
                    notes: None,
                }
            })
            .collect();

        if stops.is_empty() {
            return None;
        }

        // Estable: a igual prioridad se respeta el orden de aparición del hotel
        stops.sort_by(|a, b| b.priority.urgency().cmp(&a.priority.urgency()));
        for (index, stop) in stops.iter_mut().enumerate() {
            stop.sequence = index as i32 + 1;
            stop.eta = self.config.eta_for_stop(index);
        }

        let total_pickups = stops.iter().map(|stop| stop.pickups.len() as i32).sum();
        let total_deliveries = stops.iter().map(|stop| stop.deliveries.len() as i32).sum();

        let mut route = Route {
            id: Uuid::new_v4(),
            route_number,
            agent_id: agent_work.agent.id,
            agent_name: agent_work.agent.name.clone(),
            route_date: date,
            status: RouteStatus::Pending,
            estimated_duration_minutes: self.config.estimated_duration_minutes(stops.len()),
            stops,
            created_at: now,
            started_at: None,
            ended_at: None,
            total_pickups,
            total_deliveries,
            completion_kind: None,
            audit_trail: Vec::new(),
        };
        route.record(now, RouteEventKind::Created);
        Some(route)
    }
}

/// Servicios elegibles con el repartidor que les corresponde, en orden
/// cronológico de registro (desempate por id para que sea determinista)
fn eligible_services<'a>(input: &PlanningInput<'a>) -> Vec<(&'a Service, Uuid, WorkKind)> {
    let mut services: Vec<&'a Service> = input
        .services
        .iter()
        .filter(|service| service.registered_on() <= input.date)
        .collect();
    services.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    services
        .into_iter()
        .filter_map(|service| {
            if service.is_pickup_candidate() {
                service.pickup_agent_id.map(|agent_id| (service, agent_id, WorkKind::Pickup))
            } else if service.is_delivery_candidate() {
                service
                    .resolved_delivery_agent()
                    .map(|agent_id| (service, agent_id, WorkKind::Delivery))
            } else {
                None
            }
        })
        .collect()
}
