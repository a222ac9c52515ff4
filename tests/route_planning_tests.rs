mod common;

use rust_decimal::Decimal;
use uuid::Uuid;

use common::Fixture;
use laundry_routing::models::{
    CompletionKind, Route, RouteEventKind, RouteStatus, ServicePriority, ServiceStatus,
};
use laundry_routing::repositories::{RouteRepository, ServiceRepository};
use laundry_routing::services::route_builder::DataIntegrityWarning;
use laundry_routing::services::route_lifecycle::{AdminOverride, StopCompletion};
use laundry_routing::services::service_lifecycle::TransitionRequest;
use laundry_routing::services::PlanningOutcome;
use laundry_routing::utils::errors::AppError;

fn planned_routes(outcome: PlanningOutcome) -> Vec<Route> {
    match outcome {
        PlanningOutcome::Planned { routes, .. } => routes,
        other => panic!("expected planned routes, got {:?}", other),
    }
}

fn membership(route: &Route) -> Vec<(Uuid, Vec<Uuid>, Vec<Uuid>)> {
    route
        .stops
        .iter()
        .map(|stop| (stop.hotel_id, stop.pickups.clone(), stop.deliveries.clone()))
        .collect()
}

/// Lleva un servicio recién recogido hasta READY_FOR_DELIVERY
async fn make_ready(fixture: &Fixture, service_id: Uuid) {
    let workflow = &fixture.state.workflow;
    workflow.transition(service_id, TransitionRequest::pickup(Decimal::new(30, 1))).await.unwrap();
    workflow
        .transition(service_id, TransitionRequest::label(vec!["etiqueta-1.jpg".to_string()]))
        .await
        .unwrap();
    workflow.transition(service_id, TransitionRequest::to(ServiceStatus::InProcess)).await.unwrap();
    workflow
        .transition(service_id, TransitionRequest::to(ServiceStatus::ReadyForDelivery))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unassigned_pickup_is_claimable_within_zone() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let sur = fixture.agent("Pablo", "Sur").await;
    let norte = fixture.agent("Irene", "Norte").await;
    let service = fixture.service(&hotel, None, ServicePriority::Normal, 3).await;

    let claimable = fixture.state.workflow.claimable_services(sur.id).await.unwrap();
    assert_eq!(claimable.iter().map(|s| s.id).collect::<Vec<_>>(), vec![service.id]);
    assert!(fixture.state.workflow.claimable_services(norte.id).await.unwrap().is_empty());

    let forbidden = fixture.state.workflow.claim_service(service.id, norte.id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

    let claimed = fixture.state.workflow.claim_service(service.id, sur.id).await.unwrap();
    assert_eq!(claimed.pickup_agent_id, Some(sur.id));
    assert_eq!(claimed.status, ServiceStatus::PendingPickup);
    assert!(fixture.state.workflow.claimable_services(sur.id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_claims_have_one_winner() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let first = fixture.agent("Pablo", "Sur").await;
    let second = fixture.agent("Nuria", "Sur").await;
    let service = fixture.service(&hotel, None, ServicePriority::Normal, 2).await;

    // Dos tareas en hilos distintos: el perdedor cae en la comprobación previa
    // o en el compare-and-set, y en ambos casos recibe Conflict
    let claims: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|agent_id| {
            let workflow = fixture.state.workflow.clone();
            let service_id = service.id;
            tokio::spawn(async move { workflow.claim_service(service_id, agent_id).await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for claim in claims {
        outcomes.push(claim.await.unwrap());
    }
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(outcomes.iter().filter(|r| matches!(r, Err(AppError::Conflict(_)))).count(), 1);

    let winner = outcomes.iter().find_map(|r| r.as_ref().ok()).unwrap();
    let stored = fixture.state.workflow.get_service(service.id).await.unwrap();
    assert_eq!(stored.pickup_agent_id, winner.pickup_agent_id);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_concurrent_saves_with_same_expected_status() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    let service = fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 2).await;

    let mut cancelled = service.clone();
    cancelled.status = ServiceStatus::Cancelled;
    cancelled.cancellation_reason = Some("Huésped se fue".to_string());
    let mut picked = service.clone();
    picked.status = ServiceStatus::PickedUp;
    picked.weight = Some(Decimal::ONE);

    let store = fixture.store.clone();
    let (a, b) = tokio::join!(
        store.save_service(&cancelled, ServiceStatus::PendingPickup),
        store.save_service(&picked, ServiceStatus::PendingPickup)
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(outcomes.iter().filter(|r| matches!(r, Err(AppError::Conflict(_)))).count(), 1);
}

#[tokio::test]
async fn test_pickup_without_weight_is_rejected() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    let service = fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 2).await;

    let result = fixture
        .state
        .workflow
        .transition(service.id, TransitionRequest::to(ServiceStatus::PickedUp))
        .await;
    assert!(matches!(result, Err(AppError::MissingRequiredField { field: "weight" })));

    let stored = fixture.state.workflow.get_service(service.id).await.unwrap();
    assert_eq!(stored.status, ServiceStatus::PendingPickup);
}

#[tokio::test]
async fn test_route_orders_stops_by_priority() {
    let fixture = Fixture::new();
    let hotel_x = fixture.hotel("Hotel X", "Centro").await;
    let hotel_y = fixture.hotel("Hotel Y", "Centro").await;
    let agent = fixture.agent("Agente 7", "Centro").await;

    // Hotel Y aparece primero, pero Hotel X tiene un servicio HIGH
    let medium = fixture.service(&hotel_y, Some(&agent), ServicePriority::Medium, 1).await;
    let normal = fixture.service(&hotel_x, Some(&agent), ServicePriority::Normal, 1).await;
    let high = fixture.service(&hotel_x, Some(&agent), ServicePriority::High, 1).await;

    let outcome = fixture.state.planning.generate_routes(fixture.today()).await.unwrap();
    let routes = planned_routes(outcome);
    assert_eq!(routes.len(), 1);

    let route = &routes[0];
    assert_eq!(route.agent_id, agent.id);
    assert_eq!(route.route_number, 1);
    assert_eq!(route.status, RouteStatus::Pending);
    assert_eq!(route.stops[0].hotel_id, hotel_x.id);
    assert_eq!(route.stops[0].pickups, vec![high.id, normal.id]);
    assert_eq!(route.stops[1].hotel_id, hotel_y.id);
    assert_eq!(route.stops[1].pickups, vec![medium.id]);
    assert_eq!(route.estimated_duration_minutes, 90);
}

#[tokio::test]
async fn test_nothing_to_plan_is_not_an_error() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    fixture.service(&hotel, None, ServicePriority::High, 1).await;

    let outcome = fixture.state.planning.generate_routes(fixture.today()).await.unwrap();
    assert!(matches!(outcome, PlanningOutcome::NoEligibleWork { .. }));
}

#[tokio::test]
async fn test_second_generation_conflicts_and_regeneration_is_stable() {
    let fixture = Fixture::new();
    let hotel_a = fixture.hotel("Hotel Mar", "Norte").await;
    let hotel_b = fixture.hotel("Hotel Río", "Norte").await;
    let agent = fixture.agent("Irene", "Norte").await;
    fixture.service(&hotel_a, Some(&agent), ServicePriority::Normal, 2).await;
    fixture.service(&hotel_b, Some(&agent), ServicePriority::Normal, 1).await;
    fixture.service(&hotel_a, Some(&agent), ServicePriority::Medium, 4).await;

    let date = fixture.today();
    let first = planned_routes(fixture.state.planning.generate_routes(date).await.unwrap());

    let again = fixture.state.planning.generate_routes(date).await;
    match again {
        Err(AppError::RoutesAlreadyExist { agents, .. }) => assert_eq!(agents, vec![agent.id]),
        other => panic!("expected RoutesAlreadyExist, got {:?}", other),
    }

    let regenerated = planned_routes(fixture.state.planning.regenerate_routes(date).await.unwrap());
    assert_eq!(regenerated.len(), 1);
    assert_eq!(membership(&first[0]), membership(&regenerated[0]));

    let stored = fixture.state.planning.list_routes(&Default::default()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, regenerated[0].id);
}

#[tokio::test]
async fn test_uncovered_agents_are_topped_up() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let pablo = fixture.agent("Pablo", "Sur").await;
    let nuria = fixture.agent("Nuria", "Sur").await;
    fixture.service(&hotel, Some(&pablo), ServicePriority::Normal, 1).await;

    let date = fixture.today();
    planned_routes(fixture.state.planning.generate_routes(date).await.unwrap());

    fixture.service(&hotel, Some(&nuria), ServicePriority::Normal, 1).await;
    match fixture.state.planning.generate_routes(date).await.unwrap() {
        PlanningOutcome::Planned { routes, covered_agents, .. } => {
            assert_eq!(routes.len(), 1);
            assert_eq!(routes[0].agent_id, nuria.id);
            assert_eq!(routes[0].route_number, 2);
            assert_eq!(covered_agents, vec![pablo.id]);
        }
        other => panic!("expected planned routes, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_generation_creates_routes_once() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 1).await;

    let date = fixture.today();
    let planning = fixture.state.planning.clone();
    let (a, b) = tokio::join!(planning.generate_routes(date), planning.generate_routes(date));

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        outcomes.iter().filter(|r| matches!(r, Err(AppError::RoutesAlreadyExist { .. }))).count(),
        1
    );
    assert_eq!(fixture.state.planning.list_routes(&Default::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pickup_completes_stop_and_route_closes_organically() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    let first = fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 2).await;
    let second = fixture.service(&hotel, Some(&agent), ServicePriority::High, 1).await;

    let routes = planned_routes(fixture.state.planning.generate_routes(fixture.today()).await.unwrap());
    let route_id = routes[0].id;

    let intruder = fixture.agent("Irene", "Sur").await;
    let result = fixture.state.execution.start_route(route_id, intruder.id).await;
    assert!(matches!(result, Err(AppError::NotRouteOwner { .. })));

    fixture.state.execution.start_route(route_id, agent.id).await.unwrap();

    let workflow = &fixture.state.workflow;
    let picked = workflow.transition(first.id, TransitionRequest::pickup(Decimal::new(30, 1))).await.unwrap();
    assert_eq!(picked.price, Some(Decimal::new(750, 2)));

    let route = fixture.state.planning.get_route(route_id).await.unwrap();
    assert!(!route.stops[0].completed, "one pickup still pending");

    workflow.transition(second.id, TransitionRequest::pickup(Decimal::ONE)).await.unwrap();
    let route = fixture.state.planning.get_route(route_id).await.unwrap();
    assert!(route.stops[0].completed);
    assert!(route
        .audit_trail
        .iter()
        .any(|event| event.kind == RouteEventKind::StopCompleted { stop_id: route.stops[0].id, automatic: true }));

    let completed = fixture.state.execution.complete_route(route_id, None).await.unwrap();
    assert_eq!(completed.status, RouteStatus::Completed);
    assert_eq!(completed.completion_kind, Some(CompletionKind::Organic));
}

#[tokio::test]
async fn test_open_stop_blocks_completion_unless_overridden() {
    let fixture = Fixture::new();
    let hotel_a = fixture.hotel("Hotel Mar", "Norte").await;
    let hotel_b = fixture.hotel("Hotel Río", "Norte").await;
    let agent = fixture.agent("Irene", "Norte").await;
    fixture.service(&hotel_a, Some(&agent), ServicePriority::High, 1).await;
    fixture.service(&hotel_b, Some(&agent), ServicePriority::Normal, 1).await;

    let routes = planned_routes(fixture.state.planning.generate_routes(fixture.today()).await.unwrap());
    let route_id = routes[0].id;
    let execution = &fixture.state.execution;

    let not_started = execution.complete_route(route_id, None).await;
    assert!(matches!(not_started, Err(AppError::RouteNotInProgress { .. })));

    execution.start_route(route_id, agent.id).await.unwrap();
    let first_stop = routes[0].stops[0].id;
    execution
        .complete_stop(route_id, first_stop, StopCompletion { notes: Some("Recepción".to_string()), completed_at: None })
        .await
        .unwrap();

    match execution.complete_route(route_id, None).await {
        Err(AppError::RouteIncomplete { pending_stops, .. }) => assert_eq!(pending_stops, vec![routes[0].stops[1].id]),
        other => panic!("expected RouteIncomplete, got {:?}", other),
    }

    let admin_id = Uuid::new_v4();
    let forced = execution
        .complete_route(route_id, Some(AdminOverride { admin_id, reason: "Hotel cerrado".to_string() }))
        .await
        .unwrap();
    assert_eq!(forced.status, RouteStatus::Completed);
    assert_eq!(
        forced.completion_kind,
        Some(CompletionKind::AdminOverride { admin_id, reason: "Hotel cerrado".to_string() })
    );
    assert!(!forced.stops[1].completed);
}

#[tokio::test]
async fn test_started_route_cannot_start_again() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 1).await;

    let date = fixture.today();
    let routes = planned_routes(fixture.state.planning.generate_routes(date).await.unwrap());
    fixture.state.execution.start_route(routes[0].id, agent.id).await.unwrap();

    let again = fixture.state.execution.start_route(routes[0].id, agent.id).await;
    assert!(matches!(again, Err(AppError::RouteNotPending { .. })));
}

#[tokio::test]
async fn test_partial_then_final_delivery() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    let service = fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 10).await;
    make_ready(&fixture, service.id).await;

    let workflow = &fixture.state.workflow;
    let partial = workflow.register_delivery(service.id, 6, None, None).await.unwrap();
    assert_eq!(partial.status, ServiceStatus::PartialDelivery);
    assert_eq!(partial.delivered_bag_count, Some(6));
    assert_eq!(partial.remaining_bags(), 4);
    assert_eq!(partial.delivery_percentage, Some(60));

    let completed = workflow.register_delivery(service.id, 4, None, None).await.unwrap();
    assert_eq!(completed.status, ServiceStatus::Completed);
    assert_eq!(completed.delivered_bag_count, Some(completed.bag_count));
    assert_eq!(completed.delivery_percentage, Some(100));
}

#[tokio::test]
async fn test_delivery_route_falls_back_to_pickup_agent() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    let service = fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 2).await;
    make_ready(&fixture, service.id).await;

    let routes = planned_routes(fixture.state.planning.generate_routes(fixture.today()).await.unwrap());
    assert_eq!(routes[0].agent_id, agent.id);
    assert_eq!(routes[0].stops[0].deliveries, vec![service.id]);
    assert_eq!(routes[0].total_deliveries, 1);

    fixture.state.execution.start_route(routes[0].id, agent.id).await.unwrap();
    fixture.state.workflow.register_delivery(service.id, 2, None, Some(agent.id)).await.unwrap();

    let route = fixture.state.planning.get_route(routes[0].id).await.unwrap();
    assert!(route.stops[0].completed);
}

#[tokio::test]
async fn test_route_survives_json_round_trip() {
    let fixture = Fixture::new();
    let hotel_a = fixture.hotel("Hotel Mar", "Norte").await;
    let hotel_b = fixture.hotel("Hotel Río", "Norte").await;
    let agent = fixture.agent("Irene", "Norte").await;
    fixture.service(&hotel_a, Some(&agent), ServicePriority::Normal, 1).await;
    fixture.service(&hotel_b, Some(&agent), ServicePriority::High, 1).await;

    let routes = planned_routes(fixture.state.planning.generate_routes(fixture.today()).await.unwrap());
    let route_id = routes[0].id;
    fixture.state.execution.start_route(route_id, agent.id).await.unwrap();
    let stop_id = routes[0].stops[1].id;
    let route = fixture
        .state
        .execution
        .complete_stop(route_id, stop_id, StopCompletion::default())
        .await
        .unwrap();

    let json = serde_json::to_string(&route).unwrap();
    let reloaded: Route = serde_json::from_str(&json).unwrap();
    assert_eq!(reloaded, route);
    assert_eq!(
        reloaded.stops.iter().map(|s| (s.id, s.completed)).collect::<Vec<_>>(),
        route.stops.iter().map(|s| (s.id, s.completed)).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_oversized_delivery_is_rejected() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    let service = fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 10).await;
    make_ready(&fixture, service.id).await;

    let workflow = &fixture.state.workflow;
    workflow.register_delivery(service.id, 6, None, None).await.unwrap();

    let result = workflow.register_delivery(service.id, i32::MAX, None, None).await;
    assert!(matches!(result, Err(AppError::InvalidField { field: "delivered_bag_count", .. })));

    let stored = workflow.get_service(service.id).await.unwrap();
    assert_eq!(stored.status, ServiceStatus::PartialDelivery);
    assert_eq!(stored.delivered_bag_count, Some(6));
}

#[tokio::test]
async fn test_cancelled_delivery_satisfies_its_stop() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    let service = fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 2).await;
    make_ready(&fixture, service.id).await;

    let routes = planned_routes(fixture.state.planning.generate_routes(fixture.today()).await.unwrap());
    assert_eq!(routes[0].stops[0].deliveries, vec![service.id]);
    fixture.state.execution.start_route(routes[0].id, agent.id).await.unwrap();

    fixture
        .state
        .workflow
        .transition(service.id, TransitionRequest::cancel("Huésped rechaza la entrega"))
        .await
        .unwrap();

    let route = fixture.state.planning.get_route(routes[0].id).await.unwrap();
    assert!(route.stops[0].completed);
    assert!(route
        .audit_trail
        .iter()
        .any(|event| event.kind == RouteEventKind::StopCompleted { stop_id: route.stops[0].id, automatic: true }));

    let completed = fixture.state.execution.complete_route(route.id, None).await.unwrap();
    assert_eq!(completed.completion_kind, Some(CompletionKind::Organic));
}

#[tokio::test]
async fn test_route_removed_by_regeneration_is_not_written_back() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    fixture.service(&hotel, Some(&agent), ServicePriority::Normal, 1).await;

    let date = fixture.today();
    let routes = planned_routes(fixture.state.planning.generate_routes(date).await.unwrap());
    let mut stale = fixture.store.get_route(routes[0].id).await.unwrap();

    let regenerated = planned_routes(fixture.state.planning.regenerate_routes(date).await.unwrap());
    assert_ne!(regenerated[0].id, stale.id);

    // Una escritura en curso que cargó la ruta antes de borrarla
    stale.status = RouteStatus::InProgress;
    let write_back = fixture.store.update_route(&stale).await;
    assert!(matches!(write_back, Err(AppError::NotFound { .. })));

    let start = fixture.state.execution.start_route(stale.id, agent.id).await;
    assert!(matches!(start, Err(AppError::NotFound { .. })));

    let stored = fixture.state.planning.list_routes(&Default::default()).await.unwrap();
    assert_eq!(stored.iter().map(|route| route.id).collect::<Vec<_>>(), vec![regenerated[0].id]);
    planned_routes(fixture.state.planning.regenerate_routes(date).await.unwrap());
}

#[tokio::test]
async fn test_service_at_removed_hotel_is_reported_not_planned() {
    let fixture = Fixture::new();
    let hotel = fixture.hotel("Hotel Sol", "Sur").await;
    let agent = fixture.agent("Pablo", "Sur").await;
    let orphan = fixture.service(&hotel, Some(&agent), ServicePriority::High, 1).await;
    fixture.store.remove_hotel(hotel.id).await;

    match fixture.state.planning.generate_routes(fixture.today()).await.unwrap() {
        PlanningOutcome::NoEligibleWork { warnings } => assert_eq!(
            warnings,
            vec![DataIntegrityWarning::UnknownHotel { service_id: orphan.id, hotel_id: hotel.id }]
        ),
        other => panic!("expected NoEligibleWork, got {:?}", other),
    }
    assert!(fixture.state.planning.list_routes(&Default::default()).await.unwrap().is_empty());
}
