//! Services module
//!
//! Lógica de negocio del motor de rutas. Los módulos puros (clasificador,
//! ranking, constructor y ciclos de vida) trabajan sobre datos ya cargados;
//! los servicios asíncronos hacen la E/S a través de los repositorios.

pub mod priority_classifier;
pub mod priority_ranker;
pub mod route_builder;
pub mod route_execution_service;
pub mod route_lifecycle;
pub mod route_planning_service;
pub mod service_lifecycle;
pub mod service_workflow_service;

pub use priority_classifier::{KeywordClassifier, PriorityClassifier};
pub use route_execution_service::RouteExecutionService;
pub use route_planning_service::{PlanningOutcome, RoutePlanningService};
pub use service_workflow_service::ServiceWorkflowService;
