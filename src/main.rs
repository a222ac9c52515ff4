use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use laundry_routing::config::environment::{EnvironmentConfig, StorageBackend};
use laundry_routing::create_app;
use laundry_routing::database;
use laundry_routing::repositories::InMemoryStore;
use laundry_routing::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let default_filter = if config.is_development() {
        "laundry_routing=debug,tower_http=debug,info"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    info!("🧺 Laundry Routing - Motor de rutas de recogida y entrega");
    info!("==========================================================");
    info!("⚙️ Entorno: {}", config.environment);

    let state = match (&config.storage, config.database_url.as_deref()) {
        (StorageBackend::Postgres, Some(url)) => {
            let pool = match database::connect(url, &config.pool).await {
                Ok(pool) => pool,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {:#}", e);
                    return Err(e);
                }
            };
            AppState::postgres(config.clone(), pool)
        }
        _ => {
            warn!("⚠️ Usando almacén en memoria: los datos se pierden al reiniciar");
            AppState::in_memory(config.clone(), Arc::new(InMemoryStore::new()))
        }
    };

    let app = create_app(state);
    let addr: SocketAddr = config.server_url().parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET    /health");
    info!("🗺️ Rutas:");
    info!("   POST   /api/routes/generate - Generar rutas del día");
    info!("   POST   /api/routes/regenerate - Borrar y regenerar");
    info!("   DELETE /api/routes?date= - Borrar rutas del día");
    info!("   GET    /api/routes - Listar rutas");
    info!("   GET    /api/routes/:id - Obtener ruta");
    info!("   POST   /api/routes/:id/start - Iniciar ruta");
    info!("   POST   /api/routes/:id/stops/:stop_id/complete - Completar parada");
    info!("   POST   /api/routes/:id/complete - Completar ruta");
    info!("🧺 Servicios:");
    info!("   POST   /api/services - Registrar servicio");
    info!("   GET    /api/services/:id - Obtener servicio");
    info!("   GET    /api/services/claimable/:agent_id - Recogidas reclamables");
    info!("   POST   /api/services/:id/claim - Reclamar recogida");
    info!("   POST   /api/services/:id/transition - Cambiar estado");
    info!("   POST   /api/services/:id/deliver - Registrar entrega");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de señales: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
