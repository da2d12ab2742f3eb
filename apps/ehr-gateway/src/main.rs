use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use ehr_gateway::services::seed;
use ehr_gateway::telemetry::init_tracing;
use ehr_gateway::{http, AppState, GatewayConfig, ServiceSettings};

#[tokio::main]
async fn main() -> Result<()> {
    let config = GatewayConfig::from_env().context("Configuração inválida")?;
    init_tracing(config.log_json);

    info!(
        "Iniciando {} {} em {}",
        ehr_gateway::built_info::PKG_NAME,
        ehr_gateway::built_info::PKG_VERSION,
        config.bind_addr
    );

    let pool = common_db::init_db_pool(&config.db)
        .await
        .context("Falha ao inicializar o banco de dados")?;

    let settings = ServiceSettings {
        otp_expose_in_response: config.otp_expose_in_response,
    };
    let state = Arc::new(
        AppState::new(pool, &config.encryption_key, &config.jwt, settings)
            .context("Falha ao montar o estado da aplicação")?,
    );

    if let Some(admin) = &config.seed_admin {
        if seed::seed_admin(&state, admin)
            .await
            .context("Falha ao criar o administrador inicial")?
        {
            info!("Administrador inicial {} disponível", admin.email);
        }
    }

    let app = http::router(state, config.max_concurrent_requests);

    axum::Server::bind(&config.bind_addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Erro no servidor HTTP")?;

    info!("Servidor encerrado");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao aguardar sinal de encerramento: {}", e);
    }
}
