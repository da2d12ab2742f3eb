//! Inicialização do registro de eventos

use tracing_subscriber::{fmt, EnvFilter};

/// Instala o subscriber global. O filtro vem de `RUST_LOG` (padrão `info`).
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("Subscriber de tracing já instalado: {}", e);
    }
}
