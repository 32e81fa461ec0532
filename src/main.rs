use clap::Parser;
use std::sync::Arc;
use ticket_triage::api::{build_router, AppState};
use ticket_triage::utils::{logger, validation::Validate};
use ticket_triage::{ClassifierService, ServerArgs, TriageConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = ServerArgs::parse();

    let mut config = match TriageConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config: {}", e);
            std::process::exit(e.exit_code());
        }
    };
    args.apply(&mut config);

    // 初始化日誌
    logger::init_logger(args.verbose, &config.logging.level, config.logging.json);

    tracing::info!("Starting ticket-triage classifier API");
    if args.verbose {
        tracing::debug!("Server config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    // 載入模型資源；失敗時不啟動服務
    let classifier = match ClassifierService::load(&config.artifacts) {
        Ok(classifier) => classifier,
        Err(e) => {
            tracing::error!(
                "❌ Failed to load model artifacts: {} (Severity: {:?})",
                e,
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };
    tracing::info!(
        "✅ Model loaded: {} classes ({})",
        classifier.classes().len(),
        classifier.classes().join(", ")
    );

    let app = build_router(AppState::new(Arc::new(classifier)));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Classifier API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
