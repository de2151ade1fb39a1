use anyhow::Context;
use clap::Parser;
use site_pulse::config::LogFormat;
use site_pulse::utils::{logger, validation::Validate};
use site_pulse::{
    open_store, AppState, CliConfig, HttpProber, MonitorService, Pinger, PingerSettings,
};
use tokio::net::TcpListener;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    match config.logging.format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose, config.logging.level.as_deref()),
        LogFormat::Json => logger::init_json_logger(cli.verbose, config.logging.level.as_deref()),
    }

    tracing::info!("Starting SitePulse backend");
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 存儲無法開啟時降級運行：API 回 503，不啟動巡檢
    let state = match open_store(&config.store).await {
        Ok(store) => AppState::new(MonitorService::new(
            store,
            config.pinger.default_interval_seconds,
        )),
        Err(e) => {
            tracing::error!(
                "Error initializing monitor store: {} (Severity: {:?})",
                e,
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            AppState::unavailable()
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let pinger_handle = match (&state.monitors, config.pinger.enabled) {
        (Some(service), true) => {
            let prober =
                HttpProber::from_config(&config.pinger).context("failed to build HTTP client")?;
            let pinger = Pinger::new(
                service.store(),
                prober,
                PingerSettings::from(&config.pinger),
            );
            Some(pinger.spawn(shutdown_rx))
        }
        (None, _) => {
            tracing::warn!("Monitor store not available. Pinger will not run.");
            None
        }
        (Some(_), false) => {
            tracing::info!("Pinger disabled by configuration");
            None
        }
    };

    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    let served = site_pulse::serve(listener, state, shutdown_signal()).await;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = pinger_handle {
        if let Err(e) = handle.await {
            tracing::error!("Pinger task ended abnormally: {}", e);
        }
    }

    served.context("API server failed")?;
    tracing::info!("✅ SitePulse stopped cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
