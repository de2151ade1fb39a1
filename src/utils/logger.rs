use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(default_directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

fn default_directives(verbose: bool, level: Option<&str>) -> String {
    match (verbose, level) {
        (true, _) => "site_pulse=debug,tower_http=debug,info".to_string(),
        (false, Some(level)) => format!("site_pulse={},tower_http={},warn", level, level),
        (false, None) => "site_pulse=info,tower_http=info,warn".to_string(),
    }
}

pub fn init_cli_logger(verbose: bool, level: Option<&str>) {
    let filter = env_filter(&default_directives(verbose, level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// 容器環境下使用 JSON 格式，方便日誌收集
pub fn init_json_logger(verbose: bool, level: Option<&str>) {
    let filter = env_filter(&default_directives(verbose, level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
