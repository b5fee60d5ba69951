//! 構造化ログの初期化。
//! tracing-subscriber を使用し、JSON またはテキスト形式の構造化ログを出力する。

use tracing_subscriber::{
    fmt, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// TelemetryConfig はログ初期化設定を保持する。
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// `DEBUG` / `INFO` / `WARNING` / `ERROR` / `CRITICAL` などのレベル名。
    pub log_level: String,
    /// ログ出力フォーマット。"text" の場合はプレーンテキスト、それ以外は JSON。
    pub log_format: String,
}

/// init_telemetry は tracing-subscriber を初期化する。
/// RUST_LOG が設定されていればそちらを優先する。
/// 既にグローバル subscriber が設定済みの場合はエラーを返す。
pub fn init_telemetry(
    cfg: &TelemetryConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(parse_log_level(&cfg.log_level).as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if cfg.log_format == "text" {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
    }

    tracing::debug!(service = %cfg.service_name, "telemetry initialized");
    Ok(())
}

/// parse_log_level はログレベル文字列を tracing の Level に変換する。
/// 大文字小文字は区別せず、`WARNING` と `CRITICAL` も受け付ける。
pub fn parse_log_level(level: &str) -> tracing::Level {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" | "critical" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
