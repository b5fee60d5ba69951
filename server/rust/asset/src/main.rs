use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use aws_config::{BehaviorVersion, Region};
use lambda_runtime::{service_fn, LambdaEvent};
use tracing::info;

use docvault_asset_server::adapter::handler::{
    handle_event, local, ApiEvent, ApiResponse, HandlerContext, Operation,
};
use docvault_asset_server::domain::repository::{AssetTable, IdentityProvider, ObjectStore};
use docvault_asset_server::infrastructure::config::{default_telemetry_config, StorageBackend};
use docvault_asset_server::infrastructure::{
    CognitoIdentityProvider, Config, DynamoDbAssetTable, InMemoryAssetTable, InMemoryObjectStore,
    S3ObjectStore, TokenVerifier,
};
use docvault_auth::JwksVerifier;
use docvault_server_common::init_telemetry;

const SERVICE_NAME: &str = "docvault-asset-server";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loaded = Config::from_env();

    // 設定の読み込みに失敗しても理由をログに出せるよう、既定値で初期化する
    let telemetry_cfg = match &loaded {
        Ok(cfg) => cfg.telemetry_config(SERVICE_NAME),
        Err(_) => default_telemetry_config(SERVICE_NAME),
    };
    init_telemetry(&telemetry_cfg).map_err(|e| anyhow::anyhow!("telemetry init failed: {e}"))?;

    let cfg = loaded
        .inspect_err(|e| tracing::error!(error = %e, "failed to load configuration"))
        .context("failed to load configuration")?;

    let pinned_operation = match cfg.handler_operation.as_deref() {
        None => None,
        Some(name) => Some(
            Operation::from_name(name)
                .with_context(|| format!("unknown HANDLER_OPERATION: {name}"))?,
        ),
    };

    info!(
        service = SERVICE_NAME,
        region = %cfg.region,
        storage_backend = ?cfg.storage_backend,
        operation = pinned_operation.map_or("*", |op| op.name()),
        "starting asset server"
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(cfg.region.clone()))
        .load()
        .await;

    // インメモリストアはローカルサーバーがパートの PUT を受けるために保持する
    let mut memory_store = None;
    let (store, table): (Arc<dyn ObjectStore>, Arc<dyn AssetTable>) = match cfg.storage_backend {
        StorageBackend::Aws => (
            Arc::new(S3ObjectStore::new(&sdk_config, cfg.bucket_name.clone())),
            Arc::new(DynamoDbAssetTable::new(&sdk_config, cfg.table_name.clone())),
        ),
        StorageBackend::Memory => {
            info!("using in-memory object store and asset table");
            let store = Arc::new(
                InMemoryObjectStore::new()
                    .with_part_endpoint(format!("http://localhost:{}", cfg.local_port)),
            );
            memory_store = Some(Arc::clone(&store));
            (store, Arc::new(InMemoryAssetTable::new()))
        }
    };
    let identity: Arc<dyn IdentityProvider> = Arc::new(CognitoIdentityProvider::new(
        &sdk_config,
        cfg.user_pool_id.clone(),
        cfg.user_pool_client_id.clone(),
    ));
    let verifier: Arc<dyn TokenVerifier> =
        Arc::new(JwksVerifier::new(&cfg.issuer(), &cfg.jwks_url()));

    let mut ctx = HandlerContext::new(store, table, identity, verifier)
        .with_cors_origin(cfg.cors_allow_origin.clone());
    if let Some(op) = pinned_operation {
        ctx = ctx.with_pinned_operation(op);
    }

    if std::env::var_os("AWS_LAMBDA_RUNTIME_API").is_some() {
        info!("running under the Lambda runtime");
        lambda_runtime::run(service_fn(move |event: LambdaEvent<ApiEvent>| {
            let ctx = ctx.clone();
            async move {
                let response = handle_event(&ctx, event.payload).await;
                Ok::<ApiResponse, lambda_runtime::Error>(response)
            }
        }))
        .await
        .map_err(|e| anyhow::anyhow!("lambda runtime failed: {e}"))?;
        return Ok(());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.local_port));
    info!("local server starting on {}", addr);

    let app = match memory_store {
        Some(store) => local::router_with_part_uploads(ctx, store),
        None => local::router(ctx),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
