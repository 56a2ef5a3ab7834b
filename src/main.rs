use anyhow::Context;
use axum::extract::State;
use axum::routing::{get, post, put};
use axum::Router;
use clap::Parser;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use vitrine_api::config::{config, AppConfig, Environment};
use vitrine_api::handlers::{admin, leads, storefront, super_admin};
use vitrine_api::middleware::{session_gate_middleware, tenant_rewrite_middleware, SessionGate};
use vitrine_api::routing::TenantResolver;
use vitrine_api::services::instagram::{InstagramPublisher, PollConfig};
use vitrine_api::state::AppState;
use vitrine_api::storage::LocalPhotoStorage;
use vitrine_api::database;

#[derive(Parser)]
#[command(name = "vitrine-api")]
#[command(about = "Vitrine Auto - multi-tenant storefront platform for auto dealers")]
#[command(version)]
struct Args {
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = config();
    tracing::info!("Starting Vitrine API in {:?} mode", config.environment);

    if matches!(config.environment, Environment::Production) && config.security.jwt_secret.is_empty() {
        tracing::warn!("SECURITY_JWT_SECRET not set; every admin session will be rejected");
    }

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = database::connect(&database_url, &config.database)
        .await
        .context("failed to connect to database")?;
    database::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let state = AppState {
        pool,
        storage: Arc::new(LocalPhotoStorage::new(
            &config.storage.root_dir,
            &config.storage.public_base,
        )),
        instagram: InstagramPublisher::new(
            &config.instagram.graph_api_base,
            PollConfig {
                max_attempts: config.instagram.poll_max_attempts,
                initial_delay: std::time::Duration::from_millis(config.instagram.poll_initial_delay_ms),
                max_delay: std::time::Duration::from_millis(config.instagram.poll_max_delay_ms),
            },
        ),
        http: reqwest::Client::new(),
    };

    let resolver = TenantResolver::new(config.routing.root_domains.clone());
    let gate = SessionGate {
        cookie_name: config.security.session_cookie.clone(),
        jwt_secret: config.security.jwt_secret.clone(),
        session_expiry_hours: config.security.session_expiry_hours,
    };

    let app = app(state, resolver, gate, config);

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    println!("🚀 Vitrine API listening on http://{bind_addr}");

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}

fn app(state: AppState, resolver: TenantResolver, gate: SessionGate, config: &AppConfig) -> Router {
    let mut app = Router::new()
        // Platform root
        .route("/", get(root))
        .route("/health", get(health))
        // Public APIs
        .merge(lead_routes())
        // Gated panels
        .merge(admin_routes())
        .merge(super_admin_routes())
        // Tenant storefronts (matched after the rewrite prefixes the slug)
        .merge(storefront_routes())
        // Normalized photos
        .nest_service("/uploads", ServeDir::new(&config.storage.root_dir))
        // Multipart photo batches outgrow axum's default body limit
        .layer(axum::extract::DefaultBodyLimit::max(config.imaging.max_upload_bytes))
        .with_state(state)
        // Gate runs before the rewrite: admin paths are decided on the
        // original URI, never on a tenant-prefixed one.
        .layer(axum::middleware::from_fn_with_state(
            resolver,
            tenant_rewrite_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            gate,
            session_gate_middleware,
        ));

    if config.security.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.layer(TraceLayer::new_for_http())
}

fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/:tenant", get(storefront::vitrine_home))
        .route("/:tenant/v/:veiculo_id", get(storefront::veiculo_detalhe))
}

fn lead_routes() -> Router<AppState> {
    Router::new().route("/api/leads", post(leads::criar_lead).put(leads::atualizar_lead))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", get(admin::login_page))
        .route("/admin/api/loja", get(admin::loja_atual))
        .route("/admin/api/config", put(admin::config::atualizar_config))
        .route(
            "/admin/api/config/imagem-sobre",
            post(admin::config::enviar_imagem_sobre),
        )
        .route(
            "/admin/api/veiculos",
            get(admin::veiculos::listar).post(admin::veiculos::criar),
        )
        .route(
            "/admin/api/veiculos/:id",
            put(admin::veiculos::atualizar).delete(admin::veiculos::excluir),
        )
        .route(
            "/admin/api/veiculos/:id/imagens",
            post(admin::veiculos::adicionar_imagens),
        )
        .route(
            "/admin/api/veiculos/:id/promo",
            post(admin::veiculos::definir_promocao),
        )
        .route(
            "/admin/api/veiculos/:id/instagram",
            post(admin::instagram::publicar),
        )
}

fn super_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/super-admin/api/lojas", get(super_admin::listar_lojas))
        .route(
            "/super-admin/api/lojas/:id/toggle",
            post(super_admin::alternar_status),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Vitrine Auto API",
            "version": version,
            "description": "Multi-tenant storefront platform for auto dealers",
            "endpoints": {
                "storefront": "/:loja (public, via subdomínio, domínio próprio ou /v/:loja)",
                "veiculo": "/:loja/v/:id (public)",
                "leads": "/api/leads (public - POST cadastro, PUT crédito)",
                "admin": "/admin/api/* (protected - inventário, config, instagram)",
                "super_admin": "/super-admin/api/* (restricted)",
                "uploads": "/uploads/* (fotos normalizadas)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
