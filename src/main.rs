use std::process;
use std::sync::Arc;

use clap::Parser;
use mercato::{
    application::{
        brands::BrandDirectory,
        catalog::CatalogService,
        likes::LikeService,
        repos::{BrandsRepo, LikesRepo, ProductsRepo, UsersRepo},
        users::UserService,
    },
    cache::MemoryCache,
    config::{CliArgs, ConfigError, Settings},
    infra::{
        db::PostgresRepositories,
        http::{self, AppState, build_router},
        memory::MemoryRepositories,
        telemetry::{self, TelemetryError},
    },
    resilience::DependencyGuard,
};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        if tracing::dispatcher::has_been_set() {
            error!(error = %err, "server error");
        } else {
            eprintln!("server error: {err}");
        }
        process::exit(1);
    }
}

struct Repositories {
    products: Arc<dyn ProductsRepo>,
    brands: Arc<dyn BrandsRepo>,
    likes: Arc<dyn LikesRepo>,
    users: Arc<dyn UsersRepo>,
}

async fn run() -> Result<(), ServerError> {
    let args = CliArgs::parse();
    let settings = Settings::load(&args)?;
    telemetry::init(&settings.logging)?;

    let repos = if args.in_memory {
        info!("serving from in-memory repositories");
        let memory = MemoryRepositories::new();
        Repositories {
            products: Arc::new(memory.clone()),
            brands: Arc::new(memory.clone()),
            likes: Arc::new(memory.clone()),
            users: Arc::new(memory),
        }
    } else {
        let pool =
            PostgresRepositories::connect(&settings.database.url, settings.database.max_connections)
                .await?;
        if settings.database.run_migrations {
            PostgresRepositories::run_migrations(&pool).await?;
        }
        let pg = PostgresRepositories::new(pool);
        pg.health_check().await?;
        Repositories {
            products: Arc::new(pg.clone()),
            brands: Arc::new(pg.clone()),
            likes: Arc::new(pg.clone()),
            users: Arc::new(pg),
        }
    };

    let guard_settings = settings.guard_settings();
    let catalog_guard = Arc::new(DependencyGuard::new("catalog-db", guard_settings));
    let brand_guard = Arc::new(DependencyGuard::new("brand-db", guard_settings));
    let like_guard = Arc::new(DependencyGuard::new("like-db", guard_settings));
    let user_guard = Arc::new(DependencyGuard::new("user-db", guard_settings));

    let cache = Arc::new(MemoryCache::new());
    let catalog_settings = settings.catalog_settings();
    let counter_ttl = catalog_settings.counter_ttl;
    let brands = Arc::new(BrandDirectory::new(repos.brands, brand_guard));

    let state = AppState {
        catalog: Arc::new(CatalogService::new(
            repos.products,
            Arc::clone(&brands),
            cache.clone(),
            catalog_guard,
            catalog_settings,
        )),
        likes: Arc::new(LikeService::new(
            repos.likes,
            brands,
            cache,
            like_guard,
            counter_ttl,
        )),
        users: Arc::new(UserService::new(repos.users, user_guard)),
    };

    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "catalog server listening");

    let grace = std::time::Duration::from_secs(settings.server.graceful_shutdown_secs);
    http::serve(listener, build_router(state), grace, shutdown_signal()).await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => error!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
