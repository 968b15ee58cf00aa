//! Benefit Checkout server.
//!
//! Runs the HTTP API, the activation queue worker and the PIX expiration
//! sweep in one process. Ctrl-C broadcasts shutdown to all three.

use std::net::SocketAddr;
use std::sync::Arc;

use benefit_checkout::adapters::doc24::{Doc24Client, Doc24Config};
use benefit_checkout::adapters::gateway::{AsaasConfig, AsaasGateway};
use benefit_checkout::adapters::http::{app_router, AppState};
use benefit_checkout::adapters::postgres::{
    PostgresCustomerRepository, PostgresDependentRepository, PostgresLeadRepository,
    PostgresPlanRepository, PostgresReadiness, PostgresSubscriptionRepository, MIGRATOR,
};
use benefit_checkout::adapters::queue::{
    declare_topology, ActivationWorker, QueueActivationPublisher, RedisMessageBroker,
    WorkerConfig,
};
use benefit_checkout::adapters::rate_limiter::InMemoryRateLimiter;
use benefit_checkout::adapters::scheduler::PixExpirationSweeper;
use benefit_checkout::adapters::validation::RuleBasedCheckoutValidator;
use benefit_checkout::application::handlers::activation::{
    EnrollBeneficiaryHandler, HandlePaymentWebhookHandler, ProviderRegistry,
};
use benefit_checkout::application::handlers::checkout::{
    CaptureLeadHandler, ExpirePixSubscriptionsHandler, GetCustomerStatusHandler,
    ProcessCheckoutHandler, ValidateUserHandler,
};
use benefit_checkout::config::{AppConfig, ServerConfig};
use benefit_checkout::domain::activation::WebhookVerifier;
use benefit_checkout::ports::{
    CustomerRepository, DependentRepository, MessageBroker, PlanRepository, ReadinessCheck,
    SubscriptionRepository,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!(error = %error, "benefit-checkout exited with error");
        eprintln!("benefit-checkout: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;
    tracing::info!(environment = ?config.server.environment, "configuration loaded");

    // Database
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        MIGRATOR.run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let customers: Arc<dyn CustomerRepository> =
        Arc::new(PostgresCustomerRepository::new(pool.clone()));
    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(PostgresSubscriptionRepository::new(pool.clone()));
    let plans: Arc<dyn PlanRepository> = Arc::new(PostgresPlanRepository::new(pool.clone()));
    let dependents: Arc<dyn DependentRepository> =
        Arc::new(PostgresDependentRepository::new(pool.clone()));

    // Queue
    let redis = tokio::time::timeout(
        config.redis.timeout(),
        RedisMessageBroker::connect(&config.redis.url),
    )
    .await
    .map_err(|_| "timed out connecting to Redis")??
    .with_prefix(config.redis.key_prefix.clone())
    .with_visibility_timeout(config.redis.visibility_timeout());
    let redis = Arc::new(redis);
    let broker: Arc<dyn MessageBroker> = redis.clone();
    let topology = config.queue.topology();
    declare_topology(broker.as_ref(), &topology).await?;
    tracing::info!(queue = %topology.queue, dlq = %topology.dead_letter_queue, "queue topology declared");

    // Checkout
    let gateway = Arc::new(AsaasGateway::new(
        AsaasConfig::new(config.gateway.api_key.clone())
            .with_base_url(config.gateway.base_url.clone())
            .with_timeout(config.gateway.timeout()),
    )?);
    if config.gateway.is_sandbox() {
        tracing::warn!("payment gateway running against sandbox");
    }

    let checkout = Arc::new(ProcessCheckoutHandler::new(
        Arc::new(RuleBasedCheckoutValidator::new()),
        plans.clone(),
        gateway,
        customers.clone(),
        subscriptions.clone(),
        dependents,
    ));
    let customer_status = Arc::new(GetCustomerStatusHandler::new(customers.clone()));
    let validate_user = Arc::new(ValidateUserHandler::new(customers.clone()));

    // Leads
    let capture_lead = Arc::new(CaptureLeadHandler::new(Arc::new(
        PostgresLeadRepository::new(pool.clone()),
    )));
    let lead_limiter = Arc::new(InMemoryRateLimiter::for_leads(&config.rate_limit));

    // Activation trigger
    let verifier = WebhookVerifier::new(config.webhook.secret.clone())
        .with_mode(config.webhook.signature_mode());
    if config.webhook.allow_unsigned {
        tracing::warn!("webhook accepts requests without a signature header");
    }
    let webhook = Arc::new(HandlePaymentWebhookHandler::new(
        Arc::new(verifier),
        customers.clone(),
        subscriptions.clone(),
        plans,
        Arc::new(QueueActivationPublisher::new(broker.clone(), topology.clone())),
    ));

    // Activation worker
    let doc24 = Doc24Client::new(
        Doc24Config::new(
            config.doc24.client_id.clone(),
            config.doc24.client_secret.clone(),
        )
        .with_base_url(config.doc24.base_url.clone())
        .with_empresa(config.doc24.empresa.clone())
        .with_default_plan_code(config.doc24.default_plan_code.clone())
        .with_timeout(config.doc24.timeout()),
    )?;
    let registry = ProviderRegistry::new().register(Arc::new(doc24));
    let worker = ActivationWorker::with_config(
        broker,
        Arc::new(EnrollBeneficiaryHandler::new(registry, customers.clone())),
        topology.queue.clone(),
        WorkerConfig {
            receive_wait: config.redis.consumer_block(),
            ..WorkerConfig::default()
        },
    );

    // PIX sweep
    let sweeper = PixExpirationSweeper::new(
        Arc::new(ExpirePixSubscriptionsHandler::new(
            subscriptions,
            customers,
            config.pix.expiration(),
        )),
        config.pix.sweep_interval(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let worker_task = tokio::spawn({
        let shutdown = shutdown_rx.clone();
        async move { worker.run(shutdown).await }
    });
    let sweeper_task = tokio::spawn({
        let shutdown = shutdown_rx.clone();
        async move { sweeper.run(shutdown).await }
    });

    // HTTP
    let readiness: Vec<Arc<dyn ReadinessCheck>> = vec![
        Arc::new(PostgresReadiness::new(pool)) as Arc<dyn ReadinessCheck>,
        redis as Arc<dyn ReadinessCheck>,
    ];
    let state = AppState {
        checkout,
        customer_status,
        validate_user,
        capture_lead,
        lead_limiter,
        webhook,
        readiness: Arc::new(readiness),
    };
    let app = app_router(state, config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    let mut http_shutdown = shutdown_rx;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = http_shutdown.wait_for(|stop| *stop).await;
    })
    .await?;

    let _ = worker_task.await;
    let _ = sweeper_task.await;
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if server.json_logs() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
