use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;
use std::time::Duration;

use crate::{auth::TokenIssuer, exchange, nbp::NbpClient, rates, transactions, user, wallet};
use engine::Engine;

/// Runtime configuration of the HTTP server.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds.
    pub token_ttl_secs: u64,
    /// Base URL of the upstream rate source, e.g. `https://api.nbp.pl/api/`.
    pub nbp_base_url: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub(crate) tokens: Arc<TokenIssuer>,
    pub(crate) nbp: Arc<NbpClient>,
}

impl ServerState {
    pub fn new(engine: Engine, config: &ServerConfig) -> Result<Self, std::io::Error> {
        let nbp = NbpClient::new(&config.nbp_base_url)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
        Ok(Self {
            engine: Arc::new(engine),
            tokens: Arc::new(TokenIssuer::new(
                config.jwt_secret.as_bytes(),
                Duration::from_secs(config.token_ttl_secs),
            )),
            nbp: Arc::new(nbp),
        })
    }
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware. The id comes from the validated token and is trusted as
/// given from here on.
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub id: i64,
}

async fn auth(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(bearer)) = bearer else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let user_id = state
        .tokens
        .validate(bearer.token())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/wallet", get(wallet::get))
        .route("/wallet/deposit", post(wallet::deposit))
        .route("/exchange/buy", post(exchange::buy))
        .route("/exchange/sell", post(exchange::sell))
        .route("/transactions", get(transactions::list))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        // Everything below is reachable without a token.
        .route("/auth/register", post(user::register))
        .route("/auth/login", post(user::login))
        .route("/rates/latest", get(rates::latest))
        .route("/rates/history", get(rates::history))
        .with_state(state)
}

pub async fn run(engine: Engine, config: ServerConfig) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, config, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState::new(engine, &config)?;

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    config: ServerConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, config, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
