use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Json,
};
use lateshow_catalog::Catalog;
use log::info;
use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Instant,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod appearances;
mod auth;
mod config;
mod context;
mod docs;
mod episodes;
mod errors;
mod guests;
mod schemas;
mod serialized;

#[cfg(test)]
mod testing;

pub use config::*;
pub use context::ServerContext;
pub use errors::{ServerError, ServerResult};

use serialized::Message;

pub type Router = axum::Router<ServerContext>;

/// Starts the Late Show server
pub async fn run_server(port: u16, catalog: Catalog) -> std::io::Result<()> {
    let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app(ServerContext::new(catalog))).await
}

/// Assembles every endpoint group into one router
pub fn app(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/api.json", get(docs::docs))
        .merge(guests::router())
        .merge(episodes::router())
        .merge(appearances::router())
        .merge(auth::router())
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(context)
}

async fn root() -> Json<Message> {
    Json(Message {
        message: "Late Show API is working".to_string(),
    })
}

async fn not_found() -> (StatusCode, Json<Message>) {
    (
        StatusCode::NOT_FOUND,
        Json(Message {
            message: "Route not found".to_string(),
        }),
    )
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        "{} {} {} in {}ms",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );

    response
}
