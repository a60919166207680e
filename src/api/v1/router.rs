use super::handler;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warp::Filter;

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let ping = warp::path("ping")
        .and(warp::path::end())
        .and(warp::get().or(warp::post()).unify())
        .map(|| "pong");

    // POST: may create the session record of an identity.
    let generate = warp::path("generate")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.token_service.clone()))
        .and(with_value(server.api.clone()))
        .and(with_cancel(server.clone()))
        .and_then(handler::generate);

    // PUT: only ever replaces an existing session record.
    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::put())
        .and(json_body())
        .and(with(server.token_service.clone()))
        .and(with_value(server.api.clone()))
        .and(with_cancel(server.clone()))
        .and_then(handler::refresh);

    let verify = warp::path("verify")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.token_service.clone()))
        .and_then(handler::verify);

    ping.or(generate).or(refresh).or(verify)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_value<T>(value: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone
where
    T: Clone + Send + Sync,
{
    warp::any().map(move || value.clone())
}

fn with_cancel(
    server: Arc<Server>,
) -> impl Filter<Extract = (CancellationToken,), Error = Infallible> + Clone {
    warp::any().map(move || server.request_cancel())
}
