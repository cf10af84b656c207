// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Recording reverse proxy: forwards every request to the backend and
//! captures the exchange into the route table.

use crate::exchange::{headers_snapshot, Exchange};
use crate::recorder::RouteTable;

use bytes::Bytes;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Incoming;
use hyper::{service::service_fn, Request, Response, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder as AutoConnBuilder;
use std::collections::HashSet;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};
use uuid::Uuid;

type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>, Infallible>> + Send>>;

type HttpClient = LegacyClient<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

// RFC 7230 Section 6.1: Hop-by-hop headers must not be forwarded by proxies.
static HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

struct Shared {
    client: HttpClient,
    backend: Uri,
    table: Arc<RouteTable>,
}

fn build_client() -> anyhow::Result<HttpClient> {
    let https = HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .build();
    Ok(LegacyClient::builder(TokioExecutor::new()).build(https))
}

/// Bind `listen` and serve until `shutdown` resolves.
pub async fn run_proxy<F>(
    listen: SocketAddr,
    backend: Uri,
    table: Arc<RouteTable>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind(listen).await?;
    info!(%listen, %backend, "listening");
    serve(listener, backend, table, shutdown).await
}

/// Accept connections on `listener` until `shutdown` resolves.
///
/// Once the signal fires no new connection is accepted, every open connection
/// is asked to finish its in-flight request and close, and this function
/// returns only after all of them are gone. The table is therefore quiescent
/// when it returns.
pub async fn serve<F>(
    listener: TcpListener,
    backend: Uri,
    table: Arc<RouteTable>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let shared = Arc::new(Shared {
        client: build_client()?,
        backend,
        table,
    });

    let server_builder = AutoConnBuilder::new(TokioExecutor::new());
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("stop accepting connections");
                break;
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => {
                let (stream, remote_addr) = match accepted {
                    Ok(a) => a,
                    Err(e) => {
                        error!(error = %e, "accept error");
                        continue;
                    }
                };
                let conn_id = Uuid::new_v4();
                trace!(%conn_id, %remote_addr, "connection accepted");

                let shared = shared.clone();
                let builder_clone = server_builder.clone();
                let mut stop_rx = stop_rx.clone();
                connections.spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let shared = shared.clone();
                        let fut: ServiceFuture = Box::pin(async move { handle_request(req, shared).await });
                        fut
                    });
                    let conn = builder_clone.serve_connection(TokioIo::new(stream), service);
                    tokio::pin!(conn);
                    tokio::select! {
                        res = conn.as_mut() => {
                            if let Err(e) = res {
                                error!(%conn_id, error = %e, "connection error");
                            }
                        }
                        _ = stop_rx.changed() => {
                            conn.as_mut().graceful_shutdown();
                            if let Err(e) = conn.await {
                                error!(%conn_id, error = %e, "connection error during drain");
                            }
                        }
                    }
                    trace!(%conn_id, "connection closed");
                });
            }
        }
    }

    drop(listener);
    let _ = stop_tx.send(true);
    let in_flight = connections.len();
    while connections.join_next().await.is_some() {}
    info!(connections = in_flight, "in-flight connections drained");
    Ok(())
}

/// Join the backend origin with the inbound path and query.
fn upstream_uri(backend: &Uri, inbound: &Uri) -> anyhow::Result<Uri> {
    let scheme = backend
        .scheme_str()
        .ok_or_else(|| anyhow::anyhow!("backend has no scheme"))?;
    let authority = backend
        .authority()
        .ok_or_else(|| anyhow::anyhow!("backend has no authority"))?;
    let prefix = backend.path().trim_end_matches('/');
    let path_and_query = inbound
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Ok(format!("{}://{}{}{}", scheme, authority, prefix, path_and_query).parse()?)
}

fn text_response(status: u16, msg: String) -> Response<BoxBody<Bytes, Infallible>> {
    let body = Bytes::from(msg);
    Response::builder()
        .status(status)
        .body(Full::new(body.clone()).boxed())
        .unwrap_or_else(|_| Response::new(Full::new(body).boxed()))
}

async fn handle_request<B>(
    req: Request<B>,
    shared: Arc<Shared>,
) -> Result<Response<BoxBody<Bytes, Infallible>>, Infallible>
where
    B: hyper::body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let req_headers = req.headers().clone();

    let uri = match upstream_uri(&shared.backend, req.uri()) {
        Ok(u) => u,
        Err(e) => {
            error!(%path, error = %e, "failed to build upstream uri");
            return Ok(text_response(500, format!("request build error: {}", e)));
        }
    };

    let connection_hop_headers =
        parse_connection_tokens(req_headers.get(hyper::header::CONNECTION));
    let mut builder = Request::builder().method(method.clone()).uri(uri);
    for (name, value) in req_headers.iter() {
        if is_hop_by_hop_header(name.as_str(), &connection_hop_headers) {
            continue;
        }
        builder = builder.header(name, value);
    }

    let body_bytes = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let boxed: Box<dyn std::error::Error + Send + Sync> = e.into();
            error!(%path, error = %boxed, "failed to collect request body");
            return Ok(text_response(502, "request body collect error".to_string()));
        }
    };

    let exchange = Exchange::new(method.as_str(), &path).with_body(&body_bytes);

    let upstream_req = match builder.body(Full::new(body_bytes)) {
        Ok(r) => r,
        Err(e) => {
            error!(%path, error = %e, "failed to build upstream request");
            return Ok(text_response(500, format!("request build error: {}", e)));
        }
    };

    let resp = match shared.client.request(upstream_req).await {
        Ok(r) => r,
        Err(e) => {
            error!(%path, error = %e, "proxy error");
            return Ok(text_response(502, format!("upstream error: {}", e)));
        }
    };

    let status = resp.status();
    let headers = resp.headers().clone();
    let resp_body_bytes = match resp.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!(%path, error = %e, "failed to collect upstream body");
            return Ok(text_response(502, format!("upstream body collect error: {}", e)));
        }
    };

    let route = crate::route::normalize(&path);
    shared.table.record(
        &route,
        &headers_snapshot(&req_headers),
        exchange.with_response(status.as_u16(), &resp_body_bytes),
    );
    info!(%method, %path, status = status.as_u16(), "request proxied");
    debug!(%route, "exchange recorded");

    let mut resp_builder = Response::builder().status(status);
    let connection_hop_headers = parse_connection_tokens(headers.get(hyper::header::CONNECTION));
    for (name, value) in headers.iter() {
        if is_hop_by_hop_header(name.as_str(), &connection_hop_headers) {
            continue;
        }
        resp_builder = resp_builder.header(name, value);
    }
    let resp = resp_builder
        .body(Full::new(resp_body_bytes.clone()).boxed())
        .unwrap_or_else(|_| Response::new(Full::new(resp_body_bytes).boxed()));

    Ok(resp)
}

// Parse a Connection header value into a lowercased set of tokens
fn parse_connection_tokens(val: Option<&hyper::header::HeaderValue>) -> HashSet<String> {
    let mut set = HashSet::new();
    if let Some(conn_val) = val {
        if let Ok(conn_str) = conn_val.to_str() {
            for token in conn_str.split(',') {
                let trimmed = token.trim().to_ascii_lowercase();
                if !trimmed.is_empty() {
                    set.insert(trimmed);
                }
            }
        }
    }
    set
}

fn is_hop_by_hop_header(name: &str, connection_hop_headers: &HashSet<String>) -> bool {
    let name = name.to_ascii_lowercase();
    connection_hop_headers.contains(&name) || HOP_BY_HOP_HEADERS.contains(&name.as_str())
}
