//! Reverse-proxy passthrough.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream target
//! - Strip hop-by-hop headers in both directions
//! - Merge the upstream response with the drafted metadata
//! - Map upstream failures to gateway errors
//!
//! # Design Decisions
//! - Plain `http://` upstreams only
//! - Upstream status wins; upstream headers replace same-named drafted
//!   headers, drafted cookies are kept next to upstream cookies
//! - Connection failure is 502, exceeding the deadline is 504
//! - The request body is streamed, never buffered

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri, Version},
    response::Response,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::observability::{metrics, SeriesKey};
use crate::pipeline::draft::ResponseDraft;

/// Shared HTTP client for all proxy routes.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Response head and streaming body as received from the upstream.
pub type UpstreamResponse = hyper::Response<hyper::body::Incoming>;

pub fn upstream_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Resolved upstream of one proxy route.
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    authority: String,
    host: HeaderValue,
    base_path: String,
    timeout: Duration,
}

impl ProxyTarget {
    pub fn new(target: &Url, timeout: Duration) -> Result<Self, String> {
        if target.scheme() != "http" {
            return Err(format!("unsupported proxy scheme `{}`, only http is supported", target.scheme()));
        }
        let host = target
            .host_str()
            .ok_or_else(|| format!("proxy target `{}` has no host", target))?;
        let authority = match target.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let host = HeaderValue::try_from(authority.as_str())
            .map_err(|_| format!("proxy target `{}` has an invalid authority", target))?;

        Ok(Self {
            authority,
            host,
            base_path: target.path().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Upstream URI for an incoming request URI: target prefix + original path and query.
    pub fn forward_uri(&self, original: &Uri) -> Result<Uri, axum::http::uri::InvalidUri> {
        let path_and_query = original.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("http://{}{}{}", self.authority, self.base_path, path_and_query).parse()
    }

    pub async fn forward(
        &self,
        client: &UpstreamClient,
        request: Request<Body>,
        draft: ResponseDraft,
        key: &SeriesKey,
    ) -> Response {
        let (mut parts, body) = request.into_parts();

        parts.uri = match self.forward_uri(&parts.uri) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::warn!(route = %key.path, error = %e, "Cannot build upstream URI");
                return draft.finish_with(StatusCode::BAD_GATEWAY, Body::from("Invalid upstream URI"));
            }
        };
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        parts.headers.insert(header::HOST, self.host.clone());

        let upstream = Request::from_parts(parts, body);
        let uri = upstream.uri().clone();

        match tokio::time::timeout(self.timeout, client.request(upstream)).await {
            Ok(Ok(response)) => {
                tracing::debug!(route = %key.path, upstream = %uri, status = %response.status(), "Proxied request");
                relay(response, draft)
            }
            Ok(Err(e)) => {
                let kind = if e.is_connect() { "connect" } else { "request" };
                tracing::warn!(route = %key.path, upstream = %uri, error = %e, kind, "Upstream request failed");
                metrics::record_upstream_error(&key.path, kind);
                draft.finish_with(StatusCode::BAD_GATEWAY, Body::from("Upstream request failed"))
            }
            Err(_) => {
                tracing::warn!(route = %key.path, upstream = %uri, timeout = ?self.timeout, "Upstream request timed out");
                metrics::record_upstream_error(&key.path, "timeout");
                draft.finish_with(StatusCode::GATEWAY_TIMEOUT, Body::from("Upstream request timed out"))
            }
        }
    }
}

/// Finish the draft with the upstream status, headers and body.
fn relay(response: UpstreamResponse, mut draft: ResponseDraft) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    merge_headers(draft.headers_mut(), parts.headers);
    draft.finish_with(parts.status, Body::new(body))
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn merge_headers(drafted: &mut HeaderMap, upstream: HeaderMap) {
    for name in upstream.keys() {
        if *name != header::SET_COOKIE {
            drafted.remove(name);
        }
    }
    for (name, value) in upstream.iter() {
        drafted.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(url: &str) -> Result<ProxyTarget, String> {
        ProxyTarget::new(&Url::parse(url).unwrap(), Duration::from_secs(1))
    }

    #[test]
    fn forwards_path_and_query_under_target_prefix() {
        let t = target("http://127.0.0.1:8080/api/").unwrap();
        let uri = t.forward_uri(&"/users/7?full=1".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:8080/api/users/7?full=1");

        let bare = target("http://upstream.local").unwrap();
        assert_eq!(bare.authority(), "upstream.local");
        let uri = bare.forward_uri(&"/x".parse().unwrap()).unwrap();
        assert_eq!(uri.to_string(), "http://upstream.local/x");
    }

    #[test]
    fn rejects_non_http_targets() {
        assert!(target("https://example.com").is_err());
        assert!(target("file:///tmp/x").is_err());
    }

    #[test]
    fn strips_hop_by_hop_and_connection_listed_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-private"));
        headers.insert("x-private", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[header::ACCEPT], "*/*");
    }

    #[test]
    fn upstream_headers_override_but_cookies_accumulate() {
        let mut drafted = HeaderMap::new();
        drafted.insert("x-mock", HeaderValue::from_static("drafted"));
        drafted.insert("x-kept", HeaderValue::from_static("kept"));
        drafted.append(header::SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));

        let mut upstream = HeaderMap::new();
        upstream.insert("x-mock", HeaderValue::from_static("upstream"));
        upstream.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));

        merge_headers(&mut drafted, upstream);
        assert_eq!(drafted["x-mock"], "upstream");
        assert_eq!(drafted["x-kept"], "kept");
        assert_eq!(drafted.get_all(header::SET_COOKIE).iter().count(), 2);
    }
}
