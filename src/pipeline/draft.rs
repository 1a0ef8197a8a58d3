//! Response under construction.
//!
//! Stages write status, headers and cookies into a `ResponseDraft` before the
//! body exists. Whoever produces the final response (terminal stage or a
//! short-circuiting stage) finishes the draft, so metadata written earlier
//! survives rejections and gateway errors.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};

use crate::config::EndpointDescriptor;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct ResponseDraft {
    status: StatusCode,
    headers: HeaderMap,
}

impl Default for ResponseDraft {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

impl ResponseDraft {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    /// Set `content-type` unless one was configured already.
    pub fn default_content_type(&mut self, value: HeaderValue) {
        self.headers.entry(header::CONTENT_TYPE).or_insert(value);
    }

    /// Finish with the drafted status.
    pub fn finish(self, body: Body) -> Response {
        let status = self.status;
        self.finish_with(status, body)
    }

    /// Finish with an overriding status, keeping drafted headers and cookies.
    pub fn finish_with(self, status: StatusCode, body: Body) -> Response {
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Status, headers and cookies of one endpoint, validated at build time.
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    status: StatusCode,
    headers: Vec<(HeaderName, HeaderValue)>,
    cookies: Vec<HeaderValue>,
}

impl ResponseMetadata {
    pub fn from_descriptor(descriptor: &EndpointDescriptor) -> Result<Self, ConfigError> {
        let invalid = |reason: String| {
            ConfigError::endpoint(descriptor.method.as_str(), &descriptor.path, reason)
        };

        let headers = descriptor
            .headers
            .iter()
            .map(|(name, value)| {
                let name = HeaderName::try_from(name.as_str())
                    .map_err(|_| invalid(format!("invalid header name `{}`", name)))?;
                let value = HeaderValue::try_from(value.as_str())
                    .map_err(|_| invalid(format!("invalid value for header `{}`", name)))?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let cookies = descriptor
            .cookies
            .iter()
            .map(|(name, value)| {
                if name.is_empty() || name.contains(|c: char| c == '=' || c == ';' || c.is_whitespace()) {
                    return Err(invalid(format!("invalid cookie name `{}`", name)));
                }
                HeaderValue::try_from(format!("{}={}; Path=/", name, value))
                    .map_err(|_| invalid(format!("invalid value for cookie `{}`", name)))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            status: descriptor.status,
            headers,
            cookies,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Write status, headers and `set-cookie`s into the draft.
    pub fn apply(&self, draft: &mut ResponseDraft) {
        draft.set_status(self.status);
        for (name, value) in &self.headers {
            draft.append_header(name.clone(), value.clone());
        }
        for cookie in &self.cookies {
            draft.append_header(header::SET_COOKIE, cookie.clone());
        }
    }
}
