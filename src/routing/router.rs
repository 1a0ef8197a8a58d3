//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Look up the pipeline for a method and path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in declaration order; first match wins
//! - `HEAD` falls back to `GET` routes
//! - Explicit no-match (`None`) rather than a silent default

use std::sync::Arc;

use axum::http::Method;

use crate::pipeline::Pipeline;
use crate::routing::matcher::{PathParams, PathPattern};

#[derive(Debug)]
pub struct RouteEntry {
    pattern: PathPattern,
    method: Method,
    pipeline: Arc<Pipeline>,
}

impl RouteEntry {
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    fn accepts(&self, method: &Method) -> bool {
        self.method == *method || (*method == Method::HEAD && self.method == Method::GET)
    }
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub pipeline: &'a Arc<Pipeline>,
    pub params: PathParams,
}

#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pattern: PathPattern, method: Method, pipeline: Arc<Pipeline>) {
        self.entries.push(RouteEntry {
            pattern,
            method,
            pipeline,
        });
    }

    /// Whether a route was already declared for exactly this pattern and method.
    pub fn contains(&self, pattern: &str, method: &Method) -> bool {
        self.entries
            .iter()
            .any(|e| e.pattern.as_str() == pattern && e.method == *method)
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let exact = self.entries.iter().filter(|e| e.method == *method);
        let fallback = self.entries.iter().filter(|e| e.method != *method && e.accepts(method));

        exact.chain(fallback).find_map(|entry| {
            entry.pattern.matches(path).map(|params| RouteMatch {
                pipeline: &entry.pipeline,
                params,
            })
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
