// ABOUTME: HTTP middleware for CORS and request tracing
// ABOUTME: Applied once around the assembled router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coach IA Contributors

pub mod cors;
pub mod tracing;

pub use cors::setup_cors;
pub use tracing::{create_request_span, with_request_tracing, REQUEST_ID_HEADER};
