// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Issue Tracker - multi-user issue tracking REST service
//!
//! Users log in with email and password and receive a signed token. Every
//! protected request re-resolves the token's subject against the user table,
//! then passes a role gate and, for mutations, an ownership gate.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Token codec, validator, role and ownership gates
//! - `config` - Environment configuration
//! - `storage` - Embedded redb database and repositories
//! - `telemetry` - Tracing subscriber setup

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
pub mod telemetry;
