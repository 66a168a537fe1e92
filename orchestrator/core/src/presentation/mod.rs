// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`monocrat-core`)
//!
//! HTTP surface that translates GitHub webhook deliveries into application
//! service calls. **No business logic lives here**; decoded events are handed
//! to [`crate::application::EventRouter`].
//!
//! | Route | Method | Description |
//! |-------|--------|-------------|
//! | `/` | POST | Webhook receiver |
//! | `/health` | GET | Liveness probe with uptime |

pub mod api;
