// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Monocrat CLI

pub mod plan;
pub mod serve;

pub use self::plan::PlanCommand;
pub use self::serve::ServeCommand;
