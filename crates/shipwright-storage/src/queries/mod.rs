// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per record set.

pub mod alerts;
pub mod jobs;
pub mod movements;
pub mod orders;
pub mod stock;
