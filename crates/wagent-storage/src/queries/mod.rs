// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions, one module per table family.

pub mod agents;
pub mod inbound;
pub mod keys;
pub mod messages;
pub mod permissions;
pub mod threads;
