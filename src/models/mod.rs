// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data model: bubbles, links and the entity store that owns them.

pub mod bubble;
pub mod store;
