// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text layout, fonts and export compositing.

pub mod compositor;
pub mod fonts;
pub mod layout;
