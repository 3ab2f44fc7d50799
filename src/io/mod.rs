// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for source images and exported composites.

pub mod export;
pub mod media;
