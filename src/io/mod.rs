// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for stereo images, project sidecars and exports.

pub mod export;
pub mod file_group;
pub mod media;
pub mod serialization;
