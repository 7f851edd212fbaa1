// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometry engine: layout mapping, interactive transforms and composition.

pub mod compose;
pub mod output_format;
pub mod transform;
