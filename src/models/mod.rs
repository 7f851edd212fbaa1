// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Document data model: geometry state and persisted project metadata.

pub mod geometry;
pub mod project;
