// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for document loading and export.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StereoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Project file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported stereo image: {0}")]
    UnsupportedSource(String),

    #[error("Unsupported project file version {0:?} (expected \"1.0\")")]
    UnsupportedVersion(String),

    #[error("No second eye frame found in {0}")]
    MissingEyeFrame(String),

    #[error("An export is already running for this document")]
    ExportInProgress,

    #[error("No free export file name for {0} after {1} attempts")]
    ExportPathsExhausted(String, usize),

    #[error("Export cancelled")]
    Cancelled,

    #[error("Export worker stopped without reporting a result")]
    WorkerDisconnected,
}

pub type Result<T> = std::result::Result<T, StereoError>;
