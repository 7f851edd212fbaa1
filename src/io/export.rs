// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Export of composites and their project sidecars.
//!
//! Exports run on a background thread against a snapshot of the geometry,
//! report back over a channel, and can be cancelled until the files are
//! renamed into place.

use super::file_group::base_name;
use super::media::{write_image, SourceFamily, PROJECT_EXTENSION};
use super::serialization::{export_json, write_atomically};
use crate::engine::compose::compose;
use crate::error::{Result, StereoError};
use crate::models::geometry::GeometryState;
use crate::models::project::ProjectMetadata;
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

/// Give up looking for a free export name after this many candidates.
pub const MAX_EXPORT_INDEX: usize = 10_000;

/// Destination of one export: the composite image and its sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub image: PathBuf,
    pub project: PathBuf,
}

/// Pick `<base>-cropped.<ext>`, or `<base>-cropped-N.<ext>` with the first
/// N for which neither the image nor the sidecar exists yet.
pub fn export_paths(original: &Path, image_extension: &str) -> Result<ExportPaths> {
    let dir = original.parent().unwrap_or_else(|| Path::new(""));
    let name = original
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| StereoError::UnsupportedSource(original.display().to_string()))?;
    let base = format!("{}-cropped", base_name(name));

    for index in 0..MAX_EXPORT_INDEX {
        let stem = if index == 0 {
            base.clone()
        } else {
            format!("{}-{}", base, index)
        };
        let paths = ExportPaths {
            image: dir.join(format!("{}.{}", stem, image_extension)),
            project: dir.join(format!("{}.{}", stem, PROJECT_EXTENSION)),
        };
        if !paths.image.exists() && !paths.project.exists() {
            return Ok(paths);
        }
    }
    Err(StereoError::ExportPathsExhausted(base, MAX_EXPORT_INDEX))
}

/// Everything an export needs, captured when it is requested.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub original: PathBuf,
    pub family: SourceFamily,
    pub left: Arc<RgbImage>,
    pub right: Arc<RgbImage>,
    pub state: GeometryState,
}

/// Compose and write the composite and sidecar for `request`, checking
/// `cancelled` before anything becomes visible.
pub fn run_export(request: &ExportRequest, cancelled: &AtomicBool) -> Result<ExportPaths> {
    let composite = compose(&request.left, &request.right, &request.state);
    if cancelled.load(Ordering::SeqCst) {
        return Err(StereoError::Cancelled);
    }

    let (extension, format) = request.family.export_format();
    let paths = export_paths(&request.original, extension)?;

    write_atomically(&paths.image, |file| {
        if cancelled.load(Ordering::SeqCst) {
            return Err(StereoError::Cancelled);
        }
        write_image(&composite, file, format)
    })?;

    let filename = request
        .original
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let metadata = ProjectMetadata::from_state(filename, &request.state);
    if let Err(e) = export_json(&metadata, &paths.project) {
        // Do not leave an image without its sidecar.
        let _ = std::fs::remove_file(&paths.image);
        return Err(e);
    }

    log::info!(
        "Exported {}x{} composite to {}",
        composite.width(),
        composite.height(),
        paths.image.display()
    );
    Ok(paths)
}

/// Outcome of a finished export.
#[derive(Debug)]
pub struct ExportOutcome {
    /// Revision of the geometry the export was taken from.
    pub revision: u64,
    pub result: Result<ExportPaths>,
}

/// A running background export.
pub struct ExportJob {
    revision: u64,
    cancelled: Arc<AtomicBool>,
    receiver: Receiver<Result<ExportPaths>>,
}

impl ExportJob {
    /// Start exporting `request` on a worker thread.
    pub fn spawn(request: ExportRequest) -> Self {
        let (sender, receiver) = channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let revision = request.state.revision();
        let flag = Arc::clone(&cancelled);

        std::thread::spawn(move || {
            let result = run_export(&request, &flag);
            let _ = sender.send(result);
        });

        Self {
            revision,
            cancelled,
            receiver,
        }
    }

    /// Non-blocking check for completion.
    pub fn poll(&self) -> Option<ExportOutcome> {
        match self.receiver.try_recv() {
            Ok(result) => Some(self.outcome(result)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.outcome(Err(StereoError::WorkerDisconnected))),
        }
    }

    /// Block until the export finishes.
    pub fn wait(self) -> ExportOutcome {
        let result = self
            .receiver
            .recv()
            .unwrap_or(Err(StereoError::WorkerDisconnected));
        self.outcome(result)
    }

    /// Ask the worker to stop; nothing is written after this is observed.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn outcome(&self, result: Result<ExportPaths>) -> ExportOutcome {
        ExportOutcome {
            revision: self.revision,
            result,
        }
    }
}
