// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! An open stereo document.
//!
//! Owns the eye images, the geometry state, the edit-mode engine and at
//! most one pending export. Opening a project sidecar loads the original
//! it names and restores the saved geometry onto it.

use crate::engine::transform::{
    compute_eye_rect, EngineAction, EyeRect, InputEvent, TransformEngine, ViewContext,
};
use crate::error::{Result, StereoError};
use crate::io::export::{ExportJob, ExportOutcome, ExportPaths, ExportRequest};
use crate::io::file_group::suffix_index;
use crate::io::media::{is_project_file, load_eye_images, SourceFamily, PROJECT_EXTENSION};
use crate::io::serialization::import_json;
use crate::models::geometry::{Eye, GeometryState};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Document {
    /// File the user opened (a source or a sidecar).
    pub path: PathBuf,
    /// Original source the geometry applies to.
    pub source: PathBuf,
    pub family: SourceFamily,
    pub left: Arc<RgbImage>,
    pub right: Arc<RgbImage>,
    pub state: GeometryState,
    engine: TransformEngine,
    export: Option<ExportJob>,
}

impl Document {
    /// Load a stereo source or a project sidecar. An exported composite
    /// with its sidecar beside it is opened through the sidecar, so edits
    /// always apply to the original.
    pub fn open(path: &Path) -> Result<Self> {
        let mut state = GeometryState::new();
        let sidecar = if is_project_file(path) {
            Some(path.to_path_buf())
        } else {
            composite_sidecar(path)
        };
        let source = match sidecar {
            Some(sidecar) => {
                let metadata = import_json(&sidecar)?;
                metadata.apply_to(&mut state);
                let dir = sidecar.parent().unwrap_or_else(|| Path::new(""));
                log::info!("Restored project {} for {}", sidecar.display(), metadata.filename);
                dir.join(&metadata.filename)
            }
            None => path.to_path_buf(),
        };

        let eyes = load_eye_images(&source)?;
        Ok(Self {
            path: path.to_path_buf(),
            source,
            family: eyes.family,
            left: Arc::new(eyes.left),
            right: Arc::new(eyes.right),
            state,
            engine: TransformEngine::new(),
            export: None,
        })
    }

    pub fn image_size(&self) -> (f64, f64) {
        (self.left.width() as f64, self.left.height() as f64)
    }

    pub fn view(&self, surface: (f64, f64)) -> ViewContext {
        ViewContext {
            surface,
            image: self.image_size(),
        }
    }

    pub fn engine(&self) -> &TransformEngine {
        &self.engine
    }

    pub fn handle_input(&mut self, event: InputEvent, surface: (f64, f64)) -> EngineAction {
        let view = self.view(surface);
        self.engine.handle(event, &mut self.state, &view)
    }

    pub fn reset_input(&mut self) {
        self.engine.reset();
    }

    pub fn eye_rect(&self, eye: Eye, surface: (f64, f64)) -> EyeRect {
        compute_eye_rect(&self.state, eye, &self.view(surface))
    }

    pub fn fit_to_surface(&mut self, surface: (f64, f64)) {
        let image = self.image_size();
        self.state.fit_to_surface(image, surface);
    }

    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    /// Start exporting a snapshot of the current state in the background.
    pub fn start_export(&mut self) -> Result<()> {
        if self.export.is_some() {
            return Err(StereoError::ExportInProgress);
        }
        let request = ExportRequest {
            original: self.source.clone(),
            family: self.family,
            left: Arc::clone(&self.left),
            right: Arc::clone(&self.right),
            state: self.state.clone(),
        };
        log::info!("Exporting {}", self.source.display());
        self.export = Some(ExportJob::spawn(request));
        Ok(())
    }

    /// Collect a finished export, if any.
    pub fn poll_export(&mut self) -> Option<Result<ExportPaths>> {
        let outcome = self.export.as_ref()?.poll()?;
        self.export = None;
        Some(self.finish_export(outcome))
    }

    /// Block until a pending export completes. Used before switching away
    /// from this document.
    pub fn wait_for_export(&mut self) -> Option<Result<ExportPaths>> {
        let job = self.export.take()?;
        log::info!("Waiting for pending export of {}", self.source.display());
        Some(self.finish_export(job.wait()))
    }

    /// Cancel any pending export without waiting for it.
    pub fn close(&mut self) {
        if let Some(job) = self.export.take() {
            log::info!("Cancelling export of {}", self.source.display());
            job.cancel();
        }
    }

    fn finish_export(&mut self, outcome: ExportOutcome) -> Result<ExportPaths> {
        if outcome.result.is_ok() {
            self.state.mark_saved(outcome.revision);
        }
        outcome.result
    }
}

/// The sidecar written alongside an exported composite, if `path` is one.
fn composite_sidecar(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    suffix_index(name)?;
    let sidecar = path.with_extension(PROJECT_EXTENSION);
    sidecar.is_file().then_some(sidecar)
}

impl Drop for Document {
    fn drop(&mut self) {
        self.close();
    }
}
