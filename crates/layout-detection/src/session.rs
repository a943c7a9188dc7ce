//! ONNX Runtime session construction for an explicitly chosen device

use crate::LayoutError;
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, CoreMLExecutionProvider,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use pagetext_common::Device;
use std::path::Path;
use tracing::info;

/// Create a session for `model_path` on `device`.
///
/// Accelerated devices still register the CPU provider last so that nodes
/// the accelerator cannot run fall back instead of failing the load.
pub fn create_session(model_path: &Path, device: Device) -> Result<Session, LayoutError> {
    if !model_path.exists() {
        return Err(LayoutError::ModelNotFound(model_path.to_path_buf()));
    }

    let builder = Session::builder()
        .map_err(load_error(model_path))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(load_error(model_path))?;

    let builder = match device {
        Device::Cpu => builder.with_execution_providers([CPUExecutionProvider::default().build()]),
        Device::Cuda => builder.with_execution_providers([
            CUDAExecutionProvider::default().build(),
            CPUExecutionProvider::default().build(),
        ]),
        Device::CoreMl => builder.with_execution_providers([
            CoreMLExecutionProvider::default().build(),
            CPUExecutionProvider::default().build(),
        ]),
    }
    .map_err(load_error(model_path))?;

    let session = builder.commit_from_file(model_path).map_err(load_error(model_path))?;
    info!("Loaded layout model {} on {}", model_path.display(), device);
    Ok(session)
}

fn load_error<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> LayoutError + '_ {
    move |e| LayoutError::ModelLoad {
        path: path.to_path_buf(),
        error: e.to_string(),
    }
}
