//! ONNX Runtime style models.
//!
//! Models take an NCHW float tensor `[1, 3, edge, edge]` with values in
//! 0..255 and return a tensor of the same layout. The compute preference
//! picks the execution providers registered on the session.

use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::execution_providers::coreml::CoreMLComputeUnits;
use ort::execution_providers::{
    CPUExecutionProvider, CoreMLExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::Session;
use ort::value::Tensor;

use super::{InferenceError, InferenceRunner, OutputBuffer};
use crate::capture::{Frame, PixelFormat};
use crate::control::{ComputeUnits, StyleId};
use crate::display::to_rgba_image;
use crate::models::ModelDescriptor;

/// Default square input edge of the bundled style models.
pub const DEFAULT_INPUT_EDGE: u32 = 512;

/// A loaded session bound to one style and one preference.
pub struct OnnxModel {
    session: Session,
    style: StyleId,
    units: ComputeUnits,
}

impl OnnxModel {
    /// Style this session was loaded for.
    pub fn style(&self) -> StyleId {
        self.style
    }

    /// Preference the session was built with.
    pub fn units(&self) -> ComputeUnits {
        self.units
    }
}

/// Runner backed by ONNX Runtime sessions.
#[derive(Debug, Clone)]
pub struct OnnxRunner {
    input_edge: u32,
    intra_threads: usize,
}

impl Default for OnnxRunner {
    fn default() -> Self {
        Self {
            input_edge: DEFAULT_INPUT_EDGE,
            intra_threads: 2,
        }
    }
}

impl OnnxRunner {
    /// Creates a runner resizing frames to `input_edge` square.
    pub fn new(input_edge: u32) -> Self {
        Self {
            input_edge: input_edge.max(1),
            ..Self::default()
        }
    }

    fn execution_providers(units: ComputeUnits) -> Vec<ExecutionProviderDispatch> {
        let cpu = CPUExecutionProvider::default().build();
        match units {
            ComputeUnits::Automatic => vec![
                CoreMLExecutionProvider::default()
                    .with_compute_units(CoreMLComputeUnits::All)
                    .build(),
                cpu,
            ],
            ComputeUnits::CpuAndAccelerator => vec![
                CoreMLExecutionProvider::default()
                    .with_compute_units(CoreMLComputeUnits::CPUAndGPU)
                    .build(),
                cpu,
            ],
            ComputeUnits::CpuOnly => vec![cpu],
        }
    }

    /// Resizes the frame to the model input and lays it out as NCHW.
    fn preprocess(&self, frame: &Frame) -> Array4<f32> {
        let rgba = to_rgba_image(frame.pixels(), frame.width(), frame.height(), frame.format());
        let resized = imageops::resize(&rgba, self.input_edge, self.input_edge, FilterType::Triangle);

        let edge = self.input_edge as usize;
        let mut input = Array4::<f32>::zeros((1, 3, edge, edge));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            input[[0, 0, y, x]] = pixel[0] as f32;
            input[[0, 1, y, x]] = pixel[1] as f32;
            input[[0, 2, y, x]] = pixel[2] as f32;
        }
        input
    }
}

impl InferenceRunner for OnnxRunner {
    type Model = OnnxModel;

    fn instantiate(
        &self,
        descriptor: &ModelDescriptor,
        units: ComputeUnits,
    ) -> Result<OnnxModel, InferenceError> {
        if !descriptor.exists() {
            return Err(InferenceError::ArtifactMissing(descriptor.path.clone()));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError::Load(format!("failed to create session builder: {}", e)))?
            .with_execution_providers(Self::execution_providers(units))
            .map_err(|e| InferenceError::Load(format!("failed to register execution providers: {}", e)))?
            .with_intra_threads(self.intra_threads)
            .map_err(|e| InferenceError::Load(format!("failed to set threads: {}", e)))?
            .commit_from_file(&descriptor.path)
            .map_err(|e| InferenceError::Load(format!("{:?}: {}", descriptor.path, e)))?;

        tracing::info!(style = %descriptor.style, ?units, path = ?descriptor.path, "Loaded style model");

        Ok(OnnxModel {
            session,
            style: descriptor.style,
            units,
        })
    }

    fn run(&self, model: &mut OnnxModel, frame: &Frame) -> Result<OutputBuffer, InferenceError> {
        let input = Tensor::from_array(self.preprocess(frame))
            .map_err(|e| InferenceError::Run(format!("failed to create input tensor: {}", e)))?;

        let outputs = model
            .session
            .run(ort::inputs![input])
            .map_err(|e| InferenceError::Run(e.to_string()))?;

        let (_, value) = outputs.iter().next().ok_or(InferenceError::NoOutput)?;
        let (shape, data) = value
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Run(format!("failed to extract output: {}", e)))?;

        let dims: Vec<i64> = shape.iter().copied().collect();
        let (height, width) = match dims.as_slice() {
            [1, 3, h, w] if *h > 0 && *w > 0 => (*h as usize, *w as usize),
            _ => return Err(InferenceError::UnexpectedShape(dims)),
        };

        let plane = height * width;
        let mut pixels = Vec::with_capacity(plane * 3);
        for i in 0..plane {
            for c in 0..3 {
                pixels.push(data[c * plane + i].clamp(0.0, 255.0) as u8);
            }
        }

        Ok(OutputBuffer::new(
            pixels,
            width as u32,
            height as u32,
            PixelFormat::Rgb8,
        )?)
    }
}
