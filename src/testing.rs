//! In-process fakes shared by the unit tests.

use crate::core::errors::PipelineError;
use crate::core::inference::TensorOutputs;
use crate::core::traits::{Backend, BackendInput};
use crate::domain::ModelFormat;
use ab_glyph::FontVec;
use image::{ImageFormat, Rgb, RgbImage};
use ndarray::{ArrayD, IxDyn};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a [`FakeBackend`] does when invoked.
#[derive(Debug, Clone)]
pub enum FakeBehavior {
    /// Returns the outputs.
    Outputs(TensorOutputs),
    /// Sleeps, then returns the outputs.
    Slow(Duration, TensorOutputs),
    /// Fails with an inference error.
    Fail(String),
    /// Panics.
    Panic,
}

#[derive(Debug)]
pub struct FakeBackend {
    pub name: String,
    pub format: ModelFormat,
    pub behavior: FakeBehavior,
    pub class_names: Option<Vec<String>>,
    pub input_size: Option<(u32, u32)>,
    pub calls: AtomicUsize,
    pub last_input: Mutex<Option<String>>,
}

impl FakeBackend {
    pub fn new(format: ModelFormat, outputs: TensorOutputs) -> Self {
        Self::with_behavior(format, FakeBehavior::Outputs(outputs))
    }

    pub fn with_behavior(format: ModelFormat, behavior: FakeBehavior) -> Self {
        Self {
            name: format!("fake-{format}"),
            format,
            behavior,
            class_names: None,
            input_size: None,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Description of the most recent input.
    pub fn last_input(&self) -> Option<String> {
        self.last_input.lock().unwrap().clone()
    }
}

impl Backend for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> ModelFormat {
        self.format
    }

    fn run(&self, input: BackendInput<'_>) -> Result<TensorOutputs, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(input.describe());
        match &self.behavior {
            FakeBehavior::Outputs(outputs) => Ok(outputs.clone()),
            FakeBehavior::Slow(delay, outputs) => {
                std::thread::sleep(*delay);
                Ok(outputs.clone())
            }
            FakeBehavior::Fail(message) => Err(PipelineError::inference_msg(&self.name, message)),
            FakeBehavior::Panic => panic!("fake backend exploded"),
        }
    }

    fn class_names(&self) -> Option<&[String]> {
        self.class_names.as_deref()
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        self.input_size
    }
}

/// A single-output tensor set.
pub fn single_output(shape: &[usize], data: Vec<f32>) -> TensorOutputs {
    let array = ArrayD::from_shape_vec(IxDyn(shape), data).expect("shape matches data");
    TensorOutputs::new().with("output0", array)
}

/// YOLO output `[1, 84, 1]` holding one box for COCO class `class_id`.
pub fn yolo_single_box(
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    class_id: usize,
    score: f32,
) -> TensorOutputs {
    let mut data = vec![0.0f32; 84];
    data[0] = cx;
    data[1] = cy;
    data[2] = w;
    data[3] = h;
    data[4 + class_id] = score;
    single_output(&[1, 84, 1], data)
}

/// Landmark pipeline outputs with `sets` sets of `points` points.
pub fn landmark_outputs(sets: usize, points: usize) -> TensorOutputs {
    let mut coords = Vec::with_capacity(sets * points * 3);
    for s in 0..sets {
        for p in 0..points {
            coords.push((p as f32 + 1.0) / (points as f32 + 2.0));
            coords.push((s as f32 + 1.0) / (sets as f32 + 2.0));
            coords.push(0.0);
        }
    }
    TensorOutputs::new()
        .with(
            "landmarks",
            ArrayD::from_shape_vec(IxDyn(&[sets, points, 3]), coords).expect("landmark shape"),
        )
        .with(
            "scores",
            ArrayD::from_shape_vec(IxDyn(&[sets]), vec![0.9; sets]).expect("score shape"),
        )
}

/// Encodes a solid image in the given format.
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 90, 160]));
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, format).expect("encode test image");
    cursor.into_inner()
}

/// Path of the caption font shipped with the test fixtures.
pub fn fixture_font_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSans.ttf")
}

/// The fixture caption font.
pub fn fixture_font() -> FontVec {
    crate::utils::visualization::read_font(&fixture_font_path()).expect("fixture font parses")
}
