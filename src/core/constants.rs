//! Constants used throughout the pipeline.
//!
//! Default values for preprocessing, postprocessing, annotation and the
//! per-call inference timeout.

/// The default inference timeout in milliseconds.
pub const DEFAULT_INFERENCE_TIMEOUT_MS: u64 = 30_000;

/// The default quality used when encoding the canonical JPEG output.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// The default square input size for box detectors.
pub const DEFAULT_DETECTION_INPUT_SIZE: u32 = 640;

/// The default minimum confidence for a detection to be kept.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.25;

/// The default IoU above which overlapping boxes of the same class are suppressed.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// The default maximum number of detections kept after NMS.
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

/// The gray value used to pad letterboxed detector inputs.
pub const LETTERBOX_FILL: u8 = 114;

/// The default minimum region detection confidence for landmark pipelines.
pub const DEFAULT_MIN_DETECTION_CONFIDENCE: f32 = 0.5;

/// The default minimum landmark presence confidence for landmark pipelines.
pub const DEFAULT_MIN_TRACKING_CONFIDENCE: f32 = 0.5;

/// The default maximum number of landmark sets returned per image.
pub const DEFAULT_MAX_LANDMARK_SETS: usize = 2;

/// The default directory holding the bundled landmark models.
pub const DEFAULT_LANDMARK_ASSETS_DIR: &str = "assets/landmarks";

/// The default outline thickness of detection boxes, in pixels.
pub const DEFAULT_BOX_THICKNESS: u32 = 3;

/// The default font size of detection captions, in pixels.
pub const DEFAULT_LABEL_FONT_SIZE: f32 = 18.0;

/// The minimum height of the caption band added below classified images.
pub const MIN_CAPTION_BAND_HEIGHT: u32 = 48;

/// File name of the model inside a detector bundle directory.
pub const DETECTOR_BUNDLE_MODEL: &str = "model.onnx";

/// File name of the optional label list inside a detector bundle directory.
pub const DETECTOR_BUNDLE_LABELS: &str = "labels.txt";
