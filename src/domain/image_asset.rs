//! Uploaded source images.

/// An uploaded raster image awaiting (or having received) processing.
///
/// The bytes and metadata never change after creation. The `processed` flag
/// is raised by the orchestrator once an artifact has been produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    id: String,
    name: Option<String>,
    bytes: Vec<u8>,
    format_tag: String,
    processed: bool,
}

impl ImageAsset {
    /// Creates an unprocessed asset from raw bytes and their declared format tag.
    pub fn new(id: impl Into<String>, bytes: Vec<u8>, format_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            bytes,
            format_tag: format_tag.into(),
            processed: false,
        }
    }

    /// Attaches the uploaded file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Asset id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Uploaded file name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Raw encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared format tag, e.g. `jpeg` or `png`.
    pub fn format_tag(&self) -> &str {
        &self.format_tag
    }

    /// Size of the encoded bytes.
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// Whether a processed artifact exists for this asset.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    pub(crate) fn mark_processed(&mut self) {
        self.processed = true;
    }
}
