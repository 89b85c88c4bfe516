use super::*;
use crate::core::config::OrtSessionConfig;

#[test]
fn test_from_file_missing_model_is_load_error() {
    let result = OrtInfer::from_file("dummy_path.onnx", None);
    assert!(matches!(result, Err(PipelineError::ModelLoad { .. })));
}

#[test]
fn test_from_memory_respects_config_and_rejects_garbage() {
    let config = OrtSessionConfig::new().with_intra_threads(1);
    let result = OrtInfer::from_memory(&[0u8; 16], "garbage", Some(&config));
    match result {
        Err(PipelineError::ModelLoad { location, .. }) => {
            assert_eq!(location, "<memory: 16 bytes>");
        }
        other => panic!("expected ModelLoad error, got {:?}", other),
    }
}
