//! Runs inference strategies against backends under a timeout.
//!
//! Each call runs on a helper thread so the caller can stop waiting once the
//! timeout expires. The call itself is not cancelled: it finishes in the
//! background and its result is dropped. Panics inside strategies or
//! backends are caught and reported as inference errors.

use super::registry::StrategyRegistry;
use crate::core::errors::PipelineError;
use crate::core::traits::{Backend, InferenceStrategy};
use crate::domain::{ModelDescriptor, RawResult};
use image::RgbImage;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Selects the strategy for a model and runs it.
#[derive(Debug)]
pub struct InferenceDispatcher {
    registry: StrategyRegistry,
    timeout: Option<Duration>,
}

impl InferenceDispatcher {
    /// `timeout` bounds every backend call; `None` waits indefinitely.
    pub fn new(registry: StrategyRegistry, timeout: Option<Duration>) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolves the strategy for `descriptor`.
    pub fn strategy_for(
        &self,
        descriptor: &ModelDescriptor,
    ) -> Result<Arc<dyn InferenceStrategy>, PipelineError> {
        self.registry.resolve(descriptor)
    }

    /// Runs the descriptor's strategy on `image`.
    pub fn dispatch(
        &self,
        backend: Arc<dyn Backend>,
        descriptor: &ModelDescriptor,
        image: Arc<RgbImage>,
    ) -> Result<RawResult, PipelineError> {
        let strategy = self.strategy_for(descriptor)?;
        self.run_strategy(strategy, backend, image)
    }

    /// Runs `strategy` on `image` and checks the result against its family.
    ///
    /// The backend must have been loaded for the strategy's format.
    pub fn run_strategy(
        &self,
        strategy: Arc<dyn InferenceStrategy>,
        backend: Arc<dyn Backend>,
        image: Arc<RgbImage>,
    ) -> Result<RawResult, PipelineError> {
        let model = backend.name().to_string();
        let family = strategy.family();
        if backend.format() != strategy.format() {
            return Err(PipelineError::inference_msg(
                &model,
                format!(
                    "{} backend cannot serve a {} strategy",
                    backend.format(),
                    strategy.format()
                ),
            ));
        }
        let start = Instant::now();

        let result = match self.timeout {
            Some(timeout) => run_with_timeout(strategy, backend, image, timeout, &model)?,
            None => panic::catch_unwind(AssertUnwindSafe(|| {
                strategy.infer(backend.as_ref(), &image)
            }))
            .map_err(|payload| panicked(&model, payload.as_ref()))??,
        };

        if !result.matches_family(family) {
            return Err(PipelineError::inference_msg(
                &model,
                format!("produced a {} result for a {family:?} model", result.kind_name()),
            ));
        }

        tracing::debug!(
            model = %model,
            result = result.kind_name(),
            findings = result.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "inference finished"
        );
        Ok(result)
    }
}

fn run_with_timeout(
    strategy: Arc<dyn InferenceStrategy>,
    backend: Arc<dyn Backend>,
    image: Arc<RgbImage>,
    timeout: Duration,
    model: &str,
) -> Result<RawResult, PipelineError> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name(format!("infer-{model}"))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                strategy.infer(backend.as_ref(), &image)
            }));
            // The receiver is gone once the caller timed out.
            let _ = tx.send(outcome);
        })
        .map_err(|e| PipelineError::inference(model, "failed to spawn inference thread", e))?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(result)) => result,
        Ok(Err(payload)) => Err(panicked(model, payload.as_ref())),
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(model, timeout_ms = timeout.as_millis() as u64, "inference timed out");
            Err(PipelineError::inference_msg(
                model,
                format!("timed out after {} ms", timeout.as_millis()),
            ))
        }
        Err(RecvTimeoutError::Disconnected) => Err(PipelineError::inference_msg(
            model,
            "inference thread exited without a result",
        )),
    }
}

/// Extracts the message of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn panicked(model: &str, payload: &(dyn Any + Send)) -> PipelineError {
    PipelineError::inference_msg(
        model,
        format!("backend panicked: {}", panic_message(payload)),
    )
}
