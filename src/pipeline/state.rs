//! Processing states of one request.

use std::fmt;

/// Where a request is in its lifecycle.
///
/// Requests move `Idle -> Loading -> Inferring -> Annotating -> Encoding -> Done`.
/// Any stage may move to `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    Loading,
    Inferring,
    Annotating,
    Encoding,
    Done,
    Failed,
}

impl PipelineState {
    /// The state that follows this one on success. Terminal states return themselves.
    pub fn next(self) -> Self {
        match self {
            PipelineState::Idle => PipelineState::Loading,
            PipelineState::Loading => PipelineState::Inferring,
            PipelineState::Inferring => PipelineState::Annotating,
            PipelineState::Annotating => PipelineState::Encoding,
            PipelineState::Encoding => PipelineState::Done,
            PipelineState::Done => PipelineState::Done,
            PipelineState::Failed => PipelineState::Failed,
        }
    }

    /// Whether no further transition can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Loading => "loading",
            PipelineState::Inferring => "inferring",
            PipelineState::Annotating => "annotating",
            PipelineState::Encoding => "encoding",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_reaches_done() {
        let mut state = PipelineState::Idle;
        let mut visited = vec![state];
        while !state.is_terminal() {
            state = state.next();
            visited.push(state);
        }
        assert_eq!(
            visited.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            ["idle", "loading", "inferring", "annotating", "encoding", "done"]
        );
        assert_eq!(PipelineState::Failed.next(), PipelineState::Failed);
    }
}
