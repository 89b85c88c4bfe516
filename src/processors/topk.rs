//! Top-k selection over classifier outputs.

/// Converts logits into probabilities.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|v| v / sum).collect()
    } else {
        exps
    }
}

/// Returns the `k` highest `(index, score)` pairs, best first.
///
/// NaN scores sort last.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| match (a.1.is_nan(), b.1.is_nan()) {
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        _ => b.1.total_cmp(&a.1),
    });
    indexed.truncate(k);
    indexed
}

/// Returns the best `(index, score)` pair, or `None` for an empty slice.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    top_k(scores, 1).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one_and_keeps_order() {
        let probs = softmax(&[1.0, 3.0, 2.0]);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert_eq!(argmax(&probs).map(|(i, _)| i), Some(1));
    }

    #[test]
    fn test_top_k() {
        let top = top_k(&[0.1, 0.5, f32::NAN, 0.4], 3);
        assert_eq!(top.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 3, 0]);
        assert_eq!(argmax(&[]), None);
    }
}
