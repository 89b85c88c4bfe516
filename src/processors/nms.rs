//! Non-maximum suppression over detections.

use crate::domain::Detection;

/// Class-aware non-maximum suppression.
///
/// Detections are visited by descending score; a detection is dropped when
/// it overlaps an already kept detection of the same class by more than
/// `iou_threshold`. At most `max_detections` survive.
pub fn class_aware_nms(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut keep: Vec<Detection> = Vec::new();
    for candidate in detections {
        if keep.len() >= max_detections {
            break;
        }
        let suppressed = keep.iter().any(|kept| {
            kept.class_id == candidate.class_id && kept.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            keep.push(candidate);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundingBox;

    fn det(class_id: usize, score: f32, x: f32) -> Detection {
        Detection {
            bbox: BoundingBox::new(x, 0.0, x + 10.0, 10.0),
            class_id,
            label: class_id.to_string(),
            score,
        }
    }

    #[test]
    fn test_overlapping_same_class_is_suppressed() {
        let kept = class_aware_nms(vec![det(0, 0.6, 1.0), det(0, 0.9, 0.0)], 0.45, 300);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.9);
    }

    #[test]
    fn test_other_classes_survive_overlap() {
        let kept = class_aware_nms(vec![det(0, 0.9, 0.0), det(1, 0.8, 0.0)], 0.45, 300);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_max_detections_cap() {
        let dets = (0..5).map(|i| det(0, 0.5, i as f32 * 20.0)).collect();
        assert_eq!(class_aware_nms(dets, 0.45, 3).len(), 3);
    }
}
