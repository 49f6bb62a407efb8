use crate::item::WheelItem;
use std::f64::consts::TAU;

/// Angular slice of the wheel assigned to one item, in the wheel's own frame
/// (angle `0` is under the pointer when the rotation is `0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<'a> {
    pub item: &'a WheelItem,
    pub start: f64,
    pub end: f64,
    pub weight: f64,
}

impl Segment<'_> {
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    pub fn mid(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.start && angle < self.end
    }
}

/// Lay `items` around the circle in order, each taking a share of the turn
/// proportional to its weight. The last segment always ends at exactly `2π`.
pub fn build_segments(items: &[WheelItem]) -> Vec<Segment<'_>> {
    let total: f64 = items.iter().map(WheelItem::effective_weight).sum();
    if items.is_empty() || total <= 0.0 {
        return Vec::new();
    }

    let mut cursor = 0.0;
    let mut segments: Vec<_> = items
        .iter()
        .map(|item| {
            let weight = item.effective_weight();
            let start = cursor;
            cursor += weight / total * TAU;
            Segment {
                item,
                start,
                end: cursor,
                weight,
            }
        })
        .collect();

    if let Some(last) = segments.last_mut() {
        last.end = TAU;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    fn items(weights: &[f64]) -> Vec<WheelItem> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| WheelItem::new(format!("i{i}"), format!("Item {i}"), *w))
            .collect()
    }

    #[test]
    fn test_weighted_scenario() {
        let list = vec![
            WheelItem::new("a", "A", 1.0),
            WheelItem::new("b", "B", 1.0),
            WheelItem::new("c", "C", 2.0),
        ];
        let segs = build_segments(&list);
        assert_eq!(segs.len(), 3);
        assert_eq!(segs[0].start, 0.0);
        assert!((segs[0].end - PI / 2.0).abs() < 1e-12);
        assert!((segs[1].end - PI).abs() < 1e-12);
        assert_eq!(segs[2].end, TAU);
        assert_eq!(segs[2].item.id.as_str(), "c");
    }

    #[test]
    fn test_single_item_spans_full_turn() {
        let list = vec![WheelItem::new("x", "X", 5.0)];
        let segs = build_segments(&list);
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].start, 0.0);
        assert_eq!(segs[0].end, TAU);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_segments(&[]).is_empty());
    }

    #[test]
    fn test_invalid_weights_count_as_one() {
        let list = items(&[0.0, -1.0, f64::NAN, 1.0]);
        let segs = build_segments(&list);
        for s in &segs {
            assert_eq!(s.weight, 1.0);
            assert!((s.span() - PI / 2.0).abs() < 1e-12);
        }
    }

    proptest! {
        #[test]
        fn prop_segments_cover_circle(weights in prop::collection::vec(0.01f64..100.0, 1..60)) {
            let list = items(&weights);
            let segs = build_segments(&list);
            prop_assert_eq!(segs.len(), list.len());
            prop_assert_eq!(segs[0].start, 0.0);
            prop_assert_eq!(segs[segs.len() - 1].end, TAU);
            for pair in segs.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
                prop_assert!(pair[0].start < pair[0].end);
            }
        }

        #[test]
        fn prop_heavier_item_gets_wider(
            weights in prop::collection::vec(0.1f64..50.0, 2..20),
            pick in any::<prop::sample::Index>(),
            extra in 0.5f64..50.0,
        ) {
            let idx = pick.index(weights.len());
            let before = items(&weights);
            let mut heavier = weights.clone();
            heavier[idx] += extra;
            let after = items(&heavier);

            let old = build_segments(&before);
            let new = build_segments(&after);
            prop_assert!(new[idx].span() > old[idx].span());
            prop_assert!(
                old.iter()
                    .zip(&new)
                    .enumerate()
                    .any(|(i, (o, n))| i != idx && n.span() < o.span())
            );
        }
    }
}
