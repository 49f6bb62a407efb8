//! Splitting of oversized wedges and padding of sparse wheels.
//!
//! A wedge whose rim chord is much wider than a poster looks empty, so heavy
//! items are cut into fragments that are spread around the circle. Wheels with
//! only a handful of entries are padded with repeats so they still read as a
//! wheel.

use crate::geometry::{OVERSCAN, chord, poster_width};
use crate::item::{ItemId, SliceInfo, WheelItem};
use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};

/// Fewest entries a wheel is padded up to.
pub const MIN_N: usize = 6;
/// Hard cap on entries after splitting and padding.
pub const MAX_N: usize = 200;
/// Most fragments a single item is cut into.
pub const MAX_PARTS: usize = 12;

/// Number of fragments needed so that every fragment of a wedge spanning
/// `span` radians fits the poster budget at `outer_radius`.
///
/// Spans of half a turn or more are measured by the diameter rather than the
/// chord, which would shrink back towards zero. The count starts from that
/// width over the budget and is then raised until each fragment's own chord
/// fits, up to [`MAX_PARTS`].
pub fn parts_for(span: f64, outer_radius: f64) -> usize {
    let limit = poster_width(outer_radius) * OVERSCAN;
    if limit <= 0.0 || !span.is_finite() || span <= 0.0 {
        return 1;
    }

    // past a half turn the chord shrinks again, the diameter is the honest width
    let width = if span >= PI {
        2.0 * outer_radius
    } else {
        chord(outer_radius, span)
    };
    let mut parts = ((width / limit).ceil() as usize).clamp(1, MAX_PARTS);
    while parts < MAX_PARTS && chord(outer_radius, span / parts as f64) > limit {
        parts += 1;
    }
    parts
}

/// Split, interleave and pad `items` for a wheel of `outer_radius`.
///
/// The winner is never split so the spin always has a single wedge to aim at.
/// Without usable geometry the input comes back unchanged.
pub fn expand(
    items: &[WheelItem],
    winner_id: Option<&ItemId>,
    outer_radius: Option<f64>,
) -> Vec<WheelItem> {
    let Some(radius) = outer_radius.filter(|r| r.is_finite() && *r > 0.0) else {
        return items.to_vec();
    };
    if items.is_empty() {
        return Vec::new();
    }

    let total = match items.iter().map(WheelItem::effective_weight).sum::<f64>() {
        t if t > 0.0 => t,
        _ => 1.0,
    };

    let mut winner_pack = None;
    let mut packs: Vec<VecDeque<WheelItem>> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let is_winner = winner_id.is_some_and(|w| item.origin_id() == w);
            if is_winner && winner_pack.is_none() {
                winner_pack = Some(index);
            }
            let weight = item.effective_weight();
            let parts = if is_winner {
                1
            } else {
                parts_for(weight / total * TAU, radius)
            };
            split(item, weight, parts)
        })
        .collect();

    let mut out = interleave(&mut packs);
    keep_winner(&mut out, &mut packs, winner_pack);
    pad(&mut out);
    out
}

fn split(item: &WheelItem, weight: f64, parts: usize) -> VecDeque<WheelItem> {
    if parts <= 1 {
        return VecDeque::from([item.clone()]);
    }

    let origin = item.origin_id().clone();
    (0..parts)
        .map(|index| WheelItem {
            id: ItemId::new(format!("{origin}#{index}")),
            weight: weight / parts as f64,
            slice: Some(SliceInfo {
                index,
                count: parts,
                of: origin.clone(),
            }),
            ..item.clone()
        })
        .collect()
}

/// Take one fragment from every pack per pass so repeats of an item never sit
/// next to each other.
fn interleave(packs: &mut [VecDeque<WheelItem>]) -> Vec<WheelItem> {
    let expected: usize = packs.iter().map(VecDeque::len).sum();
    let mut out = Vec::with_capacity(expected.min(MAX_N));
    let mut guard = 0;

    while out.len() < MAX_N && guard <= expected {
        guard += 1;
        let mut took = false;
        for pack in packs.iter_mut() {
            if out.len() >= MAX_N {
                break;
            }
            if let Some(fragment) = pack.pop_front() {
                out.push(fragment);
                took = true;
            }
        }
        if !took {
            break;
        }
    }
    out
}

/// The cap may stop the round-robin before it reaches the winner's pack; the
/// winner then takes the last slot.
fn keep_winner(
    out: &mut Vec<WheelItem>,
    packs: &mut [VecDeque<WheelItem>],
    winner_pack: Option<usize>,
) {
    let Some(winner) = winner_pack.and_then(|i| packs.get_mut(i)?.pop_front()) else {
        return;
    };
    if out.len() >= MAX_N {
        out.pop();
    }
    out.push(winner);
}

fn pad(out: &mut Vec<WheelItem>) {
    let placed = out.len();
    if placed == 0 {
        return;
    }
    let target = MIN_N.min(MAX_N);
    let mut i = 0;
    while out.len() < target {
        let copy = out[i % placed].clone();
        out.push(copy);
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::build_segments;
    use crate::spin::pick_target;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn items(weights: &[f64]) -> Vec<WheelItem> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| WheelItem::new(format!("i{i}"), format!("Item {i}"), *w))
            .collect()
    }

    fn fragment_chords_fit(list: &[WheelItem], radius: f64) -> bool {
        let limit = poster_width(radius) * OVERSCAN;
        build_segments(list)
            .iter()
            .filter(|s| s.item.is_fragment())
            .all(|s| chord(radius, s.span()) <= limit + 1e-9)
    }

    #[test]
    fn test_no_geometry_returns_input() {
        let list = items(&[1.0, 5.0]);
        assert_eq!(expand(&list, None, None), list);
        assert_eq!(expand(&list, None, Some(0.0)), list);
        assert_eq!(expand(&list, None, Some(f64::NAN)), list);
    }

    #[test]
    fn test_empty_stays_empty() {
        assert!(expand(&[], None, Some(300.0)).is_empty());
    }

    #[test]
    fn test_winner_is_never_split() {
        // two equal halves: each wedge is far wider than a poster
        let list = vec![WheelItem::new("a", "A", 1.0), WheelItem::new("b", "B", 1.0)];
        let out = expand(&list, Some(&ItemId::from("a")), Some(300.0));

        let a: Vec<_> = out.iter().filter(|i| i.matches(&ItemId::from("a"))).collect();
        assert!(a.iter().all(|i| !i.is_fragment()));
        assert!(out.iter().any(|i| i.slice.as_ref().is_some_and(|s| s.of.as_str() == "b")));
    }

    #[test]
    fn test_fragments_are_interleaved() {
        let list = items(&[1.0, 1.0, 1.0]);
        let out = expand(&list, None, Some(300.0));
        assert!(out.len() > 3);
        for pair in out.windows(2) {
            assert_ne!(pair[0].origin_id(), pair[1].origin_id());
        }
    }

    #[test]
    fn test_fragment_weights_sum_to_original() {
        let list = items(&[3.0, 1.0]);
        let out = expand(&list, None, Some(300.0));
        let sum: f64 = out
            .iter()
            .filter(|i| i.origin_id().as_str() == "i0")
            .map(|i| i.weight)
            .sum();
        assert!((sum - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_padding_small_wheel() {
        // tiny radius: nothing needs splitting, so only padding applies
        let list = items(&[1.0, 1.0]);
        let out = expand(&list, None, Some(1.0));
        assert_eq!(out.len(), MIN_N);
        assert_eq!(out[2].id, out[0].id);
        assert_eq!(out[3].id, out[1].id);
    }

    #[test]
    fn test_growth_is_capped() {
        let list = items(&vec![1.0; 150]);
        let mut heavy = list.clone();
        heavy[0].weight = 1000.0;
        let out = expand(&heavy, None, Some(5000.0));
        assert!(out.len() <= MAX_N);
    }

    #[test]
    fn test_cap_keeps_winner_from_the_tail() {
        let list = items(&vec![1.0; 250]);
        let winner = ItemId::from("i240");
        let out = expand(&list, Some(&winner), Some(300.0));

        assert_eq!(out.len(), MAX_N);
        let hits: Vec<_> = out.iter().filter(|i| i.matches(&winner)).collect();
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].is_fragment());

        let mut rng = Pcg32::seed_from_u64(240);
        let target = pick_target(&out, &winner, &mut rng);
        assert!(target.segment.is_some());
    }

    #[test]
    fn test_parts_for_full_turn() {
        // a lone item has no chord at all, it still gets cut into poster-sized wedges
        let parts = parts_for(TAU, 1.0e6);
        assert!(parts > 1 && parts <= MAX_PARTS);
        assert!(chord(1.0e6, TAU / parts as f64) <= poster_width(1.0e6) * OVERSCAN);
        assert_eq!(parts_for(0.0001, 300.0), 1);
    }

    #[test]
    fn test_parts_for_wide_span_fits_each_fragment() {
        let radius = 2000.0;
        let limit = poster_width(radius) * OVERSCAN;
        // the chord of 1.8π is shorter than that of π, the count must not drop
        assert!(parts_for(1.8 * PI, radius) >= parts_for(PI, radius));
        for span in [PI, 1.5 * PI, 1.8 * PI] {
            let parts = parts_for(span, radius);
            assert!(chord(radius, span / parts as f64) <= limit);
        }
    }

    proptest! {
        #[test]
        fn prop_winner_survives_as_single_pack(
            weights in prop::collection::vec(0.1f64..10.0, 1..40),
            pick in any::<prop::sample::Index>(),
            radius in 10.0f64..800.0,
        ) {
            let list = items(&weights);
            let winner = list[pick.index(list.len())].id.clone();
            let out = expand(&list, Some(&winner), Some(radius));

            let hits: Vec<_> = out.iter().filter(|i| i.matches(&winner)).collect();
            prop_assert!(!hits.is_empty());
            prop_assert!(hits.iter().all(|i| !i.is_fragment()));
        }

        #[test]
        fn prop_padding_minimum(
            weights in prop::collection::vec(0.1f64..10.0, 1..MIN_N),
            radius in 10.0f64..800.0,
        ) {
            let out = expand(&items(&weights), None, Some(radius));
            prop_assert!(out.len() >= MIN_N.min(MAX_N));
        }

        #[test]
        fn prop_fragment_chords_fit(
            weights in prop::collection::vec(1.0f64..5.0, 2..30),
            radius in 50.0f64..600.0,
        ) {
            let list = items(&weights);
            let out = expand(&list, None, Some(radius));
            prop_assert!(fragment_chords_fit(&out, radius));
        }

        #[test]
        fn prop_reexpansion_is_stable(
            weights in prop::collection::vec(1.0f64..5.0, 2..30),
            pick in any::<prop::sample::Index>(),
            radius in 50.0f64..600.0,
        ) {
            let list = items(&weights);
            let winner = list[pick.index(list.len())].id.clone();
            let once = expand(&list, Some(&winner), Some(radius));
            let twice = expand(&once, Some(&winner), Some(radius));
            prop_assert_eq!(once.len(), twice.len());
            prop_assert!(fragment_chords_fit(&twice, radius));
        }
    }
}
