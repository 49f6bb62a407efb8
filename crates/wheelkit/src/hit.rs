use crate::geometry::{Point, WheelGeometry, normalize_angle};
use crate::item::WheelItem;
use crate::segment::build_segments;

#[derive(Debug, Clone, PartialEq)]
pub struct Hit<'a> {
    pub item: &'a WheelItem,
    /// Stable key of the un-sliced entry, e.g. `item:42` or `collection:7`.
    pub key: String,
}

/// Item under `point`, derived only from the current geometry, rotation and
/// item list. The rim outside the wheel and the centre hub never hit.
pub fn hit_test<'a>(
    geometry: &WheelGeometry,
    rotation: f64,
    items: &'a [WheelItem],
    point: Point,
) -> Option<Hit<'a>> {
    let (distance, angle) = geometry.polar(point);
    if distance > geometry.radius || distance < geometry.hub_radius() {
        return None;
    }

    let local = normalize_angle(angle - WheelGeometry::rot0(rotation));
    build_segments(items)
        .into_iter()
        .find(|s| s.contains(local))
        .map(|s| Hit {
            item: s.item,
            key: s.item.hit_key(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemId;
    use crate::settings::SpinSettings;
    use crate::spin::SpinPlan;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::f64::consts::PI;

    fn geometry() -> WheelGeometry {
        WheelGeometry::from_size(424.0, 424.0).unwrap() // radius 200
    }

    fn quarters() -> Vec<WheelItem> {
        ["n", "e", "s", "w"]
            .iter()
            .map(|id| WheelItem::new(*id, id.to_uppercase(), 1.0))
            .collect()
    }

    fn at(g: &WheelGeometry, distance: f64, screen_angle: f64) -> Point {
        Point::new(
            g.center.x + distance * screen_angle.cos(),
            g.center.y + distance * screen_angle.sin(),
        )
    }

    #[test]
    fn test_unrotated_quadrants() {
        let g = geometry();
        let items = quarters();
        // just clockwise of the pointer is the first segment
        let hit = hit_test(&g, 0.0, &items, at(&g, 150.0, -PI / 2.0 + 0.1)).unwrap();
        assert_eq!(hit.item.id.as_str(), "n");
        let hit = hit_test(&g, 0.0, &items, at(&g, 150.0, 0.1)).unwrap();
        assert_eq!(hit.item.id.as_str(), "e");
        let hit = hit_test(&g, 0.0, &items, at(&g, 150.0, -PI / 2.0 - 0.1)).unwrap();
        assert_eq!(hit.item.id.as_str(), "w");
        assert_eq!(hit.key, "item:w");
    }

    #[test]
    fn test_rotation_shifts_hits() {
        let g = geometry();
        let items = quarters();
        let hit = hit_test(&g, PI / 2.0, &items, at(&g, 150.0, 0.1)).unwrap();
        assert_eq!(hit.item.id.as_str(), "n");
    }

    #[test]
    fn test_rim_and_hub_miss() {
        let g = geometry();
        let items = quarters();
        assert!(hit_test(&g, 0.0, &items, at(&g, 201.0, 0.3)).is_none());
        assert!(hit_test(&g, 0.0, &items, at(&g, g.hub_radius() - 1.0, 0.3)).is_none());
        assert!(hit_test(&g, 0.0, &[], at(&g, 150.0, 0.3)).is_none());
    }

    #[test]
    fn test_spin_lands_winner_under_pointer() {
        let g = geometry();
        let items = vec![
            WheelItem::new("a", "A", 1.0),
            WheelItem::new("b", "B", 4.0),
            WheelItem::new("c", "C", 2.0),
        ];
        let settings = SpinSettings::default();
        for seed in 0..200 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let plan = SpinPlan::new(&items, &ItemId::from("c"), seed as f64, &settings, &mut rng);
            let pointer = at(&g, 150.0, -PI / 2.0);
            let hit = hit_test(&g, plan.to, &items, pointer).unwrap();
            assert_eq!(hit.item.id.as_str(), "c");
        }
    }
}
