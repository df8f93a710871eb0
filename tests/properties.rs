use std::collections::HashSet;

use proptest::prelude::*;

use realtimeplot::scene::Scene;
use realtimeplot::{Histogram, Primitive, Range, Viewport};

#[derive(Debug, Clone)]
enum Op {
    Point(f64, f64),
    Line(i64, f64, f64),
    Rectangle(f64, f64),
}

fn op() -> impl Strategy<Value = Op> {
    let coord = -100.0..100.0_f64;
    prop_oneof![
        (coord.clone(), coord.clone()).prop_map(|(x, y)| Op::Point(x, y)),
        (0..6_i64, coord.clone(), coord.clone()).prop_map(|(id, x, y)| Op::Line(id, x, y)),
        (coord.clone(), coord).prop_map(|(x, y)| Op::Rectangle(x, y)),
    ]
}

fn bounds() -> Viewport {
    Viewport::new(Range::new(0.0, 10.0), Range::new(0.0, 50.0))
}

proptest! {
    #[test]
    fn primitive_count_matches_adds(ops in prop::collection::vec(op(), 0..200)) {
        let mut scene = Scene::new(bounds());
        let mut expected = 0;
        let mut lines = HashSet::new();
        for op in &ops {
            match *op {
                Op::Point(x, y) => {
                    scene.add_point(x, y, None);
                    expected += 1;
                }
                Op::Line(id, x, y) => {
                    scene.add_line(id, x, y, None, 1);
                    if lines.insert(id) {
                        expected += 1;
                    }
                }
                Op::Rectangle(x, y) => {
                    scene.add_rectangle(x, y, 1.0, 1.0, false, None);
                    expected += 1;
                }
            }
        }
        prop_assert_eq!(scene.snapshot().len(), expected);
    }

    #[test]
    fn added_points_stay_inside_bounds(x in any::<f64>(), y in any::<f64>()) {
        let mut scene = Scene::new(bounds());
        if scene.add_point(x, y, None) {
            let snapshot = scene.snapshot();
            let Primitive::Point { position, .. } = snapshot.primitives()[0] else {
                return Err(TestCaseError::fail("expected a point"));
            };
            prop_assert!(bounds().contains(position.x, position.y));
        } else {
            prop_assert!(x.is_nan() || y.is_nan());
        }
    }

    #[test]
    fn bin_counts_sum_to_samples(values in prop::collection::vec(-1e6..1e6_f64, 1..300)) {
        let histogram = Histogram::new();
        histogram.set_data(values.iter().copied()).unwrap();
        let snapshot = histogram.snapshot();
        let total: usize = snapshot.bins().iter().map(|bin| bin.count).sum();
        prop_assert_eq!(total, values.len());
    }
}
