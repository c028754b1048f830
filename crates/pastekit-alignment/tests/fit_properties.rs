use pastekit_alignment::{fit_affine, fit_similarity, invert, rms_error, Transform};
use pastekit_core::Point2D;
use proptest::prelude::*;

fn board_points() -> Vec<Point2D> {
    vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(100.0, 0.0),
        Point2D::new(0.0, 80.0),
        Point2D::new(60.0, 50.0),
        Point2D::new(95.0, 75.0),
    ]
}

fn close(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}

proptest! {
    #[test]
    fn affine_round_trip_is_exact_for_clean_data(
        a in 0.8f64..1.2,
        b in -0.2f64..0.2,
        c in -0.2f64..0.2,
        d in 0.8f64..1.2,
        tx in -50.0f64..50.0,
        ty in -50.0f64..50.0,
    ) {
        let truth = Transform::affine(a, b, c, d, tx, ty);
        let design = board_points();
        let machine = truth.apply_all(&design);

        let fitted = fit_affine(&design, &machine).unwrap();
        for (p, q) in design.iter().zip(&machine) {
            prop_assert!(fitted.apply(p).distance_to(q) < 1e-6);
        }
        prop_assert!(rms_error(&fitted, &design, &machine) < 1e-6);
    }

    #[test]
    fn similarity_fit_is_rigid(
        scale in 0.5f64..2.0,
        theta in -3.0f64..3.0,
        tx in -50.0f64..50.0,
        ty in -50.0f64..50.0,
        noise in -0.05f64..0.05,
    ) {
        let truth = Transform::similarity(scale, theta, tx, ty);
        let design = board_points();
        let mut machine = truth.apply_all(&design);
        machine[3].x += noise;

        let t = fit_similarity(&design, &machine).unwrap();
        let col_a = t.a * t.a + t.c * t.c;
        let col_b = t.b * t.b + t.d * t.d;
        prop_assert!(close(col_a, col_b, 1e-9));
        prop_assert!(close(t.a * t.b + t.c * t.d, 0.0, 1e-9));
    }

    #[test]
    fn similarity_recovers_parameters(
        scale in 0.5f64..2.0,
        theta in -3.0f64..3.0,
        tx in -50.0f64..50.0,
        ty in -50.0f64..50.0,
    ) {
        let truth = Transform::similarity(scale, theta, tx, ty);
        let design = board_points();
        let machine = truth.apply_all(&design);

        let t = fit_similarity(&design, &machine).unwrap();
        prop_assert!(close(t.scale.unwrap(), scale, 1e-9));
        prop_assert!(close(t.theta.unwrap(), theta, 1e-9));
        prop_assert!(close(t.tx, tx, 1e-6));
        prop_assert!(close(t.ty, ty, 1e-6));
    }

    #[test]
    fn double_inverse_is_identity(
        a in 0.5f64..1.5,
        b in -0.4f64..0.4,
        c in -0.4f64..0.4,
        d in 0.5f64..1.5,
        tx in -100.0f64..100.0,
        ty in -100.0f64..100.0,
    ) {
        let t = Transform::affine(a, b, c, d, tx, ty);
        let back = invert(&invert(&t).unwrap()).unwrap();
        for (got, want) in [(back.a, a), (back.b, b), (back.c, c), (back.d, d), (back.tx, tx), (back.ty, ty)] {
            prop_assert!(close(got, want, 1e-9));
        }
    }
}

#[test]
fn example_translation_only() {
    let design = vec![Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)];
    let machine = vec![Point2D::new(5.0, 5.0), Point2D::new(15.0, 5.0)];
    let t = fit_similarity(&design, &machine).unwrap();
    assert!(close(t.scale.unwrap(), 1.0, 1e-12));
    assert!(close(t.theta.unwrap(), 0.0, 1e-12));
    assert!(close(t.tx, 5.0, 1e-12));
    assert!(close(t.ty, 5.0, 1e-12));

    let inv = invert(&t).unwrap();
    let p = inv.apply(&Point2D::new(15.0, 5.0));
    assert!(close(p.x, 10.0, 1e-12) && close(p.y, 0.0, 1e-12));
}
