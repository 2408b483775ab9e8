//! Property-based invariant tests for canvas geometry.
//!
//! 1. Intersection test is symmetric.
//! 2. Union contains both inputs.
//! 3. Translation preserves size and intersection.
//! 4. Outset by a positive margin always contains the original.
//! 5. `union_all` agrees with pairwise unions.
//! 6. `intersection_opt` is present exactly when the rects intersect.

use nodal_core::geometry::Rect;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (-500i32..=500, -500i32..=500, 1i32..=300, 1i32..=300)
        .prop_map(|(x, y, w, h)| Rect::new(f64::from(x), f64::from(y), f64::from(w), f64::from(h)))
}

fn contains_rect(outer: &Rect, inner: &Rect) -> bool {
    outer.left() <= inner.left()
        && outer.top() <= inner.top()
        && outer.right() >= inner.right()
        && outer.bottom() >= inner.bottom()
}

proptest! {
    #[test]
    fn intersects_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
        prop_assert_eq!(a.intersects(&b), b.intersects(&a));
    }

    #[test]
    fn union_contains_inputs(a in rect_strategy(), b in rect_strategy()) {
        let u = a.union(&b);
        prop_assert!(contains_rect(&u, &a), "union {:?} misses {:?}", u, a);
        prop_assert!(contains_rect(&u, &b), "union {:?} misses {:?}", u, b);
    }

    #[test]
    fn translation_preserves_overlap(
        a in rect_strategy(),
        b in rect_strategy(),
        dx in -200i32..=200,
        dy in -200i32..=200,
    ) {
        let (dx, dy) = (f64::from(dx), f64::from(dy));
        let ta = a.translated(dx, dy);
        let tb = b.translated(dx, dy);
        prop_assert_eq!(ta.width, a.width);
        prop_assert_eq!(ta.height, a.height);
        prop_assert_eq!(a.intersects(&b), ta.intersects(&tb));
    }

    #[test]
    fn outset_contains_original(a in rect_strategy(), margin in 0i32..=64) {
        let grown = a.outset(f64::from(margin));
        prop_assert!(contains_rect(&grown, &a));
    }

    #[test]
    fn union_all_folds_pairwise(rects in prop::collection::vec(rect_strategy(), 1..8)) {
        let folded = rects[1..].iter().fold(rects[0], |acc, rect| acc.union(rect));
        prop_assert_eq!(Rect::union_all(&rects), Some(folded));
    }

    #[test]
    fn intersection_matches_intersects(a in rect_strategy(), b in rect_strategy()) {
        let overlap = a.intersection_opt(&b);
        prop_assert_eq!(overlap.is_some(), a.intersects(&b));
        if let Some(overlap) = overlap {
            prop_assert!(contains_rect(&a, &overlap));
            prop_assert!(contains_rect(&b, &overlap));
        }
    }
}
