//! Landing detection and alignment
//!
//! A falling block lands when its lower edge reaches the surface below it:
//! the ground for the first block, the top tower block afterwards. Alignment is
//! the horizontal overlap divided by the narrower width.

use serde::{Deserialize, Serialize};

use super::body::PhysicsBody;
use crate::unit_clamp;

/// What a falling body is dropping onto
#[derive(Debug, Clone, Copy)]
pub enum Surface<'a> {
    /// Bare ground at the given height
    Ground { y: f64 },
    /// The topmost settled block
    Block(&'a PhysicsBody),
}

impl Surface<'_> {
    /// Height of the landing surface
    pub fn y(&self) -> f64 {
        match self {
            Surface::Ground { y } => *y,
            Surface::Block(top) => top.top(),
        }
    }
}

/// Result of a landing check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Contact {
    /// Still above the surface
    None,
    /// Lower edge reached the surface with horizontal overlap
    Landed { alignment: f64, surface_y: f64 },
    /// Lower edge reached the top block with no horizontal overlap at all
    Missed,
}

/// Horizontal overlap length of two bodies (0 when disjoint)
#[inline]
pub fn horizontal_overlap(a: &PhysicsBody, b: &PhysicsBody) -> f64 {
    (a.right().min(b.right()) - a.left().max(b.left())).max(0.0)
}

/// Overlap divided by the narrower width, in [0, 1]
pub fn alignment(a: &PhysicsBody, b: &PhysicsBody) -> f64 {
    let narrower = a.width().min(b.width());
    if narrower <= 0.0 {
        return 0.0;
    }
    unit_clamp(horizontal_overlap(a, b) / narrower)
}

/// Check whether `body` has reached `surface`
pub fn detect_landing(body: &PhysicsBody, surface: Surface<'_>) -> Contact {
    let surface_y = surface.y();
    if body.bottom() > surface_y {
        return Contact::None;
    }

    match surface {
        // First block: any ground position is a perfect placement
        Surface::Ground { .. } => Contact::Landed {
            alignment: 1.0,
            surface_y,
        },
        Surface::Block(top) => {
            if horizontal_overlap(body, top) <= 0.0 {
                Contact::Missed
            } else {
                Contact::Landed {
                    alignment: alignment(body, top),
                    surface_y,
                }
            }
        }
    }
}

/// Apply a landing: snap onto the surface, zero velocity, mark settled.
/// Returns the alignment for landed contacts.
pub fn resolve_landing(body: &mut PhysicsBody, contact: Contact) -> Option<f64> {
    match contact {
        Contact::Landed {
            alignment,
            surface_y,
        } => {
            body.settle_on(surface_y);
            Some(alignment)
        }
        Contact::None | Contact::Missed => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::{BlockCategory, BodyPhase};
    use glam::DVec2;
    use proptest::prelude::*;

    fn rect(x: f64, y: f64, w: f64) -> PhysicsBody {
        PhysicsBody::carried(0, DVec2::new(x, y), DVec2::new(w, 40.0), BlockCategory::Standard)
    }

    fn falling(x: f64, y: f64, w: f64) -> PhysicsBody {
        let mut b = rect(x, y, w);
        b.release(DVec2::new(3.0, -400.0));
        b
    }

    #[test]
    fn test_alignment_exact_values() {
        let base = rect(100.0, 20.0, 100.0);
        assert_eq!(alignment(&rect(100.0, 60.0, 100.0), &base), 1.0);
        assert_eq!(alignment(&rect(150.0, 60.0, 100.0), &base), 0.5);
        assert_eq!(alignment(&rect(300.0, 60.0, 100.0), &base), 0.0);
        // Narrow block fully on a wide one
        assert_eq!(alignment(&rect(80.0, 60.0, 40.0), &base), 1.0);
        // Symmetric
        let a = rect(130.0, 60.0, 80.0);
        assert_eq!(alignment(&a, &base), alignment(&base, &a));
    }

    #[test]
    fn test_first_block_on_ground_is_perfect() {
        for x in [30.0, 240.0, 470.0] {
            let body = falling(x, 19.0, 120.0);
            let contact = detect_landing(&body, Surface::Ground { y: 0.0 });
            assert_eq!(
                contact,
                Contact::Landed {
                    alignment: 1.0,
                    surface_y: 0.0
                }
            );
        }
    }

    #[test]
    fn test_above_surface_is_no_contact() {
        let body = falling(100.0, 100.0, 100.0);
        assert_eq!(detect_landing(&body, Surface::Ground { y: 0.0 }), Contact::None);
    }

    #[test]
    fn test_landing_snaps_without_penetration() {
        let top = rect(100.0, 20.0, 100.0);
        let mut body = falling(125.0, 57.3, 100.0);
        let contact = detect_landing(&body, Surface::Block(&top));
        let alignment = resolve_landing(&mut body, contact).unwrap();

        assert!((alignment - 0.75).abs() < 1e-12);
        assert_eq!(body.bottom(), top.top());
        assert_eq!(body.vel, DVec2::ZERO);
        assert_eq!(body.phase, BodyPhase::Settled);
    }

    #[test]
    fn test_disjoint_is_missed() {
        let top = rect(100.0, 20.0, 100.0);
        let mut body = falling(260.0, 55.0, 100.0);
        let contact = detect_landing(&body, Surface::Block(&top));
        assert_eq!(contact, Contact::Missed);
        assert_eq!(resolve_landing(&mut body, contact), None);
        assert_eq!(body.phase, BodyPhase::Falling);
    }

    #[test]
    fn test_touching_edges_is_missed() {
        let top = rect(100.0, 20.0, 100.0);
        let body = falling(200.0, 55.0, 100.0);
        assert_eq!(detect_landing(&body, Surface::Block(&top)), Contact::Missed);
    }

    proptest! {
        #[test]
        fn prop_alignment_in_unit_range(
            ax in -200.0f64..700.0, aw in 1.0f64..300.0,
            bx in -200.0f64..700.0, bw in 1.0f64..300.0,
        ) {
            let a = rect(ax, 60.0, aw);
            let b = rect(bx, 20.0, bw);
            let v = alignment(&a, &b);
            prop_assert!((0.0..=1.0).contains(&v));
            if horizontal_overlap(&a, &b) == 0.0 {
                prop_assert_eq!(v, 0.0);
            }
        }

        #[test]
        fn prop_contained_span_is_perfect(
            bx in 100.0f64..400.0, bw in 50.0f64..200.0, frac in 0.1f64..1.0, shift in 0.0f64..1.0,
        ) {
            let b = rect(bx, 20.0, bw);
            let aw = bw * frac;
            // Place the narrower block anywhere fully inside the wider one
            let ax = b.left() + aw / 2.0 + (bw - aw) * shift;
            let a = rect(ax, 60.0, aw);
            prop_assert!((alignment(&a, &b) - 1.0).abs() < 1e-9);
        }
    }
}
