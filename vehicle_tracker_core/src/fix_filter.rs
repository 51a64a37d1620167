use vehicle_tracker_lib::{location_fix::LocationFix, units};

use crate::MIN_MOVEMENT_KM;

/// Last accepted fix, or nothing yet this trip.
#[derive(Debug, Clone, PartialEq)]
enum FixReference {
    NoReferenceYet,
    Tracking(LocationFix),
}

/// Gates raw fixes against the movement threshold. Raw GPS jitters at
/// sub-meter scale at rest; anything closer than MIN_MOVEMENT_KM to the
/// reference point is dropped without advancing it.
#[derive(Debug, Clone)]
pub struct FixFilter {
    reference: FixReference,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterVerdict {
    /// First fix of the trip. Becomes the reference, adds no distance.
    FirstFix,
    /// Real movement; the incremental haversine distance from the reference.
    Moved { km: f64 },
    /// Below the threshold. Dropped entirely.
    Stationary,
}

impl FixFilter {
    pub fn new() -> Self {
        Self {
            reference: FixReference::NoReferenceYet,
        }
    }

    pub fn reset(&mut self) {
        self.reference = FixReference::NoReferenceYet;
    }

    pub fn accept(&mut self, fix: &LocationFix) -> FilterVerdict {
        match &self.reference {
            FixReference::NoReferenceYet => {
                self.reference = FixReference::Tracking(fix.clone());
                FilterVerdict::FirstFix
            }
            FixReference::Tracking(last) => {
                let moved = units::haversine_km(last.position, fix.position);
                if moved < MIN_MOVEMENT_KM {
                    FilterVerdict::Stationary
                } else {
                    self.reference = FixReference::Tracking(fix.clone());
                    FilterVerdict::Moved { km: moved }
                }
            }
        }
    }
}

impl Default for FixFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
fn fix_at(latitude: f64, longitude: f64) -> LocationFix {
    LocationFix::new(latitude, longitude, None, chrono::Utc::now())
}

#[test]
fn test_first_fix_always_accepted() {
    let mut filter = FixFilter::new();
    assert_eq!(filter.accept(&fix_at(0.0, 0.0)), FilterVerdict::FirstFix);
}

#[test]
fn test_sub_meter_jitter_rejected() {
    let mut filter = FixFilter::new();
    filter.accept(&fix_at(0.0, 0.0));

    // ~5.5 cm east
    let verdict = filter.accept(&fix_at(0.0, 0.0000005));
    assert_eq!(verdict, FilterVerdict::Stationary);
}

#[test]
fn test_movement_above_threshold_accepted() {
    let mut filter = FixFilter::new();
    filter.accept(&fix_at(0.0, 0.0));

    // ~2.2 m east
    let verdict = filter.accept(&fix_at(0.0, 0.00002));
    match verdict {
        FilterVerdict::Moved { km } => assert!((km - 0.0022239).abs() < 1e-6, "got {km}"),
        other => panic!("expected Moved, got {other:?}"),
    }
}

#[test]
fn test_rejected_fix_leaves_reference_unchanged() {
    let mut filter = FixFilter::new();
    filter.accept(&fix_at(0.0, 0.0));

    // Jitter near the reference is dropped...
    assert_eq!(filter.accept(&fix_at(0.0, 0.0000005)), FilterVerdict::Stationary);

    // ...so the next real movement is measured from the first point.
    match filter.accept(&fix_at(0.0, 0.00002)) {
        FilterVerdict::Moved { km } => assert!((km - 0.0022239).abs() < 1e-6),
        other => panic!("expected Moved, got {other:?}"),
    }
}

#[test]
fn test_reset_forgets_reference() {
    let mut filter = FixFilter::new();
    filter.accept(&fix_at(0.0, 0.0));
    filter.reset();
    assert_eq!(filter.accept(&fix_at(50.0, 8.0)), FilterVerdict::FirstFix);
}
