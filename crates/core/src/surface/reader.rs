//! Reads a [`GraphState`] snapshot from the graphing surface.

use super::{SurfaceError, SurfaceSlot};
use crate::graph_state::{GraphState, Vertex};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadError {
    #[error("The graphing surface is not loaded yet")]
    NotLoaded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldFaultReason {
    Surface(SurfaceError),
    NonFinite(f64),
}

/// A field that degraded to `null` during a read.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFault {
    pub field: &'static str,
    pub reason: FieldFaultReason,
}

/// The snapshot plus every field that could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadReport {
    pub state: GraphState,
    pub faults: Vec<FieldFault>,
}

impl ReadReport {
    pub fn is_complete(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Reads every tracked quantity from the loaded surface.
///
/// Each field is read on its own. A failing or non-finite field becomes
/// `None` and is listed in [`ReadReport::faults`]; the others are still read.
pub fn read(slot: &SurfaceSlot) -> Result<ReadReport, ReadError> {
    let surface = slot.get().ok_or(ReadError::NotLoaded)?;
    let mut faults = Vec::new();
    let surface = surface.as_ref();

    let mut field = |name: &'static str, value: Result<f64, SurfaceError>| -> Option<f64> {
        let reason = match value {
            Ok(v) if v.is_finite() => return Some(v),
            Ok(v) => FieldFaultReason::NonFinite(v),
            Err(e) => FieldFaultReason::Surface(e),
        };
        faults.push(FieldFault {
            field: name,
            reason,
        });
        None
    };

    let state = GraphState {
        a: field("a", surface.get_value("a")),
        b: field("b", surface.get_value("b")),
        c: field("c", surface.get_value("c")),
        x1: field("x1", surface.get_x_coord("X_1")),
        x2: field("x2", surface.get_x_coord("X_2")),
        vertex: Vertex {
            x: field("vertex.x", surface.get_x_coord("V")),
            y: field("vertex.y", surface.get_y_coord("V")),
        },
        area_rect: field("areaRect", surface.get_value("A")),
    };

    if faults.is_empty() {
        debug!(?state, "Graph state read.");
    } else {
        warn!(?state, ?faults, "Graph state read with unreadable fields.");
    }

    Ok(ReadReport { state, faults })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::testing::FakeSurface;
    use std::sync::Arc;

    #[test]
    fn test_not_loaded_is_an_error_not_zeroes() {
        let slot = SurfaceSlot::new();
        assert_eq!(read(&slot).unwrap_err(), ReadError::NotLoaded);
    }

    #[test]
    fn test_reads_full_snapshot() {
        let slot = SurfaceSlot::new();
        slot.load(Arc::new(FakeSurface::quadratic())).unwrap();

        let report = read(&slot).unwrap();
        assert!(report.is_complete());
        assert_eq!(
            report.state,
            GraphState {
                a: Some(-0.5),
                b: Some(0.0),
                c: Some(2.0),
                x1: Some(-2.0),
                x2: Some(2.0),
                vertex: Vertex {
                    x: Some(0.0),
                    y: Some(2.0)
                },
                area_rect: Some(8.0),
            }
        );
    }

    #[test]
    fn test_failing_root_degrades_only_that_field() {
        let slot = SurfaceSlot::new();
        slot.load(Arc::new(FakeSurface::quadratic().breaking("X_2")))
            .unwrap();

        let report = read(&slot).unwrap();
        assert_eq!(report.state.x1, Some(-2.0));
        assert_eq!(report.state.x2, None);
        assert_eq!(report.state.a, Some(-0.5));
        assert_eq!(report.state.area_rect, Some(8.0));
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].field, "x2");
        assert!(matches!(
            report.faults[0].reason,
            FieldFaultReason::Surface(SurfaceError::UnknownObject(_))
        ));
    }

    #[test]
    fn test_non_finite_values_become_null() {
        let surface = FakeSurface::quadratic();
        surface
            .points
            .lock()
            .unwrap()
            .insert("X_1".into(), (f64::NAN, 0.0));
        surface
            .values
            .lock()
            .unwrap()
            .insert("A".into(), f64::INFINITY);
        let slot = SurfaceSlot::new();
        slot.load(Arc::new(surface)).unwrap();

        let report = read(&slot).unwrap();
        assert_eq!(report.state.x1, None);
        assert_eq!(report.state.area_rect, None);
        assert_eq!(report.state.x2, Some(2.0));
        let fields: Vec<_> = report.faults.iter().map(|f| f.field).collect();
        assert_eq!(fields, vec!["x1", "areaRect"]);
    }

    #[test]
    fn test_missing_objects_do_not_abort_the_read() {
        let slot = SurfaceSlot::new();
        slot.load(Arc::new(FakeSurface::default())).unwrap();

        let report = read(&slot).unwrap();
        assert_eq!(report.state, GraphState::default());
        assert_eq!(report.faults.len(), 8);
    }
}
