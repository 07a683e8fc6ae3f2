//! Graph State Snapshot
//!
//! A `GraphState` is a single read of every tracked quantity of the quadratic
//! `f(x) = ax² + bx + c` as the graphing surface shows it at one instant.
//! Fields that could not be read are `None` (serialized as `null`); they are
//! never replaced by a computed or guessed number.

use serde::{Deserialize, Serialize};

/// The vertex `V` of the parabola.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

/// Snapshot of the quadratic and its derived quantities.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphState {
    #[serde(default)]
    pub a: Option<f64>,
    #[serde(default)]
    pub b: Option<f64>,
    #[serde(default)]
    pub c: Option<f64>,
    /// First root, read from the intersection object `X_1`.
    #[serde(default)]
    pub x1: Option<f64>,
    /// Second root, read from the intersection object `X_2`.
    #[serde(default)]
    pub x2: Option<f64>,
    #[serde(default)]
    pub vertex: Vertex,
    /// Value of the area object `A`.
    #[serde(default)]
    pub area_rect: Option<f64>,
}

impl GraphState {
    /// True when both roots were read from the surface.
    pub fn has_roots(&self) -> bool {
        self.x1.is_some() && self.x2.is_some()
    }
}
