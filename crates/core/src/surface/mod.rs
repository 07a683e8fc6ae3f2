//! Graphing Surface Integration
//!
//! This module models the embedded graphing applet as seen from the tutoring
//! client. It is structured into submodules:
//!
//! - `reader`: builds a [`GraphState`](crate::graph_state::GraphState) snapshot from named objects.
//! - `applier`: replays [`Command`](crate::command::Command)s against the surface.
//!
//! The applet itself is external; anything that implements [`GraphingSurface`]
//! (a wasm bridge to the real applet, a headless double) can be plugged into a
//! [`SurfaceSlot`].

mod applier;
mod reader;

pub use applier::{ApplyFault, ApplyReport, apply};
pub use reader::{FieldFault, FieldFaultReason, ReadError, ReadReport, read};

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Errors raised by the applet's scripting API.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("Unknown object: {0}")]
    UnknownObject(String),
    #[error("Object {object} is not a {expected}")]
    TypeMismatch { object: String, expected: String },
    #[error("Script error: {0}")]
    Script(String),
}

/// The scripting API exposed by the graphing applet.
///
/// All calls are synchronous calls into the applet's own runtime.
pub trait GraphingSurface: Send + Sync {
    fn get_value(&self, object: &str) -> Result<f64, SurfaceError>;
    fn get_x_coord(&self, object: &str) -> Result<f64, SurfaceError>;
    fn get_y_coord(&self, object: &str) -> Result<f64, SurfaceError>;
    fn set_value(&self, object: &str, value: f64) -> Result<(), SurfaceError>;
    fn set_visible(&self, object: &str, visible: bool) -> Result<(), SurfaceError>;
    fn set_coords(&self, object: &str, x: f64, y: f64) -> Result<(), SurfaceError>;
    fn eval_command(&self, command: &str) -> Result<(), SurfaceError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceSlotError {
    #[error("The graphing surface is already loaded")]
    AlreadyLoaded,
}

/// Holds the applet handle across its `NotLoaded → Loaded` transition.
///
/// Loading happens at most once per slot; [`SurfaceSlot::reset`] returns the
/// slot to `NotLoaded` when the page is reloaded.
pub struct SurfaceSlot {
    tx: watch::Sender<Option<Arc<dyn GraphingSurface>>>,
}

impl SurfaceSlot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Marks the surface as loaded. Fails if a surface was already attached.
    pub fn load(&self, surface: Arc<dyn GraphingSurface>) -> Result<(), SurfaceSlotError> {
        let mut incoming = Some(surface);
        let loaded = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = incoming.take();
            true
        });
        if loaded {
            info!("Graphing surface loaded.");
            Ok(())
        } else {
            Err(SurfaceSlotError::AlreadyLoaded)
        }
    }

    /// The loaded surface, or `None` while not loaded.
    pub fn get(&self) -> Option<Arc<dyn GraphingSurface>> {
        self.tx.borrow().clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Waits until a surface has been loaded.
    pub async fn ready(&self) -> Option<Arc<dyn GraphingSurface>> {
        let mut rx = self.tx.subscribe();
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|surface| surface.clone())
    }

    /// Drops the current surface.
    pub fn reset(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for SurfaceSlot {
    fn default() -> Self {
        Self::new()
    }
}
