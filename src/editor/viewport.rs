//! Canvas interaction state.
//!
//! Pointer and wheel events are folded into a `CanvasState` by a pure reducer.
//! The reducer never touches the workflow; it reports what the user did as an
//! `Effect` for the session to apply.

use crate::model::Position;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            min: 0.4,
            max: 2.0,
            step: 0.1,
        }
    }
}

impl ZoomConfig {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Pan offset (screen pixels) and zoom factor of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub pan: Position,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Position::default(),
            zoom: 1.0,
        }
    }
}

impl Viewport {
    /// Maps a screen point into canvas coordinates.
    pub fn to_canvas(&self, screen: Position) -> Position {
        Position::new(
            (screen.x - self.pan.x) / self.zoom,
            (screen.y - self.pan.y) / self.zoom,
        )
    }
}

/// What sits under the pointer when a button goes down.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    Canvas,
    NodeBody { node_id: String, origin: Position },
    OutputPort { node_id: String, port: String },
    InputPort { node_id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    PointerDown { at: Position, target: PointerTarget },
    PointerMove { at: Position },
    PointerUp { at: Position },
    /// Wheel scroll; negative `delta_y` zooms in.
    Wheel { delta_y: f64 },
    ZoomIn,
    ZoomOut,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Idle,
    DraggingNode {
        node_id: String,
        /// Pointer position relative to the node origin, in canvas units.
        grab: Position,
    },
    Panning {
        pointer: Position,
        pan: Position,
    },
    DrawingConnection {
        source_id: String,
        port: String,
        cursor: Position,
    },
}

/// Something the user did that the session has to apply to the workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    NodeMoved {
        node_id: String,
        position: Position,
    },
    NodeDropped {
        node_id: String,
    },
    ConnectionRequested {
        source_id: String,
        port: String,
        target_id: String,
    },
    ConnectionCancelled,
    Panned(Position),
    Zoomed(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasState {
    pub viewport: Viewport,
    pub interaction: Interaction,
    pub zoom: ZoomConfig,
}

impl CanvasState {
    pub fn new(zoom: ZoomConfig) -> Self {
        Self {
            viewport: Viewport::default(),
            interaction: Interaction::Idle,
            zoom,
        }
    }

    /// Applies one event and returns the next state with the resulting effect.
    pub fn reduce(&self, event: &CanvasEvent) -> (CanvasState, Option<Effect>) {
        let mut next = self.clone();
        let effect = match (&self.interaction, event) {
            (
                Interaction::DrawingConnection {
                    source_id, port, ..
                },
                CanvasEvent::PointerDown { target, .. },
            ) => {
                next.interaction = Interaction::Idle;
                match target {
                    PointerTarget::InputPort { node_id } => Some(Effect::ConnectionRequested {
                        source_id: source_id.clone(),
                        port: port.clone(),
                        target_id: node_id.clone(),
                    }),
                    _ => Some(Effect::ConnectionCancelled),
                }
            }
            (Interaction::DrawingConnection { .. }, CanvasEvent::Cancel) => {
                next.interaction = Interaction::Idle;
                Some(Effect::ConnectionCancelled)
            }
            (
                Interaction::DrawingConnection {
                    source_id, port, ..
                },
                CanvasEvent::PointerMove { at },
            ) => {
                next.interaction = Interaction::DrawingConnection {
                    source_id: source_id.clone(),
                    port: port.clone(),
                    cursor: self.viewport.to_canvas(*at),
                };
                None
            }
            (_, CanvasEvent::PointerDown { at, target }) => {
                next.interaction = match target {
                    PointerTarget::Canvas => Interaction::Panning {
                        pointer: *at,
                        pan: self.viewport.pan,
                    },
                    PointerTarget::NodeBody { node_id, origin } => {
                        let pointer = self.viewport.to_canvas(*at);
                        Interaction::DraggingNode {
                            node_id: node_id.clone(),
                            grab: Position::new(pointer.x - origin.x, pointer.y - origin.y),
                        }
                    }
                    PointerTarget::OutputPort { node_id, port } => Interaction::DrawingConnection {
                        source_id: node_id.clone(),
                        port: port.clone(),
                        cursor: self.viewport.to_canvas(*at),
                    },
                    PointerTarget::InputPort { .. } => Interaction::Idle,
                };
                None
            }
            (Interaction::DraggingNode { node_id, grab }, CanvasEvent::PointerMove { at }) => {
                let pointer = self.viewport.to_canvas(*at);
                Some(Effect::NodeMoved {
                    node_id: node_id.clone(),
                    position: Position::new(pointer.x - grab.x, pointer.y - grab.y),
                })
            }
            (Interaction::DraggingNode { node_id, .. }, CanvasEvent::PointerUp { .. }) => {
                next.interaction = Interaction::Idle;
                Some(Effect::NodeDropped {
                    node_id: node_id.clone(),
                })
            }
            (Interaction::Panning { pointer, pan }, CanvasEvent::PointerMove { at }) => {
                next.viewport.pan =
                    Position::new(pan.x + at.x - pointer.x, pan.y + at.y - pointer.y);
                Some(Effect::Panned(next.viewport.pan))
            }
            (Interaction::Panning { .. }, CanvasEvent::PointerUp { .. }) => {
                next.interaction = Interaction::Idle;
                None
            }
            (_, CanvasEvent::Wheel { delta_y }) => {
                let step = if *delta_y < 0.0 {
                    self.zoom.step
                } else if *delta_y > 0.0 {
                    -self.zoom.step
                } else {
                    0.0
                };
                next.zoom_to(self.viewport.zoom + step)
            }
            (_, CanvasEvent::ZoomIn) => next.zoom_to(self.viewport.zoom + self.zoom.step),
            (_, CanvasEvent::ZoomOut) => next.zoom_to(self.viewport.zoom - self.zoom.step),
            (_, CanvasEvent::Cancel) => {
                next.interaction = Interaction::Idle;
                None
            }
            (_, CanvasEvent::PointerMove { .. } | CanvasEvent::PointerUp { .. }) => None,
        };
        (next, effect)
    }

    fn zoom_to(&mut self, zoom: f64) -> Option<Effect> {
        // Rounded so repeated steps of 0.1 land exactly on the bounds.
        let zoom = self.zoom.clamp((zoom * 1000.0).round() / 1000.0);
        if zoom == self.viewport.zoom {
            return None;
        }
        self.viewport.zoom = zoom;
        Some(Effect::Zoomed(zoom))
    }
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new(ZoomConfig::default())
    }
}
