// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Pointer interaction state machine.
//!
//! The active tool and the transient gesture live in [`EditorSession`]. A
//! single [`transition`] function, keyed on tool, event kind and gesture,
//! turns pointer events into store mutations and reports what the caller has
//! to do next (commit, request a translation, nothing).

use super::viewport::Viewport;
use crate::models::bubble::{BoundingBox, BoxPoint, BubbleId, ResizeHandle, Shape};
use crate::models::store::{BubbleStore, Link, LinkRejection};
use egui::Pos2;

/// Smallest drawn box accepted, per axis, in normalized units (1% of the space).
pub const MIN_DRAW_EXTENT: f32 = 10.0;

/// Current editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    Select,
    Draw,
    Pan,
    Link,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Select, Tool::Draw, Tool::Pan, Tool::Link];
}

/// Gesture in progress. At most one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Moving a bubble; `grab` is the pointer offset from the box's top-left.
    Dragging {
        id: BubbleId,
        grab: BoxPoint,
        origin: BoundingBox,
    },
    Resizing {
        id: BubbleId,
        handle: ResizeHandle,
        origin: BoundingBox,
    },
    Drawing {
        start: BoxPoint,
        current: BoxPoint,
    },
    /// Link mode with a chosen source bubble.
    Linking { active: BubbleId },
    /// Dragging the viewport; a link source being built is resumed afterwards.
    Panning {
        last: Pos2,
        resume: Option<BubbleId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// A pointer event in both screen and box coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub screen: Pos2,
    pub point: BoxPoint,
    /// Pan regardless of tool (middle button or space held)
    pub pan_modifier: bool,
    /// How close to a corner counts as grabbing a resize handle, in box units
    pub handle_tolerance: f32,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, screen: Pos2, point: BoxPoint) -> Self {
        Self {
            kind,
            screen,
            point,
            pan_modifier: false,
            handle_tolerance: 8.0,
        }
    }
}

/// What a pointer event did, for the caller to act on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    None,
    /// The store shows a live preview; nothing to commit yet.
    Preview,
    ViewportChanged,
    SelectionChanged(Option<BubbleId>),
    /// A gesture finished with a change worth recording.
    Commit,
    /// A placeholder was inserted for a drawn box and needs a translation.
    RegionDrawn { id: BubbleId, bbox: BoundingBox },
    /// A drawn box was too small and was dropped.
    DrawDiscarded,
    LinkSourceChanged(Option<BubbleId>),
    LinkCreated(Link),
}

/// Session-wide interaction context, threaded through every operation.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    pub tool: Tool,
    pub gesture: Gesture,
    pub viewport: Viewport,
    /// Shape given to newly drawn bubbles
    pub draw_shape: Shape,
    pub selected: Option<BubbleId>,
}

impl EditorSession {
    /// The bubble currently used as link source, if any.
    pub fn link_source(&self) -> Option<BubbleId> {
        match self.gesture {
            Gesture::Linking { active } => Some(active),
            Gesture::Panning { resume, .. } => resume,
            _ => None,
        }
    }

    pub fn is_gesture_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle | Gesture::Linking { .. })
    }

    /// The bubble being dragged or resized and its box before the gesture.
    pub fn gesture_origin(&self) -> Option<(BubbleId, BoundingBox)> {
        match self.gesture {
            Gesture::Dragging { id, origin, .. } | Gesture::Resizing { id, origin, .. } => {
                Some((id, origin))
            }
            _ => None,
        }
    }
}

/// Switch tools, abandoning whatever gesture was in progress.
pub fn set_tool(session: &mut EditorSession, store: &mut BubbleStore, tool: Tool) {
    cancel_gesture(session, store);
    session.gesture = Gesture::Idle;
    session.tool = tool;
}

/// Abandon the current gesture, putting back any previewed box.
pub fn cancel_gesture(session: &mut EditorSession, store: &mut BubbleStore) {
    match session.gesture {
        Gesture::Dragging { id, origin, .. } | Gesture::Resizing { id, origin, .. } => {
            if let Some(bubble) = store.get_mut(id) {
                bubble.bbox = origin;
            }
        }
        Gesture::Panning { .. }
        | Gesture::Drawing { .. }
        | Gesture::Linking { .. }
        | Gesture::Idle => {}
    }
    session.gesture = Gesture::Idle;
}

/// Feed one pointer event through the state machine.
pub fn transition(
    session: &mut EditorSession,
    store: &mut BubbleStore,
    event: &PointerEvent,
) -> Outcome {
    use PointerKind::{Down, Move, Up};

    match (session.tool, event.kind, session.gesture) {
        // Panning works the same under every tool.
        (_, Move, Gesture::Panning { last, resume }) => {
            session.viewport.pan_by(event.screen - last);
            session.gesture = Gesture::Panning {
                last: event.screen,
                resume,
            };
            Outcome::ViewportChanged
        }
        (_, Up, Gesture::Panning { resume, .. }) => {
            session.gesture = match resume {
                Some(active) if store.contains(active) => Gesture::Linking { active },
                _ => Gesture::Idle,
            };
            Outcome::None
        }
        (tool, Down, gesture) if tool == Tool::Pan || event.pan_modifier => {
            let resume = match gesture {
                Gesture::Linking { active } => Some(active),
                _ => None,
            };
            session.gesture = Gesture::Panning {
                last: event.screen,
                resume,
            };
            Outcome::None
        }

        (Tool::Select, Down, _) => begin_select(session, store, event),
        (Tool::Select, Move, Gesture::Dragging { id, grab, origin }) => {
            let top_left = BoxPoint::new(event.point.x - grab.x, event.point.y - grab.y);
            preview_box(session, store, id, origin.moved_to(top_left))
        }
        (Tool::Select, Move, Gesture::Resizing { id, handle, origin }) => {
            preview_box(session, store, id, origin.with_corner(handle, event.point))
        }
        (Tool::Select, Up, Gesture::Dragging { id, origin, .. })
        | (Tool::Select, Up, Gesture::Resizing { id, origin, .. }) => {
            session.gesture = Gesture::Idle;
            match store.get(id) {
                Some(bubble) if bubble.bbox != origin => Outcome::Commit,
                _ => Outcome::None,
            }
        }

        (Tool::Draw, Down, _) => {
            session.gesture = Gesture::Drawing {
                start: event.point,
                current: event.point,
            };
            Outcome::Preview
        }
        (Tool::Draw, Move, Gesture::Drawing { start, .. }) => {
            session.gesture = Gesture::Drawing {
                start,
                current: event.point,
            };
            Outcome::Preview
        }
        (Tool::Draw, Up, Gesture::Drawing { start, .. }) => {
            session.gesture = Gesture::Idle;
            finish_drawing(session, store, start, event.point)
        }

        (Tool::Link, Down, gesture) => click_link(session, store, gesture, event.point),

        (Tool::Pan, Down, _) | (_, Up, Gesture::Linking { .. }) | (_, Move, _) => Outcome::None,
        (_, Up, _) => {
            session.gesture = Gesture::Idle;
            Outcome::None
        }
    }
}

fn begin_select(session: &mut EditorSession, store: &BubbleStore, event: &PointerEvent) -> Outcome {
    let tolerance = event.handle_tolerance;

    // Handles of the selected bubble win over whatever lies underneath.
    let handle_hit = session
        .selected
        .and_then(|id| store.handle_at(id, event.point, tolerance).map(|h| (id, h)))
        .or_else(|| {
            let id = store.hit_test(event.point)?;
            store.handle_at(id, event.point, tolerance).map(|h| (id, h))
        });

    if let Some((id, handle)) = handle_hit {
        if let Some(bubble) = store.get(id) {
            session.selected = Some(id);
            session.gesture = Gesture::Resizing {
                id,
                handle,
                origin: bubble.bbox,
            };
            return Outcome::SelectionChanged(Some(id));
        }
    }

    match store.hit_test(event.point).and_then(|id| store.get(id)) {
        Some(bubble) => {
            session.selected = Some(bubble.id);
            session.gesture = Gesture::Dragging {
                id: bubble.id,
                grab: BoxPoint::new(
                    event.point.x - bubble.bbox.xmin(),
                    event.point.y - bubble.bbox.ymin(),
                ),
                origin: bubble.bbox,
            };
            Outcome::SelectionChanged(Some(bubble.id))
        }
        None => {
            session.selected = None;
            session.gesture = Gesture::Idle;
            Outcome::SelectionChanged(None)
        }
    }
}

fn preview_box(
    session: &mut EditorSession,
    store: &mut BubbleStore,
    id: BubbleId,
    bbox: BoundingBox,
) -> Outcome {
    match store.get_mut(id) {
        Some(bubble) => {
            bubble.bbox = bbox;
            Outcome::Preview
        }
        None => {
            // The bubble vanished mid-gesture (undo or a failed translation).
            session.gesture = Gesture::Idle;
            Outcome::None
        }
    }
}

fn finish_drawing(
    session: &mut EditorSession,
    store: &mut BubbleStore,
    start: BoxPoint,
    end: BoxPoint,
) -> Outcome {
    if (end.x - start.x).abs() < MIN_DRAW_EXTENT || (end.y - start.y).abs() < MIN_DRAW_EXTENT {
        log::debug!("Discarded drawn box below minimum size");
        return Outcome::DrawDiscarded;
    }
    let bbox = BoundingBox::from_corners(start, end);
    let id = store.insert_placeholder(bbox, session.draw_shape);
    session.selected = Some(id);
    Outcome::RegionDrawn { id, bbox }
}

fn click_link(
    session: &mut EditorSession,
    store: &mut BubbleStore,
    gesture: Gesture,
    point: BoxPoint,
) -> Outcome {
    let clicked = store.hit_test(point);
    let active = match gesture {
        Gesture::Linking { active } => Some(active),
        _ => None,
    };

    match (active, clicked) {
        (_, None) => {
            session.gesture = Gesture::Idle;
            Outcome::LinkSourceChanged(None)
        }
        (Some(active), Some(clicked)) if active == clicked => {
            session.gesture = Gesture::Idle;
            Outcome::LinkSourceChanged(None)
        }
        (Some(active), Some(clicked)) => {
            session.gesture = Gesture::Linking { active: clicked };
            match store.add_link(active, clicked) {
                Ok(link) => Outcome::LinkCreated(link),
                Err(LinkRejection::AlreadyLinked) => Outcome::LinkSourceChanged(Some(clicked)),
                Err(reason) => {
                    log::warn!("Link {} -> {} rejected: {:?}", active, clicked, reason);
                    Outcome::LinkSourceChanged(Some(clicked))
                }
            }
        }
        (None, Some(clicked)) => {
            session.gesture = Gesture::Linking { active: clicked };
            Outcome::LinkSourceChanged(Some(clicked))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bubble::Bubble;

    fn event(kind: PointerKind, x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(kind, Pos2::new(x, y), BoxPoint::new(x, y))
    }

    fn store_with_boxes(boxes: &[[f32; 4]]) -> (BubbleStore, Vec<BubbleId>) {
        let mut store = BubbleStore::new();
        let ids = boxes
            .iter()
            .map(|raw| {
                let id = store.allocate_id();
                store.insert(Bubble::new(id, "text", BoundingBox::from_array(*raw)));
                id
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_drag_moves_box_and_commits_only_on_change() {
        let (mut store, ids) = store_with_boxes(&[[100.0, 100.0, 200.0, 200.0]]);
        let mut session = EditorSession::default();

        let out = transition(&mut session, &mut store, &event(PointerKind::Down, 150.0, 150.0));
        assert_eq!(out, Outcome::SelectionChanged(Some(ids[0])));
        assert!(matches!(session.gesture, Gesture::Dragging { .. }));

        transition(&mut session, &mut store, &event(PointerKind::Move, 250.0, 170.0));
        let bbox = store.get(ids[0]).unwrap().bbox;
        assert_eq!(bbox.to_array(), [120.0, 200.0, 220.0, 300.0]);

        let out = transition(&mut session, &mut store, &event(PointerKind::Up, 250.0, 170.0));
        assert_eq!(out, Outcome::Commit);
        assert_eq!(session.gesture, Gesture::Idle);

        // Press and release without moving: nothing to commit.
        transition(&mut session, &mut store, &event(PointerKind::Down, 250.0, 170.0));
        let out = transition(&mut session, &mut store, &event(PointerKind::Up, 250.0, 170.0));
        assert_eq!(out, Outcome::None);
    }

    #[test]
    fn test_resize_from_handle_respects_min_side() {
        let (mut store, ids) = store_with_boxes(&[[100.0, 100.0, 300.0, 300.0]]);
        let mut session = EditorSession {
            selected: Some(ids[0]),
            ..Default::default()
        };

        transition(&mut session, &mut store, &event(PointerKind::Down, 298.0, 302.0));
        assert!(matches!(
            session.gesture,
            Gesture::Resizing {
                handle: ResizeHandle::SouthEast,
                ..
            }
        ));
        transition(&mut session, &mut store, &event(PointerKind::Move, 50.0, 20.0));
        let bbox = store.get(ids[0]).unwrap().bbox;
        assert_eq!(bbox.to_array(), [100.0, 100.0, 110.0, 110.0]);

        let out = transition(&mut session, &mut store, &event(PointerKind::Up, 50.0, 20.0));
        assert_eq!(out, Outcome::Commit);
    }

    #[test]
    fn test_clicking_empty_space_clears_selection() {
        let (mut store, ids) = store_with_boxes(&[[100.0, 100.0, 200.0, 200.0]]);
        let mut session = EditorSession {
            selected: Some(ids[0]),
            ..Default::default()
        };
        let out = transition(&mut session, &mut store, &event(PointerKind::Down, 800.0, 800.0));
        assert_eq!(out, Outcome::SelectionChanged(None));
        assert_eq!(session.selected, None);
    }

    #[test]
    fn test_draw_inserts_placeholder_without_commit() {
        let mut store = BubbleStore::new();
        let mut session = EditorSession {
            tool: Tool::Draw,
            draw_shape: Shape::Ellipse,
            ..Default::default()
        };

        transition(&mut session, &mut store, &event(PointerKind::Down, 300.0, 300.0));
        transition(&mut session, &mut store, &event(PointerKind::Move, 200.0, 250.0));
        let out = transition(&mut session, &mut store, &event(PointerKind::Up, 100.0, 100.0));

        let Outcome::RegionDrawn { id, bbox } = out else {
            panic!("expected a drawn region, got {out:?}");
        };
        assert_eq!(bbox.to_array(), [100.0, 100.0, 300.0, 300.0]);
        assert!(store.is_pending(id));
        assert_eq!(store.get(id).unwrap().shape, Shape::Ellipse);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_tiny_draw_is_discarded() {
        let mut store = BubbleStore::new();
        let mut session = EditorSession {
            tool: Tool::Draw,
            ..Default::default()
        };
        transition(&mut session, &mut store, &event(PointerKind::Down, 100.0, 100.0));
        let out = transition(&mut session, &mut store, &event(PointerKind::Up, 300.0, 105.0));
        assert_eq!(out, Outcome::DrawDiscarded);
        assert!(store.is_empty());
    }

    #[test]
    fn test_link_clicks_chain_and_skip_duplicates() {
        let (mut store, ids) = store_with_boxes(&[
            [0.0, 0.0, 100.0, 100.0],
            [200.0, 200.0, 300.0, 300.0],
            [400.0, 400.0, 500.0, 500.0],
        ]);
        let (a, b, c) = (ids[0], ids[1], ids[2]);
        let mut session = EditorSession {
            tool: Tool::Link,
            ..Default::default()
        };
        let click = |session: &mut EditorSession, store: &mut BubbleStore, x: f32| {
            transition(session, store, &event(PointerKind::Down, x, x));
            transition(session, store, &event(PointerKind::Up, x, x))
        };

        click(&mut session, &mut store, 50.0);
        click(&mut session, &mut store, 250.0);
        click(&mut session, &mut store, 450.0);
        assert_eq!(store.links(), &[Link::new(a, b), Link::new(b, c)]);
        assert_eq!(session.link_source(), Some(c));

        // Clicking the active node clears it; A then B must not duplicate.
        click(&mut session, &mut store, 450.0);
        assert_eq!(session.link_source(), None);
        click(&mut session, &mut store, 50.0);
        click(&mut session, &mut store, 250.0);
        assert_eq!(store.links().len(), 2);
        assert_eq!(session.link_source(), Some(b));

        click(&mut session, &mut store, 900.0);
        assert_eq!(session.link_source(), None);
    }

    #[test]
    fn test_pan_modifier_moves_viewport_and_resumes_linking() {
        let (mut store, ids) = store_with_boxes(&[[0.0, 0.0, 100.0, 100.0]]);
        let mut session = EditorSession {
            tool: Tool::Link,
            gesture: Gesture::Linking { active: ids[0] },
            ..Default::default()
        };
        let before = store.snapshot();

        let mut down = event(PointerKind::Down, 500.0, 500.0);
        down.pan_modifier = true;
        transition(&mut session, &mut store, &down);
        let out = transition(&mut session, &mut store, &event(PointerKind::Move, 530.0, 490.0));
        assert_eq!(out, Outcome::ViewportChanged);
        transition(&mut session, &mut store, &event(PointerKind::Up, 530.0, 490.0));

        assert_eq!(session.viewport.offset(), egui::Vec2::new(30.0, -10.0));
        assert_eq!(session.link_source(), Some(ids[0]));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_cancel_restores_dragged_box() {
        let (mut store, ids) = store_with_boxes(&[[100.0, 100.0, 200.0, 200.0]]);
        let mut session = EditorSession::default();
        transition(&mut session, &mut store, &event(PointerKind::Down, 150.0, 150.0));
        transition(&mut session, &mut store, &event(PointerKind::Move, 600.0, 600.0));
        cancel_gesture(&mut session, &mut store);
        assert_eq!(
            store.get(ids[0]).unwrap().bbox.to_array(),
            [100.0, 100.0, 200.0, 200.0]
        );
        assert_eq!(session.gesture, Gesture::Idle);
    }
}
