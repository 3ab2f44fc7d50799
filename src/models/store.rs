// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Entity store for bubbles and links.
//!
//! The store owns the bubble collection and the link graph of one editing
//! session. It enforces the data invariants (unique ids, no self links, at
//! most one link per bubble pair, no link to a missing bubble) and nothing
//! else; history and interaction live in the editor.

use super::bubble::{BoundingBox, BoxPoint, Bubble, BubbleId, ResizeHandle, Shape};
use std::collections::BTreeSet;

/// A directed reading-order edge between two bubbles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub from: BubbleId,
    pub to: BubbleId,
}

impl Link {
    pub fn new(from: BubbleId, to: BubbleId) -> Self {
        Self { from, to }
    }

    /// Check whether this link joins `a` and `b`, in either direction.
    pub fn connects(&self, a: BubbleId, b: BubbleId) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    pub fn touches(&self, id: BubbleId) -> bool {
        self.from == id || self.to == id
    }
}

/// Reason a link request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    SelfLoop,
    AlreadyLinked,
    MissingBubble(BubbleId),
}

/// Immutable copy of the bubble collection at one point in editing history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    bubbles: Vec<Bubble>,
}

impl Snapshot {
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// This snapshot with bubble `id` moved back to `bbox`. Unknown ids are
    /// ignored.
    pub fn with_bbox(mut self, id: BubbleId, bbox: BoundingBox) -> Self {
        if let Some(bubble) = self.bubbles.iter_mut().find(|b| b.id == id) {
            bubble.bbox = bbox;
        }
        self
    }
}

/// Bubble collection and link graph.
#[derive(Debug, Clone, Default)]
pub struct BubbleStore {
    bubbles: Vec<Bubble>,
    links: Vec<Link>,
    /// Placeholders waiting for their region translation.
    pending: BTreeSet<BubbleId>,
    next_id: u64,
}

impl BubbleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh id. Ids are never handed out twice, even after undo.
    pub fn allocate_id(&mut self) -> BubbleId {
        self.next_id += 1;
        BubbleId(self.next_id)
    }

    /// Add a bubble, replacing any existing bubble with the same id.
    pub fn insert(&mut self, bubble: Bubble) {
        self.next_id = self.next_id.max(bubble.id.0);
        match self.bubbles.iter_mut().find(|b| b.id == bubble.id) {
            Some(existing) => *existing = bubble,
            None => self.bubbles.push(bubble),
        }
    }

    /// Insert the optimistic bubble for a freshly drawn box. It stays out of
    /// snapshots until [`BubbleStore::resolve_placeholder`] is called.
    pub fn insert_placeholder(&mut self, bbox: BoundingBox, shape: Shape) -> BubbleId {
        let id = self.allocate_id();
        self.bubbles.push(Bubble::placeholder(id, bbox, shape));
        self.pending.insert(id);
        id
    }

    pub fn is_pending(&self, id: BubbleId) -> bool {
        self.pending.contains(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Mark a placeholder as settled so it is captured by snapshots.
    /// Returns false when the id is not a live placeholder.
    pub fn resolve_placeholder(&mut self, id: BubbleId) -> bool {
        self.pending.remove(&id) && self.contains(id)
    }

    /// Remove a bubble and every link that references it.
    pub fn remove(&mut self, id: BubbleId) -> Option<Bubble> {
        let index = self.bubbles.iter().position(|b| b.id == id)?;
        self.links.retain(|link| !link.touches(id));
        self.pending.remove(&id);
        Some(self.bubbles.remove(index))
    }

    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().find(|b| b.id == id)
    }

    pub fn contains(&self, id: BubbleId) -> bool {
        self.get(id).is_some()
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Bubbles in paint order, without pending placeholders.
    pub fn settled_bubbles(&self) -> impl Iterator<Item = &Bubble> + '_ {
        self.bubbles.iter().filter(|b| !self.pending.contains(&b.id))
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Check whether any link joins `a` and `b`, in either direction.
    pub fn has_link_between(&self, a: BubbleId, b: BubbleId) -> bool {
        self.links.iter().any(|link| link.connects(a, b))
    }

    /// Create the directed link `from -> to`.
    pub fn add_link(&mut self, from: BubbleId, to: BubbleId) -> Result<Link, LinkRejection> {
        if from == to {
            return Err(LinkRejection::SelfLoop);
        }
        for id in [from, to] {
            if !self.contains(id) {
                return Err(LinkRejection::MissingBubble(id));
            }
        }
        if self.has_link_between(from, to) {
            return Err(LinkRejection::AlreadyLinked);
        }
        let link = Link::new(from, to);
        self.links.push(link);
        Ok(link)
    }

    /// Remove the link joining `a` and `b`, whatever its direction.
    pub fn remove_link(&mut self, a: BubbleId, b: BubbleId) -> bool {
        let before = self.links.len();
        self.links.retain(|link| !link.connects(a, b));
        self.links.len() != before
    }

    pub fn clear_links(&mut self) {
        self.links.clear();
    }

    /// Copy the settled bubbles. Pending placeholders are left out.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bubbles: self
                .bubbles
                .iter()
                .filter(|b| !self.pending.contains(&b.id))
                .cloned()
                .collect(),
        }
    }

    /// Replace the settled bubbles with the content of `snapshot`.
    ///
    /// Pending placeholders survive the restore so their translations can
    /// still land. Links are not part of history; links that now point at a
    /// missing bubble are dropped.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        let placeholders: Vec<Bubble> = self
            .bubbles
            .drain(..)
            .filter(|b| self.pending.contains(&b.id))
            .collect();
        self.bubbles = snapshot.bubbles.clone();
        self.bubbles.extend(placeholders);
        if let Some(max) = self.bubbles.iter().map(|b| b.id.0).max() {
            self.next_id = self.next_id.max(max);
        }
        let bubbles = &self.bubbles;
        self.links
            .retain(|link| bubbles.iter().any(|b| b.id == link.from) && bubbles.iter().any(|b| b.id == link.to));
    }

    /// Drop everything, including links and placeholders.
    pub fn clear(&mut self) {
        self.bubbles.clear();
        self.links.clear();
        self.pending.clear();
    }

    /// Topmost bubble under `p`, honouring ellipse outlines.
    pub fn hit_test(&self, p: BoxPoint) -> Option<BubbleId> {
        self.bubbles
            .iter()
            .rev()
            .find(|b| shape_contains(b.shape, &b.bbox, p))
            .map(|b| b.id)
    }

    /// Corner handle of bubble `id` within `tolerance` units of `p`.
    pub fn handle_at(&self, id: BubbleId, p: BoxPoint, tolerance: f32) -> Option<ResizeHandle> {
        let bubble = self.get(id)?;
        ResizeHandle::ALL.into_iter().find(|&handle| {
            let c = bubble.bbox.corner(handle);
            (c.x - p.x).abs() <= tolerance && (c.y - p.y).abs() <= tolerance
        })
    }
}

/// Check whether `p` lies inside a bubble outline.
pub fn shape_contains(shape: Shape, bbox: &BoundingBox, p: BoxPoint) -> bool {
    match shape {
        Shape::Rectangle => bbox.contains(p),
        Shape::Ellipse => {
            let c = bbox.center();
            let rx = bbox.width() / 2.0;
            let ry = bbox.height() / 2.0;
            let dx = (p.x - c.x) / rx;
            let dy = (p.y - c.y) / ry;
            dx * dx + dy * dy <= 1.0
        }
    }
}
