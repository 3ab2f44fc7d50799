// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing core: the bubble store, its history and the interaction session.
//!
//! [`Editor`] owns all three and is the only place history entries are
//! created. The UI feeds it pointer events and property edits; background
//! job results are applied through it as well, so every mutation goes
//! through the same commit rules.

pub mod history;
pub mod interaction;
pub mod linker;
pub mod viewport;

use crate::models::bubble::{Bubble, BubbleId, BoundingBox, Shape, DEFAULT_FONT_FAMILY};
use crate::models::store::{BubbleStore, Link, LinkRejection, Snapshot};
use crate::services::{ChainOutcome, Detection, RegionTranslation, ServiceError};
use history::{History, DEFAULT_MAX_HISTORY};
use interaction::{EditorSession, Outcome, PointerEvent, Tool};
use linker::ChainRequest;

/// A drawn region waiting to be sent for translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRequest {
    pub id: BubbleId,
    pub bbox: BoundingBox,
}

/// What happened to a region translation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionResolution {
    /// The placeholder received its text and was committed.
    Applied,
    /// The request failed and the placeholder was removed.
    Failed,
    /// The placeholder no longer exists; the result was ignored.
    Dropped,
}

/// Summary of a chain retranslation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChainSummary {
    pub updated: usize,
    pub failed_chains: usize,
}

/// Styling given to bubbles created from detections.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleDefaults {
    pub shape: Shape,
    pub font_family: String,
}

impl Default for BubbleDefaults {
    fn default() -> Self {
        Self {
            shape: Shape::Rectangle,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

pub struct Editor {
    store: BubbleStore,
    history: History,
    session: EditorSession,
    defaults: BubbleDefaults,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY, BubbleDefaults::default())
    }
}

impl Editor {
    pub fn new(max_history: usize, defaults: BubbleDefaults) -> Self {
        let store = BubbleStore::new();
        let history = History::new(store.snapshot(), max_history);
        let session = EditorSession {
            draw_shape: defaults.shape,
            ..Default::default()
        };
        Self {
            store,
            history,
            session,
            defaults,
        }
    }

    pub fn store(&self) -> &BubbleStore {
        &self.store
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// Mutable session access for state outside history (viewport, draw
    /// shape).
    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selected(&self) -> Option<BubbleId> {
        self.session.selected
    }

    pub fn selected_bubble(&self) -> Option<&Bubble> {
        self.session.selected.and_then(|id| self.store.get(id))
    }

    pub fn select(&mut self, id: Option<BubbleId>) {
        self.session.selected = id.filter(|id| self.store.contains(*id));
    }

    /// Start over with an empty document, e.g. after loading a new image.
    pub fn reset(&mut self) {
        self.store.clear();
        self.history.reset(self.store.snapshot());
        let tool = self.session.tool;
        let draw_shape = self.session.draw_shape;
        self.session = EditorSession {
            tool,
            draw_shape,
            ..Default::default()
        };
        log::info!("Editor reset");
    }

    /// The store as history sees it: placeholders left out, and a bubble
    /// being dragged or resized still at its pre-gesture box.
    fn settled_snapshot(&self) -> Snapshot {
        let snapshot = self.store.snapshot();
        match self.session.gesture_origin() {
            Some((id, origin)) => snapshot.with_bbox(id, origin),
            None => snapshot,
        }
    }

    /// Record the current state as a new history entry.
    fn commit(&mut self) {
        self.history.commit(self.settled_snapshot());
        log::debug!(
            "Committed snapshot ({} bubbles, {} undo steps)",
            self.store.len(),
            self.history.undo_count()
        );
    }

    /// Commit only if the settled bubbles differ from the current entry.
    /// Returns whether a commit happened.
    pub fn commit_if_changed(&mut self) -> bool {
        if self.settled_snapshot() == *self.history.current() {
            return false;
        }
        self.commit();
        true
    }

    /// Give unfinished property edits their own history entry so a
    /// background result lands as a separate step.
    fn settle_edits(&mut self) {
        if self.commit_if_changed() {
            log::debug!("Committed pending edits before applying a result");
        }
    }

    // Interaction

    /// Feed a pointer event through the state machine. A drawn region comes
    /// back as a request the caller must send for translation.
    pub fn pointer(&mut self, event: &PointerEvent) -> Option<RegionRequest> {
        match interaction::transition(&mut self.session, &mut self.store, event) {
            Outcome::Commit => {
                self.commit_if_changed();
                None
            }
            Outcome::RegionDrawn { id, bbox } => {
                log::info!("Drew region {} at {:?}", id, bbox.to_array());
                Some(RegionRequest { id, bbox })
            }
            Outcome::LinkCreated(link) => {
                log::info!("Linked {} -> {}", link.from, link.to);
                None
            }
            Outcome::None
            | Outcome::Preview
            | Outcome::ViewportChanged
            | Outcome::SelectionChanged(_)
            | Outcome::DrawDiscarded
            | Outcome::LinkSourceChanged(_) => None,
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if self.session.tool != tool {
            log::debug!("Tool changed to {:?}", tool);
        }
        interaction::set_tool(&mut self.session, &mut self.store, tool);
    }

    pub fn cancel_gesture(&mut self) {
        interaction::cancel_gesture(&mut self.session, &mut self.store);
    }

    // History

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.store.restore(snapshot);
        self.after_restore();
        log::info!("Undo ({} steps left)", self.history.undo_count());
        true
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.store.restore(snapshot);
        self.after_restore();
        log::info!("Redo ({} steps left)", self.history.redo_count());
        true
    }

    fn after_restore(&mut self) {
        if let Some(id) = self.session.selected {
            if !self.store.contains(id) {
                self.session.selected = None;
            }
        }
    }

    // Bubble edits

    /// Delete a bubble and its links. Returns false if it did not exist.
    pub fn delete(&mut self, id: BubbleId) -> bool {
        self.cancel_gesture();
        if self.store.remove(id).is_none() {
            return false;
        }
        if self.session.selected == Some(id) {
            self.session.selected = None;
        }
        log::info!("Deleted bubble {}", id);
        self.commit_if_changed();
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.session.selected {
            Some(id) => self.delete(id),
            None => false,
        }
    }

    /// Edit a bubble in place without recording history. Call
    /// [`Editor::commit_if_changed`] once the edit is finished.
    pub fn update_bubble(&mut self, id: BubbleId, edit: impl FnOnce(&mut Bubble)) -> bool {
        match self.store.get_mut(id) {
            Some(bubble) => {
                edit(bubble);
                true
            }
            None => false,
        }
    }

    pub fn toggle_shape(&mut self, id: BubbleId) {
        if self.update_bubble(id, |b| b.shape = b.shape.toggled()) {
            self.commit_if_changed();
        }
    }

    pub fn set_font_scale(&mut self, id: BubbleId, scale: f32) {
        if self.update_bubble(id, |b| b.set_font_size_scale(scale)) {
            self.commit_if_changed();
        }
    }

    pub fn set_draw_shape(&mut self, shape: Shape) {
        self.session.draw_shape = shape;
    }

    // Links (outside history)

    pub fn add_link(&mut self, from: BubbleId, to: BubbleId) -> Result<Link, LinkRejection> {
        self.store.add_link(from, to)
    }

    pub fn remove_link(&mut self, a: BubbleId, b: BubbleId) -> bool {
        let removed = self.store.remove_link(a, b);
        if removed {
            log::info!("Removed link between {} and {}", a, b);
        }
        removed
    }

    pub fn clear_links(&mut self) {
        let count = self.store.links().len();
        self.store.clear_links();
        if self.session.link_source().is_some() {
            self.cancel_gesture();
        }
        log::info!("Cleared {} links", count);
    }

    // Collaborator results

    /// Add a bubble for every detection and commit them as one step.
    pub fn apply_detections(&mut self, detections: Vec<Detection>) -> usize {
        let count = detections.len();
        if count > 0 {
            self.settle_edits();
        }
        for detection in detections {
            let id = self.store.allocate_id();
            let mut bubble = Bubble::new(
                id,
                detection.translated_text.clone().unwrap_or_default(),
                detection.bounding_box(),
            );
            bubble.original_text = detection.original_text.clone();
            bubble.text_color = detection.text_color();
            bubble.background_color = detection.background_color();
            bubble.shape = self.defaults.shape;
            bubble.font_family = self.defaults.font_family.clone();
            self.store.insert(bubble);
        }
        if count > 0 {
            self.commit();
        }
        log::info!("Added {} detected bubbles", count);
        count
    }

    /// Settle a drawn placeholder with its translation, or remove it if the
    /// request failed.
    pub fn apply_region_result(
        &mut self,
        id: BubbleId,
        result: Result<RegionTranslation, ServiceError>,
    ) -> RegionResolution {
        if !self.store.is_pending(id) || !self.store.contains(id) {
            log::debug!("Dropping region result for missing bubble {}", id);
            return RegionResolution::Dropped;
        }
        match result {
            Ok(region) => {
                self.settle_edits();
                self.update_bubble(id, |bubble| {
                    bubble.text = region.translated_text.clone();
                    bubble.text_color = region.text_color();
                    bubble.background_color = region.background_color();
                });
                self.store.resolve_placeholder(id);
                self.commit();
                log::info!("Region {} translated", id);
                RegionResolution::Applied
            }
            Err(e) => {
                log::error!("Region translation for {} failed: {}", id, e);
                if self.session.selected == Some(id) {
                    self.session.selected = None;
                }
                self.store.remove(id);
                RegionResolution::Failed
            }
        }
    }

    /// Chains built from the current links, ready for retranslation.
    pub fn chain_requests(&self) -> Vec<ChainRequest> {
        linker::chain_requests(&self.store)
    }

    /// Apply every successful chain and commit the whole pass as one step.
    /// Failed chains keep their text.
    pub fn apply_chain_outcomes(&mut self, outcomes: Vec<ChainOutcome>) -> ChainSummary {
        let mut summary = ChainSummary::default();
        self.settle_edits();
        for outcome in outcomes {
            match outcome.result {
                Ok(translations) => {
                    for translation in translations {
                        if !outcome.ids.contains(&translation.id) {
                            log::warn!("Ignoring translation for {} outside its chain", translation.id);
                            continue;
                        }
                        let text = translation.translated_text;
                        if self.update_bubble(translation.id, |b| b.text = text) {
                            summary.updated += 1;
                        }
                    }
                }
                Err(e) => {
                    log::error!("Retranslation of chain {:?} failed: {}", outcome.ids, e);
                    summary.failed_chains += 1;
                }
            }
        }
        self.commit_if_changed();
        log::info!(
            "Retranslation updated {} bubbles, {} chains failed",
            summary.updated,
            summary.failed_chains
        );
        summary
    }
}
