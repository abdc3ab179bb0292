// crates/proofdesk-core/src/reorder.rs
//
// Viewable ↔ master index translation for the thumbnail strip.
//
// The strip only shows previewable items, but the record stores every
// attachment in one ordered list. Every gesture on the strip is expressed
// in viewable indices and must be translated through ViewableIndex before
// the master list is touched. All functions here are pure: they return a new
// master list (or an error) and never mutate their input, so an aborted
// gesture cannot leave a half-applied edit behind.

use crate::error::ReorderError;
use crate::helpers::geometry::{Bounds, Point};
use crate::media_types::MediaItem;

// ── Mapping ───────────────────────────────────────────────────────────────────

/// `mapping[viewable] = master`. Rebuilt whenever the master list changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewableIndex {
    mapping: Vec<usize>,
}

impl ViewableIndex {
    /// Viewable items keep their master order; nothing is grouped by kind.
    pub fn build(master: &[MediaItem]) -> Self {
        let mapping = master
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_viewable())
            .map(|(i, _)| i)
            .collect();
        Self { mapping }
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.mapping
    }

    pub fn master_index(&self, viewable: usize) -> Option<usize> {
        self.mapping.get(viewable).copied()
    }

    pub fn viewable_index_of(&self, master: usize) -> Option<usize> {
        self.mapping.iter().position(|&m| m == master)
    }

    pub fn viewable<'a>(&self, master: &'a [MediaItem]) -> Vec<&'a MediaItem> {
        self.mapping.iter().filter_map(|&m| master.get(m)).collect()
    }

    fn translate(&self, viewable: usize, master_len: usize) -> Result<usize, ReorderError> {
        match self.master_index(viewable) {
            Some(m) if m < master_len => Ok(m),
            _ => Err(ReorderError::IndexOutOfRange { index: viewable, len: self.len() }),
        }
    }
}

// ── Reorder ───────────────────────────────────────────────────────────────────

/// Move the item at viewable `dragged` so it takes the place of viewable
/// `target`. Both directions remove first and insert at the target's master
/// index, which leaves the dragged item at viewable position `target`.
///
/// Non-viewable items between the two positions keep their relative order.
/// A forward drag onto the next item swaps the two; inserting at the
/// target's index minus one would put the item back where it was.
pub fn move_viewable(
    master:  &[MediaItem],
    index:   &ViewableIndex,
    dragged: usize,
    target:  usize,
) -> Result<Vec<MediaItem>, ReorderError> {
    if dragged == target {
        return Err(ReorderError::SameIndex(dragged));
    }
    let from = index.translate(dragged, master.len())?;
    let to   = index.translate(target, master.len())?;

    let mut out  = master.to_vec();
    let item     = out.remove(from);
    out.insert(to, item);
    Ok(out)
}

/// Where the selected viewable index ends up after a move.
///
/// ```
/// use proofdesk_core::reorder::follow_selection;
/// assert_eq!(follow_selection(2, 2, 0), 0); // selected item moved
/// assert_eq!(follow_selection(0, 2, 0), 1); // shifted right
/// assert_eq!(follow_selection(1, 0, 2), 0); // shifted left
/// assert_eq!(follow_selection(3, 0, 2), 3); // untouched
/// ```
pub fn follow_selection(selected: usize, dragged: usize, target: usize) -> usize {
    if selected == dragged {
        target
    } else if dragged < selected && selected <= target {
        selected - 1
    } else if target <= selected && selected < dragged {
        selected + 1
    } else {
        selected
    }
}

// ── Delete ────────────────────────────────────────────────────────────────────

/// Resolve a viewable index to its master index.
///
/// When `expected_url` is given and the mapped item does not carry that URL
/// (the mapping went stale between render and click), the item is located
/// by URL instead.
pub fn resolve_master_index(
    master:       &[MediaItem],
    index:        &ViewableIndex,
    viewable:     usize,
    expected_url: Option<&str>,
) -> Result<usize, ReorderError> {
    let mapped = index
        .master_index(viewable)
        .filter(|&m| m < master.len());

    match (mapped, expected_url) {
        (Some(m), None) => Ok(m),
        (Some(m), Some(url)) if master[m].url() == url => Ok(m),
        (mapped, Some(url)) => {
            tracing::debug!(viewable, ?mapped, url, "[reorder] mapping stale, falling back to url lookup");
            master
                .iter()
                .position(|item| item.url() == url)
                .ok_or_else(|| ReorderError::StaleMapping { url: url.to_string() })
        }
        (None, None) => Err(ReorderError::IndexOutOfRange { index: viewable, len: index.len() }),
    }
}

/// Outcome of a delete on the master list.
#[derive(Clone, Debug, PartialEq)]
pub struct Deleted {
    pub media:    Vec<MediaItem>,
    pub removed:  MediaItem,
    /// Viewable position the removed item actually held. Differs from the
    /// requested index when the URL fallback kicked in.
    pub viewable: Option<usize>,
}

/// Remove the item shown at viewable `viewable`.
pub fn delete_viewable(
    master:       &[MediaItem],
    index:        &ViewableIndex,
    viewable:     usize,
    expected_url: Option<&str>,
) -> Result<Deleted, ReorderError> {
    let m = resolve_master_index(master, index, viewable, expected_url)?;
    let mut media = master.to_vec();
    let removed   = media.remove(m);
    Ok(Deleted { media, removed, viewable: index.viewable_index_of(m) })
}

/// Selection after deleting viewable `deleted`, given the new viewable
/// length. `None` when nothing viewable is left.
pub fn selection_after_delete(selected: usize, deleted: usize, new_len: usize) -> Option<usize> {
    if new_len == 0 {
        return None;
    }
    let shifted = if deleted < selected { selected - 1 } else { selected };
    Some(shifted.min(new_len - 1))
}

// ── Drag state ────────────────────────────────────────────────────────────────

/// Ephemeral strip drag state, in viewable indices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DragState {
    pub dragged_index:   Option<usize>,
    pub drag_over_index: Option<usize>,
}

impl DragState {
    pub fn start(&mut self, index: usize) {
        self.dragged_index   = Some(index);
        self.drag_over_index = None;
    }

    pub fn over(&mut self, index: usize) {
        if self.dragged_index.is_some() {
            self.drag_over_index = Some(index);
        }
    }

    /// Clear the hover highlight only when the pointer has really left the
    /// thumbnail's box, not when it merely crossed onto a child element.
    pub fn leave(&mut self, index: usize, pointer: Option<Point>, bounds: Bounds) {
        if self.drag_over_index != Some(index) {
            return;
        }
        if pointer.is_some_and(|p| bounds.contains(p)) {
            return;
        }
        self.drag_over_index = None;
    }

    pub fn end(&mut self) {
        *self = Self::default();
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged_index.is_some()
    }

    /// Consume the gesture on drop. State is cleared before the caller acts
    /// on the result, so a failed reorder never leaves a stuck highlight.
    pub fn take_drop(&mut self, target: usize) -> Option<(usize, usize)> {
        let dragged = self.dragged_index;
        self.end();
        dragged.map(|d| (d, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_types::MediaObject;
    use proptest::prelude::*;

    fn item(name: &str, mime: &str) -> MediaItem {
        MediaItem::Object(MediaObject {
            url:           format!("https://store/{name}"),
            name:          name.into(),
            mime:          mime.into(),
            size:          1,
            uploaded_at:   None,
            thumbnail:     None,
            original_type: None,
        })
    }

    /// A(img), B(attachment), C(video), D(img)
    fn sample() -> Vec<MediaItem> {
        vec![
            item("a.png", "image/png"),
            item("b.zip", "application/zip"),
            item("c.mp4", "video/mp4"),
            item("d.jpg", "image/jpeg"),
        ]
    }

    fn names(list: &[MediaItem]) -> Vec<&str> {
        list.iter().map(MediaItem::name).collect()
    }

    #[test]
    fn mapping_skips_attachments() {
        let master = sample();
        let idx = ViewableIndex::build(&master);
        assert_eq!(idx.as_slice(), &[0, 2, 3]);
        let shown: Vec<&str> = idx.viewable(&master).into_iter().map(MediaItem::name).collect();
        assert_eq!(shown, ["a.png", "c.mp4", "d.jpg"]);
        assert_eq!(idx.viewable_index_of(1), None);
        assert_eq!(idx.viewable_index_of(3), Some(2));
    }

    #[test]
    fn drag_last_to_first() {
        let master = sample();
        let idx = ViewableIndex::build(&master);
        let out = move_viewable(&master, &idx, 2, 0).unwrap();
        assert_eq!(names(&out), ["d.jpg", "a.png", "b.zip", "c.mp4"]);
    }

    #[test]
    fn drag_forward_to_adjacent_moves() {
        let master = sample();
        let idx = ViewableIndex::build(&master);
        let out = move_viewable(&master, &idx, 0, 1).unwrap();
        assert_eq!(names(&out), ["b.zip", "c.mp4", "a.png", "d.jpg"]);
        let after = ViewableIndex::build(&out);
        assert_eq!(out[after.master_index(1).unwrap()].name(), "a.png");
    }

    #[test]
    fn drag_forward_onto_neighbour_swaps() {
        let master = sample();
        let idx = ViewableIndex::build(&master);
        // c.mp4 and d.jpg sit next to each other in both lists.
        let out = move_viewable(&master, &idx, 1, 2).unwrap();
        assert_eq!(names(&out), ["a.png", "b.zip", "d.jpg", "c.mp4"]);
        let shown: Vec<&str> = ViewableIndex::build(&out).viewable(&out).into_iter().map(MediaItem::name).collect();
        assert_eq!(shown, ["a.png", "d.jpg", "c.mp4"]);
    }

    #[test]
    fn drag_to_last_position() {
        let master = sample();
        let idx = ViewableIndex::build(&master);
        let out = move_viewable(&master, &idx, 0, 2).unwrap();
        assert_eq!(names(&out), ["b.zip", "c.mp4", "d.jpg", "a.png"]);
    }

    #[test]
    fn invalid_indices_abort() {
        let master = sample();
        let idx = ViewableIndex::build(&master);
        assert_eq!(move_viewable(&master, &idx, 1, 1), Err(ReorderError::SameIndex(1)));
        assert_eq!(
            move_viewable(&master, &idx, 0, 7),
            Err(ReorderError::IndexOutOfRange { index: 7, len: 3 })
        );
    }

    #[test]
    fn delete_video_through_mapping() {
        let master = sample();
        let idx = ViewableIndex::build(&master);
        let Deleted { media: out, removed, .. } = delete_viewable(&master, &idx, 1, Some("https://store/c.mp4")).unwrap();
        assert_eq!(removed.name(), "c.mp4");
        assert_eq!(names(&out), ["a.png", "b.zip", "d.jpg"]);
    }

    #[test]
    fn stale_mapping_falls_back_to_url() {
        let master = sample();
        let stale = ViewableIndex::build(&master);
        // Someone else removed A in the meantime.
        let fresh: Vec<_> = master[1..].to_vec();
        let Deleted { media: out, removed, .. } = delete_viewable(&fresh, &stale, 2, Some("https://store/d.jpg")).unwrap();
        assert_eq!(removed.name(), "d.jpg");
        assert_eq!(names(&out), ["b.zip", "c.mp4"]);

        let gone = delete_viewable(&fresh, &stale, 0, Some("https://store/a.png"));
        assert_eq!(gone.unwrap_err(), ReorderError::StaleMapping { url: "https://store/a.png".into() });
    }

    #[test]
    fn selection_after_delete_clamps() {
        assert_eq!(selection_after_delete(2, 2, 2), Some(1));
        assert_eq!(selection_after_delete(2, 0, 2), Some(1));
        assert_eq!(selection_after_delete(0, 1, 2), Some(0));
        assert_eq!(selection_after_delete(0, 0, 0), None);
    }

    #[test]
    fn drag_leave_respects_bounds() {
        let mut d = DragState::default();
        d.start(0);
        d.over(2);
        let b = Bounds::new(0.0, 0.0, 50.0, 50.0);
        d.leave(2, Some(Point::new(25.0, 25.0)), b);
        assert_eq!(d.drag_over_index, Some(2));
        d.leave(1, None, b);
        assert_eq!(d.drag_over_index, Some(2));
        d.leave(2, Some(Point::new(80.0, 25.0)), b);
        assert_eq!(d.drag_over_index, None);
    }

    #[test]
    fn take_drop_clears_state() {
        let mut d = DragState::default();
        assert_eq!(d.take_drop(1), None);
        d.start(3);
        d.over(1);
        assert_eq!(d.take_drop(1), Some((3, 1)));
        assert_eq!(d, DragState::default());
    }

    #[test]
    fn over_without_drag_is_ignored() {
        let mut d = DragState::default();
        d.over(4);
        assert_eq!(d.drag_over_index, None);
    }

    fn arb_master() -> impl Strategy<Value = Vec<MediaItem>> {
        prop::collection::vec(prop::bool::ANY, 2..16).prop_map(|flags| {
            flags
                .into_iter()
                .enumerate()
                .map(|(i, viewable)| {
                    if viewable {
                        item(&format!("{i}.png"), "image/png")
                    } else {
                        item(&format!("{i}.zip"), "application/zip")
                    }
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn mapping_matches_viewable_by_url(master in arb_master()) {
            let idx = ViewableIndex::build(&master);
            let viewable: Vec<_> = master.iter().filter(|m| m.is_viewable()).collect();
            prop_assert_eq!(idx.len(), viewable.len());
            for (i, v) in viewable.iter().enumerate() {
                prop_assert_eq!(master[idx.master_index(i).unwrap()].url(), v.url());
            }
        }

        #[test]
        fn reorder_preserves_items_and_lands_on_target(
            master in arb_master(),
            a in 0usize..16,
            b in 0usize..16,
        ) {
            let idx = ViewableIndex::build(&master);
            prop_assume!(idx.len() >= 2);
            let a = a % idx.len();
            let b = b % idx.len();
            prop_assume!(a != b);

            let out = move_viewable(&master, &idx, a, b).unwrap();

            let mut before: Vec<_> = master.iter().map(MediaItem::url).collect();
            let mut after:  Vec<_> = out.iter().map(MediaItem::url).collect();
            before.sort_unstable();
            after.sort_unstable();
            prop_assert_eq!(before, after);

            let moved = master[idx.master_index(a).unwrap()].url();
            let new_idx = ViewableIndex::build(&out);
            prop_assert_eq!(out[new_idx.master_index(b).unwrap()].url(), moved);

            // Attachments never change relative order.
            let hidden = |l: &[MediaItem]| l.iter().filter(|m| !m.is_viewable()).map(|m| m.url().to_string()).collect::<Vec<_>>();
            prop_assert_eq!(hidden(&master), hidden(&out));
        }

        #[test]
        fn selection_follows_moved_item(
            master in arb_master(),
            a in 0usize..16,
            b in 0usize..16,
            s in 0usize..16,
        ) {
            let idx = ViewableIndex::build(&master);
            prop_assume!(idx.len() >= 2);
            let (a, b, s) = (a % idx.len(), b % idx.len(), s % idx.len());
            prop_assume!(a != b);

            let selected_url = master[idx.master_index(s).unwrap()].url().to_string();
            let out = move_viewable(&master, &idx, a, b).unwrap();
            let new_idx = ViewableIndex::build(&out);
            let s2 = follow_selection(s, a, b);
            prop_assert_eq!(out[new_idx.master_index(s2).unwrap()].url(), selected_url.as_str());
        }
    }
}
