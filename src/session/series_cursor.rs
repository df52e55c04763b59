use crate::models::VideoId;

/// Position of the current video within its ordered sibling list.
///
/// `index` is `Some` only while the current video is one of `items`.
#[derive(Debug, Clone, Default)]
pub struct SeriesCursor {
    items: Vec<VideoId>,
    index: Option<usize>,
}

impl SeriesCursor {
    pub fn new(items: Vec<VideoId>, current: &VideoId) -> Self {
        let index = items.iter().position(|item| item == current);
        Self { items, index }
    }

    pub fn contains(&self, video: &VideoId) -> bool {
        self.items.contains(video)
    }

    /// Point the cursor at `video`; returns false if it is not a member
    pub fn update_current(&mut self, video: &VideoId) -> bool {
        self.index = self.items.iter().position(|item| item == video);
        self.index.is_some()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.index, Some(index) if index > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.index, Some(index) if index + 1 < self.items.len())
    }

    /// Neighbour before the current video. The cursor only moves once
    /// that neighbour has actually loaded, through `update_current`.
    pub fn peek_previous(&self) -> Option<VideoId> {
        let index = self.index.filter(|index| *index > 0)? - 1;
        self.items.get(index).cloned()
    }

    /// Neighbour after the current video
    pub fn peek_next(&self) -> Option<VideoId> {
        let index = self.index.filter(|index| index + 1 < self.items.len())? + 1;
        self.items.get(index).cloned()
    }
}
