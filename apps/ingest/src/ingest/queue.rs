use crate::models::{CvDocument, ItemId, UploadItem};

/// Files waiting for the next batch. Pure in-memory state, no failure modes.
#[derive(Debug, Default, Clone)]
pub struct UploadQueue {
    items: Vec<UploadItem>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends documents in order. Duplicate names are kept as distinct items.
    pub fn add(&mut self, documents: impl IntoIterator<Item = CvDocument>) -> Vec<ItemId> {
        documents
            .into_iter()
            .map(|doc| {
                let item = UploadItem::new(doc);
                let id = item.id;
                self.items.push(item);
                id
            })
            .collect()
    }

    /// Removes the first item with this file name.
    pub fn remove(&mut self, file_name: &str) -> bool {
        match self.items.iter().position(|i| i.file_name() == file_name) {
            Some(pos) => {
                self.items.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn remove_id(&mut self, id: ItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn items(&self) -> &[UploadItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [UploadItem] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.items.iter().map(|i| i.size_bytes()).sum()
    }

    /// Drains the queue for a batch, preserving order.
    pub fn take(&mut self) -> Vec<UploadItem> {
        std::mem::take(&mut self.items)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
