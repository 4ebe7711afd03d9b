use engine::Item;

/// The single item attached to the cursor, if any.
#[derive(Debug, Default)]
pub(crate) struct HeldItemSlot {
    item: Option<Item>,
}

impl HeldItemSlot {
    pub(crate) fn holding(item: Item) -> Self {
        Self { item: Some(item) }
    }

    pub(crate) fn take(&mut self) -> Option<Item> {
        self.item.take()
    }

    /// Puts `item` on the cursor and returns whatever it displaced.
    pub(crate) fn set(&mut self, item: Item) -> Option<Item> {
        self.item.replace(item)
    }

    pub(crate) fn peek(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.item.is_none()
    }
}
