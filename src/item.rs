/// One unit of work flowing through the chain: a number plus the annotation
/// accumulated so far.
///
/// Items are never mutated in place. A stage either forwards the item it
/// received or derives a new one with [`Item::with_label`] /
/// [`Item::with_annotation`], so no stage ever observes a half-updated item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    value: i64,
    annotation: String,
}

impl Item {
    /// Create an item with an empty annotation
    pub fn new(value: i64) -> Self {
        Self {
            value,
            annotation: String::new(),
        }
    }

    /// The numeric value, fixed for the item's lifetime
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The annotation accumulated by upstream stages
    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    /// Derive a new item with `label` appended to the annotation
    pub fn with_label(&self, label: &str) -> Item {
        Item {
            value: self.value,
            annotation: format!("{}{}", self.annotation, label),
        }
    }

    /// Derive a new item with the annotation replaced wholesale
    pub fn with_annotation(&self, annotation: impl Into<String>) -> Item {
        Item {
            value: self.value,
            annotation: annotation.into(),
        }
    }
}
