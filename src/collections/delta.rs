// ============================================================================
// catalog-signals - Delta
// One incremental change emitted by a CollectionSignal
// ============================================================================

/// What kind of change a `Delta` describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaKind {
    Add,
    Remove,
}

/// A single add or remove carrying the affected value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Delta<T> {
    /// The value was appended.
    Add(T),
    /// The first element equal to the value was removed.
    Remove(T),
}

impl<T> Delta<T> {
    pub fn kind(&self) -> DeltaKind {
        match self {
            Delta::Add(_) => DeltaKind::Add,
            Delta::Remove(_) => DeltaKind::Remove,
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Delta::Add(value) | Delta::Remove(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Delta::Add(value) | Delta::Remove(value) => value,
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, Delta::Add(_))
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Delta::Remove(_))
    }

    /// Replay this delta onto a plain `Vec` the way the collection applied it.
    ///
    /// A view that mirrors a collection starts from `get()` and applies each
    /// delta it receives.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_signals::Delta;
    ///
    /// let mut mirror = vec!["a", "b", "a"];
    /// Delta::Remove("a").apply_to(&mut mirror);
    /// Delta::Add("c").apply_to(&mut mirror);
    /// assert_eq!(mirror, vec!["b", "a", "c"]);
    /// ```
    pub fn apply_to(&self, items: &mut Vec<T>)
    where
        T: Clone + PartialEq,
    {
        match self {
            Delta::Add(value) => items.push(value.clone()),
            Delta::Remove(value) => {
                if let Some(index) = items.iter().position(|item| item == value) {
                    items.remove(index);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_value() {
        let add = Delta::Add(3);
        let remove = Delta::Remove(4);

        assert_eq!(add.kind(), DeltaKind::Add);
        assert_eq!(remove.kind(), DeltaKind::Remove);
        assert_eq!(*add.value(), 3);
        assert_eq!(remove.into_value(), 4);
        assert!(add.is_add() && !add.is_remove());
    }

    #[test]
    fn apply_remove_of_absent_value_is_noop() {
        let mut items = vec![1, 2];
        Delta::Remove(9).apply_to(&mut items);
        assert_eq!(items, vec![1, 2]);
    }
}
