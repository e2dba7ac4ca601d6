//! Ordered set of bulk operations keyed by identifier

use indexmap::IndexMap;

use super::operation::BulkOperation;

/// Operations in insertion order, one per identifier.
///
/// Adding an operation whose identifier is already present replaces it in
/// place, so the last write wins and the original position is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOperationCollection {
    operations: IndexMap<String, BulkOperation>,
    dry_run: bool,
}

impl BulkOperationCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation added from now on is marked as a dry run
    pub fn set_dry_run(&mut self, dry_run: bool) -> &mut Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn add(&mut self, mut operation: BulkOperation) -> &mut Self {
        if self.dry_run {
            operation.set_dry_run(true);
        }
        self.operations
            .insert(operation.identifier().to_string(), operation);
        self
    }

    pub fn get(&self, identifier: &str) -> Option<&BulkOperation> {
        self.operations.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Values<'_, String, BulkOperation> {
        self.operations.values()
    }

    /// Split into consecutive collections of at most `size` operations
    pub fn chunks(&self, size: usize) -> Vec<BulkOperationCollection> {
        let size = size.max(1);
        let operations: Vec<&BulkOperation> = self.iter().collect();

        operations
            .chunks(size)
            .map(|chunk| BulkOperationCollection {
                operations: chunk
                    .iter()
                    .map(|operation| (operation.identifier().to_string(), (*operation).clone()))
                    .collect(),
                dry_run: self.dry_run,
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a BulkOperationCollection {
    type Item = &'a BulkOperation;
    type IntoIter = indexmap::map::Values<'a, String, BulkOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<BulkOperation> for BulkOperationCollection {
    fn from_iter<I: IntoIterator<Item = BulkOperation>>(iter: I) -> Self {
        let mut collection = BulkOperationCollection::new();
        for operation in iter {
            collection.add(operation);
        }
        collection
    }
}
