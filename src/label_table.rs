use crate::error::Error;
use assume::assume;
use log::trace;

/// Equivalence table of provisional labels used during the labelling scan.
///
/// Disjoint set with path halving and union by rank. Every root additionally stores the
/// smallest label of its class, which is what `resolve()` returns, so the canonical label of
/// a blob does not depend on the shape of the trees.
///
/// Label 0 is reserved for the background. It is always its own class.
#[derive(Debug, Clone)]
pub struct LabelTable {
    parents: Vec<u32>,
    ranks: Vec<u8>,
    smallest: Vec<u32>,
    limit: Option<u32>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelTable {
    /// Table without a capacity limit.
    pub fn new() -> Self {
        Self::with_optional_limit(None)
    }

    /// Table refusing to allocate more than `limit` provisional labels.
    pub fn with_limit(limit: u32) -> Self {
        Self::with_optional_limit(Some(limit))
    }

    /// Table limited to `limit` provisional labels if one is given.
    pub fn with_optional_limit(limit: Option<u32>) -> Self {
        LabelTable {
            parents: vec![0],
            ranks: vec![0],
            smallest: vec![0],
            limit,
        }
    }

    /// Number of provisional labels allocated so far.
    pub fn len(&self) -> usize {
        self.parents.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocates the next provisional label (1, 2, 3, ...) as a class of its own.
    pub fn new_label(&mut self) -> Result<u32, Error> {
        let label = u32::try_from(self.parents.len())
            .map_err(|_| Error::LabelsExhausted(u32::MAX))?;
        if let Some(limit) = self.limit {
            if label > limit {
                return Err(Error::LabelsExhausted(limit));
            }
        }
        self.parents.push(label);
        self.ranks.push(0);
        self.smallest.push(label);
        Ok(label)
    }

    #[inline]
    fn find(&mut self, label: u32) -> usize {
        let mut node = label as usize;
        assert!(
            node < self.parents.len(),
            "label {label} was never allocated (table has {} labels)",
            self.len()
        );
        loop {
            let parent = self.parents[node] as usize;
            // Every stored parent is an allocated label.
            assume!(unsafe: parent < self.parents.len(), "parent: {parent} > {}", self.parents.len());
            if parent == node {
                return node;
            }
            let grandparent = self.parents[parent];
            assume!(unsafe: (grandparent as usize) < self.parents.len(), "grandparent: {grandparent} > {}", self.parents.len());
            self.parents[node] = grandparent;
            node = grandparent as usize;
        }
    }

    /// Canonical label of `label`: the smallest label of its class.
    ///
    /// Idempotent, `resolve(resolve(l)) == resolve(l)`.
    ///
    /// # Panics
    ///
    /// If `label` was not allocated by this table.
    #[inline]
    pub fn resolve(&mut self, label: u32) -> u32 {
        let root = self.find(label);
        self.smallest[root]
    }

    /// Merges the classes of `label_a` and `label_b` and returns the canonical label of the
    /// merged class, which is the smaller of the two canonical labels.
    pub fn unify(&mut self, label_a: u32, label_b: u32) -> u32 {
        debug_assert!(label_a != 0 && label_b != 0, "background can't be unified");
        let root_a = self.find(label_a);
        let root_b = self.find(label_b);
        if root_a == root_b {
            return self.smallest[root_a];
        }
        let smallest = self.smallest[root_a].min(self.smallest[root_b]);
        let (root, child) = match self.ranks[root_a].cmp(&self.ranks[root_b]) {
            std::cmp::Ordering::Less => (root_b, root_a),
            std::cmp::Ordering::Greater => (root_a, root_b),
            std::cmp::Ordering::Equal => {
                self.ranks[root_a] = self.ranks[root_a].saturating_add(1);
                (root_a, root_b)
            }
        };
        self.parents[child] = root as u32;
        self.smallest[root] = smallest;
        trace!("unify {label_a} + {label_b} -> {smallest}");
        smallest
    }

    /// Distinct canonical labels in ascending order. Its length is the number of blobs.
    pub fn canonical_labels(&mut self) -> Vec<u32> {
        (1..self.parents.len() as u32)
            .filter(|label| self.resolve(*label) == *label)
            .collect()
    }

    /// Lookup table from every provisional label (index) to its canonical label.
    /// Index 0 maps to background.
    pub fn flatten(&mut self) -> Vec<u32> {
        (0..self.parents.len() as u32)
            .map(|label| self.resolve(label))
            .collect()
    }
}
