use roaring::RoaringBitmap;

/// Compressed set of document ids for one term. Iteration order is ascending
/// by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingSet {
    bitmap: RoaringBitmap,
}

impl PostingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: u32) {
        self.bitmap.insert(id);
    }

    pub fn contains(&self, id: u32) -> bool {
        self.bitmap.contains(id)
    }

    pub fn union_in_place(&mut self, other: &PostingSet) {
        self.bitmap |= &other.bitmap;
    }

    pub fn intersect_in_place(&mut self, other: &PostingSet) {
        self.bitmap &= &other.bitmap;
    }

    pub fn cardinality(&self) -> u64 {
        self.bitmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.bitmap.iter()
    }

    pub fn to_sorted_vec(&self) -> Vec<u32> {
        self.bitmap.iter().collect()
    }
}

impl FromIterator<u32> for PostingSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = PostingSet::new();
        for id in iter {
            set.add(id);
        }
        set
    }
}
