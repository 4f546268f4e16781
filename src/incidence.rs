//! Value × item incidence storage.
//!
//! Every filter value owns one row, addressed by its stable index in the
//! key's flat value list. A row is the set of item indices exhibiting that
//! value. Rows are roaring bitmaps so that "items matching all selected
//! values" is a chain of in-place intersections.

use roaring::RoaringBitmap;

use crate::error::{KeyError, Result};

#[derive(Debug, Clone)]
pub struct Incidence {
    rows: Vec<RoaringBitmap>,
    items: u32,
}
impl Incidence {
    pub fn new(values: usize, items: usize) -> Result<Self> {
        let items = u32::try_from(items)
            .map_err(|_| KeyError::Invariant(format!("{} items exceed the incidence width", items)))?;
        Ok(Self {
            rows: vec![RoaringBitmap::new(); values],
            items,
        })
    }
    pub fn values(&self) -> usize {
        self.rows.len()
    }
    pub fn items(&self) -> u32 {
        self.items
    }
    pub fn set(&mut self, value: usize, item: u32) {
        self.rows[value].insert(item);
    }
    pub fn row(&self, value: usize) -> &RoaringBitmap {
        &self.rows[value]
    }
    pub fn contains(&self, value: usize, item: u32) -> bool {
        self.rows[value].contains(item)
    }
    /// Swaps in a new row, handing back the old one.
    pub fn replace_row(&mut self, value: usize, row: RoaringBitmap) -> RoaringBitmap {
        std::mem::replace(&mut self.rows[value], row)
    }
    pub fn all_items(&self) -> RoaringBitmap {
        let mut all = RoaringBitmap::new();
        all.insert_range(0..self.items);
        all
    }
    /// Items present in every one of the given rows. No rows means every item.
    pub fn matching_all<'a, I>(&self, rows: I) -> RoaringBitmap
    where
        I: IntoIterator<Item = &'a RoaringBitmap>,
    {
        let mut surviving = self.all_items();
        for row in rows {
            if surviving.is_empty() {
                break;
            }
            // this is instead of the deprecated intersect_with
            surviving &= row;
        }
        surviving
    }
    /// Dense 0/1 rendering, one inner vector per value.
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| (0..self.items).map(|j| row.contains(j) as u8).collect())
            .collect()
    }
}
