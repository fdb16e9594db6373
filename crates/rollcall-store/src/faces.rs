//! Face reference store: one grayscale sample per registered ID.

use crate::StoreError;
use image::GrayImage;
use rollcall_core::{FaceSample, PersonId};
use std::collections::HashMap;
use std::path::PathBuf;

/// Stored reference samples, keyed by person ID with a derived
/// insertion-order view for gallery traversal.
pub struct FaceStore {
    refs: HashMap<PersonId, FaceSample>,
    order: Vec<PersonId>,
    dir: PathBuf,
}

impl FaceStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            refs: HashMap::new(),
            order: Vec::new(),
            dir,
        }
    }

    /// Associate a reference sample with an ID, replacing any prior sample,
    /// and write it as `<id>.jpg` (overwriting any prior file).
    ///
    /// On a write failure the in-memory sample is kept; the error tells the
    /// caller the persisted image was lost.
    pub fn insert(&mut self, id: PersonId, sample: FaceSample) -> Result<(), StoreError> {
        let path = self.image_path(id);
        let width = sample.width;
        let height = sample.height;
        let data = sample.data.clone();

        if self.refs.insert(id, sample).is_none() {
            self.order.push(id);
        }

        let img = GrayImage::from_raw(width, height, data).ok_or(StoreError::InvalidSample {
            width,
            height,
            len: self.refs[&id].data.len(),
        })?;

        img.save(&path)
            .map_err(|source| StoreError::ImageWrite { path, source })
    }

    /// `(id, sample)` pairs in insertion order, for the matcher.
    pub fn gallery(&self) -> Vec<(PersonId, &FaceSample)> {
        self.order
            .iter()
            .filter_map(|id| self.refs.get(id).map(|s| (*id, s)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    fn image_path(&self, id: PersonId) -> PathBuf {
        self.dir.join(format!("{id}.jpg"))
    }
}
