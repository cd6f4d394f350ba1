use std::{cell::RefCell, collections::HashMap};

use mapgrid_core::{Region, Revision};

/// Range-keyed cache of shapes computed around the grid origin.
///
/// Entries remember the revision they were computed under and are rebuilt
/// on the first read after the grid configuration changes. Inserting under a
/// new revision drops every entry stamped with an older one.
#[derive(Clone, Debug, Default)]
pub(crate) struct ShapeCache {
    entries: RefCell<HashMap<u32, (Revision, Region)>>,
}

impl ShapeCache {
    pub(crate) fn get_or_compute(
        &self,
        revision: Revision,
        range: u32,
        compute: impl FnOnce() -> Region,
    ) -> Region {
        if let Some((stamp, region)) = self.entries.borrow().get(&range) {
            if *stamp == revision {
                return region.clone();
            }
        }

        tracing::debug!(range, revision = revision.get(), "computing grid shape");
        let region = compute();
        let mut entries = self.entries.borrow_mut();
        entries.retain(|_, (stamp, _)| *stamp == revision);
        let _ = entries.insert(range, (revision, region.clone()));
        region
    }
}
