//! Rebuild of the interval columns from adjacency data alone.

use tracing::info;

use crate::error::Result;
use crate::store::{NodeId, NodeUpdate, TreeStore};

use super::TreeEngine;

impl<S: TreeStore> TreeEngine<S> {
    /// Reassigns every left/right (and level) value in scope purely from
    /// the `parent` column, in one transactional traversal.
    ///
    /// Boundaries are handed out positionally from a running counter, so
    /// the result depends only on the adjacency structure and the
    /// configured recovery order; running it twice produces identical
    /// assignments.
    pub fn recover(&mut self) -> Result<()> {
        self.transactional(|engine| {
            engine.recover_subtree(1, None, 0)?;
            Ok(())
        })?;
        info!("tree rebuilt from adjacency data");
        Ok(())
    }

    fn recover_subtree(
        &mut self,
        mut counter: i64,
        parent: Option<NodeId>,
        level: i64,
    ) -> Result<i64> {
        let level_tracked = self.config().level.is_some();
        for id in self.store().child_ids(parent)? {
            let lft = counter;
            counter += 1;
            counter = self.recover_subtree(counter, Some(id), level + 1)?;
            let rght = counter;
            counter += 1;
            self.store().update_node(
                id,
                &NodeUpdate {
                    lft: Some(lft),
                    rght: Some(rght),
                    level: level_tracked.then_some(level),
                    ..Default::default()
                },
            )?;
        }
        Ok(counter)
    }
}
