//! The advisor seam: per-node reuse versus recompile decisions.

use crate::graph::CompileState;
use std::path::{Path, PathBuf};

pub trait Advisor: Send {
    /// Decide whether the node has to run through the pipeline again.
    fn should_recompile(&self, source: &Path, state: CompileState) -> bool {
        let _ = source;
        state != CompileState::TypeChecked
    }

    /// Announced before a pass recompiles the `modified` files together
    /// with their transitively `affected` dependents.
    fn notify_incremental_job(&mut self, modified: &[PathBuf], affected: &[Vec<PathBuf>]) {
        let _ = (modified, affected);
    }
}

/// Recompile everything that is not already checked.
pub struct DefaultAdvisor;

impl Advisor for DefaultAdvisor {}
