//! Query plan IR.
//!
//! A [`Plan`] is the ordered list of [`Stage`]s a data source applies to its
//! elements. Keeping it explicit lets the order compiler find orderings that
//! are already present with a typed scan instead of inspecting an opaque
//! expression.

use std::fmt;

use crate::ordering::SortKey;
use crate::predicate::Predicate;

/// One step of a query plan.
#[derive(Debug, Clone)]
pub enum Stage {
    /// Keep elements matching the predicate.
    Filter(Predicate),
    /// Order by a key, discarding any previous ordering.
    OrderPrimary(SortKey),
    /// Break ties of the preceding ordering.
    OrderSecondary(SortKey),
    /// Drop the first n elements.
    Skip(usize),
    /// Keep at most n elements.
    Take(usize),
}

impl Stage {
    /// Returns `true` for primary and secondary orderings.
    pub fn is_order(&self) -> bool {
        matches!(self, Stage::OrderPrimary(_) | Stage::OrderSecondary(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Filter(predicate) => write!(f, "Where({})", predicate),
            Stage::OrderPrimary(key) => write!(f, "OrderBy({})", key),
            Stage::OrderSecondary(key) => write!(f, "ThenBy({})", key),
            Stage::Skip(n) => write!(f, "Skip({})", n),
            Stage::Take(n) => write!(f, "Take({})", n),
        }
    }
}

/// Ordered list of stages.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    stages: Vec<Stage>,
}

impl Plan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Plan::default()
    }

    /// The stages in application order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns `true` if the plan has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Appends a stage.
    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    /// Appends a stage, builder style.
    pub fn then(mut self, stage: Stage) -> Self {
        self.push(stage);
        self
    }

    /// Index of the most recently applied ordering stage.
    pub fn last_order_index(&self) -> Option<usize> {
        self.stages.iter().rposition(Stage::is_order)
    }

    /// Splices new sort keys into the plan.
    ///
    /// When the plan already orders its elements and `ignore_existing` is
    /// false, the keys become secondary orderings placed right after the most
    /// recent ordering stage, so existing orderings keep precedence. Otherwise
    /// they are appended as a fresh primary ordering followed by secondaries.
    pub fn splice_order(&mut self, keys: Vec<SortKey>, ignore_existing: bool) {
        if keys.is_empty() {
            return;
        }

        match self.last_order_index().filter(|_| !ignore_existing) {
            Some(index) => {
                log::trace!(
                    "splicing {} secondary ordering(s) after stage {}",
                    keys.len(),
                    index
                );
                let at = index + 1;
                self.stages
                    .splice(at..at, keys.into_iter().map(Stage::OrderSecondary));
            }
            None => {
                log::trace!("appending fresh ordering of {} key(s)", keys.len());
                let mut keys = keys.into_iter();
                if let Some(primary) = keys.next() {
                    self.stages.push(Stage::OrderPrimary(primary));
                }
                self.stages.extend(keys.map(Stage::OrderSecondary));
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}
