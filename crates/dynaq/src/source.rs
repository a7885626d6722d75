//! Data sources.
//!
//! A [`QuerySource`] is anything that carries a [`Plan`] over elements of a
//! [`Queryable`] type and can count the elements the plan produces. The
//! in-memory [`Query`] runs the plan over a slice; a remote executor would
//! translate the same plan into its own query language.

use std::fmt;

use crate::error::Result;
use crate::options::QueryOptions;
use crate::ordering::{compare_by_keys, SortKey};
use crate::plan::{Plan, Stage};
use crate::predicate::Predicate;
use crate::traits::Queryable;
use crate::value::Value;

/// A queryable sequence that accepts filter, order, skip and take stages.
pub trait QuerySource: Sized {
    /// Element type.
    type Item: Queryable;

    /// The plan accumulated so far.
    fn plan(&self) -> &Plan;

    /// Replaces the plan.
    fn with_plan(self, plan: Plan) -> Self;

    /// Number of elements the current plan produces.
    fn count(&self) -> Result<usize>;

    /// Applies query options; see [`apply`](crate::apply).
    fn apply_options(self, options: &mut QueryOptions) -> Result<Self> {
        crate::pipeline::apply(self, Some(options))
    }
}

/// In-memory query over a slice.
///
/// Stages run lazily: nothing is filtered or sorted until a terminal
/// operation such as [`to_vec`](Query::to_vec) is called.
///
/// ```
/// use dynaq::{Dir, Query, Queryable, SortKey};
///
/// #[derive(Queryable)]
/// struct Task {
///     title: String,
///     priority: u8,
/// }
///
/// let tasks = vec![
///     Task { title: "write".into(), priority: 2 },
///     Task { title: "test".into(), priority: 1 },
/// ];
///
/// let titles: Vec<_> = Query::new(&tasks)
///     .order_by(SortKey::on::<Task>("priority", Dir::Asc).unwrap())
///     .to_vec()
///     .into_iter()
///     .map(|t| t.title.as_str())
///     .collect();
/// assert_eq!(titles, ["test", "write"]);
/// ```
pub struct Query<'a, T> {
    items: &'a [T],
    plan: Plan,
}

impl<'a, T: Queryable> Query<'a, T> {
    /// Creates a query over `items` with an empty plan.
    pub fn new(items: &'a [T]) -> Self {
        Query {
            items,
            plan: Plan::new(),
        }
    }

    /// Adds a filter stage.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.plan.push(Stage::Filter(predicate));
        self
    }

    /// Adds a primary ordering stage.
    pub fn order_by(mut self, key: SortKey) -> Self {
        self.plan.push(Stage::OrderPrimary(key));
        self
    }

    /// Adds a secondary ordering stage.
    pub fn then_by(mut self, key: SortKey) -> Self {
        self.plan.push(Stage::OrderSecondary(key));
        self
    }

    /// Adds a skip stage.
    pub fn skip(mut self, n: usize) -> Self {
        self.plan.push(Stage::Skip(n));
        self
    }

    /// Adds a take stage.
    pub fn take(mut self, n: usize) -> Self {
        self.plan.push(Stage::Take(n));
        self
    }

    /// Runs the plan and returns the resulting elements.
    pub fn to_vec(&self) -> Vec<&'a T> {
        let mut rows: Vec<&'a T> = self.items.iter().collect();
        let mut keys: Vec<&SortKey> = Vec::new();
        let mut unsorted = false;

        for stage in self.plan.stages() {
            match stage {
                Stage::OrderPrimary(key) => {
                    if unsorted {
                        sort_rows(&mut rows, &keys);
                    }
                    keys.clear();
                    keys.push(key);
                    unsorted = true;
                    continue;
                }
                Stage::OrderSecondary(key) => {
                    keys.push(key);
                    unsorted = true;
                    continue;
                }
                _ => {}
            }

            if unsorted {
                sort_rows(&mut rows, &keys);
                unsorted = false;
            }
            match stage {
                Stage::Filter(predicate) => rows.retain(|row| predicate.matches(*row)),
                Stage::Skip(n) => {
                    rows.drain(..(*n).min(rows.len()));
                }
                Stage::Take(n) => rows.truncate(*n),
                Stage::OrderPrimary(_) | Stage::OrderSecondary(_) => {}
            }
        }

        if unsorted {
            sort_rows(&mut rows, &keys);
        }
        rows
    }

    /// Runs the plan and returns the first element.
    pub fn first(&self) -> Option<&'a T> {
        self.to_vec().into_iter().next()
    }

    /// Runs the plan and returns the number of elements.
    pub fn len(&self) -> usize {
        self.to_vec().len()
    }

    /// Returns `true` if the plan produces no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sort_rows<T: Queryable>(rows: &mut [&T], keys: &[&SortKey]) {
    rows.sort_by(|a, b| compare_by_keys(&Value::Record(*a), &Value::Record(*b), keys));
}

impl<T> Clone for Query<'_, T> {
    fn clone(&self) -> Self {
        Query {
            items: self.items,
            plan: self.plan.clone(),
        }
    }
}

impl<T> fmt::Debug for Query<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("items", &self.items.len())
            .field("plan", &self.plan.to_string())
            .finish()
    }
}

impl<T: Queryable> QuerySource for Query<'_, T> {
    type Item = T;

    fn plan(&self) -> &Plan {
        &self.plan
    }

    fn with_plan(mut self, plan: Plan) -> Self {
        self.plan = plan;
        self
    }

    fn count(&self) -> Result<usize> {
        Ok(self.len())
    }
}
