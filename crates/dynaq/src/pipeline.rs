//! Pipeline: applies query options to a data source.
//!
//! The fixed order is: compile filters, splice the ordering into the source's
//! plan, add the filter stage, then capture the data-set count and window the
//! result. Nothing is evaluated here beyond that optional count; the source
//! runs its plan when a terminal operation asks for elements.

use crate::error::{QueryError, Result};
use crate::options::QueryOptions;
use crate::ordering::SortKey;
use crate::plan::Stage;
use crate::predicate::Predicate;
use crate::source::QuerySource;
use crate::traits::FieldType;

/// Applies `options` to `source`.
///
/// Absent options leave the source untouched. When the options request it,
/// the post-filter, pre-windowing element count is written to
/// `pagination.data_set_count`; that is the only mutation of `options`.
///
/// Any failure is reported once as [`QueryError::Pipeline`] carrying the
/// query text the options were parsed from.
///
/// ```
/// use dynaq::{apply, parse, Query, Queryable};
///
/// #[derive(Queryable)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// let users = vec![
///     User { name: "Ada".into(), age: 36 },
///     User { name: "Linus".into(), age: 28 },
///     User { name: "Grace".into(), age: 45 },
/// ];
///
/// let mut options = parse("o=gt&p=age&v=30&s=age,desc&offset=0&count=10", None).unwrap();
/// let result = apply(Query::new(&users), Some(&mut options)).unwrap();
/// let names: Vec<_> = result.to_vec().iter().map(|u| u.name.as_str()).collect();
/// assert_eq!(names, ["Grace", "Ada"]);
/// ```
pub fn apply<S: QuerySource>(source: S, options: Option<&mut QueryOptions>) -> Result<S> {
    let Some(options) = options else {
        return Ok(source);
    };

    run(source, options).map_err(|err| {
        log::debug!("query pipeline failed: {}", err);
        QueryError::Pipeline {
            query: options.query_text().to_string(),
            source: Box::new(err),
        }
    })
}

fn run<S: QuerySource>(source: S, options: &mut QueryOptions) -> Result<S> {
    let root = FieldType::record::<S::Item>();

    let predicate = Predicate::compile_for(&root, options)?;
    let keys = options
        .sort_options
        .iter()
        .map(|sort| SortKey::compile(&root, sort, options.uses_case_insensitive_source))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut plan = source.plan().clone();
    plan.splice_order(keys, options.ignore_predefined_orders);
    if let Some(predicate) = predicate {
        plan.push(Stage::Filter(predicate));
    }
    let mut source = source.with_plan(plan);

    if let Some(pagination) = options.pagination.as_mut() {
        if pagination.assign_data_set_count {
            pagination.data_set_count = source.count()?;
        }

        let mut plan = source.plan().clone();
        if pagination.offset > 0 {
            plan.push(Stage::Skip(to_usize(pagination.offset)));
        }
        if pagination.count > 0 {
            plan.push(Stage::Take(to_usize(pagination.count)));
        }
        source = source.with_plan(plan);
    }

    log::debug!("query plan: {}", source.plan());
    Ok(source)
}

fn to_usize(n: i64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}
