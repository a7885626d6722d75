//! End-to-end tests: query text in, filtered, ordered and windowed records out.

use chrono::{DateTime, TimeZone, Utc};
use dynaq::{
    apply, parse, CompileError, Dir, Filter, FilterOperation, LogicalOperator, OpCodes,
    PaginationBehaviour, PaginationOption, PaginationPolicy, Plan, Predicate, Query, QueryEnum,
    QueryError, QueryOptions, QueryResolver, QuerySource, Queryable, RequestParts, Settings,
    SortKey, SortOption, Stage,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, QueryEnum)]
enum Role {
    Reader,
    Editor = 5,
    Admin = 10,
}

#[derive(Queryable)]
struct Address {
    city: String,
    zip: Option<String>,
}

#[derive(Queryable)]
struct User {
    name: String,
    age: i32,
    score: Option<f64>,
    active: bool,
    role: Role,
    joined: DateTime<Utc>,
    address: Option<Address>,
    tags: Vec<String>,
    scores: Vec<i32>,
    #[query(skip)]
    #[allow(dead_code)]
    password: String,
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn users() -> Vec<User> {
    vec![
        User {
            name: "Ada".into(),
            age: 36,
            score: Some(9.5),
            active: true,
            role: Role::Admin,
            joined: day(2020, 1, 1),
            address: Some(Address {
                city: "London".into(),
                zip: Some("N1".into()),
            }),
            tags: vec!["math".into(), "Engines".into()],
            scores: vec![3, 5, 7],
            password: "x".into(),
        },
        User {
            name: "Grace".into(),
            age: 45,
            score: None,
            active: true,
            role: Role::Editor,
            joined: day(2019, 6, 1),
            address: Some(Address {
                city: "Arlington".into(),
                zip: None,
            }),
            tags: vec!["navy".into()],
            scores: vec![9],
            password: "x".into(),
        },
        User {
            name: "Linus".into(),
            age: 28,
            score: Some(7.0),
            active: false,
            role: Role::Reader,
            joined: day(2021, 3, 15),
            address: None,
            tags: vec![],
            scores: vec![],
            password: "x".into(),
        },
        User {
            name: "Test_1".into(),
            age: 20,
            score: Some(1.0),
            active: false,
            role: Role::Reader,
            joined: day(2022, 8, 30),
            address: Some(Address {
                city: "Oslo".into(),
                zip: Some("0150".into()),
            }),
            tags: vec!["x".into()],
            scores: vec![100],
            password: "x".into(),
        },
    ]
}

fn names<'a>(users: &[&'a User]) -> Vec<&'a str> {
    users.iter().map(|u| u.name.as_str()).collect()
}

fn run<'a>(users: &'a [User], query: &str) -> Vec<&'a str> {
    let mut options = parse(query, None).unwrap();
    let result = apply(Query::new(users), Some(&mut options)).unwrap();
    names(&result.to_vec())
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn parse_is_pure() {
    let query = "o=eq&p=Name&v=Ada&s=Age,desc&offset=1&count=2";
    assert_eq!(parse(query, None).unwrap(), parse(query, None).unwrap());
}

#[test]
fn triplet_mismatch_is_reported() {
    init();
    let err = parse("o=eq&p=Name&o=eq&p=Age&v=1", None).unwrap_err();
    match err {
        QueryError::TripletMismatch {
            operations,
            properties,
            values,
            ..
        } => assert_eq!((operations, properties, values), (2, 2, 1)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn triplet_mismatch_is_reported_before_group_errors() {
    let err = parse("o=eq&o=eq&p=Name&v=(x)y", None).unwrap_err();
    assert!(matches!(
        err,
        QueryError::TripletMismatch {
            operations: 2,
            properties: 1,
            values: 1,
            ..
        }
    ));

    let err = parse("o=eq&p=Name&v=(x)y", None).unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery { .. }));
}

#[test]
fn custom_shortcodes_sit_beside_defaults() {
    let mut codes = OpCodes::new();
    codes.insert("is".into(), FilterOperation::Equals);
    codes.insert("older".into(), FilterOperation::GreaterThan);

    let options = parse("o=is&p=Name&v=Ada&o=older|OrElse&p=Age&v=40&o=ne&p=Active&v=false", Some(&codes)).unwrap();
    let ops: Vec<_> = options.filters.iter().map(|f| f.operator).collect();
    assert_eq!(
        ops,
        [
            FilterOperation::Equals,
            FilterOperation::GreaterThan,
            FilterOperation::NotEqual
        ]
    );

    assert!(matches!(
        parse("o=older&p=Age&v=40", None),
        Err(QueryError::OperationNotSupported { .. })
    ));
}

#[test]
fn keys_are_case_insensitive() {
    let data = users();
    assert_eq!(run(&data, "O=eq&P=name&V=ada"), ["Ada"]);
}

#[test]
fn fully_encoded_query() {
    let data = users();
    assert_eq!(run(&data, "o%3Deq%26p%3DName%26v%3DLinus"), ["Linus"]);
}

#[test]
fn nested_query_is_parsed_for_collection_operators() {
    let options = parse("o=any&p=Scores&v=(o=gt&p=_&v=8)&s=Name", None).unwrap();
    let nested = options.filters[0].value.as_nested().unwrap();
    assert_eq!(nested.filters.len(), 1);
    assert_eq!(nested.filters[0].property_name, "_");
    assert_eq!(nested.filters[0].operator, FilterOperation::GreaterThan);
    assert_eq!(options.sort_options.len(), 1);
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn filters_fold_left_to_right() {
    init();
    let data = users();
    let query = "o=eq&p=Name&v=Ada&o=eq|OrElse&p=Name&v=Grace&o=gt&p=Age&v=40";
    assert_eq!(run(&data, query), ["Grace"]);

    let options = parse(query, None).unwrap();
    let predicate = Predicate::compile::<User>(&options).unwrap().unwrap();
    assert_eq!(
        predicate.to_string(),
        r#"((Name.to_lowercase() == "ada" || Name.to_lowercase() == "grace") && Age > 40)"#
    );
}

#[test]
fn case_sensitivity_tri_state() {
    let data = users();
    let test_1 = &data[3];

    let insensitive = parse("o=eq&p=Name&v=test_1", None).unwrap();
    let predicate = Predicate::compile::<User>(&insensitive).unwrap().unwrap();
    assert!(predicate.matches(test_1));

    let sensitive = parse("o=eq&p=Name,cs&v=test_1", None).unwrap();
    let predicate = Predicate::compile::<User>(&sensitive).unwrap().unwrap();
    assert!(!predicate.matches(test_1));
    assert_eq!(predicate.to_string(), r#"Name == "test_1""#);

    let folded_source = sensitive.case_insensitive_source(true);
    let predicate = Predicate::compile::<User>(&folded_source).unwrap().unwrap();
    assert!(predicate.matches(test_1));
}

#[test]
fn string_methods() {
    let data = users();
    assert_eq!(run(&data, "o=cts&p=Name&v=A"), ["Ada", "Grace"]);
    assert_eq!(run(&data, "o=sw&p=Name,cs&v=l"), Vec::<&str>::new());
    assert_eq!(run(&data, "o=ew&p=Address.City&v=DON"), ["Ada"]);
}

#[test]
fn in_and_not_in_expand_to_equality_chains() {
    let data = users();
    let options = parse("o=in&p=Age&v=20,36,45", None).unwrap();
    let predicate = Predicate::compile::<User>(&options).unwrap().unwrap();
    assert_eq!(
        predicate.to_string(),
        "((Age == 20 || Age == 36) || Age == 45)"
    );
    assert_eq!(run(&data, "o=in&p=Age&v=20,36,45"), ["Ada", "Grace", "Test_1"]);

    let options = parse("o=nin&p=Name&v=ada,linus", None).unwrap();
    let predicate = Predicate::compile::<User>(&options).unwrap().unwrap();
    assert_eq!(
        predicate.to_string(),
        r#"!(Name.to_lowercase() == "ada" || Name.to_lowercase() == "linus")"#
    );
    assert_eq!(run(&data, "o=nin&p=Name&v=ada,linus"), ["Grace", "Test_1"]);
}

#[test]
fn typed_members() {
    let data = users();
    assert_eq!(run(&data, "o=eq&p=Active&v=TRUE"), ["Ada", "Grace"]);
    assert_eq!(run(&data, "o=gt&p=Joined&v=2020-01-01"), ["Linus", "Test_1"]);
    assert_eq!(run(&data, "o=eq&p=Role&v=admin"), ["Ada"]);
    assert_eq!(run(&data, "o=gtoe&p=Role&v=5"), ["Ada", "Grace"]);
    assert_eq!(run(&data, "o=lt&p=Score&v=8"), ["Linus", "Test_1"]);
}

#[test]
fn null_literal_on_optional_members() {
    let data = users();
    assert_eq!(run(&data, "o=eq&p=Score&v=null"), ["Grace"]);
    assert_eq!(run(&data, "o=ne&p=Address.Zip&v=null"), ["Ada", "Test_1"]);

    let options = parse("o=eq&p=Age&v=null", None).unwrap();
    assert_eq!(
        Predicate::compile::<User>(&options).unwrap_err(),
        CompileError::NullOnNonOptional {
            property: "Age".into()
        }
    );
}

#[test]
fn absent_values_never_match_negative_filters() {
    let data = users();
    assert_eq!(run(&data, "o=ne&p=Score&v=1"), ["Ada", "Linus"]);
    assert_eq!(run(&data, "o=nin&p=Score&v=1"), ["Ada", "Linus"]);

    assert_eq!(run(&data, "o=ne&p=Address.City&v=london"), ["Grace", "Test_1"]);
    assert_eq!(run(&data, "o=nin&p=Address.City&v=london"), ["Grace", "Test_1"]);
}

#[test]
fn null_literal_as_string() {
    let options = parse("o=eq&p=Name&v=null", None).unwrap();
    assert!(matches!(
        Predicate::compile::<User>(&options),
        Err(CompileError::NullOnNonOptional { .. })
    ));

    let options = QueryOptions {
        is_null_value_string: true,
        ..options
    };
    let predicate = Predicate::compile::<User>(&options).unwrap().unwrap();
    assert_eq!(predicate.to_string(), r#"Name.to_lowercase() == "null""#);
}

#[test]
fn nested_members_skip_absent_records() {
    let data = users();
    assert_eq!(run(&data, "o=eq&p=Address.City&v=london"), ["Ada"]);
    assert_eq!(run(&data, "o=ne&p=address.city&v=london"), ["Grace", "Test_1"]);
}

#[test]
fn any_and_all_over_collections() {
    let data = users();
    let ada = &data[0];
    let check = |query: &str| {
        let options = parse(query, None).unwrap();
        Predicate::compile::<User>(&options)
            .unwrap()
            .unwrap()
            .matches(ada)
    };

    assert!(check("o=all&p=Scores&v=(o=ltoe&p=_&v=100)"));
    assert!(check("o=any&p=Scores&v=(o=eq&p=_&v=7)"));
    assert!(!check("o=all&p=Scores&v=(o=eq&p=_&v=7)"));
    assert!(!check("o=any&p=Scores&v=(o=eq&p=_&v=9)"));
    assert!(check("o=any&p=Tags&v=(o=eq&p=_&v=engines)"));

    // vacuous truth on empty collections
    assert_eq!(
        run(&data, "o=all&p=Scores&v=(o=gt&p=_&v=8)"),
        ["Grace", "Linus", "Test_1"]
    );
    assert_eq!(run(&data, "o=any&p=Scores&v=(o=gt&p=_&v=8)"), ["Grace", "Test_1"]);
}

#[test]
fn encoded_nested_query() {
    let data = users();
    assert_eq!(
        run(&data, "o=any&p=Scores&v=%28o%3Deq%26p%3D_%26v%3D7%29"),
        ["Ada"]
    );
}

#[test]
fn several_nested_groups_in_one_query() {
    let data = users();
    assert_eq!(
        run(
            &data,
            "o=any&p=Scores&v=(o=gt&p=_&v=4)&o=any|OrElse&p=Tags&v=(o=eq&p=_&v=x)"
        ),
        ["Ada", "Grace", "Test_1"]
    );
}

#[test]
fn nested_query_display() {
    let options = parse("o=any&p=Tags&v=(o=sw&p=_&v=Eng)", None).unwrap();
    let predicate = Predicate::compile::<User>(&options).unwrap().unwrap();
    assert_eq!(
        predicate.to_string(),
        r#"Tags.any(_.to_lowercase().starts_with("eng"))"#
    );
}

#[test]
fn compile_errors() {
    let compile = |query: &str| Predicate::compile::<User>(&parse(query, None).unwrap()).unwrap_err();

    assert!(matches!(
        compile("o=eq&p=Missing&v=1"),
        CompileError::UnknownMember { .. }
    ));
    assert!(matches!(
        compile("o=eq&p=Age&v=old"),
        CompileError::Coercion { .. }
    ));
    assert!(matches!(
        compile("o=gt&p=Active&v=true"),
        CompileError::OperatorTypeMismatch { .. }
    ));
    assert!(matches!(
        compile("o=cts&p=Age&v=3"),
        CompileError::OperatorTypeMismatch { .. }
    ));
    assert!(matches!(
        compile("o=any&p=Name&v=(o=eq&p=_&v=a)"),
        CompileError::NotACollection { .. }
    ));
    assert!(matches!(
        compile("o=any&p=Tags&v=()"),
        CompileError::MissingNestedQuery { .. }
    ));
}

#[test]
fn built_options_need_no_text() {
    let data = users();
    let nested = QueryOptions::new().filter(Filter::new("_", FilterOperation::GreaterThan, "8"));
    let mut options = QueryOptions::new()
        .filter(Filter::new("Scores", FilterOperation::Any, nested))
        .filter(
            Filter::new("Name", FilterOperation::Equals, "Linus").joined_by(LogicalOperator::Or),
        )
        .sort(SortOption::new("Age", Dir::Asc));

    let result = apply(Query::new(&data), Some(&mut options)).unwrap();
    assert_eq!(names(&result.to_vec()), ["Test_1", "Linus", "Grace"]);
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn sort_directions_and_ties() {
    let data = users();
    assert_eq!(
        run(&data, "s=Active,desc&s=Age"),
        ["Ada", "Grace", "Test_1", "Linus"]
    );
    // absent members sort last when ascending
    assert_eq!(
        run(&data, "s=Address.City"),
        ["Grace", "Ada", "Test_1", "Linus"]
    );
    assert_eq!(run(&data, "s=Role,desc&s=Name,desc"), ["Ada", "Grace", "Test_1", "Linus"]);
}

#[derive(Queryable)]
struct Pair {
    a: i32,
    b: String,
}

fn pairs() -> Vec<Pair> {
    [(1, "z"), (2, "y"), (1, "x")]
        .into_iter()
        .map(|(a, b)| Pair { a, b: b.into() })
        .collect()
}

fn ordered(pairs: &[Pair], ignore_existing: bool) -> Vec<(i32, &str)> {
    let source = Query::new(pairs).order_by(SortKey::on::<Pair>("a", Dir::Asc).unwrap());
    let mut options = parse("s=b", None)
        .unwrap()
        .ignoring_predefined_orders(ignore_existing);
    apply(source, Some(&mut options))
        .unwrap()
        .to_vec()
        .into_iter()
        .map(|p| (p.a, p.b.as_str()))
        .collect()
}

#[test]
fn existing_order_keeps_precedence() {
    let data = pairs();
    assert_eq!(ordered(&data, false), [(1, "x"), (1, "z"), (2, "y")]);
}

#[test]
fn ignoring_existing_order() {
    let data = pairs();
    assert_eq!(ordered(&data, true), [(1, "x"), (2, "y"), (1, "z")]);
}

#[test]
fn spliced_plan_shape() {
    let data = pairs();
    let source = Query::new(&data)
        .order_by(SortKey::on::<Pair>("a", Dir::Asc).unwrap())
        .take(10);
    let mut options = parse("s=b,desc,cs", None).unwrap();
    let result = apply(source, Some(&mut options)).unwrap();
    assert_eq!(
        result.plan().to_string(),
        "OrderBy(a asc) | ThenBy(b desc) | Take(10)"
    );
}

// ============================================================================
// Pagination
// ============================================================================

#[test]
fn pagination_window_and_data_set_count() {
    let data = users();
    let mut options = parse("offset=2&count=1", None).unwrap();
    if let Some(pagination) = options.pagination.as_mut() {
        pagination.assign_data_set_count = true;
    }

    let result = apply(Query::new(&data), Some(&mut options)).unwrap();
    assert_eq!(names(&result.to_vec()), ["Linus"]);
    assert_eq!(options.pagination.map(|p| p.data_set_count), Some(4));
}

#[test]
fn data_set_count_is_post_filter() {
    let data = users();
    let mut options = parse("o=eq&p=Active&v=false&offset=0&count=1", None).unwrap();
    PaginationPolicy::default().enforce(&mut options).unwrap();

    let result = apply(Query::new(&data), Some(&mut options)).unwrap();
    assert_eq!(names(&result.to_vec()), ["Linus"]);
    assert_eq!(options.pagination.map(|p| p.data_set_count), Some(2));
}

#[test]
fn data_set_count_untouched_unless_requested() {
    let data = users();
    let mut options = QueryOptions {
        pagination: Some(PaginationOption {
            data_set_count: 99,
            ..PaginationOption::new(0, 2)
        }),
        ..QueryOptions::default()
    };

    let result = apply(Query::new(&data), Some(&mut options)).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(options.pagination.map(|p| p.data_set_count), Some(99));
}

#[test]
fn no_options_is_identity() {
    let data = users();
    let result = apply(Query::new(&data), None).unwrap();
    assert!(result.plan().is_empty());
    assert_eq!(result.len(), 4);

    let mut empty = QueryOptions::new();
    let result = apply(Query::new(&data), Some(&mut empty)).unwrap();
    assert!(result.plan().is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[derive(Debug)]
struct Offline {
    plan: Plan,
}

impl QuerySource for Offline {
    type Item = User;

    fn plan(&self) -> &Plan {
        &self.plan
    }

    fn with_plan(self, plan: Plan) -> Self {
        Offline { plan }
    }

    fn count(&self) -> dynaq::Result<usize> {
        Err(QueryError::Source("connection refused".into()))
    }
}

#[test]
fn source_failures_are_wrapped_with_the_query() {
    init();
    let query = "o=eq&p=Name&v=Ada&offset=0&count=5";
    let mut options = parse(query, None).unwrap();
    if let Some(pagination) = options.pagination.as_mut() {
        pagination.assign_data_set_count = true;
    }

    let err = Offline { plan: Plan::new() }
        .apply_options(&mut options)
        .unwrap_err();
    match err {
        QueryError::Pipeline { query: text, source } => {
            assert_eq!(text, query);
            assert!(matches!(*source, QueryError::Source(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn plan_only_sources_receive_the_stages() {
    let mut options = parse("o=eq&p=Name&v=Ada&s=Age&offset=2&count=1", None).unwrap();
    let source = Offline { plan: Plan::new() }
        .apply_options(&mut options)
        .unwrap();

    let stages = source.plan().stages();
    assert!(matches!(stages[0], Stage::OrderPrimary(_)));
    assert!(matches!(stages[1], Stage::Filter(_)));
    assert!(matches!(stages[2], Stage::Skip(2)));
    assert!(matches!(stages[3], Stage::Take(1)));
}

#[test]
fn compile_failures_are_wrapped_with_the_query() {
    let data = users();
    let mut options = parse("o=eq&p=Nope&v=1", None).unwrap();
    let err = apply(Query::new(&data), Some(&mut options)).unwrap_err();

    assert_eq!(err.query(), Some("o=eq&p=Nope&v=1"));
    match err {
        QueryError::Pipeline { source, .. } => assert!(matches!(
            *source,
            QueryError::Compile(CompileError::UnknownMember { .. })
        )),
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// Request boundary
// ============================================================================

#[test]
fn settings_prepare_and_apply() {
    init();
    let settings = Settings::from_yaml_str(
        r#"
op_codes:
  is: Equals
resolver:
  from: query_string
  parameter: dq
pagination:
  max_count: 50
"#,
    )
    .unwrap();

    let request = RequestParts::new(
        "?page=1&dq=o%3Dis%26p%3DActive%26v%3Dtrue%26s%3DAge%2Cdesc%26offset%3D0%26count%3D500",
    );
    let mut options = settings.prepare(&request).unwrap();
    assert_eq!(options.pagination.as_ref().map(|p| p.count), Some(50));

    let data = users();
    let result = apply(Query::new(&data), Some(&mut options)).unwrap();
    assert_eq!(names(&result.to_vec()), ["Grace", "Ada"]);
    assert_eq!(options.pagination.map(|p| p.data_set_count), Some(2));
}

#[test]
fn settings_reject_oversized_pages() {
    let settings = Settings {
        pagination: PaginationPolicy {
            max_count: 3,
            exceeded_behaviour: PaginationBehaviour::Reject,
            ..PaginationPolicy::default()
        },
        ..Settings::default()
    };
    let err = settings
        .prepare(&RequestParts::new("offset=0&count=4"))
        .unwrap_err();
    assert!(err.to_string().contains("exceeds the maximum"));
}

#[test]
fn header_resolver_with_decoder() {
    let settings = Settings {
        resolver: QueryResolver::header("X-Query").with_decoder(|text| text.replace('~', "&")),
        ..Settings::default()
    };
    let request = RequestParts::new("").header("x-query", "o=eq~p=Name~v=Grace");
    let mut options = settings.prepare(&request).unwrap();

    let data = users();
    let result = apply(Query::new(&data), Some(&mut options)).unwrap();
    assert_eq!(names(&result.to_vec()), ["Grace"]);
}

#[test]
fn enum_variant_table() {
    assert_eq!(
        Role::VARIANTS,
        &[("Reader", 0), ("Editor", 5), ("Admin", 10)]
    );
    assert_eq!(Role::Editor.discriminant(), 5);
    assert_eq!(User::NAME, "name");
    assert_eq!(User::JOINED, "joined");
}
