use analytics_model::{
    Comparison, DateOp, FilterCriterion, MatchMode, NumericOp, QueryField, StringOp, ValueKind,
};
use analytics_query::predicate::{compile, compile_all, quote_literal};
use analytics_query::QueryError;

fn fragment(criterion: &FilterCriterion) -> String {
    compile(criterion).expect("criterion compiles")
}

#[test]
fn string_family_compiles_every_operator() {
    let equals = FilterCriterion::text(QueryField::Title, StringOp::Equals, "launch");
    assert_eq!(fragment(&equals), "description = 'launch'");

    let contains = FilterCriterion::text(QueryField::Title, StringOp::Contains, "launch");
    assert_eq!(fragment(&contains), "description LIKE '%launch%'");

    let begins = FilterCriterion::text(QueryField::AppName, StringOp::BeginsWith, "Simple");
    assert_eq!(fragment(&begins), "app_name LIKE 'Simple%'");

    let ends = FilterCriterion::text(QueryField::DeviceId, StringOp::EndsWith, "F00D");
    assert_eq!(fragment(&ends), "device_id LIKE '%F00D'");
}

#[test]
fn string_family_maps_each_field_to_its_column() {
    for (field, column) in [
        (QueryField::Title, "description"),
        (QueryField::DeviceId, "device_id"),
        (QueryField::Platform, "platform"),
        (QueryField::AppName, "app_name"),
    ] {
        let criterion = FilterCriterion::text(field, StringOp::Equals, "x");
        assert_eq!(fragment(&criterion), format!("{column} = 'x'"));
    }
}

#[test]
fn version_family_compiles_every_operator() {
    for (op, symbol) in [
        (NumericOp::LessThan, "<"),
        (NumericOp::LessOrEqual, "<="),
        (NumericOp::Equals, "="),
        (NumericOp::GreaterThan, ">"),
        (NumericOp::GreaterOrEqual, ">="),
    ] {
        let criterion = FilterCriterion::version(QueryField::AppVersion, op, "2.0");
        assert_eq!(fragment(&criterion), format!("app_version {symbol} '2.0'"));
    }

    let system = FilterCriterion::version(QueryField::SystemVersion, NumericOp::GreaterOrEqual, "14.1");
    assert_eq!(fragment(&system), "system_version >= '14.1'");
}

#[test]
fn date_family_compiles_day_granularity_comparisons() {
    let cases = [
        (DateOp::Same, "timestamp LIKE '2021-04-16%'"),
        (DateOp::Before, "timestamp < '2021-04-16%'"),
        (DateOp::After, "timestamp > '2021-04-16%'"),
        (
            DateOp::BeforeOrEqual,
            "(timestamp < '2021-04-16%' OR timestamp LIKE '2021-04-16%')",
        ),
        (
            DateOp::AfterOrEqual,
            "(timestamp LIKE '2021-04-16%' OR timestamp > '2021-04-16%')",
        ),
    ];
    let day = chrono::NaiveDate::from_ymd_opt(2021, 4, 16).expect("valid date");
    for (op, expected) in cases {
        let criterion = FilterCriterion::date(op, day);
        assert_eq!(fragment(&criterion), expected);
    }
}

#[test]
fn single_quotes_in_values_are_doubled() {
    assert_eq!(quote_literal("O'Brien"), "'O''Brien'");

    let criterion = FilterCriterion::text(QueryField::Title, StringOp::Equals, "O'Brien");
    assert_eq!(fragment(&criterion), "description = 'O''Brien'");

    let contains = FilterCriterion::text(QueryField::Title, StringOp::Contains, "O'Brien");
    assert_eq!(fragment(&contains), "description LIKE '%O''Brien%'");
}

#[test]
fn family_mismatch_fails_fast() {
    let mut criterion = FilterCriterion::text(QueryField::Title, StringOp::Equals, "x");
    criterion.comparison = Comparison::Date(DateOp::Same);

    match compile(&criterion) {
        Err(QueryError::OperatorMismatch { field, .. }) => assert_eq!(field, QueryField::Title),
        other => panic!("expected OperatorMismatch, got {other:?}"),
    }
}

#[test]
fn changing_field_rederives_a_same_family_operator() {
    let criterion = FilterCriterion::text(QueryField::Title, StringOp::Contains, "beta");

    // Same family: the operator survives.
    let platform = criterion.with_field(QueryField::Platform);
    assert_eq!(platform.comparison, Comparison::Text(StringOp::Contains));
    assert_eq!(platform.id, criterion.id, "identity is stable across edits");

    // Family change: operator falls back to the family default.
    let version = criterion.with_field(QueryField::AppVersion);
    assert_eq!(version.comparison, Comparison::Version(NumericOp::Equals));
    assert!(version.matches_family());

    let date = criterion.with_field(QueryField::DateTime);
    assert_eq!(date.comparison, Comparison::Date(DateOp::Same));
    assert_eq!(date.comparison.kind(), ValueKind::Date);
}

#[test]
fn compile_all_joins_per_match_mode_and_skips_blank_values() {
    let criteria = vec![
        FilterCriterion::text(QueryField::Platform, StringOp::Equals, "iOS"),
        FilterCriterion::new(QueryField::Title), // blank value, ignored
        FilterCriterion::version(QueryField::AppVersion, NumericOp::GreaterOrEqual, "2.0"),
    ];

    let all = compile_all(&criteria, MatchMode::All).expect("predicates compile");
    assert_eq!(all, "platform = 'iOS' AND app_version >= '2.0'");

    let any = compile_all(&criteria, MatchMode::Any).expect("predicates compile");
    assert_eq!(any, "platform = 'iOS' OR app_version >= '2.0'");
}

#[test]
fn compile_all_with_no_usable_criteria_is_an_invalid_filter() {
    let blank_only = vec![FilterCriterion::new(QueryField::Title)];
    assert!(matches!(
        compile_all(&blank_only, MatchMode::All),
        Err(QueryError::EmptyFilter)
    ));
    assert!(matches!(
        compile_all(&[], MatchMode::Any),
        Err(QueryError::EmptyFilter)
    ));
}
