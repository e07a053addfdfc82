use std::env;
use std::path::PathBuf;

use analytics_model::{
    Comparison, DateOp, FilterCriterion, MatchMode, NumericOp, QueryField, SourceSelector,
    StringOp,
};
use analytics_query::paginate::{full_search_sql, limited_search_sql, totals_sql, PaginationState};
use reader_service::{
    load_query, save_query, with_saved_query_extension, HttpExecutor, SearchSession,
};

fn print_usage() {
    eprintln!(
        "Usage:\n\
         reader-cli sql [--full] [--limit N] [--any] [--sources items|counters|both] \
         (--where FIELD OP VALUE)...\n\
         reader-cli search --endpoint URL [--full] [--limit N] [--any] \
         [--sources items|counters|both] (--where FIELD OP VALUE)... [--save FILE]\n\
         reader-cli search --endpoint URL --load FILE\n\
         \n\
         Fields: title datetime deviceid platform appname appversion systemversion\n\
         String ops: equals contains beginswith endswith\n\
         Version ops: lt le eq gt ge\n\
         Date ops (VALUE is yyyy-mm-dd): before onorbefore same after onorafter\n\
         Notes: --limit defaults to 100; omit --full for a paged (limited) search;\n\
         --save appends .savedquery.json unless FILE already ends with it\n"
    );
}

fn parse_field(raw: &str) -> Result<QueryField, String> {
    match raw.to_ascii_lowercase().as_str() {
        "title" => Ok(QueryField::Title),
        "datetime" | "date" => Ok(QueryField::DateTime),
        "deviceid" | "device_id" => Ok(QueryField::DeviceId),
        "platform" => Ok(QueryField::Platform),
        "appname" | "app_name" => Ok(QueryField::AppName),
        "appversion" | "app_version" => Ok(QueryField::AppVersion),
        "systemversion" | "system_version" => Ok(QueryField::SystemVersion),
        other => Err(format!("unknown field: {other}")),
    }
}

fn parse_criterion(field: &str, op: &str, value: &str) -> Result<FilterCriterion, String> {
    let field = parse_field(field)?;
    let op_lower = op.to_ascii_lowercase();
    let comparison = match field.kind() {
        analytics_model::ValueKind::Text => {
            let op = match op_lower.as_str() {
                "equals" | "eq" => StringOp::Equals,
                "contains" => StringOp::Contains,
                "beginswith" => StringOp::BeginsWith,
                "endswith" => StringOp::EndsWith,
                other => return Err(format!("unknown string op: {other}")),
            };
            Comparison::Text(op)
        }
        analytics_model::ValueKind::Version => {
            let op = match op_lower.as_str() {
                "lt" => NumericOp::LessThan,
                "le" => NumericOp::LessOrEqual,
                "eq" | "equals" => NumericOp::Equals,
                "gt" => NumericOp::GreaterThan,
                "ge" => NumericOp::GreaterOrEqual,
                other => return Err(format!("unknown version op: {other}")),
            };
            Comparison::Version(op)
        }
        analytics_model::ValueKind::Date => {
            let op = match op_lower.as_str() {
                "before" => DateOp::Before,
                "onorbefore" => DateOp::BeforeOrEqual,
                "same" | "on" => DateOp::Same,
                "after" => DateOp::After,
                "onorafter" => DateOp::AfterOrEqual,
                other => return Err(format!("unknown date op: {other}")),
            };
            // Validate the day up front so a typo fails here, not at
            // the endpoint.
            let day = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|e| format!("bad date {value:?}: {e}"))?;
            return Ok(FilterCriterion::date(op, day));
        }
    };

    let mut criterion = FilterCriterion::new(field);
    criterion.comparison = comparison;
    criterion.value = value.to_string();
    Ok(criterion)
}

struct CliQuery {
    criteria: Vec<FilterCriterion>,
    match_mode: MatchMode,
    selector: SourceSelector,
    page_limit: u64,
    full: bool,
    endpoint: Option<String>,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<CliQuery, String> {
    let mut query = CliQuery {
        criteria: Vec::new(),
        match_mode: MatchMode::All,
        selector: SourceSelector::Both,
        page_limit: 100,
        full: false,
        endpoint: None,
        save: None,
        load: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--where" => {
                if i + 3 >= args.len() {
                    return Err("--where requires FIELD OP VALUE".into());
                }
                let criterion = parse_criterion(&args[i + 1], &args[i + 2], &args[i + 3])?;
                query.criteria.push(criterion);
                i += 4;
            }
            "--any" => {
                query.match_mode = MatchMode::Any;
                i += 1;
            }
            "--sources" => {
                let value = args.get(i + 1).ok_or("--sources requires a value")?;
                query.selector = match value.to_ascii_lowercase().as_str() {
                    "items" => SourceSelector::Items,
                    "counters" => SourceSelector::Counters,
                    "both" => SourceSelector::Both,
                    other => return Err(format!("unknown sources value: {other}")),
                };
                i += 2;
            }
            "--limit" => {
                let value = args.get(i + 1).ok_or("--limit requires a number")?;
                query.page_limit = value
                    .parse::<u64>()
                    .map_err(|e| format!("bad --limit {value:?}: {e}"))?;
                i += 2;
            }
            "--full" => {
                query.full = true;
                i += 1;
            }
            "--endpoint" => {
                query.endpoint = Some(args.get(i + 1).ok_or("--endpoint requires a URL")?.clone());
                i += 2;
            }
            "--save" => {
                query.save = Some(PathBuf::from(
                    args.get(i + 1).ok_or("--save requires a path")?,
                ));
                i += 2;
            }
            "--load" => {
                query.load = Some(PathBuf::from(
                    args.get(i + 1).ok_or("--load requires a path")?,
                ));
                i += 2;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    if let Some(path) = query.load.clone() {
        let saved = load_query(&path).map_err(|e| e.to_string())?;
        query.criteria = saved.criteria;
        query.match_mode = saved.match_mode;
        query.selector = saved.sources;
        query.full = !saved.is_limited;
        if saved.page_limit > 0 {
            query.page_limit = saved.page_limit;
        }
    }

    Ok(query)
}

fn print_row(row: &analytics_model::AnalyticsRow) {
    let description = row.get("description").unwrap_or("-");
    let timestamp = row.get("timestamp").unwrap_or("-");
    println!(
        "  [{}#{}] {} @ {}",
        row.source.table(),
        row.id,
        description,
        timestamp
    );
}

fn run_sql(query: &CliQuery) -> Result<(), String> {
    if query.full {
        let sql = full_search_sql(&query.criteria, query.match_mode, query.selector)
            .map_err(|e| e.to_string())?;
        println!("{sql}");
        return Ok(());
    }

    let totals = totals_sql(&query.criteria, query.match_mode, query.selector)
        .map_err(|e| e.to_string())?;
    println!("-- totals\n{totals}");

    // Page-one statement as it would look before totals arrive; later
    // pages depend on live cursor state.
    let state = PaginationState::new(query.page_limit);
    let page = limited_search_sql(&query.criteria, query.match_mode, query.selector, &state)
        .map_err(|e| e.to_string())?;
    println!("-- page one\n{page}");
    Ok(())
}

fn run_search(query: &CliQuery) -> Result<(), String> {
    let endpoint = query
        .endpoint
        .as_deref()
        .ok_or("search requires --endpoint URL")?;
    let executor = HttpExecutor::new(endpoint).map_err(|e| e.to_string())?;

    let mut session = SearchSession::new(executor, query.page_limit);
    session.set_criteria(query.criteria.clone());
    session.set_match_mode(query.match_mode);
    session.set_selector(query.selector);

    if let Some(path) = &query.save {
        let path = with_saved_query_extension(path);
        save_query(&path, &session.saved_query(!query.full)).map_err(|e| e.to_string())?;
        println!("saved query to {}", path.display());
    }

    if query.full {
        let rows = session.full_search().map_err(|e| e.to_string())?;
        println!("{} rows", rows.len());
        for row in &rows {
            print_row(row);
        }
        return Ok(());
    }

    let mut page = session.begin_limited().map_err(|e| e.to_string())?;
    loop {
        println!(
            "rows {}-{} of {}",
            page.outcome.first_row, page.outcome.last_row, page.outcome.total
        );
        for row in &page.rows {
            print_row(row);
        }
        if !page.outcome.has_more {
            break;
        }
        page = session.next_page().map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Err("missing command".into());
    };

    let query = parse_args(&args[1..])?;
    match command.as_str() {
        "sql" => run_sql(&query),
        "search" => run_search(&query),
        other => {
            print_usage();
            Err(format!("unknown command: {other}"))
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(message) = run() {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
