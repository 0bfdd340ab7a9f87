//! Query text macros
//!
//! Expands `$__name(args)` invocations and `${variable}` references into plain
//! Resource Graph (KQL) text. Expansion is a single textual pass. Anything that
//! looks like a macro but has no rule, or whose arguments do not fit the rule,
//! is left exactly as written so the remote service reports the syntax error.
//!
//! | macro | expansion |
//! |---|---|
//! | `$__contains(col, v1, v2)` | `['col'] in (v1,v2)` |
//! | `$__contains(col, all, ...)` | `1 == 1` |
//! | `$__timeFilter()` / `$__timeFilter(col)` | `['col'] >= datetime('<from>') and ['col'] <= datetime('<to>')` |
//! | `$__timeFrom()` | `datetime('<from>')` |
//! | `$__timeTo()` | `datetime('<to>')` |
//! | `$__interval` | `<ms>ms` |

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::time::Duration;
use temps_query::TimeRange;

/// Column `$__timeFilter()` filters on when called without arguments
pub const DEFAULT_TIME_COLUMN: &str = "TimeGenerated";

static MACRO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$__([A-Za-z_][A-Za-z0-9_]*)(?:\(([^()]*)\))?").expect("macro pattern compiles")
});

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("variable pattern compiles")
});

/// Everything a macro may expand against
#[derive(Debug, Clone, Copy)]
pub struct MacroContext<'a> {
    pub time_range: &'a TimeRange,
    pub interval: Option<Duration>,
    pub variables: &'a BTreeMap<String, String>,
}

type Expander = fn(Option<&[String]>, &MacroContext<'_>) -> Option<String>;

const RULES: &[(&str, Expander)] = &[
    ("contains", expand_contains),
    ("timeFilter", expand_time_filter),
    ("timeFrom", expand_time_from),
    ("timeTo", expand_time_to),
    ("interval", expand_interval),
];

/// Interpolate `query` against `ctx`.
///
/// Variables are substituted before macros so a macro argument may come from a
/// variable, e.g. `$__contains(name, ${servers})`.
pub fn interpolate(query: &str, ctx: &MacroContext<'_>) -> String {
    let with_variables = VARIABLE_PATTERN.replace_all(query, |caps: &Captures| {
        ctx.variables
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });

    MACRO_PATTERN
        .replace_all(&with_variables, |caps: &Captures| {
            expand(caps, ctx).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn expand(caps: &Captures, ctx: &MacroContext<'_>) -> Option<String> {
    let name = caps.get(1)?.as_str();
    let (_, rule) = RULES.iter().find(|(rule_name, _)| *rule_name == name)?;
    let args = caps.get(2).map(|m| split_args(m.as_str()));
    rule(args.as_deref(), ctx)
}

/// Split a macro argument list on top-level commas. Commas inside single or
/// double quotes belong to the value. Each argument is trimmed.
fn split_args(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in raw.chars() {
        match (quote, c) {
            (None, ',') => {
                args.push(current.trim().to_string());
                current.clear();
                continue;
            }
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
        current.push(c);
    }
    args.push(current.trim().to_string());

    args
}

fn expand_contains(args: Option<&[String]>, _ctx: &MacroContext<'_>) -> Option<String> {
    let args = args?;
    let (column, values) = args.split_first()?;
    if column.is_empty() || values.is_empty() || values.iter().any(|v| v.is_empty()) {
        return None;
    }

    if values[0] == "all" {
        return Some("1 == 1".to_string());
    }

    Some(format!("['{}'] in ({})", column, values.join(",")))
}

fn expand_time_filter(args: Option<&[String]>, ctx: &MacroContext<'_>) -> Option<String> {
    let column = match args.unwrap_or_default() {
        [] => DEFAULT_TIME_COLUMN,
        [column] if !column.is_empty() => column.as_str(),
        _ => return None,
    };

    Some(format!(
        "['{col}'] >= {from} and ['{col}'] <= {to}",
        col = column,
        from = datetime_literal(ctx.time_range.from()),
        to = datetime_literal(ctx.time_range.to()),
    ))
}

fn expand_time_from(args: Option<&[String]>, ctx: &MacroContext<'_>) -> Option<String> {
    args.unwrap_or_default()
        .is_empty()
        .then(|| datetime_literal(ctx.time_range.from()))
}

fn expand_time_to(args: Option<&[String]>, ctx: &MacroContext<'_>) -> Option<String> {
    args.unwrap_or_default()
        .is_empty()
        .then(|| datetime_literal(ctx.time_range.to()))
}

fn expand_interval(args: Option<&[String]>, ctx: &MacroContext<'_>) -> Option<String> {
    if args.is_some() {
        return None;
    }
    ctx.interval.map(|i| format!("{}ms", i.as_millis()))
}

fn datetime_literal(at: DateTime<Utc>) -> String {
    format!("datetime('{}')", at.to_rfc3339_opts(SecondsFormat::Secs, true))
}
