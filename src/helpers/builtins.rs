//! Stock helpers.
//!
//! `slugify` is always available; `upper`, `lower` and `date` are opt-in via
//! [`register_text_helpers`] because they shadow data fields of the same name.

use super::{Call, HelperFn, Registry};
use crate::{Permalinks, util::as_text};
use anyhow::{Result, bail};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::{fmt::Write as _, sync::Arc};

pub const DEFAULT_DATE_FORMAT: &str = "YYYY/MM/DD";

pub(crate) fn register_defaults(helpers: &mut Registry) {
    helpers.insert("slugify".to_owned(), Arc::new(slugify) as Arc<HelperFn>);
}

/// Register `upper`, `lower` and `date`.
pub fn register_text_helpers(permalinks: &mut Permalinks) {
    permalinks
        .helper("upper", upper)
        .helper("lower", lower)
        .helper("date", date);
}

fn first_text(call: &Call<'_>) -> String {
    call.arg(0).map(as_text).unwrap_or_default()
}

pub fn slugify(call: &Call<'_>) -> Result<Value> {
    Ok(Value::String(slug::slugify(first_text(call))))
}

pub fn upper(call: &Call<'_>) -> Result<Value> {
    Ok(Value::String(first_text(call).to_uppercase()))
}

pub fn lower(call: &Call<'_>) -> Result<Value> {
    Ok(Value::String(first_text(call).to_lowercase()))
}

/// `date`, `date(format)`, `date(value, format)` or `date(file, format)`.
///
/// Without an explicit date the file's `date` field is used, then the
/// current local time. `format=` in the hash overrides the positional format.
pub fn date(call: &Call<'_>) -> Result<Value> {
    let (source, format) = match call.args() {
        [] => (None, None),
        [Value::String(s)] => match parse_date(s) {
            Some(_) => (Some(&call.args()[0]), None),
            None => (None, Some(s.as_str())),
        },
        [value] => (Some(value), None),
        [value, format, ..] => (Some(value), format.as_str()),
    };

    let when = match source.or_else(|| call.data().get("date")) {
        Some(value) => match date_of(value) {
            Some(when) => when,
            None => bail!("`date` cannot read a date from {value}"),
        },
        None => Local::now().naive_local(),
    };

    let format = call
        .hash()
        .get("format")
        .and_then(Value::as_str)
        .or(format)
        .unwrap_or(DEFAULT_DATE_FORMAT);
    Ok(Value::String(format_date(&when, format)?))
}

/// A date from a string or from an object carrying `data.date` or `date`.
fn date_of(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Object(map) => map
            .get("data")
            .and_then(|data| data.get("date"))
            .or_else(|| map.get("date"))
            .and_then(date_of),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Moment tokens, longest first.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("MMMM", "%B"),
    ("DDDD", "%j"),
    ("dddd", "%A"),
    ("MMM", "%b"),
    ("ddd", "%a"),
    ("SSS", "%3f"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
];

/// Translate a Moment-style format into a chrono one.
fn chrono_format(moment: &str) -> String {
    let mut out = String::with_capacity(moment.len() * 2);
    let mut rest = moment;
    'scan: while let Some(c) = rest.chars().next() {
        for (token, strftime) in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(strftime);
                rest = tail;
                continue 'scan;
            }
        }
        if c == '%' {
            out.push('%');
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn format_date(when: &NaiveDateTime, moment: &str) -> Result<String> {
    let strftime = chrono_format(moment);
    let mut out = String::new();
    if write!(out, "{}", when.format(&strftime)).is_err() {
        bail!("invalid date format {moment:?}");
    }
    Ok(out)
}
