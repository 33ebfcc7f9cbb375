//! Kind-specific coercion of present, non-empty values.

use crate::dates::{self, Stamp, ISO_8601};
use crate::errors::Error;
use crate::field::{Field, Kind};
use crate::parser::Ctx;
use crate::value::Parsed;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::num::IntErrorKind;
use std::str::FromStr;

const TRUTHY: &[&str] = &["true", "t", "yes", "y", "1"];
const FALSY: &[&str] = &["false", "f", "no", "n", "0"];

pub(crate) fn convert(field: &Field, value: &Value, ctx: &Ctx) -> Result<Parsed, Error> {
    match field.kind() {
        Kind::Any => Ok(Parsed::Json(value.clone())),
        Kind::Boolean => Ok(Parsed::Bool(to_bool(value))),
        Kind::Text {
            trim_whitespace, ..
        } => Ok(Parsed::Text(to_text(value, *trim_whitespace))),
        Kind::Integer => to_integer(field, value, ctx).map(Parsed::Int),
        Kind::Float { precision } => to_float(field, value, ctx).map(|n| match precision {
            Some(digits) => Parsed::Float(round(n, *digits)),
            None => Parsed::Float(n),
        }),
        Kind::Decimal => to_decimal(field, value, ctx).map(Parsed::Decimal),
        Kind::Date { formats } => to_date(field, value, formats, ctx).map(Parsed::Date),
        Kind::DateTime { formats } => {
            to_datetime(field, value, formats, ctx).map(Parsed::DateTime)
        }
        Kind::List { child } => to_list(field, child, value, ctx),
        Kind::Dict { child } => to_dict(field, child, value, ctx),
        Kind::Schema(composite) => composite.coerce(field, value, ctx),
    }
}

/// The kind's own check, run after the field's validators.
pub(crate) fn refine(field: &Field, value: Parsed) -> Result<Parsed, Error> {
    if let Kind::Text {
        pattern: Some(pattern),
        ..
    } = field.kind()
    {
        let template = match field.template("invalid") {
            Some(template) => template,
            None => return Err(field.fail("invalid", &[])),
        };
        pattern
            .validate_with(&value, template)
            .map_err(|err| err.or_field(field.name()))?;
    }
    Ok(value)
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => {
            let lowered = s.to_lowercase();
            if TRUTHY.contains(&lowered.as_str()) {
                true
            } else if FALSY.contains(&lowered.as_str()) {
                false
            } else {
                !s.is_empty()
            }
        }
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Null => false,
    }
}

fn to_text(value: &Value, trim_whitespace: bool) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    if trim_whitespace {
        text.trim().to_owned()
    } else {
        text
    }
}

/// Trims a string input, rejecting inputs too long to be worth parsing.
fn guarded<'a>(field: &Field, s: &'a str, ctx: &Ctx) -> Result<&'a str, Error> {
    let s = s.trim();
    if s.chars().count() > ctx.max_string_length() {
        return Err(field.fail("max_string_length", &[]));
    }
    Ok(s)
}

/// Drops a fractional part made of zeros only, so `"1.00"` reads as `"1"`.
fn strip_zero_fraction(s: &str) -> &str {
    let s = s.trim_end();
    match s.rfind('.') {
        Some(at) if s[at + 1..].chars().all(|c| c == '0') => &s[..at],
        _ => s,
    }
}

fn to_integer(field: &Field, value: &Value, ctx: &Ctx) -> Result<i64, Error> {
    let text = match value {
        Value::Number(n) => {
            if let Some(n) = n.as_i64() {
                return Ok(n);
            }
            n.to_string()
        }
        Value::String(s) => guarded(field, s, ctx)?.to_owned(),
        _ => return Err(field.fail("invalid", &[])),
    };
    strip_zero_fraction(&text)
        .parse::<i64>()
        .map_err(|err| match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => field.fail("out_of_range", &[]),
            _ => field.fail("invalid", &[]),
        })
}

fn to_float(field: &Field, value: &Value, ctx: &Ctx) -> Result<f64, Error> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| field.fail("invalid", &[])),
        Value::String(s) => guarded(field, s, ctx)?
            .parse()
            .map_err(|_| field.fail("invalid", &[])),
        _ => Err(field.fail("invalid", &[])),
    }
}

/// Rounds to `digits` decimal digits. Precisions beyond what an `f64` can
/// scale leave the value as is.
fn round(n: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits.min(i32::MAX as u32) as i32);
    let scaled = n * factor;
    if !scaled.is_finite() {
        return n;
    }
    scaled.round() / factor
}

fn to_decimal(field: &Field, value: &Value, ctx: &Ctx) -> Result<Decimal, Error> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => guarded(field, s, ctx)?.to_owned(),
        _ => return Err(field.fail("invalid", &[])),
    };

    let unsigned = text.trim_start_matches(&['+', '-'][..]);
    if ["nan", "snan", "inf", "infinity"]
        .iter()
        .any(|special| unsigned.eq_ignore_ascii_case(special))
    {
        return Err(field.fail("invalid", &[]));
    }

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| field.fail("invalid", &[]))
}

fn invalid_date(field: &Field, formats: &[String]) -> Error {
    let formats = formats
        .iter()
        .map(|format| format!("'{}'", format))
        .collect::<Vec<_>>()
        .join(", ");
    field.fail("invalid", &[("formats", formats)])
}

fn is_iso(format: &str) -> bool {
    format.eq_ignore_ascii_case(ISO_8601)
}

/// Tries every format in order. An ISO 8601 input whose shape contradicts
/// the field (a time of day for a date, or none for a date-time) fails with
/// `mismatch` right away.
fn to_stamp(
    field: &Field,
    value: &Value,
    formats: &[String],
    ctx: &Ctx,
    wants_time: bool,
    mismatch: &str,
) -> Result<Stamp, Error> {
    let text = match value {
        Value::String(s) => guarded(field, s, ctx)?,
        _ => return Err(invalid_date(field, formats)),
    };

    for format in formats {
        match dates::parse(text, format) {
            Some(stamp) if is_iso(format) => {
                let has_time = match stamp {
                    Stamp::DateTime(_) => true,
                    Stamp::Date(_) => false,
                };
                if has_time != wants_time {
                    return Err(field.fail(mismatch, &[]));
                }
                return Ok(stamp);
            }
            Some(stamp) => return Ok(stamp),
            None => continue,
        }
    }
    Err(invalid_date(field, formats))
}

fn to_date(field: &Field, value: &Value, formats: &[String], ctx: &Ctx) -> Result<NaiveDate, Error> {
    to_stamp(field, value, formats, ctx, false, "datetime").map(Stamp::date)
}

fn to_datetime(
    field: &Field,
    value: &Value,
    formats: &[String],
    ctx: &Ctx,
) -> Result<NaiveDateTime, Error> {
    to_stamp(field, value, formats, ctx, true, "date").map(Stamp::datetime)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Child failures are reported as failures of the container itself.
fn retag(field: &Field, err: Error) -> Error {
    match err {
        Error::Invalid(err) => Error::Invalid(err.with_field(field.name())),
        other => other,
    }
}

fn to_list(field: &Field, child: &Field, value: &Value, ctx: &Ctx) -> Result<Parsed, Error> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(field.fail(
                "invalid_type",
                &[("input_type", type_name(other).to_owned())],
            ))
        }
    };

    let ctx = ctx.descend()?;
    items
        .iter()
        .map(|item| child.run(Some(item), &ctx).map_err(|err| retag(field, err)))
        .collect::<Result<Vec<_>, _>>()
        .map(Parsed::List)
}

fn to_dict(field: &Field, child: &Field, value: &Value, ctx: &Ctx) -> Result<Parsed, Error> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(field.fail(
                "invalid_type",
                &[("input_type", type_name(other).to_owned())],
            ))
        }
    };

    let ctx = ctx.descend()?;
    map.iter()
        .map(|(key, item)| {
            child
                .run(Some(item), &ctx)
                .map(|parsed| (key.clone(), parsed))
                .map_err(|err| retag(field, err))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map(Parsed::Map)
}

#[cfg(test)]
mod tests {
    use crate::errors::Error;
    use crate::field::Field;
    use crate::value::Parsed;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::str::FromStr;

    fn parse(field: &Field, value: Value) -> Result<Parsed, Error> {
        field.parse(&json!({ "x": value }))
    }

    fn flat(result: Result<Parsed, Error>) -> Value {
        result
            .unwrap_err()
            .into_validation()
            .expect("a validation failure")
            .flatten()
    }

    #[test]
    fn boolean() {
        let f = Field::boolean().source("x");
        for v in vec![json!(1), json!("1"), json!("true"), json!("T"), json!("y"), json!("YES"), json!(true), json!([1]), json!({ "y": 1 }), json!("whatever")] {
            assert_eq!(parse(&f, v).unwrap(), Parsed::Bool(true));
        }
        for v in vec![json!(0), json!("0"), json!("false"), json!("F"), json!("n"), json!("No"), json!(false)] {
            assert_eq!(parse(&f, v).unwrap(), Parsed::Bool(false));
        }
        // never blank: empty containers are simply false
        assert_eq!(parse(&f, json!([])).unwrap(), Parsed::Bool(false));
        assert_eq!(parse(&f, json!("")).unwrap(), Parsed::Bool(false));

        let f = Field::boolean().source("x").required(false).default(Parsed::Null).null(true);
        assert_eq!(
            f.run_validation(Some(&Value::Null)).unwrap(),
            Parsed::Null
        );
    }

    #[test]
    fn text() {
        let f = Field::text().source("x");
        assert_eq!(parse(&f, json!(1)).unwrap(), Parsed::from("1"));
        assert_eq!(parse(&f, json!("й")).unwrap(), Parsed::from("й"));
        assert_eq!(parse(&f, json!(true)).unwrap(), Parsed::from("true"));
        assert!(parse(&f, json!("")).is_err());
        assert!(parse(&f, json!("   ")).is_err());

        let f = Field::text()
            .source("x")
            .min_length(5)
            .max_length(10)
            .trim_whitespace(true);
        assert_eq!(parse(&f, json!("     123456     ")).unwrap(), Parsed::from("123456"));
        assert_eq!(
            flat(parse(&f, json!("1"))),
            json!(["Ensure this field has at least 5 characters."])
        );
        assert_eq!(
            flat(parse(&f, json!("1".repeat(11)))),
            json!(["Ensure this field has no more than 10 characters."])
        );

        let f = Field::text().source("x").trim_whitespace(false).blank(true);
        assert_eq!(parse(&f, json!(" a ")).unwrap(), Parsed::from(" a "));
        assert_eq!(parse(&f, json!("")).unwrap(), Parsed::from(""));
    }

    #[test]
    fn text_blank_default() {
        let f = Field::text().source("x").blank(true).default("n/a");
        assert_eq!(parse(&f, json!("  ")).unwrap(), Parsed::from("n/a"));
    }

    #[test]
    fn integer() {
        let f = Field::integer().source("x");
        assert_eq!(parse(&f, json!(1)).unwrap(), Parsed::Int(1));
        assert_eq!(parse(&f, json!(1.0)).unwrap(), Parsed::Int(1));
        assert_eq!(parse(&f, json!("1")).unwrap(), Parsed::Int(1));
        assert_eq!(parse(&f, json!("1.0")).unwrap(), Parsed::Int(1));
        assert_eq!(parse(&f, json!(" 1.00 ")).unwrap(), Parsed::Int(1));
        assert_eq!(flat(parse(&f, json!("1.2"))), json!(["A valid integer is required."]));
        assert!(parse(&f, json!(1.5)).is_err());
        assert!(parse(&f, json!("x")).is_err());
        assert!(parse(&f, json!(true)).is_err());
        assert_eq!(
            flat(parse(&f, json!("1".repeat(1001)))),
            json!(["String value too large."])
        );

        let f = Field::integer().source("x").min_value(5).max_value(10);
        assert_eq!(parse(&f, json!(5)).unwrap(), Parsed::Int(5));
        assert_eq!(parse(&f, json!(7)).unwrap(), Parsed::Int(7));
        assert_eq!(parse(&f, json!(10)).unwrap(), Parsed::Int(10));
        assert_eq!(
            flat(parse(&f, json!(11))),
            json!(["Ensure this field is less than or equal to 10."])
        );
        assert_eq!(
            flat(parse(&f, json!(4))),
            json!(["Ensure this field is greater than or equal to 5."])
        );
    }

    #[test]
    fn float() {
        let f = Field::float().source("x");
        assert_eq!(parse(&f, json!(1)).unwrap(), Parsed::Float(1.0));
        assert_eq!(parse(&f, json!("1.00")).unwrap(), Parsed::Float(1.0));
        assert_eq!(parse(&f, json!(0.99)).unwrap(), Parsed::Float(0.99));
        assert_eq!(flat(parse(&f, json!("x"))), json!(["A valid number is required."]));

        let f = Field::float().source("x").precision(2);
        assert_eq!(parse(&f, json!(3.14159)).unwrap(), Parsed::Float(3.14));

        let f = Field::float().source("x").min_value(0);
        assert!(parse(&f, json!(-0.5)).is_err());
    }

    #[test]
    fn float_precision_beyond_f64_range() {
        let f = Field::float().source("x").precision(400);
        assert_eq!(parse(&f, json!(3.14)).unwrap(), Parsed::Float(3.14));

        let f = Field::float().source("x").precision(u32::MAX);
        assert_eq!(parse(&f, json!("2.5")).unwrap(), Parsed::Float(2.5));
    }

    #[test]
    fn integer_out_of_range() {
        let f = Field::integer().source("x");
        let message = json!([
            "Ensure this field is between -9223372036854775808 and 9223372036854775807."
        ]);
        assert_eq!(flat(parse(&f, json!(u64::MAX))), message);
        assert_eq!(flat(parse(&f, json!("9223372036854775808"))), message);
        assert_eq!(flat(parse(&f, json!("-9223372036854775809.0"))), message);
        assert_eq!(
            parse(&f, json!("9223372036854775807")).unwrap(),
            Parsed::Int(i64::MAX)
        );
        assert_eq!(flat(parse(&f, json!("12abc"))), json!(["A valid integer is required."]));
    }

    #[test]
    fn decimal() {
        let f = Field::decimal()
            .source("x")
            .min_value(Decimal::from_str("5").unwrap());
        assert_eq!(
            parse(&f, json!("5.001")).unwrap(),
            Parsed::Decimal(Decimal::from_str("5.001").unwrap())
        );
        assert!(parse(&f, json!("4.999")).is_err());
        for v in vec!["NaN", "Inf", "-Infinity", "abc"] {
            assert_eq!(flat(parse(&f, json!(v))), json!(["A valid number is required."]));
        }

        let f = Field::decimal().source("x");
        assert_eq!(
            parse(&f, json!(12.5)).unwrap(),
            Parsed::Decimal(Decimal::from_str("12.5").unwrap())
        );
    }

    #[test]
    fn date() {
        let f = Field::date().source("x");
        assert_eq!(
            parse(&f, json!("2015-03-13")).unwrap(),
            Parsed::Date(NaiveDate::from_ymd_opt(2015, 3, 13).unwrap())
        );
        assert_eq!(
            flat(parse(&f, json!("2015-03-13 12:00:00"))),
            json!(["Expected a date but got a datetime."])
        );
        assert_eq!(
            flat(parse(&f, json!(1))),
            json!(["A valid date is required. Allowed formats: 'iso-8601'."])
        );

        let f = Field::date().source("x").formats(vec!["%d/%m/%Y", "%Y-%m-%d"]);
        assert_eq!(
            parse(&f, json!("2015-03-13")).unwrap(),
            Parsed::Date(NaiveDate::from_ymd_opt(2015, 3, 13).unwrap())
        );
        assert_eq!(
            flat(parse(&f, json!("March"))),
            json!(["A valid date is required. Allowed formats: '%d/%m/%Y', '%Y-%m-%d'."])
        );
    }

    #[test]
    fn datetime() {
        let noon = NaiveDate::from_ymd_opt(2015, 3, 13)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let f = Field::datetime().source("x");
        assert_eq!(parse(&f, json!("2015-03-13 12:00:00")).unwrap(), Parsed::DateTime(noon));
        assert_eq!(parse(&f, json!("2015-03-13T12:00:00Z")).unwrap(), Parsed::DateTime(noon));
        assert_eq!(
            flat(parse(&f, json!("2015-03-13"))),
            json!(["Expected a datetime but got a date."])
        );
        assert!(parse(&f, json!(1)).is_err());

        let f = Field::datetime().source("x").formats(vec!["%Y-%m-%d"]);
        assert_eq!(
            parse(&f, json!("2015-03-13")).unwrap(),
            Parsed::DateTime(noon.date().and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn regex() {
        let f = Field::regex("^[0-9]+$").source("x");
        assert_eq!(parse(&f, json!("123")).unwrap(), Parsed::from("123"));
        assert_eq!(
            flat(parse(&f, json!("abc"))),
            json!(["This field does not match the required pattern."])
        );

        let f = Field::regex("^[0-9]+$").source("x").inverse_match(true);
        assert_eq!(parse(&f, json!("abc")).unwrap(), Parsed::from("abc"));
        assert!(parse(&f, json!("123")).is_err());

        match Field::regex("[").source("x").parse(&json!({ "x": "a" })) {
            Err(Error::InvalidPattern { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn list() {
        let f = Field::list().source("x");
        assert_eq!(
            parse(&f, json!([1, null, "abc"])).unwrap(),
            Parsed::List(vec![
                Parsed::Json(json!(1)),
                Parsed::Null,
                Parsed::Json(json!("abc"))
            ])
        );
        assert_eq!(
            flat(parse(&f, json!(1))),
            json!(["Expected a list of items but got type 'number'."])
        );

        let f = Field::list().source("x").child(Field::integer());
        assert_eq!(
            parse(&f, json!([1, "2", 3.0])).unwrap(),
            Parsed::List(vec![Parsed::Int(1), Parsed::Int(2), Parsed::Int(3)])
        );
        assert!(parse(&f, json!(["abc"])).is_err());
        assert!(parse(&f, json!([null])).is_err());

        let f = Field::list().source("x").child(Field::integer().null(true));
        assert_eq!(
            parse(&f, json!([1, null])).unwrap(),
            Parsed::List(vec![Parsed::Int(1), Parsed::Null])
        );

        let f = Field::list().source("x").child(Field::list());
        assert_eq!(
            parse(&f, json!([[1], [2]])).unwrap(),
            Parsed::List(vec![
                Parsed::List(vec![Parsed::Json(json!(1))]),
                Parsed::List(vec![Parsed::Json(json!(2))]),
            ])
        );
    }

    #[test]
    fn list_fails_fast() {
        let f = Field::list()
            .source("x")
            .child(Field::integer().min_value(5));
        assert_eq!(
            flat(parse(&f, json!([1, 5]))),
            json!(["Ensure this field is greater than or equal to 5."])
        );
        assert_eq!(
            flat(parse(&f, json!([1, 2]))),
            json!(["Ensure this field is greater than or equal to 5."])
        );
    }

    #[test]
    fn child_with_source_is_rejected() {
        let f = Field::list().source("x").child(Field::integer().source("y"));
        assert_eq!(
            parse(&f, json!([1])),
            Err(Error::ChildSource {
                field: "<unbound>".to_owned()
            })
        );
    }

    #[test]
    fn dict() {
        let f = Field::dict().source("x");
        let mut expected = BTreeMap::new();
        expected.insert("y".to_owned(), Parsed::Json(json!({})));
        expected.insert("z".to_owned(), Parsed::Null);
        assert_eq!(parse(&f, json!({ "y": {}, "z": null })).unwrap(), Parsed::Map(expected));

        let f = Field::dict().source("x").child(Field::integer());
        let mut expected = BTreeMap::new();
        expected.insert("y".to_owned(), Parsed::Int(1));
        expected.insert("z".to_owned(), Parsed::Int(2));
        assert_eq!(parse(&f, json!({ "y": "1.0", "z": 2.0 })).unwrap(), Parsed::Map(expected));

        let f = Field::dict().source("x").child(Field::integer().min_value(5));
        assert!(parse(&f, json!({ "y": 1 })).is_err());
        assert_eq!(
            flat(parse(&f, json!([1]))),
            json!(["Expected a dictionary of items but got type 'array'."])
        );
    }

    #[test]
    fn depth_limit() {
        let mut f = Field::list();
        for _ in 0..40 {
            f = Field::list().child(f);
        }
        let f = f.source("x");
        let mut value = json!([]);
        for _ in 0..40 {
            value = json!([value]);
        }
        assert_eq!(parse(&f, value), Err(Error::MaxDepthExceeded));
    }
}
