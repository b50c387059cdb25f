//! Implementations of the built-in function library.
//!
//! Pure functions over [`Value`]; signatures live in
//! `floyd_core::functions` so the analyzer's type checker stays in
//! sync. `pos` and `colno` are not here - they read parser state and
//! live in the evaluator.
//!
//! Naming follows one scheme throughout: `a` str, `b` bool, `f`
//! float, `i` int, `u` one-code-point str, `x` hex str, `td` a
//! duration in seconds.

use floyd_core::Value;
use indexmap::IndexMap;

type Result<T> = std::result::Result<T, String>;

/// Dispatch a built-in by name.
pub fn call(name: &str, args: &[Value]) -> Result<Value> {
    match name {
        "atof" => atof(one_str(name, args)?),
        "atoi" => {
            let (s, base) = (str_arg(name, args, 0)?, int_arg(name, args, 1)?);
            atoi(s, base)
        }
        "atou" => atou(one_str(name, args)?),
        "btoa" => match args {
            [Value::Bool(b)] => Ok(Value::Str(b.to_string())),
            _ => type_error(name, args),
        },
        "ftoa" => Ok(Value::Str(
            Value::Float(float_arg(name, args, 0)?).to_string(),
        )),
        "ftoi" => Ok(Value::Int(float_arg(name, args, 0)? as i64)),
        "itoa" => Ok(Value::Str(int_arg(name, args, 0)?.to_string())),
        "itof" => Ok(Value::Float(int_arg(name, args, 0)? as f64)),
        "itou" => itou(int_arg(name, args, 0)?),
        "utoi" => utoi(one_str(name, args)?),
        "xtoi" => xtoi(one_str(name, args)?),
        "xtou" => match xtoi(one_str(name, args)?)? {
            Value::Int(i) => itou(i),
            _ => unreachable!(),
        },

        "cat" => cat(list_arg(name, args, 0)?),
        "dedent" => dedent(
            str_arg(name, args, 0)?,
            int_arg(name, args, 1)?,
            int_arg(name, args, 2)?,
        ),
        "encode_string" => Ok(Value::Str(encode_string(str_arg(name, args, 0)?))),
        "join" => join(str_arg(name, args, 0)?, list_arg(name, args, 1)?),
        "replace" => Ok(Value::Str(str_arg(name, args, 0)?.replace(
            str_arg(name, args, 1)?,
            str_arg(name, args, 2)?,
        ))),
        "scat" => {
            let head = str_arg(name, args, 0)?.to_string();
            match cat(list_arg(name, args, 1)?)? {
                Value::Str(tail) => Ok(Value::Str(head + &tail)),
                _ => unreachable!(),
            }
        }
        "split" => split(str_arg(name, args, 0)?, str_arg(name, args, 1)?),
        "strcat" => Ok(Value::Str(
            str_arg(name, args, 0)?.to_string() + str_arg(name, args, 1)?,
        )),
        "strin" => Ok(Value::Bool(
            str_arg(name, args, 0)?.contains(str_arg(name, args, 1)?),
        )),
        "strlen" => Ok(Value::Int(str_arg(name, args, 0)?.chars().count() as i64)),
        "substr" => substr(
            str_arg(name, args, 0)?,
            int_arg(name, args, 1)?,
            int_arg(name, args, 2)?,
        ),

        "cdr" => match list_arg(name, args, 0)? {
            [] => Err("cdr of an empty list".to_string()),
            [_, rest @ ..] => Ok(Value::List(rest.to_vec())),
        },
        "concat" => {
            let mut out = list_arg(name, args, 0)?.to_vec();
            out.extend_from_slice(list_arg(name, args, 1)?);
            Ok(Value::List(out))
        }
        "cons" => {
            let head = arg(name, args, 0)?.clone();
            let mut out = vec![head];
            out.extend_from_slice(list_arg(name, args, 1)?);
            Ok(Value::List(out))
        }
        "in" => Ok(Value::Bool(
            list_arg(name, args, 0)?.contains(arg(name, args, 1)?),
        )),
        "item" => item(list_arg(name, args, 0)?, int_arg(name, args, 1)?),
        "list" => Ok(Value::List(args.to_vec())),
        "scons" => {
            // Like `cons`, but typed to strings.
            let head = Value::Str(str_arg(name, args, 0)?.to_string());
            let mut out = vec![head];
            out.extend_from_slice(list_arg(name, args, 1)?);
            Ok(Value::List(out))
        }
        "slice" => slice(
            list_arg(name, args, 0)?,
            int_arg(name, args, 1)?,
            int_arg(name, args, 2)?,
        ),
        "sort" => sort(list_arg(name, args, 0)?),

        "dict" => dict(list_arg(name, args, 0)?),
        "get" => match dict_arg(name, args, 0)?.get(str_arg(name, args, 1)?) {
            Some(value) => Ok(value.clone()),
            None => Err(format!("missing key {:?}", str_arg(name, args, 1)?)),
        },
        "has" => Ok(Value::Bool(
            dict_arg(name, args, 0)?.contains_key(str_arg(name, args, 1)?),
        )),
        "keys" => Ok(Value::List(
            dict_arg(name, args, 0)?
                .keys()
                .map(|k| Value::Str(k.clone()))
                .collect(),
        )),
        "map" => map(list_arg(name, args, 0)?, list_arg(name, args, 1)?),
        "map_items" | "pairs" => Ok(Value::List(
            dict_arg(name, args, 0)?
                .iter()
                .map(|(k, v)| Value::List(vec![Value::Str(k.clone()), v.clone()]))
                .collect(),
        )),
        "node" => {
            let mut out = IndexMap::new();
            out.insert(
                "kind".to_string(),
                Value::Str(str_arg(name, args, 0)?.to_string()),
            );
            out.insert("value".to_string(), arg(name, args, 1)?.clone());
            out.insert(
                "children".to_string(),
                Value::List(list_arg(name, args, 2)?.to_vec()),
            );
            Ok(Value::Dict(out))
        }
        "values" => Ok(Value::List(
            dict_arg(name, args, 0)?.values().cloned().collect(),
        )),

        "equal" => Ok(Value::Bool(arg(name, args, 0)? == arg(name, args, 1)?)),
        "is_atom" => Ok(Value::Bool(!matches!(
            arg(name, args, 0)?,
            Value::List(_) | Value::Dict(_)
        ))),
        "is_bool" => Ok(Value::Bool(matches!(arg(name, args, 0)?, Value::Bool(_)))),
        "is_dict" => Ok(Value::Bool(matches!(arg(name, args, 0)?, Value::Dict(_)))),
        "is_float" => Ok(Value::Bool(matches!(arg(name, args, 0)?, Value::Float(_)))),
        "is_int" => Ok(Value::Bool(matches!(arg(name, args, 0)?, Value::Int(_)))),
        "is_list" => Ok(Value::Bool(matches!(arg(name, args, 0)?, Value::List(_)))),
        "is_null" => Ok(Value::Bool(matches!(arg(name, args, 0)?, Value::Null))),
        "is_number" => Ok(Value::Bool(matches!(
            arg(name, args, 0)?,
            Value::Int(_) | Value::Float(_)
        ))),
        "is_str" => Ok(Value::Bool(matches!(arg(name, args, 0)?, Value::Str(_)))),
        "len" => len(arg(name, args, 0)?),
        "throw" => Err(str_arg(name, args, 0)?.to_string()),

        "str2td" => str2td(str_arg(name, args, 0)?),
        "td2str" => Ok(Value::Str(td2str(float_arg(name, args, 0)?))),

        "ucategory" | "ulookup" | "uname" => Err(format!(
            "built-in `{name}` needs Unicode tables this implementation does not ship"
        )),

        _ => Err(format!("unknown built-in `{name}`")),
    }
}

// ----------------------------------------------------------------------
// Argument plumbing
// ----------------------------------------------------------------------

fn arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a Value> {
    args.get(i)
        .ok_or_else(|| format!("`{name}` is missing argument {}", i + 1))
}

fn str_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a str> {
    match arg(name, args, i)? {
        Value::Str(s) => Ok(s),
        other => Err(format!(
            "`{name}` expects a string, found {}",
            other.type_name()
        )),
    }
}

fn int_arg(name: &str, args: &[Value], i: usize) -> Result<i64> {
    match arg(name, args, i)? {
        Value::Int(v) => Ok(*v),
        other => Err(format!("`{name}` expects an int, found {}", other.type_name())),
    }
}

fn float_arg(name: &str, args: &[Value], i: usize) -> Result<f64> {
    match arg(name, args, i)? {
        Value::Float(v) => Ok(*v),
        Value::Int(v) => Ok(*v as f64),
        other => Err(format!(
            "`{name}` expects a number, found {}",
            other.type_name()
        )),
    }
}

fn list_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a [Value]> {
    match arg(name, args, i)? {
        Value::List(items) => Ok(items),
        other => Err(format!(
            "`{name}` expects a list, found {}",
            other.type_name()
        )),
    }
}

fn dict_arg<'a>(name: &str, args: &'a [Value], i: usize) -> Result<&'a IndexMap<String, Value>> {
    match arg(name, args, i)? {
        Value::Dict(map) => Ok(map),
        other => Err(format!(
            "`{name}` expects a dict, found {}",
            other.type_name()
        )),
    }
}

fn one_str<'a>(name: &str, args: &'a [Value]) -> Result<&'a str> {
    str_arg(name, args, 0)
}

fn type_error(name: &str, args: &[Value]) -> Result<Value> {
    let found: Vec<&str> = args.iter().map(Value::type_name).collect();
    Err(format!("`{name}` cannot take ({})", found.join(", ")))
}

// ----------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------

fn atof(s: &str) -> Result<Value> {
    s.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| format!("`atof` cannot parse {s:?}"))
}

fn atoi(s: &str, base: i64) -> Result<Value> {
    let base = u32::try_from(base)
        .ok()
        .filter(|b| (2..=36).contains(b))
        .ok_or_else(|| format!("`atoi` base {base} is out of range"))?;
    i64::from_str_radix(s, base)
        .map(Value::Int)
        .map_err(|_| format!("`atoi` cannot parse {s:?} in base {base}"))
}

/// Decimal scalar value to a one-code-point string.
fn atou(s: &str) -> Result<Value> {
    match atoi(s, 10)? {
        Value::Int(i) => itou(i),
        _ => unreachable!(),
    }
}

fn itou(i: i64) -> Result<Value> {
    u32::try_from(i)
        .ok()
        .and_then(char::from_u32)
        .map(|ch| Value::Str(ch.to_string()))
        .ok_or_else(|| format!("{i} is not a valid code point"))
}

fn utoi(s: &str) -> Result<Value> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(Value::Int(ch as i64)),
        _ => Err(format!("`utoi` needs a single code point, found {s:?}")),
    }
}

fn xtoi(s: &str) -> Result<Value> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    i64::from_str_radix(digits, 16)
        .map(Value::Int)
        .map_err(|_| format!("`xtoi` cannot parse {s:?}"))
}

// ----------------------------------------------------------------------
// Strings
// ----------------------------------------------------------------------

fn cat(items: &[Value]) -> Result<Value> {
    let mut out = String::new();
    for item in items {
        match item {
            Value::Str(s) => out.push_str(s),
            other => return Err(format!("`cat` expects strings, found {}", other.type_name())),
        }
    }
    Ok(Value::Str(out))
}

fn join(sep: &str, items: &[Value]) -> Result<Value> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Str(s) => parts.push(s.as_str()),
            other => {
                return Err(format!("`join` expects strings, found {}", other.type_name()));
            }
        }
    }
    Ok(Value::Str(parts.join(sep)))
}

fn split(s: &str, sep: &str) -> Result<Value> {
    if sep.is_empty() {
        return Err("`split` needs a non-empty separator".to_string());
    }
    Ok(Value::List(
        s.split(sep).map(|part| Value::Str(part.to_string())).collect(),
    ))
}

fn substr(s: &str, start: i64, end: i64) -> Result<Value> {
    let chars: Vec<char> = s.chars().collect();
    let (start, end) = clamp_range(chars.len(), start, end);
    Ok(Value::Str(chars[start..end].iter().collect()))
}

/// Renders `s` as a double-quoted literal with escapes.
fn encode_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if (ch as u32) < 0x20 => out.push_str(&format!("\\x{:02x}", ch as u32)),
            ch => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Strips the common leading whitespace run from every line after the
/// first. `colno` is the 1-based column the text started at;
/// `min_indent`, when non-negative, caps how much is stripped. Tabs
/// count as one column.
fn dedent(s: &str, colno: i64, min_indent: i64) -> Result<Value> {
    let lines: Vec<&str> = s.split('\n').collect();
    let mut common: Option<usize> = None;
    for line in lines.iter().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        common = Some(match common {
            Some(prev) => prev.min(indent),
            None => indent,
        });
    }
    let mut strip = common.unwrap_or(0);
    // The first line began at `colno`; earlier columns were consumed
    // before the text, so they bound the strip too.
    if colno > 1 {
        strip = strip.min((colno - 1) as usize);
    }
    if min_indent >= 0 {
        strip = strip.min(min_indent as usize);
    }

    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            out.push(line.to_string());
        } else if line.trim().is_empty() {
            out.push(line.trim_start_matches([' ', '\t']).to_string());
        } else {
            let cut = strip.min(line.len() - line.trim_start_matches([' ', '\t']).len());
            out.push(line[cut..].to_string());
        }
    }
    Ok(Value::Str(out.join("\n")))
}

// ----------------------------------------------------------------------
// Lists and dicts
// ----------------------------------------------------------------------

fn item(items: &[Value], i: i64) -> Result<Value> {
    let len = items.len() as i64;
    let idx = if i < 0 { len + i } else { i };
    if idx < 0 || idx >= len {
        return Err(format!("index {i} out of range for list of {len}"));
    }
    Ok(items[idx as usize].clone())
}

fn slice(items: &[Value], start: i64, end: i64) -> Result<Value> {
    let (start, end) = clamp_range(items.len(), start, end);
    Ok(Value::List(items[start..end].to_vec()))
}

fn sort(items: &[Value]) -> Result<Value> {
    let mut strings = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Str(s) => strings.push(s.clone()),
            other => {
                return Err(format!("`sort` expects strings, found {}", other.type_name()));
            }
        }
    }
    strings.sort();
    Ok(Value::List(strings.into_iter().map(Value::Str).collect()))
}

/// Builds a dict from `[key, value]` pairs.
fn dict(pairs: &[Value]) -> Result<Value> {
    let mut out = IndexMap::new();
    for pair in pairs {
        match pair {
            Value::List(kv) if kv.len() == 2 => match &kv[0] {
                Value::Str(k) => {
                    out.insert(k.clone(), kv[1].clone());
                }
                other => {
                    return Err(format!(
                        "`dict` keys must be strings, found {}",
                        other.type_name()
                    ));
                }
            },
            other => {
                return Err(format!(
                    "`dict` expects [key, value] pairs, found {}",
                    other.type_name()
                ));
            }
        }
    }
    Ok(Value::Dict(out))
}

/// Zips a key list and a value list into a dict.
fn map(keys: &[Value], values: &[Value]) -> Result<Value> {
    if keys.len() != values.len() {
        return Err(format!(
            "`map` got {} keys but {} values",
            keys.len(),
            values.len()
        ));
    }
    let mut out = IndexMap::new();
    for (k, v) in keys.iter().zip(values) {
        match k {
            Value::Str(k) => {
                out.insert(k.clone(), v.clone());
            }
            other => {
                return Err(format!(
                    "`map` keys must be strings, found {}",
                    other.type_name()
                ));
            }
        }
    }
    Ok(Value::Dict(out))
}

fn len(value: &Value) -> Result<Value> {
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Dict(map) => map.len(),
        other => return Err(format!("`len` cannot measure {}", other.type_name())),
    };
    Ok(Value::Int(n as i64))
}

// ----------------------------------------------------------------------
// Durations
// ----------------------------------------------------------------------

/// Parses `"1h30m"` / `"90s"` / `"2.5m"` into seconds.
fn str2td(s: &str) -> Result<Value> {
    let mut total = 0.0f64;
    let mut number = String::new();
    let mut saw_unit = false;
    for ch in s.chars() {
        if ch.is_ascii_digit() || ch == '.' {
            number.push(ch);
            continue;
        }
        let scale = match ch {
            'h' => 3600.0,
            'm' => 60.0,
            's' => 1.0,
            _ => return Err(format!("`str2td` cannot parse {s:?}")),
        };
        let value: f64 = number
            .parse()
            .map_err(|_| format!("`str2td` cannot parse {s:?}"))?;
        total += value * scale;
        number.clear();
        saw_unit = true;
    }
    if !number.is_empty() {
        // A bare number is seconds.
        let value: f64 = number
            .parse()
            .map_err(|_| format!("`str2td` cannot parse {s:?}"))?;
        total += value;
    } else if !saw_unit {
        return Err(format!("`str2td` cannot parse {s:?}"));
    }
    Ok(Value::Float(total))
}

fn td2str(seconds: f64) -> String {
    let total = seconds.abs();
    let sign = if seconds < 0.0 { "-" } else { "" };
    let hours = (total / 3600.0).floor();
    let minutes = ((total - hours * 3600.0) / 60.0).floor();
    let secs = total - hours * 3600.0 - minutes * 60.0;
    let mut out = String::new();
    if hours > 0.0 {
        out.push_str(&format!("{hours:.0}h"));
    }
    if minutes > 0.0 {
        out.push_str(&format!("{minutes:.0}m"));
    }
    if secs > 0.0 || out.is_empty() {
        if secs.fract() == 0.0 {
            out.push_str(&format!("{secs:.0}s"));
        } else {
            out.push_str(&format!("{secs}s"));
        }
    }
    format!("{sign}{out}")
}

fn clamp_range(len: usize, start: i64, end: i64) -> (usize, usize) {
    let len = len as i64;
    let norm = |i: i64| -> usize {
        let i = if i < 0 { len + i } else { i };
        i.clamp(0, len) as usize
    };
    let (a, b) = (norm(start), norm(end));
    (a, b.max(a))
}

#[cfg(test)]
mod builtins_tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_string())
    }

    fn call_ok(name: &str, args: &[Value]) -> Value {
        call(name, args).unwrap_or_else(|err| panic!("{name} failed: {err}"))
    }

    #[test]
    fn conversions() {
        assert_eq!(call_ok("atoi", &[s("ff"), Value::Int(16)]), Value::Int(255));
        assert_eq!(call_ok("atoi", &[s("12"), Value::Int(10)]), Value::Int(12));
        assert_eq!(call_ok("atof", &[s("1.5")]), Value::Float(1.5));
        assert_eq!(call_ok("itoa", &[Value::Int(-3)]), s("-3"));
        assert_eq!(call_ok("itou", &[Value::Int(0x41)]), s("A"));
        assert_eq!(call_ok("utoi", &[s("A")]), Value::Int(65));
        assert_eq!(call_ok("xtou", &[s("1F600")]), s("\u{1F600}"));
        assert_eq!(call_ok("xtoi", &[s("0xff")]), Value::Int(255));
        assert_eq!(call_ok("btoa", &[Value::Bool(true)]), s("true"));
        assert_eq!(call_ok("ftoi", &[Value::Float(3.9)]), Value::Int(3));
    }

    #[test]
    fn string_functions() {
        assert_eq!(call_ok("cat", &[Value::List(vec![s("a"), s("bc")])]), s("abc"));
        assert_eq!(
            call_ok("join", &[s(","), Value::List(vec![s("a"), s("b")])]),
            s("a,b")
        );
        assert_eq!(
            call_ok("split", &[s("a,b"), s(",")]),
            Value::List(vec![s("a"), s("b")])
        );
        assert_eq!(call_ok("strcat", &[s("ab"), s("cd")]), s("abcd"));
        assert_eq!(call_ok("strin", &[s("hay"), s("a")]), Value::Bool(true));
        assert_eq!(call_ok("strlen", &[s("héllo")]), Value::Int(5));
        assert_eq!(
            call_ok("substr", &[s("hello"), Value::Int(1), Value::Int(3)]),
            s("el")
        );
        assert_eq!(call_ok("encode_string", &[s("a\"b\n")]), s("\"a\\\"b\\n\""));
        assert_eq!(
            call_ok("replace", &[s("aba"), s("a"), s("c")]),
            s("cbc")
        );
    }

    #[test]
    fn list_functions() {
        let xs = Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(
            call_ok("cdr", &[xs.clone()]),
            Value::List(vec![Value::Int(2), Value::Int(3)])
        );
        assert_eq!(
            call_ok("cons", &[Value::Int(0), xs.clone()]),
            Value::List(vec![Value::Int(0), Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(call_ok("item", &[xs.clone(), Value::Int(-1)]), Value::Int(3));
        assert_eq!(
            call_ok("slice", &[xs.clone(), Value::Int(1), Value::Int(3)]),
            Value::List(vec![Value::Int(2), Value::Int(3)])
        );
        assert_eq!(call_ok("in", &[xs.clone(), Value::Int(2)]), Value::Bool(true));
        assert_eq!(call_ok("len", &[xs]), Value::Int(3));
        assert_eq!(
            call_ok("sort", &[Value::List(vec![s("b"), s("a")])]),
            Value::List(vec![s("a"), s("b")])
        );
        assert_eq!(
            call_ok("scons", &[s("x"), Value::List(vec![s("y")])]),
            Value::List(vec![s("x"), s("y")])
        );
        assert_eq!(
            call_ok("scat", &[s("x"), Value::List(vec![s("y"), s("z")])]),
            s("xyz")
        );
    }

    #[test]
    fn dict_functions() {
        let pairs = Value::List(vec![
            Value::List(vec![s("a"), Value::Int(1)]),
            Value::List(vec![s("b"), Value::Int(2)]),
        ]);
        let d = call_ok("dict", &[pairs.clone()]);
        assert_eq!(call_ok("get", &[d.clone(), s("b")]), Value::Int(2));
        assert_eq!(call_ok("has", &[d.clone(), s("a")]), Value::Bool(true));
        assert_eq!(call_ok("has", &[d.clone(), s("z")]), Value::Bool(false));
        assert_eq!(
            call_ok("keys", &[d.clone()]),
            Value::List(vec![s("a"), s("b")])
        );
        assert_eq!(
            call_ok("values", &[d.clone()]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(call_ok("pairs", &[d.clone()]), pairs);
        assert_eq!(call_ok("map_items", &[d.clone()]), pairs);
        let zipped = call_ok(
            "map",
            &[
                Value::List(vec![s("a"), s("b")]),
                Value::List(vec![Value::Int(1), Value::Int(2)]),
            ],
        );
        assert_eq!(zipped, d);
    }

    #[test]
    fn predicates() {
        assert_eq!(call_ok("is_int", &[Value::Int(1)]), Value::Bool(true));
        assert_eq!(call_ok("is_str", &[Value::Int(1)]), Value::Bool(false));
        assert_eq!(call_ok("is_null", &[Value::Null]), Value::Bool(true));
        assert_eq!(
            call_ok("is_atom", &[Value::List(vec![])]),
            Value::Bool(false)
        );
        assert_eq!(call_ok("is_number", &[Value::Float(0.5)]), Value::Bool(true));
        assert_eq!(
            call_ok("equal", &[Value::Int(1), Value::Int(1)]),
            Value::Bool(true)
        );
    }

    #[test]
    fn throw_raises() {
        assert_eq!(call("throw", &[s("boom")]), Err("boom".to_string()));
    }

    #[test]
    fn node_builds_a_tagged_dict() {
        let n = call_ok(
            "node",
            &[s("num"), Value::Int(42), Value::List(vec![])],
        );
        let Value::Dict(map) = n else { panic!("not a dict") };
        assert_eq!(map["kind"], s("num"));
        assert_eq!(map["value"], Value::Int(42));
        assert_eq!(map["children"], Value::List(vec![]));
    }

    #[test]
    fn dedent_strips_common_indent() {
        let text = "foo\n    bar\n      baz\n";
        let out = call_ok("dedent", &[s(text), Value::Int(1), Value::Int(-1)]);
        assert_eq!(out, s("foo\nbar\n  baz\n"));
    }

    #[test]
    fn dedent_respects_min_indent() {
        let text = "foo\n    bar";
        let out = call_ok("dedent", &[s(text), Value::Int(1), Value::Int(2)]);
        assert_eq!(out, s("foo\n  bar"));
    }

    #[test]
    fn durations_round_trip() {
        assert_eq!(call_ok("str2td", &[s("1h30m")]), Value::Float(5400.0));
        assert_eq!(call_ok("str2td", &[s("90")]), Value::Float(90.0));
        assert_eq!(call_ok("td2str", &[Value::Float(5400.0)]), s("1h30m"));
        assert_eq!(call_ok("td2str", &[Value::Float(0.0)]), s("0s"));
    }

    #[test]
    fn unicode_table_functions_raise() {
        assert!(call("uname", &[s("A")]).is_err());
        assert!(call("ucategory", &[s("A")]).is_err());
        assert!(call("ulookup", &[s("LATIN SMALL LETTER A")]).is_err());
    }
}
