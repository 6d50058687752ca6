//! Canonical JSON encoding: the exact input of every signature.
//!
//! Two agents written independently must produce byte-identical output for the
//! same logical value, otherwise their signatures silently fail to verify. The
//! rules follow RFC 8785 (JCS), which matches ECMAScript `JSON.stringify` over a
//! value whose object keys have been sorted:
//!
//! - object keys sorted by UTF-16 code units, at every nesting level
//! - arrays keep their order
//! - numbers use the ECMAScript shortest round-trip form (`1`, not `1.0`;
//!   `1e+21`, not `1000000000000000000000`; `-0` becomes `0`)
//! - strings escape only `"`, `\` and U+0000..U+001F
//! - no whitespace anywhere

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};

/// Field excluded from the signing input of every signed structure.
pub const SIGNATURE_FIELD: &str = "signature";

/// Encode a JSON value canonically as UTF-8 bytes.
pub fn encode(value: &Value) -> Result<Vec<u8>> {
    to_canonical_string(value).map(String::into_bytes)
}

/// Encode a JSON value canonically as a string.
pub fn to_canonical_string(value: &Value) -> Result<String> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

/// Serialize any value through serde and encode it canonically.
pub fn encode_serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    encode(&serde_json::to_value(value)?)
}

/// Canonical encoding of a signed structure with its `signature` field removed.
///
/// The verifier calls this on the structure as received, so any field changed
/// after signing changes these bytes.
pub fn encode_unsigned<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut value = serde_json::to_value(value)?;
    match value.as_object_mut() {
        Some(map) => {
            map.remove(SIGNATURE_FIELD);
        }
        None => {
            return Err(Error::Canonical(
                "signed structures must encode as objects".to_string(),
            ))
        }
    }
    encode(&value)
}

fn write_value(out: &mut String, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&format_number(n)?),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        Value::Object(map) => write_object(out, map)?,
    }
    Ok(())
}

fn write_object(out: &mut String, map: &Map<String, Value>) -> Result<()> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.encode_utf16().cmp(b.encode_utf16()));

    out.push('{');
    for (idx, (key, value)) in entries.into_iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value)?;
    }
    out.push('}');
    Ok(())
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Largest integer magnitude an f64 holds exactly (2^53 - 1).
const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Integers outside the f64-exact range are rounded the way a double would be.
fn format_number(n: &Number) -> Result<String> {
    if let Some(i) = n.as_i64() {
        if i.unsigned_abs() <= MAX_SAFE_INTEGER {
            return Ok(i.to_string());
        }
    } else if let Some(u) = n.as_u64() {
        if u <= MAX_SAFE_INTEGER {
            return Ok(u.to_string());
        }
    }
    match n.as_f64() {
        Some(f) => format_f64(f),
        None => Err(Error::Canonical(format!("unsupported number: {n}"))),
    }
}

/// ECMAScript `Number::toString` for finite doubles.
fn format_f64(v: f64) -> Result<String> {
    if !v.is_finite() {
        return Err(Error::Canonical(
            "non-finite numbers have no canonical form".to_string(),
        ));
    }
    if v == 0.0 {
        return Ok("0".to_string());
    }

    let mut buf = ryu::Buffer::new();
    let (digits, n) = decompose(buf.format_finite(v.abs()))?;
    let k = digits.len() as i32;
    let sign = if v < 0.0 { "-" } else { "" };

    // value = digits * 10^(n - k), with `digits` free of leading/trailing zeros.
    let body = if k <= n && n <= 21 {
        format!("{digits}{}", "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{int_part}.{frac_part}")
    } else if -6 < n && n <= 0 {
        format!("0.{}{digits}", "0".repeat((-n) as usize))
    } else {
        let exp = n - 1;
        let exp_sign = if exp >= 0 { "+" } else { "-" };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{first}e{exp_sign}{}", exp.abs())
        } else {
            format!("{first}.{rest}e{exp_sign}{}", exp.abs())
        }
    };
    Ok(format!("{sign}{body}"))
}

/// Split a positive shortest-form float string into significant digits and the
/// decimal point position `n` (value = 0.digits * 10^n).
fn decompose(rendered: &str) -> Result<(String, i32)> {
    let (mantissa, exp) = match rendered.split_once(['e', 'E']) {
        Some((m, e)) => {
            let exp: i32 = e
                .parse()
                .map_err(|_| Error::Canonical(format!("invalid exponent in {rendered}")))?;
            (m, exp)
        }
        None => (rendered, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let all_digits = format!("{int_part}{frac_part}");
    let trimmed_leading = all_digits.trim_start_matches('0');
    let leading_zeros = (all_digits.len() - trimmed_leading.len()) as i32;
    let digits = trimmed_leading.trim_end_matches('0').to_string();
    if digits.is_empty() {
        return Err(Error::Canonical(format!("no significant digits in {rendered}")));
    }

    let n = int_part.len() as i32 + exp - leading_zeros;
    Ok((digits, n))
}
