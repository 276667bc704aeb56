//! Builtin primitive conversions.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Number, Value};

use crate::error::Signedness;
use crate::registry::{Converted, TypeRegistry};
use crate::{Argument, ConversionError, Token, TypeError};

static BOOLEAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(true|false)$").expect("static regex must compile"));
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(0|[1-9]\d*)(\.\d+)?$").expect("static regex must compile")
});
static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?(0|[1-9]\d*)$").expect("static regex must compile"));
static FLOAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?(0|[1-9]\d*)\.\d+$").expect("static regex must compile"));
static DOUBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(0|[1-9]\d*)\.\d{2,}$").expect("static regex must compile")
});

/// Sized integer types, in order of doubling width.
const SIZED_INTEGERS: [&str; 4] = ["byte", "short", "int", "long"];

pub(crate) fn register_all(registry: &mut TypeRegistry) {
    registry.register("string", convert_string);
    registry.register("boolean", convert_boolean);
    registry.register("number", convert_number);
    for (index, name) in SIZED_INTEGERS.into_iter().enumerate() {
        let bits = 8u32 << index;
        registry.register(name, move |tokens, arg| {
            convert_sized_integer(tokens, arg, name, bits)
        });
    }
    registry.register("float", |tokens, _| {
        convert_fraction(tokens, &FLOAT_RE, TypeError::InvalidFloat)
    });
    registry.register("double", |tokens, _| {
        convert_fraction(tokens, &DOUBLE_RE, TypeError::InvalidDouble)
    });
}

fn first(tokens: &[Token]) -> Result<&Token, ConversionError> {
    tokens
        .first()
        .ok_or_else(|| ConversionError::Internal("no token to convert".to_string()))
}

fn convert_string(tokens: &[Token], _arg: &Argument) -> Result<Converted, ConversionError> {
    let token = first(tokens)?;
    Ok(Converted::new(Value::String(token.text.clone())))
}

fn convert_boolean(tokens: &[Token], _arg: &Argument) -> Result<Converted, ConversionError> {
    let token = first(tokens)?;
    if !BOOLEAN_RE.is_match(&token.text) {
        return Err(ConversionError::reject(
            TypeError::NotBoolean(token.text.clone()),
            token,
        ));
    }
    Ok(Converted::new(Value::Bool(token.text == "true")))
}

fn convert_number(tokens: &[Token], arg: &Argument) -> Result<Converted, ConversionError> {
    let token = first(tokens)?;
    let text = token.text.as_str();
    let invalid = || ConversionError::reject(TypeError::InvalidNumber(text.to_string()), token);

    if !NUMBER_RE.is_match(text) {
        return Err(invalid());
    }
    let num: f64 = text.parse().map_err(|_| invalid())?;

    if let Some(range) = arg.range() {
        if let Some(min) = range.min
            && num < min
        {
            return Err(ConversionError::reject(
                TypeError::BelowRange {
                    text: text.to_string(),
                    min,
                },
                token,
            ));
        }
        if let Some(max) = range.max
            && num > max
        {
            return Err(ConversionError::reject(
                TypeError::AboveRange {
                    text: text.to_string(),
                    max,
                },
                token,
            ));
        }
    }

    // Integral literals stay integral so `5` compares equal to `json!(5)`.
    if !text.contains('.')
        && let Ok(int) = text.parse::<i64>()
    {
        return Ok(Converted::new(Value::from(int)));
    }
    let value = Number::from_f64(num).ok_or_else(invalid)?;
    Ok(Converted::new(Value::Number(value)))
}

fn convert_sized_integer(
    tokens: &[Token],
    arg: &Argument,
    type_name: &str,
    bits: u32,
) -> Result<Converted, ConversionError> {
    let token = first(tokens)?;
    let text = token.text.as_str();

    if !INTEGER_RE.is_match(text) {
        return Err(ConversionError::reject(
            TypeError::InvalidInteger {
                text: text.to_string(),
                type_name: type_name.to_string(),
            },
            token,
        ));
    }

    let signedness = if arg.is_unsigned() {
        Signedness::Unsigned
    } else {
        Signedness::Signed
    };
    let overflow = || ConversionError::reject(TypeError::Overflow { bits, signedness }, token);

    // Literals too long for i128 are out of range for every sized type.
    let num: i128 = text.parse().map_err(|_| overflow())?;
    let (min, max) = integer_bounds(bits, signedness);
    if num < min || num > max {
        return Err(overflow());
    }

    let value = if num < 0 {
        Value::from(num as i64)
    } else {
        Value::from(num as u64)
    };
    Ok(Converted::new(value))
}

/// Inclusive bounds of a `bits`-wide integer.
fn integer_bounds(bits: u32, signedness: Signedness) -> (i128, i128) {
    match signedness {
        Signedness::Signed => (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1),
        Signedness::Unsigned => (0, (1i128 << bits) - 1),
    }
}

fn convert_fraction(
    tokens: &[Token],
    pattern: &Regex,
    invalid: fn(String) -> TypeError,
) -> Result<Converted, ConversionError> {
    let token = first(tokens)?;
    let text = token.text.as_str();
    let reject = || ConversionError::reject(invalid(text.to_string()), token);

    if !pattern.is_match(text) {
        return Err(reject());
    }
    let num: f64 = text.parse().map_err(|_| reject())?;
    let value = Number::from_f64(num).ok_or_else(reject)?;
    Ok(Converted::new(Value::Number(value)))
}
