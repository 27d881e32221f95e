//! 格式说明（`f"{x:>8.2f}"`、`str.format`）

use super::error::{RuntimeError, RuntimeResult};
use super::value::{format_float, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    pub fill: char,
    pub align: Option<char>,
    pub sign: Option<char>,
    pub zero: bool,
    pub width: usize,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub ty: Option<char>,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: None,
            sign: None,
            zero: false,
            width: 0,
            grouping: None,
            precision: None,
            ty: None,
        }
    }
}

fn invalid_spec() -> RuntimeError {
    RuntimeError::value_error("Invalid format specifier")
}

/// `[[fill]align][sign][0][width][,|_][.precision][type]`
pub fn parse_spec(spec: &str) -> RuntimeResult<FormatSpec> {
    let chars: Vec<char> = spec.chars().collect();
    let mut out = FormatSpec::default();
    let mut i = 0;

    let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');
    if chars.len() >= 2 && is_align(chars[1]) {
        out.fill = chars[0];
        out.align = Some(chars[1]);
        i = 2;
    } else if chars.first().copied().is_some_and(is_align) {
        out.align = Some(chars[0]);
        i = 1;
    }
    if let Some(&c) = chars.get(i) {
        if matches!(c, '+' | '-' | ' ') {
            out.sign = Some(c);
            i += 1;
        }
    }
    if chars.get(i) == Some(&'#') {
        i += 1;
    }
    if chars.get(i) == Some(&'0') {
        out.zero = true;
        i += 1;
    }
    let width_start = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    if i > width_start {
        let digits: String = chars[width_start..i].iter().collect();
        out.width = digits.parse().map_err(|_| invalid_spec())?;
    }
    if let Some(&c) = chars.get(i) {
        if c == ',' || c == '_' {
            out.grouping = Some(c);
            i += 1;
        }
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i == start {
            return Err(RuntimeError::value_error("Format specifier missing precision"));
        }
        let digits: String = chars[start..i].iter().collect();
        out.precision = Some(digits.parse().map_err(|_| invalid_spec())?);
    }
    if let Some(&c) = chars.get(i) {
        out.ty = Some(c);
        i += 1;
    }
    if i != chars.len() {
        return Err(invalid_spec());
    }
    Ok(out)
}

/// 按格式说明格式化一个值；`display` 为该值的 `str()` 结果
pub fn format_value(value: &Value, spec: &str, display: &str) -> RuntimeResult<String> {
    if spec.is_empty() {
        return Ok(display.to_string());
    }
    let spec = parse_spec(spec)?;
    match value {
        Value::Int(_) | Value::Bool(_) | Value::Float(_) => format_number(value, &spec),
        Value::Str(s) => {
            if !matches!(spec.ty, None | Some('s')) {
                return Err(RuntimeError::value_error(format!(
                    "Unknown format code '{}' for object of type 'str'",
                    spec.ty.unwrap_or('s')
                )));
            }
            if spec.sign.is_some() {
                return Err(RuntimeError::value_error(
                    "Sign not allowed in string format specifier",
                ));
            }
            let text: String = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.to_string(),
            };
            Ok(pad(text, &spec, '<'))
        }
        other => Err(RuntimeError::type_error(format!(
            "unsupported format string passed to {}.__format__",
            other.type_name()
        ))),
    }
}

fn format_number(value: &Value, spec: &FormatSpec) -> RuntimeResult<String> {
    let body = match (value, spec.ty) {
        (Value::Int(_) | Value::Bool(_), None | Some('d') | Some('n')) => {
            let i = value.as_int().unwrap_or_default();
            group(&i.unsigned_abs().to_string(), spec.grouping)
        }
        (Value::Int(_) | Value::Bool(_), Some(radix @ ('x' | 'X' | 'o' | 'b'))) => {
            let i = value.as_int().unwrap_or_default().unsigned_abs();
            match radix {
                'x' => format!("{i:x}"),
                'X' => format!("{i:X}"),
                'o' => format!("{i:o}"),
                _ => format!("{i:b}"),
            }
        }
        (Value::Float(_), Some('d')) => {
            return Err(RuntimeError::value_error(
                "Unknown format code 'd' for object of type 'float'",
            ))
        }
        (_, ty) => {
            let f = value.as_float().unwrap_or_default().abs();
            let text = match ty {
                Some('f') | Some('F') => format!("{:.*}", spec.precision.unwrap_or(6), f),
                Some('e') | Some('E') => {
                    let s = format_exp(f, spec.precision.unwrap_or(6));
                    if ty == Some('E') {
                        s.to_uppercase()
                    } else {
                        s
                    }
                }
                Some('%') => format!("{:.*}%", spec.precision.unwrap_or(6), f * 100.0),
                Some('g') | Some('G') => format_general(f, spec.precision.unwrap_or(6)),
                None => match spec.precision {
                    Some(p) => format_general(f, p),
                    None => format_float(f),
                },
                Some(other) => {
                    return Err(RuntimeError::value_error(format!(
                        "Unknown format code '{other}' for object of type '{}'",
                        value.type_name()
                    )))
                }
            };
            group_float(&text, spec.grouping)
        }
    };

    let negative = match value {
        Value::Float(f) => f.is_sign_negative() && *f != 0.0,
        other => other.as_int().unwrap_or_default() < 0,
    };
    let sign = if negative {
        "-"
    } else {
        match spec.sign {
            Some('+') => "+",
            Some(' ') => " ",
            _ => "",
        }
    };

    let len = sign.chars().count() + body.chars().count();
    if (spec.zero && spec.align.is_none()) || spec.align == Some('=') {
        let fill = if spec.align.is_none() { '0' } else { spec.fill };
        let padding: String = std::iter::repeat(fill).take(spec.width.saturating_sub(len)).collect();
        return Ok(format!("{sign}{padding}{body}"));
    }
    Ok(pad(format!("{sign}{body}"), spec, '>'))
}

/// 科学计数法，指数至少两位并带符号
fn format_exp(f: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, f);
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

/// `g` 格式：按有效数字选择定点或科学计数法，去掉末尾的 0
fn format_general(f: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if f == 0.0 {
        return "0".to_string();
    }
    let exp_text = format!("{:.*e}", precision - 1, f);
    let exponent: i32 = exp_text
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);
    if exponent >= -4 && exponent < precision as i32 {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_zeros(format!("{:.*}", decimals, f))
    } else {
        let s = format_exp(f, precision - 1);
        match s.split_once('e') {
            Some((mantissa, exp)) => format!("{}e{}", strip_zeros(mantissa.to_string()), exp),
            None => s,
        }
    }
}

fn strip_zeros(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn group(digits: &str, separator: Option<char>) -> String {
    let Some(sep) = separator else {
        return digits.to_string();
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

fn group_float(text: &str, separator: Option<char>) -> String {
    if separator.is_none() {
        return text.to_string();
    }
    let split = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (int_part, rest) = text.split_at(split);
    format!("{}{}", group(int_part, separator), rest)
}

fn pad(text: String, spec: &FormatSpec, default_align: char) -> String {
    let len = text.chars().count();
    if spec.width <= len {
        return text;
    }
    let total = spec.width - len;
    let fill = |n: usize| std::iter::repeat(spec.fill).take(n).collect::<String>();
    match spec.align.unwrap_or(default_align) {
        '<' => format!("{text}{}", fill(total)),
        '^' => format!("{}{text}{}", fill(total / 2), fill(total - total / 2)),
        _ => format!("{}{text}", fill(total)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(value: Value, spec: &str) -> String {
        let display = value.to_display().unwrap();
        format_value(&value, spec, &display).unwrap()
    }

    #[test]
    fn test_float_precision() {
        assert_eq!(fmt(Value::Float(3.14159), ".2f"), "3.14");
        assert_eq!(fmt(Value::Float(-2.5), "8.1f"), "    -2.5");
        assert_eq!(fmt(Value::Int(7), ".1f"), "7.0");
        assert_eq!(fmt(Value::Float(0.25), ".0%"), "25%");
    }

    #[test]
    fn test_alignment_and_fill() {
        assert_eq!(fmt(Value::str("ab"), ">5"), "   ab");
        assert_eq!(fmt(Value::str("ab"), "*^6"), "**ab**");
        assert_eq!(fmt(Value::Int(42), "<5"), "42   ");
        assert_eq!(fmt(Value::Int(42), "05"), "00042");
        assert_eq!(fmt(Value::Int(-42), "06"), "-00042");
    }

    #[test]
    fn test_grouping_and_sign() {
        assert_eq!(fmt(Value::Int(1234567), ","), "1,234,567");
        assert_eq!(fmt(Value::Float(1234.5), ",.2f"), "1,234.50");
        assert_eq!(fmt(Value::Int(5), "+"), "+5");
    }

    #[test]
    fn test_exponent_and_general() {
        assert_eq!(fmt(Value::Float(1234.5), ".2e"), "1.23e+03");
        assert_eq!(fmt(Value::Float(0.0001234), "g"), "0.0001234");
        assert_eq!(fmt(Value::Float(1234567.0), "g"), "1.23457e+06");
        assert_eq!(fmt(Value::Int(255), "x"), "ff");
    }

    #[test]
    fn test_invalid_specs() {
        assert!(parse_spec("abc").is_err());
        let err = format_value(&Value::str("x"), "d", "x").unwrap_err();
        assert!(err.message.contains("Unknown format code 'd'"));
        let err = format_value(&Value::None, ">3", "None").unwrap_err();
        assert_eq!(err.exception, crate::failure::Exception::TypeError);
    }
}
