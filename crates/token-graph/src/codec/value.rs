//! JSON shapes of token values.
//!
//! [`parse_value`] validates a raw `$value` against a [`TokenType`];
//! [`write_value`] turns a [`TokenValue`] back into JSON with the same field
//! order the format uses.

use serde_json::{Map, Number, Value};
use token_graph_util::OneOrMany;

use crate::model::{
    AliasRef, Border, Color, ColorSpace, Dimension, DimensionUnit, Duration, DurationUnit, Field,
    GradientStop, LineCap, Literal, Shadow, StrokeKeyword, StrokeStyle, TokenType, TokenValue,
    Transition, Typography,
};

fn hex_regex() -> &'static regex::Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap())
}

type Parsed<T> = Result<T, String>;

// ── Parsing ───────────────────────────────────────────────────────────────

/// Parse a whole `$value`: either an alias string or a literal of `ty`.
///
/// `ty` is the declared or inherited type; a literal without one is an error.
pub fn parse_value(raw: &Value, ty: Option<TokenType>) -> Parsed<TokenValue> {
    if let Some(alias) = parse_alias(raw)? {
        return Ok(TokenValue::Alias(alias));
    }
    let ty = ty.ok_or_else(|| "type cannot be determined: no $type on the token or its groups".to_string())?;
    parse_literal(ty, raw).map(TokenValue::Literal)
}

/// `Ok(None)` when `raw` is not alias-shaped at all.
fn parse_alias(raw: &Value) -> Parsed<Option<AliasRef>> {
    let Some(text) = raw.as_str() else {
        return Ok(None);
    };
    if !text.starts_with('{') {
        return Ok(None);
    }
    let alias = AliasRef::parse(text).ok_or_else(|| format!("malformed reference `{text}`"))?;
    if alias.segments().unwrap_or_default().iter().any(|s| s.is_empty()) {
        return Err(format!("malformed reference `{text}`"));
    }
    Ok(Some(alias))
}

pub fn parse_literal(ty: TokenType, raw: &Value) -> Parsed<Literal> {
    Ok(match ty {
        TokenType::Color => Literal::Color(color(raw)?),
        TokenType::Dimension => Literal::Dimension(dimension(raw)?),
        TokenType::Duration => Literal::Duration(duration(raw)?),
        TokenType::Number => Literal::Number(number(raw)?),
        TokenType::FontFamily => Literal::FontFamily(font_family(raw)?),
        TokenType::FontWeight => Literal::FontWeight(font_weight(raw)?),
        TokenType::CubicBezier => Literal::CubicBezier(cubic_bezier(raw)?),
        TokenType::StrokeStyle => Literal::StrokeStyle(stroke_style(raw)?),
        TokenType::Shadow => Literal::Shadow(shadow(raw)?),
        TokenType::Border => Literal::Border(border(raw)?),
        TokenType::Typography => Literal::Typography(typography(raw)?),
        TokenType::Transition => Literal::Transition(transition(raw)?),
        TokenType::Gradient => Literal::Gradient(gradient(raw)?),
    })
}

fn object<'a>(raw: &'a Value, what: &str) -> Parsed<&'a Map<String, Value>> {
    raw.as_object().ok_or_else(|| format!("{what} must be an object"))
}

fn required<'a>(map: &'a Map<String, Value>, key: &str) -> Parsed<&'a Value> {
    map.get(key).ok_or_else(|| format!("missing `{key}`"))
}

/// A composite field: alias string or a value checked by `parse`.
fn field<T>(map: &Map<String, Value>, key: &str, parse: fn(&Value) -> Parsed<T>) -> Parsed<Field<T>> {
    let raw = required(map, key)?;
    field_value(raw, parse).map_err(|e| format!("`{key}`: {e}"))
}

fn optional_field<T>(
    map: &Map<String, Value>,
    key: &str,
    parse: fn(&Value) -> Parsed<T>,
) -> Parsed<Option<Field<T>>> {
    match map.get(key) {
        None => Ok(None),
        Some(raw) => field_value(raw, parse).map(Some).map_err(|e| format!("`{key}`: {e}")),
    }
}

fn field_value<T>(raw: &Value, parse: fn(&Value) -> Parsed<T>) -> Parsed<Field<T>> {
    match parse_alias(raw)? {
        Some(alias) => Ok(Field::Alias(alias)),
        None => parse(raw).map(Field::Value),
    }
}

fn number_in(raw: &Value, what: &str, min: f64, max: f64) -> Parsed<Number> {
    let n = number(raw).map_err(|_| format!("{what} must be a number"))?;
    let f = n.as_f64().unwrap_or(f64::NAN);
    if !(min..=max).contains(&f) {
        return Err(format!("{what} must be between {min} and {max}"));
    }
    Ok(n)
}

fn keyword<T>(raw: &Value, what: &str, parse: fn(&str) -> Option<T>, all: &[&str]) -> Parsed<T> {
    raw.as_str()
        .and_then(parse)
        .ok_or_else(|| format!("{what} must be one of {}", all.join(", ")))
}

fn color(raw: &Value) -> Parsed<Color> {
    let map = object(raw, "color")?;
    let spaces: Vec<&str> = ColorSpace::ALL.iter().map(|s| s.as_str()).collect();
    let color_space = keyword(required(map, "colorSpace")?, "`colorSpace`", ColorSpace::parse, &spaces)?;
    let components = required(map, "components")?
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or("`components` must be a non-empty array")?
        .iter()
        .map(|c| number(c).map_err(|_| "`components` must hold numbers".to_string()))
        .collect::<Parsed<Vec<_>>>()?;
    let alpha = match map.get("alpha") {
        None => None,
        Some(a) => Some(number_in(a, "`alpha`", 0.0, 1.0)?),
    };
    let hex = match map.get("hex") {
        None => None,
        Some(h) => {
            let text = h.as_str().filter(|t| hex_regex().is_match(t));
            Some(text.ok_or("`hex` must look like #rrggbb")?.to_string())
        }
    };
    Ok(Color { color_space, components, alpha, hex })
}

fn dimension(raw: &Value) -> Parsed<Dimension> {
    let map = object(raw, "dimension")?;
    let value = number(required(map, "value")?).map_err(|_| "`value` must be a number".to_string())?;
    let units: Vec<&str> = DimensionUnit::ALL.iter().map(|u| u.as_str()).collect();
    let unit = keyword(required(map, "unit")?, "`unit`", DimensionUnit::parse, &units)?;
    Ok(Dimension { value, unit })
}

fn duration(raw: &Value) -> Parsed<Duration> {
    let map = object(raw, "duration")?;
    let value = number(required(map, "value")?).map_err(|_| "`value` must be a number".to_string())?;
    let units: Vec<&str> = DurationUnit::ALL.iter().map(|u| u.as_str()).collect();
    let unit = keyword(required(map, "unit")?, "`unit`", DurationUnit::parse, &units)?;
    Ok(Duration { value, unit })
}

fn number(raw: &Value) -> Parsed<Number> {
    match raw {
        Value::Number(n) => Ok(n.clone()),
        _ => Err("expected a number".into()),
    }
}

fn font_family(raw: &Value) -> Parsed<OneOrMany<String>> {
    const MESSAGE: &str = "expected a font name or a non-empty list of names";
    match raw {
        Value::String(name) if !name.is_empty() => Ok(OneOrMany::One(name.clone())),
        Value::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| match item {
                Value::String(name) if !name.is_empty() => Ok(name.clone()),
                _ => Err(MESSAGE.to_string()),
            })
            .collect::<Parsed<Vec<_>>>()
            .map(OneOrMany::Many),
        _ => Err(MESSAGE.into()),
    }
}

fn font_weight(raw: &Value) -> Parsed<Number> {
    let n = number_in(raw, "font weight", 1.0, 1000.0)?;
    if n.as_f64().is_some_and(|f| f.fract() != 0.0) {
        return Err("font weight must be a whole number".into());
    }
    Ok(n)
}

fn cubic_bezier(raw: &Value) -> Parsed<[Number; 4]> {
    let items = raw
        .as_array()
        .filter(|items| items.len() == 4)
        .ok_or("expected an array of four numbers")?;
    let x1 = number_in(&items[0], "x1", 0.0, 1.0)?;
    let y1 = number(&items[1])?;
    let x2 = number_in(&items[2], "x2", 0.0, 1.0)?;
    let y2 = number(&items[3])?;
    Ok([x1, y1, x2, y2])
}

fn stroke_style(raw: &Value) -> Parsed<StrokeStyle> {
    if let Value::String(_) = raw {
        let names: Vec<&str> = StrokeKeyword::ALL.iter().map(|k| k.as_str()).collect();
        return keyword(raw, "stroke style", StrokeKeyword::parse, &names).map(StrokeStyle::Keyword);
    }
    let map = object(raw, "stroke style")?;
    let dash_array = required(map, "dashArray")?
        .as_array()
        .filter(|items| !items.is_empty())
        .ok_or("`dashArray` must be a non-empty array")?
        .iter()
        .map(|item| field_value(item, dimension).map_err(|e| format!("`dashArray`: {e}")))
        .collect::<Parsed<Vec<_>>>()?;
    let caps: Vec<&str> = LineCap::ALL.iter().map(|c| c.as_str()).collect();
    let line_cap = keyword(required(map, "lineCap")?, "`lineCap`", LineCap::parse, &caps)?;
    Ok(StrokeStyle::Dashed { dash_array, line_cap })
}

fn shadow_layer(raw: &Value) -> Parsed<Shadow> {
    let map = object(raw, "shadow")?;
    let inset = match map.get("inset") {
        None => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => return Err("`inset` must be a boolean".into()),
    };
    Ok(Shadow {
        color: field(map, "color", color)?,
        offset_x: field(map, "offsetX", dimension)?,
        offset_y: field(map, "offsetY", dimension)?,
        blur: field(map, "blur", dimension)?,
        spread: optional_field(map, "spread", dimension)?,
        inset,
    })
}

fn shadow(raw: &Value) -> Parsed<OneOrMany<Shadow>> {
    match raw {
        Value::Array(layers) if layers.is_empty() => Err("shadow list must not be empty".into()),
        Value::Array(layers) => layers
            .iter()
            .map(shadow_layer)
            .collect::<Parsed<Vec<_>>>()
            .map(OneOrMany::Many),
        _ => shadow_layer(raw).map(OneOrMany::One),
    }
}

fn border(raw: &Value) -> Parsed<Border> {
    let map = object(raw, "border")?;
    Ok(Border {
        color: field(map, "color", color)?,
        width: field(map, "width", dimension)?,
        style: field(map, "style", stroke_style)?,
    })
}

fn typography(raw: &Value) -> Parsed<Typography> {
    let map = object(raw, "typography")?;
    Ok(Typography {
        font_family: field(map, "fontFamily", font_family)?,
        font_size: field(map, "fontSize", dimension)?,
        font_weight: field(map, "fontWeight", font_weight)?,
        line_height: field(map, "lineHeight", number)?,
        letter_spacing: field(map, "letterSpacing", dimension)?,
    })
}

fn transition(raw: &Value) -> Parsed<Transition> {
    let map = object(raw, "transition")?;
    Ok(Transition {
        duration: field(map, "duration", duration)?,
        delay: field(map, "delay", duration)?,
        timing_function: field(map, "timingFunction", cubic_bezier)?,
    })
}

fn gradient_position(raw: &Value) -> Parsed<Number> {
    number_in(raw, "position", 0.0, 1.0)
}

fn gradient(raw: &Value) -> Parsed<Vec<GradientStop>> {
    let stops = raw
        .as_array()
        .filter(|stops| !stops.is_empty())
        .ok_or("expected a non-empty array of gradient stops")?;
    stops
        .iter()
        .map(|stop| -> Parsed<GradientStop> {
            let map = object(stop, "gradient stop")?;
            Ok(GradientStop {
                color: field(map, "color", color)?,
                position: field(map, "position", gradient_position)?,
            })
        })
        .collect()
}

// ── Writing ───────────────────────────────────────────────────────────────

/// Writes an alias as the string that goes into the document.
pub type AliasWriter<'a, E> = dyn FnMut(&AliasRef) -> Result<String, E> + 'a;

/// Write a stored value, formatting aliases through `alias`.
pub fn write_value<E>(value: &TokenValue, alias: &mut AliasWriter<'_, E>) -> Result<Value, E> {
    match value {
        TokenValue::Alias(a) => alias(a).map(Value::String),
        TokenValue::Literal(lit) => write_literal(lit, alias),
    }
}

/// Write a fully resolved literal. Any alias left in it is written as-is.
pub fn literal_to_json(lit: &Literal) -> Value {
    let mut display = |a: &AliasRef| Ok::<_, std::convert::Infallible>(a.to_string());
    match write_literal(lit, &mut display) {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

pub fn write_literal<E>(lit: &Literal, alias: &mut AliasWriter<'_, E>) -> Result<Value, E> {
    Ok(match lit {
        Literal::Color(c) => write_color(c),
        Literal::Dimension(d) => write_dimension(d),
        Literal::Duration(d) => write_duration(d),
        Literal::Number(n) | Literal::FontWeight(n) => Value::Number(n.clone()),
        Literal::FontFamily(f) => write_font_family(f),
        Literal::CubicBezier(b) => write_bezier(b),
        Literal::StrokeStyle(s) => write_stroke(s, alias)?,
        Literal::Shadow(OneOrMany::One(s)) => write_shadow(s, alias)?,
        Literal::Shadow(OneOrMany::Many(layers)) => Value::Array(
            layers.iter().map(|s| write_shadow(s, alias)).collect::<Result<_, _>>()?,
        ),
        Literal::Border(b) => {
            let mut map = Map::new();
            map.insert("color".into(), write_field(&b.color, alias, write_color)?);
            map.insert("width".into(), write_field(&b.width, alias, write_dimension)?);
            let style = match &b.style {
                Field::Alias(a) => Value::String(alias(a)?),
                Field::Value(s) => write_stroke(s, alias)?,
            };
            map.insert("style".into(), style);
            Value::Object(map)
        }
        Literal::Typography(t) => {
            let mut map = Map::new();
            map.insert("fontFamily".into(), write_field(&t.font_family, alias, write_font_family)?);
            map.insert("fontSize".into(), write_field(&t.font_size, alias, write_dimension)?);
            map.insert("fontWeight".into(), write_field(&t.font_weight, alias, write_number)?);
            map.insert("lineHeight".into(), write_field(&t.line_height, alias, write_number)?);
            map.insert("letterSpacing".into(), write_field(&t.letter_spacing, alias, write_dimension)?);
            Value::Object(map)
        }
        Literal::Transition(t) => {
            let mut map = Map::new();
            map.insert("duration".into(), write_field(&t.duration, alias, write_duration)?);
            map.insert("delay".into(), write_field(&t.delay, alias, write_duration)?);
            map.insert("timingFunction".into(), write_field(&t.timing_function, alias, write_bezier)?);
            Value::Object(map)
        }
        Literal::Gradient(stops) => {
            let mut out = Vec::with_capacity(stops.len());
            for stop in stops {
                let mut map = Map::new();
                map.insert("color".into(), write_field(&stop.color, alias, write_color)?);
                map.insert("position".into(), write_field(&stop.position, alias, write_number)?);
                out.push(Value::Object(map));
            }
            Value::Array(out)
        }
    })
}

fn write_field<T, E>(
    field: &Field<T>,
    alias: &mut AliasWriter<'_, E>,
    write: fn(&T) -> Value,
) -> Result<Value, E> {
    match field {
        Field::Alias(a) => alias(a).map(Value::String),
        Field::Value(v) => Ok(write(v)),
    }
}

fn write_number(n: &Number) -> Value {
    Value::Number(n.clone())
}

fn write_color(c: &Color) -> Value {
    let mut map = Map::new();
    map.insert("colorSpace".into(), c.color_space.as_str().into());
    map.insert("components".into(), c.components.iter().cloned().map(Value::Number).collect());
    if let Some(alpha) = &c.alpha {
        map.insert("alpha".into(), Value::Number(alpha.clone()));
    }
    if let Some(hex) = &c.hex {
        map.insert("hex".into(), hex.as_str().into());
    }
    Value::Object(map)
}

fn write_dimension(d: &Dimension) -> Value {
    let mut map = Map::new();
    map.insert("value".into(), Value::Number(d.value.clone()));
    map.insert("unit".into(), d.unit.as_str().into());
    Value::Object(map)
}

fn write_duration(d: &Duration) -> Value {
    let mut map = Map::new();
    map.insert("value".into(), Value::Number(d.value.clone()));
    map.insert("unit".into(), d.unit.as_str().into());
    Value::Object(map)
}

fn write_font_family(f: &OneOrMany<String>) -> Value {
    match f {
        OneOrMany::One(name) => name.as_str().into(),
        OneOrMany::Many(names) => names.iter().map(|n| Value::from(n.as_str())).collect(),
    }
}

fn write_bezier(b: &[Number; 4]) -> Value {
    b.iter().cloned().map(Value::Number).collect()
}

fn write_stroke<E>(s: &StrokeStyle, alias: &mut AliasWriter<'_, E>) -> Result<Value, E> {
    Ok(match s {
        StrokeStyle::Keyword(k) => k.as_str().into(),
        StrokeStyle::Dashed { dash_array, line_cap } => {
            let mut map = Map::new();
            let dashes = dash_array
                .iter()
                .map(|d| write_field(d, alias, write_dimension))
                .collect::<Result<Vec<_>, _>>()?;
            map.insert("dashArray".into(), Value::Array(dashes));
            map.insert("lineCap".into(), line_cap.as_str().into());
            Value::Object(map)
        }
    })
}

fn write_shadow<E>(s: &Shadow, alias: &mut AliasWriter<'_, E>) -> Result<Value, E> {
    let mut map = Map::new();
    map.insert("color".into(), write_field(&s.color, alias, write_color)?);
    map.insert("offsetX".into(), write_field(&s.offset_x, alias, write_dimension)?);
    map.insert("offsetY".into(), write_field(&s.offset_y, alias, write_dimension)?);
    map.insert("blur".into(), write_field(&s.blur, alias, write_dimension)?);
    if let Some(spread) = &s.spread {
        map.insert("spread".into(), write_field(spread, alias, write_dimension)?);
    }
    if let Some(inset) = s.inset {
        map.insert("inset".into(), Value::Bool(inset));
    }
    Ok(Value::Object(map))
}
