//! Layout parser
//!
//! Turns keyboard-layout-editor data into a [`Grid`]. The format is a list of
//! rows; each row is a list of tokens that are either property objects or
//! legend strings. Property objects update a running template and every
//! legend string produces one key from that template at the current cursor.
//!
//! Field scopes:
//!
//! ```text
//!  x  y              transient   added to the cursor once, for the next key
//!  x2 y2 w2 h2       transient   secondary rectangle of the next key
//!  w  h  d           row         reset to 1 x 1 / not decal at each row
//!  c  t              stream      persist until overridden
//!  a f f2 fa p ...   stream      opaque, copied onto every key
//!  r  rx ry          stream      only accepted in the first token of a row
//! ```

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::raw::parse_raw;
use super::types::{
    ColorOverrides, Grid, Key, KeyColors, KeyId, Layout, LayoutMeta, Rotation, SecondaryShape,
};
use crate::color::Rgb;
use crate::error::{Error, Result};

/// Fields copied through onto keys without interpretation
const OPAQUE_FIELDS: &[&str] = &["a", "f", "f2", "fa", "p", "g", "sm", "sb", "st", "l", "n"];

/// Parse layout text (raw data or strict JSON) with ids starting at 0.
pub fn parse(text: &str) -> Result<Layout> {
    LayoutParser::new().parse_str(text)
}

/// Layout parser configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutParser {
    first_id: u64,
}

impl LayoutParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id given to the first key produced; later keys count up from it
    pub fn first_id(mut self, id: u64) -> Self {
        self.first_id = id;
        self
    }

    /// Parse layout text
    pub fn parse_str(&self, text: &str) -> Result<Layout> {
        let entries = parse_raw(text)?;
        self.parse_entries(&entries)
    }

    /// Parse already-decoded top-level entries.
    ///
    /// All-or-nothing: the first invalid token aborts the parse.
    pub fn parse_entries(&self, entries: &[Value]) -> Result<Layout> {
        let (meta, row_entries) = match entries.split_first() {
            Some((Value::Object(obj), rest)) => (parse_meta(obj)?, rest),
            _ => (LayoutMeta::default(), entries),
        };
        let mut rows = Vec::with_capacity(row_entries.len());
        let mut state = ParseState::new(self.first_id);

        for (row_idx, entry) in row_entries.iter().enumerate() {
            let row_no = row_idx + 1;
            let Value::Array(tokens) = entry else {
                return Err(Error::malformed(
                    row_no,
                    0,
                    format!("expected a row array, found {}", json_type(entry)),
                ));
            };

            state.start_row();
            let mut row = Vec::new();
            for (token_idx, token) in tokens.iter().enumerate() {
                let token_no = token_idx + 1;
                match token {
                    Value::Object(props) => state
                        .apply_props(props, token_idx == 0)
                        .map_err(|message| Error::malformed(row_no, token_no, message))?,
                    Value::String(legend) => row.push(state.emit(legend)),
                    other => {
                        return Err(Error::malformed(
                            row_no,
                            token_no,
                            format!("expected a property object or legend string, found {}", json_type(other)),
                        ))
                    }
                }
            }
            state.end_row();
            rows.push(row);
        }

        let grid = Grid::from_rows(rows);
        log::debug!("parsed layout {:?}: {} keys", meta.name, grid.len());
        Ok(Layout { meta, grid })
    }
}

/// Running cursor and template threaded through the token stream
#[derive(Debug, Clone)]
struct ParseState {
    next_id: u64,
    x: f64,
    y: f64,

    // transient
    dx: f64,
    dy: f64,
    secondary: Option<PendingSecondary>,

    // row-scoped
    width: f64,
    height: f64,
    decal: bool,

    // stream-scoped
    rotation: Rotation,
    overrides: ColorOverrides,
    meta: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PendingSecondary {
    x: Option<f64>,
    y: Option<f64>,
    width: Option<f64>,
    height: Option<f64>,
}

impl ParseState {
    fn new(first_id: u64) -> Self {
        Self {
            next_id: first_id,
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 0.0,
            secondary: None,
            width: 1.0,
            height: 1.0,
            decal: false,
            rotation: Rotation::default(),
            overrides: ColorOverrides::default(),
            meta: BTreeMap::new(),
        }
    }

    fn start_row(&mut self) {
        self.x = self.rotation.origin_x;
        self.width = 1.0;
        self.height = 1.0;
        self.decal = false;
    }

    fn end_row(&mut self) {
        self.y += 1.0 + self.dy;
        self.dx = 0.0;
        self.dy = 0.0;
        self.secondary = None;
    }

    /// Merge a property object into the template
    fn apply_props(&mut self, props: &Map<String, Value>, row_start: bool) -> std::result::Result<(), String> {
        // Names first. A bad value further down aborts the whole parse, so a
        // half-applied template never outlives the error.
        for field in props.keys() {
            let known = matches!(
                field.as_str(),
                "x" | "y" | "w" | "h" | "x2" | "y2" | "w2" | "h2" | "c" | "t" | "d" | "r" | "rx" | "ry"
            ) || OPAQUE_FIELDS.contains(&field.as_str());
            if !known {
                return Err(format!("unknown field '{}'", field));
            }
            if matches!(field.as_str(), "r" | "rx" | "ry") && !row_start {
                return Err(format!("rotation field '{}' is only allowed at the start of a row", field));
            }
        }

        if let Some(angle) = number(props, "r")? {
            self.rotation.angle = angle;
        }
        let rx = number(props, "rx")?;
        let ry = number(props, "ry")?;
        if let Some(rx) = rx {
            self.rotation.origin_x = rx;
        }
        if let Some(ry) = ry {
            self.rotation.origin_y = ry;
        }
        if rx.is_some() || ry.is_some() {
            self.x = self.rotation.origin_x;
            self.y = self.rotation.origin_y;
        }

        if let Some(dx) = number(props, "x")? {
            self.dx += dx;
        }
        if let Some(dy) = number(props, "y")? {
            self.dy += dy;
        }
        if let Some(w) = size(props, "w")? {
            self.width = w;
        }
        if let Some(h) = size(props, "h")? {
            self.height = h;
        }

        let x2 = number(props, "x2")?;
        let y2 = number(props, "y2")?;
        let w2 = size(props, "w2")?;
        let h2 = size(props, "h2")?;
        if x2.is_some() || y2.is_some() || w2.is_some() || h2.is_some() {
            let pending = self.secondary.get_or_insert_with(PendingSecondary::default);
            pending.x = x2.or(pending.x);
            pending.y = y2.or(pending.y);
            pending.width = w2.or(pending.width);
            pending.height = h2.or(pending.height);
        }

        if let Some(c) = color(props, "c")? {
            self.overrides.keytop = Some(c);
        }
        if let Some(t) = color(props, "t")? {
            self.overrides.text = Some(t);
        }
        if let Some(d) = props.get("d") {
            self.decal = d
                .as_bool()
                .ok_or_else(|| format!("field 'd' must be a boolean, found {}", json_type(d)))?;
        }

        for field in OPAQUE_FIELDS {
            if let Some(value) = props.get(*field) {
                self.meta.insert(field.to_string(), value.clone());
            }
        }

        Ok(())
    }

    /// Produce a key for `legend` at the cursor and advance past it
    fn emit(&mut self, legend: &str) -> Key {
        self.x += self.dx;
        self.y += self.dy;
        self.dx = 0.0;
        self.dy = 0.0;

        let (primary, secondary_legend) = match legend.split_once('\n') {
            Some((primary, rest)) => (primary, rest),
            None => (legend, ""),
        };

        let secondary = self.secondary.take().map(|s| SecondaryShape {
            x: s.x.unwrap_or(0.0),
            y: s.y.unwrap_or(0.0),
            width: s.width.unwrap_or(self.width),
            height: s.height.unwrap_or(self.height),
        });

        let key = Key {
            id: KeyId(self.next_id),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            rotation: self.rotation,
            legend: primary.to_string(),
            sublegend: secondary_legend.to_string(),
            overrides: self.overrides,
            decal: self.decal,
            secondary,
            meta: self.meta.clone(),
            colors: KeyColors::default(),
            pressed: false,
        };

        self.next_id += 1;
        self.x += self.width;
        key
    }
}

fn parse_meta(obj: &Map<String, Value>) -> Result<LayoutMeta> {
    let text = |field: &str| -> Result<Option<String>> {
        match obj.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::malformed(
                0,
                0,
                format!("metadata field '{}' must be a string, found {}", field, json_type(other)),
            )),
        }
    };

    let background = text("backcolor")?
        .map(|c| Rgb::parse(&c))
        .transpose()
        .map_err(|e| Error::malformed(0, 0, e.to_string()))?;

    let extra = obj
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "name" | "author" | "backcolor" | "notes"))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(LayoutMeta {
        name: text("name")?,
        author: text("author")?,
        background,
        notes: text("notes")?,
        extra,
    })
}

fn number(props: &Map<String, Value>, field: &str) -> std::result::Result<Option<f64>, String> {
    match props.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("field '{}' must be a number, found {}", field, json_type(value))),
    }
}

fn size(props: &Map<String, Value>, field: &str) -> std::result::Result<Option<f64>, String> {
    match number(props, field)? {
        Some(v) if v < 0.0 => Err(format!("field '{}' must not be negative, got {}", field, v)),
        other => Ok(other),
    }
}

fn color(props: &Map<String, Value>, field: &str) -> std::result::Result<Option<Rgb>, String> {
    match props.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => {
            // `t` may hold one color per legend line; the first applies to the primary legend
            let first = s.split('\n').next().unwrap_or_default();
            Rgb::parse(first).map(Some).map_err(|e| e.to_string())
        }
        Some(other) => Err(format!("field '{}' must be a color string, found {}", field, json_type(other))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
