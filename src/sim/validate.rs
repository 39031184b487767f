//! Level definition validation
//!
//! Level data comes from an external, semi-trusted provider as JSON:
//!
//! ```json
//! {
//!   "name": "First Steps",          // optional
//!   "difficulty": "Easy",           // optional
//!   "walls":   [[x, y, z], ...],
//!   "boxes":   [[x, y, z], ...],    // at least one
//!   "targets": [[x, y, z], ...],    // at least one
//!   "spawn":   [x, y, z]
//! }
//! ```
//!
//! Validation fails closed: the first violation rejects the whole level.
//! Cell coordinates must be integral; their `y` component is dropped since
//! height is a rendering concern. A box/target count mismatch only warns.

use std::collections::HashSet;
use std::fmt;

use glam::Vec3;
use serde_json::{Value, json};
use thiserror::Error;

use super::grid::{GridPos, cell};
use crate::config::WorldConfig;

pub const FIELD_WALLS: &str = "walls";
pub const FIELD_BOXES: &str = "boxes";
pub const FIELD_TARGETS: &str = "targets";
pub const FIELD_SPAWN: &str = "spawn";

/// Where in the definition a problem was found, e.g. `boxes[2]` or `spawn`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    pub field: &'static str,
    pub index: Option<usize>,
}

impl Site {
    fn entry(field: &'static str, index: usize) -> Self {
        Self {
            field,
            index: Some(index),
        }
    }

    fn field(field: &'static str) -> Self {
        Self { field, index: None }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}[{}]", self.field, i),
            None => write!(f, "{}", self.field),
        }
    }
}

/// Why a level definition was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("level definition must be an object, got {found}")]
    NotAnObject { found: &'static str },
    #[error("required field '{field}' is missing")]
    MissingField { field: &'static str },
    #[error("'{field}' must be a list, got {found}")]
    NotAList {
        field: &'static str,
        found: &'static str,
    },
    #[error("'{field}' must contain at least one entry")]
    Empty { field: &'static str },
    #[error("{site} must be an (x, y, z) triple, got {value}")]
    BadArity { site: Site, value: String },
    #[error("{site} has non-numeric coordinates: {value}")]
    NonNumeric { site: Site, value: String },
    #[error("{site} has non-integral grid coordinates: {value}")]
    NotIntegral { site: Site, value: String },
    #[error("{site} is outside the world boundary (|x|, |z| < {limit}): {value}")]
    OutOfBounds {
        site: Site,
        value: String,
        limit: i32,
    },
    #[error("{site} is inside a wall at ({}, {})", .cell.x, .cell.z)]
    InsideWall { site: Site, cell: GridPos },
    #[error("{site} overlaps another box at ({}, {})", .cell.x, .cell.z)]
    DuplicateBox { site: Site, cell: GridPos },
    #[error("'{field}' must be a string, got {found}")]
    BadMetadata {
        field: &'static str,
        found: &'static str,
    },
}

/// A level definition that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLevel {
    pub walls: Vec<GridPos>,
    pub boxes: Vec<GridPos>,
    pub targets: Vec<GridPos>,
    pub spawn: Vec3,
    pub name: Option<String>,
    pub difficulty: Option<String>,
}

impl ValidatedLevel {
    /// True if the box and target counts differ (allowed, but unwinnable)
    pub fn has_count_mismatch(&self) -> bool {
        self.boxes.len() != self.targets.len()
    }

    /// Serialize back into the raw definition format
    pub fn to_value(&self) -> Value {
        let cells = |cells: &[GridPos]| -> Vec<[i32; 3]> {
            cells.iter().map(|c| [c.x, c.y, c.z]).collect()
        };
        let mut value = json!({
            FIELD_WALLS: cells(&self.walls),
            FIELD_BOXES: cells(&self.boxes),
            FIELD_TARGETS: cells(&self.targets),
            FIELD_SPAWN: [self.spawn.x, self.spawn.y, self.spawn.z],
        });
        if let Some(map) = value.as_object_mut() {
            if let Some(name) = &self.name {
                map.insert("name".into(), json!(name));
            }
            if let Some(difficulty) = &self.difficulty {
                map.insert("difficulty".into(), json!(difficulty));
            }
        }
        value
    }
}

/// JSON type name for error messages
fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Parse an `[x, y, z]` triple of numbers
fn triple(value: &Value, site: Site) -> Result<[f64; 3], ValidationError> {
    let items = match value.as_array() {
        Some(items) if items.len() == 3 => items,
        _ => {
            return Err(ValidationError::BadArity {
                site,
                value: value.to_string(),
            });
        }
    };

    let mut out = [0.0; 3];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ValidationError::NonNumeric {
                site,
                value: value.to_string(),
            })?;
    }
    Ok(out)
}

fn check_bounds(
    [x, _, z]: [f64; 3],
    value: &Value,
    site: Site,
    world: &WorldConfig,
) -> Result<(), ValidationError> {
    let limit = f64::from(world.boundary_limit);
    if x.abs() >= limit || z.abs() >= limit {
        return Err(ValidationError::OutOfBounds {
            site,
            value: value.to_string(),
            limit: world.boundary_limit,
        });
    }
    Ok(())
}

fn parse_cell(value: &Value, site: Site, world: &WorldConfig) -> Result<GridPos, ValidationError> {
    let coords = triple(value, site)?;
    check_bounds(coords, value, site, world)?;
    let [x, _, z] = coords;
    if x.fract() != 0.0 || z.fract() != 0.0 {
        return Err(ValidationError::NotIntegral {
            site,
            value: value.to_string(),
        });
    }
    // In bounds, so the casts cannot truncate
    Ok(cell(x as i32, z as i32))
}

fn list<'a>(
    map: &'a serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<&'a [Value], ValidationError> {
    let value = map.get(field).ok_or(ValidationError::MissingField { field })?;
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or(ValidationError::NotAList {
            field,
            found: kind(value),
        })
}

fn metadata(
    map: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ValidationError::BadMetadata {
            field,
            found: kind(other),
        }),
    }
}

/// Validate a raw level definition against the world boundary
pub fn validate(raw: &Value, world: &WorldConfig) -> Result<ValidatedLevel, ValidationError> {
    let map = raw
        .as_object()
        .ok_or(ValidationError::NotAnObject { found: kind(raw) })?;

    for field in [FIELD_WALLS, FIELD_BOXES, FIELD_TARGETS, FIELD_SPAWN] {
        if !map.contains_key(field) {
            return Err(ValidationError::MissingField { field });
        }
    }

    // Walls
    let mut walls = Vec::new();
    for (i, value) in list(map, FIELD_WALLS)?.iter().enumerate() {
        walls.push(parse_cell(value, Site::entry(FIELD_WALLS, i), world)?);
    }
    let wall_set: HashSet<GridPos> = walls.iter().copied().collect();

    // Boxes
    let raw_boxes = list(map, FIELD_BOXES)?;
    if raw_boxes.is_empty() {
        return Err(ValidationError::Empty { field: FIELD_BOXES });
    }
    let mut boxes: Vec<GridPos> = Vec::with_capacity(raw_boxes.len());
    for (i, value) in raw_boxes.iter().enumerate() {
        let site = Site::entry(FIELD_BOXES, i);
        let pos = parse_cell(value, site, world)?;
        if wall_set.contains(&pos) {
            return Err(ValidationError::InsideWall { site, cell: pos });
        }
        if boxes.contains(&pos) {
            return Err(ValidationError::DuplicateBox { site, cell: pos });
        }
        boxes.push(pos);
    }

    // Targets
    let raw_targets = list(map, FIELD_TARGETS)?;
    if raw_targets.is_empty() {
        return Err(ValidationError::Empty {
            field: FIELD_TARGETS,
        });
    }
    let mut targets = Vec::with_capacity(raw_targets.len());
    for (i, value) in raw_targets.iter().enumerate() {
        let site = Site::entry(FIELD_TARGETS, i);
        let pos = parse_cell(value, site, world)?;
        if wall_set.contains(&pos) {
            return Err(ValidationError::InsideWall { site, cell: pos });
        }
        targets.push(pos);
    }

    // Spawn (continuous)
    let raw_spawn = &map[FIELD_SPAWN];
    let site = Site::field(FIELD_SPAWN);
    let coords = triple(raw_spawn, site)?;
    check_bounds(coords, raw_spawn, site, world)?;
    let spawn = Vec3::new(coords[0] as f32, coords[1] as f32, coords[2] as f32);

    let name = metadata(map, "name")?;
    let difficulty = metadata(map, "difficulty")?;

    let level = ValidatedLevel {
        walls,
        boxes,
        targets,
        spawn,
        name,
        difficulty,
    };

    if level.has_count_mismatch() {
        log::warn!(
            "Box count ({}) differs from target count ({})",
            level.boxes.len(),
            level.targets.len()
        );
    }

    Ok(level)
}
