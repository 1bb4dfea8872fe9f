use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_BOX_SIZE: f64 = 100.0;
pub const DEFAULT_RADIUS: f64 = 50.0;
pub const DEFAULT_HEIGHT: f64 = 100.0;
pub const DEFAULT_TUBE: f64 = 10.0;
pub const DEFAULT_PLANE_SIZE: f64 = 100.0;

/// Offset in millimeters, always relative to the parent component.
///
/// Missing or non-numeric coordinates read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    #[serde(default, deserialize_with = "number_or_zero")]
    pub x: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub y: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Euler angles in degrees. Absent or non-numeric angles are treated as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub yaw: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub roll: Option<f64>,
}

impl Rotation {
    /// Pitch, yaw and roll converted to radians, in that order.
    pub fn radians(&self) -> [f64; 3] {
        [
            self.pitch.unwrap_or(0.0).to_radians(),
            self.yaw.unwrap_or(0.0).to_radians(),
            self.roll.unwrap_or(0.0).to_radians(),
        ]
    }

    pub fn is_identity(&self) -> bool {
        self.radians().iter().all(|angle| *angle == 0.0)
    }
}

/// Primitive shape tag. Unrecognized strings are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrimitiveKind {
    Box,
    Cylinder,
    Sphere,
    Plane,
    Cone,
    Torus,
    Other(String),
}

impl PrimitiveKind {
    /// Placeholder for a component that declared no usable type.
    pub fn unknown() -> Self {
        PrimitiveKind::Other(String::new())
    }

    pub fn as_str(&self) -> &str {
        match self {
            PrimitiveKind::Box => "box",
            PrimitiveKind::Cylinder => "cylinder",
            PrimitiveKind::Sphere => "sphere",
            PrimitiveKind::Plane => "plane",
            PrimitiveKind::Cone => "cone",
            PrimitiveKind::Torus => "torus",
            PrimitiveKind::Other(name) => name,
        }
    }

    /// Dimension keys the validator insists on for this kind.
    pub fn required_dimensions(&self) -> &'static [&'static str] {
        match self {
            PrimitiveKind::Box => &["length", "width", "height"],
            PrimitiveKind::Cylinder => &["radius", "height"],
            PrimitiveKind::Sphere => &["radius"],
            _ => &[],
        }
    }
}

impl From<String> for PrimitiveKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "box" => PrimitiveKind::Box,
            "cylinder" => PrimitiveKind::Cylinder,
            "sphere" => PrimitiveKind::Sphere,
            "plane" => PrimitiveKind::Plane,
            "cone" => PrimitiveKind::Cone,
            "torus" => PrimitiveKind::Torus,
            _ => PrimitiveKind::Other(value),
        }
    }
}

impl From<PrimitiveKind> for String {
    fn from(value: PrimitiveKind) -> Self {
        match value {
            PrimitiveKind::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric dimensions keyed by name, in the order they were declared.
///
/// Non-numeric entries in the incoming JSON are dropped on ingestion, so every
/// stored value is a number (possibly non-positive; the validator reports those).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dimensions(IndexMap<String, f64>);

impl Dimensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(key.into(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn length(&self) -> Option<f64> {
        self.get("length")
    }

    pub fn width(&self) -> Option<f64> {
        self.get("width")
    }

    pub fn height(&self) -> Option<f64> {
        self.get("height")
    }

    pub fn radius(&self) -> Option<f64> {
        self.get("radius")
    }

    pub fn depth(&self) -> Option<f64> {
        self.get("depth")
    }

    /// Torus tube radius; older recipes carry it under `depth`.
    pub fn tube(&self) -> Option<f64> {
        self.get("tube").or_else(|| self.depth())
    }
}

impl<'de> Deserialize<'de> for Dimensions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let numeric = match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Object(entries)) => entries
                .into_iter()
                .filter_map(|(key, value)| value.as_f64().map(|number| (key, number)))
                .collect(),
            _ => IndexMap::new(),
        };
        Ok(Self(numeric))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for Dimensions {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

/// Coarse material class used for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Metal,
    Plastic,
    Glass,
    Rubber,
    Wood,
}

impl MaterialKind {
    /// Classifies a free-text material tag; anything unrecognized is plastic.
    pub fn classify(tag: Option<&str>) -> Self {
        match tag.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("metal") => MaterialKind::Metal,
            Some("glass") => MaterialKind::Glass,
            Some("rubber") => MaterialKind::Rubber,
            Some("wood") => MaterialKind::Wood,
            _ => MaterialKind::Plastic,
        }
    }
}

/// One primitive part of a recipe.
///
/// Ingestion never rejects a component object: a missing or non-string `type`
/// becomes `Other("")`, a numeric id is kept as its decimal text and any other
/// id becomes empty, and optional fields of the wrong shape are dropped. The
/// validator reports what matters and the builder substitutes defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(default, deserialize_with = "id_text")]
    pub id: String,
    #[serde(rename = "type", default = "PrimitiveKind::unknown", deserialize_with = "primitive_kind")]
    pub kind: PrimitiveKind,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub relative_position: Option<Vec3>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Rotation>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            id: id.into(),
            kind,
            parent: None,
            dimensions: Dimensions::new(),
            relative_position: None,
            rotation: None,
            material: None,
            label: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_dimension(mut self, key: impl Into<String>, value: f64) -> Self {
        self.dimensions.insert(key, value);
        self
    }

    pub fn with_position(mut self, x: f64, y: f64, z: f64) -> Self {
        self.relative_position = Some(Vec3::new(x, y, z));
        self
    }

    pub fn with_rotation(mut self, pitch: f64, yaw: f64, roll: f64) -> Self {
        self.rotation = Some(Rotation {
            pitch: Some(pitch),
            yaw: Some(yaw),
            roll: Some(roll),
        });
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parent id, ignoring empty strings.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref().filter(|parent| !parent.is_empty())
    }

    pub fn position(&self) -> Vec3 {
        self.relative_position.unwrap_or_default()
    }

    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.id)
    }

    /// Resolves the shape using only declared values.
    ///
    /// Fails when the kind is unknown or a required dimension is absent.
    /// Optional fields of cones, tori and planes still take their defaults.
    pub fn primitive(&self) -> Result<Primitive, PrimitiveError> {
        Primitive::resolve_strict(&self.kind, &self.dimensions)
    }

    /// Resolves the shape the way the builder draws it, substituting defaults
    /// for anything missing or non-positive.
    pub fn primitive_or_default(&self) -> Primitive {
        Primitive::resolve(&self.kind, &self.dimensions)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrimitiveError {
    #[error("unknown primitive type \"{0}\"")]
    UnknownKind(String),
    #[error("{kind} is missing required dimensions: {}", .missing.join(", "))]
    MissingDimensions {
        kind: PrimitiveKind,
        missing: Vec<&'static str>,
    },
}

/// Concrete shape with every dimension filled in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Box { length: f64, width: f64, height: f64 },
    Cylinder { radius: f64, height: f64 },
    Sphere { radius: f64 },
    Cone { radius: f64, height: f64 },
    Torus { radius: f64, tube: f64 },
    Plane { width: f64, height: f64 },
}

impl Primitive {
    /// Resolves a kind from declared values only. Required keys must be
    /// present; their values are taken as is, even when non-positive.
    pub fn resolve_strict(
        kind: &PrimitiveKind,
        dimensions: &Dimensions,
    ) -> Result<Self, PrimitiveError> {
        let missing = kind
            .required_dimensions()
            .iter()
            .filter(|key| dimensions.get(key).is_none())
            .copied()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(PrimitiveError::MissingDimensions {
                kind: kind.clone(),
                missing,
            });
        }

        let declared = |value: Option<f64>, default: f64| value.unwrap_or(default);
        Ok(match kind {
            PrimitiveKind::Box => Primitive::Box {
                length: declared(dimensions.length(), DEFAULT_BOX_SIZE),
                width: declared(dimensions.width(), DEFAULT_BOX_SIZE),
                height: declared(dimensions.height(), DEFAULT_BOX_SIZE),
            },
            PrimitiveKind::Cylinder => Primitive::Cylinder {
                radius: declared(dimensions.radius(), DEFAULT_RADIUS),
                height: declared(dimensions.height(), DEFAULT_HEIGHT),
            },
            PrimitiveKind::Sphere => Primitive::Sphere {
                radius: declared(dimensions.radius(), DEFAULT_RADIUS),
            },
            PrimitiveKind::Cone => Primitive::Cone {
                radius: declared(dimensions.radius(), DEFAULT_RADIUS),
                height: declared(dimensions.height(), DEFAULT_HEIGHT),
            },
            PrimitiveKind::Torus => Primitive::Torus {
                radius: declared(dimensions.radius(), DEFAULT_RADIUS),
                tube: declared(dimensions.tube(), DEFAULT_TUBE),
            },
            PrimitiveKind::Plane => Primitive::Plane {
                width: declared(dimensions.width(), DEFAULT_PLANE_SIZE),
                height: declared(dimensions.height(), DEFAULT_PLANE_SIZE),
            },
            PrimitiveKind::Other(name) => return Err(PrimitiveError::UnknownKind(name.clone())),
        })
    }

    /// Resolves a kind and its dimensions, substituting defaults for anything
    /// missing or non-positive. Unknown kinds become a default box.
    pub fn resolve(kind: &PrimitiveKind, dimensions: &Dimensions) -> Self {
        let pick = |value: Option<f64>, default: f64| {
            value
                .filter(|value| value.is_finite() && *value > 0.0)
                .unwrap_or(default)
        };

        match kind {
            PrimitiveKind::Box => Primitive::Box {
                length: pick(dimensions.length(), DEFAULT_BOX_SIZE),
                width: pick(dimensions.width(), DEFAULT_BOX_SIZE),
                height: pick(dimensions.height(), DEFAULT_BOX_SIZE),
            },
            PrimitiveKind::Cylinder => Primitive::Cylinder {
                radius: pick(dimensions.radius(), DEFAULT_RADIUS),
                height: pick(dimensions.height(), DEFAULT_HEIGHT),
            },
            PrimitiveKind::Sphere => Primitive::Sphere {
                radius: pick(dimensions.radius(), DEFAULT_RADIUS),
            },
            PrimitiveKind::Cone => Primitive::Cone {
                radius: pick(dimensions.radius(), DEFAULT_RADIUS),
                height: pick(dimensions.height(), DEFAULT_HEIGHT),
            },
            PrimitiveKind::Torus => Primitive::Torus {
                radius: pick(dimensions.radius(), DEFAULT_RADIUS),
                tube: pick(dimensions.tube(), DEFAULT_TUBE),
            },
            PrimitiveKind::Plane => Primitive::Plane {
                width: pick(dimensions.width(), DEFAULT_PLANE_SIZE),
                height: pick(dimensions.height(), DEFAULT_PLANE_SIZE),
            },
            PrimitiveKind::Other(_) => Primitive::Box {
                length: DEFAULT_BOX_SIZE,
                width: DEFAULT_BOX_SIZE,
                height: DEFAULT_BOX_SIZE,
            },
        }
    }
}

/// Deserializes any JSON value, keeping it only if it has the expected shape.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::<D, f64>(deserializer)?.unwrap_or(0.0))
}

/// Reads an identifier, keeping numbers as their decimal text. Anything else
/// becomes empty.
pub(crate) fn id_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(id)) => id,
        Some(Value::Number(number)) => number.to_string(),
        _ => String::new(),
    })
}

fn primitive_kind<'de, D>(deserializer: D) -> Result<PrimitiveKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(name)) => PrimitiveKind::from(name),
        _ => PrimitiveKind::unknown(),
    })
}
