//! The type algebra of the shading language.
//!
//! Types display in their WGSL spelling, which is also how they appear in
//! diagnostics and generated code.

use crate::ast::{TypeArg, TypeExpr};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    F32,
    F16,
    I32,
    U32,
    Bool,
}

impl Primitive {
    pub fn as_str(&self) -> &'static str {
        match self {
            Primitive::F32 => "f32",
            Primitive::F16 => "f16",
            Primitive::I32 => "i32",
            Primitive::U32 => "u32",
            Primitive::Bool => "bool",
        }
    }

    pub fn from_name(name: &str) -> Option<Primitive> {
        match name {
            "f32" => Some(Primitive::F32),
            "f16" => Some(Primitive::F16),
            "i32" => Some(Primitive::I32),
            "u32" => Some(Primitive::U32),
            "bool" => Some(Primitive::Bool),
            _ => None,
        }
    }

    fn from_suffix(c: char) -> Option<Primitive> {
        match c {
            'f' => Some(Primitive::F32),
            'h' => Some(Primitive::F16),
            'i' => Some(Primitive::I32),
            'u' => Some(Primitive::U32),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, Primitive::Bool)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D2Array,
    D3,
    Cube,
    Depth2d,
}

impl TextureDimension {
    fn type_name(&self) -> &'static str {
        match self {
            TextureDimension::D1 => "texture_1d",
            TextureDimension::D2 => "texture_2d",
            TextureDimension::D2Array => "texture_2d_array",
            TextureDimension::D3 => "texture_3d",
            TextureDimension::Cube => "texture_cube",
            TextureDimension::Depth2d => "texture_depth_2d",
        }
    }

    fn from_type_name(name: &str) -> Option<TextureDimension> {
        match name {
            "texture_1d" => Some(TextureDimension::D1),
            "texture_2d" => Some(TextureDimension::D2),
            "texture_2d_array" => Some(TextureDimension::D2Array),
            "texture_3d" => Some(TextureDimension::D3),
            "texture_cube" => Some(TextureDimension::Cube),
            "texture_depth_2d" => Some(TextureDimension::Depth2d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(Primitive),
    /// `size` is 2, 3 or 4.
    Vector { size: u8, element: Primitive },
    /// `matCxR`: `cols` columns of `rows`-component vectors; both in 2..=4.
    Matrix { rows: u8, cols: u8, element: Primitive },
    /// `size` is `None` for runtime-sized arrays.
    Array { element: Box<Type>, size: Option<u32> },
    /// Fields in declared order.
    Struct { name: String, fields: Vec<(String, Type)> },
    Sampler { comparison: bool },
    Texture { dimension: TextureDimension, sample_type: Primitive },
}

impl Type {
    pub fn f32() -> Type {
        Type::Primitive(Primitive::F32)
    }

    pub fn bool() -> Type {
        Type::Primitive(Primitive::Bool)
    }

    pub fn vec(size: u8, element: Primitive) -> Type {
        Type::Vector { size, element }
    }

    pub fn mat(cols: u8, rows: u8, element: Primitive) -> Type {
        Type::Matrix { rows, cols, element }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector { .. })
    }

    pub fn is_numeric_scalar(&self) -> bool {
        matches!(self, Type::Primitive(p) if p.is_numeric())
    }

    /// Scalar element type of a scalar, vector or matrix.
    pub fn element(&self) -> Option<Primitive> {
        match self {
            Type::Primitive(p) => Some(*p),
            Type::Vector { element, .. } | Type::Matrix { element, .. } => Some(*element),
            _ => None,
        }
    }

    /// Whether arithmetic is defined on values of this type.
    pub fn is_numeric(&self) -> bool {
        self.element().map(|p| p.is_numeric()).unwrap_or(false)
    }

    /// Number of scalar components a value contributes to a vector constructor.
    pub fn component_count(&self) -> Option<u32> {
        match self {
            Type::Primitive(_) => Some(1),
            Type::Vector { size, .. } => Some(*size as u32),
            _ => None,
        }
    }

    /// Same shape as `self` with a different scalar element.
    pub fn with_element(&self, element: Primitive) -> Type {
        match self {
            Type::Vector { size, .. } => Type::Vector { size: *size, element },
            Type::Matrix { rows, cols, .. } => Type::Matrix {
                rows: *rows,
                cols: *cols,
                element,
            },
            _ => Type::Primitive(element),
        }
    }

    pub fn struct_field(&self, field: &str) -> Option<&Type> {
        match self {
            Type::Struct { fields, .. } => fields.iter().find(|(n, _)| n == field).map(|(_, t)| t),
            _ => None,
        }
    }

    /// Bindings of these types are opaque handles rather than uniform buffers.
    pub fn is_handle(&self) -> bool {
        matches!(self, Type::Sampler { .. } | Type::Texture { .. })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(p) => f.write_str(p.as_str()),
            Type::Vector { size, element } => write!(f, "vec{}<{}>", size, element.as_str()),
            Type::Matrix { rows, cols, element } => {
                write!(f, "mat{}x{}<{}>", cols, rows, element.as_str())
            }
            Type::Array { element, size: Some(n) } => write!(f, "array<{}, {}>", element, n),
            Type::Array { element, size: None } => write!(f, "array<{}>", element),
            Type::Struct { name, .. } => f.write_str(name),
            Type::Sampler { comparison: false } => f.write_str("sampler"),
            Type::Sampler { comparison: true } => f.write_str("sampler_comparison"),
            Type::Texture {
                dimension: TextureDimension::Depth2d,
                ..
            } => f.write_str("texture_depth_2d"),
            Type::Texture { dimension, sample_type } => {
                write!(f, "{}<{}>", dimension.type_name(), sample_type.as_str())
            }
        }
    }
}

/// Every builtin type name the resolver recognizes, used for suggestions.
pub const BUILTIN_TYPE_NAMES: &[&str] = &[
    "f32", "f16", "i32", "u32", "bool", "vec2", "vec3", "vec4", "vec2f", "vec3f", "vec4f", "vec2i",
    "vec3i", "vec4i", "vec2u", "vec3u", "vec4u", "vec2h", "vec3h", "vec4h", "mat2", "mat3", "mat4",
    "mat2x2", "mat2x3", "mat2x4", "mat3x2", "mat3x3", "mat3x4", "mat4x2", "mat4x3", "mat4x4", "array",
    "sampler", "sampler_comparison", "texture_1d", "texture_2d", "texture_2d_array", "texture_3d",
    "texture_cube", "texture_depth_2d",
];

/// Shape named by a vector or matrix type/constructor name, before any
/// element type argument is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeName {
    Vector { size: u8, element: Option<Primitive> },
    Matrix { cols: u8, rows: u8, element: Option<Primitive> },
}

fn dim(c: u8) -> Option<u8> {
    match c {
        b'2' => Some(2),
        b'3' => Some(3),
        b'4' => Some(4),
        _ => None,
    }
}

/// Parse `vecN`, `vecNf`, `matN`, `matCxR`, `matCxRh` and friends.
pub fn parse_shape_name(name: &str) -> Option<ShapeName> {
    let bytes = name.as_bytes();
    let suffix = |rest: &[u8]| -> Option<Option<Primitive>> {
        match rest {
            [] => Some(None),
            [c] => Primitive::from_suffix(*c as char).map(Some),
            _ => None,
        }
    };
    if let Some(rest) = name.strip_prefix("vec") {
        let rest = rest.as_bytes();
        let size = dim(*rest.first()?)?;
        let element = suffix(&rest[1..])?;
        return Some(ShapeName::Vector { size, element });
    }
    if bytes.starts_with(b"mat") {
        let rest = &bytes[3..];
        let cols = dim(*rest.first()?)?;
        if rest.get(1) == Some(&b'x') {
            let rows = dim(*rest.get(2)?)?;
            let element = suffix(&rest[3..])?;
            return Some(ShapeName::Matrix { cols, rows, element });
        }
        let element = suffix(&rest[1..])?;
        return Some(ShapeName::Matrix {
            cols,
            rows: cols,
            element,
        });
    }
    None
}

impl ShapeName {
    pub fn with_element(self, element: Primitive) -> Type {
        match self {
            ShapeName::Vector { size, .. } => Type::Vector { size, element },
            ShapeName::Matrix { cols, rows, .. } => Type::Matrix { rows, cols, element },
        }
    }

    pub fn default_element(&self) -> Primitive {
        match self {
            ShapeName::Vector { element, .. } | ShapeName::Matrix { element, .. } => {
                element.unwrap_or(Primitive::F32)
            }
        }
    }
}

/// Resolve a builtin type spelling.
///
/// `Ok(None)` means the name is not a builtin type (a struct reference or an
/// unknown name, left to the caller); `Err` means a builtin name with
/// malformed arguments. `resolve_named` resolves nested non-builtin names.
pub fn resolve_builtin<F>(ty: &TypeExpr, resolve_named: &mut F) -> Result<Option<Type>, String>
where
    F: FnMut(&TypeExpr) -> Option<Type>,
{
    let resolve_arg = |arg: &TypeArg, resolve_named: &mut F| -> Result<Type, String> {
        match arg {
            TypeArg::Type(t) => match resolve_builtin(t, resolve_named)? {
                Some(resolved) => Ok(resolved),
                None => resolve_named(t).ok_or_else(|| format!("unknown type `{}`", t)),
            },
            TypeArg::Size(n) => Err(format!("expected a type, found `{}`", n)),
        }
    };

    if let Some(p) = Primitive::from_name(&ty.name) {
        if !ty.args.is_empty() {
            return Err(format!("`{}` takes no type arguments", ty.name));
        }
        return Ok(Some(Type::Primitive(p)));
    }

    if let Some(shape) = parse_shape_name(&ty.name) {
        let element = match ty.args.as_slice() {
            [] => shape.default_element(),
            [arg] => match resolve_arg(arg, resolve_named)? {
                Type::Primitive(p) if !matches!(shape, ShapeName::Matrix { .. }) || p.is_float() => p,
                other => return Err(format!("`{}` is not a valid element type for `{}`", other, ty.name)),
            },
            _ => return Err(format!("`{}` takes a single element type", ty.name)),
        };
        return Ok(Some(shape.with_element(element)));
    }

    match ty.name.as_str() {
        "array" => {
            let (element, size) = match ty.args.as_slice() {
                [elem] => (resolve_arg(elem, resolve_named)?, None),
                [elem, TypeArg::Size(n)] if *n > 0 => (resolve_arg(elem, resolve_named)?, Some(*n)),
                _ => return Err("`array` expects `array<T>` or `array<T, N>` with N > 0".to_string()),
            };
            Ok(Some(Type::Array {
                element: Box::new(element),
                size,
            }))
        }
        "sampler" => Ok(Some(Type::Sampler { comparison: false })),
        "sampler_comparison" => Ok(Some(Type::Sampler { comparison: true })),
        "texture_depth_2d" => Ok(Some(Type::Texture {
            dimension: TextureDimension::Depth2d,
            sample_type: Primitive::F32,
        })),
        name => match TextureDimension::from_type_name(name) {
            Some(dimension) => {
                let sample_type = match ty.args.as_slice() {
                    [] => Primitive::F32,
                    [arg] => match resolve_arg(arg, resolve_named)? {
                        Type::Primitive(p) if p != Primitive::Bool => p,
                        other => return Err(format!("`{}` is not a valid texture sample type", other)),
                    },
                    _ => return Err(format!("`{}` takes a single sample type", name)),
                };
                Ok(Some(Type::Texture { dimension, sample_type }))
            }
            None => Ok(None),
        },
    }
}
