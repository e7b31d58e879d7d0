//! The closed set of builtin functions and their shape-transfer rules.

use crate::types::{Primitive, TextureDimension, Type};
use std::fmt;
use std::ops::RangeInclusive;

macro_rules! builtins {
    ($($variant:ident => $name:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Builtin {
            $($variant),*
        }

        impl Builtin {
            pub const ALL: &'static [Builtin] = &[$(Builtin::$variant),*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Builtin::$variant => $name),*
                }
            }

            pub fn from_name(name: &str) -> Option<Builtin> {
                match name {
                    $($name => Some(Builtin::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

builtins! {
    Sin => "sin", Cos => "cos", Tan => "tan", Asin => "asin", Acos => "acos", Atan => "atan",
    Sinh => "sinh", Cosh => "cosh", Tanh => "tanh", Exp => "exp", Exp2 => "exp2", Log => "log",
    Log2 => "log2", Sqrt => "sqrt", InverseSqrt => "inverseSqrt", Abs => "abs", Sign => "sign",
    Floor => "floor", Ceil => "ceil", Round => "round", Fract => "fract", Trunc => "trunc",
    Saturate => "saturate", Radians => "radians", Degrees => "degrees", Dpdx => "dpdx",
    Dpdy => "dpdy", Fwidth => "fwidth",
    Min => "min", Max => "max", Pow => "pow", Step => "step", Atan2 => "atan2",
    Clamp => "clamp", Mix => "mix", Fma => "fma", Smoothstep => "smoothstep", Select => "select",
    Length => "length", Distance => "distance", Dot => "dot", Determinant => "determinant",
    Cross => "cross", Normalize => "normalize", Reflect => "reflect", Refract => "refract",
    FaceForward => "faceForward", Transpose => "transpose", Any => "any", All => "all",
    TextureSample => "textureSample", TextureSampleLevel => "textureSampleLevel",
    TextureSampleBias => "textureSampleBias", TextureSampleGrad => "textureSampleGrad",
    TextureLoad => "textureLoad", TextureDimensions => "textureDimensions",
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a builtin's result type follows from its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// N arguments of one float (or, with `integers`, numeric) scalar/vector type; returns that type.
    ComponentWise { arity: usize, integers: bool },
    /// `mix`: like a float ternary, but the blend factor may be a scalar.
    Mix,
    /// `smoothstep(low, high, x)`: the shape of `x`.
    Smoothstep,
    /// `select(f, t, cond)`.
    Select,
    /// Reduces float vectors to their element scalar.
    Reduce { arity: usize },
    Determinant,
    Cross,
    /// Float vector in, same vector out.
    VectorPreserving { arity: usize, scalar_last: bool },
    Transpose,
    /// `any`/`all`: boolean scalar or vector to `bool`.
    BoolReduce,
    TextureSample { arity: RangeInclusive<usize>, sampler: bool },
    TextureDimensions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinError {
    ArgumentCount { expected: RangeInclusive<usize>, found: usize },
    InvalidArgument(String),
}

impl fmt::Display for BuiltinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinError::ArgumentCount { expected, found } if expected.start() == expected.end() => {
                write!(f, "expected {} argument(s), found {}", expected.start(), found)
            }
            BuiltinError::ArgumentCount { expected, found } => {
                write!(f, "expected {} to {} arguments, found {}", expected.start(), expected.end(), found)
            }
            BuiltinError::InvalidArgument(message) => f.write_str(message),
        }
    }
}

impl Builtin {
    pub fn shape(&self) -> Shape {
        use Builtin::*;
        match self {
            Abs | Sign => Shape::ComponentWise { arity: 1, integers: true },
            Sin | Cos | Tan | Asin | Acos | Atan | Sinh | Cosh | Tanh | Exp | Exp2 | Log | Log2 | Sqrt
            | InverseSqrt | Floor | Ceil | Round | Fract | Trunc | Saturate | Radians | Degrees | Dpdx
            | Dpdy | Fwidth => Shape::ComponentWise { arity: 1, integers: false },
            Min | Max => Shape::ComponentWise { arity: 2, integers: true },
            Pow | Step | Atan2 => Shape::ComponentWise { arity: 2, integers: false },
            Clamp => Shape::ComponentWise { arity: 3, integers: true },
            Fma => Shape::ComponentWise { arity: 3, integers: false },
            Mix => Shape::Mix,
            Smoothstep => Shape::Smoothstep,
            Select => Shape::Select,
            Length => Shape::Reduce { arity: 1 },
            Distance | Dot => Shape::Reduce { arity: 2 },
            Determinant => Shape::Determinant,
            Cross => Shape::Cross,
            Normalize => Shape::VectorPreserving { arity: 1, scalar_last: false },
            Reflect => Shape::VectorPreserving { arity: 2, scalar_last: false },
            Refract => Shape::VectorPreserving { arity: 3, scalar_last: true },
            FaceForward => Shape::VectorPreserving { arity: 3, scalar_last: false },
            Transpose => Shape::Transpose,
            Any | All => Shape::BoolReduce,
            TextureSample => Shape::TextureSample { arity: 3..=4, sampler: true },
            TextureSampleLevel | TextureSampleBias => Shape::TextureSample { arity: 4..=5, sampler: true },
            TextureSampleGrad => Shape::TextureSample { arity: 5..=6, sampler: true },
            TextureLoad => Shape::TextureSample { arity: 2..=4, sampler: false },
            TextureDimensions => Shape::TextureDimensions,
        }
    }

    pub fn arity(&self) -> RangeInclusive<usize> {
        match self.shape() {
            Shape::ComponentWise { arity, .. }
            | Shape::Reduce { arity }
            | Shape::VectorPreserving { arity, .. } => arity..=arity,
            Shape::Mix | Shape::Smoothstep | Shape::Select => 3..=3,
            Shape::Determinant | Shape::Transpose | Shape::BoolReduce => 1..=1,
            Shape::Cross => 2..=2,
            Shape::TextureSample { arity, .. } => arity,
            Shape::TextureDimensions => 1..=2,
        }
    }

    /// Whether untyped numeric literal arguments should adopt the element
    /// type of the other arguments.
    pub fn unifies_arguments(&self) -> bool {
        !matches!(
            self.shape(),
            Shape::TextureSample { .. } | Shape::TextureDimensions | Shape::BoolReduce | Shape::Select
        )
    }

    /// Result type of a call with the given argument types.
    pub fn result_type(&self, args: &[Type]) -> Result<Type, BuiltinError> {
        let arity = self.arity();
        if !arity.contains(&args.len()) {
            return Err(BuiltinError::ArgumentCount {
                expected: arity,
                found: args.len(),
            });
        }
        let invalid = |message: String| Err(BuiltinError::InvalidArgument(message));

        match self.shape() {
            Shape::ComponentWise { integers, .. } => {
                let first = &args[0];
                self.check_operand(first, integers)?;
                self.check_same(args, first)?;
                Ok(first.clone())
            }
            Shape::Mix => {
                let first = &args[0];
                self.check_operand(first, false)?;
                self.check_same(&args[..2], first)?;
                let factor = &args[2];
                if factor != first && Some(factor) != first.element().map(Type::Primitive).as_ref() {
                    return invalid(format!("`mix` blend factor must be `{}` or its element type, found `{}`", first, factor));
                }
                Ok(first.clone())
            }
            Shape::Smoothstep => {
                let x = &args[2];
                self.check_operand(x, false)?;
                for edge in &args[..2] {
                    if edge != x && Some(edge) != x.element().map(Type::Primitive).as_ref() {
                        return invalid(format!("`smoothstep` edges must match `{}`, found `{}`", x, edge));
                    }
                }
                Ok(x.clone())
            }
            Shape::Select => {
                let (f, t, cond) = (&args[0], &args[1], &args[2]);
                if f != t {
                    return invalid(format!("`select` branches differ: `{}` and `{}`", f, t));
                }
                let cond_ok = match (f, cond) {
                    (_, Type::Primitive(Primitive::Bool)) => true,
                    (
                        Type::Vector { size, .. },
                        Type::Vector {
                            size: cond_size,
                            element: Primitive::Bool,
                        },
                    ) => size == cond_size,
                    _ => false,
                };
                if !cond_ok {
                    return invalid(format!("`select` condition must be `bool` or a matching boolean vector, found `{}`", cond));
                }
                Ok(f.clone())
            }
            Shape::Reduce { .. } => {
                let first = &args[0];
                match first {
                    Type::Vector { element, .. } if element.is_float() => {}
                    Type::Primitive(p) if p.is_float() && *self != Builtin::Dot => {}
                    other => return invalid(format!("`{}` expects a float vector, found `{}`", self, other)),
                }
                self.check_same(args, first)?;
                first
                    .element()
                    .map(Type::Primitive)
                    .ok_or_else(|| BuiltinError::InvalidArgument(format!("`{}` expects a float vector", self)))
            }
            Shape::Determinant => match &args[0] {
                Type::Matrix { rows, cols, element } if rows == cols => Ok(Type::Primitive(*element)),
                other => invalid(format!("`determinant` expects a square matrix, found `{}`", other)),
            },
            Shape::Cross => match &args[0] {
                v @ Type::Vector { size: 3, element } if element.is_float() => {
                    self.check_same(args, v)?;
                    Ok(v.clone())
                }
                other => invalid(format!("`cross` expects `vec3` float arguments, found `{}`", other)),
            },
            Shape::VectorPreserving { arity, scalar_last } => {
                let first = &args[0];
                match first {
                    Type::Vector { element, .. } if element.is_float() => {}
                    other => return invalid(format!("`{}` expects a float vector, found `{}`", self, other)),
                }
                let vector_args = if scalar_last { &args[..arity - 1] } else { args };
                self.check_same(vector_args, first)?;
                if scalar_last {
                    let eta = &args[arity - 1];
                    if Some(eta) != first.element().map(Type::Primitive).as_ref() {
                        return invalid(format!("`{}` expects a scalar last argument, found `{}`", self, eta));
                    }
                }
                Ok(first.clone())
            }
            Shape::Transpose => match &args[0] {
                Type::Matrix { rows, cols, element } => Ok(Type::Matrix {
                    rows: *cols,
                    cols: *rows,
                    element: *element,
                }),
                other => invalid(format!("`transpose` expects a matrix, found `{}`", other)),
            },
            Shape::BoolReduce => match &args[0] {
                Type::Primitive(Primitive::Bool)
                | Type::Vector {
                    element: Primitive::Bool,
                    ..
                } => Ok(Type::bool()),
                other => invalid(format!("`{}` expects a boolean vector, found `{}`", self, other)),
            },
            Shape::TextureSample { sampler, .. } => {
                if !matches!(args[0], Type::Texture { .. }) {
                    return invalid(format!("`{}` expects a texture as its first argument, found `{}`", self, args[0]));
                }
                if sampler && !matches!(args[1], Type::Sampler { .. }) {
                    return invalid(format!("`{}` expects a sampler as its second argument, found `{}`", self, args[1]));
                }
                Ok(Type::vec(4, Primitive::F32))
            }
            Shape::TextureDimensions => match &args[0] {
                Type::Texture {
                    dimension: TextureDimension::D1,
                    ..
                } => Ok(Type::Primitive(Primitive::U32)),
                Type::Texture {
                    dimension: TextureDimension::D3,
                    ..
                } => Ok(Type::vec(3, Primitive::U32)),
                Type::Texture { .. } => Ok(Type::vec(2, Primitive::U32)),
                other => invalid(format!("`textureDimensions` expects a texture, found `{}`", other)),
            },
        }
    }

    fn check_operand(&self, ty: &Type, integers: bool) -> Result<(), BuiltinError> {
        let ok = match ty {
            Type::Primitive(p) | Type::Vector { element: p, .. } => {
                p.is_float() || (integers && p.is_numeric())
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            let wanted = if integers { "a numeric" } else { "a float" };
            Err(BuiltinError::InvalidArgument(format!(
                "`{}` expects {} scalar or vector, found `{}`",
                self, wanted, ty
            )))
        }
    }

    fn check_same(&self, args: &[Type], expected: &Type) -> Result<(), BuiltinError> {
        match args.iter().find(|a| *a != expected) {
            Some(other) => Err(BuiltinError::InvalidArgument(format!(
                "`{}` arguments must all be `{}`, found `{}`",
                self, expected, other
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec3() -> Type {
        Type::vec(3, Primitive::F32)
    }

    #[test]
    fn test_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(*builtin));
        }
        assert_eq!(Builtin::from_name("sine"), None);
    }

    #[test]
    fn test_component_wise_preserves_shape() {
        assert_eq!(Builtin::Sin.result_type(&[vec3()]), Ok(vec3()));
        assert_eq!(Builtin::Sin.result_type(&[Type::f32()]), Ok(Type::f32()));
        assert_eq!(
            Builtin::Max.result_type(&[Type::Primitive(Primitive::I32), Type::Primitive(Primitive::I32)]),
            Ok(Type::Primitive(Primitive::I32))
        );
        assert!(Builtin::Sqrt.result_type(&[Type::Primitive(Primitive::I32)]).is_err());
    }

    #[test]
    fn test_reductions_return_scalar() {
        assert_eq!(Builtin::Length.result_type(&[vec3()]), Ok(Type::f32()));
        assert_eq!(Builtin::Dot.result_type(&[vec3(), vec3()]), Ok(Type::f32()));
        assert!(Builtin::Dot.result_type(&[vec3(), Type::vec(2, Primitive::F32)]).is_err());
    }

    #[test]
    fn test_cross_requires_vec3() {
        assert_eq!(Builtin::Cross.result_type(&[vec3(), vec3()]), Ok(vec3()));
        let v2 = Type::vec(2, Primitive::F32);
        assert!(Builtin::Cross.result_type(&[v2.clone(), v2]).is_err());
    }

    #[test]
    fn test_arity_is_checked() {
        assert_eq!(
            Builtin::Clamp.result_type(&[Type::f32()]),
            Err(BuiltinError::ArgumentCount {
                expected: 3..=3,
                found: 1
            })
        );
    }

    #[test]
    fn test_texture_sample_returns_vec4() {
        let texture = Type::Texture {
            dimension: TextureDimension::D2,
            sample_type: Primitive::F32,
        };
        let sampler = Type::Sampler { comparison: false };
        let uv = Type::vec(2, Primitive::F32);
        assert_eq!(
            Builtin::TextureSample.result_type(&[texture, sampler, uv]),
            Ok(Type::vec(4, Primitive::F32))
        );
    }

    #[test]
    fn test_mix_accepts_scalar_factor() {
        assert_eq!(Builtin::Mix.result_type(&[vec3(), vec3(), Type::f32()]), Ok(vec3()));
        assert_eq!(Builtin::Smoothstep.result_type(&[Type::f32(), Type::f32(), vec3()]), Ok(vec3()));
    }

    #[test]
    fn test_transpose_swaps_dimensions() {
        assert_eq!(
            Builtin::Transpose.result_type(&[Type::mat(4, 3, Primitive::F32)]),
            Ok(Type::mat(3, 4, Primitive::F32))
        );
    }
}
