//! Primitive and array types of P

use std::fmt;

/// Size in bytes of every scalar value on the target
pub const WORD_SIZE: u32 = 4;

/// Primitive (element) kind of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Void,
    Integer,
    Real,
    Boolean,
    String,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Integer => "integer",
            PrimitiveType::Real => "real",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::String => "string",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type descriptor: primitive kind plus array dimensions
///
/// Two descriptors are equal iff the primitive kinds and the dimension
/// lists match elementwise. Dimensions are kept signed so that an invalid
/// declaration such as `array[-1] of integer` can still be represented and
/// reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PType {
    primitive: PrimitiveType,
    dimensions: Vec<i64>,
}

impl PType {
    pub fn scalar(primitive: PrimitiveType) -> Self {
        Self {
            primitive,
            dimensions: Vec::new(),
        }
    }

    pub fn array(primitive: PrimitiveType, dimensions: Vec<i64>) -> Self {
        Self { primitive, dimensions }
    }

    pub fn void() -> Self {
        Self::scalar(PrimitiveType::Void)
    }

    pub fn integer() -> Self {
        Self::scalar(PrimitiveType::Integer)
    }

    pub fn real() -> Self {
        Self::scalar(PrimitiveType::Real)
    }

    pub fn boolean() -> Self {
        Self::scalar(PrimitiveType::Boolean)
    }

    pub fn string() -> Self {
        Self::scalar(PrimitiveType::String)
    }

    pub fn primitive(&self) -> PrimitiveType {
        self.primitive
    }

    pub fn dimensions(&self) -> &[i64] {
        &self.dimensions
    }

    pub fn is_array(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// Non-array, non-void
    pub fn is_scalar(&self) -> bool {
        !self.is_array() && self.primitive != PrimitiveType::Void
    }

    pub fn is_void(&self) -> bool {
        !self.is_array() && self.primitive == PrimitiveType::Void
    }

    pub fn is_integer(&self) -> bool {
        !self.is_array() && self.primitive == PrimitiveType::Integer
    }

    pub fn is_real(&self) -> bool {
        !self.is_array() && self.primitive == PrimitiveType::Real
    }

    pub fn is_boolean(&self) -> bool {
        !self.is_array() && self.primitive == PrimitiveType::Boolean
    }

    pub fn is_string(&self) -> bool {
        !self.is_array() && self.primitive == PrimitiveType::String
    }

    /// Scalar integer or real
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_real()
    }

    /// True when every dimension is a positive bound
    pub fn has_valid_dimensions(&self) -> bool {
        self.dimensions.iter().all(|&d| d > 0)
    }

    /// Type left after applying `count` indices, or `None` when over-indexed
    pub fn strip_dimensions(&self, count: usize) -> Option<PType> {
        if count > self.dimensions.len() {
            return None;
        }
        Some(Self {
            primitive: self.primitive,
            dimensions: self.dimensions[count..].to_vec(),
        })
    }

    /// Number of elements (1 for scalars), `None` when it does not fit a word
    pub fn element_count(&self) -> Option<u32> {
        product(&self.dimensions)
    }

    /// Storage size in bytes when held by value
    pub fn byte_size(&self) -> Option<u32> {
        self.element_count()?.checked_mul(WORD_SIZE)
    }

    /// Distance in bytes between consecutive values of the `index`-th subscript
    pub fn stride(&self, index: usize) -> Option<u32> {
        let inner = self.dimensions.get(index + 1..).unwrap_or_default();
        product(inner)?.checked_mul(WORD_SIZE)
    }
}

/// Checked product of array bounds; negative or oversized bounds yield `None`
fn product(dimensions: &[i64]) -> Option<u32> {
    dimensions.iter().try_fold(1u32, |acc, &d| {
        let d = u32::try_from(d).ok()?;
        acc.checked_mul(d)
    })
}

impl fmt::Display for PType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primitive)?;
        if self.is_array() {
            f.write_str(" ")?;
            for dim in &self.dimensions {
                write!(f, "[{}]", dim)?;
            }
        }
        Ok(())
    }
}
