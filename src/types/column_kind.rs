//! This module defines the canonical, type-safe classification of columns
//! used by the optimizer and the transformation pipeline.

use std::fmt;

use arrow::datatypes::DataType as ArrowDataType;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A signed integer storage width, ordered smallest to largest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    /// Every supported width, smallest first. Narrowing walks this list in order.
    pub const ALL: [IntWidth; 4] = [IntWidth::W8, IntWidth::W16, IntWidth::W32, IntWidth::W64];

    pub fn byte_width(&self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    /// Returns `true` if `value` is representable at this width.
    pub fn holds<T: ToPrimitive>(&self, value: T) -> bool {
        match self {
            Self::W8 => value.to_i8().is_some(),
            Self::W16 => value.to_i16().is_some(),
            Self::W32 => value.to_i32().is_some(),
            Self::W64 => value.to_i64().is_some(),
        }
    }

    /// The smallest width that spans `[min, max]`, or `None` if even 64 bits are
    /// not enough (only possible for unsigned inputs).
    pub fn smallest_spanning<T: ToPrimitive + Copy>(min: T, max: T) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|width| width.holds(min) && width.holds(max))
    }

    /// The smallest width able to index `count` dictionary entries.
    pub fn smallest_for_count(count: usize) -> Option<Self> {
        let max_index = count.saturating_sub(1);
        Self::smallest_spanning(0usize, max_index)
    }

    pub fn to_arrow_type(&self) -> ArrowDataType {
        match self {
            Self::W8 => ArrowDataType::Int8,
            Self::W16 => ArrowDataType::Int16,
            Self::W32 => ArrowDataType::Int32,
            Self::W64 => ArrowDataType::Int64,
        }
    }
}

/// A floating-point storage width, ordered smallest to largest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FloatWidth {
    W32,
    W64,
}

impl FloatWidth {
    pub fn byte_width(&self) -> usize {
        match self {
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    pub fn to_arrow_type(&self) -> ArrowDataType {
        match self {
            Self::W32 => ArrowDataType::Float32,
            Self::W64 => ArrowDataType::Float64,
        }
    }
}

/// The category a column falls into for optimization and arithmetic purposes.
///
/// This replaces ad-hoc matching on Arrow `DataType`s at every call site: the
/// optimizer picks a strategy per kind, and `Other` is the explicit "leave it
/// alone" bucket (booleans, unsigned integers, dates, ...).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    SignedInt(IntWidth),
    Float(FloatWidth),
    Text,
    /// Dictionary-encoded text.
    Categorical,
    Other,
}

impl ColumnKind {
    /// Classifies an Arrow `DataType`. Never fails; unknown types map to `Other`.
    pub fn from_arrow_type(arrow_type: &ArrowDataType) -> Self {
        match arrow_type {
            ArrowDataType::Int8 => Self::SignedInt(IntWidth::W8),
            ArrowDataType::Int16 => Self::SignedInt(IntWidth::W16),
            ArrowDataType::Int32 => Self::SignedInt(IntWidth::W32),
            ArrowDataType::Int64 => Self::SignedInt(IntWidth::W64),
            ArrowDataType::Float32 => Self::Float(FloatWidth::W32),
            ArrowDataType::Float64 => Self::Float(FloatWidth::W64),
            ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => Self::Text,
            ArrowDataType::Dictionary(_, value_type)
                if matches!(
                    value_type.as_ref(),
                    ArrowDataType::Utf8 | ArrowDataType::LargeUtf8
                ) =>
            {
                Self::Categorical
            }
            _ => Self::Other,
        }
    }

    /// Returns `true` if the kind is a signed integer.
    pub fn is_signed_int(&self) -> bool {
        matches!(self, Self::SignedInt(_))
    }

    /// Returns `true` if the kind is a floating-point number.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignedInt(w) => write!(f, "Int{}", w.byte_width() * 8),
            Self::Float(w) => write!(f, "Float{}", w.byte_width() * 8),
            Self::Text => write!(f, "Text"),
            Self::Categorical => write!(f, "Categorical"),
            Self::Other => write!(f, "Other"),
        }
    }
}
