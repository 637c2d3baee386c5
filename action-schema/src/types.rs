//! Mapping from Rust types to [`FieldType`]s.

use serde_json::Value;

use crate::model::FieldType;

/// Rust types that can appear as action arguments or return values.
///
/// Record types implement this by returning [`FieldType::Object`] with their
/// model; keep the model in a `OnceLock` so every call hands out the same
/// `Arc`.
pub trait SchemaType {
    /// Field type describing values of `Self`.
    fn field_type() -> FieldType;

    /// Whether the argument may be omitted by callers.
    fn is_optional() -> bool {
        false
    }
}

macro_rules! schema_type {
    ($variant:ident => $($ty:ty),+ $(,)?) => {
        $(
            impl SchemaType for $ty {
                fn field_type() -> FieldType {
                    FieldType::$variant
                }
            }
        )+
    };
}

schema_type!(String => String);
schema_type!(Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
schema_type!(Number => f32, f64);
schema_type!(Boolean => bool);
schema_type!(Any => Value, ());

impl<T: SchemaType> SchemaType for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::Array(Box::new(T::field_type()))
    }
}

impl<T: SchemaType> SchemaType for Option<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn is_optional() -> bool {
        true
    }
}
