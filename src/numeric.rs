//! Helpers for adapters that collect bindings from arbitrary values.

use std::any::{Any, TypeId};

use num_traits::FromPrimitive;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;

use crate::Bindings;

static NUMERIC_TYPES: Lazy<[TypeId; 11]> = Lazy::new(|| {
    [
        TypeId::of::<i8>(),
        TypeId::of::<u8>(),
        TypeId::of::<i16>(),
        TypeId::of::<u16>(),
        TypeId::of::<i32>(),
        TypeId::of::<u32>(),
        TypeId::of::<i64>(),
        TypeId::of::<u64>(),
        TypeId::of::<f32>(),
        TypeId::of::<f64>(),
        TypeId::of::<Decimal>(),
    ]
});

/// Whether values of type `T` can be coerced to a [`Decimal`] binding.
pub fn is_numeric_type<T: ?Sized + Any>() -> bool {
    is_numeric_type_id(TypeId::of::<T>())
}

pub fn is_numeric_type_id(type_id: TypeId) -> bool {
    NUMERIC_TYPES.contains(&type_id)
}

/// Converts `value` to a [`Decimal`] if its type is numeric.
///
/// Floats that aren't finite, or don't fit, yield `None`.
pub fn to_decimal(value: &dyn Any) -> Option<Decimal> {
    macro_rules! integer {
        ($($t:ty),*) => {
            $(
                if let Some(v) = value.downcast_ref::<$t>() {
                    return Some(Decimal::from(*v));
                }
            )*
        };
    }
    integer!(i8, u8, i16, u16, i32, u32, i64, u64);

    if let Some(v) = value.downcast_ref::<f32>() {
        return Decimal::from_f32(*v);
    }
    if let Some(v) = value.downcast_ref::<f64>() {
        return Decimal::from_f64(*v);
    }
    value.downcast_ref::<Decimal>().copied()
}

/// Collects the numeric values among `fields` into [`Bindings`], keyed by
/// field name. Non-numeric values are skipped.
pub fn numeric_bindings<'a>(fields: impl IntoIterator<Item = (&'a str, &'a dyn Any)>) -> Bindings {
    fields
        .into_iter()
        .filter_map(|(name, value)| Some((name.to_owned(), to_decimal(value)?)))
        .collect()
}
