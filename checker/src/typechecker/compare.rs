/**
Type comparison for Quill

Implements the two comparison families the checker dispatches between:
structural equality and structural subtyping. Which family applies to a
whole run is decided once, by whether the structural-subtyping extension
is enabled.
*/
use crate::ast::types::{RecordFieldType, Type, VariantFieldType};

/// Structural equality: same shape, recursively equal components.
/// Record and variant fields are matched by label, so declaration order
/// is never significant.
pub fn types_equal(a: &Type, b: &Type) -> bool {
    match (a, b) {
        (Type::Bool, Type::Bool)
        | (Type::Nat, Type::Nat)
        | (Type::Unit, Type::Unit)
        | (Type::Top, Type::Top)
        | (Type::Bot, Type::Bot)
        | (Type::Auto, Type::Auto) => true,

        (Type::Ref(x), Type::Ref(y)) => types_equal(x, y),

        (
            Type::Fun { params: p1, ret: r1 },
            Type::Fun { params: p2, ret: r2 },
        ) => {
            p1.len() == p2.len()
                && p1.iter().zip(p2.iter()).all(|(x, y)| types_equal(x, y))
                && types_equal(r1, r2)
        }

        (Type::Tuple(xs), Type::Tuple(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| types_equal(x, y))
        }

        (Type::Record(xs), Type::Record(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|fx| {
                    record_field(ys, &fx.label).is_some_and(|fy| types_equal(&fx.ty, fy))
                })
        }

        (Type::Sum(l1, r1), Type::Sum(l2, r2)) => types_equal(l1, l2) && types_equal(r1, r2),

        (Type::Variant(xs), Type::Variant(ys)) => {
            xs.len() == ys.len()
                && xs.iter().all(|fx| {
                    variant_field(ys, &fx.label).is_some_and(|fy| match (&fx.ty, fy) {
                        (None, None) => true,
                        (Some(tx), Some(ty)) => types_equal(tx, ty),
                        _ => false,
                    })
                })
        }

        (Type::List(x), Type::List(y)) => types_equal(x, y),

        (Type::Var(x), Type::Var(y)) => x == y,

        // Universal and recursive types are recognized but unsupported;
        // they never compare equal so they cannot silently type-check.
        (Type::ForAll { .. }, _) | (Type::Rec { .. }, _) => false,

        _ => false,
    }
}

/// Structural subtyping: reflexive, with Bot below and Top above every
/// type, contravariant function parameters, covariant results, width and
/// depth subtyping on records, and the mirrored label rule on variants.
pub fn is_subtype(sub: &Type, sup: &Type) -> bool {
    if types_equal(sub, sup) {
        return true;
    }

    match (sub, sup) {
        (Type::Bot, _) => true,
        (_, Type::Top) => true,

        (
            Type::Fun { params: p1, ret: r1 },
            Type::Fun { params: p2, ret: r2 },
        ) => {
            p1.len() == p2.len()
                // Parameters are contravariant: the supertype's parameter
                // must be a subtype of the subtype's parameter.
                && p1.iter().zip(p2.iter()).all(|(x, y)| is_subtype(y, x))
                && is_subtype(r1, r2)
        }

        (Type::Tuple(xs), Type::Tuple(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(x, y)| is_subtype(x, y))
        }

        (Type::Sum(l1, r1), Type::Sum(l2, r2)) => is_subtype(l1, l2) && is_subtype(r1, r2),

        (Type::List(x), Type::List(y)) => is_subtype(x, y),

        // References are invariant; the reflexive case above already
        // covered equal component types.
        (Type::Ref(_), Type::Ref(_)) => false,

        // Width + depth: the subtype record must contain every field the
        // supertype requires, each at a covariant subtype.
        (Type::Record(sub_fields), Type::Record(sup_fields)) => sup_fields.iter().all(|need| {
            record_field(sub_fields, &need.label)
                .is_some_and(|have| is_subtype(have, &need.ty))
        }),

        // The mirror of the record rule: every label the subtype variant
        // can produce must be declared by the supertype, payloads covariant.
        (Type::Variant(sub_fields), Type::Variant(sup_fields)) => {
            sub_fields.iter().all(|have| {
                variant_field(sup_fields, &have.label).is_some_and(|need| match (&have.ty, need) {
                    (None, None) => true,
                    (Some(x), Some(y)) => is_subtype(x, y),
                    _ => false,
                })
            })
        }

        _ => false,
    }
}

/// Look up a record field type by label
pub fn record_field<'a>(fields: &'a [RecordFieldType], label: &str) -> Option<&'a Type> {
    fields.iter().find(|f| f.label == label).map(|f| &f.ty)
}

/// Look up a variant alternative's payload type by label; the outer
/// `Option` is presence of the label, the inner one is the payload
pub fn variant_field<'a>(
    fields: &'a [VariantFieldType],
    label: &str,
) -> Option<&'a Option<Type>> {
    fields.iter().find(|f| f.label == label).map(|f| &f.ty)
}

/// Labels required by `required` that `actual` does not provide; used for
/// the missing-record-fields diagnostic path
pub fn missing_record_fields(
    actual: &[RecordFieldType],
    required: &[RecordFieldType],
) -> Vec<String> {
    required
        .iter()
        .filter(|need| record_field(actual, &need.label).is_none())
        .map(|need| need.label.clone())
        .collect()
}
