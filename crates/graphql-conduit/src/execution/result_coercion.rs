//! Completion of resolved values against the field's declared type.

use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::schema::Type;

use crate::canonical::CanonicalField;
use crate::execution::engine::execute_selection_set;
use crate::execution::engine::path_to_vec;
use crate::execution::engine::try_nullify;
use crate::execution::engine::ExecutionContext;
use crate::execution::engine::LinkedPath;
use crate::execution::engine::LinkedPathElement;
use crate::execution::engine::PropagateNull;
use crate::execution::resolver::JsonObject;
use crate::execution::resolver::ObjectValue;
use crate::execution::resolver::ResolveError;
use crate::execution::resolver::ResolvedValue;
use crate::response::Diagnostic;
use crate::response::JsonValue;
use crate::response::PathSegment;

/// <https://spec.graphql.org/October2021/#sec-Value-Completion>
pub(crate) fn complete_value<'a>(
    ctx: &mut ExecutionContext<'_>,
    path: LinkedPath<'_>,
    ty: &Type,
    resolved: ResolvedValue<'a>,
    fields: &[&CanonicalField],
) -> Result<JsonValue, PropagateNull> {
    let field = fields[0];
    let location = field.location;
    macro_rules! field_error {
        ($($arg: tt)+) => {{
            ctx.errors.push(
                Diagnostic::at(format!($($arg)+), location, ctx.sources)
                    .with_path(path_to_vec(path)),
            );
            return Err(PropagateNull);
        }};
    }
    if let ResolvedValue::Leaf(JsonValue::Null) = resolved {
        if ty.is_non_null() {
            field_error!("non-null type {ty} resolved to null");
        } else {
            return Ok(JsonValue::Null);
        }
    }
    if let Type::List(inner_ty) | Type::NonNullList(inner_ty) = ty {
        let items: Box<dyn Iterator<Item = Result<ResolvedValue<'a>, ResolveError>> + 'a> =
            match resolved {
                ResolvedValue::List(iter) => iter,
                // A plain JSON array works as a list of leaves
                ResolvedValue::Leaf(JsonValue::Array(items)) => {
                    Box::new(items.into_iter().map(|item| Ok(ResolvedValue::Leaf(item))))
                }
                _ => field_error!("list type {ty} resolved to a non-list value"),
            };
        let mut completed = Vec::new();
        for (index, item) in items.enumerate() {
            let item_path = LinkedPathElement {
                element: PathSegment::ListIndex(index),
                next: path,
            };
            let completed_item = match item {
                Ok(item) => complete_value(ctx, Some(&item_path), inner_ty, item, fields),
                Err(err) => {
                    ctx.errors.push(
                        Diagnostic::at(
                            format!("resolver error: {}", err.message),
                            location,
                            ctx.sources,
                        )
                        .with_path(path_to_vec(Some(&item_path))),
                    );
                    Err(PropagateNull)
                }
            };
            completed.push(try_nullify(inner_ty, completed_item)?);
        }
        return Ok(JsonValue::Array(completed));
    }
    let ty_name = ty.inner_named_type();
    let Some(ty_def) = ctx.schema.types.get(ty_name.as_str()) else {
        field_error!("field with undefined type {ty_name}");
    };
    match ty_def {
        ExtendedType::Scalar(_) | ExtendedType::Enum(_) => {
            let ResolvedValue::Leaf(json_value) = resolved else {
                field_error!("leaf type {ty_name} resolved to a composite value");
            };
            if let ExtendedType::Enum(enum_def) = ty_def {
                let is_member = json_value
                    .as_str()
                    .is_some_and(|value| enum_def.values.contains_key(value));
                if is_member {
                    Ok(json_value)
                } else {
                    field_error!("enum type {ty_name} resolved to a non-member value {json_value}");
                }
            } else {
                match ty_name.as_str() {
                    "Int" => {
                        if json_value
                            .as_i64()
                            .is_some_and(|value| i32::try_from(value).is_ok())
                        {
                            Ok(json_value)
                        } else {
                            field_error!("scalar type Int resolved to {json_value}");
                        }
                    }
                    "Float" => {
                        if json_value.is_f64() || json_value.is_i64() {
                            Ok(json_value)
                        } else {
                            field_error!("scalar type Float resolved to {json_value}");
                        }
                    }
                    "String" => {
                        if json_value.is_string() {
                            Ok(json_value)
                        } else {
                            field_error!("scalar type String resolved to {json_value}");
                        }
                    }
                    "Boolean" => {
                        if json_value.is_boolean() {
                            Ok(json_value)
                        } else {
                            field_error!("scalar type Boolean resolved to {json_value}");
                        }
                    }
                    "ID" => {
                        if json_value.is_string() || json_value.as_i64().is_some() {
                            Ok(json_value)
                        } else {
                            field_error!("scalar type ID resolved to {json_value}");
                        }
                    }
                    _ => match ctx.hooks.scalar(ty_name.as_str()) {
                        Some(codec) => match codec.encode(&json_value) {
                            Ok(encoded) => Ok(encoded),
                            Err(err) => field_error!(
                                "failed to encode custom scalar {ty_name}: {}",
                                err.message
                            ),
                        },
                        None => Ok(json_value),
                    },
                }
            }
        }
        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
            let object_value: Box<dyn ObjectValue + 'a> = match resolved {
                ResolvedValue::Object(resolver) => resolver,
                // A plain JSON object stands in for a composite value;
                // abstract types need a __typename entry to pick the
                // concrete type
                ResolvedValue::Leaf(JsonValue::Object(map)) => {
                    let type_name = if let ExtendedType::Object(_) = ty_def {
                        ty_name.to_string()
                    } else {
                        match map.get("__typename").and_then(JsonValue::as_str) {
                            Some(name) => name.to_string(),
                            None => field_error!(
                                "abstract type {ty_name} resolved to an object without \
                                 a __typename entry"
                            ),
                        }
                    };
                    Box::new(JsonObject {
                        type_name,
                        fields: map,
                    })
                }
                _ => field_error!("composite type {ty_name} resolved to a leaf value"),
            };
            let concrete_name = object_value.type_name();
            let concrete_type: &ObjectType = match ty_def {
                ExtendedType::Object(def) => def,
                _ => match ctx.schema.get_object(concrete_name) {
                    Some(def) => def,
                    None => field_error!(
                        "abstract type {ty_name} resolved to unknown object type {concrete_name}"
                    ),
                },
            };
            execute_selection_set(
                ctx,
                path,
                concrete_type,
                object_value.as_ref(),
                fields.iter().flat_map(|field| &field.selections),
            )
            .map(JsonValue::Object)
        }
        ExtendedType::InputObject(_) => {
            field_error!("field with input object type {ty_name}");
        }
    }
}
