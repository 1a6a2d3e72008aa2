//! Coercion of request-supplied input values against their declared types.

use apollo_compiler::ast::Argument;
use apollo_compiler::ast::Value;
use apollo_compiler::executable::Operation;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::InputValueDefinition;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;
use apollo_compiler::Node;
use apollo_compiler::Schema;

use crate::hooks::HookRegistry;
use crate::response::Diagnostic;
use crate::response::JsonMap;
use crate::response::JsonValue;

/// An input value failed coercion.
pub(crate) struct InputError {
    message: String,
    location: Option<SourceSpan>,
}

impl InputError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    fn at(location: Option<SourceSpan>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn into_diagnostic(self, sources: &SourceMap) -> Diagnostic {
        Diagnostic::at(self.message, self.location, sources)
    }
}

/// A value that does not match its declared leaf or input-object type.
fn mistyped(what: &str, value: &JsonValue, ty_name: &str) -> InputError {
    InputError::new(format!(
        "could not coerce {what}: {value} to type {ty_name}"
    ))
}

/// <https://spec.graphql.org/October2021/#sec-Coercing-Variable-Values>
pub(crate) fn coerce_variable_values(
    schema: &Valid<Schema>,
    hooks: &HookRegistry,
    operation: &Operation,
    values: &JsonMap,
) -> Result<JsonMap, InputError> {
    let mut coerced = JsonMap::new();
    for definition in &operation.variables {
        let name = definition.name.as_str();
        let what = format!("variable ${name}");
        if let Some((key, value)) = values.get_key_value(name) {
            if value.is_null() && definition.ty.is_non_null() {
                return Err(InputError::at(
                    definition.location(),
                    format!("null value provided for non-null {what}"),
                ));
            }
            let value = coerce_json_value(schema, hooks, &what, &definition.ty, value)?;
            coerced.insert(key.clone(), value);
        } else if let Some(default) = &definition.default_value {
            let default = graphql_value_to_json(&what, default)?;
            let default = coerce_json_value(schema, hooks, &what, &definition.ty, &default)?;
            coerced.insert(name, default);
        } else if definition.ty.is_non_null() {
            return Err(InputError::at(
                definition.location(),
                format!("missing value for non-null {what}"),
            ));
        }
    }
    Ok(coerced)
}

/// <https://spec.graphql.org/October2021/#sec-Coercing-Argument-Values>
///
/// Shared by field arguments and directive arguments; `context` names the
/// owner for error messages, e.g. `field person` or `directive @skip`.
pub(crate) fn coerce_argument_values(
    schema: &Valid<Schema>,
    hooks: &HookRegistry,
    variables: &JsonMap,
    context: &str,
    argument_definitions: &[Node<InputValueDefinition>],
    arguments: &[Node<Argument>],
) -> Result<JsonMap, InputError> {
    let mut coerced = JsonMap::new();
    for definition in argument_definitions {
        let name = definition.name.as_str();
        let what = format!("argument {name} of {context}");
        let supplied = arguments
            .iter()
            .find(|argument| argument.name == definition.name);
        if let Some(argument) = supplied {
            if let Value::Variable(variable) = argument.value.as_ref() {
                // A reference to an unbound variable counts as unprovided
                if let Some(value) = variables.get(variable.as_str()) {
                    if value.is_null() && definition.ty.is_non_null() {
                        return Err(InputError::at(
                            argument.location(),
                            format!("null value provided for non-null {what}"),
                        ));
                    }
                    coerced.insert(name, value.clone());
                    continue;
                }
            } else {
                let value =
                    coerce_ast_value(schema, hooks, variables, &what, &definition.ty, &argument.value)?;
                coerced.insert(name, value);
                continue;
            }
        }
        if let Some(default) = &definition.default_value {
            let empty = JsonMap::new();
            let default = coerce_ast_value(schema, hooks, &empty, &what, &definition.ty, default)?;
            coerced.insert(name, default);
        } else if definition.ty.is_non_null() {
            return Err(InputError::at(
                definition.location(),
                format!("missing value for required {what}"),
            ));
        }
    }
    Ok(coerced)
}

/// Coerces a JSON value (from request variables) against a declared type.
fn coerce_json_value(
    schema: &Valid<Schema>,
    hooks: &HookRegistry,
    what: &str,
    ty: &Type,
    value: &JsonValue,
) -> Result<JsonValue, InputError> {
    if value.is_null() {
        return if ty.is_non_null() {
            Err(InputError::new(format!(
                "null value provided for non-null type {ty}, in {what}"
            )))
        } else {
            Ok(JsonValue::Null)
        };
    }
    if let Type::List(inner) | Type::NonNullList(inner) = ty {
        // A single non-list value coerces to a one-item list
        return if let JsonValue::Array(items) = value {
            items
                .iter()
                .map(|item| coerce_json_value(schema, hooks, what, inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array)
        } else {
            Ok(JsonValue::Array(vec![coerce_json_value(
                schema, hooks, what, inner, value,
            )?]))
        };
    }
    let ty_name = ty.inner_named_type();
    let Some(ty_def) = schema.types.get(ty_name.as_str()) else {
        return Err(InputError::new(format!(
            "undefined type {ty_name} for {what}"
        )));
    };
    match ty_def {
        ExtendedType::InputObject(ty_def) => {
            let JsonValue::Object(object) = value else {
                return Err(mistyped(what, value, ty_name.as_str()));
            };
            for key in object.keys() {
                if !ty_def.fields.contains_key(key.as_str()) {
                    return Err(InputError::new(format!(
                        "input object provided for {what} contains unknown field {}",
                        key.as_str()
                    )));
                }
            }
            let mut coerced = JsonMap::new();
            for (field_name, field_def) in &ty_def.fields {
                let path = format!("{what}.{field_name}");
                if let Some((key, field_value)) = object.get_key_value(field_name.as_str()) {
                    let field_value =
                        coerce_json_value(schema, hooks, &path, &field_def.ty, field_value)?;
                    coerced.insert(key.clone(), field_value);
                } else if let Some(default) = &field_def.default_value {
                    let default = graphql_value_to_json(&path, default)?;
                    coerced.insert(field_name.as_str(), default);
                } else if field_def.ty.is_non_null() {
                    return Err(InputError::new(format!(
                        "missing value for non-null input object field {path}"
                    )));
                }
            }
            Ok(JsonValue::Object(coerced))
        }
        ExtendedType::Enum(ty_def) => {
            let as_str = value.as_str();
            if as_str.is_some_and(|value| ty_def.values.contains_key(value)) {
                Ok(value.clone())
            } else {
                Err(mistyped(what, value, ty_name.as_str()))
            }
        }
        ExtendedType::Scalar(_) => match ty_name.as_str() {
            // i32 range per the GraphQL spec
            "Int" => {
                if value
                    .as_i64()
                    .is_some_and(|value| i32::try_from(value).is_ok())
                {
                    Ok(value.clone())
                } else {
                    Err(mistyped(what, value, ty_name.as_str()))
                }
            }
            "Float" => {
                if value.is_f64() || value.is_i64() {
                    Ok(value.clone())
                } else {
                    Err(mistyped(what, value, ty_name.as_str()))
                }
            }
            "String" => {
                if value.is_string() {
                    Ok(value.clone())
                } else {
                    Err(mistyped(what, value, ty_name.as_str()))
                }
            }
            "Boolean" => {
                if value.is_boolean() {
                    Ok(value.clone())
                } else {
                    Err(mistyped(what, value, ty_name.as_str()))
                }
            }
            "ID" => {
                if value.is_string() || value.as_i64().is_some() {
                    Ok(value.clone())
                } else {
                    Err(mistyped(what, value, ty_name.as_str()))
                }
            }
            _ => match hooks.scalar(ty_name.as_str()) {
                Some(codec) => codec.decode(value).map_err(|err| {
                    InputError::new(format!(
                        "failed to decode {what} with the {ty_name} codec: {}",
                        err.message
                    ))
                }),
                None => Ok(value.clone()),
            },
        },
        _ => Err(InputError::new(format!(
            "non-input type {ty_name} used for {what}"
        ))),
    }
}

/// Coerces a document value (argument or default) against a declared type,
/// substituting already-coerced variables where they appear.
fn coerce_ast_value(
    schema: &Valid<Schema>,
    hooks: &HookRegistry,
    variables: &JsonMap,
    what: &str,
    ty: &Type,
    value: &Node<Value>,
) -> Result<JsonValue, InputError> {
    if let Value::Variable(variable) = value.as_ref() {
        // The value was already decoded and coerced against the variable's
        // own declared type
        let json = variables
            .get(variable.as_str())
            .cloned()
            .unwrap_or(JsonValue::Null);
        if json.is_null() && ty.is_non_null() {
            return Err(InputError::at(
                value.location(),
                format!("null or missing variable ${variable} used for non-null {what}"),
            ));
        }
        return Ok(json);
    }
    if let Value::Null = value.as_ref() {
        return if ty.is_non_null() {
            Err(InputError::at(
                value.location(),
                format!("null value provided for non-null {what}"),
            ))
        } else {
            Ok(JsonValue::Null)
        };
    }
    if let Type::List(inner) | Type::NonNullList(inner) = ty {
        return match value.as_ref() {
            Value::List(items) => items
                .iter()
                .map(|item| coerce_ast_value(schema, hooks, variables, what, inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            _ => Ok(JsonValue::Array(vec![coerce_ast_value(
                schema, hooks, variables, what, inner, value,
            )?])),
        };
    }
    let ty_name = ty.inner_named_type();
    match schema.types.get(ty_name.as_str()) {
        Some(ExtendedType::InputObject(ty_def)) => {
            let Value::Object(supplied_fields) = value.as_ref() else {
                return Err(InputError::at(
                    value.location(),
                    format!("expected an input object of type {ty_name} for {what}"),
                ));
            };
            for (key, _) in supplied_fields {
                if !ty_def.fields.contains_key(key.as_str()) {
                    return Err(InputError::at(
                        value.location(),
                        format!("input object provided for {what} contains unknown field {key}"),
                    ));
                }
            }
            let mut coerced = JsonMap::new();
            for (field_name, field_def) in &ty_def.fields {
                let path = format!("{what}.{field_name}");
                let supplied = supplied_fields.iter().find(|(key, _)| key == field_name);
                if let Some((_, field_value)) = supplied {
                    let field_value =
                        coerce_ast_value(schema, hooks, variables, &path, &field_def.ty, field_value)?;
                    coerced.insert(field_name.as_str(), field_value);
                } else if let Some(default) = &field_def.default_value {
                    let empty = JsonMap::new();
                    let default =
                        coerce_ast_value(schema, hooks, &empty, &path, &field_def.ty, default)?;
                    coerced.insert(field_name.as_str(), default);
                } else if field_def.ty.is_non_null() {
                    return Err(InputError::at(
                        value.location(),
                        format!("missing value for non-null input object field {path}"),
                    ));
                }
            }
            Ok(JsonValue::Object(coerced))
        }
        // Leaf types share the JSON coercion rules, including custom
        // scalar decoding
        _ => {
            let json = graphql_value_to_json(what, value)?;
            coerce_json_value(schema, hooks, what, ty, &json)
        }
    }
}

/// Converts a constant document value to JSON.
pub(crate) fn graphql_value_to_json(
    what: &str,
    value: &Node<Value>,
) -> Result<JsonValue, InputError> {
    match value.as_ref() {
        Value::Null => Ok(JsonValue::Null),
        Value::Variable(_) => Err(InputError::at(
            value.location(),
            format!("variable reference in constant value for {what}"),
        )),
        Value::Enum(inner) => Ok(inner.as_str().into()),
        Value::String(inner) => Ok(inner.as_str().into()),
        Value::Boolean(inner) => Ok((*inner).into()),
        Value::Int(inner) => inner.try_to_i32().map(JsonValue::from).map_err(|_| {
            InputError::at(
                value.location(),
                format!("Int value overflows i32 in {what}"),
            )
        }),
        Value::Float(inner) => inner.try_to_f64().map(JsonValue::from).map_err(|_| {
            InputError::at(
                value.location(),
                format!("Float value overflows f64 in {what}"),
            )
        }),
        Value::List(items) => items
            .iter()
            .map(|item| graphql_value_to_json(what, item))
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        Value::Object(fields) => {
            let mut object = JsonMap::with_capacity(fields.len());
            for (key, field_value) in fields {
                object.insert(key.as_str(), graphql_value_to_json(what, field_value)?);
            }
            Ok(JsonValue::Object(object))
        }
    }
}
