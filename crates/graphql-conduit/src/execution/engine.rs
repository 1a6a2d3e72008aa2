//! Selection-set execution with GraphQL field errors and null propagation.

use apollo_compiler::parser::SourceMap;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::ObjectType;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Schema;
use indexmap::IndexMap;

use crate::canonical::CanonicalField;
use crate::canonical::CanonicalOperation;
use crate::canonical::CanonicalSelection;
use crate::execution::input_coercion::coerce_argument_values;
use crate::execution::introspection;
use crate::execution::resolver::ObjectValue;
use crate::execution::resolver::ResolveError;
use crate::execution::resolver::ResolveInfo;
use crate::execution::resolver::ResolvedValue;
use crate::execution::resolver::ResolverMap;
use crate::execution::resolver::RootValue;
use crate::execution::result_coercion::complete_value;
use crate::execution::EngineSettings;
use crate::hooks::HookRegistry;
use crate::response::Diagnostic;
use crate::response::JsonMap;
use crate::response::JsonValue;
use crate::response::PathSegment;

/// A field in a non-null position resolved to null, or errored.
///
/// The error itself is already recorded; this only signals that null must
/// propagate to the nearest nullable ancestor.
pub(crate) struct PropagateNull;

/// Linked-list response path, built on the stack during traversal.
pub(crate) type LinkedPath<'a> = Option<&'a LinkedPathElement<'a>>;

pub(crate) struct LinkedPathElement<'a> {
    pub(crate) element: PathSegment,
    pub(crate) next: LinkedPath<'a>,
}

pub(crate) fn path_to_vec(mut link: LinkedPath<'_>) -> Vec<PathSegment> {
    let mut path = Vec::new();
    while let Some(node) = link {
        path.push(node.element.clone());
        link = node.next;
    }
    path.reverse();
    path
}

pub(crate) struct ExecutionContext<'a> {
    pub(crate) schema: &'a Valid<Schema>,
    pub(crate) sources: &'a SourceMap,
    pub(crate) hooks: &'a HookRegistry,
    pub(crate) settings: &'a EngineSettings,
    pub(crate) variables: &'a JsonMap,
    pub(crate) environment: &'a JsonMap,
    pub(crate) errors: &'a mut Vec<Diagnostic>,
}

/// Runs one canonical operation to completion.
///
/// Returns the response data, or `None` when null propagated all the way to
/// the response root, together with all field errors in traversal order.
/// Root fields run in document order, which makes mutations serial.
pub(crate) fn execute(
    schema: &Valid<Schema>,
    operation: &CanonicalOperation,
    resolvers: &ResolverMap,
    settings: &EngineSettings,
    environment: &JsonMap,
    hooks: &HookRegistry,
) -> (Option<JsonMap>, Vec<Diagnostic>) {
    let mut errors = Vec::new();
    let Some(object_type) = schema.get_object(operation.root_type.as_str()) else {
        errors.push(Diagnostic::new(format!(
            "root operation type {} is not an object type",
            operation.root_type
        )));
        return (None, errors);
    };
    let root = RootValue {
        type_name: operation.root_type.as_str(),
        resolvers,
    };
    let data = {
        let mut ctx = ExecutionContext {
            schema,
            sources: &operation.sources,
            hooks,
            settings,
            variables: &operation.variables,
            environment,
            errors: &mut errors,
        };
        execute_selection_set(&mut ctx, None, object_type, &root, &operation.selections).ok()
    };
    (data, errors)
}

/// <https://spec.graphql.org/October2021/#sec-Executing-Selection-Sets>
pub(crate) fn execute_selection_set<'a>(
    ctx: &mut ExecutionContext<'_>,
    path: LinkedPath<'_>,
    object_type: &ObjectType,
    object_value: &dyn ObjectValue,
    selections: impl IntoIterator<Item = &'a CanonicalSelection>,
) -> Result<JsonMap, PropagateNull> {
    let mut grouped = IndexMap::new();
    collect_fields(ctx, object_type, selections, &mut grouped);
    let mut response = JsonMap::with_capacity(grouped.len());
    for (response_key, fields) in &grouped {
        let field_path = LinkedPathElement {
            element: PathSegment::Field((*response_key).clone()),
            next: path,
        };
        let value = execute_field(ctx, Some(&field_path), object_value, fields)?;
        response.insert(response_key.as_str(), value);
    }
    Ok(response)
}

/// <https://spec.graphql.org/October2021/#sec-Field-Collection>
///
/// Fragments are already expanded into type-condition groups, so only the
/// grouping by response key and the type-condition checks remain.
fn collect_fields<'a>(
    ctx: &ExecutionContext<'_>,
    object_type: &ObjectType,
    selections: impl IntoIterator<Item = &'a CanonicalSelection>,
    grouped: &mut IndexMap<&'a Name, Vec<&'a CanonicalField>>,
) {
    for selection in selections {
        match selection {
            CanonicalSelection::Field(field) => {
                grouped.entry(&field.response_key).or_default().push(field);
            }
            CanonicalSelection::Condition(condition) => {
                let applies = condition
                    .type_condition
                    .as_ref()
                    .map_or(true, |on| type_condition_applies(ctx.schema, on, object_type));
                if applies {
                    collect_fields(ctx, object_type, &condition.selections, grouped);
                }
            }
        }
    }
}

/// <https://spec.graphql.org/October2021/#DoesFragmentTypeApply()>
fn type_condition_applies(
    schema: &Valid<Schema>,
    type_condition: &Name,
    object_type: &ObjectType,
) -> bool {
    match schema.types.get(type_condition.as_str()) {
        Some(ExtendedType::Object(_)) => *type_condition == object_type.name,
        Some(ExtendedType::Interface(_)) => object_type
            .implements_interfaces
            .iter()
            .any(|interface| interface.name == *type_condition),
        Some(ExtendedType::Union(def)) => def
            .members
            .iter()
            .any(|member| member.name == object_type.name),
        _ => false,
    }
}

/// <https://spec.graphql.org/October2021/#sec-Executing-Fields>
///
/// `fields` has at least one element; entries after the first contribute
/// their subselections to the merged selection set.
fn execute_field(
    ctx: &mut ExecutionContext<'_>,
    path: LinkedPath<'_>,
    object_value: &dyn ObjectValue,
    fields: &[&CanonicalField],
) -> Result<JsonValue, PropagateNull> {
    let field = fields[0];
    let field_name = field.name.as_str();
    if field_name == "__typename" {
        return Ok(JsonValue::from(object_value.type_name()));
    }
    let field_def = &field.definition;
    let argument_values = match coerce_argument_values(
        ctx.schema,
        ctx.hooks,
        ctx.variables,
        &format!("field {field_name}"),
        &field_def.arguments,
        &field.arguments,
    ) {
        Ok(values) => values,
        Err(err) => {
            let diagnostic = err.into_diagnostic(ctx.sources).with_path(path_to_vec(path));
            ctx.errors.push(diagnostic);
            return try_nullify(&field_def.ty, Err(PropagateNull));
        }
    };
    let info = ResolveInfo {
        schema: ctx.schema,
        field_name,
        arguments: &argument_values,
        environment: ctx.environment,
    };
    let resolved = match field_name {
        "__schema" if ctx.settings.enable_schema_introspection => {
            Ok(ResolvedValue::object(introspection::SchemaMetaField))
        }
        "__type" if ctx.settings.enable_schema_introspection => {
            match argument_values.get("name").and_then(JsonValue::as_str) {
                Some(name) => Ok(introspection::type_def(ctx.schema, name)),
                None => Err(ResolveError::new("__type expects a String name argument")),
            }
        }
        "__schema" | "__type" => Err(ResolveError::new("schema introspection is disabled")),
        _ => object_value.resolve_field(&info),
    };
    let completed = match resolved {
        Ok(resolved) => complete_value(ctx, path, &field_def.ty, resolved, fields),
        Err(err) => {
            let diagnostic = Diagnostic::at(
                format!("resolver error: {}", err.message),
                field.location,
                ctx.sources,
            )
            .with_path(path_to_vec(path));
            ctx.errors.push(diagnostic);
            Err(PropagateNull)
        }
    };
    try_nullify(&field_def.ty, completed)
}

/// <https://spec.graphql.org/October2021/#sec-Handling-Field-Errors>
///
/// Stops null propagation at the first nullable position.
pub(crate) fn try_nullify(
    ty: &apollo_compiler::schema::Type,
    result: Result<JsonValue, PropagateNull>,
) -> Result<JsonValue, PropagateNull> {
    match result {
        Ok(json) => Ok(json),
        Err(PropagateNull) => {
            if ty.is_non_null() {
                Err(PropagateNull)
            } else {
                Ok(JsonValue::Null)
            }
        }
    }
}
