//! Canonicalization: from a validated document to an owned operation tree.
//!
//! The selected operation is rewritten into a self-contained form: request
//! variables are coerced against their declared types, fragment spreads are
//! expanded into type-condition groups, and registered directive handlers
//! prune or rename selections. Later stages never look at the document again.

use std::collections::HashSet;

use apollo_compiler::ast::Argument;
use apollo_compiler::ast::DirectiveList;
use apollo_compiler::ast::OperationType;
use apollo_compiler::executable::ExecutableDocument;
use apollo_compiler::executable::Selection;
use apollo_compiler::parser::SourceMap;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;

use crate::execution::input_coercion::coerce_argument_values;
use crate::execution::input_coercion::coerce_variable_values;
use crate::hooks::HookRegistry;
use crate::hooks::Projection;
use crate::response::Diagnostic;
use crate::response::JsonMap;

/// One operation, normalized and detached from its document.
pub(crate) struct CanonicalOperation {
    pub(crate) operation_type: OperationType,
    pub(crate) root_type: Name,
    /// Coerced and decoded request variables.
    pub(crate) variables: JsonMap,
    pub(crate) selections: Vec<CanonicalSelection>,
    /// Kept for error locations in the resolution stage.
    pub(crate) sources: SourceMap,
}

pub(crate) enum CanonicalSelection {
    Field(CanonicalField),
    /// Selections guarded by a fragment type condition.
    Condition(CanonicalCondition),
}

pub(crate) struct CanonicalField {
    pub(crate) definition: Node<FieldDefinition>,
    pub(crate) name: Name,
    pub(crate) response_key: Name,
    pub(crate) arguments: Vec<Node<Argument>>,
    pub(crate) selections: Vec<CanonicalSelection>,
    pub(crate) location: Option<SourceSpan>,
}

pub(crate) struct CanonicalCondition {
    /// `None` for inline fragments without a type condition.
    pub(crate) type_condition: Option<Name>,
    pub(crate) selections: Vec<CanonicalSelection>,
}

pub(crate) fn operation_kind(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Query => "query",
        OperationType::Mutation => "mutation",
        OperationType::Subscription => "subscription",
    }
}

pub(crate) fn canonicalize(
    schema: &Valid<Schema>,
    document: &Valid<ExecutableDocument>,
    operation_name: Option<&str>,
    variables: &JsonMap,
    hooks: &HookRegistry,
) -> Result<CanonicalOperation, Vec<Diagnostic>> {
    let operation = document.operations.get(operation_name).map_err(|_| {
        let message = match operation_name {
            Some(name) => format!("the document defines no operation named {name:?}"),
            None => {
                "the document defines multiple operations; select one by name".to_string()
            }
        };
        vec![Diagnostic::new(message)]
    })?;
    let Some(root_type) = schema.root_operation(operation.operation_type) else {
        return Err(vec![Diagnostic::new(format!(
            "the schema declares no root type for {} operations",
            operation_kind(operation.operation_type)
        ))]);
    };
    let variables = coerce_variable_values(schema, hooks, operation, variables)
        .map_err(|err| vec![err.into_diagnostic(&document.sources)])?;
    let canonicalizer = Canonicalizer {
        schema,
        document,
        hooks,
        variables: &variables,
    };
    let selections =
        canonicalizer.selections(&operation.selection_set.selections, &mut HashSet::new())?;
    Ok(CanonicalOperation {
        operation_type: operation.operation_type,
        root_type: root_type.clone(),
        variables,
        selections,
        sources: document.sources.clone(),
    })
}

struct Canonicalizer<'a> {
    schema: &'a Valid<Schema>,
    document: &'a Valid<ExecutableDocument>,
    hooks: &'a HookRegistry,
    variables: &'a JsonMap,
}

impl Canonicalizer<'_> {
    fn selections(
        &self,
        selections: &[Selection],
        visited_fragments: &mut HashSet<Name>,
    ) -> Result<Vec<CanonicalSelection>, Vec<Diagnostic>> {
        let mut canonical = Vec::new();
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    let projection = Projection::Field {
                        name: field.name.clone(),
                        response_key: field.response_key().clone(),
                    };
                    let Some(projection) = self.apply_directives(&field.directives, projection)?
                    else {
                        continue;
                    };
                    let response_key = match projection {
                        Projection::Field { response_key, .. } => response_key,
                        // Handlers cannot change the projection kind
                        _ => field.response_key().clone(),
                    };
                    // Subselections start their own fragment scope
                    let selections = self
                        .selections(&field.selection_set.selections, &mut HashSet::new())?;
                    canonical.push(CanonicalSelection::Field(CanonicalField {
                        definition: field.definition.clone(),
                        name: field.name.clone(),
                        response_key,
                        arguments: field.arguments.clone(),
                        selections,
                        location: field.name.location(),
                    }));
                }
                Selection::FragmentSpread(spread) => {
                    let projection = Projection::FragmentSpread {
                        fragment_name: spread.fragment_name.clone(),
                    };
                    if self
                        .apply_directives(&spread.directives, projection)?
                        .is_none()
                    {
                        continue;
                    }
                    // A repeated spread along one expansion path is a no-op;
                    // cycles are a validation error
                    if !visited_fragments.insert(spread.fragment_name.clone()) {
                        continue;
                    }
                    let Some(fragment) = self.document.fragments.get(&spread.fragment_name)
                    else {
                        continue;
                    };
                    let selections = self.selections(
                        &fragment.selection_set.selections,
                        &mut visited_fragments.clone(),
                    )?;
                    canonical.push(CanonicalSelection::Condition(CanonicalCondition {
                        type_condition: Some(fragment.type_condition().clone()),
                        selections,
                    }));
                }
                Selection::InlineFragment(inline) => {
                    let projection = Projection::InlineFragment {
                        type_condition: inline.type_condition.clone(),
                    };
                    if self
                        .apply_directives(&inline.directives, projection)?
                        .is_none()
                    {
                        continue;
                    }
                    // Each type-condition branch expands its own copy of the
                    // path, so the same fragment may appear under siblings
                    let selections = self.selections(
                        &inline.selection_set.selections,
                        &mut visited_fragments.clone(),
                    )?;
                    canonical.push(CanonicalSelection::Condition(CanonicalCondition {
                        type_condition: inline.type_condition.clone(),
                        selections,
                    }));
                }
            }
        }
        Ok(canonical)
    }

    /// Runs every handled directive on a selection, in document order.
    /// Directives without a registered handler pass through.
    fn apply_directives(
        &self,
        directives: &DirectiveList,
        mut projection: Projection,
    ) -> Result<Option<Projection>, Vec<Diagnostic>> {
        for directive in directives.iter() {
            let Some(handler) = self.hooks.directive(directive.name.as_str()) else {
                continue;
            };
            let arguments = match self
                .schema
                .directive_definitions
                .get(directive.name.as_str())
            {
                Some(definition) => coerce_argument_values(
                    self.schema,
                    self.hooks,
                    self.variables,
                    &format!("directive @{}", directive.name),
                    &definition.arguments,
                    &directive.arguments,
                )
                .map_err(|err| vec![err.into_diagnostic(&self.document.sources)])?,
                None => JsonMap::new(),
            };
            match handler.apply(projection, &arguments) {
                Some(next) => projection = next,
                None => return Ok(None),
            }
        }
        Ok(Some(projection))
    }
}
