//! Resolvers for the schema-introspection meta-types.
//!
//! These back the `__schema` and `__type` meta-fields when
//! [`crate::EngineSettings::enable_schema_introspection`] is set, reading
//! straight from the analyzed schema.

use std::borrow::Cow;

use apollo_compiler::ast::Directive;
use apollo_compiler::schema::ComponentName;
use apollo_compiler::schema::DirectiveDefinition;
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::schema::FieldDefinition;
use apollo_compiler::schema::InputValueDefinition;
use apollo_compiler::schema::Type;
use apollo_compiler::validation::Valid;
use apollo_compiler::Name;
use apollo_compiler::Schema;

use crate::execution::resolver::ObjectValue;
use crate::execution::resolver::ResolveError;
use crate::execution::resolver::ResolveInfo;
use crate::execution::resolver::ResolvedValue;
use crate::response::JsonValue;

/// The `__schema` meta-field.
pub(crate) struct SchemaMetaField;

impl ObjectValue for SchemaMetaField {
    fn type_name(&self) -> &str {
        "__Schema"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        let schema = info.schema();
        Ok(match info.field_name() {
            "description" => {
                ResolvedValue::leaf(schema.schema_definition.description.as_deref())
            }
            "types" => ResolvedValue::list(
                schema
                    .types
                    .values()
                    .map(|def| ResolvedValue::object(TypeDef { def })),
            ),
            "queryType" => root_type_def(schema, schema.schema_definition.query.as_ref()),
            "mutationType" => root_type_def(schema, schema.schema_definition.mutation.as_ref()),
            "subscriptionType" => {
                root_type_def(schema, schema.schema_definition.subscription.as_ref())
            }
            "directives" => ResolvedValue::list(
                schema
                    .directive_definitions
                    .values()
                    .map(|def| ResolvedValue::object(DirectiveDef { def })),
            ),
            _ => return Err(ResolveError::unknown_field("__Schema", info.field_name())),
        })
    }
}

/// The `__type(name:)` meta-field.
pub(crate) fn type_def<'a>(schema: &'a Valid<Schema>, name: &str) -> ResolvedValue<'a> {
    ResolvedValue::opt_object(schema.types.get(name).map(|def| TypeDef { def }))
}

fn root_type_def<'a>(
    schema: &'a Valid<Schema>,
    name: Option<&ComponentName>,
) -> ResolvedValue<'a> {
    ResolvedValue::opt_object(
        name.and_then(|name| schema.types.get(name.name.as_str()))
            .map(|def| TypeDef { def }),
    )
}

/// A `__Type` backed by a named type definition.
struct TypeDef<'a> {
    def: &'a ExtendedType,
}

impl ObjectValue for TypeDef<'_> {
    fn type_name(&self) -> &str {
        "__Type"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        let schema = info.schema();
        let def = self.def;
        Ok(match info.field_name() {
            "kind" => ResolvedValue::leaf(match def {
                ExtendedType::Scalar(_) => "SCALAR",
                ExtendedType::Object(_) => "OBJECT",
                ExtendedType::Interface(_) => "INTERFACE",
                ExtendedType::Union(_) => "UNION",
                ExtendedType::Enum(_) => "ENUM",
                ExtendedType::InputObject(_) => "INPUT_OBJECT",
            }),
            "name" => ResolvedValue::leaf(def_name(def).as_str()),
            "description" => ResolvedValue::leaf(def_description(def)),
            "fields" => match def {
                ExtendedType::Object(def) => {
                    field_defs(info, def.fields.values().map(|field| &***field))
                }
                ExtendedType::Interface(def) => {
                    field_defs(info, def.fields.values().map(|field| &***field))
                }
                _ => ResolvedValue::null(),
            },
            "interfaces" => match def {
                ExtendedType::Object(def) => {
                    interface_defs(schema, def.implements_interfaces.iter())
                }
                ExtendedType::Interface(def) => {
                    interface_defs(schema, def.implements_interfaces.iter())
                }
                _ => ResolvedValue::null(),
            },
            "possibleTypes" => match def {
                ExtendedType::Interface(def) => {
                    let interface_name = &def.name;
                    ResolvedValue::list(schema.types.values().filter_map(move |candidate| {
                        match candidate {
                            ExtendedType::Object(object)
                                if object
                                    .implements_interfaces
                                    .iter()
                                    .any(|implemented| implemented.name == *interface_name) =>
                            {
                                Some(ResolvedValue::object(TypeDef { def: candidate }))
                            }
                            _ => None,
                        }
                    }))
                }
                ExtendedType::Union(def) => {
                    ResolvedValue::list(def.members.iter().filter_map(move |member| {
                        schema
                            .types
                            .get(member.name.as_str())
                            .map(|def| ResolvedValue::object(TypeDef { def }))
                    }))
                }
                _ => ResolvedValue::null(),
            },
            "enumValues" => match def {
                ExtendedType::Enum(def) => {
                    let include_deprecated = include_deprecated(info);
                    ResolvedValue::list(def.values.values().filter_map(move |value| {
                        if !include_deprecated && value.directives.get("deprecated").is_some() {
                            return None;
                        }
                        Some(ResolvedValue::object(EnumValueDef { def: &***value }))
                    }))
                }
                _ => ResolvedValue::null(),
            },
            "inputFields" => match def {
                ExtendedType::InputObject(def) => {
                    input_values(info, def.fields.values().map(|field| &***field))
                }
                _ => ResolvedValue::null(),
            },
            "ofType" => ResolvedValue::null(),
            "specifiedByURL" => match def {
                ExtendedType::Scalar(def) => ResolvedValue::leaf(
                    def.directives
                        .get("specifiedBy")
                        .and_then(|directive| directive.specified_argument_by_name("url"))
                        .and_then(|value| value.as_str()),
                ),
                _ => ResolvedValue::null(),
            },
            "isOneOf" => match def {
                ExtendedType::InputObject(def) => {
                    ResolvedValue::leaf(def.directives.get("oneOf").is_some())
                }
                _ => ResolvedValue::null(),
            },
            _ => return Err(ResolveError::unknown_field("__Type", info.field_name())),
        })
    }
}

/// A `__Type` for a list or non-null wrapper. Named types are always
/// resolved through `TypeDef`.
enum WrapperType<'a> {
    /// Holds the element type.
    List(Cow<'a, Type>),
    /// Holds the nullable counterpart.
    NonNull(Cow<'a, Type>),
}

impl ObjectValue for WrapperType<'_> {
    fn type_name(&self) -> &str {
        "__Type"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        Ok(match info.field_name() {
            "kind" => ResolvedValue::leaf(match self {
                WrapperType::List(_) => "LIST",
                WrapperType::NonNull(_) => "NON_NULL",
            }),
            "ofType" => match self {
                WrapperType::List(inner) | WrapperType::NonNull(inner) => {
                    ty(info.schema(), inner)
                }
            },
            "name" | "description" | "fields" | "interfaces" | "possibleTypes" | "enumValues"
            | "inputFields" | "specifiedByURL" | "isOneOf" => ResolvedValue::null(),
            _ => return Err(ResolveError::unknown_field("__Type", info.field_name())),
        })
    }
}

/// A `__Type` for any type reference.
fn ty<'a>(schema: &'a Valid<Schema>, ty: &'a Type) -> ResolvedValue<'a> {
    match ty {
        Type::Named(name) => type_def(schema, name.as_str()),
        Type::List(inner) => {
            ResolvedValue::object(WrapperType::List(Cow::Borrowed(inner)))
        }
        Type::NonNullNamed(name) => ResolvedValue::object(WrapperType::NonNull(
            Cow::Owned(Type::Named(name.clone())),
        )),
        Type::NonNullList(inner) => ResolvedValue::object(WrapperType::NonNull(
            Cow::Owned(Type::List(inner.clone())),
        )),
    }
}

/// A `__Field`.
struct FieldDef<'a> {
    def: &'a FieldDefinition,
}

impl ObjectValue for FieldDef<'_> {
    fn type_name(&self) -> &str {
        "__Field"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        Ok(match info.field_name() {
            "name" => ResolvedValue::leaf(self.def.name.as_str()),
            "description" => ResolvedValue::leaf(self.def.description.as_deref()),
            "args" => input_values(info, self.def.arguments.iter().map(|arg| &**arg)),
            "type" => ty(info.schema(), &self.def.ty),
            "isDeprecated" => {
                ResolvedValue::leaf(self.def.directives.get("deprecated").is_some())
            }
            "deprecationReason" => deprecation_reason(
                self.def.directives.get("deprecated").map(|d| &**d),
            ),
            _ => return Err(ResolveError::unknown_field("__Field", info.field_name())),
        })
    }
}

/// An `__EnumValue`.
struct EnumValueDef<'a> {
    def: &'a apollo_compiler::schema::EnumValueDefinition,
}

impl ObjectValue for EnumValueDef<'_> {
    fn type_name(&self) -> &str {
        "__EnumValue"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        Ok(match info.field_name() {
            "name" => ResolvedValue::leaf(self.def.value.as_str()),
            "description" => ResolvedValue::leaf(self.def.description.as_deref()),
            "isDeprecated" => {
                ResolvedValue::leaf(self.def.directives.get("deprecated").is_some())
            }
            "deprecationReason" => deprecation_reason(
                self.def.directives.get("deprecated").map(|d| &**d),
            ),
            _ => return Err(ResolveError::unknown_field("__EnumValue", info.field_name())),
        })
    }
}

/// An `__InputValue`.
struct InputValueDef<'a> {
    def: &'a InputValueDefinition,
}

impl ObjectValue for InputValueDef<'_> {
    fn type_name(&self) -> &str {
        "__InputValue"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        Ok(match info.field_name() {
            "name" => ResolvedValue::leaf(self.def.name.as_str()),
            "description" => ResolvedValue::leaf(self.def.description.as_deref()),
            "type" => ty(info.schema(), &self.def.ty),
            "defaultValue" => ResolvedValue::leaf(
                self.def
                    .default_value
                    .as_ref()
                    .map(|value| value.to_string()),
            ),
            "isDeprecated" => {
                ResolvedValue::leaf(self.def.directives.get("deprecated").is_some())
            }
            "deprecationReason" => deprecation_reason(
                self.def.directives.get("deprecated").map(|d| &**d),
            ),
            _ => return Err(ResolveError::unknown_field("__InputValue", info.field_name())),
        })
    }
}

/// A `__Directive`.
struct DirectiveDef<'a> {
    def: &'a DirectiveDefinition,
}

impl ObjectValue for DirectiveDef<'_> {
    fn type_name(&self) -> &str {
        "__Directive"
    }

    fn resolve_field<'a>(
        &'a self,
        info: &'a ResolveInfo<'a>,
    ) -> Result<ResolvedValue<'a>, ResolveError> {
        Ok(match info.field_name() {
            "name" => ResolvedValue::leaf(self.def.name.as_str()),
            "description" => ResolvedValue::leaf(self.def.description.as_deref()),
            "locations" => ResolvedValue::list(
                self.def
                    .locations
                    .iter()
                    .map(|location| ResolvedValue::leaf(location.name())),
            ),
            "args" => input_values(info, self.def.arguments.iter().map(|arg| &**arg)),
            "isRepeatable" => ResolvedValue::leaf(self.def.repeatable),
            _ => return Err(ResolveError::unknown_field("__Directive", info.field_name())),
        })
    }
}

fn def_name(def: &ExtendedType) -> &Name {
    match def {
        ExtendedType::Scalar(def) => &def.name,
        ExtendedType::Object(def) => &def.name,
        ExtendedType::Interface(def) => &def.name,
        ExtendedType::Union(def) => &def.name,
        ExtendedType::Enum(def) => &def.name,
        ExtendedType::InputObject(def) => &def.name,
    }
}

fn def_description(def: &ExtendedType) -> Option<&str> {
    match def {
        ExtendedType::Scalar(def) => def.description.as_deref(),
        ExtendedType::Object(def) => def.description.as_deref(),
        ExtendedType::Interface(def) => def.description.as_deref(),
        ExtendedType::Union(def) => def.description.as_deref(),
        ExtendedType::Enum(def) => def.description.as_deref(),
        ExtendedType::InputObject(def) => def.description.as_deref(),
    }
}

fn include_deprecated(info: &ResolveInfo<'_>) -> bool {
    info.argument("includeDeprecated").and_then(JsonValue::as_bool) == Some(true)
}

fn field_defs<'a>(
    info: &ResolveInfo<'a>,
    fields: impl Iterator<Item = &'a FieldDefinition> + 'a,
) -> ResolvedValue<'a> {
    let include_deprecated = include_deprecated(info);
    ResolvedValue::list(fields.filter_map(move |def| {
        if !include_deprecated && def.directives.get("deprecated").is_some() {
            return None;
        }
        Some(ResolvedValue::object(FieldDef { def }))
    }))
}

fn interface_defs<'a>(
    schema: &'a Valid<Schema>,
    interfaces: impl Iterator<Item = &'a ComponentName> + 'a,
) -> ResolvedValue<'a> {
    ResolvedValue::list(interfaces.filter_map(move |interface| {
        schema
            .types
            .get(interface.name.as_str())
            .map(|def| ResolvedValue::object(TypeDef { def }))
    }))
}

fn input_values<'a>(
    info: &ResolveInfo<'a>,
    defs: impl Iterator<Item = &'a InputValueDefinition> + 'a,
) -> ResolvedValue<'a> {
    let include_deprecated = include_deprecated(info);
    ResolvedValue::list(defs.filter_map(move |def| {
        if !include_deprecated && def.directives.get("deprecated").is_some() {
            return None;
        }
        Some(ResolvedValue::object(InputValueDef { def }))
    }))
}

fn deprecation_reason(directive: Option<&Directive>) -> ResolvedValue<'_> {
    ResolvedValue::leaf(
        directive
            .and_then(|directive| directive.specified_argument_by_name("reason"))
            .and_then(|value| value.as_str()),
    )
}
