//! # Managed Object-Model Backend
//!
//! Renders the schema set as a single C# source file of serializable model
//! classes. Every class implements the SDK's stream-serializer contract, so
//! one `Serialize` body covers both reading and writing. Wrapper classes
//! (dictionaries, optionals) are emitted only when some field actually
//! references them.

use crate::backend::{GeneratedFile, GenerationContext, GenerationOutput, SourceGenerator};
use crate::error::AppResult;
use crate::resolve::{resolve, TypeReference};
use crate::schema::{NamedSchema, SchemaNode};
use crate::synthesize::{synthesize, FieldDecl, FieldKind, ModelDeclaration, SchemaIndex};
use heck::ToPascalCase;
use std::collections::HashSet;

/// Output path of the combined model file.
pub const MODELS_FILE: &str = "Models.cs";

const PRIMITIVE_NAMES: &[&str] = &[
    "bool", "string", "byte", "Guid", "int", "short", "long", "float", "double",
];

/// The managed (C#) backend.
#[derive(Debug, Default)]
pub struct ManagedModelGenerator;

impl SourceGenerator for ManagedModelGenerator {
    fn target(&self) -> &'static str {
        "managed"
    }

    fn generate(&self, context: &GenerationContext) -> AppResult<GenerationOutput> {
        let index = SchemaIndex::new(&context.ordered_schemas);
        let mut sections: Vec<String> = Vec::new();
        let mut skipped = Vec::new();
        let mut used_wrappers: HashSet<String> = HashSet::new();

        for schema in &context.ordered_schemas {
            match &schema.node {
                SchemaNode::InlineObject { .. } => match synthesize(schema, &index) {
                    Ok(model) => {
                        for field in &model.fields {
                            if let Some(wrapper) = wrapper_usage(field) {
                                used_wrappers.insert(wrapper);
                            }
                        }
                        sections.push(render_model(&model));
                    }
                    Err(err) => skipped.push(err),
                },
                SchemaNode::Enum { values, .. } => {
                    // The declaration name wins over the node-level name; the
                    // two differ after a conflict rename.
                    sections.push(render_enum(&schema.name, values));
                }
                SchemaNode::Map { value } => match resolve(value) {
                    Ok(value_ref) => sections.push(render_map_schema(&schema.name, &value_ref)),
                    Err(err) => skipped.push(err.locate(&schema.name)),
                },
                // Top-level aliases, primitives and bare arrays have no
                // managed declaration; they surface through field types only.
                SchemaNode::ObjectRef { .. }
                | SchemaNode::Primitive { .. }
                | SchemaNode::Array { .. } => {}
            }
        }

        for schema in &context.ordered_schemas {
            for wrapper in wrapper_candidates(schema) {
                if used_wrappers.contains(&wrapper.name) {
                    sections.push(wrapper.source);
                }
            }
        }

        let content = assemble_file(&sections);
        Ok(GenerationOutput {
            files: vec![GeneratedFile {
                file_name: MODELS_FILE.to_string(),
                content,
            }],
            skipped,
        })
    }
}

fn assemble_file(sections: &[String]) -> String {
    let mut out = String::from(
        "// <auto-generated>\n// Generated by sdkgen. Manual edits will be overwritten.\n// </auto-generated>\n\nusing System;\n",
    );
    for section in sections {
        out.push('\n');
        out.push_str(section);
    }
    out
}

/// The C# declaration text for a resolved type.
fn csharp_type(ty: &TypeReference) -> String {
    match &ty.array_element_type {
        Some(element) => format!("{}[]", csharp_type(element)),
        None => ty.base_type.clone(),
    }
}

fn is_primitive_name(name: &str) -> bool {
    PRIMITIVE_NAMES.contains(&name)
}

/// The type a field is declared as: the resolved type when required, the
/// optional wrapper otherwise.
fn declared_type(field: &FieldDecl) -> String {
    if field.required {
        csharp_type(&field.ty)
    } else {
        field.ty.optional().base_type
    }
}

/// The wrapper class name a field's declaration pulls in, if any.
fn wrapper_usage(field: &FieldDecl) -> Option<String> {
    if !field.required {
        return Some(field.ty.optional().base_type);
    }
    if field.kind == FieldKind::Map {
        return Some(field.ty.base_type.clone());
    }
    None
}

/// Whether the field declaration carries a `new` initializer. Required
/// value-typed fields (primitives, arrays of anything) stay default.
fn needs_initializer(field: &FieldDecl) -> bool {
    if !field.required {
        return true;
    }
    match field.kind {
        FieldKind::Map | FieldKind::Enum => true,
        FieldKind::Array => false,
        FieldKind::Scalar => {
            field.ty.array_rank == 0 && !is_primitive_name(&field.ty.base_type)
        }
    }
}

fn render_model(model: &ModelDeclaration) -> String {
    let mut out = String::new();
    out.push_str("[Serializable]\n");
    out.push_str(&format!(
        "public partial class {} : JsonSerializable.ISerializable\n{{\n",
        model.name
    ));

    for field in &model.fields {
        let initializer = if needs_initializer(field) {
            format!(" = new {}()", declared_type(field))
        } else {
            String::new()
        };
        out.push_str(&format!(
            "\tpublic {} {}{};\n",
            declared_type(field),
            field.member_name,
            initializer
        ));
    }
    if !model.fields.is_empty() {
        out.push('\n');
    }

    out.push_str("\tpublic virtual void Serialize(JsonSerializable.IStreamSerializer s)\n\t{\n");
    for field in &model.fields {
        out.push_str(&render_serialization(field));
    }
    out.push_str("\t}\n}\n");
    out
}

/// The core serializer call for a field, with `target` as the ref argument.
fn serializer_call(field: &FieldDecl, target: &str) -> String {
    match field.kind {
        FieldKind::Scalar => format!("s.Serialize(\"{}\", ref {})", field.wire_name, target),
        FieldKind::Array => format!("s.SerializeArray(\"{}\", ref {})", field.wire_name, target),
        FieldKind::Map => {
            let value = field
                .ty
                .type_arguments
                .first()
                .map(csharp_type)
                .unwrap_or_default();
            format!(
                "s.SerializeDictionary<{}, {}>(\"{}\", ref {})",
                field.ty.base_type, value, field.wire_name, target
            )
        }
        FieldKind::Enum => format!(
            "s.SerializeEnum(\"{}\", ref {}, {}Extensions.ToEnumString, {}Extensions.FromEnumString)",
            field.wire_name, target, field.ty.base_type, field.ty.base_type
        ),
    }
}

fn render_serialization(field: &FieldDecl) -> String {
    if field.required {
        return format!("\t\t{};\n", serializer_call(field, &field.member_name));
    }
    let wrapper = field.ty.optional().base_type;
    let value_target = format!("{}.Value", field.member_name);
    format!(
        "\t\tif ((s.HasKey(\"{wire}\") || (({member} != default({wrapper})) && {member}.HasValue)))\n\t\t{{\n\t\t\t{call};\n\t\t\t{member}.HasValue = true;\n\t\t}}\n",
        wire = field.wire_name,
        member = field.member_name,
        wrapper = wrapper,
        call = serializer_call(field, &value_target),
    )
}

fn render_enum(name: &str, values: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("public enum {}\n{{\n", name));
    for value in values {
        out.push_str(&format!("\t{},\n", value.to_pascal_case()));
    }
    out.push_str("}\n\n");

    out.push_str(&format!("public static class {}Extensions\n{{\n", name));
    out.push_str(&format!(
        "\tpublic static string ToEnumString({} val)\n\t{{\n\t\tswitch (val)\n\t\t{{\n",
        name
    ));
    for value in values {
        out.push_str(&format!(
            "\t\t\tcase {}.{}: return \"{}\";\n",
            name,
            value.to_pascal_case(),
            value
        ));
    }
    out.push_str(
        "\t\t}\n\t\tthrow new ArgumentException(\"Unknown enum value\");\n\t}\n\n",
    );
    out.push_str(&format!(
        "\tpublic static {} FromEnumString(string str)\n\t{{\n\t\tswitch (str)\n\t\t{{\n",
        name
    ));
    for value in values {
        out.push_str(&format!(
            "\t\t\tcase \"{}\": return {}.{};\n",
            value,
            name,
            value.to_pascal_case()
        ));
    }
    out.push_str(
        "\t\t}\n\t\tthrow new ArgumentException(\"Unknown string value\");\n\t}\n}\n",
    );
    out
}

fn render_map_schema(name: &str, value_ref: &TypeReference) -> String {
    format!(
        "[Serializable]\npublic class {} : SerializableDictionaryStringToSomething<{}>\n{{\n}}\n",
        name,
        csharp_type(value_ref)
    )
}

struct WrapperDecl {
    name: String,
    source: String,
}

fn optional_wrapper(name: &str, base: &str, value_type: &str) -> WrapperDecl {
    WrapperDecl {
        name: name.to_string(),
        source: format!(
            "[Serializable]\npublic class {name} : {base}\n{{\n\tpublic {name}() {{ }}\n\n\tpublic {name}({value} value)\n\t{{\n\t\tHasValue = true;\n\t\tValue = value;\n\t}}\n}}\n",
            name = name,
            base = base,
            value = value_type
        ),
    }
}

/// The wrapper classes a schema can give rise to, in emission order.
///
/// Every declared type (record, dictionary or enum) can appear behind a
/// field as `MapOf{X}`, `Optional{X}`, `Optional{X}Array` or
/// `OptionalMapOf{X}`, so each gets the full candidate set; emission is
/// still gated on an actual field referencing the wrapper.
fn wrapper_candidates(schema: &NamedSchema) -> Vec<WrapperDecl> {
    let name = schema.name.as_str();
    match &schema.node {
        SchemaNode::InlineObject { .. } | SchemaNode::Map { .. } | SchemaNode::Enum { .. } => {
            vec![
                WrapperDecl {
                    name: format!("MapOf{}", name),
                    source: format!(
                        "[Serializable]\npublic class MapOf{name} : SerializableDictionaryStringToSomething<{name}>\n{{\n}}\n",
                        name = name
                    ),
                },
                optional_wrapper(
                    &format!("Optional{}", name),
                    &format!("Optional<{}>", name),
                    name,
                ),
                optional_wrapper(
                    &format!("Optional{}Array", name),
                    &format!("OptionalArray<{}>", name),
                    &format!("{}[]", name),
                ),
                WrapperDecl {
                    name: format!("OptionalMapOf{}", name),
                    source: format!(
                        "[Serializable]\npublic class OptionalMapOf{name} : OptionalSerializableDictionaryStringToSomething<{name}>\n{{\n}}\n",
                        name = name
                    ),
                },
            ]
        }
        SchemaNode::ObjectRef { .. } | SchemaNode::Primitive { .. } | SchemaNode::Array { .. } => {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::extract::{extract, ConflictResolutionStrategy};
    use pretty_assertions::assert_eq;

    fn generate_models(schema_block: &str) -> String {
        let source = format!(
            "openapi: 3.0.0\ninfo:\n  title: tests\n  version: 1.0.0\npaths: {{}}\ncomponents:\n  schemas:\n{}",
            schema_block
        );
        let document = Document::from_yaml(&source).expect("fixture should parse");
        let extraction =
            extract(&[document], ConflictResolutionStrategy::Strict).expect("extraction");
        let context = GenerationContext {
            ordered_schemas: extraction.ordered,
        };
        let output = ManagedModelGenerator
            .generate(&context)
            .expect("generation");
        assert!(output.skipped.is_empty(), "unexpected skips: {:?}", output.skipped);
        assert_eq!(output.files[0].file_name, MODELS_FILE);
        output.files[0].content.clone()
    }

    #[test]
    fn test_required_long_field() {
        let content = generate_models(
            r#"    Tuna:
      type: object
      required: [foo]
      properties:
        foo:
          type: integer
          format: int64
"#,
        );
        let expected = r#"[Serializable]
public partial class Tuna : JsonSerializable.ISerializable
{
	public long foo;

	public virtual void Serialize(JsonSerializable.IStreamSerializer s)
	{
		s.Serialize("foo", ref foo);
	}
}
"#;
        assert!(content.contains(expected), "content was:\n{}", content);
    }

    #[test]
    fn test_optional_long_field_is_guarded() {
        let content = generate_models(
            r#"    Tuna:
      type: object
      properties:
        foo:
          type: integer
          format: int64
"#,
        );
        assert!(content.contains("\tpublic OptionalLong foo = new OptionalLong();\n"));
        let expected_guard = r#"		if ((s.HasKey("foo") || ((foo != default(OptionalLong)) && foo.HasValue)))
		{
			s.Serialize("foo", ref foo.Value);
			foo.HasValue = true;
		}
"#;
        assert!(content.contains(expected_guard), "content was:\n{}", content);
    }

    #[test]
    fn test_reserved_wire_name_is_renamed_but_serialized_verbatim() {
        let content = generate_models(
            r#"    Tuna:
      type: object
      required: [if]
      properties:
        if:
          type: string
"#,
        );
        assert!(content.contains("\tpublic string ifKey;\n"));
        assert!(content.contains("\t\ts.Serialize(\"if\", ref ifKey);\n"));
    }

    #[test]
    fn test_required_map_of_long() {
        let content = generate_models(
            r#"    Tuna:
      type: object
      required: [scores]
      properties:
        scores:
          type: object
          additionalProperties:
            type: integer
            format: int64
"#,
        );
        assert!(content.contains("\tpublic MapOfLong scores = new MapOfLong();\n"));
        assert!(content
            .contains("\t\ts.SerializeDictionary<MapOfLong, long>(\"scores\", ref scores);\n"));
    }

    #[test]
    fn test_optional_map_of_long_array() {
        let content = generate_models(
            r#"    Tuna:
      type: object
      properties:
        scores:
          type: object
          additionalProperties:
            type: array
            items:
              type: integer
              format: int64
"#,
        );
        assert!(
            content.contains("\tpublic OptionalMapOfLongArray scores = new OptionalMapOfLongArray();\n")
        );
        assert!(content.contains(
            "\t\t\ts.SerializeDictionary<MapOfLongArray, long[]>(\"scores\", ref scores.Value);\n"
        ));
    }

    #[test]
    fn test_enum_schema_and_field() {
        let content = generate_models(
            r#"    Direction:
      type: string
      enum: [incoming, outgoing]
    Invite:
      type: object
      required: [direction]
      properties:
        direction:
          $ref: '#/components/schemas/Direction'
"#,
        );
        assert!(content.contains("public enum Direction\n{\n\tIncoming,\n\tOutgoing,\n}\n"));
        assert!(content.contains("\t\t\tcase Direction.Incoming: return \"incoming\";\n"));
        assert!(content.contains("\tpublic Direction direction = new Direction();\n"));
        assert!(content.contains(
            "\t\ts.SerializeEnum(\"direction\", ref direction, DirectionExtensions.ToEnumString, DirectionExtensions.FromEnumString);\n"
        ));
    }

    #[test]
    fn test_wrappers_only_emitted_when_referenced() {
        let content = generate_models(
            r#"    Fish:
      type: object
      properties: {}
    Tank:
      type: object
      properties:
        star:
          $ref: '#/components/schemas/Fish'
"#,
        );
        // Tank.star is optional, so OptionalFish is pulled in.
        assert!(content.contains("public class OptionalFish : Optional<Fish>"));
        // Nothing references the other Fish wrappers.
        assert!(!content.contains("MapOfFish"));
        assert!(!content.contains("OptionalFishArray"));
        // Tank itself is referenced by no field.
        assert!(!content.contains("OptionalTank"));
    }

    #[test]
    fn test_required_ref_array_has_no_initializer() {
        let content = generate_models(
            r#"    Fish:
      type: object
      properties: {}
    School:
      type: object
      required: [members]
      properties:
        members:
          type: array
          items:
            $ref: '#/components/schemas/Fish'
"#,
        );
        assert!(content.contains("\tpublic Fish[] members;\n"));
        assert!(content.contains("\t\ts.SerializeArray(\"members\", ref members);\n"));
    }

    #[test]
    fn test_named_map_schema_becomes_dictionary_class() {
        let content = generate_models(
            r#"    Scores:
      type: object
      additionalProperties:
        type: integer
        format: int64
"#,
        );
        assert!(content.contains(
            "[Serializable]\npublic class Scores : SerializableDictionaryStringToSomething<long>\n{\n}\n"
        ));
    }

    #[test]
    fn test_guid_field_is_plain_value() {
        let content = generate_models(
            r#"    Session:
      type: object
      required: [id]
      properties:
        id:
          type: string
          format: uuid
"#,
        );
        assert!(content.contains("\tpublic Guid id;\n"));
    }

    #[test]
    fn test_top_level_array_alias_has_no_declaration() {
        let content = generate_models(
            r#"    Names:
      type: array
      items:
        type: string
    Tuna:
      type: object
      required: [foo]
      properties:
        foo:
          type: integer
          format: int64
"#,
        );
        assert!(content.contains("public partial class Tuna"));
        assert!(!content.contains("Names"));
    }

    #[test]
    fn test_optional_enum_array_wrapper_is_declared() {
        let content = generate_models(
            r#"    Direction:
      type: string
      enum: [incoming, outgoing]
    Route:
      type: object
      properties:
        history:
          type: array
          items:
            $ref: '#/components/schemas/Direction'
"#,
        );
        assert!(
            content.contains("\tpublic OptionalDirectionArray history = new OptionalDirectionArray();\n")
        );
        assert!(content.contains("public class OptionalDirectionArray : OptionalArray<Direction>"));
        assert!(content.contains("\t\t\ts.SerializeArray(\"history\", ref history.Value);\n"));
    }

    #[test]
    fn test_map_of_enum_wrapper_is_declared() {
        let content = generate_models(
            r#"    Direction:
      type: string
      enum: [incoming, outgoing]
    Compass:
      type: object
      required: [readings]
      properties:
        readings:
          type: object
          additionalProperties:
            $ref: '#/components/schemas/Direction'
"#,
        );
        assert!(content.contains("\tpublic MapOfDirection readings = new MapOfDirection();\n"));
        assert!(content.contains(
            "public class MapOfDirection : SerializableDictionaryStringToSomething<Direction>"
        ));
    }

    #[test]
    fn test_models_emitted_in_dependency_order() {
        let content = generate_models(
            r#"    Tank:
      type: object
      required: [star]
      properties:
        star:
          $ref: '#/components/schemas/Fish'
    Fish:
      type: object
      properties: {}
"#,
        );
        let fish_at = content.find("class Fish").expect("Fish present");
        let tank_at = content.find("class Tank").expect("Tank present");
        assert!(fish_at < tank_at);
    }
}
