//! # Native Engine Backend
//!
//! Renders each record schema as a header/source pair for the native
//! engine SDK: a reflected struct declaration in `Public/AutoGen` and its
//! serializer body in `Private/AutoGen`. Enums become header-only
//! declarations.

use crate::backend::{GeneratedFile, GenerationContext, GenerationOutput, SourceGenerator};
use crate::error::AppResult;
use crate::resolve::TypeReference;
use crate::schema::SchemaNode;
use crate::synthesize::{synthesize, FieldDecl, FieldKind, ModelDeclaration, SchemaIndex};
use heck::ToPascalCase;

const PUBLIC_DIR: &str = "SdkCore/Public/AutoGen";
const PRIVATE_DIR: &str = "SdkCore/Private/AutoGen";

/// The native (header/source) backend.
#[derive(Debug, Default)]
pub struct NativeEngineGenerator;

impl SourceGenerator for NativeEngineGenerator {
    fn target(&self) -> &'static str {
        "native"
    }

    fn generate(&self, context: &GenerationContext) -> AppResult<GenerationOutput> {
        let index = SchemaIndex::new(&context.ordered_schemas);
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        for schema in &context.ordered_schemas {
            match &schema.node {
                SchemaNode::InlineObject { .. } => match synthesize(schema, &index) {
                    Ok(model) => {
                        files.push(GeneratedFile {
                            file_name: format!("{}/{}.h", PUBLIC_DIR, model.name),
                            content: render_struct_header(&model),
                        });
                        files.push(GeneratedFile {
                            file_name: format!("{}/{}.cpp", PRIVATE_DIR, model.name),
                            content: render_struct_source(&model),
                        });
                    }
                    Err(err) => skipped.push(err),
                },
                SchemaNode::Enum { values, .. } => {
                    files.push(GeneratedFile {
                        file_name: format!("{}/{}.h", PUBLIC_DIR, schema.name),
                        content: render_enum_header(&schema.name, values),
                    });
                }
                // Maps, aliases and primitives surface through field types
                // only; the engine maps them onto TMap and friends directly.
                SchemaNode::Map { .. }
                | SchemaNode::ObjectRef { .. }
                | SchemaNode::Primitive { .. }
                | SchemaNode::Array { .. } => {}
            }
        }

        Ok(GenerationOutput { files, skipped })
    }
}

fn native_base(name: &str, kind: FieldKind) -> String {
    match name {
        "bool" => "bool".to_string(),
        "string" => "FString".to_string(),
        "byte" => "uint8".to_string(),
        "Guid" => "FGuid".to_string(),
        "int" => "int32".to_string(),
        "short" => "int16".to_string(),
        "long" => "int64".to_string(),
        "float" => "float".to_string(),
        "double" => "double".to_string(),
        other if kind == FieldKind::Enum => format!("E{}", other),
        other => format!("F{}", other),
    }
}

/// The native declaration type of a field.
fn native_type(ty: &TypeReference, kind: FieldKind) -> String {
    if let Some(element) = &ty.array_element_type {
        return format!("TArray<{}>", native_type(element, kind));
    }
    if ty.is_map {
        let value = ty
            .type_arguments
            .first()
            .map(|value| native_type(value, FieldKind::Scalar))
            .unwrap_or_default();
        return format!("TMap<FString, {}>", value);
    }
    native_base(&ty.base_type, kind)
}

fn declared_type(field: &FieldDecl) -> String {
    let inner = native_type(&field.ty, field.kind);
    if field.required {
        inner
    } else {
        format!("FSdkOptional<{}>", inner)
    }
}

fn render_struct_header(model: &ModelDeclaration) -> String {
    let mut out = String::new();
    out.push_str("#pragma once\n\n#include \"CoreMinimal.h\"\n#include \"Serialization/SdkJsonSerializable.h\"\n");
    out.push_str(&format!("#include \"{}.generated.h\"\n\n", model.name));
    out.push_str("USTRUCT(BlueprintType)\n");
    out.push_str(&format!(
        "struct F{} : public FSdkJsonSerializable\n{{\n\tGENERATED_BODY()\n",
        model.name
    ));
    for field in &model.fields {
        out.push_str("\n\tUPROPERTY(EditAnywhere, BlueprintReadWrite)\n");
        out.push_str(&format!(
            "\t{} {};\n",
            declared_type(field),
            field.member_name
        ));
    }
    out.push_str("\n\tvirtual void Serialize(FSdkJsonSerializer& S) override;\n};\n");
    out
}

fn render_struct_source(model: &ModelDeclaration) -> String {
    let mut out = String::new();
    out.push_str(&format!("#include \"AutoGen/{}.h\"\n\n", model.name));
    out.push_str(&format!(
        "void F{}::Serialize(FSdkJsonSerializer& S)\n{{\n",
        model.name
    ));
    for field in &model.fields {
        let call = match field.kind {
            FieldKind::Scalar => format!(
                "S.Serialize(TEXT(\"{}\"), {})",
                field.wire_name, field.member_name
            ),
            FieldKind::Array => format!(
                "S.SerializeArray(TEXT(\"{}\"), {})",
                field.wire_name, field.member_name
            ),
            FieldKind::Map => format!(
                "S.SerializeMap(TEXT(\"{}\"), {})",
                field.wire_name, field.member_name
            ),
            FieldKind::Enum => format!(
                "S.SerializeEnum(TEXT(\"{}\"), {})",
                field.wire_name, field.member_name
            ),
        };
        if field.required {
            out.push_str(&format!("\t{};\n", call));
        } else {
            out.push_str(&format!(
                "\tif (S.HasKey(TEXT(\"{wire}\")) || {member}.IsSet)\n\t{{\n\t\t{call};\n\t\t{member}.IsSet = true;\n\t}}\n",
                wire = field.wire_name,
                member = field.member_name,
                call = match field.kind {
                    FieldKind::Scalar => format!(
                        "S.Serialize(TEXT(\"{}\"), {}.Value)",
                        field.wire_name, field.member_name
                    ),
                    FieldKind::Array => format!(
                        "S.SerializeArray(TEXT(\"{}\"), {}.Value)",
                        field.wire_name, field.member_name
                    ),
                    FieldKind::Map => format!(
                        "S.SerializeMap(TEXT(\"{}\"), {}.Value)",
                        field.wire_name, field.member_name
                    ),
                    FieldKind::Enum => format!(
                        "S.SerializeEnum(TEXT(\"{}\"), {}.Value)",
                        field.wire_name, field.member_name
                    ),
                }
            ));
        }
    }
    out.push_str("}\n");
    out
}

fn render_enum_header(name: &str, values: &[String]) -> String {
    let mut out = String::new();
    out.push_str("#pragma once\n\n#include \"CoreMinimal.h\"\n");
    out.push_str(&format!("#include \"{}.generated.h\"\n\n", name));
    out.push_str("UENUM(BlueprintType)\n");
    out.push_str(&format!("enum class E{} : uint8\n{{\n", name));
    for value in values {
        out.push_str(&format!("\t{},\n", value.to_pascal_case()));
    }
    out.push_str("};\n");
    out
}
