//! Document templates, generated documents, and data extracted from the
//! uploaded property PDF.
//!
//! Each template splits its fields into three groups:
//!
//! - **standard** — fixed or filled from the project record,
//! - **extracted** — read from the property PDF by the OCR service,
//! - **manual** — typed in by the user.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DocumentId;

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Standard,
    Extracted,
    Manual,
}

impl FieldType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "Standard field",
            Self::Extracted => "Extracted from PDF",
            Self::Manual => "Manual entry",
        }
    }
}

/// Optional format rules attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRules {
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub value: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<FieldRules>,
}

impl DocumentField {
    fn new(id: &str, label: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            value: String::new(),
            required,
            placeholder: None,
            rules: None,
        }
    }

    fn standard(id: &str, label: &str, value: &str) -> Self {
        Self {
            value: value.to_string(),
            ..Self::new(id, label, FieldType::Standard, true)
        }
    }

    fn extracted(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldType::Extracted, false)
    }

    fn manual(id: &str, label: &str, required: bool, placeholder: &str) -> Self {
        Self {
            placeholder: Some(placeholder.to_string()),
            ..Self::new(id, label, FieldType::Manual, required)
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    MemorialDescritivo,
    Requerimento,
    DeclaracaoLimites,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemorialDescritivo => "memorial_descritivo",
            Self::Requerimento => "requerimento",
            Self::DeclaracaoLimites => "declaracao_limites",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: DocumentKind,
    pub standard_fields: Vec<DocumentField>,
    pub extracted_fields: Vec<DocumentField>,
    pub manual_fields: Vec<DocumentField>,
}

impl DocumentTemplate {
    /// All fields in form order: standard, extracted, manual.
    pub fn all_fields(&self) -> Vec<DocumentField> {
        self.standard_fields
            .iter()
            .chain(&self.extracted_fields)
            .chain(&self.manual_fields)
            .cloned()
            .collect()
    }
}

/// Field id for the applicant's CPF, which carries a format rule.
pub const FIELD_CPF: &str = "cpf_requerente";

/// Standard field ids that are bound to project attributes.
pub const FIELD_PROPERTY_NAME: &str = "nome_imovel";
pub const FIELD_PROPRIETOR: &str = "proprietario";
pub const FIELD_MUNICIPALITY: &str = "municipio";

/// CPF format: `000.000.000-00`.
pub const CPF_PATTERN: &str = r"^[0-9]{3}\.[0-9]{3}\.[0-9]{3}-[0-9]{2}$";

fn cpf_field() -> DocumentField {
    DocumentField {
        rules: Some(FieldRules {
            pattern: Some(CPF_PATTERN.to_string()),
            ..Default::default()
        }),
        ..DocumentField::manual(FIELD_CPF, "Applicant CPF", true, "000.000.000-00")
    }
}

fn project_fields() -> Vec<DocumentField> {
    vec![
        DocumentField::standard(FIELD_PROPERTY_NAME, "Property name", ""),
        DocumentField::standard(FIELD_PROPRIETOR, "Proprietor", ""),
        DocumentField::standard(FIELD_MUNICIPALITY, "Municipality", ""),
    ]
}

/// The built-in template catalog.
pub fn builtin_templates() -> Vec<DocumentTemplate> {
    vec![
        DocumentTemplate {
            id: "memorial-descritivo".into(),
            name: "Memorial Descritivo".into(),
            description: "Technical description of the property perimeter and land use".into(),
            kind: DocumentKind::MemorialDescritivo,
            standard_fields: project_fields(),
            extracted_fields: vec![
                DocumentField::extracted("area_total", "Total area"),
                DocumentField::extracted("coordenadas", "Coordinates"),
                DocumentField::extracted("tipo_solo", "Soil type"),
                DocumentField::extracted("vegetacao_nativa", "Native vegetation"),
                DocumentField::extracted("recursos_hidricos", "Water resources"),
            ],
            manual_fields: vec![
                DocumentField::manual("nome_requerente", "Applicant name", true, "Full name"),
                cpf_field(),
                DocumentField::manual(
                    "responsavel_tecnico",
                    "Technical lead",
                    true,
                    "Name and registration number",
                ),
            ],
        },
        DocumentTemplate {
            id: "requerimento".into(),
            name: "Requerimento".into(),
            description: "Formal regularization request to the land agency".into(),
            kind: DocumentKind::Requerimento,
            standard_fields: project_fields(),
            extracted_fields: vec![
                DocumentField::extracted("area_requerida", "Requested area"),
                DocumentField::extracted("localizacao_exata", "Exact location"),
            ],
            manual_fields: vec![
                DocumentField::manual("nome_requerente", "Applicant name", true, "Full name"),
                cpf_field(),
                DocumentField::manual("finalidade", "Purpose", true, "Purpose of the request"),
                DocumentField::manual("telefone", "Phone", false, "(00) 00000-0000"),
            ],
        },
        DocumentTemplate {
            id: "declaracao-limites".into(),
            name: "Declaração de Limites".into(),
            description: "Boundary declaration signed with neighbouring owners".into(),
            kind: DocumentKind::DeclaracaoLimites,
            standard_fields: project_fields(),
            extracted_fields: vec![
                DocumentField::extracted("area_impacto", "Impact area"),
                DocumentField::extracted("limites_ambientais", "Environmental limits"),
                DocumentField::extracted("coordenadas", "Coordinates"),
            ],
            manual_fields: vec![
                DocumentField::manual(
                    "confrontantes",
                    "Neighbouring owners",
                    true,
                    "Names of bordering owners",
                ),
                cpf_field(),
            ],
        },
    ]
}

/// Look up a built-in template by id.
pub fn find_template(id: &str) -> Result<DocumentTemplate, CoreError> {
    builtin_templates()
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| CoreError::NotFound {
            entity: "document_template",
            id: id.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Extracted data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Processing,
    Completed,
    Failed,
}

/// Values the OCR service read from a project's property PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    pub project_id: DocumentId,
    pub pdf_url: String,
    pub extracted_fields: BTreeMap<String, String>,
    pub confidence: f32,
    pub extracted_at: String,
    pub status: ExtractionStatus,
}

impl ExtractedData {
    /// A usable value for `field_id`. Blank values and results from an
    /// extraction that has not completed count as missing.
    pub fn value_for(&self, field_id: &str) -> Option<&str> {
        if self.status != ExtractionStatus::Completed {
            return None;
        }
        self.extracted_fields
            .get(field_id)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Generated documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Completed,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    pub id: String,
    pub project_id: DocumentId,
    pub template_id: String,
    pub name: String,
    pub kind: DocumentKind,
    pub fields: Vec<DocumentField>,
    pub status: DocumentStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique_and_findable() {
        let templates = builtin_templates();
        assert_eq!(templates.len(), 3);
        for t in &templates {
            assert_eq!(find_template(&t.id).unwrap().kind, t.kind);
        }
        assert!(find_template("nope").is_err());
    }

    #[test]
    fn all_fields_keeps_group_order() {
        let template = find_template("requerimento").unwrap();
        let types: Vec<FieldType> = template.all_fields().iter().map(|f| f.field_type).collect();
        let first_manual = types.iter().position(|t| *t == FieldType::Manual).unwrap();
        assert!(types[..first_manual]
            .iter()
            .all(|t| *t != FieldType::Manual));
        assert_eq!(types[0], FieldType::Standard);
    }

    #[test]
    fn extracted_value_requires_completed_status() {
        let mut data = ExtractedData {
            project_id: "p1".into(),
            pdf_url: "https://files.example.com/p1.pdf".into(),
            extracted_fields: BTreeMap::from([
                ("area_total".to_string(), "150 hectares".to_string()),
                ("tipo_solo".to_string(), "  ".to_string()),
            ]),
            confidence: 0.92,
            extracted_at: "2024-01-01T00:00:00.000Z".into(),
            status: ExtractionStatus::Completed,
        };
        assert_eq!(data.value_for("area_total"), Some("150 hectares"));
        assert_eq!(data.value_for("tipo_solo"), None);
        assert_eq!(data.value_for("coordenadas"), None);

        data.status = ExtractionStatus::Processing;
        assert_eq!(data.value_for("area_total"), None);
    }

    #[test]
    fn field_type_serializes_as_type_key() {
        let field = cpf_field();
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "manual");
        assert_eq!(json["rules"]["pattern"], CPF_PATTERN);
    }
}
