//! Document-generation wizard.
//!
//! Three steps: pick a template, fill in its fields, and receive the
//! generated document. The wizard owns the form state for one project;
//! the caller drives it with the step operations below and renders
//! whatever [`DocumentWizard::fields`] and [`DocumentWizard::errors`]
//! report.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::{
    find_template, DocumentField, DocumentStatus, DocumentTemplate, ExtractedData, FieldType,
    GeneratedDocument, FIELD_MUNICIPALITY, FIELD_PROPERTY_NAME, FIELD_PROPRIETOR,
};
use crate::error::CoreError;
use crate::project::Project;
use crate::timestamp::now_canonical;

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    SelectTemplate,
    FillFields,
    Generated,
}

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 3;

impl WizardStep {
    /// Convert a 1-based step number to a `WizardStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::SelectTemplate),
            2 => Ok(Self::FillFields),
            3 => Ok(Self::Generated),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    /// Convert to a 1-based step number.
    pub fn to_number(self) -> u8 {
        match self {
            Self::SelectTemplate => 1,
            Self::FillFields => 2,
            Self::Generated => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SelectTemplate => "Select Template",
            Self::FillFields => "Fill Fields",
            Self::Generated => "Generated",
        }
    }
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

pub struct DocumentWizard {
    project: Project,
    extracted: Option<ExtractedData>,
    step: WizardStep,
    template: Option<DocumentTemplate>,
    fields: Vec<DocumentField>,
    /// Compiled format rules of the selected template, by field id.
    patterns: BTreeMap<String, Regex>,
    errors: BTreeMap<String, String>,
    generated: Option<GeneratedDocument>,
}

impl DocumentWizard {
    /// Start a wizard for `project`. `extracted` carries the OCR results
    /// for the project's PDF, if any.
    pub fn new(project: Project, extracted: Option<ExtractedData>) -> Self {
        Self {
            project,
            extracted,
            step: WizardStep::SelectTemplate,
            template: None,
            fields: Vec::new(),
            patterns: BTreeMap::new(),
            errors: BTreeMap::new(),
            generated: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn template(&self) -> Option<&DocumentTemplate> {
        self.template.as_ref()
    }

    pub fn fields(&self) -> &[DocumentField] {
        &self.fields
    }

    /// Fields of one group, in template order.
    pub fn fields_of(&self, field_type: FieldType) -> impl Iterator<Item = &DocumentField> {
        self.fields.iter().filter(move |f| f.field_type == field_type)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn generated(&self) -> Option<&GeneratedDocument> {
        self.generated.as_ref()
    }

    /// Step 1 → 2. Loads the template's fields, fills project-bound standard
    /// fields and any extracted values.
    pub fn select_template(&mut self, template_id: &str) -> Result<(), CoreError> {
        self.expect_step(WizardStep::SelectTemplate)?;
        let template = find_template(template_id)?;
        let fields = template.all_fields();
        self.patterns = compile_patterns(&fields)?;

        self.fields = fields
            .into_iter()
            .map(|mut field| {
                match field.field_type {
                    FieldType::Standard => {
                        if let Some(value) = project_value(&self.project, &field.id) {
                            field.value = value.to_string();
                        }
                    }
                    FieldType::Extracted => {
                        if let Some(value) =
                            self.extracted.as_ref().and_then(|d| d.value_for(&field.id))
                        {
                            field.value = value.to_string();
                        }
                    }
                    FieldType::Manual => {}
                }
                field
            })
            .collect();
        self.template = Some(template);
        self.errors.clear();
        self.step = WizardStep::FillFields;
        Ok(())
    }

    /// Set a field's value while filling the form. Clears that field's error.
    pub fn set_field_value(
        &mut self,
        field_id: &str,
        value: impl Into<String>,
    ) -> Result<(), CoreError> {
        self.expect_step(WizardStep::FillFields)?;
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == field_id)
            .ok_or_else(|| CoreError::NotFound {
                entity: "document_field",
                id: field_id.to_string(),
            })?;
        field.value = value.into();
        self.errors.remove(field_id);
        Ok(())
    }

    /// Re-check every field and record one message per failing field.
    /// Returns `true` when the form is valid.
    pub fn validate(&mut self) -> bool {
        self.errors = self
            .fields
            .iter()
            .filter_map(|f| {
                validate_field(f, self.patterns.get(&f.id)).map(|msg| (f.id.clone(), msg))
            })
            .collect();
        self.errors.is_empty()
    }

    /// Step 2 → 3. Validates and produces the generated document.
    pub fn generate(&mut self) -> Result<GeneratedDocument, CoreError> {
        self.expect_step(WizardStep::FillFields)?;
        if !self.validate() {
            let ids: Vec<&str> = self.errors.keys().map(String::as_str).collect();
            return Err(CoreError::Validation(format!(
                "Document fields are invalid: {}",
                ids.join(", ")
            )));
        }
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| CoreError::Internal("No template selected".to_string()))?;

        let now = now_canonical();
        let document = GeneratedDocument {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: self.project.id.clone(),
            template_id: template.id.clone(),
            name: format!("{} - {}", template.name, self.project.name),
            kind: template.kind,
            fields: self.fields.clone(),
            status: DocumentStatus::Generated,
            created_at: now.clone(),
            updated_at: now.clone(),
            generated_at: Some(now),
            file_url: None,
        };
        self.generated = Some(document.clone());
        self.step = WizardStep::Generated;
        Ok(document)
    }

    /// Step 2 → 1, discarding the selected template and its form state.
    pub fn back(&mut self) -> Result<(), CoreError> {
        self.expect_step(WizardStep::FillFields)?;
        self.clear();
        Ok(())
    }

    /// Return to step 1 from anywhere.
    pub fn reset(&mut self) {
        self.clear();
        self.generated = None;
    }

    fn clear(&mut self) {
        self.template = None;
        self.fields.clear();
        self.patterns.clear();
        self.errors.clear();
        self.step = WizardStep::SelectTemplate;
    }

    fn expect_step(&self, expected: WizardStep) -> Result<(), CoreError> {
        if self.step != expected {
            return Err(CoreError::Validation(format!(
                "Operation requires step {} ({}), wizard is on step {} ({})",
                expected.to_number(),
                expected.label(),
                self.step.to_number(),
                self.step.label(),
            )));
        }
        Ok(())
    }
}

/// Value of a project-bound standard field.
fn project_value<'a>(project: &'a Project, field_id: &str) -> Option<&'a str> {
    match field_id {
        FIELD_PROPERTY_NAME => Some(&project.name),
        FIELD_PROPRIETOR => Some(&project.owner_name),
        FIELD_MUNICIPALITY => Some(&project.location),
        _ => None,
    }
}

/// Compile every field's format rule once per template selection.
fn compile_patterns(fields: &[DocumentField]) -> Result<BTreeMap<String, Regex>, CoreError> {
    let mut patterns = BTreeMap::new();
    for field in fields {
        if let Some(pattern) = field.rules.as_ref().and_then(|r| r.pattern.as_deref()) {
            let re = Regex::new(pattern).map_err(|e| {
                CoreError::Internal(format!("Field {} has an invalid format rule: {e}", field.id))
            })?;
            patterns.insert(field.id.clone(), re);
        }
    }
    Ok(patterns)
}

/// Check one field against its rules. `pattern` is the field's compiled
/// format rule. Returns the error message, if any.
fn validate_field(field: &DocumentField, pattern: Option<&Regex>) -> Option<String> {
    let value = field.value.trim();
    if value.is_empty() {
        return field.required.then(|| format!("{} is required", field.label));
    }
    let rules = field.rules.as_ref()?;
    let len = value.chars().count();
    if let Some(min) = rules.min_length {
        if len < min {
            return Some(format!("{} must be at least {min} characters", field.label));
        }
    }
    if let Some(max) = rules.max_length {
        if len > max {
            return Some(format!("{} must be at most {max} characters", field.label));
        }
    }
    match pattern {
        Some(re) if !re.is_match(&field.value) => Some(format!(
            "{} must match the format {}",
            field.label,
            field.placeholder.as_deref().unwrap_or(re.as_str())
        )),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
