//! Project entity, its lifecycle status, and write DTOs.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{from_validation, CoreError};
use crate::types::{DocumentId, UserId};

// ---------------------------------------------------------------------------
// Project status
// ---------------------------------------------------------------------------

/// Lifecycle stage of a regularization project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Pending,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        Self::Active,
        Self::Pending,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Parse a status string as stored in the remote document.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(CoreError::Validation(format!(
                "Invalid project status '{s}'. Must be one of: active, pending, completed, cancelled"
            ))),
        }
    }

    /// Convert to the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label for list and dashboard views.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A decoded project record as held by the local project store.
///
/// `status` keeps whatever string the remote document carried; use
/// [`Project::status_kind`] for a typed view. Timestamps are canonical
/// ISO 8601 strings (see [`crate::timestamp`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: DocumentId,
    pub owner_user_id: UserId,
    pub name: String,
    pub owner_name: String,
    pub location: String,
    pub area: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegetation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_resources: Option<String>,
}

impl Project {
    /// The status as a known enum value, or `None` if the stored string is
    /// not one of the recognised statuses.
    pub fn status_kind(&self) -> Option<ProjectStatus> {
        ProjectStatus::from_str_db(&self.status).ok()
    }
}

/// Fields a consumer supplies when creating a project.
///
/// The owner identity and both timestamps are attached by the store.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub owner_name: String,
    #[validate(custom(function = "not_blank"))]
    pub location: String,
    #[validate(custom(function = "not_blank"))]
    pub area: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub coordinates: Option<String>,
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub vegetation: Option<String>,
    #[serde(default)]
    pub water_resources: Option<String>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Reject a new project whose name, owner, location or area is blank.
pub fn validate_new_project(input: &NewProject) -> Result<(), CoreError> {
    input.validate().map_err(|e| from_validation(&e))
}

/// Partial update. Only `Some` fields are written; the rest stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub owner_name: Option<String>,
    pub location: Option<String>,
    pub area: Option<String>,
    pub status: Option<ProjectStatus>,
    pub description: Option<String>,
    pub coordinates: Option<String>,
    pub soil_type: Option<String>,
    pub vegetation: Option<String>,
    pub water_resources: Option<String>,
}

impl ProjectUpdate {
    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
