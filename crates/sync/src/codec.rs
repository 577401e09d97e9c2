//! Mapping between remote project documents and [`Project`] records.
//!
//! Decoding is lenient: required fields are copied through
//! without type or enum checks, and a missing required field decodes to an
//! empty string. Temporal fields always come out canonical.

use agrireg_core::project::{NewProject, Project, ProjectUpdate};
use agrireg_core::timestamp::{normalize, now_canonical, RawTimestamp};
use agrireg_core::types::{DocumentId, UserId};

use crate::remote::{FieldValue, Fields, RawDocument};

/// Field names of a project document in the remote collection.
pub mod field {
    pub const USER_ID: &str = "userId";
    pub const NAME: &str = "name";
    pub const OWNER: &str = "owner";
    pub const LOCATION: &str = "location";
    pub const AREA: &str = "area";
    pub const STATUS: &str = "status";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const DESCRIPTION: &str = "description";
    pub const COORDINATES: &str = "coordinates";
    pub const SOIL_TYPE: &str = "soilType";
    pub const VEGETATION: &str = "vegetation";
    pub const WATER_RESOURCES: &str = "waterResources";
}

fn text(fields: &Fields, key: &str) -> String {
    fields.get(key).map(FieldValue::to_text).unwrap_or_default()
}

fn optional_text(fields: &Fields, key: &str) -> Option<String> {
    match fields.get(key) {
        None | Some(FieldValue::Null) => None,
        Some(value) => Some(value.to_text()),
    }
}

fn timestamp(fields: &Fields, key: &str) -> String {
    let raw = fields
        .get(key)
        .map_or(RawTimestamp::Unknown, FieldValue::as_raw_timestamp);
    normalize(&raw)
}

/// Decode one remote document. The document id always wins over any
/// `id`-like entry in the field bag.
pub fn decode_project(doc: &RawDocument) -> Project {
    let f = &doc.fields;
    Project {
        id: doc.id.clone(),
        owner_user_id: text(f, field::USER_ID),
        name: text(f, field::NAME),
        owner_name: text(f, field::OWNER),
        location: text(f, field::LOCATION),
        area: text(f, field::AREA),
        status: text(f, field::STATUS),
        created_at: timestamp(f, field::CREATED_AT),
        updated_at: timestamp(f, field::UPDATED_AT),
        description: optional_text(f, field::DESCRIPTION),
        coordinates: optional_text(f, field::COORDINATES),
        soil_type: optional_text(f, field::SOIL_TYPE),
        vegetation: optional_text(f, field::VEGETATION),
        water_resources: optional_text(f, field::WATER_RESOURCES),
    }
}

/// Decode a whole snapshot, preserving delivery order.
pub fn decode_snapshot(docs: &[RawDocument]) -> Vec<Project> {
    docs.iter().map(decode_project).collect()
}

fn put_optional(fields: &mut Fields, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        fields.insert(key.to_string(), FieldValue::text(v.clone()));
    }
}

/// Build the creation payload: supplied fields, the owning identity, and
/// server timestamp placeholders for both timestamps.
pub fn encode_new_project(input: &NewProject, owner: &str) -> Fields {
    let mut fields = Fields::from([
        (field::USER_ID.to_string(), FieldValue::text(owner)),
        (field::NAME.to_string(), FieldValue::text(input.name.clone())),
        (field::OWNER.to_string(), FieldValue::text(input.owner_name.clone())),
        (field::LOCATION.to_string(), FieldValue::text(input.location.clone())),
        (field::AREA.to_string(), FieldValue::text(input.area.clone())),
        (field::STATUS.to_string(), FieldValue::text(input.status.as_str())),
        (field::CREATED_AT.to_string(), FieldValue::ServerTimestamp),
        (field::UPDATED_AT.to_string(), FieldValue::ServerTimestamp),
    ]);
    put_optional(&mut fields, field::DESCRIPTION, &input.description);
    put_optional(&mut fields, field::COORDINATES, &input.coordinates);
    put_optional(&mut fields, field::SOIL_TYPE, &input.soil_type);
    put_optional(&mut fields, field::VEGETATION, &input.vegetation);
    put_optional(&mut fields, field::WATER_RESOURCES, &input.water_resources);
    fields
}

/// Build an update payload: only the supplied fields plus a refreshed
/// `updatedAt` placeholder.
pub fn encode_update(update: &ProjectUpdate) -> Fields {
    let mut fields = Fields::from([(field::UPDATED_AT.to_string(), FieldValue::ServerTimestamp)]);
    put_optional(&mut fields, field::NAME, &update.name);
    put_optional(&mut fields, field::OWNER, &update.owner_name);
    put_optional(&mut fields, field::LOCATION, &update.location);
    put_optional(&mut fields, field::AREA, &update.area);
    if let Some(status) = update.status {
        fields.insert(field::STATUS.to_string(), FieldValue::text(status.as_str()));
    }
    put_optional(&mut fields, field::DESCRIPTION, &update.description);
    put_optional(&mut fields, field::COORDINATES, &update.coordinates);
    put_optional(&mut fields, field::SOIL_TYPE, &update.soil_type);
    put_optional(&mut fields, field::VEGETATION, &update.vegetation);
    put_optional(&mut fields, field::WATER_RESOURCES, &update.water_resources);
    fields
}

/// The record handed back from a create call before the authoritative
/// version arrives: client wall clock for both timestamps.
pub fn optimistic_project(id: DocumentId, owner: UserId, input: NewProject) -> Project {
    let now = now_canonical();
    Project {
        id,
        owner_user_id: owner,
        name: input.name,
        owner_name: input.owner_name,
        location: input.location,
        area: input.area,
        status: input.status.as_str().to_string(),
        created_at: now.clone(),
        updated_at: now,
        description: input.description,
        coordinates: input.coordinates,
        soil_type: input.soil_type,
        vegetation: input.vegetation,
        water_resources: input.water_resources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrireg_core::project::ProjectStatus;
    use agrireg_core::timestamp::BackendTimestamp;
    use chrono::{TimeZone, Utc};

    fn jan_first() -> BackendTimestamp {
        BackendTimestamp::from_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn farm_a() -> RawDocument {
        RawDocument {
            id: "a".into(),
            fields: Fields::from([
                ("id".to_string(), FieldValue::text("spoofed")),
                (field::USER_ID.to_string(), FieldValue::text("u1")),
                (field::NAME.to_string(), FieldValue::text("Farm A")),
                (field::OWNER.to_string(), FieldValue::text("Ana")),
                (field::LOCATION.to_string(), FieldValue::text("Goiás")),
                (field::AREA.to_string(), FieldValue::Integer(150)),
                (field::STATUS.to_string(), FieldValue::text("active")),
                (field::CREATED_AT.to_string(), FieldValue::Timestamp(jan_first())),
                (field::UPDATED_AT.to_string(), FieldValue::text("2024-02-01T00:00:00.000Z")),
                (field::SOIL_TYPE.to_string(), FieldValue::text("Latossolo")),
                (field::VEGETATION.to_string(), FieldValue::Null),
            ]),
        }
    }

    #[test]
    fn decodes_document_into_record() {
        let project = decode_project(&farm_a());
        assert_eq!(project.id, "a");
        assert_eq!(project.owner_user_id, "u1");
        assert_eq!(project.area, "150");
        assert_eq!(project.created_at, "2024-01-01T00:00:00.000Z");
        assert_eq!(project.updated_at, "2024-02-01T00:00:00.000Z");
        assert_eq!(project.soil_type.as_deref(), Some("Latossolo"));
        assert_eq!(project.vegetation, None);
        assert_eq!(project.description, None);
    }

    #[test]
    fn invalid_status_and_missing_fields_pass_through() {
        let mut doc = farm_a();
        doc.fields
            .insert(field::STATUS.to_string(), FieldValue::text("archived"));
        doc.fields.remove(field::NAME);
        let project = decode_project(&doc);
        assert_eq!(project.status, "archived");
        assert_eq!(project.name, "");
    }

    #[test]
    fn pending_placeholder_decodes_to_now() {
        let mut doc = farm_a();
        doc.fields
            .insert(field::CREATED_AT.to_string(), FieldValue::ServerTimestamp);
        let project = decode_project(&doc);
        assert!(chrono::DateTime::parse_from_rfc3339(&project.created_at).is_ok());
        assert!(project.created_at.as_str() > "2024-01-01");
    }

    #[test]
    fn create_payload_carries_owner_and_placeholders() {
        let input = NewProject {
            name: "Farm B".into(),
            owner_name: "Bruno".into(),
            location: "Bahia".into(),
            area: "80".into(),
            status: ProjectStatus::Pending,
            description: Some("Riverside lot".into()),
            coordinates: None,
            soil_type: None,
            vegetation: None,
            water_resources: None,
        };
        let fields = encode_new_project(&input, "u9");
        assert_eq!(fields.get(field::USER_ID), Some(&FieldValue::text("u9")));
        assert_eq!(fields.get(field::STATUS), Some(&FieldValue::text("pending")));
        assert_eq!(fields.get(field::CREATED_AT), Some(&FieldValue::ServerTimestamp));
        assert_eq!(fields.get(field::UPDATED_AT), Some(&FieldValue::ServerTimestamp));
        assert!(fields.contains_key(field::DESCRIPTION));
        assert!(!fields.contains_key(field::COORDINATES));
    }

    #[test]
    fn update_payload_only_has_supplied_fields() {
        let update = ProjectUpdate {
            status: Some(ProjectStatus::Completed),
            ..Default::default()
        };
        let fields = encode_update(&update);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get(field::STATUS), Some(&FieldValue::text("completed")));
        assert_eq!(fields.get(field::UPDATED_AT), Some(&FieldValue::ServerTimestamp));
    }
}
