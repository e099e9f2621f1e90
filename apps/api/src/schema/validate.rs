//! Normalizes an untrusted JSON value into a `ResumeContent`, or rejects it
//! with the first offending field path. Runs on the client before every
//! persistence attempt and again on the server for create/update.
//!
//! Idempotent by construction: normalizing the serialized form of a valid
//! document returns it unchanged.

use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

use crate::schema::content::{
    CreationMode, EducationEntry, ExperienceEntry, PersonalInfo, ProjectEntry, ResumeContent,
    SocialLink,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the first offending field, e.g. `experience[2].position`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Normalizes an arbitrary JSON value into a `ResumeContent`.
///
/// Missing or null optional fields default to their empty form (empty string,
/// empty list). Wrong-typed fields reject. Unknown keys are dropped.
pub fn normalize(value: &Value) -> Result<ResumeContent, ValidationError> {
    let root = value
        .as_object()
        .ok_or_else(|| ValidationError::new("content", "must be an object"))?;

    let personal_info = match root.get("personalInfo") {
        None | Some(Value::Null) => PersonalInfo::default(),
        Some(v) => normalize_personal_info(v)?,
    };

    let creation_mode = match root.get("creationMode") {
        None | Some(Value::Null) => CreationMode::Unset,
        Some(Value::String(s)) => match s.as_str() {
            "unset" => CreationMode::Unset,
            "manual" => CreationMode::Manual,
            "magic" => CreationMode::Magic,
            other => {
                return Err(ValidationError::new(
                    "creationMode",
                    format!("unknown mode '{other}'"),
                ))
            }
        },
        Some(_) => return Err(ValidationError::new("creationMode", "must be a string")),
    };

    let experience = entry_objects(root.get("experience"), "experience")?
        .into_iter()
        .enumerate()
        .map(|(i, map)| normalize_experience(map, &format!("experience[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique_ids(experience.iter().map(|e| e.id.as_str()), "experience")?;

    let education = entry_objects(root.get("education"), "education")?
        .into_iter()
        .enumerate()
        .map(|(i, map)| normalize_education(map, &format!("education[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique_ids(education.iter().map(|e| e.id.as_str()), "education")?;

    let skills = string_list(root.get("skills"), "skills")?;

    let projects = entry_objects(root.get("projects"), "projects")?
        .into_iter()
        .enumerate()
        .map(|(i, map)| normalize_project(map, &format!("projects[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique_ids(projects.iter().map(|p| p.id.as_str()), "projects")?;

    Ok(ResumeContent {
        personal_info,
        creation_mode,
        experience,
        education,
        skills,
        projects,
    })
}

/// Checks the invariants a typed `ResumeContent` can still violate: every
/// list entry carries a non-empty id, unique within its list. Used before a
/// save is sent for a document that never left typed form.
pub fn ensure_valid(content: &ResumeContent) -> Result<(), ValidationError> {
    for (i, e) in content.experience.iter().enumerate() {
        if e.id.is_empty() {
            return Err(ValidationError::new(
                format!("experience[{i}].id"),
                "must be a non-empty string",
            ));
        }
    }
    check_unique_ids(content.experience.iter().map(|e| e.id.as_str()), "experience")?;

    for (i, e) in content.education.iter().enumerate() {
        if e.id.is_empty() {
            return Err(ValidationError::new(
                format!("education[{i}].id"),
                "must be a non-empty string",
            ));
        }
    }
    check_unique_ids(content.education.iter().map(|e| e.id.as_str()), "education")?;

    for (i, p) in content.projects.iter().enumerate() {
        if p.id.is_empty() {
            return Err(ValidationError::new(
                format!("projects[{i}].id"),
                "must be a non-empty string",
            ));
        }
    }
    check_unique_ids(content.projects.iter().map(|p| p.id.as_str()), "projects")?;

    Ok(())
}

fn normalize_personal_info(value: &Value) -> Result<PersonalInfo, ValidationError> {
    let map = value
        .as_object()
        .ok_or_else(|| ValidationError::new("personalInfo", "must be an object"))?;

    let social_links = match map.get("socialLinks") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = format!("personalInfo.socialLinks[{i}]");
                let link = item
                    .as_object()
                    .ok_or_else(|| ValidationError::new(&path, "must be an object"))?;
                Ok(SocialLink {
                    platform: opt_string(link, "platform", &path)?,
                    url: opt_string(link, "url", &path)?,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?,
        Some(_) => {
            return Err(ValidationError::new(
                "personalInfo.socialLinks",
                "must be an array",
            ))
        }
    };

    Ok(PersonalInfo {
        full_name: opt_string(map, "fullName", "personalInfo")?,
        job_title: opt_string(map, "jobTitle", "personalInfo")?,
        email: opt_string(map, "email", "personalInfo")?,
        phone: opt_string(map, "phone", "personalInfo")?,
        address: opt_string(map, "address", "personalInfo")?,
        summary: opt_string(map, "summary", "personalInfo")?,
        profile_image: opt_string(map, "profileImage", "personalInfo")?,
        custom_text: opt_string(map, "customText", "personalInfo")?,
        social_links,
    })
}

fn normalize_experience(
    map: &Map<String, Value>,
    path: &str,
) -> Result<ExperienceEntry, ValidationError> {
    Ok(ExperienceEntry {
        id: require_id(map, path)?,
        position: opt_string(map, "position", path)?,
        company: opt_string(map, "company", path)?,
        start_date: opt_string(map, "startDate", path)?,
        end_date: opt_string(map, "endDate", path)?,
        description: opt_string(map, "description", path)?,
    })
}

fn normalize_education(
    map: &Map<String, Value>,
    path: &str,
) -> Result<EducationEntry, ValidationError> {
    Ok(EducationEntry {
        id: require_id(map, path)?,
        school: opt_string(map, "school", path)?,
        degree: opt_string(map, "degree", path)?,
        start_date: opt_string(map, "startDate", path)?,
        end_date: opt_string(map, "endDate", path)?,
        description: opt_string(map, "description", path)?,
    })
}

fn normalize_project(
    map: &Map<String, Value>,
    path: &str,
) -> Result<ProjectEntry, ValidationError> {
    Ok(ProjectEntry {
        id: require_id(map, path)?,
        name: opt_string(map, "name", path)?,
        description: opt_string(map, "description", path)?,
        link: opt_string(map, "link", path)?,
    })
}

/// Extracts a list of entry objects, defaulting a missing list to empty.
fn entry_objects<'a>(
    value: Option<&'a Value>,
    path: &str,
) -> Result<Vec<&'a Map<String, Value>>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object()
                    .ok_or_else(|| ValidationError::new(format!("{path}[{i}]"), "must be an object"))
            })
            .collect(),
        Some(_) => Err(ValidationError::new(path, "must be an array")),
    }
}

fn string_list(value: Option<&Value>, path: &str) -> Result<Vec<String>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(ValidationError::new(
                    format!("{path}[{i}]"),
                    "must be a string",
                )),
            })
            .collect(),
        Some(_) => Err(ValidationError::new(path, "must be an array")),
    }
}

/// Optional string field: missing or null defaults to empty, any other
/// non-string type rejects.
fn opt_string(
    map: &Map<String, Value>,
    key: &str,
    parent: &str,
) -> Result<String, ValidationError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::new(
            format!("{parent}.{key}"),
            "must be a string",
        )),
    }
}

fn require_id(map: &Map<String, Value>, path: &str) -> Result<String, ValidationError> {
    match map.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ValidationError::new(
            format!("{path}.id"),
            "must be a non-empty string",
        )),
    }
}

fn check_unique_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    path: &str,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (i, id) in ids.enumerate() {
        if !seen.insert(id) {
            return Err(ValidationError::new(
                format!("{path}[{i}].id"),
                format!("duplicate id '{id}'"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn populated_content() -> ResumeContent {
        ResumeContent {
            personal_info: PersonalInfo {
                full_name: "Jane Doe".into(),
                job_title: "Engineer".into(),
                email: "jane@x.com".into(),
                phone: "555-123-4567".into(),
                address: "Berlin".into(),
                summary: "Builds things.".into(),
                profile_image: String::new(),
                custom_text: "raw paste".into(),
                social_links: vec![SocialLink {
                    platform: "github".into(),
                    url: "https://github.com/jane".into(),
                }],
            },
            creation_mode: CreationMode::Manual,
            experience: vec![ExperienceEntry {
                id: "e1".into(),
                position: "Engineer".into(),
                company: "Acme".into(),
                start_date: "2020".into(),
                end_date: "Present".into(),
                description: "Shipped.".into(),
            }],
            education: vec![EducationEntry {
                id: "d1".into(),
                school: "MIT".into(),
                degree: "BSc".into(),
                start_date: String::new(),
                end_date: String::new(),
                description: String::new(),
            }],
            skills: vec!["Rust".into(), "Go".into()],
            projects: vec![ProjectEntry {
                id: "p1".into(),
                name: "Folio".into(),
                description: "Resume builder".into(),
                link: String::new(),
            }],
        }
    }

    #[test]
    fn test_round_trip_is_identity() {
        let content = populated_content();
        let value = serde_json::to_value(&content).unwrap();
        let normalized = normalize(&value).unwrap();
        assert_eq!(normalized, content);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let content = populated_content();
        let once = normalize(&serde_json::to_value(&content).unwrap()).unwrap();
        let twice = normalize(&serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_object_defaults_everything() {
        let content = normalize(&json!({})).unwrap();
        assert_eq!(content, ResumeContent::default());
    }

    #[test]
    fn test_missing_personal_info_defaults_wholesale() {
        let content = normalize(&json!({ "skills": ["Rust"] })).unwrap();
        assert_eq!(content.personal_info, PersonalInfo::default());
        assert_eq!(content.skills, vec!["Rust".to_string()]);
    }

    #[test]
    fn test_null_fields_default_to_empty() {
        let content = normalize(&json!({
            "personalInfo": { "fullName": null, "email": "a@b.co" },
            "experience": null
        }))
        .unwrap();
        assert_eq!(content.personal_info.full_name, "");
        assert_eq!(content.personal_info.email, "a@b.co");
        assert!(content.experience.is_empty());
    }

    #[test]
    fn test_root_must_be_object() {
        let err = normalize(&json!("not an object")).unwrap_err();
        assert_eq!(err.field, "content");
    }

    #[test]
    fn test_wrong_typed_scalar_names_field_path() {
        let err = normalize(&json!({
            "personalInfo": { "fullName": 42 }
        }))
        .unwrap_err();
        assert_eq!(err.field, "personalInfo.fullName");
    }

    #[test]
    fn test_wrong_typed_entry_field_names_indexed_path() {
        let err = normalize(&json!({
            "experience": [
                { "id": "e1", "position": "Dev" },
                { "id": "e2", "position": ["not", "a", "string"] }
            ]
        }))
        .unwrap_err();
        assert_eq!(err.field, "experience[1].position");
    }

    #[test]
    fn test_list_must_be_array() {
        let err = normalize(&json!({ "skills": "Rust, Go" })).unwrap_err();
        assert_eq!(err.field, "skills");
    }

    #[test]
    fn test_missing_entry_id_rejects() {
        let err = normalize(&json!({
            "education": [{ "school": "MIT" }]
        }))
        .unwrap_err();
        assert_eq!(err.field, "education[0].id");
    }

    #[test]
    fn test_empty_entry_id_rejects() {
        let err = normalize(&json!({
            "projects": [{ "id": "", "name": "Folio" }]
        }))
        .unwrap_err();
        assert_eq!(err.field, "projects[0].id");
    }

    #[test]
    fn test_duplicate_entry_id_rejects() {
        let err = normalize(&json!({
            "experience": [
                { "id": "e1", "position": "Dev" },
                { "id": "e1", "position": "Lead" }
            ]
        }))
        .unwrap_err();
        assert_eq!(err.field, "experience[1].id");
        assert!(err.message.contains("duplicate"));
    }

    #[test]
    fn test_unknown_creation_mode_rejects() {
        let err = normalize(&json!({ "creationMode": "wizard" })).unwrap_err();
        assert_eq!(err.field, "creationMode");
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let content = normalize(&json!({
            "legacyField": true,
            "personalInfo": { "fullName": "Jane", "nickname": "J" }
        }))
        .unwrap();
        assert_eq!(content.personal_info.full_name, "Jane");
        // Nothing else to assert: unknown keys simply do not survive.
        let value = serde_json::to_value(&content).unwrap();
        assert!(value.get("legacyField").is_none());
    }

    #[test]
    fn test_ensure_valid_accepts_populated_content() {
        assert!(ensure_valid(&populated_content()).is_ok());
    }

    #[test]
    fn test_ensure_valid_rejects_empty_id() {
        let mut content = populated_content();
        content.experience[0].id.clear();
        let err = ensure_valid(&content).unwrap_err();
        assert_eq!(err.field, "experience[0].id");
    }

    #[test]
    fn test_ensure_valid_rejects_duplicate_ids() {
        let mut content = populated_content();
        let dup = content.education[0].clone();
        content.education.push(dup);
        let err = ensure_valid(&content).unwrap_err();
        assert_eq!(err.field, "education[1].id");
    }
}
