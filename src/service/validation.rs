//! Request validation against an entity schema.

use crate::error::AppError;
use crate::model::EntitySchema;
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// All required fields must be present; every declared field that is present must be a string.
    /// Undeclared fields are ignored.
    pub fn validate(body: &Map<String, Value>, schema: &EntitySchema) -> Result<(), AppError> {
        let missing: Vec<&str> = schema
            .required
            .iter()
            .copied()
            .filter(|k| !body.contains_key(*k))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required keys: {}",
                missing.join(", ")
            )));
        }
        for field in schema.typed_fields() {
            if let Some(v) = body.get(field) {
                if !v.is_string() {
                    return Err(AppError::Validation(format!("{} must be a string", field)));
                }
            }
        }
        Ok(())
    }
}
