//! Conversion between resource documents and [`EligibilityModel`].
//!
//! Documents name the principal attributes per kind (`group_id`/`group_name`
//! or `user_id`/`user_name`); the model uses `principal_id`/`principal_name`.

use elevate_core::{AppError, AppResult};
use serde_json::{Map, Value};

use crate::eligibility::EligibilityModel;
use crate::principal::PrincipalAdapter;

const PRINCIPAL_ID: &str = "principal_id";
const PRINCIPAL_NAME: &str = "principal_name";

/// Parses a resource document for principal kind `P`.
pub fn model_from_document<P: PrincipalAdapter>(document: Value) -> AppResult<EligibilityModel> {
    let Value::Object(mut object) = document else {
        return Err(AppError::Validation(format!(
            "{} document must be a JSON object",
            P::TYPE_NAME
        )));
    };

    for foreign in [PRINCIPAL_ID, PRINCIPAL_NAME] {
        if object.contains_key(foreign) {
            return Err(AppError::Validation(format!(
                "{} document does not accept attribute '{foreign}'",
                P::TYPE_NAME
            )));
        }
    }

    rename_attribute(&mut object, P::ID_ATTRIBUTE, PRINCIPAL_ID);
    rename_attribute(&mut object, P::NAME_ATTRIBUTE, PRINCIPAL_NAME);

    serde_json::from_value(Value::Object(object)).map_err(|error| {
        AppError::Validation(format!("invalid {} document: {error}", P::TYPE_NAME))
    })
}

/// Renders a model as a resource document for principal kind `P`.
pub fn model_to_document<P: PrincipalAdapter>(model: &EligibilityModel) -> AppResult<Value> {
    let value = serde_json::to_value(model).map_err(|error| {
        AppError::Internal(format!("failed to serialize {}: {error}", P::TYPE_NAME))
    })?;

    let Value::Object(mut object) = value else {
        return Err(AppError::Internal(format!(
            "{} did not serialize to a JSON object",
            P::TYPE_NAME
        )));
    };

    rename_attribute(&mut object, PRINCIPAL_ID, P::ID_ATTRIBUTE);
    rename_attribute(&mut object, PRINCIPAL_NAME, P::NAME_ATTRIBUTE);

    Ok(Value::Object(object))
}

fn rename_attribute(object: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = object.remove(from) {
        object.insert(to.to_owned(), value);
    }
}
