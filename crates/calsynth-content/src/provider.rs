use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use calsynth_core::{OrgPerson, PersonalEventDraft, UserProfile};

use crate::errors::ContentError;

/// Source of generated text content: user profiles and personal events.
///
/// Implementations must be safe to call sequentially for every user in a
/// run; the pipeline issues one request per record.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Grow a complete profile from one organization catalog entry.
    async fn generate_profile(&self, person: &OrgPerson) -> Result<UserProfile, ContentError>;

    /// Produce personal events that fit the profile around the given work
    /// schedule summary.
    async fn generate_personal_events(
        &self,
        profile: &UserProfile,
        work_schedule: &str,
    ) -> Result<Vec<PersonalEventDraft>, ContentError>;
}

/// Wire shape for the personal-events completion.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersonalEventsResponse {
    pub personal_events: Vec<PersonalEventDraft>,
}

/// JSON Schema for a model type, as a plain value for the request body and
/// for response validation.
pub fn schema_value<T: JsonSchema>() -> Result<Value, ContentError> {
    let schema = schemars::schema_for!(T);
    Ok(serde_json::to_value(schema)?)
}

/// Validate a parsed completion against its schema before deserializing.
pub fn validate_against_schema(instance: &Value, schema: &Value) -> Result<(), ContentError> {
    let compiled = jsonschema::JSONSchema::compile(schema)
        .map_err(|err| ContentError::Schema(err.to_string()))?;
    if let Err(errors) = compiled.validate(instance) {
        let details: Vec<String> = errors.take(5).map(|error| error.to_string()).collect();
        return Err(ContentError::Schema(details.join("; ")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_schema_is_generable() {
        let schema = schema_value::<UserProfile>().unwrap();
        assert!(schema.get("properties").is_some());
    }

    #[test]
    fn validation_rejects_wrong_shapes() {
        let schema = schema_value::<PersonalEventsResponse>().unwrap();
        let bad = serde_json::json!({"personal_events": "not a list"});
        assert!(validate_against_schema(&bad, &schema).is_err());

        let good = serde_json::json!({"personal_events": [{
            "title": "Gym",
            "description": "Leg day",
            "start_time": "2024-02-05T18:30:00",
            "end_time": "2024-02-05T19:30:00",
            "location": "Gym",
            "is_all_day": false,
            "recurrence_rule": ""
        }]});
        assert!(validate_against_schema(&good, &schema).is_ok());
    }
}
