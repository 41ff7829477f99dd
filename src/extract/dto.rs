use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Request body for text extraction. `text` defaults to empty so a missing
/// field is handled by the endpoint's own validation rather than a 422.
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub text: String,
}

/// The constrained colour enum the model must coerce variations into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavouriteColor {
    Green,
    Yellow,
    Red,
}

/// The fixed shape the model is asked to produce. Every field is
/// independently nullable; the record is never persisted server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    pub full_name: Option<String>,
    pub age: Option<u32>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub hobbies: Option<Vec<String>>,
    pub favourite_color: Option<FavouriteColor>,
    pub linkedin: Option<String>,
    pub graduation_year: Option<u32>,
    pub favourite_language: Option<String>,
}

/// JSON schema handed to the provider's structured-output API.
pub fn extracted_data_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "fullName": { "type": ["string", "null"] },
            "age": { "type": ["integer", "null"] },
            "jobTitle": { "type": ["string", "null"] },
            "company": { "type": ["string", "null"] },
            "location": { "type": ["string", "null"] },
            "hobbies": { "type": ["array", "null"], "items": { "type": "string" } },
            "favouriteColor": { "type": ["string", "null"], "enum": ["green", "yellow", "red", null] },
            "linkedin": { "type": ["string", "null"], "format": "uri" },
            "graduationYear": { "type": ["integer", "null"] },
            "favouriteLanguage": { "type": ["string", "null"] }
        },
        "required": [
            "fullName", "age", "jobTitle", "company", "location",
            "hobbies", "favouriteColor", "linkedin", "graduationYear", "favouriteLanguage"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_data_uses_camel_case_and_nullable_fields() {
        let data: ExtractedData = serde_json::from_str(
            r#"{
                "fullName": "Ada Lovelace",
                "age": 28,
                "jobTitle": null,
                "company": null,
                "location": "London",
                "hobbies": ["mathematics"],
                "favouriteColor": "green",
                "linkedin": null,
                "graduationYear": null,
                "favouriteLanguage": "Ada"
            }"#,
        )
        .unwrap();
        assert_eq!(data.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(data.favourite_color, Some(FavouriteColor::Green));
        assert!(data.job_title.is_none());

        let back = serde_json::to_value(&data).unwrap();
        assert!(back.get("fullName").is_some());
        assert!(back.get("full_name").is_none());
    }

    #[test]
    fn colour_enum_rejects_other_values() {
        let err = serde_json::from_str::<FavouriteColor>("\"blue\"");
        assert!(err.is_err());
    }

    #[test]
    fn schema_names_every_field() {
        let schema = extracted_data_schema();
        let props = schema["properties"].as_object().unwrap();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(props.len(), 10);
        assert_eq!(required.len(), props.len());
        for field in required {
            assert!(props.contains_key(field.as_str().unwrap()));
        }
    }
}
