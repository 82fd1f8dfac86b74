pub mod layout;
pub mod render;
pub mod templates;

pub use render::CertificateRenderer;

use serde::{Deserialize, Serialize};

/// Body of `POST /generate` as received. Every field is optional here so
/// that missing ones can be reported together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CertificateRequest {
    pub name: Option<String>,
    pub course: Option<String>,
    pub instructor: Option<String>,
    pub date: Option<String>,
    pub template: Option<String>,
}

/// A request with all four text fields present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateData {
    pub name: String,
    pub course: String,
    pub instructor: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

impl CertificateRequest {
    pub fn validate(self) -> Result<CertificateData, Vec<&'static str>> {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        let name = present(self.name);
        let course = present(self.course);
        let instructor = present(self.instructor);
        let date = present(self.date);

        match (name, course, instructor, date) {
            (Some(name), Some(course), Some(instructor), Some(date)) => Ok(CertificateData {
                name,
                course,
                instructor,
                date,
                template: present(self.template),
            }),
            (name, course, instructor, date) => {
                let missing = [
                    ("name", name.is_none()),
                    ("course", course.is_none()),
                    ("instructor", instructor.is_none()),
                    ("date", date.is_none()),
                ];
                Err(missing
                    .into_iter()
                    .filter(|(_, absent)| *absent)
                    .map(|(field, _)| field)
                    .collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> CertificateRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn complete_request_validates() {
        let data = request(serde_json::json!({
            "name": "Jane Doe",
            "course": "Intro",
            "instructor": "A. Smith",
            "date": "2024-01-01",
            "template": "1.png"
        }))
        .validate()
        .unwrap();
        assert_eq!(data.name, "Jane Doe");
        assert_eq!(data.template.as_deref(), Some("1.png"));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let missing = request(serde_json::json!({ "name": "Jane", "date": "" }))
            .validate()
            .unwrap_err();
        assert_eq!(missing, vec!["course", "instructor", "date"]);
    }

    #[test]
    fn null_and_blank_count_as_missing() {
        let missing = request(serde_json::json!({
            "name": null,
            "course": "  ",
            "instructor": "A",
            "date": "2024"
        }))
        .validate()
        .unwrap_err();
        assert_eq!(missing, vec!["name", "course"]);
    }

    #[test]
    fn blank_template_means_default() {
        let data = request(serde_json::json!({
            "name": "a", "course": "b", "instructor": "c", "date": "d", "template": ""
        }))
        .validate()
        .unwrap();
        assert_eq!(data.template, None);
    }
}
