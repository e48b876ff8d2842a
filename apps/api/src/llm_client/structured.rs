//! Structured-Output Recoverer — salvages a `CvData` document from raw model text.
//!
//! Models asked for "JSON only" still wrap it in code fences or prose often enough
//! that a strict parse is not an option. Recovery is a heuristic with a fixed
//! contract: a document with a `personalInfo` key comes back complete (skeleton
//! defaults applied, ids filled), anything else comes back as `None`.

use serde_json::Value;
use tracing::debug;

use crate::models::cv::CvData;

/// Attempts to recover a complete `CvData` from raw LLM output.
pub fn recover(raw_text: &str) -> Option<CvData> {
    let value = parse_object(strip_json_fences(raw_text))
        .or_else(|| outermost_braces(raw_text).and_then(parse_object))?;

    if value.get("personalInfo").is_none() {
        debug!("Recovered JSON has no personalInfo key; rejecting");
        return None;
    }

    let mut cv: CvData = match serde_json::from_value(value) {
        Ok(cv) => cv,
        Err(e) => {
            debug!("Recovered JSON could not be decoded as CvData: {e}");
            return None;
        }
    };
    cv.fill_missing_ids();
    Some(cv)
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Greedy `{ ... }` span: first opening brace to last closing brace.
fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cv::{LanguageProficiency, SkillLevel};

    #[test]
    fn test_plain_prose_is_rejected() {
        assert!(recover("not json at all").is_none());
    }

    #[test]
    fn test_json_without_personal_info_is_rejected() {
        assert!(recover(r#"{"experience": []}"#).is_none());
        assert!(recover("[1, 2, 3]").is_none());
    }

    #[test]
    fn test_minimal_document_gets_full_skeleton() {
        let cv = recover(r#"{"personalInfo":{"name":"A"}}"#).unwrap();
        assert_eq!(cv.personal_info.name, "A");
        assert_eq!(cv.personal_info.email, "");
        assert_eq!(cv.personal_info.github, "");
        assert_eq!(cv.summary, "");
        assert!(cv.experience.is_empty());
        assert!(cv.education.is_empty());
        assert!(cv.skills.is_empty());
        assert!(cv.languages.is_empty());
        assert!(cv.projects.is_empty());
        assert!(cv.certifications.is_empty());
        assert!(cv.publications.is_empty());
        assert!(cv.volunteer_work.is_empty());
        assert!(cv.awards.is_empty());
        assert!(cv.interests.is_empty());
    }

    #[test]
    fn test_non_object_personal_info_still_recovers() {
        let cv = recover(r#"{"personalInfo":null,"summary":"x"}"#).unwrap();
        assert_eq!(cv.personal_info, Default::default());
        assert_eq!(cv.summary, "x");

        let cv = recover(r#"{"personalInfo":"Ada"}"#).unwrap();
        assert_eq!(cv, CvData::default());
    }

    #[test]
    fn test_json_wrapped_in_prose_is_salvaged() {
        let raw = r#"prefix text {"personalInfo":{"name":"A"},"experience":[{"company":"X"}]} suffix"#;
        let cv = recover(raw).unwrap();
        assert_eq!(cv.experience[0].id, "exp-1");
        assert_eq!(cv.experience[0].company, "X");
        assert_eq!(cv.experience[0].position, "");
    }

    #[test]
    fn test_code_fenced_json_is_salvaged() {
        let raw = "```json\n{\"personalInfo\":{\"name\":\"B\"}}\n```";
        assert_eq!(recover(raw).unwrap().personal_info.name, "B");
    }

    #[test]
    fn test_explicit_ids_survive_unchanged() {
        let raw = r#"{
            "personalInfo": {"name": "C", "email": "c@example.com"},
            "summary": "Engineer",
            "experience": [{"id": "a1b2", "company": "X", "position": "Dev", "achievements": ["Shipped"]}],
            "education": [{"id": "edu-xyz", "institution": "Uni"}],
            "skills": [{"id": "s-9", "name": "Rust", "level": "advanced", "category": "Languages"}],
            "languages": [{"id": "l-1", "name": "English", "proficiency": "fluent"}],
            "projects": [{"id": "p-1", "name": "Tool", "technologies": ["Rust"]}],
            "certifications": [{"id": "c-1", "name": "CKA"}],
            "publications": [{"id": "pb-1", "title": "Paper"}],
            "volunteerWork": [{"id": "v-1", "organization": "Org"}],
            "awards": [{"id": "aw-1", "title": "Prize"}],
            "interests": ["chess"]
        }"#;
        let first = recover(raw).unwrap();
        assert_eq!(first.experience[0].id, "a1b2");
        assert_eq!(first.education[0].id, "edu-xyz");
        assert_eq!(first.skills[0].id, "s-9");
        assert_eq!(first.skills[0].level, SkillLevel::Advanced);
        assert_eq!(first.languages[0].proficiency, LanguageProficiency::Fluent);
        assert_eq!(first.volunteer_work[0].id, "v-1");
        assert_eq!(first.awards[0].id, "aw-1");

        // Feeding the recovered document back in is a no-op.
        let again = recover(&serde_json::to_string(&first).unwrap()).unwrap();
        assert_eq!(again, first);
    }

    #[test]
    fn test_unknown_top_level_keys_are_not_carried() {
        let cv = recover(r#"{"personalInfo":{},"hobbies":["x"]}"#).unwrap();
        let value = serde_json::to_value(&cv).unwrap();
        assert!(value.get("hobbies").is_none());
        assert!(value.get("volunteerWork").is_some());
    }

    #[test]
    fn test_unbalanced_braces_are_rejected() {
        assert!(recover("} personalInfo {").is_none());
        assert!(recover(r#"{"personalInfo": {"name": "A""#).is_none());
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        assert_eq!(strip_json_fences("```\n{\"k\": 1}\n```"), "{\"k\": 1}");
        assert_eq!(strip_json_fences("{\"k\": 1}"), "{\"k\": 1}");
    }
}
