//! CV data model shared with the browser editor.
//!
//! Every field has a default so a partially-filled document always decodes into a
//! complete skeleton. Collection element ids are the join key used by the editor's
//! history and diff views: they are kept verbatim and only synthesized when missing.

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::lenient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvData {
    #[serde(deserialize_with = "lenient::record")]
    pub personal_info: PersonalInfo,
    #[serde(deserialize_with = "lenient::string")]
    pub summary: String,
    #[serde(deserialize_with = "lenient::records")]
    pub experience: Vec<Experience>,
    #[serde(deserialize_with = "lenient::records")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "lenient::records")]
    pub skills: Vec<Skill>,
    #[serde(deserialize_with = "lenient::records")]
    pub languages: Vec<Language>,
    #[serde(deserialize_with = "lenient::records")]
    pub projects: Vec<Project>,
    #[serde(deserialize_with = "lenient::records")]
    pub certifications: Vec<Certification>,
    #[serde(deserialize_with = "lenient::records")]
    pub publications: Vec<Publication>,
    #[serde(deserialize_with = "lenient::records")]
    pub volunteer_work: Vec<VolunteerWork>,
    #[serde(deserialize_with = "lenient::records")]
    pub awards: Vec<Award>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(deserialize_with = "lenient::string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(deserialize_with = "lenient::string")]
    pub website: String,
    #[serde(deserialize_with = "lenient::string")]
    pub linkedin: String,
    #[serde(deserialize_with = "lenient::string")]
    pub github: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub company: String,
    #[serde(deserialize_with = "lenient::string")]
    pub position: String,
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(deserialize_with = "lenient::string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient::boolean")]
    pub current: bool,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub institution: String,
    #[serde(deserialize_with = "lenient::string")]
    pub degree: String,
    #[serde(deserialize_with = "lenient::string")]
    pub field: String,
    #[serde(deserialize_with = "lenient::string")]
    pub location: String,
    #[serde(deserialize_with = "lenient::string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub gpa: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skill {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    pub level: SkillLevel,
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

impl<'de> Deserialize<'de> for SkillLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = match lenient::enum_text(deserializer)?.as_deref() {
            Some(s) if s.contains("expert") || s.contains("master") => SkillLevel::Expert,
            Some(s) if s.contains("advanced") || s.contains("proficient") => SkillLevel::Advanced,
            Some(s) if s.contains("beginner") || s.contains("basic") || s.contains("novice") => {
                SkillLevel::Beginner
            }
            _ => SkillLevel::Intermediate,
        };
        Ok(level)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Language {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    pub proficiency: LanguageProficiency,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageProficiency {
    Native,
    Fluent,
    Advanced,
    #[default]
    Intermediate,
    Basic,
}

impl<'de> Deserialize<'de> for LanguageProficiency {
    /// Accepts the editor's own values as well as LinkedIn's proficiency labels
    /// ("Native or bilingual", "Full professional", "Limited working", ...).
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proficiency = match lenient::enum_text(deserializer)?.as_deref() {
            Some(s) if s.contains("native") || s.contains("bilingual") => {
                LanguageProficiency::Native
            }
            Some(s) if s.contains("fluent") || s.contains("full professional") => {
                LanguageProficiency::Fluent
            }
            Some(s) if s.contains("advanced") || s.contains("professional working") => {
                LanguageProficiency::Advanced
            }
            Some(s) if s.contains("basic") || s.contains("elementary") || s.contains("beginner") => {
                LanguageProficiency::Basic
            }
            _ => LanguageProficiency::Intermediate,
        };
        Ok(proficiency)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub technologies: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub url: String,
    #[serde(deserialize_with = "lenient::string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Certification {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub issuer: String,
    #[serde(deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub expiry_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub credential_id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Publication {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub publisher: String,
    #[serde(deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub url: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolunteerWork {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub organization: String,
    #[serde(deserialize_with = "lenient::string")]
    pub role: String,
    #[serde(deserialize_with = "lenient::string")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Award {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub issuer: String,
    #[serde(deserialize_with = "lenient::string")]
    pub date: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Id assignment
// ────────────────────────────────────────────────────────────────────────────

/// A collection element that carries an editor id.
pub trait Identified {
    /// Prefix for synthesized placeholder ids (`exp-1`, `edu-2`, ...).
    const ID_PREFIX: &'static str;

    fn id_mut(&mut self) -> &mut String;
}

macro_rules! identified {
    ($($ty:ty => $prefix:literal),* $(,)?) => {
        $(
            impl Identified for $ty {
                const ID_PREFIX: &'static str = $prefix;

                fn id_mut(&mut self) -> &mut String {
                    &mut self.id
                }
            }
        )*
    };
}

identified! {
    Experience => "exp",
    Education => "edu",
    Skill => "sk",
    Language => "lang",
    Project => "proj",
    Certification => "cert",
    Publication => "pub",
    VolunteerWork => "vol",
    Award => "award",
}

/// Gives every element without a non-blank id a positional placeholder.
/// Existing ids are never touched.
pub fn fill_missing_ids<T: Identified>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        let id = item.id_mut();
        if id.trim().is_empty() {
            *id = format!("{}-{}", T::ID_PREFIX, index + 1);
        }
    }
}

impl CvData {
    pub fn fill_missing_ids(&mut self) {
        fill_missing_ids(&mut self.experience);
        fill_missing_ids(&mut self.education);
        fill_missing_ids(&mut self.skills);
        fill_missing_ids(&mut self.languages);
        fill_missing_ids(&mut self.projects);
        fill_missing_ids(&mut self.certifications);
        fill_missing_ids(&mut self.publications);
        fill_missing_ids(&mut self.volunteer_work);
        fill_missing_ids(&mut self.awards);
    }
}
