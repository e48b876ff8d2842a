// Prompt constants for the LinkedIn PDF import flow.

/// Structuring prompt for a LinkedIn "Save to PDF" export.
/// Replace `{raw_text}` with the extracted document text before sending.
pub const LINKEDIN_EXTRACTION_PROMPT: &str = r#"Convert the following LinkedIn profile export into structured CV data.

Return a single JSON object with EXACTLY this structure:

{
  "personalInfo": {
    "name": "", "title": "", "email": "", "phone": "", "location": "",
    "website": "", "linkedin": "", "github": ""
  },
  "summary": "",
  "experience": [
    {"id": "exp-1", "company": "", "position": "", "location": "",
     "startDate": "YYYY-MM", "endDate": "YYYY-MM", "current": false,
     "description": "", "achievements": [""]}
  ],
  "education": [
    {"id": "edu-1", "institution": "", "degree": "", "field": "", "location": "",
     "startDate": "YYYY-MM", "endDate": "YYYY-MM", "gpa": "", "description": ""}
  ],
  "skills": [
    {"id": "sk-1", "name": "", "level": "beginner|intermediate|advanced|expert", "category": ""}
  ],
  "languages": [
    {"id": "lang-1", "name": "", "proficiency": "native|fluent|advanced|intermediate|basic"}
  ],
  "projects": [
    {"id": "proj-1", "name": "", "description": "", "technologies": [""], "url": "",
     "startDate": "YYYY-MM", "endDate": "YYYY-MM", "highlights": [""]}
  ],
  "certifications": [
    {"id": "cert-1", "name": "", "issuer": "", "date": "YYYY-MM", "expiryDate": "",
     "credentialId": "", "url": ""}
  ],
  "publications": [
    {"id": "pub-1", "title": "", "publisher": "", "date": "YYYY-MM", "url": "", "description": ""}
  ],
  "volunteerWork": [
    {"id": "vol-1", "organization": "", "role": "", "startDate": "YYYY-MM", "endDate": "YYYY-MM",
     "description": ""}
  ],
  "awards": [
    {"id": "award-1", "title": "", "issuer": "", "date": "YYYY-MM", "description": ""}
  ],
  "interests": [""]
}

RULES:
- Use only information present in the text. Leave unknown fields as "" or [].
- Give every array element a unique id using the prefixes shown (exp-1, exp-2, ...).
- Set "current" to true and "endDate" to "" for positions marked "Present".
- Map LinkedIn language labels to proficiency: "Native or Bilingual" -> native,
  "Full Professional" -> fluent, "Professional Working" -> advanced,
  "Limited Working" -> intermediate, "Elementary" -> basic.
- Infer a skill level from context when none is stated; default to "intermediate".
- Group skills into short categories such as "Programming Languages", "Frameworks",
  "Cloud & DevOps", "Soft Skills".
- When a position only has a prose description, derive two to four concise achievement
  bullets from it without inventing facts.
- Use the profile headline as "personalInfo.title" and the About section as "summary".
- Ignore page headers, footers and "Page N of M" markers.

LINKEDIN PROFILE TEXT:
{raw_text}
"#;
