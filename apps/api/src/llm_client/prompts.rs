// Shared prompt constants and prompt-building utilities.
// Each flow that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Closing line appended to every user message that expects a JSON document back.
pub const RETURN_JSON_ONLY: &str =
    "Return ONLY the JSON object. No markdown code fences, no commentary before or after it.";

/// System message for the structuring call made by PDF import.
pub const EXTRACTION_SYSTEM: &str = "\
You are a precise resume data extractor. \
You convert unstructured resume text into structured JSON. \
You MUST respond with valid JSON only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences. \
Do NOT include explanations or apologies.";
