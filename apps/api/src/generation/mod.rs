// Generate CV: tailors an existing CV document to a job context.
// All LLM calls go through llm_client — no direct provider calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;
