/// LLM Client — the single point of entry for every provider call in CV Forge.
///
/// ARCHITECTURAL RULE: No other module may talk to an LLM provider directly.
/// Request shapes live in `provider`, failure messages in `classify`, the streaming
/// protocol in `bridge`, and output salvage in `structured`.
///
/// Nothing here retries: a failed provider call is reported once, classified, and
/// left to the user to act on.
pub mod bridge;
pub mod classify;
pub mod handlers;
pub mod probe;
pub mod prompts;
pub mod provider;
pub mod structured;
