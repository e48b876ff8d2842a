// PDF Import: LinkedIn export → extracted text → structured CvData.
// Text extraction runs on a blocking thread; structuring goes through llm_client.

pub mod extract;
pub mod handlers;
pub mod prompts;
