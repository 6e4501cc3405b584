// Shared prompt fragments.
// Each flow that calls the generator defines its own prompts alongside it;
// cross-cutting fragments live here.

/// Appended to every prompt whose response is fed to the JSON sanitizer.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with ONLY valid JSON. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Label placed before résumé text embedded in a prompt.
pub const RESUME_CONTENT_LABEL: &str = "Resume Content:";
