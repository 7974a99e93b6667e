// Cross-cutting prompt fragments. Prompts specific to one resume operation
// live in `ai::prompts`.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for calls whose whole answer is an HTML fragment.
pub const HTML_ONLY_SYSTEM: &str = "You are an expert resume editor. \
    You MUST respond with the resume HTML fragment only. \
    Do NOT wrap it in <html> or <body>. \
    Do NOT use markdown code fences. \
    Do NOT include explanations.";
