// Prompt templates for the resume operations. Placeholders in `{braces}` are
// replaced before sending.

/// Structural rules shared by file conversion and text structuring.
/// Replace `{jd_block}`.
pub const STRUCTURE_RULES_TEMPLATE: &str = r#"Convert the provided resume into structured HTML.

{jd_block}
CRITICAL STRUCTURAL RULES:
1. Header: use this EXACT structure for the contact info:
   <div class="header-grid">
     <div class="header-left">
       <h1>[Candidate Name]</h1>
       <p>[Website URL or Portfolio]</p>
     </div>
     <div class="header-right">
       Email: [Email]<br>
       Mobile: [Phone]
     </div>
   </div>
2. SECTION SEQUENCING: analyze the content against the target job description.
   - Career-changer applying to a highly technical role: SKILLS/PROJECTS above EXPERIENCE.
   - Student or recent graduate: EDUCATION above EXPERIENCE.
   - Otherwise: SUMMARY, EXPERIENCE, SKILLS, EDUCATION.
3. Experience items: each job starts with an H3 containing
   "<span class='job-title'>Title</span> <span class='location'>City, State</span>",
   followed by <div class='role-line'><span>Company Name</span> <span>Dates</span></div>.
4. Section headers are H2 (EDUCATION, EXPERIENCE, PROJECTS, ...).
5. Hyperlinks: detect URLs for projects or social profiles and wrap the text in <a href="...">.
6. Content: professional, high-impact bullet points.
7. Clean semantic tags only: H1, H2, H3, P, UL, LI, A, STRONG, SPAN.

Return a JSON object with this EXACT schema:
{
  "candidateName": "Jane Doe",
  "htmlContent": "<div class=\"header-grid\">...</div><h2>EXPERIENCE</h2>...",
  "rawText": "plain text of the whole resume",
  "confidence": 0.92
}
"#;

pub const CONVERT_FILE_SUFFIX: &str =
    "Recreate the attached resume perfectly with an optimized section order for the target role.";

/// Replace `{text}`.
pub const STRUCTURE_TEXT_SUFFIX_TEMPLATE: &str =
    "Transform this raw text into structured resume HTML with the most relevant section first:\n\n{text}";

/// Replace `{instruction}`, `{jd}`, `{html}`.
pub const IMPROVE_PROMPT_TEMPLATE: &str = r#"Update the following resume HTML to address: "{instruction}".
Target JD: {jd}
Current HTML: {html}

Return ONLY the updated HTML string. Preserve the header structure and links."#;

/// Replace `{jd}`, `{html}`.
pub const REORDER_PROMPT_TEMPLATE: &str = r#"Analyze the following resume HTML and the target job description.
Target JD: {jd}
Current HTML: {html}

TASK: reorder the H2 sections (EXPERIENCE, EDUCATION, SKILLS, PROJECTS, ...) to maximize ATS impact for this JD.
- Entry-level role: prioritize Education.
- Highly technical role where the candidate has matching skills: prioritize Skills.
- Otherwise lead with Experience.
- Keep all content identical, only move whole blocks.
- Return ONLY the reordered HTML string."#;

/// Replace `{text}`, `{jd}`.
pub const ATS_PROMPT_TEMPLATE: &str = r#"Analyze this resume text for ATS (applicant tracking system) compatibility and score it 0-100.

Resume text: {text}
JD: {jd}

Return a JSON object with this EXACT schema:
{
  "score": 78,
  "improvements": ["Quantify results in the most recent role"],
  "suggestedKeywords": ["Kubernetes"],
  "redFlags": ["Employment gap 2019-2020 is unexplained"],
  "jdMatchAnalysis": "Strong backend match, weak on cloud tooling."
}"#;

pub fn jd_or_none(job_description: &str) -> &str {
    if job_description.trim().is_empty() {
        "None"
    } else {
        job_description
    }
}

pub fn structure_prompt(job_description: &str, suffix: &str) -> String {
    let jd_block = if job_description.trim().is_empty() {
        String::new()
    } else {
        format!("TARGET JOB DESCRIPTION:\n{job_description}\n")
    };
    let mut prompt = fill(STRUCTURE_RULES_TEMPLATE, &[("jd_block", &jd_block)]);
    prompt.push('\n');
    prompt.push_str(suffix);
    prompt
}

pub fn structure_text_suffix(text: &str) -> String {
    fill(STRUCTURE_TEXT_SUFFIX_TEMPLATE, &[("text", text)])
}

pub fn improve_prompt(html: &str, instruction: &str, job_description: &str) -> String {
    fill(
        IMPROVE_PROMPT_TEMPLATE,
        &[
            ("instruction", instruction),
            ("jd", jd_or_none(job_description)),
            ("html", html),
        ],
    )
}

pub fn reorder_prompt(html: &str, job_description: &str) -> String {
    fill(REORDER_PROMPT_TEMPLATE, &[("jd", job_description), ("html", html)])
}

pub fn ats_prompt(text: &str, job_description: &str) -> String {
    fill(ATS_PROMPT_TEMPLATE, &[("text", text), ("jd", jd_or_none(job_description))])
}

/// Substitutes `{key}` placeholders in one pass over the template.
/// Inserted values are never scanned again, so user text containing a
/// placeholder stays literal. Unknown braces (the JSON schema) are kept.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_prompt_omits_empty_jd() {
        let prompt = structure_prompt("  ", CONVERT_FILE_SUFFIX);
        assert!(!prompt.contains("TARGET JOB DESCRIPTION"));
        assert!(prompt.ends_with(CONVERT_FILE_SUFFIX));

        let prompt = structure_prompt("Senior Rust engineer", CONVERT_FILE_SUFFIX);
        assert!(prompt.contains("TARGET JOB DESCRIPTION:\nSenior Rust engineer"));
    }

    #[test]
    fn test_user_text_with_placeholders_stays_literal() {
        let prompt = improve_prompt("<p>uses {jd} syntax</p>", "mention {html} templating", "");
        assert!(prompt.contains(r#"address: "mention {html} templating""#));
        assert!(prompt.contains("Target JD: None"));
        assert!(prompt.contains("Current HTML: <p>uses {jd} syntax</p>"));

        let prompt = ats_prompt("knows {jd} and {text}", "Rust {html}");
        assert!(prompt.contains("Resume text: knows {jd} and {text}"));
        assert!(prompt.contains("JD: Rust {html}"));
    }

    #[test]
    fn test_fill_keeps_unknown_braces() {
        assert_eq!(fill(r#"{"a": {x}} {y"#, &[("x", "1")]), r#"{"a": 1} {y"#);
        assert_eq!(structure_text_suffix("{text}").matches("{text}").count(), 1);
    }

    #[test]
    fn test_jd_or_none() {
        assert_eq!(jd_or_none(""), "None");
        assert_eq!(jd_or_none("Backend role"), "Backend role");
    }
}
