//! Standalone printable document handed to the print context.

use serde::{Deserialize, Serialize};

use crate::templates::TemplateId;

/// Delay between the print context finishing its load and opening the
/// print dialog, so fonts and styles are in place.
pub const PRINT_DELAY_MS: u64 = 1000;

const FONT_STYLESHEET: &str = "https://fonts.googleapis.com/css2?family=Inter:wght@300;400;500;600;700&family=Playfair+Display:ital,wght@0,700;1,700&family=IBM+Plex+Mono:wght@400;500&family=Montserrat:wght@400;500;600;700&display=swap";

const PRINT_RULES: &str = r#"body {
  background: white !important;
  margin: 0;
  padding: 0;
  -webkit-print-color-adjust: exact;
  print-color-adjust: exact;
}
.resume-page-container {
  box-shadow: none !important;
  margin: 0 auto !important;
  padding: 0.5in 0.6in !important;
  width: 100% !important;
  min-height: auto !important;
}
.editor-content { width: 100%; }
@media print {
  @page { margin: 0; size: A4; }
  body { margin: 0; }
}"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoOffset {
    pub x: f64,
    pub y: f64,
}

/// Positioned profile photo drawn over templates that support one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoOverlay {
    pub data_url: String,
    pub offset: PhotoOffset,
}

pub struct PrintableDocument<'a> {
    pub candidate_name: Option<&'a str>,
    pub template: TemplateId,
    pub styles: &'a [String],
    pub photo: Option<&'a PhotoOverlay>,
    pub body_html: &'a str,
}

impl PrintableDocument<'_> {
    pub fn title(&self) -> String {
        let name = self
            .candidate_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Resume Architect");
        format!("Resume - {name}")
    }

    pub fn render(&self) -> String {
        let styles = self
            .styles
            .iter()
            .map(|css| css.replace("</style", "<\\/style"))
            .collect::<Vec<_>>()
            .join("\n");

        let photo = match self.photo {
            Some(photo) if self.template.requires_photo() => format!(
                r#"<div class="deloitte-photo-container" style="transform: translate({}px, {}px)"><img src="{}" /></div>"#,
                photo.offset.x,
                photo.offset.y,
                escape_html(&photo.data_url)
            ),
            _ => String::new(),
        };

        format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>{title}</title>
    <link href="{fonts}" rel="stylesheet" />
    <style>
{styles}
{print_rules}
    </style>
  </head>
  <body class="{class}">
    <div class="resume-page-container">
      {photo}
      <div class="editor-content">
        {body}
      </div>
    </div>
    <script>
      window.onload = () => {{
        setTimeout(() => {{
          window.print();
        }}, {delay});
      }};
      window.onafterprint = () => {{
        window.close();
      }};
    </script>
  </body>
</html>
"#,
            title = escape_html(&self.title()),
            fonts = FONT_STYLESHEET,
            styles = styles,
            print_rules = PRINT_RULES,
            class = self.template.css_class(),
            photo = photo,
            body = self.body_html,
            delay = PRINT_DELAY_MS,
        )
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> PhotoOverlay {
        PhotoOverlay {
            data_url: "data:image/png;base64,AAAA".to_string(),
            offset: PhotoOffset { x: 12.0, y: -4.5 },
        }
    }

    #[test]
    fn test_render_contains_template_body_and_styles() {
        let styles = vec![".template-minimal h2 { color: red; }".to_string()];
        let html = PrintableDocument {
            candidate_name: Some("Jane Doe"),
            template: TemplateId::Minimal,
            styles: &styles,
            photo: None,
            body_html: "<h1>Jane Doe</h1>",
        }
        .render();

        assert!(html.contains(r#"<body class="template-minimal">"#));
        assert!(html.contains("<h1>Jane Doe</h1>"));
        assert!(html.contains(".template-minimal h2 { color: red; }"));
        assert!(html.contains("<title>Resume - Jane Doe</title>"));
        assert!(html.contains("window.print()"));
        assert!(html.contains("}, 1000);"));
        assert!(html.contains("window.close()"));
    }

    #[test]
    fn test_photo_overlay_only_for_photo_templates() {
        let photo = overlay();
        let with_photo = PrintableDocument {
            candidate_name: None,
            template: TemplateId::Deloitte,
            styles: &[],
            photo: Some(&photo),
            body_html: "<p>x</p>",
        }
        .render();
        assert!(with_photo.contains(
            r#"<div class="deloitte-photo-container" style="transform: translate(12px, -4.5px)"><img src="data:image/png;base64,AAAA" /></div>"#
        ));

        let without = PrintableDocument {
            candidate_name: None,
            template: TemplateId::Sourabh,
            styles: &[],
            photo: Some(&photo),
            body_html: "<p>x</p>",
        }
        .render();
        assert!(!without.contains("deloitte-photo-container"));
    }

    #[test]
    fn test_title_falls_back_and_is_escaped() {
        let doc = PrintableDocument {
            candidate_name: Some("  "),
            template: TemplateId::Sourabh,
            styles: &[],
            photo: None,
            body_html: "",
        };
        assert_eq!(doc.title(), "Resume - Resume Architect");

        let html = PrintableDocument {
            candidate_name: Some("<script>"),
            ..doc
        }
        .render();
        assert!(html.contains("<title>Resume - &lt;script&gt;</title>"));
    }

    #[test]
    fn test_injected_styles_cannot_close_style_block() {
        let styles = vec!["p{}</style><script>alert(1)</script>".to_string()];
        let html = PrintableDocument {
            candidate_name: None,
            template: TemplateId::Sourabh,
            styles: &styles,
            photo: None,
            body_html: "",
        }
        .render();
        assert!(!html.contains("</style><script>alert(1)"));
    }
}
