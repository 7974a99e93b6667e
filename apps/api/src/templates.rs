//! Template catalog. A template is only a CSS class applied to the same
//! resume markup; the catalog order decides which ones are free.

use serde::{Deserialize, Serialize};

/// Number of catalog entries available without premium.
const FREE_TEMPLATES: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateId {
    #[default]
    Sourabh,
    ModernMono,
    Editorial,
    Brutalist,
    Jacqueline,
    NeonTech,
    SwissGrid,
    AcademicVintage,
    GeometricEng,
    ExecutiveGold,
    MidnightNavy,
    SoftMinimal,
    StartupClean,
    Minimal,
    Deloitte,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: TemplateId,
    pub name: &'static str,
    pub description: &'static str,
    pub premium: bool,
    pub requires_photo: bool,
}

impl TemplateId {
    pub const ALL: [TemplateId; 15] = [
        TemplateId::Sourabh,
        TemplateId::ModernMono,
        TemplateId::Editorial,
        TemplateId::Brutalist,
        TemplateId::Jacqueline,
        TemplateId::NeonTech,
        TemplateId::SwissGrid,
        TemplateId::AcademicVintage,
        TemplateId::GeometricEng,
        TemplateId::ExecutiveGold,
        TemplateId::MidnightNavy,
        TemplateId::SoftMinimal,
        TemplateId::StartupClean,
        TemplateId::Minimal,
        TemplateId::Deloitte,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Sourabh => "sourabh",
            Self::ModernMono => "modern-mono",
            Self::Editorial => "editorial",
            Self::Brutalist => "brutalist",
            Self::Jacqueline => "jacqueline",
            Self::NeonTech => "neon-tech",
            Self::SwissGrid => "swiss-grid",
            Self::AcademicVintage => "academic-vintage",
            Self::GeometricEng => "geometric-eng",
            Self::ExecutiveGold => "executive-gold",
            Self::MidnightNavy => "midnight-navy",
            Self::SoftMinimal => "soft-minimal",
            Self::StartupClean => "startup-clean",
            Self::Minimal => "minimal",
            Self::Deloitte => "deloitte",
        }
    }

    pub fn parse(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }

    /// CSS class put on the resume container and on the exported `<body>`.
    pub fn css_class(&self) -> String {
        format!("template-{}", self.slug())
    }

    fn position(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    pub fn is_premium(&self) -> bool {
        self.position() >= FREE_TEMPLATES
    }

    /// Templates that render a user-supplied profile photo.
    pub fn requires_photo(&self) -> bool {
        matches!(self, Self::Deloitte)
    }

    pub fn info(&self) -> TemplateInfo {
        let (name, description) = match self {
            Self::Sourabh => ("Executive Classic", "Horizontal rules & split header."),
            Self::ModernMono => ("Modern Mono", "Clean, monospaced developer aesthetic."),
            Self::Editorial => ("The Editorial", "Magazine-style serif for creative leaders."),
            Self::Brutalist => ("The Brutalist", "Bold, heavy borders and high-impact type."),
            Self::Jacqueline => ("Thompson Purple", "Centered header with purple accents."),
            Self::NeonTech => ("Neon Futurist", "Sleek, tech-focused with teal accents."),
            Self::SwissGrid => ("Swiss Grid", "Ultra-clean, architectural grid design."),
            Self::AcademicVintage => ("The Scholar", "Typewriter serif for academic profiles."),
            Self::GeometricEng => ("Technical Engineer", "Slanted geometric headers, blue accents."),
            Self::ExecutiveGold => ("Partner Suite", "Gold accents with classic serif."),
            Self::MidnightNavy => ("The Corporate", "Deep navy corporate blocks."),
            Self::SoftMinimal => ("Soft Minimal", "Rounded edges and gentle pink highlights."),
            Self::StartupClean => ("Startup Clean", "Friendly, rounded fonts with sky blue accents."),
            Self::Minimal => ("Standard Minimal", "Single column, no ornament."),
            Self::Deloitte => ("Consulting Photo", "Consulting layout with a profile photo."),
        };
        TemplateInfo {
            id: *self,
            name,
            description,
            premium: self.is_premium(),
            requires_photo: self.requires_photo(),
        }
    }
}

pub fn catalog() -> Vec<TemplateInfo> {
    TemplateId::ALL.iter().map(TemplateId::info).collect()
}
