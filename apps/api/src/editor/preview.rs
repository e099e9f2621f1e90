//! Preview projector: pure mapping from a draft to a renderable
//! representation. No styling, no markup: the embedding UI turns this into
//! pixels, and the thumbnail renderer consumes the same structure.

use serde::Serialize;

use crate::editor::form::DocumentDraft;
use crate::schema::TemplateId;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedResume {
    pub template: TemplateId,
    pub name: String,
    pub job_title: String,
    pub contact: Vec<String>,
    pub summary: String,
    pub sections: Vec<RenderedSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSection {
    pub heading: String,
    pub items: Vec<RenderedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedItem {
    pub primary: String,
    pub secondary: String,
    pub dates: String,
    pub body: String,
}

const RAW_PLACEHOLDER: &str =
    "No content pasted yet. Use Magic Import to paste your resume text.";

/// Projects a draft into its renderable form. Unknown template ids fall back
/// to Modern here and only here; storage keeps whatever string the client
/// sent.
pub fn project(draft: &DocumentDraft) -> RenderedResume {
    let template = TemplateId::parse(&draft.template_id);
    let content = &draft.content;
    let info = &content.personal_info;

    let mut contact = Vec::new();
    for value in [&info.email, &info.phone, &info.address] {
        if !value.is_empty() {
            contact.push(value.clone());
        }
    }
    for link in &info.social_links {
        if link.url.is_empty() {
            continue;
        }
        if link.platform.is_empty() {
            contact.push(link.url.clone());
        } else {
            contact.push(format!("{}: {}", link.platform, link.url));
        }
    }

    let sections = if template == TemplateId::Raw {
        let body = if info.custom_text.is_empty() {
            RAW_PLACEHOLDER.to_string()
        } else {
            info.custom_text.clone()
        };
        vec![RenderedSection {
            heading: "Resume".to_string(),
            items: vec![RenderedItem {
                body,
                ..Default::default()
            }],
        }]
    } else {
        structured_sections(draft)
    };

    RenderedResume {
        template,
        name: info.full_name.clone(),
        job_title: info.job_title.clone(),
        contact,
        summary: info.summary.clone(),
        sections,
    }
}

/// Sections in fixed order: experience, education, projects, skills. Empty
/// sections are omitted.
fn structured_sections(draft: &DocumentDraft) -> Vec<RenderedSection> {
    let content = &draft.content;
    let mut sections = Vec::new();

    if !content.experience.is_empty() {
        sections.push(RenderedSection {
            heading: "Experience".to_string(),
            items: content
                .experience
                .iter()
                .map(|e| RenderedItem {
                    primary: e.position.clone(),
                    secondary: e.company.clone(),
                    dates: date_range(&e.start_date, &e.end_date),
                    body: e.description.clone(),
                })
                .collect(),
        });
    }

    if !content.education.is_empty() {
        sections.push(RenderedSection {
            heading: "Education".to_string(),
            items: content
                .education
                .iter()
                .map(|e| RenderedItem {
                    primary: e.school.clone(),
                    secondary: e.degree.clone(),
                    dates: date_range(&e.start_date, &e.end_date),
                    body: e.description.clone(),
                })
                .collect(),
        });
    }

    if !content.projects.is_empty() {
        sections.push(RenderedSection {
            heading: "Projects".to_string(),
            items: content
                .projects
                .iter()
                .map(|p| RenderedItem {
                    primary: p.name.clone(),
                    secondary: p.link.clone(),
                    body: p.description.clone(),
                    ..Default::default()
                })
                .collect(),
        });
    }

    if !content.skills.is_empty() {
        sections.push(RenderedSection {
            heading: "Skills".to_string(),
            items: content
                .skills
                .iter()
                .map(|s| RenderedItem {
                    primary: s.clone(),
                    ..Default::default()
                })
                .collect(),
        });
    }

    sections
}

fn date_range(start: &str, end: &str) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => start.to_string(),
        (true, false) => end.to_string(),
        (false, false) => format!("{start} to {end}"),
    }
}
