//! Line-oriented heuristic classifier for pasted resume text.
//!
//! Single pass over the lines with a current-section state. Section keyword
//! lines switch the state and are consumed; other lines populate whichever
//! section is active. This is a total function over any string input; the
//! worst case is an almost-empty document, never an error.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::schema::{
    CreationMode, EducationEntry, ExperienceEntry, ResumeContent,
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\(?[0-9]{3}\)?[-\s.]?[0-9]{3}[-\s.]?[0-9]{4,6}").expect("phone regex")
});

/// Comma, pipe, bullet, tab, or a run of 2+ spaces.
static SKILL_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,|•\t]|\s{2,}").expect("skill split regex"));

/// " at " (company separator) or hyphen/pipe/colon.
static EXPERIENCE_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+at\s+|[-|:]").expect("experience split regex"));

static EDUCATION_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-|:]").expect("education split regex"));

/// Skill tokens at or above this length are discarded as misclassified prose.
const MAX_SKILL_LEN: usize = 50;

/// Content lines at or below this length are too short to be an
/// experience/education item.
const MIN_ITEM_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Experience,
    Education,
    Skills,
    Projects,
    Summary,
}

/// Classifies a line as a section header. Keyword priority follows the check
/// order here; the first hit wins and the line is consumed.
fn section_keyword(line: &str) -> Option<Section> {
    let lower = line.to_lowercase();
    if lower.contains("experience") || lower.contains("work history") || lower.contains("employment")
    {
        return Some(Section::Experience);
    }
    if lower.contains("education") || lower.contains("academic") {
        return Some(Section::Education);
    }
    if lower.contains("skills") || lower.contains("expertise") || lower.contains("technologies") {
        return Some(Section::Skills);
    }
    if lower.contains("projects") {
        return Some(Section::Projects);
    }
    if lower.contains("summary") || lower.contains("objective") || lower.contains("about me") {
        return Some(Section::Summary);
    }
    None
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Converts unstructured pasted text into a best-effort `ResumeContent`.
///
/// The first non-empty line is taken verbatim as the full name; email and
/// phone are picked out of the whole text by pattern; the rest is dispatched
/// line-by-line into the active section. The entire raw input is retained as
/// `customText` so the raw template can fall back to it.
pub fn parse_resume_text(text: &str) -> ResumeContent {
    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut content = ResumeContent {
        creation_mode: CreationMode::Magic,
        ..Default::default()
    };
    content.personal_info.full_name = lines.first().copied().unwrap_or_default().to_string();
    content.personal_info.email = EMAIL_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    content.personal_info.phone = PHONE_RE
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    content.personal_info.custom_text = text.to_string();

    let mut current = Section::None;

    for line in &lines {
        if let Some(section) = section_keyword(line) {
            current = section;
            continue;
        }

        match current {
            Section::Summary => {
                let separator = if line.starts_with('-') || line.starts_with('•') {
                    "\n"
                } else {
                    " "
                };
                content.personal_info.summary.push_str(separator);
                content.personal_info.summary.push_str(line);
            }
            Section::Skills => {
                for token in SKILL_SPLIT_RE.split(line) {
                    let token = token.trim();
                    if token.is_empty() || token.chars().count() >= MAX_SKILL_LEN {
                        continue;
                    }
                    if !content.skills.iter().any(|s| s == token) {
                        content.skills.push(token.to_string());
                    }
                }
            }
            Section::Experience if line.chars().count() > MIN_ITEM_LEN => {
                let parts: Vec<&str> = EXPERIENCE_SPLIT_RE.split(line).map(str::trim).collect();
                if parts.len() >= 2 {
                    content.experience.push(ExperienceEntry {
                        id: new_id(),
                        position: parts[0].to_string(),
                        company: parts[1].to_string(),
                        start_date: "2020".to_string(),
                        end_date: "Present".to_string(),
                        description: parts[2..].join(" "),
                    });
                } else {
                    content.experience.push(ExperienceEntry {
                        id: new_id(),
                        position: line.to_string(),
                        ..Default::default()
                    });
                }
            }
            Section::Education if line.chars().count() > MIN_ITEM_LEN => {
                let parts: Vec<&str> = EDUCATION_SPLIT_RE.split(line).map(str::trim).collect();
                let school = match parts.first() {
                    Some(first) if !first.is_empty() => first.to_string(),
                    _ => line.to_string(),
                };
                content.education.push(EducationEntry {
                    id: new_id(),
                    school,
                    degree: parts.get(1).unwrap_or(&"").to_string(),
                    ..Default::default()
                });
            }
            // Projects are recognized as a section so their header lines are
            // consumed, but no project items are synthesized from prose.
            _ => {}
        }
    }

    content
}

/// Merges an imported partial document into an existing one.
///
/// Scalar personal-info fields overwrite only when the incoming value is
/// non-empty. List sections concatenate, imported items after existing ones,
/// with skills deduplicated by exact string match. A creation mode that is
/// already set is never overwritten.
pub fn merge_import(existing: &mut ResumeContent, incoming: ResumeContent) {
    let info = &mut existing.personal_info;
    let parsed = incoming.personal_info;
    overwrite_if_set(&mut info.full_name, parsed.full_name);
    overwrite_if_set(&mut info.job_title, parsed.job_title);
    overwrite_if_set(&mut info.email, parsed.email);
    overwrite_if_set(&mut info.phone, parsed.phone);
    overwrite_if_set(&mut info.address, parsed.address);
    overwrite_if_set(&mut info.summary, parsed.summary);
    overwrite_if_set(&mut info.profile_image, parsed.profile_image);
    overwrite_if_set(&mut info.custom_text, parsed.custom_text);
    info.social_links.extend(parsed.social_links);

    existing.experience.extend(incoming.experience);
    existing.education.extend(incoming.education);
    existing.projects.extend(incoming.projects);
    for skill in incoming.skills {
        if !existing.skills.iter().any(|s| *s == skill) {
            existing.skills.push(skill);
        }
    }

    if existing.creation_mode == CreationMode::Unset {
        existing.creation_mode = incoming.creation_mode;
    }
}

fn overwrite_if_set(target: &mut String, incoming: String) {
    if !incoming.is_empty() {
        *target = incoming;
    }
}
