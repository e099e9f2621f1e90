// Resume content data model and the schema validator that gates every write.
// The same normalization runs client-side before a save attempt and
// server-side on create/update; the backend never trusts the client copy.

pub mod content;
pub mod validate;

pub use content::{
    CreationMode, EducationEntry, ExperienceEntry, PersonalInfo, ProjectEntry, ResumeContent,
    SocialLink, TemplateId,
};
pub use validate::{ensure_valid, normalize, ValidationError};
