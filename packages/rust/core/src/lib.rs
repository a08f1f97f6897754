//! Research-to-article pipeline for CopyCraft.
//!
//! This crate holds everything between the presentation layer and the
//! generation service: prompt construction, response parsing, citation
//! deduplication, and the [`Wizard`](wizard::Wizard) state machine that
//! sequences them.

pub mod angles;
pub mod prompts;
pub mod sources;
pub mod wizard;

pub use angles::parse_angles;
pub use sources::extract_sources;
pub use wizard::{SharedWizard, SilentProgress, Wizard, WizardProgress, WizardView};
