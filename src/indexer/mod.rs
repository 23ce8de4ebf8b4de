//! Build-time pipeline: PDF pages → raw text → article sections → index.
pub mod core;
pub mod pdf;
pub mod sections;

pub use self::core::{IndexBuildError, build_index, load_sections, write_section_dump};
pub use sections::{Section, split_and_clean};
