//! Core types for the Aitoonic catalog.

pub mod entity;
pub mod id;
pub mod seo;
pub mod slug;

pub use entity::*;
pub use id::*;
pub use seo::{SEO_DESCRIPTION_MAX, SEO_TITLE_MAX, trimmed_or_none, truncate_chars};
pub use slug::{slug_to_name, slugify};
