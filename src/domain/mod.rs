// Domain model for stubdoc: template expansion, API surfaces and page planning.

pub mod differ;
pub mod doc_rules;
pub mod error;
pub mod pages;
pub mod rules;
pub mod surface;
pub mod template;
pub mod token;
