//! Fixture generators

pub mod invalid_pdfs;
pub mod test_pdf_builder;
