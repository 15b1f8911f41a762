pub mod excel_read;
pub mod excel_write;

pub use excel_read::open_workbook;
pub use excel_write::{TemplateDocument, apply_regions, open_template, save_workbook};
