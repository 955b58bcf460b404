//! Plain-text assembly and question body normalization.

pub mod assembler;
pub mod normalize;

pub use assembler::{stitch_pages, TextAssembler};
pub use normalize::{
    format_question, format_semicolon_table, looks_table_row, normalize_preserving_paragraphs,
    parse_parts_table, split_lines_keep_empty, split_table_row, PARTS_TABLE_HEADER,
};
