pub mod json_annotation_source;
