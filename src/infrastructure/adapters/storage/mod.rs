//! Storage Adapter - 临时片段文件存储

mod temp_segment_store;

pub use temp_segment_store::TempSegmentStore;
