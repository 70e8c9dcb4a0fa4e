//! Paged virtual-memory subsystem: frame table and page maps (§4.2, §9).

pub mod frame_table;
pub mod page_map;

pub use frame_table::FrameTable;
pub use page_map::{is_last_sharer, PageMap};
