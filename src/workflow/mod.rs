pub mod page_ctx;
pub mod recognition_flow;
pub mod segmenter;

pub use page_ctx::PairCtx;
pub use recognition_flow::RecognitionFlow;
pub use segmenter::{segment_by_roster, DocumentSink, SegmentReport};
