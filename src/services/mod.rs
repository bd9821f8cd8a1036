pub mod assembler;
pub mod extractor;
pub mod matching_service;
pub mod recognition_service;

pub use assembler::Assembler;
pub use extractor::extract_identity;
pub use matching_service::{match_identity, score_entry, MatchingService, TRUST_THRESHOLD};
pub use recognition_service::{
    parse_recognition_response, RecognitionAdapter, RecognitionService, VisionRecognizer,
};
