//! 身份提取
//!
//! 把识别结果（可能为空、字段可能缺失）转成候选身份

use crate::models::{IdentityCandidate, RecognitionResult};

/// 从识别结果中提取候选身份；缺失或空白的字段为 `None`
pub fn extract_identity(result: Option<&RecognitionResult>) -> IdentityCandidate {
    let Some(result) = result else {
        return IdentityCandidate::unknown();
    };

    IdentityCandidate {
        id: clean_field(result.student_id.as_deref()),
        name: clean_field(result.student_name.as_deref()),
    }
}

fn clean_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
