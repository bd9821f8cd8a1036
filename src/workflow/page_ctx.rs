//! 页面处理上下文
//!
//! 封装"我正在处理第几组页面"这一信息

use std::fmt::Display;

/// 一组页面（信息页 + 答题页）的上下文
#[derive(Debug, Clone, Copy)]
pub struct PairCtx {
    /// 组序号（从0开始），同时作为名单位置加分的参考位置
    pub pair_index: usize,

    /// 信息页页码（从0开始）
    pub info_page: usize,

    /// 答题页页码；页数为奇数时最后一组没有答题页
    pub content_page: Option<usize>,

    /// 总组数（仅用于日志显示）
    pub total_pairs: usize,
}

impl PairCtx {
    pub fn new(
        pair_index: usize,
        info_page: usize,
        content_page: Option<usize>,
        total_pairs: usize,
    ) -> Self {
        Self {
            pair_index,
            info_page,
            content_page,
            total_pairs,
        }
    }
}

impl Display for PairCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.content_page {
            Some(content) => write!(
                f,
                "[第 {}/{} 组 页#{}+{}]",
                self.pair_index + 1,
                self.total_pairs,
                self.info_page,
                content
            ),
            None => write!(
                f,
                "[第 {}/{} 组 页#{}]",
                self.pair_index + 1,
                self.total_pairs,
                self.info_page
            ),
        }
    }
}
