/// 身份匹配服务
///
/// 负责将识别出的（可能有误的）学号姓名与名单比对并纠正
use crate::models::identity::LOW_CONFIDENCE_PREFIX;
use crate::models::{IdentityCandidate, MatchCandidate, MatchOutcome, Roster, RosterEntry};
use tracing::{debug, info, warn};

/// 可信匹配的最低分数
pub const TRUST_THRESHOLD: i64 = 100;
/// 位置加分生效的最大位置差（不含）
const POSITION_WINDOW: usize = 5;

/// 身份匹配服务
///
/// 职责：
/// - 只读地使用名单，不修改名单
/// - 每次比对的打分结果只存在于本次调用内部
pub struct MatchingService<'a> {
    roster: &'a Roster,
    verbose_logging: bool,
}

impl<'a> MatchingService<'a> {
    /// 创建新的匹配服务
    pub fn new(roster: &'a Roster) -> Self {
        Self {
            roster,
            verbose_logging: false,
        }
    }

    pub fn verbose(mut self, verbose_logging: bool) -> Self {
        self.verbose_logging = verbose_logging;
        self
    }

    /// 将候选身份与名单比对
    ///
    /// # 参数
    /// - `candidate`: 识别得到的候选身份
    /// - `reference_index`: 当前处理位置（第几组页面），用于位置加分
    ///
    /// # 返回
    /// 名单为空时返回 `None`，否则总能选出一名学生；
    /// 分数低于阈值时姓名带 `W.` 前缀且 `trusted = false`
    pub fn resolve(
        &self,
        candidate: &IdentityCandidate,
        reference_index: usize,
    ) -> Option<MatchOutcome> {
        if let Some(outcome) = self.try_exact_match(candidate) {
            return Some(outcome);
        }

        let scores = self.score_all(candidate, reference_index);
        let best = pick_best(&scores)?;
        let entry = &self.roster.entries()[best.entry_index];

        if best.score < TRUST_THRESHOLD {
            warn!(
                "⚠️ 匹配分数较低，可能存在误差：{}, {} (分数 {}, 识别结果: {})",
                entry.id, entry.name, best.score, candidate
            );
            return Some(MatchOutcome {
                entry_index: best.entry_index,
                id: entry.id.clone(),
                name: format!("{}{}", LOW_CONFIDENCE_PREFIX, entry.name),
                score: Some(best.score),
                trusted: false,
            });
        }

        info!(
            "✓ 匹配成功：{}, {} (分数 {})",
            entry.id, entry.name, best.score
        );
        Some(MatchOutcome {
            entry_index: best.entry_index,
            id: entry.id.clone(),
            name: entry.name.clone(),
            score: Some(best.score),
            trusted: true,
        })
    }

    /// 尝试完全匹配（学号和姓名都一致）
    fn try_exact_match(&self, candidate: &IdentityCandidate) -> Option<MatchOutcome> {
        let (id, name) = (candidate.id.as_deref()?, candidate.name.as_deref()?);
        let (entry_index, entry) = self.roster.find_exact(id, name)?;

        debug!("完全匹配：{}, {}", entry.id, entry.name);
        Some(MatchOutcome {
            entry_index,
            id: entry.id.clone(),
            name: entry.name.clone(),
            score: None,
            trusted: true,
        })
    }

    /// 为名单中每名学生打分
    fn score_all(&self, candidate: &IdentityCandidate, reference_index: usize) -> Vec<MatchCandidate> {
        self.roster
            .entries()
            .iter()
            .enumerate()
            .map(|(entry_index, entry)| {
                let score = score_entry(entry, entry_index, candidate, reference_index);
                if self.verbose_logging {
                    debug!("  [{}] {} {} => {}", entry_index, entry.id, entry.name, score);
                }
                MatchCandidate { entry_index, score }
            })
            .collect()
    }
}

/// 不需要详细日志时的便捷入口
pub fn match_identity(
    candidate: &IdentityCandidate,
    roster: &Roster,
    reference_index: usize,
) -> Option<MatchOutcome> {
    MatchingService::new(roster).resolve(candidate, reference_index)
}

/// 选出最高分；分数相同时取名单中靠前的一项
fn pick_best(scores: &[MatchCandidate]) -> Option<MatchCandidate> {
    scores.iter().copied().fold(None, |best, current| match best {
        Some(b) if b.score >= current.score => Some(b),
        _ => Some(current),
    })
}

/// 计算单个名单条目的匹配分数
///
/// - 学号：完全一致 +100；否则前两位一致 +30、后两位一致 +30、长度一致 +20
/// - 姓名：完全一致 +100；否则首字一致 +50、长度一致 +20、再减去编辑距离
/// - 位置：与当前位置相差 d < 5 时加 `max(0, 50 - 10d)`
///
/// 候选身份中缺失的字段不参与打分，也不会拿 "unknown-id" / "unknown-name"
/// 文本去和名单比较。两个字段都缺失时名次只由位置分决定，
/// 姓名长度或字符恰好接近占位文本的条目不会因此胜出
pub fn score_entry(
    entry: &RosterEntry,
    entry_index: usize,
    candidate: &IdentityCandidate,
    reference_index: usize,
) -> i64 {
    let mut score = 0i64;

    if let Some(id) = candidate.id.as_deref() {
        score += score_id(&entry.id, id);
    }
    if let Some(name) = candidate.name.as_deref() {
        score += score_name(&entry.name, name);
    }

    score + position_bonus(entry_index, reference_index)
}

fn score_id(expected: &str, recognized: &str) -> i64 {
    if expected == recognized {
        return 100;
    }

    let mut score = 0;
    // 学号开头通常是年级信息
    if head(expected, 2) == head(recognized, 2) {
        score += 30;
    }
    // 学号结尾通常是个人编号
    if tail(expected, 2) == tail(recognized, 2) {
        score += 30;
    }
    if expected.chars().count() == recognized.chars().count() {
        score += 20;
    }
    score
}

fn score_name(expected: &str, recognized: &str) -> i64 {
    if expected == recognized {
        return 100;
    }

    let mut score = 0;
    // 姓氏
    if let (Some(a), Some(b)) = (expected.chars().next(), recognized.chars().next()) {
        if a == b {
            score += 50;
        }
    }
    if expected.chars().count() == recognized.chars().count() {
        score += 20;
    }
    score - strsim::levenshtein(expected, recognized) as i64
}

fn position_bonus(entry_index: usize, reference_index: usize) -> i64 {
    let diff = entry_index.abs_diff(reference_index);
    if diff < POSITION_WINDOW {
        (50 - 10 * diff as i64).max(0)
    } else {
        0
    }
}

fn head(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn tail(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars[chars.len().saturating_sub(n)..].iter().collect()
}
