//! 题目整理 - 业务能力层
//!
//! 去重（按题干，先出现的保留）→ 打乱题目顺序 → 逐题打乱选项顺序。
//! 结果在会话内冻结，不再变化。

use crate::models::Question;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// 按题干去重，保留第一次出现的题目
pub fn dedupe_by_stem(questions: Vec<Question>) -> Vec<Question> {
    let mut seen = HashSet::new();
    let before = questions.len();

    let unique: Vec<Question> = questions
        .into_iter()
        .filter(|q| seen.insert(q.stem.clone()))
        .collect();

    if unique.len() < before {
        debug!("题干去重: {} → {}", before, unique.len());
    }
    unique
}

/// 均匀打乱题目顺序，再独立打乱每道题的选项
pub fn shuffle_deck<R: Rng + ?Sized>(questions: &mut [Question], rng: &mut R) {
    questions.shuffle(rng);
    for question in questions.iter_mut() {
        question.options.shuffle(rng);
    }
}

/// 去重 + 打乱
pub fn prepare_deck<R: Rng + ?Sized>(questions: Vec<Question>, rng: &mut R) -> Vec<Question> {
    let mut deck = dedupe_by_stem(questions);
    shuffle_deck(&mut deck, rng);
    deck
}
