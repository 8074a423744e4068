//! 单节点翻译
//!
//! [`NodeTranslator::attempt`] 不是 `async fn`：认领必须在返回 future 之前同步完成，
//! 否则两次扫描可能在第一次挂起之前都看到节点未被认领。

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use futures::future::{FutureExt, LocalBoxFuture};

use super::registry::ClaimRegistry;
use super::tree::{DocumentTree, Emphasis, NodeId};
use crate::preferences::{PreferenceStore, Preferences};
use crate::translation::error::helpers;
use crate::translation::TranslationClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 文本已替换并安装了切换按钮
    Translated,
    /// 译文与原文相同，认领已释放
    Unchanged,
    /// 翻译失败，认领已释放，下一次扫描会重试
    Failed,
    /// 结果返回时节点已脱离文档，结果被丢弃
    Detached,
}

/// 一次扫描的结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub translated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub detached: usize,
}

impl PassSummary {
    pub fn from_outcomes(outcomes: &[AttemptOutcome]) -> Self {
        let mut summary = Self::default();
        for outcome in outcomes {
            summary.record(*outcome);
        }
        summary
    }

    fn record(&mut self, outcome: AttemptOutcome) {
        match outcome {
            AttemptOutcome::Translated => self.translated += 1,
            AttemptOutcome::Unchanged => self.unchanged += 1,
            AttemptOutcome::Failed => self.failed += 1,
            AttemptOutcome::Detached => self.detached += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.translated + self.unchanged + self.failed + self.detached
    }
}

/// 会话累计统计
#[derive(Debug, Default)]
pub struct SessionStats {
    passes: Cell<usize>,
    outcomes: Cell<PassSummary>,
}

impl SessionStats {
    pub fn passes(&self) -> usize {
        self.passes.get()
    }

    pub fn totals(&self) -> PassSummary {
        self.outcomes.get()
    }

    pub(crate) fn record_pass(&self) {
        self.passes.set(self.passes.get() + 1);
    }

    pub(crate) fn record(&self, outcome: AttemptOutcome) {
        let mut totals = self.outcomes.get();
        totals.record(outcome);
        self.outcomes.set(totals);
    }
}

pub struct NodeTranslator<T> {
    tree: Rc<T>,
    registry: Rc<ClaimRegistry>,
    preferences: Arc<PreferenceStore>,
    client: TranslationClient,
    stats: Rc<SessionStats>,
}

impl<T> Clone for NodeTranslator<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            registry: self.registry.clone(),
            preferences: self.preferences.clone(),
            client: self.client.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl<T: DocumentTree + 'static> NodeTranslator<T> {
    pub fn new(
        tree: Rc<T>,
        registry: Rc<ClaimRegistry>,
        preferences: Arc<PreferenceStore>,
        client: TranslationClient,
        stats: Rc<SessionStats>,
    ) -> Self {
        Self {
            tree,
            registry,
            preferences,
            client,
            stats,
        }
    }

    /// 认领节点并返回翻译 future；已禁用、已认领、已脱离或无文本时返回 `None`
    pub fn attempt(&self, node: NodeId) -> Option<LocalBoxFuture<'static, AttemptOutcome>> {
        let preferences = self.preferences.get();
        if !preferences.enabled || self.registry.is_claimed(node) {
            return None;
        }

        let original = self.tree.rendered_text(node)?;
        if original.trim().is_empty() || !self.registry.claim(node, original.clone()) {
            return None;
        }

        tracing::debug!(node = node.0, chars = original.chars().count(), "节点已认领");

        let this = self.clone();
        Some(async move { this.complete(node, original, preferences).await }.boxed_local())
    }

    async fn complete(self, node: NodeId, original: String, preferences: Preferences) -> AttemptOutcome {
        let outcome = match self
            .client
            .translate(&original, &preferences.source_lang, &preferences.target_lang)
            .await
        {
            Ok(result) if !result.is_noop() => self.apply(node, result.translated_text),
            Ok(_) => {
                self.registry.release(node);
                AttemptOutcome::Unchanged
            }
            Err(e) => {
                helpers::log_error(&e);
                tracing::debug!(node = node.0, retryable = e.is_retryable(), "释放认领");
                self.registry.release(node);
                AttemptOutcome::Failed
            }
        };

        tracing::debug!(node = node.0, ?outcome, "节点处理完成");
        self.stats.record(outcome);
        outcome
    }

    fn apply(&self, node: NodeId, translated: String) -> AttemptOutcome {
        if !self.tree.is_attached(node) {
            return AttemptOutcome::Detached;
        }

        if !self.tree.set_rendered_text(node, &translated) {
            return AttemptOutcome::Detached;
        }
        let state = self.registry.settle(node, translated);
        self.tree.reserve_affordance_space(node);
        self.tree.install_affordance(node);
        self.tree.set_affordance_emphasis(node, Emphasis::Full);
        self.tree.reflect_state(node, state.as_ref());

        AttemptOutcome::Translated
    }
}
