//! 页面翻译核心
//!
//! - `tree`: 宿主文档抽象与变化事件
//! - `rcdom`: html5ever 宿主
//! - `locator`: 候选节点定位
//! - `registry`: 节点认领表
//! - `translator`: 单节点翻译
//! - `toggle`: 原文 / 译文切换
//! - `watcher`: 变化监听与去抖
//! - `selection`: 右键菜单翻译
//!
//! 宿主文档是单线程的（`RcDom` 为 `!Send`），会话需运行在 `LocalSet` 中。

pub mod locator;
pub mod rcdom;
pub mod registry;
pub mod selection;
pub mod toggle;
pub mod translator;
pub mod tree;
pub mod watcher;

use std::rc::Rc;
use std::sync::Arc;

use futures::future::{join_all, LocalBoxFuture};

pub use locator::{MatchRule, TextLocator};
pub use rcdom::RcDomTree;
pub use registry::{ClaimRegistry, DisplayState, NodeState};
pub use selection::{context_menu_title, SelectionTranslator};
pub use toggle::{Activation, ToggleController};
pub use translator::{AttemptOutcome, NodeTranslator, PassSummary, SessionStats};
pub use tree::{DocumentTree, Emphasis, Mutation, MutationFeed, MutationKind, MutationStream, NodeId};
pub use watcher::{Debouncer, MutationWatcher, WatcherHandle};

use crate::preferences::PreferenceStore;
use crate::translation::TranslationClient;

/// 一个文档上的翻译会话
pub struct PageSession<T> {
    tree: Rc<T>,
    registry: Rc<ClaimRegistry>,
    preferences: Arc<PreferenceStore>,
    locator: Rc<TextLocator>,
    client: TranslationClient,
    stats: Rc<SessionStats>,
}

impl<T> Clone for PageSession<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            registry: self.registry.clone(),
            preferences: self.preferences.clone(),
            locator: self.locator.clone(),
            client: self.client.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl<T: DocumentTree + 'static> PageSession<T> {
    pub fn new(tree: Rc<T>, preferences: Arc<PreferenceStore>, client: TranslationClient) -> Self {
        Self {
            tree,
            registry: Rc::new(ClaimRegistry::new()),
            preferences,
            locator: Rc::new(TextLocator::default()),
            client,
            stats: Rc::new(SessionStats::default()),
        }
    }

    pub fn with_locator(mut self, locator: TextLocator) -> Self {
        self.locator = Rc::new(locator);
        self
    }

    pub fn tree(&self) -> &Rc<T> {
        &self.tree
    }

    pub fn registry(&self) -> &ClaimRegistry {
        &self.registry
    }

    pub fn preferences(&self) -> &Arc<PreferenceStore> {
        &self.preferences
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn translator(&self) -> NodeTranslator<T> {
        NodeTranslator::new(
            self.tree.clone(),
            self.registry.clone(),
            self.preferences.clone(),
            self.client.clone(),
            self.stats.clone(),
        )
    }

    pub fn toggles(&self) -> ToggleController<T> {
        ToggleController::new(self.tree.clone(), self.registry.clone())
    }

    pub fn selection(&self) -> SelectionTranslator<T> {
        SelectionTranslator::new(
            self.tree.clone(),
            self.locator.clone(),
            self.registry.clone(),
            self.translator(),
        )
    }

    pub fn locate(&self) -> Vec<NodeId> {
        self.locator.locate(self.tree.as_ref(), &self.registry)
    }

    /// 定位并认领所有候选节点，返回尚未执行的翻译 future
    pub fn start_pass(&self) -> Vec<LocalBoxFuture<'static, AttemptOutcome>> {
        self.stats.record_pass();
        self.prune();

        let translator = self.translator();
        let attempts: Vec<_> = self
            .locate()
            .into_iter()
            .filter_map(|node| translator.attempt(node))
            .collect();

        tracing::debug!(pass = self.stats.passes(), attempts = attempts.len(), "开始扫描");
        attempts
    }

    /// 清理已离开文档的节点，长时间运行的会话里索引和认领表不会无限增长
    pub fn prune(&self) -> usize {
        let forgotten = self.registry.retain_attached(self.tree.as_ref());
        let pruned = self.tree.prune();
        if forgotten + pruned > 0 {
            tracing::debug!(forgotten, pruned, "清理已移除的节点");
        }
        forgotten
    }

    /// 在当前 `LocalSet` 上并发执行一次扫描，返回启动的尝试数
    pub fn run_pass(&self) -> usize {
        let attempts = self.start_pass();
        let started = attempts.len();
        for attempt in attempts {
            tokio::task::spawn_local(attempt);
        }
        started
    }

    /// 执行一次扫描并等待全部完成
    pub async fn translate_pass(&self) -> PassSummary {
        let outcomes = join_all(self.start_pass()).await;
        PassSummary::from_outcomes(&outcomes)
    }

    pub fn toggle(&self, node: NodeId) -> Option<Activation> {
        self.toggles().activate(node)
    }

    pub fn translate_selection(&self, selected: NodeId) -> Option<LocalBoxFuture<'static, AttemptOutcome>> {
        self.selection().translate_selected(selected)
    }

    /// 启动变化监听，需在 `LocalSet` 中调用
    pub fn watch(&self) -> WatcherHandle {
        MutationWatcher::new(self.clone()).spawn()
    }
}
