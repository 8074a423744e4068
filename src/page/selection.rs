//! 右键菜单触发的翻译
//!
//! 用户选中的节点由宿主显式传入，向上找到最近的、匹配定位规则且未认领的节点。

use std::rc::Rc;

use futures::future::LocalBoxFuture;

use super::locator::TextLocator;
use super::registry::ClaimRegistry;
use super::translator::{AttemptOutcome, NodeTranslator};
use super::tree::{DocumentTree, NodeId};

/// 未选中任何推文时的菜单标题
pub const DEFAULT_MENU_TITLE: &str = "このツイートを翻訳";

const MENU_PREVIEW_CHARS: usize = 20;

/// 右键菜单标题，截取前 20 个字符
pub fn context_menu_title(text: &str) -> String {
    let preview: String = text.chars().take(MENU_PREVIEW_CHARS).collect();
    format!("翻訳: \"{}...\"", preview)
}

pub struct SelectionTranslator<T> {
    tree: Rc<T>,
    locator: Rc<TextLocator>,
    registry: Rc<ClaimRegistry>,
    translator: NodeTranslator<T>,
}

impl<T: DocumentTree + 'static> SelectionTranslator<T> {
    pub fn new(
        tree: Rc<T>,
        locator: Rc<TextLocator>,
        registry: Rc<ClaimRegistry>,
        translator: NodeTranslator<T>,
    ) -> Self {
        Self {
            tree,
            locator,
            registry,
            translator,
        }
    }

    /// 选中节点自身或最近的可翻译祖先
    pub fn resolve(&self, selected: NodeId) -> Option<NodeId> {
        self.tree
            .ancestors_or_self(selected)
            .into_iter()
            .find(|node| self.locator.matches(self.tree.as_ref(), *node))
            .filter(|node| !self.registry.is_claimed(*node))
    }

    /// 菜单标题；没有可翻译节点时返回 `None`
    pub fn menu_title(&self, selected: NodeId) -> Option<String> {
        let node = self.resolve(selected)?;
        let text = self.tree.rendered_text(node)?;
        Some(context_menu_title(&text))
    }

    pub fn translate_selected(&self, selected: NodeId) -> Option<LocalBoxFuture<'static, AttemptOutcome>> {
        let node = self.resolve(selected)?;
        tracing::debug!(selected = selected.0, node = node.0, "翻译选中的推文");
        self.translator.attempt(node)
    }
}
