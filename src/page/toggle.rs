//! 原文 / 译文切换

use std::rc::Rc;

use super::registry::{ClaimRegistry, DisplayState};
use super::tree::{DocumentTree, Emphasis, NodeId};

/// 一次用户激活的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub node: NodeId,
    pub showing: DisplayState,
    /// 事件已被处理，不应再向文档传播
    pub consumed: bool,
}

pub struct ToggleController<T> {
    tree: Rc<T>,
    registry: Rc<ClaimRegistry>,
}

impl<T> Clone for ToggleController<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<T: DocumentTree> ToggleController<T> {
    pub fn new(tree: Rc<T>, registry: Rc<ClaimRegistry>) -> Self {
        Self { tree, registry }
    }

    /// 切换显示内容；节点未翻译或已脱离时返回 `None`
    pub fn activate(&self, node: NodeId) -> Option<Activation> {
        if !self.tree.is_attached(node) {
            return None;
        }

        let state = self.registry.toggle(node)?;
        let (text, emphasis) = match state.display {
            DisplayState::Translated => (state.translated_text.as_deref()?, Emphasis::Full),
            DisplayState::Original => (state.original_text.as_str(), Emphasis::Dimmed),
        };

        self.tree.set_rendered_text(node, text);
        self.tree.set_affordance_emphasis(node, emphasis);
        self.tree.reflect_state(node, Some(&state));

        tracing::debug!(node = node.0, showing = state.display.as_str(), "切换显示");

        Some(Activation {
            node,
            showing: state.display,
            consumed: true,
        })
    }
}
