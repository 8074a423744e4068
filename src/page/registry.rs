//! 节点认领表
//!
//! 按 [`NodeId`] 记录每个节点的翻译状态。认领标记不写在节点上，
//! 认领在第一次挂起之前同步完成，这是防止同一节点被翻译两次的唯一保证。

use std::cell::RefCell;
use std::collections::HashMap;

use super::tree::{DocumentTree, NodeId};

/// 当前显示的内容
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Original,
    Translated,
}

impl DisplayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayState::Original => "original",
            DisplayState::Translated => "translated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeState {
    pub claimed: bool,
    pub display: DisplayState,
    /// 认领时记录，早于任何显示内容的改动
    pub original_text: String,
    pub translated_text: Option<String>,
}

impl NodeState {
    pub fn is_translated(&self) -> bool {
        self.translated_text.is_some()
    }
}

#[derive(Debug, Default)]
pub struct ClaimRegistry {
    states: RefCell<HashMap<NodeId, NodeState>>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_claimed(&self, node: NodeId) -> bool {
        self.states
            .borrow()
            .get(&node)
            .map(|state| state.claimed)
            .unwrap_or(false)
    }

    /// 认领节点；已被认领时返回 `false`
    pub fn claim(&self, node: NodeId, original_text: String) -> bool {
        let mut states = self.states.borrow_mut();
        if states.get(&node).map(|state| state.claimed).unwrap_or(false) {
            return false;
        }

        states.insert(
            node,
            NodeState {
                claimed: true,
                display: DisplayState::Original,
                original_text,
                translated_text: None,
            },
        );
        true
    }

    /// 释放认领，之后的扫描可以再次尝试
    pub fn release(&self, node: NodeId) {
        self.states.borrow_mut().remove(&node);
    }

    /// 记录译文并切换到译文显示
    pub fn settle(&self, node: NodeId, translated_text: String) -> Option<NodeState> {
        let mut states = self.states.borrow_mut();
        let state = states.get_mut(&node)?;
        state.translated_text = Some(translated_text);
        state.display = DisplayState::Translated;
        Some(state.clone())
    }

    /// 在原文和译文之间切换；未翻译的节点返回 `None`
    pub fn toggle(&self, node: NodeId) -> Option<NodeState> {
        let mut states = self.states.borrow_mut();
        let state = states.get_mut(&node).filter(|state| state.is_translated())?;
        state.display = match state.display {
            DisplayState::Translated => DisplayState::Original,
            DisplayState::Original => DisplayState::Translated,
        };
        Some(state.clone())
    }

    pub fn state(&self, node: NodeId) -> Option<NodeState> {
        self.states.borrow().get(&node).cloned()
    }

    /// 丢弃已离开文档的节点状态，返回丢弃的数量
    pub fn retain_attached<T: DocumentTree + ?Sized>(&self, tree: &T) -> usize {
        let mut states = self.states.borrow_mut();
        let before = states.len();
        states.retain(|node, _| tree.is_attached(*node));
        before - states.len()
    }

    pub fn len(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.borrow().is_empty()
    }
}
