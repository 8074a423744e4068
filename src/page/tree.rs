//! 宿主文档抽象
//!
//! 页面翻译核心只通过 [`DocumentTree`] 访问文档。节点由宿主发放不透明的 [`NodeId`]，
//! 节点随时可能被宿主移除；对已脱离文档的节点的任何写操作都是静默的空操作。

use std::cell::RefCell;

use tokio::sync::mpsc;

use super::registry::NodeState;

/// 宿主发放的节点标识，同一文档内不复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// 切换按钮的显示强度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// 显示译文时
    Full,
    /// 显示原文时
    Dimmed,
}

impl Emphasis {
    pub fn opacity(&self) -> &'static str {
        match self {
            Emphasis::Full => "1",
            Emphasis::Dimmed => "0.5",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Added,
    Removed,
}

/// 文档结构变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    pub kind: MutationKind,
    pub target: NodeId,
}

/// 宿主文档接口
pub trait DocumentTree {
    /// 文档中所有元素，按文档顺序
    fn elements(&self) -> Vec<NodeId>;

    /// 小写标签名
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn is_attached(&self, node: NodeId) -> bool;

    /// 忘记已不在文档中的节点，返回清理的数量。被忘记的 id 不再有效
    fn prune(&self) -> usize {
        0
    }

    /// 节点显示的文本；不包含切换按钮。节点不存在时返回 `None`
    fn rendered_text(&self, node: NodeId) -> Option<String>;

    /// 替换显示文本，保留切换按钮。节点已脱离时返回 `false`
    fn set_rendered_text(&self, node: NodeId, text: &str) -> bool;

    /// 为切换按钮预留布局空间
    fn reserve_affordance_space(&self, node: NodeId) -> bool;

    /// 安装切换按钮；已安装时不重复安装
    fn install_affordance(&self, node: NodeId) -> bool;

    fn set_affordance_emphasis(&self, node: NodeId, emphasis: Emphasis) -> bool;

    /// 把节点状态同步到宿主（例如 data 属性），默认不做任何事
    fn reflect_state(&self, _node: NodeId, _state: Option<&NodeState>) {}

    /// 订阅文档变化
    fn observe(&self) -> MutationStream;

    /// 自身及所有祖先，由近及远
    fn ancestors_or_self(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }
}

/// 变化事件的发布端，由宿主持有
#[derive(Debug, Default)]
pub struct MutationFeed {
    subscribers: RefCell<Vec<mpsc::UnboundedSender<Mutation>>>,
}

impl MutationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> MutationStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers.borrow_mut().push(sender);
        MutationStream { receiver }
    }

    /// 发布事件，顺便清理已关闭的订阅
    pub fn emit(&self, mutation: Mutation) {
        self.subscribers
            .borrow_mut()
            .retain(|sender| sender.send(mutation).is_ok());
    }

    /// 关闭所有订阅，订阅端随后收到 `None`
    pub fn close(&self) {
        self.subscribers.borrow_mut().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

/// 变化事件的订阅端
#[derive(Debug)]
pub struct MutationStream {
    receiver: mpsc::UnboundedReceiver<Mutation>,
}

impl MutationStream {
    pub async fn next(&mut self) -> Option<Mutation> {
        self.receiver.recv().await
    }

    pub fn try_next(&mut self) -> Option<Mutation> {
        self.receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn feed_delivers_to_every_subscriber() {
        let feed = MutationFeed::new();
        let mut first = feed.subscribe();
        let mut second = feed.subscribe();

        let mutation = Mutation {
            kind: MutationKind::Added,
            target: NodeId(3),
        };
        feed.emit(mutation);

        assert_eq!(first.next().await, Some(mutation));
        assert_eq!(second.next().await, Some(mutation));
    }

    #[tokio::test]
    async fn dropped_subscribers_are_pruned_and_close_ends_streams() {
        let feed = MutationFeed::new();
        let mut kept = feed.subscribe();
        drop(feed.subscribe());

        feed.emit(Mutation {
            kind: MutationKind::Removed,
            target: NodeId(1),
        });
        assert_eq!(feed.subscriber_count(), 1);

        feed.close();
        assert!(kept.next().await.is_some());
        assert_eq!(kept.next().await, None);
    }
}
