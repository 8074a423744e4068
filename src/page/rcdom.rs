//! 基于 html5ever `RcDom` 的宿主文档
//!
//! 离线 CLI 和测试都使用它。翻译器自身对文本的改写不会作为变化事件发布，
//! 只有 [`RcDomTree::append_element`] / [`RcDomTree::remove`] 这类宿主侧改动才会。

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::{Rc, Weak};

use html5ever::interface::{Attribute, QualName};
use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{create_element, NodeOrText, TreeSink};
use html5ever::{namespace_url, ns, LocalName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

use super::registry::NodeState;
use super::tree::{DocumentTree, Emphasis, Mutation, MutationFeed, MutationKind, MutationStream, NodeId};
use crate::html::{
    get_child_node_by_name, get_node_attr, get_node_name, get_parent_node, html_to_dom,
    serialize_document, set_node_attr,
};

pub const AFFORDANCE_CLASS: &str = "tweet-translator-toggle";
pub const AFFORDANCE_LABEL: &str = "🌐";
pub const AFFORDANCE_TITLE: &str = "オリジナル/翻訳を切り替え";
pub const RESERVED_SPACE_STYLE: &str = "position: relative; padding-right: 35px";

const DATA_ATTRIBUTES: [&str; 4] = [
    "data-translated",
    "data-showing",
    "data-original-text",
    "data-translated-text",
];

/// `NodeId` 从不复用；被清理的节点再次出现时会分到新的 id
#[derive(Default)]
struct NodeIndex {
    nodes: HashMap<NodeId, Weak<Node>>,
    by_ptr: HashMap<*const Node, NodeId>,
    next: usize,
}

pub struct RcDomTree {
    dom: RcDom,
    index: RefCell<NodeIndex>,
    feed: MutationFeed,
}

impl RcDomTree {
    pub fn from_dom(dom: RcDom) -> Self {
        Self {
            dom,
            index: RefCell::new(NodeIndex::default()),
            feed: MutationFeed::new(),
        }
    }

    pub fn from_bytes(data: &[u8], encoding: &str) -> io::Result<Self> {
        Ok(Self::from_dom(html_to_dom(data, encoding)?))
    }

    pub fn parse(html: &str) -> io::Result<Self> {
        Self::from_bytes(html.as_bytes(), "utf-8")
    }

    pub fn document(&self) -> &Handle {
        &self.dom.document
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = get_child_node_by_name(&self.dom.document, "html")?;
        let body = get_child_node_by_name(&html, "body")?;
        Some(self.id_for(&body))
    }

    pub fn handle(&self, node: NodeId) -> Option<Handle> {
        self.index.borrow().nodes.get(&node)?.upgrade()
    }

    /// 按属性值查找元素，文档顺序
    pub fn find_by_attr(&self, name: &str, value: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|node| self.attribute(*node, name).as_deref() == Some(value))
            .collect()
    }

    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|node| self.tag_name(*node).as_deref() == Some(tag))
            .collect()
    }

    pub fn to_html(&self, encoding: &str) -> io::Result<Vec<u8>> {
        serialize_document(&self.dom.document, encoding)
    }

    /// 在 `parent` 末尾追加元素并发布 `Added` 事件
    pub fn append_element(
        &self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: Option<&str>,
    ) -> Option<NodeId> {
        let parent = self.attached_handle(parent)?;

        let element = create_element(
            &self.dom,
            QualName::new(None, ns!(html), LocalName::from(tag)),
            attrs.iter().map(|(name, value)| attribute(name, value)).collect(),
        );
        if let Some(text) = text {
            self.dom
                .append(&element, NodeOrText::AppendText(StrTendril::from_slice(text)));
        }
        self.dom.append(&parent, NodeOrText::AppendNode(element.clone()));

        let id = self.id_for(&element);
        self.feed.emit(Mutation {
            kind: MutationKind::Added,
            target: id,
        });
        Some(id)
    }

    /// 把节点从文档中移除并发布 `Removed` 事件
    pub fn remove(&self, node: NodeId) -> bool {
        let Some(handle) = self.attached_handle(node) else {
            return false;
        };

        self.dom.remove_from_parent(&handle);
        self.feed.emit(Mutation {
            kind: MutationKind::Removed,
            target: node,
        });
        true
    }

    /// 关闭所有变化订阅
    pub fn close(&self) {
        self.feed.close();
    }

    fn id_for(&self, handle: &Handle) -> NodeId {
        let mut index = self.index.borrow_mut();
        let ptr = Rc::as_ptr(handle);
        if let Some(id) = index.by_ptr.get(&ptr) {
            return *id;
        }

        let id = NodeId(index.next);
        index.next += 1;
        index.nodes.insert(id, Rc::downgrade(handle));
        index.by_ptr.insert(ptr, id);
        id
    }

    /// 已索引的节点数
    pub fn indexed_len(&self) -> usize {
        self.index.borrow().nodes.len()
    }

    fn attached_handle(&self, node: NodeId) -> Option<Handle> {
        let handle = self.handle(node)?;
        self.is_handle_attached(&handle).then_some(handle)
    }

    fn is_handle_attached(&self, handle: &Handle) -> bool {
        let mut current = handle.clone();
        loop {
            if Rc::ptr_eq(&current, &self.dom.document) {
                return true;
            }
            match get_parent_node(&current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn collect_elements(&self, handle: &Handle, out: &mut Vec<NodeId>) {
        for child in handle.children.borrow().iter() {
            if let NodeData::Element { .. } = child.data {
                out.push(self.id_for(child));
            }
            self.collect_elements(child, out);
        }
    }

    fn affordance_of(&self, handle: &Handle) -> Option<Handle> {
        handle
            .children
            .borrow()
            .iter()
            .find(|child| is_affordance(child))
            .cloned()
    }
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, ns!(), LocalName::from(name)),
        value: StrTendril::from_slice(value),
    }
}

fn is_affordance(handle: &Handle) -> bool {
    get_node_name(handle) == Some("button")
        && get_node_attr(handle, "class")
            .map(|class| class.split_whitespace().any(|c| c == AFFORDANCE_CLASS))
            .unwrap_or(false)
}

fn collect_text(handle: &Handle, out: &mut String) {
    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { name, .. } => match name.local.as_ref() {
                "script" | "style" | "template" => {}
                "br" => out.push('\n'),
                "button" if is_affordance(child) => {}
                _ => collect_text(child, out),
            },
            _ => {}
        }
    }
}

impl DocumentTree for RcDomTree {
    fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(&self.dom.document, &mut out);
        out
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        let handle = self.handle(node)?;
        get_node_name(&handle).map(|name| name.to_ascii_lowercase())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        get_node_attr(&self.handle(node)?, name)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = get_parent_node(&self.handle(node)?)?;
        match parent.data {
            NodeData::Element { .. } => Some(self.id_for(&parent)),
            _ => None,
        }
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.attached_handle(node).is_some()
    }

    fn prune(&self) -> usize {
        let stale: Vec<(NodeId, Weak<Node>)> = self
            .index
            .borrow()
            .nodes
            .iter()
            .filter(|(_, weak)| match weak.upgrade() {
                Some(handle) => !self.is_handle_attached(&handle),
                None => true,
            })
            .map(|(id, weak)| (*id, weak.clone()))
            .collect();

        let mut index = self.index.borrow_mut();
        for (id, weak) in &stale {
            index.nodes.remove(id);
            index.by_ptr.remove(&weak.as_ptr());
        }
        stale.len()
    }

    fn rendered_text(&self, node: NodeId) -> Option<String> {
        let handle = self.attached_handle(node)?;
        let mut text = String::new();
        collect_text(&handle, &mut text);
        Some(text)
    }

    fn set_rendered_text(&self, node: NodeId, text: &str) -> bool {
        let Some(handle) = self.attached_handle(node) else {
            return false;
        };

        let children: Vec<Handle> = handle.children.borrow().clone();
        let mut affordance = None;
        for child in children {
            if affordance.is_none() && is_affordance(&child) {
                affordance = Some(child);
            } else {
                self.dom.remove_from_parent(&child);
            }
        }

        let text = NodeOrText::AppendText(StrTendril::from_slice(text));
        match affordance {
            Some(button) => self.dom.append_before_sibling(&button, text),
            None => self.dom.append(&handle, text),
        }
        true
    }

    fn reserve_affordance_space(&self, node: NodeId) -> bool {
        let Some(handle) = self.attached_handle(node) else {
            return false;
        };

        let style = get_node_attr(&handle, "style").unwrap_or_default();
        if style.contains(RESERVED_SPACE_STYLE) {
            return true;
        }

        let existing = style.trim().trim_end_matches(';');
        let merged = if existing.is_empty() {
            RESERVED_SPACE_STYLE.to_string()
        } else {
            format!("{}; {}", existing, RESERVED_SPACE_STYLE)
        };
        set_node_attr(&handle, "style", Some(merged));
        true
    }

    fn install_affordance(&self, node: NodeId) -> bool {
        let Some(handle) = self.attached_handle(node) else {
            return false;
        };
        if self.affordance_of(&handle).is_some() {
            return true;
        }

        let button = create_element(
            &self.dom,
            QualName::new(None, ns!(html), LocalName::from("button")),
            vec![
                attribute("class", AFFORDANCE_CLASS),
                attribute("type", "button"),
                attribute("title", AFFORDANCE_TITLE),
                attribute("style", "opacity: 1"),
            ],
        );
        self.dom.append(
            &button,
            NodeOrText::AppendText(StrTendril::from_slice(AFFORDANCE_LABEL)),
        );
        self.dom.append(&handle, NodeOrText::AppendNode(button));
        true
    }

    fn set_affordance_emphasis(&self, node: NodeId, emphasis: Emphasis) -> bool {
        let Some(button) = self
            .attached_handle(node)
            .and_then(|handle| self.affordance_of(&handle))
        else {
            return false;
        };

        set_node_attr(&button, "style", Some(format!("opacity: {}", emphasis.opacity())));
        true
    }

    fn reflect_state(&self, node: NodeId, state: Option<&NodeState>) {
        let Some(handle) = self.attached_handle(node) else {
            return;
        };

        match state.filter(|state| state.is_translated()) {
            Some(state) => {
                set_node_attr(&handle, "data-translated", Some("true".to_string()));
                set_node_attr(&handle, "data-showing", Some(state.display.as_str().to_string()));
                set_node_attr(&handle, "data-original-text", Some(state.original_text.clone()));
                set_node_attr(&handle, "data-translated-text", state.translated_text.clone());
            }
            None => {
                for name in DATA_ATTRIBUTES {
                    set_node_attr(&handle, name, None);
                }
            }
        }
    }

    fn observe(&self) -> MutationStream {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <article><div data-testid="tweetText" lang="es">Hola <a href="/x">@amigo</a><br>adiós</div></article>
        <script>var x = 1;</script>
    </body></html>"#;

    fn tweet(tree: &RcDomTree) -> NodeId {
        tree.find_by_attr("data-testid", "tweetText")[0]
    }

    #[test]
    fn rendered_text_flattens_inline_markup() {
        let tree = RcDomTree::parse(PAGE).unwrap();
        assert_eq!(tree.rendered_text(tweet(&tree)).as_deref(), Some("Hola @amigo\nadiós"));
    }

    #[test]
    fn ids_are_stable_across_lookups() {
        let tree = RcDomTree::parse(PAGE).unwrap();
        let first = tweet(&tree);
        let second = tweet(&tree);
        assert_eq!(first, second);

        let article = tree.find_by_tag("article")[0];
        assert_eq!(tree.parent(first), Some(article));
        assert!(tree.ancestors_or_self(first).contains(&tree.body().unwrap()));
    }

    #[test]
    fn rewriting_text_keeps_the_affordance() {
        let tree = RcDomTree::parse(PAGE).unwrap();
        let node = tweet(&tree);

        assert!(tree.set_rendered_text(node, "Hello @amigo"));
        assert!(tree.install_affordance(node));
        assert!(tree.install_affordance(node));
        assert!(tree.set_rendered_text(node, "Hola otra vez"));

        assert_eq!(tree.rendered_text(node).as_deref(), Some("Hola otra vez"));

        let html = String::from_utf8(tree.to_html("utf-8").unwrap()).unwrap();
        assert_eq!(html.matches(AFFORDANCE_CLASS).count(), 1);
        assert!(html.contains("Hola otra vez<button"));
    }

    #[test]
    fn detached_nodes_ignore_writes() {
        let tree = RcDomTree::parse(PAGE).unwrap();
        let node = tweet(&tree);

        assert!(tree.remove(node));
        assert!(!tree.is_attached(node));
        assert_eq!(tree.rendered_text(node), None);
        assert!(!tree.set_rendered_text(node, "x"));
        assert!(!tree.install_affordance(node));
        assert!(!tree.remove(node));
    }

    #[test]
    fn prune_forgets_removed_nodes() {
        let tree = RcDomTree::parse(PAGE).unwrap();
        let node = tweet(&tree);
        let article = tree.find_by_tag("article")[0];
        tree.elements();
        let indexed = tree.indexed_len();

        assert!(tree.remove(article));
        assert_eq!(tree.prune(), 4);
        assert_eq!(tree.indexed_len(), indexed - 4);
        assert_eq!(tree.handle(node).map(|_| ()), None);
        assert_eq!(tree.prune(), 0);

        let body = tree.body().unwrap();
        let added = tree.append_element(body, "div", &[("lang", "es")], Some("nuevo")).unwrap();
        assert!(added.0 > node.0, "清理后分配的 id 不应复用");
    }

    #[test]
    fn reserved_space_merges_with_existing_style() {
        let tree = RcDomTree::parse(r#"<div id="t" style="color: red;">x</div>"#).unwrap();
        let node = tree.find_by_attr("id", "t")[0];

        tree.reserve_affordance_space(node);
        tree.reserve_affordance_space(node);

        assert_eq!(
            tree.attribute(node, "style").as_deref(),
            Some("color: red; position: relative; padding-right: 35px")
        );
    }

    #[tokio::test]
    async fn host_mutations_are_published() {
        let tree = RcDomTree::parse(PAGE).unwrap();
        let mut stream = tree.observe();
        let body = tree.body().unwrap();

        let added = tree
            .append_element(body, "div", &[("lang", "fr")], Some("Bonjour"))
            .unwrap();
        tree.set_rendered_text(added, "Hello");
        tree.remove(added);

        assert_eq!(stream.next().await.map(|m| m.kind), Some(MutationKind::Added));
        assert_eq!(stream.next().await.map(|m| m.kind), Some(MutationKind::Removed));
        assert_eq!(stream.try_next(), None);
    }
}
