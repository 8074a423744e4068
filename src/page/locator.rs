//! 推文文本定位
//!
//! 按优先级依次应用匹配规则，任何一条规则命中即视为候选节点。

use std::collections::HashSet;

use super::registry::ClaimRegistry;
use super::tree::{DocumentTree, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// `[name="value"]`
    Attribute { name: String, value: String },
    /// `tag[lang]`
    LanguageAttribute { tag: String },
    /// `ancestor tag[attribute="value"]`
    Structural {
        ancestor: String,
        tag: String,
        attribute: String,
        value: String,
    },
}

impl MatchRule {
    pub fn attribute(name: &str, value: &str) -> Self {
        MatchRule::Attribute {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn language_attribute(tag: &str) -> Self {
        MatchRule::LanguageAttribute {
            tag: tag.to_ascii_lowercase(),
        }
    }

    pub fn structural(ancestor: &str, tag: &str, attribute: &str, value: &str) -> Self {
        MatchRule::Structural {
            ancestor: ancestor.to_ascii_lowercase(),
            tag: tag.to_ascii_lowercase(),
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    pub fn matches<T: DocumentTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        match self {
            MatchRule::Attribute { name, value } => {
                tree.attribute(node, name).as_deref() == Some(value.as_str())
            }
            MatchRule::LanguageAttribute { tag } => {
                tree.tag_name(node).as_deref() == Some(tag.as_str())
                    && tree.attribute(node, "lang").is_some()
            }
            MatchRule::Structural {
                ancestor,
                tag,
                attribute,
                value,
            } => {
                tree.tag_name(node).as_deref() == Some(tag.as_str())
                    && tree.attribute(node, attribute).as_deref() == Some(value.as_str())
                    && tree
                        .ancestors_or_self(node)
                        .into_iter()
                        .skip(1)
                        .any(|parent| tree.tag_name(parent).as_deref() == Some(ancestor.as_str()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLocator {
    rules: Vec<MatchRule>,
}

impl Default for TextLocator {
    fn default() -> Self {
        Self::new(vec![
            MatchRule::attribute("data-testid", "tweetText"),
            MatchRule::language_attribute("div"),
            MatchRule::structural("article", "div", "dir", "auto"),
        ])
    }
}

impl TextLocator {
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    pub fn matches<T: DocumentTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        self.rules.iter().any(|rule| rule.matches(tree, node))
    }

    /// 未认领且文本非空的候选节点。规则顺序优先，同一规则内按文档顺序，不重复
    pub fn locate<T: DocumentTree + ?Sized>(&self, tree: &T, registry: &ClaimRegistry) -> Vec<NodeId> {
        let elements = tree.elements();
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for rule in &self.rules {
            for node in elements.iter().copied() {
                if seen.contains(&node) || !rule.matches(tree, node) {
                    continue;
                }
                seen.insert(node);

                if registry.is_claimed(node) {
                    continue;
                }

                let has_text = tree
                    .rendered_text(node)
                    .map(|text| !text.trim().is_empty())
                    .unwrap_or(false);
                if has_text {
                    found.push(node);
                }
            }
        }

        tracing::trace!(candidates = found.len(), "定位候选节点");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::RcDomTree;

    const TIMELINE: &str = r#"<html><body>
        <div lang="en" id="loose">Loose text</div>
        <article>
            <div data-testid="tweetText" lang="ja" dir="auto" id="primary">こんにちは</div>
            <div dir="auto" id="fallback">Bonjour</div>
            <div dir="auto" id="blank">   </div>
        </article>
        <div dir="auto" id="outside">Not in an article</div>
        <span lang="de" id="span">Hallo</span>
    </body></html>"#;

    fn ids(tree: &RcDomTree, nodes: &[NodeId]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| tree.attribute(*node, "id").unwrap_or_default())
            .collect()
    }

    #[test]
    fn rules_apply_in_priority_order_without_duplicates() {
        let tree = RcDomTree::parse(TIMELINE).unwrap();
        let registry = ClaimRegistry::new();

        let found = TextLocator::default().locate(&tree, &registry);

        assert_eq!(ids(&tree, &found), vec!["primary", "loose", "fallback"]);
    }

    #[test]
    fn claimed_nodes_are_skipped() {
        let tree = RcDomTree::parse(TIMELINE).unwrap();
        let registry = ClaimRegistry::new();
        let primary = tree.find_by_attr("id", "primary")[0];
        registry.claim(primary, "こんにちは".to_string());

        let found = TextLocator::default().locate(&tree, &registry);
        assert_eq!(ids(&tree, &found), vec!["loose", "fallback"]);
    }

    #[test]
    fn single_node_matching() {
        let tree = RcDomTree::parse(TIMELINE).unwrap();
        let locator = TextLocator::default();

        let outside = tree.find_by_attr("id", "outside")[0];
        let span = tree.find_by_attr("id", "span")[0];
        let fallback = tree.find_by_attr("id", "fallback")[0];

        assert!(!locator.matches(&tree, outside));
        assert!(!locator.matches(&tree, span));
        assert!(locator.matches(&tree, fallback));
    }
}
