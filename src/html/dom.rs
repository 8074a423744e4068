use std::io;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
///
/// 无法识别的编码按 UTF-8（有损）处理。
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> io::Result<RcDom> {
    let text = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => encoding.decode(data).0.into_owned(),
        None => String::from_utf8_lossy(data).into_owned(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut text.as_bytes())
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    parent
        .children
        .borrow()
        .iter()
        .find(|child| get_node_name(child) == Some(node_name))
        .cloned()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点，不改变节点间的链接
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 设置节点属性，`None` 表示删除
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::{namespace_url, ns, LocalName};

    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        let existing = attrs.iter().position(|attr| &*attr.name.local == attr_name);

        match (existing, attr_value) {
            (Some(index), Some(value)) => {
                attrs[index].value.clear();
                attrs[index].value.push_slice(&value);
            }
            (Some(_), None) => attrs.retain(|attr| &*attr.name.local != attr_name),
            (None, Some(value)) => attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                value: format_tendril!("{}", value),
            }),
            (None, None) => {}
        }
    }
}

/// 读取 `<meta charset>` 或 `http-equiv="content-type"` 中声明的编码
pub fn get_charset(document: &Handle) -> Option<String> {
    let head = get_child_node_by_name(document, "html")
        .and_then(|html| get_child_node_by_name(&html, "head"))?;

    let children = head.children.borrow();
    for meta in children.iter().filter(|node| get_node_name(node) == Some("meta")) {
        if let Some(charset) = get_node_attr(meta, "charset") {
            return Some(charset);
        }

        let is_content_type = get_node_attr(meta, "http-equiv")
            .map(|value| value.eq_ignore_ascii_case("content-type"))
            .unwrap_or(false);
        if is_content_type {
            let charset = get_node_attr(meta, "content").and_then(|content| {
                content.split(';').find_map(|part| {
                    let (key, value) = part.trim().split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("charset")
                        .then(|| value.trim().trim_matches('"').to_string())
                })
            });
            if charset.is_some() {
                return charset;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(dom: &RcDom) -> Handle {
        let html = get_child_node_by_name(&dom.document, "html").unwrap();
        get_child_node_by_name(&html, "body").unwrap()
    }

    #[test]
    fn parent_lookup_keeps_link() {
        let dom = html_to_dom(b"<html><body><p>x</p></body></html>", "utf-8").unwrap();
        let p = get_child_node_by_name(&body(&dom), "p").unwrap();

        let first = get_parent_node(&p).unwrap();
        let second = get_parent_node(&p).unwrap();
        assert_eq!(get_node_name(&first), Some("body"));
        assert!(std::rc::Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn attributes_are_set_replaced_and_removed() {
        let dom = html_to_dom(b"<div id=a></div>", "utf-8").unwrap();
        let div = get_child_node_by_name(&body(&dom), "div").unwrap();

        set_node_attr(&div, "data-x", Some("1".to_string()));
        set_node_attr(&div, "id", Some("b".to_string()));
        assert_eq!(get_node_attr(&div, "data-x").as_deref(), Some("1"));
        assert_eq!(get_node_attr(&div, "id").as_deref(), Some("b"));

        set_node_attr(&div, "id", None);
        assert_eq!(get_node_attr(&div, "id"), None);
    }

    #[test]
    fn charset_is_read_from_meta() {
        let dom = html_to_dom(
            br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=Shift_JIS"></head></html>"#,
            "utf-8",
        )
        .unwrap();
        assert_eq!(get_charset(&dom.document).as_deref(), Some("Shift_JIS"));

        let dom = html_to_dom(b"<html><head><meta charset=utf-8></head></html>", "").unwrap();
        assert_eq!(get_charset(&dom.document).as_deref(), Some("utf-8"));
    }

    #[test]
    fn legacy_encoding_is_decoded() {
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("<p>こんにちは</p>");
        let dom = html_to_dom(&bytes, "shift_jis").unwrap();
        let p = get_child_node_by_name(&body(&dom), "p").unwrap();

        let text = match &p.children.borrow()[0].data {
            NodeData::Text { contents } => contents.borrow().to_string(),
            _ => String::new(),
        };
        assert_eq!(text, "こんにちは");
    }
}
