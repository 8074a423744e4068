//! HTML 解析与序列化
//!
//! 基于 html5ever 的 `RcDom`，供离线页面翻译和 [`RcDomTree`](crate::page::RcDomTree) 使用。

pub mod dom;
pub mod serializer;

pub use dom::{
    get_charset, get_child_node_by_name, get_node_attr, get_node_name, get_parent_node,
    html_to_dom, set_node_attr,
};
pub use serializer::serialize_document;
