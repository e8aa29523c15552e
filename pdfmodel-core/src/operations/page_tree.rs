//! Page tree maintenance (ISO 32000-1 Section 7.7.3)

use crate::error::{PdfError, Result};
use crate::graph::Graph;
use crate::objects::{Object, ObjectId};
use std::collections::HashSet;
use tracing::debug;

/// Removes the page at `index` from its parent's `/Kids` and from the graph,
/// decrementing `/Count` on every ancestor. Nothing changes when `index`
/// is out of range.
pub fn remove_page(graph: &mut Graph, index: usize) -> Result<ObjectId> {
    let pages = graph.page_ids()?;
    let count = pages.len();
    let page_id = *pages
        .get(index)
        .ok_or(PdfError::PageOutOfRange { index, count })?;

    let parent = match graph.dict(page_id)?.get_reference("Parent") {
        Some(parent) => parent,
        None => find_parent(graph, page_id)?,
    };
    let kids = kids_mut(graph, parent)?;
    let position = kids
        .iter()
        .position(|kid| kid.as_reference() == Some(page_id))
        .ok_or_else(|| {
            PdfError::InvalidStructure(format!("page {page_id} is not listed in the kids of {parent}"))
        })?;
    kids.remove(position);
    adjust_counts(graph, parent, -1)?;
    graph.remove(page_id);
    debug!("Removed page {} ({}) from node {}", index, page_id, parent);
    Ok(page_id)
}

/// The page tree node whose `/Kids` lists `child`.
fn find_parent(graph: &Graph, child: ObjectId) -> Result<ObjectId> {
    graph
        .iter()
        .find(|(_, object)| {
            object
                .as_dict()
                .and_then(|dict| dict.get("Kids"))
                .and_then(|kids| graph.resolve(kids).ok())
                .and_then(Object::as_array)
                .is_some_and(|kids| kids.iter().any(|kid| kid.as_reference() == Some(child)))
        })
        .map(|(id, _)| *id)
        .ok_or_else(|| PdfError::InvalidStructure(format!("no page tree node lists {child}")))
}

/// The `/Kids` array of a page tree node, following an indirect array.
pub(crate) fn kids_mut(graph: &mut Graph, node: ObjectId) -> Result<&mut Vec<Object>> {
    let indirect = match graph.dict(node)?.get("Kids") {
        Some(Object::Reference(id)) => Some(*id),
        Some(_) => None,
        None => {
            return Err(PdfError::InvalidStructure(format!(
                "page tree node {node} has no /Kids"
            )))
        }
    };
    let kids = match indirect {
        Some(id) => graph.get_mut(id)?,
        None => graph
            .dict_mut(node)?
            .get_mut("Kids")
            .ok_or_else(|| PdfError::InvalidStructure(format!("node {node} lost its /Kids")))?,
    };
    let found = kids.object_type().as_str();
    kids.as_array_mut().ok_or(PdfError::TypeMismatch {
        expected: "Array",
        found,
    })
}

/// Adds `delta` to `/Count` on `node` and each of its ancestors.
pub(crate) fn adjust_counts(graph: &mut Graph, node: ObjectId, delta: i64) -> Result<()> {
    let mut current = Some(node);
    let mut visited = HashSet::new();
    while let Some(id) = current {
        if !visited.insert(id) {
            break;
        }
        let dict = graph.dict_mut(id)?;
        let count = dict.get_integer("Count").unwrap_or(0);
        dict.set("Count", (count + delta).max(0));
        current = dict.get_reference("Parent");
    }
    Ok(())
}
