use super::field::Field;
use crate::error::Result;
use crate::graph::NodePath;
use crate::objects::Object;
use crate::view::Obj;
use std::collections::HashSet;
use tracing::warn;

/// The document's interactive form (`/AcroForm`)
#[derive(Debug, Clone)]
pub struct Form<'d> {
    obj: Obj<'d>,
}

impl<'d> Form<'d> {
    pub(crate) fn new(obj: Obj<'d>) -> Self {
        Self { obj }
    }

    pub fn get_object(&self) -> Obj<'d> {
        self.obj.clone()
    }

    /// Whether viewers must regenerate field appearances. Defaults to false.
    pub fn need_appearances(&self) -> Result<bool> {
        self.obj.with_dict(|dict| {
            Ok(dict
                .get("NeedAppearances")
                .and_then(Object::as_bool)
                .unwrap_or(false))
        })
    }

    pub fn set_need_appearances(&self, need: bool) -> Result<()> {
        self.obj.with_dict_mut(|dict| {
            dict.set("NeedAppearances", need);
            Ok(())
        })
    }

    /// Terminal fields of the field tree, depth first.
    pub fn fields(&self) -> Result<Vec<Field<'d>>> {
        let document = self.obj.document();
        let graph = document.graph()?;
        let form = graph.node(self.obj.path())?;
        let Some(roots) = form
            .as_dict()
            .and_then(|dict| dict.get("Fields"))
            .map(|fields| graph.resolve(fields))
            .transpose()?
            .and_then(Object::as_array)
        else {
            return Ok(Vec::new());
        };

        let mut stack: Vec<NodePath> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, item)| match item {
                Object::Reference(id) => NodePath::indirect(*id),
                _ => self.obj.path().key("Fields").index(i),
            })
            .collect();
        let mut visited = HashSet::new();
        let mut terminal = Vec::new();

        while let Some(path) = stack.pop() {
            if !visited.insert(path.clone()) {
                warn!("Field tree revisits {}", path);
                continue;
            }
            let Some(dict) = graph.node(&path)?.as_dict() else {
                continue;
            };
            // Kids carrying a partial name are fields; the others are widgets
            let child_fields: Vec<NodePath> = dict
                .get("Kids")
                .and_then(Object::as_array)
                .map(|kids| {
                    kids.iter()
                        .filter_map(Object::as_reference)
                        .filter(|id| graph.dict(*id).is_ok_and(|kid| kid.contains_key("T")))
                        .map(NodePath::indirect)
                        .collect()
                })
                .unwrap_or_default();
            if child_fields.is_empty() {
                terminal.push(path);
            } else {
                stack.extend(child_fields.into_iter().rev());
            }
        }
        drop(graph);

        Ok(terminal
            .into_iter()
            .map(|path| Field::new(Obj::new(document, path)))
            .collect())
    }
}
