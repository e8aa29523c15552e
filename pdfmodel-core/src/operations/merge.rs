//! Appending the pages of one graph to another
//!
//! Every object reachable from the incoming pages (and from their form
//! fields) is copied under a fresh object number. References are rewritten
//! through a mapping table so the two numbering spaces never collide.

use super::page_tree::{adjust_counts, kids_mut};
use crate::error::{PdfError, Result};
use crate::graph::{Graph, INHERITABLE_PAGE_KEYS};
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Appends every page of `source` to the end of `target`, returning how
/// many pages were added.
pub fn append_document(target: &mut Graph, source: Graph) -> Result<usize> {
    GraphMerger::new(target).append(source)
}

/// Copies graphs into a target one at a time.
pub struct GraphMerger<'a> {
    target: &'a mut Graph,
    /// Source object id -> target object id, per appended graph
    object_mappings: HashMap<ObjectId, ObjectId>,
}

impl<'a> GraphMerger<'a> {
    pub fn new(target: &'a mut Graph) -> Self {
        Self {
            target,
            object_mappings: HashMap::new(),
        }
    }

    pub fn append(&mut self, mut source: Graph) -> Result<usize> {
        self.object_mappings.clear();
        let target_root = self.target.pages_root_id()?;
        // Nothing is copied until the target is known to accept the pages
        kids_mut(self.target, target_root)?;
        let pages = source.page_ids()?;
        if pages.is_empty() {
            debug!("Source graph has no pages, nothing to append");
            return Ok(0);
        }

        for &page in &pages {
            flatten_inherited(&mut source, page)?;
        }
        let fields = source_fields(&source);
        if !fields.is_empty() {
            check_form_target(self.target)?;
        }

        let mut roots = pages.clone();
        roots.extend(fields.iter().copied());
        let mut reachable = source.reachable_from(&roots);
        if let Some(encrypt) = source.trailer().get_reference("Encrypt") {
            reachable.remove(&encrypt);
        }

        for &id in &reachable {
            if source.contains(id) {
                let fresh = self.target.new_object_id()?;
                self.object_mappings.insert(id, fresh);
            }
        }
        for (&old, &new) in &self.object_mappings {
            if let Some(mut object) = source.remove(old) {
                renumber(&mut object, &self.object_mappings);
                self.target.insert(new, object);
            }
        }

        let mut added = Vec::with_capacity(pages.len());
        for page in &pages {
            let id = self.map_object_id(*page)?;
            self.target.dict_mut(id)?.set("Parent", target_root);
            added.push(Object::Reference(id));
        }
        let count = added.len();
        kids_mut(self.target, target_root)?.extend(added);
        adjust_counts(self.target, target_root, count as i64)?;

        let fields: Vec<Object> = fields
            .into_iter()
            .filter_map(|id| self.object_mappings.get(&id).copied())
            .map(Object::Reference)
            .collect();
        append_form_fields(self.target, fields)?;

        if source.version() > self.target.version() {
            self.target.set_version(source.version());
        }
        debug!(
            "Appended {} pages ({} objects copied)",
            count,
            self.object_mappings.len()
        );
        Ok(count)
    }

    fn map_object_id(&self, id: ObjectId) -> Result<ObjectId> {
        self.object_mappings
            .get(&id)
            .copied()
            .ok_or(PdfError::ObjectNotFound(id))
    }
}

/// Copies inherited page attributes onto the page and detaches it from its tree.
fn flatten_inherited(source: &mut Graph, page: ObjectId) -> Result<()> {
    let inherited: Vec<(&str, Object)> = INHERITABLE_PAGE_KEYS
        .iter()
        .filter(|key| !source.dict(page).is_ok_and(|dict| dict.contains_key(key)))
        .filter_map(|&key| source.inherited(page, key).map(|value| (key, value.clone())))
        .collect();
    let dict = source.dict_mut(page)?;
    for (key, value) in inherited {
        dict.set(key, value);
    }
    dict.remove("Parent");
    Ok(())
}

/// Top-level `/AcroForm /Fields` entries of `source`.
fn source_fields(source: &Graph) -> Vec<ObjectId> {
    let Ok(catalog) = source.catalog() else {
        return Vec::new();
    };
    catalog
        .get("AcroForm")
        .and_then(|form| source.resolve_dict(form))
        .and_then(|form| form.get("Fields"))
        .and_then(|fields| source.resolve(fields).ok())
        .and_then(Object::as_array)
        .map(|fields| fields.iter().filter_map(Object::as_reference).collect())
        .unwrap_or_default()
}

/// Rewrites every reference in `object`. References that were not copied
/// become `null` rather than pointing at an unrelated target object.
fn renumber(object: &mut Object, mapping: &HashMap<ObjectId, ObjectId>) {
    match object {
        Object::Reference(id) => {
            let mapped = mapping.get(id).copied();
            if mapped.is_none() {
                warn!("Dropping reference to {} which was not copied", id);
            }
            *object = mapped.map_or(Object::Null, Object::Reference);
        }
        Object::Array(items) => items.iter_mut().for_each(|item| renumber(item, mapping)),
        Object::Dictionary(dict) => dict.values_mut().for_each(|v| renumber(v, mapping)),
        Object::Stream(stream) => stream
            .dictionary_mut()
            .values_mut()
            .for_each(|v| renumber(v, mapping)),
        _ => {}
    }
}

/// Fails when `append_form_fields` could not add to the target's form.
fn check_form_target(target: &Graph) -> Result<()> {
    let form = match target.catalog()?.get("AcroForm") {
        Some(Object::Reference(id)) => target.dict(*id)?,
        Some(Object::Dictionary(form)) => form,
        _ => return Ok(()),
    };
    if let Some(Object::Reference(list)) = form.get("Fields") {
        let object = target.get(*list)?;
        if object.as_array().is_none() {
            return Err(PdfError::TypeMismatch {
                expected: "Array",
                found: object.object_type().as_str(),
            });
        }
    }
    Ok(())
}

/// Adds `fields` to the target's interactive form, creating it when absent.
fn append_form_fields(target: &mut Graph, fields: Vec<Object>) -> Result<()> {
    if fields.is_empty() {
        return Ok(());
    }
    let catalog_id = target.catalog_id()?;
    let form_id = match target.catalog()?.get("AcroForm") {
        Some(Object::Reference(id)) => *id,
        Some(Object::Dictionary(_)) => {
            let form = target
                .dict_mut(catalog_id)?
                .remove("AcroForm")
                .unwrap_or_else(|| Dictionary::new().into());
            let id = target.add_object(form)?;
            target.dict_mut(catalog_id)?.set("AcroForm", id);
            id
        }
        _ => {
            let mut form = Dictionary::new();
            form.set("Fields", Vec::<Object>::new());
            let id = target.add_object(form)?;
            target.dict_mut(catalog_id)?.set("AcroForm", id);
            id
        }
    };

    let form = target.dict_mut(form_id)?;
    match form.get("Fields") {
        Some(Object::Reference(list)) => {
            let list = *list;
            let object = target.get_mut(list)?;
            let found = object.object_type().as_str();
            object
                .as_array_mut()
                .ok_or(PdfError::TypeMismatch {
                    expected: "Array",
                    found,
                })?
                .extend(fields);
        }
        existing => {
            let mut all = existing
                .and_then(Object::as_array)
                .cloned()
                .unwrap_or_default();
            all.extend(fields);
            form.set("Fields", all);
        }
    }
    Ok(())
}
