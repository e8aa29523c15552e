use super::{type_mismatch, Obj};
use crate::error::{PdfError, Result};
use crate::objects::Object;
use indexmap::IndexMap;
use std::future::Future;
use std::path::Path;

/// Key/value projection of a Dictionary or Stream [`Obj`].
#[derive(Debug, Clone)]
pub struct Dictionary<'d> {
    obj: Obj<'d>,
}

impl<'d> Dictionary<'d> {
    pub(crate) fn new(obj: Obj<'d>) -> Self {
        Self { obj }
    }

    pub fn as_obj(&self) -> &Obj<'d> {
        &self.obj
    }

    pub fn into_obj(self) -> Obj<'d> {
        self.obj
    }

    /// The value under `key`, with references followed to their target.
    pub fn get_key(&self, key: &str) -> Result<Obj<'d>> {
        if !self.has_key(key)? {
            return Err(PdfError::KeyNotFound(key.to_string()));
        }
        Obj::new(self.obj.document(), self.obj.path().key(key)).resolve()
    }

    pub fn get_keys(&self) -> Result<Vec<String>> {
        self.obj.with_dict(|dict| Ok(dict.keys().cloned().collect()))
    }

    pub fn has_key(&self, key: &str) -> Result<bool> {
        self.obj.with_dict(|dict| Ok(dict.contains_key(key)))
    }

    /// Inserts or replaces `key`.
    pub fn add_key(&self, key: impl Into<String>, value: impl Into<Object>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        self.obj.with_dict_mut(|dict| {
            dict.set(key, value);
            Ok(())
        })
    }

    /// Returns whether the key was present.
    pub fn remove_key(&self, key: &str) -> Result<bool> {
        self.obj.with_dict_mut(|dict| Ok(dict.remove(key).is_some()))
    }

    pub fn get_key_as_bool(&self, key: &str) -> Result<bool> {
        self.get_key(key)?.as_bool()
    }

    pub fn get_key_as_integer(&self, key: &str) -> Result<i64> {
        self.get_key(key)?.as_number()
    }

    /// Accepts Integer as well as Real values.
    pub fn get_key_as_real(&self, key: &str) -> Result<f64> {
        self.get_key(key)?.with(|object| {
            object
                .as_f64()
                .ok_or_else(|| type_mismatch("Real", object))
        })
    }

    pub fn get_key_as_name(&self, key: &str) -> Result<String> {
        self.get_key(key)?.as_name()
    }

    /// Entries in file order; values are not dereferenced.
    pub fn to_map(&self) -> Result<IndexMap<String, Obj<'d>>> {
        let keys = self.get_keys()?;
        Ok(keys
            .into_iter()
            .map(|key| {
                let value = Obj::new(self.obj.document(), self.obj.path().key(key.as_str()));
                (key, value)
            })
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        self.obj.with_dict(|dict| Ok(dict.len()))
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|len| len == 0)
    }

    pub fn clear(&self) -> Result<()> {
        self.obj.with_dict_mut(|dict| {
            dict.clear();
            Ok(())
        })
    }

    pub fn same_node(&self, other: &Dictionary<'_>) -> bool {
        self.obj.same_node(&other.obj)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> impl Future<Output = Result<()>> + Send + 'static {
        self.obj.write(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::graph::NodePath;
    use crate::objects::{self, ObjectId};
    use crate::test_support::{load, sample_graph};

    fn document() -> Document {
        let mut graph = sample_graph(1);
        let mut info = objects::Dictionary::new();
        info.set("Title", Object::string("Report"));
        info.set("Trapped", Object::name("False"));
        info.set("Pages", 12);
        info.set("Scale", 1.25);
        info.set("Width", 600);
        info.set("Marked", true);
        info.set("Catalog", ObjectId::new(1, 0));
        graph.insert(ObjectId::new(70, 0), info.into());
        load(graph)
    }

    fn info(doc: &Document) -> Dictionary<'_> {
        Obj::new(doc, NodePath::indirect(ObjectId::new(70, 0)))
            .as_dictionary()
            .unwrap()
    }

    #[test]
    fn test_typed_getters() {
        let doc = document();
        let dict = info(&doc);
        assert!(dict.get_key_as_bool("Marked").unwrap());
        assert_eq!(dict.get_key_as_integer("Pages").unwrap(), 12);
        assert_eq!(dict.get_key_as_real("Scale").unwrap(), 1.25);
        assert_eq!(dict.get_key_as_real("Width").unwrap(), 600.0);
        assert_eq!(dict.get_key_as_name("Trapped").unwrap(), "False");
        assert_eq!(dict.get_key("Title").unwrap().as_string().unwrap(), "Report");
        assert!(dict.get_key_as_name("Title").is_err());
    }

    #[test]
    fn test_get_key_follows_references() {
        let doc = document();
        let catalog = info(&doc).get_key("Catalog").unwrap();
        assert_eq!(catalog.reference().map(|r| r.object_number()), Some(1));
        assert!(catalog.as_dictionary().unwrap().has_key("Pages").unwrap());
    }

    #[test]
    fn test_missing_key() {
        let doc = document();
        assert!(matches!(
            info(&doc).get_key("Author"),
            Err(PdfError::KeyNotFound(key)) if key == "Author"
        ));
    }

    #[test]
    fn test_add_and_remove() {
        let doc = document();
        let dict = info(&doc);
        dict.add_key("Author", Object::string("Ops")).unwrap();
        assert!(info(&doc).has_key("Author").unwrap());
        assert!(dict.remove_key("Author").unwrap());
        assert!(!dict.remove_key("Author").unwrap());
        assert_eq!(dict.len().unwrap(), 7);
    }

    #[test]
    fn test_to_map_keeps_order() {
        let doc = document();
        let map = info(&doc).to_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["Title", "Trapped", "Pages", "Scale", "Width", "Marked", "Catalog"]
        );
        assert_eq!(map["Catalog"].kind().unwrap(), objects::ObjectType::Reference);
    }

    #[test]
    fn test_clear_and_identity() {
        let doc = document();
        let dict = info(&doc);
        assert!(dict.same_node(&info(&doc)));
        dict.clear().unwrap();
        assert!(info(&doc).is_empty().unwrap());
    }
}
