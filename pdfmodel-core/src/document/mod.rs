//! The document handle and its load lifecycle
//!
//! A [`Document`] owns one object graph. It starts `Unloaded`; [`Document::load`]
//! moves it to `Loading` and hands back a future that resolves exactly once,
//! either to `Ok(())` with the document `Ready` or to the typed error that put
//! it in `Failed`. Every graph accessor checks the state first and fails with
//! [`PdfError::NotLoaded`] outside `Ready`.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdfmodel::{Document, LoadOptions};
//!
//! # async fn run() -> pdfmodel::Result<()> {
//! let mut doc = Document::default();
//! doc.load("input.pdf", LoadOptions::new())?.await?;
//! println!("{} pages", doc.get_page_count()?);
//! doc.delete_page(0)?;
//! doc.write_to("output.pdf").await?;
//! # Ok(())
//! # }
//! ```

mod state;
mod version;

pub use state::{LoadOptions, LoadState, WriteMode, WriteOutcome};
pub use version::PdfVersion;

use crate::encryption::{Encrypt, Permission};
use crate::engine::{NativeEngine, PdfEngine};
use crate::error::{PdfError, Result};
use crate::forms::Form;
use crate::graph::{Graph, NodePath};
use crate::objects::Object;
use crate::operations;
use crate::page::Page;
use crate::view::{Dictionary, Obj};
use std::cell::{self, RefCell};
use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One PDF file's object graph plus its lifecycle state.
pub struct Document {
    engine: Arc<dyn PdfEngine>,
    state: LoadState,
    graph: RefCell<Graph>,
    page_count: usize,
    source: Option<PathBuf>,
    options: LoadOptions,
    password: Option<String>,
    encrypt: Option<Encrypt>,
    load_error: Option<String>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("engine", &self.engine.name())
            .field("state", &self.state)
            .field("page_count", &self.page_count)
            .field("source", &self.source)
            .field("encrypt", &self.encrypt)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Arc::new(NativeEngine))
    }
}

impl Document {
    /// Creates an unloaded document that will parse and serialize through `engine`.
    pub fn new(engine: Arc<dyn PdfEngine>) -> Self {
        Self {
            engine,
            state: LoadState::Unloaded,
            graph: RefCell::new(Graph::default()),
            page_count: 0,
            source: None,
            options: LoadOptions::default(),
            password: None,
            encrypt: None,
            load_error: None,
        }
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Ready
    }

    /// Message of the error that failed the load, if it failed.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Credential tried when [`LoadOptions::password`] is not given.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Starts loading `path`.
    ///
    /// Wrong state and a missing file fail here, at the call site. Everything
    /// else (read errors, corrupt bytes, [`PdfError::InvalidPassword`]) is
    /// delivered by the returned future, which fires once.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(
        &mut self,
        path: impl AsRef<Path>,
        options: LoadOptions,
    ) -> Result<impl Future<Output = Result<()>> + '_> {
        self.start_load(path.as_ref().to_path_buf(), options)
    }

    fn start_load(
        &mut self,
        path: PathBuf,
        options: LoadOptions,
    ) -> Result<impl Future<Output = Result<()>> + '_> {
        self.check_unloaded()?;
        if !path.is_file() {
            return Err(PdfError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a readable file", path.display()),
            )));
        }
        self.begin_load(options, Some(path.clone()));

        Ok(async move {
            match tokio::fs::read(&path).await {
                Ok(bytes) => self.finish_load(&bytes),
                Err(e) => {
                    let e = PdfError::from(e);
                    self.fail(&e);
                    Err(e)
                }
            }
        })
    }

    /// Loads from an in-memory buffer. Runs to completion before returning.
    pub fn load_bytes(&mut self, bytes: &[u8], options: LoadOptions) -> Result<()> {
        self.check_unloaded()?;
        self.begin_load(options, None);
        self.finish_load(bytes)
    }

    fn check_unloaded(&self) -> Result<()> {
        match self.state {
            LoadState::Unloaded => Ok(()),
            actual => Err(PdfError::InvalidState {
                expected: LoadState::Unloaded.as_str(),
                actual: actual.as_str(),
            }),
        }
    }

    fn begin_load(&mut self, options: LoadOptions, source: Option<PathBuf>) {
        self.state = LoadState::Loading;
        self.options = options;
        self.source = source;
    }

    fn finish_load(&mut self, bytes: &[u8]) -> Result<()> {
        let password = self
            .options
            .password
            .clone()
            .or_else(|| self.password.clone());
        let parsed = self
            .engine
            .parse(bytes, password.as_deref())
            .and_then(|graph| {
                let count = graph.page_ids()?.len();
                if count == 0 {
                    return Err(PdfError::InvalidStructure("document has no pages".into()));
                }
                Ok((graph, count))
            });

        match parsed {
            Ok((graph, count)) => {
                *self.graph.get_mut() = graph;
                self.page_count = count;
                self.state = LoadState::Ready;
                info!(
                    "Loaded {} pages (PDF {}) with the {} engine",
                    count,
                    self.graph.get_mut().version(),
                    self.engine.name()
                );
                Ok(())
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    fn fail(&mut self, error: &PdfError) {
        warn!("Load failed: {}", error);
        self.state = LoadState::Failed;
        self.load_error = Some(error.to_string());
    }

    fn ensure_loaded(&self) -> Result<()> {
        match self.state {
            LoadState::Ready => Ok(()),
            _ => Err(PdfError::NotLoaded),
        }
    }

    pub(crate) fn graph(&self) -> Result<cell::Ref<'_, Graph>> {
        self.ensure_loaded()?;
        self.graph.try_borrow().map_err(|_| PdfError::InvalidState {
            expected: "graph available",
            actual: "graph being modified",
        })
    }

    pub(crate) fn graph_mut(&self) -> Result<cell::RefMut<'_, Graph>> {
        self.ensure_loaded()?;
        self.graph.try_borrow_mut().map_err(|_| PdfError::InvalidState {
            expected: "graph available",
            actual: "graph being read",
        })
    }

    /// Page count cached at load and refreshed by merge and delete.
    pub fn get_page_count(&self) -> Result<usize> {
        self.ensure_loaded()?;
        Ok(self.page_count)
    }

    /// The page at zero-based `index`.
    pub fn get_page(&self, index: usize) -> Result<Page<'_>> {
        let pages = self.graph()?.page_ids()?;
        let id = pages.get(index).copied().ok_or(PdfError::PageOutOfRange {
            index,
            count: pages.len(),
        })?;
        Ok(Page::new(self, id, index))
    }

    pub fn pages(&self) -> Result<impl Iterator<Item = Page<'_>> + '_> {
        let pages = self.graph()?.page_ids()?;
        Ok(pages
            .into_iter()
            .enumerate()
            .map(move |(index, id)| Page::new(self, id, index)))
    }

    /// Every indirect object, in object-number order.
    pub fn get_objects(&self) -> Result<Vec<Obj<'_>>> {
        let ids = self.graph()?.ids();
        Ok(ids
            .into_iter()
            .map(|id| Obj::new(self, NodePath::indirect(id)))
            .collect())
    }

    pub fn get_trailer(&self) -> Result<Obj<'_>> {
        self.ensure_loaded()?;
        Ok(Obj::new(self, NodePath::trailer()))
    }

    pub fn get_catalog(&self) -> Result<Dictionary<'_>> {
        let id = self.graph()?.catalog_id()?;
        Obj::new(self, NodePath::indirect(id)).as_dictionary()
    }

    pub fn get_version(&self) -> Result<PdfVersion> {
        self.graph()?.version().parse()
    }

    pub fn is_linearized(&self) -> Result<bool> {
        Ok(self.graph()?.is_linearized())
    }

    /// The interactive form, when the catalog has an `/AcroForm`.
    pub fn get_form(&self) -> Result<Option<Form<'_>>> {
        let graph = self.graph()?;
        let catalog_id = graph.catalog_id()?;
        let path = match graph.catalog()?.get("AcroForm") {
            Some(Object::Reference(id)) if graph.dict(*id).is_ok() => NodePath::indirect(*id),
            Some(Object::Dictionary(_)) => NodePath::indirect(catalog_id).key("AcroForm"),
            Some(other) => {
                warn!("Ignoring /AcroForm of type {}", other.object_type());
                return Ok(None);
            }
            None => return Ok(None),
        };
        Ok(Some(Form::new(Obj::new(self, path))))
    }

    /// Appends every page of the PDF at `path`, returning how many were added.
    ///
    /// `password` is only consulted when that file is protected.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn merge_document(
        &mut self,
        path: impl AsRef<Path>,
        password: Option<&str>,
    ) -> Result<usize> {
        self.ensure_loaded()?;
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let source = self.engine.parse(&bytes, password)?;
        let added = operations::append_document(self.graph.get_mut(), source)?;
        self.refresh_page_count()?;
        debug!("Merged {} pages, now {}", added, self.page_count);
        Ok(added)
    }

    /// Removes the page at `index`; later pages move down by one.
    pub fn delete_page(&mut self, index: usize) -> Result<()> {
        self.ensure_loaded()?;
        operations::remove_page(self.graph.get_mut(), index)?;
        self.refresh_page_count()
    }

    fn refresh_page_count(&mut self) -> Result<()> {
        self.page_count = self.graph.get_mut().page_ids()?.len();
        Ok(())
    }

    /// Serializes the current graph, encrypting it when an [`Encrypt`] was assigned.
    pub fn write_to_buffer(&self) -> Result<Vec<u8>> {
        let graph = self.graph()?;
        let options = self
            .encrypt
            .as_ref()
            .map(Encrypt::require_options)
            .transpose()?;
        self.engine.serialize(&graph, options)
    }

    /// Writes to `destination`, or returns the bytes when there is none.
    ///
    /// Serialization finishes before the future is returned, so a failure
    /// never leaves a partial file and never changes the document.
    pub fn write(
        &self,
        destination: Option<&Path>,
    ) -> impl Future<Output = Result<WriteOutcome>> + Send + 'static {
        let rendered = self.write_to_buffer();
        let destination = destination.map(Path::to_path_buf);
        async move {
            let bytes = rendered?;
            match destination {
                Some(path) => {
                    write_atomically(&path, &bytes).await?;
                    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
                    Ok(WriteOutcome::File(path))
                }
                None => Ok(WriteOutcome::Buffer(bytes)),
            }
        }
    }

    pub fn write_to(
        &self,
        path: impl AsRef<Path>,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.write_file(path.as_ref().to_path_buf())
    }

    /// Replaces the source file. Needs a file load with `update_in_place`.
    pub fn save(&self) -> impl Future<Output = Result<()>> + Send + 'static {
        let target = self.ensure_loaded().and_then(|()| match (&self.source, self.write_mode()) {
            (Some(path), WriteMode::InPlace) => Ok(path.clone()),
            (None, _) => Err(PdfError::InvalidState {
                expected: "loaded from a file",
                actual: "loaded from a buffer",
            }),
            (Some(_), WriteMode::Clean) => Err(PdfError::InvalidState {
                expected: "InPlace",
                actual: "Clean",
            }),
        });
        let rendered = target.and_then(|path| Ok((path, self.write_to_buffer()?)));
        async move {
            let (path, bytes) = rendered?;
            write_atomically(&path, &bytes).await?;
            info!("Saved {} in place", path.display());
            Ok(())
        }
    }

    fn write_file(&self, path: PathBuf) -> impl Future<Output = Result<()>> + Send + 'static {
        let rendered = self.write_to_buffer();
        async move { write_atomically(&path, &rendered?).await }
    }

    pub fn write_mode(&self) -> WriteMode {
        if self.options.update_in_place && self.source.is_some() {
            WriteMode::InPlace
        } else {
            WriteMode::Clean
        }
    }

    /// The assigned [`Encrypt`] if any, otherwise one derived from the
    /// trailer's `/Encrypt` dictionary.
    pub fn encrypt(&self) -> Result<Option<Encrypt>> {
        if let Some(encrypt) = &self.encrypt {
            return Ok(Some(encrypt.clone()));
        }
        let graph = self.graph()?;
        let Some(entry) = graph.trailer().get("Encrypt") else {
            return Ok(None);
        };
        let dict = graph.resolve_dict(entry).ok_or_else(|| {
            PdfError::InvalidStructure("trailer /Encrypt is not a dictionary".into())
        })?;
        Encrypt::from_dictionary(dict).map(Some)
    }

    /// Encrypts the next write with `encrypt`. A derived instance has no
    /// passwords to encrypt with and is rejected.
    pub fn set_encrypt(&mut self, encrypt: Encrypt) -> Result<()> {
        let options = encrypt.require_options()?;
        debug!(
            "Next write encrypts with {} ({} bits)",
            options.algorithm,
            options.key_length.bits()
        );
        self.encrypt = Some(encrypt);
        Ok(())
    }

    /// Whether `permission` is granted. Unencrypted documents allow everything.
    pub fn is_allowed(&self, permission: Permission) -> Result<bool> {
        Ok(self
            .encrypt()?
            .map_or(true, |encrypt| encrypt.is_allowed(permission)))
    }

    /// Drops the indirect object behind `obj` from the graph. Later access
    /// to it fails with [`PdfError::ObjectReleased`].
    pub fn free_obj_mem(&self, obj: Obj<'_>) -> Result<()> {
        if !std::ptr::eq(obj.document(), self) {
            return Err(PdfError::InvalidArgument(
                "object belongs to another document".into(),
            ));
        }
        let id = obj
            .path()
            .root_id()
            .filter(|_| obj.path().is_indirect_root())
            .ok_or_else(|| {
                PdfError::InvalidArgument(format!("{} is not an indirect object", obj.path()))
            })?;
        self.graph_mut()?.release(id)?;
        debug!("Released object {}", id);
        Ok(())
    }
}

/// Writes `bytes` to a sibling temp file and renames it over `path`.
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let name = path.file_name().ok_or_else(|| {
        PdfError::InvalidArgument(format!("{} does not name a file", path.display()))
    })?;
    let temp = path.with_file_name(format!(
        ".{}.{}.tmp",
        name.to_string_lossy(),
        std::process::id()
    ));
    let result = match tokio::fs::write(&temp, bytes).await {
        Ok(()) => tokio::fs::rename(&temp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }
    Ok(())
}
