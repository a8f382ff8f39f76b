//! Parse orchestration
//!
//! Acquires the document, runs it through loading, analysis and export,
//! and assembles the requested outputs. Staging directories and memory
//! buffers are released on every path before a result is returned.

use base64::Engine as _;
use futures::future::try_join_all;
use serde_json::{Map, Value};

use crate::analysis::{AnalysisInvoker, InferenceResult};
use crate::dataset::{
    resolve_mode, DocumentKind, DocumentLoader, LoadedDocument, ParseMethod, RawDocument,
    ResolvedMode, TypedDataset,
};
use crate::error::StorageError;
use crate::export::{ExportError, PipeResult, IMAGE_EXTENSION};
use crate::storage::{base_name_of, extension_of, Backend, Location, Storage};
use crate::writer::{MemoryWriters, StorageWriter, Writer};

use super::bundle::{OutputBundle, CONTENT_LIST, IMAGES, INFO, LAYOUT};
use super::request::{DocumentSource, OutputOptions, ParseRequest};
use super::ParseError;

/// Directory for extracted images, relative to the document's output path
pub const IMAGE_DIR: &str = "images";

/// Upper bound on images inlined into one response
pub const MAX_INLINE_IMAGES: usize = 5;

const MD_BUFFER: &str = "md";
const CONTENT_LIST_BUFFER: &str = "content_list";
const MIDDLE_BUFFER: &str = "middle_json";
const MODEL_BUFFER: &str = "model_json";

/// Durable destinations for one document
struct OutputTarget {
    name: String,
    output: StorageWriter,
    images: StorageWriter,
}

/// Runs parse requests end to end
#[derive(Clone)]
pub struct ParseService {
    storage: Storage,
    loader: DocumentLoader,
    invoker: AnalysisInvoker,
}

impl ParseService {
    pub fn new(storage: Storage, loader: DocumentLoader, invoker: AnalysisInvoker) -> Self {
        Self {
            storage,
            loader,
            invoker,
        }
    }

    pub async fn parse(&self, request: ParseRequest) -> Result<OutputBundle, ParseError> {
        let ParseRequest {
            source,
            method,
            options,
        } = request;

        let (file_name, location, upload) = match source {
            DocumentSource::Upload { file_name, bytes } => (file_name, None, Some(bytes)),
            DocumentSource::Path(raw) => {
                let location = Location::parse(&raw)?;
                let file_name = location.file_name().ok_or_else(|| {
                    ParseError::InputValidation(format!("file_path has no file name: {}", raw))
                })?;
                (file_name, Some(location), None)
            }
        };

        // Reject unsupported formats before touching any storage
        let extension = extension_of(&file_name).unwrap_or_default();
        DocumentKind::from_extension(&extension)?;

        let name = base_name_of(&file_name).to_string();
        if name.is_empty() {
            return Err(ParseError::InputValidation(format!(
                "Cannot derive an output name from {}",
                file_name
            )));
        }

        tracing::info!(file_name = %file_name, method = ?method, "Parsing document");

        let bytes = match (upload, &location) {
            (Some(bytes), _) => bytes,
            (None, Some(location)) => self.storage.read(location).await?,
            (None, None) => {
                return Err(ParseError::InputValidation(
                    "Must provide either file or file_path".to_string(),
                ))
            }
        };

        let target = self
            .output_target(&options.output_dir, location.as_ref(), name)
            .await?;

        let mut raw = RawDocument::new(bytes, extension);
        if let Some(location) = location {
            raw = raw.with_source(location);
        }
        let (mode, inference) = self.analyze(raw, method).await?;

        let pipe = PipeResult::build(&inference, mode, &target.images).await?;

        let mut buffers = MemoryWriters::new();
        let result = assemble(&pipe, &inference, &options, &target, &mut buffers).await;
        buffers.close_all();
        let bundle = result?;

        tracing::info!(
            file_name = %file_name,
            mode = %mode,
            pages = inference.page_count(),
            outputs = ?bundle.keys().collect::<Vec<_>>(),
            "Parse complete"
        );
        Ok(bundle)
    }

    /// Writers for `{output_dir}/{name}` and its image directory.
    ///
    /// An `s3://` output dir is used as is; otherwise remote inputs write
    /// into their own bucket and local inputs write to the filesystem.
    async fn output_target(
        &self,
        output_dir: &str,
        source: Option<&Location>,
        name: String,
    ) -> Result<OutputTarget, ParseError> {
        let output = Location::parse(output_dir)?;
        let (backend, prefix) = match (&output, source) {
            (Location::Remote { .. }, _) => (self.storage.backend_for(&output)?, output.path()),
            (Location::Local(_), Some(source)) if source.is_remote() => (
                self.storage.backend_for(source)?,
                output_dir.trim_matches('/').to_string(),
            ),
            _ => (Backend::Local, output_dir.to_string()),
        };

        let output_path = backend.join(&prefix, &name);
        let image_path = backend.join(&output_path, IMAGE_DIR);
        backend.ensure_dir(&image_path).await?;

        tracing::debug!(output = %output_path, remote = backend.is_remote(), "Prepared output writers");

        Ok(OutputTarget {
            name,
            output: StorageWriter::new(backend.clone(), output_path),
            images: StorageWriter::new(backend, image_path),
        })
    }

    /// Load, resolve the mode and analyze. The staging directory is gone
    /// when this returns, whatever the outcome.
    async fn analyze(
        &self,
        raw: RawDocument,
        method: ParseMethod,
    ) -> Result<(ResolvedMode, InferenceResult), ParseError> {
        let LoadedDocument { dataset, staged } = self.loader.load(raw).await?;

        let outcome = self.resolve_and_invoke(dataset, method).await;
        if let Some(staged) = staged {
            staged.close();
        }
        outcome
    }

    async fn resolve_and_invoke(
        &self,
        dataset: TypedDataset,
        method: ParseMethod,
    ) -> Result<(ResolvedMode, InferenceResult), ParseError> {
        let mode = resolve_mode(&dataset, method).await?;
        let inference = self.invoker.invoke(dataset, mode).await?;
        Ok((mode, inference))
    }
}

/// Export into memory buffers, persist when asked and build the bundle
async fn assemble(
    pipe: &PipeResult,
    inference: &InferenceResult,
    options: &OutputOptions,
    target: &OutputTarget,
    buffers: &mut MemoryWriters,
) -> Result<OutputBundle, ParseError> {
    pipe.export_markdown(buffers.get(MD_BUFFER), "", IMAGE_DIR)
        .await?;
    let md_content = buffers.get(MD_BUFFER).get_value()?;

    let content_list = if options.needs_content_list() {
        pipe.export_content_list(buffers.get(CONTENT_LIST_BUFFER), "", IMAGE_DIR)
            .await?;
        Some(buffers.get(CONTENT_LIST_BUFFER).get_value()?)
    } else {
        None
    };

    let middle_json = if options.needs_middle_json() {
        pipe.export_middle_json(buffers.get(MIDDLE_BUFFER), "").await?;
        Some(buffers.get(MIDDLE_BUFFER).get_value()?)
    } else {
        None
    };

    let model_json = if options.needs_model_json() {
        let body = serde_json::to_string_pretty(inference.model_json()).map_err(ExportError::from)?;
        buffers.get(MODEL_BUFFER).write_string("", &body).await?;
        Some(buffers.get(MODEL_BUFFER).get_value()?)
    } else {
        None
    };

    if options.is_json_md_dump {
        let name = &target.name;
        let persisted = [
            (format!("{}_content_list.json", name), &content_list),
            (format!("{}_middle.json", name), &middle_json),
            (format!("{}_model.json", name), &model_json),
        ];
        for (file, body) in persisted {
            if let Some(body) = body {
                target.output.write_string(&file, body).await?;
            }
        }
        target
            .output
            .write_string(&format!("{}.md", name), &md_content)
            .await?;
        tracing::info!(output = %target.output.prefix(), "Persisted parse outputs");
    }

    let mut bundle = OutputBundle::new(md_content);
    if options.return_layout {
        if let Some(body) = &model_json {
            bundle.insert(LAYOUT, parse_json(body)?);
        }
    }
    if options.return_info {
        if let Some(body) = &middle_json {
            bundle.insert(INFO, parse_json(body)?);
        }
    }
    if options.return_content_list {
        if let Some(body) = &content_list {
            bundle.insert(CONTENT_LIST, parse_json(body)?);
        }
    }
    if options.return_images {
        bundle.insert(IMAGES, Value::Object(inline_images(&target.images).await?));
    }

    Ok(bundle)
}

fn parse_json(body: &str) -> Result<Value, ParseError> {
    serde_json::from_str(body).map_err(|e| ParseError::Export(ExportError::from(e)))
}

/// The first few extracted images by name, as data URIs keyed by file name
async fn inline_images(images: &StorageWriter) -> Result<Map<String, Value>, ParseError> {
    let suffix = format!(".{}", IMAGE_EXTENSION);
    let mut names: Vec<String> = images
        .list()
        .await?
        .into_iter()
        .filter(|name| name.ends_with(&suffix))
        .collect();
    names.sort();
    names.truncate(MAX_INLINE_IMAGES);

    let encoded = try_join_all(names.iter().map(|name| async move {
        let bytes = images.read(name).await?;
        Ok::<_, StorageError>(format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }))
    .await?;

    Ok(names
        .into_iter()
        .zip(encoded)
        .map(|(name, uri)| (name, Value::String(uri)))
        .collect())
}
