//! An LSP language server for the proof assistant.
//!
//! The server is a thin frontend over the build orchestrator: it owns the
//! workspace behind one async lock, so build passes and queries on the same
//! workspace are serialized, and a `didChangeWatchedFiles` event is fully
//! applied before any later query observes it.

use crate::diagnostics::DiagnosticExt;
use crate::span::{byte_index_of, to_range, word_at};
use build::{DefaultAdvisor, ImportScanner, LoadOutcome, Orchestrator};
use normalize::Form;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};
use tower_lsp::{
    jsonrpc,
    lsp_types::{
        notification::Notification, CodeLens, CodeLensOptions, CodeLensParams, Command,
        CompletionOptions, CompletionParams, CompletionResponse, DidChangeWatchedFilesParams,
        FileChangeType, GotoDefinitionParams, GotoDefinitionResponse, Hover, HoverContents,
        HoverParams, HoverProviderCapability, InitializeParams, InitializeResult,
        InitializedParams, Location, MarkedString, MessageType, OneOf, Position,
        PrepareRenameResponse, Range, ReferenceParams, RenameOptions, RenameParams,
        ServerCapabilities, ServerInfo, TextDocumentPositionParams, TextEdit, Url, WorkspaceEdit,
    },
    Client, LanguageServer, LspService,
};
use utility::HashMap;

mod diagnostics;
mod span;

const NAME: &str = "Aya Language Server";

pub async fn serve() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Server::new)
        .custom_method("aya/computeTerm", Server::compute_term)
        .finish();
    tower_lsp::Server::new(stdin, stdout, socket)
        .serve(service)
        .await;
}

pub struct Server {
    client: Client,
    map: Arc<RwLock<::span::SourceMap>>,
    workspace: tokio::sync::Mutex<Orchestrator>,
}

impl Server {
    fn new(client: Client) -> Self {
        Self {
            client,
            map: Arc::default(),
            workspace: tokio::sync::Mutex::new(Orchestrator::new(
                Box::new(ImportScanner),
                Box::new(DefaultAdvisor),
            )),
        }
    }

    /// Run the pipeline over every library and publish the outcome.
    async fn reload_and_publish(&self, workspace: &mut Orchestrator) {
        let outcomes = workspace.reload();
        for outcome in outcomes {
            self.publish(outcome).await;
        }
    }

    async fn publish(&self, outcome: LoadOutcome) {
        for batch in outcome.published {
            let Ok(uri) = Url::from_file_path(&batch.path) else {
                continue;
            };

            let mut problems = Vec::new();
            let mut lsp_diagnostics = Vec::new();
            for diagnostic in batch.diagnostics {
                let outcome = {
                    let map = self.map.read().unwrap();
                    diagnostic.into_lsp_type(&map)
                };
                match outcome {
                    OneOf::Left(diagnostic) => {
                        problems.push(AyaProblem {
                            range: diagnostic.range,
                            severity: diagnostic.severity.map_or(1, severity_code),
                            message: diagnostic.message.clone(),
                        });
                        lsp_diagnostics.push(diagnostic);
                    }
                    OneOf::Right((type_, message)) => {
                        self.client.show_message(type_, message).await;
                    }
                }
            }

            self.client
                .publish_diagnostics(uri.clone(), lsp_diagnostics, None)
                .await;
            self.client
                .send_notification::<PublishAyaProblems>(AyaProblemsParams {
                    uri,
                    problems,
                })
                .await;
        }
    }

    async fn compute_term(
        &self,
        params: ComputeTermParams,
    ) -> jsonrpc::Result<ComputeTermResult> {
        let Some(path) = to_path(&params.uri) else {
            return Ok(ComputeTermResult::bad(params));
        };

        let workspace = self.workspace.lock().await;
        if workspace.find_source(&path).is_none() {
            return Ok(ComputeTermResult::bad(params));
        }

        let offset = {
            let map = self.map.read().unwrap();
            byte_index_of(&map, &path, params.position)
        };
        let Some(offset) = offset else {
            return Ok(ComputeTermResult::bad(params));
        };

        let Some(term) = workspace.pipeline().term_at(&path, offset.0) else {
            return Ok(ComputeTermResult::bad(params));
        };

        let form = match params.kind {
            ComputeTermKind::Nf => Form::Normal,
            ComputeTermKind::Whnf => Form::WeakHeadNormal,
        };
        let computed = normalize::normalize_with(form, &term);

        Ok(ComputeTermResult {
            uri: params.uri,
            position: params.position,
            kind: params.kind,
            code: Some(computed.to_string()),
        })
    }

    /// The file content behind a URI: from the source map if registered,
    /// from disk otherwise.
    fn content_of(&self, path: &Path) -> Option<String> {
        let map = self.map.read().unwrap();
        if let Some(file) = map.file_by_path(path) {
            return Some(map[file].content().to_owned());
        }
        drop(map);
        std::fs::read_to_string(path).ok()
    }

    fn location(&self, path: &Path, span: ::span::Span) -> Option<Location> {
        let uri = Url::from_file_path(path).ok()?;
        let map = self.map.read().unwrap();
        let range = to_range(&map, span).unwrap_or_else(|| {
            Range::new(Position::new(0, 0), Position::new(0, 0))
        });
        Some(Location::new(uri, range))
    }
}

fn to_path(uri: &Url) -> Option<PathBuf> {
    uri.to_file_path().ok()
}

fn severity_code(severity: tower_lsp::lsp_types::DiagnosticSeverity) -> i32 {
    use tower_lsp::lsp_types::DiagnosticSeverity as S;

    if severity == S::WARNING {
        2
    } else if severity == S::INFORMATION {
        3
    } else if severity == S::HINT {
        4
    } else {
        1
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Server {
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        let mut workspace = self.workspace.lock().await;

        let mut roots = Vec::new();
        if let Some(folders) = &params.workspace_folders {
            roots.extend(folders.iter().filter_map(|folder| to_path(&folder.uri)));
        }
        #[allow(deprecated)]
        if let Some(root) = params.root_uri.as_ref().and_then(to_path) {
            roots.push(root);
        }

        for root in roots {
            if let Err(error) = workspace.register_library(&root) {
                // a broken library never takes the workspace down
                self.client
                    .log_message(
                        MessageType::ERROR,
                        format!("cannot load the library at {}: {error}", root.display()),
                    )
                    .await;
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions::default()),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: Default::default(),
                })),
                code_lens_provider: Some(CodeLensOptions {
                    resolve_provider: Some(true),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: NAME.into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let mut workspace = self.workspace.lock().await;
        self.reload_and_publish(&mut workspace).await;
        self.client
            .log_message(MessageType::INFO, "language server initialized")
            .await;
    }

    async fn shutdown(&self) -> jsonrpc::Result<()> {
        // workspace teardown drops the primitive factories
        build::prim::clear();
        Ok(())
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let mut workspace = self.workspace.lock().await;

        for change in params.changes {
            let Some(path) = to_path(&change.uri) else {
                continue;
            };

            if change.typ == FileChangeType::CREATED {
                workspace.file_created(path);
            } else if change.typ == FileChangeType::DELETED {
                workspace.file_deleted(&path);
            } else if change.typ == FileChangeType::CHANGED {
                workspace.file_modified(&path);
            }
        }

        // the graph mutation is complete; recompile and republish
        self.reload_and_publish(&mut workspace).await;
    }

    async fn completion(
        &self,
        _: CompletionParams,
    ) -> jsonrpc::Result<Option<CompletionResponse>> {
        Ok(Some(CompletionResponse::Array(Vec::new())))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> jsonrpc::Result<Option<GotoDefinitionResponse>> {
        let position_params = params.text_document_position_params;
        let Some(path) = to_path(&position_params.text_document.uri) else {
            return Ok(None);
        };

        let workspace = self.workspace.lock().await;
        if workspace.find_source(&path).is_none() {
            return Ok(None);
        }

        let offset = {
            let map = self.map.read().unwrap();
            byte_index_of(&map, &path, position_params.position)
        };
        let Some(offset) = offset else {
            return Ok(None);
        };

        Ok(workspace
            .pipeline()
            .definition(&path, offset.0)
            .and_then(|(target, span)| self.location(&target, span))
            .map(GotoDefinitionResponse::Scalar))
    }

    async fn hover(&self, params: HoverParams) -> jsonrpc::Result<Option<Hover>> {
        let position_params = params.text_document_position_params;
        let Some(path) = to_path(&position_params.text_document.uri) else {
            return Ok(None);
        };

        let workspace = self.workspace.lock().await;
        if workspace.find_source(&path).is_none() {
            return Ok(None);
        }

        let offset = {
            let map = self.map.read().unwrap();
            byte_index_of(&map, &path, position_params.position)
        };
        let Some(offset) = offset else {
            return Ok(None);
        };

        Ok(workspace.pipeline().hover(&path, offset.0).map(|content| {
            Hover {
                contents: HoverContents::Scalar(MarkedString::String(content)),
                range: None,
            }
        }))
    }

    async fn references(&self, params: ReferenceParams) -> jsonrpc::Result<Option<Vec<Location>>> {
        let position_params = params.text_document_position;
        let Some(path) = to_path(&position_params.text_document.uri) else {
            return Ok(None);
        };

        let workspace = self.workspace.lock().await;
        if workspace.find_source(&path).is_none() {
            return Ok(None);
        }

        let offset = {
            let map = self.map.read().unwrap();
            byte_index_of(&map, &path, position_params.position)
        };
        let Some(offset) = offset else {
            return Ok(None);
        };

        Ok(Some(
            workspace
                .pipeline()
                .references(&path, offset.0)
                .into_iter()
                .filter_map(|(target, span)| self.location(&target, span))
                .collect(),
        ))
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> jsonrpc::Result<Option<PrepareRenameResponse>> {
        let Some(path) = to_path(&params.text_document.uri) else {
            return Ok(None);
        };

        let workspace = self.workspace.lock().await;
        if workspace.find_source(&path).is_none() {
            return Ok(None);
        }
        drop(workspace);

        let Some(content) = self.content_of(&path) else {
            return Ok(None);
        };

        Ok(word_at(&content, params.position).map(|(range, placeholder)| {
            PrepareRenameResponse::RangeWithPlaceholder { range, placeholder }
        }))
    }

    async fn rename(&self, params: RenameParams) -> jsonrpc::Result<Option<WorkspaceEdit>> {
        let position_params = params.text_document_position;
        let Some(path) = to_path(&position_params.text_document.uri) else {
            return Ok(None);
        };

        let workspace = self.workspace.lock().await;
        if workspace.find_source(&path).is_none() {
            return Ok(None);
        }

        let offset = {
            let map = self.map.read().unwrap();
            byte_index_of(&map, &path, position_params.position)
        };
        let Some(offset) = offset else {
            return Ok(None);
        };

        let mut occurrences = workspace.pipeline().references(&path, offset.0);
        occurrences.extend(workspace.pipeline().definition(&path, offset.0));

        let mut changes: HashMap<Url, Vec<TextEdit>> = HashMap::default();
        let map = self.map.read().unwrap();
        for (target, span) in occurrences {
            let Ok(uri) = Url::from_file_path(&target) else {
                continue;
            };
            let Some(range) = to_range(&map, span) else {
                continue;
            };
            changes
                .entry(uri)
                .or_default()
                .push(TextEdit::new(range, params.new_name.clone()));
        }

        if changes.is_empty() {
            return Ok(None);
        }

        Ok(Some(WorkspaceEdit::new(changes.into_iter().collect())))
    }

    async fn code_lens(&self, params: CodeLensParams) -> jsonrpc::Result<Option<Vec<CodeLens>>> {
        let Some(path) = to_path(&params.text_document.uri) else {
            return Ok(None);
        };

        let workspace = self.workspace.lock().await;
        if workspace.find_source(&path).is_none() {
            return Ok(Some(Vec::new()));
        }

        let map = self.map.read().unwrap();
        let lenses = workspace
            .pipeline()
            .lenses(&path)
            .into_iter()
            .map(|(span, title)| CodeLens {
                range: to_range(&map, span).unwrap_or_else(|| {
                    Range::new(Position::new(0, 0), Position::new(0, 0))
                }),
                command: Some(Command {
                    title,
                    command: String::new(),
                    arguments: None,
                }),
                data: None,
            })
            .collect();

        Ok(Some(lenses))
    }

    async fn code_lens_resolve(&self, lens: CodeLens) -> jsonrpc::Result<CodeLens> {
        Ok(lens)
    }
}

/// The custom notification carrying structured problems per file.
pub enum PublishAyaProblems {}

impl Notification for PublishAyaProblems {
    type Params = AyaProblemsParams;
    const METHOD: &'static str = "aya/publishAyaProblems";
}

#[derive(Serialize, Deserialize)]
pub struct AyaProblemsParams {
    pub uri: Url,
    pub problems: Vec<AyaProblem>,
}

#[derive(Serialize, Deserialize)]
pub struct AyaProblem {
    pub range: Range,
    pub severity: i32,
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ComputeTermKind {
    Nf,
    Whnf,
}

#[derive(Serialize, Deserialize)]
pub struct ComputeTermParams {
    pub uri: Url,
    pub position: Position,
    pub kind: ComputeTermKind,
}

#[derive(Serialize, Deserialize)]
pub struct ComputeTermResult {
    pub uri: Url,
    pub position: Position,
    pub kind: ComputeTermKind,
    /// The rendered term; absent on bad input.
    pub code: Option<String>,
}

impl ComputeTermResult {
    fn bad(params: ComputeTermParams) -> Self {
        Self {
            uri: params.uri,
            position: params.position,
            kind: params.kind,
            code: None,
        }
    }
}
