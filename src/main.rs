use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{Duration, Local};
use clap::Parser;
use ropey::Rope;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};

use wikidex::completion::{get_completions, Context};
use wikidex::config::{Settings, VaultConfig};
use wikidex::daily::daily_note_path;
use wikidex::gotodef::{goto_definition, resolve_page};
use wikidex::logging;
use wikidex::position::PositionEncoding;
use wikidex::vault::{dispatch_file_event, NoteIndex};
use wikidex::wikilink;

const DAILY_NOTE_COMMAND: &str = "wikidex.dailyNote";
const RESOLVE_PAGE_COMMAND: &str = "wikidex.resolvePage";
const NOTE_WATCHER_ID: &str = "wikidex-note-watcher";

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// One of off, error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,
}

struct ServerState {
    settings: Settings,
    workspace_root: PathBuf,
    index: NoteIndex,
    /// Column unit agreed with the client.
    encoding: PositionEncoding,
    /// Text of open documents; anything else is read from disk.
    documents: HashMap<Url, Rope>,
}

impl ServerState {
    fn line_text(&self, uri: &Url, line: u32) -> Option<String> {
        let rope = match self.documents.get(uri) {
            Some(rope) => rope.clone(),
            None => Rope::from_str(&std::fs::read_to_string(uri.to_file_path().ok()?).ok()?),
        };

        let text = rope.get_line(line as usize)?.to_string();
        Some(text.trim_end_matches(['\n', '\r']).to_string())
    }

    fn note_extension(&self) -> String {
        VaultConfig::snapshot(&self.settings).note_extension
    }
}

struct Backend {
    client: Client,
    state: Mutex<Option<ServerState>>,
}

impl Backend {
    async fn register_note_watcher(&self, extension: &str) {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String(format!("**/*{extension}")),
                kind: Some(WatchKind::Create | WatchKind::Delete),
            }],
        };

        let registration = Registration {
            id: NOTE_WATCHER_ID.to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };

        if let Err(err) = self.client.register_capability(vec![registration]).await {
            warn!(%err, "failed to register the note file watcher");
        }
    }

    async fn unregister_note_watcher(&self) {
        let unregistration = Unregistration {
            id: NOTE_WATCHER_ID.to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
        };

        if let Err(err) = self.client.unregister_capability(vec![unregistration]).await {
            warn!(%err, "failed to unregister the note file watcher");
        }
    }

    fn daily_note(state: &ServerState, arguments: &[Value]) -> Result<Value> {
        let offset = match arguments.first() {
            None | Some(Value::Null) => 0,
            Some(value) => value
                .as_i64()
                .ok_or_else(|| Error::invalid_params("day offset must be an integer"))?,
        };

        let date = Duration::try_days(offset)
            .and_then(|offset| Local::now().date_naive().checked_add_signed(offset))
            .ok_or_else(|| Error::invalid_params("day offset out of range"))?;

        let path = daily_note_path(&state.settings, &state.workspace_root, date);
        Ok(json!({ "path": path, "exists": path.is_file() }))
    }

    fn resolve_page(state: &mut ServerState, arguments: &[Value]) -> Result<Value> {
        let raw = arguments
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_params("expected the page link as a string"))?;

        let link = wikilink::parse(raw).map_err(|err| Error::invalid_params(err.to_string()))?;
        let scope = VaultConfig::snapshot(&state.settings);
        let resolution = resolve_page(&mut state.index, &scope, &link);

        Ok(json!({ "path": resolution.path(), "exists": resolution.exists() }))
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        #[allow(deprecated)]
        let root_uri = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or(params.root_uri);

        let workspace_root = root_uri
            .and_then(|uri| uri.to_file_path().ok())
            .or_else(|| std::env::current_dir().ok())
            .ok_or_else(|| Error::invalid_params("no usable workspace root"))?;

        let settings = Settings::new(&workspace_root).unwrap_or_else(|err| {
            warn!(%err, "failed to load settings, using defaults");
            Settings::default()
        });

        let utf32 = params
            .capabilities
            .general
            .as_ref()
            .and_then(|general| general.position_encodings.as_ref())
            .is_some_and(|encodings| encodings.contains(&PositionEncodingKind::UTF32));
        let encoding = if utf32 {
            PositionEncoding::Utf32
        } else {
            PositionEncoding::Utf16
        };

        info!(root = %workspace_root.display(), ?settings, ?encoding, "initializing");

        let index = NoteIndex::new(&workspace_root);
        *self.state.lock().await = Some(ServerState {
            settings,
            workspace_root,
            index,
            encoding,
            documents: HashMap::new(),
        });

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                position_encoding: utf32.then_some(PositionEncodingKind::UTF32),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["[".to_string(), "/".to_string()]),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        DAILY_NOTE_COMMAND.to_string(),
                        RESOLVE_PAGE_COMMAND.to_string(),
                    ],
                    ..Default::default()
                }),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let extension = match self.state.lock().await.as_ref() {
            Some(state) => state.note_extension(),
            None => return,
        };

        self.register_note_watcher(&extension).await;

        self.client
            .log_message(MessageType::INFO, "wikidex initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        if let Some(state) = self.state.lock().await.as_mut() {
            state.documents.insert(
                params.text_document.uri,
                Rope::from_str(&params.text_document.text),
            );
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };

        if let Some(state) = self.state.lock().await.as_mut() {
            state
                .documents
                .insert(params.text_document.uri, Rope::from_str(&change.text));
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        if let Some(state) = self.state.lock().await.as_mut() {
            state.documents.remove(&params.text_document.uri);
        }
    }

    async fn did_change_configuration(&self, _: DidChangeConfigurationParams) {
        let extensions = {
            let mut guard = self.state.lock().await;
            let Some(state) = guard.as_mut() else {
                return;
            };

            let settings = match Settings::new(&state.workspace_root) {
                Ok(settings) => settings,
                Err(err) => {
                    warn!(%err, "failed to reload settings, keeping the previous ones");
                    return;
                }
            };

            let previous = state.note_extension();
            state.settings = settings;
            info!(settings = ?state.settings, "settings reloaded");

            (previous, state.note_extension())
        };

        if extensions.0 != extensions.1 {
            self.unregister_note_watcher().await;
            self.register_note_watcher(&extensions.1).await;
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let mut guard = self.state.lock().await;
        let Some(state) = guard.as_mut() else {
            return;
        };

        for change in params.changes {
            let Ok(path) = change.uri.to_file_path() else {
                continue;
            };

            dispatch_file_event(&mut state.index, &path, change.typ);
        }
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let mut guard = self.state.lock().await;
        let Some(state) = guard.as_mut() else {
            return Ok(None);
        };

        let position = params.text_document_position_params.position;
        let uri = &params.text_document_position_params.text_document.uri;
        let Some(line) = state.line_text(uri, position.line) else {
            return Ok(None);
        };
        let Some(position) = state.encoding.to_char_position(&line, position) else {
            debug!(?position, "definition requested past the end of the line");
            return Ok(None);
        };

        let scope = VaultConfig::snapshot(&state.settings);
        Ok(goto_definition(&mut state.index, &scope, &line, position)
            .map(GotoDefinitionResponse::Scalar))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let mut guard = self.state.lock().await;
        let Some(state) = guard.as_mut() else {
            return Ok(None);
        };

        let position = params.text_document_position.position;
        let uri = &params.text_document_position.text_document.uri;
        let Some(line) = state.line_text(uri, position.line) else {
            return Ok(None);
        };
        let Some(position) = state.encoding.to_char_position(&line, position) else {
            debug!(?position, "completion requested past the end of the line");
            return Ok(None);
        };
        let encoding = state.encoding;

        let context = Context {
            index: &mut state.index,
            settings: &state.settings,
            today: Local::now().date_naive(),
        };

        let mut response = get_completions(context, &line, position);
        if let Some(response) = response.as_mut() {
            encoding.encode_completions(&line, response);
        }
        Ok(response)
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let mut guard = self.state.lock().await;
        let Some(state) = guard.as_mut() else {
            return Err(Error::internal_error());
        };

        match params.command.as_str() {
            DAILY_NOTE_COMMAND => Backend::daily_note(state, &params.arguments).map(Some),
            RESOLVE_PAGE_COMMAND => Backend::resolve_page(state, &params.arguments).map(Some),
            command => Err(Error::invalid_params(format!("unknown command {command}"))),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend {
        client,
        state: Mutex::new(None),
    });
    Server::new(stdin, stdout, socket).serve(service).await;
}
