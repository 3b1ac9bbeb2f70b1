//! Command implementations.

use std::path::{Path, PathBuf};

use formstate::{
    FormStateError, MaterializeContext, Materializer, MaterializerConfig, Preferences, Pretty,
    VisibilityMap,
};
use formstate_fields::{FieldHooks, FieldsContext, FieldsError, User};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::cli::MaterializeArgs;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    FormState(#[from] FormStateError),

    #[error(transparent)]
    Fields(#[from] FieldsError),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Read a JSON file, or YAML when the extension says so.
pub fn read_data<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |message: String| CliError::Parse {
        path: path.to_path_buf(),
        message,
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => {
            serde_yaml_ng::from_str(&content).map_err(|e| parse_error(e.to_string()))
        }
        _ => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Write a value back in the format [`read_data`] would read it in.
pub fn write_data(path: &Path, value: &Value) -> Result<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => {
            serde_yaml_ng::to_string(value).map_err(|e| CliError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        }
        _ => serde_json::to_string_pretty(value)? + "\n",
    };
    std::fs::write(path, content).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(config_dir: Option<&Path>) -> Result<MaterializerConfig> {
    let dir = match config_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|source| CliError::Read {
            path: PathBuf::from("."),
            source,
        })?,
    };
    let config = MaterializerConfig::load(&dir)?;
    debug!("configuration: {}", Pretty(&config));
    Ok(config)
}

/// Materialize a document and return the state as pretty JSON.
pub async fn run_materialize(args: &MaterializeArgs, config_dir: Option<&Path>) -> Result<String> {
    let config = load_config(config_dir)?;
    let fields = FieldsContext::open(&args.fields)
        .strict(args.strict)
        .build()
        .await?;
    let collection = fields.get_collection(&args.collection)?;

    let mut document: Value = read_data(&args.document)?;

    let mut ctx = MaterializeContext::new(args.operation).with_locale(args.locale.as_str());
    if let Some(id) = &args.id {
        ctx = ctx.with_id(id.as_str());
    }
    if let Some(path) = &args.preferences {
        ctx = ctx.with_preferences(read_data::<Preferences>(path)?);
    }
    if let Some(path) = &args.user {
        ctx = ctx.with_user(read_data::<User>(path)?);
    }
    if let Some(path) = &args.visibility {
        ctx = ctx.with_visibility(read_data::<VisibilityMap>(path)?);
    }

    let materializer = Materializer::new(FieldHooks::with_builtins()).with_config(config);
    let state = materializer
        .materialize(&collection.fields, &mut document, &ctx)
        .await?;

    if args.write_back {
        write_data(&args.document, &document)?;
        debug!(path = %args.document.display(), "document written back");
    }

    Ok(serde_json::to_string_pretty(&state)?)
}

/// List collection slugs with their labels, one per line.
pub async fn run_collections(fields_dir: &Path, strict: bool) -> Result<String> {
    let fields = FieldsContext::open(fields_dir).strict(strict).build().await?;
    let lines: Vec<String> = fields
        .all_collections()
        .iter()
        .map(|c| match &c.label {
            Some(label) => format!("{}\t{}\t{} fields", c.slug, label, c.fields.len()),
            None => format!("{}\t\t{} fields", c.slug, c.fields.len()),
        })
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstate_fields::Operation;
    use tempfile::TempDir;

    const PAGES: &str = r#"
slug: pages
label: Pages
fields:
  - name: title
    type: text
    validate: required
  - name: items
    type: array
    admin:
      init_collapsed: true
    fields:
      - name: label
        type: text
"#;

    const POSTS: &str = r#"
slug: posts
fields:
  - name: lang
    type: text
    default:
      supplier: locale
  - name: tags
    type: array
    default:
      value:
        - label: news
    fields:
      - name: label
        type: text
"#;

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let collections = tmp.path().join("fields").join("collections");
        std::fs::create_dir_all(&collections).unwrap();
        std::fs::write(collections.join("pages.yaml"), PAGES).unwrap();
        tmp
    }

    fn args(tmp: &TempDir, document: &Path) -> MaterializeArgs {
        MaterializeArgs {
            fields: tmp.path().join("fields"),
            collection: "pages".into(),
            document: document.to_path_buf(),
            preferences: None,
            user: None,
            visibility: None,
            id: Some("p1".into()),
            locale: "en".into(),
            operation: Operation::Update,
            write_back: false,
            strict: true,
        }
    }

    #[tokio::test]
    async fn materialize_prints_state() {
        let tmp = setup();
        let document = tmp.path().join("doc.json");
        std::fs::write(&document, r#"{"title": "", "items": [{"label": "a"}]}"#).unwrap();

        let output = run_materialize(&args(&tmp, &document), Some(tmp.path()))
            .await
            .unwrap();
        let state: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(state["title"]["valid"], Value::Bool(false));
        assert_eq!(state["items"]["value"], serde_json::json!(1));
        assert_eq!(state["items"]["rows"][0]["collapsed"], Value::Bool(true));

        // Without write-back the file is untouched.
        let reread: Value = read_data(&document).unwrap();
        assert!(reread["items"][0].get("id").is_none());
    }

    #[tokio::test]
    async fn write_back_persists_row_ids() {
        let tmp = setup();
        let document = tmp.path().join("doc.yaml");
        std::fs::write(&document, "title: Hello\nitems:\n  - label: a\n").unwrap();

        let mut args = args(&tmp, &document);
        args.write_back = true;
        let output = run_materialize(&args, Some(tmp.path())).await.unwrap();
        let state: Value = serde_json::from_str(&output).unwrap();

        let reread: Value = read_data(&document).unwrap();
        assert_eq!(reread["title"], Value::String("Hello".into()));
        assert_eq!(reread["items"][0]["id"], state["items.0.id"]["value"]);
    }

    #[tokio::test]
    async fn declared_defaults_load_from_yaml_and_persist_rows() {
        let tmp = setup();
        let collections = tmp.path().join("fields").join("collections");
        std::fs::write(collections.join("posts.yaml"), POSTS).unwrap();
        let document = tmp.path().join("post.json");
        std::fs::write(&document, "{}").unwrap();

        let mut args = args(&tmp, &document);
        args.collection = "posts".into();
        args.locale = "de".into();
        args.write_back = true;
        let first: Value =
            serde_json::from_str(&run_materialize(&args, Some(tmp.path())).await.unwrap()).unwrap();
        assert_eq!(first["lang"]["value"], Value::String("de".into()));
        assert_eq!(first["tags.0.label"]["value"], Value::String("news".into()));

        let reread: Value = read_data(&document).unwrap();
        assert_eq!(reread["tags"][0]["id"], first["tags.0.id"]["value"]);
        assert!(reread.get("lang").is_none());

        let second: Value =
            serde_json::from_str(&run_materialize(&args, Some(tmp.path())).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_collection_is_an_error() {
        let tmp = setup();
        let document = tmp.path().join("doc.json");
        std::fs::write(&document, "{}").unwrap();
        let mut args = args(&tmp, &document);
        args.collection = "posts".into();

        let err = run_materialize(&args, Some(tmp.path())).await.unwrap_err();
        assert!(matches!(err, CliError::Fields(FieldsError::CollectionNotFound { .. })));
    }

    #[tokio::test]
    async fn collections_lists_slugs() {
        let tmp = setup();
        let output = run_collections(&tmp.path().join("fields"), false).await.unwrap();
        assert_eq!(output, "pages\tPages\t2 fields");
    }

    #[test]
    fn read_data_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{").unwrap();
        let err = read_data::<Value>(&path).unwrap_err();
        assert!(matches!(err, CliError::Parse { .. }));
    }
}
