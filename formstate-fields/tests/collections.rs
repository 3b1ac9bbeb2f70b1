//! Loading collection schemas from disk and binding their hooks.

use formstate_fields::{
    DefaultValue, FieldHooks, FieldShape, FieldsContext, FieldsError, PathPrefix,
};
use tempfile::TempDir;

const ARTICLES: &str = r#"
slug: articles
label: Articles
fields:
  - name: title
    type: text
    required: true
    validate: required
  - name: author
    type: relationship
    relation_to: users
  - type: tabs
    tabs:
      - label: Content
        fields:
          - name: body
            type: textarea
            validate: length
            custom:
              max_length: 5000
      - name: seo
        fields:
          - name: description
            type: text
  - name: sections
    type: blocks
    validate: rows
    custom:
      max_rows: 10
    admin:
      init_collapsed: true
    blocks:
      - slug: text
        fields:
          - name: copy
            type: textarea
      - slug: gallery
        fields:
          - name: images
            type: array
            fields:
              - name: image
                type: upload
                relation_to: media
              - name: caption
                type: text
  - name: published_at
    type: date
    default:
      supplier: now
"#;

const BAD_HOOK: &str = r#"
slug: drafts
fields:
  - name: title
    type: text
    validate: spellcheck
"#;

fn fields_dir(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("collections");
    std::fs::create_dir_all(&dir).unwrap();
    for (name, content) in files {
        std::fs::write(dir.join(name), content).unwrap();
    }
    tmp
}

#[tokio::test]
async fn test_realistic_collection_loads_and_verifies() {
    let tmp = fields_dir(&[("articles.yaml", ARTICLES)]);
    let ctx = FieldsContext::open(tmp.path()).strict(true).build().await.unwrap();
    let articles = ctx.get_collection("articles").unwrap();

    let names: Vec<Option<&str>> = articles.fields.iter().map(|f| f.data_name()).collect();
    assert_eq!(
        names,
        vec![Some("title"), Some("author"), None, Some("sections"), Some("published_at")]
    );

    let sections = &articles.fields[3];
    assert!(sections.admin.init_collapsed);
    let FieldShape::Blocks(blocks) = sections.shape() else {
        panic!("sections should be blocks");
    };
    assert_eq!(blocks.len(), 2);
    assert_eq!(
        articles.fields[4].default,
        Some(DefaultValue::Supplier("now".into()))
    );

    FieldHooks::with_builtins().verify(&articles.fields).unwrap();
}

#[tokio::test]
async fn test_unregistered_hook_is_reported_with_path() {
    let tmp = fields_dir(&[("drafts.yaml", BAD_HOOK)]);
    let ctx = FieldsContext::open(tmp.path()).build().await.unwrap();
    let drafts = ctx.get_collection("drafts").unwrap();

    let err = FieldHooks::with_builtins().verify(&drafts.fields).unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown validator 'spellcheck' on field 'title'"
    );
}

#[tokio::test]
async fn test_duplicate_slugs_in_strict_mode() {
    let tmp = fields_dir(&[("a.yaml", ARTICLES), ("b.yml", ARTICLES)]);
    let result = FieldsContext::open(tmp.path()).strict(true).build().await;
    assert!(matches!(
        result,
        Err(FieldsError::DuplicateCollection { ref slug }) if slug == "articles"
    ));

    let lenient = FieldsContext::open(tmp.path()).build().await.unwrap();
    assert_eq!(lenient.all_collections().len(), 1);
}

#[test]
fn test_row_paths() {
    let prefix = PathPrefix::root().nested("seo").row("sections", 2);
    assert_eq!(prefix.key("copy"), "seo.sections.2.copy");
}
