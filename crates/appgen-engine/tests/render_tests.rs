//! Rendering through the public API, with embedded templates

use appgen_core::{Application, OutputLayout};
use appgen_engine::{
    Context, ContextSchema, TemplateDocument, TemplateSet, render_flux, render_line,
    render_metadata, render_plugins,
};
use tempfile::TempDir;

fn application(temp: &TempDir) -> Application {
    std::fs::create_dir_all(temp.path().join("charts/example")).unwrap();
    let manifest = r#"appManifestFile-config:
  appName: example-app
  appVersion: 1.0-1
  namespace: demo
  chart:
    - name: example
      version: 0.1.0
      path: charts/example
setupFile-config:
  metadata:
    author: StarlingX
metadataFile-config:
  maintain_user_overrides: true
"#;
    Application::parse(manifest, temp.path()).unwrap()
}

#[test]
fn test_whole_tree_renders_without_leftover_tokens() {
    let temp = TempDir::new().unwrap();
    let app = application(&temp);
    let layout = OutputLayout::new(&temp.path().join("out"), &app);
    layout.prepare(false).unwrap();

    let templates = TemplateSet::embedded();
    let mut written = render_flux(&app, &layout, &templates).unwrap();
    written.extend(render_plugins(&app, &layout, &templates).unwrap());

    for path in &written {
        let text = std::fs::read_to_string(path).unwrap();
        assert!(!text.contains('$'), "unresolved token in {}", path.display());
        assert!(!text.contains("@chart"), "unresolved block in {}", path.display());
    }

    let release = std::fs::read_to_string(
        layout.chart_flux_dir("example").join("helmrelease.yaml"),
    )
    .unwrap();
    let parsed: serde_yaml::Value = serde_yaml::from_str(&release).unwrap();
    assert_eq!(parsed["metadata"]["name"].as_str(), Some("example"));
    assert_eq!(parsed["metadata"]["namespace"].as_str(), Some("demo"));
    assert_eq!(parsed["spec"]["chart"]["spec"]["version"].as_str(), Some("0.1.0"));

    let top = std::fs::read_to_string(layout.flux.join("kustomization.yaml")).unwrap();
    let parsed: serde_yaml::Value = serde_yaml::from_str(&top).unwrap();
    assert_eq!(parsed["namespace"].as_str(), Some("demo"));
    let resources: Vec<&str> = parsed["resources"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(resources, vec!["base", "example"]);
}

#[test]
fn test_metadata_document() {
    let temp = TempDir::new().unwrap();
    let app = application(&temp);
    let text = render_metadata(&app, "stx-platform").unwrap();
    let parsed: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(parsed["app_name"].as_str(), Some("example-app"));
    assert_eq!(parsed["maintain_user_overrides"].as_bool(), Some(true));
}

#[test]
fn test_rendering_twice_is_stable() {
    let temp = TempDir::new().unwrap();
    let app = application(&temp);
    let ctx = Context::for_chart(&app.charts[0]).unwrap();
    let doc = TemplateDocument::new(
        "t",
        "name: $name$\nkind: $source_kind$\nmissing: $nope$\nfallback: $nope%x$\n",
    );

    let first = doc.render(&ctx).unwrap();
    assert_eq!(first, doc.render(&ctx).unwrap());
    assert_eq!(first, "name: example\nkind: dir\nmissing: $nope$\nfallback: x\n");
}

#[test]
fn test_every_schema_key_is_reachable_from_templates() {
    let temp = TempDir::new().unwrap();
    let app = application(&temp);
    let contexts = [
        Context::for_manifest(&app).unwrap(),
        Context::for_chart_group(&app.chart_group).unwrap(),
        Context::for_plugin(&app, "Example").unwrap(),
    ];

    for ctx in &contexts {
        let schema: &ContextSchema = ctx.schema();
        for key in schema.key_names() {
            assert!(ctx.lookup(key).is_some(), "{} missing from {}", key, schema.name);
        }
    }

    assert_eq!(render_line("@nothing|2@\n", &contexts[0]).unwrap(), "");
}
