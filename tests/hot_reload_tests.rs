mod common;

use common::temp_files::create_temp_yaml;
use common::{registry_with, RecordingDispatcher, A};
use hypernav::hot_reload::{reload_from_file, watch_api};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const V1: &str = r#"uri: http://a.example
title: v1
root:
  children:
    - path: foo
links:
  - { from: /foo, rel: self, to: /foo }
"#;

const V2: &str = r#"uri: http://a.example
title: v2
root:
  children:
    - path: foo
    - path: bar
links:
  - { from: /foo, rel: self, to: /foo }
  - { from: /bar, rel: self, to: /bar }
"#;

#[test]
fn test_watch_api_reload() {
    let file = create_temp_yaml(V1);
    let registry = Arc::new(registry_with(Arc::new(RecordingDispatcher::default())));
    reload_from_file(file.path(), &registry).unwrap();
    assert!(registry
        .get_parent_api_navigator(A)
        .unwrap()
        .best_match(&format!("{A}/bar"))
        .is_err());

    let titles: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let titles_clone = Arc::clone(&titles);
    let watcher = watch_api(file.path(), Arc::clone(&registry), move |nav| {
        titles_clone.lock().unwrap().push(nav.api().title.clone());
    })
    .expect("watch_api");

    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));

    std::fs::write(file.path(), V2).unwrap();

    for _ in 0..40 {
        if titles.lock().unwrap().iter().any(|t| t == "v2") {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    assert!(titles.lock().unwrap().iter().any(|t| t == "v2"));
    let nav = registry.get_parent_api_navigator(A).unwrap();
    assert_eq!(
        nav.get_resource_template_id(&format!("{A}/bar")).unwrap().as_str(),
        "/bar"
    );

    drop(watcher);
}
