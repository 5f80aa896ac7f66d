use dux_analyze::{InsightBundle, filter_insights, generate_insights};
use dux_core::{
    AppConfig, ApplyTo, InsightCategory, MemoryFileSystem, PatternRule, ScanNode, iter_nodes,
};
use dux_scan::{ScanOptions, Scanner};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn scan_memory(fs: MemoryFileSystem, root: &str) -> ScanNode {
    Scanner::new(Arc::new(fs))
        .scan(root, &ScanOptions::default())
        .unwrap()
        .finalized()
        .root
}

fn paths(bundle: &InsightBundle, category: InsightCategory) -> Vec<PathBuf> {
    bundle
        .category(category)
        .iter()
        .map(|i| i.path.clone())
        .collect()
}

#[test]
fn test_project_end_to_end() {
    let mut fs = MemoryFileSystem::new();
    fs.add_file("/project/src/main.py", 100, 100)
        .add_file("/project/tmp/trace.log", 500, 500)
        .add_file("/project/.cache/pip/some.whl", 200, 200);
    let root = scan_memory(fs, "/project");

    let bundle = generate_insights(&root, &AppConfig::default()).unwrap();
    assert!(!bundle.is_empty());
    assert_eq!(
        paths(&bundle, InsightCategory::Temp),
        vec![PathBuf::from("/project/tmp")]
    );
    assert_eq!(
        paths(&bundle, InsightCategory::Cache),
        vec![PathBuf::from("/project/.cache")]
    );
    assert_eq!(bundle.category(InsightCategory::Cache)[0].disk_usage, 200);
    assert!(bundle.category(InsightCategory::BuildArtifact).is_empty());
}

#[test]
fn test_keeps_largest_per_category() {
    let mut fs = MemoryFileSystem::new();
    for i in 0..20u64 {
        fs.add_file(format!("/r/tmp/f{i}.log"), i * 10, i * 10);
    }
    let root = scan_memory(fs, "/r");

    let config = AppConfig {
        temp_patterns: vec![
            PatternRule::new("log", "**/*.log", InsightCategory::Temp).apply_to(ApplyTo::File),
        ],
        max_insights_per_category: 5,
        ..AppConfig::without_rules()
    };
    let bundle = generate_insights(&root, &config).unwrap();

    let usages: Vec<u64> = bundle.insights.iter().map(|i| i.disk_usage).collect();
    assert_eq!(usages, vec![190, 180, 170, 160, 150]);
    assert!(bundle.insights.iter().all(|i| i.summary == "log"));
}

#[test]
fn test_matched_directory_hides_same_category_children() {
    let mut fs = MemoryFileSystem::new();
    fs.add_file("/r/tmp/scratch.tmp", 40, 40)
        .add_file("/r/tmp/deep/other.tmp", 60, 60);
    let root = scan_memory(fs, "/r");

    let bundle = generate_insights(&root, &AppConfig::default()).unwrap();
    assert_eq!(paths(&bundle, InsightCategory::Temp), vec![PathBuf::from("/r/tmp")]);
    assert_eq!(bundle.insights[0].disk_usage, 100);
}

#[test]
fn test_stop_recursion_hides_every_category() {
    let mut fs = MemoryFileSystem::new();
    fs.add_file("/app/node_modules/pkg/index.js", 300, 300)
        .add_file("/app/node_modules/pkg/debug.log", 20, 20)
        .add_file("/app/node_modules/pkg/__pycache__/m.pyc", 5, 5)
        .add_file("/app/server.log", 7, 7);
    let root = scan_memory(fs, "/app");

    let bundle = generate_insights(&root, &AppConfig::default()).unwrap();
    assert_eq!(
        paths(&bundle, InsightCategory::BuildArtifact),
        vec![PathBuf::from("/app/node_modules")]
    );
    assert_eq!(bundle.category(InsightCategory::BuildArtifact)[0].disk_usage, 325);
    assert!(
        bundle
            .insights
            .iter()
            .all(|i| i.path == Path::new("/app/node_modules")
                || !i.path.starts_with("/app/node_modules"))
    );
    assert_eq!(
        paths(&bundle, InsightCategory::Temp),
        vec![PathBuf::from("/app/server.log")]
    );
}

#[test]
fn test_empty_tree() {
    let root = ScanNode::new_directory("/empty");
    let config = AppConfig {
        additional_cache_paths: vec!["/empty".to_string()],
        ..AppConfig::default()
    };
    let bundle = generate_insights(&root, &config).unwrap();
    assert!(bundle.is_empty());
    assert!(bundle.by_category.is_empty());
    assert_eq!(bundle.total_disk_usage(), 0);
}

#[test]
fn test_mixed_categories_and_case() {
    let mut fs = MemoryFileSystem::new();
    fs.add_file("/home/.DS_STORE", 4, 4)
        .add_file("/home/.mycache/blob", 900, 900)
        .add_file("/home/code/target/debug/app", 5000, 5000)
        .add_file("/home/code/mod.PYC", 3, 3);
    let root = scan_memory(fs, "/home");

    let config = AppConfig {
        additional_cache_paths: vec!["/home/.mycache".to_string()],
        ..AppConfig::default()
    };
    let bundle = generate_insights(&root, &config).unwrap();

    assert_eq!(
        paths(&bundle, InsightCategory::Temp),
        vec![PathBuf::from("/home/.DS_STORE")]
    );
    assert_eq!(
        paths(&bundle, InsightCategory::Cache),
        vec![PathBuf::from("/home/.mycache"), PathBuf::from("/home/code/mod.PYC")]
    );
    assert_eq!(
        paths(&bundle, InsightCategory::BuildArtifact),
        vec![PathBuf::from("/home/code/target")]
    );

    let only_cache = HashSet::from([InsightCategory::Cache]);
    let filtered = filter_insights(&bundle, &only_cache);
    assert_eq!(filtered.len(), 2);
    assert_eq!(filtered[0].summary, "/home/.mycache");
}

#[test]
fn test_insights_reference_tree_nodes() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("web/node_modules/lib")).unwrap();
    fs::create_dir_all(root.join("py/__pycache__")).unwrap();
    fs::write(root.join("web/node_modules/lib/index.js"), vec![b'x'; 2048]).unwrap();
    fs::write(root.join("py/__pycache__/a.cpython.pyc"), vec![b'x'; 512]).unwrap();

    let snapshot = Scanner::os()
        .scan(root, &ScanOptions::default())
        .unwrap()
        .finalized();
    let bundle = generate_insights(&snapshot.root, &AppConfig::default()).unwrap();

    let tree_paths: HashSet<&Path> = iter_nodes(&snapshot.root).map(|n| n.path.as_path()).collect();
    assert!(
        bundle
            .insights
            .iter()
            .all(|i| tree_paths.contains(i.path.as_path()))
    );
    assert_eq!(bundle.category(InsightCategory::BuildArtifact).len(), 1);
    assert_eq!(bundle.category(InsightCategory::Cache).len(), 1);
    assert!(bundle.category(InsightCategory::Cache)[0].path.ends_with("py/__pycache__"));
}

#[cfg(unix)]
#[test]
fn test_non_utf8_names_serialize_to_json() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp = TempDir::new().unwrap();
    let name = OsStr::from_bytes(b"bad\xff.log");
    fs::write(temp.path().join(name), vec![0u8; 64]).unwrap();

    let root = Scanner::os()
        .scan(temp.path(), &ScanOptions::default())
        .unwrap()
        .finalized()
        .root;
    let bundle = generate_insights(&root, &AppConfig::default()).unwrap();
    assert_eq!(bundle.category(InsightCategory::Temp).len(), 1);

    let json = serde_json::to_string(&bundle).unwrap();
    assert!(json.contains("bad\u{FFFD}.log"));
    let tree = serde_json::to_string(&root).unwrap();
    assert!(tree.contains("bad\u{FFFD}.log"));
}
