//! End-to-end runs over a small JavaScript project.
//!
//! Fixture layout:
//!
//! ```text
//! project/
//!   src/
//!     index.js        imports ./foo/index.js and ./bar/index.js
//!     foo/index.js
//!     foo/package.json
//!     bar/index.js
//!     bar/package.json
//!   rules/
//!     no-bar-to-foo.toml
//!   another_rules/
//!     README.md
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stricter::{
    get_stricter, rule_fn, ConfigError, Fix, Level, MemoryReporter, PluginCatalog, Resolution,
    ResolutionCache, RuleInstanceConfig, RuleMapping, RuleTable, RulesDeclaration, RunOutcome,
    StricterConfig, StricterError, StricterOptions, Violation,
};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        let src = project.join("src");
        fs::create_dir_all(src.join("foo")).unwrap();
        fs::create_dir_all(src.join("bar")).unwrap();
        fs::create_dir_all(project.join("rules")).unwrap();
        fs::create_dir_all(project.join("another_rules")).unwrap();

        fs::write(
            src.join("index.js"),
            "import foo from './foo/index.js';\nimport bar from './bar/index.js';\n\nexport default () => foo + bar;\n",
        )
        .unwrap();
        fs::write(src.join("foo/index.js"), "export default 'foo';\n").unwrap();
        fs::write(src.join("bar/index.js"), "module.exports = 'bar';\n").unwrap();
        fs::write(src.join("foo/package.json"), r#"{ "name": "foo" }"#).unwrap();
        fs::write(src.join("bar/package.json"), r#"{ "name": "bar" }"#).unwrap();
        fs::write(
            project.join("rules/no-bar-to-foo.toml"),
            "description = \"bar stays independent of foo\"\n\n[[deny]]\nfrom = '/bar/'\nto = '/foo/'\n",
        )
        .unwrap();
        fs::write(project.join("another_rules/README.md"), "Nothing to load\n").unwrap();

        Self { dir }
    }

    fn config_path(&self, body: &str) -> PathBuf {
        let path = self.dir.path().join("stricter.toml");
        fs::write(&path, body).unwrap();
        path
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("project/src")
    }
}

struct Run {
    lines: Vec<String>,
    outcome: RunOutcome,
}

fn run(options: StricterOptions) -> Result<Run, StricterError> {
    let reporter = Arc::new(MemoryReporter::new());
    let options = options
        .reporter(reporter.clone())
        .cache(Arc::new(ResolutionCache::new()));
    let outcome = get_stricter(options)()?;
    Ok(Run {
        lines: reporter.lines(),
        outcome,
    })
}

fn run_toml(fixture: &Fixture, body: &str) -> Run {
    run(StricterOptions::from_path(fixture.config_path(body))).unwrap()
}

/// Asserts `line` reports an unused-files error for `file` (root-relative).
fn assert_unused(line: &str, file: &str) {
    assert!(
        line.starts_with("error: stricter/unused-files "),
        "unexpected line: {line}"
    );
    assert!(
        line.ends_with(&format!("/project/src/{file} Unused file")),
        "unexpected line: {line}"
    );
}

fn entry_config(pattern: &str) -> toml::Value {
    let mut table = toml::Table::new();
    table.insert(
        "entry".into(),
        toml::Value::Array(vec![toml::Value::String(pattern.into())]),
    );
    toml::Value::Table(table)
}

#[test]
fn no_rules_reports_no_errors() {
    let fixture = Fixture::new();
    let result = run_toml(&fixture, "root = \"project/src\"\n");
    assert_eq!(result.lines, vec!["No errors"]);
    assert!(!result.outcome.is_failure());
}

#[test]
fn reachable_project_reports_no_errors() {
    let fixture = Fixture::new();
    let result = run_toml(
        &fixture,
        r#"
root = "project/src"
rules-dir = "project/rules"
exclude = ['.*\.json']

[[rules."stricter/unused-files"]]
level = "error"
config = { entry = ['.*/src/index\.js'] }
"#,
    );
    assert_eq!(result.lines, vec!["No errors"]);
}

#[test]
fn multiple_rules_dirs_are_accepted() {
    let fixture = Fixture::new();
    let result = run_toml(
        &fixture,
        r#"
root = "project/src"
rules-dir = ["project/rules", "project/another_rules"]
exclude = ['.*\.json']

[[rules."stricter/unused-files"]]
level = "error"
config = { entry = ['.*/src/index\.js'] }
"#,
    );
    assert_eq!(result.lines, vec!["No errors"]);
}

#[test]
fn unused_files_are_reported_in_walk_order() {
    let fixture = Fixture::new();
    let result = run_toml(
        &fixture,
        r#"
root = "project/src"
rules-dir = "project/rules"
exclude = ['.*\.json']

[[rules."stricter/unused-files"]]
level = "error"
config = { entry = ['/src/bar/index\.js'] }
"#,
    );
    assert_eq!(result.lines.len(), 3);
    assert_unused(&result.lines[0], "foo/index.js");
    assert_unused(&result.lines[1], "index.js");
    assert_eq!(result.lines[2], "2 errors");
    assert_eq!(result.outcome.error_count, 2);
    assert!(result.outcome.is_failure());
}

#[test]
fn per_package_instances_follow_discovered_packages() {
    let fixture = Fixture::new();
    let result = run_toml(
        &fixture,
        r#"
root = "project/src"
rules-dir = "project/rules"
exclude = ['.*\.json']

[[rules."stricter/unused-files"]]
level = "error"
for-each-package = true
config = { entry = ['{package}/index\.js'] }
"#,
    );
    assert_eq!(result.lines.len(), 5);
    // bar instance, then foo instance
    assert_unused(&result.lines[0], "foo/index.js");
    assert_unused(&result.lines[1], "index.js");
    assert_unused(&result.lines[2], "bar/index.js");
    assert_unused(&result.lines[3], "index.js");
    assert_eq!(result.lines[4], "4 errors");
}

#[test]
fn package_patterns_restrict_discovery() {
    let fixture = Fixture::new();
    let result = run_toml(
        &fixture,
        r#"
root = "project/src"
rules-dir = "project/rules"
exclude = ['.*\.json']
packages = ["f*"]

[[rules."stricter/unused-files"]]
level = "error"
for-each-package = true
config = { entry = ['{package}/index\.js'] }
"#,
    );
    assert_eq!(result.lines.len(), 3);
    assert_unused(&result.lines[0], "bar/index.js");
    assert_unused(&result.lines[1], "index.js");
    assert_eq!(result.lines[2], "2 errors");
}

#[test]
fn rules_function_receives_packages() {
    let fixture = Fixture::new();
    let rules = RulesDeclaration::dynamic(|ctx| {
        let mut mapping = RuleMapping::new();
        mapping.insert(
            "stricter/unused-files".into(),
            ctx.packages
                .iter()
                .map(|pkg| {
                    RuleInstanceConfig::error().with_config(entry_config(&format!("{pkg}/index\\.js")))
                })
                .collect(),
        );
        mapping
    });
    let config = StricterConfig::new(fixture.root())
        .with_exclude(pattern(r".*\.json"))
        .with_rules(rules);

    let result = run(StricterOptions::from_config(config)).unwrap();
    assert_eq!(result.lines.len(), 5);
    assert_eq!(result.lines[4], "4 errors");
}

#[test]
fn rules_function_runs_once_per_invocation() {
    let fixture = Fixture::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let rules = RulesDeclaration::dynamic(move |ctx| {
        counter.fetch_add(1, Ordering::SeqCst);
        let mut mapping = RuleMapping::new();
        mapping.insert(
            "stricter/unused-files".into(),
            ctx.packages
                .iter()
                .map(|pkg| {
                    RuleInstanceConfig::error().with_config(entry_config(&format!("{pkg}/index\\.js")))
                })
                .collect(),
        );
        mapping
    });
    let config = StricterConfig::new(fixture.root())
        .with_exclude(pattern(r".*\.json"))
        .with_rules(rules);
    let options = StricterOptions::from_config(config)
        .reporter(Arc::new(MemoryReporter::new()))
        .cache(Arc::new(ResolutionCache::new()));

    let run = get_stricter(options);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(run().unwrap().error_count, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(run().unwrap().error_count, 4);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn warnings_are_listed_but_not_counted() {
    let fixture = Fixture::new();
    let result = run_toml(
        &fixture,
        r#"
root = "project/src"
exclude = ['.*\.json']

[[rules."stricter/unused-files"]]
level = "warn"
config = { entry = ['/src/bar/index\.js'] }
"#,
    );
    assert_eq!(result.lines.len(), 3);
    assert!(result.lines[0].starts_with("warn: stricter/unused-files "));
    assert_eq!(result.lines[2], "No errors");
    assert_eq!(result.outcome.warning_count, 2);
    assert!(!result.outcome.is_failure());
}

#[test]
fn runs_are_deterministic() {
    let fixture = Fixture::new();
    let path = fixture.config_path(
        r#"
root = "project/src"
[[rules."stricter/unused-files"]]
config = { entry = ['/src/bar/index\.js'] }
[[rules."stricter/circular-dependencies"]]
"#,
    );
    let first = run(StricterOptions::from_path(&path)).unwrap();
    let second = run(StricterOptions::from_path(&path)).unwrap();
    assert_eq!(first.lines, second.lines);
    // package.json files are walked too when not excluded
    assert_eq!(first.outcome.error_count, 4);
}

#[test]
fn rules_to_verify_skips_other_rules() {
    let fixture = Fixture::new();
    let path = fixture.config_path(
        r#"
root = "project/src"
exclude = ['.*\.json']
[[rules."stricter/unused-files"]]
config = { entry = ['/src/bar/index\.js'] }
[[rules."stricter/circular-dependencies"]]
"#,
    );
    let result = run(
        StricterOptions::from_path(path).rules_to_verify(["stricter/circular-dependencies"]),
    )
    .unwrap();
    assert_eq!(result.lines, vec!["No errors"]);
}

#[test]
fn directory_rules_are_registered_by_file_stem() {
    let fixture = Fixture::new();
    fs::write(
        fixture.root().join("bar/index.js"),
        "import foo from '../foo/index.js';\n",
    )
    .unwrap();
    let result = run_toml(
        &fixture,
        r#"
root = "project/src"
rules-dir = "project/rules"
[[rules.no-bar-to-foo]]
"#,
    );
    assert_eq!(result.lines.len(), 2);
    assert!(result.lines[0].starts_with("error: no-bar-to-foo "));
    assert!(result.lines[0].contains("/bar/index.js "));
    assert_eq!(result.lines[1], "1 errors");
}

#[test]
fn missing_rules_dir_is_a_config_error() {
    let fixture = Fixture::new();
    let err = run(StricterOptions::from_path(
        fixture.config_path("root = \"project/src\"\nrules-dir = \"project/nope\"\n"),
    ))
    .err()
    .unwrap();
    assert!(matches!(
        err,
        StricterError::Config(ConfigError::RulesDirNotFound { .. })
    ));
}

#[test]
fn unknown_rule_aborts_before_reporting() {
    let fixture = Fixture::new();
    let reporter = Arc::new(MemoryReporter::new());
    let options = StricterOptions::from_path(
        fixture.config_path("root = \"project/src\"\n[[rules.\"stricter/nope\"]]\n"),
    )
    .reporter(reporter.clone());

    let err = get_stricter(options)().err().unwrap();
    assert!(matches!(
        err,
        StricterError::Config(ConfigError::RuleNotFound { ref name }) if name == "stricter/nope"
    ));
    assert!(reporter.lines().is_empty());
}

#[test]
fn missing_plugin_is_a_config_error() {
    let fixture = Fixture::new();
    let err = run(StricterOptions::from_path(
        fixture.config_path("root = \"project/src\"\nplugins = [\"abc\"]\n"),
    ))
    .err()
    .unwrap();
    assert!(matches!(
        err,
        StricterError::Config(ConfigError::PluginNotFound { ref module, .. }) if module == "stricter-plugin-abc"
    ));
}

/// Plugin with two counting rules.
fn counting_plugin(used: &Arc<AtomicUsize>, unused: &Arc<AtomicUsize>) -> PluginCatalog {
    let used = Arc::clone(used);
    let unused = Arc::clone(unused);
    PluginCatalog::new().with("stricter-plugin-abc", move || {
        let used = Arc::clone(&used);
        let unused = Arc::clone(&unused);
        let mut table = RuleTable::new();
        table.insert(
            "used".into(),
            rule_fn(move |_| {
                used.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            }),
        );
        table.insert(
            "unused".into(),
            rule_fn(move |_| {
                unused.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            }),
        );
        table
    })
}

#[test]
fn plugin_rules_run_only_when_referenced() {
    let fixture = Fixture::new();
    let used = Arc::new(AtomicUsize::new(0));
    let unused = Arc::new(AtomicUsize::new(0));
    let path = fixture.config_path(
        r#"
root = "project/src"
plugins = ["abc"]
[[rules."abc/used"]]
[[rules."abc/used"]]
level = "warn"
"#,
    );

    let result = run(StricterOptions::from_path(path).plugins(counting_plugin(&used, &unused)))
        .unwrap();
    assert_eq!(result.lines, vec!["No errors"]);
    assert_eq!(used.load(Ordering::SeqCst), 2);
    assert_eq!(unused.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_rule_is_reported_and_run_continues() {
    let fixture = Fixture::new();
    let catalog = PluginCatalog::new().with("stricter-plugin-broken", || {
        let mut table = RuleTable::new();
        table.insert("panics".into(), rule_fn(|_| panic!("rule bug")));
        table
    });
    let path = fixture.config_path(
        r#"
root = "project/src"
exclude = ['.*\.json']
plugins = ["broken"]
[[rules."broken/panics"]]
[[rules."stricter/unused-files"]]
config = { entry = ['/src/bar/index\.js'] }
"#,
    );

    let result = run(StricterOptions::from_path(path).plugins(catalog)).unwrap();
    assert_eq!(result.lines.len(), 4);
    assert!(result.lines[2].starts_with("failed: broken/panics #0 "));
    assert_eq!(result.lines[3], "2 errors");
    assert_eq!(result.outcome.failure_count, 1);
}

/// Rule emitting one violation whose fix writes `marker` under `dir`.
fn marker_rule(dir: PathBuf, marker: &'static str) -> stricter::RuleRef {
    rule_fn(move |ctx| {
        let target = dir.join(marker);
        Ok(vec![Violation::new(ctx.graph.root(), "needs marker").with_fix(
            Fix::new(move || {
                fs::write(&target, "fixed")?;
                Ok(())
            }),
        )])
    })
}

#[test]
fn failing_fix_does_not_block_other_rules() {
    let fixture = Fixture::new();
    let out = fixture.dir.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let dir = out.clone();
    let catalog = PluginCatalog::new().with("stricter-plugin-fixes", move || {
        let mut table = RuleTable::new();
        table.insert(
            "broken".into(),
            rule_fn(|ctx| {
                Ok(vec![Violation::new(ctx.graph.root(), "cannot fix")
                    .with_fix(Fix::new(|| Err("read-only".into())))])
            }),
        );
        table.insert("first".into(), marker_rule(dir.clone(), "first.txt"));
        table.insert("second".into(), marker_rule(dir.clone(), "second.txt"));
        table
    });

    let mut mapping = RuleMapping::new();
    for rule in ["fixes/broken", "fixes/first", "fixes/second"] {
        mapping.insert(rule.into(), vec![RuleInstanceConfig::new(Level::Warn)]);
    }
    let config = StricterConfig::new(fixture.root())
        .with_plugin("fixes")
        .with_rules(mapping.into());

    let result = run(StricterOptions::from_config(config).plugins(catalog).fix(true)).unwrap();
    assert!(out.join("first.txt").is_file());
    assert!(out.join("second.txt").is_file());
    assert_eq!(result.outcome.fixes_applied, 2);
    assert_eq!(result.outcome.fix_failures, vec!["fixes/broken"]);
}

#[test]
fn fixes_are_not_applied_without_fix_flag() {
    let fixture = Fixture::new();
    let out = fixture.dir.path().join("out");
    fs::create_dir_all(&out).unwrap();

    let dir = out.clone();
    let catalog = PluginCatalog::new().with("stricter-plugin-fixes", move || {
        let mut table = RuleTable::new();
        table.insert("first".into(), marker_rule(dir.clone(), "first.txt"));
        table
    });
    let mut mapping = RuleMapping::new();
    mapping.insert("fixes/first".into(), vec![RuleInstanceConfig::error()]);
    let config = StricterConfig::new(fixture.root())
        .with_plugin("fixes")
        .with_rules(mapping.into());

    let result = run(StricterOptions::from_config(config).plugins(catalog)).unwrap();
    assert!(!out.join("first.txt").exists());
    assert_eq!(result.outcome.fixes_applied, 0);
}

#[test]
fn clear_cache_empties_the_resolution_cache() {
    let fixture = Fixture::new();
    let cache = Arc::new(ResolutionCache::new());
    cache.set(
        Path::new("/nowhere/index.js"),
        "./stale",
        Resolution::File(PathBuf::from("/stale")),
    );

    let options = StricterOptions::from_path(fixture.config_path("root = \"project/src\"\n"))
        .reporter(Arc::new(MemoryReporter::new()))
        .cache(Arc::clone(&cache))
        .clear_cache(true);
    get_stricter(options)().unwrap();

    assert!(cache.get(Path::new("/nowhere/index.js"), "./stale").is_none());
    // index.js resolved its two imports during the run
    assert_eq!(cache.len(), 2);
}

#[test]
fn unresolved_specifiers_do_not_fail_the_build() {
    let fixture = Fixture::new();
    fs::write(
        fixture.root().join("index.js"),
        "import React from 'react';\nimport missing from './missing.js';\n",
    )
    .unwrap();
    let result = run_toml(
        &fixture,
        r#"
root = "project/src"
exclude = ['.*\.json']
[[rules."stricter/unused-files"]]
config = { entry = ['/src/index\.js'] }
"#,
    );
    // foo and bar are no longer imported
    assert_eq!(result.outcome.error_count, 2);
}

fn pattern(re: &str) -> regex::Regex {
    regex::Regex::new(re).unwrap()
}

#[test]
fn violations_follow_walk_order_when_imports_run_ahead() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("lib")).unwrap();
    fs::write(src.join("lib/x.js"), "import z from '../zzz.js';\n").unwrap();
    fs::write(src.join("aaa.js"), "").unwrap();
    fs::write(src.join("zzz.js"), "").unwrap();
    let config = dir.path().join("stricter.toml");
    fs::write(
        &config,
        "root = \"src\"\n\n[[rules.\"stricter/unused-files\"]]\nconfig = { entry = ['nomatch'] }\n",
    )
    .unwrap();

    let result = run(StricterOptions::from_path(config)).unwrap();
    assert_eq!(result.lines.len(), 4);
    assert!(result.lines[0].ends_with("/src/lib/x.js Unused file"));
    assert!(result.lines[1].ends_with("/src/aaa.js Unused file"));
    assert!(result.lines[2].ends_with("/src/zzz.js Unused file"));
    assert_eq!(result.lines[3], "3 errors");
}
