mod common;

use std::sync::Arc;

use common::{counting_engine, engine, names, server, CountingStore, TIMEOUT};
use graphlens_core::{
    AdHocQuery, CallGraph, ClassHierarchy, DependencyAnalysis, ErrorKind, FindCallers, InterfaceImplementations,
    ModuleExports, QueryKind,
};
use serde_json::json;

// =============================================================================
// findCallers
// =============================================================================

#[tokio::test]
async fn test_direct_callers() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine.find_callers(&FindCallers::new("p.util.log")).await;

    let result = envelope.success().unwrap();
    assert_eq!(names(&result.results), vec!["p.util.format", "p.util.parse"]);
    assert_eq!(result.metadata.row_count, 2);
    assert_eq!(result.metadata.query_kind, QueryKind::FindCallers);

    let row = &result.results[0];
    assert_eq!(row["calls"], json!("p.util.log"));
    assert_eq!(row["relationship"], json!("CALLS"));
    assert_eq!(row["depth"], json!(1));
    assert_eq!(row["file_path"], json!("util.py"));
    assert_eq!(row["path"], json!(["p.util.format", "p.util.log"]));
}

#[tokio::test]
async fn test_transitive_callers_carry_paths() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .find_callers(&FindCallers::new("p.util.log").with_max_depth(2))
        .await;

    let result = envelope.success().unwrap();
    assert_eq!(
        names(&result.results),
        vec!["p.util.format", "p.util.parse", "p.app.handle", "p.app.main"]
    );
    assert_eq!(
        result.results[3]["path"],
        json!(["p.app.main", "p.util.parse", "p.util.log"])
    );
    assert_eq!(result.results[3]["depth"], json!(2));
}

#[tokio::test]
async fn test_callers_without_paths() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .find_callers(&FindCallers::new("p.util.log").with_paths(false))
        .await;

    let result = envelope.success().unwrap();
    assert!(result.results.iter().all(|row| row.get("path").is_none()));
}

// =============================================================================
// existence verification
// =============================================================================

#[tokio::test]
async fn test_known_entity_without_relationships_is_empty_success() {
    let engine = engine(&server(), "proj").await;

    let envelope = engine.find_callers(&FindCallers::new("p.app.main")).await;
    let result = envelope.success().unwrap();
    assert_eq!(result.metadata.row_count, 0);
    assert!(!result.metadata.truncated);

    let envelope = engine.call_graph(&CallGraph::new("p.util.log")).await;
    assert_eq!(envelope.success().unwrap().metadata.row_count, 0);

    let envelope = engine.class_hierarchy(&ClassHierarchy::new("p.models.Orphan")).await;
    assert_eq!(envelope.success().unwrap().metadata.row_count, 0);
}

#[tokio::test]
async fn test_unknown_entity_is_not_found() {
    let engine = engine(&server(), "proj").await;

    let envelope = engine.find_callers(&FindCallers::new("p.util.missing")).await;
    let error = envelope.error().unwrap();
    assert_eq!(error.error_kind, ErrorKind::NodeNotFound);
    assert_eq!(error.error, "Function or Method 'p.util.missing' not found");
    assert!(error.suggestion.as_deref().unwrap().contains("qualified name"));

    let envelope = engine.class_hierarchy(&ClassHierarchy::new("p.models.Nope")).await;
    assert_eq!(envelope.error().unwrap().error, "Class 'p.models.Nope' not found");
}

#[tokio::test]
async fn test_entity_of_wrong_kind_is_not_found() {
    let engine = engine(&server(), "proj").await;

    // a class is not a valid call target
    let envelope = engine.find_callers(&FindCallers::new("p.models.Base")).await;
    assert_eq!(envelope.error_kind(), Some(ErrorKind::NodeNotFound));

    let envelope = engine.module_exports(&ModuleExports::new("p.app.main")).await;
    assert_eq!(envelope.error().unwrap().error, "Module 'p.app.main' not found");
}

#[tokio::test]
async fn test_existence_check_only_runs_on_empty_results() {
    let store = Arc::new(CountingStore::new(&server()));
    let engine = counting_engine(store.clone(), TIMEOUT).await;

    // one edge hop, one hydration; no lookup
    engine
        .find_callers(&FindCallers::new("p.util.log").with_max_depth(1))
        .await;
    assert_eq!(store.queries(), 2);

    // one edge hop, then the lookup
    engine.find_callers(&FindCallers::new("p.app.main")).await;
    assert_eq!(store.queries(), 4);
}

// =============================================================================
// classHierarchy
// =============================================================================

#[tokio::test]
async fn test_hierarchy_both_directions() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine.class_hierarchy(&ClassHierarchy::new("p.models.Circle")).await;

    let result = envelope.success().unwrap();
    assert_eq!(names(result.section("ancestors")), vec!["p.models.Base", "p.models.Shape"]);
    assert_eq!(names(result.section("descendants")), vec!["p.models.SmallCircle"]);
    assert_eq!(
        names(&result.results),
        vec!["p.models.Base", "p.models.Shape", "p.models.SmallCircle"]
    );

    let base = &result.section("ancestors")[0];
    assert_eq!(base["relationship"], json!("INHERITS"));
    assert_eq!(base["subclass"], json!("p.models.Circle"));
    let shape = &result.section("ancestors")[1];
    assert_eq!(shape["relationship"], json!("IMPLEMENTS"));
}

#[tokio::test]
async fn test_hierarchy_up_respects_depth() {
    let engine = engine(&server(), "proj").await;

    let envelope = engine
        .class_hierarchy(&ClassHierarchy::new("p.models.SmallCircle").with_direction("up"))
        .await;
    let result = envelope.success().unwrap();
    assert_eq!(
        names(&result.results),
        vec!["p.models.Circle", "p.models.Base", "p.models.Shape"]
    );
    assert!(result.sections.is_empty());

    let envelope = engine
        .class_hierarchy(
            &ClassHierarchy::new("p.models.SmallCircle")
                .with_direction("up")
                .with_max_depth(1),
        )
        .await;
    assert_eq!(names(&envelope.success().unwrap().results), vec!["p.models.Circle"]);
}

#[tokio::test]
async fn test_hierarchy_down() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .class_hierarchy(&ClassHierarchy::new("p.models.Base").with_direction("down"))
        .await;

    let result = envelope.success().unwrap();
    assert_eq!(names(&result.results), vec!["p.models.Circle", "p.models.SmallCircle"]);
    assert_eq!(result.results[1]["base"], json!("p.models.Circle"));
    assert_eq!(result.results[1]["depth"], json!(2));
}

// =============================================================================
// dependencyAnalysis
// =============================================================================

#[tokio::test]
async fn test_dependencies_all_sums_both_subsets() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine.dependency_analysis(&DependencyAnalysis::new("p.app")).await;

    let result = envelope.success().unwrap();
    assert_eq!(
        names(result.section("imports")),
        vec!["ext.json", "p.models", "p.util"]
    );
    assert_eq!(names(result.section("calls")), vec!["p.util.format", "p.util.parse"]);
    assert_eq!(result.metadata.row_count, 5);

    let mut all = names(&result.results);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 5);
}

#[tokio::test]
async fn test_dependencies_single_type() {
    let engine = engine(&server(), "proj").await;

    let envelope = engine
        .dependency_analysis(&DependencyAnalysis::new("p.app").with_type("imports"))
        .await;
    let result = envelope.success().unwrap();
    assert_eq!(result.metadata.row_count, 3);
    assert!(result.section("calls").is_empty());

    let envelope = engine
        .dependency_analysis(&DependencyAnalysis::new("p.app.main").with_type("calls"))
        .await;
    let result = envelope.success().unwrap();
    assert_eq!(names(&result.results), vec!["p.app.handle", "p.util.parse"]);
    assert_eq!(result.results[0]["source"], json!("p.app.main"));
}

#[tokio::test]
async fn test_transitive_dependencies() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .dependency_analysis(&DependencyAnalysis::new("p.app").with_type("calls").transitive(true))
        .await;

    let result = envelope.success().unwrap();
    assert_eq!(
        names(&result.results),
        vec!["p.util.format", "p.util.parse", "p.util.log"]
    );
}

#[tokio::test]
async fn test_dependencies_of_class_is_not_found() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .dependency_analysis(&DependencyAnalysis::new("p.models.Base"))
        .await;
    assert_eq!(envelope.error_kind(), Some(ErrorKind::NodeNotFound));
}

// =============================================================================
// interfaceImplementations
// =============================================================================

#[tokio::test]
async fn test_direct_implementations() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .interface_implementations(&InterfaceImplementations::new("p.models.Shape"))
        .await;

    let result = envelope.success().unwrap();
    assert_eq!(names(&result.results), vec!["p.models.Circle", "p.models.Square"]);
    assert!(result.results.iter().all(|row| row["depth"] == json!(1)));
    assert!(result.results.iter().all(|row| row["relationship"] == json!("IMPLEMENTS")));
}

#[tokio::test]
async fn test_indirect_implementations() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .interface_implementations(&InterfaceImplementations::new("p.models.Shape").indirect(true))
        .await;

    let result = envelope.success().unwrap();
    assert_eq!(
        names(&result.results),
        vec!["p.models.Circle", "p.models.Square", "p.models.SmallCircle"]
    );
    let indirect = &result.results[2];
    assert_eq!(indirect["relationship"], json!("INHERITS"));
    assert_eq!(indirect["via"], json!("p.models.Circle"));
    assert_eq!(indirect["depth"], json!(2));
}

// =============================================================================
// callGraph
// =============================================================================

#[tokio::test]
async fn test_call_graph_levels() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine.call_graph(&CallGraph::new("p.app.main")).await;

    let result = envelope.success().unwrap();
    assert_eq!(
        names(&result.results),
        vec!["p.app.handle", "p.util.parse", "p.util.format", "p.util.log"]
    );
    assert_eq!(result.results[3]["called_from"], json!("p.util.parse"));
    assert!(!result.metadata.truncated);
    assert_eq!(result.metadata.total_count, 4);
}

#[tokio::test]
async fn test_call_graph_node_cap_truncates() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .call_graph(&CallGraph::new("p.app.main").with_max_depth(5).with_max_nodes(3))
        .await;

    let result = envelope.success().unwrap();
    assert!(result.metadata.truncated);
    assert_eq!(result.metadata.row_count, 3);
    assert_eq!(result.metadata.total_count, 4);
    assert!(result.metadata.total_count > result.metadata.row_count);
}

#[tokio::test]
async fn test_call_graph_cap_equal_to_size_is_not_truncated() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .call_graph(&CallGraph::new("p.app.main").with_max_nodes(4))
        .await;

    let result = envelope.success().unwrap();
    assert!(!result.metadata.truncated);
    assert_eq!(result.metadata.row_count, 4);
}

// =============================================================================
// moduleExports
// =============================================================================

#[tokio::test]
async fn test_public_exports_sorted_by_type_then_name() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine.module_exports(&ModuleExports::new("p.models")).await;

    let result = envelope.success().unwrap();
    assert_eq!(
        names(&result.results),
        vec![
            "p.models.Base",
            "p.models.Circle",
            "p.models.Shape",
            "p.models.SmallCircle",
            "p.models.Square",
            "p.models.helper",
        ]
    );
    assert!(result.results.iter().all(|row| row["visibility"] == json!("public")));
    assert_eq!(result.results[1]["base_classes"], json!(["Base", "Shape"]));
}

#[tokio::test]
async fn test_private_exports_included_on_request() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine
        .module_exports(&ModuleExports::new("p.models").with_private(true))
        .await;

    let result = envelope.success().unwrap();
    assert_eq!(result.metadata.row_count, 7);
    let registry = result
        .results
        .iter()
        .find(|row| row["name"] == json!("_Registry"))
        .unwrap();
    assert_eq!(registry["visibility"], json!("private"));
}

// =============================================================================
// adHocQuery
// =============================================================================

#[tokio::test]
async fn test_ad_hoc_truncates_to_limit() {
    let rows = (0..3)
        .map(|i| {
            let mut row = serde_json::Map::new();
            row.insert("n".into(), json!(i));
            row
        })
        .collect();
    let store = Arc::new(CountingStore::new(&server()).with_run_rows(rows));
    let engine = counting_engine(store.clone(), TIMEOUT).await;

    let envelope = engine
        .ad_hoc_query(&AdHocQuery::new("SELECT * FROM entity").with_limit(2))
        .await;
    let result = envelope.success().unwrap();
    assert_eq!(result.metadata.row_count, 2);
    assert_eq!(result.metadata.total_count, 3);
    assert!(result.metadata.truncated);
    assert_eq!(result.results[1]["n"], json!(1));
}

#[tokio::test]
async fn test_ad_hoc_fetches_one_row_past_limit() {
    let rows = (0..40)
        .map(|i| {
            let mut row = serde_json::Map::new();
            row.insert("n".into(), json!(i));
            row
        })
        .collect();
    let store = Arc::new(CountingStore::new(&server()).with_run_rows(rows));
    let engine = counting_engine(store.clone(), TIMEOUT).await;

    let envelope = engine
        .ad_hoc_query(&AdHocQuery::new("SELECT * FROM entity").with_limit(5))
        .await;
    let result = envelope.success().unwrap();
    assert_eq!(store.max_rows(), 6);
    assert_eq!(result.metadata.row_count, 5);
    assert_eq!(result.metadata.total_count, 6);
    assert!(result.metadata.truncated);

    let envelope = engine
        .ad_hoc_query(&AdHocQuery::new("SELECT * FROM entity").with_limit(1000))
        .await;
    let result = envelope.success().unwrap();
    assert_eq!(result.metadata.row_count, 40);
    assert_eq!(result.metadata.total_count, 40);
    assert!(!result.metadata.truncated);
}

#[tokio::test]
async fn test_ad_hoc_on_memory_backend_is_unknown_error() {
    let engine = engine(&server(), "proj").await;
    let envelope = engine.ad_hoc_query(&AdHocQuery::new("MATCH (n) RETURN n")).await;

    let error = envelope.error().unwrap();
    assert_eq!(error.error_kind, ErrorKind::UnknownError);
    // backend detail stays in the logs
    assert!(!error.error.contains("SurrealDB"));
}
