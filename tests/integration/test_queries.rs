//! The query language end to end: index on disk, sources on disk

use crate::common::{DEFINITION, Doc, Occ, READ_ACCESS, TestProject};
use std::collections::BTreeMap;
use std::fs;
use symdex::{
    Query, QueryDispatcher, QueryError, QueryResult, SourceLookup, SourceTree, SymbolGraph,
    WorkspaceSources,
};

const HELPER: &str = "scip-python python app 0.1 b/helper().";
const RUN: &str = "scip-python python app 0.1 a/run().";

const A_PY: &str = "from b import helper\n\n\ndef run():\n    return helper()\n";
const B_PY: &str = "import os\n\n\n\n\n\ndef helper():\n    return foo\n";

fn project() -> (TestProject, SymbolGraph) {
    let project = TestProject::new();
    project.add_file("a.py", A_PY);
    project.add_file("b.py", B_PY);
    let index = project.add_index(&[
        Doc::new("a.py")
            .declare(RUN)
            .occurrence(Occ::new(HELPER, &[0, 14, 20], READ_ACCESS))
            .occurrence(Occ::new(RUN, &[3, 4, 7], DEFINITION).enclosing(&[3, 0, 4, 19]))
            .occurrence(Occ::new(HELPER, &[4, 11, 17], READ_ACCESS)),
        Doc::new("b.py")
            .declare(HELPER)
            .occurrence(Occ::new(HELPER, &[6, 4, 10], DEFINITION).enclosing(&[6, 0, 7, 14])),
    ]);
    let graph = SymbolGraph::from_path(index).unwrap();
    (project, graph)
}

#[test]
fn test_exact_query_lines() {
    let (project, graph) = project();
    let sources = WorkspaceSources::open(project.path(), &graph);
    let mut dispatcher = QueryDispatcher::new(&graph, sources);

    let mut expected = BTreeMap::new();
    expected.insert("b.py".to_string(), vec![8]);
    assert_eq!(
        dispatcher.dispatch("type:exact foo").unwrap(),
        QueryResult::Matches(expected)
    );

    let QueryResult::Matches(helper) = dispatcher.dispatch("type:exact helper").unwrap() else {
        panic!("expected matches");
    };
    assert_eq!(helper["a.py"], [1, 5]);
    assert_eq!(helper["b.py"], [7]);
}

#[test]
fn test_exact_query_single_match() {
    let project = TestProject::new();
    project.add_file("b.py", "a\nb\nc\nd\ne\nf\nx = foo()\n");
    let index = project.add_index(&[Doc::new("b.py")]);
    let graph = SymbolGraph::from_path(index).unwrap();

    let mut dispatcher = QueryDispatcher::new(&graph, WorkspaceSources::open(project.path(), &graph));
    let mut expected = BTreeMap::new();
    expected.insert("b.py".to_string(), vec![7]);
    assert_eq!(
        dispatcher.dispatch("type:exact foo").unwrap(),
        QueryResult::Matches(expected)
    );
}

#[test]
fn test_symbol_query_groups_by_file() {
    let (project, graph) = project();
    let mut dispatcher = QueryDispatcher::new(&graph, WorkspaceSources::open(project.path(), &graph));

    let QueryResult::References(refs) = dispatcher.dispatch(&format!("type:symbol {HELPER}")).unwrap()
    else {
        panic!("expected references");
    };
    assert_eq!(refs["a.py"].len(), 2);
    assert_eq!(refs["b.py"].len(), 1);
    assert!(refs["b.py"][0].is_definition());

    let rendered = QueryResult::References(refs).to_string();
    assert!(rendered.contains("a.py:5:12"));
    assert!(rendered.contains("b.py:7:5"));
}

#[test]
fn test_source_query() {
    let (project, graph) = project();
    let mut dispatcher = QueryDispatcher::new(&graph, WorkspaceSources::open(project.path(), &graph));

    assert_eq!(
        dispatcher.dispatch(&format!("type:source {RUN}")).unwrap(),
        QueryResult::Source(SourceLookup::Found(
            "def run():\n    return helper()".to_string()
        ))
    );

    let err = dispatcher
        .dispatch("type:source scip-python python app 0.1 c/missing().")
        .unwrap_err();
    assert!(matches!(err, QueryError::NotFound { .. }), "{err:?}");
}

#[test]
fn test_source_query_with_missing_file() {
    let (project, graph) = project();
    fs::remove_file(project.path().join("b.py")).unwrap();
    let mut dispatcher = QueryDispatcher::new(&graph, WorkspaceSources::open(project.path(), &graph));

    assert_eq!(
        dispatcher.dispatch(&format!("type:source {HELPER}")).unwrap(),
        QueryResult::Source(SourceLookup::NotFound)
    );
    assert_eq!(dispatcher.sources().files(), ["a.py"]);
}

#[test]
fn test_source_query_with_inverted_enclosing_range() {
    let project = TestProject::new();
    project.add_file("a.py", A_PY);
    let index = project.add_index(&[Doc::new("a.py")
        .declare(RUN)
        .occurrence(Occ::new(RUN, &[3, 4, 7], DEFINITION).enclosing(&[4, 0, 3, 0]))]);
    let graph = SymbolGraph::from_path(index).unwrap();
    let mut dispatcher = QueryDispatcher::new(&graph, WorkspaceSources::open(project.path(), &graph));

    assert_eq!(
        dispatcher.dispatch(&format!("type:source {RUN}")).unwrap(),
        QueryResult::Source(SourceLookup::NotFound)
    );
}

#[test]
fn test_replace_with_flush_writes_files() {
    let (project, graph) = project();
    let mut dispatcher = QueryDispatcher::new(&graph, WorkspaceSources::open(project.path(), &graph));

    assert_eq!(
        dispatcher.dispatch("type:replace helper assist True").unwrap(),
        QueryResult::Renamed(3)
    );

    let a = fs::read_to_string(project.path().join("a.py")).unwrap();
    let b = fs::read_to_string(project.path().join("b.py")).unwrap();
    assert_eq!(a, "from b import assist\n\n\ndef run():\n    return assist()\n");
    assert!(b.contains("def assist():"));
}

#[test]
fn test_replace_without_flush_stays_in_memory() {
    let (project, graph) = project();
    let mut dispatcher = QueryDispatcher::new(&graph, WorkspaceSources::open(project.path(), &graph));

    assert_eq!(
        dispatcher.dispatch("type:replace foo bar False").unwrap(),
        QueryResult::Renamed(1)
    );
    assert_eq!(fs::read_to_string(project.path().join("b.py")).unwrap(), B_PY);

    let sources = dispatcher.into_sources();
    assert_eq!(sources.lines("b.py")[7], "    return bar");
}

#[test]
fn test_malformed_queries() {
    let (project, graph) = project();
    let mut dispatcher = QueryDispatcher::new(&graph, WorkspaceSources::open(project.path(), &graph));

    let err = dispatcher.dispatch("badformat").unwrap_err();
    assert!(matches!(err, QueryError::Invalid { .. }), "{err:?}");

    for query in ["type:lookup foo", "type:replace a b", "type:replace a b yes"] {
        let err = dispatcher.dispatch(query).unwrap_err();
        assert!(matches!(err, QueryError::Invalid { .. }), "{query}: {err:?}");
    }

    assert!(matches!(
        dispatcher.dispatch("type:symbol not a symbol").unwrap_err(),
        QueryError::Parse(_)
    ));
}

#[test]
fn test_queries_parse_from_str() {
    let query: Query = "type:replace a b true".parse().unwrap();
    assert_eq!(
        query,
        Query::Replace {
            find: "a".to_string(),
            replace: "b".to_string(),
            flush: true
        }
    );
    assert!("type:exact".parse::<Query>().is_err());
}
