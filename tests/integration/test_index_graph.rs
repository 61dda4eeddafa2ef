//! Loading SCIP files and querying the resulting graph

use crate::common::{DEFINITION, Doc, Occ, READ_ACCESS, TestProject, encode_index};
use std::fs;
use symdex::{DecodeError, GraphError, Symbol, SymbolGraph, SymbolRoles, load_index};

const SERVICE: &str = "scip-python python shop 1.0 `shop.service`/Service#";
const CHECKOUT: &str = "scip-python python shop 1.0 `shop.service`/Service#checkout().";
const PRICE: &str = "scip-python python shop 1.0 `shop.pricing`/price().";

fn sym(uri: &str) -> Symbol {
    Symbol::parse(uri).unwrap()
}

fn shop_documents() -> Vec<Doc> {
    vec![
        Doc::new("shop/service.py")
            .declare(SERVICE)
            .declare(CHECKOUT)
            .occurrence(Occ::new(SERVICE, &[2, 6, 13], DEFINITION).enclosing(&[2, 0, 8, 0]))
            .occurrence(Occ::new(CHECKOUT, &[4, 8, 16], DEFINITION).enclosing(&[4, 4, 7, 30]))
            .occurrence(Occ::new(PRICE, &[6, 15, 20], READ_ACCESS)),
        Doc::new("shop/pricing.py")
            .declare(PRICE)
            .occurrence(Occ::new(PRICE, &[0, 4, 9], DEFINITION))
            .occurrence(Occ::new("", &[1, 0, 1], 0)),
    ]
}

#[test]
fn test_single_definition_graph() {
    let project = TestProject::new();
    let s = "scip-python python app 0.1 a/S#";
    let index_path = project.add_index(&[Doc::new("a.py")
        .declare(s)
        .occurrence(Occ::new(s, &[3, 6, 7], DEFINITION))]);

    let graph = SymbolGraph::from_path(&index_path).unwrap();

    let files = graph.all_files();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "a.py");
    assert_eq!(files[0].language, "python");

    let refs = graph.references(&sym(s));
    assert_eq!(refs.len(), 1);
    let in_a = &refs["a.py"];
    assert_eq!(in_a.len(), 1);
    assert_eq!(in_a[0].line, 3);
    assert_eq!(in_a[0].roles, SymbolRoles::DEFINITION);
    assert!(in_a[0].is_definition());
}

#[test]
fn test_graph_over_several_files() {
    let project = TestProject::new();
    let graph = SymbolGraph::from_path(project.add_index(&shop_documents())).unwrap();

    let paths: Vec<&str> = graph.all_files().iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["shop/service.py", "shop/pricing.py"]);
    assert_eq!(graph.all_symbols().len(), 3);

    let refs = graph.references(&sym(PRICE));
    assert_eq!(refs.keys().collect::<Vec<_>>(), ["shop/pricing.py", "shop/service.py"]);
    assert!(refs["shop/pricing.py"][0].is_definition());
    assert_eq!(refs["shop/service.py"][0].roles, SymbolRoles::READ_ACCESS);

    let (path, definition) = graph.definition(&sym(PRICE)).unwrap();
    assert_eq!(path, "shop/pricing.py");
    assert_eq!(definition.line, 0);

    let declared: Vec<&str> = graph
        .symbols_in("shop/service.py")
        .iter()
        .map(|s| s.uri())
        .collect();
    assert_eq!(declared, [SERVICE, CHECKOUT]);

    let matching = graph.symbols_matching("Service#");
    assert_eq!(matching.len(), 2);
    assert!(matching.contains(&sym(CHECKOUT)));

    assert_eq!(graph.documentation(&sym(PRICE)), ["Fixture documentation."]);
    assert_eq!(graph.metadata().unwrap().project_root, "file:///workspace");
}

#[test]
fn test_empty_occurrence_symbols_are_ignored() {
    let project = TestProject::new();
    let graph = SymbolGraph::from_path(project.add_index(&shop_documents())).unwrap();

    let stats = graph.stats();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.symbols, 3);
    assert_eq!(stats.contains_edges, 3);
    assert_eq!(stats.reference_edges, 4);
    // Still part of the decoded file
    assert_eq!(graph.file("shop/pricing.py").unwrap().occurrences.len(), 2);
}

#[test]
fn test_building_twice_gives_equal_graphs() {
    let project = TestProject::new();
    let path = project.add_index(&shop_documents());

    let index = load_index(&path).unwrap();
    let first = SymbolGraph::build(&index).unwrap();
    let second = SymbolGraph::build(&index).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, SymbolGraph::from_path(&path).unwrap());
}

#[test]
fn test_symbol_declared_in_two_documents_is_one_node() {
    let shared = "scip-python python app 0.1 util/helper().";
    let project = TestProject::new();
    let path = project.add_index(&[
        Doc::new("a.py")
            .declare(shared)
            .occurrence(Occ::new(shared, &[0, 4, 10], DEFINITION)),
        Doc::new("b.py")
            .declare(shared)
            .occurrence(Occ::new(shared, &[5, 4, 10], READ_ACCESS)),
    ]);
    let graph = SymbolGraph::from_path(path).unwrap();

    assert_eq!(graph.all_symbols().len(), 1);
    assert_eq!(graph.declaring_files(&sym(shared)), ["a.py", "b.py"]);
    assert_eq!(graph.reference_count(&sym(shared)), 2);
}

#[test]
fn test_unknown_symbol_has_no_references() {
    let project = TestProject::new();
    let graph = SymbolGraph::from_path(project.add_index(&shop_documents())).unwrap();

    let missing = sym("scip-python python shop 1.0 nowhere/Missing#");
    assert!(!graph.contains_symbol(&missing));
    assert!(graph.references(&missing).is_empty());
    assert!(graph.definition(&missing).is_none());
    assert!(graph.symbols_in("missing.py").is_empty());
}

#[test]
fn test_context_summarizes_symbol() {
    let project = TestProject::new();
    let graph = SymbolGraph::from_path(project.add_index(&shop_documents())).unwrap();

    let context = graph.context(&sym(PRICE));
    assert!(context.starts_with(PRICE));
    assert!(context.contains("shop/pricing.py"));
    assert!(context.contains("Fixture documentation."));
    assert!(context.contains("shop/service.py:7:16"));
}

#[test]
fn test_empty_file_is_empty_graph() {
    let project = TestProject::new();
    let path = project.add_file("empty.scip", "");
    let graph = SymbolGraph::from_path(path).unwrap();
    assert!(graph.all_files().is_empty());
    assert!(graph.all_symbols().is_empty());
}

#[test]
fn test_truncated_index_is_decode_error() {
    let project = TestProject::new();
    let mut bytes = encode_index(&shop_documents());
    bytes.truncate(bytes.len() - 5);
    let path = project.path().join("truncated.scip");
    fs::write(&path, bytes).unwrap();

    let err = SymbolGraph::from_path(&path).unwrap_err();
    assert!(matches!(err, GraphError::Decode(_)), "{err:?}");
}

#[test]
fn test_missing_index_is_io_error() {
    let project = TestProject::new();
    let err = load_index(project.path().join("absent.scip")).unwrap_err();
    assert!(matches!(err, DecodeError::Io { .. }), "{err:?}");
}

#[test]
fn test_invalid_symbol_names_the_document() {
    let project = TestProject::new();
    let path = project.add_index(&[Doc::new("bad.py").declare("s m n v A?")]);

    let err = SymbolGraph::from_path(path).unwrap_err();
    match err {
        GraphError::InvalidSymbol { path, .. } => assert_eq!(path, "bad.py"),
        other => panic!("expected InvalidSymbol, got {other:?}"),
    }
}
