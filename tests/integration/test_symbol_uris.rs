//! Symbol URI parsing, rendering and identity

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use symdex::{Descriptor, Package, Suffix, Symbol, SymbolKind};

#[test]
fn test_python_method_uri() {
    let uri = "scip-python python pkgname 1.0.0 `mod.sub`/ClassName#method().";
    let symbol = Symbol::parse(uri).unwrap();

    assert_eq!(symbol.scheme(), "scip-python");
    assert_eq!(symbol.package(), &Package::new("python", "pkgname", "1.0.0"));
    assert_eq!(
        symbol.descriptors(),
        &[
            Descriptor::new("mod.sub", Suffix::Namespace),
            Descriptor::new("ClassName", Suffix::Type),
            Descriptor::method("method", ""),
        ]
    );
    assert_eq!(symbol.kind(), SymbolKind::Method);
    assert_eq!(symbol.name(), "method");
    assert_eq!(symbol.to_string(), uri);
}

#[test]
fn test_invalid_suffix_reports_position() {
    let err = Symbol::parse("s m n v A?").unwrap_err();
    assert_eq!(err.uri, "s m n v A?");
    assert_eq!(err.index, 9);
    assert!(err.to_string().contains("s m n v A?"));
}

#[test]
fn test_rejects_malformed_uris() {
    for uri in [
        "",
        "scheme",
        "s m n",
        "s m n v ",
        "s m n v A",
        "s m n v `A",
        "s m n v `A`.",
        "s m n v (x",
        "s m n v run(``).",
        "s m n v Type#run(``).",
        "local ",
    ] {
        assert!(Symbol::parse(uri).is_err(), "{uri:?} should not parse");
    }
}

#[test]
fn test_real_world_uris_round_trip() {
    for uri in [
        "scip-python python requests 2.31.0 `requests.api`/get().",
        "scip-typescript npm @types/node 20.1.0 `fs.d.ts`/readFileSync().",
        "rust-analyzer cargo serde 1.0.0 de/Deserialize#deserialize().[D]",
        "scip-java maven com.example 1.0 com/example/Service#handle(+1).(request)",
        "scip-go gomod github.com/x/y v0.1.0 `y/z`/Client#Do().",
        "semanticdb maven . . scala/Predef.println(+2).",
        "scip-ruby gem my  gem 1.0 Foo#bar:",
        "local 17",
    ] {
        let symbol = Symbol::parse(uri).unwrap();
        assert_eq!(symbol.uri(), uri);
        assert_eq!(Symbol::parse(&symbol.to_string()).unwrap(), symbol);
    }
}

const FIELD_CHARS: &[char] = &['a', 'Z', '9', '-', '_', ' ', '`', '/', '@'];
const NAME_CHARS: &[char] = &['a', 'B', '3', '_', '$', '+', '-', ' ', '`', '.', '#', '(', ')'];

fn random_text(rng: &mut StdRng, pool: &[char], min: usize, max: usize) -> String {
    let len = rng.random_range(min..=max);
    (0..len).map(|_| pool[rng.random_range(0..pool.len())]).collect()
}

fn random_descriptor(rng: &mut StdRng) -> Descriptor {
    let name = random_text(rng, NAME_CHARS, 1, 6);
    match rng.random_range(0..8) {
        0 => Descriptor::new(name, Suffix::Namespace),
        1 => Descriptor::new(name, Suffix::Type),
        2 => Descriptor::new(name, Suffix::Term),
        3 => Descriptor::new(name, Suffix::Parameter),
        4 => Descriptor::new(name, Suffix::TypeParameter),
        5 => Descriptor::new(name, Suffix::Meta),
        6 => Descriptor::new(name, Suffix::Macro),
        _ => Descriptor::method(name, random_text(rng, NAME_CHARS, 0, 3)),
    }
}

#[test]
fn test_constructed_symbols_survive_rendering() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..500 {
        let scheme = random_text(&mut rng, FIELD_CHARS, 1, 5);
        if scheme == "local" {
            continue;
        }
        let mut field = || {
            let value = random_text(&mut rng, FIELD_CHARS, 0, 4);
            if value == "." { String::new() } else { value }
        };
        let package = Package::new(field(), field(), field());
        let count = rng.random_range(0..4);
        let descriptors: Vec<Descriptor> = (0..count).map(|_| random_descriptor(&mut rng)).collect();

        let symbol = Symbol::new(scheme, package, descriptors);
        let reparsed = Symbol::parse(symbol.uri())
            .unwrap_or_else(|e| panic!("{:?} did not parse: {e}", symbol.uri()));

        assert_eq!(reparsed.scheme(), symbol.scheme());
        assert_eq!(reparsed.package(), symbol.package());
        assert_eq!(reparsed.descriptors(), symbol.descriptors());
        assert_eq!(reparsed.uri(), symbol.uri());
    }
}

#[test]
fn test_parsed_and_constructed_symbols_are_equal() {
    let parsed = Symbol::parse("scip-python python mypkg 1.0 module/Class#").unwrap();
    let constructed = Symbol::new(
        "scip-python",
        Package::new("python", "mypkg", "1.0"),
        vec![
            Descriptor::new("module", Suffix::Namespace),
            Descriptor::new("Class", Suffix::Type),
        ],
    );
    assert_eq!(parsed, constructed);

    let mut set = HashSet::new();
    set.insert(parsed);
    assert!(!set.insert(constructed));
    assert_eq!(set.len(), 1);

    let other = Symbol::parse("scip-python python mypkg 1.0 module/Other#").unwrap();
    assert!(set.insert(other));
}

#[test]
fn test_local_symbols() {
    let local = Symbol::local("42");
    assert_eq!(local.uri(), "local 42");
    assert_eq!(local.scheme(), "local");
    assert!(local.package().is_empty());
    assert_eq!(local.descriptors(), &[Descriptor::new("42", Suffix::Local)]);
    assert!(local.is_local());
    assert_eq!(local.kind(), SymbolKind::Local);
    assert_eq!(Symbol::parse("local 42").unwrap(), local);
}
