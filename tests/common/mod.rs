#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{Position, Url};
use ustr::Ustr;

use mica_lsp::fileset::{FileSet, Pos};
use mica_lsp::scope::ScopeTree;
use mica_lsp::snapshot::{
    DeclObject, DescriptorEnricher, EnrichError, FastResolveError, FastResult, ObjKind,
    Occurrence, OccurrenceId, ProgramIndex, ProgramSnapshot, SingleFileResolver, SnapshotError,
    SnapshotProvider, SymbolDescriptor, UnitIndex, UnitRef,
};
use mica_lsp::{Backend, Config, Providers};

pub const LIB_PATH: &str = "/ws/lib/lib.mica";
pub const APP_PATH: &str = "/ws/app/main.mica";

pub const LIB_UNIT: &str = "example.com/lib";
pub const APP_UNIT: &str = "example.com/app";

pub const LIB_SOURCE: &str = "\
unit lib

type Foo {}

type T = int
";

pub const APP_SOURCE: &str = "\
unit app

import \"example.com/lib\"

var x lib.Foo

var y lib.T

type Local {}

func f() {
    var z Local
    var n int
}
";

/// A two-unit program: `example.com/lib` declares `Foo` and `T`,
/// `example.com/app` imports it and uses both, declares a local type and a
/// function with a nested scope. Positions and indexes are built by hand
/// the way the analyzer would build them.
pub struct TwoUnitFixture {
    pub file_set: Arc<FileSet>,
    pub program: Arc<ProgramIndex>,
    pub occurrences: Vec<Occurrence>,
    pub lib_uri: Url,
    pub app_uri: Url,
}

pub fn lib_uri() -> Url {
    Url::from_file_path(LIB_PATH).unwrap()
}

pub fn app_uri() -> Url {
    Url::from_file_path(APP_PATH).unwrap()
}

fn occ(id: OccurrenceId, name: &str, start: u32, end: u32) -> Occurrence {
    Occurrence {
        id,
        name: Ustr::from(name),
        start: Pos(start),
        end: Pos(end),
    }
}

fn obj(name: &str, kind: ObjKind, pos: u32) -> DeclObject {
    DeclObject {
        name: Ustr::from(name),
        kind,
        pos: Pos(pos),
    }
}

pub fn two_unit_fixture() -> TwoUnitFixture {
    let mut file_set = FileSet::new();
    let lib_file = file_set.add_file(LIB_PATH, LIB_SOURCE);
    let app_file = file_set.add_file(APP_PATH, APP_SOURCE);
    assert_eq!(lib_file, 0);
    assert_eq!(app_file, 1);
    // lib.mica occupies positions 1..=37, main.mica 38..=160.

    // ── example.com/lib ──
    let mut lib = UnitIndex::default();
    lib.objects = vec![
        obj("Foo", ObjKind::Type, 16), // "type Foo {}" line 2
        obj("T", ObjKind::Type, 29),   // "type T = int" line 4
    ];
    let mut scopes = ScopeTree::new();
    let unit_scope = scopes.push(ScopeTree::UNIVERSE, Pos(1), Pos(38));
    scopes.insert(unit_scope, Ustr::from("Foo"), 0);
    scopes.insert(unit_scope, Ustr::from("T"), 1);
    lib.scopes = scopes;
    lib.unit_scope = unit_scope;
    lib.defs = HashMap::from([(20, 0), (21, 1)]);
    lib.type_of = HashMap::from([
        (20, format!("{LIB_UNIT}.Foo")),
        (21, format!("{LIB_UNIT}.T")),
    ]);

    // ── example.com/app ──
    let mut app = UnitIndex::default();
    app.objects = vec![
        obj("x", ObjKind::Var, 78),       // 0
        obj("y", ObjKind::Var, 93),       // 1
        obj("Local", ObjKind::Type, 107), // 2
        obj("f", ObjKind::Func, 122),     // 3
        obj("z", ObjKind::Var, 136),      // 4
        obj("n", ObjKind::Var, 152),      // 5
        obj("lib", ObjKind::Unit, 80),    // 6
        obj("Foo", ObjKind::Type, 16),    // 7, declared in lib
        obj("T", ObjKind::Type, 29),      // 8, declared in lib
        obj("int", ObjKind::Type, 0),     // 9, builtin: no position
    ];
    let mut scopes = ScopeTree::new();
    scopes.insert(ScopeTree::UNIVERSE, Ustr::from("int"), 9);
    let unit_scope = scopes.push(ScopeTree::UNIVERSE, Pos(38), Pos(161));
    for (name, id) in [("x", 0), ("y", 1), ("Local", 2), ("f", 3), ("lib", 6)] {
        scopes.insert(unit_scope, Ustr::from(name), id);
    }
    let body = scopes.push(unit_scope, Pos(126), Pos(159)); // f's braces
    scopes.insert(body, Ustr::from("z"), 4);
    scopes.insert(body, Ustr::from("n"), 5);
    app.scopes = scopes;
    app.unit_scope = unit_scope;
    app.uses = HashMap::from([(2, 6), (3, 7), (5, 6), (6, 8), (10, 2), (12, 9)]);
    app.defs = HashMap::from([(1, 0), (4, 1), (7, 2), (8, 3), (9, 4), (11, 5)]);
    app.type_of = HashMap::from([
        (1, format!("{LIB_UNIT}.Foo")),
        (3, format!("{LIB_UNIT}.Foo")),
        (4, format!("{LIB_UNIT}.T")),
        (6, format!("{LIB_UNIT}.T")),
        (7, "Local".to_string()),
        (8, "func()".to_string()),
        (9, "Local".to_string()),
        (10, "Local".to_string()),
        (11, "int".to_string()),
        (12, "int".to_string()),
    ]);

    let occurrences = vec![
        // main.mica
        occ(1, "x", 78, 79),
        occ(2, "lib", 80, 83),
        occ(3, "Foo", 84, 87),
        occ(4, "y", 93, 94),
        occ(5, "lib", 95, 98),
        occ(6, "T", 99, 100),
        occ(7, "Local", 107, 112),
        occ(8, "f", 122, 123),
        occ(9, "z", 136, 137),
        occ(10, "Local", 138, 143),
        occ(11, "n", 152, 153),
        occ(12, "int", 154, 157),
        // "app" in the unit clause: an identifier the index knows nothing
        // about, for the definition-not-found path
        occ(13, "app", 43, 46),
        // lib.mica
        occ(20, "Foo", 16, 19),
        occ(21, "T", 29, 30),
    ];

    let program = ProgramIndex {
        units: HashMap::from([
            (LIB_UNIT.to_string(), Arc::new(lib)),
            (APP_UNIT.to_string(), Arc::new(app)),
        ]),
    };

    TwoUnitFixture {
        file_set: Arc::new(file_set),
        program: Arc::new(program),
        occurrences,
        lib_uri: lib_uri(),
        app_uri: app_uri(),
    }
}

/// Snapshot provider backed by [`TwoUnitFixture`]: finds the occurrence
/// whose span contains the requested position, exactly like the analyzer
/// locating the AST node under the cursor.
pub struct FixtureSnapshots {
    fixture: TwoUnitFixture,
}

impl FixtureSnapshots {
    pub fn new() -> Self {
        Self {
            fixture: two_unit_fixture(),
        }
    }
}

impl SnapshotProvider for FixtureSnapshots {
    fn snapshot(
        &self,
        uri: &Url,
        position: Position,
        _cancel: &CancellationToken,
    ) -> Result<ProgramSnapshot, SnapshotError> {
        let fixture = &self.fixture;
        let (content, file_index, unit_path) = if *uri == fixture.lib_uri {
            (LIB_SOURCE, 0, LIB_UNIT)
        } else if *uri == fixture.app_uri {
            (APP_SOURCE, 1, APP_UNIT)
        } else {
            return Err(SnapshotError::Analysis(format!("unknown document {uri}")));
        };

        let offset = mica_lsp::util::offset_for_position(content, position, uri.path())
            .map_err(|err| SnapshotError::Analysis(err.to_string()))?;
        let pos = fixture.file_set.file(file_index).pos(offset);

        let occurrence = fixture
            .occurrences
            .iter()
            .find(|o| o.start <= pos && pos < o.end)
            .ok_or(SnapshotError::NotAnIdentifier)?;

        Ok(ProgramSnapshot {
            file_set: Arc::clone(&fixture.file_set),
            occurrence: occurrence.clone(),
            enclosing: vec![occurrence.id, 0],
            program: Arc::clone(&fixture.program),
            unit_path: unit_path.to_string(),
        })
    }
}

/// Snapshot provider for configurations where whole-program analysis is
/// unavailable.
pub struct NoSnapshots;

impl SnapshotProvider for NoSnapshots {
    fn snapshot(
        &self,
        _uri: &Url,
        _position: Position,
        _cancel: &CancellationToken,
    ) -> Result<ProgramSnapshot, SnapshotError> {
        Err(SnapshotError::Analysis("no analyzer configured".to_string()))
    }
}

/// Single-file resolver stand-in for full-strategy configurations; the
/// router must never call it there.
pub struct NoFast;

impl SingleFileResolver for NoFast {
    fn resolve(
        &self,
        _fset: &mut FileSet,
        _offset: u32,
        _filename: &Path,
        _content: &str,
    ) -> Result<FastResult, FastResolveError> {
        Err(FastResolveError::Resolve(
            "single-file resolver not configured".to_string(),
        ))
    }
}

/// Fake single-file resolver: registers the file and reports the span of
/// the word under the offset. Two magic words exercise the special cases:
/// `somepkg` resolves to a unit reference, `len` to a builtin with no
/// concrete source file.
pub struct WordFast;

impl SingleFileResolver for WordFast {
    fn resolve(
        &self,
        fset: &mut FileSet,
        offset: u32,
        filename: &Path,
        content: &str,
    ) -> Result<FastResult, FastResolveError> {
        let file = fset.add_file(&filename.display().to_string(), content);

        let bytes = content.as_bytes();
        let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
        let mut start = offset as usize;
        let mut end = offset as usize;
        while start > 0 && is_word(bytes[start - 1]) {
            start -= 1;
        }
        while end < bytes.len() && is_word(bytes[end]) {
            end += 1;
        }
        if start == end {
            return Err(FastResolveError::NoIdentifierFound);
        }

        let word = &content[start..end];
        if word == "somepkg" {
            return Ok(FastResult {
                unit: Some(UnitRef {
                    path: "example.com/somepkg".to_string(),
                    name: Ustr::from("somepkg"),
                }),
                start: Pos::NONE,
                end: Pos::NONE,
            });
        }
        if word == "len" {
            // Builtins come back in a source file with no path.
            let builtin = fset.add_file("", "");
            let pos = fset.file(builtin).pos(0);
            return Ok(FastResult {
                unit: None,
                start: pos,
                end: pos,
            });
        }

        let file = fset.file(file);
        Ok(FastResult {
            unit: None,
            start: file.pos(start as u32),
            end: file.pos(end as u32),
        })
    }
}

/// Enricher that describes the clicked unit, for asserting descriptor
/// plumbing.
pub struct OkEnricher;

impl DescriptorEnricher for OkEnricher {
    fn describe(
        &self,
        snapshot: &ProgramSnapshot,
        _enclosing: &[u32],
        pos: Pos,
    ) -> Result<SymbolDescriptor, EnrichError> {
        Ok(SymbolDescriptor {
            name: snapshot.occurrence.name.to_string(),
            unit_path: snapshot.unit_path.clone(),
            kind: "symbol".to_string(),
            id: format!("{}/{}", snapshot.unit_path, pos.0),
        })
    }
}

/// Enricher that always fails; resolution must carry on without a
/// descriptor.
pub struct FailEnricher;

impl DescriptorEnricher for FailEnricher {
    fn describe(
        &self,
        _snapshot: &ProgramSnapshot,
        _enclosing: &[u32],
        _pos: Pos,
    ) -> Result<SymbolDescriptor, EnrichError> {
        Err(EnrichError("definition info unavailable".to_string()))
    }
}

pub fn full_providers() -> Providers {
    Providers {
        snapshots: Arc::new(FixtureSnapshots::new()),
        fast: Arc::new(NoFast),
        enricher: Arc::new(OkEnricher),
    }
}

pub fn fast_providers() -> Providers {
    Providers {
        snapshots: Arc::new(NoSnapshots),
        fast: Arc::new(WordFast),
        enricher: Arc::new(FailEnricher),
    }
}

pub fn full_backend() -> Backend {
    Backend::new_test(full_providers(), Config::default())
}

pub fn fast_backend() -> Backend {
    let config = Config {
        use_fast_path: true,
        ..Config::default()
    };
    Backend::new_test(fast_providers(), config)
}

pub fn token() -> CancellationToken {
    CancellationToken::new()
}
