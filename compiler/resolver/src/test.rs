use crate::{
    Accessibility, ContextKind, DefId, ModuleContext, ModuleExport, ModulePath, UseHide,
};
use diagnostics::{reporter, Code, ErrorCode, LintCode, Reporter, Severity};
use span::Span;
use utility::Atom;

fn atom(name: &str) -> Atom {
    Atom::new(name)
}

fn path(segments: &[&str]) -> ModulePath {
    ModulePath::new(segments.iter().map(|segment| atom(segment)))
}

struct Setup {
    context: ModuleContext,
    buffer: reporter::Buffer,
}

fn physical() -> Setup {
    context(ContextKind::Physical)
}

fn context(kind: ContextKind) -> Setup {
    let buffer = reporter::Buffer::default();
    let context = ModuleContext::new(kind, Reporter::buffer(buffer.clone()));
    Setup { context, buffer }
}

impl Setup {
    #[track_caller]
    fn assert_reported(&self, code: Code, amount: usize) {
        let buffer = self.buffer.lock().unwrap();
        let actual = buffer
            .iter()
            .filter(|diagnostic| diagnostic.code == Some(code))
            .count();

        assert_eq!(
            actual, amount,
            "expected {amount} diagnostics with code {code}, found {actual}"
        );
    }

    fn errors(&self) -> usize {
        self.buffer
            .lock()
            .unwrap()
            .iter()
            .filter(|diagnostic| diagnostic.severity == Severity::Error)
            .count()
    }
}

/// A module exporting the given names under its own path.
fn module(names: &[&str]) -> ModuleExport {
    let mut export = ModuleExport::new();
    for name in names {
        assert!(export.export(ModulePath::this(), atom(name), DefId::fresh()));
    }
    export
}

#[test]
fn duplicate_import_is_a_hard_error() {
    let mut setup = physical();
    let target = path(&["M", "N"]);

    setup
        .context
        .import_module(
            target.clone(),
            module(&["x"]),
            Accessibility::Private,
            Span::default(),
        )
        .unwrap();
    let original = setup.context.modules()[&target].id();

    let result = setup.context.import_module(
        target.clone(),
        module(&["y"]),
        Accessibility::Private,
        Span::default(),
    );

    assert!(result.is_err());
    setup.assert_reported(Code::Error(ErrorCode::E011), 1);
    // the first import stays intact
    assert_eq!(setup.context.modules()[&target].id(), original);
}

#[test]
fn same_module_via_a_different_chain_only_shadows() {
    let mut setup = physical();
    let export = module(&["x"]);

    setup
        .context
        .import_module(
            path(&["M"]),
            export.clone(),
            Accessibility::Private,
            Span::default(),
        )
        .unwrap();
    setup
        .context
        .import_module(path(&["N"]), export, Accessibility::Private, Span::default())
        .unwrap();

    setup.assert_reported(Code::Lint(LintCode::ModuleShadowing), 1);
    assert_eq!(setup.errors(), 0);
}

#[test]
fn open_with_hide_filters_names() {
    let mut setup = physical();
    let m = path(&["M"]);

    setup
        .context
        .import_module(m.clone(), module(&["x", "y"]), Accessibility::Private, Span::default())
        .unwrap();
    setup
        .context
        .open_module(
            &m,
            Accessibility::Private,
            &UseHide::hiding([atom("x")]),
            Span::default(),
        )
        .unwrap();

    assert!(setup.context.symbols().contains_definitely(&m, atom("y")));
    assert!(!setup.context.symbols().contains_name(atom("x")));
    // names arriving through the opened module itself never count as shadows
    setup.assert_reported(Code::Lint(LintCode::Shadowing), 0);
}

#[test]
fn open_with_use_retains_only_listed_names() {
    let mut setup = physical();
    let m = path(&["M"]);

    setup
        .context
        .import_module(m.clone(), module(&["x", "y"]), Accessibility::Private, Span::default())
        .unwrap();
    setup
        .context
        .open_module(
            &m,
            Accessibility::Private,
            &UseHide::using([atom("x")]),
            Span::default(),
        )
        .unwrap();

    assert!(setup.context.symbols().contains_definitely(&m, atom("x")));
    assert!(!setup.context.symbols().contains_name(atom("y")));
}

#[test]
fn unknown_name_in_filter_aborts_the_open() {
    let mut setup = physical();
    let m = path(&["M"]);

    setup
        .context
        .import_module(m.clone(), module(&["x"]), Accessibility::Private, Span::default())
        .unwrap();
    let result = setup.context.open_module(
        &m,
        Accessibility::Private,
        &UseHide::using([atom("z")]),
        Span::default(),
    );

    assert!(result.is_err());
    setup.assert_reported(Code::Error(ErrorCode::E013), 1);
    assert!(!setup.context.symbols().contains_name(atom("x")));
}

#[test]
fn renames_relocate_names() {
    let mut setup = physical();
    let m = path(&["M"]);

    setup
        .context
        .import_module(m.clone(), module(&["x"]), Accessibility::Private, Span::default())
        .unwrap();
    setup
        .context
        .open_module(
            &m,
            Accessibility::Private,
            &UseHide::open().rename(atom("x"), atom("x2")),
            Span::default(),
        )
        .unwrap();

    assert!(setup.context.symbols().contains_definitely(&m, atom("x2")));
    assert!(!setup.context.symbols().contains_name(atom("x")));
}

#[test]
fn unknown_rename_source_aborts_the_open() {
    let mut setup = physical();
    let m = path(&["M"]);

    setup
        .context
        .import_module(m.clone(), module(&["x"]), Accessibility::Private, Span::default())
        .unwrap();
    let result = setup.context.open_module(
        &m,
        Accessibility::Private,
        &UseHide::open().rename(atom("z"), atom("z2")),
        Span::default(),
    );

    assert!(result.is_err());
    setup.assert_reported(Code::Error(ErrorCode::E013), 1);
}

#[test]
fn opening_a_module_that_was_never_imported_fails() {
    let mut setup = physical();
    let result = setup.context.open_module(
        &path(&["M"]),
        Accessibility::Private,
        &UseHide::open(),
        Span::default(),
    );

    assert!(result.is_err());
    setup.assert_reported(Code::Error(ErrorCode::E010), 1);
}

#[test]
fn defining_the_same_name_twice_is_a_hard_error() {
    let mut setup = physical();

    setup
        .context
        .define(atom("x"), DefId::fresh(), Accessibility::Public, Span::default())
        .unwrap();
    let result = setup.context.define(
        atom("x"),
        DefId::fresh(),
        Accessibility::Public,
        Span::default(),
    );

    assert!(result.is_err());
    setup.assert_reported(Code::Error(ErrorCode::E012), 1);
}

#[test]
fn a_second_provenance_warns_about_ambiguity() {
    let mut setup = physical();
    let m = path(&["M"]);

    setup
        .context
        .define(atom("x"), DefId::fresh(), Accessibility::Private, Span::default())
        .unwrap();
    setup
        .context
        .import_module(m.clone(), module(&["x"]), Accessibility::Private, Span::default())
        .unwrap();
    setup
        .context
        .open_module(&m, Accessibility::Private, &UseHide::open(), Span::default())
        .unwrap();

    setup.assert_reported(Code::Lint(LintCode::AmbiguousName), 1);
    assert!(setup
        .context
        .symbols()
        .contains_definitely(&ModulePath::this(), atom("x")));
    assert!(setup.context.symbols().contains_definitely(&m, atom("x")));
}

#[test]
fn defining_a_name_visible_through_an_import_warns_about_shadowing() {
    let mut setup = physical();

    setup
        .context
        .import_module(
            path(&["M"]),
            module(&["x"]),
            Accessibility::Private,
            Span::default(),
        )
        .unwrap();
    setup
        .context
        .define(atom("x"), DefId::fresh(), Accessibility::Private, Span::default())
        .unwrap();

    setup.assert_reported(Code::Lint(LintCode::Shadowing), 1);
    assert_eq!(setup.errors(), 0);
}

#[test]
fn anonymous_names_shadow_silently() {
    let mut setup = physical();

    setup
        .context
        .import_module(
            path(&["M"]),
            module(&["_x"]),
            Accessibility::Private,
            Span::default(),
        )
        .unwrap();
    setup
        .context
        .define(atom("_x"), DefId::fresh(), Accessibility::Private, Span::default())
        .unwrap();

    setup.assert_reported(Code::Lint(LintCode::Shadowing), 0);
}

#[test]
fn public_definitions_grow_the_export_view() {
    let mut setup = physical();

    setup
        .context
        .define(atom("x"), DefId::fresh(), Accessibility::Public, Span::default())
        .unwrap();
    setup
        .context
        .define(atom("y"), DefId::fresh(), Accessibility::Private, Span::default())
        .unwrap();

    let exports = setup.context.exports();
    assert!(exports
        .symbols()
        .contains_definitely(&ModulePath::this(), atom("x")));
    assert!(!exports.symbols().contains_name(atom("y")));
}

#[test]
fn no_export_contexts_never_export() {
    let mut setup = context(ContextKind::NoExport);

    setup
        .context
        .define(atom("x"), DefId::fresh(), Accessibility::Public, Span::default())
        .unwrap();

    assert!(!setup.context.exports().symbols().contains_name(atom("x")));
}

#[test]
fn public_imports_are_reexported_lazily() {
    let mut setup = physical();

    setup
        .context
        .import_module(
            path(&["M"]),
            module(&["x"]),
            Accessibility::Public,
            Span::default(),
        )
        .unwrap();
    setup
        .context
        .import_module(
            path(&["N"]),
            module(&["y"]),
            Accessibility::Private,
            Span::default(),
        )
        .unwrap();

    let reexported: Vec<_> = setup
        .context
        .exported_modules()
        .map(|(path, _)| path.clone())
        .collect();
    assert_eq!(reexported, [path(&["M"])]);
}

#[test]
fn import_modules_prefixes_the_tree() {
    let mut setup = physical();
    let tree = [
        (ModulePath::this(), module(&["x"])),
        (path(&["Sub"]), module(&["y"])),
    ];

    setup
        .context
        .import_modules(&path(&["M"]), tree, Accessibility::Private, Span::default())
        .unwrap();

    assert!(setup.context.modules().contains_key(&path(&["M"])));
    assert!(setup.context.modules().contains_key(&path(&["M", "Sub"])));
}

#[test]
fn admission_never_duplicates_pairs() {
    // exercising a legal sequence of operations keeps (path, name) unique
    let mut setup = physical();
    let m = path(&["M"]);

    setup
        .context
        .define(atom("x"), DefId::fresh(), Accessibility::Public, Span::default())
        .unwrap();
    setup
        .context
        .import_module(m.clone(), module(&["x", "y"]), Accessibility::Private, Span::default())
        .unwrap();
    setup
        .context
        .open_module(&m, Accessibility::Private, &UseHide::open(), Span::default())
        .unwrap();

    let mut pairs: Vec<_> = setup
        .context
        .symbols()
        .iter()
        .map(|(name, path, _)| (name.to_str(), path.clone()))
        .collect();
    let total = pairs.len();
    pairs.sort_by(|left, right| {
        left.0
            .cmp(right.0)
            .then_with(|| format!("{:?}", left.1).cmp(&format!("{:?}", right.1)))
    });
    pairs.dedup();
    assert_eq!(pairs.len(), total);
}
