use miette::SourceSpan;

use meridian_resolve::{
    ModelBuilder, PackageId, ResolveError, ScopeId, Signature, TypeId, TypeOracle, Unit,
};

const OBJECT: TypeId = TypeId(0);
const INT: TypeId = TypeId(1);
const STRING: TypeId = TypeId(2);

/// Oracle over an explicit subtype table, naming types for diagnostics.
struct TestOracle {
    subtypes: Vec<(TypeId, TypeId)>,
}

impl TypeOracle for TestOracle {
    fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        from == to || self.subtypes.contains(&(from, to))
    }

    fn describe(&self, ty: TypeId) -> String {
        match ty {
            OBJECT => "Object".to_string(),
            INT => "Int".to_string(),
            STRING => "String".to_string(),
            other => format!("#{}", other.0),
        }
    }
}

fn oracle() -> TestOracle {
    TestOracle {
        subtypes: vec![(INT, OBJECT), (STRING, OBJECT)],
    }
}

fn dummy_span() -> SourceSpan {
    SourceSpan::from((0, 0))
}

/// Helper to create a builder with a single `demo.core` package.
fn demo_builder() -> (ModelBuilder, PackageId, ScopeId) {
    let mut builder = ModelBuilder::new();
    let module = builder.add_module(&["demo"], None, dummy_span()).unwrap();
    let pkg = builder
        .add_package(module, &["demo", "core"], dummy_span())
        .unwrap();
    let root = builder.package_scope(pkg);
    (builder, pkg, root)
}

#[test]
fn test_direct_member_returns_each_declared_member() {
    let (mut builder, _pkg, root) = demo_builder();
    let f_one = builder
        .declare_function(root, "f", Signature::fixed(vec![INT]), dummy_span())
        .unwrap();
    let f_two = builder
        .declare_function(root, "f", Signature::fixed(vec![INT, INT]), dummy_span())
        .unwrap();
    let log = builder
        .declare_function(root, "log", Signature::variadic(vec![STRING], OBJECT), dummy_span())
        .unwrap();
    let ready = builder.declare_value(root, "ready", dummy_span()).unwrap();
    let model = builder.build().unwrap();
    let oracle = oracle();

    // Every declaration is found again under its own name and signature,
    // without the variadic flag.
    assert_eq!(
        model
            .direct_member(root, "f", Some(&[INT]), false, &oracle, dummy_span())
            .unwrap(),
        Some(f_one)
    );
    assert_eq!(
        model
            .direct_member(root, "f", Some(&[INT, INT]), false, &oracle, dummy_span())
            .unwrap(),
        Some(f_two)
    );
    assert_eq!(
        model
            .direct_member(root, "log", Some(&[STRING, OBJECT]), false, &oracle, dummy_span())
            .unwrap(),
        Some(log)
    );
    assert_eq!(
        model
            .direct_member(root, "ready", None, false, &oracle, dummy_span())
            .unwrap(),
        Some(ready)
    );
    assert_eq!(
        model
            .direct_member(root, "missing", None, false, &oracle, dummy_span())
            .unwrap(),
        None
    );
}

#[test]
fn test_name_only_reference_over_overloads_is_ambiguous() {
    let (mut builder, _pkg, root) = demo_builder();
    builder
        .declare_function(root, "f", Signature::fixed(vec![INT]), dummy_span())
        .unwrap();
    builder
        .declare_function(root, "f", Signature::fixed(vec![STRING]), dummy_span())
        .unwrap();
    let model = builder.build().unwrap();

    let err = model
        .direct_member(root, "f", None, false, &oracle(), dummy_span())
        .unwrap_err();
    match err {
        ResolveError::AmbiguousReference { name, candidates, .. } => {
            assert_eq!(name, "f");
            assert_eq!(
                candidates,
                vec!["demo.core::f(Int)", "demo.core::f(String)"]
            );
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_overload_resolution_picks_most_specific() {
    let (mut builder, _pkg, root) = demo_builder();
    let f_int = builder
        .declare_function(root, "f", Signature::fixed(vec![INT]), dummy_span())
        .unwrap();
    let f_object = builder
        .declare_function(root, "f", Signature::fixed(vec![OBJECT]), dummy_span())
        .unwrap();
    let model = builder.build().unwrap();
    let oracle = oracle();

    // Both overloads accept an Int; the narrower parameter wins.
    assert_eq!(
        model
            .direct_member(root, "f", Some(&[INT]), false, &oracle, dummy_span())
            .unwrap(),
        Some(f_int)
    );
    // A String only fits the Object overload.
    assert_eq!(
        model
            .direct_member(root, "f", Some(&[STRING]), false, &oracle, dummy_span())
            .unwrap(),
        Some(f_object)
    );
}

#[test]
fn test_equally_specific_overloads_are_reported_ambiguous() {
    let (mut builder, _pkg, root) = demo_builder();
    builder
        .declare_function(root, "f", Signature::fixed(vec![INT, OBJECT]), dummy_span())
        .unwrap();
    builder
        .declare_function(root, "f", Signature::fixed(vec![OBJECT, INT]), dummy_span())
        .unwrap();
    let model = builder.build().unwrap();

    // (Int, Int) fits both and neither signature beats the other.
    let err = model
        .direct_member(root, "f", Some(&[INT, INT]), false, &oracle(), dummy_span())
        .unwrap_err();
    match err {
        ResolveError::AmbiguousReference { candidates, .. } => {
            assert_eq!(
                candidates,
                vec!["demo.core::f(Int, Object)", "demo.core::f(Object, Int)"]
            );
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_variadic_call_shapes() {
    let (mut builder, _pkg, root) = demo_builder();
    let sum = builder
        .declare_function(root, "sum", Signature::variadic(vec![], INT), dummy_span())
        .unwrap();
    let pair = builder
        .declare_function(root, "pair", Signature::fixed(vec![INT, INT]), dummy_span())
        .unwrap();
    let model = builder.build().unwrap();
    let oracle = oracle();

    // With the variadic flag the trailing sequence stretches to any count.
    for args in [&[][..], &[INT][..], &[INT, INT][..]] {
        assert_eq!(
            model
                .direct_member(root, "sum", Some(args), true, &oracle, dummy_span())
                .unwrap(),
            Some(sum),
            "sum should accept {} trailing Int(s)",
            args.len()
        );
    }
    // Without it only the declared parameter list matches.
    assert_eq!(
        model
            .direct_member(root, "sum", Some(&[INT]), false, &oracle, dummy_span())
            .unwrap(),
        Some(sum)
    );
    assert_eq!(
        model
            .direct_member(root, "sum", Some(&[]), false, &oracle, dummy_span())
            .unwrap(),
        None
    );
    assert_eq!(
        model
            .direct_member(root, "sum", Some(&[INT, INT]), false, &oracle, dummy_span())
            .unwrap(),
        None
    );
    // Fixed arity never stretches.
    assert_eq!(
        model
            .direct_member(root, "pair", Some(&[INT]), true, &oracle, dummy_span())
            .unwrap(),
        None
    );
    assert_eq!(
        model
            .direct_member(root, "pair", Some(&[INT, INT]), true, &oracle, dummy_span())
            .unwrap(),
        Some(pair)
    );
}

#[test]
fn test_fixed_arity_overload_beats_variadic() {
    let (mut builder, _pkg, root) = demo_builder();
    let exact = builder
        .declare_function(root, "put", Signature::fixed(vec![INT]), dummy_span())
        .unwrap();
    let spread = builder
        .declare_function(root, "put", Signature::variadic(vec![], INT), dummy_span())
        .unwrap();
    let model = builder.build().unwrap();
    let oracle = oracle();

    assert_eq!(
        model
            .direct_member(root, "put", Some(&[INT]), true, &oracle, dummy_span())
            .unwrap(),
        Some(exact)
    );
    // Two trailing Ints only fit the variadic shape.
    assert_eq!(
        model
            .direct_member(root, "put", Some(&[INT, INT]), true, &oracle, dummy_span())
            .unwrap(),
        Some(spread)
    );
}

#[test]
fn test_member_escalates_through_lexical_containers() {
    let (mut builder, _pkg, root) = demo_builder();
    let greeting = builder.declare_value(root, "greeting", dummy_span()).unwrap();
    let job = builder.declare_class(root, "Job", dummy_span()).unwrap();
    let job_scope = builder.scope_of(job);
    let run = builder
        .declare_function(job_scope, "run", Signature::fixed(vec![]), dummy_span())
        .unwrap();
    let run_body = builder.add_function_body(run).unwrap();
    let block = builder.add_block(run_body).unwrap();
    let model = builder.build().unwrap();
    let oracle = oracle();

    assert_eq!(
        model
            .member(block, "greeting", None, false, &oracle, dummy_span())
            .unwrap(),
        Some(greeting)
    );
    // The direct variant never leaves the queried scope.
    assert_eq!(
        model
            .direct_member(block, "greeting", None, false, &oracle, dummy_span())
            .unwrap(),
        None
    );
}

#[test]
fn test_inner_declaration_shadows_outer() {
    let (mut builder, _pkg, root) = demo_builder();
    builder.declare_value(root, "greeting", dummy_span()).unwrap();
    let job = builder.declare_class(root, "Job", dummy_span()).unwrap();
    let job_scope = builder.scope_of(job);
    let run = builder
        .declare_function(job_scope, "run", Signature::fixed(vec![]), dummy_span())
        .unwrap();
    let run_body = builder.add_function_body(run).unwrap();
    let local = builder.declare_value(run_body, "greeting", dummy_span()).unwrap();
    let block = builder.add_block(run_body).unwrap();
    let model = builder.build().unwrap();

    assert_eq!(
        model
            .member(block, "greeting", None, false, &oracle(), dummy_span())
            .unwrap(),
        Some(local)
    );
}

#[test]
fn test_ambiguity_is_conclusive_and_stops_the_walk() {
    let (mut builder, _pkg, root) = demo_builder();
    // A unique toplevel `f` that must NOT win over the broken inner pair.
    builder
        .declare_function(root, "f", Signature::fixed(vec![OBJECT]), dummy_span())
        .unwrap();
    let job = builder.declare_class(root, "Job", dummy_span()).unwrap();
    let job_scope = builder.scope_of(job);
    builder
        .declare_function(job_scope, "f", Signature::fixed(vec![INT]), dummy_span())
        .unwrap();
    builder
        .declare_function(job_scope, "f", Signature::fixed(vec![STRING]), dummy_span())
        .unwrap();
    let model = builder.build().unwrap();

    let err = model
        .member(job_scope, "f", None, false, &oracle(), dummy_span())
        .unwrap_err();
    assert!(matches!(err, ResolveError::AmbiguousReference { .. }));
}

#[test]
fn test_member_or_parameter_prefers_bindings() {
    let mut builder = ModelBuilder::new();
    let module = builder.add_module(&["demo"], None, dummy_span()).unwrap();
    let core = builder
        .add_package(module, &["demo", "core"], dummy_span())
        .unwrap();
    let aux = builder
        .add_package(module, &["demo", "aux"], dummy_span())
        .unwrap();
    let core_root = builder.package_scope(core);
    let aux_root = builder.package_scope(aux);

    let toplevel_x = builder.declare_value(core_root, "x", dummy_span()).unwrap();
    // Stands in for a parameter declaration still being lowered.
    let param_x = builder.declare_value(aux_root, "x", dummy_span()).unwrap();
    let model = builder.build().unwrap();
    let oracle = oracle();

    let mut unit = Unit::new("main.mer", core);
    let mut warnings = Vec::new();
    unit.push_frame();
    unit.bind("x", param_x, dummy_span(), &mut warnings).unwrap();

    assert_eq!(
        model
            .member_or_parameter(&unit, core_root, "x", None, false, &oracle, dummy_span())
            .unwrap(),
        Some(param_x)
    );

    unit.pop_frame();
    assert_eq!(
        model
            .member_or_parameter(&unit, core_root, "x", None, false, &oracle, dummy_span())
            .unwrap(),
        Some(toplevel_x)
    );
}

#[test]
fn test_member_or_parameter_consults_imports_last() {
    let mut builder = ModelBuilder::new();
    let module = builder.add_module(&["demo"], None, dummy_span()).unwrap();
    let core = builder
        .add_package(module, &["demo", "core"], dummy_span())
        .unwrap();
    let io = builder
        .add_package(module, &["demo", "io"], dummy_span())
        .unwrap();
    let core_root = builder.package_scope(core);
    let io_root = builder.package_scope(io);

    let greeting = builder.declare_value(core_root, "greeting", dummy_span()).unwrap();
    let stdout = builder.declare_value(io_root, "stdout", dummy_span()).unwrap();
    let io_greeting = builder.declare_value(io_root, "greeting", dummy_span()).unwrap();
    let model = builder.build().unwrap();
    let oracle = oracle();

    let mut unit = Unit::new("main.mer", core);
    unit.add_import("stdout", stdout, dummy_span()).unwrap();
    unit.add_import("greeting", io_greeting, dummy_span()).unwrap();

    // Nothing lexical matches `stdout`, so the import resolves it.
    assert_eq!(
        model
            .member_or_parameter(&unit, core_root, "stdout", None, false, &oracle, dummy_span())
            .unwrap(),
        Some(stdout)
    );
    // A lexically visible declaration beats an import of the same name.
    assert_eq!(
        model
            .member_or_parameter(&unit, core_root, "greeting", None, false, &oracle, dummy_span())
            .unwrap(),
        Some(greeting)
    );
    // The direct variant does not consult imports at all.
    assert_eq!(
        model
            .direct_member_or_parameter(&unit, core_root, "stdout", None, false, &oracle, dummy_span())
            .unwrap(),
        None
    );
}

#[test]
fn test_qualified_member_searches_own_module_first() {
    let mut builder = ModelBuilder::new();
    let app = builder.add_module(&["app"], None, dummy_span()).unwrap();
    let lib = builder.add_module(&["lib"], None, dummy_span()).unwrap();

    let app_core = builder
        .add_package(app, &["demo", "core"], dummy_span())
        .unwrap();
    let app_text = builder
        .add_package(app, &["shared", "text"], dummy_span())
        .unwrap();
    let lib_text = builder
        .add_package(lib, &["shared", "text"], dummy_span())
        .unwrap();
    let lib_only = builder
        .add_package(lib, &["lib", "only"], dummy_span())
        .unwrap();

    let app_trim = builder
        .declare_value(builder.package_scope(app_text), "trim", dummy_span())
        .unwrap();
    builder
        .declare_value(builder.package_scope(lib_text), "trim", dummy_span())
        .unwrap();
    let only = builder
        .declare_value(builder.package_scope(lib_only), "only", dummy_span())
        .unwrap();
    let model = builder.build().unwrap();
    let oracle = oracle();

    let unit = Unit::new("main.mer", app_core);
    // `shared.text` exists in both modules; the unit's own module wins.
    assert_eq!(
        model
            .qualified_member(&unit, "shared.text", "trim", None, false, &oracle, dummy_span())
            .unwrap(),
        Some(app_trim)
    );
    // Packages of other modules are reachable when the name is theirs alone.
    assert_eq!(
        model
            .qualified_member(&unit, "lib.only", "only", None, false, &oracle, dummy_span())
            .unwrap(),
        Some(only)
    );
    assert_eq!(
        model
            .qualified_member(&unit, "no.such", "x", None, false, &oracle, dummy_span())
            .unwrap(),
        None
    );
}
