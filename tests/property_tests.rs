//! Property-based tests for rendering and ownership.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::collections::HashMap;
use std::path::Path;

use proptest::prelude::*;

use stackgen::core::config::{
    BackendBlock, CodegenConfig, ConfigResolver, GenHclBlock, Globals, ResolveError,
};
use stackgen::core::eval::{Expr, TemplateEvaluator};
use stackgen::core::hcl::quote;
use stackgen::core::stack::Stack;
use stackgen::engine::generators::generate_locals;
use stackgen::engine::header::{has_generated_header, prepend_header, prepend_origin_header};

/// Resolver exposing a fixed set of exported locals.
struct LocalsOnly(HashMap<String, Expr>);

impl ConfigResolver for LocalsOnly {
    fn codegen_config(&self, _: &Path, _: &Stack) -> Result<CodegenConfig, ResolveError> {
        Ok(CodegenConfig::default())
    }

    fn globals(&self, _: &Path, _: &Stack) -> Result<Globals, ResolveError> {
        Ok(Globals::default())
    }

    fn backend(&self, _: &Path) -> Result<Option<BackendBlock>, ResolveError> {
        Ok(None)
    }

    fn exported_locals(
        &self,
        _: &Path,
        _: &Stack,
    ) -> Result<HashMap<String, Expr>, ResolveError> {
        Ok(self.0.clone())
    }

    fn generate_hcl(&self, _: &Path, _: &Stack) -> Result<Vec<GenHclBlock>, ResolveError> {
        Ok(Vec::new())
    }
}

fn render(locals: &[(String, i64)]) -> String {
    let map = locals
        .iter()
        .map(|(k, v)| (k.clone(), Expr::Literal((*v).into())))
        .collect();
    let stack = Stack::new(Path::new("/prj"), "/prj/app", None, None);

    generate_locals::<_, TemplateEvaluator>(
        &LocalsOnly(map),
        Path::new("/prj"),
        &stack,
        &Globals::default(),
    )
    .unwrap()
}

/// Strategy for unique local names with values.
fn locals() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,12}", any::<i64>(), 1..20)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    /// Insertion order never changes the rendered locals.
    #[test]
    fn locals_render_is_order_independent(items in locals()) {
        let mut reversed = items.clone();
        reversed.reverse();

        prop_assert_eq!(render(&items), render(&reversed));
    }

    /// Locals are emitted sorted by name.
    #[test]
    fn locals_are_sorted(items in locals()) {
        let code = render(&items);
        let emitted: Vec<&str> = code
            .lines()
            .filter(|l| l.starts_with("  "))
            .filter_map(|l| l.split_whitespace().next())
            .collect();

        let mut expected: Vec<&str> = items.iter().map(|(k, _)| k.as_str()).collect();
        expected.sort();
        prop_assert_eq!(emitted, expected);
    }

    /// Every generated body is recognized as owned.
    #[test]
    fn generated_code_is_owned(code in any::<String>(), origin in "/[a-z/]{0,20}") {
        prop_assert!(has_generated_header(prepend_header(&code).as_bytes()));
        prop_assert!(has_generated_header(prepend_origin_header(&origin, &code).as_bytes()));
    }

    /// Content not starting with a comment is never owned.
    #[test]
    fn manual_code_is_not_owned(code in "[a-zA-Z0-9 =\"{}\n]{0,80}") {
        prop_assert!(!has_generated_header(code.as_bytes()));
    }

    /// Plain strings are quoted verbatim.
    #[test]
    fn plain_strings_quote_verbatim(s in "[a-zA-Z0-9 ._/:-]{0,40}") {
        prop_assert_eq!(quote(&s), format!("\"{s}\""));
    }
}
