//! The built-in function catalog.
//!
//! Signatures only: the analyzer type-checks calls against this table,
//! and the vm provides the matching implementations. Keeping the
//! catalog here means the two can never disagree about arity or types.
//!
//! The three Unicode-table functions (`ucategory`, `ulookup`, `uname`)
//! are catalogued but not available: a grammar that needs them is
//! rejected at analysis time, because this implementation ships no
//! Unicode name/category tables.

use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::types::Type;

/// Typed signature of a built-in function.
#[derive(Debug, Clone)]
pub struct FuncSig {
    pub params: Vec<Type>,
    pub ret: Type,
    /// Trailing parameters may repeat (only `list`).
    pub variadic: bool,
    /// Implemented by the vm; unavailable functions fail analysis.
    pub available: bool,
}

impl FuncSig {
    fn new(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            variadic: false,
            available: true,
        }
    }

    fn variadic(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            variadic: true,
            available: true,
        }
    }

    fn unavailable(params: Vec<Type>, ret: Type) -> Self {
        Self {
            params,
            ret,
            variadic: false,
            available: false,
        }
    }
}

/// Looks up a built-in signature by name.
pub fn signature(name: &str) -> Option<&'static FuncSig> {
    catalog().get(name)
}

pub fn is_builtin(name: &str) -> bool {
    catalog().contains_key(name)
}

/// The full catalog, in stable order.
pub fn catalog() -> &'static IndexMap<&'static str, FuncSig> {
    static CATALOG: LazyLock<IndexMap<&'static str, FuncSig>> = LazyLock::new(build);
    &CATALOG
}

fn build() -> IndexMap<&'static str, FuncSig> {
    use Type::*;

    let strs = || Type::list_of(Str);
    let anys = || Type::list_of(Any);
    let pairs = || Type::list_of(Type::list_of(Any));
    let dict = || Type::dict_of(Any);

    let mut m = IndexMap::new();

    // Numeric and string conversions.
    m.insert("atof", FuncSig::new(vec![Str], Float));
    m.insert("atoi", FuncSig::new(vec![Str, Int], Int));
    m.insert("atou", FuncSig::new(vec![Str], Str));
    m.insert("btoa", FuncSig::new(vec![Bool], Str));
    m.insert("ftoa", FuncSig::new(vec![Float], Str));
    m.insert("ftoi", FuncSig::new(vec![Float], Int));
    m.insert("itoa", FuncSig::new(vec![Int], Str));
    m.insert("itof", FuncSig::new(vec![Int], Float));
    m.insert("itou", FuncSig::new(vec![Int], Str));
    m.insert("utoi", FuncSig::new(vec![Str], Int));
    m.insert("xtoi", FuncSig::new(vec![Str], Int));
    m.insert("xtou", FuncSig::new(vec![Str], Str));

    // Strings.
    m.insert("cat", FuncSig::new(vec![strs()], Str));
    m.insert("dedent", FuncSig::new(vec![Str, Int, Int], Str));
    m.insert("encode_string", FuncSig::new(vec![Str], Str));
    m.insert("join", FuncSig::new(vec![Str, strs()], Str));
    m.insert("replace", FuncSig::new(vec![Str, Str, Str], Str));
    m.insert("scat", FuncSig::new(vec![Str, strs()], Str));
    m.insert("split", FuncSig::new(vec![Str, Str], strs()));
    m.insert("strcat", FuncSig::new(vec![Str, Str], Str));
    m.insert("strin", FuncSig::new(vec![Str, Str], Bool));
    m.insert("strlen", FuncSig::new(vec![Str], Int));
    m.insert("substr", FuncSig::new(vec![Str, Int, Int], Str));

    // Lists.
    m.insert("cdr", FuncSig::new(vec![anys()], anys()));
    m.insert("concat", FuncSig::new(vec![anys(), anys()], anys()));
    m.insert("cons", FuncSig::new(vec![Any, anys()], anys()));
    m.insert("in", FuncSig::new(vec![anys(), Any], Bool));
    m.insert("item", FuncSig::new(vec![anys(), Int], Any));
    m.insert("list", FuncSig::variadic(vec![Any], anys()));
    m.insert("scons", FuncSig::new(vec![Str, strs()], strs()));
    m.insert("slice", FuncSig::new(vec![anys(), Int, Int], anys()));
    m.insert("sort", FuncSig::new(vec![strs()], strs()));

    // Dicts.
    m.insert("dict", FuncSig::new(vec![pairs()], dict()));
    m.insert("get", FuncSig::new(vec![dict(), Str], Any));
    m.insert("has", FuncSig::new(vec![dict(), Str], Bool));
    m.insert("keys", FuncSig::new(vec![dict()], strs()));
    m.insert("map", FuncSig::new(vec![strs(), anys()], dict()));
    m.insert("map_items", FuncSig::new(vec![dict()], pairs()));
    m.insert("node", FuncSig::new(vec![Str, Any, anys()], dict()));
    m.insert("pairs", FuncSig::new(vec![dict()], pairs()));
    m.insert("values", FuncSig::new(vec![dict()], anys()));

    // Predicates and generic helpers.
    m.insert("equal", FuncSig::new(vec![Any, Any], Bool));
    m.insert("is_atom", FuncSig::new(vec![Any], Bool));
    m.insert("is_bool", FuncSig::new(vec![Any], Bool));
    m.insert("is_dict", FuncSig::new(vec![Any], Bool));
    m.insert("is_float", FuncSig::new(vec![Any], Bool));
    m.insert("is_int", FuncSig::new(vec![Any], Bool));
    m.insert("is_list", FuncSig::new(vec![Any], Bool));
    m.insert("is_null", FuncSig::new(vec![Any], Bool));
    m.insert("is_number", FuncSig::new(vec![Any], Bool));
    m.insert("is_str", FuncSig::new(vec![Any], Bool));
    m.insert("len", FuncSig::new(vec![Any], Int));
    m.insert("throw", FuncSig::new(vec![Str], Any));

    // Parser state.
    m.insert("colno", FuncSig::new(vec![], Int));
    m.insert("pos", FuncSig::new(vec![], Int));

    // Durations ("td" values are seconds as float).
    m.insert("str2td", FuncSig::new(vec![Str], Float));
    m.insert("td2str", FuncSig::new(vec![Float], Str));

    // Unicode tables (not shipped; see module docs).
    m.insert("ucategory", FuncSig::unavailable(vec![Str], Str));
    m.insert("ulookup", FuncSig::unavailable(vec![Str], Str));
    m.insert("uname", FuncSig::unavailable(vec![Str], Str));

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_complete_enough() {
        // A spot check of the §6.3 inventory.
        for name in [
            "atoi", "atof", "cat", "cdr", "colno", "concat", "cons", "dedent", "dict", "equal",
            "ftoa", "get", "has", "in", "item", "itoa", "itou", "join", "keys", "len", "list",
            "node", "pairs", "pos", "replace", "slice", "sort", "split", "strcat", "strin",
            "strlen", "substr", "throw", "utoi", "values", "xtoi", "xtou",
        ] {
            assert!(is_builtin(name), "missing builtin {name}");
            assert!(signature(name).unwrap().available, "{name} unavailable");
        }
    }

    #[test]
    fn unicode_functions_are_catalogued_but_unavailable() {
        for name in ["ucategory", "ulookup", "uname"] {
            let sig = signature(name).unwrap();
            assert!(!sig.available);
        }
    }

    #[test]
    fn arity() {
        assert_eq!(signature("atoi").unwrap().params.len(), 2);
        assert_eq!(signature("pos").unwrap().params.len(), 0);
        assert!(signature("list").unwrap().variadic);
    }
}
