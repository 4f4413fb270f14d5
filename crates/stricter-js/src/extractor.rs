//! Import extraction for the JavaScript family using Tree-sitter.

use stricter_core::ImportExtractor;
use tracing::warn;
use tree_sitter::{Language, Node, Parser};

/// Extracts module specifiers from JavaScript or TypeScript source.
///
/// Recognized forms, all with string-literal specifiers only:
///
/// - `import x from 'a'`, `import 'a'`, `import type { T } from 'a'`
/// - `export { x } from 'a'`, `export * from 'a'`
/// - `require('a')` and dynamic `import('a')`
/// - `import x = require('a')` (TypeScript)
pub struct TreeSitterExtractor {
    id: &'static str,
    extensions: &'static [&'static str],
    language: Language,
}

impl TreeSitterExtractor {
    /// JavaScript, including JSX.
    #[must_use]
    pub fn javascript() -> Self {
        Self {
            id: "javascript",
            extensions: &[".js", ".jsx", ".mjs", ".cjs"],
            language: tree_sitter_javascript::LANGUAGE.into(),
        }
    }

    /// TypeScript without JSX.
    #[must_use]
    pub fn typescript() -> Self {
        Self {
            id: "typescript",
            extensions: &[".ts", ".mts", ".cts"],
            language: tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        }
    }

    /// TypeScript with JSX.
    #[must_use]
    pub fn tsx() -> Self {
        Self {
            id: "tsx",
            extensions: &[".tsx"],
            language: tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn text<'a>(node: &Node<'_>, src: &'a [u8]) -> &'a str {
        node.utf8_text(src).unwrap_or("")
    }

    /// Contents of a string literal node, without its quotes.
    fn string_value(node: &Node<'_>, src: &[u8]) -> Option<String> {
        if node.kind() != "string" {
            return None;
        }
        let value = Self::text(node, src).trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_owned())
    }

    /// Specifier of an `import` or `export ... from` statement.
    fn source_field(node: &Node<'_>, src: &[u8]) -> Option<String> {
        node.child_by_field_name("source")
            .and_then(|source| Self::string_value(&source, src))
    }

    /// Specifier of an `import x = require('a')` clause.
    fn require_clause(node: &Node<'_>, src: &[u8]) -> Option<String> {
        if let Some(found) = Self::source_field(node, src) {
            return Some(found);
        }
        let mut cursor = node.walk();
        let found = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "string");
        found.and_then(|c| Self::string_value(&c, src))
    }

    /// Specifier of `require('x')` or `import('x')`.
    fn call_specifier(node: &Node<'_>, src: &[u8]) -> Option<String> {
        let function = node.child_by_field_name("function")?;
        let is_import = match function.kind() {
            "import" => true,
            "identifier" => Self::text(&function, src) == "require",
            _ => false,
        };
        if !is_import {
            return None;
        }

        let arguments = node.child_by_field_name("arguments")?;
        let mut cursor = arguments.walk();
        let first = arguments.named_children(&mut cursor).next();
        first.and_then(|arg| Self::string_value(&arg, src))
    }
}

impl ImportExtractor for TreeSitterExtractor {
    fn language_id(&self) -> &'static str {
        self.id
    }

    fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    fn extract_imports(&self, source: &str) -> Vec<String> {
        let mut parser = Parser::new();
        if let Err(e) = parser.set_language(&self.language) {
            warn!("Failed to load {} grammar: {e}", self.id);
            return Vec::new();
        }

        let src = source.as_bytes();
        let Some(tree) = parser.parse(src, None) else {
            warn!("Failed to parse {} source", self.id);
            return Vec::new();
        };

        let mut imports = Vec::new();
        let mut stack = vec![tree.root_node()];

        // Pre-order walk; children are pushed reversed to keep source order
        while let Some(node) = stack.pop() {
            let specifier = match node.kind() {
                "import_statement" | "export_statement" => Self::source_field(&node, src),
                "import_require_clause" => Self::require_clause(&node, src),
                "call_expression" => Self::call_specifier(&node, src),
                _ => None,
            };
            if let Some(specifier) = specifier {
                imports.push(specifier);
            }

            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        imports
    }
}

impl std::fmt::Debug for TreeSitterExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterExtractor")
            .field("id", &self.id)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(src: &str) -> Vec<String> {
        TreeSitterExtractor::javascript().extract_imports(src)
    }

    fn ts(src: &str) -> Vec<String> {
        TreeSitterExtractor::typescript().extract_imports(src)
    }

    #[test]
    fn extracts_es_imports_in_source_order() {
        let imports = js(r#"
import foo from './foo/index.js';
import { a, b } from "./bar";
import './side-effect.css';
import * as ns from 'lodash';
"#);
        assert_eq!(imports, vec!["./foo/index.js", "./bar", "./side-effect.css", "lodash"]);
    }

    #[test]
    fn extracts_reexports() {
        let imports = js(
            "export { x } from './x';\nexport * from './all';\nexport const y = 1;\nexport default 'z';\n",
        );
        assert_eq!(imports, vec!["./x", "./all"]);
    }

    #[test]
    fn extracts_require_and_dynamic_import() {
        let imports = js(r#"
const fs = require('fs');
function load() {
  return import('./lazy.js');
}
"#);
        assert_eq!(imports, vec!["fs", "./lazy.js"]);
    }

    #[test]
    fn ignores_non_literal_specifiers() {
        let imports = js("const name = './x';\nrequire(name);\nimport(`./${name}`);\nfoo('./y');\n");
        assert!(imports.is_empty());
    }

    #[test]
    fn extracts_jsx_file_imports() {
        let imports = js("import React from 'react';\nexport default () => <div />;\n");
        assert_eq!(imports, vec!["react"]);
    }

    #[test]
    fn extracts_typescript_forms() {
        let imports = ts(r#"
import type { User } from './types';
import fs = require('fs');
export * from './api';
"#);
        assert_eq!(imports, vec!["./types", "fs", "./api"]);
    }

    #[test]
    fn extracts_tsx_imports() {
        let imports = TreeSitterExtractor::tsx()
            .extract_imports("import { App } from './App';\nconst el = <App />;\n");
        assert_eq!(imports, vec!["./App"]);
    }

    #[test]
    fn handles_by_extension() {
        use std::path::Path;
        assert!(TreeSitterExtractor::javascript().handles(Path::new("/p/a.cjs")));
        assert!(!TreeSitterExtractor::javascript().handles(Path::new("/p/a.ts")));
        assert!(TreeSitterExtractor::typescript().handles(Path::new("/p/a.mts")));
        assert!(TreeSitterExtractor::tsx().handles(Path::new("/p/a.tsx")));
    }
}
